//! Name-based placement of agents that appear without an explicit parent.
//!
//! The rules live in one ordered table so an explicit protocol field can
//! replace them later without touching the fold.

use meridian_core::{
    AgentId, AgentKind, ANALYSIS_LEADER_ID, ORCHESTRATOR_ID, RESEARCH_LEADER_ID,
    STRATEGY_LEADER_ID,
};

/// How a new node should be placed in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub kind: AgentKind,
    pub parent_id: Option<AgentId>,
}

/// How a rule matches the lower-cased agent id.
#[derive(Debug, Clone, Copy)]
enum Match {
    Exact(&'static [&'static str]),
    Contains(&'static [&'static str]),
    Always,
}

impl Match {
    fn matches(&self, id: &str) -> bool {
        match self {
            Match::Exact(names) => names.iter().any(|n| id == *n),
            Match::Contains(parts) => parts.iter().any(|p| id.contains(p)),
            Match::Always => true,
        }
    }
}

/// Where a rule puts the node, if it decides at all.
#[derive(Debug, Clone, Copy)]
enum Parent {
    Root,
    Under(&'static str),
    /// Leave the parent to a later rule
    Defer,
}

impl Parent {
    fn decided(&self) -> Option<Option<&'static str>> {
        match self {
            Parent::Root => Some(None),
            Parent::Under(id) => Some(Some(*id)),
            Parent::Defer => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct HierarchyRule {
    pattern: Match,
    /// `None` leaves the kind to a later rule
    kind: Option<AgentKind>,
    parent: Parent,
}

/// Evaluated top to bottom. Kind and parent are each taken from the first
/// matching rule that decides them.
const HIERARCHY_RULES: &[HierarchyRule] = &[
    HierarchyRule {
        pattern: Match::Exact(&["ceo", "orchestrator"]),
        kind: Some(AgentKind::Orchestrator),
        parent: Parent::Root,
    },
    HierarchyRule {
        pattern: Match::Contains(&["leader", "lead"]),
        kind: Some(AgentKind::DivisionLead),
        parent: Parent::Under(ORCHESTRATOR_ID),
    },
    HierarchyRule {
        pattern: Match::Contains(&["tool"]),
        kind: Some(AgentKind::Tool),
        parent: Parent::Defer,
    },
    HierarchyRule {
        pattern: Match::Contains(&["research"]),
        kind: None,
        parent: Parent::Under(RESEARCH_LEADER_ID),
    },
    HierarchyRule {
        pattern: Match::Contains(&["analysis", "technical"]),
        kind: None,
        parent: Parent::Under(ANALYSIS_LEADER_ID),
    },
    HierarchyRule {
        pattern: Match::Contains(&["strategy", "portfolio"]),
        kind: None,
        parent: Parent::Under(STRATEGY_LEADER_ID),
    },
    HierarchyRule {
        pattern: Match::Always,
        kind: Some(AgentKind::Worker),
        parent: Parent::Under(ORCHESTRATOR_ID),
    },
];

/// Infer kind and parent from an agent id alone.
pub fn classify(id: &str) -> Placement {
    let lowered = id.to_lowercase();
    let mut kind = None;
    let mut parent = None;
    for rule in HIERARCHY_RULES
        .iter()
        .filter(|rule| rule.pattern.matches(&lowered))
    {
        kind = kind.or(rule.kind);
        parent = parent.or(rule.parent.decided());
        if kind.is_some() && parent.is_some() {
            break;
        }
    }

    Placement {
        kind: kind.unwrap_or(AgentKind::Worker),
        parent_id: parent
            .flatten()
            .filter(|parent| !parent.eq_ignore_ascii_case(id))
            .map(str::to_string),
    }
}
