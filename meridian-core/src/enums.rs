//! Enum types for agent graph entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// AGENT KIND
// ============================================================================

/// Role of an agent in the orchestrator → division lead → worker pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Orchestrator,
    #[serde(rename = "division-lead", alias = "division_lead")]
    DivisionLead,
    #[default]
    Worker,
    Tool,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Orchestrator => "orchestrator",
            AgentKind::DivisionLead => "division-lead",
            AgentKind::Worker => "worker",
            AgentKind::Tool => "tool",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AgentKindParseError> {
        match normalize_token(s).as_str() {
            "orchestrator" | "ceo" => Ok(AgentKind::Orchestrator),
            "division_lead" | "divisionlead" | "lead" | "leader" => Ok(AgentKind::DivisionLead),
            "worker" | "agent" => Ok(AgentKind::Worker),
            "tool" => Ok(AgentKind::Tool),
            _ => Err(AgentKindParseError(s.to_string())),
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = AgentKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error when parsing an invalid agent kind string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentKindParseError(pub String);

impl fmt::Display for AgentKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid agent kind: {}", self.0)
    }
}

impl std::error::Error for AgentKindParseError {}

// ============================================================================
// AGENT STATUS
// ============================================================================

/// Status of an agent node.
///
/// Not strictly monotonic: the last applied event wins, so a completed
/// agent may return to active when a correction arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Known but not yet working
    #[default]
    Idle,
    /// Working on a task
    Active,
    /// Reasoning before acting
    Thinking,
    /// Gathering sources
    Searching,
    /// Processing gathered data
    Analyzing,
    /// Finished its task
    Completed,
    /// Reported a failure
    Error,
}

impl AgentStatus {
    /// Every status, in display order.
    pub const ALL: [AgentStatus; 7] = [
        AgentStatus::Idle,
        AgentStatus::Active,
        AgentStatus::Thinking,
        AgentStatus::Searching,
        AgentStatus::Analyzing,
        AgentStatus::Completed,
        AgentStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Active => "active",
            AgentStatus::Thinking => "thinking",
            AgentStatus::Searching => "searching",
            AgentStatus::Analyzing => "analyzing",
            AgentStatus::Completed => "completed",
            AgentStatus::Error => "error",
        }
    }

    /// Parse a status string, accepting the aliases upstream producers use.
    pub fn parse(s: &str) -> Result<Self, AgentStatusParseError> {
        match normalize_token(s).as_str() {
            "idle" | "pending" | "waiting" | "queued" => Ok(AgentStatus::Idle),
            "active" | "running" | "in_progress" | "inprogress" | "working" | "started" => {
                Ok(AgentStatus::Active)
            }
            "thinking" => Ok(AgentStatus::Thinking),
            "searching" => Ok(AgentStatus::Searching),
            "analyzing" | "analysing" => Ok(AgentStatus::Analyzing),
            "completed" | "complete" | "done" | "success" | "finished" => {
                Ok(AgentStatus::Completed)
            }
            "error" | "failed" | "failure" => Ok(AgentStatus::Error),
            _ => Err(AgentStatusParseError(s.to_string())),
        }
    }

    /// Statuses that represent ongoing work (rendered animated).
    pub fn is_working(&self) -> bool {
        matches!(
            self,
            AgentStatus::Active
                | AgentStatus::Thinking
                | AgentStatus::Searching
                | AgentStatus::Analyzing
        )
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgentStatus {
    type Err = AgentStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error when parsing an invalid agent status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentStatusParseError(pub String);

impl fmt::Display for AgentStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid agent status: {}", self.0)
    }
}

impl std::error::Error for AgentStatusParseError {}

// ============================================================================
// EDGE TYPE / STATUS
// ============================================================================

/// Relationship carried by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    #[default]
    Dependency,
    DataFlow,
    Parallel,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Dependency => "dependency",
            EdgeType::DataFlow => "data_flow",
            EdgeType::Parallel => "parallel",
        }
    }

    pub fn parse(s: &str) -> Result<Self, EdgeTypeParseError> {
        match normalize_token(s).as_str() {
            "dependency" | "depends_on" => Ok(EdgeType::Dependency),
            "data_flow" | "dataflow" => Ok(EdgeType::DataFlow),
            "parallel" => Ok(EdgeType::Parallel),
            _ => Err(EdgeTypeParseError(s.to_string())),
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EdgeType {
    type Err = EdgeTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error when parsing an invalid edge type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeTypeParseError(pub String);

impl fmt::Display for EdgeTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid edge type: {}", self.0)
    }
}

impl std::error::Error for EdgeTypeParseError {}

/// Lifecycle of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStatus {
    /// Implied by the hierarchy, no work handed over yet
    #[default]
    Pending,
    /// Work delegated and in flight
    Active,
    /// Delegated work returned
    Completed,
}

impl EdgeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeStatus::Pending => "pending",
            EdgeStatus::Active => "active",
            EdgeStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, EdgeStatusParseError> {
        match normalize_token(s).as_str() {
            "pending" | "waiting" => Ok(EdgeStatus::Pending),
            "active" | "running" | "in_progress" => Ok(EdgeStatus::Active),
            "completed" | "complete" | "done" => Ok(EdgeStatus::Completed),
            _ => Err(EdgeStatusParseError(s.to_string())),
        }
    }
}

impl fmt::Display for EdgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EdgeStatus {
    type Err = EdgeStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error when parsing an invalid edge status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeStatusParseError(pub String);

impl fmt::Display for EdgeStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid edge status: {}", self.0)
    }
}

impl std::error::Error for EdgeStatusParseError {}

// ============================================================================
// REQUEST STATUS
// ============================================================================

/// Overall status of one analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Active,
    Completed,
    Error,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Active => "active",
            RequestStatus::Completed => "completed",
            RequestStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Result<Self, RequestStatusParseError> {
        match normalize_token(s).as_str() {
            "active" | "running" | "pending" | "in_progress" | "processing" => {
                Ok(RequestStatus::Active)
            }
            "completed" | "complete" | "done" | "success" => Ok(RequestStatus::Completed),
            "error" | "failed" | "failure" => Ok(RequestStatus::Error),
            _ => Err(RequestStatusParseError(s.to_string())),
        }
    }

    /// Check if the request reached a state after which no updates follow.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Error)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = RequestStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error when parsing an invalid request status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestStatusParseError(pub String);

impl fmt::Display for RequestStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid request status: {}", self.0)
    }
}

impl std::error::Error for RequestStatusParseError {}

/// Lower-case and unify `-`/space separators to `_`.
fn normalize_token(s: &str) -> String {
    s.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_status_round_trips_through_display() {
        for status in AgentStatus::ALL {
            assert_eq!(status.to_string().parse::<AgentStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_agent_status_aliases() {
        assert_eq!(AgentStatus::parse("Running"), Ok(AgentStatus::Active));
        assert_eq!(AgentStatus::parse("in-progress"), Ok(AgentStatus::Active));
        assert_eq!(AgentStatus::parse("DONE"), Ok(AgentStatus::Completed));
        assert_eq!(AgentStatus::parse("failed"), Ok(AgentStatus::Error));
        assert_eq!(AgentStatus::parse("pending"), Ok(AgentStatus::Idle));
        assert!(AgentStatus::parse("sleeping").is_err());
    }

    #[test]
    fn test_working_statuses() {
        assert!(AgentStatus::Thinking.is_working());
        assert!(AgentStatus::Active.is_working());
        assert!(!AgentStatus::Idle.is_working());
        assert!(!AgentStatus::Completed.is_working());
        assert!(!AgentStatus::Error.is_working());
    }

    #[test]
    fn test_edge_type_parse() {
        assert_eq!(EdgeType::parse("data-flow"), Ok(EdgeType::DataFlow));
        assert_eq!(EdgeType::parse("Parallel"), Ok(EdgeType::Parallel));
        assert_eq!(
            EdgeType::parse("sideways"),
            Err(EdgeTypeParseError("sideways".to_string()))
        );
    }

    #[test]
    fn test_agent_kind_display_uses_hyphen() {
        assert_eq!(AgentKind::DivisionLead.to_string(), "division-lead");
        assert_eq!(AgentKind::parse("division-lead"), Ok(AgentKind::DivisionLead));
    }

    #[test]
    fn test_agent_kind_wire_form_matches_display() {
        for kind in [
            AgentKind::Orchestrator,
            AgentKind::DivisionLead,
            AgentKind::Worker,
            AgentKind::Tool,
        ] {
            let json = serde_json::to_string(&kind).expect("serialize");
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        let legacy: AgentKind = serde_json::from_str("\"division_lead\"").expect("alias");
        assert_eq!(legacy, AgentKind::DivisionLead);
    }

    #[test]
    fn test_request_status_terminal() {
        assert!(!RequestStatus::Active.is_terminal());
        assert!(RequestStatus::Completed.is_terminal());
        assert!(RequestStatus::parse("failed").map(|s| s.is_terminal()).unwrap_or(false));
    }
}
