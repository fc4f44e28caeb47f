//! Meridian Core - Agent Graph Types
//!
//! Pure data structures shared by the normalizer, the synchronizer and the
//! terminal front end. This crate contains ONLY data types and their
//! string forms - no folding logic.

mod agent;
mod edge;
mod enums;
mod event;

pub use agent::{display_name_from_id, AgentMetrics, AgentNode};
pub use edge::{Edge, EdgeKey};
pub use enums::{
    AgentKind, AgentKindParseError, AgentStatus, AgentStatusParseError, EdgeStatus,
    EdgeStatusParseError, EdgeType, EdgeTypeParseError, RequestStatus, RequestStatusParseError,
};
pub use event::{
    Citation, EventKind, EventPayload, NormalizedEvent, ProgressKind, SyncedAgent,
};

use chrono::{SecondsFormat, Utc};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Stable agent identifier, unique per agent within one analysis request.
pub type AgentId = String;

/// Current time rendered the way upstream frames carry it (RFC 3339, millis).
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// WELL-KNOWN AGENTS
// ============================================================================

/// Orchestrator id every other agent ultimately reports to.
pub const ORCHESTRATOR_ID: &str = "CEO";

/// Division lead for research workers.
pub const RESEARCH_LEADER_ID: &str = "Research_Leader";

/// Division lead for analysis and technical workers.
pub const ANALYSIS_LEADER_ID: &str = "Analysis_Leader";

/// Division lead for strategy and portfolio workers.
pub const STRATEGY_LEADER_ID: &str = "Strategy_Leader";
