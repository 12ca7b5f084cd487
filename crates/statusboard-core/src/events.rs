use serde::{Deserialize, Serialize};

use crate::time::timestamp_now;

/// The only status label with special meaning. Every other label counts as
/// "not working".
pub const WORKING: &str = "working";

/// Displayed status for an agent with no log rows.
pub const IDLE: &str = "idle";

/// Displayed timestamp for an agent with no log rows.
pub const NEVER: &str = "never";

/// Agents tracked when no list is configured.
pub const DEFAULT_AGENT_NAMES: [&str; 10] = [
    "Python Agent",
    "Kubernetes Agent",
    "UI Agent",
    "Documentation Agent",
    "Testing Agent",
    "Terraform Agent",
    "Research Agent",
    "Terraform Deploy Agent",
    "GitOps Agent",
    "Time Tracking Agent",
];

/// One row of the status log.
///
/// Fields are kept as raw strings: the timestamp may be malformed and the
/// status label set is open. Field names match the CSV header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub agent_name: String,
    #[serde(default)]
    pub status: String,
}

impl StatusEvent {
    pub fn new(
        timestamp: impl Into<String>,
        agent_name: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            agent_name: agent_name.into(),
            status: status.into(),
        }
    }

    /// Build a record stamped with the current UTC time.
    pub fn now(agent_name: impl Into<String>, status: impl Into<String>) -> Self {
        Self::new(timestamp_now(), agent_name, status)
    }

    pub fn is_working(&self) -> bool {
        self.status == WORKING
    }
}

/// The default agent list as owned strings.
pub fn default_agents() -> Vec<String> {
    DEFAULT_AGENT_NAMES.iter().map(|s| s.to_string()).collect()
}
