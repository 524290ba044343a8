use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a node as reported by the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Known locally, not yet confirmed by the controller.
    #[default]
    Created,
    Started,
    Stopped,
    Suspended,
}

impl NodeStatus {
    /// Parses the `status` string of a controller response.
    pub fn from_controller(status: &str) -> Option<Self> {
        match status {
            "started" => Some(NodeStatus::Started),
            "stopped" => Some(NodeStatus::Stopped),
            "suspended" => Some(NodeStatus::Suspended),
            _ => None,
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeStatus::Created => "created",
            NodeStatus::Started => "started",
            NodeStatus::Stopped => "stopped",
            NodeStatus::Suspended => "suspended",
        };
        f.write_str(s)
    }
}
