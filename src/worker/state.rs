//! Cache manager lifecycle state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a cache manager
///
/// ```text
/// New -> Installing -> Installed -> Activating -> Activated
///            |
///            +-> Failed
/// ```
///
/// Any non-terminal state may also become `Redundant` when a newer
/// manager takes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    New,
    Installing,
    Installed,
    Activating,
    Activated,
    Failed,
    Redundant,
}

impl WorkerState {
    /// Whether the lifecycle allows moving from `self` to `next`
    pub fn can_transition(self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (New, Installing)
                | (Installing, Installed)
                | (Installing, Failed)
                | (Installed, Activating)
                | (Activating, Activated)
                | (New | Installed | Activating | Activated, Redundant)
        )
    }

    /// Only an activated manager intercepts fetches
    pub fn intercepts_fetches(self) -> bool {
        self == WorkerState::Activated
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, WorkerState::Failed | WorkerState::Redundant)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkerState::New => "new",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Failed => "failed",
            WorkerState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
