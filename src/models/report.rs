use serde::{Deserialize, Serialize};

use crate::navigation::NavigationStep;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// A listing older than the cutoff date was reached.
    CutoffReached,
    /// No usable "next page" control was found.
    NoMorePages,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed { stop: StopReason },
    Aborted { step: NavigationStep, reason: String },
}

/// Summary of a single run, logged once the session has been released.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub pages_visited: usize,
    pub entries_kept: usize,
    pub images_saved: usize,
}

impl RunReport {
    pub fn aborted(step: NavigationStep, reason: impl Into<String>) -> Self {
        Self {
            outcome: RunOutcome::Aborted {
                step,
                reason: reason.into(),
            },
            pages_visited: 0,
            entries_kept: 0,
            images_saved: 0,
        }
    }
}
