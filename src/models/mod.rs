use serde::{Deserialize, Serialize};

pub mod entry;
pub mod report;

// Re-exports for convenience
pub use entry::*;
pub use report::*;

/// One listing row as read off the results page, before any normalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawListing {
    pub timestamp: String,
    pub title: String,
    pub description: String,
    pub image_src: Option<String>,
}

/// How a timestamp that does not parse as a calendar date is handled.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DateParsePolicy {
    /// Stop the run with an error. Pages exported before this one stay on disk.
    #[default]
    Abort,
    /// Log the listing and move on to the next one.
    Skip,
}
