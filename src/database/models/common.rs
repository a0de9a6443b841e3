//! Common shared models.

use serde::{Deserialize, Serialize};

/// An inline button attached to a filter reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterButton {
    /// Button text
    pub label: String,
    /// URL to open when clicked
    pub target: String,
    /// Put this button on the same row as the previous one
    #[serde(default)]
    pub same_row: bool,
}

impl FilterButton {
    /// Create a new button.
    pub fn new(label: impl Into<String>, target: impl Into<String>, same_row: bool) -> Self {
        Self {
            label: label.into(),
            target: target.into(),
            same_row,
        }
    }
}
