//! Patch lifecycle status derived from solver validation and lock state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ValidationState;

/// Closed set of patch status labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatchStatus {
    Needed,
    Locked,
    Applied,
    NotNeeded,
    Undetermined,
}

/// Map a validation state and lock flag to a status.
///
/// Total and pure: the same inputs always give the same status.
pub fn classify(validation: ValidationState, locked: bool) -> PatchStatus {
    match validation {
        ValidationState::Broken if locked => PatchStatus::Locked,
        ValidationState::Broken => PatchStatus::Needed,
        ValidationState::Satisfied => PatchStatus::Applied,
        ValidationState::Nonrelevant => PatchStatus::NotNeeded,
        ValidationState::Undetermined => PatchStatus::Undetermined,
    }
}

impl PatchStatus {
    /// Default content of every patch list: needed and not locked.
    pub fn is_applicable(self) -> bool {
        self == PatchStatus::Needed
    }

    /// Label for human-readable tables.
    pub fn label(self) -> &'static str {
        match self {
            PatchStatus::Needed => "needed",
            PatchStatus::Locked => "locked",
            PatchStatus::Applied => "applied",
            PatchStatus::NotNeeded => "not needed",
            PatchStatus::Undetermined => "undetermined",
        }
    }

    /// Label for structured markup attributes.
    pub fn markup_label(self) -> &'static str {
        match self {
            PatchStatus::Needed => "needed",
            PatchStatus::Locked => "locked",
            PatchStatus::Applied => "applied",
            PatchStatus::NotNeeded => "not-needed",
            PatchStatus::Undetermined => "undetermined",
        }
    }
}

impl fmt::Display for PatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
