//! Command result codes and their monotonic merge.

use serde::Serialize;

/// Outcome of one command, ordered by severity.
///
/// Merging keeps the most severe code, so a later success never hides an
/// earlier "not found".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultCode {
    #[default]
    Ok,
    UpdatesNeeded,
    SecurityUpdatesNeeded,
    CapabilityNotFound,
    Failure,
}

impl ResultCode {
    pub fn merge(self, other: ResultCode) -> ResultCode {
        self.max(other)
    }

    /// Process exit status for this outcome.
    pub fn exit_code(self) -> i32 {
        match self {
            ResultCode::Ok => 0,
            ResultCode::Failure => 1,
            ResultCode::UpdatesNeeded => 100,
            ResultCode::SecurityUpdatesNeeded => 101,
            ResultCode::CapabilityNotFound => 104,
        }
    }
}
