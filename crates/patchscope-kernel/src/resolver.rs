//! Solver-facing surface: update planning, version lookup and install
//! requests.
//!
//! The kernel never commits anything. Requests only mark items; the
//! resolver owns the transaction.

use crate::filter::PatchFilter;
use crate::model::{Candidate, Identity, InstalledItem, PatchRecord, ResKind};

/// One item of a best-effort update plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedItem {
    pub candidate: Candidate,
    pub selected_for_install: bool,
}

/// Options forwarded with every patch install request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Request patches even when they are locked.
    pub force: bool,
    /// Refuse patches that need user interaction.
    pub skip_interactive: bool,
    /// Acceptance filter the request layer applies to each patch.
    pub filter: PatchFilter,
}

/// Feedback the request layer records for each request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFeedback {
    pub patch: String,
    pub kind: FeedbackKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    SetToInstall,
    AlreadyRequested,
    NotNeeded,
    Locked,
    InteractiveSkipped,
    Filtered,
}

impl RequestFeedback {
    pub fn message(&self) -> String {
        let patch = &self.patch;
        match self.kind {
            FeedbackKind::SetToInstall => format!("Patch '{patch}' marked for installation."),
            FeedbackKind::AlreadyRequested => {
                format!("Patch '{patch}' is already marked for installation.")
            }
            FeedbackKind::NotNeeded => format!("Patch '{patch}' is not needed."),
            FeedbackKind::Locked => format!(
                "Patch '{patch}' is locked. Use '--force' to install it, or unlock it."
            ),
            FeedbackKind::InteractiveSkipped => {
                format!("Patch '{patch}' is interactive, skipping.")
            }
            FeedbackKind::Filtered => {
                format!("Patch '{patch}' does not match the specified patch filter.")
            }
        }
    }
}

/// Failure reported by the resolver backend.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("unknown item: {0}")]
    UnknownItem(String),

    #[error("resolver backend failure: {0}")]
    Backend(String),
}

/// External dependency resolver and its request layer.
pub trait Resolver {
    /// Installed items of `kind`, one per identity.
    fn installed(&self, kind: &ResKind) -> Result<Vec<InstalledItem>, ResolverError>;

    /// Highest available (not installed) version of `identity`.
    fn highest_available_version(
        &self,
        identity: &Identity,
    ) -> Result<Option<Candidate>, ResolverError>;

    /// Dependency-consistent "update everything possible" proposal.
    fn best_effort_update_plan(&self) -> Result<Vec<PlannedItem>, ResolverError>;

    /// Ask for `patch` to be installed. Idempotent; `Ok(true)` when the patch
    /// is (or already was) marked.
    fn request_patch_install(
        &mut self,
        patch: &PatchRecord,
        options: &RequestOptions,
    ) -> Result<bool, ResolverError>;

    /// Drain feedback recorded since the last call.
    fn take_feedback(&mut self) -> Vec<RequestFeedback> {
        Vec::new()
    }
}
