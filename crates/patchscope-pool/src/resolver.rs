//! Patch request layer over a [`Pool`].

use patchscope_kernel::{
    Candidate, FeedbackKind, Identity, InstalledItem, PatchRecord, PlannedItem, RequestFeedback,
    RequestOptions, ResKind, Resolver, ResolverError,
};
use std::collections::BTreeSet;

use crate::pool::Pool;

/// Resolver backed by a pool snapshot.
///
/// Reads go straight to the pool; the request log lives here and is
/// discarded with the resolver.
#[derive(Debug, Clone)]
pub struct PoolResolver<'a> {
    pool: &'a Pool,
    requested: BTreeSet<String>,
    feedback: Vec<RequestFeedback>,
}

impl<'a> PoolResolver<'a> {
    pub fn new(pool: &'a Pool) -> Self {
        Self {
            pool,
            requested: BTreeSet::new(),
            feedback: Vec::new(),
        }
    }

    /// Idents of the patches marked for installation so far.
    pub fn requested(&self) -> impl Iterator<Item = &str> {
        self.requested.iter().map(String::as_str)
    }

    fn refusal(patch: &PatchRecord, options: &RequestOptions) -> Option<FeedbackKind> {
        if !patch.validation.is_broken() {
            Some(FeedbackKind::NotNeeded)
        } else if patch.locked && !options.force {
            Some(FeedbackKind::Locked)
        } else if options.skip_interactive && patch.is_interactive() {
            Some(FeedbackKind::InteractiveSkipped)
        } else if !options.filter.accepts(patch) {
            Some(FeedbackKind::Filtered)
        } else {
            None
        }
    }
}

impl Resolver for PoolResolver<'_> {
    fn installed(&self, kind: &ResKind) -> Result<Vec<InstalledItem>, ResolverError> {
        Ok(self.pool.installed(kind))
    }

    fn highest_available_version(
        &self,
        identity: &Identity,
    ) -> Result<Option<Candidate>, ResolverError> {
        Ok(self.pool.highest_available_version(identity))
    }

    fn best_effort_update_plan(&self) -> Result<Vec<PlannedItem>, ResolverError> {
        Ok(self.pool.best_effort_update_plan())
    }

    fn request_patch_install(
        &mut self,
        patch: &PatchRecord,
        options: &RequestOptions,
    ) -> Result<bool, ResolverError> {
        let ident = patch.ident();
        if let Some(kind) = Self::refusal(patch, options) {
            tracing::debug!(patch = %ident, ?kind, "patch request refused");
            self.feedback.push(RequestFeedback { patch: ident, kind });
            return Ok(false);
        }

        let kind = if self.requested.insert(ident.clone()) {
            FeedbackKind::SetToInstall
        } else {
            FeedbackKind::AlreadyRequested
        };
        self.feedback.push(RequestFeedback { patch: ident, kind });
        Ok(true)
    }

    fn take_feedback(&mut self) -> Vec<RequestFeedback> {
        std::mem::take(&mut self.feedback)
    }
}
