//! # patchscope kernel
//!
//! Decides which installed items need updating and which patches fix which
//! tracked issues.
//!
//! The kernel owns no data and mutates nothing. Patch metadata comes from a
//! [`PatchIndex`], versions and install requests go through a [`Resolver`];
//! both are traits so the pool backend stays swappable.
//!
//! ## Flow
//!
//! ```text
//! CLI flags ──► IssueSpecSet ──► IssueMatcher ──┬─► listing (matches + text fallback)
//!                                               └─► mark_updates_by_issue ──► Resolver
//!
//! PatchIndex ──► mark_patch_updates ──► Resolver
//!
//! Resolver ──► find_updates (plan for packages, version scan otherwise)
//! PatchIndex ──► list_patch_updates / patch_check
//! ```

pub mod candidates;
pub mod edition;
pub mod error;
pub mod filter;
pub mod issue;
pub mod marking;
pub mod matcher;
pub mod model;
pub mod patches;
pub mod query;
pub mod resolver;
pub mod result;
pub mod status;

#[cfg(test)]
mod test_support;

pub use candidates::{KindCandidates, find_updates, find_updates_of_kind};
pub use edition::{Edition, EditionParseError};
pub use error::KernelError;
pub use filter::PatchFilter;
pub use issue::{IssueRef, IssueScanWarning, IssueSpecSet, Selector, issue_filter_flags};
pub use marking::{
    IssueMarkReport, IssueOutcome, MarkingRun, PatchMarkRun, mark_patch_updates,
    mark_updates_by_issue,
};
pub use matcher::{FallbackMatch, IssueListing, IssueMatch, IssueMatcher};
pub use model::{
    Candidate, Identity, InstalledItem, InteractiveFlag, InteractiveFlags, PatchRecord,
    ReferenceEntry, RepoRef, ResKind, UpdateCandidate, ValidationState,
};
pub use patches::{PatchCheck, PatchListing, PatchRow, list_patch_updates, patch_check};
pub use query::{AttrQuery, MatchOptions, PatchAttribute, PatchIndex, QueryError, QueryHit};
pub use resolver::{
    FeedbackKind, PlannedItem, RequestFeedback, RequestOptions, Resolver, ResolverError,
};
pub use result::ResultCode;
pub use status::PatchStatus;
