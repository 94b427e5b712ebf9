//! Mark patches for installation by the issues they fix.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::KernelError;
use crate::issue::{IssueRef, IssueSpecSet, Selector, TRACKER_BUGZILLA, TRACKER_CVE};
use crate::matcher::IssueMatcher;
use crate::patches::list_patch_updates;
use crate::query::PatchIndex;
use crate::resolver::{RequestFeedback, RequestOptions, Resolver};
use crate::result::ResultCode;

/// Final state of one issue predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueOutcome {
    Found,
    NotFound,
}

/// What happened while marking fixes for one predicate.
#[derive(Debug, Clone)]
pub struct IssueMarkReport {
    pub issue: IssueRef,
    pub outcome: IssueOutcome,
    /// Idents of the patches the resolver accepted.
    pub requested: Vec<String>,
    /// Feedback the resolver recorded for this predicate's requests.
    pub feedback: Vec<RequestFeedback>,
}

impl IssueMarkReport {
    /// User message for a predicate nothing was marked for.
    pub fn not_found_message(&self) -> Option<String> {
        match self.outcome {
            IssueOutcome::Found => None,
            IssueOutcome::NotFound => Some(not_found_message(&self.issue)),
        }
    }
}

/// Reports for every predicate plus the merged result code.
#[derive(Debug, Clone, Default)]
pub struct MarkingRun {
    pub reports: Vec<IssueMarkReport>,
    pub result: ResultCode,
}

impl MarkingRun {
    pub fn found(&self) -> impl Iterator<Item = &IssueMarkReport> {
        self.reports
            .iter()
            .filter(|r| r.outcome == IssueOutcome::Found)
    }
}

/// "Fix for ... was not found or is not needed." for `issue`.
///
/// A wildcard id drops the issue number from the sentence.
pub fn not_found_message(issue: &IssueRef) -> String {
    let tracker = match issue.tracker.as_specific() {
        Some(TRACKER_BUGZILLA) => "bugzilla ",
        Some(TRACKER_CVE) => "CVE ",
        Some(tracker) => return tracker_message(tracker, &issue.id),
        None => "",
    };
    match issue.id.as_specific() {
        Some(id) => format!("Fix for {tracker}issue number {id} was not found or is not needed."),
        None => format!("Fix for any {tracker}issue was not found or is not needed."),
    }
}

fn tracker_message(tracker: &str, id: &Selector) -> String {
    match id.as_specific() {
        Some(id) => format!("Fix for {tracker} issue number {id} was not found or is not needed."),
        None => format!("Fix for any {tracker} issue was not found or is not needed."),
    }
}

/// Request installation of every patch fixing one of `issues`.
///
/// Each predicate is evaluated on its own; a predicate with no accepted
/// request merges [`ResultCode::CapabilityNotFound`] into the run result.
/// Collaborator failures abort the run; requests already made stand.
pub fn mark_updates_by_issue<I, R>(
    index: &I,
    resolver: &mut R,
    issues: &IssueSpecSet,
    options: &RequestOptions,
) -> Result<MarkingRun, KernelError>
where
    I: PatchIndex + ?Sized,
    R: Resolver + ?Sized,
{
    let matcher = IssueMatcher::new(index);
    let mut run = MarkingRun::default();

    for issue in issues.iter() {
        let mut requested = Vec::new();
        let mut attempted = BTreeSet::new();
        for hit in matcher.match_for_marking(issue)? {
            let ident = hit.patch.ident();
            // A patch listing the issue twice is requested once.
            if !attempted.insert(ident.clone()) {
                continue;
            }
            tracing::debug!(%issue, patch = %ident, "requesting patch install");
            if resolver.request_patch_install(hit.patch, options)? {
                requested.push(ident);
            }
        }

        let outcome = if requested.is_empty() {
            run.result = run.result.merge(ResultCode::CapabilityNotFound);
            IssueOutcome::NotFound
        } else {
            IssueOutcome::Found
        };
        run.reports.push(IssueMarkReport {
            issue: issue.clone(),
            outcome,
            requested,
            feedback: resolver.take_feedback(),
        });
    }
    Ok(run)
}

/// Result of marking every needed patch.
#[derive(Debug, Clone, Default)]
pub struct PatchMarkRun {
    /// Idents of the patches the resolver accepted.
    pub requested: Vec<String>,
    pub feedback: Vec<RequestFeedback>,
    /// Needed patches left for a later run because the update stack goes first.
    pub deferred: usize,
    pub result: ResultCode,
}

/// Request installation of every needed patch accepted by the options' filter.
///
/// Pending update-stack patches (or `updatestack_only`) limit the run to the
/// update-stack group. Refusing every attempted request yields
/// [`ResultCode::CapabilityNotFound`]; nothing to do is `Ok`.
pub fn mark_patch_updates<I, R>(
    index: &I,
    resolver: &mut R,
    options: &RequestOptions,
    updatestack_only: bool,
) -> Result<PatchMarkRun, KernelError>
where
    I: PatchIndex + ?Sized,
    R: Resolver + ?Sized,
{
    let listing = list_patch_updates(index, false, &options.filter);
    let mut run = PatchMarkRun::default();

    let rows = if updatestack_only || !listing.update_stack.is_empty() {
        run.deferred = listing.other.len();
        &listing.update_stack
    } else {
        &listing.other
    };
    if run.deferred > 0 {
        tracing::info!(deferred = run.deferred, "update stack goes first");
    }

    for row in rows {
        if resolver.request_patch_install(row.patch, options)? {
            run.requested.push(row.patch.ident());
        }
    }
    run.feedback = resolver.take_feedback();
    if !rows.is_empty() && run.requested.is_empty() {
        run.result = ResultCode::CapabilityNotFound;
    }
    Ok(run)
}
