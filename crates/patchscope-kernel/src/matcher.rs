//! Issue matching: resolve issue predicates against patch references.
//!
//! The index only ORs conditions, so every query is treated as a candidate
//! superset and the reference entries of each hit are post-filtered against
//! the predicate. Listing runs a second, text-only pass for "any tracker"
//! predicates; those fallback hits are informational and never drive
//! installation.

use std::collections::BTreeSet;

use crate::filter::PatchFilter;
use crate::issue::{IssueRef, IssueSpecSet, Selector};
use crate::model::{PatchRecord, ReferenceEntry};
use crate::query::{AttrQuery, MatchOptions, PatchAttribute, PatchIndex, QueryError};
use crate::status::PatchStatus;

/// A verified `(reference, patch)` match for one predicate.
#[derive(Debug, Clone)]
pub struct IssueMatch<'a> {
    pub issue: IssueRef,
    pub ref_type: String,
    pub ref_id: String,
    pub patch: &'a PatchRecord,
    pub status: PatchStatus,
}

/// A patch whose summary or description mentions a predicate's id.
#[derive(Debug, Clone)]
pub struct FallbackMatch<'a> {
    pub issue: IssueRef,
    pub patch: &'a PatchRecord,
    pub status: PatchStatus,
}

/// Result of matching a predicate set in listing mode.
#[derive(Debug, Clone, Default)]
pub struct IssueListing<'a> {
    /// Verified reference matches, sorted by reference id.
    pub matches: Vec<IssueMatch<'a>>,
    /// Text matches, sorted by patch name.
    pub fallback: Vec<FallbackMatch<'a>>,
    /// Predicates that were looked up in patch texts.
    pub text_searched: Vec<IssueRef>,
}

impl IssueListing<'_> {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty() && self.fallback.is_empty()
    }
}

/// Issue matcher over one patch index.
pub struct IssueMatcher<'a, I: ?Sized> {
    index: &'a I,
}

impl<'a, I: PatchIndex + ?Sized> IssueMatcher<'a, I> {
    pub fn new(index: &'a I) -> Self {
        Self { index }
    }

    /// Listing mode: case-insensitive substring matching, both passes.
    ///
    /// Only applicable patches are considered unless `include_all` is set;
    /// `filter` applies in both passes.
    pub fn list(
        &self,
        issues: &IssueSpecSet,
        include_all: bool,
        filter: &PatchFilter,
    ) -> Result<IssueListing<'a>, QueryError> {
        let options = MatchOptions::substring();
        let accept = |patch: &PatchRecord| {
            if !include_all && !patch.status().is_applicable() {
                return false;
            }
            if !filter.accepts(patch) {
                tracing::debug!(patch = %patch.ident(), "skipped (not matching patch filter)");
                return false;
            }
            true
        };

        let mut listing = IssueListing::default();
        for issue in issues.iter() {
            let text_search = issue.is_any_tracker_specific_id();
            let mut rows = self.reference_matches(issue, options, text_search, &accept)?;
            listing.matches.append(&mut rows);
            if text_search {
                listing.text_searched.push(issue.clone());
            }
        }

        let mut seen = BTreeSet::new();
        for issue in &listing.text_searched {
            let Some(id) = issue.id.as_specific() else {
                continue;
            };
            for patch in self.index.query_free_text(id, options)? {
                if !accept(patch) || !seen.insert(patch.ident()) {
                    continue;
                }
                listing.fallback.push(FallbackMatch {
                    issue: issue.clone(),
                    patch,
                    status: patch.status(),
                });
            }
        }

        listing.matches.sort_by(|a, b| {
            a.ref_id
                .cmp(&b.ref_id)
                .then_with(|| a.patch.name.cmp(&b.patch.name))
                .then_with(|| a.ref_type.cmp(&b.ref_type))
        });
        listing
            .fallback
            .sort_by(|a, b| a.patch.name.cmp(&b.patch.name));
        Ok(listing)
    }

    /// Marking mode: case-insensitive exact matching, references only.
    ///
    /// Accepts every patch the solver reports as needing an update, locked
    /// or not; lock and filter decisions belong to the request layer.
    pub fn match_for_marking(&self, issue: &IssueRef) -> Result<Vec<IssueMatch<'a>>, QueryError> {
        let accept = |patch: &PatchRecord| patch.validation.is_broken();
        let mut rows = self.reference_matches(issue, MatchOptions::exact(), false, &accept)?;
        rows.sort_by(|a, b| a.ref_id.cmp(&b.ref_id));
        Ok(rows)
    }

    fn reference_matches(
        &self,
        issue: &IssueRef,
        options: MatchOptions,
        id_matches_type: bool,
        accept: &dyn Fn(&PatchRecord) -> bool,
    ) -> Result<Vec<IssueMatch<'a>>, QueryError> {
        tracing::debug!(%issue, "querying patch references");
        let query = reference_query(issue, options, id_matches_type);

        let mut rows = Vec::new();
        for hit in self.index.query(&query)? {
            if !accept(hit.patch) {
                continue;
            }
            for entry in hit.matches {
                if !entry_satisfies(issue, entry, options, id_matches_type) {
                    continue;
                }
                rows.push(IssueMatch {
                    issue: issue.clone(),
                    ref_type: entry.ref_type.clone(),
                    ref_id: entry.ref_id.clone(),
                    patch: hit.patch,
                    status: hit.patch.status(),
                });
            }
        }
        Ok(rows)
    }
}

fn reference_query(issue: &IssueRef, options: MatchOptions, id_matches_type: bool) -> AttrQuery {
    let query = AttrQuery::new(options);
    match (&issue.tracker, &issue.id) {
        (Selector::Specific(tracker), Selector::Any) => {
            query.attribute(PatchAttribute::ReferenceType, tracker.as_str())
        }
        (_, id) => {
            let id = id.as_specific().unwrap_or_default();
            let query = query.attribute(PatchAttribute::ReferenceId, id);
            if id_matches_type {
                // Lets `--issues=bugzilla` match the tracker itself.
                query.attribute(PatchAttribute::ReferenceType, id)
            } else {
                query
            }
        }
    }
}

/// AND of the predicate's specific fields over one reference entry.
fn entry_satisfies(
    issue: &IssueRef,
    entry: &ReferenceEntry,
    options: MatchOptions,
    id_matches_type: bool,
) -> bool {
    if let Some(tracker) = issue.tracker.as_specific() {
        if entry.ref_type != tracker {
            return false;
        }
    }
    if let Some(id) = issue.id.as_specific() {
        let by_id = options.matches(&entry.ref_id, id);
        let by_type = id_matches_type && options.matches(&entry.ref_type, id);
        if !by_id && !by_type {
            return false;
        }
    }
    true
}
