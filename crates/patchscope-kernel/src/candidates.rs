//! Update candidate selection per resource kind.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::model::{ResKind, UpdateCandidate, compare_by_nvra};
use crate::resolver::{Resolver, ResolverError};

/// Update candidates of one kind, sorted by NVRA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindCandidates {
    pub kind: ResKind,
    pub candidates: Vec<UpdateCandidate>,
}

/// Select update candidates for every kind in `kinds`.
///
/// An empty kind set yields nothing.
pub fn find_updates<R: Resolver + ?Sized>(
    resolver: &R,
    kinds: &BTreeSet<ResKind>,
    include_all: bool,
) -> Result<Vec<KindCandidates>, ResolverError> {
    if kinds.is_empty() {
        tracing::warn!("no resource kinds requested; nothing to look up");
        return Ok(Vec::new());
    }
    kinds
        .iter()
        .map(|kind| {
            Ok(KindCandidates {
                kind: kind.clone(),
                candidates: find_updates_of_kind(resolver, kind, include_all)?,
            })
        })
        .collect()
}

/// Select update candidates of a single kind.
///
/// Packages follow the resolver's best-effort plan unless `include_all`
/// asks for every newer version regardless of dependencies.
pub fn find_updates_of_kind<R: Resolver + ?Sized>(
    resolver: &R,
    kind: &ResKind,
    include_all: bool,
) -> Result<Vec<UpdateCandidate>, ResolverError> {
    let mut found = if kind.is_dependency_sensitive() && !include_all {
        from_update_plan(resolver, kind)?
    } else {
        from_version_scan(resolver, kind)?
    };

    found.sort_by(|a, b| nvra_order(a, b));
    found.dedup_by(|a, b| nvra_order(a, b) == Ordering::Equal);
    tracing::debug!(%kind, count = found.len(), "update candidates selected");
    Ok(found)
}

fn from_update_plan<R: Resolver + ?Sized>(
    resolver: &R,
    kind: &ResKind,
) -> Result<Vec<UpdateCandidate>, ResolverError> {
    let installed = resolver.installed(kind)?;
    let mut found = Vec::new();
    for item in resolver.best_effort_update_plan()? {
        if !item.selected_for_install || item.candidate.kind() != kind {
            continue;
        }
        // Plan items without an installed counterpart are new installs.
        let Some(current) = installed
            .iter()
            .find(|i| i.identity == item.candidate.identity)
        else {
            tracing::debug!(name = item.candidate.name(), "planned item is a new install");
            continue;
        };
        found.push(UpdateCandidate {
            candidate: item.candidate,
            installed: Some(current.clone()),
        });
    }
    Ok(found)
}

fn from_version_scan<R: Resolver + ?Sized>(
    resolver: &R,
    kind: &ResKind,
) -> Result<Vec<UpdateCandidate>, ResolverError> {
    let mut found = Vec::new();
    for current in resolver.installed(kind)? {
        let Some(candidate) = resolver.highest_available_version(&current.identity)? else {
            continue;
        };
        if candidate.is_newer_than(&current) {
            found.push(UpdateCandidate {
                candidate,
                installed: Some(current),
            });
        }
    }
    Ok(found)
}

fn nvra_order(a: &UpdateCandidate, b: &UpdateCandidate) -> Ordering {
    let a = &a.candidate;
    let b = &b.candidate;
    compare_by_nvra(
        (a.name(), &a.edition, a.arch.as_str()),
        (b.name(), &b.edition, b.arch.as_str()),
    )
}
