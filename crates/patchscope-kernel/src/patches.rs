//! Patch listing and the patch-check summary.

use serde::Serialize;

use crate::filter::PatchFilter;
use crate::model::PatchRecord;
use crate::query::PatchIndex;
use crate::result::ResultCode;
use crate::status::PatchStatus;

/// One listed patch with its derived status.
#[derive(Debug, Clone)]
pub struct PatchRow<'a> {
    pub patch: &'a PatchRecord,
    pub status: PatchStatus,
}

/// Patches to show, split into the update-stack group and the rest.
#[derive(Debug, Clone, Default)]
pub struct PatchListing<'a> {
    /// Patches that update the package manager itself; installed first.
    pub update_stack: Vec<PatchRow<'a>>,
    pub other: Vec<PatchRow<'a>>,
}

impl PatchListing<'_> {
    pub fn is_empty(&self) -> bool {
        self.update_stack.is_empty() && self.other.is_empty()
    }

    pub fn len(&self) -> usize {
        self.update_stack.len() + self.other.len()
    }
}

/// List applicable patches (every patch with `include_all`) accepted by
/// `filter`.
///
/// With `include_all` there is no update-stack group.
pub fn list_patch_updates<'a, I: PatchIndex + ?Sized>(
    index: &'a I,
    include_all: bool,
    filter: &PatchFilter,
) -> PatchListing<'a> {
    let mut listing = PatchListing::default();
    for patch in index.patches() {
        let status = patch.status();
        if !include_all && !status.is_applicable() {
            continue;
        }
        if !filter.accepts(patch) {
            tracing::debug!(patch = %patch.ident(), "skipped (not matching patch filter)");
            continue;
        }
        let row = PatchRow { patch, status };
        if !include_all && patch.restart_suggested {
            listing.update_stack.push(row);
        } else {
            listing.other.push(row);
        }
    }
    listing.update_stack.sort_by(|a, b| a.patch.name.cmp(&b.patch.name));
    listing.other.sort_by(|a, b| a.patch.name.cmp(&b.patch.name));
    listing
}

/// Counts behind `patch-check`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchCheck {
    pub needed: usize,
    pub security: usize,
    pub locked: usize,
}

impl PatchCheck {
    pub fn result_code(&self) -> ResultCode {
        if self.security > 0 {
            ResultCode::SecurityUpdatesNeeded
        } else if self.needed > 0 {
            ResultCode::UpdatesNeeded
        } else {
            ResultCode::Ok
        }
    }

    /// `N patch(es) needed (M security patch(es))`.
    pub fn needed_message(&self) -> String {
        format!(
            "{} {} needed ({} security {})",
            self.needed,
            plural_patch(self.needed),
            self.security,
            plural_patch(self.security)
        )
    }

    /// `N patch(es) locked`, or nothing when no patch is locked.
    pub fn locked_message(&self) -> Option<String> {
        (self.locked > 0).then(|| format!("{} {} locked", self.locked, plural_patch(self.locked)))
    }
}

fn plural_patch(count: usize) -> &'static str {
    if count == 1 { "patch" } else { "patches" }
}

/// Count needed, security and locked patches.
///
/// `updatestack_only` restricts the needed and security counts to
/// update-stack patches; locked patches are always counted.
pub fn patch_check<I: PatchIndex + ?Sized>(index: &I, updatestack_only: bool) -> PatchCheck {
    let mut check = PatchCheck::default();
    for patch in index.patches() {
        match patch.status() {
            PatchStatus::Needed if updatestack_only && !patch.restart_suggested => {}
            PatchStatus::Needed => {
                check.needed += 1;
                if patch.is_security() {
                    check.security += 1;
                }
            }
            PatchStatus::Locked => check.locked += 1,
            _ => {}
        }
    }
    check
}
