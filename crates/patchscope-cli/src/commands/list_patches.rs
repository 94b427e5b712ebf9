use crate::cli::{IssueArgs, PatchFilterArgs};
use crate::config::{OutputFormat, Settings};
use crate::render::{
    Cell, Style, Table, fallback_match_json, issue_match_json, patch_json, patch_update_xml,
    update_status_xml,
};
use crate::support::{emit_json, kernel_or_exit, load_pool_or_exit};
use patchscope_kernel::{
    IssueListing, IssueMatcher, IssueScanWarning, PatchListing, PatchRow, list_patch_updates,
};
use serde_json::{Value, json};
use std::collections::BTreeSet;

pub fn run(
    settings: &Settings,
    issues: IssueArgs,
    filter: PatchFilterArgs,
    all: bool,
    repos: Vec<String>,
    xml: bool,
) {
    let (issues, warnings) = issues.scan();
    let pool = load_pool_or_exit(settings, &repos);
    let filter = filter.to_filter();
    let output = settings.output_for(xml);
    let snapshot_ref = pool.snapshot_ref();

    if issues.is_empty() {
        let listing = list_patch_updates(&pool, all, &filter);
        match output {
            OutputFormat::Json => emit_json(&json!({
                "action": "list-patches",
                "snapshotRef": snapshot_ref,
                "includeAll": all,
                "count": listing.len(),
                "patches": patch_listing_json(&listing)
            })),
            OutputFormat::Xml => {
                let (updates, blocked) = patch_listing_xml(&listing, all);
                println!("{}", update_status_xml(&updates, blocked.as_deref()));
            }
            OutputFormat::Human => {
                print_patch_listing(&listing, &Style::from_settings(settings));
            }
        }
        return;
    }

    let listing = kernel_or_exit(IssueMatcher::new(&pool).list(&issues, all, &filter));
    match output {
        OutputFormat::Json => emit_json(&json!({
            "action": "list-patches",
            "snapshotRef": snapshot_ref,
            "includeAll": all,
            "issues": issues.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "warnings": warning_messages(&warnings),
            "matches": listing.matches.iter().map(issue_match_json).collect::<Vec<_>>(),
            "descriptionMatches": listing.fallback.iter().map(fallback_match_json).collect::<Vec<_>>(),
            "textSearched": listing.text_searched.iter().map(ToString::to_string).collect::<Vec<_>>()
        })),
        OutputFormat::Xml => {
            let updates = issue_listing_xml(&listing);
            println!("{}", update_status_xml(&updates, None));
        }
        OutputFormat::Human => print_issue_listing(&listing, &Style::from_settings(settings)),
    }
}

pub(crate) fn warning_messages(warnings: &[IssueScanWarning]) -> Vec<String> {
    warnings.iter().map(ToString::to_string).collect()
}

pub(crate) fn patch_table(rows: &[PatchRow<'_>]) -> Table {
    let mut table = Table::new(&[
        "Repository",
        "Name",
        "Category",
        "Severity",
        "Interactive",
        "Status",
        "Summary",
    ]);
    for row in rows {
        let patch = row.patch;
        table.push(vec![
            Cell::plain(patch.repository.as_user_string()),
            Cell::plain(patch.name.as_str()),
            Cell::highlighted(&patch.category),
            Cell::highlighted(&patch.severity),
            Cell::plain(patch.interactive_flags().to_string()),
            Cell::plain(row.status.label()),
            Cell::plain(patch.summary.as_str()),
        ]);
    }
    table
}

/// Print both patch groups, the update stack first.
pub(crate) fn print_patch_listing(listing: &PatchListing<'_>, style: &Style) {
    let stack_pending = !listing.update_stack.is_empty();
    if stack_pending {
        if !listing.other.is_empty() {
            println!("The following software management updates will be installed first:");
            println!();
        }
        println!("{}", patch_table(&listing.update_stack).render(style));
    }

    if listing.other.is_empty() {
        if !stack_pending {
            println!("No updates found.");
        }
        return;
    }
    if stack_pending {
        println!();
        println!("The following updates are also available:");
    }
    println!();
    println!("{}", patch_table(&listing.other).render(style));
}

/// `<update>` elements of a listing, plus the blocked ones when the update
/// stack hides the rest.
pub(crate) fn patch_listing_xml(
    listing: &PatchListing<'_>,
    include_all: bool,
) -> (Vec<String>, Option<Vec<String>>) {
    let render = |rows: &[PatchRow<'_>]| -> Vec<String> {
        rows.iter()
            .map(|row| patch_update_xml(row.patch, row.status))
            .collect()
    };
    if !include_all && !listing.update_stack.is_empty() {
        (render(&listing.update_stack), Some(render(&listing.other)))
    } else {
        (render(&listing.other), None)
    }
}

pub(crate) fn patch_listing_json(listing: &PatchListing<'_>) -> Value {
    let rows = |rows: &[PatchRow<'_>]| -> Vec<Value> {
        rows.iter()
            .map(|row| patch_json(row.patch, row.status))
            .collect()
    };
    json!({
        "updateStack": rows(&listing.update_stack),
        "other": rows(&listing.other)
    })
}

fn print_issue_listing(listing: &IssueListing<'_>, style: &Style) {
    if listing.is_empty() {
        println!("No matching issues found.");
        return;
    }

    if !listing.matches.is_empty() {
        let mut table = Table::new(&[
            "Issue",
            "No.",
            "Patch",
            "Category",
            "Severity",
            "Interactive",
            "Status",
        ]);
        for row in &listing.matches {
            table.push(vec![
                Cell::plain(row.ref_type.as_str()),
                Cell::plain(row.ref_id.as_str()),
                Cell::plain(row.patch.name.as_str()),
                Cell::highlighted(&row.patch.category),
                Cell::highlighted(&row.patch.severity),
                Cell::plain(row.patch.interactive_flags().to_string()),
                Cell::plain(row.status.label()),
            ]);
        }
        if !listing.text_searched.is_empty() {
            println!();
            println!("The following matches in issue numbers have been found:");
        }
        println!();
        println!("{}", table.render(style));
    }

    if !listing.fallback.is_empty() {
        let mut table = Table::new(&["Name", "Category", "Severity", "Interactive", "Summary"]);
        for row in &listing.fallback {
            table.push(vec![
                Cell::plain(row.patch.name.as_str()),
                Cell::highlighted(&row.patch.category),
                Cell::highlighted(&row.patch.severity),
                Cell::plain(row.patch.interactive_flags().to_string()),
                Cell::plain(row.patch.summary.as_str()),
            ]);
        }
        if !listing.matches.is_empty() {
            println!();
        }
        println!("Matches in patch descriptions of the following patches have been found:");
        println!();
        println!("{}", table.render(style));
    }
}

/// Matched patches as `<update>` elements, each patch once.
fn issue_listing_xml(listing: &IssueListing<'_>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let matched = listing.matches.iter().map(|m| (m.patch, m.status));
    let fallback = listing.fallback.iter().map(|f| (f.patch, f.status));
    matched
        .chain(fallback)
        .filter(|(patch, _)| seen.insert(patch.ident()))
        .map(|(patch, status)| patch_update_xml(patch, status))
        .collect()
}
