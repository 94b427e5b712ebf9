use crate::cli::KindArg;
use crate::commands::list_patches::{patch_listing_json, patch_listing_xml, print_patch_listing};
use crate::config::{OutputFormat, Settings};
use crate::render::{
    Cell, Style, Table, candidate_json, candidate_update_xml, update_status_xml,
};
use crate::support::{emit_json, kernel_or_exit, load_pool_or_exit};
use patchscope_kernel::{
    KindCandidates, PatchFilter, ResKind, find_updates, list_patch_updates,
};
use serde_json::{Value, json};
use std::collections::BTreeSet;

/// Heading printed above each kind when several kinds are listed.
pub fn kind_heading(kind: &ResKind) -> &'static str {
    match kind {
        ResKind::Package => "Package updates",
        ResKind::Patch => "Patches",
        ResKind::Pattern => "Pattern updates",
        ResKind::Product => "Product updates",
        ResKind::Application => "Application updates",
    }
}

pub fn run(settings: &Settings, kinds: Vec<KindArg>, all: bool, repos: Vec<String>, xml: bool) {
    let kinds: BTreeSet<ResKind> = kinds.into_iter().map(KindArg::res_kind).collect();
    let pool = load_pool_or_exit(settings, &repos);
    let output = settings.output_for(xml);

    // Patches first: pending update-stack patches hide every other kind.
    let patches = kinds
        .contains(&ResKind::Patch)
        .then(|| list_patch_updates(&pool, all, &PatchFilter::default()));
    let stack_pending = patches
        .as_ref()
        .is_some_and(|listing| !listing.update_stack.is_empty());

    let other_kinds: BTreeSet<ResKind> = kinds
        .iter()
        .filter(|kind| **kind != ResKind::Patch)
        .cloned()
        .collect();
    let candidates: Vec<KindCandidates> = if stack_pending || other_kinds.is_empty() {
        if stack_pending {
            tracing::debug!("update stack patches pending; other kinds not listed");
        }
        Vec::new()
    } else {
        kernel_or_exit(find_updates(&pool.resolver(), &other_kinds, all))
    };

    match output {
        OutputFormat::Json => {
            let updates: Vec<Value> = candidates
                .iter()
                .map(|group| {
                    json!({
                        "kind": group.kind.as_str(),
                        "candidates": group.candidates.iter().map(candidate_json).collect::<Vec<_>>()
                    })
                })
                .collect();
            emit_json(&json!({
                "action": "list-updates",
                "snapshotRef": pool.snapshot_ref(),
                "includeAll": all,
                "updateStackPending": stack_pending,
                "patches": patches.as_ref().map(patch_listing_json),
                "updates": updates
            }));
        }
        OutputFormat::Xml => {
            let (mut updates, blocked) = match &patches {
                Some(listing) => patch_listing_xml(listing, all),
                None => (Vec::new(), None),
            };
            for group in &candidates {
                updates.extend(group.candidates.iter().map(candidate_update_xml));
            }
            println!("{}", update_status_xml(&updates, blocked.as_deref()));
        }
        OutputFormat::Human => {
            let style = Style::from_settings(settings);
            let headed = kinds.len() > 1;
            if let Some(listing) = &patches {
                if headed {
                    println!();
                    println!("{}", kind_heading(&ResKind::Patch));
                }
                print_patch_listing(listing, &style);
            }
            if stack_pending {
                return;
            }
            for group in &candidates {
                if headed {
                    println!();
                    println!("{}", kind_heading(&group.kind));
                    println!();
                }
                let table = candidate_table(group, !repos.is_empty());
                if table.is_empty() {
                    println!("No updates found.");
                } else {
                    println!("{}", table.render(&style));
                }
            }
        }
    }
}

/// Candidate rows; the repository column is left out when `--repo` already
/// fixes the source.
fn candidate_table(group: &KindCandidates, hide_repo: bool) -> Table {
    let is_package = group.kind == ResKind::Package;
    let mut header = vec!["S"];
    if !hide_repo {
        header.push("Repository");
    }
    header.push("Name");
    if is_package {
        header.push("Current Version");
    }
    header.extend(["Available Version", "Arch"]);

    let mut table = Table::new(&header);
    for update in &group.candidates {
        let candidate = &update.candidate;
        let mut row = vec![Cell::plain("v")];
        if !hide_repo {
            row.push(Cell::plain(candidate.repository.as_user_string()));
        }
        row.push(Cell::plain(candidate.name()));
        if is_package {
            let current = update
                .installed
                .as_ref()
                .map(|installed| installed.edition.to_string())
                .unwrap_or_default();
            row.push(Cell::plain(current));
        }
        row.push(Cell::plain(candidate.edition.to_string()));
        row.push(Cell::plain(candidate.arch.as_str()));
        table.push(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchscope_kernel::{Candidate, Identity, InstalledItem, RepoRef, UpdateCandidate};

    fn update(name: &str, old: &str, new: &str) -> UpdateCandidate {
        UpdateCandidate {
            candidate: Candidate {
                identity: Identity::new(ResKind::Package, name),
                edition: new.parse().expect("edition"),
                arch: "x86_64".to_string(),
                repository: RepoRef::new("repo-update"),
                summary: String::new(),
                description: String::new(),
                license_to_confirm: String::new(),
            },
            installed: Some(InstalledItem {
                identity: Identity::new(ResKind::Package, name),
                edition: old.parse().expect("edition"),
                arch: "x86_64".to_string(),
            }),
        }
    }

    #[test]
    fn headings_name_each_kind() {
        assert_eq!(kind_heading(&ResKind::Package), "Package updates");
        assert_eq!(kind_heading(&ResKind::Patch), "Patches");
        assert_eq!(kind_heading(&ResKind::Application), "Application updates");
    }

    #[test]
    fn package_table_shows_the_current_version() {
        let group = KindCandidates {
            kind: ResKind::Package,
            candidates: vec![update("openssl", "3.1.4-1", "3.1.4-2")],
        };
        let style = Style {
            color: false,
            abbrev: true,
        };
        insta::assert_snapshot!(candidate_table(&group, false).render(&style), @r"
        S | Repository  | Name    | Current Version | Available Version | Arch
        --+-------------+---------+-----------------+-------------------+-------
        v | repo-update | openssl | 3.1.4-1         | 3.1.4-2           | x86_64
        ");

        let hidden = candidate_table(&group, true).render(&style);
        assert!(!hidden.contains("Repository"));
        assert!(!hidden.contains("repo-update"));
    }
}
