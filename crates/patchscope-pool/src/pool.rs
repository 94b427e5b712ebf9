//! In-memory resource pool hydrated from a snapshot.
//!
//! Serves attribute queries over patches and the read side of the dependency
//! resolver: installed sets, version lookup and a best-effort update plan.

use patchscope_kernel::model::compare_by_nvra;
use patchscope_kernel::{
    AttrQuery, Candidate, Identity, InstalledItem, PatchAttribute, PatchIndex, PatchRecord,
    PlannedItem, QueryError, QueryHit, ReferenceEntry, RepoRef, ResKind,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;

use crate::resolver::PoolResolver;
use crate::snapshot::{ItemLine, PoolLine, SnapshotError, read_snapshot_from_path};

/// Alias shown for installed items that come from no repository.
pub const SYSTEM_REPO_ALIAS: &str = "@System";

/// Errors raised while building a pool.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("{item}: unknown repository `{repo}`")]
    UnknownRepo { item: String, repo: String },

    #[error("{0}: installed more than once")]
    DuplicateInstalled(String),

    #[error("duplicate repository alias `{0}`")]
    DuplicateRepo(String),
}

#[derive(Debug, Clone)]
struct RepoEntry {
    repo: RepoRef,
    priority: u32,
}

#[derive(Debug, Clone)]
struct PoolItem {
    candidate: Candidate,
    installed: bool,
    locked: bool,
    priority: u32,
    requires: Vec<String>,
}

/// Snapshot of everything the commands look at.
///
/// Immutable once built; install requests go through [`PoolResolver`].
#[derive(Debug, Clone, Default)]
pub struct Pool {
    repos: BTreeMap<String, RepoEntry>,
    patches: Vec<PatchRecord>,
    items: Vec<PoolItem>,
    snapshot_ref: Option<String>,
}

impl Pool {
    /// Build a pool from parsed lines.
    ///
    /// Repositories may be declared anywhere in the input.
    pub fn from_lines(lines: Vec<PoolLine>) -> Result<Self, PoolError> {
        let mut pool = Pool::default();
        for line in &lines {
            if let PoolLine::Repo(repo) = line {
                let entry = RepoEntry {
                    repo: RepoRef {
                        alias: repo.alias.clone(),
                        name: repo.name.clone(),
                        url: repo.url.clone(),
                    },
                    priority: repo.priority,
                };
                if pool.repos.insert(repo.alias.clone(), entry).is_some() {
                    return Err(PoolError::DuplicateRepo(repo.alias.clone()));
                }
            }
        }

        let mut installed = BTreeSet::new();
        for line in lines {
            let kind = line.res_kind();
            match line {
                PoolLine::Repo(_) => {}
                PoolLine::Patch(patch) => {
                    let mut record = patch.record;
                    if !patch.repo.is_empty() {
                        record.repository = pool.repo(&patch.repo, &record.name)?.repo.clone();
                    }
                    pool.patches.push(record);
                }
                PoolLine::Package(item)
                | PoolLine::Pattern(item)
                | PoolLine::Product(item)
                | PoolLine::Application(item) => {
                    let Some(kind) = kind else { continue };
                    let item = pool.hydrate_item(kind, item)?;
                    if item.installed && !installed.insert(item.candidate.identity.clone()) {
                        return Err(PoolError::DuplicateInstalled(
                            item.candidate.identity.to_string(),
                        ));
                    }
                    pool.items.push(item);
                }
            }
        }

        pool.patches
            .sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.edition.cmp(&b.edition)));
        tracing::debug!(
            repos = pool.repos.len(),
            patches = pool.patches.len(),
            items = pool.items.len(),
            "pool hydrated"
        );
        Ok(pool)
    }

    /// Load a pool from a JSONL snapshot file.
    pub fn load_jsonl(path: impl AsRef<Path>) -> Result<Self, PoolError> {
        let snapshot = read_snapshot_from_path(path)?;
        let mut pool = Self::from_lines(snapshot.lines)?;
        pool.snapshot_ref = Some(snapshot.snapshot_ref);
        Ok(pool)
    }

    /// Content reference of the loaded snapshot file, if any.
    pub fn snapshot_ref(&self) -> Option<&str> {
        self.snapshot_ref.as_deref()
    }

    /// Drop available items and patches outside of `aliases`.
    ///
    /// Applied right after loading, before any query runs.
    ///
    /// Installed items stay; they are the baseline every update is compared
    /// against.
    pub fn restrict_to_repos(&mut self, aliases: &[String]) -> Result<(), PoolError> {
        for alias in aliases {
            if !self.repos.contains_key(alias) {
                return Err(PoolError::UnknownRepo {
                    item: "--repo".to_string(),
                    repo: alias.clone(),
                });
            }
        }
        let keep = |repo: &RepoRef| aliases.iter().any(|a| *a == repo.alias);
        self.items
            .retain(|item| item.installed || keep(&item.candidate.repository));
        self.patches.retain(|patch| keep(&patch.repository));
        Ok(())
    }

    /// Request layer over this snapshot, with an empty request log.
    pub fn resolver(&self) -> PoolResolver<'_> {
        PoolResolver::new(self)
    }

    fn repo(&self, alias: &str, item: &str) -> Result<&RepoEntry, PoolError> {
        self.repos.get(alias).ok_or_else(|| PoolError::UnknownRepo {
            item: item.to_string(),
            repo: alias.to_string(),
        })
    }

    fn hydrate_item(&self, kind: ResKind, line: ItemLine) -> Result<PoolItem, PoolError> {
        let (repository, priority) = if line.repo.is_empty() {
            (RepoRef::new(SYSTEM_REPO_ALIAS), u32::MAX)
        } else {
            let entry = self.repo(&line.repo, &line.name)?;
            (entry.repo.clone(), entry.priority)
        };
        Ok(PoolItem {
            candidate: Candidate {
                identity: Identity::new(kind, line.name),
                edition: line.edition,
                arch: line.arch,
                repository,
                summary: line.summary,
                description: line.description,
                license_to_confirm: line.license,
            },
            installed: line.installed,
            locked: line.locked,
            priority,
            requires: line.requires,
        })
    }

    fn installed_item(&self, identity: &Identity) -> Option<&PoolItem> {
        self.items
            .iter()
            .find(|item| item.installed && item.candidate.identity == *identity)
    }

    /// Highest available item of `identity`.
    ///
    /// Equal editions prefer the installed architecture, then the lower
    /// repository priority value.
    fn best_available(&self, identity: &Identity) -> Option<&PoolItem> {
        let installed_arch = self
            .installed_item(identity)
            .map(|item| item.candidate.arch.as_str());
        self.items
            .iter()
            .filter(|item| !item.installed && item.candidate.identity == *identity)
            .max_by(|a, b| {
                a.candidate
                    .edition
                    .cmp(&b.candidate.edition)
                    .then_with(|| {
                        let a_arch = Some(a.candidate.arch.as_str()) == installed_arch;
                        let b_arch = Some(b.candidate.arch.as_str()) == installed_arch;
                        a_arch.cmp(&b_arch)
                    })
                    .then_with(|| b.priority.cmp(&a.priority))
            })
    }

    /// Installed items of `kind`, sorted by identity.
    pub fn installed(&self, kind: &ResKind) -> Vec<InstalledItem> {
        let mut installed: Vec<InstalledItem> = self
            .items
            .iter()
            .filter(|item| item.installed && item.candidate.kind() == kind)
            .map(|item| InstalledItem {
                identity: item.candidate.identity.clone(),
                edition: item.candidate.edition.clone(),
                arch: item.candidate.arch.clone(),
            })
            .collect();
        installed.sort_by(|a, b| a.identity.cmp(&b.identity));
        installed
    }

    /// Highest available version of `identity`.
    pub fn highest_available_version(&self, identity: &Identity) -> Option<Candidate> {
        self.best_available(identity)
            .map(|item| item.candidate.clone())
    }

    /// Update every unlocked installed package that has a newer version and
    /// pull in whatever the selected versions require.
    pub fn best_effort_update_plan(&self) -> Vec<PlannedItem> {
        let mut plan: BTreeMap<Identity, PlannedItem> = BTreeMap::new();
        let mut queue = VecDeque::new();

        for current in self.items.iter().filter(|item| {
            item.installed && item.candidate.kind().is_dependency_sensitive()
        }) {
            let Some(update) = self.best_available(&current.candidate.identity) else {
                continue;
            };
            if compare_items(update, current) != Ordering::Greater {
                continue;
            }
            let selected = !current.locked;
            if !selected {
                tracing::debug!(item = %current.candidate.identity, "locked; update not planned");
            }
            plan.insert(
                update.candidate.identity.clone(),
                PlannedItem {
                    candidate: update.candidate.clone(),
                    selected_for_install: selected,
                },
            );
            if selected {
                queue.push_back(update);
            }
        }

        while let Some(item) = queue.pop_front() {
            for name in &item.requires {
                let identity = Identity::new(item.candidate.kind().clone(), name.as_str());
                if plan.contains_key(&identity) || self.installed_item(&identity).is_some() {
                    continue;
                }
                let Some(required) = self.best_available(&identity) else {
                    tracing::debug!(%identity, "requirement not available");
                    continue;
                };
                plan.insert(
                    identity,
                    PlannedItem {
                        candidate: required.candidate.clone(),
                        selected_for_install: true,
                    },
                );
                queue.push_back(required);
            }
        }

        plan.into_values().collect()
    }
}

impl PatchIndex for Pool {
    fn query(&self, query: &AttrQuery) -> Result<Vec<QueryHit<'_>>, QueryError> {
        if query.conditions.is_empty() {
            return Err(QueryError::Empty);
        }
        tracing::trace!(conditions = query.conditions.len(), "attribute query");

        let mut hits = Vec::new();
        for patch in &self.patches {
            let mut text_hit = false;
            let mut matches: Vec<&ReferenceEntry> = Vec::new();
            for (attribute, value) in &query.conditions {
                match attribute {
                    PatchAttribute::Summary => {
                        text_hit |= query.options.matches(&patch.summary, value);
                    }
                    PatchAttribute::Description => {
                        text_hit |= query.options.matches(&patch.description, value);
                    }
                    PatchAttribute::ReferenceType | PatchAttribute::ReferenceId => {
                        for entry in &patch.references {
                            let field = match attribute {
                                PatchAttribute::ReferenceType => &entry.ref_type,
                                _ => &entry.ref_id,
                            };
                            if query.options.matches(field, value)
                                && !matches.iter().any(|m| std::ptr::eq(*m, entry))
                            {
                                matches.push(entry);
                            }
                        }
                    }
                }
            }
            if text_hit || !matches.is_empty() {
                hits.push(QueryHit { patch, matches });
            }
        }
        Ok(hits)
    }

    fn patches(&self) -> Box<dyn Iterator<Item = &PatchRecord> + '_> {
        Box::new(self.patches.iter())
    }
}

fn compare_items(a: &PoolItem, b: &PoolItem) -> Ordering {
    compare_by_nvra(
        (a.candidate.name(), &a.candidate.edition, a.candidate.arch.as_str()),
        (b.candidate.name(), &b.candidate.edition, b.candidate.arch.as_str()),
    )
}
