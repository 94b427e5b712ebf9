//! In-memory collaborators shared by the kernel unit tests.

use std::collections::BTreeSet;

use crate::edition::Edition;
use crate::model::{
    Candidate, Identity, InstalledItem, PatchRecord, ReferenceEntry, RepoRef, ResKind,
    ValidationState,
};
use crate::query::{AttrQuery, PatchAttribute, PatchIndex, QueryError, QueryHit};
use crate::resolver::{
    FeedbackKind, PlannedItem, RequestFeedback, RequestOptions, Resolver, ResolverError,
};

pub fn ed(raw: &str) -> Edition {
    raw.parse().expect("test edition should parse")
}

pub fn patch(name: &str, validation: ValidationState, refs: &[(&str, &str)]) -> PatchRecord {
    let mut p = PatchRecord::new(name, ed("1"));
    p.repository = RepoRef::new("updates");
    p.category = "recommended".to_string();
    p.severity = "moderate".to_string();
    p.summary = format!("Summary of {name}");
    p.validation = validation;
    p.references = refs
        .iter()
        .map(|(t, i)| ReferenceEntry::new(*t, *i))
        .collect();
    p
}

/// Patch index answering queries like a real attribute index.
///
/// With `superset` set it ignores the conditions and returns every patch
/// with all of its references, the loosest answer a backend may give.
#[derive(Debug, Default)]
pub struct FakeIndex {
    pub patches: Vec<PatchRecord>,
    pub superset: bool,
    pub queries: std::cell::RefCell<Vec<AttrQuery>>,
}

impl FakeIndex {
    pub fn new(patches: Vec<PatchRecord>) -> Self {
        Self {
            patches,
            ..Self::default()
        }
    }
}

impl PatchIndex for FakeIndex {
    fn query(&self, query: &AttrQuery) -> Result<Vec<QueryHit<'_>>, QueryError> {
        if query.conditions.is_empty() {
            return Err(QueryError::Empty);
        }
        self.queries.borrow_mut().push(query.clone());

        let mut hits = Vec::new();
        for patch in &self.patches {
            if self.superset {
                hits.push(QueryHit {
                    patch,
                    matches: patch.references.iter().collect(),
                });
                continue;
            }
            let mut matched_text = false;
            let mut matches: Vec<&ReferenceEntry> = Vec::new();
            for (attribute, value) in &query.conditions {
                match attribute {
                    PatchAttribute::Summary => {
                        matched_text |= query.options.matches(&patch.summary, value)
                    }
                    PatchAttribute::Description => {
                        matched_text |= query.options.matches(&patch.description, value)
                    }
                    PatchAttribute::ReferenceType | PatchAttribute::ReferenceId => {
                        for entry in &patch.references {
                            let field = if *attribute == PatchAttribute::ReferenceType {
                                &entry.ref_type
                            } else {
                                &entry.ref_id
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
            if matched_text || !matches.is_empty() {
                hits.push(QueryHit { patch, matches });
            }
        }
        Ok(hits)
    }

    fn patches(&self) -> Box<dyn Iterator<Item = &PatchRecord> + '_> {
        Box::new(self.patches.iter())
    }
}

/// Resolver with fixed installed/available sets and a recorded request log.
#[derive(Debug, Default)]
pub struct FakeResolver {
    pub installed: Vec<InstalledItem>,
    pub available: Vec<Candidate>,
    pub plan: Vec<PlannedItem>,
    pub requested: BTreeSet<String>,
    pub request_calls: usize,
    pub refuse: BTreeSet<String>,
    pub feedback: Vec<RequestFeedback>,
    pub fail_requests: bool,
}

impl FakeResolver {
    pub fn install(&mut self, kind: ResKind, name: &str, edition: &str, arch: &str) {
        self.installed.push(InstalledItem {
            identity: Identity::new(kind, name),
            edition: ed(edition),
            arch: arch.to_string(),
        });
    }

    pub fn offer(&mut self, kind: ResKind, name: &str, edition: &str, arch: &str) {
        self.available.push(candidate(kind, name, edition, arch));
    }
}

pub fn candidate(kind: ResKind, name: &str, edition: &str, arch: &str) -> Candidate {
    Candidate {
        identity: Identity::new(kind, name),
        edition: ed(edition),
        arch: arch.to_string(),
        repository: RepoRef::new("oss"),
        summary: String::new(),
        description: String::new(),
        license_to_confirm: String::new(),
    }
}

impl Resolver for FakeResolver {
    fn installed(&self, kind: &ResKind) -> Result<Vec<InstalledItem>, ResolverError> {
        Ok(self
            .installed
            .iter()
            .filter(|i| &i.identity.kind == kind)
            .cloned()
            .collect())
    }

    fn highest_available_version(
        &self,
        identity: &Identity,
    ) -> Result<Option<Candidate>, ResolverError> {
        Ok(self
            .available
            .iter()
            .filter(|c| &c.identity == identity)
            .max_by(|a, b| a.edition.cmp(&b.edition))
            .cloned())
    }

    fn best_effort_update_plan(&self) -> Result<Vec<PlannedItem>, ResolverError> {
        Ok(self.plan.clone())
    }

    fn request_patch_install(
        &mut self,
        patch: &PatchRecord,
        _options: &RequestOptions,
    ) -> Result<bool, ResolverError> {
        if self.fail_requests {
            return Err(ResolverError::Backend("request channel closed".to_string()));
        }
        self.request_calls += 1;
        let ident = patch.ident();
        if self.refuse.contains(&patch.name) {
            self.feedback.push(RequestFeedback {
                patch: ident,
                kind: FeedbackKind::Filtered,
            });
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
