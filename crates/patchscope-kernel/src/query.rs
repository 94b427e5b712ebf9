//! Attribute query surface of the patch metadata index.
//!
//! The index ORs the conditions of one query; it cannot express "type = T
//! AND id = I". Callers treat hits as a candidate superset and post-filter
//! the returned reference entries themselves.

use crate::model::{PatchRecord, ReferenceEntry};

/// Patch attribute a query condition applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchAttribute {
    ReferenceType,
    ReferenceId,
    Summary,
    Description,
}

impl PatchAttribute {
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            PatchAttribute::ReferenceType | PatchAttribute::ReferenceId
        )
    }
}

/// How a condition value is compared with attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Substring,
    Exact,
}

/// Comparison settings shared by all conditions of one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    pub mode: MatchMode,
    pub case_insensitive: bool,
}

impl MatchOptions {
    pub const fn substring() -> Self {
        Self {
            mode: MatchMode::Substring,
            case_insensitive: true,
        }
    }

    pub const fn exact() -> Self {
        Self {
            mode: MatchMode::Exact,
            case_insensitive: true,
        }
    }

    /// Whether `haystack` satisfies `needle` under these options.
    pub fn matches(&self, haystack: &str, needle: &str) -> bool {
        if self.case_insensitive {
            let haystack = haystack.to_lowercase();
            let needle = needle.to_lowercase();
            self.compare(&haystack, &needle)
        } else {
            self.compare(haystack, needle)
        }
    }

    fn compare(&self, haystack: &str, needle: &str) -> bool {
        match self.mode {
            MatchMode::Substring => haystack.contains(needle),
            MatchMode::Exact => haystack == needle,
        }
    }
}

/// An OR of `(attribute, value)` conditions over patches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrQuery {
    pub options: MatchOptions,
    pub conditions: Vec<(PatchAttribute, String)>,
}

impl AttrQuery {
    pub fn new(options: MatchOptions) -> Self {
        Self {
            options,
            conditions: Vec::new(),
        }
    }

    pub fn attribute(mut self, attribute: PatchAttribute, value: impl Into<String>) -> Self {
        self.conditions.push((attribute, value.into()));
        self
    }
}

/// One patch returned by a query.
///
/// `matches` holds the reference entries on which a reference condition
/// matched; it is empty when only text attributes matched.
#[derive(Debug, Clone)]
pub struct QueryHit<'a> {
    pub patch: &'a PatchRecord,
    pub matches: Vec<&'a ReferenceEntry>,
}

/// Failure reported by an index backend.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("query without conditions")]
    Empty,

    #[error("index backend failure: {0}")]
    Backend(String),
}

/// Read-only view of the patch metadata corpus.
pub trait PatchIndex {
    /// Run an attribute query; each matching patch appears once.
    fn query(&self, query: &AttrQuery) -> Result<Vec<QueryHit<'_>>, QueryError>;

    /// Every patch in the corpus.
    fn patches(&self) -> Box<dyn Iterator<Item = &PatchRecord> + '_>;

    /// Patches whose summary or description contains `needle`.
    fn query_free_text(
        &self,
        needle: &str,
        options: MatchOptions,
    ) -> Result<Vec<&PatchRecord>, QueryError> {
        let query = AttrQuery::new(options)
            .attribute(PatchAttribute::Summary, needle)
            .attribute(PatchAttribute::Description, needle);
        Ok(self.query(&query)?.into_iter().map(|hit| hit.patch).collect())
    }
}
