//! Patch acceptance filter built from the `--date`, `--category` and
//! `--severity` options.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::model::PatchRecord;

/// Predicate every listed or requested patch must satisfy.
///
/// The default filter accepts everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchFilter {
    issued_until: Option<NaiveDate>,
    categories: BTreeSet<String>,
    severities: BTreeSet<String>,
}

impl PatchFilter {
    /// Accept only patches issued on or before `date`.
    pub fn issued_until(mut self, date: NaiveDate) -> Self {
        self.issued_until = Some(date);
        self
    }

    /// Accept only the given categories (comma lists allowed).
    pub fn categories<'a>(mut self, values: impl IntoIterator<Item = &'a str>) -> Self {
        self.categories.extend(split_lowercase(values));
        self
    }

    /// Accept only the given severities (comma lists allowed).
    pub fn severities<'a>(mut self, values: impl IntoIterator<Item = &'a str>) -> Self {
        self.severities.extend(split_lowercase(values));
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.issued_until.is_none() && self.categories.is_empty() && self.severities.is_empty()
    }

    pub fn accepts(&self, patch: &PatchRecord) -> bool {
        if let Some(until) = self.issued_until {
            // Patches without an issue date cannot be placed in the range.
            match patch.issued {
                Some(issued) if issued <= until => {}
                _ => return false,
            }
        }
        if !self.categories.is_empty()
            && !self.categories.contains(&patch.category.to_ascii_lowercase())
        {
            return false;
        }
        if !self.severities.is_empty()
            && !self.severities.contains(&patch.severity.to_ascii_lowercase())
        {
            return false;
        }
        true
    }
}

fn split_lowercase<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    values
        .into_iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}
