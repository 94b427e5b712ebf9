//! Issue predicates: `(tracker, id)` pairs scanned from CLI filter flags.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

pub const TRACKER_BUGZILLA: &str = "bugzilla";
pub const TRACKER_CVE: &str = "cve";

/// Either "no constraint" or one concrete value.
///
/// `Any` sorts before every specific value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Selector {
    Any,
    Specific(String),
}

impl Selector {
    pub fn specific(value: impl Into<String>) -> Self {
        Selector::Specific(value.into())
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Selector::Any)
    }

    pub fn as_specific(&self) -> Option<&str> {
        match self {
            Selector::Any => None,
            Selector::Specific(value) => Some(value),
        }
    }
}

impl Serialize for Selector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Selector::Any => serializer.serialize_none(),
            Selector::Specific(value) => serializer.serialize_str(value),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Any => f.write_str("*"),
            Selector::Specific(value) => f.write_str(value),
        }
    }
}

/// One issue predicate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct IssueRef {
    pub tracker: Selector,
    pub id: Selector,
}

impl IssueRef {
    pub fn new(tracker: Selector, id: Selector) -> Self {
        Self { tracker, id }
    }

    /// A predicate whose id must be checked against reference types too,
    /// and whose id is looked up in patch texts during listing.
    pub fn is_any_tracker_specific_id(&self) -> bool {
        self.tracker.is_any() && !self.id.is_any()
    }
}

impl fmt::Display for IssueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tracker, self.id)
    }
}

/// A CLI flag that filters by issue, and the tracker it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueFilterFlag {
    pub name: &'static str,
    pub tracker: Selector,
}

/// Filter flags understood by the patch commands.
pub fn issue_filter_flags() -> [IssueFilterFlag; 4] {
    [
        IssueFilterFlag {
            name: "issues",
            tracker: Selector::Any,
        },
        IssueFilterFlag {
            name: "bugzilla",
            tracker: Selector::specific(TRACKER_BUGZILLA),
        },
        IssueFilterFlag {
            name: "bz",
            tracker: Selector::specific(TRACKER_BUGZILLA),
        },
        IssueFilterFlag {
            name: "cve",
            tracker: Selector::specific(TRACKER_CVE),
        },
    ]
}

/// Non-fatal problem found while scanning issue flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueScanWarning {
    /// `--flag` was given both bare and with ids; the bare form was dropped.
    BareFlagIgnored { flag: String },
}

impl fmt::Display for IssueScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueScanWarning::BareFlagIgnored { flag } => write!(
                f,
                "Ignoring --{flag} without argument because similar option with an argument has been specified."
            ),
        }
    }
}

/// Deduplicated, ordered issue predicates for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssueSpecSet {
    issues: BTreeSet<IssueRef>,
}

impl IssueSpecSet {
    /// Scan flag values into predicates.
    ///
    /// `values` yields, per flag name, every raw value the user passed; a bare
    /// occurrence of the flag is an empty string. Flags absent from `values`
    /// contribute nothing.
    pub fn scan<'a, V>(
        flags: &[IssueFilterFlag],
        mut values: impl FnMut(&str) -> V,
    ) -> (Self, Vec<IssueScanWarning>)
    where
        V: IntoIterator<Item = &'a str>,
    {
        let mut set = Self::default();
        let mut warnings = Vec::new();

        for flag in flags {
            let mut bare = false;
            let mut ids: Vec<String> = Vec::new();

            for raw in values(flag.name) {
                let before = ids.len();
                ids.extend(
                    raw.split(',')
                        .map(str::trim)
                        .filter(|piece| !piece.is_empty())
                        .map(str::to_string),
                );
                if ids.len() == before {
                    bare = true;
                }
            }

            if ids.is_empty() {
                if bare {
                    set.insert(IssueRef::new(flag.tracker.clone(), Selector::Any));
                }
                continue;
            }

            if bare {
                let warning = IssueScanWarning::BareFlagIgnored {
                    flag: flag.name.to_string(),
                };
                tracing::warn!(flag = flag.name, "{warning}");
                warnings.push(warning);
            }
            for id in ids {
                set.insert(IssueRef::new(flag.tracker.clone(), Selector::Specific(id)));
            }
        }

        (set, warnings)
    }

    pub fn insert(&mut self, issue: IssueRef) -> bool {
        self.issues.insert(issue)
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IssueRef> {
        self.issues.iter()
    }
}

impl FromIterator<IssueRef> for IssueSpecSet {
    fn from_iter<T: IntoIterator<Item = IssueRef>>(iter: T) -> Self {
        Self {
            issues: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// One `(flag, raw value)` pair per occurrence on the command line.
    fn scan(input: &[(&str, &str)]) -> (IssueSpecSet, Vec<IssueScanWarning>) {
        let mut by_flag: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (flag, value) in input {
            by_flag.entry(*flag).or_default().push(*value);
        }
        IssueSpecSet::scan(&issue_filter_flags(), |flag| {
            by_flag.get(flag).cloned().unwrap_or_default()
        })
    }

    fn issue(tracker: Option<&str>, id: Option<&str>) -> IssueRef {
        IssueRef::new(
            tracker.map_or(Selector::Any, Selector::specific),
            id.map_or(Selector::Any, Selector::specific),
        )
    }

    #[test]
    fn no_flags_yield_empty_set() {
        let (set, warnings) = scan(&[]);
        assert!(set.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn comma_lists_split_and_duplicates_merge() {
        let (set, warnings) = scan(&[
            ("cve", "CVE-1,CVE-2"),
            ("cve", "CVE-1"),
            ("bugzilla", "7,,8"),
        ]);
        assert!(warnings.is_empty());
        let got: Vec<IssueRef> = set.iter().cloned().collect();
        assert_eq!(
            got,
            vec![
                issue(Some("bugzilla"), Some("7")),
                issue(Some("bugzilla"), Some("8")),
                issue(Some("cve"), Some("CVE-1")),
                issue(Some("cve"), Some("CVE-2")),
            ]
        );
    }

    #[test]
    fn bz_alias_merges_with_bugzilla() {
        let (set, _) = scan(&[("bugzilla", "12345"), ("bz", "12345")]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn bare_flag_registers_wildcard_id() {
        let (set, warnings) = scan(&[("cve", "")]);
        assert!(warnings.is_empty());
        assert_eq!(
            set.iter().cloned().collect::<Vec<_>>(),
            vec![issue(Some("cve"), None)]
        );
    }

    #[test]
    fn bare_flag_with_valued_flag_is_dropped_with_warning() {
        let (set, warnings) = scan(&[("cve", ""), ("cve", "CVE-2024-0001")]);
        assert_eq!(
            set.iter().cloned().collect::<Vec<_>>(),
            vec![issue(Some("cve"), Some("CVE-2024-0001"))]
        );
        assert_eq!(
            warnings,
            vec![IssueScanWarning::BareFlagIgnored {
                flag: "cve".to_string()
            }]
        );
        assert!(warnings[0].to_string().starts_with("Ignoring --cve without argument"));
    }

    #[test]
    fn separate_bare_flags_stay_distinct_predicates() {
        let (set, _) = scan(&[("issues", ""), ("cve", "")]);
        assert_eq!(
            set.iter().cloned().collect::<Vec<_>>(),
            vec![issue(None, None), issue(Some("cve"), None)]
        );
    }

    #[test]
    fn comma_only_value_counts_as_bare() {
        let (set, _) = scan(&[("bugzilla", ",")]);
        assert_eq!(
            set.iter().cloned().collect::<Vec<_>>(),
            vec![issue(Some("bugzilla"), None)]
        );
    }
}
