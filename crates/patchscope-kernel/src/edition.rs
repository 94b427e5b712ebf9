//! Editions (`[epoch:]version[-release]`) and their rpm-style ordering.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static EDITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<epoch>[0-9]+):)?(?P<version>[^-:]+)(?:-(?P<release>[^-:]+))?$")
        .expect("edition pattern is valid")
});

/// Version identity of an installable item.
///
/// Equality follows the ordering: `1.01` and `1.1` are the same edition,
/// exactly as rpm treats them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Edition {
    epoch: u32,
    version: String,
    release: Option<String>,
}

/// Raised when an edition string does not have the
/// `[epoch:]version[-release]` shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid edition `{0}`: expected [epoch:]version[-release]")]
pub struct EditionParseError(pub String);

impl Edition {
    pub fn new(epoch: u32, version: impl Into<String>, release: Option<String>) -> Self {
        Self {
            epoch,
            version: version.into(),
            release: release.filter(|r| !r.is_empty()),
        }
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn release(&self) -> Option<&str> {
        self.release.as_deref()
    }
}

impl FromStr for Edition {
    type Err = EditionParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let caps = EDITION_RE
            .captures(trimmed)
            .ok_or_else(|| EditionParseError(raw.to_string()))?;
        let epoch = match caps.name("epoch") {
            Some(m) => m
                .as_str()
                .parse()
                .map_err(|_| EditionParseError(raw.to_string()))?,
            None => 0,
        };
        Ok(Self::new(
            epoch,
            &caps["version"],
            caps.name("release").map(|m| m.as_str().to_string()),
        ))
    }
}

impl TryFrom<String> for Edition {
    type Error = EditionParseError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<Edition> for String {
    fn from(edition: Edition) -> Self {
        edition.to_string()
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}:", self.epoch)?;
        }
        f.write_str(&self.version)?;
        if let Some(release) = &self.release {
            write!(f, "-{release}")?;
        }
        Ok(())
    }
}

impl Ord for Edition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| rpmvercmp(&self.version, &other.version))
            .then_with(|| {
                rpmvercmp(
                    self.release.as_deref().unwrap_or(""),
                    other.release.as_deref().unwrap_or(""),
                )
            })
    }
}

impl PartialOrd for Edition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Edition {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Edition {}

/// rpm's segment-wise version comparison.
///
/// Segments are maximal runs of digits or letters; separators are ignored.
/// Numeric segments beat alphabetic ones, `~` sorts before everything
/// (pre-releases) and `^` sorts after the plain version but before any
/// further segment (snapshots).
pub fn rpmvercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let mut one = a.as_bytes();
    let mut two = b.as_bytes();

    loop {
        one = skip_separators(one);
        two = skip_separators(two);

        let one_tilde = one.first() == Some(&b'~');
        let two_tilde = two.first() == Some(&b'~');
        if one_tilde || two_tilde {
            if !one_tilde {
                return Ordering::Greater;
            }
            if !two_tilde {
                return Ordering::Less;
            }
            one = &one[1..];
            two = &two[1..];
            continue;
        }

        let one_caret = one.first() == Some(&b'^');
        let two_caret = two.first() == Some(&b'^');
        if one_caret || two_caret {
            if one.is_empty() {
                return Ordering::Less;
            }
            if two.is_empty() {
                return Ordering::Greater;
            }
            if !one_caret {
                return Ordering::Greater;
            }
            if !two_caret {
                return Ordering::Less;
            }
            one = &one[1..];
            two = &two[1..];
            continue;
        }

        if one.is_empty() || two.is_empty() {
            break;
        }

        let numeric = one[0].is_ascii_digit();
        let (seg_one, rest_one) = split_segment(one, numeric);
        let (seg_two, rest_two) = split_segment(two, numeric);
        one = rest_one;
        two = rest_two;

        if seg_two.is_empty() {
            // Segment types differ: numbers are newer than letters.
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let ord = if numeric {
            let seg_one = strip_leading_zeros(seg_one);
            let seg_two = strip_leading_zeros(seg_two);
            seg_one
                .len()
                .cmp(&seg_two.len())
                .then_with(|| seg_one.cmp(seg_two))
        } else {
            seg_one.cmp(seg_two)
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    match (one.is_empty(), two.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, _) => Ordering::Greater,
    }
}

fn skip_separators(s: &[u8]) -> &[u8] {
    let start = s
        .iter()
        .position(|c| c.is_ascii_alphanumeric() || *c == b'~' || *c == b'^')
        .unwrap_or(s.len());
    &s[start..]
}

fn split_segment(s: &[u8], numeric: bool) -> (&[u8], &[u8]) {
    let end = s
        .iter()
        .position(|c| {
            if numeric {
                !c.is_ascii_digit()
            } else {
                !c.is_ascii_alphabetic()
            }
        })
        .unwrap_or(s.len());
    s.split_at(end)
}

fn strip_leading_zeros(s: &[u8]) -> &[u8] {
    let start = s.iter().position(|c| *c != b'0').unwrap_or(s.len());
    &s[start..]
}
