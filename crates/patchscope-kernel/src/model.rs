//! Read-only projections of the resource pool: patches, candidates and
//! installed items.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::edition::Edition;
use crate::status::{PatchStatus, classify};

pub const CATEGORY_SECURITY: &str = "security";
pub const SEVERITY_CRITICAL: &str = "critical";

/// Resource kind of a pool item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResKind {
    Package,
    Patch,
    Pattern,
    Product,
    Application,
}

impl ResKind {
    /// Kinds whose items can conflict with or require each other, so update
    /// candidates must come from the resolver's plan.
    pub fn is_dependency_sensitive(&self) -> bool {
        matches!(self, ResKind::Package)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResKind::Package => "package",
            ResKind::Patch => "patch",
            ResKind::Pattern => "pattern",
            ResKind::Product => "product",
            ResKind::Application => "application",
        }
    }
}

impl fmt::Display for ResKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "package" | "pkg" => Ok(ResKind::Package),
            "patch" => Ok(ResKind::Patch),
            "pattern" => Ok(ResKind::Pattern),
            "product" => Ok(ResKind::Product),
            "application" | "app" => Ok(ResKind::Application),
            other => Err(format!("unknown resource kind `{other}`")),
        }
    }
}

/// Identity shared by every version of one resource: kind plus name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub kind: ResKind,
    pub name: String,
}

impl Identity {
    pub fn new(kind: ResKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// Repository an item originates from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub alias: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
}

impl RepoRef {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            ..Self::default()
        }
    }

    /// Label shown to users: the repository name, falling back to the alias.
    pub fn as_user_string(&self) -> &str {
        if self.name.is_empty() {
            &self.alias
        } else {
            &self.name
        }
    }
}

/// Compare two `(name, edition, arch)` triples.
pub fn compare_by_nvra(
    lhs: (&str, &Edition, &str),
    rhs: (&str, &Edition, &str),
) -> Ordering {
    lhs.0
        .cmp(rhs.0)
        .then_with(|| lhs.1.cmp(rhs.1))
        .then_with(|| lhs.2.cmp(rhs.2))
}

/// Issue cross-reference carried by a patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    #[serde(rename = "type")]
    pub ref_type: String,
    #[serde(rename = "id")]
    pub ref_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub href: String,
}

impl ReferenceEntry {
    pub fn new(ref_type: impl Into<String>, ref_id: impl Into<String>) -> Self {
        Self {
            ref_type: ref_type.into(),
            ref_id: ref_id.into(),
            title: String::new(),
            href: String::new(),
        }
    }
}

/// Validation state the solver computed for a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationState {
    /// The patch applies to the system and is not yet satisfied.
    Broken,
    Satisfied,
    #[serde(alias = "non-relevant")]
    Nonrelevant,
    #[serde(other)]
    Undetermined,
}

impl ValidationState {
    pub fn is_broken(self) -> bool {
        self == ValidationState::Broken
    }
}

/// One interactive aspect of installing a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractiveFlag {
    Reboot,
    Message,
    License,
    /// Synthetic: the patch updates the update stack itself.
    Restart,
}

impl InteractiveFlag {
    pub fn label(self) -> &'static str {
        match self {
            InteractiveFlag::Reboot => "reboot",
            InteractiveFlag::Message => "message",
            InteractiveFlag::License => "licence",
            InteractiveFlag::Restart => "restart",
        }
    }
}

/// Ordered set of interactive flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InteractiveFlags(Vec<InteractiveFlag>);

impl InteractiveFlags {
    pub fn insert(&mut self, flag: InteractiveFlag) {
        if let Err(pos) = self.0.binary_search(&flag) {
            self.0.insert(pos, flag);
        }
    }

    pub fn contains(&self, flag: InteractiveFlag) -> bool {
        self.0.binary_search(&flag).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = InteractiveFlag> + '_ {
        self.0.iter().copied()
    }
}

impl fmt::Display for InteractiveFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("---");
        }
        let labels: Vec<&str> = self.iter().map(InteractiveFlag::label).collect();
        f.write_str(&labels.join(","))
    }
}

/// A patch as projected from the pool at invocation time.
///
/// `validation` and `locked` are the only inputs of [`PatchRecord::status`];
/// the status itself is never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchRecord {
    pub name: String,
    pub edition: Edition,
    #[serde(default = "default_noarch")]
    pub arch: String,
    #[serde(default)]
    pub repository: RepoRef,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub license_to_confirm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued: Option<NaiveDate>,
    #[serde(default)]
    pub reboot_suggested: bool,
    #[serde(default)]
    pub message: bool,
    #[serde(default)]
    pub restart_suggested: bool,
    #[serde(default)]
    pub references: Vec<ReferenceEntry>,
    #[serde(rename = "status", default = "default_validation")]
    pub validation: ValidationState,
    #[serde(default)]
    pub locked: bool,
}

fn default_noarch() -> String {
    "noarch".to_string()
}

fn default_validation() -> ValidationState {
    ValidationState::Undetermined
}

impl PatchRecord {
    pub fn new(name: impl Into<String>, edition: Edition) -> Self {
        Self {
            name: name.into(),
            edition,
            arch: default_noarch(),
            repository: RepoRef::default(),
            category: String::new(),
            severity: String::new(),
            summary: String::new(),
            description: String::new(),
            license_to_confirm: String::new(),
            issued: None,
            reboot_suggested: false,
            message: false,
            restart_suggested: false,
            references: Vec::new(),
            validation: ValidationState::Undetermined,
            locked: false,
        }
    }

    pub fn status(&self) -> PatchStatus {
        classify(self.validation, self.locked)
    }

    pub fn is_security(&self) -> bool {
        self.category.eq_ignore_ascii_case(CATEGORY_SECURITY)
    }

    pub fn is_critical(&self) -> bool {
        self.severity.eq_ignore_ascii_case(SEVERITY_CRITICAL)
    }

    /// Stored interactive flags plus the synthetic `Restart` flag.
    pub fn interactive_flags(&self) -> InteractiveFlags {
        let mut flags = InteractiveFlags::default();
        if self.reboot_suggested {
            flags.insert(InteractiveFlag::Reboot);
        }
        if self.message {
            flags.insert(InteractiveFlag::Message);
        }
        if !self.license_to_confirm.is_empty() {
            flags.insert(InteractiveFlag::License);
        }
        if self.restart_suggested {
            flags.insert(InteractiveFlag::Restart);
        }
        flags
    }

    /// Whether installing asks the user something.
    ///
    /// The synthetic restart flag never makes a patch interactive.
    pub fn is_interactive(&self) -> bool {
        self.interactive_flags()
            .iter()
            .any(|flag| flag != InteractiveFlag::Restart)
    }

    /// `name-edition.arch`, the unique label used in logs and feedback.
    pub fn ident(&self) -> String {
        format!("patch:{}-{}.{}", self.name, self.edition, self.arch)
    }
}

/// An installed counterpart of a resource identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledItem {
    pub identity: Identity,
    pub edition: Edition,
    pub arch: String,
}

/// A specific installable version of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub identity: Identity,
    pub edition: Edition,
    pub arch: String,
    #[serde(default)]
    pub repository: RepoRef,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub license_to_confirm: String,
}

impl Candidate {
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn kind(&self) -> &ResKind {
        &self.identity.kind
    }

    /// Whether this candidate compares strictly newer than `installed`.
    pub fn is_newer_than(&self, installed: &InstalledItem) -> bool {
        compare_by_nvra(
            (
                installed.identity.name.as_str(),
                &installed.edition,
                installed.arch.as_str(),
            ),
            (self.name(), &self.edition, self.arch.as_str()),
        ) == Ordering::Less
    }
}

/// An update candidate paired with what is installed today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateCandidate {
    pub candidate: Candidate,
    pub installed: Option<InstalledItem>,
}

impl UpdateCandidate {
    /// Installed edition when it differs from the candidate's.
    pub fn old_edition(&self) -> Option<&Edition> {
        self.installed
            .as_ref()
            .map(|i| &i.edition)
            .filter(|e| **e != self.candidate.edition)
    }

    /// Installed architecture when it differs from the candidate's.
    pub fn old_arch(&self) -> Option<&str> {
        self.installed
            .as_ref()
            .map(|i| i.arch.as_str())
            .filter(|a| *a != self.candidate.arch)
    }
}
