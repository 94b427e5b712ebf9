use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use patchscope_kernel::issue::issue_filter_flags;
use patchscope_kernel::{IssueScanWarning, IssueSpecSet, PatchFilter, ResKind};

#[derive(Parser)]
#[command(
    name = "patchscope",
    about = "Patchscope: find pending updates and the patches that fix tracked issues",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to the pool snapshot JSONL (default: .patchscope/pool.jsonl)
    #[arg(long, global = true)]
    pub pool: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Do not abbreviate text in tables
    #[arg(long, global = true)]
    pub no_abbrev: bool,

    /// Do not highlight security categories and critical severities
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available updates
    #[command(alias = "lu")]
    ListUpdates {
        /// Resource kind to list (repeatable)
        #[arg(long = "type", short = 't', value_enum, default_value = "package")]
        kinds: Vec<KindArg>,

        /// List all newer versions, ignoring dependencies and locks
        #[arg(long, short = 'a')]
        all: bool,

        /// Only consider updates from this repository alias (repeatable)
        #[arg(long = "repo", short = 'r', value_name = "ALIAS")]
        repos: Vec<String>,

        /// Output as update-status XML
        #[arg(long, conflicts_with = "json")]
        xml: bool,
    },

    /// List needed patches, or the patches fixing the given issues
    #[command(alias = "lp")]
    ListPatches {
        #[command(flatten)]
        issues: IssueArgs,

        #[command(flatten)]
        filter: PatchFilterArgs,

        /// List all patches, not only the needed ones
        #[arg(long, short = 'a')]
        all: bool,

        /// Only consider patches from this repository alias (repeatable)
        #[arg(long = "repo", short = 'r', value_name = "ALIAS")]
        repos: Vec<String>,

        /// Output as update-status XML
        #[arg(long, conflicts_with = "json")]
        xml: bool,
    },

    /// Count needed patches; the exit code tells whether updates are pending
    #[command(alias = "pchk")]
    PatchCheck {
        /// Only count patches affecting the software management stack
        #[arg(long)]
        updatestack_only: bool,

        /// Only consider patches from this repository alias (repeatable)
        #[arg(long = "repo", short = 'r', value_name = "ALIAS")]
        repos: Vec<String>,
    },

    /// Mark needed patches for installation
    Patch {
        #[command(flatten)]
        issues: IssueArgs,

        #[command(flatten)]
        filter: PatchFilterArgs,

        /// Mark locked patches too
        #[arg(long)]
        force: bool,

        /// Skip patches that need a reboot, show a message or ask to confirm a licence
        #[arg(long)]
        skip_interactive: bool,

        /// Only mark patches affecting the software management stack
        #[arg(long, conflicts_with_all = ["issues", "bugzilla", "bz", "cve"])]
        updatestack_only: bool,

        /// Only consider patches from this repository alias (repeatable)
        #[arg(long = "repo", short = 'r', value_name = "ALIAS")]
        repos: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Package,
    Patch,
    Pattern,
    Product,
    Application,
}

impl KindArg {
    pub fn res_kind(self) -> ResKind {
        match self {
            KindArg::Package => ResKind::Package,
            KindArg::Patch => ResKind::Patch,
            KindArg::Pattern => ResKind::Pattern,
            KindArg::Product => ResKind::Product,
            KindArg::Application => ResKind::Application,
        }
    }
}

/// Issue filter flags. A bare flag matches every issue of its tracker.
#[derive(Args, Debug, Clone, Default)]
pub struct IssueArgs {
    /// Issues in any tracker (comma-separated ids; bare for all)
    #[arg(
        long,
        value_name = "IDS",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "",
        conflicts_with_all = ["bugzilla", "bz", "cve"]
    )]
    pub issues: Vec<String>,

    /// Bugzilla bug numbers (comma-separated; bare for all)
    #[arg(
        long,
        value_name = "IDS",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = ""
    )]
    pub bugzilla: Vec<String>,

    /// Alias of --bugzilla
    #[arg(
        long,
        value_name = "IDS",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = ""
    )]
    pub bz: Vec<String>,

    /// CVE numbers (comma-separated; bare for all)
    #[arg(
        long,
        value_name = "IDS",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = ""
    )]
    pub cve: Vec<String>,
}

impl IssueArgs {
    /// Scan the flags into issue predicates.
    pub fn scan(&self) -> (IssueSpecSet, Vec<IssueScanWarning>) {
        IssueSpecSet::scan(&issue_filter_flags(), |flag| {
            let values = match flag {
                "issues" => &self.issues,
                "bugzilla" => &self.bugzilla,
                "bz" => &self.bz,
                "cve" => &self.cve,
                _ => return Vec::new(),
            };
            values.iter().map(String::as_str).collect()
        })
    }
}

/// Patch acceptance options.
#[derive(Args, Debug, Clone, Default)]
pub struct PatchFilterArgs {
    /// Only patches issued up to and including this date
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,

    /// Only patches of this category (repeatable, comma-separated)
    #[arg(long = "category", short = 'g', value_name = "CATEGORY")]
    pub categories: Vec<String>,

    /// Only patches of this severity (repeatable, comma-separated)
    #[arg(long = "severity", value_name = "SEVERITY")]
    pub severities: Vec<String>,
}

impl PatchFilterArgs {
    pub fn to_filter(&self) -> PatchFilter {
        let filter = PatchFilter::default()
            .categories(self.categories.iter().map(String::as_str))
            .severities(self.severities.iter().map(String::as_str));
        match self.date {
            Some(date) => filter.issued_until(date),
            None => filter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("patchscope").chain(args.iter().copied()))
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_and_valued_issue_flags_scan_into_predicates() {
        let cli = parse(&["list-patches", "--cve", "--bugzilla=1,2", "--bz"]).expect("parse");
        let Commands::ListPatches { issues, .. } = cli.command else {
            panic!("expected list-patches");
        };
        assert_eq!(issues.cve, vec![""]);
        assert_eq!(issues.bz, vec![""]);

        let (set, warnings) = issues.scan();
        let rendered: Vec<String> = set.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["bugzilla#*", "bugzilla#1", "bugzilla#2", "cve#*"]
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn issues_conflicts_with_tracker_flags() {
        let err = parse(&["patch", "--issues=1", "--cve=CVE-1"])
            .err()
            .expect("conflicting flags should be rejected");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn filter_args_build_a_patch_filter() {
        let cli = parse(&[
            "list-patches",
            "--date",
            "2024-03-01",
            "-g",
            "security,recommended",
            "--severity",
            "critical",
        ])
        .expect("parse");
        let Commands::ListPatches { filter, .. } = cli.command else {
            panic!("expected list-patches");
        };
        assert!(!filter.to_filter().is_unrestricted());
        assert_eq!(filter.categories, vec!["security,recommended"]);
    }

    #[test]
    fn global_flags_work_after_the_subcommand() {
        let cli = parse(&["patch-check", "--json", "--pool", "p.jsonl"]).expect("parse");
        assert!(cli.global.json);
        assert_eq!(cli.global.pool.as_deref(), Some("p.jsonl"));
    }
}
