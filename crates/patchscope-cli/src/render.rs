//! Human tables, update-status XML and JSON rows.

use std::io::IsTerminal;

use owo_colors::OwoColorize;
use patchscope_kernel::{
    FallbackMatch, IssueMatch, PatchRecord, PatchStatus, RepoRef, UpdateCandidate,
};
use serde_json::{Value, json};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::Settings;

/// Widest summary shown before abbreviation.
pub const SUMMARY_WIDTH: usize = 60;

/// Terminal presentation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub color: bool,
    pub abbrev: bool,
}

impl Style {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            color: !settings.no_color && std::io::stdout().is_terminal(),
            abbrev: !settings.no_abbrev,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    text: String,
    bold: bool,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    /// Bold when `value` is a security category or critical severity.
    pub fn highlighted(value: &str) -> Self {
        let bold = value.eq_ignore_ascii_case("security") || value.eq_ignore_ascii_case("critical");
        Self {
            text: value.to_string(),
            bold,
        }
    }
}

/// Column table with `|` separators and a `-+-` rule under the header.
///
/// With abbreviation on, the last column is cut to [`SUMMARY_WIDTH`].
#[derive(Debug, Clone)]
pub struct Table {
    header: Vec<&'static str>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(header: &[&'static str]) -> Self {
        Self {
            header: header.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self, style: &Style) -> String {
        let last = self.header.len().saturating_sub(1);
        let rows: Vec<Vec<Cell>> = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(col, cell)| {
                        if style.abbrev && col == last {
                            Cell {
                                text: abbreviate(&cell.text, SUMMARY_WIDTH),
                                bold: cell.bold,
                            }
                        } else {
                            cell.clone()
                        }
                    })
                    .collect()
            })
            .collect();

        let mut widths: Vec<usize> = self.header.iter().map(|h| UnicodeWidthStr::width(*h)).collect();
        for row in &rows {
            for (col, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(col) {
                    *width = (*width).max(UnicodeWidthStr::width(cell.text.as_str()));
                }
            }
        }

        let header: Vec<Cell> = self.header.iter().map(|h| Cell::plain(*h)).collect();
        let mut lines = vec![render_row(&header, &widths, style)];
        lines.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        lines.extend(rows.iter().map(|row| render_row(row, &widths, style)));
        lines.join("\n")
    }
}

fn render_row(cells: &[Cell], widths: &[usize], style: &Style) -> String {
    let rendered: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(col, width)| {
            let (text, bold) = cells
                .get(col)
                .map_or(("", false), |c| (c.text.as_str(), c.bold));
            let pad = " ".repeat(width.saturating_sub(UnicodeWidthStr::width(text)));
            if bold && style.color {
                format!("{}{pad}", text.bold())
            } else {
                format!("{text}{pad}")
            }
        })
        .collect();
    rendered.join(" | ").trim_end().to_string()
}

/// First line of `text`, cut to `width` display columns with a trailing `...`.
pub fn abbreviate(text: &str, width: usize) -> String {
    let line = text.lines().next().unwrap_or("");
    if UnicodeWidthStr::width(line) <= width {
        return line.to_string();
    }
    let budget = width.saturating_sub(3);
    let mut used = 0;
    let mut kept = String::new();
    for ch in line.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        kept.push(ch);
    }
    format!("{kept}...")
}

pub fn xml_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

fn xml_bool(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

fn xml_body(out: &mut String, summary: &str, description: &str, license: &str, repo: &RepoRef) {
    out.push_str(&format!("  <summary>{}</summary>\n", xml_escape(summary)));
    out.push_str(&format!(
        "  <description>{}</description>\n",
        xml_escape(description)
    ));
    out.push_str(&format!("  <license>{}</license>\n", xml_escape(license)));
    if !repo.alias.is_empty() {
        out.push_str(&format!(
            "  <source url=\"{}\" alias=\"{}\"/>\n",
            xml_escape(&repo.url),
            xml_escape(&repo.alias)
        ));
    }
}

/// One `<update kind="patch">` element.
pub fn patch_update_xml(patch: &PatchRecord, status: PatchStatus) -> String {
    let mut out = format!(
        " <update name=\"{}\" edition=\"{}\" arch=\"{}\" status=\"{}\" category=\"{}\" severity=\"{}\" pkgmanager=\"{}\" restart=\"{}\" interactive=\"{}\" kind=\"patch\">\n",
        xml_escape(&patch.name),
        xml_escape(&patch.edition.to_string()),
        xml_escape(&patch.arch),
        status.markup_label(),
        xml_escape(&patch.category),
        xml_escape(&patch.severity),
        xml_bool(patch.restart_suggested),
        xml_bool(patch.reboot_suggested),
        xml_bool(patch.is_interactive()),
    );
    xml_body(
        &mut out,
        &patch.summary,
        &patch.description,
        &patch.license_to_confirm,
        &patch.repository,
    );
    out.push_str(" </update>\n");
    out
}

/// One `<update>` element for a non-patch candidate.
pub fn candidate_update_xml(update: &UpdateCandidate) -> String {
    let candidate = &update.candidate;
    let mut out = format!(
        " <update name=\"{}\" edition=\"{}\" arch=\"{}\" kind=\"{}\"",
        xml_escape(candidate.name()),
        xml_escape(&candidate.edition.to_string()),
        xml_escape(&candidate.arch),
        candidate.kind(),
    );
    if let Some(old) = update.old_edition() {
        out.push_str(&format!(" edition-old=\"{}\"", xml_escape(&old.to_string())));
    }
    if let Some(old) = update.old_arch() {
        out.push_str(&format!(" arch-old=\"{}\"", xml_escape(old)));
    }
    out.push_str(">\n");
    xml_body(
        &mut out,
        &candidate.summary,
        &candidate.description,
        &candidate.license_to_confirm,
        &candidate.repository,
    );
    out.push_str(" </update>\n");
    out
}

/// The `<update-status>` document around pre-rendered `<update>` elements.
///
/// `blocked` holds updates hidden behind pending update-stack patches.
pub fn update_status_xml(updates: &[String], blocked: Option<&[String]>) -> String {
    let mut out = String::from("<?xml version='1.0'?>\n<stream>\n<update-status version=\"0.6\">\n");
    out.push_str("<update-list>\n");
    for update in updates {
        out.push_str(update);
    }
    out.push_str("</update-list>\n");
    if let Some(blocked) = blocked {
        out.push_str("<blocked-update-list>\n");
        for update in blocked {
            out.push_str(update);
        }
        out.push_str("</blocked-update-list>\n");
    }
    out.push_str("</update-status>\n</stream>");
    out
}

pub fn patch_json(patch: &PatchRecord, status: PatchStatus) -> Value {
    json!({
        "name": patch.name,
        "edition": patch.edition.to_string(),
        "arch": patch.arch,
        "repository": patch.repository.alias,
        "category": patch.category,
        "severity": patch.severity,
        "interactiveFlags": patch.interactive_flags().to_string(),
        "status": status,
        "summary": patch.summary,
        "issued": patch.issued.map(|d| d.to_string())
    })
}

pub fn issue_match_json(row: &IssueMatch<'_>) -> Value {
    json!({
        "issue": row.issue.to_string(),
        "refType": row.ref_type,
        "refId": row.ref_id,
        "patchName": row.patch.name,
        "category": row.patch.category,
        "severity": row.patch.severity,
        "interactiveFlags": row.patch.interactive_flags().to_string(),
        "status": row.status
    })
}

pub fn fallback_match_json(row: &FallbackMatch<'_>) -> Value {
    json!({
        "issue": row.issue.to_string(),
        "patchName": row.patch.name,
        "category": row.patch.category,
        "severity": row.patch.severity,
        "interactiveFlags": row.patch.interactive_flags().to_string(),
        "summary": row.patch.summary
    })
}

pub fn candidate_json(update: &UpdateCandidate) -> Value {
    let candidate = &update.candidate;
    json!({
        "name": candidate.name(),
        "kind": candidate.kind().as_str(),
        "oldEdition": update.old_edition().map(ToString::to_string),
        "newEdition": candidate.edition.to_string(),
        "oldArch": update.old_arch(),
        "newArch": candidate.arch,
        "repository": candidate.repository.alias
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchscope_kernel::{Candidate, Identity, InstalledItem, ResKind, ValidationState};

    const PLAIN: Style = Style {
        color: false,
        abbrev: true,
    };

    fn sample_patch() -> PatchRecord {
        let mut patch = PatchRecord::new("SUSE-2024-1", "1".parse().expect("edition"));
        patch.category = "security".to_string();
        patch.severity = "important".to_string();
        patch.summary = "Fix <openssl> & friends".to_string();
        patch.reboot_suggested = true;
        patch.repository = RepoRef {
            alias: "repo-update".to_string(),
            name: "Updates".to_string(),
            url: "https://example.org/update?a=1&b=2".to_string(),
        };
        patch.validation = ValidationState::Broken;
        patch
    }

    #[test]
    fn table_pads_columns_and_draws_a_rule() {
        let mut table = Table::new(&["Name", "Category", "Summary"]);
        table.push(vec![
            Cell::plain("SUSE-1"),
            Cell::highlighted("security"),
            Cell::plain("Fix"),
        ]);
        table.push(vec![
            Cell::plain("SUSE-22"),
            Cell::highlighted("recommended"),
            Cell::plain("Update"),
        ]);

        insta::assert_snapshot!(table.render(&PLAIN), @r"
        Name    | Category    | Summary
        --------+-------------+--------
        SUSE-1  | security    | Fix
        SUSE-22 | recommended | Update
        ");
    }

    #[test]
    fn highlighting_is_bold_only_with_color() {
        let mut table = Table::new(&["Category", "Severity"]);
        table.push(vec![Cell::highlighted("security"), Cell::highlighted("low")]);
        let colored = table.render(&Style {
            color: true,
            abbrev: true,
        });
        assert!(colored.contains("\x1b[1msecurity\x1b[0m"));
        assert!(!colored.contains("\x1b[1mlow"));
        assert!(!table.render(&PLAIN).contains('\x1b'));
    }

    #[test]
    fn last_column_is_abbreviated_unless_disabled() {
        let long = "x".repeat(SUMMARY_WIDTH + 10);
        let mut table = Table::new(&["Name", "Summary"]);
        table.push(vec![Cell::plain("p"), Cell::plain(long.clone())]);

        let cut = table.render(&PLAIN);
        assert!(cut.ends_with(&format!("{}...", "x".repeat(SUMMARY_WIDTH - 3))));

        let full = table.render(&Style {
            color: false,
            abbrev: false,
        });
        assert!(full.ends_with(&long));
    }

    #[test]
    fn abbreviate_keeps_the_first_line() {
        assert_eq!(abbreviate("short\nsecond line", 20), "short");
        assert_eq!(abbreviate("abcdefghij", 5), "ab...");
        assert_eq!(abbreviate("", 5), "");
    }

    #[test]
    fn abbreviate_counts_wide_characters_as_two_columns() {
        assert_eq!(abbreviate("漢字漢字", 8), "漢字漢字");
        assert_eq!(abbreviate("漢字漢字", 7), "漢字...");
        assert_eq!(abbreviate("a漢字漢字", 6), "a漢...");
    }

    #[test]
    fn wide_characters_keep_columns_aligned() {
        let mut table = Table::new(&["Name", "Arch"]);
        table.push(vec![Cell::plain("漢字漢字"), Cell::plain("x86_64")]);
        table.push(vec![Cell::plain("abcd"), Cell::plain("noarch")]);

        let rendered = table.render(&PLAIN);
        let separators: Vec<usize> = rendered
            .lines()
            .filter(|line| !line.starts_with('-'))
            .map(|line| {
                let prefix = &line[..line.find('|').expect("row has a separator")];
                UnicodeWidthStr::width(prefix)
            })
            .collect();
        assert_eq!(separators, vec![9, 9, 9]);
    }

    #[test]
    fn xml_escapes_markup_characters() {
        assert_eq!(
            xml_escape(r#"<a href="x">&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&apos;&lt;/a&gt;"
        );
    }

    #[test]
    fn patch_update_element() {
        let patch = sample_patch();
        let expected = concat!(
            " <update name=\"SUSE-2024-1\" edition=\"1\" arch=\"noarch\" status=\"needed\" category=\"security\" severity=\"important\" pkgmanager=\"false\" restart=\"true\" interactive=\"true\" kind=\"patch\">\n",
            "  <summary>Fix &lt;openssl&gt; &amp; friends</summary>\n",
            "  <description></description>\n",
            "  <license></license>\n",
            "  <source url=\"https://example.org/update?a=1&amp;b=2\" alias=\"repo-update\"/>\n",
            " </update>\n",
        );
        assert_eq!(patch_update_xml(&patch, PatchStatus::Needed), expected);
    }

    #[test]
    fn candidate_element_carries_old_edition() {
        let update = UpdateCandidate {
            candidate: Candidate {
                identity: Identity::new(ResKind::Package, "openssl"),
                edition: "3.1.4-2".parse().expect("edition"),
                arch: "x86_64".to_string(),
                repository: RepoRef::default(),
                summary: "TLS".to_string(),
                description: String::new(),
                license_to_confirm: String::new(),
            },
            installed: Some(InstalledItem {
                identity: Identity::new(ResKind::Package, "openssl"),
                edition: "3.1.4-1".parse().expect("edition"),
                arch: "x86_64".to_string(),
            }),
        };
        let xml = candidate_update_xml(&update);
        assert!(xml.starts_with(
            " <update name=\"openssl\" edition=\"3.1.4-2\" arch=\"x86_64\" kind=\"package\" edition-old=\"3.1.4-1\">\n"
        ));
        assert!(!xml.contains("arch-old"));
        assert!(!xml.contains("<source"));

        let row = candidate_json(&update);
        assert_eq!(row["oldEdition"], "3.1.4-1");
        assert_eq!(row["oldArch"], Value::Null);
        assert_eq!(row["kind"], "package");
    }

    #[test]
    fn document_lists_blocked_updates_separately() {
        let doc = update_status_xml(&[" <update/>\n".to_string()], Some(&[]));
        insta::assert_snapshot!(doc, @r#"
        <?xml version='1.0'?>
        <stream>
        <update-status version="0.6">
        <update-list>
         <update/>
        </update-list>
        <blocked-update-list>
        </blocked-update-list>
        </update-status>
        </stream>
        "#);
        assert!(!update_status_xml(&[], None).contains("blocked"));
    }

    #[test]
    fn patch_json_uses_camel_case_and_status_labels() {
        let row = patch_json(&sample_patch(), PatchStatus::NotNeeded);
        assert_eq!(row["interactiveFlags"], "reboot");
        assert_eq!(row["status"], "not-needed");
        assert_eq!(row["repository"], "repo-update");
        assert_eq!(row["issued"], Value::Null);
    }
}
