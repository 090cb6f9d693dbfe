//! Human-readable and JSON rendering of manifests and reconciliations.
//!
//! Every function returns lines; printing is left to the caller. Colour
//! follows `console`'s global switch, which is off when stdout is not a
//! terminal.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use console::{style, StyledObject};
use serde::Serialize;

use crate::localize::FluentLoc;
use crate::manifest::{Manifest, SkippedEntry};
use crate::parse::OriginKind;
use crate::reconcile::{AttributeDiff, Category, Outcome, Reconciliation, Side, Tally, Unit};
use crate::record::{Attribute, HashRecord};
use crate::size::{format_size, SizeFormat};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const INDENT: &str = "      ";

#[derive(Clone, Copy, Debug, Default)]
pub struct ReportConfig {
    /// Per-file detail lines and no `--info` hint.
    pub verbose: bool,
    pub size_format: SizeFormat,
    pub include_date_differences: bool,
}

pub struct Report {
    config: ReportConfig,
    loc: FluentLoc,
}

fn side_style<D>(side: Side, text: D) -> StyledObject<D> {
    match side {
        Side::First => style(text).green(),
        Side::Second => style(text).yellow(),
    }
}

fn category_style<D>(category: Category, text: D) -> StyledObject<D> {
    match category {
        Category::HashTypeDifferent => style(text).cyan(),
        Category::HashChanged => style(text).red(),
        _ => style(text),
    }
}

fn show_date(d: Option<DateTime<Utc>>) -> String {
    d.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_else(|| "unspecified".to_string())
}

fn date_label(attr: Attribute) -> &'static str {
    match attr {
        Attribute::LastModified => "Modified date",
        Attribute::Created => "Creation date",
        _ => "Hash date",
    }
}

fn attribute_list(attrs: &BTreeSet<Attribute>) -> String {
    attrs.iter().map(|a| a.field_name()).collect::<Vec<_>>().join(", ")
}

/// Two-line "different" block with values aligned under each other.
fn different(label: &str, first: &str, second: &str) -> [String; 2] {
    let head = format!("{INDENT}{label}: different (1st):");
    let pad = " ".repeat(head.len() - "(1st):".len());
    [
        format!("{head} {}", side_style(Side::First, first)),
        format!("{pad}(2nd): {}", side_style(Side::Second, second)),
    ]
}

#[derive(Serialize)]
struct ManifestJson<'a> {
    path: &'a str,
    origin_kind: OriginKind,
    format_version: Option<&'a str>,
    records: usize,
    total_size: Option<u64>,
    skipped: &'a [SkippedEntry],
}

impl<'a> ManifestJson<'a> {
    fn of(m: &'a Manifest) -> Self {
        Self {
            path: &m.source_path,
            origin_kind: m.origin_kind,
            format_version: m.format_version.as_deref(),
            records: m.len(),
            total_size: m.total_size(),
            skipped: m.skipped(),
        }
    }
}

#[derive(Serialize)]
struct ComparisonJson<'a> {
    version: &'a str,
    first: ManifestJson<'a>,
    second: ManifestJson<'a>,
    include_date_differences: bool,
    tally: &'a Tally,
    outcomes: &'a [Outcome],
}

impl Report {
    pub fn new(config: ReportConfig) -> Self {
        Self { config, loc: FluentLoc::builtin("en-GB") }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn banner(version: &str) -> String {
        format!("mhlc (v{version})")
    }

    pub fn size(&self, size: Option<u64>) -> String {
        match size {
            Some(b) => format_size(b, self.config.size_format),
            None => self.loc.msg("size-unspecified", &[]),
        }
    }

    /// Path, record count and total size of one manifest.
    pub fn manifest_summary(&self, m: &Manifest, side: Side) -> Vec<String> {
        let head = format!("{} MHL file: ", side.label());
        let pad = " ".repeat(head.len());
        let mut out = vec![
            format!("{head}{}", side_style(side, &m.source_path)),
            format!("{pad}{}", side_style(side, self.loc.count("file-count", m.len()))),
            format!("{pad}{}", side_style(side, self.size(m.total_size()))),
        ];
        if !m.skipped().is_empty() {
            out.push(format!("{pad}{}", style(self.loc.count("skipped-entries", m.skipped().len())).red()));
        }
        out
    }

    /// Per-file explanation of one outcome.
    pub fn detail_lines(&self, o: &Outcome) -> Vec<String> {
        match (o.unit, o.category) {
            (Unit::Delta(side), Category::Missing) => self.missing_lines(o, side),
            (Unit::Delta(side), _) => self.matched_delta_lines(o, side),
            (Unit::Common, _) => self.common_lines(o),
        }
    }

    fn common_lines(&self, o: &Outcome) -> Vec<String> {
        let (Some(a), Some(b)) = (&o.first, &o.second) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if o.diff.changed.contains(&Attribute::FileName) {
            out.push(format!("  {}", style(&a.file_name).green().bold()));
            out.extend(different("Filename", &a.file_name, &b.file_name));
        } else {
            out.push(format!("  {}", style(&a.file_name).bold()));
        }
        if o.diff.changed.contains(&Attribute::Directory) {
            out.extend(different("Path", &a.directory, &b.directory));
        } else {
            out.push(format!("{INDENT}Path: identical: {}", a.directory));
        }
        out.push(format!("{INDENT}Hash: identical: {}", a.identifier));
        self.size_and_dates(&mut out, a, b, &o.diff);
        out
    }

    fn matched_delta_lines(&self, o: &Outcome, side: Side) -> Vec<String> {
        let (Some(this), Some(that)) = (o.record(side), o.record(side.opposite())) else {
            return Vec::new();
        };
        let mut out = vec![format!("  {}", style(&this.file_name).bold())];

        match o.category {
            Category::HashTypeDifferent => {
                out.push(format!("{INDENT}{}", style(self.loc.msg("hash-type-different", &[])).cyan()))
            }
            Category::HashChanged => out.push(format!("{INDENT}{}", style(self.loc.msg("hash-changed", &[])).red())),
            Category::Duplicate => {
                out.push(format!("{INDENT}{}", self.loc.msg("is-duplicate", &[])));
                out.push(format!("{INDENT}Hash ({}): {}", side.label(), side_style(side, &this.identifier)));
            }
            _ => out.push(format!("{INDENT}{}", self.loc.msg("hash-identical", &[]))),
        }
        if o.category != Category::Duplicate {
            let opposite = side.opposite();
            out.push(format!("{INDENT}Hash ({}): {}", side.label(), side_style(side, &this.identifier)));
            out.push(format!("{INDENT}Hash ({}): {}", opposite.label(), side_style(opposite, &that.identifier)));
        }

        if o.diff.changed.is_empty() && o.diff.only_in_first.is_empty() && o.diff.only_in_second.is_empty() {
            return out;
        }
        let (Some(a), Some(b)) = (&o.first, &o.second) else {
            return out;
        };
        if o.diff.changed.contains(&Attribute::FileName) {
            out.extend(different("Filename", &a.file_name, &b.file_name));
        }
        if o.diff.changed.contains(&Attribute::Directory) {
            out.extend(different("Path", &a.directory, &b.directory));
        } else {
            out.push(format!("{INDENT}Path: identical: {}", a.directory));
        }
        self.size_and_dates(&mut out, a, b, &o.diff);
        out
    }

    fn missing_lines(&self, o: &Outcome, side: Side) -> Vec<String> {
        let Some(r) = o.record(side) else {
            return Vec::new();
        };
        let where_ = side_style(side, format!("{} MHL", side.label())).to_string();
        vec![
            format!("  {}", side_style(side, &r.file_name).bold()),
            format!("  {}", self.loc.msg("only-exists-in", &[("side", where_.as_str())])),
            format!("{INDENT}Path: {}", r.directory),
            format!("{INDENT}Size: {}", self.size(r.size)),
            format!("{INDENT}Hash: {}", r.identifier),
        ]
    }

    fn size_and_dates(&self, out: &mut Vec<String>, a: &HashRecord, b: &HashRecord, diff: &AttributeDiff) {
        if diff.changed.contains(&Attribute::Size) {
            out.extend(different("Size", &self.size(a.size), &self.size(b.size)));
        } else {
            out.push(format!("{INDENT}Size: identical: {}", self.size(a.size.or(b.size))));
        }
        if self.config.include_date_differences {
            for attr in [Attribute::LastModified, Attribute::Created, Attribute::HashedAt] {
                if diff.changed.contains(&attr) {
                    out.extend(different(date_label(attr), &show_date(a.date(attr)), &show_date(b.date(attr))));
                }
            }
        }
        for (side, attrs) in [(Side::First, &diff.only_in_first), (Side::Second, &diff.only_in_second)] {
            if !attrs.is_empty() {
                out.push(format!(
                    "{INDENT}{} {}",
                    self.loc.msg("only-in-side", &[("side", side.label())]),
                    side_style(side, attribute_list(attrs))
                ));
            }
        }
    }

    /// Pluralized observation per non-empty category.
    pub fn tally_lines(&self, tally: &Tally) -> Vec<String> {
        let mut out = vec![self.loc.msg("observations", &[])];
        if tally.nothing_in_common() {
            out.push(format!("    {}", style(self.loc.msg("no-files-in-common", &[])).cyan()));
        }
        for (category, count) in tally.iter().filter(|(_, n)| *n > 0) {
            let code = format!("outcome-{}", category.code().to_ascii_lowercase().replace('_', "-"));
            out.push(format!("    {}", category_style(category, self.loc.count(&code, count))));
        }
        if !self.config.verbose {
            out.push(String::new());
            out.push(format!("    {}", self.loc.msg("info-hint", &[])));
        }
        out
    }

    /// Single-manifest listing grouped by directory.
    pub fn listing_lines(&self, m: &Manifest) -> Vec<String> {
        let mut out = self.manifest_summary(m, Side::First);
        for (directory, records) in m.by_directory() {
            out.push(String::new());
            out.push(format!("  {}", style(directory).bold()));
            for r in records {
                let mut line = format!("{INDENT}{}  {}  {}", r.file_name, self.size(r.size), r.identifier);
                if r.is_duplicate {
                    line.push_str(&format!("  {}", style("duplicate").cyan()));
                }
                out.push(line);
                if self.config.verbose {
                    for (label, d) in [("Modified", r.last_modified), ("Created", r.created), ("Hashed", r.hashed_at)] {
                        if d.is_some() {
                            out.push(format!("{INDENT}    {label}: {}", show_date(d)));
                        }
                    }
                }
            }
        }
        out
    }

    /// The whole comparison as pretty JSON.
    pub fn json(&self, first: &Manifest, second: &Manifest, result: &Reconciliation) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&ComparisonJson {
            version: env!("CARGO_PKG_VERSION"),
            first: ManifestJson::of(first),
            second: ManifestJson::of(second),
            include_date_differences: self.config.include_date_differences,
            tally: &result.tally,
            outcomes: &result.outcomes,
        })
    }

    /// A single manifest as pretty JSON.
    pub fn listing_json(&self, m: &Manifest) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct Listing<'a> {
            version: &'a str,
            manifest: ManifestJson<'a>,
            records: Vec<&'a HashRecord>,
        }
        serde_json::to_string_pretty(&Listing {
            version: env!("CARGO_PKG_VERSION"),
            manifest: ManifestJson::of(m),
            records: m.records().collect(),
        })
    }
}
