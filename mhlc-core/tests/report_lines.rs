use mhlc_core::size::format_size;
use mhlc_core::{
    Category, CompareConfig, Manifest, OriginKind, RawEntry, Reconciler, Report, ReportConfig, Side, SizeFormat, Tally,
};

fn plain_report(verbose: bool) -> Report {
    console::set_colors_enabled(false);
    Report::new(ReportConfig { verbose, ..ReportConfig::default() })
}

fn manifest(path: &str, kind: OriginKind, entries: Vec<RawEntry>) -> Manifest {
    Manifest::from_entries(path, kind, entries).unwrap()
}

fn md5(file: &str, digest: &str) -> RawEntry {
    RawEntry::new().with("file", file).with("md5", digest)
}

#[test]
fn human_sizes() {
    assert_eq!(format_size(1, SizeFormat::Decimal), "1 byte");
    assert_eq!(format_size(512, SizeFormat::Decimal), "512 bytes");
    assert_eq!(format_size(1000, SizeFormat::Decimal), "1.0 kB (1000 bytes)");
    assert_eq!(format_size(1000, SizeFormat::Binary), "1000 bytes");
    assert_eq!(format_size(1_234_567, SizeFormat::Decimal), "1.2 MB (1234567 bytes)");
    assert_eq!(format_size(1_048_576, SizeFormat::Binary), "1.0 MiB (1048576 bytes)");
    assert_eq!("iec".parse::<SizeFormat>().unwrap(), SizeFormat::Binary);
    assert!("metric".parse::<SizeFormat>().is_err());
}

#[test]
fn tally_is_pluralised() {
    let mut t = Tally::default();
    t.add(Category::Perfect);
    t.add(Category::Perfect);
    t.add(Category::Missing);
    t.add(Category::HashChanged);

    let lines = plain_report(false).tally_lines(&t);
    assert_eq!(lines[0], "Observations:");
    assert!(lines.contains(&"    2 files matched perfectly".to_string()));
    assert!(lines.contains(&"    1 file was present only in one MHL or the other".to_string()));
    assert!(lines
        .iter()
        .any(|l| l.contains("1 file had different hashes. The file was likely different")));
    assert!(!lines.iter().any(|l| l.contains("NO files in common")));
    assert!(!lines.iter().any(|l| l.contains("DUPLICATE") || l.contains("duplicate")));
    assert_eq!(lines.last().unwrap(), "    Run the check again with --info to view details.");
}

#[test]
fn verbose_drops_the_hint() {
    let mut t = Tally::default();
    t.add(Category::Duplicate);
    t.add(Category::Duplicate);
    let lines = plain_report(true).tally_lines(&t);
    assert!(lines.contains(&"    2 files were duplicates, as they had the same hash as other files".to_string()));
    assert!(!lines.iter().any(|l| l.contains("--info")));
}

#[test]
fn nothing_in_common_is_called_out() {
    let mut t = Tally::default();
    t.add(Category::Missing);
    let lines = plain_report(false).tally_lines(&t);
    assert_eq!(lines[1], "    There were NO files in common between these two MHL files.");
}

#[test]
fn summary_shows_count_and_size() {
    let report = plain_report(false);
    let m = manifest(
        "day1.mhl",
        OriginKind::Structured,
        vec![md5("a.mov", "aa").with("size", "1500"), md5("b.mov", "bb"), RawEntry::new().with("file", "c").with("crc", "0")],
    );
    let lines = report.manifest_summary(&m, Side::First);
    assert_eq!(lines[0], "1st MHL file: day1.mhl");
    assert_eq!(lines[1].trim(), "2 files");
    assert_eq!(lines[2].trim(), "1.5 kB (1500 bytes)");
    assert!(lines[3].contains("1 entry had no accepted hash algorithm"));

    let plain = manifest("day1.md5", OriginKind::Plain, vec![md5("a.mov", "aa")]);
    let lines = report.manifest_summary(&plain, Side::Second);
    assert_eq!(lines[0], "2nd MHL file: day1.md5");
    assert_eq!(lines[1].trim(), "1 file");
    assert_eq!(lines[2].trim(), "size unspecified");
}

#[test]
fn detail_lines_explain_outcomes() {
    let report = plain_report(true);
    let mut rec = Reconciler::new(
        manifest("a.mhl", OriginKind::Structured, vec![md5("Clip/a.mov", "aa").with("size", "10"), md5("gone.mov", "cc")]),
        manifest("b.mhl", OriginKind::Structured, vec![md5("Clip/a.mov", "aa").with("size", "11")]),
        CompareConfig::default(),
    );
    let r = rec.reconcile();

    let impossible = r.of(Category::Impossible).next().unwrap();
    let lines = report.detail_lines(impossible);
    assert_eq!(lines[0], "  a.mov");
    assert!(lines.contains(&"      Path: identical: Clip".to_string()));
    assert!(lines.contains(&"      Hash: identical: aa (md5)".to_string()));
    assert!(lines.contains(&"      Size: different (1st): 10 bytes".to_string()));
    assert!(lines.contains(&"                      (2nd): 11 bytes".to_string()));

    let missing = r.of(Category::Missing).next().unwrap();
    let lines = report.detail_lines(missing);
    assert_eq!(lines[1], "  This file only exists in 1st MHL.");
    assert!(lines.contains(&"      Hash: cc (md5)".to_string()));
}

#[test]
fn listing_groups_by_directory() {
    let report = plain_report(false);
    let m = manifest(
        "day1.mhl",
        OriginKind::Structured,
        vec![md5("B/2.mov", "02").with("size", "5"), md5("A/1.mov", "01"), md5("A/3.mov", "01")],
    );
    let lines = report.listing_lines(&m);
    let a = lines.iter().position(|l| l == "  A").unwrap();
    let b = lines.iter().position(|l| l == "  B").unwrap();
    assert!(a < b);
    assert_eq!(lines[a + 1], "      1.mov  size unspecified  01 (md5)");
    assert_eq!(lines[a + 2], "      3.mov  size unspecified  01 (md5)  duplicate");
    assert_eq!(lines[b + 1], "      2.mov  5 bytes  02 (md5)");
}

#[test]
fn json_carries_tally_and_outcomes() {
    let report = plain_report(false);
    let mut rec = Reconciler::new(
        manifest("a.mhl", OriginKind::Structured, vec![md5("a.mov", "aa"), md5("b.mov", "bb")]),
        manifest("b.mhl", OriginKind::Structured, vec![md5("a.mov", "aa")]),
        CompareConfig::default(),
    );
    let r = rec.reconcile();
    let (a, b) = rec.into_manifests();

    let v: serde_json::Value = serde_json::from_str(&report.json(&a, &b, &r).unwrap()).unwrap();
    assert_eq!(v["tally"]["PERFECT"], 1);
    assert_eq!(v["tally"]["MISSING"], 1);
    assert_eq!(v["first"]["path"], "a.mhl");
    assert_eq!(v["second"]["records"], 1);
    assert_eq!(v["outcomes"].as_array().unwrap().len(), 2);
    assert_eq!(v["outcomes"][1]["category"], "MISSING");
    assert_eq!(v["outcomes"][1]["unit"]["delta"], "first");
}
