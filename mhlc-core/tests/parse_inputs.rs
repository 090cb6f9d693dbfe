use mhlc_core::parse::{parse_mhl_xml, parse_plain_list};
use mhlc_core::{parse_manifest, HashAlgorithm, Manifest, MhlError, OriginKind};

const MHL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<hashlist version="1.1">
  <creatorinfo>
    <name>DIT</name>
    <username>dit</username>
  </creatorinfo>
  <hash>
    <file>Clip/A001 &amp; B.mov</file>
    <size>1024</size>
    <lastmodificationdate>2019-03-12T10:11:12Z</lastmodificationdate>
    <xxhash64be>0123456789ABCDEF</xxhash64be>
    <hashdate>2019-03-12T10:20:00Z</hashdate>
  </hash>
  <hash>
    <file>Clip/A002.mov</file>
    <size>2048</size>
    <md5>d41d8cd98f00b204e9800998ecf8427e</md5>
  </hash>
</hashlist>
"#;

#[test]
fn mhl_hash_elements_become_entries() {
    let parsed = parse_mhl_xml("day1.mhl", MHL).unwrap();
    assert_eq!(parsed.origin_kind, OriginKind::Structured);
    assert_eq!(parsed.format_version.as_deref(), Some("1.1"));
    assert_eq!(parsed.entries.len(), 2);

    let first = &parsed.entries[0];
    assert_eq!(first.get("file"), Some("Clip/A001 & B.mov"));
    assert_eq!(first.get("size"), Some("1024"));
    assert_eq!(first.get("xxhash64be"), Some("0123456789ABCDEF"));
    assert_eq!(first.get("name"), None);
    assert_eq!(parsed.entries[1].get("md5"), Some("d41d8cd98f00b204e9800998ecf8427e"));
}

#[test]
fn single_hash_is_still_a_list() {
    let xml = "<hashlist><hash><file>a.mov</file><md5>00ff</md5></hash></hashlist>";
    let parsed = parse_mhl_xml("one.mhl", xml).unwrap();
    assert_eq!(parsed.entries.len(), 1);
    assert_eq!(parsed.format_version, None);
}

#[test]
fn broken_xml_is_reported() {
    let err = parse_mhl_xml("bad.mhl", "<hashlist><hash><file>a</hash></hashlist>").unwrap_err();
    assert!(matches!(err, MhlError::Xml { ref path, .. } if path == "bad.mhl"));

    let err = parse_mhl_xml("other.xml", "<catalog><item/></catalog>").unwrap_err();
    assert!(matches!(err, MhlError::Xml { .. }));
    assert!(err.is_malformed_manifest());
}

#[test]
fn hashlist_without_entries_fails_at_manifest() {
    let parsed = parse_mhl_xml("empty.mhl", "<hashlist version=\"1.1\"></hashlist>").unwrap();
    let err = Manifest::from_parsed("empty.mhl", parsed).unwrap_err();
    assert!(matches!(err, MhlError::EmptyManifest { .. }));
}

#[test]
fn plain_list_infers_algorithm_from_length() {
    let text = "d41d8cd98f00b204e9800998ecf8427e  Clip/A001.mov\n# comment\n\n0123456789abcdef *Clip/A002.mov\r\n";
    let parsed = parse_plain_list("card.txt", text).unwrap();
    assert_eq!(parsed.origin_kind, OriginKind::Plain);
    assert_eq!(parsed.entries.len(), 2);
    assert_eq!(parsed.entries[0].get("md5"), Some("d41d8cd98f00b204e9800998ecf8427e"));
    assert_eq!(parsed.entries[1].get("file"), Some("Clip/A002.mov"));
    assert_eq!(parsed.entries[1].get("xxhash64be"), Some("0123456789abcdef"));
}

#[test]
fn plain_list_extension_names_algorithm() {
    let parsed = parse_plain_list("card.xxh64", "0123456789abcdef  a.mov\n").unwrap();
    assert_eq!(parsed.entries[0].get("xxhash64"), Some("0123456789abcdef"));

    let m = Manifest::from_parsed("card.xxh64", parsed).unwrap();
    let r = m.records().next().unwrap();
    assert_eq!(r.identifier.algorithm, HashAlgorithm::Xxhash64be);
    assert_eq!(r.identifier.value, "efcdab8967452301");
    assert_eq!(m.total_size(), None);
}

#[test]
fn plain_list_rejects_unknown_digest() {
    let err = parse_plain_list("card.txt", "abcdef  a.mov\n").unwrap_err();
    assert!(matches!(err, MhlError::InvalidField { .. }));
    assert!(parse_plain_list("card.txt", "d41d8cd98f00b204e9800998ecf8427e\n").is_err());
}

#[test]
fn content_picks_the_parser() {
    let xml = format!("\u{feff}\n  {MHL}");
    assert_eq!(parse_manifest("day1.mhl", &xml).unwrap().origin_kind, OriginKind::Structured);
    let plain = parse_manifest("day1.md5", "d41d8cd98f00b204e9800998ecf8427e  a.mov\n").unwrap();
    assert_eq!(plain.origin_kind, OriginKind::Plain);
}
