//! Parsing collaborator: turns MHL XML or plain checksum lists into a flat
//! sequence of [`RawEntry`] values. No file I/O; callers pass the text.

use std::collections::BTreeMap;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::algorithm::HashAlgorithm;
use crate::error::{MhlError, Result};

/// Where a manifest came from. Plain lists carry no size or dates.
#[derive(serde::Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OriginKind {
    Structured,
    Plain,
}

/// One file entry as field name -> raw text. Field names are lowercase.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawEntry {
    fields: BTreeMap<String, String>,
}

impl RawEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        self.fields.insert(name.to_ascii_lowercase(), value.to_string());
    }

    /// Present and non-blank.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.trim()).filter(|s| !s.is_empty())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parsed manifest body, before identifiers are assigned.
#[derive(Clone, Debug)]
pub struct ParsedManifest {
    pub origin_kind: OriginKind,
    pub format_version: Option<String>,
    pub entries: Vec<RawEntry>,
}

/// Pick the parser from the content: XML starts with `<`.
pub fn parse_manifest(source_path: &str, text: &str) -> Result<ParsedManifest> {
    let body = text.trim_start_matches('\u{feff}').trim_start();
    if body.starts_with('<') {
        parse_mhl_xml(source_path, body)
    } else {
        parse_plain_list(source_path, body)
    }
}

/// Parse an MHL `<hashlist>` document. Every `<hash>` element becomes one
/// entry whose fields are its child elements.
pub fn parse_mhl_xml(source_path: &str, xml: &str) -> Result<ParsedManifest> {
    // Text is not trimmed per event: entity references split text events and
    // the spaces around them belong to the value.
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut saw_root = false;
    let mut format_version = None;
    let mut entries = Vec::new();
    let mut current: Option<RawEntry> = None;
    let mut field: Option<String> = None;
    let mut text = String::new();

    let xml_err = |e: &dyn std::fmt::Display| MhlError::Xml { path: source_path.to_string(), message: e.to_string() };

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                match name.as_str() {
                    "hashlist" => {
                        saw_root = true;
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"version" {
                                format_version = Some(String::from_utf8_lossy(&attr.value).to_string());
                            }
                        }
                    }
                    "hash" if current.is_none() => current = Some(RawEntry::new()),
                    _ if current.is_some() => {
                        field = Some(name);
                        text.clear();
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                if name == "hashlist" {
                    saw_root = true;
                } else if name == "hash" && current.is_none() {
                    entries.push(RawEntry::new());
                } else if let Some(entry) = current.as_mut() {
                    entry.insert(&name, "");
                }
            }
            Ok(Event::Text(ref e)) if field.is_some() => {
                text.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Ok(Event::CData(ref e)) if field.is_some() => {
                text.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Ok(Event::GeneralRef(ref e)) if field.is_some() => {
                let name = String::from_utf8_lossy(e.as_ref()).to_string();
                text.push_str(&resolve_entity(&name).ok_or_else(|| xml_err(&format!("unknown entity &{name};")))?);
            }
            Ok(Event::End(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                if field.as_deref() == Some(name.as_str()) {
                    if let (Some(entry), Some(f)) = (current.as_mut(), field.take()) {
                        entry.insert(&f, &text);
                    }
                } else if name == "hash" {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_err(&e)),
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(xml_err(&"missing <hashlist> root element"));
    }
    Ok(ParsedManifest { origin_kind: OriginKind::Structured, format_version, entries })
}

fn resolve_entity(name: &str) -> Option<String> {
    let s = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        _ => {
            let code = if let Some(h) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(h, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            return char::from_u32(code).map(String::from);
        }
    };
    Some(s.to_string())
}

/// Parse `<digest>  <path>` lines (md5sum / xxhsum style). The algorithm comes
/// from the file extension when it names one, else from the digest length.
pub fn parse_plain_list(source_path: &str, text: &str) -> Result<ParsedManifest> {
    let by_extension = algorithm_from_extension(source_path);
    let mut entries = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let (digest, rest) = line
            .trim_start()
            .split_once(char::is_whitespace)
            .ok_or_else(|| MhlError::invalid("line", line, format!("line {}: expected '<hash>  <file>'", lineno + 1)))?;
        // "hash *file" marks binary mode in coreutils output
        let file = rest.trim_start();
        let file = file.strip_prefix('*').unwrap_or(file);
        if file.is_empty() {
            return Err(MhlError::invalid("line", line, format!("line {}: no file name", lineno + 1)));
        }
        let algorithm = by_extension
            .or_else(|| HashAlgorithm::from_digest_len(digest.len()))
            .ok_or_else(|| MhlError::invalid("line", line, format!("line {}: cannot tell hash algorithm", lineno + 1)))?;
        entries.push(RawEntry::new().with("file", file).with(algorithm.name(), digest));
    }

    Ok(ParsedManifest { origin_kind: OriginKind::Plain, format_version: None, entries })
}

fn algorithm_from_extension(source_path: &str) -> Option<HashAlgorithm> {
    let ext = Path::new(source_path).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "md5" => Some(HashAlgorithm::Md5),
        "sha1" => Some(HashAlgorithm::Sha1),
        "xxh64be" | "xxhash64be" => Some(HashAlgorithm::Xxhash64be),
        "xxh64" | "xxhash64" => Some(HashAlgorithm::Xxhash64),
        "xxhash" | "xxh32" => Some(HashAlgorithm::Xxhash),
        _ => None,
    }
}
