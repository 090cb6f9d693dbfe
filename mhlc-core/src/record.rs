use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::algorithm::{convert_endian, normalize_digest, HashAlgorithm};
use crate::error::{MhlError, Result};
use crate::parse::RawEntry;

/// The (algorithm, value) pair a record is compared by.
#[derive(Serialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub algorithm: HashAlgorithm,
    pub value: String,
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value, self.algorithm)
    }
}

/// Attributes compared between two records.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    FileName,
    Directory,
    Size,
    LastModified,
    Created,
    HashedAt,
}

impl Attribute {
    /// Name as written in MHL files.
    pub fn field_name(self) -> &'static str {
        match self {
            Attribute::FileName => "filename",
            Attribute::Directory => "directory",
            Attribute::Size => "size",
            Attribute::LastModified => "lastmodificationdate",
            Attribute::Created => "creationdate",
            Attribute::HashedAt => "hashdate",
        }
    }
}

/// One file entry of a manifest.
#[derive(Serialize, Clone, Debug)]
pub struct HashRecord {
    pub file_path: String,
    pub directory: String,
    pub file_name: String,
    /// `None` when the source did not record a size. Not the same as zero.
    pub size: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    pub hashed_at: Option<DateTime<Utc>>,
    pub recorded_hashes: BTreeMap<HashAlgorithm, String>,
    pub identifier: Identifier,
    pub is_duplicate: bool,
    /// Key under which the owning manifest stores this record.
    pub storage_key: String,
    /// Source path of the owning manifest.
    #[serde(skip)]
    pub origin: Arc<str>,
}

impl HashRecord {
    pub fn from_entry(entry: &RawEntry, origin: Arc<str>) -> Result<HashRecord> {
        let file_path = entry
            .get("file")
            .map(|p| p.replace('\\', "/"))
            .ok_or_else(|| MhlError::MissingFilePath { path: origin.to_string(), index: 0 })?;
        let (directory, file_name) = split_path(&file_path);

        let size = match entry.get("size") {
            Some(s) => Some(s.parse::<u64>().map_err(|e| MhlError::invalid("size", s, e.to_string()))?),
            None => None,
        };
        let last_modified = entry.get("lastmodificationdate").map(|s| parse_timestamp("lastmodificationdate", s)).transpose()?;
        let created = entry.get("creationdate").map(|s| parse_timestamp("creationdate", s)).transpose()?;
        let hashed_at = entry.get("hashdate").map(|s| parse_timestamp("hashdate", s)).transpose()?;

        let (recorded_hashes, identifier) = select_identifier(entry)?
            .ok_or_else(|| MhlError::UnsupportedHashAlgorithm { file: file_path.clone() })?;

        Ok(HashRecord {
            storage_key: identifier.value.clone(),
            file_path,
            directory,
            file_name,
            size,
            last_modified,
            created,
            hashed_at,
            recorded_hashes,
            identifier,
            is_duplicate: false,
            origin,
        })
    }

    /// Value of a text attribute used for lookups.
    pub fn text_attribute(&self, attr: RecordAttribute) -> &str {
        match attr {
            RecordAttribute::FileName => &self.file_name,
            RecordAttribute::Directory => &self.directory,
            RecordAttribute::FilePath => &self.file_path,
        }
    }

    /// Whether an optional attribute is recorded at all.
    pub fn has(&self, attr: Attribute) -> bool {
        match attr {
            Attribute::FileName | Attribute::Directory => true,
            Attribute::Size => self.size.is_some(),
            Attribute::LastModified => self.last_modified.is_some(),
            Attribute::Created => self.created.is_some(),
            Attribute::HashedAt => self.hashed_at.is_some(),
        }
    }

    pub fn date(&self, attr: Attribute) -> Option<DateTime<Utc>> {
        match attr {
            Attribute::LastModified => self.last_modified,
            Attribute::Created => self.created,
            Attribute::HashedAt => self.hashed_at,
            _ => None,
        }
    }
}

/// Attributes that can be searched by exact string value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordAttribute {
    FileName,
    Directory,
    FilePath,
}

/// Split on the last `/`. Entries at the manifest root get `"/"`.
pub fn split_path(file_path: &str) -> (String, String) {
    match file_path.rsplit_once('/') {
        Some((dir, name)) if !dir.is_empty() => (dir.to_string(), name.to_string()),
        Some((_, name)) => ("/".to_string(), name.to_string()),
        None => ("/".to_string(), file_path.to_string()),
    }
}

/// Record every accepted digest and choose the identifier by preference
/// order. A little-endian xxhash64 without a big-endian sibling is converted
/// and identified by the big-endian value.
fn select_identifier(entry: &RawEntry) -> Result<Option<(BTreeMap<HashAlgorithm, String>, Identifier)>> {
    let mut recorded = BTreeMap::new();
    let mut identifier: Option<Identifier> = None;

    for alg in HashAlgorithm::PREFERENCE {
        let Some(raw) = entry.get(alg.name()) else {
            continue;
        };
        let value = normalize_digest(alg.name(), raw)?;
        recorded.insert(alg, value.clone());

        let candidate = if alg == HashAlgorithm::Xxhash64 && !recorded.contains_key(&HashAlgorithm::Xxhash64be) {
            let be = convert_endian(&value)?;
            recorded.insert(HashAlgorithm::Xxhash64be, be.clone());
            Identifier { algorithm: HashAlgorithm::Xxhash64be, value: be }
        } else {
            Identifier { algorithm: alg, value }
        };
        identifier.get_or_insert(candidate);
    }

    Ok(identifier.map(|id| (recorded, id)))
}

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parse an MHL timestamp. Without an offset the time is taken as UTC.
pub fn parse_timestamp(field: &str, s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    Err(MhlError::invalid(field, s, "unrecognised date format"))
}
