use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::algorithm::HashAlgorithm;
use crate::error::{MhlError, Result};
use crate::parse::{OriginKind, ParsedManifest, RawEntry};
use crate::record::{HashRecord, RecordAttribute};

/// An entry that could not be given an identifier and takes no part in the
/// comparison.
#[derive(Serialize, Clone, Debug)]
pub struct SkippedEntry {
    pub index: usize,
    pub file_path: String,
    pub reason: String,
}

/// An ordered set of hash records built from one parsed manifest.
#[derive(Clone, Debug)]
pub struct Manifest {
    pub source_path: String,
    pub origin_kind: OriginKind,
    pub format_version: Option<String>,
    records: Vec<HashRecord>,
    by_key: HashMap<String, usize>,
    skipped: Vec<SkippedEntry>,
}

impl Manifest {
    pub fn from_parsed(source_path: &str, parsed: ParsedManifest) -> Result<Manifest> {
        let mut m = Self::from_entries(source_path, parsed.origin_kind, parsed.entries)?;
        m.format_version = parsed.format_version;
        Ok(m)
    }

    /// Build records, assign identifiers and mark duplicates.
    ///
    /// Fails on an empty entry list or an entry without a file path. Entries
    /// with no accepted hash algorithm are skipped with a warning; if that
    /// leaves no records the manifest counts as empty.
    pub fn from_entries(source_path: &str, origin_kind: OriginKind, entries: Vec<RawEntry>) -> Result<Manifest> {
        if entries.is_empty() {
            return Err(MhlError::EmptyManifest { path: source_path.to_string() });
        }
        let origin: Arc<str> = Arc::from(source_path);
        let mut records = Vec::with_capacity(entries.len());
        let mut by_key = HashMap::with_capacity(entries.len());
        let mut dup_counters: HashMap<String, usize> = HashMap::new();
        let mut skipped = Vec::new();

        for (index, entry) in entries.iter().enumerate() {
            if entry.get("file").is_none() {
                return Err(MhlError::MissingFilePath { path: source_path.to_string(), index });
            }
            let mut rec = match HashRecord::from_entry(entry, origin.clone()) {
                Ok(r) => r,
                Err(MhlError::UnsupportedHashAlgorithm { file }) => {
                    warn!(manifest = source_path, file = %file, "no accepted hash algorithm; entry excluded from comparison");
                    skipped.push(SkippedEntry {
                        index,
                        file_path: file,
                        reason: "no accepted hash algorithm".to_string(),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            if by_key.contains_key(&rec.identifier.value) {
                let n = dup_counters.entry(rec.identifier.value.clone()).or_insert(0);
                *n += 1;
                rec.is_duplicate = true;
                rec.storage_key = format!("{}_{}", rec.identifier.value, n);
                debug!(manifest = source_path, key = %rec.storage_key, file = %rec.file_path, "duplicate identifier");
            }
            by_key.insert(rec.storage_key.clone(), records.len());
            records.push(rec);
        }

        if records.is_empty() {
            return Err(MhlError::EmptyManifest { path: source_path.to_string() });
        }
        debug!(manifest = source_path, records = records.len(), skipped = skipped.len(), "manifest built");
        Ok(Manifest { source_path: source_path.to_string(), origin_kind, format_version: None, records, by_key, skipped })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &HashRecord> {
        self.records.iter()
    }

    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    /// Exact lookup by storage key (identifier value, suffixed for duplicates).
    pub fn find(&self, key: &str) -> Option<&HashRecord> {
        self.by_key.get(key).map(|&i| &self.records[i])
    }

    pub(crate) fn record_at(&self, idx: usize) -> &HashRecord {
        &self.records[idx]
    }

    pub(crate) fn record_at_mut(&mut self, idx: usize) -> &mut HashRecord {
        &mut self.records[idx]
    }

    /// First record whose attribute equals `value`.
    pub fn find_by_attribute(&self, attr: RecordAttribute, value: &str) -> Option<&HashRecord> {
        self.position_by_attribute(attr, value).map(|i| &self.records[i])
    }

    pub(crate) fn position_by_attribute(&self, attr: RecordAttribute, value: &str) -> Option<usize> {
        self.records.iter().position(|r| r.text_attribute(attr) == value)
    }

    /// First record that recorded `value` under `algorithm`, whichever
    /// algorithm it is identified by.
    pub fn find_by_other_hash(&self, algorithm: HashAlgorithm, value: &str) -> Option<&HashRecord> {
        self.position_by_other_hash(algorithm, value).map(|i| &self.records[i])
    }

    pub(crate) fn position_by_other_hash(&self, algorithm: HashAlgorithm, value: &str) -> Option<usize> {
        self.records.iter().position(|r| r.recorded_hashes.get(&algorithm).is_some_and(|v| v == value))
    }

    /// Sum of defined sizes. `None` for plain lists, which never carry sizes.
    pub fn total_size(&self) -> Option<u64> {
        match self.origin_kind {
            OriginKind::Plain => None,
            OriginKind::Structured => Some(self.records.iter().filter_map(|r| r.size).sum()),
        }
    }

    /// Records grouped by directory, directories sorted, records in
    /// insertion order within each.
    pub fn by_directory(&self) -> BTreeMap<&str, Vec<&HashRecord>> {
        let mut groups: BTreeMap<&str, Vec<&HashRecord>> = BTreeMap::new();
        for r in &self.records {
            groups.entry(r.directory.as_str()).or_default().push(r);
        }
        groups
    }
}
