//! Reconciliation of two manifests into classified outcomes.
//!
//! 1. Partition: records of both manifests are grouped by identifier value.
//!    Within a group, records are paired with the same file path first, then
//!    in manifest order. Unpaired records form the delta of their side.
//! 2. Common pairs are classified by their attribute differences.
//! 3. Delta records look for a counterpart in the opposite manifest by
//!    another recorded hash, then by file name; otherwise they are MISSING.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::algorithm::HashAlgorithm;
use crate::manifest::Manifest;
use crate::record::{Attribute, HashRecord, Identifier, RecordAttribute};

/// Outcome categories. Every compared unit lands in exactly one.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Same hash, same attributes.
    Perfect,
    /// Same hash; name, directory or dates differ.
    Minor,
    /// Paired by name, but identified by different algorithms.
    HashTypeDifferent,
    /// Same algorithm, different digest.
    HashChanged,
    /// Present in one manifest only.
    Missing,
    /// Surplus copy of a hash that occurs more than once in its manifest.
    Duplicate,
    /// Same hash but different size. Should never happen.
    Impossible,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Perfect,
        Category::Minor,
        Category::HashTypeDifferent,
        Category::HashChanged,
        Category::Missing,
        Category::Duplicate,
        Category::Impossible,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Category::Perfect => "PERFECT",
            Category::Minor => "MINOR",
            Category::HashTypeDifferent => "HASH_TYPE_DIFFERENT",
            Category::HashChanged => "HASH_CHANGED",
            Category::Missing => "MISSING",
            Category::Duplicate => "DUPLICATE",
            Category::Impossible => "IMPOSSIBLE",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::First => "1st",
            Side::Second => "2nd",
        }
    }
}

/// What was compared: a pair found by identifier, or a delta record of one side.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Common,
    Delta(Side),
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchedBy {
    Identifier,
    OtherHash(HashAlgorithm),
    FileName,
    Unmatched,
}

/// Attribute-level difference between two records.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeDiff {
    /// Recorded on both sides with different values.
    pub changed: BTreeSet<Attribute>,
    pub only_in_first: BTreeSet<Attribute>,
    pub only_in_second: BTreeSet<Attribute>,
}

impl AttributeDiff {
    /// Compare names, directories and sizes; dates only when asked to.
    /// An attribute missing on either side never counts as changed.
    pub fn between(first: &HashRecord, second: &HashRecord, include_dates: bool) -> AttributeDiff {
        let mut diff = AttributeDiff::default();
        if first.file_name != second.file_name {
            diff.changed.insert(Attribute::FileName);
        }
        if first.directory != second.directory {
            diff.changed.insert(Attribute::Directory);
        }
        if let (Some(a), Some(b)) = (first.size, second.size) {
            if a != b {
                diff.changed.insert(Attribute::Size);
            }
        }
        let mut optional = vec![Attribute::Size];
        if include_dates {
            for attr in [Attribute::LastModified, Attribute::Created, Attribute::HashedAt] {
                if let (Some(a), Some(b)) = (first.date(attr), second.date(attr)) {
                    if a != b {
                        diff.changed.insert(attr);
                    }
                }
                optional.push(attr);
            }
        }
        for attr in optional {
            match (first.has(attr), second.has(attr)) {
                (true, false) => {
                    diff.only_in_first.insert(attr);
                }
                (false, true) => {
                    diff.only_in_second.insert(attr);
                }
                _ => {}
            }
        }
        diff
    }

    /// PERFECT when nothing changed, IMPOSSIBLE when the size changed under
    /// an equal hash, MINOR otherwise.
    pub fn category(&self) -> Category {
        if self.changed.is_empty() {
            Category::Perfect
        } else if self.changed.contains(&Attribute::Size) {
            Category::Impossible
        } else {
            Category::Minor
        }
    }
}

/// One classified unit with snapshots of the records involved.
#[derive(Serialize, Clone, Debug)]
pub struct Outcome {
    pub category: Category,
    pub unit: Unit,
    pub matched_by: MatchedBy,
    pub first: Option<HashRecord>,
    pub second: Option<HashRecord>,
    pub diff: AttributeDiff,
}

impl Outcome {
    pub fn record(&self, side: Side) -> Option<&HashRecord> {
        match side {
            Side::First => self.first.as_ref(),
            Side::Second => self.second.as_ref(),
        }
    }

    /// The record the outcome is reported under: the delta record, or the
    /// first-side record of a common pair.
    pub fn subject(&self) -> Option<&HashRecord> {
        match self.unit {
            Unit::Delta(side) => self.record(side),
            Unit::Common => self.first.as_ref(),
        }
    }
}

/// Per-category counts.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Tally {
    counts: BTreeMap<Category, usize>,
}

impl Tally {
    pub fn add(&mut self, category: Category) {
        *self.counts.entry(category).or_default() += 1;
    }

    pub fn get(&self, category: Category) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Something was classified, and all of it MISSING.
    pub fn nothing_in_common(&self) -> bool {
        self.total() > 0 && self.total() == self.get(Category::Missing)
    }

    /// Categories in display order, including zero counts.
    pub fn iter(&self) -> impl Iterator<Item = (Category, usize)> + '_ {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct Reconciliation {
    pub outcomes: Vec<Outcome>,
    pub tally: Tally,
}

impl Reconciliation {
    pub fn of(&self, category: Category) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(move |o| o.category == category)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CompareConfig {
    /// Modification, creation and hash dates count toward MINOR.
    pub include_date_differences: bool,
}

/// Record indices produced by the set partition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Partition {
    pub common_pairs: Vec<(usize, usize)>,
    pub only_in_first: Vec<usize>,
    pub only_in_second: Vec<usize>,
}

/// Give both records of a matched pair the identifier they were proven equal
/// under. This is the only mutation made during reconciliation.
pub fn reidentify(this: &mut HashRecord, that: &mut HashRecord, identifier: &Identifier) {
    debug!(
        first = %this.file_path,
        second = %that.file_path,
        from = %this.identifier,
        to = %identifier,
        "re-identified pair"
    );
    this.identifier = identifier.clone();
    that.identifier = identifier.clone();
}

pub struct Reconciler {
    first: Manifest,
    second: Manifest,
    config: CompareConfig,
}

impl Reconciler {
    pub fn new(first: Manifest, second: Manifest, config: CompareConfig) -> Self {
        Self { first, second, config }
    }

    pub fn manifest(&self, side: Side) -> &Manifest {
        match side {
            Side::First => &self.first,
            Side::Second => &self.second,
        }
    }

    pub fn into_manifests(self) -> (Manifest, Manifest) {
        (self.first, self.second)
    }

    /// Pair records by identifier value. Pairing goes through explicit
    /// lookups, never by the enumeration order of two collections.
    pub fn partition(&self) -> Partition {
        let mut second_groups: HashMap<&str, Vec<usize>> = HashMap::new();
        for (j, r) in self.second.records().enumerate() {
            second_groups.entry(r.identifier.value.as_str()).or_default().push(j);
        }

        let mut first_order: Vec<&str> = Vec::new();
        let mut first_groups: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, r) in self.first.records().enumerate() {
            let group = first_groups.entry(r.identifier.value.as_str()).or_default();
            if group.is_empty() {
                first_order.push(r.identifier.value.as_str());
            }
            group.push(i);
        }

        let mut part = Partition::default();
        let mut paired_second = vec![false; self.second.len()];

        for value in first_order {
            let firsts = &first_groups[value];
            let Some(seconds) = second_groups.get(value) else {
                part.only_in_first.extend(firsts);
                continue;
            };
            let mut pending = seconds.clone();
            let mut unpaired = Vec::new();
            for &i in firsts {
                let path = &self.first.record_at(i).file_path;
                match pending.iter().position(|&j| &self.second.record_at(j).file_path == path) {
                    Some(p) => part.common_pairs.push((i, pending.remove(p))),
                    None => unpaired.push(i),
                }
            }
            for i in unpaired {
                if pending.is_empty() {
                    part.only_in_first.push(i);
                } else {
                    part.common_pairs.push((i, pending.remove(0)));
                }
            }
        }
        for &(_, j) in &part.common_pairs {
            paired_second[j] = true;
        }
        part.only_in_second = (0..self.second.len()).filter(|&j| !paired_second[j]).collect();

        let (first, second) = (&self.first, &self.second);
        part.common_pairs.sort_by(|a, b| path_of(first, a.0).cmp(path_of(first, b.0)));
        part.only_in_first.sort_by(|&a, &b| path_of(first, a).cmp(path_of(first, b)));
        part.only_in_second.sort_by(|&a, &b| path_of(second, a).cmp(path_of(second, b)));
        part
    }

    /// Run all steps: partition, common pairs, then the delta of each side.
    pub fn reconcile(&mut self) -> Reconciliation {
        let part = self.partition();
        debug!(
            common = part.common_pairs.len(),
            only_in_first = part.only_in_first.len(),
            only_in_second = part.only_in_second.len(),
            "partitioned"
        );

        let mut outcomes = self.check_common(&part.common_pairs);
        outcomes.extend(self.check_delta(Side::First, &part.only_in_first));
        outcomes.extend(self.check_delta(Side::Second, &part.only_in_second));

        let mut tally = Tally::default();
        for o in &outcomes {
            tally.add(o.category);
        }
        Reconciliation { outcomes, tally }
    }

    /// Classify pairs that share an identifier.
    pub fn check_common(&self, pairs: &[(usize, usize)]) -> Vec<Outcome> {
        pairs
            .iter()
            .map(|&(i, j)| {
                let a = self.first.record_at(i);
                let b = self.second.record_at(j);
                let diff = AttributeDiff::between(a, b, self.config.include_date_differences);
                Outcome {
                    category: diff.category(),
                    unit: Unit::Common,
                    matched_by: MatchedBy::Identifier,
                    first: Some(a.clone()),
                    second: Some(b.clone()),
                    diff,
                }
            })
            .collect()
    }

    /// Classify the records unique to `side`. Each one yields exactly one
    /// outcome, even when its counterpart is in the opposite delta.
    fn check_delta(&mut self, side: Side, delta: &[usize]) -> Vec<Outcome> {
        let mut outcomes = Vec::with_capacity(delta.len());
        for &idx in delta {
            let found = self.find_counterpart(side, idx);
            let outcome = match found {
                Some((j, matched_by)) => {
                    if let MatchedBy::OtherHash(alg) = matched_by {
                        let value = self.manifest(side).record_at(idx).recorded_hashes[&alg].clone();
                        let (this, that) = self.pair_mut(side, idx, j);
                        reidentify(this, that, &Identifier { algorithm: alg, value });
                    }
                    self.classify_matched(side, idx, j, matched_by)
                }
                None => {
                    let rec = self.manifest(side).record_at(idx).clone();
                    let (first, second) = match side {
                        Side::First => (Some(rec), None),
                        Side::Second => (None, Some(rec)),
                    };
                    Outcome {
                        category: Category::Missing,
                        unit: Unit::Delta(side),
                        matched_by: MatchedBy::Unmatched,
                        first,
                        second,
                        diff: AttributeDiff::default(),
                    }
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Search the opposite manifest, first by any other recorded hash, then by
    /// file name. Surplus copies of a duplicated hash also probe the hash they
    /// are identified by.
    fn find_counterpart(&self, side: Side, idx: usize) -> Option<(usize, MatchedBy)> {
        let this_manifest = self.manifest(side);
        let opposite = self.manifest(side.opposite());
        let rec = this_manifest.record_at(idx);
        let surplus = in_duplicate_group(this_manifest, rec);

        for (&alg, value) in &rec.recorded_hashes {
            if alg == rec.identifier.algorithm && !surplus {
                continue;
            }
            if let Some(j) = opposite.position_by_other_hash(alg, value) {
                return Some((j, MatchedBy::OtherHash(alg)));
            }
        }
        opposite.position_by_attribute(RecordAttribute::FileName, &rec.file_name).map(|j| (j, MatchedBy::FileName))
    }

    fn classify_matched(&self, side: Side, idx: usize, j: usize, matched_by: MatchedBy) -> Outcome {
        let this_manifest = self.manifest(side);
        let rec = this_manifest.record_at(idx);
        let other = self.manifest(side.opposite()).record_at(j);
        let (first, second) = match side {
            Side::First => (rec, other),
            Side::Second => (other, rec),
        };
        let diff = AttributeDiff::between(first, second, self.config.include_date_differences);

        let category = if rec.identifier.algorithm != other.identifier.algorithm {
            Category::HashTypeDifferent
        } else if rec.identifier.value != other.identifier.value {
            Category::HashChanged
        } else if in_duplicate_group(this_manifest, rec) {
            Category::Duplicate
        } else {
            diff.category()
        };

        Outcome {
            category,
            unit: Unit::Delta(side),
            matched_by,
            first: Some(first.clone()),
            second: Some(second.clone()),
            diff,
        }
    }

    fn pair_mut(&mut self, side: Side, idx: usize, j: usize) -> (&mut HashRecord, &mut HashRecord) {
        match side {
            Side::First => (self.first.record_at_mut(idx), self.second.record_at_mut(j)),
            Side::Second => (self.second.record_at_mut(idx), self.first.record_at_mut(j)),
        }
    }
}

/// Flagged as a duplicate, or the first holder of an identifier that has
/// duplicates in the same manifest.
fn in_duplicate_group(manifest: &Manifest, rec: &HashRecord) -> bool {
    rec.is_duplicate || manifest.find(&format!("{}_1", rec.storage_key)).is_some()
}

fn path_of(manifest: &Manifest, idx: usize) -> &str {
    &manifest.record_at(idx).file_path
}
