use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MhlError, Result};

/// Hash algorithms a manifest entry may be identified by.
///
/// Declaration order is preference order: when an entry carries several
/// digests, the first one present here becomes its identifier.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Xxhash64be,
    Xxhash64,
    Xxhash,
    Md5,
    Sha1,
}

impl HashAlgorithm {
    pub const PREFERENCE: [HashAlgorithm; 5] = [
        HashAlgorithm::Xxhash64be,
        HashAlgorithm::Xxhash64,
        HashAlgorithm::Xxhash,
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
    ];

    /// Field name used in MHL files.
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Xxhash64be => "xxhash64be",
            HashAlgorithm::Xxhash64 => "xxhash64",
            HashAlgorithm::Xxhash => "xxhash",
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::PREFERENCE.into_iter().find(|a| a.name().eq_ignore_ascii_case(name))
    }

    /// Guess the algorithm of a bare digest from its hex length.
    /// Plain xxhash64 lists print the canonical (big-endian) form.
    pub fn from_digest_len(hex_len: usize) -> Option<Self> {
        match hex_len {
            8 => Some(HashAlgorithm::Xxhash),
            16 => Some(HashAlgorithm::Xxhash64be),
            32 => Some(HashAlgorithm::Md5),
            40 => Some(HashAlgorithm::Sha1),
            _ => None,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = MhlError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| MhlError::invalid("algorithm", s, "not an accepted hash algorithm"))
    }
}

/// Reverse the byte order of a hex digest (little-endian <-> big-endian).
/// Output is lowercase. Applying it twice returns the lowercased input.
pub fn convert_endian(digest: &str) -> Result<String> {
    let mut bytes = hex::decode(digest).map_err(|e| MhlError::invalid("digest", digest, e.to_string()))?;
    bytes.reverse();
    Ok(hex::encode(bytes))
}

/// Lowercase a digest, rejecting anything that is not even-length hex.
pub fn normalize_digest(field: &str, digest: &str) -> Result<String> {
    let d = digest.trim();
    if d.is_empty() || d.len() % 2 != 0 || !d.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(MhlError::invalid(field, digest, "expected an even-length hex digest"));
    }
    Ok(d.to_ascii_lowercase())
}
