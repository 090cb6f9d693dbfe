use std::path::PathBuf;

use thiserror::Error;

/// Structural problems with inputs. Data mismatches between manifests are
/// never errors; they are reported as outcome categories.
#[derive(Debug, Error)]
pub enum MhlError {
    #[error("could not find these manifest file(s):{}", fmt_paths(.paths))]
    InputNotFound { paths: Vec<PathBuf> },

    #[error("no files were listed in manifest {path} (or it is not formatted correctly)")]
    EmptyManifest { path: String },

    #[error("manifest {path}: entry #{index} has no file path")]
    MissingFilePath { path: String, index: usize },

    #[error("{file}: none of the accepted hash algorithms are present")]
    UnsupportedHashAlgorithm { file: String },

    #[error("field '{field}' has invalid value '{value}': {reason}")]
    InvalidField { field: String, value: String, reason: String },

    #[error("manifest {path}: XML error: {message}")]
    Xml { path: String, message: String },
}

fn fmt_paths(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| format!("\n    {}", p.display())).collect()
}

impl MhlError {
    pub(crate) fn invalid(field: &str, value: &str, reason: impl Into<String>) -> Self {
        MhlError::InvalidField { field: field.to_string(), value: value.to_string(), reason: reason.into() }
    }

    /// True for the malformed-manifest family: the manifest cannot be used.
    pub fn is_malformed_manifest(&self) -> bool {
        matches!(
            self,
            MhlError::EmptyManifest { .. }
                | MhlError::MissingFilePath { .. }
                | MhlError::InvalidField { .. }
                | MhlError::Xml { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MhlError>;
