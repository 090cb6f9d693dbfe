//! Comparison of Media Hash List manifests.
//!
//! Parse two manifests, build [`Manifest`]s, run a [`Reconciler`] and render
//! the [`Reconciliation`] with a [`Report`].

pub mod algorithm;
pub mod error;
pub mod localize;
pub mod manifest;
pub mod parse;
pub mod reconcile;
pub mod record;
pub mod report;
pub mod size;

pub use algorithm::HashAlgorithm;
pub use error::{MhlError, Result};
pub use manifest::Manifest;
pub use parse::{parse_manifest, OriginKind, RawEntry};
pub use reconcile::{Category, CompareConfig, Outcome, Reconciler, Reconciliation, Side, Tally};
pub use record::{HashRecord, Identifier};
pub use report::{Report, ReportConfig};
pub use size::SizeFormat;
