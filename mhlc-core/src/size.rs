use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::MhlError;

/// Unit family for human-readable sizes.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SizeFormat {
    /// Powers of 1000: kB, MB, GB.
    #[default]
    Decimal,
    /// Powers of 1024: KiB, MiB, GiB.
    Binary,
}

const DECIMAL_UNITS: [&str; 6] = ["kB", "MB", "GB", "TB", "PB", "EB"];
const BINARY_UNITS: [&str; 6] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

impl SizeFormat {
    fn base(self) -> f64 {
        match self {
            SizeFormat::Decimal => 1000.0,
            SizeFormat::Binary => 1024.0,
        }
    }

    fn units(self) -> &'static [&'static str; 6] {
        match self {
            SizeFormat::Decimal => &DECIMAL_UNITS,
            SizeFormat::Binary => &BINARY_UNITS,
        }
    }
}

impl fmt::Display for SizeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SizeFormat::Decimal => "decimal",
            SizeFormat::Binary => "binary",
        })
    }
}

impl FromStr for SizeFormat {
    type Err = MhlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "decimal" | "si" => Ok(SizeFormat::Decimal),
            "binary" | "iec" => Ok(SizeFormat::Binary),
            _ => Err(MhlError::invalid("size format", s, "expected 'decimal' or 'binary'")),
        }
    }
}

/// `"512 bytes"` below one unit, else `"1.2 MB (1234567 bytes)"`.
pub fn format_size(bytes: u64, format: SizeFormat) -> String {
    let base = format.base();
    if (bytes as f64) < base {
        return if bytes == 1 { "1 byte".to_string() } else { format!("{bytes} bytes") };
    }
    let mut value = bytes as f64 / base;
    let mut unit = 0;
    while value >= base && unit + 1 < format.units().len() {
        value /= base;
        unit += 1;
    }
    format!("{:.1} {} ({} bytes)", value, format.units()[unit], bytes)
}
