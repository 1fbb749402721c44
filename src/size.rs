// ============================================================================
// File: src/size.rs
// ----------------------------------------------------------------------------
// Size resolution for the --ramdisk option.
//
// Turns `N`, `NM` or `NG` into a megabyte count and carries the requested
// capacity from option parsing to the later hooks.
// ============================================================================

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{RamdiskError, RamdiskResult};
use crate::host::OptionParser;

const MB_PER_GB: u64 = 1024;

/// A capacity in megabytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Megabytes(u64);

impl Megabytes {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Megabytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}M", self.0)
    }
}

/// Capacity requested for this plugin instance
///
/// Zero means the job step did not ask for a RAM disk. A successful parse
/// never yields zero, so the two cases cannot be confused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestedCapacity(u64);

impl RequestedCapacity {
    pub const NOT_REQUESTED: Self = Self(0);

    /// Rebuild from a raw megabyte count, zero meaning not requested
    pub const fn from_raw(megabytes: u64) -> Self {
        Self(megabytes)
    }

    pub const fn as_raw(self) -> u64 {
        self.0
    }

    pub const fn is_requested(self) -> bool {
        self.0 != 0
    }

    pub fn megabytes(self) -> Option<Megabytes> {
        self.is_requested().then_some(Megabytes(self.0))
    }
}

impl From<Megabytes> for RequestedCapacity {
    fn from(size: Megabytes) -> Self {
        Self(size.get())
    }
}

/// Parse a `--ramdisk` argument of the form `<integer>[M|G]`
///
/// No unit or `M` keeps the value as megabytes; `G` multiplies by 1024.
/// Anything else, including a zero result, is rejected.
pub fn parse_size(raw: &str) -> RamdiskResult<Megabytes> {
    let digits_end = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(digits_end);

    if digits.is_empty() {
        return Err(RamdiskError::invalid_argument(raw, "expected a leading integer"));
    }
    let value: u64 = digits
        .parse()
        .map_err(|_| RamdiskError::invalid_argument(raw, "size is out of range"))?;

    let megabytes = match unit {
        "" | "M" => {
            debug!("ramdisk: size in M or unspecified (default to M)");
            value
        }
        "G" => {
            debug!("ramdisk: converting size to megabytes");
            value
                .checked_mul(MB_PER_GB)
                .ok_or_else(|| RamdiskError::invalid_argument(raw, "size is out of range"))?
        }
        _ => return Err(RamdiskError::invalid_argument(raw, "unit must be M or G")),
    };

    if megabytes == 0 {
        return Err(RamdiskError::invalid_argument(
            raw,
            "a zero-size RAM disk is not permitted",
        ));
    }

    debug!("ramdisk: ramdisk size is {}M", megabytes);
    Ok(Megabytes(megabytes))
}

/// The `--ramdisk` option callback
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeResolver;

impl OptionParser for SizeResolver {
    fn parse(&self, raw: &str) -> RamdiskResult<Megabytes> {
        parse_size(raw)
    }
}
