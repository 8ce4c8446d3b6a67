//! Deterministic label identifiers.
//!
//! An identifier is a constant prefix followed by the 1-based sequence index, zero-padded to a
//! fixed width. It depends on nothing but the index and the format, so re-running with the same
//! configuration yields the same identifiers.
use serde::{Deserialize, Serialize};

use crate::Error;

pub const DEFAULT_PREFIX: &str = "b";
pub const DEFAULT_WIDTH: usize = 6;

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IdFormat {
    pub prefix: String,
    /// Number of digits, indices are zero-padded to this many.
    pub width: usize,
}

impl Default for IdFormat {
    fn default() -> Self {
        IdFormat {
            prefix: DEFAULT_PREFIX.to_string(),
            width: DEFAULT_WIDTH,
        }
    }
}

impl IdFormat {
    /// The largest index that still fits into `width` digits.
    pub fn capacity(&self) -> u64 {
        u32::try_from(self.width)
            .ok()
            .and_then(|w| 10u64.checked_pow(w))
            .map_or(u64::MAX, |n| n - 1)
    }

    pub fn format(&self, index: u64) -> String {
        format!("{}{:0>width$}", self.prefix, index, width = self.width)
    }

    /// Identifiers for indices `1..=count`.
    pub fn generate(&self, count: u64) -> Result<Vec<String>, Error> {
        self.generate_from(1, count)
    }

    /// Identifiers for indices `start..start + count`, in ascending order.
    pub fn generate_from(&self, start: u64, count: u64) -> Result<Vec<String>, Error> {
        if self.width == 0 {
            return Err(Error::invalid("identifier width must be at least one digit"));
        }

        if count == 0 {
            return Err(Error::invalid("identifier count must be positive"));
        }

        if start == 0 {
            return Err(Error::invalid("identifier indices start at 1"));
        }

        let last = start
            .checked_add(count - 1)
            .filter(|last| *last <= self.capacity())
            .ok_or_else(|| {
                Error::invalid(format!(
                    "{count} identifiers from index {start} do not fit into {} digits",
                    self.width
                ))
            })?;

        Ok((start..=last).map(|i| self.format(i)).collect())
    }
}

/// Identifiers `b000001..` in the default format.
pub fn generate_ids(count: u64) -> Result<Vec<String>, Error> {
    IdFormat::default().generate(count)
}
