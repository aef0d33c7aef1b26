use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::types::Chunk;

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 4;

/// Requester clearance. Only constructed through validation, so a value in hand is always in `1..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct ClearanceLevel(u8);

impl ClearanceLevel {
    pub fn get(self) -> u8 { self.0 }

    pub fn dominates(self, required: u8) -> bool { self.0 >= required }
}

impl TryFrom<i64> for ClearanceLevel {
    type Error = Error;
    fn try_from(value: i64) -> Result<Self> {
        if (i64::from(MIN_LEVEL)..=i64::from(MAX_LEVEL)).contains(&value) {
            // Range-checked above.
            Ok(Self(value as u8))
        } else {
            Err(Error::InvalidClearance(format!("{} is outside {}..={}", value, MIN_LEVEL, MAX_LEVEL)))
        }
    }
}

impl FromStr for ClearanceLevel {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let value: i64 = s.trim().parse().map_err(|_| Error::InvalidClearance(format!("'{}' is not a number", s)))?;
        Self::try_from(value)
    }
}

impl From<ClearanceLevel> for u8 {
    fn from(level: ClearanceLevel) -> Self { level.0 }
}

impl fmt::Display for ClearanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Keep the chunks visible at `level`, in input order.
pub fn filter(chunks: &[Chunk], level: ClearanceLevel) -> Vec<Chunk> {
    filter_refs(chunks, level).into_iter().cloned().collect()
}

pub fn filter_refs(chunks: &[Chunk], level: ClearanceLevel) -> Vec<&Chunk> {
    chunks.iter().filter(|c| level.dominates(c.security_level)).collect()
}
