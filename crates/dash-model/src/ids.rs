#![deny(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// Identifier of a row within its category.
///
/// Ids are handed out from a per-category counter that only moves forward, so an
/// id is never reused after its row has been deleted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct RowId(u64);

impl RowId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RowId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ModelError::InvalidRowId(s.to_string()))
    }
}

/// The fixed dashboard taxonomy. Each key owns one independent category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum CategoryKey {
    Acquisition,
    Behavior,
    Conversion,
    Loyalty,
}

impl CategoryKey {
    pub const ALL: [CategoryKey; 4] = [
        CategoryKey::Acquisition,
        CategoryKey::Behavior,
        CategoryKey::Conversion,
        CategoryKey::Loyalty,
    ];

    /// Storage key, as used in persisted and exported JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Acquisition => "ACQUISITION",
            Self::Behavior => "BEHAVIOR",
            Self::Conversion => "CONVERSION",
            Self::Loyalty => "LOYALTY",
        }
    }

    /// Human readable name.
    pub fn label(self) -> &'static str {
        match self {
            Self::Acquisition => "Acquisition",
            Self::Behavior => "Behavior",
            Self::Conversion => "Conversion",
            Self::Loyalty => "Loyalty",
        }
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryKey {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ModelError::UnknownCategory(s.to_string()))
    }
}
