//! Migration names: `<YYYYMMDDHHMMSS>_<slug>`.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

static NAME_PATTERN: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^(\d{14})_([a-z0-9_]+)$"));

/// A parsed migration name.
///
/// Ordering is by timestamp, then by slug, which matches the lexicographic
/// order of the full names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MigrationName {
    timestamp: u64,
    slug: String,
}

impl MigrationName {
    /// Parses `<14-digit timestamp>_<slug>`, where the slug is `[a-z0-9_]+`.
    pub fn parse(name: &str) -> Result<Self> {
        let invalid = || Error::InvalidMigrationName(name.to_string());
        let pattern = NAME_PATTERN.as_ref().map_err(|_| invalid())?;
        let caps = pattern.captures(name).ok_or_else(invalid)?;
        let (Some(timestamp), Some(slug)) = (caps.get(1), caps.get(2)) else {
            return Err(invalid());
        };
        Ok(Self {
            timestamp: timestamp.as_str().parse().map_err(|_| invalid())?,
            slug: slug.as_str().to_string(),
        })
    }

    /// The embedded timestamp as a number (`YYYYMMDDHHMMSS`).
    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The slug after the timestamp.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }
}

impl fmt::Display for MigrationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:014}_{}", self.timestamp, self.slug)
    }
}

impl FromStr for MigrationName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for MigrationName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MigrationName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
