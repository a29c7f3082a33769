//! Secret version type.
//!
//! KV2 versions are ordinals, KV1 secrets have none, and dynamic secrets
//! use their lease expiry timestamp. All three travel as strings on the
//! wire; this type keeps them apart in code.

use std::fmt;

use chrono::{DateTime, TimeZone};

use crate::core::constants;

/// The version of a secret as reported to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Version {
    /// KV1 sentinel, rendered as `"0"`
    Unversioned,
    /// KV2 version number
    Ordinal(u64),
    /// Anything else, e.g. a lease expiry timestamp
    Opaque(String),
}

impl Version {
    /// Interpret a wire version string.
    ///
    /// Nonnegative integers become ordinals; everything else is opaque.
    pub fn parse(s: &str) -> Self {
        match s.parse::<u64>() {
            Ok(n) => Self::Ordinal(n),
            Err(_) => Self::Opaque(s.to_string()),
        }
    }

    /// Version of a dynamic secret that expires at `expiry`.
    pub fn expiry<Tz: TimeZone>(expiry: DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self::Opaque(expiry.format(constants::EXPIRY_VERSION_FORMAT).to_string())
    }

    /// The ordinal, if this is a KV2 version.
    pub fn ordinal(&self) -> Option<u64> {
        match self {
            Self::Ordinal(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unversioned => f.write_str(constants::UNVERSIONED),
            Self::Ordinal(n) => write!(f, "{}", n),
            Self::Opaque(s) => f.write_str(s),
        }
    }
}
