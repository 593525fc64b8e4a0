//! Tenant Identifiers
//!
//! A `TenantId` can only be constructed from a string that matches
//! `^[a-z0-9_]+$` and fits in a PostgreSQL identifier. It is the only value
//! the platform ever places in a schema-name position, and
//! [`TenantId::quoted_identifier`] is the only quoting primitive for it.

use crate::error::TenantIdError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reserved tenant id for the platform itself and for unmatched hosts.
pub const PUBLIC_TENANT: &str = "public";

/// PostgreSQL truncates identifiers beyond this many bytes.
pub const MAX_TENANT_ID_LEN: usize = 63;

static TENANT_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_]+$").expect("Invalid tenant id regex"));

/// Validated tenant identifier (one tenant = one database schema).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Validate a candidate against the safe-identifier pattern.
    pub fn parse(candidate: &str) -> Result<Self, TenantIdError> {
        if candidate.is_empty() {
            return Err(TenantIdError::Empty);
        }
        if candidate.len() > MAX_TENANT_ID_LEN {
            return Err(TenantIdError::TooLong {
                len: candidate.len(),
                max: MAX_TENANT_ID_LEN,
            });
        }
        if !TENANT_ID_PATTERN.is_match(candidate) {
            return Err(TenantIdError::InvalidCharacters);
        }
        Ok(Self(candidate.to_string()))
    }

    /// The reserved `public` tenant.
    pub fn public() -> Self {
        Self(PUBLIC_TENANT.to_string())
    }

    /// Validate a candidate, falling back to `public` when it is unsafe.
    ///
    /// The second element is `true` when the fallback was taken.
    pub fn parse_or_public(candidate: &str) -> (Self, bool) {
        match Self::parse(candidate) {
            Ok(id) => (id, false),
            Err(_) => (Self::public(), true),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_public(&self) -> bool {
        self.0 == PUBLIC_TENANT
    }

    /// Double-quoted SQL identifier for this tenant's schema.
    ///
    /// Embedded quotes are doubled even though the pattern already excludes
    /// them, so the output is a valid identifier for any stored value.
    pub fn quoted_identifier(&self) -> String {
        format!("\"{}\"", self.0.replace('"', "\"\""))
    }

    /// Value for the `search_path` setting: the tenant schema, then `public`.
    pub fn search_path(&self) -> String {
        if self.is_public() {
            self.quoted_identifier()
        } else {
            format!("{}, public", self.quoted_identifier())
        }
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for TenantId {
    type Err = TenantIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for TenantId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
