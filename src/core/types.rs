//! core::types
//!
//! Strong types for the values that flow between the backend, the replay
//! orchestrator and the session store.
//!
//! # Types
//!
//! - [`Oid`] - 40-hex commit identifier
//! - [`BranchName`] - Validated local branch name
//! - [`Reference`] - A named pointer resolved to a commit
//! - [`Commit`] - Immutable commit value produced by the backend
//! - [`UtcTimestamp`] - RFC3339 timestamp
//!
//! # Examples
//!
//! ```
//! use logicalgit::core::types::{BranchName, Oid};
//!
//! let branch = BranchName::new("feature/my-branch").unwrap();
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! assert_eq!(oid.short(7), "abc123d");
//! assert_eq!(branch.refname(), "refs/heads/feature/my-branch");
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),
}

/// A git commit identifier: 40 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Length of a full SHA-1 object id.
    pub const HEX_LEN: usize = 40;

    /// Length of the abbreviation used in every user-facing message.
    pub const ABBREV_LEN: usize = 7;

    /// Create a new validated object id, normalized to lowercase.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if oid.len() != Self::HEX_LEN {
            return Err(TypeError::InvalidOid(format!(
                "expected {} hex characters, got {}",
                Self::HEX_LEN,
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(format!("'{oid}' is not hexadecimal")));
        }
        Ok(Self(oid))
    }

    /// First `len` characters of the id (the whole id if `len` is larger).
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// The standard 7-character abbreviation.
    pub fn abbrev(&self) -> &str {
        self.short(Self::ABBREV_LEN)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated local branch name (the part after `refs/heads/`).
///
/// Follows the `git check-ref-format --branch` rules that matter for
/// names we read back from disk: no empty components, no leading `.` or
/// `-`, no `.lock` suffix, no `..`, `@{`, control characters or the
/// characters git reserves for revision syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    const RESERVED: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];

    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name).map_err(|reason| {
            TypeError::InvalidBranchName(format!("'{}': {reason}", name.escape_debug()))
        })?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), &'static str> {
        if name.is_empty() {
            return Err("cannot be empty");
        }
        if name == "@" {
            return Err("'@' is reserved");
        }
        if name.starts_with('-') {
            return Err("cannot start with '-'");
        }
        if name.ends_with('/') {
            return Err("cannot end with '/'");
        }
        if name.contains("..") || name.contains("@{") || name.contains("//") {
            return Err("cannot contain '..', '@{' or '//'");
        }
        if name.chars().any(|c| c.is_ascii_control()) {
            return Err("cannot contain control characters");
        }
        if name.contains(Self::RESERVED) {
            return Err("cannot contain revision syntax characters");
        }
        for component in name.split('/') {
            if component.starts_with('.') {
                return Err("path components cannot start with '.'");
            }
            if component.ends_with(".lock") {
                return Err("path components cannot end with '.lock'");
            }
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full ref name, e.g. `refs/heads/main`.
    pub fn refname(&self) -> String {
        format!("refs/heads/{}", self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named pointer resolved to a commit.
///
/// `name` is kept as the user (or the tracking configuration) spelled it:
/// `main`, `origin/main`, or a raw id for detached references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    pub target: Oid,
}

impl Reference {
    pub fn new(name: impl Into<String>, target: Oid) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }

    /// A reference naming a bare commit id.
    pub fn detached(target: Oid) -> Self {
        Self {
            name: target.to_string(),
            target,
        }
    }
}

/// An immutable commit as produced by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: Oid,
    pub parent_ids: Vec<Oid>,
    pub short_message: String,
    pub full_message: String,
}

impl Commit {
    /// Whether this commit has more than one parent.
    pub fn is_merge(&self) -> bool {
        self.parent_ids.len() > 1
    }
}

/// An RFC3339 timestamp in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }

    pub fn as_datetime(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.0
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
