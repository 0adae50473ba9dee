//! compare
//!
//! Decides whether textual conflicts are also logical ones.
//!
//! When a replayed commit conflicts, the orchestrator asks a
//! [`ModelComparator`] about the conflicting paths. A `false` answer means
//! the two sides only disagree textually and the commit is re-applied with
//! its own content winning; `true` pauses the replay for the user.
//!
//! [`TextualComparator`] treats every textual conflict as logical, which
//! makes the replay behave exactly like plain git.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("cannot compare {path}: {reason}")]
    Failed { path: String, reason: String },
}

/// Judges conflicts on the repository's current index and working tree.
pub trait ModelComparator {
    /// Whether any of `paths` (sorted, non-empty) conflicts logically.
    fn is_logically_conflicting(&self, paths: &[String]) -> Result<bool, CompareError>;
}

/// Treats any textual conflict as a logical one.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextualComparator;

impl ModelComparator for TextualComparator {
    fn is_logically_conflicting(&self, paths: &[String]) -> Result<bool, CompareError> {
        Ok(!paths.is_empty())
    }
}
