//! core::config::schema
//!
//! Configuration schema types.
//!
//! Both scopes share one file format; the repo file overrides the global
//! file key by key.
//!
//! # Example
//!
//! ```toml
//! [pull]
//! rebase = true
//!
//! [output]
//! show_stack_trace = false
//!
//! [mergetool]
//! tool = "vimdiff"
//! ```

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// One configuration file, global or repo scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub pull: Option<PullConfig>,
    pub output: Option<OutputConfig>,
    pub mergetool: Option<MergetoolConfig>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(tool) = self.mergetool.as_ref().and_then(|m| m.tool.as_deref()) {
            if tool.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "mergetool.tool cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// `[pull]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PullConfig {
    /// Rebase onto the tracking branch instead of merging it.
    pub rebase: Option<bool>,
}

/// `[output]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Append the cause chain and a backtrace to error output.
    pub show_stack_trace: Option<bool>,
}

/// `[mergetool]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MergetoolConfig {
    /// Passed to `git mergetool --tool`.
    pub tool: Option<String>,
}
