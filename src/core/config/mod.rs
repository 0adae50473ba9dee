//! core::config
//!
//! Configuration loading.
//!
//! # Overview
//!
//! lgit has two configuration scopes:
//! - **Global**: User-level settings
//! - **Repo**: Repository-level overrides, shared by all worktrees
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$LGIT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/lgit/config.toml`
//! 3. `~/.lgit/config.toml`
//!
//! # Repo Config Location
//!
//! `<common_dir>/logical/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use logicalgit::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("pull rebases: {}", config.pull_rebase());
//! ```

pub mod schema;

pub use schema::ConfigFile;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::paths::LogicalPaths;

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV: &str = "LGIT_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Merged configuration from all sources.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: ConfigFile,
    pub repo: Option<ConfigFile>,
    global_path: Option<PathBuf>,
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations, plus the repo file when
    /// `paths` is given.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed.
    /// Missing config files are not an error (defaults are used).
    pub fn load(paths: Option<&LogicalPaths>) -> Result<Self, ConfigError> {
        let (global, global_path) = match Self::global_path() {
            Some(path) => (Self::read_file(&path)?, Some(path)),
            None => (ConfigFile::default(), None),
        };

        let (repo, repo_path) = match paths.map(LogicalPaths::repo_config_path) {
            Some(path) if path.exists() => (Some(Self::read_file(&path)?), Some(path)),
            _ => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        tracing::debug!(
            global = ?global_path,
            repo = ?repo_path,
            "loaded configuration"
        );

        Ok(Config {
            global,
            repo,
            global_path,
            repo_path,
        })
    }

    /// First existing global config file, if any.
    fn global_path() -> Option<PathBuf> {
        let candidates = [
            std::env::var_os(CONFIG_ENV).map(PathBuf::from),
            std::env::var_os("XDG_CONFIG_HOME").map(|x| PathBuf::from(x).join("lgit/config.toml")),
            dirs::home_dir().map(|home| home.join(".lgit/config.toml")),
        ];
        candidates.into_iter().flatten().find(|p| p.exists())
    }

    fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn global_path_loaded(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    pub fn repo_path_loaded(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }

    /// Repo value if set, else global value.
    fn pick<T: Clone>(&self, get: impl Fn(&ConfigFile) -> Option<T>) -> Option<T> {
        self.repo.as_ref().and_then(&get).or_else(|| get(&self.global))
    }

    /// Whether `lgit pull` rebases by default. Defaults to merging.
    pub fn pull_rebase(&self) -> bool {
        self.pick(|c| c.pull.as_ref().and_then(|p| p.rebase))
            .unwrap_or(false)
    }

    pub fn show_stack_trace(&self) -> bool {
        self.pick(|c| c.output.as_ref().and_then(|o| o.show_stack_trace))
            .unwrap_or(false)
    }

    pub fn mergetool_tool(&self) -> Option<String> {
        self.pick(|c| c.mergetool.as_ref().and_then(|m| m.tool.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::{MergetoolConfig, OutputConfig, PullConfig};
    use tempfile::TempDir;

    fn file(rebase: Option<bool>, trace: Option<bool>, tool: Option<&str>) -> ConfigFile {
        ConfigFile {
            pull: Some(PullConfig { rebase }),
            output: Some(OutputConfig {
                show_stack_trace: trace,
            }),
            mergetool: Some(MergetoolConfig {
                tool: tool.map(String::from),
            }),
        }
    }

    mod precedence {
        use super::*;

        #[test]
        fn defaults() {
            let config = Config::default();
            assert!(!config.pull_rebase());
            assert!(!config.show_stack_trace());
            assert_eq!(config.mergetool_tool(), None);
        }

        #[test]
        fn global_only() {
            let config = Config {
                global: file(Some(true), Some(true), Some("meld")),
                ..Default::default()
            };
            assert!(config.pull_rebase());
            assert!(config.show_stack_trace());
            assert_eq!(config.mergetool_tool().as_deref(), Some("meld"));
        }

        #[test]
        fn repo_overrides_global_per_key() {
            let config = Config {
                global: file(Some(true), Some(true), Some("meld")),
                repo: Some(file(Some(false), None, None)),
                ..Default::default()
            };
            assert!(!config.pull_rebase());
            assert!(config.show_stack_trace());
            assert_eq!(config.mergetool_tool().as_deref(), Some("meld"));
        }
    }

    mod loading {
        use super::*;

        #[test]
        fn reads_repo_file() {
            let temp = TempDir::new().unwrap();
            let paths = LogicalPaths::new(temp.path().to_path_buf(), temp.path().to_path_buf());
            fs::create_dir_all(paths.worktree_dir()).unwrap();
            fs::write(paths.repo_config_path(), "[pull]\nrebase = true\n").unwrap();

            let config = Config::load(Some(&paths)).unwrap();
            assert!(config.pull_rebase());
            assert_eq!(
                config.repo_path_loaded(),
                Some(paths.repo_config_path().as_path())
            );
        }

        #[test]
        fn unknown_key_is_parse_error() {
            let temp = TempDir::new().unwrap();
            let path = temp.path().join("config.toml");
            fs::write(&path, "[pull]\nautostash = true\n").unwrap();
            assert!(matches!(
                Config::read_file(&path),
                Err(ConfigError::ParseError { .. })
            ));
        }

        #[test]
        fn missing_repo_file_is_fine() {
            let temp = TempDir::new().unwrap();
            let paths = LogicalPaths::new(temp.path().to_path_buf(), temp.path().to_path_buf());
            let config = Config::load(Some(&paths)).unwrap();
            assert!(config.repo.is_none());
        }
    }
}
