//! core::config
//!
//! Repository configuration schema and loading.
//!
//! # Overview
//!
//! Configuration is optional and repo-scoped: a `.depot.toml` file next to
//! the ledger. A missing file yields the defaults; a malformed file is an
//! error rather than a silent fallback.
//!
//! ```toml
//! [track]
//! dir = "files"   # default destination directory for tracked paths
//! ```

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::paths::RepoPaths;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    Parse { path: PathBuf, message: String },
}

/// Repository-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Settings for the track command.
    #[serde(default)]
    pub track: TrackConfig,
}

/// Configuration for the track command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackConfig {
    /// Default directory, relative to the repository root, where tracked
    /// paths are relocated when no explicit destination is given.
    #[serde(default)]
    pub dir: Option<String>,
}

impl RepoConfig {
    /// Load the configuration for a repository.
    ///
    /// A missing config file is not an error; defaults are returned.
    pub fn load(paths: &RepoPaths) -> Result<Self, ConfigError> {
        let path = paths.config_path();

        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Read { path, source: e }),
        };

        toml::from_str(&data).map_err(|e| ConfigError::Parse {
            path,
            message: e.to_string(),
        })
    }
}
