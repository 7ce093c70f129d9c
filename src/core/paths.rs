//! core::paths
//!
//! Centralized path routing and repository discovery.
//!
//! # Architecture
//!
//! A depot repository is any directory containing a ledger file. All storage
//! locations are routed through [`RepoPaths`] so no other module computes
//! file names on its own:
//!
//! - `.depot` - the ledger (one entry per line, see [`crate::core::ledger`])
//! - `.depot.toml` - optional repository configuration
//! - `.depot.lock` - advisory lock held while a pipeline executes
//!
//! Discovery walks ancestor directories from a starting point until it finds
//! a ledger file; the directory holding it is the repository root.
//!
//! # Example
//!
//! ```
//! use depot::core::paths::RepoPaths;
//! use std::path::PathBuf;
//!
//! let paths = RepoPaths::new(PathBuf::from("/home/me/dotfiles"));
//! assert_eq!(
//!     paths.ledger_path(),
//!     PathBuf::from("/home/me/dotfiles/.depot")
//! );
//! ```

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// File name of the ledger at the repository root.
pub const LEDGER_FILE: &str = ".depot";

/// File name of the optional repository configuration.
pub const CONFIG_FILE: &str = ".depot.toml";

/// File name of the advisory repository lock.
pub const LOCK_FILE: &str = ".depot.lock";

/// Errors from repository discovery.
#[derive(Debug, Error)]
pub enum RepoError {
    /// No ancestor directory contains a ledger file.
    #[error("not inside a depot repository")]
    NotRepository,

    /// The directory already contains a ledger file.
    #[error("current directory is already a depot repository")]
    AlreadyRepository,

    /// An ancestor directory already contains a ledger file.
    #[error("cannot create a depot repository inside another depot repository")]
    NestedRepository,

    /// I/O error during discovery.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Centralized path routing for one depot repository.
///
/// # Invariants
///
/// - All repository-scoped storage is derived from `root`
/// - No code outside this module should compute `*.join(".depot")` paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPaths {
    /// The repository root (the directory containing the ledger file).
    root: PathBuf,
}

impl RepoPaths {
    /// Create a new RepoPaths rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Get the repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the path to the ledger file.
    ///
    /// This is `<root>/.depot`.
    pub fn ledger_path(&self) -> PathBuf {
        self.root.join(LEDGER_FILE)
    }

    /// Get the path to the repository configuration file.
    ///
    /// This is `<root>/.depot.toml`.
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Get the path to the repository lock file.
    ///
    /// This is `<root>/.depot.lock`.
    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    /// Find the nearest ancestor of `start` (inclusive) that is a
    /// repository root.
    ///
    /// # Errors
    ///
    /// [`RepoError::NotRepository`] if no ancestor contains a ledger file.
    pub fn discover(start: &Path) -> Result<Self, RepoError> {
        let mut dir = start;
        loop {
            if Self::is_root(dir) {
                return Ok(Self::new(dir.to_path_buf()));
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => return Err(RepoError::NotRepository),
            }
        }
    }

    /// Check whether `dir` is itself a repository root.
    pub fn is_root(dir: &Path) -> bool {
        match fs::symlink_metadata(dir.join(LEDGER_FILE)) {
            Ok(meta) => meta.is_file(),
            Err(_) => false,
        }
    }
}

/// Make `path` absolute against `base` and normalize it lexically.
///
/// `.` components are dropped and `..` components pop their parent. No
/// symlinks are resolved; the result reflects what the user named, not
/// where it points.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Find the deepest path among `path` and its ancestors that is itself a
/// symbolic link.
///
/// Returns `Ok(Some(path))` for the path itself when it is a link, the
/// offending ancestor otherwise, and `Ok(None)` when the whole chain is
/// link-free. Components that do not exist are skipped rather than treated
/// as errors.
pub fn symlink_ancestor(path: &Path) -> io::Result<Option<PathBuf>> {
    let mut current = Some(path);
    while let Some(candidate) = current {
        match fs::symlink_metadata(candidate) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Ok(Some(candidate.to_path_buf()));
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        current = candidate.parent();
    }
    Ok(None)
}
