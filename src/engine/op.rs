//! engine::op
//!
//! Reversible operations.
//!
//! # Architecture
//!
//! Every unit of work a command performs is an [`Op`]: a fixed, tagged
//! variant holding its own parameters, with a forward action (`apply`), an
//! exact compensating action (`revert`), and a human-readable preview
//! (`diagram`). Commands build ordered lists of ops and hand them to the
//! [`crate::engine::pipeline`]; no command mutates the filesystem or the
//! ledger directly.
//!
//! # Invariants
//!
//! - `revert` undoes exactly what `apply` did, nothing more
//! - `Scan` mutates nothing; its revert is a no-op
//! - `ApplyMissing` records the links it actually created so its revert
//!   removes only those

use std::fmt;
use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::ledger::{Ledger, LedgerError, Record};

/// Errors from applying or reverting an operation.
#[derive(Debug, Error)]
pub enum OpError {
    /// Filesystem call failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Ledger mutation failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The pre-apply scan found entries that cannot be linked.
    #[error("{0}")]
    Preconditions(ScanFailure),

    /// Reverting a bulk link creation could not remove every created link.
    #[error("failed to remove created links:\n{}", .0.join("\n"))]
    Cleanup(Vec<String>),
}

/// Why a ledger entry failed the pre-apply scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanReason {
    /// The relocated content is absent from the repository.
    StoredFileMissing,
    /// The relocated content is itself a symbolic link.
    StoredFileIsSymlink,
    /// Something already occupies the path where the link would go.
    DestinationOccupied,
}

/// One offending ledger entry found by the pre-apply scan.
#[derive(Debug, Clone)]
pub struct ScanProblem {
    /// The entry that cannot be applied.
    pub record: Record,
    /// Why it cannot be applied.
    pub reason: ScanReason,
}

impl fmt::Display for ScanProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n  ", self.record)?;
        match self.reason {
            ScanReason::StoredFileMissing => {
                write!(f, "stored copy \"{}\" does not exist", self.record.symlink)
            }
            ScanReason::StoredFileIsSymlink => {
                write!(f, "stored copy \"{}\" is a symlink", self.record.symlink)
            }
            ScanReason::DestinationOccupied => {
                write!(f, "destination \"{}\" already exists", self.record.target)
            }
        }
    }
}

/// The combined result of a failed pre-apply scan.
///
/// Carries every offending entry, not just the first, so one run reports
/// everything a human needs to fix.
#[derive(Debug, Clone)]
pub struct ScanFailure {
    /// All offending entries with their reasons.
    pub problems: Vec<ScanProblem>,
}

impl fmt::Display for ScanFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "could not apply the ledger:")?;
        for problem in &self.problems {
            write!(f, "\n{}", problem)?;
        }
        Ok(())
    }
}

/// A named, reversible unit of work.
///
/// Each variant holds an immutable parameter set captured at construction
/// time; `ApplyMissing` additionally accumulates the links it created so
/// compensation can target exactly those.
#[derive(Debug)]
pub enum Op {
    /// Rename a path. Compensation renames it back.
    Move {
        /// Current location.
        from: PathBuf,
        /// New location.
        to: PathBuf,
    },

    /// Create a symlink at `link` pointing at `dest`. Compensation removes
    /// the link.
    Link {
        /// Where the link file goes.
        link: PathBuf,
        /// What the link points at.
        dest: PathBuf,
    },

    /// Remove the symlink at `link`. Compensation recreates it pointing at
    /// `dest`.
    Unlink {
        /// The link file to remove.
        link: PathBuf,
        /// What the recreated link must point at.
        dest: PathBuf,
    },

    /// Append a record to the ledger. Compensation removes it.
    DbSave {
        /// Handle to the ledger file.
        ledger: Ledger,
        /// The record to append.
        record: Record,
    },

    /// Remove a record from the ledger. Compensation re-appends it.
    DbRemove {
        /// Handle to the ledger file.
        ledger: Ledger,
        /// The record to remove (and restore on revert).
        record: Record,
    },

    /// Validate that every ledger entry is already correctly linked or
    /// safely linkable. Mutates nothing; compensation is a no-op.
    Scan {
        /// Repository root the symlink fields are relative to.
        root: PathBuf,
        /// All tracked records.
        records: Vec<Record>,
    },

    /// Create the symlink for every entry not yet linked. Compensation
    /// removes only the links this op actually created.
    ApplyMissing {
        /// Repository root the symlink fields are relative to.
        root: PathBuf,
        /// All tracked records.
        records: Vec<Record>,
        /// Links created during apply, in creation order.
        created: Vec<PathBuf>,
    },
}

impl Op {
    /// Move `from` to `to`.
    pub fn move_path(from: PathBuf, to: PathBuf) -> Self {
        Op::Move { from, to }
    }

    /// Create a symlink at `link` pointing at `dest`.
    pub fn link(link: PathBuf, dest: PathBuf) -> Self {
        Op::Link { link, dest }
    }

    /// Remove the symlink at `link`; revert recreates it pointing at `dest`.
    pub fn unlink(link: PathBuf, dest: PathBuf) -> Self {
        Op::Unlink { link, dest }
    }

    /// Append `record` to the ledger.
    pub fn db_save(ledger: Ledger, record: Record) -> Self {
        Op::DbSave { ledger, record }
    }

    /// Remove `record` from the ledger.
    pub fn db_remove(ledger: Ledger, record: Record) -> Self {
        Op::DbRemove { ledger, record }
    }

    /// Pre-apply safety scan over all tracked records.
    pub fn scan(root: PathBuf, records: Vec<Record>) -> Self {
        Op::Scan { root, records }
    }

    /// Bulk re-link of every not-yet-linked record.
    pub fn apply_missing(root: PathBuf, records: Vec<Record>) -> Self {
        Op::ApplyMissing {
            root,
            records,
            created: Vec::new(),
        }
    }

    /// Human-readable name of this operation.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Move { .. } => "Move the path to its new location",
            Op::Link { .. } => "Symlink the depot copy to the original location",
            Op::Unlink { .. } => "Remove the symlink",
            Op::DbSave { .. } => "Save the path pair to the ledger",
            Op::DbRemove { .. } => "Remove the path pair from the ledger",
            Op::Scan { .. } => "Scan the environment to ensure the ledger can be applied",
            Op::ApplyMissing { .. } => "Apply missing ledger entries to the environment",
        }
    }

    /// Shell-flavored preview of this operation's effect.
    ///
    /// Used verbatim in dry-run output and failure reports.
    pub fn diagram(&self) -> String {
        match self {
            Op::Move { from, to } => format!("mv {} {}", from.display(), to.display()),
            Op::Link { link, dest } => format!("ln -s {} {}", dest.display(), link.display()),
            Op::Unlink { link, .. } => format!("rm {}", link.display()),
            Op::DbSave { record, .. } => {
                format!("dpt save {} => {}", record.symlink, record.target)
            }
            Op::DbRemove { record, .. } => {
                format!("dpt delete {} => {}", record.symlink, record.target)
            }
            Op::Scan { root, records } => {
                let checks: Vec<String> = records
                    .iter()
                    .map(|r| {
                        let dest = root.join(&r.symlink);
                        format!(
                            "( -e {} && ! -e {} ) || ( $(readlink {}) == {} )",
                            dest.display(),
                            r.target,
                            r.target,
                            dest.display()
                        )
                    })
                    .collect();
                format!("[[\n    {}\n]]", checks.join("\n    && "))
            }
            Op::ApplyMissing { root, records, .. } => records
                .iter()
                .map(|r| format!("ln -s {} {}", root.join(&r.symlink).display(), r.target))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Perform the forward action.
    pub fn apply(&mut self) -> Result<(), OpError> {
        match self {
            Op::Move { from, to } => {
                fs::rename(&*from, &*to)?;
                Ok(())
            }

            Op::Link { link, dest } => {
                symlink(&*dest, &*link)?;
                Ok(())
            }

            Op::Unlink { link, .. } => {
                fs::remove_file(&*link)?;
                Ok(())
            }

            Op::DbSave { ledger, record } => {
                ledger.store(&record.target, &record.symlink)?;
                Ok(())
            }

            Op::DbRemove { ledger, record } => {
                ledger.remove(&record.symlink)?;
                Ok(())
            }

            Op::Scan { root, records } => {
                let mut problems = Vec::new();

                for record in records.iter() {
                    let dest = root.join(&record.symlink);

                    // Already correctly linked: nothing to check.
                    if let Ok(existing) = fs::read_link(&record.target) {
                        if existing == dest {
                            continue;
                        }
                    }

                    match fs::symlink_metadata(&dest) {
                        Err(e) if e.kind() == io::ErrorKind::NotFound => {
                            problems.push(ScanProblem {
                                record: record.clone(),
                                reason: ScanReason::StoredFileMissing,
                            });
                            continue;
                        }
                        Err(e) => return Err(OpError::Io(e)),
                        Ok(meta) if meta.file_type().is_symlink() => {
                            problems.push(ScanProblem {
                                record: record.clone(),
                                reason: ScanReason::StoredFileIsSymlink,
                            });
                            continue;
                        }
                        Ok(_) => {}
                    }

                    if fs::symlink_metadata(&record.target).is_ok() {
                        problems.push(ScanProblem {
                            record: record.clone(),
                            reason: ScanReason::DestinationOccupied,
                        });
                    }
                }

                if problems.is_empty() {
                    Ok(())
                } else {
                    Err(OpError::Preconditions(ScanFailure { problems }))
                }
            }

            Op::ApplyMissing {
                root,
                records,
                created,
            } => {
                for record in records.iter() {
                    let dest = root.join(&record.symlink);
                    let link = PathBuf::from(&record.target);

                    if let Ok(existing) = fs::read_link(&link) {
                        if existing == dest {
                            continue;
                        }
                    }

                    symlink(&dest, &link)?;
                    created.push(link);
                }
                Ok(())
            }
        }
    }

    /// Perform the compensating action.
    pub fn revert(&mut self) -> Result<(), OpError> {
        match self {
            Op::Move { from, to } => {
                fs::rename(&*to, &*from)?;
                Ok(())
            }

            Op::Link { link, .. } => {
                fs::remove_file(&*link)?;
                Ok(())
            }

            Op::Unlink { link, dest } => {
                symlink(&*dest, &*link)?;
                Ok(())
            }

            Op::DbSave { ledger, record } => {
                ledger.remove(&record.symlink)?;
                Ok(())
            }

            Op::DbRemove { ledger, record } => {
                ledger.store(&record.target, &record.symlink)?;
                Ok(())
            }

            Op::Scan { .. } => Ok(()),

            Op::ApplyMissing { created, .. } => {
                // Remove whatever was created; collect failures instead of
                // stopping at the first so every removable link is removed.
                let mut failures = Vec::new();
                for link in created.iter() {
                    if let Err(e) = fs::remove_file(link) {
                        failures.push(format!("{}: {}", link.display(), e));
                    }
                }

                if failures.is_empty() {
                    Ok(())
                } else {
                    Err(OpError::Cleanup(failures))
                }
            }
        }
    }
}
