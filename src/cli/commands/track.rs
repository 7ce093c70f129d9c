//! track command - Relocate a path into the depot and symlink it back
//!
//! # Pipeline
//!
//! ```text
//! move target -> dest, link target -> dest, save pair to ledger
//! ```
//!
//! All preconditions are checked before the pipeline runs, so a dry-run
//! can only fail on validation, never on an attempted mutation.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Result};

use crate::cli::commands::{run_pipeline, working_dir};
use crate::core::config::RepoConfig;
use crate::core::ledger::{Ledger, Record};
use crate::core::lock::RepoLock;
use crate::core::paths::{absolutize, symlink_ancestor, RepoError, RepoPaths};
use crate::engine::{Context, Op, Pipeline};
use crate::ui::output::{self, Verbosity};

/// Start tracking a path.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `path` - The path to relocate
/// * `dest` - Destination inside the repository (defaults to the path's
///   file name under the configured track directory)
/// * `dry_run` - Print the operations instead of running them
pub fn track(ctx: &Context, path: &Path, dest: Option<&Path>, dry_run: bool) -> Result<()> {
    let cwd = working_dir(ctx)?;
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);

    if !RepoPaths::is_root(&cwd) {
        return Err(RepoError::NotRepository.into());
    }
    let paths = RepoPaths::new(cwd.clone());

    let target = absolutize(path, &cwd);
    if fs::symlink_metadata(&target).is_err() {
        bail!("'{}' does not exist", target.display());
    }

    if let Some(ancestor) = symlink_ancestor(&target)? {
        if ancestor == target {
            bail!("cannot track a symlink");
        }
        bail!(
            "cannot track beneath the symlinked ancestor '{}'",
            ancestor.display()
        );
    }

    let dest_abs = match dest {
        Some(d) => absolutize(d, paths.root()),
        None => {
            let config = RepoConfig::load(&paths)?;
            let base = match &config.track.dir {
                Some(dir) => paths.root().join(dir),
                None => paths.root().to_path_buf(),
            };
            let name = target
                .file_name()
                .ok_or_else(|| anyhow!("'{}' has no file name", target.display()))?;
            base.join(name)
        }
    };

    let symlink_rel = dest_abs
        .strip_prefix(paths.root())
        .map_err(|_| {
            anyhow!(
                "destination '{}' is outside the repository",
                dest_abs.display()
            )
        })?
        .to_path_buf();

    if fs::symlink_metadata(&dest_abs).is_ok() {
        bail!(
            "destination '{}' already exists, provide an alternative destination path",
            dest_abs.display()
        );
    }
    if let Some(parent) = dest_abs.parent() {
        if !parent.is_dir() {
            bail!(
                "destination directory '{}' does not exist",
                parent.display()
            );
        }
    }

    let record = Record::new(
        target.display().to_string(),
        symlink_rel.display().to_string(),
    );
    let ledger = Ledger::new(paths.ledger_path());

    // Dry-run must not mutate anything, and acquiring the lock creates a
    // lock file.
    let _lock = if dry_run {
        None
    } else {
        Some(RepoLock::acquire(&paths)?)
    };

    output::debug(
        format!("track {} -> {}", target.display(), dest_abs.display()),
        verbosity,
    );

    let pipeline = Pipeline::new(
        vec![
            Op::move_path(target.clone(), dest_abs.clone()),
            Op::link(target.clone(), dest_abs.clone()),
            Op::db_save(ledger, record),
        ],
        dry_run,
    );
    run_pipeline(pipeline, "track")?;

    if !dry_run {
        output::print(
            format!(
                "Tracked '{}' (stored at '{}')",
                target.display(),
                symlink_rel.display()
            ),
            verbosity,
        );
    }
    Ok(())
}
