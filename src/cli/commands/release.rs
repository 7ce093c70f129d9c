//! release command - Return a tracked path to its original location
//!
//! # Pipeline
//!
//! ```text
//! remove symlink, move dest -> target, drop pair from ledger
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::cli::commands::{run_pipeline, working_dir};
use crate::core::ledger::{Ledger, Record};
use crate::core::lock::RepoLock;
use crate::core::paths::{absolutize, RepoError, RepoPaths};
use crate::engine::{Context, Op, Pipeline};
use crate::ui::output::{self, Verbosity};

/// Release a tracked pair, reverting the relocation.
///
/// `path` may name either side of the pair: the original location or the
/// repository-relative destination.
pub fn release(ctx: &Context, path: &Path, dry_run: bool) -> Result<()> {
    let cwd = working_dir(ctx)?;
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);

    if !RepoPaths::is_root(&cwd) {
        return Err(RepoError::NotRepository.into());
    }
    let paths = RepoPaths::new(cwd.clone());
    let ledger = Ledger::new(paths.ledger_path());

    let record = find_record(&ledger, path, &cwd)?;
    let target = PathBuf::from(&record.target);
    let dest_abs = paths.root().join(&record.symlink);

    let _lock = if dry_run {
        None
    } else {
        Some(RepoLock::acquire(&paths)?)
    };

    output::debug(
        format!("release {} <- {}", target.display(), dest_abs.display()),
        verbosity,
    );

    let pipeline = Pipeline::new(
        vec![
            Op::unlink(target.clone(), dest_abs.clone()),
            Op::move_path(dest_abs.clone(), target.clone()),
            Op::db_remove(ledger, record.clone()),
        ],
        dry_run,
    );
    run_pipeline(pipeline, "release")?;

    if !dry_run {
        output::print(
            format!("Released '{}'", target.display()),
            verbosity,
        );
    }
    Ok(())
}

/// Look up the ledger record named by `path`.
///
/// Tries the argument exactly as given, then its absolutized form, so both
/// `dpt release vimrc` and `dpt release ~/.vimrc` resolve the same pair.
fn find_record(ledger: &Ledger, path: &Path, cwd: &Path) -> Result<Record> {
    let raw = path.display().to_string();
    if let Ok(record) = ledger.find(&raw) {
        return Ok(record);
    }

    let abs = absolutize(path, cwd).display().to_string();
    Ok(ledger.find(&abs)?)
}
