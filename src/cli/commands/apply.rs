//! apply command - Link every ledger entry into place
//!
//! # Pipeline
//!
//! ```text
//! pre-apply scan, create missing symlinks
//! ```
//!
//! The scan validates every entry and reports all offending entries at
//! once; nothing is created unless the whole ledger is applicable. The
//! bulk link step records which links it created so a failure partway can
//! remove exactly those.

use anyhow::Result;

use crate::cli::commands::{run_pipeline, working_dir};
use crate::core::ledger::Ledger;
use crate::core::lock::RepoLock;
use crate::core::paths::RepoPaths;
use crate::engine::{Context, Op, Pipeline};
use crate::ui::output::{self, Verbosity};

/// Apply the ledger: create the symlink for every entry not yet linked.
///
/// Unlike track and release this may run from anywhere inside the
/// repository; the root is discovered by walking ancestors.
pub fn apply(ctx: &Context, dry_run: bool) -> Result<()> {
    let cwd = working_dir(ctx)?;
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);

    let paths = RepoPaths::discover(&cwd)?;
    let ledger = Ledger::new(paths.ledger_path());
    let records = ledger.records()?;
    let count = records.len();

    let _lock = if dry_run {
        None
    } else {
        Some(RepoLock::acquire(&paths)?)
    };

    output::debug(
        format!("applying {} ledger entries", count),
        verbosity,
    );

    let root = paths.root().to_path_buf();
    let pipeline = Pipeline::new(
        vec![
            Op::scan(root.clone(), records.clone()),
            Op::apply_missing(root, records),
        ],
        dry_run,
    );
    run_pipeline(pipeline, "apply")?;

    if !dry_run {
        output::print(
            format!("Applied the ledger ({} entries)", count),
            verbosity,
        );
    }
    Ok(())
}
