//! cli::commands
//!
//! Command handlers.
//!
//! Each handler validates preconditions, builds an ordered operation list,
//! hands it to a [`Pipeline`], and on failure triggers compensation and
//! surfaces the aggregated report.

pub mod apply;
pub mod completion;
pub mod init;
pub mod list;
pub mod release;
pub mod track;

pub use apply::apply;
pub use completion::completion;
pub use init::init;
pub use list::list;
pub use release::release;
pub use track::track;

use std::path::PathBuf;

use anyhow::{anyhow, Context as _, Result};

use crate::cli::args::Command;
use crate::engine::{Context, Pipeline};

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init => init(ctx),
        Command::Track {
            path,
            dest,
            dry_run,
        } => track(ctx, &path, dest.as_deref(), dry_run),
        Command::Release { path, dry_run } => release(ctx, &path, dry_run),
        Command::Apply { dry_run } => apply(ctx, dry_run),
        Command::List { json } => list(ctx, json),
        Command::Completion { shell } => completion(shell),
    }
}

/// Resolve the effective working directory for a command.
pub(crate) fn working_dir(ctx: &Context) -> Result<PathBuf> {
    match &ctx.cwd {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir().context("failed to determine the current directory"),
    }
}

/// Apply a pipeline; on failure revert the applied prefix and surface the
/// aggregated report.
///
/// A fully compensated failure reads as a clean abort; a partial one
/// carries the step-by-step report so manual remediation is possible.
pub(crate) fn run_pipeline(mut pipeline: Pipeline, what: &str) -> Result<()> {
    if let Err(err) = pipeline.apply() {
        let report = pipeline.revert();
        if report.fully_reverted() {
            return Err(anyhow!(
                "{}: {} failed, all changes were reverted",
                err,
                what
            ));
        }
        return Err(anyhow!("{}\n{}", err, report));
    }
    Ok(())
}
