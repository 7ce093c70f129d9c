//! list command - Display tracked entries
//!
//! Read-only: prints every tracked pair in ledger order. Entries whose
//! symlink is currently in place are marked with an asterisk.

use std::fs;

use anyhow::Result;

use crate::cli::commands::working_dir;
use crate::core::ledger::Ledger;
use crate::core::paths::RepoPaths;
use crate::engine::Context;
use crate::ui::output::{self, Verbosity};

/// List tracked entries, optionally as JSON.
pub fn list(ctx: &Context, json: bool) -> Result<()> {
    let cwd = working_dir(ctx)?;
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);

    let paths = RepoPaths::discover(&cwd)?;
    let records = Ledger::new(paths.ledger_path()).records()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    for record in &records {
        let dest = paths.root().join(&record.symlink);
        let linked = matches!(fs::read_link(&record.target), Ok(existing) if existing == dest);
        let marker = if linked { "*" } else { " " };
        output::print(
            format!("{} {} => {}", marker, record.symlink, record.target),
            verbosity,
        );
    }
    Ok(())
}
