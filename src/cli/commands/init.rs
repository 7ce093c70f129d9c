//! init command - Initialize a new depot repository
//!
//! Creates an empty ledger file in the current directory. The ledger file
//! is what makes a directory a repository root, so nested repositories are
//! refused here, before anything is written.

use std::fs;

use anyhow::{Context as _, Result};

use crate::cli::commands::working_dir;
use crate::core::paths::{RepoError, RepoPaths};
use crate::engine::Context;
use crate::ui::output::{self, Verbosity};

/// Initialize a new depot repository in the working directory.
///
/// # Errors
///
/// - [`RepoError::AlreadyRepository`] if the directory already has a ledger
/// - [`RepoError::NestedRepository`] if any ancestor directory has one
pub fn init(ctx: &Context) -> Result<()> {
    let cwd = working_dir(ctx)?;
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);

    if RepoPaths::is_root(&cwd) {
        return Err(RepoError::AlreadyRepository.into());
    }
    if RepoPaths::discover(&cwd).is_ok() {
        return Err(RepoError::NestedRepository.into());
    }

    let paths = RepoPaths::new(cwd);
    fs::write(paths.ledger_path(), "").with_context(|| {
        format!(
            "failed to create the ledger in {}",
            paths.root().display()
        )
    })?;

    output::print(
        format!("Initialized empty depot in {}", paths.root().display()),
        verbosity,
    );
    Ok(())
}
