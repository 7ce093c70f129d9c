//! Depot - relocate paths into a central directory and symlink them back
//!
//! Depot tracks files (dotfiles, configs, anything) by moving them into a
//! repository directory, replacing the original with a symbolic link, and
//! recording the pair in a flat-file ledger so the relocation can later be
//! reversed or replayed on a fresh machine.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Reversible operation pipeline: apply forward actions in
//!   order, compensate the applied prefix on failure
//! - [`core`] - Ledger, path routing, repo discovery, config, and locking
//! - [`ui`] - User-facing output utilities
//!
//! # Correctness Invariants
//!
//! Depot maintains the following invariants:
//!
//! 1. Every mutating operation is paired with its exact compensation
//! 2. A failed command either reverts cleanly or reports, step by step,
//!    exactly which side effects still need manual correction
//! 3. Dry-run traverses the same operation sequence with zero mutations
//! 4. Ledger rewrites are atomic (write-to-temp, then rename)

pub mod cli;
pub mod core;
pub mod engine;
pub mod ui;
