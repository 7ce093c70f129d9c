//! engine
//!
//! Orchestrates the command lifecycle: Validate -> Build -> Apply -> Revert.
//!
//! # Architecture
//!
//! Every mutating command follows a uniform lifecycle:
//!
//! ```text
//! validate preconditions -> build ordered Op list -> Pipeline::apply
//!     -> success: done
//!     -> failure: Pipeline::revert -> surface the RevertReport
//! ```
//!
//! Commands never touch the filesystem or the ledger directly; all
//! mutations flow through [`Op`]s executed by a [`Pipeline`]. No operation
//! is retried automatically - the design prefers a clean, explained abort
//! over risking further filesystem mutation after an unexpected condition.
//!
//! # Invariants
//!
//! - A pipeline is built fresh per command invocation and discarded after
//! - Dry-run failures come only from precondition validation, never from
//!   an attempted mutation
//! - Compensation is explicit: the engine never reverts behind the
//!   caller's back

pub mod op;
pub mod pipeline;

// Re-exports for convenience
pub use op::{Op, OpError, ScanFailure, ScanProblem, ScanReason};
pub use pipeline::{Pipeline, RevertOutcome, RevertReport, StepInfo};

use std::path::PathBuf;

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags that affect command
/// behavior.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
}
