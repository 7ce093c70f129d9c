//! engine::pipeline
//!
//! The reversible operation pipeline.
//!
//! # Architecture
//!
//! A pipeline executes an ordered list of [`Op`]s strictly in order. The
//! individual OS primitives (rename, symlink create/remove, file rewrite)
//! are each atomic, but a multi-step transition composed of several of
//! them is not; the pipeline supplies best-effort application-level
//! transactionality through explicit compensation:
//!
//! - [`Pipeline::apply`] halts at the first failing step and leaves the
//!   already-applied prefix in place
//! - [`Pipeline::revert`] - invoked explicitly by the caller - compensates
//!   that prefix in reverse order and records the outcome of every step
//!
//! The resulting [`RevertReport`] is an immutable value built from the
//! pipeline's final state. It never claims success for a compensation that
//! was not performed or that itself failed, so a human reading it knows
//! exactly which real-world side effects still need manual correction.
//!
//! # Dry-run
//!
//! In dry-run mode every step is trivially successful and only its diagram
//! is printed; no side effect of any kind occurs.

use std::fmt;

use super::op::{Op, OpError};

/// Name and diagram of one step, captured for reporting.
#[derive(Debug, Clone)]
pub struct StepInfo {
    /// The operation's name.
    pub name: String,
    /// The operation's preview diagram.
    pub diagram: String,
}

impl StepInfo {
    fn of(op: &Op) -> Self {
        Self {
            name: op.name().to_string(),
            diagram: op.diagram(),
        }
    }
}

/// What happened to one step during compensation.
#[derive(Debug, Clone)]
pub enum RevertOutcome {
    /// Compensation succeeded.
    Reverted,
    /// Compensation was attempted and failed; the walk stops here.
    Failed(String),
    /// Compensation was never attempted because an earlier compensation
    /// in the walk already failed.
    Skipped,
}

/// Immutable report of a failed pipeline and its compensation.
///
/// Rendered with the same vocabulary the operations use for previews:
/// the originally failed step as `[FAILED]`, then each walked step as
/// `[REVERTED]` or `[UNREVERTED]` (with the compensation error when one
/// was actually raised).
#[derive(Debug, Clone)]
pub struct RevertReport {
    /// The step whose forward action failed, if a failure was recorded.
    pub failed: Option<StepInfo>,
    /// Outcome per walked step, in walk (reverse) order.
    pub steps: Vec<(StepInfo, RevertOutcome)>,
}

impl RevertReport {
    /// True when every walked step was compensated successfully.
    pub fn fully_reverted(&self) -> bool {
        self.steps
            .iter()
            .all(|(_, outcome)| matches!(outcome, RevertOutcome::Reverted))
    }
}

impl fmt::Display for RevertReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(failed) = &self.failed {
            write!(f, "\n[FAILED]     {}\n             `{}`\n", failed.name, failed.diagram)?;
        }

        for (step, outcome) in &self.steps {
            match outcome {
                RevertOutcome::Reverted => {
                    write!(f, "\n[REVERTED]   {}\n             `{}`\n", step.name, step.diagram)?;
                }
                RevertOutcome::Failed(err) => {
                    write!(
                        f,
                        "\n[UNREVERTED] {}\n             `{}`\n             Error: {}\n",
                        step.name, step.diagram, err
                    )?;
                }
                RevertOutcome::Skipped => {
                    write!(f, "\n[UNREVERTED] {}\n             `{}`\n", step.name, step.diagram)?;
                }
            }
        }

        Ok(())
    }
}

/// An ordered sequence of reversible operations for one command invocation.
#[derive(Debug)]
pub struct Pipeline {
    ops: Vec<Op>,
    dry_run: bool,
    fail_idx: Option<usize>,
}

impl Pipeline {
    /// Create a pipeline over `ops`.
    pub fn new(ops: Vec<Op>, dry_run: bool) -> Self {
        Self {
            ops,
            dry_run,
            fail_idx: None,
        }
    }

    /// Index of the first failed step, if `apply` failed.
    pub fn failed_index(&self) -> Option<usize> {
        self.fail_idx
    }

    /// Execute every operation strictly in order.
    ///
    /// The first failure halts execution immediately, records the failing
    /// index, and returns the error; all prior steps remain applied until
    /// the caller decides to [`Pipeline::revert`]. In dry-run mode each
    /// step only prints its diagram.
    pub fn apply(&mut self) -> Result<(), OpError> {
        for (i, op) in self.ops.iter_mut().enumerate() {
            if self.dry_run {
                println!("{}", op.diagram());
                continue;
            }

            if let Err(e) = op.apply() {
                self.fail_idx = Some(i);
                return Err(e);
            }
        }

        Ok(())
    }

    /// Compensate the applied prefix of a failed `apply`, in reverse order.
    ///
    /// Walks the steps strictly preceding the recorded failure index. The
    /// walk stops at the first compensation failure; steps it never
    /// reached are recorded as skipped. The originally failed step is
    /// never compensated - its forward action did not complete.
    ///
    /// Calling this on a pipeline whose `apply` did not fail compensates
    /// nothing and returns an empty report.
    pub fn revert(&mut self) -> RevertReport {
        let fail_idx = match self.fail_idx {
            Some(i) => i,
            None => {
                return RevertReport {
                    failed: None,
                    steps: Vec::new(),
                }
            }
        };

        let failed = StepInfo::of(&self.ops[fail_idx]);
        let mut steps = Vec::with_capacity(fail_idx);
        let mut halted = false;

        for i in (0..fail_idx).rev() {
            let info = StepInfo::of(&self.ops[i]);

            if halted {
                steps.push((info, RevertOutcome::Skipped));
                continue;
            }

            match self.ops[i].revert() {
                Ok(()) => steps.push((info, RevertOutcome::Reverted)),
                Err(e) => {
                    halted = true;
                    steps.push((info, RevertOutcome::Failed(e.to_string())));
                }
            }
        }

        RevertReport {
            failed: Some(failed),
            steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn all_steps_succeed() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        fs::write(&a, "data").unwrap();

        let mut pipeline = Pipeline::new(
            vec![
                Op::move_path(a.clone(), b.clone()),
                Op::link(a.clone(), b.clone()),
            ],
            false,
        );

        pipeline.apply().unwrap();
        assert_eq!(pipeline.failed_index(), None);
        assert_eq!(fs::read_link(&a).unwrap(), b);
    }

    #[test]
    fn dry_run_performs_no_mutation() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        fs::write(&a, "data").unwrap();

        let mut pipeline = Pipeline::new(
            vec![
                Op::move_path(a.clone(), b.clone()),
                Op::link(a.clone(), b.clone()),
            ],
            true,
        );

        pipeline.apply().unwrap();
        assert!(a.exists());
        assert!(!b.exists());
    }

    #[test]
    fn dry_run_succeeds_even_when_steps_would_fail() {
        let temp = TempDir::new().unwrap();
        let mut pipeline = Pipeline::new(
            vec![Op::move_path(
                temp.path().join("missing"),
                temp.path().join("to"),
            )],
            true,
        );

        assert!(pipeline.apply().is_ok());
    }

    #[test]
    fn failure_halts_and_records_index() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let moved = temp.path().join("moved");
        fs::write(&a, "data").unwrap();

        // Step 1 fails: the link site is occupied by a regular file.
        let occupied = temp.path().join("occupied");
        fs::write(&occupied, "in the way").unwrap();

        let mut pipeline = Pipeline::new(
            vec![
                Op::move_path(a.clone(), moved.clone()),
                Op::link(occupied.clone(), moved.clone()),
                // Never runs.
                Op::move_path(temp.path().join("x"), temp.path().join("y")),
            ],
            false,
        );

        assert!(pipeline.apply().is_err());
        assert_eq!(pipeline.failed_index(), Some(1));
        // Step 0 applied and not compensated yet.
        assert!(moved.exists());
        assert!(!a.exists());
    }

    #[test]
    fn revert_compensates_prefix_in_reverse_order() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let moved = temp.path().join("moved");
        fs::write(&a, "data").unwrap();

        let occupied = temp.path().join("occupied");
        fs::write(&occupied, "in the way").unwrap();

        let mut pipeline = Pipeline::new(
            vec![
                Op::move_path(a.clone(), moved.clone()),
                Op::link(occupied.clone(), moved.clone()),
                Op::move_path(temp.path().join("x"), temp.path().join("y")),
            ],
            false,
        );

        assert!(pipeline.apply().is_err());
        let report = pipeline.revert();

        // The move was compensated.
        assert!(a.exists());
        assert!(!moved.exists());

        // Exactly one walked step, reverted; the never-run step is absent.
        assert!(report.fully_reverted());
        assert_eq!(report.steps.len(), 1);
        assert!(matches!(report.steps[0].1, RevertOutcome::Reverted));
        assert_eq!(
            report.failed.as_ref().map(|s| s.name.as_str()),
            Some("Symlink the depot copy to the original location")
        );
    }

    #[test]
    fn compensation_failure_stops_the_walk_and_skips_the_rest() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let a_moved = temp.path().join("a_moved");
        let b = temp.path().join("b");
        let b_moved = temp.path().join("b_moved");
        fs::write(&a, "aa").unwrap();
        fs::write(&b, "bb").unwrap();

        let occupied = temp.path().join("occupied");
        fs::write(&occupied, "in the way").unwrap();

        let mut pipeline = Pipeline::new(
            vec![
                Op::move_path(a.clone(), a_moved.clone()),
                Op::move_path(b.clone(), b_moved.clone()),
                Op::link(occupied.clone(), b_moved.clone()),
            ],
            false,
        );

        assert!(pipeline.apply().is_err());

        // Sabotage step 1's compensation: its moved file disappears.
        fs::remove_file(&b_moved).unwrap();

        let report = pipeline.revert();
        assert!(!report.fully_reverted());
        assert_eq!(report.steps.len(), 2);

        // Walk order is reverse: step 1 first (failed), then step 0 (skipped).
        assert!(matches!(report.steps[0].1, RevertOutcome::Failed(_)));
        assert!(matches!(report.steps[1].1, RevertOutcome::Skipped));

        // Step 0's side effect is still in place - and the report says so.
        assert!(a_moved.exists());

        let rendered = report.to_string();
        assert!(rendered.contains("[FAILED]"));
        assert!(rendered.contains("[UNREVERTED]"));
        assert!(rendered.contains("Error:"));
    }

    #[test]
    fn revert_without_failure_is_empty() {
        let mut pipeline = Pipeline::new(vec![], false);
        pipeline.apply().unwrap();

        let report = pipeline.revert();
        assert!(report.failed.is_none());
        assert!(report.steps.is_empty());
        assert!(report.fully_reverted());
    }

    #[test]
    fn failure_at_first_step_walks_nothing() {
        let temp = TempDir::new().unwrap();
        let mut pipeline = Pipeline::new(
            vec![
                Op::move_path(temp.path().join("missing"), temp.path().join("to")),
                Op::move_path(temp.path().join("x"), temp.path().join("y")),
            ],
            false,
        );

        assert!(pipeline.apply().is_err());
        let report = pipeline.revert();
        assert!(report.failed.is_some());
        assert!(report.steps.is_empty());
    }
}
