//! The worker slot state machine.
//!
//! The following states exist:
//!
//! 0 - waiting - the slot is idle and eligible to receive a new job; any
//!               result from a prior job has already been consumed (or is
//!               retained for idempotent re-reads, see `WorkerSlot::wait`).
//! 1 - running - a job has been assigned and the worker is executing it,
//!               or is about to.
//! 2 - finished - the worker has completed the job and published its result;
//!                the slot does not become eligible for a new job until the
//!                result is explicitly reaped.
//!
//! The only legal transitions are `waiting -> running` (assignment, control
//! thread), `running -> finished` (completion, worker thread) and
//! `finished -> waiting` (reap, control thread). Each transition has exactly
//! one writer, which is what lets the whole protocol run without locks.

use derive_more::derive::Display;

pub(crate) const STATE_WAITING: u8 = 0;
pub(crate) const STATE_RUNNING: u8 = 1;
pub(crate) const STATE_FINISHED: u8 = 2;

/// The lifecycle state of one worker slot, as observed at a single instant.
///
/// Obtained from [`JobDispatcher::state()`][crate::JobDispatcher::state].
/// A slot only ever advances `Waiting -> Running -> Finished -> Waiting`.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "the slot protocol admits exactly these three states"
)]
pub enum WorkerState {
    /// Idle and eligible to receive a new job.
    Waiting,

    /// A job has been assigned and is being executed.
    Running,

    /// The job completed and its result awaits reaping.
    Finished,
}

impl WorkerState {
    pub(crate) fn from_raw(raw: u8) -> Self {
        match raw {
            STATE_WAITING => Self::Waiting,
            STATE_RUNNING => Self::Running,
            STATE_FINISHED => Self::Finished,
            _ => unreachable!("unreachable worker slot state: {raw}"),
        }
    }
}
