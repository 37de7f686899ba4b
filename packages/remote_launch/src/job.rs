//! The unit of work dispatched to worker slots.

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::{JobResult, WorkerId};

/// A single-use unit of work assigned to one slot for one launch.
///
/// The closure receives the identifier of the slot executing it, which is how
/// a broadcast job differentiates its per-worker share. Any other input the
/// job needs travels as captured state.
pub(crate) type Job = Box<dyn FnOnce(WorkerId) -> JobResult + Send>;

/// The result published for a job that panicked instead of returning.
///
/// A faulting job must not take down the process (nor wedge the slot protocol
/// by never publishing a result), so the executing thread catches the unwind
/// and publishes this value in its place.
pub const JOB_PANICKED: JobResult = JobResult::MIN;

/// Executes a job, converting a panic into the [`JOB_PANICKED`] result.
pub(crate) fn run_job(job: Job, id: WorkerId) -> JobResult {
    catch_unwind(AssertUnwindSafe(move || job(id))).unwrap_or(JOB_PANICKED)
}
