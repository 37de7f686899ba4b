use std::cell::UnsafeCell;
use std::fmt;
use std::sync::atomic::{self, AtomicU8, Ordering};

use crate::JobResult;
use crate::job::Job;
use crate::pause::pause;
use crate::worker_state::{STATE_FINISHED, STATE_RUNNING, STATE_WAITING, WorkerState};

/// One slot of the launch pool: the mailbox between the control thread and
/// the single worker thread that services this identifier.
///
/// The `state` field is the only synchronization point. The payload fields
/// are plain memory: what makes them safe to access is the acquire/release
/// ordering on the state transitions plus the single-writer discipline below,
/// not field-level atomicity.
///
/// Writer discipline:
///
/// * `Waiting -> Running` and `Finished -> Waiting`: control thread only.
/// * `Running -> Finished`: worker thread only.
/// * `job` is written by the control thread while `Waiting`, consumed by the
///   worker after it observes `Running`.
/// * `result` is written by the worker while `Running`, read by the control
///   thread after it observes `Finished` (and re-read while `Waiting` for
///   idempotent reaps).
///
/// No field is ever written concurrently by two parties.
pub(crate) struct WorkerSlot {
    /// The logical state of the slot; see constants in `worker_state.rs`.
    state: AtomicU8,

    /// The pending job, present exactly while the slot is `Running` and the
    /// worker has not yet taken it.
    ///
    /// We use `UnsafeCell` because we are a synchronization primitive and
    /// do our own synchronization of reads/writes.
    job: UnsafeCell<Option<Job>>,

    /// The outcome of the most recently completed job. Retained across the
    /// `Finished -> Waiting` reset so that reaping an already-idle slot can
    /// return it again.
    result: UnsafeCell<JobResult>,
}

impl WorkerSlot {
    /// A freshly constructed slot: idle, no job, default result of zero.
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(STATE_WAITING),
            job: UnsafeCell::new(None),
            result: UnsafeCell::new(0),
        }
    }

    /// The current state, as a non-mutating snapshot.
    ///
    /// Relaxed suffices: this is either pure diagnostics or the control
    /// thread's idle check, and the control thread is the only party that can
    /// move a slot out of `Waiting`, so its own check cannot go stale.
    pub(crate) fn state(&self) -> WorkerState {
        WorkerState::from_raw(self.state.load(Ordering::Relaxed))
    }

    /// Control side: attempts the `Waiting -> Running` transition, assigning
    /// a job to the slot.
    ///
    /// Returns `false` (and drops the job) if the slot is not idle.
    pub(crate) fn try_assign(&self, job: Job) -> bool {
        if self.state.load(Ordering::Relaxed) != STATE_WAITING {
            return false;
        }

        // SAFETY: The slot is `Waiting` and we are the control thread, the
        // only party that can transition it out of `Waiting`. The worker does
        // not touch `job` until it observes `Running`, so we have exclusive
        // access right now.
        unsafe {
            *self.job.get() = Some(job);
        }

        // Release publishes the fully-formed job record before the state
        // change; pairs with the worker's Acquire load in `pending_job()`.
        self.state.store(STATE_RUNNING, Ordering::Release);

        true
    }

    /// Worker side: checks whether a job has been assigned.
    ///
    /// The Acquire load pairs with the Release store in `try_assign()`, so a
    /// `true` return guarantees the job record is visible.
    pub(crate) fn pending_job(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_RUNNING
    }

    /// Worker side: takes the assigned job out of the slot.
    ///
    /// Only call after `pending_job()` returned `true`.
    pub(crate) fn take_job(&self) -> Job {
        debug_assert_eq!(self.state.load(Ordering::Relaxed), STATE_RUNNING);

        // SAFETY: The slot is `Running`, which grants the worker exclusive
        // access to `job`; the control thread will not touch it again until
        // the slot has gone through `Finished` and back to `Waiting`.
        let job = unsafe { (*self.job.get()).take() };

        job.expect("a Running slot always holds an untaken job")
    }

    /// Worker side: publishes the job's outcome and performs the
    /// `Running -> Finished` transition.
    pub(crate) fn finish(&self, result: JobResult) {
        // SAFETY: The slot is `Running`, which grants the worker exclusive
        // access to `result`; the control thread only reads it after
        // observing `Finished`.
        unsafe {
            *self.result.get() = result;
        }

        // Release publishes the result (and any side effects the job
        // performed) before the state change; pairs with the Acquire fence
        // in `wait()`.
        self.state.store(STATE_FINISHED, Ordering::Release);
    }

    /// Control side: marks the slot `Running` for an inline execution on the
    /// control thread itself.
    ///
    /// The executing thread is the same one that will publish and reap the
    /// result, so no ordering is required on this transition.
    pub(crate) fn begin_inline(&self) {
        debug_assert_eq!(self.state.load(Ordering::Relaxed), STATE_WAITING);

        self.state.store(STATE_RUNNING, Ordering::Relaxed);
    }

    /// Control side: blocks until the slot's job completes, then reaps it.
    ///
    /// Performs the `Finished -> Waiting` transition and returns the
    /// published result. If the slot is already `Waiting` (the job never ran,
    /// or was already reaped) this returns the retained result immediately;
    /// reaping is idempotent.
    pub(crate) fn wait(&self) -> JobResult {
        // Already idle - nothing to synchronize with. Only the control thread
        // (us) writes `result` outside of a dispatched job's lifetime, so a
        // plain read is fine.
        if self.state.load(Ordering::Relaxed) == STATE_WAITING {
            // SAFETY: The slot is `Waiting`, so no worker is anywhere near
            // `result`; the control thread has exclusive access.
            return unsafe { *self.result.get() };
        }

        while self.state.load(Ordering::Relaxed) == STATE_RUNNING {
            pause();
        }

        // The loop above can only exit into `Finished` - the only party that
        // could return the slot to `Waiting` is the control thread itself.
        //
        // The store that published `Finished` has Release semantics, so we
        // need an Acquire fence before reading the result or relying on any
        // side effects the job performed.
        atomic::fence(Ordering::Acquire);

        // SAFETY: The slot is `Finished`; the worker published `result` and
        // will not touch the slot again until the next assignment.
        let result = unsafe { *self.result.get() };

        // Reap complete - back to idle. Relaxed suffices: the worker only
        // reacts to the `Running` transition, which `try_assign()` publishes
        // with Release.
        self.state.store(STATE_WAITING, Ordering::Relaxed);

        result
    }
}

// SAFETY: We are a synchronization primitive, so we do our own
// synchronization: the payload cells are only accessed under the
// single-writer state discipline documented on the type.
unsafe impl Sync for WorkerSlot {}

impl fmt::Debug for WorkerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerSlot")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
