use std::num::NonZero;
use std::sync::Arc;

use negative_impl::negative_impl;

use crate::job::run_job;
use crate::table::SlotTable;
use crate::worker::Worker;
use crate::{Busy, JobResult, WorkerId, WorkerState};

/// The control thread's handle to a launch pool.
///
/// Dispatches jobs to worker slots, reaps their results and answers state
/// queries. Constructed together with the pool's [`Worker`] handles via
/// [`JobDispatcher::new()`].
///
/// The dispatcher is `Send` but deliberately `!Sync`: the slot protocol
/// requires a single control-side writer, so concurrent launch or reap calls
/// from multiple threads are ruled out by the type system instead of by
/// documentation.
///
/// Dropping the dispatcher shuts the pool down: each worker finishes whatever
/// job it may be executing and then exits its polling loop, allowing the
/// backing threads to be joined. A result still unreaped at that point is
/// discarded - with the dispatcher gone, nobody could ever reap it.
///
/// # Example
///
/// ```
/// use new_zealand::nz;
/// use remote_launch::{JobDispatcher, spawn_workers};
///
/// let (dispatcher, workers) = JobDispatcher::new(nz!(2), 1);
/// let threads = spawn_workers(workers);
///
/// dispatcher
///     .launch_on(0, |_| 42)
///     .expect("pool is freshly constructed, so the slot is idle");
///
/// assert_eq!(dispatcher.wait(0), 42);
///
/// drop(dispatcher);
///
/// for thread in threads {
///     thread.join().unwrap();
/// }
/// ```
#[derive(Debug)]
pub struct JobDispatcher {
    table: Arc<SlotTable>,
}

impl JobDispatcher {
    /// Creates a pool of `slot_count` slots and returns the dispatcher
    /// together with one [`Worker`] handle per non-control slot, in ascending
    /// identifier order.
    ///
    /// The slot named by `control_id` is reserved for the control thread's
    /// own inline share of broadcast launches; no `Worker` is produced for
    /// it. Each `Worker` must be given to exactly one thread (typically
    /// pinned to its own processor) before jobs are launched at it - that
    /// pairing is what the rest of the protocol relies on.
    ///
    /// # Panics
    ///
    /// Panics if `control_id` does not name one of the slots.
    #[must_use]
    pub fn new(slot_count: NonZero<u32>, control_id: WorkerId) -> (Self, Vec<Worker>) {
        let table = Arc::new(SlotTable::new(slot_count, control_id));

        let workers = table
            .worker_ids()
            .map(|id| Worker::new(Arc::clone(&table), id))
            .collect();

        (Self { table }, workers)
    }

    /// The identifier reserved for the control thread.
    #[must_use]
    pub fn control_id(&self) -> WorkerId {
        self.table.control_id()
    }

    /// Every non-control worker identifier, in ascending order.
    pub fn worker_ids(&self) -> impl Iterator<Item = WorkerId> + '_ {
        self.table.worker_ids()
    }

    /// Launches a job on a single worker slot.
    ///
    /// On success the slot transitions `Waiting -> Running` and the worker
    /// thread backing it picks the job up via its polling loop. Returns
    /// [`Busy`] without mutating anything if the slot is not idle.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not name a slot in this pool, or names the
    /// control slot - the control thread's share of work is only ever
    /// executed inline via [`launch_all()`][Self::launch_all].
    pub fn launch_on<F>(&self, id: WorkerId, job: F) -> Result<(), Busy>
    where
        F: FnOnce(WorkerId) -> JobResult + Send + 'static,
    {
        assert_ne!(
            id,
            self.table.control_id(),
            "cannot launch on the control slot - no worker thread polls it"
        );

        if self.table.slot(id).try_assign(Box::new(job)) {
            Ok(())
        } else {
            Err(Busy { worker: id })
        }
    }

    /// Launches one job on every worker slot, optionally also executing it
    /// inline on the control thread.
    ///
    /// The launch is all-or-nothing: every non-control slot is verified idle
    /// before anything is dispatched, and a [`Busy`] return means no slot
    /// received a job. The check cannot go stale because only this thread
    /// can move a slot out of `Waiting`.
    ///
    /// The job closure is cloned once per addressed slot; each clone receives
    /// the identifier of the slot executing it. With `include_control` set,
    /// the control thread runs its own clone synchronously before this call
    /// returns and records the outcome in the control slot, where an
    /// (immediate, non-blocking) [`wait()`][Self::wait] can retrieve it.
    pub fn launch_all<F>(&self, job: F, include_control: bool) -> Result<(), Busy>
    where
        F: Fn(WorkerId) -> JobResult + Clone + Send + 'static,
    {
        for id in self.table.worker_ids() {
            if self.table.slot(id).state() != WorkerState::Waiting {
                return Err(Busy { worker: id });
            }
        }

        for id in self.table.worker_ids() {
            let assigned = self.table.slot(id).try_assign(Box::new(job.clone()));
            debug_assert!(assigned, "slot was verified idle above");
        }

        if include_control {
            let control_id = self.table.control_id();
            let slot = self.table.slot(control_id);

            // The control slot cannot be "busy" with itself, but a prior
            // inline result that was never reaped may still be parked here.
            // Discard it so the transitions below stay legal.
            if slot.state() == WorkerState::Finished {
                _ = slot.wait();
            }

            slot.begin_inline();
            slot.finish(run_job(Box::new(job), control_id));
        }

        Ok(())
    }

    /// Blocks until the addressed slot's job completes, then reaps and
    /// returns its result.
    ///
    /// Blocking is a busy-wait with the processor's spin hint - there is no
    /// OS-level sleep and no timeout. A caller that needs a deadline should
    /// poll [`state()`][Self::state] instead.
    ///
    /// Reaping is idempotent: a slot that is already idle (its job was
    /// already reaped, or none was ever dispatched) yields its retained
    /// result immediately. A freshly constructed slot yields zero.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not name a slot in this pool.
    pub fn wait(&self, id: WorkerId) -> JobResult {
        self.table.slot(id).wait()
    }

    /// Blocks until no worker is mid-job: a rendezvous barrier.
    ///
    /// Equivalent to [`wait()`][Self::wait] on every worker identifier in
    /// ascending order with the results discarded. The control slot is not
    /// addressed - the control thread cannot be waiting on itself.
    pub fn wait_all(&self) {
        for id in self.table.worker_ids() {
            _ = self.table.slot(id).wait();
        }
    }

    /// The current state of the addressed slot.
    ///
    /// Never blocks and never mutates; this is the only observer-side
    /// operation, suitable for diagnostics and deadline-bounded polling.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not name a slot in this pool.
    #[must_use]
    pub fn state(&self, id: WorkerId) -> WorkerState {
        self.table.slot(id).state()
    }
}

impl Drop for JobDispatcher {
    fn drop(&mut self) {
        // Deliberately does not block: a worker whose thread has vanished
        // leaves its slot permanently Running, and teardown must not inherit
        // that hang. Live workers drain their current job and exit.
        self.table.begin_shutdown();
    }
}

// The slot protocol requires a single control-side writer.
#[negative_impl]
impl !Sync for JobDispatcher {}

#[cfg(test)]
mod tests {
    use new_zealand::nz;
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;
    use crate::JOB_PANICKED;

    assert_impl_all!(JobDispatcher: Send);
    assert_not_impl_any!(JobDispatcher: Sync);

    // Most tests here run the pool without any worker threads: an assigned
    // slot then simply stays Running, which is exactly what the busy-path
    // tests need. End-to-end behavior with live workers is covered in
    // `worker.rs` and the integration tests.

    #[test]
    fn launch_on_idle_slot_succeeds() {
        let (dispatcher, _workers) = JobDispatcher::new(nz!(2), 1);

        assert_eq!(dispatcher.launch_on(0, |_| 5), Ok(()));
        assert_eq!(dispatcher.state(0), WorkerState::Running);
    }

    #[test]
    fn launch_on_busy_slot_is_rejected() {
        let (dispatcher, _workers) = JobDispatcher::new(nz!(2), 1);

        assert_eq!(dispatcher.launch_on(0, |_| 5), Ok(()));
        assert_eq!(dispatcher.launch_on(0, |_| 6), Err(Busy { worker: 0 }));
    }

    #[test]
    #[should_panic]
    fn launch_on_control_slot_is_a_caller_bug() {
        let (dispatcher, _workers) = JobDispatcher::new(nz!(2), 1);

        _ = dispatcher.launch_on(1, |_| 5);
    }

    #[test]
    fn launch_all_with_busy_worker_dispatches_nothing() {
        let (dispatcher, _workers) = JobDispatcher::new(nz!(3), 2);

        assert_eq!(dispatcher.launch_on(0, |_| 5), Ok(()));

        assert_eq!(
            dispatcher.launch_all(|_| 6, false),
            Err(Busy { worker: 0 })
        );

        // The idle worker was left untouched.
        assert_eq!(dispatcher.state(1), WorkerState::Waiting);
    }

    #[test]
    fn control_participates_inline() {
        // A pool of one slot has no workers at all; a broadcast then only
        // exercises the control thread's inline share.
        let (dispatcher, workers) = JobDispatcher::new(nz!(1), 0);
        assert!(workers.is_empty());

        assert_eq!(
            dispatcher.launch_all(|id| JobResult::try_from(id).unwrap() * 10 + 1, true),
            Ok(())
        );

        // The inline result is parked in the control slot; reaping it never
        // blocks.
        assert_eq!(dispatcher.state(0), WorkerState::Finished);
        assert_eq!(dispatcher.wait(0), 1);
        assert_eq!(dispatcher.state(0), WorkerState::Waiting);
    }

    #[test]
    fn control_does_not_participate_unless_asked() {
        let (dispatcher, _workers) = JobDispatcher::new(nz!(1), 0);

        assert_eq!(dispatcher.launch_all(|_| 9, false), Ok(()));

        assert_eq!(dispatcher.state(0), WorkerState::Waiting);
        assert_eq!(dispatcher.wait(0), 0);
    }

    #[test]
    fn stale_inline_result_is_discarded_by_next_broadcast() {
        let (dispatcher, _workers) = JobDispatcher::new(nz!(1), 0);

        assert_eq!(dispatcher.launch_all(|_| 1, true), Ok(()));

        // Never reaped - the next broadcast replaces it.
        assert_eq!(dispatcher.launch_all(|_| 2, true), Ok(()));

        assert_eq!(dispatcher.wait(0), 2);
    }

    #[test]
    fn panicking_inline_job_is_contained() {
        let (dispatcher, _workers) = JobDispatcher::new(nz!(1), 0);

        assert_eq!(dispatcher.launch_all(|_| panic!("deliberate"), true), Ok(()));

        assert_eq!(dispatcher.wait(0), JOB_PANICKED);
    }

    #[test]
    fn wait_on_never_dispatched_slot_returns_default() {
        let (dispatcher, _workers) = JobDispatcher::new(nz!(2), 1);

        assert_eq!(dispatcher.wait(0), 0);
    }

    #[test]
    fn wait_all_on_idle_pool_returns_immediately() {
        let (dispatcher, _workers) = JobDispatcher::new(nz!(4), 3);

        dispatcher.wait_all();
    }

    #[test]
    fn worker_handles_match_identifier_order() {
        let (dispatcher, workers) = JobDispatcher::new(nz!(4), 1);

        assert_eq!(dispatcher.control_id(), 1);
        assert_eq!(
            workers.iter().map(Worker::id).collect::<Vec<_>>(),
            vec![0, 2, 3]
        );
        assert_eq!(dispatcher.worker_ids().collect::<Vec<_>>(), vec![0, 2, 3]);
    }

    #[test]
    #[should_panic]
    fn unknown_identifier_panics() {
        let (dispatcher, _workers) = JobDispatcher::new(nz!(2), 1);

        _ = dispatcher.state(9);
    }
}
