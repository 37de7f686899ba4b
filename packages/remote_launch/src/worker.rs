use std::sync::Arc;
use std::thread;

use crate::WorkerId;
use crate::job::run_job;
use crate::pause::pause;
use crate::table::SlotTable;
use crate::worker_state::WorkerState;

/// One worker's end of the launch pool: the handle whose polling loop
/// services a single slot.
///
/// [`JobDispatcher::new()`][crate::JobDispatcher::new] produces exactly one
/// `Worker` per non-control slot, so the protocol's one-thread-per-slot
/// requirement is structural: give each handle to one thread (pinning it to
/// a processor is the caller's concern) and call [`run()`][Self::run] there.
/// [`spawn_workers()`] does this with plain unpinned threads.
#[derive(Debug)]
pub struct Worker {
    table: Arc<SlotTable>,
    id: WorkerId,
}

impl Worker {
    pub(crate) fn new(table: Arc<SlotTable>, id: WorkerId) -> Self {
        Self { table, id }
    }

    /// The identifier of the slot this worker services.
    #[must_use]
    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Services the slot until the pool shuts down.
    ///
    /// Polls for a pending job with the processor's spin hint, executes it,
    /// publishes the result, and returns to polling. The loop exits only
    /// once the dispatcher has been dropped and the slot is not mid-protocol:
    /// a job in flight is always completed and a dispatched job is never
    /// abandoned.
    ///
    /// A job that panics is contained: the unwind stops here and
    /// [`JOB_PANICKED`][crate::JOB_PANICKED] is published as its result.
    pub fn run(self) {
        let slot = self.table.slot(self.id);

        loop {
            while !slot.pending_job() {
                // Exit is only legal from the idle half of the protocol.
                // A Finished slot at shutdown means nobody will ever reap
                // the result (the dispatcher is gone) - it is discarded.
                if self.table.is_shut_down() && slot.state() != WorkerState::Running {
                    return;
                }

                pause();
            }

            let job = slot.take_job();

            // The slot is ours until we publish Finished; only this call
            // may perform that transition. We never reset to Waiting -
            // doing so would silently drop the result before it is reaped.
            slot.finish(run_job(job, self.id));
        }
    }
}

/// Spawns one OS thread per worker, each running its polling loop, and
/// returns the join handles.
///
/// The threads are named `worker-{id}` and are not pinned to processors;
/// a caller that wants pinning should use [`spawn_workers_with()`] or spawn
/// its own threads around [`Worker::run()`].
///
/// The handles become joinable once the pool's dispatcher is dropped.
///
/// # Panics
///
/// Panics if the operating system refuses to spawn a thread.
#[must_use]
pub fn spawn_workers<I>(workers: I) -> Box<[thread::JoinHandle<()>]>
where
    I: IntoIterator<Item = Worker>,
{
    spawn_workers_with(workers, |_| {})
}

/// Spawns one OS thread per worker, invoking `thread_setup` on each new
/// thread (with the worker's identifier) before its polling loop starts.
///
/// The setup hook is where processor pinning goes: by the time the first
/// job can be observed, the thread is already running on its final
/// processor.
///
/// # Panics
///
/// Panics if the operating system refuses to spawn a thread.
#[must_use]
pub fn spawn_workers_with<I, F>(workers: I, thread_setup: F) -> Box<[thread::JoinHandle<()>]>
where
    I: IntoIterator<Item = Worker>,
    F: Fn(WorkerId) + Send + Clone + 'static,
{
    workers
        .into_iter()
        .map(|worker| {
            let thread_setup = thread_setup.clone();

            thread::Builder::new()
                .name(format!("worker-{}", worker.id()))
                .spawn(move || {
                    thread_setup(worker.id());
                    worker.run();
                })
                .expect("failed to spawn worker thread")
        })
        .collect::<Vec<_>>()
        .into_boxed_slice()
}
