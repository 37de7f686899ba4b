//! End-to-end launch protocol scenarios with live worker threads: broadcast
//! semantics, the all-or-nothing busy precondition, reap idempotence and
//! cross-thread result visibility.

use std::cell::UnsafeCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use new_zealand::nz;
use remote_launch::{JobDispatcher, WorkerState, spawn_workers};
use testing::{eventually, with_watchdog};

#[test]
fn broadcast_with_control_participation() {
    with_watchdog(|| {
        // Four slots, control identifier 3, job returns id * 10.
        let (dispatcher, workers) = JobDispatcher::new(nz!(4), 3);
        let threads = spawn_workers(workers);

        dispatcher
            .launch_all(|id| i32::try_from(id).unwrap() * 10, true)
            .expect("freshly constructed pool is idle");

        dispatcher.wait_all();

        assert_eq!(dispatcher.wait(0), 0);
        assert_eq!(dispatcher.wait(1), 10);
        assert_eq!(dispatcher.wait(2), 20);

        // The control share ran inline during launch_all; its result is
        // already parked in the control slot and this does not block.
        assert_eq!(dispatcher.state(3), WorkerState::Finished);
        assert_eq!(dispatcher.wait(3), 30);

        drop(dispatcher);
        for thread in threads {
            thread.join().unwrap();
        }
    });
}

#[test]
fn broadcast_executes_each_worker_exactly_once() {
    with_watchdog(|| {
        let (dispatcher, workers) = JobDispatcher::new(nz!(5), 0);
        let threads = spawn_workers(workers);

        let executions = Arc::new(AtomicUsize::new(0));

        dispatcher
            .launch_all(
                {
                    let executions = Arc::clone(&executions);
                    move |_| {
                        executions.fetch_add(1, Ordering::Relaxed);
                        0
                    }
                },
                false,
            )
            .expect("freshly constructed pool is idle");

        dispatcher.wait_all();

        // Four workers, control not participating: exactly four executions.
        assert_eq!(executions.load(Ordering::Relaxed), 4);

        drop(dispatcher);
        for thread in threads {
            thread.join().unwrap();
        }
    });
}

#[test]
fn broadcast_against_busy_worker_dispatches_nothing() {
    with_watchdog(|| {
        // Two workers (identifiers 0 and 1), control identifier 2.
        let (dispatcher, workers) = JobDispatcher::new(nz!(3), 2);
        let threads = spawn_workers(workers);

        // Occupy worker 0 with a job that does not finish until released.
        let release = Arc::new(AtomicBool::new(false));
        dispatcher
            .launch_on(0, {
                let release = Arc::clone(&release);
                move |_| {
                    while !release.load(Ordering::Relaxed) {
                        std::hint::spin_loop();
                    }
                    0
                }
            })
            .expect("freshly constructed pool is idle");

        // If an assertion below fails, the gate must still open or the
        // worker would spin forever and the watchdog would fire on join.
        let _open_gate = scopeguard::guard(Arc::clone(&release), |release| {
            release.store(true, Ordering::Relaxed);
        });

        eventually(
            || dispatcher.state(0) == WorkerState::Running,
            "worker 0 picks up the gated job",
        );

        let busy = dispatcher
            .launch_all(|_| 1, true)
            .expect_err("worker 0 is occupied, so the broadcast must be rejected");
        assert_eq!(busy.worker, 0);

        // Nothing was dispatched anywhere: worker 1 is untouched and the
        // control slot saw no inline execution.
        assert_eq!(dispatcher.state(1), WorkerState::Waiting);
        assert_eq!(dispatcher.state(2), WorkerState::Waiting);

        release.store(true, Ordering::Relaxed);
        dispatcher.wait_all();

        drop(dispatcher);
        for thread in threads {
            thread.join().unwrap();
        }
    });
}

#[test]
fn reaping_twice_returns_the_same_result_without_blocking() {
    with_watchdog(|| {
        let (dispatcher, workers) = JobDispatcher::new(nz!(2), 1);
        let threads = spawn_workers(workers);

        dispatcher
            .launch_on(0, |_| 77)
            .expect("freshly constructed pool is idle");

        assert_eq!(dispatcher.wait(0), 77);

        // The slot is already Waiting; the second reap is an immediate
        // re-read of the retained result.
        assert_eq!(dispatcher.state(0), WorkerState::Waiting);
        assert_eq!(dispatcher.wait(0), 77);

        drop(dispatcher);
        for thread in threads {
            thread.join().unwrap();
        }
    });
}

/// A plain (non-atomic) memory location a job writes to, proving that
/// observing `Finished` via `wait()` also makes the job's side effects
/// visible. The release/acquire pairing on the slot state is the only thing
/// synchronizing this cell.
struct SideEffect(UnsafeCell<u64>);

// SAFETY: Access is synchronized externally by the slot state machine:
// the job writes before the worker publishes Finished, the test reads
// after reaping.
unsafe impl Sync for SideEffect {}

#[test]
fn job_side_effects_are_visible_after_reaping() {
    with_watchdog(|| {
        let (dispatcher, workers) = JobDispatcher::new(nz!(2), 1);
        let threads = spawn_workers(workers);

        let side_effect = Arc::new(SideEffect(UnsafeCell::new(0)));

        dispatcher
            .launch_on(0, {
                let side_effect = Arc::clone(&side_effect);
                move |_| {
                    // SAFETY: The job runs strictly before the worker
                    // publishes Finished; nobody reads until after reaping.
                    unsafe {
                        *side_effect.0.get() = 0xFEED;
                    }
                    0
                }
            })
            .expect("freshly constructed pool is idle");

        assert_eq!(dispatcher.wait(0), 0);

        // SAFETY: The reap above observed Finished with acquire ordering,
        // which happens-after the job's write.
        let observed = unsafe { *side_effect.0.get() };
        assert_eq!(observed, 0xFEED);

        drop(dispatcher);
        for thread in threads {
            thread.join().unwrap();
        }
    });
}

#[test]
fn pool_is_reusable_across_launches() {
    with_watchdog(|| {
        let (dispatcher, workers) = JobDispatcher::new(nz!(3), 0);
        let threads = spawn_workers(workers);

        for round in 0..10 {
            dispatcher
                .launch_all(move |id| i32::try_from(id).unwrap() + round, false)
                .expect("previous round was fully reaped");

            assert_eq!(dispatcher.wait(1), 1 + round);
            assert_eq!(dispatcher.wait(2), 2 + round);
        }

        drop(dispatcher);
        for thread in threads {
            thread.join().unwrap();
        }
    });
}
