#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for tests and examples in this workspace.
//!
//! Every blocking operation in the `remote_launch` package is an unbounded
//! busy-wait, so a buggy test does not fail - it hangs. The helpers here turn
//! such hangs into prompt, diagnosable panics.

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// How long a single test is allowed to run before we declare it hung.
///
/// Miri executes thread synchronization dramatically slower than real
/// hardware, so it gets a far more generous allowance.
fn watchdog_timeout() -> Duration {
    if cfg!(miri) {
        Duration::from_secs(120)
    } else {
        Duration::from_secs(10)
    }
}

/// Runs a test body on a separate thread and panics if it does not complete
/// within the watchdog timeout.
///
/// Wrap any test that calls a blocking operation (`wait`, `wait_all`, thread
/// joins against worker loops) in this so that a protocol bug surfaces as a
/// failed test rather than a wedged test runner.
///
/// # Panics
///
/// Panics if the test body exceeds the timeout, and re-raises any panic the
/// test body itself produced.
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// let value = with_watchdog(|| 2 + 2);
/// assert_eq!(value, 4);
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    let body = thread::spawn(move || {
        // If the send fails, the watchdog already gave up on us - nothing to do.
        drop(tx.send(test_fn()));
    });

    match rx.recv_timeout(watchdog_timeout()) {
        Ok(result) => {
            body.join().expect("test body completed, so it cannot have panicked");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            // The test body is stuck in a spin wait somewhere. We cannot stop
            // it, only report it.
            panic!("test exceeded the watchdog timeout - a blocking operation never completed");
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match body.join() {
            Ok(()) => panic!("test body disconnected without delivering a result"),
            Err(panic_payload) => std::panic::resume_unwind(panic_payload),
        },
    }
}

/// Polls a condition established by another thread until it becomes true,
/// panicking if it does not within the watchdog timeout.
///
/// This is for asserting on states that are reached asynchronously, e.g.
/// "the worker has observed the job and is now running it".
///
/// # Panics
///
/// Panics with the provided description if the condition does not become
/// true in time.
pub fn eventually(condition: impl Fn() -> bool, description: &str) {
    let deadline = Instant::now() + watchdog_timeout();

    while !condition() {
        assert!(
            Instant::now() < deadline,
            "condition never became true: {description}"
        );

        thread::yield_now();
    }
}
