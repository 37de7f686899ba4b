//! The relax primitive used inside busy-wait loops.
//!
//! Every blocking operation in this crate waits by polling an atomic in a
//! tight loop. Between polls we emit the processor's spin-wait hint (PAUSE on
//! x86, YIELD on ARM), which reduces contention on the polled cache line and
//! power draw without surrendering the thread to the OS scheduler. Wake
//! latency stays in the nanosecond range, which is the entire point of the
//! protocol - a condition variable here would reintroduce the kernel-mediated
//! wakeups this design exists to avoid.

use std::hint;

/// Emits the processor's spin-wait hint.
///
/// Call this in the body of any loop that polls for a state transition made
/// by another thread.
#[inline]
pub(crate) fn pause() {
    hint::spin_loop();
}
