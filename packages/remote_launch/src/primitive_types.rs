/// Identifies one slot in the launch pool and the thread that services it.
///
/// Identifiers are dense integers `0..slot_count`, assigned at pool
/// construction and stable for the lifetime of the pool. Exactly one of them
/// is reserved for the control thread; every other identifier is backed by
/// one worker thread.
pub type WorkerId = u32;

/// The integer outcome of one executed job.
///
/// The launch protocol attaches no meaning to the value - it is relayed from
/// the job closure to whoever reaps the slot. A job that encounters an
/// internal fault is expected to encode the fault here rather than take down
/// the process.
pub type JobResult = i32;
