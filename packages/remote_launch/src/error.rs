use thiserror::Error;

use crate::WorkerId;

/// A launch was requested while one or more target slots were not idle.
///
/// Nothing was dispatched: a broadcast launch verifies every addressed slot
/// before assigning anything, so this error never represents partial
/// success. Fully recoverable - reap the outstanding results and retry.
#[derive(Debug, Eq, Error, PartialEq)]
#[error("worker {worker} is not idle")]
#[non_exhaustive]
pub struct Busy {
    /// The first slot found not idle. Diagnostic only; other slots may be
    /// busy as well.
    pub worker: WorkerId,
}
