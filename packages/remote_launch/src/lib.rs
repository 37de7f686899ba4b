//! Broadcast one job to a fixed pool of pinned worker threads and collect
//! the results - a Single-Program-Multiple-Data remote-launch primitive for
//! userspace dataplane runtimes.
//!
//! A control thread owns a [`JobDispatcher`]; each worker thread owns one
//! [`Worker`] and spends its life polling its own slot. Coordination runs
//! entirely on memory-ordered atomics: no mutexes, no condition variables,
//! no kernel-mediated wakeups. Blocking operations busy-wait with the
//! processor's spin hint, trading a burned core for nanosecond wake latency
//! on latency-critical dataplane cores.
//!
//! Each slot is an independent three-state machine
//! (`Waiting -> Running -> Finished -> Waiting`): the dispatcher assigns a
//! job to an idle slot, the worker picks it up, executes it and publishes an
//! integer result, and the dispatcher reaps the result to return the slot to
//! idle. A broadcast launch is all-or-nothing - if any worker is not idle,
//! nothing is dispatched anywhere.
//!
//! What this crate deliberately does not do: task queues, work stealing,
//! priority scheduling, dynamic pool resizing, job cancellation, timeouts.
//! The pool is fixed at construction and addressed by dense integer
//! identifiers.
//!
//! # Quick start
//!
//! ```rust
//! use new_zealand::nz;
//! use remote_launch::{JobDispatcher, spawn_workers};
//!
//! // Four slots; identifier 3 is reserved for the control thread.
//! let (dispatcher, workers) = JobDispatcher::new(nz!(4), 3);
//! let threads = spawn_workers(workers);
//!
//! // Broadcast one job to every worker, and run a share on the control
//! // thread as well. Each clone of the job learns its own identifier.
//! dispatcher
//!     .launch_all(|id| i32::try_from(id).unwrap() * 10, true)
//!     .expect("a freshly constructed pool is idle");
//!
//! // Rendezvous: no worker is mid-job after this returns.
//! dispatcher.wait_all();
//!
//! // Reap each worker's result.
//! assert_eq!(dispatcher.wait(0), 0);
//! assert_eq!(dispatcher.wait(1), 10);
//! assert_eq!(dispatcher.wait(2), 20);
//!
//! // The control thread's share already ran inline during launch_all(),
//! // so this read completes without blocking.
//! assert_eq!(dispatcher.wait(dispatcher.control_id()), 30);
//!
//! // Dropping the dispatcher shuts the pool down and the threads exit.
//! drop(dispatcher);
//! for thread in threads {
//!     thread.join().unwrap();
//! }
//! ```
//!
//! # Worker thread contract
//!
//! The crate does not pin threads to processors - that is the embedding
//! runtime's job. What it requires is that exactly one live thread runs each
//! [`Worker::run()`] loop before any launch addresses that slot. A worker
//! thread that dies (outside of a job panic, which is contained) leaves its
//! slot permanently `Running`: detectable via
//! [`JobDispatcher::state()`], not recoverable.

mod dispatcher;
mod error;
mod job;
mod pause;
mod primitive_types;
mod slot;
mod table;
mod worker;
mod worker_state;

pub use dispatcher::JobDispatcher;
pub use error::Busy;
pub use job::JOB_PANICKED;
pub use primitive_types::{JobResult, WorkerId};
pub use worker::{Worker, spawn_workers, spawn_workers_with};
pub use worker_state::WorkerState;
