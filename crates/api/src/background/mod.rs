//! Background tasks and scheduled jobs.
//!
//! Each submodule provides a long-running async function intended to be
//! spawned via `tokio::spawn`. All tasks accept a [`CancellationToken`]
//! for graceful shutdown. [`scheduler::ReminderScheduler`] owns the
//! lifecycle of all three.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod due_sweep;
pub mod replenish;
pub mod retention;
pub mod scheduler;
