//! Synchronization with the remote judge.
//!
//! - [`Judge`]: the save/verdict boundary, with an HTTP and an in-memory implementation
//! - [`SyncClient`]: ordered, sequence-numbered request queue on a worker thread

mod client;
mod error;
mod judge;

pub use client::{SyncClient, SyncEvent};
pub use error::SyncError;
pub use judge::{HttpJudge, Judge, MemoryJudge, MemoryJudgeHandle, MemoryJudgeState, Verdict, VerdictRule};
