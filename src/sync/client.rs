//! Background worker that keeps the judge informed.
//!
//! The `SyncClient` owns a single worker thread fed through a FIFO channel,
//! so requests reach the judge one at a time in the order they were issued.
//! Every pushed snapshot gets a monotonically increasing sequence number; a
//! verdict request names the sequence number it depends on and the worker
//! only asks for a verdict once that exact snapshot has been acknowledged.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::error::SyncError;
use super::judge::{Judge, Verdict};
use crate::model::PuzzleSnapshot;

/// Message sent to the worker thread.
enum WorkerMessage {
    /// Save a snapshot
    Save { seq: u64, snapshot: PuzzleSnapshot },
    /// Judge the snapshot saved under `seq`
    Verdict { seq: u64, generation: u64 },
    /// Shutdown the thread
    Shutdown,
}

/// Outcome reported back by the worker.
#[derive(Debug)]
pub enum SyncEvent {
    /// Snapshot `seq` was acknowledged.
    Saved { seq: u64 },
    /// Snapshot `seq` could not be saved. Not retried.
    SaveFailed { seq: u64, error: SyncError },
    /// Verdict for snapshot `seq`, requested under `generation`.
    Verdict {
        seq: u64,
        generation: u64,
        verdict: Verdict,
    },
    /// The verdict requested under `generation` could not be obtained.
    VerdictFailed { generation: u64, error: SyncError },
}

/// Client side of the save/verdict protocol.
pub struct SyncClient {
    /// Sender for requests to the worker
    request_tx: Sender<WorkerMessage>,
    /// Receiver for outcomes from the worker
    event_rx: Receiver<SyncEvent>,
    /// Handle to the worker (joined on drop)
    thread_handle: Option<JoinHandle<()>>,
    /// Sequence number of the next push
    next_seq: u64,
    /// Sequence number of the most recent push
    last_pushed: Option<u64>,
    /// Requests sent but not yet answered
    in_flight: usize,
}

impl SyncClient {
    /// Spawn the worker thread around a judge.
    pub fn spawn(judge: impl Judge) -> Result<Self, SyncError> {
        let (request_tx, request_rx) = mpsc::channel::<WorkerMessage>();
        let (event_tx, event_rx) = mpsc::channel::<SyncEvent>();

        let thread_handle = thread::Builder::new()
            .name("judge-sync".to_string())
            .spawn(move || {
                log::debug!("Judge sync worker started");
                Self::worker_loop(judge, request_rx, event_tx);
                log::debug!("Judge sync worker exiting");
            })?;

        Ok(Self {
            request_tx,
            event_rx,
            thread_handle: Some(thread_handle),
            next_seq: 1,
            last_pushed: None,
            in_flight: 0,
        })
    }

    /// Worker main loop.
    fn worker_loop(
        mut judge: impl Judge,
        request_rx: Receiver<WorkerMessage>,
        event_tx: Sender<SyncEvent>,
    ) {
        let mut acknowledged: Option<u64> = None;

        while let Ok(message) = request_rx.recv() {
            let event = match message {
                WorkerMessage::Save { seq, snapshot } => match judge.save(&snapshot) {
                    Ok(()) => {
                        acknowledged = Some(seq);
                        SyncEvent::Saved { seq }
                    }
                    Err(error) => SyncEvent::SaveFailed { seq, error },
                },
                WorkerMessage::Verdict { seq, generation } => {
                    if acknowledged != Some(seq) {
                        SyncEvent::VerdictFailed {
                            generation,
                            error: SyncError::Unacknowledged { seq },
                        }
                    } else {
                        match judge.verdict() {
                            Ok(verdict) => SyncEvent::Verdict {
                                seq,
                                generation,
                                verdict,
                            },
                            Err(error) => SyncEvent::VerdictFailed { generation, error },
                        }
                    }
                }
                WorkerMessage::Shutdown => break,
            };

            if event_tx.send(event).is_err() {
                log::warn!("Sync event channel closed, worker exiting");
                break;
            }
        }
    }

    fn send(&mut self, message: WorkerMessage) -> bool {
        if self.request_tx.send(message).is_err() {
            log::error!("Sync worker is gone, request dropped");
            return false;
        }
        self.in_flight += 1;
        true
    }

    /// Queue a fire-and-forget save. Returns the snapshot's sequence number.
    pub fn push(&mut self, snapshot: PuzzleSnapshot) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.last_pushed = Some(seq);
        log::debug!("Pushing snapshot #{} ({} path nodes)", seq, snapshot.nodes.len());
        self.send(WorkerMessage::Save { seq, snapshot });
        seq
    }

    /// Queue a verdict request for the most recently pushed snapshot.
    ///
    /// Returns the sequence number the verdict depends on.
    pub fn request_verdict(&mut self, generation: u64) -> Result<u64, SyncError> {
        let seq = self.last_pushed.ok_or(SyncError::NoSnapshot)?;
        log::debug!("Requesting verdict for snapshot #{} (generation {})", seq, generation);
        if self.send(WorkerMessage::Verdict { seq, generation }) {
            Ok(seq)
        } else {
            Err(SyncError::Disconnected)
        }
    }

    fn received(&mut self, event: SyncEvent) -> SyncEvent {
        self.in_flight = self.in_flight.saturating_sub(1);
        event
    }

    /// Next finished request, without blocking.
    pub fn try_next_event(&mut self) -> Option<SyncEvent> {
        match self.event_rx.try_recv() {
            Ok(event) => Some(self.received(event)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.in_flight = 0;
                None
            }
        }
    }

    /// Next finished request, waiting up to `timeout`.
    pub fn wait_next_event(&mut self, timeout: Duration) -> Option<SyncEvent> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Some(self.received(event)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.in_flight = 0;
                None
            }
        }
    }

    /// Requests sent but not yet answered.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Sequence number of the most recent push.
    pub fn last_pushed(&self) -> Option<u64> {
        self.last_pushed
    }
}

impl Drop for SyncClient {
    fn drop(&mut self) {
        let _ = self.request_tx.send(WorkerMessage::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::error!("Judge sync worker panicked");
            }
        }
    }
}
