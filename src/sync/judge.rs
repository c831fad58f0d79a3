//! The remote judge boundary.
//!
//! A judge stores the most recently saved snapshot and returns a boolean
//! verdict about it. How the verdict is computed is the judge's business.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Deserialize;

use super::error::SyncError;
use crate::model::PuzzleSnapshot;

/// The judge's answer for the last saved snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub valid: bool,
    /// Number of regions the judge found, when reported.
    pub region_count: Option<u32>,
}

impl Verdict {
    pub fn new(valid: bool) -> Self {
        Self {
            valid,
            region_count: None,
        }
    }
}

/// Save/verdict endpoint pair.
///
/// Calls are blocking; the [`SyncClient`](super::SyncClient) runs them on its
/// worker thread, strictly in submission order.
pub trait Judge: Send + 'static {
    /// Store a snapshot. `Ok` is the acknowledgment.
    fn save(&mut self, snapshot: &PuzzleSnapshot) -> Result<(), SyncError>;

    /// Judge the most recently stored snapshot.
    fn verdict(&mut self) -> Result<Verdict, SyncError>;
}

// ============================================================================
// HTTP Judge
// ============================================================================

/// Body of `GET /load`.
#[derive(Debug, Deserialize)]
struct LoadResponse {
    valid_solution: bool,
    #[serde(default)]
    region_count: Option<u32>,
}

/// Judge reached over HTTP: `POST {base}/save`, `GET {base}/load`.
pub struct HttpJudge {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpJudge {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(base_url: impl Into<String>) -> Result<Self, SyncError> {
        Self::with_timeout(base_url, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn check_status(
        endpoint: &str,
        response: &reqwest::blocking::Response,
    ) -> Result<(), SyncError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SyncError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

impl Judge for HttpJudge {
    fn save(&mut self, snapshot: &PuzzleSnapshot) -> Result<(), SyncError> {
        let response = self.client.post(self.url("/save")).json(snapshot).send()?;
        Self::check_status("/save", &response)
    }

    fn verdict(&mut self) -> Result<Verdict, SyncError> {
        let response = self.client.get(self.url("/load")).send()?;
        Self::check_status("/load", &response)?;
        let body = response.text()?;
        let load: LoadResponse = serde_json::from_str(&body)?;
        Ok(Verdict {
            valid: load.valid_solution,
            region_count: load.region_count,
        })
    }
}

// ============================================================================
// In-memory Judge
// ============================================================================

/// Verdict rule used by [`MemoryJudge`].
pub type VerdictRule = Box<dyn Fn(&PuzzleSnapshot) -> bool + Send>;

/// Observable state of a [`MemoryJudge`].
pub struct MemoryJudgeState {
    /// Every acknowledged snapshot, oldest first.
    pub saved: Vec<PuzzleSnapshot>,
    /// Number of verdict calls received.
    pub verdict_calls: usize,
    /// Snapshot each verdict was computed from.
    pub judged: Vec<PuzzleSnapshot>,
    /// Fail every save with a transport error.
    pub fail_saves: bool,
    /// Fail every verdict with a transport error.
    pub fail_verdicts: bool,
    /// Artificial latency per save.
    pub save_delay: Duration,
    rule: VerdictRule,
}

/// In-process judge with a pluggable rule. Used offline and in tests.
pub struct MemoryJudge {
    state: Arc<Mutex<MemoryJudgeState>>,
}

/// Shared view into a [`MemoryJudge`] that outlives moving the judge into a
/// sync worker.
#[derive(Clone)]
pub struct MemoryJudgeHandle {
    state: Arc<Mutex<MemoryJudgeState>>,
}

fn lock(state: &Mutex<MemoryJudgeState>) -> MutexGuard<'_, MemoryJudgeState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryJudge {
    pub fn new(rule: impl Fn(&PuzzleSnapshot) -> bool + Send + 'static) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryJudgeState {
                saved: Vec::new(),
                verdict_calls: 0,
                judged: Vec::new(),
                fail_saves: false,
                fail_verdicts: false,
                save_delay: Duration::ZERO,
                rule: Box::new(rule),
            })),
        }
    }

    /// A judge that accepts every path.
    pub fn accepting() -> Self {
        Self::new(|_| true)
    }

    /// A judge that rejects every path.
    pub fn rejecting() -> Self {
        Self::new(|_| false)
    }

    pub fn handle(&self) -> MemoryJudgeHandle {
        MemoryJudgeHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl MemoryJudgeHandle {
    /// Run `f` with the judge state locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut MemoryJudgeState) -> R) -> R {
        f(&mut lock(&self.state))
    }

    pub fn saved_count(&self) -> usize {
        self.with(|s| s.saved.len())
    }

    pub fn verdict_calls(&self) -> usize {
        self.with(|s| s.verdict_calls)
    }

    pub fn last_saved(&self) -> Option<PuzzleSnapshot> {
        self.with(|s| s.saved.last().cloned())
    }

    pub fn last_judged(&self) -> Option<PuzzleSnapshot> {
        self.with(|s| s.judged.last().cloned())
    }
}

impl Judge for MemoryJudge {
    fn save(&mut self, snapshot: &PuzzleSnapshot) -> Result<(), SyncError> {
        let delay = lock(&self.state).save_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let mut state = lock(&self.state);
        if state.fail_saves {
            return Err(SyncError::transport("save endpoint unreachable"));
        }
        state.saved.push(snapshot.clone());
        Ok(())
    }

    fn verdict(&mut self) -> Result<Verdict, SyncError> {
        let mut state = lock(&self.state);
        state.verdict_calls += 1;
        if state.fail_verdicts {
            return Err(SyncError::transport("load endpoint unreachable"));
        }
        let snapshot = state.saved.last().cloned().ok_or(SyncError::NoSnapshot)?;
        let valid = (state.rule)(&snapshot);
        state.judged.push(snapshot);
        Ok(Verdict::new(valid))
    }
}
