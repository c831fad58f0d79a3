//! Editor session: one puzzle instance and everything attached to it.
//!
//! The session routes input to the path machine and the annotation editor,
//! pushes a snapshot to the judge whenever cells or the path change, asks for
//! a verdict when a path is completed, and turns the verdict into a feedback
//! sequence.
//!
//! A generation counter is bumped whenever an attempt starts or is reset.
//! Verdicts and feedback steps carry the generation they were issued under
//! and are ignored once it is stale.

use std::time::Duration;
use web_time::Instant;

use crate::editor::{
    AnnotationEditor, AnnotationPalette, AnnotationPolicy, DrawingPhase, EditMode, PathEffect,
    PathEvent, PathState,
};
use crate::feedback::{FeedbackAnimator, FeedbackStep};
use crate::keybindings::{EditorCommand, KeyBindings};
use crate::model::{Grid, Node, Path, PuzzleSnapshot};
use crate::sync::{SyncClient, SyncEvent, Verdict};


/// Per-session behaviour knobs.
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    pub palette: AnnotationPalette,
    pub policy: AnnotationPolicy,
    pub keybindings: KeyBindings,
    pub feedback_tick: Option<Duration>,
}

/// Raw interaction on the puzzle surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorInput {
    /// Click on a lattice node.
    ClickNode(Node),
    /// Pointer entered a lattice node.
    HoverNode(Node),
    /// Click on a cell.
    ClickCell { row: u32, col: u32 },
    /// Key press.
    Key(char),
}

/// What was last pushed, for change detection.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PushedState {
    grid_revision: u64,
    path: Path,
}

/// A live puzzle instance.
pub struct EditorSession {
    grid: Grid,
    path: PathState,
    annotations: AnnotationEditor,
    keybindings: KeyBindings,
    animator: FeedbackAnimator,
    sync: SyncClient,
    generation: u64,
    /// Generation of the outstanding verdict request.
    pending_verdict: Option<u64>,
    last_pushed: Option<PushedState>,
    last_verdict: Option<Verdict>,
}

impl EditorSession {
    /// Create a session and push its initial snapshot.
    pub fn new(grid: Grid, path: Path, sync: SyncClient, settings: SessionSettings) -> Self {
        let tick = settings
            .feedback_tick
            .unwrap_or(FeedbackAnimator::DEFAULT_TICK);
        let mut session = Self {
            grid,
            path: PathState::with_path(path),
            annotations: AnnotationEditor::new(settings.palette, settings.policy),
            keybindings: settings.keybindings,
            animator: FeedbackAnimator::new(tick),
            sync,
            generation: 0,
            pending_verdict: None,
            last_pushed: None,
            last_verdict: None,
        };
        log::info!(
            "Session started on a {}x{} grid (start {}, finish {})",
            session.grid.width(),
            session.grid.height(),
            session.grid.start(),
            session.grid.finish()
        );
        session.push_if_changed();
        session
    }

    /// Build a session from a snapshot document.
    pub fn from_snapshot(
        snapshot: PuzzleSnapshot,
        sync: SyncClient,
        settings: SessionSettings,
    ) -> Result<Self, crate::model::SnapshotError> {
        let (grid, path) = snapshot.into_parts()?;
        Ok(Self::new(grid, path, sync, settings))
    }

    /// Tear down the session, keeping its sync client for the next puzzle.
    pub fn into_sync(self) -> SyncClient {
        self.sync
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn path_state(&self) -> &PathState {
        &self.path
    }

    pub fn path(&self) -> &Path {
        self.path.path()
    }

    pub fn phase(&self) -> DrawingPhase {
        self.path.phase()
    }

    pub fn mode(&self) -> EditMode {
        self.annotations.mode()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_verdict(&self) -> Option<Verdict> {
        self.last_verdict
    }

    pub fn is_verdict_pending(&self) -> bool {
        self.pending_verdict.is_some()
    }

    pub fn feedback_active(&self) -> bool {
        self.animator.is_active()
    }

    pub fn next_feedback_due(&self) -> Option<Instant> {
        self.animator.next_due()
    }

    pub fn feedback_tick(&self) -> Duration {
        self.animator.tick()
    }

    /// Current externally visible state.
    pub fn snapshot(&self) -> PuzzleSnapshot {
        PuzzleSnapshot::capture(&self.grid, self.path.path())
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Route one raw input event.
    pub fn handle(&mut self, input: EditorInput) {
        match input {
            EditorInput::ClickNode(node) => match self.phase() {
                DrawingPhase::Idle => self.begin_at(node),
                DrawingPhase::Drawing => self.finish_at(node),
                DrawingPhase::AwaitingVerdict => {
                    log::trace!("Click on {} while awaiting verdict ignored", node)
                }
            },
            EditorInput::HoverNode(node) => self.extend_to(node),
            EditorInput::ClickCell { row, col } => {
                self.apply_at(row, col);
            }
            EditorInput::Key(key) => match self.keybindings.command_for_key(key) {
                Some(command) => self.run_command(command),
                None => log::trace!("Unbound key '{}'", key),
            },
        }
    }

    /// Run a command from the command surface.
    pub fn run_command(&mut self, command: EditorCommand) {
        log::debug!("Command: {}", command.description());
        match command {
            EditorCommand::SetMode(mode) => self.set_mode(mode),
            EditorCommand::ClearPath => self.reset(),
            EditorCommand::UndoLast => self.undo_last(),
        }
    }

    pub fn begin_at(&mut self, node: Node) {
        self.dispatch(PathEvent::Begin(node));
    }

    pub fn extend_to(&mut self, node: Node) {
        self.dispatch(PathEvent::Extend(node));
    }

    pub fn finish_at(&mut self, node: Node) {
        self.dispatch(PathEvent::Finish(node));
    }

    pub fn undo_last(&mut self) {
        self.dispatch(PathEvent::Undo);
    }

    pub fn reset(&mut self) {
        self.dispatch(PathEvent::Reset);
    }

    pub fn set_mode(&mut self, mode: EditMode) {
        self.annotations.set_mode(mode);
    }

    /// Apply the current edit mode to a cell. Returns whether it changed.
    pub fn apply_at(&mut self, row: u32, col: u32) -> bool {
        let applied = match self
            .annotations
            .apply_at(&mut self.grid, row, col, self.path.phase())
        {
            Ok(applied) => applied,
            Err(e) => {
                log::warn!("Annotation edit ignored: {}", e);
                false
            }
        };
        if applied {
            self.push_if_changed();
        }
        applied
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    fn bump_generation(&mut self) {
        self.generation += 1;
        self.animator.cancel();
        if self.pending_verdict.take().is_some() {
            log::debug!("Outstanding verdict will be discarded");
        }
    }

    fn dispatch(&mut self, event: PathEvent) {
        let step = self.path.reduce(event, &self.grid);
        self.path = step.state;

        match step.effect {
            Some(PathEffect::Started | PathEffect::Cleared | PathEffect::Aborted) => {
                self.bump_generation();
                self.push_if_changed();
            }
            Some(PathEffect::RequestVerdict) => {
                // the terminal snapshot must be queued before the verdict
                self.push_if_changed();
                self.request_verdict();
            }
            None => self.push_if_changed(),
        }
    }

    fn request_verdict(&mut self) {
        match self.sync.request_verdict(self.generation) {
            Ok(seq) => {
                log::debug!("Verdict requested for snapshot #{}", seq);
                self.pending_verdict = Some(self.generation);
            }
            Err(e) => {
                log::error!("Could not request verdict: {}", e);
                self.dispatch(PathEvent::Reset);
            }
        }
    }

    fn push_if_changed(&mut self) {
        let current = PushedState {
            grid_revision: self.grid.revision(),
            path: self.path.path().clone(),
        };
        if self.last_pushed.as_ref() == Some(&current) {
            return;
        }
        self.sync.push(self.snapshot());
        self.last_pushed = Some(current);
    }

    // ========================================================================
    // Event loop integration
    // ========================================================================

    /// Process finished sync requests and due feedback steps.
    pub fn pump(&mut self, now: Instant) {
        while let Some(event) = self.sync.try_next_event() {
            self.on_sync_event(event, now);
        }
        self.advance_feedback(now);
    }

    /// Block until every outstanding sync request has been answered, or a
    /// wait of `timeout` passes without progress. Each event is stamped with
    /// the time it was received.
    pub fn settle(&mut self, timeout: Duration) {
        while self.sync.in_flight() > 0 {
            match self.sync.wait_next_event(timeout) {
                Some(event) => self.on_sync_event(event, Instant::now()),
                None => {
                    log::warn!(
                        "Timed out waiting for {} sync requests",
                        self.sync.in_flight()
                    );
                    break;
                }
            }
        }
    }

    fn advance_feedback(&mut self, now: Instant) {
        for step in self.animator.poll(now, self.generation) {
            match step {
                FeedbackStep::Highlight(color) => self.dispatch(PathEvent::Highlight(color)),
                FeedbackStep::Settle { valid } => {
                    log::info!(
                        "Feedback finished, path {}",
                        if valid { "kept" } else { "cleared" }
                    );
                    self.dispatch(PathEvent::Settle { valid });
                }
            }
        }
    }

    fn on_sync_event(&mut self, event: SyncEvent, now: Instant) {
        match event {
            SyncEvent::Saved { seq } => log::trace!("Snapshot #{} acknowledged", seq),
            SyncEvent::SaveFailed { seq, error } => {
                log::warn!("Saving snapshot #{} failed (not retried): {}", seq, error)
            }
            SyncEvent::Verdict {
                seq,
                generation,
                verdict,
            } => {
                if self.pending_verdict != Some(generation)
                    || generation != self.generation
                    || self.phase() != DrawingPhase::AwaitingVerdict
                {
                    log::debug!(
                        "Discarding stale verdict for snapshot #{} (generation {}, now {})",
                        seq,
                        generation,
                        self.generation
                    );
                    return;
                }
                log::info!(
                    "Verdict for snapshot #{}: {}",
                    seq,
                    if verdict.valid { "valid" } else { "invalid" }
                );
                self.pending_verdict = None;
                self.last_verdict = Some(verdict);
                self.animator.start(verdict.valid, generation, now);
                self.advance_feedback(now);
            }
            SyncEvent::VerdictFailed { generation, error } => {
                if self.pending_verdict != Some(generation) {
                    log::debug!("Ignoring failure of stale verdict request: {}", error);
                    return;
                }
                log::error!("Error validating solution: {}", error);
                self.pending_verdict = None;
                self.dispatch(PathEvent::Reset);
            }
        }
    }
}
