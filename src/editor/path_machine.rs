//! Path drawing state machine.
//!
//! The machine is a pure reducer: [`PathState::reduce`] takes the current
//! state and an event and returns the next state plus an optional effect for
//! the caller to carry out (request a verdict, cancel feedback, ...). Nothing
//! here performs I/O or reads the clock.
//!
//! ```text
//! Idle ──Begin(start)──▶ Drawing ──Finish(finish)──▶ AwaitingVerdict
//!  ▲                       │                               │
//!  └──Finish(other)────────┘          Settle{valid} ───────┘
//! ```

use crate::model::{Grid, Node, Path};

/// Coarse drawing phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawingPhase {
    /// No attempt in progress. A kept path may still be displayed.
    #[default]
    Idle,
    /// The user is extending the path.
    Drawing,
    /// The path ended on the finish node and the judge has been asked.
    AwaitingVerdict,
}

/// Colour applied to path edges and endpoint halos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedbackColor {
    #[default]
    Neutral,
    Success,
    Failure,
}

impl FeedbackColor {
    pub fn name(&self) -> &'static str {
        match self {
            FeedbackColor::Neutral => "neutral",
            FeedbackColor::Success => "success",
            FeedbackColor::Failure => "failure",
        }
    }
}

/// Input to the reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathEvent {
    /// Click on a node while idle.
    Begin(Node),
    /// Pointer entered a node.
    Extend(Node),
    /// Click on a node while drawing.
    Finish(Node),
    /// Remove the last node.
    Undo,
    /// Drop the path and return to idle.
    Reset,
    /// Feedback sequence step.
    Highlight(FeedbackColor),
    /// Feedback sequence finished for a verdict.
    Settle { valid: bool },
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathEffect {
    /// A fresh attempt began; stale feedback must be cancelled.
    Started,
    /// The path reached the finish by click; ask the judge.
    RequestVerdict,
    /// A wrong node was clicked mid-draw; the attempt was discarded.
    Aborted,
    /// The path was reset on request.
    Cleared,
}

/// Result of one reducer step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub state: PathState,
    pub effect: Option<PathEffect>,
}

impl Step {
    fn unchanged(state: &PathState) -> Self {
        Self {
            state: state.clone(),
            effect: None,
        }
    }
}

/// Complete drawing state. Replaced wholesale on every transition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathState {
    phase: DrawingPhase,
    path: Path,
    start_reached: bool,
    finish_reached: bool,
    highlight: FeedbackColor,
}

impl PathState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idle state displaying a preloaded path.
    pub fn with_path(path: Path) -> Self {
        Self {
            path,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> DrawingPhase {
        self.phase
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn start_reached(&self) -> bool {
        self.start_reached
    }

    pub fn finish_reached(&self) -> bool {
        self.finish_reached
    }

    pub fn highlight(&self) -> FeedbackColor {
        self.highlight
    }

    /// Apply one event.
    pub fn reduce(&self, event: PathEvent, grid: &Grid) -> Step {
        match (self.phase, event) {
            (DrawingPhase::Idle, PathEvent::Begin(node)) => self.begin(node, grid),
            (DrawingPhase::Drawing, PathEvent::Extend(node)) => self.extend(node, grid),
            (DrawingPhase::Drawing, PathEvent::Finish(node)) => self.finish(node, grid),
            (DrawingPhase::Drawing, PathEvent::Undo) => self.undo(grid),
            (_, PathEvent::Reset) => Step {
                state: PathState::new(),
                effect: Some(PathEffect::Cleared),
            },
            (_, PathEvent::Highlight(color)) => Step {
                state: PathState {
                    highlight: color,
                    ..self.clone()
                },
                effect: None,
            },
            (DrawingPhase::AwaitingVerdict, PathEvent::Settle { valid }) => self.settle(valid),
            (phase, event) => {
                log::trace!("Ignoring {:?} in {:?}", event, phase);
                Step::unchanged(self)
            }
        }
    }

    fn begin(&self, node: Node, grid: &Grid) -> Step {
        if node != grid.start() {
            log::trace!("Click on {} while idle is not the start, ignored", node);
            return Step::unchanged(self);
        }
        log::debug!("Path started at {}", node);
        Step {
            state: PathState {
                phase: DrawingPhase::Drawing,
                path: Path::seeded(node),
                start_reached: true,
                finish_reached: false,
                highlight: FeedbackColor::Neutral,
            },
            effect: Some(PathEffect::Started),
        }
    }

    fn extend(&self, node: Node, grid: &Grid) -> Step {
        if !grid.contains_node(node) {
            return Step::unchanged(self);
        }
        let mut next = self.clone();
        if !next.path.try_extend(node) {
            log::trace!("Extension to {} rejected", node);
            return Step::unchanged(self);
        }
        if node == grid.start() {
            next.start_reached = true;
        }
        if node == grid.finish() {
            next.finish_reached = true;
        }
        Step {
            state: next,
            effect: None,
        }
    }

    fn finish(&self, node: Node, grid: &Grid) -> Step {
        if node != grid.finish() {
            log::info!("Clicked {} which is not the finish, discarding attempt", node);
            return Step {
                state: PathState::new(),
                effect: Some(PathEffect::Aborted),
            };
        }

        let mut next = self.clone();
        let already_last = next.path.last() == Some(node);
        if !already_last && !next.path.try_extend(node) {
            log::debug!("Finish {} is not reachable from {:?}, ignored", node, self.path.last());
            return Step::unchanged(self);
        }

        log::info!("Path completed with {} nodes, awaiting verdict", next.path.len());
        next.phase = DrawingPhase::AwaitingVerdict;
        next.finish_reached = true;
        Step {
            state: next,
            effect: Some(PathEffect::RequestVerdict),
        }
    }

    fn undo(&self, grid: &Grid) -> Step {
        let mut next = self.clone();
        match next.path.pop_keep_seed() {
            Some(removed) => {
                if removed == grid.finish() {
                    next.finish_reached = false;
                }
                Step {
                    state: next,
                    effect: None,
                }
            }
            None => Step::unchanged(self),
        }
    }

    fn settle(&self, valid: bool) -> Step {
        let state = if valid {
            PathState {
                phase: DrawingPhase::Idle,
                highlight: FeedbackColor::Neutral,
                ..self.clone()
            }
        } else {
            PathState::new()
        };
        Step {
            state,
            effect: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::new(4, 4).unwrap()
    }

    fn drive(events: &[PathEvent], grid: &Grid) -> (PathState, Vec<PathEffect>) {
        let mut state = PathState::new();
        let mut effects = Vec::new();
        for event in events {
            let step = state.reduce(*event, grid);
            state = step.state;
            effects.extend(step.effect);
        }
        (state, effects)
    }

    fn n(row: u32, col: u32) -> Node {
        Node::new(row, col)
    }

    #[test]
    fn test_begin_only_at_start() {
        let grid = grid();
        let (state, effects) = drive(&[PathEvent::Begin(n(2, 2))], &grid);
        assert_eq!(state.phase(), DrawingPhase::Idle);
        assert!(state.path().is_empty());
        assert!(effects.is_empty());

        let (state, effects) = drive(&[PathEvent::Begin(n(4, 0))], &grid);
        assert_eq!(state.phase(), DrawingPhase::Drawing);
        assert_eq!(state.path().nodes(), &[n(4, 0)]);
        assert!(state.start_reached());
        assert_eq!(effects, vec![PathEffect::Started]);
    }

    #[test]
    fn test_full_walk_requests_one_verdict() {
        let grid = grid();
        let walk = [
            n(3, 0),
            n(2, 0),
            n(1, 0),
            n(0, 0),
            n(0, 1),
            n(0, 2),
            n(0, 3),
            n(0, 4),
        ];
        let mut events = vec![PathEvent::Begin(n(4, 0))];
        events.extend(walk.iter().map(|node| PathEvent::Extend(*node)));
        events.push(PathEvent::Finish(n(0, 4)));

        let (state, effects) = drive(&events, &grid);
        assert_eq!(state.phase(), DrawingPhase::AwaitingVerdict);
        assert_eq!(state.path().len(), 9);
        assert!(state.path().is_simple_walk());
        assert!(state.finish_reached());
        let verdicts = effects
            .iter()
            .filter(|e| **e == PathEffect::RequestVerdict)
            .count();
        assert_eq!(verdicts, 1);
    }

    #[test]
    fn test_hover_onto_finish_does_not_complete() {
        let grid = Grid::new(1, 1).unwrap();
        let (state, effects) = drive(
            &[
                PathEvent::Begin(n(1, 0)),
                PathEvent::Extend(n(0, 0)),
                PathEvent::Extend(n(0, 1)),
            ],
            &grid,
        );
        assert_eq!(state.phase(), DrawingPhase::Drawing);
        assert!(state.finish_reached());
        assert_eq!(effects, vec![PathEffect::Started]);

        // clicking the finish that is already last completes without re-appending
        let step = state.reduce(PathEvent::Finish(n(0, 1)), &grid);
        assert_eq!(step.effect, Some(PathEffect::RequestVerdict));
        assert_eq!(step.state.path().len(), 3);
    }

    #[test]
    fn test_illegal_jump_is_ignored() {
        let grid = grid();
        let (state, _) = drive(
            &[PathEvent::Begin(n(4, 0)), PathEvent::Extend(n(2, 2))],
            &grid,
        );
        assert_eq!(state.path().nodes(), &[n(4, 0)]);
        assert_eq!(state.phase(), DrawingPhase::Drawing);
    }

    #[test]
    fn test_extend_outside_lattice_is_ignored() {
        let grid = grid();
        let (state, _) = drive(
            &[
                PathEvent::Begin(n(4, 0)),
                PathEvent::Extend(n(5, 0)),
                PathEvent::Extend(n(4, 1)),
            ],
            &grid,
        );
        assert_eq!(state.path().nodes(), &[n(4, 0), n(4, 1)]);
    }

    #[test]
    fn test_wrong_click_aborts() {
        let grid = grid();
        let (state, effects) = drive(
            &[
                PathEvent::Begin(n(4, 0)),
                PathEvent::Extend(n(3, 0)),
                PathEvent::Finish(n(3, 0)),
            ],
            &grid,
        );
        assert_eq!(state, PathState::new());
        assert_eq!(effects, vec![PathEffect::Started, PathEffect::Aborted]);
    }

    #[test]
    fn test_unreachable_finish_click_is_ignored() {
        let grid = grid();
        let (state, effects) = drive(
            &[PathEvent::Begin(n(4, 0)), PathEvent::Finish(n(0, 4))],
            &grid,
        );
        assert_eq!(state.phase(), DrawingPhase::Drawing);
        assert_eq!(state.path().nodes(), &[n(4, 0)]);
        assert_eq!(effects, vec![PathEffect::Started]);
    }

    #[test]
    fn test_undo() {
        let grid = grid();
        let (mut state, _) = drive(
            &[
                PathEvent::Begin(n(4, 0)),
                PathEvent::Extend(n(4, 1)),
                PathEvent::Extend(n(4, 2)),
            ],
            &grid,
        );
        state = state.reduce(PathEvent::Undo, &grid).state;
        assert_eq!(state.path().len(), 2);
        state = state.reduce(PathEvent::Undo, &grid).state;
        assert_eq!(state.path().len(), 1);
        state = state.reduce(PathEvent::Undo, &grid).state;
        assert_eq!(state.path().nodes(), &[n(4, 0)]);

        let idle = PathState::new().reduce(PathEvent::Undo, &grid);
        assert_eq!(idle.state, PathState::new());
    }

    #[test]
    fn test_undo_off_finish_clears_finish_reached() {
        let grid = grid();
        let mut events = vec![PathEvent::Begin(n(4, 0))];
        events.extend((1..=4).map(|col| PathEvent::Extend(n(4, col))));
        events.extend((0..4).rev().map(|row| PathEvent::Extend(n(row, 4))));
        let (state, _) = drive(&events, &grid);
        assert!(state.finish_reached());
        assert_eq!(state.path().len(), 9);

        let step = state.reduce(PathEvent::Undo, &grid);
        assert_eq!(step.effect, None);
        assert!(!step.state.finish_reached());
        assert!(step.state.start_reached());
        assert_eq!(step.state.path().last(), Some(n(1, 4)));
        assert_eq!(step.state.phase(), DrawingPhase::Drawing);

        // a later click on the finish is a fresh legal extension again
        let step = step.state.reduce(PathEvent::Finish(n(0, 4)), &grid);
        assert_eq!(step.effect, Some(PathEffect::RequestVerdict));
        assert_eq!(step.state.path().len(), 9);
    }

    #[test]
    fn test_awaiting_verdict_ignores_drawing_input() {
        let grid = Grid::new(1, 1).unwrap();
        let (state, _) = drive(
            &[
                PathEvent::Begin(n(1, 0)),
                PathEvent::Extend(n(1, 1)),
                PathEvent::Finish(n(0, 1)),
            ],
            &grid,
        );
        assert_eq!(state.phase(), DrawingPhase::AwaitingVerdict);
        for event in [
            PathEvent::Undo,
            PathEvent::Extend(n(0, 0)),
            PathEvent::Finish(n(0, 0)),
            PathEvent::Begin(n(1, 0)),
        ] {
            assert_eq!(state.reduce(event, &grid).state, state);
        }
    }

    #[test]
    fn test_settle() {
        let grid = Grid::new(1, 1).unwrap();
        let (state, _) = drive(
            &[
                PathEvent::Begin(n(1, 0)),
                PathEvent::Extend(n(1, 1)),
                PathEvent::Finish(n(0, 1)),
                PathEvent::Highlight(FeedbackColor::Success),
            ],
            &grid,
        );
        assert_eq!(state.highlight(), FeedbackColor::Success);

        let kept = state.reduce(PathEvent::Settle { valid: true }, &grid).state;
        assert_eq!(kept.phase(), DrawingPhase::Idle);
        assert_eq!(kept.path().len(), 3);
        assert_eq!(kept.highlight(), FeedbackColor::Neutral);

        let cleared = state.reduce(PathEvent::Settle { valid: false }, &grid).state;
        assert_eq!(cleared, PathState::new());
    }

    #[test]
    fn test_reset_from_any_phase() {
        let grid = grid();
        let (state, _) = drive(
            &[
                PathEvent::Begin(n(4, 0)),
                PathEvent::Extend(n(3, 0)),
                PathEvent::Highlight(FeedbackColor::Failure),
            ],
            &grid,
        );
        let step = state.reduce(PathEvent::Reset, &grid);
        assert_eq!(step.state, PathState::new());
        assert_eq!(step.effect, Some(PathEffect::Cleared));
    }
}
