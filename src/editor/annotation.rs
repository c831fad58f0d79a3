//! Cell annotation editing.
//!
//! A single [`EditMode`] is active at a time; clicking a cell applies that
//! mode's edit to exactly that cell.

use serde::{Deserialize, Serialize};

use super::path_machine::DrawingPhase;
use crate::model::{ColorTag, Grid, GridError};

/// What a cell click edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    /// Advance the fill colour.
    #[default]
    Color,
    /// Advance the star colour.
    Star,
    /// Toggle the "not" marker.
    Not,
}

impl EditMode {
    /// Get the display name for this mode.
    pub fn name(&self) -> &'static str {
        match self {
            EditMode::Color => "Color",
            EditMode::Star => "Star",
            EditMode::Not => "Not",
        }
    }

    /// Get all edit modes.
    pub fn all() -> &'static [EditMode] {
        &[EditMode::Color, EditMode::Star, EditMode::Not]
    }
}

/// When annotation edits are accepted relative to the drawing phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationPolicy {
    /// Edits are always accepted.
    Always,
    /// Edits are rejected while the judge is evaluating a completed path, so
    /// the verdict always matches what is on screen.
    #[default]
    NotWhileAwaitingVerdict,
    /// Edits are only accepted when no path is being drawn.
    IdleOnly,
}

impl AnnotationPolicy {
    pub fn allows(&self, phase: DrawingPhase) -> bool {
        match self {
            AnnotationPolicy::Always => true,
            AnnotationPolicy::NotWhileAwaitingVerdict => phase != DrawingPhase::AwaitingVerdict,
            AnnotationPolicy::IdleOnly => phase == DrawingPhase::Idle,
        }
    }
}

/// Colour cycles for the colour and star modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationPalette {
    /// Fill colour cycle.
    #[serde(default = "default_colors")]
    pub colors: Vec<ColorTag>,
    /// Star cycle; `None` entries mean "no star".
    #[serde(default = "default_stars")]
    pub stars: Vec<Option<ColorTag>>,
}

fn default_colors() -> Vec<ColorTag> {
    ColorTag::all().to_vec()
}

fn default_stars() -> Vec<Option<ColorTag>> {
    vec![
        None,
        Some(ColorTag::Orange),
        Some(ColorTag::Green),
        Some(ColorTag::Purple),
    ]
}

impl Default for AnnotationPalette {
    fn default() -> Self {
        Self {
            colors: default_colors(),
            stars: default_stars(),
        }
    }
}

/// Next value in a wrapping cycle. Values not in the cycle restart it.
fn next_in_cycle<T: Copy + PartialEq>(cycle: &[T], current: T) -> T {
    if cycle.is_empty() {
        return current;
    }
    let next = cycle
        .iter()
        .position(|v| *v == current)
        .map_or(0, |i| (i + 1) % cycle.len());
    cycle[next]
}

impl AnnotationPalette {
    pub fn next_color(&self, current: ColorTag) -> ColorTag {
        next_in_cycle(&self.colors, current)
    }

    pub fn next_star(&self, current: Option<ColorTag>) -> Option<ColorTag> {
        next_in_cycle(&self.stars, current)
    }
}

/// Mode-scoped cell editor.
#[derive(Debug, Clone, Default)]
pub struct AnnotationEditor {
    mode: EditMode,
    palette: AnnotationPalette,
    policy: AnnotationPolicy,
}

impl AnnotationEditor {
    pub fn new(palette: AnnotationPalette, policy: AnnotationPolicy) -> Self {
        Self {
            mode: EditMode::default(),
            palette,
            policy,
        }
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: EditMode) {
        if self.mode != mode {
            log::debug!("Edit mode: {}", mode.name());
            self.mode = mode;
        }
    }

    /// Apply the current mode to one cell.
    ///
    /// Returns `Ok(false)` when the policy rejects the edit in `phase`.
    pub fn apply_at(
        &self,
        grid: &mut Grid,
        row: u32,
        col: u32,
        phase: DrawingPhase,
    ) -> Result<bool, GridError> {
        if !self.policy.allows(phase) {
            log::debug!(
                "{} edit at ({}, {}) rejected in {:?}",
                self.mode.name(),
                row,
                col,
                phase
            );
            return Ok(false);
        }

        grid.update_cell(row, col, |cell| match self.mode {
            EditMode::Color => cell.color = self.palette.next_color(cell.color),
            EditMode::Star => cell.star_color = self.palette.next_star(cell.star_color),
            EditMode::Not => cell.has_not = !cell.has_not,
        })?;
        Ok(true)
    }
}
