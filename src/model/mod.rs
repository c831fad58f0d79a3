//! Data models for pathgrid puzzles.

mod grid;
mod path;
mod snapshot;

pub use grid::{Cell, ColorTag, Grid, GridError, MAX_DIMENSION, Node};
pub use path::Path;
pub use snapshot::{PuzzleSnapshot, SnapshotError, SquareEntry};
