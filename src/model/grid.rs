//! Cell grid and node lattice.
//!
//! A puzzle of `width × height` cells owns a lattice of
//! `(height + 1) × (width + 1)` nodes. Cells carry the rule annotations
//! (colour, star, "not"); nodes are where the path runs. The two address
//! spaces never mix: a [`Node`] at `(row, col)` is the top-left corner of the
//! cell at `(row, col)`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Colour Tags
// ============================================================================

/// A colour used both as cell fill and as a rule marker for the judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    /// Neutral colour; ignored by colour rules.
    #[default]
    Grey,
    Red,
    Green,
    Purple,
    Blue,
    Yellow,
    Orange,
    Pink,
}

impl ColorTag {
    /// Wire/display name of the colour.
    pub fn name(&self) -> &'static str {
        match self {
            ColorTag::Grey => "grey",
            ColorTag::Red => "red",
            ColorTag::Green => "green",
            ColorTag::Purple => "purple",
            ColorTag::Blue => "blue",
            ColorTag::Yellow => "yellow",
            ColorTag::Orange => "orange",
            ColorTag::Pink => "pink",
        }
    }

    /// Parse a colour name, case-insensitively. `gray` is accepted for grey.
    pub fn from_name(name: &str) -> Option<Self> {
        let tag = match name.trim().to_ascii_lowercase().as_str() {
            "grey" | "gray" => ColorTag::Grey,
            "red" => ColorTag::Red,
            "green" => ColorTag::Green,
            "purple" => ColorTag::Purple,
            "blue" => ColorTag::Blue,
            "yellow" => ColorTag::Yellow,
            "orange" => ColorTag::Orange,
            "pink" => ColorTag::Pink,
            _ => return None,
        };
        Some(tag)
    }

    /// Get all colours in palette order.
    pub fn all() -> &'static [ColorTag] {
        &[
            ColorTag::Grey,
            ColorTag::Red,
            ColorTag::Green,
            ColorTag::Purple,
            ColorTag::Blue,
            ColorTag::Yellow,
            ColorTag::Orange,
            ColorTag::Pink,
        ]
    }

    /// Whether this is the neutral colour.
    pub fn is_neutral(&self) -> bool {
        *self == ColorTag::Grey
    }
}

// ============================================================================
// Cells and Nodes
// ============================================================================

/// Annotations of a single grid square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    /// Fill colour.
    pub color: ColorTag,
    /// Star marker colour, `None` for no star.
    pub star_color: Option<ColorTag>,
    /// Whether the cell carries a "not" marker.
    pub has_not: bool,
}

impl Cell {
    /// A cell with the given colour and no markers.
    pub fn colored(color: ColorTag) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }
}

/// A lattice intersection. `row ∈ [0, height]`, `col ∈ [0, width]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    pub row: u32,
    pub col: u32,
}

impl Node {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Manhattan distance to another node.
    pub fn manhattan(&self, other: &Node) -> u32 {
        self.row
            .abs_diff(other.row)
            .saturating_add(self.col.abs_diff(other.col))
    }

    /// Whether `other` is exactly one orthogonal step away.
    ///
    /// Diagonal neighbours and the node itself are both rejected.
    pub fn is_adjacent(&self, other: &Node) -> bool {
        matches!(
            (self.row.abs_diff(other.row), self.col.abs_diff(other.col)),
            (1, 0) | (0, 1)
        )
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors raised when building or addressing a grid.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Width or height is zero.
    #[error("Grid dimensions must be positive, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    /// Cell coordinates outside `[0, height) × [0, width)`.
    #[error("Cell ({row}, {col}) is outside a {width}x{height} grid")]
    CellOutOfBounds {
        row: u32,
        col: u32,
        width: u32,
        height: u32,
    },

    /// Node coordinates outside `[0, height] × [0, width]`.
    #[error("Node {node} is outside the lattice of a {width}x{height} grid")]
    NodeOutOfBounds { node: Node, width: u32, height: u32 },

    /// Start and finish are the same node.
    #[error("Start and finish must differ, both are {0}")]
    CoincidentEndpoints(Node),

    /// Width or height exceeds [`MAX_DIMENSION`].
    #[error("Grid dimensions {width}x{height} exceed the maximum of {max}")]
    TooLarge { width: u32, height: u32, max: u32 },

    /// Cell buffer does not match the dimensions.
    #[error("Expected {expected} cells, got {found}")]
    CellCountMismatch { expected: usize, found: usize },
}

// ============================================================================
// Grid
// ============================================================================

/// Largest accepted width or height.
pub const MAX_DIMENSION: u32 = 256;

/// Validate dimensions and return the number of cells.
pub fn cell_count(width: u32, height: u32) -> Result<usize, GridError> {
    if width == 0 || height == 0 {
        return Err(GridError::ZeroDimension { width, height });
    }
    let too_large = GridError::TooLarge {
        width,
        height,
        max: MAX_DIMENSION,
    };
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(too_large);
    }
    (width as usize).checked_mul(height as usize).ok_or(too_large)
}

/// The annotated cell grid plus its node lattice and endpoints.
///
/// Dimensions and endpoints are fixed for the lifetime of the instance; a
/// reshape means building a new `Grid`. Cell edits happen in place and bump
/// [`Grid::revision`], which the session uses for change detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    /// Row-major, `height * width` entries.
    cells: Vec<Cell>,
    start: Node,
    finish: Node,
    revision: u64,
}

impl Grid {
    /// Create a grid of neutral cells with the default endpoints
    /// (start bottom-left, finish top-right).
    pub fn new(width: u32, height: u32) -> Result<Self, GridError> {
        Self::with_endpoints(width, height, Node::new(height, 0), Node::new(0, width))
    }

    /// Create a grid of neutral cells with explicit endpoints.
    pub fn with_endpoints(
        width: u32,
        height: u32,
        start: Node,
        finish: Node,
    ) -> Result<Self, GridError> {
        let cells = vec![Cell::default(); cell_count(width, height)?];
        Self::from_cells(width, height, cells, start, finish)
    }

    /// Build a grid from a row-major cell buffer.
    pub fn from_cells(
        width: u32,
        height: u32,
        cells: Vec<Cell>,
        start: Node,
        finish: Node,
    ) -> Result<Self, GridError> {
        let expected = cell_count(width, height)?;
        if cells.len() != expected {
            return Err(GridError::CellCountMismatch {
                expected,
                found: cells.len(),
            });
        }

        let grid = Self {
            width,
            height,
            cells,
            start,
            finish,
            revision: 0,
        };
        grid.check_node(start)?;
        grid.check_node(finish)?;
        if start == finish {
            return Err(GridError::CoincidentEndpoints(start));
        }
        Ok(grid)
    }

    /// Number of cell columns.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of cell rows.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Where every path must begin.
    pub fn start(&self) -> Node {
        self.start
    }

    /// Where every path must end.
    pub fn finish(&self) -> Node {
        self.finish
    }

    /// Monotonic counter bumped on every cell mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of lattice nodes, `(height + 1) * (width + 1)`.
    pub fn node_count(&self) -> usize {
        (self.height as usize + 1) * (self.width as usize + 1)
    }

    /// Whether a node lies inside the lattice.
    pub fn contains_node(&self, node: Node) -> bool {
        node.row <= self.height && node.col <= self.width
    }

    fn check_node(&self, node: Node) -> Result<(), GridError> {
        if self.contains_node(node) {
            Ok(())
        } else {
            Err(GridError::NodeOutOfBounds {
                node,
                width: self.width,
                height: self.height,
            })
        }
    }

    fn index(&self, row: u32, col: u32) -> Result<usize, GridError> {
        if row >= self.height || col >= self.width {
            return Err(GridError::CellOutOfBounds {
                row,
                col,
                width: self.width,
                height: self.height,
            });
        }
        Ok((row as usize) * (self.width as usize) + col as usize)
    }

    /// Get a cell.
    pub fn cell(&self, row: u32, col: u32) -> Result<&Cell, GridError> {
        let index = self.index(row, col)?;
        Ok(&self.cells[index])
    }

    /// Mutate a single cell in place. Other cells are untouched.
    pub fn update_cell<R>(
        &mut self,
        row: u32,
        col: u32,
        f: impl FnOnce(&mut Cell) -> R,
    ) -> Result<R, GridError> {
        let index = self.index(row, col)?;
        let result = f(&mut self.cells[index]);
        self.revision += 1;
        Ok(result)
    }

    /// Iterate over rows of cells, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width as usize)
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}
