//! Serializable puzzle snapshot.
//!
//! `PuzzleSnapshot` is the document exchanged with the judge's save endpoint
//! and the document format of preset puzzles:
//!
//! ```json
//! {
//!   "width": 4, "height": 4,
//!   "squares": [[{ "color": "red", "starColor": null, "hasNot": false }, ...], ...],
//!   "nodes": [{ "row": 4, "col": 0 }, ...],
//!   "startNode": { "row": 4, "col": 0 },
//!   "finishNode": { "row": 0, "col": 4 }
//! }
//! ```
//!
//! Decoding is lenient: missing annotations fall back to neutral, squares may
//! be bare colour strings, and missing dimensions are inferred from `squares`.
//! Only a document with no recoverable dimensions is rejected.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::grid::{Cell, ColorTag, Grid, GridError, Node, cell_count};
use super::path::Path;

/// Errors when turning a snapshot document into a puzzle.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Neither explicit dimensions nor squares were present
    #[error("Snapshot has no dimensions and no squares to infer them from")]
    MissingDimensions,

    /// The decoded grid is structurally invalid
    #[error("Invalid grid: {0}")]
    Grid(#[from] GridError),
}

/// One square of the wire document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawSquare")]
pub struct SquareEntry {
    pub color: ColorTag,
    pub star_color: Option<ColorTag>,
    pub has_not: bool,
}

/// Every square shape seen in the wild.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSquare {
    /// `null`
    Missing,
    /// Legacy `"red"`
    Name(String),
    Full {
        #[serde(default)]
        color: Option<String>,
        #[serde(default, rename = "starColor")]
        star_color: Option<String>,
        #[serde(default, rename = "hasNot")]
        has_not: Option<bool>,
    },
}

fn lenient_color(name: Option<&str>) -> ColorTag {
    match name {
        Some(name) => ColorTag::from_name(name).unwrap_or_else(|| {
            log::warn!("Unknown colour '{}', using neutral", name);
            ColorTag::default()
        }),
        None => ColorTag::default(),
    }
}

fn lenient_star(name: Option<&str>) -> Option<ColorTag> {
    let name = name?;
    let tag = ColorTag::from_name(name);
    if tag.is_none() {
        log::warn!("Unknown star colour '{}', dropping star", name);
    }
    tag
}

impl From<RawSquare> for SquareEntry {
    fn from(raw: RawSquare) -> Self {
        match raw {
            RawSquare::Missing => Cell::default().into(),
            RawSquare::Name(name) => Cell::colored(lenient_color(Some(&name))).into(),
            RawSquare::Full {
                color,
                star_color,
                has_not,
            } => SquareEntry {
                color: lenient_color(color.as_deref()),
                star_color: lenient_star(star_color.as_deref()),
                has_not: has_not.unwrap_or(false),
            },
        }
    }
}

impl From<Cell> for SquareEntry {
    fn from(cell: Cell) -> Self {
        Self {
            color: cell.color,
            star_color: cell.star_color,
            has_not: cell.has_not,
        }
    }
}

impl From<SquareEntry> for Cell {
    fn from(entry: SquareEntry) -> Self {
        Self {
            color: entry.color,
            star_color: entry.star_color,
            has_not: entry.has_not,
        }
    }
}

/// Complete serializable state of one puzzle instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleSnapshot {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Cell annotations, `height` rows of `width` squares.
    #[serde(default)]
    pub squares: Vec<Vec<SquareEntry>>,
    /// The drawn path.
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_node: Option<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_node: Option<Node>,
}

impl PuzzleSnapshot {
    /// Capture the current grid and path.
    pub fn capture(grid: &Grid, path: &Path) -> Self {
        Self {
            width: grid.width(),
            height: grid.height(),
            squares: grid
                .rows()
                .map(|row| row.iter().copied().map(SquareEntry::from).collect())
                .collect(),
            nodes: path.nodes().to_vec(),
            start_node: Some(grid.start()),
            finish_node: Some(grid.finish()),
        }
    }

    /// Export to a pretty JSON string.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Import from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Effective `(width, height)`, inferring from squares where absent.
    /// Oversized dimensions are rejected before anything is allocated.
    fn dimensions(&self) -> Result<(u32, u32), SnapshotError> {
        let clamp = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
        let height = match self.height {
            0 => clamp(self.squares.len()),
            h => h,
        };
        let width = match self.width {
            0 => self.squares.first().map_or(0, |row| clamp(row.len())),
            w => w,
        };
        if width == 0 || height == 0 {
            return Err(SnapshotError::MissingDimensions);
        }
        cell_count(width, height)?;
        Ok((width, height))
    }

    /// Build the grid and initial path described by this document.
    ///
    /// Ragged or short rows are padded with neutral cells. Endpoints outside
    /// the lattice fall back to the defaults. A path that is not a simple walk
    /// inside the lattice is dropped.
    pub fn into_parts(self) -> Result<(Grid, Path), SnapshotError> {
        let (width, height) = self.dimensions()?;

        let mut cells = Vec::with_capacity(cell_count(width, height)?);
        for r in 0..height as usize {
            let row = self.squares.get(r);
            for c in 0..width as usize {
                let entry = row.and_then(|row| row.get(c)).copied();
                cells.push(entry.map(Cell::from).unwrap_or_default());
            }
        }

        let in_lattice = |n: &Node| n.row <= height && n.col <= width;
        let start = endpoint_or_default(self.start_node, Node::new(height, 0), in_lattice, "start");
        let finish = endpoint_or_default(self.finish_node, Node::new(0, width), in_lattice, "finish");

        let grid = Grid::from_cells(width, height, cells, start, finish)?;

        let path = if self.nodes.iter().all(in_lattice) {
            Path::from_nodes(self.nodes)
        } else {
            None
        };
        let path = path.unwrap_or_else(|| {
            log::warn!("Snapshot path is not a legal walk, starting with an empty path");
            Path::new()
        });

        Ok((grid, path))
    }
}

fn endpoint_or_default(
    node: Option<Node>,
    default: Node,
    in_lattice: impl Fn(&Node) -> bool,
    which: &str,
) -> Node {
    match node {
        Some(node) if in_lattice(&node) => node,
        Some(node) => {
            log::warn!("{} node {} is outside the lattice, using {}", which, node, default);
            default
        }
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid() -> (Grid, Path) {
        let mut grid = Grid::new(3, 2).unwrap();
        grid.update_cell(0, 0, |c| c.color = ColorTag::Red).unwrap();
        grid.update_cell(0, 2, |c| c.star_color = Some(ColorTag::Orange))
            .unwrap();
        grid.update_cell(1, 1, |c| {
            c.has_not = true;
            c.color = ColorTag::Blue;
        })
        .unwrap();

        let mut path = Path::seeded(grid.start());
        path.try_extend(Node::new(1, 0));
        path.try_extend(Node::new(1, 1));
        (grid, path)
    }

    #[test]
    fn test_round_trip() {
        let (grid, path) = sample_grid();
        let json = PuzzleSnapshot::capture(&grid, &path).to_json().unwrap();

        let (loaded_grid, loaded_path) = PuzzleSnapshot::from_json(&json)
            .unwrap()
            .into_parts()
            .unwrap();

        assert_eq!(loaded_grid.width(), grid.width());
        assert_eq!(loaded_grid.height(), grid.height());
        assert_eq!(loaded_grid.cells(), grid.cells());
        assert_eq!(loaded_grid.start(), grid.start());
        assert_eq!(loaded_grid.finish(), grid.finish());
        assert_eq!(loaded_path, path);
    }

    #[test]
    fn test_wire_field_names() {
        let (grid, path) = sample_grid();
        let json = PuzzleSnapshot::capture(&grid, &path).to_json().unwrap();
        assert!(json.contains("\"squares\""));
        assert!(json.contains("\"starColor\": \"orange\""));
        assert!(json.contains("\"hasNot\": true"));
        assert!(json.contains("\"startNode\""));
        assert!(json.contains("\"finishNode\""));
    }

    #[test]
    fn test_missing_annotations_default_to_neutral() {
        let json = r#"{
            "width": 2, "height": 2,
            "squares": [[{"color": "green"}, {}], ["red"]],
            "nodes": []
        }"#;
        let (grid, path) = PuzzleSnapshot::from_json(json)
            .unwrap()
            .into_parts()
            .unwrap();

        assert_eq!(grid.cell(0, 0).unwrap().color, ColorTag::Green);
        assert_eq!(*grid.cell(0, 1).unwrap(), Cell::default());
        assert_eq!(grid.cell(1, 0).unwrap().color, ColorTag::Red);
        assert_eq!(*grid.cell(1, 1).unwrap(), Cell::default());
        assert_eq!(grid.start(), Node::new(2, 0));
        assert_eq!(grid.finish(), Node::new(0, 2));
        assert!(path.is_empty());
    }

    #[test]
    fn test_infers_dimensions_and_tolerates_unknown_colors() {
        let json = r#"{
            "squares": [
                [{"color": "teal", "starColor": "silver", "hasNot": null}, null, null]
            ]
        }"#;
        let (grid, _) = PuzzleSnapshot::from_json(json)
            .unwrap()
            .into_parts()
            .unwrap();

        assert_eq!((grid.width(), grid.height()), (3, 1));
        assert_eq!(*grid.cell(0, 0).unwrap(), Cell::default());
    }

    #[test]
    fn test_oversized_dimensions_are_rejected() {
        let json = r#"{"width": 4294967295, "height": 4294967295}"#;
        let result = PuzzleSnapshot::from_json(json).unwrap().into_parts();
        assert!(matches!(
            result,
            Err(SnapshotError::Grid(GridError::TooLarge { .. }))
        ));

        let json = r#"{"width": 100000, "height": 100000}"#;
        let result = PuzzleSnapshot::from_json(json).unwrap().into_parts();
        assert!(matches!(
            result,
            Err(SnapshotError::Grid(GridError::TooLarge { .. }))
        ));
    }

    #[test]
    fn test_no_dimensions_is_an_error() {
        let result = PuzzleSnapshot::from_json("{}").unwrap().into_parts();
        assert!(matches!(result, Err(SnapshotError::MissingDimensions)));
    }

    #[test]
    fn test_illegal_initial_path_is_dropped() {
        let json = r#"{
            "width": 2, "height": 2,
            "nodes": [{"row": 2, "col": 0}, {"row": 0, "col": 0}],
            "startNode": {"row": 9, "col": 9}
        }"#;
        let (grid, path) = PuzzleSnapshot::from_json(json)
            .unwrap()
            .into_parts()
            .unwrap();
        assert!(path.is_empty());
        assert_eq!(grid.start(), Node::new(2, 0));
    }
}
