//! Plain-text rendering for the terminal front end.
//!
//! Lattice nodes are drawn as `+`, path nodes as `o`, endpoints as `S` and
//! `F`. Each cell is three characters: fill code, star code, `!` for a "not"
//! marker.

use std::collections::HashSet;

use crate::editor::DrawingPhase;
use crate::library::{Library, LibraryView, PresetSection};
use crate::model::{Cell, ColorTag, Grid, Node, Path};
use crate::session::EditorSession;

fn color_code(color: ColorTag) -> char {
    match color {
        ColorTag::Grey => '.',
        ColorTag::Red => 'R',
        ColorTag::Green => 'G',
        ColorTag::Purple => 'U',
        ColorTag::Blue => 'B',
        ColorTag::Yellow => 'Y',
        ColorTag::Orange => 'O',
        ColorTag::Pink => 'K',
    }
}

fn cell_text(cell: &Cell) -> String {
    let star = cell
        .star_color
        .map_or(' ', |c| color_code(c).to_ascii_lowercase());
    let not = if cell.has_not { '!' } else { ' ' };
    format!("{}{}{}", color_code(cell.color), star, not)
}

fn edge(a: Node, b: Node) -> (Node, Node) {
    if (a.row, a.col) <= (b.row, b.col) {
        (a, b)
    } else {
        (b, a)
    }
}

/// Render the grid with a path overlaid.
pub fn render_grid(grid: &Grid, path: &Path) -> String {
    let edges: HashSet<(Node, Node)> = path.segments().map(|(a, b)| edge(a, b)).collect();
    let on_path = |a: Node, b: Node| edges.contains(&edge(a, b));

    let mut lines = Vec::with_capacity(2 * grid.height() as usize + 1);
    for r in 0..=grid.height() {
        let mut line = String::new();
        for c in 0..=grid.width() {
            let node = Node::new(r, c);
            line.push(if node == grid.start() {
                'S'
            } else if node == grid.finish() {
                'F'
            } else if path.contains(node) {
                'o'
            } else {
                '+'
            });
            if c < grid.width() {
                line.push_str(if on_path(node, Node::new(r, c + 1)) {
                    "---"
                } else {
                    "   "
                });
            }
        }
        lines.push(line.trim_end().to_string());

        if r == grid.height() {
            break;
        }
        let mut line = String::new();
        for (c, cell) in grid.rows().nth(r as usize).into_iter().flatten().enumerate() {
            let c = c as u32;
            line.push(if on_path(Node::new(r, c), Node::new(r + 1, c)) {
                '|'
            } else {
                ' '
            });
            line.push_str(&cell_text(cell));
        }
        let last = grid.width();
        line.push(if on_path(Node::new(r, last), Node::new(r + 1, last)) {
            '|'
        } else {
            ' '
        });
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

/// One-line summary of a session.
pub fn render_status(session: &EditorSession) -> String {
    let state = session.path_state();
    let mut status = format!(
        "mode: {} | phase: {} | highlight: {} | path: {} nodes",
        session.mode().name(),
        phase_name(state.phase()),
        state.highlight().name(),
        state.path().len()
    );
    if let Some(verdict) = session.last_verdict() {
        status.push_str(if verdict.valid {
            " | last verdict: valid"
        } else {
            " | last verdict: invalid"
        });
        if let Some(regions) = verdict.region_count {
            status.push_str(&format!(" ({} regions)", regions));
        }
    }
    status
}

fn phase_name(phase: DrawingPhase) -> &'static str {
    match phase {
        DrawingPhase::Idle => "idle",
        DrawingPhase::Drawing => "drawing",
        DrawingPhase::AwaitingVerdict => "awaiting verdict",
    }
}

/// Grid plus status line.
pub fn render_session(session: &EditorSession) -> String {
    format!(
        "{}\n{}",
        render_grid(session.grid(), session.path()),
        render_status(session)
    )
}

/// Preset menu, or the open puzzle.
pub fn render_library(library: &Library) -> String {
    match library.view() {
        LibraryView::Playing { index, session } => {
            format!("Puzzle {}\n{}", index, render_session(session))
        }
        LibraryView::Menu { message } => {
            let mut lines = Vec::new();
            if let Some(message) = message {
                lines.push(message.clone());
            }
            for section in PresetSection::all() {
                let indices: Vec<String> = section.indices().map(|i| i.to_string()).collect();
                lines.push(format!("{:<6} {}", section.title(), indices.join(" ")));
            }
            lines.join("\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_grid() {
        let mut grid = Grid::new(2, 2).unwrap();
        grid.update_cell(0, 0, |cell| {
            cell.color = ColorTag::Red;
            cell.has_not = true;
        })
        .unwrap();
        grid.update_cell(1, 1, |cell| cell.star_color = Some(ColorTag::Orange))
            .unwrap();
        let path =
            Path::from_nodes(vec![Node::new(2, 0), Node::new(1, 0), Node::new(1, 1)]).unwrap();

        let text = render_grid(&grid, &path);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "+   +   F",
                " R ! .",
                "o---o   +",
                "|.   .o",
                "S   +   +",
            ]
        );
    }

    #[test]
    fn test_cell_codes() {
        assert_eq!(cell_text(&Cell::default()), ".  ");
        let cell = Cell {
            color: ColorTag::Pink,
            star_color: Some(ColorTag::Purple),
            has_not: true,
        };
        assert_eq!(cell_text(&cell), "Ku!");
    }
}
