//! pathgrid - grid path-puzzle editor
//!
//! Draw a single path across a node lattice from a start to a finish, annotate
//! cells with colour, star and "not" markers, and have a remote judge decide
//! whether the path satisfies the annotated rules.

pub mod config;
pub mod editor;
pub mod feedback;
pub mod keybindings;
pub mod library;
pub mod model;
pub mod session;
pub mod sync;
pub mod text_view;

pub use config::{AppConfig, LogLevel};
pub use library::{Library, LibraryError, LibraryView};
pub use session::{EditorInput, EditorSession, SessionSettings};
