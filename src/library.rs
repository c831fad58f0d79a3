//! Preset puzzle library.
//!
//! Presets are numbered from 1 and grouped into three sections of ten, one per
//! rule family. A preset document is a [`PuzzleSnapshot`] fetched from a
//! [`PresetSource`]. Failing to load one is never fatal: the library drops back
//! to the menu and shows a message.

use std::io::ErrorKind;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::{PuzzleSnapshot, SnapshotError};
use crate::session::{EditorSession, SessionSettings};
use crate::sync::SyncClient;

/// Number of presets per section.
pub const SECTION_SIZE: u32 = 10;

/// Errors raised while loading a preset.
#[derive(Error, Debug)]
pub enum LibraryError {
    /// No document exists for this index
    #[error("Puzzle {index} hasn't been added yet.")]
    NotFound {
        /// The requested preset
        index: u32,
    },

    /// I/O error while reading a preset file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document does not describe a usable puzzle
    #[error("Invalid puzzle: {0}")]
    Snapshot(#[from] SnapshotError),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status other than 404
    #[error("Fetching {url} returned status {status}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The judge connection is held by a session that was not returned
    #[error("No judge connection available")]
    SyncUnavailable,
}

// ============================================================================
// Catalog
// ============================================================================

/// Rule family a preset teaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetSection {
    Color,
    Star,
    Not,
}

impl PresetSection {
    pub fn all() -> &'static [PresetSection] {
        &[PresetSection::Color, PresetSection::Star, PresetSection::Not]
    }

    pub fn title(&self) -> &'static str {
        match self {
            PresetSection::Color => "Color",
            PresetSection::Star => "Star",
            PresetSection::Not => "Not",
        }
    }

    /// Preset indices in this section.
    pub fn indices(&self) -> RangeInclusive<u32> {
        let first = match self {
            PresetSection::Color => 1,
            PresetSection::Star => SECTION_SIZE + 1,
            PresetSection::Not => 2 * SECTION_SIZE + 1,
        };
        first..=first + SECTION_SIZE - 1
    }

    /// Section a preset index belongs to.
    pub fn of(index: u32) -> Option<PresetSection> {
        Self::all()
            .iter()
            .copied()
            .find(|section| section.indices().contains(&index))
    }
}

// ============================================================================
// Sources
// ============================================================================

/// Where preset documents come from.
pub trait PresetSource {
    /// Short description for logs.
    fn describe(&self) -> String;

    /// Fetch the document for a preset.
    fn fetch(&self, index: u32) -> Result<PuzzleSnapshot, LibraryError>;
}

/// Presets stored as `puzzle{N}.json` files in a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, index: u32) -> PathBuf {
        self.dir.join(format!("puzzle{}.json", index))
    }
}

impl PresetSource for DirectorySource {
    fn describe(&self) -> String {
        format!("directory {}", self.dir.display())
    }

    fn fetch(&self, index: u32) -> Result<PuzzleSnapshot, LibraryError> {
        let path = self.path_for(index);
        let json = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LibraryError::NotFound { index },
            _ => LibraryError::Io(e),
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Presets served over HTTP at `{base}/tutorial/puzzle{N}.json`.
pub struct HttpSource {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self, LibraryError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(crate::sync::HttpJudge::DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, index: u32) -> String {
        format!("{}/tutorial/puzzle{}.json", self.base_url, index)
    }
}

impl PresetSource for HttpSource {
    fn describe(&self) -> String {
        format!("server {}", self.base_url)
    }

    fn fetch(&self, index: u32) -> Result<PuzzleSnapshot, LibraryError> {
        let url = self.url_for(index);
        let response = self.client.get(&url).send()?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LibraryError::NotFound { index });
        }
        if !status.is_success() {
            return Err(LibraryError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

// ============================================================================
// Library
// ============================================================================

/// What the library is showing.
pub enum LibraryView {
    /// Preset selection, with a message from the last failed load.
    Menu { message: Option<String> },
    /// A preset being played.
    Playing { index: u32, session: EditorSession },
}

/// Preset browser that owns at most one live puzzle.
pub struct Library {
    source: Box<dyn PresetSource>,
    settings: SessionSettings,
    view: LibraryView,
    /// Judge connection, parked here while no puzzle is open.
    sync: Option<SyncClient>,
}

impl Library {
    pub fn new(source: Box<dyn PresetSource>, sync: SyncClient, settings: SessionSettings) -> Self {
        log::info!("Preset library reading from {}", source.describe());
        Self {
            source,
            settings,
            view: LibraryView::Menu { message: None },
            sync: Some(sync),
        }
    }

    pub fn view(&self) -> &LibraryView {
        &self.view
    }

    /// Message shown on the menu, if any.
    pub fn message(&self) -> Option<&str> {
        match &self.view {
            LibraryView::Menu { message } => message.as_deref(),
            LibraryView::Playing { .. } => None,
        }
    }

    pub fn playing_index(&self) -> Option<u32> {
        match &self.view {
            LibraryView::Playing { index, .. } => Some(*index),
            LibraryView::Menu { .. } => None,
        }
    }

    pub fn session(&self) -> Option<&EditorSession> {
        match &self.view {
            LibraryView::Playing { session, .. } => Some(session),
            LibraryView::Menu { .. } => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut EditorSession> {
        match &mut self.view {
            LibraryView::Playing { session, .. } => Some(session),
            LibraryView::Menu { .. } => None,
        }
    }

    /// Discard the open puzzle, if any, and show the menu.
    pub fn back_to_menu(&mut self) {
        let previous = std::mem::replace(&mut self.view, LibraryView::Menu { message: None });
        if let LibraryView::Playing { index, session } = previous {
            log::info!("Leaving puzzle {}", index);
            self.sync = Some(session.into_sync());
        }
    }

    /// Close the library, returning its source and judge connection.
    pub fn into_parts(mut self) -> (Box<dyn PresetSource>, Option<SyncClient>) {
        self.back_to_menu();
        (self.source, self.sync)
    }

    /// Open a preset. On failure the menu is shown with a message and the
    /// error is returned.
    pub fn open(&mut self, index: u32) -> Result<(), LibraryError> {
        self.back_to_menu();

        let loaded = self
            .load(index)
            .and_then(|snapshot| self.start_session(snapshot));
        match loaded {
            Ok(session) => {
                log::info!("Opened puzzle {}", index);
                self.view = LibraryView::Playing { index, session };
                Ok(())
            }
            Err(e) => {
                log::warn!("Could not open puzzle {}: {}", index, e);
                let message = match e {
                    LibraryError::SyncUnavailable => e.to_string(),
                    _ => LibraryError::NotFound { index }.to_string(),
                };
                self.view = LibraryView::Menu {
                    message: Some(message),
                };
                Err(e)
            }
        }
    }

    fn load(&self, index: u32) -> Result<PuzzleSnapshot, LibraryError> {
        if index == 0 {
            return Err(LibraryError::NotFound { index });
        }
        self.source.fetch(index)
    }

    fn start_session(&mut self, snapshot: PuzzleSnapshot) -> Result<EditorSession, LibraryError> {
        // validate before handing over the judge connection
        let (grid, path) = snapshot.into_parts()?;
        let sync = self.sync.take().ok_or(LibraryError::SyncUnavailable)?;
        Ok(EditorSession::new(grid, path, sync, self.settings.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::DrawingPhase;
    use crate::model::{Grid, Node, Path};
    use crate::sync::MemoryJudge;
    use tempfile::TempDir;

    fn library_in(dir: &TempDir) -> Library {
        let sync = SyncClient::spawn(MemoryJudge::accepting()).unwrap();
        Library::new(
            Box::new(DirectorySource::new(dir.path())),
            sync,
            SessionSettings::default(),
        )
    }

    fn write_preset(dir: &TempDir, index: u32, snapshot: &PuzzleSnapshot) {
        let path = dir.path().join(format!("puzzle{}.json", index));
        std::fs::write(path, snapshot.to_json().unwrap()).unwrap();
    }

    #[test]
    fn test_sections() {
        assert_eq!(PresetSection::Color.indices(), 1..=10);
        assert_eq!(PresetSection::Star.indices(), 11..=20);
        assert_eq!(PresetSection::Not.indices(), 21..=30);
        assert_eq!(PresetSection::of(1), Some(PresetSection::Color));
        assert_eq!(PresetSection::of(20), Some(PresetSection::Star));
        assert_eq!(PresetSection::of(21), Some(PresetSection::Not));
        assert_eq!(PresetSection::of(0), None);
        assert_eq!(PresetSection::of(31), None);
    }

    #[test]
    fn test_open_preset() {
        let dir = TempDir::new().unwrap();
        let grid = Grid::new(3, 3).unwrap();
        let mut path = Path::seeded(grid.start());
        path.try_extend(Node::new(2, 0));
        write_preset(&dir, 12, &PuzzleSnapshot::capture(&grid, &path));

        let mut library = library_in(&dir);
        library.open(12).unwrap();
        assert_eq!(library.playing_index(), Some(12));

        let session = library.session().unwrap();
        assert_eq!(session.grid().width(), 3);
        assert_eq!(session.path().len(), 2);
        assert_eq!(session.phase(), DrawingPhase::Idle);
    }

    #[test]
    fn test_missing_preset_returns_to_menu() {
        let dir = TempDir::new().unwrap();
        let mut library = library_in(&dir);

        let err = library.open(7).unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { index: 7 }));
        assert_eq!(library.message(), Some("Puzzle 7 hasn't been added yet."));
        assert!(library.session().is_none());
    }

    #[test]
    fn test_malformed_preset_returns_to_menu() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("puzzle2.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("puzzle3.json"), r#"{"squares": []}"#).unwrap();
        let mut library = library_in(&dir);

        assert!(matches!(library.open(2), Err(LibraryError::Json(_))));
        assert_eq!(library.message(), Some("Puzzle 2 hasn't been added yet."));
        assert!(matches!(library.open(3), Err(LibraryError::Snapshot(_))));
        assert_eq!(library.message(), Some("Puzzle 3 hasn't been added yet."));
    }

    #[test]
    fn test_oversized_preset_returns_to_menu() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("puzzle5.json"),
            r#"{"width": 4294967295, "height": 4294967295}"#,
        )
        .unwrap();
        let mut library = library_in(&dir);

        assert!(matches!(library.open(5), Err(LibraryError::Snapshot(_))));
        assert_eq!(library.message(), Some("Puzzle 5 hasn't been added yet."));
        assert!(library.session().is_none());
    }

    #[test]
    fn test_switching_presets_reuses_connection() {
        let dir = TempDir::new().unwrap();
        let grid = Grid::new(2, 2).unwrap();
        write_preset(&dir, 1, &PuzzleSnapshot::capture(&grid, &Path::new()));
        write_preset(&dir, 2, &PuzzleSnapshot::capture(&grid, &Path::new()));
        let mut library = library_in(&dir);

        library.open(1).unwrap();
        library.open(2).unwrap();
        assert_eq!(library.playing_index(), Some(2));

        library.back_to_menu();
        assert!(library.session().is_none());
        assert_eq!(library.message(), None);

        // a failed open after a successful one still leaves a usable library
        assert!(library.open(9).is_err());
        library.open(1).unwrap();
        assert_eq!(library.playing_index(), Some(1));
    }

    #[test]
    fn test_index_zero_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut library = library_in(&dir);
        assert!(matches!(
            library.open(0),
            Err(LibraryError::NotFound { index: 0 })
        ));
    }

    #[test]
    fn test_http_source_url() {
        let source = HttpSource::new("http://localhost:3000/").unwrap();
        assert_eq!(
            source.url_for(4),
            "http://localhost:3000/tutorial/puzzle4.json"
        );
    }
}
