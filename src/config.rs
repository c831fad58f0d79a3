//! Configuration file support.
//!
//! Settings are stored as a pretty-printed JSON document. Every section and
//! field has a default, so partial files load cleanly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::editor::{AnnotationPalette, AnnotationPolicy};
use crate::keybindings::KeyBindings;
use crate::session::SessionSettings;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Get all log levels in order from least to most verbose.
    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ]
    }

    /// Parse a level name, ignoring case.
    pub fn from_name(name: &str) -> Option<LogLevel> {
        Self::all()
            .iter()
            .copied()
            .find(|level| level.name().eq_ignore_ascii_case(name))
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Application name (for identification)
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// User preferences
    #[serde(default)]
    pub preferences: UserPreferences,

    /// Keybinding configuration
    #[serde(default)]
    pub keybindings: KeyBindings,

    /// Annotation colour cycles
    #[serde(default)]
    pub palette: AnnotationPalette,
}

fn default_app_name() -> String {
    "pathgrid".to_string()
}

/// User preferences section of the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Base URL of the judge (`/save` and `/load`)
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Base URL serving `tutorial/puzzle{N}.json`; presets are read from
    /// `preset_dir` when unset
    #[serde(default)]
    pub preset_url: Option<String>,

    /// Directory holding `puzzle{N}.json` files
    #[serde(default = "default_preset_dir")]
    pub preset_dir: PathBuf,

    /// Milliseconds between feedback frames
    #[serde(default = "default_feedback_tick_ms")]
    pub feedback_tick_ms: u64,

    /// When cell edits are accepted
    #[serde(default)]
    pub annotation_policy: AnnotationPolicy,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Width of a new freeform grid
    #[serde(default = "default_dimension")]
    pub width: u32,

    /// Height of a new freeform grid
    #[serde(default = "default_dimension")]
    pub height: u32,
}

fn default_server_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_preset_dir() -> PathBuf {
    PathBuf::from("tutorial")
}

fn default_feedback_tick_ms() -> u64 {
    200
}

fn default_dimension() -> u32 {
    4
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            preset_url: None,
            preset_dir: default_preset_dir(),
            feedback_tick_ms: default_feedback_tick_ms(),
            annotation_policy: AnnotationPolicy::default(),
            log_level: LogLevel::default(),
            width: default_dimension(),
            height: default_dimension(),
        }
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            app_name: default_app_name(),
            preferences: UserPreferences::default(),
            keybindings: KeyBindings::default(),
            palette: AnnotationPalette::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        if let Some((key, command, other)) = config.keybindings.first_duplicate() {
            log::warn!(
                "Key '{}' for '{}' is also bound to '{}'",
                key,
                command.description(),
                other
            );
        }

        Ok(config)
    }

    /// Session settings derived from this configuration.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            palette: self.palette.clone(),
            policy: self.preferences.annotation_policy,
            keybindings: self.keybindings.clone(),
            feedback_tick: Some(Duration::from_millis(self.preferences.feedback_tick_ms)),
        }
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "pathgrid-config.json"
    }

    /// Get the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("pathgrid").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("pathgrid")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from a file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load_from_path(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to a file, creating parent directories as needed.
    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Save configuration to the default path.
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save_to_path(&path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditMode;
    use crate::keybindings::EditorCommand;
    use crate::model::ColorTag;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.preferences.server_url, "http://127.0.0.1:5000");
        assert_eq!(config.preferences.preset_dir, PathBuf::from("tutorial"));
        assert_eq!(config.preferences.feedback_tick_ms, 200);
        assert_eq!(
            config.preferences.annotation_policy,
            AnnotationPolicy::NotWhileAwaitingVerdict
        );
        assert_eq!((config.preferences.width, config.preferences.height), (4, 4));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let json = r#"{
            "version": 1,
            "preferences": { "log_level": "debug", "annotation_policy": "idle_only" },
            "keybindings": { "undo_last": "u" },
            "palette": { "colors": ["grey", "red"] }
        }"#;
        let config = AppConfig::from_json(json).unwrap();
        assert_eq!(config.app_name, "pathgrid");
        assert_eq!(config.preferences.log_level, LogLevel::Debug);
        assert_eq!(config.preferences.annotation_policy, AnnotationPolicy::IdleOnly);
        assert_eq!(config.preferences.server_url, "http://127.0.0.1:5000");
        assert_eq!(
            config.keybindings.command_for_key('u'),
            Some(EditorCommand::UndoLast)
        );
        assert_eq!(
            config.keybindings.command_for_key('s'),
            Some(EditorCommand::SetMode(EditMode::Star))
        );
        assert_eq!(config.palette.colors, vec![ColorTag::Grey, ColorTag::Red]);
        assert_eq!(config.palette.stars.len(), 4);
    }

    #[test]
    fn test_version_too_new() {
        let json = format!(r#"{{"version": {}}}"#, CONFIG_VERSION + 1);
        assert!(matches!(
            AppConfig::from_json(&json),
            Err(ConfigError::VersionTooNew { .. })
        ));
    }

    #[test]
    fn test_clashing_keybindings_still_load() {
        let json = r#"{ "version": 1, "keybindings": { "clear_path": "Z" } }"#;
        let config = AppConfig::from_json(json).unwrap();
        let (key, command, other) = config.keybindings.first_duplicate().unwrap();
        assert_eq!(key, 'Z');
        assert_eq!(command, EditorCommand::ClearPath);
        assert_eq!(other, "Undo last node");
        assert_eq!(
            config.keybindings.command_for_key('z'),
            Some(EditorCommand::ClearPath)
        );
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(AppConfig::default_filename());

        let mut config = AppConfig::default();
        config.preferences.preset_url = Some("http://localhost:3000".to_string());
        config.preferences.feedback_tick_ms = 50;
        config.save_to_path(&path).unwrap();

        let loaded = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(
            loaded.session_settings().feedback_tick,
            Some(Duration::from_millis(50))
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            AppConfig::load_from_path(&dir.path().join("absent.json")),
            Err(ConfigError::IoError(_))
        ));
    }

    #[test]
    fn test_log_level_names() {
        assert_eq!(LogLevel::from_name("WARN"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_name("verbose"), None);
        assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
    }
}
