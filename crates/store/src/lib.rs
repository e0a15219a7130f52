//! Local persistence
//!
//! Two small text files, both optional:
//!
//! - [`scores`]: the local high-score table, one `name:score` per line
//! - [`settings`]: a single line holding the mute flag
//!
//! A missing file is not an error; built-in defaults are used instead.

use std::path::PathBuf;

pub mod error;
pub mod scores;
pub mod settings;

pub use tetrecs_types as types;

pub use error::StoreError;
pub use scores::ScoreTable;
pub use settings::Settings;

/// Where the files live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub scores_path: PathBuf,
    pub settings_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            scores_path: PathBuf::from("scores.txt"),
            settings_path: PathBuf::from("settings.txt"),
        }
    }
}

impl StoreConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            scores_path: std::env::var_os("TETRECS_SCORES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.scores_path),
            settings_path: std::env::var_os("TETRECS_SETTINGS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.settings_path),
        }
    }
}
