//! Player settings: one line holding the mute flag.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settings {
    pub muted: bool,
}

impl Settings {
    pub fn parse(path: &Path, text: &str) -> Result<Self, StoreError> {
        let first = text.lines().next().unwrap_or("").trim();
        let muted = first.parse::<bool>().map_err(|_| StoreError::Malformed {
            path: path.to_path_buf(),
            line: 1,
            text: first.to_string(),
        })?;
        Ok(Self { muted })
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let text = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        Self::parse(path, &text)
    }

    /// Load settings, falling back to sound on
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) if e.is_not_found() => {
                info!("No settings file at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("Could not load settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        fs::write(path, format!("{}\n", self.muted)).map_err(|e| StoreError::io(path, e))
    }
}
