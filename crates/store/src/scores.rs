//! Local high-score table.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::error::StoreError;
use crate::types::{ScoreEntry, HIGH_SCORE_ENTRIES};

/// Up to ten scores, highest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreTable {
    entries: Vec<ScoreEntry>,
}

impl Default for ScoreTable {
    /// The table shipped with the game: ten entries from 10000 down to 1000
    fn default() -> Self {
        let entries = (1..=HIGH_SCORE_ENTRIES as u32)
            .rev()
            .map(|i| ScoreEntry::new("Oli", i * 1000))
            .collect();
        Self { entries }
    }
}

impl ScoreTable {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a table from arbitrary entries, sorting and capping them
    pub fn from_entries(entries: impl IntoIterator<Item = ScoreEntry>) -> Self {
        let mut entries: Vec<_> = entries.into_iter().collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(HIGH_SCORE_ENTRIES);
        Self { entries }
    }

    /// Parse `name:score` lines; blank lines are skipped
    pub fn parse(path: &Path, text: &str) -> Result<Self, StoreError> {
        let mut entries = Vec::new();
        for (i, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry = ScoreEntry::parse(line).ok_or_else(|| StoreError::Malformed {
                path: path.to_path_buf(),
                line: i + 1,
                text: line.to_string(),
            })?;
            entries.push(entry);
        }
        Ok(Self::from_entries(entries))
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let text = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        Self::parse(path, &text)
    }

    /// Load the table, falling back to the default one
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(table) => table,
            Err(e) if e.is_not_found() => {
                info!("No score file at {}, using default scores", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("Could not load scores: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        fs::write(path, self.to_text()).map_err(|e| StoreError::io(path, e))
    }

    pub fn to_text(&self) -> String {
        self.entries.iter().map(|e| format!("{}\n", e)).collect()
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest stored score, 0 for an empty table
    pub fn top_score(&self) -> u32 {
        self.entries.first().map(|e| e.score).unwrap_or(0)
    }

    /// Would `score` earn a place in the table
    pub fn qualifies(&self, score: u32) -> bool {
        self.entries.len() < HIGH_SCORE_ENTRIES || self.entries.iter().any(|e| score > e.score)
    }

    /// Insert a score in rank order; returns its position, or None if it fell off the end
    pub fn insert(&mut self, name: &str, score: u32) -> Option<usize> {
        let at = self
            .entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len());
        if at >= HIGH_SCORE_ENTRIES {
            return None;
        }
        self.entries.insert(at, ScoreEntry::new(name, score));
        self.entries.truncate(HIGH_SCORE_ENTRIES);
        Some(at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("tetrecs-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_default_table() {
        let table = ScoreTable::default();
        assert_eq!(table.len(), 10);
        assert_eq!(table.entries()[0], ScoreEntry::new("Oli", 10000));
        assert_eq!(table.entries()[9], ScoreEntry::new("Oli", 1000));
        assert_eq!(table.top_score(), 10000);
    }

    #[test]
    fn test_insert_keeps_order_and_cap() {
        let mut table = ScoreTable::default();
        assert!(!table.qualifies(1000));
        assert!(table.qualifies(1001));

        assert_eq!(table.insert("ann", 5500), Some(5));
        assert_eq!(table.len(), 10);
        assert_eq!(table.entries()[5], ScoreEntry::new("ann", 5500));
        assert_eq!(table.entries()[9].score, 2000);

        assert_eq!(table.insert("bob", 10), None);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = temp_path("missing-scores.txt");
        let _ = fs::remove_file(&path);
        assert_eq!(ScoreTable::load_or_default(&path), ScoreTable::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("scores.txt");
        let mut table = ScoreTable::empty();
        table.insert("bob", 20);
        table.insert("ann", 300);
        table.save(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "ann:300\nbob:20\n");
        assert_eq!(ScoreTable::load(&path).unwrap(), table);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_malformed_line_is_reported() {
        let err = ScoreTable::parse(Path::new("scores.txt"), "ann:1\nbroken\n").unwrap_err();
        assert!(matches!(err, StoreError::Malformed { line: 2, .. }));
    }
}
