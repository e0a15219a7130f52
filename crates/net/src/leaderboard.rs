//! Session leaderboard, a projection of what the server pushes.

use std::collections::HashSet;

use crate::protocol::ScoreEntry;
use crate::types::LEADERBOARD_ROWS;

/// One displayed leaderboard row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub name: String,
    pub score: u32,
    pub dead: bool,
}

/// Ranked scores plus the set of players who have died
#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    entries: Vec<ScoreEntry>,
    dead: HashSet<String>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every entry with a fresh snapshot
    ///
    /// A name listed twice keeps its last score.
    pub fn replace_all(&mut self, entries: impl IntoIterator<Item = ScoreEntry>) {
        self.entries.clear();
        for entry in entries {
            self.upsert(entry);
        }
        self.sort();
    }

    fn upsert(&mut self, entry: ScoreEntry) {
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => existing.score = entry.score,
            None => self.entries.push(entry),
        }
    }

    fn sort(&mut self) {
        // Stable, so equal scores keep arrival order
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
    }

    /// All entries, highest score first
    pub fn ranked(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// The rows shown on screen
    pub fn top(&self) -> Vec<LeaderboardRow> {
        self.entries
            .iter()
            .take(LEADERBOARD_ROWS)
            .map(|e| LeaderboardRow {
                name: e.name.clone(),
                score: e.score,
                dead: self.dead.contains(&e.name),
            })
            .collect()
    }

    /// Returns false if the player was already dead
    pub fn mark_dead(&mut self, name: &str) -> bool {
        self.dead.insert(name.to_string())
    }

    pub fn is_dead(&self, name: &str) -> bool {
        self.dead.contains(name)
    }

    pub fn dead_players(&self) -> &HashSet<String> {
        &self.dead
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.dead.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_is_sorted_descending() {
        let mut board = Leaderboard::new();
        board.replace_all(vec![
            ScoreEntry::new("a", 10),
            ScoreEntry::new("b", 300),
            ScoreEntry::new("c", 40),
        ]);
        let names: Vec<_> = board.ranked().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_duplicate_name_last_value_wins() {
        let mut board = Leaderboard::new();
        board.replace_all(vec![ScoreEntry::new("a", 500), ScoreEntry::new("a", 20)]);
        assert_eq!(board.ranked(), &[ScoreEntry::new("a", 20)]);
    }

    #[test]
    fn test_top_rows_flag_dead_players() {
        let mut board = Leaderboard::new();
        board.replace_all((0..8).map(|i| ScoreEntry::new(format!("p{}", i), i * 10)));
        assert!(board.mark_dead("p7"));
        assert!(!board.mark_dead("p7"));

        let top = board.top();
        assert_eq!(top.len(), LEADERBOARD_ROWS);
        assert_eq!(top[0].name, "p7");
        assert!(top[0].dead);
        assert!(!top[1].dead);
    }
}
