//! Opponent boards.
//!
//! Boards are kept for every user who sends one. Only a few are shown: the
//! first [`MAX_PEER_BOARDS`] users of the roster that are neither us nor dead.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use tetrecs_core::Grid;

use crate::types::{CellValue, MAX_PEER_BOARDS};

#[derive(Debug, Clone)]
pub struct PeerBoards {
    cols: usize,
    rows: usize,
    me: Option<String>,
    roster: Vec<String>,
    boards: HashMap<String, Grid>,
    visible: Vec<String>,
}

impl PeerBoards {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            me: None,
            roster: Vec::new(),
            boards: HashMap::new(),
            visible: Vec::new(),
        }
    }

    pub fn set_self(&mut self, name: Option<String>) {
        self.me = name;
    }

    pub fn set_roster(&mut self, users: Vec<String>) {
        self.roster = users;
    }

    /// Carry `old`'s stored board over to `new`
    pub fn rename_user(&mut self, old: &str, new: &str) {
        if let Some(grid) = self.boards.remove(old) {
            self.boards.insert(new.to_string(), grid);
        }
    }

    /// Recompute which boards are shown
    pub fn relayout(&mut self, dead: &HashSet<String>) {
        let me = self.me.as_deref();
        self.visible = self
            .roster
            .iter()
            .filter(|u| Some(u.as_str()) != me && !dead.contains(*u))
            .take(MAX_PEER_BOARDS)
            .cloned()
            .collect();
        debug!("Showing peer boards for {:?}", self.visible);
    }

    /// Store `user`'s board; returns true if it is on screen
    ///
    /// Boards of the wrong size are dropped.
    pub fn apply_board(&mut self, user: &str, cells: &[CellValue]) -> bool {
        let Some(grid) = Grid::from_cells(self.cols, self.rows, cells) else {
            warn!(
                "Dropping board from {} with {} cells, expected {}",
                user,
                cells.len(),
                self.cols * self.rows
            );
            return false;
        };
        self.boards.insert(user.to_string(), grid);
        self.is_visible(user)
    }

    pub fn is_visible(&self, user: &str) -> bool {
        self.visible.iter().any(|v| v == user)
    }

    /// Shown users in display order
    pub fn visible(&self) -> &[String] {
        &self.visible
    }

    /// Last board received from `user`
    pub fn board(&self, user: &str) -> Option<&Grid> {
        self.boards.get(user)
    }

    /// Shown boards in display order; users with no board yet get an empty grid
    pub fn visible_boards(&self) -> Vec<(String, Grid)> {
        self.visible
            .iter()
            .map(|u| {
                let grid = self
                    .boards
                    .get(u)
                    .cloned()
                    .unwrap_or_else(|| Grid::new(self.cols, self.rows));
                (u.clone(), grid)
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.roster.clear();
        self.boards.clear();
        self.visible.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_layout_skips_self_and_dead() {
        let mut peers = PeerBoards::new(5, 5);
        peers.set_self(Some("me".to_string()));
        peers.set_roster(roster(&["a", "me", "b", "c", "d"]));

        let mut dead = HashSet::new();
        peers.relayout(&dead);
        assert_eq!(peers.visible(), &["a", "b", "c"]);

        dead.insert("b".to_string());
        peers.relayout(&dead);
        assert_eq!(peers.visible(), &["a", "c", "d"]);
    }

    #[test]
    fn test_apply_board_by_username() {
        let mut peers = PeerBoards::new(2, 2);
        peers.set_roster(roster(&["a", "b", "c", "d"]));
        peers.relayout(&HashSet::new());

        assert!(peers.apply_board("a", &[1, 0, 0, 2]));
        assert!(!peers.apply_board("d", &[0, 0, 0, 3]));
        assert!(!peers.apply_board("a", &[1, 2, 3]));

        assert_eq!(peers.board("a").map(|g| g.get(1, 1)), Some(2));
        assert_eq!(peers.board("d").map(|g| g.get(1, 1)), Some(3));
        assert_eq!(peers.visible_boards()[1].1.filled_count(), 0);
    }

    #[test]
    fn test_renamed_user_keeps_board() {
        let mut peers = PeerBoards::new(2, 2);
        peers.set_roster(roster(&["bob"]));
        peers.relayout(&HashSet::new());
        peers.apply_board("bob", &[4, 0, 0, 0]);

        peers.rename_user("bob", "robert");
        peers.set_roster(roster(&["robert"]));
        peers.relayout(&HashSet::new());

        assert_eq!(peers.visible(), &["robert"]);
        assert!(peers.board("bob").is_none());
        assert_eq!(peers.board("robert").map(|g| g.get(0, 0)), Some(4));
    }
}
