use serde::Serialize;

use crate::game_state::Game;
use crate::pieces::{Mask, Piece};
use crate::types::CellValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PieceSnapshot {
    pub id: u8,
    pub name: &'static str,
    pub mask: Mask,
}

impl From<Piece> for PieceSnapshot {
    fn from(value: Piece) -> Self {
        Self {
            id: value.id(),
            name: value.name(),
            mask: *value.mask(),
        }
    }
}

/// Read-only copy of everything the presentation layer draws
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSnapshot {
    pub cols: usize,
    pub rows: usize,
    /// Row-major cell values
    pub board: Vec<CellValue>,
    pub current: Option<PieceSnapshot>,
    pub next: Option<PieceSnapshot>,
    pub score: u32,
    pub level: u32,
    pub lives: u32,
    pub multiplier: u32,
    pub high_score: u32,
    pub lines: u32,
    pub phase: &'static str,
    pub timer_ms: u64,
}

impl GameSnapshot {
    pub fn from_game(game: &Game) -> Self {
        Self {
            cols: game.grid().cols(),
            rows: game.grid().rows(),
            board: game.grid().cells().to_vec(),
            current: game.current_piece().map(PieceSnapshot::from),
            next: game.next_piece().map(PieceSnapshot::from),
            score: game.score(),
            level: game.level(),
            lives: game.lives(),
            multiplier: game.multiplier(),
            high_score: game.high_score(),
            lines: game.lines(),
            phase: game.phase().as_str(),
            timer_ms: game.timer_delay().as_millis() as u64,
        }
    }

    pub fn playable(&self) -> bool {
        self.phase == "running"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedPieces;

    #[test]
    fn snapshot_serializes_to_json() {
        let mut game = Game::new(3, 3, ScriptedPieces::new(vec![3, 9]));
        game.start();
        let snap = game.snapshot();
        assert!(snap.playable());

        let v = serde_json::to_value(&snap).unwrap();
        assert_eq!(v["cols"], 3);
        assert_eq!(v["board"].as_array().unwrap().len(), 9);
        assert_eq!(v["current"]["name"], "Dot");
        assert_eq!(v["next"]["name"], "T");
        assert_eq!(v["lives"], 3);
        assert_eq!(v["timer_ms"], 12000);
        assert_eq!(v["phase"], "running");
    }
}
