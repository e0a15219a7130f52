//! RNG module - uniform random piece selection for solo play
//!
//! Solo games draw each piece id uniformly from the 15-entry catalogue.
//! Multiplayer games never use this: their order comes from the server.
//!
//! Uses a simple LCG so a seed reproduces a game exactly in tests.

use crate::game_state::{PieceSource, SourceError};
use crate::pieces::Piece;
use crate::types::PIECE_COUNT;

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Seed from the wall clock
    pub fn from_time() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
            .unwrap_or(1);
        Self::new(nanos)
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        // High bits of an LCG are far better distributed than the low ones.
        (self.next_u32() >> 16) % max.max(1)
    }

    /// Current internal state (for replaying a game)
    pub fn seed(&self) -> u32 {
        self.state
    }
}

/// Solo piece stream: uniform over the catalogue
#[derive(Debug, Clone)]
pub struct RandomPieces {
    rng: SimpleRng,
}

impl RandomPieces {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: SimpleRng::new(seed),
        }
    }

    pub fn from_time() -> Self {
        Self {
            rng: SimpleRng::from_time(),
        }
    }

    pub fn next_id(&mut self) -> u8 {
        self.rng.next_range(PIECE_COUNT as u32) as u8
    }
}

impl PieceSource for RandomPieces {
    fn next_piece(&mut self) -> Result<Piece, SourceError> {
        let id = self.next_id();
        Piece::new(id).ok_or(SourceError::UnknownPiece(id))
    }
}

/// Fixed piece order, mainly for tests and replays
#[derive(Debug, Clone)]
pub struct ScriptedPieces {
    ids: Vec<u8>,
    next: usize,
}

impl ScriptedPieces {
    /// Hand out `ids` in order, wrapping around at the end
    pub fn new(ids: impl Into<Vec<u8>>) -> Self {
        Self {
            ids: ids.into(),
            next: 0,
        }
    }
}

impl PieceSource for ScriptedPieces {
    fn next_piece(&mut self) -> Result<Piece, SourceError> {
        if self.ids.is_empty() {
            return Err(SourceError::Exhausted);
        }
        let id = self.ids[self.next % self.ids.len()];
        self.next += 1;
        Piece::new(id).ok_or(SourceError::UnknownPiece(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_deterministic() {
        let mut rng1 = SimpleRng::new(12345);
        let mut rng2 = SimpleRng::new(12345);

        // Same seed should produce same sequence
        for _ in 0..100 {
            assert_eq!(rng1.next_u32(), rng2.next_u32());
        }
    }

    #[test]
    fn test_rng_different_seeds() {
        let mut rng1 = SimpleRng::new(12345);
        let mut rng2 = SimpleRng::new(54321);

        let v1 = rng1.next_u32();
        let v2 = rng2.next_u32();
        assert_ne!(v1, v2);
    }

    #[test]
    fn test_random_pieces_cover_catalogue() {
        let mut pieces = RandomPieces::new(7);
        let mut seen = [false; PIECE_COUNT as usize];
        for _ in 0..2000 {
            let id = pieces.next_id();
            assert!(id < PIECE_COUNT);
            seen[id as usize] = true;
        }
        assert!(seen.iter().all(|&s| s), "some ids never drawn: {:?}", seen);
    }

    #[test]
    fn test_scripted_pieces_wrap() {
        let mut pieces = ScriptedPieces::new(vec![3, 4]);
        let ids: Vec<u8> = (0..5).map(|_| pieces.next_piece().unwrap().id()).collect();
        assert_eq!(ids, vec![3, 4, 3, 4, 3]);
    }

    #[test]
    fn test_scripted_pieces_empty_is_exhausted() {
        let mut pieces = ScriptedPieces::new(Vec::new());
        assert_eq!(pieces.next_piece(), Err(SourceError::Exhausted));
    }
}
