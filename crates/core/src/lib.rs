//! Core game logic module - pure, deterministic, and testable
//!
//! This module contains all the game rules and state management.
//! It has **zero dependencies** on threads, networking, or I/O, making it:
//!
//! - **Deterministic**: a scripted piece stream reproduces a game exactly
//! - **Testable**: every rule is a plain method call
//! - **Portable**: the same [`Game`] backs solo and multiplayer play
//!
//! # Module Structure
//!
//! - [`grid`]: `cols x rows` cell matrix, placement checks and the line-clear pass
//! - [`pieces`]: the 15-shape catalogue and quarter-turn rotation
//! - [`rng`]: uniform random and scripted piece streams
//! - [`scoring`]: points, levels and the countdown curve
//! - [`game_state`]: the [`Game`] state machine and its capability traits
//! - [`snapshot`]: serializable read-only copy of a game
//!
//! # Game Rules
//!
//! - Pieces are placed anywhere on the grid by clicking the cell their 3x3 mask
//!   is centred on; a placement fails if any filled mask cell lands on an
//!   occupied or out-of-range cell.
//! - After each placement every full row **and** full column is cleared at once.
//! - Clearing scores `lines * blocks * 10 * multiplier`; the multiplier grows by
//!   one per clearing placement and resets to 1 on a placement that clears nothing.
//! - A countdown restarts on every placement; when it expires a life is lost.
//!   With no lives left the next expiry ends the game.
//!
//! # Example
//!
//! ```
//! use tetrecs_core::{Game, Placement, ScriptedPieces};
//!
//! // Dot pieces only
//! let mut game = Game::new(5, 5, ScriptedPieces::new(vec![3]));
//! game.start();
//!
//! for x in 0..5 {
//!     assert!(game.place_block(x, 0).is_placed());
//! }
//!
//! // The fifth dot completed row 0
//! assert_eq!(game.score(), 50);
//! assert_eq!(game.multiplier(), 2);
//! assert_eq!(game.place_block(0, 0).is_placed(), true);
//! assert_eq!(game.place_block(0, 0), Placement::Rejected);
//! ```

pub mod game_state;
pub mod grid;
pub mod pieces;
pub mod rng;
pub mod scoring;
pub mod snapshot;

pub use tetrecs_types as types;

// Re-export commonly used types for convenience
pub use game_state::{Expiry, Game, NetworkSync, PieceSource, Placement, SourceError};
pub use grid::{Grid, LineClear};
pub use pieces::{rotate_cw, Mask, Piece};
pub use rng::{RandomPieces, ScriptedPieces, SimpleRng};
pub use scoring::{level_for_score, line_clear_points, timer_delay, timer_delay_ms};
pub use snapshot::{GameSnapshot, PieceSnapshot};
