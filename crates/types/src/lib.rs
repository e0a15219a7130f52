//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the game.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (core logic, timer engine, network session, CLI).
//!
//! # Grid Dimensions
//!
//! The playfield is a square grid that pieces are placed onto directly (there is
//! no gravity). A row or a column that becomes completely filled is cleared.
//!
//! - **Columns**: 5 (indexed 0-4)
//! - **Rows**: 5 (indexed 0-4)
//!
//! # Countdown Timer
//!
//! Every placement restarts a countdown. When it expires the player loses a life.
//!
//! | Level | Delay |
//! |-------|-------|
//! | 0 | 12000ms |
//! | 1 | 11500ms |
//! | n | `max(2500, 12000 - 500 * n)` |
//! | 19+ | 2500ms |
//!
//! # Examples
//!
//! ```
//! use tetrecs_types::{GameAction, Phase, GRID_COLS, GRID_ROWS};
//!
//! let action = GameAction::from_str("rotate 3").unwrap();
//! assert_eq!(action, GameAction::Rotate(3));
//!
//! assert_eq!(Phase::default(), Phase::Initializing);
//! assert_eq!(GRID_COLS, 5);
//! assert_eq!(GRID_ROWS, 5);
//! ```

/// Grid width in cells
pub const GRID_COLS: usize = 5;
/// Grid height in cells
pub const GRID_ROWS: usize = 5;

/// Side length of the square mask every piece is drawn in
pub const PIECE_SIZE: usize = 3;
/// Number of shapes in the piece catalogue
pub const PIECE_COUNT: u8 = 15;

/// Empty cell value
pub const EMPTY: CellValue = 0;
/// Value reported for coordinates outside the grid
pub const OUT_OF_BOUNDS: CellValue = -1;
/// Highest colour index a cell can hold
pub const MAX_CELL_VALUE: CellValue = 15;

/// Lives at the start of a game
pub const STARTING_LIVES: u32 = 3;
/// Points needed per level
pub const POINTS_PER_LEVEL: u32 = 1000;
/// Points per cleared block before line count and multiplier are applied
pub const POINTS_PER_BLOCK: u32 = 10;

/// Countdown timing (milliseconds)
pub const BASE_TIMER_MS: u64 = 12000;
pub const TIMER_STEP_MS: u64 = 500;
pub const MIN_TIMER_MS: u64 = 2500;

/// Multiplayer piece queue: ids that must be queued before one is handed out
pub const QUEUE_LOW_WATER: usize = 2;
/// Multiplayer piece queue: ids requested per refill
pub const REFILL_BATCH: usize = 4;
/// Multiplayer piece queue: ids requested when a game is created
pub const INITIAL_PIECE_REQUEST: usize = 6;

/// Opponent boards shown at once
pub const MAX_PEER_BOARDS: usize = 3;
/// Leaderboard rows shown at once
pub const LEADERBOARD_ROWS: usize = 5;
/// Entries kept in a high-score table
pub const HIGH_SCORE_ENTRIES: usize = 10;

/// Value stored in one grid cell (`0` empty, `1..=15` colour index)
pub type CellValue = i32;

/// Lifecycle phase of a single game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Initializing,
    Running,
    GameOver,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Initializing => "initializing",
            Phase::Running => "running",
            Phase::GameOver => "gameOver",
        }
    }
}

/// Side effects a game transition asks the presentation layer to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    Placed,
    Rejected,
    Rotated,
    Swapped,
    LinesCleared { lines: u32, blocks: u32 },
    LevelUp { level: u32 },
    LifeLost { lives: u32 },
    GameOver,
}

impl Effect {
    /// Audio cue associated with the effect
    pub fn cue(&self) -> &'static str {
        match self {
            Effect::Placed => "place.wav",
            Effect::Rejected => "fail.wav",
            Effect::Rotated | Effect::Swapped => "rotate.wav",
            Effect::LinesCleared { .. } => "clear.wav",
            Effect::LevelUp { .. } => "level.wav",
            Effect::LifeLost { .. } => "lifelose.wav",
            Effect::GameOver => "transition.wav",
        }
    }
}

/// Player actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    Place { x: i32, y: i32 },
    Rotate(u32),
    Swap,
    Quit,
}

impl GameAction {
    /// Parse an action from a console command line
    ///
    /// Accepted forms: `place <x> <y>`, `rotate [n]`, `left`, `right`, `swap`, `quit`.
    pub fn from_str(s: &str) -> Option<Self> {
        let mut parts = s.split_whitespace();
        let keyword = parts.next()?.to_lowercase();
        let action = match keyword.as_str() {
            "place" | "p" => {
                let x = parts.next()?.parse().ok()?;
                let y = parts.next()?.parse().ok()?;
                GameAction::Place { x, y }
            }
            "rotate" | "r" => match parts.next() {
                Some(n) => GameAction::Rotate(n.parse().ok()?),
                None => GameAction::Rotate(1),
            },
            "right" => GameAction::Rotate(1),
            "left" => GameAction::Rotate(3),
            "swap" | "s" => GameAction::Swap,
            "quit" | "q" | "escape" => GameAction::Quit,
            _ => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(action)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::Place { .. } => "place",
            GameAction::Rotate(_) => "rotate",
            GameAction::Swap => "swap",
            GameAction::Quit => "quit",
        }
    }
}

/// A `name:score` record, as stored locally and exchanged with the server
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u32,
}

impl ScoreEntry {
    pub fn new(name: impl Into<String>, score: u32) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }

    /// Parse `name:score`; fields after the score are ignored
    pub fn parse(record: &str) -> Option<Self> {
        let mut fields = record.trim().split(':');
        let name = fields.next()?.trim();
        let score = fields.next()?.trim().parse().ok()?;
        if name.is_empty() {
            return None;
        }
        Some(Self::new(name, score))
    }
}

impl std::fmt::Display for ScoreEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.score)
    }
}
