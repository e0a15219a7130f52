//! Game state module - the single-game state machine
//!
//! This module ties together the grid, the piece stream and scoring.
//! It owns no timer and no thread: the countdown is driven from outside by
//! calling [`Game::game_loop`] when it expires, and [`Game::timer_delay`]
//! tells the driver how long to wait. Multiplayer behaviour is injected through
//! the [`PieceSource`] and [`NetworkSync`] capabilities instead of a subtype.

use tracing::{debug, info, warn};

use crate::grid::{Grid, LineClear};
use crate::pieces::Piece;
use crate::scoring::{level_for_score, line_clear_points, timer_delay};
use crate::snapshot::GameSnapshot;
use crate::types::{Effect, Phase, STARTING_LIVES};

/// Why a piece stream could not produce a piece
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceError {
    /// A scripted stream ran dry
    Exhausted,
    /// The id is not in the catalogue
    UnknownPiece(u8),
    /// The server did not refill the queue in time
    Starved,
    /// The session was closed while waiting
    Closed,
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Exhausted => write!(f, "piece stream exhausted"),
            SourceError::UnknownPiece(id) => write!(f, "unknown piece id {}", id),
            SourceError::Starved => write!(f, "piece queue was not refilled in time"),
            SourceError::Closed => write!(f, "piece queue closed"),
        }
    }
}

impl std::error::Error for SourceError {}

/// Where new pieces come from
///
/// Solo play draws at random; multiplayer blocks on the server-fed queue.
pub trait PieceSource: Send {
    fn next_piece(&mut self) -> Result<Piece, SourceError>;
}

/// Outbound state announcements, present only in multiplayer
pub trait NetworkSync: Send {
    /// Called after every successful placement
    fn board_changed(&mut self, grid: &Grid);
    /// Called whenever the score value changes
    fn score_changed(&mut self, score: u32);
    /// Called whenever the lives value changes
    fn lives_changed(&mut self, lives: u32);
    /// Called once when the game ends
    fn died(&mut self);
}

/// Outcome of [`Game::place_block`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// The piece was written to the grid; `cleared` is empty when no line completed
    Placed { cleared: LineClear, points: u32 },
    /// Collision or out of bounds; nothing changed
    Rejected,
    /// The game is not running
    Ignored,
}

impl Placement {
    pub fn is_placed(&self) -> bool {
        matches!(self, Placement::Placed { .. })
    }
}

/// Outcome of [`Game::game_loop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    LifeLost { lives: u32 },
    GameOver,
    /// The game had already ended
    Ignored,
}

/// Complete game state
pub struct Game {
    grid: Grid,
    current: Option<Piece>,
    next: Option<Piece>,
    score: u32,
    level: u32,
    lives: u32,
    multiplier: u32,
    high_score: u32,
    lines: u32,
    phase: Phase,
    source: Box<dyn PieceSource>,
    sync: Option<Box<dyn NetworkSync>>,
    effects: Vec<Effect>,
}

impl Game {
    /// Create a new game on an empty `cols x rows` grid
    pub fn new(cols: usize, rows: usize, source: impl PieceSource + 'static) -> Self {
        Self {
            grid: Grid::new(cols, rows),
            current: None,
            next: None,
            score: 0,
            level: 0,
            lives: STARTING_LIVES,
            multiplier: 1,
            high_score: 0,
            lines: 0,
            phase: Phase::Initializing,
            source: Box::new(source),
            sync: None,
            effects: Vec::new(),
        }
    }

    /// Attach the multiplayer announcer
    pub fn with_sync(mut self, sync: impl NetworkSync + 'static) -> Self {
        self.sync = Some(Box::new(sync));
        self
    }

    /// Set the high-score baseline loaded from storage
    pub fn with_high_score(mut self, high_score: u32) -> Self {
        self.high_score = high_score;
        self
    }

    /// Start the game and spawn the current and next pieces
    ///
    /// Does nothing unless the game is still initializing.
    pub fn start(&mut self) {
        if self.phase != Phase::Initializing {
            return;
        }
        info!("Starting game on a {}x{} grid", self.grid.cols(), self.grid.rows());
        self.phase = Phase::Running;
        if let Err(e) = self.spawn_pair() {
            warn!("Could not spawn the opening pieces: {}", e);
            self.end();
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn current_piece(&self) -> Option<Piece> {
        self.current
    }

    pub fn next_piece(&self) -> Option<Piece> {
        self.next
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Total rows and columns cleared this game
    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn is_multiplayer(&self) -> bool {
        self.sync.is_some()
    }

    /// Countdown length for the current level
    pub fn timer_delay(&self) -> std::time::Duration {
        timer_delay(self.level)
    }

    /// Take the effects produced since the last call
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Try to place the current piece centred on (x, y)
    ///
    /// On success the line-clear pass runs, the next piece becomes current, a
    /// new next piece is drawn, and the board is announced in multiplayer.
    pub fn place_block(&mut self, x: i32, y: i32) -> Placement {
        if self.phase != Phase::Running {
            return Placement::Ignored;
        }
        let Some(current) = self.current else {
            return Placement::Ignored;
        };

        if !self.grid.play_piece(&current, x, y) {
            debug!("Rejected {} at ({}, {})", current, x, y);
            self.effects.push(Effect::Rejected);
            return Placement::Rejected;
        }

        info!("Placed {} at ({}, {})", current, x, y);
        self.effects.push(Effect::Placed);

        let before = self.score;
        let cleared = self.after_piece();
        let points = self.score - before;

        self.advance_piece();

        if let Some(sync) = self.sync.as_mut() {
            sync.board_changed(&self.grid);
        }

        Placement::Placed { cleared, points }
    }

    /// Line-clear pass after a successful placement
    fn after_piece(&mut self) -> LineClear {
        let cleared = self.grid.clear_lines();

        if cleared.is_empty() {
            self.multiplier = 1;
            return cleared;
        }

        let blocks = cleared.block_count();
        debug!("Clearing {} blocks on {} lines", blocks, cleared.lines);
        self.effects.push(Effect::LinesCleared {
            lines: cleared.lines,
            blocks,
        });
        self.lines = self.lines.saturating_add(cleared.lines);

        let points = line_clear_points(cleared.lines, blocks, self.multiplier);
        self.set_score(self.score.saturating_add(points));
        self.multiplier += 1;
        cleared
    }

    fn set_score(&mut self, score: u32) {
        if score == self.score {
            return;
        }
        self.score = score;
        if score > self.high_score {
            self.high_score = score;
        }
        if let Some(sync) = self.sync.as_mut() {
            sync.score_changed(score);
        }

        let level = level_for_score(score);
        if level > self.level {
            info!("Level up: {} -> {}", self.level, level);
            self.effects.push(Effect::LevelUp { level });
        }
        self.level = level;
    }

    fn set_lives(&mut self, lives: u32) {
        if lives == self.lives {
            return;
        }
        self.lives = lives;
        if let Some(sync) = self.sync.as_mut() {
            sync.lives_changed(lives);
        }
    }

    /// Current <- next, then draw a new next piece
    fn advance_piece(&mut self) {
        self.current = self.next.take();
        match self.source.next_piece() {
            Ok(piece) => {
                debug!("Next piece: {}", piece);
                self.next = Some(piece);
            }
            Err(e) => {
                warn!("Piece stream failed: {}", e);
                self.end();
            }
        }
    }

    fn spawn_pair(&mut self) -> Result<(), SourceError> {
        let current = self.source.next_piece()?;
        let next = self.source.next_piece()?;
        debug!("Spawned {} with {} next", current, next);
        self.current = Some(current);
        self.next = Some(next);
        Ok(())
    }

    /// Rotate the current piece by `quarter_turns` clockwise
    pub fn rotate_current_piece(&mut self, quarter_turns: u32) {
        if self.phase != Phase::Running {
            return;
        }
        if let Some(piece) = self.current.as_mut() {
            piece.rotate(quarter_turns);
            debug!("Rotated {} by {}", piece, quarter_turns);
            self.effects.push(Effect::Rotated);
        }
    }

    /// Exchange the current and next pieces without drawing
    pub fn swap_current_piece(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        std::mem::swap(&mut self.current, &mut self.next);
        debug!("Swapped current and next pieces");
        self.effects.push(Effect::Swapped);
    }

    /// Countdown expiry
    ///
    /// Costs a life and deals a fresh pair of pieces, or ends the game when no
    /// lives remain. Expiries after the game has ended are no-ops.
    pub fn game_loop(&mut self) -> Expiry {
        if self.phase != Phase::Running {
            return Expiry::Ignored;
        }

        if self.lives == 0 {
            info!("Timer expired with no lives left");
            self.end();
            return Expiry::GameOver;
        }

        let lives = self.lives - 1;
        info!("Timer expired, {} lives left", lives);
        self.set_lives(lives);
        self.multiplier = 1;
        self.effects.push(Effect::LifeLost { lives });

        if let Err(e) = self.spawn_pair() {
            warn!("Could not deal new pieces: {}", e);
            self.end();
            return Expiry::GameOver;
        }
        Expiry::LifeLost { lives }
    }

    /// Move to the terminal phase and announce it once
    pub fn end(&mut self) {
        if self.phase == Phase::GameOver {
            return;
        }
        self.phase = Phase::GameOver;
        self.effects.push(Effect::GameOver);
        if let Some(sync) = self.sync.as_mut() {
            sync.died();
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::from_game(self)
    }

    /// Direct grid access for setting up positions in tests and tools
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("phase", &self.phase)
            .field("score", &self.score)
            .field("level", &self.level)
            .field("lives", &self.lives)
            .field("multiplier", &self.multiplier)
            .field("current", &self.current)
            .field("next", &self.next)
            .finish()
    }
}
