//! Integration tests for the game state machine

use std::sync::Arc;

use parking_lot::Mutex;

use tetrecs::core::{
    level_for_score, timer_delay_ms, Expiry, Game, Grid, NetworkSync, Placement, RandomPieces,
    ScriptedPieces,
};
use tetrecs::types::{Effect, Phase, STARTING_LIVES};

const PLUS: u8 = 2;
const DOT: u8 = 3;
const DOUBLE: u8 = 13;

fn game_with(ids: Vec<u8>) -> Game {
    let mut game = Game::new(5, 5, ScriptedPieces::new(ids));
    game.start();
    game
}

#[test]
fn test_game_lifecycle() {
    let mut game = Game::new(5, 5, RandomPieces::new(12345));
    assert_eq!(game.phase(), Phase::Initializing);
    assert!(game.current_piece().is_none());

    game.start();
    assert!(game.is_running());
    assert!(game.current_piece().is_some());
    assert!(game.next_piece().is_some());
    assert_eq!(game.lives(), STARTING_LIVES);
    assert_eq!(game.multiplier(), 1);
    assert_eq!(game.score(), 0);
    assert_eq!(game.level(), 0);
}

#[test]
fn test_placement_advances_pieces() {
    let mut game = game_with(vec![DOT, PLUS, DOUBLE]);
    assert_eq!(game.current_piece().map(|p| p.id()), Some(DOT));
    assert_eq!(game.next_piece().map(|p| p.id()), Some(PLUS));

    assert!(game.place_block(0, 0).is_placed());
    assert_eq!(game.current_piece().map(|p| p.id()), Some(PLUS));
    assert_eq!(game.next_piece().map(|p| p.id()), Some(DOUBLE));
}

#[test]
fn test_rejected_placement_is_silent_and_retryable() {
    let mut game = game_with(vec![PLUS]);
    let before = game.grid().clone();

    assert_eq!(game.place_block(0, 0), Placement::Rejected);
    assert_eq!(game.grid(), &before);
    assert_eq!(game.current_piece().map(|p| p.id()), Some(PLUS));
    assert_eq!(game.drain_effects(), vec![Effect::Rejected]);

    assert!(game.place_block(2, 2).is_placed());
}

#[test]
fn test_column_clear_scores_blocks_times_ten() {
    // Column 0 rows 0-2 pre-filled; a Double clicked at (0, 4) fills rows 3-4
    let mut game = game_with(vec![DOUBLE]);
    for y in 0..3 {
        game.grid_mut().set(0, y, 1);
    }

    match game.place_block(0, 4) {
        Placement::Placed { cleared, points } => {
            assert_eq!(cleared.lines, 1);
            assert_eq!(cleared.block_count(), 5);
            assert_eq!(points, 50);
        }
        other => panic!("expected placement, got {:?}", other),
    }
    assert_eq!(game.score(), 50);
    assert_eq!(game.grid().filled_count(), 0);
}

fn set_up_cross(grid: &mut Grid) {
    // Row 2 and column 2 complete except the cells a Plus at (2, 2) covers
    grid.set(0, 2, 1);
    grid.set(4, 2, 1);
    grid.set(2, 0, 1);
    grid.set(2, 4, 1);
}

#[test]
fn test_cross_clear_score_uses_union() {
    let mut game = game_with(vec![PLUS]);
    set_up_cross(game.grid_mut());

    let placement = game.place_block(2, 2);
    let Placement::Placed { cleared, points } = placement else {
        panic!("plus should fit");
    };
    let (r, c) = (5, 5);
    assert_eq!(cleared.lines, 2);
    assert_eq!(cleared.block_count(), r + c - 1);
    assert_eq!(points, 2 * (r + c - 1) * 10);
    assert_eq!(game.multiplier(), 2);
}

#[test]
fn test_multiplier_scales_and_resets() {
    let mut game = game_with(vec![PLUS, PLUS, DOT]);

    set_up_cross(game.grid_mut());
    assert!(game.place_block(2, 2).is_placed());
    assert_eq!(game.score(), 180);
    assert_eq!(game.multiplier(), 2);

    // Same cross again with multiplier 2
    set_up_cross(game.grid_mut());
    assert!(game.place_block(2, 2).is_placed());
    assert_eq!(game.score(), 180 + 2 * 9 * 10 * 2);
    assert_eq!(game.multiplier(), 3);

    // A dot that clears nothing resets it
    assert!(game.place_block(0, 0).is_placed());
    assert_eq!(game.multiplier(), 1);
}

#[test]
fn test_level_follows_score() {
    assert_eq!(level_for_score(0), 0);
    assert_eq!(level_for_score(999), 0);
    assert_eq!(level_for_score(1000), 1);
    assert_eq!(level_for_score(12345), 12);
}

#[test]
fn test_level_up_effect() {
    let mut game = game_with(vec![PLUS]);
    // Three crosses: 180 + 360 + 540
    for _ in 0..3 {
        set_up_cross(game.grid_mut());
        assert!(game.place_block(2, 2).is_placed());
    }
    assert_eq!(game.score(), 1080);
    assert_eq!(game.level(), 1);
    assert!(game.drain_effects().contains(&Effect::LevelUp { level: 1 }));
    assert_eq!(game.high_score(), 1080);
}

#[test]
fn test_timer_delay_curve() {
    assert_eq!(timer_delay_ms(0), 12000);
    assert_eq!(timer_delay_ms(1), 11500);
    assert_eq!(timer_delay_ms(19), 2500);
    assert_eq!(timer_delay_ms(100), 2500);
    for level in 0..40 {
        assert!(timer_delay_ms(level + 1) <= timer_delay_ms(level));
        assert!(timer_delay_ms(level) >= 2500);
    }
}

#[test]
fn test_expiry_costs_lives_then_ends_game() {
    let mut game = game_with(vec![DOT, PLUS]);
    assert!(game.place_block(2, 2).is_placed());
    game.drain_effects();

    assert_eq!(game.game_loop(), Expiry::LifeLost { lives: 2 });
    assert_eq!(game.game_loop(), Expiry::LifeLost { lives: 1 });
    assert_eq!(game.multiplier(), 1);

    // lives 1 -> 0, the player is still in
    assert_eq!(game.game_loop(), Expiry::LifeLost { lives: 0 });
    assert_eq!(game.lives(), 0);
    assert!(game.is_running());

    // Next expiry ends it, later ones are no-ops
    assert_eq!(game.game_loop(), Expiry::GameOver);
    assert!(game.game_over());
    assert_eq!(game.game_loop(), Expiry::Ignored);
    assert_eq!(game.lives(), 0);
    assert_eq!(game.place_block(4, 4), Placement::Ignored);

    let effects = game.drain_effects();
    assert_eq!(effects.iter().filter(|e| **e == Effect::GameOver).count(), 1);
}

#[test]
fn test_expiry_deals_fresh_pair() {
    let mut game = game_with(vec![1, 2, 3, 4, 5]);
    assert_eq!(game.current_piece().map(|p| p.id()), Some(1));
    game.game_loop();
    assert_eq!(game.current_piece().map(|p| p.id()), Some(3));
    assert_eq!(game.next_piece().map(|p| p.id()), Some(4));
}

#[test]
fn test_swap_and_rotate() {
    let mut game = game_with(vec![9, 0]);
    game.swap_current_piece();
    assert_eq!(game.current_piece().map(|p| p.name()), Some("Line"));
    assert_eq!(game.next_piece().map(|p| p.name()), Some("T"));

    game.rotate_current_piece(1);
    // A Line turned once lies flat
    assert!(game.place_block(2, 0).is_placed());
    assert_eq!(game.grid().get(1, 0), 1);
    assert_eq!(game.grid().get(3, 0), 1);
}

#[derive(Default)]
struct Recorded {
    boards: Vec<Vec<i32>>,
    scores: Vec<u32>,
    lives: Vec<u32>,
    deaths: u32,
}

#[derive(Clone, Default)]
struct RecordingSync(Arc<Mutex<Recorded>>);

impl NetworkSync for RecordingSync {
    fn board_changed(&mut self, grid: &Grid) {
        self.0.lock().boards.push(grid.cells().to_vec());
    }

    fn score_changed(&mut self, score: u32) {
        self.0.lock().scores.push(score);
    }

    fn lives_changed(&mut self, lives: u32) {
        self.0.lock().lives.push(lives);
    }

    fn died(&mut self) {
        self.0.lock().deaths += 1;
    }
}

#[test]
fn test_network_sync_is_notified() {
    let sync = RecordingSync::default();
    let mut game = Game::new(5, 5, ScriptedPieces::new(vec![DOT])).with_sync(sync.clone());
    assert!(game.is_multiplayer());
    game.start();

    assert!(game.place_block(1, 1).is_placed());
    assert_eq!(game.place_block(1, 1), Placement::Rejected);
    for x in [0, 2, 3, 4] {
        game.place_block(x, 1);
    }
    game.game_loop();
    game.end();
    game.end();

    let rec = sync.0.lock();
    assert_eq!(rec.boards.len(), 5);
    assert_eq!(rec.boards[0][6], 4);
    assert_eq!(rec.scores, vec![50]);
    assert_eq!(rec.lives, vec![2]);
    assert_eq!(rec.deaths, 1);
}

#[test]
fn test_solo_game_has_no_sync() {
    let game = Game::new(5, 5, RandomPieces::new(1));
    assert!(!game.is_multiplayer());
}
