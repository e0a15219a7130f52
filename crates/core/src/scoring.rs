//! Scoring module - points, levels and the countdown curve
//!
//! - A clearing placement scores `lines * blocks * 10 * multiplier`, where
//!   `blocks` is the size of the union of all cleared cells.
//! - The level is `score / 1000`, rounded down.
//! - The countdown is `max(2500, 12000 - 500 * level)` milliseconds.

use std::time::Duration;

use crate::types::{
    BASE_TIMER_MS, MIN_TIMER_MS, POINTS_PER_BLOCK, POINTS_PER_LEVEL, TIMER_STEP_MS,
};

/// Points awarded for one line-clear pass
pub fn line_clear_points(lines: u32, blocks: u32, multiplier: u32) -> u32 {
    lines
        .saturating_mul(blocks)
        .saturating_mul(POINTS_PER_BLOCK)
        .saturating_mul(multiplier)
}

/// Level for a total score
pub fn level_for_score(score: u32) -> u32 {
    score / POINTS_PER_LEVEL
}

/// Countdown length for a level in milliseconds
pub fn timer_delay_ms(level: u32) -> u64 {
    BASE_TIMER_MS
        .saturating_sub(TIMER_STEP_MS.saturating_mul(level as u64))
        .max(MIN_TIMER_MS)
}

/// Countdown length for a level
pub fn timer_delay(level: u32) -> Duration {
    Duration::from_millis(timer_delay_ms(level))
}
