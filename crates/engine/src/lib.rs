//! Timer engine - runs a [`Game`](core::Game) against a real clock
//!
//! The core crate is deliberately clock-free. This crate wraps a game in a
//! [`GameHandle`] that owns the countdown thread and serializes every
//! mutation, and defines how effects leave the game:
//!
//! - [`effects`]: the [`EffectSink`] capability and stock sinks
//! - [`handle`]: the shared [`GameHandle`] and its [`TimerConfig`]

pub mod effects;
pub mod handle;

pub use tetrecs_core as core;
pub use tetrecs_types as types;

pub use effects::{AudioCues, EffectSink, FanOut, NullSink, RecordingSink};
pub use handle::{GameHandle, TimerConfig};
