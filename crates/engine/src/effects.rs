//! Effect delivery.
//!
//! The game records what happened as [`Effect`]s; the engine hands them to an
//! [`EffectSink`] after the state lock is released. Audio playback itself is
//! outside this crate: [`AudioCues`] resolves the cue name and logs it, and is
//! silent when built muted.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::types::Effect;

/// Receiver of game effects
pub trait EffectSink: Send + Sync {
    fn effect(&self, effect: Effect);

    /// The countdown was (re)armed with `delay`
    fn timer_armed(&self, _delay: Duration) {}
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EffectSink for NullSink {
    fn effect(&self, _effect: Effect) {}
}

/// Maps effects to audio cue names, honouring an explicit mute flag
#[derive(Debug, Clone, Copy)]
pub struct AudioCues {
    muted: bool,
}

impl AudioCues {
    pub fn new(muted: bool) -> Self {
        Self { muted }
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    /// Cue to play for `effect`, or None when muted
    pub fn cue_for(&self, effect: Effect) -> Option<&'static str> {
        if self.muted {
            None
        } else {
            Some(effect.cue())
        }
    }
}

impl EffectSink for AudioCues {
    fn effect(&self, effect: Effect) {
        if let Some(cue) = self.cue_for(effect) {
            info!(cue, "Playing audio");
        }
    }

    fn timer_armed(&self, delay: Duration) {
        debug!("Countdown armed for {}ms", delay.as_millis());
    }
}

/// Keeps every effect and timer arm, for tests and replays
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    effects: Arc<Mutex<Vec<Effect>>>,
    arms: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn effects(&self) -> Vec<Effect> {
        self.effects.lock().clone()
    }

    pub fn arms(&self) -> Vec<Duration> {
        self.arms.lock().clone()
    }
}

impl EffectSink for RecordingSink {
    fn effect(&self, effect: Effect) {
        self.effects.lock().push(effect);
    }

    fn timer_armed(&self, delay: Duration) {
        self.arms.lock().push(delay);
    }
}

/// Forwards to several sinks in order
#[derive(Default, Clone)]
pub struct FanOut {
    sinks: Vec<Arc<dyn EffectSink>>,
}

impl FanOut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EffectSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EffectSink for FanOut {
    fn effect(&self, effect: Effect) {
        for sink in &self.sinks {
            sink.effect(effect);
        }
    }

    fn timer_armed(&self, delay: Duration) {
        for sink in &self.sinks {
            sink.timer_armed(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn muted_cues_are_silent() {
        let cues = AudioCues::new(true);
        assert_eq!(cues.cue_for(Effect::Placed), None);

        let cues = AudioCues::new(false);
        assert_eq!(cues.cue_for(Effect::Placed), Some("place.wav"));
        assert_eq!(cues.cue_for(Effect::LifeLost { lives: 1 }), Some("lifelose.wav"));
    }

    #[test]
    fn fan_out_reaches_every_sink() {
        let a = RecordingSink::new();
        let b = RecordingSink::new();
        let fan = FanOut::new()
            .with(Arc::new(a.clone()))
            .with(Arc::new(b.clone()));

        fan.effect(Effect::Swapped);
        fan.timer_armed(Duration::from_millis(5));

        assert_eq!(a.effects(), vec![Effect::Swapped]);
        assert_eq!(b.arms(), vec![Duration::from_millis(5)]);
    }
}
