//! Shared game runtime.
//!
//! A [`GameHandle`] owns one [`Game`] behind a mutex together with the
//! countdown deadline, and a background thread that fires the countdown.
//!
//! Placement and expiry both run under that one lock, so a line-clear pass can
//! never interleave with a lives decrement. A placement re-arms the deadline
//! while it still holds the lock; an expiry that was due but lost the race
//! sees the new deadline and goes back to sleep instead of firing.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::core::{timer_delay, Expiry, Game, GameSnapshot, Placement};
use crate::effects::EffectSink;
use crate::types::Effect;

/// Countdown configuration
#[derive(Debug, Clone, Copy)]
pub struct TimerConfig {
    /// Countdown length for a level
    pub delay: fn(u32) -> Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self { delay: timer_delay }
    }
}

struct State {
    game: Game,
    deadline: Option<Instant>,
    shutdown: bool,
}

struct Shared {
    state: Mutex<State>,
    /// Wakes the timer thread when the deadline changes or on shutdown
    wake: Condvar,
    /// Wakes callers of [`GameHandle::wait_until_over`]
    over: Condvar,
    sink: Arc<dyn EffectSink>,
    config: TimerConfig,
}

impl Shared {
    /// Arm (or re-arm) the countdown for the current level
    fn arm(&self, state: &mut State) -> Duration {
        let delay = (self.config.delay)(state.game.level());
        state.deadline = Some(Instant::now() + delay);
        delay
    }

    /// Deliver effects outside the lock
    fn dispatch(&self, effects: Vec<Effect>, armed: Option<Duration>) {
        if let Some(delay) = armed {
            self.sink.timer_armed(delay);
        }
        for effect in effects {
            self.sink.effect(effect);
        }
    }
}

/// Running game plus its countdown thread
pub struct GameHandle {
    shared: Arc<Shared>,
    timer: Option<JoinHandle<()>>,
    /// Releases a piece source the game may be blocked on
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl GameHandle {
    /// Start `game`, arm the countdown, and spawn the timer thread
    pub fn start(game: Game, sink: Arc<dyn EffectSink>, config: TimerConfig) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                game,
                deadline: None,
                shutdown: false,
            }),
            wake: Condvar::new(),
            over: Condvar::new(),
            sink,
            config,
        });

        let (effects, armed) = {
            let mut state = shared.state.lock();
            state.game.start();
            let armed = if state.game.is_running() {
                Some(shared.arm(&mut state))
            } else {
                None
            };
            (state.game.drain_effects(), armed)
        };
        shared.dispatch(effects, armed);

        let timer = {
            let shared = Arc::clone(&shared);
            std::thread::Builder::new()
                .name("game-timer".to_string())
                .spawn(move || run_timer(shared))
        };
        let timer = match timer {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Could not spawn the countdown thread: {}", e);
                None
            }
        };

        Self {
            shared,
            timer,
            cancel: None,
        }
    }

    /// Run `cancel` at the start of [`leave`](Self::leave), before the game lock is taken
    ///
    /// An expiry that is waiting on a piece refill holds the game lock; `cancel`
    /// must wake that wait (closing the piece queue does).
    pub fn on_leave(&mut self, cancel: impl FnOnce() + Send + Sync + 'static) {
        self.cancel = Some(Box::new(cancel));
    }

    /// Place the current piece centred on (x, y)
    pub fn place_block(&self, x: i32, y: i32) -> Placement {
        let (placement, effects, armed, over) = {
            let mut state = self.shared.state.lock();
            let placement = state.game.place_block(x, y);
            let armed = if placement.is_placed() && state.game.is_running() {
                Some(self.shared.arm(&mut state))
            } else {
                None
            };
            let over = state.game.game_over();
            if over {
                state.deadline = None;
            }
            (placement, state.game.drain_effects(), armed, over)
        };

        if armed.is_some() || over {
            self.shared.wake.notify_one();
        }
        if over {
            self.shared.over.notify_all();
        }
        self.shared.dispatch(effects, armed);
        placement
    }

    pub fn rotate_current_piece(&self, quarter_turns: u32) {
        self.with_game_mut(|game| game.rotate_current_piece(quarter_turns));
    }

    pub fn swap_current_piece(&self) {
        self.with_game_mut(|game| game.swap_current_piece());
    }

    fn with_game_mut<R>(&self, f: impl FnOnce(&mut Game) -> R) -> R {
        let (out, effects) = {
            let mut state = self.shared.state.lock();
            let out = f(&mut state.game);
            (out, state.game.drain_effects())
        };
        self.shared.dispatch(effects, None);
        out
    }

    /// Read the game under the lock
    pub fn with_game<R>(&self, f: impl FnOnce(&Game) -> R) -> R {
        let state = self.shared.state.lock();
        f(&state.game)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.with_game(Game::snapshot)
    }

    pub fn is_over(&self) -> bool {
        self.with_game(Game::game_over)
    }

    /// Time left on the countdown, None when disarmed
    pub fn time_remaining(&self) -> Option<Duration> {
        let state = self.shared.state.lock();
        state
            .deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Block until the game ends or `timeout` passes; true if it ended
    pub fn wait_until_over(&self, timeout: Duration) -> bool {
        let until = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        while !state.game.game_over() {
            if self.shared.over.wait_until(&mut state, until).timed_out() {
                return state.game.game_over();
            }
        }
        true
    }

    /// Abandon the game: end it, cancel the countdown, and stop the timer thread
    ///
    /// In multiplayer, ending the game announces the death to peers. No expiry
    /// fires after this returns.
    pub fn leave(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            debug!("Releasing piece waiters");
            cancel();
        }
        let effects = {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                return;
            }
            info!("Leaving game");
            state.game.end();
            state.deadline = None;
            state.shutdown = true;
            state.game.drain_effects()
        };
        self.shared.wake.notify_all();
        self.shared.over.notify_all();

        if let Some(timer) = self.timer.take() {
            if timer.join().is_err() {
                warn!("Countdown thread panicked");
            }
        }
        self.shared.dispatch(effects, None);
    }
}

impl Drop for GameHandle {
    fn drop(&mut self) {
        self.leave();
    }
}

/// Countdown loop: sleep until the deadline, fire, re-arm or stop
fn run_timer(shared: Arc<Shared>) {
    let mut state = shared.state.lock();
    loop {
        if state.shutdown {
            break;
        }

        let Some(deadline) = state.deadline else {
            shared.wake.wait(&mut state);
            continue;
        };

        if Instant::now() < deadline {
            shared.wake.wait_until(&mut state, deadline);
            continue;
        }

        let expiry = state.game.game_loop();
        let armed = match expiry {
            Expiry::LifeLost { .. } if state.game.is_running() => Some(shared.arm(&mut state)),
            _ => {
                state.deadline = None;
                None
            }
        };
        let over = state.game.game_over();
        let effects = state.game.drain_effects();
        debug!("Countdown fired: {:?}", expiry);

        MutexGuard::unlocked(&mut state, || {
            if over {
                shared.over.notify_all();
            }
            shared.dispatch(effects, armed);
        });
    }
    debug!("Countdown thread stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ScriptedPieces;
    use crate::effects::{NullSink, RecordingSink};

    const DOT: u8 = 3;

    fn fast(_level: u32) -> Duration {
        Duration::from_millis(30)
    }

    fn slow(_level: u32) -> Duration {
        Duration::from_secs(60)
    }

    #[test]
    fn start_arms_the_countdown() {
        let sink = RecordingSink::new();
        let game = Game::new(5, 5, ScriptedPieces::new(vec![DOT]));
        let handle = GameHandle::start(game, Arc::new(sink.clone()), TimerConfig { delay: slow });

        assert!(handle.time_remaining().is_some());
        assert_eq!(sink.arms(), vec![Duration::from_secs(60)]);
    }

    #[test]
    fn placement_rearms_and_rejection_does_not() {
        let sink = RecordingSink::new();
        let game = Game::new(5, 5, ScriptedPieces::new(vec![DOT]));
        let handle = GameHandle::start(game, Arc::new(sink.clone()), TimerConfig { delay: slow });

        assert!(handle.place_block(2, 2).is_placed());
        assert_eq!(handle.place_block(2, 2), Placement::Rejected);

        assert_eq!(sink.arms().len(), 2);
        assert_eq!(sink.effects(), vec![Effect::Placed, Effect::Rejected]);
    }

    #[test]
    fn expiries_drain_lives_then_end_the_game() {
        let sink = RecordingSink::new();
        let game = Game::new(5, 5, ScriptedPieces::new(vec![DOT]));
        let handle = GameHandle::start(game, Arc::new(sink.clone()), TimerConfig { delay: fast });

        assert!(handle.wait_until_over(Duration::from_secs(5)));
        assert_eq!(handle.snapshot().lives, 0);
        assert_eq!(handle.time_remaining(), None);

        let lost: Vec<_> = sink
            .effects()
            .into_iter()
            .filter(|e| matches!(e, Effect::LifeLost { .. }))
            .collect();
        assert_eq!(
            lost,
            vec![
                Effect::LifeLost { lives: 2 },
                Effect::LifeLost { lives: 1 },
                Effect::LifeLost { lives: 0 },
            ]
        );
        assert_eq!(sink.effects().last(), Some(&Effect::GameOver));
    }

    #[test]
    fn leave_cancels_the_countdown() {
        let sink = RecordingSink::new();
        let game = Game::new(5, 5, ScriptedPieces::new(vec![DOT]));
        let mut handle = GameHandle::start(game, Arc::new(sink.clone()), TimerConfig { delay: fast });

        handle.leave();
        assert!(handle.is_over());
        let lives = handle.snapshot().lives;

        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(handle.snapshot().lives, lives);
        assert_eq!(handle.place_block(1, 1), Placement::Ignored);

        // Second leave is a no-op
        handle.leave();
        let over = sink.effects().iter().filter(|e| **e == Effect::GameOver).count();
        assert_eq!(over, 1);
    }

    #[test]
    fn rotate_and_swap_pass_through() {
        let game = Game::new(5, 5, ScriptedPieces::new(vec![1, 9]));
        let handle = GameHandle::start(game, Arc::new(NullSink), TimerConfig { delay: slow });

        handle.swap_current_piece();
        assert_eq!(handle.with_game(|g| g.current_piece().map(|p| p.id())), Some(9));

        handle.rotate_current_piece(4);
        assert_eq!(handle.snapshot().current.map(|p| p.name), Some("T"));
    }
}
