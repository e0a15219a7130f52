//! Server-fed piece queue.
//!
//! The server decides the piece order for everyone in a session. The client
//! only asks for more ids (`PIECE`) and waits for them to arrive. [`take`]
//! never hands out a piece while fewer than [`QUEUE_LOW_WATER`] ids are
//! queued: it requests a batch and sleeps on a condition variable that every
//! arrival signals.
//!
//! [`take`]: PieceQueue::take

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use tetrecs_core::{Piece, PieceSource, SourceError};

use crate::protocol::ClientMessage;
use crate::transport::Transport;
use crate::types::{PIECE_COUNT, QUEUE_LOW_WATER, REFILL_BATCH};

/// How long to wait for a refill before asking again, and how often to ask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefillPolicy {
    pub timeout: Duration,
    pub attempts: u32,
}

impl Default for RefillPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// Every refill request went unanswered
    Starved,
    /// The session ended while waiting
    Closed,
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueError::Starved => write!(f, "server did not refill the piece queue"),
            QueueError::Closed => write!(f, "piece queue closed"),
        }
    }
}

impl std::error::Error for QueueError {}

impl From<QueueError> for SourceError {
    fn from(value: QueueError) -> Self {
        match value {
            QueueError::Starved => SourceError::Starved,
            QueueError::Closed => SourceError::Closed,
        }
    }
}

#[derive(Debug, Default)]
struct QueueState {
    ids: VecDeque<u8>,
    closed: bool,
}

/// Blocking FIFO of upcoming piece ids
pub struct PieceQueue {
    state: Mutex<QueueState>,
    refilled: Condvar,
    transport: Arc<dyn Transport>,
    policy: RefillPolicy,
}

impl PieceQueue {
    pub fn new(transport: Arc<dyn Transport>, policy: RefillPolicy) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            refilled: Condvar::new(),
            transport,
            policy,
        }
    }

    pub fn policy(&self) -> RefillPolicy {
        self.policy
    }

    /// Ask the server for `count` more ids
    pub fn request(&self, count: usize) {
        debug!("Requesting {} pieces", count);
        for _ in 0..count {
            self.transport.send(ClientMessage::Piece);
        }
    }

    /// Append an id from the server and wake waiting consumers
    pub fn push(&self, id: u8) {
        if id >= PIECE_COUNT {
            warn!("Ignoring unknown piece id {}", id);
            return;
        }
        let mut state = self.state.lock();
        if state.closed {
            debug!("Piece {} arrived after close", id);
            return;
        }
        state.ids.push_back(id);
        drop(state);
        self.refilled.notify_all();
    }

    pub fn len(&self) -> usize {
        self.state.lock().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queued ids, front first
    pub fn pending(&self) -> Vec<u8> {
        self.state.lock().ids.iter().copied().collect()
    }

    /// Dequeue the next piece, waiting for a refill when fewer than two are queued
    pub fn take(&self) -> Result<Piece, QueueError> {
        let mut state = self.state.lock();
        let mut attempts = 0;

        while state.ids.len() < QUEUE_LOW_WATER {
            if state.closed {
                return Err(QueueError::Closed);
            }
            if attempts == self.policy.attempts {
                warn!(
                    "No refill after {} requests, {} pieces queued",
                    attempts,
                    state.ids.len()
                );
                return Err(QueueError::Starved);
            }
            attempts += 1;

            MutexGuard::unlocked(&mut state, || self.request(REFILL_BATCH));

            let deadline = Instant::now() + self.policy.timeout;
            while state.ids.len() < QUEUE_LOW_WATER && !state.closed {
                if self.refilled.wait_until(&mut state, deadline).timed_out() {
                    debug!("Refill attempt {} timed out", attempts);
                    break;
                }
            }
        }

        let depth = state.ids.len();
        match state.ids.pop_front() {
            Some(id) => {
                debug!("Took piece {} with {} queued", id, depth);
                Piece::new(id).ok_or(QueueError::Closed)
            }
            None => Err(QueueError::Closed),
        }
    }

    /// Drop every queued id
    pub fn clear(&self) {
        self.state.lock().ids.clear();
    }

    /// Refuse further ids and release every waiter with [`QueueError::Closed`]
    pub fn close(&self) {
        let mut state = self.state.lock();
        if !state.closed {
            info!("Closing piece queue");
        }
        state.closed = true;
        state.ids.clear();
        drop(state);
        self.refilled.notify_all();
    }

    /// Accept ids again after [`close`](Self::close)
    pub fn reopen(&self) {
        self.state.lock().closed = false;
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

/// [`PieceSource`] backed by a shared [`PieceQueue`]
#[derive(Clone)]
pub struct NetworkPieceSource {
    queue: Arc<PieceQueue>,
}

impl NetworkPieceSource {
    pub fn new(queue: Arc<PieceQueue>) -> Self {
        Self { queue }
    }
}

impl PieceSource for NetworkPieceSource {
    fn next_piece(&mut self) -> Result<Piece, SourceError> {
        Ok(self.queue.take()?)
    }
}
