//! Multiplayer session - everything the client knows about a channel
//!
//! Inbound server lines are parsed and routed here:
//!
//! - `PIECE` ids go to the shared [`PieceQueue`]
//! - `BOARD` and `DIE` update the [`PeerBoards`] and the dead set
//! - `SCORES` replaces the [`Leaderboard`]
//! - `HISCORES` is kept for the end-of-game submit rule
//! - lobby traffic goes to the [`Lobby`]
//!
//! Unparseable lines are logged and dropped; the session carries on.
//! Outbound state from the running game goes through [`NetSync`].

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use tetrecs_core::{Game, Grid, NetworkSync};

use crate::leaderboard::{Leaderboard, LeaderboardRow};
use crate::lobby::{Lobby, LobbyEvent};
use crate::peers::PeerBoards;
use crate::piece_queue::{NetworkPieceSource, PieceQueue, RefillPolicy};
use crate::protocol::{parse_server_message, ClientMessage, ScoreEntry, ServerMessage};
use crate::transport::Transport;
use crate::types::{GRID_COLS, GRID_ROWS, INITIAL_PIECE_REQUEST};

/// Session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub cols: usize,
    pub rows: usize,
    pub refill: RefillPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cols: GRID_COLS,
            rows: GRID_ROWS,
            refill: RefillPolicy::default(),
        }
    }
}

/// What an inbound message changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Lobby(LobbyEvent),
    PieceQueued(u8),
    PeerBoard { user: String, visible: bool },
    PeerDied(String),
    Scores(Vec<LeaderboardRow>),
    HiScores(Vec<ScoreEntry>),
}

#[derive(Debug)]
struct SessionState {
    lobby: Lobby,
    leaderboard: Leaderboard,
    peers: PeerBoards,
    hiscores: Option<Vec<ScoreEntry>>,
}

pub struct MultiplayerSession {
    config: SessionConfig,
    transport: Arc<dyn Transport>,
    queue: Arc<PieceQueue>,
    state: Mutex<SessionState>,
}

impl MultiplayerSession {
    pub fn new(transport: Arc<dyn Transport>, config: SessionConfig) -> Self {
        let queue = Arc::new(PieceQueue::new(Arc::clone(&transport), config.refill));
        let state = SessionState {
            lobby: Lobby::new(),
            leaderboard: Leaderboard::new(),
            peers: PeerBoards::new(config.cols, config.rows),
            hiscores: None,
        };
        Self {
            config,
            transport,
            queue,
            state: Mutex::new(state),
        }
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn queue(&self) -> &Arc<PieceQueue> {
        &self.queue
    }

    fn send(&self, message: ClientMessage) {
        debug!("Sending {}", message);
        self.transport.send(message);
    }

    /// Route one unescaped line from the server
    pub fn handle_line(&self, line: &str) -> Option<SessionEvent> {
        match parse_server_message(line) {
            Ok(message) => self.handle(message),
            Err(e) => {
                warn!("Dropping server message {:?}: {}", line, e);
                None
            }
        }
    }

    pub fn handle(&self, message: ServerMessage) -> Option<SessionEvent> {
        if let ServerMessage::Piece(id) = message {
            self.queue.push(id);
            return Some(SessionEvent::PieceQueued(id));
        }

        let mut state = self.state.lock();
        let state = &mut *state;
        let event = match message {
            ServerMessage::Board { user, cells } => {
                let visible = state.peers.apply_board(&user, &cells);
                SessionEvent::PeerBoard { user, visible }
            }
            ServerMessage::Die(user) => {
                info!("{} died", user);
                state.leaderboard.mark_dead(&user);
                state.peers.relayout(state.leaderboard.dead_players());
                SessionEvent::PeerDied(user)
            }
            ServerMessage::Scores(entries) => {
                state.leaderboard.replace_all(entries);
                SessionEvent::Scores(state.leaderboard.top())
            }
            ServerMessage::HiScores(entries) => {
                state.hiscores = Some(entries.clone());
                SessionEvent::HiScores(entries)
            }
            other => {
                let event = state.lobby.apply(&other)?;
                match &event {
                    LobbyEvent::UsersUpdated(users) => {
                        state.peers.set_roster(users.clone());
                        state.peers.relayout(state.leaderboard.dead_players());
                    }
                    LobbyEvent::UserRenamed { old, new } => {
                        state.peers.rename_user(old, new);
                        state.peers.set_roster(state.lobby.users().to_vec());
                        state.peers.relayout(state.leaderboard.dead_players());
                    }
                    LobbyEvent::NickChanged(_) => {
                        state.peers.set_self(state.lobby.nickname().map(str::to_string));
                        state.peers.set_roster(state.lobby.users().to_vec());
                        state.peers.relayout(state.leaderboard.dead_players());
                    }
                    LobbyEvent::Started => {
                        self.send(ClientMessage::Scores);
                    }
                    LobbyEvent::Parted => {
                        state.leaderboard.clear();
                        state.peers.clear();
                    }
                    _ => {}
                }
                SessionEvent::Lobby(event)
            }
        };
        Some(event)
    }

    // ============== Lobby commands ==============

    pub fn list_channels(&self) {
        self.send(ClientMessage::List);
    }

    pub fn create_channel(&self, name: &str) {
        self.send(ClientMessage::Create(name.to_string()));
    }

    pub fn join_channel(&self, name: &str) {
        self.send(ClientMessage::Join(name.to_string()));
    }

    pub fn start_game(&self) {
        self.send(ClientMessage::Start);
    }

    /// Send chat input; `/nick <name>` renames instead
    pub fn send_chat(&self, input: &str) {
        self.send(ClientMessage::chat(input));
    }

    pub fn request_scores(&self) {
        self.send(ClientMessage::Scores);
    }

    pub fn request_hiscores(&self) {
        self.send(ClientMessage::HiScores);
    }

    // ============== Game lifecycle ==============

    /// Build the multiplayer game and ask the server for the opening pieces
    ///
    /// The returned game draws from the shared queue and announces board,
    /// score, lives and death through this session's transport.
    pub fn new_game(&self) -> Game {
        self.queue.reopen();
        {
            let mut state = self.state.lock();
            let state = &mut *state;
            state.peers.relayout(state.leaderboard.dead_players());
        }
        self.queue.request(INITIAL_PIECE_REQUEST);
        Game::new(
            self.config.cols,
            self.config.rows,
            NetworkPieceSource::new(Arc::clone(&self.queue)),
        )
        .with_sync(NetSync::new(Arc::clone(&self.transport)))
    }

    /// Leave the channel: send `PART`, release queue waiters, drop session state
    ///
    /// The game itself must already have been ended so its death went out first.
    pub fn leave(&self) {
        info!("Leaving session");
        self.send(ClientMessage::Part);
        self.queue.close();
        let mut state = self.state.lock();
        state.lobby.reset();
        state.leaderboard.clear();
        state.hiscores = None;
        state.peers.clear();
    }

    /// Wake anything blocked on a piece refill without leaving the channel
    ///
    /// A game waiting for pieces sees the queue closed and ends, announcing
    /// its death before [`leave`](Self::leave) sends `PART`.
    pub fn abort_waiters(&self) {
        self.queue.close();
    }

    /// The server went away
    pub fn disconnected(&self) {
        warn!("Server connection closed");
        self.queue.close();
    }

    /// Submit `score` to the global table if it beats any fetched entry
    ///
    /// The fetched table gains the entry and drops its last one. Returns false
    /// when no table was fetched or the score does not qualify.
    pub fn submit_high_score(&self, name: &str, score: u32) -> bool {
        let mut state = self.state.lock();
        let Some(table) = state.hiscores.as_mut() else {
            return false;
        };
        if !table.iter().any(|e| score > e.score) {
            return false;
        }

        let entry = ScoreEntry::new(name, score);
        let len = table.len();
        let at = table.iter().position(|e| score > e.score).unwrap_or(len);
        table.insert(at, entry.clone());
        table.truncate(len);
        drop(state);

        info!("New global high score {}", entry);
        self.send(ClientMessage::HiScore(entry));
        true
    }

    // ============== Views ==============

    pub fn nickname(&self) -> Option<String> {
        self.state.lock().lobby.nickname().map(str::to_string)
    }

    pub fn lobby(&self) -> Lobby {
        self.state.lock().lobby.clone()
    }

    pub fn leaderboard(&self) -> Leaderboard {
        self.state.lock().leaderboard.clone()
    }

    pub fn hiscores(&self) -> Option<Vec<ScoreEntry>> {
        self.state.lock().hiscores.clone()
    }

    /// Shown opponent boards in display order
    pub fn peer_boards(&self) -> Vec<(String, Grid)> {
        self.state.lock().peers.visible_boards()
    }
}

/// Announces game state changes to the server
pub struct NetSync {
    transport: Arc<dyn Transport>,
}

impl NetSync {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

impl NetworkSync for NetSync {
    fn board_changed(&mut self, grid: &Grid) {
        self.transport.send(ClientMessage::board(grid));
    }

    fn score_changed(&mut self, score: u32) {
        self.transport.send(ClientMessage::Score(score));
    }

    fn lives_changed(&mut self, lives: u32) {
        self.transport.send(ClientMessage::Lives(lives));
    }

    fn died(&mut self) {
        info!("Announcing death");
        self.transport.send(ClientMessage::Die);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RecordingTransport;

    fn session() -> (MultiplayerSession, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::new());
        let session = MultiplayerSession::new(transport.clone(), SessionConfig::default());
        (session, transport)
    }

    #[test]
    fn test_bad_lines_are_dropped() {
        let (session, transport) = session();
        assert_eq!(session.handle_line("GARBAGE"), None);
        assert_eq!(session.handle_line("PIECE x"), None);
        assert_eq!(session.handle_line("PIECE 2"), Some(SessionEvent::PieceQueued(2)));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_start_requests_scores() {
        let (session, transport) = session();
        session.handle_line("START");
        assert_eq!(transport.sent(), vec![ClientMessage::Scores]);
    }

    #[test]
    fn test_high_score_submit_rule() {
        let (session, transport) = session();
        assert!(!session.submit_high_score("ann", 10));

        session.handle_line("HISCORES a:300\nb:200\nc:100");
        assert!(!session.submit_high_score("ann", 100));
        assert!(session.submit_high_score("ann", 250));

        assert_eq!(
            transport.sent(),
            vec![ClientMessage::HiScore(ScoreEntry::new("ann", 250))]
        );
        let table = session.hiscores().unwrap();
        assert_eq!(
            table,
            vec![
                ScoreEntry::new("a", 300),
                ScoreEntry::new("ann", 250),
                ScoreEntry::new("b", 200),
            ]
        );
    }
}
