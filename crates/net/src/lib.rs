//! Multiplayer networking
//!
//! - [`protocol`]: the newline-delimited text commands and their framing
//! - [`transport`]: the outbound seam ([`Transport`])
//! - [`piece_queue`]: the server-fed blocking piece queue
//! - [`leaderboard`], [`peers`], [`lobby`]: projections of server state
//! - [`session`]: routes inbound lines and builds multiplayer games
//! - [`client`]: the TCP connection and its tokio runtime

pub mod client;
pub mod leaderboard;
pub mod lobby;
pub mod peers;
pub mod piece_queue;
pub mod protocol;
pub mod session;
pub mod transport;

pub use tetrecs_types as types;

pub use client::{run_client, Connection, NetConfig};
pub use leaderboard::{Leaderboard, LeaderboardRow};
pub use lobby::{Lobby, LobbyEvent};
pub use peers::PeerBoards;
pub use piece_queue::{NetworkPieceSource, PieceQueue, QueueError, RefillPolicy};
pub use protocol::{
    escape, parse_client_message, parse_server_message, unescape, ChatLine, ClientMessage,
    ProtocolError, ScoreEntry, ServerMessage,
};
pub use session::{MultiplayerSession, NetSync, SessionConfig, SessionEvent};
pub use transport::{ChannelTransport, RecordingTransport, Transport};
