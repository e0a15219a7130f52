//! Protocol module - line-based text commands exchanged with the game server
//!
//! Every message is one keyword optionally followed by a space and a payload.
//! Some payloads are multi-line (`SCORES`, `USERS`, `CHANNELS`, `MSG`,
//! `HISCORES`); on the wire a message must stay on one line, so [`escape`]
//! turns embedded newlines into `\n` and [`unescape`] reverses it.

use tetrecs_core::Grid;

pub use crate::types::ScoreEntry;
use crate::types::{CellValue, MAX_CELL_VALUE, PIECE_COUNT};

// ============== Errors ==============

/// Why an inbound line could not be understood
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Blank line
    Empty,
    /// Keyword not part of the protocol
    UnknownCommand(String),
    /// Keyword known but payload missing
    MissingPayload(&'static str),
    /// Keyword known but payload unreadable
    BadPayload {
        command: &'static str,
        payload: String,
    },
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::Empty => write!(f, "empty message"),
            ProtocolError::UnknownCommand(keyword) => write!(f, "unknown command {:?}", keyword),
            ProtocolError::MissingPayload(command) => write!(f, "{} without payload", command),
            ProtocolError::BadPayload { command, payload } => {
                write!(f, "malformed {} payload {:?}", command, payload)
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

// ============== Server -> Client ==============

/// A `name:text` chat line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub from: String,
    pub text: String,
}

/// Messages the server sends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Next piece id for the queue
    Piece(u8),
    /// A peer's flattened board
    Board { user: String, cells: Vec<CellValue> },
    /// A peer died
    Die(String),
    /// Full session leaderboard
    Scores(Vec<ScoreEntry>),
    /// Global high-score table
    HiScores(Vec<ScoreEntry>),
    /// Open channels
    Channels(Vec<String>),
    /// We joined a channel
    Join(String),
    /// We left the channel
    Parted,
    /// We are the channel host
    Host,
    /// The host started the game
    Start,
    /// Chat lines
    Msg(Vec<ChatLine>),
    /// Nickname assignment, `old` present on a rename
    Nick { old: Option<String>, new: String },
    /// Channel roster
    Users(Vec<String>),
    /// Server-reported error
    Error(String),
}

impl ServerMessage {
    pub fn keyword(&self) -> &'static str {
        match self {
            ServerMessage::Piece(_) => "PIECE",
            ServerMessage::Board { .. } => "BOARD",
            ServerMessage::Die(_) => "DIE",
            ServerMessage::Scores(_) => "SCORES",
            ServerMessage::HiScores(_) => "HISCORES",
            ServerMessage::Channels(_) => "CHANNELS",
            ServerMessage::Join(_) => "JOIN",
            ServerMessage::Parted => "PARTED",
            ServerMessage::Host => "HOST",
            ServerMessage::Start => "START",
            ServerMessage::Msg(_) => "MSG",
            ServerMessage::Nick { .. } => "NICK",
            ServerMessage::Users(_) => "USERS",
            ServerMessage::Error(_) => "ERROR",
        }
    }

    /// Render as an unescaped message
    pub fn encode(&self) -> String {
        match self {
            ServerMessage::Piece(id) => format!("PIECE {}", id),
            ServerMessage::Board { user, cells } => {
                format!("BOARD {}:{}", user, join_cells(cells))
            }
            ServerMessage::Die(user) => format!("DIE {}", user),
            ServerMessage::Scores(entries) => format!("SCORES {}", join_lines(entries)),
            ServerMessage::HiScores(entries) => format!("HISCORES {}", join_lines(entries)),
            ServerMessage::Channels(names) => format!("CHANNELS {}", names.join("\n")),
            ServerMessage::Join(channel) => format!("JOIN {}", channel),
            ServerMessage::Parted => "PARTED".to_string(),
            ServerMessage::Host => "HOST".to_string(),
            ServerMessage::Start => "START".to_string(),
            ServerMessage::Msg(lines) => {
                let body: Vec<String> = lines
                    .iter()
                    .map(|l| format!("{}:{}", l.from, l.text))
                    .collect();
                format!("MSG {}", body.join("\n"))
            }
            ServerMessage::Nick { old: Some(old), new } => format!("NICK {}:{}", old, new),
            ServerMessage::Nick { old: None, new } => format!("NICK {}", new),
            ServerMessage::Users(names) => format!("USERS {}", names.join("\n")),
            ServerMessage::Error(text) => format!("ERROR {}", text),
        }
    }
}

/// Parse one unescaped server message
pub fn parse_server_message(message: &str) -> Result<ServerMessage, ProtocolError> {
    let message = message.trim_end_matches(['\r', '\n']);
    if message.trim().is_empty() {
        return Err(ProtocolError::Empty);
    }
    let (keyword, payload) = match message.split_once(' ') {
        Some((keyword, payload)) => (keyword, payload),
        None => (message, ""),
    };

    match keyword {
        "PIECE" => {
            let raw = required("PIECE", payload)?;
            let id = raw
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|id| *id < PIECE_COUNT)
                .ok_or_else(|| bad("PIECE", raw))?;
            Ok(ServerMessage::Piece(id))
        }
        "BOARD" => {
            let raw = required("BOARD", payload)?;
            let (user, cells) = raw.split_once(':').ok_or_else(|| bad("BOARD", raw))?;
            if user.is_empty() {
                return Err(bad("BOARD", raw));
            }
            let cells = parse_cells(cells).ok_or_else(|| bad("BOARD", raw))?;
            Ok(ServerMessage::Board {
                user: user.to_string(),
                cells,
            })
        }
        "DIE" => Ok(ServerMessage::Die(required("DIE", payload)?.trim().to_string())),
        "SCORES" => Ok(ServerMessage::Scores(parse_score_lines("SCORES", payload)?)),
        "HISCORES" => Ok(ServerMessage::HiScores(parse_score_lines("HISCORES", payload)?)),
        "CHANNELS" => Ok(ServerMessage::Channels(split_lines(payload))),
        "JOIN" => Ok(ServerMessage::Join(required("JOIN", payload)?.trim().to_string())),
        "PARTED" => Ok(ServerMessage::Parted),
        "HOST" => Ok(ServerMessage::Host),
        "START" => Ok(ServerMessage::Start),
        "MSG" => {
            let raw = required("MSG", payload)?;
            let mut lines = Vec::new();
            for line in raw.split('\n').filter(|l| !l.is_empty()) {
                let (from, text) = line.split_once(':').ok_or_else(|| bad("MSG", raw))?;
                lines.push(ChatLine {
                    from: from.to_string(),
                    text: text.to_string(),
                });
            }
            Ok(ServerMessage::Msg(lines))
        }
        "NICK" => {
            let raw = required("NICK", payload)?.trim();
            match raw.split_once(':') {
                Some((old, new)) if !new.is_empty() => Ok(ServerMessage::Nick {
                    old: Some(old.to_string()),
                    new: new.to_string(),
                }),
                Some(_) => Err(bad("NICK", raw)),
                None => Ok(ServerMessage::Nick {
                    old: None,
                    new: raw.to_string(),
                }),
            }
        }
        "USERS" => Ok(ServerMessage::Users(split_lines(payload))),
        "ERROR" => Ok(ServerMessage::Error(payload.to_string())),
        other => Err(ProtocolError::UnknownCommand(other.to_string())),
    }
}

// ============== Client -> Server ==============

/// Messages the client sends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Ask for one more piece id
    Piece,
    /// Our flattened board, row-major
    Board(Vec<CellValue>),
    Score(u32),
    Lives(u32),
    /// We died
    Die,
    /// Ask for the session leaderboard
    Scores,
    /// Ask for the global high scores
    HiScores,
    /// Submit a global high score
    HiScore(ScoreEntry),
    /// Ask for the channel list
    List,
    Create(String),
    Join(String),
    Part,
    /// Host starts the game
    Start,
    Msg(String),
    Nick(String),
}

impl ClientMessage {
    /// Board dump of `grid`, row by row
    pub fn board(grid: &Grid) -> Self {
        ClientMessage::Board(grid.cells().to_vec())
    }

    /// Chat input; a leading `/nick` turns it into a rename
    pub fn chat(input: &str) -> Self {
        let input = input.trim();
        match input.strip_prefix("/nick") {
            Some(name) if name.is_empty() || name.starts_with(' ') => {
                ClientMessage::Nick(name.trim().to_string())
            }
            _ => ClientMessage::Msg(input.to_string()),
        }
    }

    /// Render as an unescaped message
    pub fn encode(&self) -> String {
        match self {
            ClientMessage::Piece => "PIECE".to_string(),
            ClientMessage::Board(cells) => format!("BOARD {}", join_cells(cells)),
            ClientMessage::Score(score) => format!("SCORE {}", score),
            ClientMessage::Lives(lives) => format!("LIVES {}", lives),
            ClientMessage::Die => "DIE".to_string(),
            ClientMessage::Scores => "SCORES".to_string(),
            ClientMessage::HiScores => "HISCORES".to_string(),
            ClientMessage::HiScore(entry) => format!("HISCORE {}", entry),
            ClientMessage::List => "LIST".to_string(),
            ClientMessage::Create(channel) => format!("CREATE {}", channel),
            ClientMessage::Join(channel) => format!("JOIN {}", channel),
            ClientMessage::Part => "PART".to_string(),
            ClientMessage::Start => "START".to_string(),
            ClientMessage::Msg(text) => format!("MSG {}", text),
            ClientMessage::Nick(name) => format!("NICK {}", name),
        }
    }
}

impl std::fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Parse a client message, as a server or a recorded transport would
pub fn parse_client_message(message: &str) -> Result<ClientMessage, ProtocolError> {
    let message = message.trim_end_matches(['\r', '\n']);
    if message.trim().is_empty() {
        return Err(ProtocolError::Empty);
    }
    let (keyword, payload) = match message.split_once(' ') {
        Some((keyword, payload)) => (keyword, payload),
        None => (message, ""),
    };

    let number = |command: &'static str| -> Result<u32, ProtocolError> {
        let raw = required(command, payload)?;
        raw.trim().parse().map_err(|_| bad(command, raw))
    };

    match keyword {
        "PIECE" => Ok(ClientMessage::Piece),
        "BOARD" => {
            let raw = required("BOARD", payload)?;
            parse_cells(raw)
                .map(ClientMessage::Board)
                .ok_or_else(|| bad("BOARD", raw))
        }
        "SCORE" => number("SCORE").map(ClientMessage::Score),
        "LIVES" => number("LIVES").map(ClientMessage::Lives),
        "DIE" => Ok(ClientMessage::Die),
        "SCORES" => Ok(ClientMessage::Scores),
        "HISCORES" => Ok(ClientMessage::HiScores),
        "HISCORE" => {
            let raw = required("HISCORE", payload)?;
            ScoreEntry::parse(raw)
                .map(ClientMessage::HiScore)
                .ok_or_else(|| bad("HISCORE", raw))
        }
        "LIST" => Ok(ClientMessage::List),
        "CREATE" => Ok(ClientMessage::Create(required("CREATE", payload)?.to_string())),
        "JOIN" => Ok(ClientMessage::Join(required("JOIN", payload)?.to_string())),
        "PART" => Ok(ClientMessage::Part),
        "START" => Ok(ClientMessage::Start),
        "MSG" => Ok(ClientMessage::Msg(payload.to_string())),
        "NICK" => Ok(ClientMessage::Nick(required("NICK", payload)?.to_string())),
        other => Err(ProtocolError::UnknownCommand(other.to_string())),
    }
}

// ============== Framing ==============

/// Make a message safe to send as a single line
pub fn escape(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    for c in message.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}

/// Reverse [`escape`]; unknown escapes are kept as written
pub fn unescape(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

// ============== Helpers ==============

fn required<'a>(command: &'static str, payload: &'a str) -> Result<&'a str, ProtocolError> {
    if payload.trim().is_empty() {
        Err(ProtocolError::MissingPayload(command))
    } else {
        Ok(payload)
    }
}

fn bad(command: &'static str, payload: &str) -> ProtocolError {
    ProtocolError::BadPayload {
        command,
        payload: payload.to_string(),
    }
}

fn parse_cells(raw: &str) -> Option<Vec<CellValue>> {
    let cells = raw
        .split_whitespace()
        .map(|v| v.parse::<CellValue>().ok().filter(|v| (0..=MAX_CELL_VALUE).contains(v)))
        .collect::<Option<Vec<_>>>()?;
    if cells.is_empty() {
        None
    } else {
        Some(cells)
    }
}

fn join_cells(cells: &[CellValue]) -> String {
    cells
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn join_lines(entries: &[ScoreEntry]) -> String {
    entries
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn split_lines(payload: &str) -> Vec<String> {
    payload
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_score_lines(
    command: &'static str,
    payload: &str,
) -> Result<Vec<ScoreEntry>, ProtocolError> {
    payload
        .split('\n')
        .filter(|l| !l.trim().is_empty())
        .map(|l| ScoreEntry::parse(l).ok_or_else(|| bad(command, l)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_piece() {
        assert_eq!(parse_server_message("PIECE 7"), Ok(ServerMessage::Piece(7)));
        assert!(matches!(
            parse_server_message("PIECE 15"),
            Err(ProtocolError::BadPayload { command: "PIECE", .. })
        ));
        assert_eq!(
            parse_server_message("PIECE"),
            Err(ProtocolError::MissingPayload("PIECE"))
        );
    }

    #[test]
    fn test_parse_peer_board() {
        let msg = parse_server_message("BOARD alice:0 1 2 0").unwrap();
        assert_eq!(
            msg,
            ServerMessage::Board {
                user: "alice".to_string(),
                cells: vec![0, 1, 2, 0],
            }
        );
        assert!(parse_server_message("BOARD alice:0 x").is_err());
        assert!(parse_server_message("BOARD 0 1 2").is_err());
    }

    #[test]
    fn test_parse_multiline_scores() {
        let msg = parse_server_message("SCORES bob:20\nalice:150:3\n").unwrap();
        assert_eq!(
            msg,
            ServerMessage::Scores(vec![ScoreEntry::new("bob", 20), ScoreEntry::new("alice", 150)])
        );
    }

    #[test]
    fn test_parse_nick_forms() {
        assert_eq!(
            parse_server_message("NICK guest:ann").unwrap(),
            ServerMessage::Nick {
                old: Some("guest".to_string()),
                new: "ann".to_string()
            }
        );
        assert_eq!(
            parse_server_message("NICK ann").unwrap(),
            ServerMessage::Nick {
                old: None,
                new: "ann".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_server_message("WHAT now"),
            Err(ProtocolError::UnknownCommand("WHAT".to_string()))
        );
        assert_eq!(parse_server_message("  "), Err(ProtocolError::Empty));
    }

    #[test]
    fn test_chat_nick_command() {
        assert_eq!(ClientMessage::chat("/nick ann"), ClientMessage::Nick("ann".to_string()));
        assert_eq!(ClientMessage::chat("hello"), ClientMessage::Msg("hello".to_string()));
        assert_eq!(
            ClientMessage::chat("/nickname"),
            ClientMessage::Msg("/nickname".to_string())
        );
    }

    #[test]
    fn test_escape_framing() {
        let raw = "USERS a\nb\\c";
        let line = escape(raw);
        assert!(!line.contains('\n'));
        assert_eq!(unescape(&line), raw);
    }

    #[test]
    fn test_client_encode() {
        assert_eq!(ClientMessage::Board(vec![0, 3, 0]).encode(), "BOARD 0 3 0");
        assert_eq!(ClientMessage::Score(120).to_string(), "SCORE 120");
        assert_eq!(
            ClientMessage::HiScore(ScoreEntry::new("ann", 900)).encode(),
            "HISCORE ann:900"
        );
        assert_eq!(parse_client_message("LIVES 2"), Ok(ClientMessage::Lives(2)));
    }
}
