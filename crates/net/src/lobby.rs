//! Lobby state: channels, membership, roster, nickname and chat.

use tracing::{debug, info, warn};

use crate::protocol::{ChatLine, ServerMessage};

/// What changed after a lobby message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyEvent {
    ChannelsUpdated(Vec<String>),
    Joined(String),
    Parted,
    BecameHost,
    Started,
    UsersUpdated(Vec<String>),
    Chat(Vec<ChatLine>),
    NickChanged(String),
    /// Someone else in the roster changed nickname
    UserRenamed { old: String, new: String },
    Error(String),
}

#[derive(Debug, Clone, Default)]
pub struct Lobby {
    nickname: Option<String>,
    channels: Vec<String>,
    channel: Option<String>,
    host: bool,
    started: bool,
    users: Vec<String>,
    chat: Vec<ChatLine>,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a lobby message; None for messages that are not about the lobby
    pub fn apply(&mut self, message: &ServerMessage) -> Option<LobbyEvent> {
        let event = match message {
            ServerMessage::Channels(channels) => {
                self.channels = channels.clone();
                LobbyEvent::ChannelsUpdated(channels.clone())
            }
            ServerMessage::Join(channel) => {
                info!("Joined channel {}", channel);
                self.channel = Some(channel.clone());
                self.host = false;
                self.started = false;
                self.chat.clear();
                LobbyEvent::Joined(channel.clone())
            }
            ServerMessage::Parted => {
                info!("Left channel");
                self.leave_channel();
                LobbyEvent::Parted
            }
            ServerMessage::Host => {
                self.host = true;
                LobbyEvent::BecameHost
            }
            ServerMessage::Start => {
                self.started = true;
                LobbyEvent::Started
            }
            ServerMessage::Users(users) => {
                self.users = users.clone();
                LobbyEvent::UsersUpdated(users.clone())
            }
            ServerMessage::Msg(lines) => {
                self.chat.extend(lines.iter().cloned());
                LobbyEvent::Chat(lines.clone())
            }
            ServerMessage::Nick { old, new } => match self.rename(old.as_deref(), new) {
                Some(old) => LobbyEvent::UserRenamed {
                    old,
                    new: new.clone(),
                },
                None => LobbyEvent::NickChanged(new.clone()),
            },
            ServerMessage::Error(text) => {
                warn!("Server error: {}", text);
                LobbyEvent::Error(text.clone())
            }
            _ => return None,
        };
        Some(event)
    }

    /// Returns the old name when someone else was renamed
    fn rename(&mut self, old: Option<&str>, new: &str) -> Option<String> {
        if let Some(old) = old {
            for user in self.users.iter_mut().filter(|u| u.as_str() == old) {
                *user = new.to_string();
            }
            let ours = match self.nickname.as_deref() {
                None => true,
                Some(current) => current == old,
            };
            if !ours {
                debug!("{} is now {}", old, new);
                return Some(old.to_string());
            }
        }
        info!("Nickname is now {}", new);
        self.nickname = Some(new.to_string());
        None
    }

    fn leave_channel(&mut self) {
        self.channel = None;
        self.host = false;
        self.started = false;
        self.users.clear();
        self.chat.clear();
    }

    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    pub fn is_host(&self) -> bool {
        self.host
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn users(&self) -> &[String] {
        &self.users
    }

    pub fn chat(&self) -> &[ChatLine] {
        &self.chat
    }

    pub fn reset(&mut self) {
        let nickname = self.nickname.take();
        *self = Self {
            nickname,
            ..Self::default()
        };
    }
}
