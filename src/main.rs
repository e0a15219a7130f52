//! TetrECS console runner (default binary).
//!
//! `tetrecs solo` plays locally; `tetrecs multi <channel>` joins a channel on
//! the server named by `TETRECS_HOST`/`TETRECS_PORT` and plays once the host
//! starts the game. Commands are read from stdin one per line:
//! `place x y`, `rotate [n]`, `left`, `right`, `swap`, `status`, `msg <text>`,
//! `start` (host only, before the game) and `quit`.

use std::io::BufRead;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tetrecs::core::{Game, Placement, RandomPieces};
use tetrecs::engine::{AudioCues, EffectSink, GameHandle, TimerConfig};
use tetrecs::net::{
    ChannelTransport, Connection, LobbyEvent, MultiplayerSession, NetConfig, SessionEvent,
};
use tetrecs::store::{ScoreTable, Settings, StoreConfig};
use tetrecs::types::{GameAction, GRID_COLS, GRID_ROWS};

const POLL: Duration = Duration::from_millis(100);
const HISCORES_WAIT: Duration = Duration::from_secs(2);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("solo") => run_solo(),
        Some("multi") => match args.get(1) {
            Some(channel) => run_multi(channel),
            None => bail!("usage: tetrecs multi <channel>"),
        },
        Some(other) => bail!("unknown mode {:?}; expected solo or multi <channel>", other),
    }
}

/// Lines typed on stdin, read on a separate thread
fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn player_name() -> String {
    std::env::var("TETRECS_NICK")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "Player".to_string())
}

enum Flow {
    Continue,
    Quit,
}

/// Apply one command line to the running game
fn apply_command(handle: &GameHandle, line: &str, chat: Option<&MultiplayerSession>) -> Result<Flow> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Flow::Continue);
    }
    if line == "status" {
        println!("{}", serde_json::to_string(&handle.snapshot())?);
        return Ok(Flow::Continue);
    }
    if let Some(text) = line.strip_prefix("msg ") {
        match chat {
            Some(session) => session.send_chat(text),
            None => println!("chat is only available in multiplayer"),
        }
        return Ok(Flow::Continue);
    }

    match GameAction::from_str(line) {
        Some(GameAction::Place { x, y }) => match handle.place_block(x, y) {
            Placement::Placed { cleared, points } if !cleared.is_empty() => {
                println!("cleared {} lines for {} points", cleared.lines, points);
            }
            Placement::Placed { .. } => {}
            Placement::Rejected => println!("cannot place there"),
            Placement::Ignored => println!("game is not running"),
        },
        Some(GameAction::Rotate(n)) => handle.rotate_current_piece(n),
        Some(GameAction::Swap) => handle.swap_current_piece(),
        Some(GameAction::Quit) => return Ok(Flow::Quit),
        None => println!("unknown command {:?}", line),
    }
    Ok(Flow::Continue)
}

fn print_board(handle: &GameHandle) {
    handle.with_game(|game| {
        for row in game.grid().rows_iter() {
            let cells: Vec<String> = row.iter().map(|v| format!("{:>2}", v)).collect();
            println!("{}", cells.join(" "));
        }
        let current = game.current_piece().map(|p| p.to_string()).unwrap_or_default();
        let next = game.next_piece().map(|p| p.to_string()).unwrap_or_default();
        println!(
            "score {} level {} lives {} x{} | current {} | next {}",
            game.score(),
            game.level(),
            game.lives(),
            game.multiplier(),
            current,
            next
        );
    });
}

fn run_solo() -> Result<()> {
    let store = StoreConfig::from_env();
    let settings = Settings::load_or_default(&store.settings_path);
    let mut scores = ScoreTable::load_or_default(&store.scores_path);

    let sink: Arc<dyn EffectSink> = Arc::new(AudioCues::new(settings.muted));
    let game = Game::new(GRID_COLS, GRID_ROWS, RandomPieces::from_time())
        .with_high_score(scores.top_score());
    let mut handle = GameHandle::start(game, sink, TimerConfig::default());
    print_board(&handle);

    let input = stdin_lines();
    while !handle.is_over() {
        match input.recv_timeout(POLL) {
            Ok(line) => {
                if let Flow::Quit = apply_command(&handle, &line, None)? {
                    break;
                }
                print_board(&handle);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    handle.leave();

    let score = handle.snapshot().score;
    println!("game over, final score {}", score);
    if scores.qualifies(score) {
        let name = player_name();
        if let Some(rank) = scores.insert(&name, score) {
            println!("new local high score, rank {}", rank + 1);
            if let Err(e) = scores.save(&store.scores_path) {
                warn!("Could not save scores: {}", e);
            }
        }
    }
    Ok(())
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::Lobby(LobbyEvent::Chat(lines)) => {
            for line in lines {
                println!("<{}> {}", line.from, line.text);
            }
        }
        SessionEvent::Lobby(LobbyEvent::Error(text)) => println!("server error: {}", text),
        SessionEvent::Lobby(LobbyEvent::UsersUpdated(users)) => {
            println!("players: {}", users.join(", "))
        }
        SessionEvent::Lobby(LobbyEvent::BecameHost) => println!("you are the host; type start"),
        SessionEvent::Lobby(LobbyEvent::UserRenamed { old, new }) => {
            println!("{} is now {}", old, new)
        }
        SessionEvent::PeerDied(user) => println!("{} is out", user),
        SessionEvent::Scores(rows) => {
            for row in rows {
                let mark = if row.dead { " (dead)" } else { "" };
                println!("{:>8} {}{}", row.score, row.name, mark);
            }
        }
        _ => {}
    }
}

fn run_multi(channel: &str) -> Result<()> {
    let config = NetConfig::from_env();
    let store = StoreConfig::from_env();
    let settings = Settings::load_or_default(&store.settings_path);

    let (transport, outbound) = ChannelTransport::channel();
    let session = Arc::new(MultiplayerSession::new(
        Arc::new(transport),
        config.session_config(),
    ));
    let connection = Connection::connect(&config, Arc::clone(&session), outbound)?;

    if let Some(nick) = config.nickname.as_deref() {
        session.send_chat(&format!("/nick {}", nick));
    }
    session.join_channel(channel);

    let input = stdin_lines();

    // Lobby: chat and wait for the host to start
    let mut started = false;
    while !started {
        for event in connection.poll_events() {
            print_event(&event);
            if event == SessionEvent::Lobby(LobbyEvent::Started) {
                started = true;
            }
        }
        if started {
            break;
        }
        match input.recv_timeout(POLL) {
            Ok(line) => match line.trim() {
                "start" => session.start_game(),
                "quit" => {
                    session.leave();
                    connection.shutdown();
                    return Ok(());
                }
                other => {
                    if let Some(text) = other.strip_prefix("msg ") {
                        session.send_chat(text);
                    }
                }
            },
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                session.leave();
                connection.shutdown();
                return Ok(());
            }
        }
    }

    info!("Game starting in {}", channel);
    let sink: Arc<dyn EffectSink> = Arc::new(AudioCues::new(settings.muted));
    let mut handle = GameHandle::start(session.new_game(), sink, TimerConfig::default());
    {
        let session = Arc::clone(&session);
        handle.on_leave(move || session.abort_waiters());
    }
    print_board(&handle);

    while !handle.is_over() {
        for event in connection.poll_events() {
            print_event(&event);
        }
        match input.recv_timeout(POLL) {
            Ok(line) => {
                if let Flow::Quit = apply_command(&handle, &line, Some(&session))? {
                    break;
                }
                print_board(&handle);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    handle.leave();

    let score = handle.snapshot().score;
    println!("game over, final score {}", score);

    session.request_hiscores();
    let deadline = Instant::now() + HISCORES_WAIT;
    while session.hiscores().is_none() && Instant::now() < deadline {
        if let Some(event) = connection.recv_timeout(POLL) {
            print_event(&event);
        }
    }
    let name = session.nickname().unwrap_or_else(player_name);
    if session.submit_high_score(&name, score) {
        println!("new global high score");
    }

    session.leave();
    connection.shutdown();
    Ok(())
}
