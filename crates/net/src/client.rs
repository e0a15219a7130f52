//! TCP client for the game server
//!
//! One task writes queued [`ClientMessage`]s as escaped lines; another reads
//! lines, unescapes them and hands them to the [`MultiplayerSession`]. The
//! sync game loop talks to both through [`Connection`], which owns the tokio
//! runtime.

use std::net::SocketAddr;
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::piece_queue::RefillPolicy;
use crate::protocol::{escape, unescape, ClientMessage};
use crate::session::{MultiplayerSession, SessionConfig, SessionEvent};
use crate::types::{GRID_COLS, GRID_ROWS};

/// Client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub host: String,
    pub port: u16,
    pub refill_timeout: Duration,
    pub refill_attempts: u32,
    pub nickname: Option<String>,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9700,
            refill_timeout: Duration::from_millis(5000),
            refill_attempts: 3,
            nickname: None,
        }
    }
}

impl NetConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();

        let host = env::var("TETRECS_HOST").unwrap_or(defaults.host);
        let port = env::var("TETRECS_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let refill_timeout = env::var("TETRECS_REFILL_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.refill_timeout);

        let refill_attempts = env::var("TETRECS_REFILL_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.refill_attempts);

        let nickname = env::var("TETRECS_NICK")
            .ok()
            .map(|s| s.trim().to_string())
            .and_then(|s| if s.is_empty() { None } else { Some(s) });

        Self {
            host,
            port,
            refill_timeout,
            refill_attempts,
            nickname,
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid server address {}:{}", self.host, self.port))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            cols: GRID_COLS,
            rows: GRID_ROWS,
            refill: RefillPolicy {
                timeout: self.refill_timeout,
                attempts: self.refill_attempts,
            },
        }
    }
}

/// Write every queued message as one escaped line until the queue closes
pub async fn write_outbound<W>(
    mut writer: W,
    mut outbound: mpsc::UnboundedReceiver<ClientMessage>,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = outbound.recv().await {
        let mut line = escape(&message.encode());
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}

/// Feed every inbound line to `session` until the server hangs up
///
/// Events are forwarded on `events` when someone is listening.
pub async fn read_inbound<R>(
    reader: R,
    session: Arc<MultiplayerSession>,
    mut events: Option<std_mpsc::Sender<SessionEvent>>,
) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        let line = unescape(line.trim_end_matches('\r'));
        if line.trim().is_empty() {
            continue;
        }
        debug!("Received {:?}", line);
        if let Some(event) = session.handle_line(&line) {
            if let Some(tx) = events.as_ref() {
                if tx.send(event).is_err() {
                    debug!("Event listener gone, no longer forwarding events");
                    events = None;
                }
            }
        }
    }
    Ok(())
}

/// Connect to `addr` and run both halves until the server disconnects
pub async fn run_client(
    addr: SocketAddr,
    session: Arc<MultiplayerSession>,
    outbound: mpsc::UnboundedReceiver<ClientMessage>,
    events: Option<std_mpsc::Sender<SessionEvent>>,
) -> anyhow::Result<()> {
    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("connecting to {}", addr))?;
    info!("Connected to {}", addr);
    serve_stream(stream, session, outbound, events).await
}

async fn serve_stream(
    stream: TcpStream,
    session: Arc<MultiplayerSession>,
    outbound: mpsc::UnboundedReceiver<ClientMessage>,
    events: Option<std_mpsc::Sender<SessionEvent>>,
) -> anyhow::Result<()> {
    let (reader, writer) = stream.into_split();

    let write_task = tokio::spawn(async move {
        if let Err(e) = write_outbound(writer, outbound).await {
            warn!("Write failed: {}", e);
        }
    });

    let result = read_inbound(reader, Arc::clone(&session), events).await;
    session.disconnected();
    write_task.abort();
    result
}

/// Running connection: a private runtime plus the session it feeds
pub struct Connection {
    rt: Runtime,
    events: std_mpsc::Receiver<SessionEvent>,
}

impl Connection {
    /// Connect and start the reader and writer tasks
    pub fn connect(
        config: &NetConfig,
        session: Arc<MultiplayerSession>,
        outbound: mpsc::UnboundedReceiver<ClientMessage>,
    ) -> anyhow::Result<Self> {
        let addr = config.socket_addr()?;
        let rt = Runtime::new().context("failed to create tokio runtime")?;

        let stream = rt
            .block_on(TcpStream::connect(addr))
            .with_context(|| format!("connecting to {}", addr))?;
        info!("Connected to {}", addr);

        let (events_tx, events) = std_mpsc::channel();
        rt.spawn(async move {
            if let Err(e) = serve_stream(stream, session, outbound, Some(events_tx)).await {
                warn!("Connection ended: {}", e);
            }
        });

        Ok(Self { rt, events })
    }

    /// Next session event, waiting at most `timeout`
    pub fn recv_timeout(&self, timeout: Duration) -> Option<SessionEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    /// Drain events that already arrived
    pub fn poll_events(&self) -> Vec<SessionEvent> {
        self.events.try_iter().collect()
    }

    /// Stop the network tasks, giving queued writes a moment to flush
    pub fn shutdown(self) {
        self.rt.shutdown_timeout(Duration::from_millis(200));
    }
}
