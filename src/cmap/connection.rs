use std::time::Duration;

use tokio::{
    io::AsyncWriteExt,
    net::TcpStream,
    time::timeout,
};

use crate::{
    error::{Error, ErrorKind, Result},
    wire::{Header, Message, HEADER_LENGTH},
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const KEEPALIVE_IDLE: Duration = Duration::from_secs(4);
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(3);
const KEEPALIVE_RETRIES: u32 = 2;
const MAX_RECEIVE_ATTEMPTS: u32 = 10_000;
const COOPERATIVE_BACKOFF: Duration = Duration::from_millis(1);
const BLOCKING_BACKOFF_START: Duration = Duration::from_micros(100);
const BLOCKING_BACKOFF_CAP: Duration = Duration::from_millis(10);

/// Selects which of the two backoff strategies `receive` uses while waiting for more bytes, and
/// documents the scheduling model the connection was constructed for (spec.md §5). The wire
/// behavior is identical either way; `Connection` always suspends only at `connect`/`send`/
/// `receive`, so a single-threaded async runtime is all "cooperative" mode requires and a
/// dedicated OS thread (see [`crate::sync`]) is all "blocking" mode requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduling {
    /// One OS thread per connection is adequate; `receive` backs off with a growing delay.
    Blocking,
    /// A single-threaded cooperative event loop; `receive` backs off with a flat 1ms delay.
    Cooperative,
}

/// The TCP transport underneath the Framer: connect/send/receive/close, per spec.md §4.2.
#[derive(Debug)]
pub(crate) struct Connection {
    stream: TcpStream,
    host: String,
    port: u16,
    mode: Scheduling,
    connection_id: String,
    connected: bool,
}

impl Connection {
    pub(crate) async fn connect(host: &str, port: u16, mode: Scheduling) -> Result<Self> {
        let stream = Self::dial(host, port).await?;
        Ok(Self {
            stream,
            host: host.to_string(),
            port,
            mode,
            connection_id: uuid::Uuid::new_v4().to_string(),
            connected: true,
        })
    }

    async fn dial(host: &str, port: u16) -> Result<TcpStream> {
        let addr = format!("{host}:{port}");
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(&addr))
            .await
            .map_err(|_| connection_error(format!("timed out connecting to {addr}")))?
            .map_err(|e| connection_error(format!("failed to connect to {addr}: {e}")))?;

        stream.set_nodelay(true)?;
        apply_keepalive(&stream)?;

        Ok(stream)
    }

    pub(crate) fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected
    }

    /// Writes `bytes`, attempting a single reconnect if the first write fails (spec.md §4.2).
    pub(crate) async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        if self.write_all(bytes).await.is_ok() {
            return Ok(());
        }

        self.stream = Self::dial(&self.host, self.port)
            .await
            .map_err(|e| transport_error(format!("reconnect failed: {e}")))?;

        self.write_all(bytes).await.map_err(|e| {
            transport_error(format!("write failed even after reconnecting: {e}"))
        })
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Reads and frames one complete `OP_MSG` response, per spec.md §4.1/§4.2.
    pub(crate) async fn receive(&mut self) -> Result<Message> {
        let mut header_buf = [0u8; HEADER_LENGTH];
        self.read_with_backoff(&mut header_buf).await?;
        let header = Header::decode(&header_buf)?;

        let rest_len = (header.length as usize).saturating_sub(HEADER_LENGTH);
        let mut rest = vec![0u8; rest_len];
        self.read_with_backoff(&mut rest).await?;

        Message::decode(header, &rest)
    }

    /// Fills `buf` completely, backing off on `WouldBlock`/empty reads per the mode-specific
    /// strategy described in spec.md §4.2, failing with `ReceiveTimeout` after 10,000 attempts.
    async fn read_with_backoff(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        let mut attempts = 0u32;
        let mut backoff = match self.mode {
            Scheduling::Cooperative => COOPERATIVE_BACKOFF,
            Scheduling::Blocking => BLOCKING_BACKOFF_START,
        };

        while filled < buf.len() {
            self.stream.readable().await?;
            match self.stream.try_read(&mut buf[filled..]) {
                Ok(0) => {
                    self.connected = false;
                    return Err(transport_error("connection closed by peer"));
                }
                Ok(n) => {
                    filled += n;
                    attempts = 0;
                    backoff = match self.mode {
                        Scheduling::Cooperative => COOPERATIVE_BACKOFF,
                        Scheduling::Blocking => BLOCKING_BACKOFF_START,
                    };
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    attempts += 1;
                    if attempts >= MAX_RECEIVE_ATTEMPTS {
                        return Err(ErrorKind::ReceiveTimeout.into());
                    }
                    tokio::time::sleep(backoff).await;
                    if self.mode == Scheduling::Blocking {
                        backoff = (backoff * 2).min(BLOCKING_BACKOFF_CAP);
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    pub(crate) async fn close(&mut self) {
        let _ = self.stream.shutdown().await;
        self.connected = false;
    }
}

fn apply_keepalive(stream: &TcpStream) -> Result<()> {
    let socket = socket2::SockRef::from(stream);
    let keepalive = socket2::TcpKeepalive::new()
        .with_time(KEEPALIVE_IDLE)
        .with_interval(KEEPALIVE_INTERVAL);
    #[cfg(not(any(target_os = "windows", target_os = "openbsd", target_os = "haiku")))]
    let keepalive = keepalive.with_retries(KEEPALIVE_RETRIES);
    socket.set_tcp_keepalive(&keepalive)?;
    Ok(())
}

fn connection_error(message: impl Into<String>) -> Error {
    ErrorKind::Connection {
        message: message.into(),
    }
    .into()
}

fn transport_error(message: impl Into<String>) -> Error {
    ErrorKind::Transport {
        message: message.into(),
    }
    .into()
}
