//! Tunnel session: two copy tasks between a client stream and an origin stream.
//!
//! # Responsibilities
//! - Generate unique session IDs for tracing
//! - Run client→origin and origin→client copies as independent tasks
//! - Join both tasks before the session is considered finished
//! - Drop (close) both streams once the join completes
//!
//! # Design Decisions
//! - A direction that reaches EOF shuts down its write side and stops;
//!   the other direction keeps running until its own source ends
//! - Mid-stream I/O errors are logged, never reported to the peers
//! - Optional per-read idle deadline, off by default

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinError;

/// Global atomic counter for session IDs.
static SESSION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

const COPY_BUFFER_SIZE: usize = 16 * 1024;

/// Unique identifier for a tunnel session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Generate a new unique session ID.
    pub fn new() -> Self {
        Self(SESSION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tunnel-{}", self.0)
    }
}

/// Copy direction within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToOrigin,
    OriginToClient,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::ClientToOrigin => f.write_str("client->origin"),
            Direction::OriginToClient => f.write_str("origin->client"),
        }
    }
}

/// Bytes relayed in each direction over a session's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub client_to_origin: u64,
    pub origin_to_client: u64,
}

/// A client stream paired with an origin stream.
pub struct TunnelSession<C, O> {
    id: SessionId,
    client: C,
    origin: O,
    idle_timeout: Option<Duration>,
}

impl<C, O> TunnelSession<C, O>
where
    C: AsyncRead + AsyncWrite + Send + 'static,
    O: AsyncRead + AsyncWrite + Send + 'static,
{
    pub fn new(id: SessionId, client: C, origin: O) -> Self {
        Self {
            id,
            client,
            origin,
            idle_timeout: None,
        }
    }

    /// End a direction when its source stays silent for `timeout`.
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Relay bytes in both directions until both have finished.
    ///
    /// Both streams are closed when this returns.
    pub async fn relay(self) -> RelayStats {
        let id = self.id;
        let idle = self.idle_timeout;
        let (client_rd, client_wr) = tokio::io::split(self.client);
        let (origin_rd, origin_wr) = tokio::io::split(self.origin);

        let upstream = tokio::spawn(pipe(client_rd, origin_wr, idle));
        let downstream = tokio::spawn(pipe(origin_rd, client_wr, idle));

        let (upstream, downstream) = tokio::join!(upstream, downstream);

        RelayStats {
            client_to_origin: finish(id, Direction::ClientToOrigin, upstream),
            origin_to_client: finish(id, Direction::OriginToClient, downstream),
        }
    }
}

fn finish(id: SessionId, direction: Direction, joined: Result<Copied, JoinError>) -> u64 {
    match joined {
        Ok(Copied { bytes, result: Ok(()) }) => {
            tracing::trace!(session = %id, %direction, bytes, "Direction reached EOF");
            bytes
        }
        Ok(Copied { bytes, result: Err(e) }) => {
            tracing::debug!(session = %id, %direction, bytes, error = %e, "Direction ended with I/O error");
            bytes
        }
        Err(e) => {
            tracing::error!(session = %id, %direction, error = %e, "Copy task failed");
            0
        }
    }
}

struct Copied {
    bytes: u64,
    result: io::Result<()>,
}

async fn pipe<R, W>(mut src: R, mut dst: W, idle: Option<Duration>) -> Copied
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut bytes = 0;
    let result = copy_until_eof(&mut src, &mut dst, idle, &mut bytes).await;
    Copied { bytes, result }
}

async fn copy_until_eof<R, W>(
    src: &mut R,
    dst: &mut W,
    idle: Option<Duration>,
    copied: &mut u64,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    loop {
        let read = match idle {
            Some(limit) => tokio::time::timeout(limit, src.read(&mut buf))
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "tunnel idle timeout"))??,
            None => src.read(&mut buf).await?,
        };
        if read == 0 {
            break;
        }
        dst.write_all(&buf[..read]).await?;
        *copied += read as u64;
    }
    dst.shutdown().await
}
