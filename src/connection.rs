use std::time::{Duration, Instant};

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::cmd::Cmd;
use crate::codec::FrameCodec;
use crate::config::PoolConfig;
use crate::frame::Frame;
use crate::{Error, Result};

/// One physical link to the store.
///
/// Replies are read from the socket into the codec's buffer and parsed into frames as soon
/// as a complete one is available. Every exchange is bounded by `io_timeout`.
pub struct Connection {
    pub id: Uuid,
    framed: Framed<TcpStream, FrameCodec>,
    io_timeout: Duration,
    created_at: Instant,
}

impl Connection {
    pub fn new(stream: TcpStream, io_timeout: Duration) -> Connection {
        Connection {
            id: Uuid::new_v4(),
            framed: Framed::new(stream, FrameCodec::new()),
            io_timeout,
            created_at: Instant::now(),
        }
    }

    /// Opens a connection and runs the handshake: when a password is configured the
    /// connection authenticates and selects the configured database, otherwise it stays
    /// on the default database.
    #[instrument(name = "connect", skip(config), fields(address = %config.address()))]
    pub async fn connect(config: &PoolConfig) -> Result<Connection> {
        let connect_timeout = config.connect_timeout();
        let stream = match timeout(
            connect_timeout,
            TcpStream::connect((config.host.as_str(), config.port)),
        )
        .await
        {
            Ok(stream) => stream?,
            Err(_) => return Err(Error::Timeout(connect_timeout)),
        };
        // Commands are small; waiting to coalesce them only adds latency.
        stream.set_nodelay(true)?;

        let mut conn = Connection::new(stream, connect_timeout);

        if let Some(token) = config.auth_token() {
            conn.request(Cmd::new("AUTH").arg(token)).await?;
            conn.request(Cmd::new("SELECT").arg(config.database)).await?;
        }

        debug!(connection_id = %conn.id, "connection established");

        Ok(conn)
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Sends one command and waits for its reply. An error reply from the store becomes
    /// [`Error::Store`]; the connection stays usable in that case.
    pub async fn request(&mut self, cmd: Cmd) -> Result<Frame> {
        let deadline = self.io_timeout.saturating_add(cmd.block_time());
        self.write_frame(cmd.into_frame()).await?;

        match self.read_reply(deadline).await? {
            Frame::Error(message) => Err(Error::Store(message)),
            frame => Ok(frame),
        }
    }

    /// Writes every command before reading any reply, flushing once, then collects one
    /// raw reply per command in submission order. Error replies are returned as frames.
    pub async fn pipeline(&mut self, cmds: Vec<Cmd>) -> Result<Vec<Frame>> {
        let count = cmds.len();
        let io_timeout = self.io_timeout;

        let write = async {
            for cmd in cmds {
                self.framed.feed(cmd.into_frame()).await?;
            }
            self.framed.flush().await
        };
        match timeout(io_timeout, write).await {
            Ok(res) => res?,
            Err(_) => return Err(Error::Timeout(io_timeout)),
        }

        let mut replies = Vec::with_capacity(count);
        for _ in 0..count {
            replies.push(self.read_reply(io_timeout).await?);
        }

        Ok(replies)
    }

    /// Liveness check used when handing out idle connections.
    pub async fn ping(&mut self) -> bool {
        matches!(
            self.request(Cmd::new("PING")).await,
            Ok(Frame::Simple(ref pong)) if pong.eq_ignore_ascii_case("PONG")
        )
    }

    pub(crate) async fn write_frame(&mut self, frame: Frame) -> Result<()> {
        match timeout(self.io_timeout, self.framed.send(frame)).await {
            Ok(res) => res,
            Err(_) => Err(Error::Timeout(self.io_timeout)),
        }
    }

    /// Reads the next frame without a deadline. `None` means the store closed the
    /// connection cleanly.
    pub(crate) async fn read_frame(&mut self) -> Result<Option<Frame>> {
        self.framed.next().await.transpose()
    }

    async fn read_reply(&mut self, deadline: Duration) -> Result<Frame> {
        match timeout(deadline, self.framed.next()).await {
            Ok(Some(frame)) => frame,
            Ok(None) => Err(Error::Closed),
            Err(_) => Err(Error::Timeout(deadline)),
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("io_timeout", &self.io_timeout)
            .field("age", &self.age())
            .finish_non_exhaustive()
    }
}
