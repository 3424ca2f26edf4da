use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::client::Client;
use crate::cmd::Cmd;
use crate::connection::Connection;
use crate::frame::Frame;
use crate::reply::FromFrame;
use crate::{Error, Result};

/// Messages buffered between the reader task and [`Subscription::recv`].
const MESSAGE_BUFFER: usize = 128;

/// A message published on one of the subscribed channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub channel: String,
    pub payload: Bytes,
}

/// A live subscription on a dedicated connection.
///
/// The connection never goes through the pool: a subscribed connection cannot run other
/// commands, so it would only take a slot away from regular callers. Dropping the handle
/// ends the reader task and closes the connection.
#[derive(Debug)]
pub struct Subscription {
    channels: Vec<String>,
    messages: mpsc::Receiver<Message>,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Waits for the next message. `None` once the connection is gone.
    pub async fn recv(&mut self) -> Option<Message> {
        self.messages.recv().await
    }

    /// Unsubscribes from every channel and closes the connection.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.messages.close();

        if let Err(err) = (&mut self.task).await {
            warn!(error = %err, "subscription reader task did not finish cleanly");
        }
    }
}

impl Client {
    /// Subscribes to `channels` and returns once the store confirmed every one of them.
    pub async fn subscribe<I, S>(&self, channels: I) -> Result<Subscription>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let channels: Vec<String> = channels.into_iter().map(Into::into).collect();
        let label = channels.join(",");

        match open(self, &channels).await {
            Ok(conn) => {
                info!(channels = %label, connection_id = %conn.id, "subscribed");
                Ok(spawn_reader(conn, channels))
            }
            Err(err) => {
                error!(
                    command = "SUBSCRIBE",
                    key = %label,
                    kind = %err.kind(),
                    error = %err,
                    "command failed"
                );
                Err(err)
            }
        }
    }
}

async fn open(client: &Client, channels: &[String]) -> Result<Connection> {
    // The confirmation loop below would not read the store's error reply.
    if channels.is_empty() {
        return Err(Error::InvalidArgument("subscribe needs at least one channel"));
    }

    let config = client.pool().config();
    let mut conn = Connection::connect(config).await?;

    conn.write_frame(Cmd::new("SUBSCRIBE").keys(channels).into_frame())
        .await?;

    // One confirmation per channel.
    let deadline = config.connect_timeout();
    for _ in channels {
        let frame = match timeout(deadline, conn.read_frame()).await {
            Ok(frame) => frame?.ok_or(Error::Closed)?,
            Err(_) => return Err(Error::Timeout(deadline)),
        };

        match frame {
            Frame::Error(message) => return Err(Error::Store(message)),
            Frame::Array(ref items) if is_kind(items.first(), b"subscribe") => {}
            frame => return Err(Error::unexpected("subscribe confirmation", frame)),
        }
    }

    Ok(conn)
}

fn spawn_reader(mut conn: Connection, channels: Vec<String>) -> Subscription {
    let (tx, rx) = mpsc::channel(MESSAGE_BUFFER);
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                // Fires on `stop` and when the handle is dropped.
                _ = &mut stop_rx => {
                    if let Err(err) = conn.write_frame(Cmd::new("UNSUBSCRIBE").into_frame()).await {
                        debug!(connection_id = %conn.id, error = %err, "unsubscribe failed");
                    }
                    break;
                }
                frame = conn.read_frame() => match frame {
                    Ok(Some(frame)) => {
                        let Some(message) = into_message(frame) else {
                            continue;
                        };
                        if tx.send(message).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        warn!(connection_id = %conn.id, "subscription connection closed by the store");
                        break;
                    }
                    Err(err) => {
                        warn!(connection_id = %conn.id, error = %err, "subscription connection failed");
                        break;
                    }
                }
            }
        }

        debug!(connection_id = %conn.id, "subscription ended");
    });

    Subscription {
        channels,
        messages: rx,
        stop: Some(stop_tx),
        task,
    }
}

/// `["message", channel, payload]`. Other pushes, like confirmations, are skipped.
fn into_message(frame: Frame) -> Option<Message> {
    let Frame::Array(items) = frame else {
        return None;
    };
    if items.len() != 3 || !is_kind(items.first(), b"message") {
        return None;
    }

    let mut items = items.into_iter().skip(1);
    let channel = String::from_frame(items.next()?).ok()?;
    let payload = Bytes::from_frame(items.next()?).ok()?;

    Some(Message { channel, payload })
}

fn is_kind(frame: Option<&Frame>, kind: &[u8]) -> bool {
    matches!(frame, Some(Frame::Bulk(bytes)) if bytes.eq_ignore_ascii_case(kind))
}
