use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::error;

use crate::cmd::Cmd;
use crate::config::PoolConfig;
use crate::frame::Frame;
use crate::pool::Pool;
use crate::reply::FromFrame;
use crate::slowlog::{SlowCommandEvent, SlowLog, DEFAULT_SLOW_THRESHOLD};
use crate::Result;

/// Pooled, instrumented client for a Redis-protocol store.
///
/// Every command runs through [`Client::execute_with`]: lease a connection, send the
/// command, decode the reply, report it if it was slow, log it if it failed, and give the
/// connection back. Clones share the pool.
#[derive(Clone, Debug)]
pub struct Client {
    pool: Pool,
    slowlog: Arc<SlowLog>,
}

pub struct ClientBuilder {
    config: PoolConfig,
    slow_threshold: Duration,
    hook: Option<Arc<dyn Fn(&SlowCommandEvent) + Send + Sync>>,
}

impl ClientBuilder {
    /// Latency from which commands are reported as slow. Defaults to 500ms.
    pub fn slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    /// Called once for every slow command, in addition to the warning log line.
    pub fn on_slow_command<F>(mut self, hook: F) -> Self
    where
        F: Fn(&SlowCommandEvent) + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Result<Client> {
        let mut slowlog = SlowLog::new(
            self.config.host.clone(),
            self.config.port,
            self.slow_threshold,
        );
        if let Some(hook) = self.hook {
            slowlog = slowlog.with_hook(hook);
        }

        let pool = Pool::new(self.config)?;

        Ok(Client {
            pool,
            slowlog: Arc::new(slowlog),
        })
    }
}

impl Client {
    pub fn new(config: PoolConfig) -> Result<Client> {
        Client::builder(config).build()
    }

    pub fn builder(config: PoolConfig) -> ClientBuilder {
        ClientBuilder {
            config,
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
            hook: None,
        }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub(crate) fn slowlog(&self) -> &SlowLog {
        &self.slowlog
    }

    /// Closes the underlying pool. Commands issued afterwards fail with `PoolClosed`.
    pub fn shutdown(&self) {
        self.pool.close();
    }

    /// Runs one command and decodes its reply into `T`.
    pub async fn execute<T: FromFrame>(&self, cmd: Cmd) -> Result<T> {
        self.execute_with(cmd, T::from_frame).await
    }

    /// Sends an arbitrary command and returns the raw reply frame.
    pub async fn query(&self, cmd: Cmd) -> Result<Frame> {
        self.execute_with(cmd, Ok).await
    }

    /// The single acquire, execute, measure, release path shared by every command.
    ///
    /// The lease lives only inside the inner block, so the connection is back in the pool
    /// before anything is logged. Failures are logged once at error level and returned;
    /// successes at or above the slow threshold are reported once.
    pub async fn execute_with<T, F>(&self, cmd: Cmd, decode: F) -> Result<T>
    where
        F: FnOnce(Frame) -> Result<T>,
    {
        let start = Instant::now();
        let command = cmd.name();
        let keys = cmd.key_label();

        let res = async {
            let mut lease = self.pool.acquire().await?;
            let frame = lease.request(cmd).await?;
            decode(frame)
        }
        .await;

        match res {
            Ok(value) => {
                self.slowlog.observe(command, &keys, start.elapsed());
                Ok(value)
            }
            Err(err) => {
                error!(
                    command,
                    key = %keys,
                    kind = %err.kind(),
                    error = %err,
                    "command failed"
                );
                Err(err)
            }
        }
    }
}
