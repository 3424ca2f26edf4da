use std::time::Instant;

use itertools::Itertools;
use tracing::{debug, error};

use crate::client::Client;
use crate::cmd::{Cmd, ToArg};
use crate::frame::Frame;
use crate::Result;

/// A batch of write commands sent over one connection in a single round trip.
///
/// Commands run in the order they were queued. The batch is not atomic: if the transport
/// fails halfway, a prefix of the commands may already have been applied.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    cmds: Vec<Cmd>,
}

impl Pipeline {
    pub fn new() -> Pipeline {
        Pipeline::default()
    }

    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    /// Queues an arbitrary command.
    pub fn cmd(&mut self, cmd: Cmd) -> &mut Self {
        self.cmds.push(cmd);
        self
    }

    pub fn set(&mut self, key: &str, value: impl ToArg) -> &mut Self {
        self.cmd(Cmd::new("SET").key(key).arg(value))
    }

    pub fn sadd<I>(&mut self, key: &str, members: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.cmd(Cmd::new("SADD").key(key).args(members))
    }

    pub fn zadd(&mut self, key: &str, score: f64, member: impl ToArg) -> &mut Self {
        self.cmd(Cmd::new("ZADD").key(key).arg(score).arg(member))
    }

    pub fn hmset<I, F, V>(&mut self, key: &str, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (F, V)>,
        F: ToArg,
        V: ToArg,
    {
        let cmd = entries
            .into_iter()
            .fold(Cmd::new("HMSET").key(key), |cmd, (field, value)| {
                cmd.arg(field).arg(value)
            });
        self.cmd(cmd)
    }

    pub fn hset(&mut self, key: &str, field: impl ToArg, value: impl ToArg) -> &mut Self {
        self.cmd(Cmd::new("HSET").key(key).arg(field).arg(value))
    }

    pub fn hsetnx(&mut self, key: &str, field: impl ToArg, value: impl ToArg) -> &mut Self {
        self.cmd(Cmd::new("HSETNX").key(key).arg(field).arg(value))
    }

    pub fn lpush<I>(&mut self, key: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.cmd(Cmd::new("LPUSH").key(key).args(values))
    }

    pub fn lpushx<I>(&mut self, key: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.cmd(Cmd::new("LPUSHX").key(key).args(values))
    }

    pub fn rpush<I>(&mut self, key: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.cmd(Cmd::new("RPUSH").key(key).args(values))
    }

    pub fn rpushx<I>(&mut self, key: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.cmd(Cmd::new("RPUSHX").key(key).args(values))
    }

    /// Distinct keys touched by the batch, in first-seen order.
    fn key_label(&self) -> String {
        self.cmds
            .iter()
            .map(Cmd::key_label)
            .filter(|label| !label.is_empty())
            .unique()
            .join(",")
    }
}

impl Client {
    /// Sends every queued command over one lease and waits for all replies.
    ///
    /// Succeeds once every reply has been read, even if the store rejected individual
    /// commands; those are only counted in a debug line. Fails on any transport or framing
    /// fault. An empty pipeline returns immediately without touching the pool.
    pub async fn execute_pipeline(&self, pipeline: Pipeline) -> Result<()> {
        if pipeline.is_empty() {
            return Ok(());
        }

        let start = Instant::now();
        let keys = pipeline.key_label();
        let count = pipeline.len();

        let res = async {
            let mut lease = self.pool().acquire().await?;
            lease.pipeline(pipeline.cmds).await
        }
        .await;

        match res {
            Ok(replies) => {
                let rejected = replies
                    .iter()
                    .filter(|reply| matches!(reply, Frame::Error(_)))
                    .count();
                if rejected > 0 {
                    debug!(key = %keys, commands = count, rejected, "pipeline replies included store errors");
                }

                self.slowlog().observe("PIPELINE", &keys, start.elapsed());
                Ok(())
            }
            Err(err) => {
                error!(
                    command = "PIPELINE",
                    key = %keys,
                    commands = count,
                    kind = %err.kind(),
                    error = %err,
                    "pipeline failed"
                );
                Err(err)
            }
        }
    }

    /// Sets each pair with its own `SET`, pipelined.
    pub async fn set_many<I, K, V>(&self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToArg,
    {
        let mut pipeline = Pipeline::new();
        for (key, value) in pairs {
            pipeline.set(key.as_ref(), value);
        }
        self.execute_pipeline(pipeline).await
    }

    /// One `SADD` per member.
    pub async fn sadd_many<I>(&self, key: &str, members: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        let mut pipeline = Pipeline::new();
        for member in members {
            pipeline.sadd(key, [member]);
        }
        self.execute_pipeline(pipeline).await
    }

    pub async fn zadd_many<I, M>(&self, key: &str, members: I) -> Result<()>
    where
        I: IntoIterator<Item = (f64, M)>,
        M: ToArg,
    {
        let mut pipeline = Pipeline::new();
        for (score, member) in members {
            pipeline.zadd(key, score, member);
        }
        self.execute_pipeline(pipeline).await
    }

    /// One `HMSET` per group of entries.
    pub async fn hmset_many<I, E, F, V>(&self, key: &str, groups: I) -> Result<()>
    where
        I: IntoIterator<Item = E>,
        E: IntoIterator<Item = (F, V)>,
        F: ToArg,
        V: ToArg,
    {
        let mut pipeline = Pipeline::new();
        for entries in groups {
            pipeline.hmset(key, entries);
        }
        self.execute_pipeline(pipeline).await
    }

    pub async fn hset_many<I, F, V>(&self, key: &str, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (F, V)>,
        F: ToArg,
        V: ToArg,
    {
        let mut pipeline = Pipeline::new();
        for (field, value) in entries {
            pipeline.hset(key, field, value);
        }
        self.execute_pipeline(pipeline).await
    }

    pub async fn hsetnx_many<I, F, V>(&self, key: &str, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (F, V)>,
        F: ToArg,
        V: ToArg,
    {
        let mut pipeline = Pipeline::new();
        for (field, value) in entries {
            pipeline.hsetnx(key, field, value);
        }
        self.execute_pipeline(pipeline).await
    }

    pub async fn lpush_many<I>(&self, key: &str, values: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        let mut pipeline = Pipeline::new();
        for value in values {
            pipeline.lpush(key, [value]);
        }
        self.execute_pipeline(pipeline).await
    }

    pub async fn lpushx_many<I>(&self, key: &str, values: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        let mut pipeline = Pipeline::new();
        for value in values {
            pipeline.lpushx(key, [value]);
        }
        self.execute_pipeline(pipeline).await
    }

    pub async fn rpush_many<I>(&self, key: &str, values: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        let mut pipeline = Pipeline::new();
        for value in values {
            pipeline.rpush(key, [value]);
        }
        self.execute_pipeline(pipeline).await
    }

    pub async fn rpushx_many<I>(&self, key: &str, values: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        let mut pipeline = Pipeline::new();
        for value in values {
            pipeline.rpushx(key, [value]);
        }
        self.execute_pipeline(pipeline).await
    }
}
