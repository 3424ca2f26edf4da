use std::time::Duration;

use crate::client::Client;
use crate::cmd::{Cmd, ToArg};
use crate::reply::pairs;
use crate::Result;

impl Client {
    /// Prepends values in argument order and returns the new length.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/lpush/>
    pub async fn lpush<I>(&self, key: &str, values: I) -> Result<i64>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute(Cmd::new("LPUSH").key(key).args(values)).await
    }

    /// Like [`Client::lpush`], but only when the list already exists. Returns 0 otherwise.
    pub async fn lpushx<I>(&self, key: &str, values: I) -> Result<i64>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute(Cmd::new("LPUSHX").key(key).args(values)).await
    }

    pub async fn rpush<I>(&self, key: &str, values: I) -> Result<i64>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute(Cmd::new("RPUSH").key(key).args(values)).await
    }

    pub async fn rpushx<I>(&self, key: &str, values: I) -> Result<i64>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute(Cmd::new("RPUSHX").key(key).args(values)).await
    }

    pub async fn lpop(&self, key: &str) -> Result<Option<String>> {
        self.execute(Cmd::new("LPOP").key(key)).await
    }

    pub async fn rpop(&self, key: &str) -> Result<Option<String>> {
        self.execute(Cmd::new("RPOP").key(key)).await
    }

    /// Waits up to `timeout` for an element to pop from the tail of the first non-empty
    /// list among `keys`. Returns the list's key and the element, or `None` on timeout. A
    /// zero timeout waits indefinitely.
    ///
    /// The lease is held for the whole wait.
    pub async fn brpop<I>(&self, keys: I, timeout: Duration) -> Result<Option<(String, String)>>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        let block = if timeout.is_zero() {
            Duration::MAX
        } else {
            timeout
        };
        let cmd = Cmd::new("BRPOP")
            .keys(keys)
            .arg(timeout.as_secs_f64())
            .blocking(block);

        self.execute_with(cmd, |frame| {
            Ok(pairs::<String, String>(frame)?.into_iter().next())
        })
        .await
    }

    pub async fn lindex(&self, key: &str, index: i64) -> Result<Option<String>> {
        self.execute(Cmd::new("LINDEX").key(key).arg(index)).await
    }

    pub async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        self.execute(Cmd::new("LRANGE").key(key).arg(start).arg(stop))
            .await
    }

    /// Removes occurrences of `value`: the first `count` from the head when positive, from
    /// the tail when negative, all of them when zero.
    pub async fn lrem(&self, key: &str, count: i64, value: impl ToArg) -> Result<i64> {
        self.execute(Cmd::new("LREM").key(key).arg(count).arg(value))
            .await
    }

    pub async fn lset(&self, key: &str, index: i64, value: impl ToArg) -> Result<()> {
        self.execute(Cmd::new("LSET").key(key).arg(index).arg(value))
            .await
    }

    pub async fn ltrim(&self, key: &str, start: i64, stop: i64) -> Result<()> {
        self.execute(Cmd::new("LTRIM").key(key).arg(start).arg(stop))
            .await
    }

    pub async fn llen(&self, key: &str) -> Result<i64> {
        self.execute(Cmd::new("LLEN").key(key)).await
    }
}
