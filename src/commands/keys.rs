use std::collections::HashSet;
use std::time::Duration;

use crate::client::Client;
use crate::cmd::{Cmd, ToArg};
use crate::Result;

impl Client {
    pub async fn exists(&self, key: &str) -> Result<bool> {
        self.execute(Cmd::new("EXISTS").key(key)).await
    }

    /// Removes the given keys and returns how many existed.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/del/>
    pub async fn del<I>(&self, keys: I) -> Result<i64>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute(Cmd::new("DEL").keys(keys)).await
    }

    /// Sets a time to live in whole seconds. Returns `false` when the key does not exist.
    /// Use [`Client::pexpire`] for sub-second precision.
    pub async fn expire(&self, key: &str, seconds: u64) -> Result<bool> {
        self.execute(Cmd::new("EXPIRE").key(key).arg(seconds)).await
    }

    /// Expires the key at a Unix timestamp in seconds.
    pub async fn expire_at(&self, key: &str, unix_secs: i64) -> Result<bool> {
        self.execute(Cmd::new("EXPIREAT").key(key).arg(unix_secs))
            .await
    }

    pub async fn pexpire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        self.execute(Cmd::new("PEXPIRE").key(key).arg(millis)).await
    }

    pub async fn pexpire_at(&self, key: &str, unix_millis: i64) -> Result<bool> {
        self.execute(Cmd::new("PEXPIREAT").key(key).arg(unix_millis))
            .await
    }

    /// Drops the time to live. Returns `false` when there was none.
    pub async fn persist(&self, key: &str) -> Result<bool> {
        self.execute(Cmd::new("PERSIST").key(key)).await
    }

    /// Moves `key` to another database index. Returns `false` when the key is missing or
    /// already present in the target database.
    pub async fn move_to_db(&self, key: &str, database: u32) -> Result<bool> {
        self.execute(Cmd::new("MOVE").key(key).arg(database)).await
    }

    /// Remaining time to live in seconds: -1 for a key without expiry, -2 for a
    /// missing key.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/ttl/>
    pub async fn ttl(&self, key: &str) -> Result<i64> {
        self.execute(Cmd::new("TTL").key(key)).await
    }

    pub async fn pttl(&self, key: &str) -> Result<i64> {
        self.execute(Cmd::new("PTTL").key(key)).await
    }

    /// Keys matching a glob-style pattern. This walks the whole keyspace on the store.
    pub async fn keys(&self, pattern: &str) -> Result<HashSet<String>> {
        self.execute(Cmd::new("KEYS").key(pattern)).await
    }

    /// Elements of a list, set or sorted set, sorted numerically.
    pub async fn sort(&self, key: &str) -> Result<Vec<String>> {
        self.execute(Cmd::new("SORT").key(key)).await
    }
}
