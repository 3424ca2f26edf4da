use std::collections::HashSet;

use crate::client::Client;
use crate::cmd::{Cmd, ToArg};
use crate::Result;

// Set replies carry no order, so they decode into `HashSet`.
impl Client {
    /// Adds members to the set at `key`. Returns how many were not already present.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/sadd/>
    pub async fn sadd<I>(&self, key: &str, members: I) -> Result<i64>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute(Cmd::new("SADD").key(key).args(members)).await
    }

    pub async fn srem<I>(&self, key: &str, members: I) -> Result<i64>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute(Cmd::new("SREM").key(key).args(members)).await
    }

    pub async fn smembers(&self, key: &str) -> Result<HashSet<String>> {
        self.execute(Cmd::new("SMEMBERS").key(key)).await
    }

    pub async fn sismember(&self, key: &str, member: impl ToArg) -> Result<bool> {
        self.execute(Cmd::new("SISMEMBER").key(key).arg(member)).await
    }

    pub async fn scard(&self, key: &str) -> Result<i64> {
        self.execute(Cmd::new("SCARD").key(key)).await
    }

    /// Removes and returns a random member, or `None` for an empty set.
    pub async fn spop(&self, key: &str) -> Result<Option<String>> {
        self.execute(Cmd::new("SPOP").key(key)).await
    }

    pub async fn spop_count(&self, key: &str, count: usize) -> Result<HashSet<String>> {
        self.execute(Cmd::new("SPOP").key(key).arg(count)).await
    }

    pub async fn srandmember(&self, key: &str) -> Result<Option<String>> {
        self.execute(Cmd::new("SRANDMEMBER").key(key)).await
    }

    /// Up to `count` distinct random members. A negative count allows repeats and always
    /// returns `|count|` members, so the reply keeps duplicates.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/srandmember/>
    pub async fn srandmember_count(&self, key: &str, count: i64) -> Result<Vec<String>> {
        self.execute(Cmd::new("SRANDMEMBER").key(key).arg(count)).await
    }

    /// Moves `member` from `source` to `destination`. Returns `false` when `member` was
    /// not in `source`.
    pub async fn smove(&self, source: &str, destination: &str, member: impl ToArg) -> Result<bool> {
        self.execute(
            Cmd::new("SMOVE")
                .key(source)
                .key(destination)
                .arg(member),
        )
        .await
    }

    pub async fn sunion<I>(&self, keys: I) -> Result<HashSet<String>>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute(Cmd::new("SUNION").keys(keys)).await
    }

    pub async fn sinter<I>(&self, keys: I) -> Result<HashSet<String>>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute(Cmd::new("SINTER").keys(keys)).await
    }

    /// Members of the first set that are in none of the others.
    pub async fn sdiff<I>(&self, keys: I) -> Result<HashSet<String>>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute(Cmd::new("SDIFF").keys(keys)).await
    }

    /// Stores the union in `destination` and returns its size.
    pub async fn sunionstore<I>(&self, destination: &str, keys: I) -> Result<i64>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute(Cmd::new("SUNIONSTORE").key(destination).keys(keys))
            .await
    }

    pub async fn sinterstore<I>(&self, destination: &str, keys: I) -> Result<i64>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute(Cmd::new("SINTERSTORE").key(destination).keys(keys))
            .await
    }

    pub async fn sdiffstore<I>(&self, destination: &str, keys: I) -> Result<i64>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute(Cmd::new("SDIFFSTORE").key(destination).keys(keys))
            .await
    }
}
