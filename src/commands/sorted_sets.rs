use crate::client::Client;
use crate::cmd::{Cmd, ToArg};
use crate::reply::pairs;
use crate::Result;

/// Score bounds (`min`, `max`) accept anything the store understands as a bound: plain
/// numbers, `f64::INFINITY`, or strings such as `"(1.5"` and `"-inf"`. Lexicographic bounds
/// use the `[`, `(`, `-` and `+` prefixes.
impl Client {
    /// Adds `member` with `score`, or updates its score. Returns 1 when the member is new.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/zadd/>
    pub async fn zadd(&self, key: &str, score: f64, member: impl ToArg) -> Result<i64> {
        self.execute(Cmd::new("ZADD").key(key).arg(score).arg(member))
            .await
    }

    pub async fn zrem<I>(&self, key: &str, members: I) -> Result<i64>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute(Cmd::new("ZREM").key(key).args(members)).await
    }

    pub async fn zscore(&self, key: &str, member: impl ToArg) -> Result<Option<f64>> {
        self.execute(Cmd::new("ZSCORE").key(key).arg(member)).await
    }

    /// Returns the member's new score.
    pub async fn zincrby(&self, key: &str, increment: f64, member: impl ToArg) -> Result<f64> {
        self.execute(Cmd::new("ZINCRBY").key(key).arg(increment).arg(member))
            .await
    }

    /// Zero-based rank by ascending score, or `None` when the member is absent.
    pub async fn zrank(&self, key: &str, member: impl ToArg) -> Result<Option<i64>> {
        self.execute(Cmd::new("ZRANK").key(key).arg(member)).await
    }

    pub async fn zrevrank(&self, key: &str, member: impl ToArg) -> Result<Option<i64>> {
        self.execute(Cmd::new("ZREVRANK").key(key).arg(member)).await
    }

    /// Members between two inclusive ranks, lowest score first.
    pub async fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        self.execute(Cmd::new("ZRANGE").key(key).arg(start).arg(stop))
            .await
    }

    /// Like [`Client::zrange`], highest score first.
    pub async fn zrevrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        self.execute(Cmd::new("ZREVRANGE").key(key).arg(start).arg(stop))
            .await
    }

    pub async fn zrange_with_scores(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<(String, f64)>> {
        let cmd = Cmd::new("ZRANGE")
            .key(key)
            .arg(start)
            .arg(stop)
            .arg("WITHSCORES");
        self.execute_with(cmd, pairs::<String, f64>).await
    }

    pub async fn zrangebyscore(
        &self,
        key: &str,
        min: impl ToArg,
        max: impl ToArg,
    ) -> Result<Vec<String>> {
        self.execute(Cmd::new("ZRANGEBYSCORE").key(key).arg(min).arg(max))
            .await
    }

    /// Members with a score between `min` and `max`, highest score first. The bounds are
    /// given in the same order as [`Client::zrangebyscore`].
    ///
    /// Ref: <https://redis.io/docs/latest/commands/zrevrangebyscore/>
    pub async fn zrevrangebyscore(
        &self,
        key: &str,
        min: impl ToArg,
        max: impl ToArg,
    ) -> Result<Vec<String>> {
        self.execute(Cmd::new("ZREVRANGEBYSCORE").key(key).arg(max).arg(min))
            .await
    }

    pub async fn zrangebylex(
        &self,
        key: &str,
        min: impl ToArg,
        max: impl ToArg,
    ) -> Result<Vec<String>> {
        self.execute(Cmd::new("ZRANGEBYLEX").key(key).arg(min).arg(max))
            .await
    }

    /// Bounds in forward order, like [`Client::zrevrangebyscore`].
    pub async fn zrevrangebylex(
        &self,
        key: &str,
        min: impl ToArg,
        max: impl ToArg,
    ) -> Result<Vec<String>> {
        self.execute(Cmd::new("ZREVRANGEBYLEX").key(key).arg(max).arg(min))
            .await
    }

    pub async fn zremrangebylex(&self, key: &str, min: impl ToArg, max: impl ToArg) -> Result<i64> {
        self.execute(Cmd::new("ZREMRANGEBYLEX").key(key).arg(min).arg(max))
            .await
    }

    pub async fn zremrangebyrank(&self, key: &str, start: i64, stop: i64) -> Result<i64> {
        self.execute(Cmd::new("ZREMRANGEBYRANK").key(key).arg(start).arg(stop))
            .await
    }

    pub async fn zremrangebyscore(
        &self,
        key: &str,
        min: impl ToArg,
        max: impl ToArg,
    ) -> Result<i64> {
        self.execute(Cmd::new("ZREMRANGEBYSCORE").key(key).arg(min).arg(max))
            .await
    }

    pub async fn zcard(&self, key: &str) -> Result<i64> {
        self.execute(Cmd::new("ZCARD").key(key)).await
    }

    pub async fn zcount(&self, key: &str, min: impl ToArg, max: impl ToArg) -> Result<i64> {
        self.execute(Cmd::new("ZCOUNT").key(key).arg(min).arg(max))
            .await
    }

    pub async fn zlexcount(&self, key: &str, min: impl ToArg, max: impl ToArg) -> Result<i64> {
        self.execute(Cmd::new("ZLEXCOUNT").key(key).arg(min).arg(max))
            .await
    }

    /// Stores the union of `keys` in `destination`, summing scores. Returns the size of
    /// the result.
    pub async fn zunionstore<I>(&self, destination: &str, keys: I) -> Result<i64>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute(combine("ZUNIONSTORE", destination, keys)).await
    }

    pub async fn zinterstore<I>(&self, destination: &str, keys: I) -> Result<i64>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute(combine("ZINTERSTORE", destination, keys)).await
    }
}

/// `<name> destination numkeys key [key ...]`
fn combine<I>(name: &'static str, destination: &str, keys: I) -> Cmd
where
    I: IntoIterator,
    I::Item: ToArg,
{
    let keys: Vec<_> = keys.into_iter().collect();
    Cmd::new(name).key(destination).arg(keys.len()).keys(keys)
}
