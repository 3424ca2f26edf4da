use std::collections::HashMap;

use crate::client::Client;
use crate::cmd::{Cmd, ToArg};
use crate::Result;

impl Client {
    pub async fn hget(&self, key: &str, field: impl ToArg) -> Result<Option<String>> {
        self.execute(Cmd::new("HGET").key(key).arg(field)).await
    }

    /// Sets one field. Returns `true` when the field was created, `false` when an
    /// existing value was overwritten.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/hset/>
    pub async fn hset(&self, key: &str, field: impl ToArg, value: impl ToArg) -> Result<bool> {
        self.execute(Cmd::new("HSET").key(key).arg(field).arg(value))
            .await
    }

    /// Sets `field` only if it is not present yet.
    pub async fn hsetnx(&self, key: &str, field: impl ToArg, value: impl ToArg) -> Result<bool> {
        self.execute(Cmd::new("HSETNX").key(key).arg(field).arg(value))
            .await
    }

    /// Values of the requested fields, in request order, with `None` for missing fields.
    pub async fn hmget<I>(&self, key: &str, fields: I) -> Result<Vec<Option<String>>>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute(Cmd::new("HMGET").key(key).args(fields)).await
    }

    pub async fn hmset<I, F, V>(&self, key: &str, entries: I) -> Result<()>
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
        self.execute(cmd).await
    }

    /// Returns how many of the fields existed and were removed.
    pub async fn hdel<I>(&self, key: &str, fields: I) -> Result<i64>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute(Cmd::new("HDEL").key(key).args(fields)).await
    }

    pub async fn hexists(&self, key: &str, field: impl ToArg) -> Result<bool> {
        self.execute(Cmd::new("HEXISTS").key(key).arg(field)).await
    }

    pub async fn hincr_by(&self, key: &str, field: impl ToArg, increment: i64) -> Result<i64> {
        self.execute(Cmd::new("HINCRBY").key(key).arg(field).arg(increment))
            .await
    }

    pub async fn hincr_by_float(
        &self,
        key: &str,
        field: impl ToArg,
        increment: f64,
    ) -> Result<f64> {
        self.execute(
            Cmd::new("HINCRBYFLOAT")
                .key(key)
                .arg(field)
                .arg(increment),
        )
        .await
    }

    pub async fn hlen(&self, key: &str) -> Result<i64> {
        self.execute(Cmd::new("HLEN").key(key)).await
    }

    pub async fn hkeys(&self, key: &str) -> Result<Vec<String>> {
        self.execute(Cmd::new("HKEYS").key(key)).await
    }

    pub async fn hvals(&self, key: &str) -> Result<Vec<String>> {
        self.execute(Cmd::new("HVALS").key(key)).await
    }

    /// All fields and values. A missing key yields an empty map.
    pub async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        self.execute(Cmd::new("HGETALL").key(key)).await
    }
}
