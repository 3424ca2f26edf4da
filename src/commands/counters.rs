use crate::client::Client;
use crate::cmd::Cmd;
use crate::Result;

// The arithmetic happens in the store, so concurrent callers never race on a
// read-modify-write cycle.
impl Client {
    /// Increments the integer at `key` by one. A missing key counts as 0.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/incr/>
    pub async fn incr(&self, key: &str) -> Result<i64> {
        self.execute(Cmd::new("INCR").key(key)).await
    }

    pub async fn incr_by(&self, key: &str, increment: i64) -> Result<i64> {
        self.execute(Cmd::new("INCRBY").key(key).arg(increment))
            .await
    }

    /// Adds a floating point increment using the store's own float arithmetic.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/incrbyfloat/>
    pub async fn incr_by_float(&self, key: &str, increment: f64) -> Result<f64> {
        self.execute(Cmd::new("INCRBYFLOAT").key(key).arg(increment))
            .await
    }

    pub async fn decr(&self, key: &str) -> Result<i64> {
        self.execute(Cmd::new("DECR").key(key)).await
    }

    pub async fn decr_by(&self, key: &str, decrement: i64) -> Result<i64> {
        self.execute(Cmd::new("DECRBY").key(key).arg(decrement))
            .await
    }
}
