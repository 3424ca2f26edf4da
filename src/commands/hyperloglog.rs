use crate::client::Client;
use crate::cmd::{Cmd, ToArg};
use crate::Result;

impl Client {
    /// Adds elements to a HyperLogLog. Returns `true` when the estimate changed.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/pfadd/>
    pub async fn pfadd<I>(&self, key: &str, elements: I) -> Result<bool>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute(Cmd::new("PFADD").key(key).args(elements)).await
    }

    /// Approximate number of distinct elements across `keys`.
    pub async fn pfcount<I>(&self, keys: I) -> Result<i64>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute(Cmd::new("PFCOUNT").keys(keys)).await
    }
}
