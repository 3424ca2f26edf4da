use crate::client::Client;
use crate::cmd::{Cmd, ToArg};
use crate::Result;

impl Client {
    /// Publishes `message` on `channel` and returns how many subscribers received it.
    ///
    /// Subscribing lives in [`Client::subscribe`], which needs its own connection.
    pub async fn publish(&self, channel: &str, message: impl ToArg) -> Result<i64> {
        self.execute(Cmd::new("PUBLISH").key(channel).arg(message))
            .await
    }
}
