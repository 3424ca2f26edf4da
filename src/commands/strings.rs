use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

use crate::client::Client;
use crate::cmd::{Cmd, ToArg};
use crate::reply::FromFrame;
use crate::{Error, Result};

impl Client {
    /// Returns the string stored at `key`, or `None` when the key does not exist.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/get/>
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        self.execute(Cmd::new("GET").key(key)).await
    }

    /// Like [`Client::get`], for values that are not UTF-8.
    pub async fn get_bytes(&self, key: &str) -> Result<Option<Bytes>> {
        self.execute(Cmd::new("GET").key(key)).await
    }

    pub async fn set(&self, key: &str, value: impl ToArg) -> Result<()> {
        self.execute(Cmd::new("SET").key(key).arg(value)).await
    }

    /// Sets `key` and its time to live, in seconds, in one command.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/setex/>
    pub async fn setex(&self, key: &str, seconds: u64, value: impl ToArg) -> Result<()> {
        self.execute(Cmd::new("SETEX").key(key).arg(seconds).arg(value))
            .await
    }

    /// Sets `key` only if it does not exist yet. Returns whether the write happened; when
    /// it did not, the stored value is left untouched.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/setnx/>
    pub async fn setnx(&self, key: &str, value: impl ToArg) -> Result<bool> {
        self.execute(Cmd::new("SETNX").key(key).arg(value)).await
    }

    /// Atomically replaces the value and returns the previous one.
    pub async fn getset(&self, key: &str, value: impl ToArg) -> Result<Option<String>> {
        self.execute(Cmd::new("GETSET").key(key).arg(value)).await
    }

    /// Returns the length of the string after the append.
    pub async fn append(&self, key: &str, value: impl ToArg) -> Result<i64> {
        self.execute(Cmd::new("APPEND").key(key).arg(value)).await
    }

    /// Substring between two inclusive offsets. Negative offsets count from the end.
    pub async fn getrange(&self, key: &str, start: i64, end: i64) -> Result<String> {
        self.execute(Cmd::new("GETRANGE").key(key).arg(start).arg(end))
            .await
    }

    pub async fn setrange(&self, key: &str, offset: u64, value: impl ToArg) -> Result<i64> {
        self.execute(Cmd::new("SETRANGE").key(key).arg(offset).arg(value))
            .await
    }

    pub async fn strlen(&self, key: &str) -> Result<i64> {
        self.execute(Cmd::new("STRLEN").key(key)).await
    }

    /// Sets several keys in one command.
    pub async fn mset<I, K, V>(&self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: ToArg,
        V: ToArg,
    {
        let cmd = pairs
            .into_iter()
            .fold(Cmd::new("MSET"), |cmd, (key, value)| cmd.key(key).arg(value));
        self.execute(cmd).await
    }

    pub async fn echo(&self, message: &str) -> Result<String> {
        self.execute(Cmd::new("ECHO").arg(message)).await
    }

    pub async fn bitcount(&self, key: &str) -> Result<i64> {
        self.execute(Cmd::new("BITCOUNT").key(key)).await
    }

    /// Position of the first bit set to `bit`, or -1.
    pub async fn bitpos(&self, key: &str, bit: bool) -> Result<i64> {
        self.execute(Cmd::new("BITPOS").key(key).arg(u32::from(bit)))
            .await
    }

    /// Stores `value` serialized as JSON.
    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(err) => {
                let err = Error::from(err);
                error!(
                    command = "SET",
                    key,
                    kind = %err.kind(),
                    error = %err,
                    "command failed"
                );
                return Err(err);
            }
        };
        self.set(key, json).await
    }

    /// Reads a value written by [`Client::set_json`].
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        // Decoding inside the executor logs a bad payload like any other failed command.
        self.execute_with(Cmd::new("GET").key(key), |frame| {
            match Option::<Bytes>::from_frame(frame)? {
                Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
                None => Ok(None),
            }
        })
        .await
    }
}
