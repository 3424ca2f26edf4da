use std::time::Duration;

use strum_macros::{AsRefStr, Display, EnumIter};
use thiserror::Error as ThisError;

use crate::frame::{self, Frame};

/// Everything a command can fail with. The executor logs each of these once and hands it
/// back to the caller; none of them unwinds past the client.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("connection pool exhausted; no connection became available within {0:?}")]
    PoolExhausted(Duration),
    #[error("connection pool is closed")]
    PoolClosed,
    #[error("connection fault; {0}")]
    Io(#[from] std::io::Error),
    #[error("connection fault; no response within {0:?}")]
    Timeout(Duration),
    #[error("connection fault; connection closed by the store")]
    Closed,
    #[error("protocol error; {0}")]
    Protocol(#[from] frame::Error),
    #[error("protocol error; expected {expected}, got {actual}")]
    UnexpectedResponse {
        expected: &'static str,
        actual: Frame,
    },
    /// The store rejected the command, e.g. `WRONGTYPE` or a malformed argument.
    #[error("store error; {0}")]
    Store(String),
    #[error("invalid configuration; {0}")]
    Config(String),
    /// Rejected before anything was sent.
    #[error("invalid argument; {0}")]
    InvalidArgument(&'static str),
    #[error("serialization error; {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of [`Error`], used as a structured log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    PoolExhausted,
    ConnectionFault,
    Protocol,
    Store,
    Config,
    InvalidArgument,
    Serialization,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::PoolExhausted(_) | Error::PoolClosed => ErrorKind::PoolExhausted,
            Error::Io(_) | Error::Timeout(_) | Error::Closed => ErrorKind::ConnectionFault,
            Error::Protocol(_) | Error::UnexpectedResponse { .. } => ErrorKind::Protocol,
            Error::Store(_) => ErrorKind::Store,
            Error::Config(_) => ErrorKind::Config,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Whether the connection that produced this error can no longer be trusted to be in
    /// sync with the store. Such connections are discarded instead of returned to the pool.
    pub fn breaks_connection(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Timeout(_) | Error::Closed | Error::Protocol(_)
        )
    }

    pub(crate) fn unexpected(expected: &'static str, actual: Frame) -> Error {
        Error::UnexpectedResponse { expected, actual }
    }
}
