//! Pooled, instrumented client for Redis-protocol key-value stores.
//!
//! A [`Client`] owns a bounded [`Pool`] of connections. Every command leases a connection,
//! runs, and hands it back when the lease is dropped, on success, error and cancellation
//! alike. Commands at or above the slow threshold are reported through `tracing` and an
//! optional hook.

pub mod client;
pub mod cmd;
pub mod codec;
mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod pool;
pub mod reply;
pub mod slowlog;
pub mod subscription;

pub use client::{Client, ClientBuilder};
pub use cmd::{Cmd, ToArg};
pub use config::PoolConfig;
pub use error::{Error, ErrorKind};
pub use frame::Frame;
pub use pipeline::Pipeline;
pub use pool::{Lease, Pool, PoolStats};
pub use reply::FromFrame;
pub use slowlog::SlowCommandEvent;
pub use subscription::{Message, Subscription};

pub type Result<T> = std::result::Result<T, Error>;
