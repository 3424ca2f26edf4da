use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cmd::Cmd;
use crate::config::PoolConfig;
use crate::connection::Connection;
use crate::frame::Frame;
use crate::{Error, Result};

/// A bounded pool of connections to one store endpoint.
///
/// At most `max_active` leases exist at any time; the semaphore permit travels with the
/// lease, so a slot is freed exactly when the lease is dropped. Idle connections are kept
/// in a LIFO stack of at most `max_idle` entries. The pool is cheap to clone; every clone
/// shares the same connections.
#[derive(Clone)]
pub struct Pool {
    shared: Arc<Shared>,
}

struct Shared {
    config: PoolConfig,
    permits: Arc<Semaphore>,
    idle: Mutex<VecDeque<Connection>>,
    leased: AtomicUsize,
    created: AtomicU64,
    discarded: AtomicU64,
    closed: AtomicBool,
}

impl Shared {
    fn idle(&self) -> MutexGuard<'_, VecDeque<Connection>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Point-in-time counters describing the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Leases currently held by callers.
    pub leased: usize,
    /// Connections waiting in the idle stack.
    pub idle: usize,
    /// Physical connections opened since the pool was built.
    pub created: u64,
    /// Connections thrown away because they faulted or failed a liveness check.
    pub discarded: u64,
    pub max_active: usize,
}

impl Pool {
    /// Builds a pool from `config`. No connection is opened until the first acquire.
    pub fn new(config: PoolConfig) -> Result<Pool> {
        config.validate()?;

        if config.auth_token().is_none() && config.database != 0 {
            warn!(
                database = config.database,
                "database index is only selected for authenticated connections; using the default database"
            );
        }

        info!(
            address = %config.address(),
            max_active = config.max_active,
            max_idle = config.max_idle,
            max_wait_ms = config.max_wait_ms,
            test_on_borrow = config.test_on_borrow,
            "connection pool created"
        );

        let shared = Shared {
            permits: Arc::new(Semaphore::new(config.max_active)),
            idle: Mutex::new(VecDeque::with_capacity(config.max_idle)),
            leased: AtomicUsize::new(0),
            created: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            config,
        };

        Ok(Pool {
            shared: Arc::new(shared),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    /// Leases a connection, waiting up to `max_wait` for a free slot.
    ///
    /// An idle connection is reused when one exists (after a PING when `test_on_borrow` is
    /// set); otherwise a new connection is opened. If opening fails the slot is released
    /// before the error is returned.
    pub async fn acquire(&self) -> Result<Lease> {
        if self.is_closed() {
            return Err(Error::PoolClosed);
        }

        let max_wait = self.shared.config.max_wait();
        let permit = match timeout(max_wait, self.shared.permits.clone().acquire_owned()).await {
            Ok(Ok(permit)) => permit,
            // The semaphore is only closed by `close`.
            Ok(Err(_)) => return Err(Error::PoolClosed),
            Err(_) => return Err(Error::PoolExhausted(max_wait)),
        };

        let conn = match self.checkout_idle().await {
            Some(conn) => conn,
            None => {
                let conn = Connection::connect(&self.shared.config).await?;
                self.shared.created.fetch_add(1, Ordering::Relaxed);
                conn
            }
        };

        self.shared.leased.fetch_add(1, Ordering::AcqRel);

        Ok(Lease {
            conn: Some(conn),
            shared: self.shared.clone(),
            broken: false,
            _permit: permit,
        })
    }

    async fn checkout_idle(&self) -> Option<Connection> {
        loop {
            let mut conn = self.shared.idle().pop_back()?;

            if !self.shared.config.test_on_borrow || conn.ping().await {
                return Some(conn);
            }

            self.shared.discarded.fetch_add(1, Ordering::Relaxed);
            debug!(connection_id = %conn.id, "discarded idle connection that failed the liveness check");
        }
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            leased: self.shared.leased.load(Ordering::Acquire),
            idle: self.shared.idle().len(),
            created: self.shared.created.load(Ordering::Relaxed),
            discarded: self.shared.discarded.load(Ordering::Relaxed),
            max_active: self.shared.config.max_active,
        }
    }

    /// Shuts the pool down: pending and future acquires fail with [`Error::PoolClosed`],
    /// idle connections are closed, and outstanding leases close their connection when
    /// they are dropped.
    pub fn close(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.shared.permits.close();
        let idle = std::mem::take(&mut *self.shared.idle());

        info!(
            closed_idle = idle.len(),
            leased = self.shared.leased.load(Ordering::Acquire),
            "connection pool closed"
        );
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("config", &self.shared.config)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Exclusive use of one pooled connection.
///
/// Dropping the lease is the release: the connection goes back to the idle stack unless it
/// faulted, and the slot becomes available to the next acquire. This runs on every path,
/// including errors and cancelled futures.
pub struct Lease {
    conn: Option<Connection>,
    shared: Arc<Shared>,
    broken: bool,
    _permit: OwnedSemaphorePermit,
}

impl Lease {
    pub fn connection_id(&self) -> Option<Uuid> {
        self.conn.as_ref().map(|conn| conn.id)
    }

    pub async fn request(&mut self, cmd: Cmd) -> Result<Frame> {
        let conn = self.conn.as_mut().ok_or(Error::Closed)?;

        // Stays set if the future is dropped mid-exchange, since the reply may still be
        // sitting unread on the socket.
        self.broken = true;
        let res = conn.request(cmd).await;
        self.broken = matches!(res, Err(ref err) if err.breaks_connection());

        res
    }

    pub async fn pipeline(&mut self, cmds: Vec<Cmd>) -> Result<Vec<Frame>> {
        let conn = self.conn.as_mut().ok_or(Error::Closed)?;

        self.broken = true;
        let res = conn.pipeline(cmds).await;
        self.broken = matches!(res, Err(ref err) if err.breaks_connection());

        res
    }

    /// Prevents the connection from returning to the pool.
    pub fn discard(&mut self) {
        self.broken = true;
    }
}

impl fmt::Debug for Lease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("connection_id", &self.connection_id())
            .field("broken", &self.broken)
            .finish()
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.shared.leased.fetch_sub(1, Ordering::AcqRel);

        let Some(conn) = self.conn.take() else {
            return;
        };

        if self.broken || self.shared.closed.load(Ordering::Acquire) {
            self.shared.discarded.fetch_add(1, Ordering::Relaxed);
            debug!(connection_id = %conn.id, "connection discarded on release");
            return;
        }

        let mut idle = self.shared.idle();
        if idle.len() < self.shared.config.max_idle {
            idle.push_back(conn);
        }
        // The permit is released after this point, so the next acquire finds the
        // connection already in the idle stack.
    }
}
