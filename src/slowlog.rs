use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

/// Latency at which a command is reported as slow.
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(500);

/// A command that took at least the configured threshold, measured from before the
/// connection was acquired until the reply was decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct SlowCommandEvent {
    pub host: String,
    pub port: u16,
    pub command: &'static str,
    pub keys: String,
    pub elapsed: Duration,
}

pub type SlowCommandHook = Arc<dyn Fn(&SlowCommandEvent) + Send + Sync>;

/// Reports slow commands as warnings and to an optional hook. Nothing is retained.
#[derive(Clone)]
pub struct SlowLog {
    host: String,
    port: u16,
    threshold: Duration,
    hook: Option<SlowCommandHook>,
}

impl SlowLog {
    pub fn new(host: impl Into<String>, port: u16, threshold: Duration) -> SlowLog {
        SlowLog {
            host: host.into(),
            port,
            threshold,
            hook: None,
        }
    }

    pub fn with_hook(mut self, hook: SlowCommandHook) -> SlowLog {
        self.hook = Some(hook);
        self
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Emits one event when `elapsed` reaches the threshold and returns it.
    pub fn observe(
        &self,
        command: &'static str,
        keys: &str,
        elapsed: Duration,
    ) -> Option<SlowCommandEvent> {
        if elapsed < self.threshold {
            return None;
        }

        let event = SlowCommandEvent {
            host: self.host.clone(),
            port: self.port,
            command,
            keys: keys.to_string(),
            elapsed,
        };

        warn!(
            host = %event.host,
            port = event.port,
            command = event.command,
            key = %event.keys,
            elapsed_ms = event.elapsed.as_millis() as u64,
            "slow command"
        );

        if let Some(hook) = &self.hook {
            hook(&event);
        }

        Some(event)
    }
}

impl fmt::Debug for SlowLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlowLog")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("threshold", &self.threshold)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}
