//! Registry for detached side-effect tasks.
//!
//! Work that must not hold up a response (mail delivery, for instance) is
//! spawned here instead of with a bare `tokio::spawn`. Each task runs under
//! its own timeout, inherits the spawning request's trace identifier, and is
//! counted until it finishes so shutdown can wait for stragglers.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{info, warn};

use super::TraceId;

#[derive(Debug, Default)]
struct Outstanding {
    count: AtomicUsize,
    idle: Notify,
}

/// Decrements the outstanding count even if the task panics.
struct Guard(Arc<Outstanding>);

impl Drop for Guard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Result of waiting for outstanding tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every task finished.
    Drained,
    /// The timeout elapsed with this many tasks still running.
    TimedOut {
        /// Tasks still in flight.
        remaining: usize,
    },
}

/// Cloneable handle to the shared task registry.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use hestia::domain::{BackgroundTasks, DrainOutcome};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let tasks = BackgroundTasks::default();
/// tasks.spawn("greeting", Duration::from_secs(1), async { Ok::<_, String>(()) });
/// assert_eq!(tasks.drain(Duration::from_secs(1)).await, DrainOutcome::Drained);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    inner: Arc<Outstanding>,
}

impl BackgroundTasks {
    /// Spawn `work` on the runtime, bounded by `timeout`.
    ///
    /// Failures and timeouts are logged; nothing is reported to the caller.
    pub fn spawn<F, E>(&self, name: &'static str, timeout: Duration, work: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        self.inner.count.fetch_add(1, Ordering::AcqRel);
        let guard = Guard(Arc::clone(&self.inner));
        let trace_id = TraceId::current().unwrap_or_else(TraceId::generate);
        tokio::spawn(TraceId::scope(trace_id, async move {
            let _guard = guard;
            match tokio::time::timeout(timeout, work).await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => warn!(task = name, %trace_id, %error, "background task failed"),
                Err(_) => warn!(
                    task = name,
                    %trace_id,
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "background task timed out"
                ),
            }
        }));
    }

    /// Tasks spawned and not yet finished.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.inner.count.load(Ordering::Acquire)
    }

    /// Wait up to `timeout` for every outstanding task to finish.
    pub async fn drain(&self, timeout: Duration) -> DrainOutcome {
        let wait = async {
            loop {
                let idle = self.inner.idle.notified();
                tokio::pin!(idle);
                idle.as_mut().enable();
                if self.outstanding() == 0 {
                    return;
                }
                idle.await;
            }
        };
        if tokio::time::timeout(timeout, wait).await.is_ok() {
            info!("background tasks drained");
            DrainOutcome::Drained
        } else {
            let remaining = self.outstanding();
            warn!(remaining, "background tasks still running after drain timeout");
            DrainOutcome::TimedOut { remaining }
        }
    }
}
