//! Trailing-edge debounce over Tokio tasks.
//!
//! Each call to [`Debouncer::schedule`] replaces the pending timer. Once a
//! timer fires, its action is spawned as a separate task and is no longer
//! cancellable: a later `schedule` or `cancel` only affects the timer.

use std::future::Future;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Cancellable timer handle, replaced on every schedule.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<JoinHandle<()>>>,
    superseded: u64,
}

impl Debouncer {
    /// Create a debouncer with a fixed quiet period.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            superseded: 0,
        }
    }

    /// Quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `action` once `delay` has elapsed with no further call.
    ///
    /// Outside a Tokio runtime the action is dropped with a warning.
    pub fn schedule<F>(&mut self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No async runtime available; debounced action dropped");
                return;
            }
        };

        let delay = self.delay;
        let spawner = handle.clone();
        self.pending = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            spawner.spawn(action)
        }));
    }

    /// Cancel the pending timer, if any. An already-fired action keeps
    /// running.
    pub fn cancel(&mut self) {
        if let Some(timer) = self.pending.take() {
            if !timer.is_finished() {
                self.superseded += 1;
                debug!("Pending debounced action superseded");
            }
            timer.abort();
        }
    }

    /// Whether a timer is waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    /// How many pending timers were replaced or cancelled before firing.
    pub fn superseded(&self) -> u64 {
        self.superseded
    }

    /// Wait for the pending timer to fire and its action to finish.
    pub async fn flush(&mut self) {
        if let Some(timer) = self.pending.take() {
            if let Ok(action) = timer.await {
                if let Err(e) = action.await {
                    warn!("Debounced action failed to complete: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter_action(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_one_action() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(1000));

        for _ in 0..5 {
            debouncer.schedule(counter_action(&counter));
        }
        assert!(debouncer.is_pending());
        assert_eq!(debouncer.superseded(), 4);

        debouncer.flush().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_restarts_quiet_period() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(1000));

        debouncer.schedule(counter_action(&counter));
        tokio::time::sleep(Duration::from_millis(600)).await;
        debouncer.schedule(counter_action(&counter));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(500)).await;
        tokio::task::yield_now().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_action() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(100));

        debouncer.schedule(counter_action(&counter));
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fired_action_survives_reschedule() {
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(100));

        let (s, f) = (started.clone(), finished.clone());
        debouncer.schedule(async move {
            s.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(1000)).await;
            f.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);

        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_schedule_outside_runtime_is_dropped() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(10));

        debouncer.schedule(counter_action(&counter));
        assert!(!debouncer.is_pending());
    }
}
