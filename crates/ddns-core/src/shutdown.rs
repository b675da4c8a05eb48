//! Cooperative shutdown token
//!
//! A [`ShutdownTrigger`] is held by whoever listens for termination signals;
//! every [`Shutdown`] clone observes it. The polling loop checks the token at
//! its checkpoints (top of cycle, between provider attempts) and sleeps with
//! [`Shutdown::sleep`], which returns early once shutdown is requested.
//!
//! In-flight network calls are never cancelled: they are bounded by their own
//! timeouts and the next checkpoint picks the request up.

use std::time::Duration;
use tokio::sync::watch;

/// Create a connected trigger/token pair
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

/// Requests shutdown
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Request shutdown; idempotent
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Another token observing this trigger
    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

/// Observes a [`ShutdownTrigger`]
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// A token that is never triggered
    pub fn never() -> Self {
        channel().1
    }

    /// Whether shutdown has been requested
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested
    ///
    /// A trigger dropped without firing means shutdown will never come, so
    /// this stays pending rather than resolving.
    pub async fn requested(&mut self) {
        if self.rx.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Sleep for `duration` unless shutdown is requested first
    ///
    /// Returns `true` if the full duration elapsed, `false` if interrupted.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_requested() {
            return false;
        }

        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.requested() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sleep_runs_to_completion_without_trigger() {
        let (_trigger, mut shutdown) = channel();
        let start = tokio::time::Instant::now();

        assert!(shutdown.sleep(Duration::from_secs(60)).await);
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_interrupts_sleep() {
        let (trigger, mut shutdown) = channel();
        let start = tokio::time::Instant::now();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trigger.trigger();
        });

        assert!(!shutdown.sleep(Duration::from_secs(60)).await);
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        assert!(shutdown.is_requested());
    }

    #[tokio::test(start_paused = true)]
    async fn already_requested_returns_immediately() {
        let (trigger, mut shutdown) = channel();
        trigger.trigger();

        let start = tokio::time::Instant::now();
        assert!(!shutdown.sleep(Duration::from_secs(60)).await);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn never_token_sleeps_normally() {
        let mut shutdown = Shutdown::never();
        assert!(!shutdown.is_requested());
        assert!(shutdown.sleep(Duration::from_secs(1)).await);
    }

    #[test]
    fn requested_wakes_on_trigger() {
        let (trigger, mut shutdown) = channel();
        let mut requested = tokio_test::task::spawn(shutdown.requested());

        tokio_test::assert_pending!(requested.poll());
        trigger.trigger();
        assert!(requested.is_woken());
        tokio_test::assert_ready!(requested.poll());
    }

    #[test]
    fn requested_stays_pending_when_trigger_is_dropped() {
        let (trigger, mut shutdown) = channel();
        let mut requested = tokio_test::task::spawn(shutdown.requested());

        drop(trigger);
        tokio_test::assert_pending!(requested.poll());
    }

    #[test]
    fn subscribers_see_the_trigger() {
        let (trigger, first) = channel();
        let second = trigger.subscribe();
        let third = first.clone();

        trigger.trigger();
        assert!(first.is_requested());
        assert!(second.is_requested());
        assert!(third.is_requested());
    }
}
