//! Retry controller
//!
//! Bounded attempts with a fixed gap. Every attempt, whether it failed by
//! rejection or by transport error, consumes one slot. The gap is an
//! interruptible sleep on the shutdown token, and shutdown is checked before
//! each attempt after the first.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::Result;
use crate::shutdown::Shutdown;
use crate::traits::ProviderResponse;

/// Why an attempt did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// The provider answered with something other than `good`/`nochg`
    Rejected(String),
    /// The provider could not be reached
    Transport(String),
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(body) => write!(f, "provider rejected update: {body}"),
            Self::Transport(err) => write!(f, "transport failure: {err}"),
        }
    }
}

/// Final outcome of [`RetryController::perform`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Accepted; the caller persists the new state
    Success { response: String },
    /// Last attempt failed with slots left, but shutdown stopped further attempts
    Interrupted { last_failure: AttemptFailure },
    /// Every allowed attempt failed
    Exhausted { last_failure: AttemptFailure },
}

/// Attempts made and how they ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryAttempt {
    /// 1-based number of the last attempt made
    pub attempt_number: u32,
    pub outcome: RetryOutcome,
}

impl RetryAttempt {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RetryOutcome::Success { .. })
    }
}

/// Bounded, fixed-interval retry around a provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryController {
    max_attempts: u32,
    retry_interval: Duration,
}

impl RetryController {
    /// `max_attempts` below 1 is treated as 1
    pub fn new(max_attempts: u32, retry_interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retry_interval,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// Call `update_fn(ip)` until it is accepted or attempts run out
    ///
    /// `update_fn` returns `Ok` with the provider's answer (accepted or not), or
    /// `Err` for a transport failure. Neither kind of failure escapes: both end
    /// up in the returned [`RetryOutcome`].
    pub async fn perform<F, Fut>(
        &self,
        ip: &str,
        shutdown: &mut Shutdown,
        mut update_fn: F,
    ) -> RetryAttempt
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<ProviderResponse>>,
    {
        let mut attempt = 1;

        loop {
            info!("Attempt {} of {} to update provider", attempt, self.max_attempts);

            let failure = match update_fn(ip.to_string()).await {
                Ok(response) if response.is_accepted() => {
                    info!("Update OK: {}", response.body);
                    return RetryAttempt {
                        attempt_number: attempt,
                        outcome: RetryOutcome::Success {
                            response: response.body,
                        },
                    };
                }
                Ok(response) => AttemptFailure::Rejected(response.body),
                Err(e) => AttemptFailure::Transport(e.to_string()),
            };

            warn!("Update failed: {}", failure);

            if attempt >= self.max_attempts {
                warn!(
                    "Max attempts ({}) reached, giving up for this cycle",
                    self.max_attempts
                );
                return RetryAttempt {
                    attempt_number: attempt,
                    outcome: RetryOutcome::Exhausted {
                        last_failure: failure,
                    },
                };
            }

            info!("Retrying in {}s", self.retry_interval.as_secs());
            if !shutdown.sleep(self.retry_interval).await {
                info!("Shutdown requested, abandoning remaining attempts");
                return RetryAttempt {
                    attempt_number: attempt,
                    outcome: RetryOutcome::Interrupted {
                        last_failure: failure,
                    },
                };
            }

            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::shutdown;
    use std::cell::Cell;

    fn respond(body: &'static str) -> impl Future<Output = Result<ProviderResponse>> {
        async move { Ok(ProviderResponse::from_body(body)) }
    }

    #[tokio::test(start_paused = true)]
    async fn first_attempt_success_returns_immediately() {
        let controller = RetryController::new(3, Duration::from_secs(10));
        let calls = Cell::new(0);
        let start = tokio::time::Instant::now();

        let result = controller
            .perform("5.6.7.8", &mut Shutdown::never(), |_| {
                calls.set(calls.get() + 1);
                respond("good 5.6.7.8")
            })
            .await;

        assert_eq!(calls.get(), 1);
        assert_eq!(result.attempt_number, 1);
        assert_eq!(
            result.outcome,
            RetryOutcome::Success {
                response: "good 5.6.7.8".to_string()
            }
        );
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_errors_consume_slots() {
        let controller = RetryController::new(2, Duration::from_secs(10));
        let calls = Cell::new(0);

        let result = controller
            .perform("5.6.7.8", &mut Shutdown::never(), |_| {
                calls.set(calls.get() + 1);
                async { Err(Error::http("connection refused")) }
            })
            .await;

        assert_eq!(calls.get(), 2);
        assert!(matches!(
            result.outcome,
            RetryOutcome::Exhausted {
                last_failure: AttemptFailure::Transport(_)
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_tries_once() {
        let controller = RetryController::new(0, Duration::from_secs(10));
        assert_eq!(controller.max_attempts(), 1);

        let calls = Cell::new(0);
        let result = controller
            .perform("5.6.7.8", &mut Shutdown::never(), |_| {
                calls.set(calls.get() + 1);
                respond("nohost")
            })
            .await;

        assert_eq!(calls.get(), 1);
        assert_eq!(result.attempt_number, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn update_fn_receives_the_ip() {
        let controller = RetryController::new(1, Duration::from_secs(10));
        let seen = std::cell::RefCell::new(Vec::new());

        controller
            .perform("5.6.7.8", &mut Shutdown::never(), |ip| {
                seen.borrow_mut().push(ip);
                respond("nochg 5.6.7.8")
            })
            .await;

        assert_eq!(*seen.borrow(), vec!["5.6.7.8".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_during_backoff_stops_retrying() {
        let controller = RetryController::new(5, Duration::from_secs(10));
        let (trigger, mut token) = shutdown::channel();
        let calls = Cell::new(0);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            trigger.trigger();
        });

        let result = controller
            .perform("5.6.7.8", &mut token, |_| {
                calls.set(calls.get() + 1);
                respond("nohost")
            })
            .await;

        assert_eq!(calls.get(), 1);
        assert_eq!(
            result.outcome,
            RetryOutcome::Interrupted {
                last_failure: AttemptFailure::Rejected("nohost".to_string())
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_after_transport_error_is_interrupted() {
        let controller = RetryController::new(3, Duration::from_secs(10));
        let (trigger, mut token) = shutdown::channel();
        let calls = Cell::new(0);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.trigger();
        });

        let result = controller
            .perform("5.6.7.8", &mut token, |_| {
                calls.set(calls.get() + 1);
                async { Err(Error::http("connection refused")) }
            })
            .await;

        assert_eq!(calls.get(), 1);
        assert_eq!(result.attempt_number, 1);
        assert!(matches!(
            result.outcome,
            RetryOutcome::Interrupted {
                last_failure: AttemptFailure::Transport(_)
            }
        ));
    }
}
