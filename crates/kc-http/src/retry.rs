//! Retry strategy and the retry loop.
//!
//! A request runs as `Attempting(0)`, and every failure is checked against
//! the strategy in order: attempt budget, then `can_retry_error`. A retry
//! sleeps for `delay_between_retries` and runs the next attempt. The loop is
//! iterative, so deep retry budgets do not grow the stack.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::headers::retry_after_seconds;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Predicate deciding whether an error may be retried.
pub type CanRetryFn = Arc<dyn Fn(&Error) -> bool + Send + Sync>;
/// Computes the delay before the next attempt.
pub type DelayFn = Arc<dyn Fn(&Error) -> Duration + Send + Sync>;
/// Receives `(new_attempt_number, url)` right before a retry sleep.
pub type RetryLogFn = Arc<dyn Fn(u32, &str) + Send + Sync>;

/// How retry attempts are reported.
#[derive(Clone, Default)]
pub enum RetryLogger {
    /// Do not report retries.
    Disabled,
    /// Emit a `tracing` warning per retry.
    #[default]
    Tracing,
    /// Call a user-supplied function per retry.
    Custom(RetryLogFn),
}

impl RetryLogger {
    /// Wrap a callback.
    pub fn custom(f: impl Fn(u32, &str) + Send + Sync + 'static) -> Self {
        RetryLogger::Custom(Arc::new(f))
    }

    fn log(&self, attempt: u32, url: &str) {
        match self {
            RetryLogger::Disabled => {}
            RetryLogger::Tracing => warn!(attempt, url, "Retrying request"),
            RetryLogger::Custom(f) => f(attempt, url),
        }
    }
}

impl fmt::Debug for RetryLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryLogger::Disabled => f.write_str("Disabled"),
            RetryLogger::Tracing => f.write_str("Tracing"),
            RetryLogger::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Outcome of evaluating a failed attempt against a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the given delay.
    Retry(Duration),
    /// The attempt budget is spent.
    Exhausted,
    /// The strategy rejected this error.
    NotRetryable,
}

/// Complete retry strategy; every field has a value.
#[derive(Clone)]
pub struct RetryStrategy {
    max_retries: u32,
    can_retry_error: CanRetryFn,
    delay_between_retries: DelayFn,
    log_retry_attempt: RetryLogger,
}

impl fmt::Debug for RetryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryStrategy")
            .field("max_retries", &self.max_retries)
            .field("log_retry_attempt", &self.log_retry_attempt)
            .finish_non_exhaustive()
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            can_retry_error: Arc::new(default_can_retry_error),
            delay_between_retries: Arc::new(default_delay_between_retries),
            log_retry_attempt: RetryLogger::default(),
        }
    }
}

impl RetryStrategy {
    /// Single attempt, no retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Replace the retryability predicate.
    pub fn with_can_retry_error(
        mut self,
        f: impl Fn(&Error) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.can_retry_error = Arc::new(f);
        self
    }

    /// Replace the delay function.
    pub fn with_delay(mut self, f: impl Fn(&Error) -> Duration + Send + Sync + 'static) -> Self {
        self.delay_between_retries = Arc::new(f);
        self
    }

    /// Use a fixed delay between retries.
    pub fn with_fixed_delay(self, delay: Duration) -> Self {
        self.with_delay(move |_| delay)
    }

    /// Back off between retries, still honoring `Retry-After` when present.
    ///
    /// The backoff is driven by the failing error's `retry_attempt`.
    pub fn with_exponential_backoff(
        self,
        backoff: BackoffStrategy,
        initial_delay: Duration,
        max_delay: Duration,
    ) -> Self {
        self.with_delay(move |error| {
            retry_after_delay(error)
                .unwrap_or_else(|| backoff.delay(error.retry_attempt, initial_delay, max_delay))
        })
    }

    /// Set how retries are reported.
    pub fn with_retry_logger(mut self, logger: RetryLogger) -> Self {
        self.log_retry_attempt = logger;
        self
    }

    /// Do not report retries.
    pub fn without_retry_logging(self) -> Self {
        self.with_retry_logger(RetryLogger::Disabled)
    }

    /// Maximum number of retries.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns true if this strategy would retry `error`, ignoring the budget.
    pub fn can_retry(&self, error: &Error) -> bool {
        (self.can_retry_error)(error)
    }

    /// Delay this strategy would wait before retrying `error`.
    pub fn delay_for(&self, error: &Error) -> Duration {
        (self.delay_between_retries)(error)
    }

    /// Decide what to do after attempt `attempt` (zero-based) failed.
    pub fn decide(&self, attempt: u32, error: &Error) -> RetryDecision {
        if attempt >= self.max_retries {
            return RetryDecision::Exhausted;
        }
        if !self.can_retry(error) {
            return RetryDecision::NotRetryable;
        }
        RetryDecision::Retry(self.delay_for(error))
    }
}

/// Retry strategy input where every field is optional.
#[derive(Clone, Default)]
pub struct RetryStrategyOptions {
    /// Maximum number of retries.
    pub max_retries: Option<u32>,
    /// Retryability predicate.
    pub can_retry_error: Option<CanRetryFn>,
    /// Delay function.
    pub delay_between_retries: Option<DelayFn>,
    /// Retry reporting; `Some(RetryLogger::Disabled)` turns it off.
    pub log_retry_attempt: Option<RetryLogger>,
}

impl RetryStrategyOptions {
    /// Fill missing fields with the defaults.
    pub fn resolve(self) -> RetryStrategy {
        let defaults = RetryStrategy::default();
        RetryStrategy {
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            can_retry_error: self.can_retry_error.unwrap_or(defaults.can_retry_error),
            delay_between_retries: self
                .delay_between_retries
                .unwrap_or(defaults.delay_between_retries),
            log_retry_attempt: self.log_retry_attempt.unwrap_or(defaults.log_retry_attempt),
        }
    }
}

impl From<RetryStrategyOptions> for RetryStrategy {
    fn from(options: RetryStrategyOptions) -> Self {
        options.resolve()
    }
}

impl fmt::Debug for RetryStrategyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryStrategyOptions")
            .field("max_retries", &self.max_retries)
            .field("can_retry_error", &self.can_retry_error.is_some())
            .field("delay_between_retries", &self.delay_between_retries.is_some())
            .field("log_retry_attempt", &self.log_retry_attempt)
            .finish()
    }
}

/// Default retryability predicate.
///
/// Errors carrying an HTTP outcome are retried only on `429` and `5xx`, and
/// never when the server answered with a structured error payload (it
/// rejected the request on purpose, whatever the status). Anything else,
/// such as a transport failure, is retried.
pub fn default_can_retry_error(error: &Error) -> bool {
    match error.response_details() {
        Some(details) if details.kontent_error_response.is_some() => false,
        Some(details) => details.status >= 500 || details.status == 429,
        None => true,
    }
}

/// Default delay: the `Retry-After` value of an `invalidResponse`, else zero.
pub fn default_delay_between_retries(error: &Error) -> Duration {
    match &error.kind {
        ErrorKind::InvalidResponse(_) => retry_after_delay(error).unwrap_or(Duration::ZERO),
        _ => Duration::ZERO,
    }
}

fn retry_after_delay(error: &Error) -> Option<Duration> {
    let details = error.response_details()?;
    retry_after_seconds(&details.response_headers).map(Duration::from_secs)
}

/// Run `attempt_fn` until it succeeds or `strategy` stops retrying.
///
/// `attempt_fn` receives the zero-based attempt number. The returned error
/// carries the number of retries performed and the strategy used.
pub async fn execute_with_retry<T, F, Fut>(
    strategy: &RetryStrategy,
    url: &str,
    mut attempt_fn: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;

    loop {
        let mut error = match attempt_fn(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };
        error.retry_attempt = attempt;

        match strategy.decide(attempt, &error) {
            RetryDecision::Retry(delay) => {
                attempt += 1;
                strategy.log_retry_attempt.log(attempt, url);
                debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    reason = error.reason().as_str(),
                    "Attempt failed, retrying"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            decision => {
                debug!(?decision, retries = attempt, reason = error.reason().as_str(), "Giving up");
                error.retry_strategy = Some(strategy.clone());
                return Err(error);
            }
        }
    }
}

/// Backoff strategy for determining retry delays.
#[derive(Debug, Clone, Copy)]
pub enum BackoffStrategy {
    /// Constant delay between retries.
    Constant,
    /// Linear increase in delay (delay * (attempt + 1)).
    Linear,
    /// Exponential increase in delay (delay * factor^attempt).
    Exponential { factor: f64 },
    /// Exponential with random jitter to avoid thundering herd.
    ExponentialWithJitter { factor: f64 },
}

impl BackoffStrategy {
    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay(&self, attempt: u32, initial_delay: Duration, max_delay: Duration) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let secs = match self {
            BackoffStrategy::Constant => initial_delay.as_secs_f64(),
            BackoffStrategy::Linear => initial_delay.as_secs_f64() * (f64::from(attempt) + 1.0),
            BackoffStrategy::Exponential { factor } => {
                initial_delay.as_secs_f64() * factor.powi(exponent)
            }
            BackoffStrategy::ExponentialWithJitter { factor } => {
                let base_delay = initial_delay.as_secs_f64() * factor.powi(exponent);
                // Jitter: random value between 0 and base_delay
                let jitter = rand::rng().random::<f64>() * base_delay;
                base_delay + jitter
            }
        };

        if !secs.is_finite() || secs >= max_delay.as_secs_f64() {
            return max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }
}
