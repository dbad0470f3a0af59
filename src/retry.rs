//! Retrying repository operations with exponential backoff
//!
//! Whether a failure is retryable is decided by a classifier function passed
//! to [`RetryPolicy::execute`], never by the error's type. The sleeping
//! mechanism is injected through [`Sleeper`] so tests can record delays
//! without waiting.

use crate::error::{Result, VersionError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Blocking delay between attempts
pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration);
}

/// Sleeps the current thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// How an operation ultimately failed
#[derive(Debug)]
pub enum RetryError<E> {
    /// The classifier rejected the error; returned on first occurrence
    Fatal(E),
    /// Every attempt failed with a retryable error, oldest first
    Exhausted(Vec<E>),
}

impl<E> RetryError<E> {
    /// Every error observed, oldest first
    pub fn into_errors(self) -> Vec<E> {
        match self {
            RetryError::Fatal(e) => vec![e],
            RetryError::Exhausted(errors) => errors,
        }
    }
}

/// Exponential backoff: attempt `i` (1-indexed) sleeps `base_delay * 2^(i-1)`
#[derive(Clone)]
pub struct RetryPolicy {
    sleeper: Arc<dyn Sleeper>,
    max_retries: u32,
    base_delay: Duration,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .finish()
    }
}

impl RetryPolicy {
    /// Build a policy, failing fast on a missing sleeper or negative retry count
    pub fn new(
        sleeper: Option<Arc<dyn Sleeper>>,
        max_retries: i64,
        base_delay: Duration,
    ) -> Result<Self> {
        let sleeper =
            sleeper.ok_or_else(|| VersionError::config("retry policy requires a sleeper"))?;
        let max_retries = u32::try_from(max_retries).map_err(|_| {
            VersionError::config(format!(
                "max_retries must be between 0 and {} (got {})",
                u32::MAX,
                max_retries
            ))
        })?;
        Ok(RetryPolicy {
            sleeper,
            max_retries,
            base_delay,
        })
    }

    /// Policy backed by [`ThreadSleeper`]
    pub fn with_thread_sleeper(max_retries: i64, base_delay: Duration) -> Result<Self> {
        Self::new(Some(Arc::new(ThreadSleeper)), max_retries, base_delay)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `attempt` (1-indexed), saturating on overflow
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.checked_mul(factor).unwrap_or(Duration::MAX)
    }

    /// Run `operation`, retrying errors accepted by `is_retryable`.
    ///
    /// The operation runs at most `max_retries + 1` times.
    pub fn execute<T, E, F, C>(&self, mut operation: F, is_retryable: C) -> std::result::Result<T, RetryError<E>>
    where
        F: FnMut() -> std::result::Result<T, E>,
        C: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut errors = Vec::new();
        let mut retry = 0u32;
        loop {
            match operation() {
                Ok(value) => {
                    if retry > 0 {
                        debug!(retries = retry, "operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if !is_retryable(&e) => return Err(RetryError::Fatal(e)),
                Err(e) => {
                    if retry >= self.max_retries {
                        warn!(attempts = retry + 1, error = %e, "retries exhausted");
                        errors.push(e);
                        return Err(RetryError::Exhausted(errors));
                    }
                    retry += 1;
                    let delay = self.delay_for(retry);
                    debug!(
                        attempt = retry,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after transient failure"
                    );
                    errors.push(e);
                    self.sleeper.sleep(delay);
                }
            }
        }
    }

    /// Run a repository operation with [`VersionError::is_transient`] as the
    /// classifier, folding exhaustion into [`VersionError::RetryExhausted`]
    pub fn run<T, F>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        self.execute(operation, VersionError::is_transient)
            .map_err(|failure| match failure {
                RetryError::Fatal(e) => e,
                RetryError::Exhausted(attempts) => VersionError::RetryExhausted {
                    operation: operation_name.to_string(),
                    attempts,
                },
            })
    }
}
