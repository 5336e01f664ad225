//! Retry policy and the sleep capability it waits through

use std::future::Future;
use std::time::Duration;
use log::debug;

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy
{   /// Total attempts per call, never less than one
    pub max_attempts: usize
  , pub backoff_multiplier: f64
  , pub initial_backoff: Duration
}

impl RetryPolicy
{   /// Create a new retry policy
    pub fn new(
      max_attempts: usize
    , backoff_multiplier: f64
    , initial_backoff_ms: u64
    ) -> Self
    {   RetryPolicy
        {   max_attempts: max_attempts.max(1)
          , backoff_multiplier
          , initial_backoff: Duration::from_millis(
              initial_backoff_ms
            )
        }
    }

    /// Delay after the zero-based `attempt` has failed
    pub fn backoff_for_attempt(
      &self
    , attempt: usize
    ) -> Duration
    {   let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let multiplier = self.backoff_multiplier.powi(exponent);
        let secs = self.initial_backoff.as_secs_f64() * multiplier;
        debug!("Backoff for attempt {}: {:.3}s", attempt, secs);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Whether another attempt follows the zero-based `attempt`
    pub fn has_next(&self, attempt: usize) -> bool
    {   attempt + 1 < self.max_attempts
    }
}

impl Default for RetryPolicy
{   /// Three attempts, waiting 1s then 2s
    fn default() -> Self
    {   RetryPolicy::new(3, 2.0, 1000)
    }
}

/// Suspends the current task between attempts
pub trait Sleeper: Send + Sync
{   fn sleep(&self, duration: Duration)
      -> impl Future<Output = ()> + Send;
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper
{   fn sleep(&self, duration: Duration)
      -> impl Future<Output = ()> + Send
    {   tokio::time::sleep(duration)
    }
}
