//! Bounded retry with randomized backoff.
//!
//! The policy only counts attempts. Delays come from a [`Backoff`] source and
//! are spent through a [`Sleeper`], so both can be swapped for deterministic
//! versions in tests.

use log::{debug, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Exp, ExpError};
use std::fmt;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Upper bound on any single randomized wait.
pub const MAX_BACKOFF_DELAY: Duration = Duration::from_secs(600);

/// Source of wait intervals between attempts.
pub trait Backoff: Send {
    fn next_delay(&mut self) -> Duration;
}

/// Exponentially distributed delays, rounded to hundredths of a unit and
/// capped at [`MAX_BACKOFF_DELAY`].
pub struct ExponentialBackoff {
    rng: StdRng,
    dist: Exp<f64>,
    unit: Duration,
}

impl ExponentialBackoff {
    pub fn new(rate: f64, unit: Duration) -> Result<Self, ExpError> {
        Ok(Self {
            rng: StdRng::from_entropy(),
            dist: Exp::new(rate)?,
            unit,
        })
    }

    pub fn seeded(rate: f64, unit: Duration, seed: u64) -> Result<Self, ExpError> {
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            dist: Exp::new(rate)?,
            unit,
        })
    }
}

impl Backoff for ExponentialBackoff {
    fn next_delay(&mut self) -> Duration {
        let draw: f64 = self.dist.sample(&mut self.rng);
        let rounded = (draw * 100.0).round() / 100.0;
        Duration::try_from_secs_f64(self.unit.as_secs_f64() * rounded)
            .map_or(MAX_BACKOFF_DELAY, |d| d.min(MAX_BACKOFF_DELAY))
    }
}

/// Always the same delay.
#[derive(Debug, Clone, Copy)]
pub struct FixedBackoff(pub Duration);

impl Backoff for FixedBackoff {
    fn next_delay(&mut self) -> Duration {
        self.0
    }
}

/// Blocks the current thread for a backoff interval.
pub trait Sleeper: Send + Sync {
    /// Returns `false` if the wait was interrupted and the caller should stop.
    fn sleep(&self, duration: Duration) -> bool;
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) -> bool {
        std::thread::sleep(duration);
        true
    }
}

/// Sleeper that can be woken early from another thread.
///
/// A hook for embedders that own a shutdown signal: hand a clone to the
/// fetcher and call [`interrupt`](Self::interrupt) from the signal handler.
/// The `cefnav` binary installs no handler and uses [`ThreadSleeper`].
#[derive(Clone, Default)]
pub struct InterruptibleSleeper {
    state: Arc<(Mutex<bool>, Condvar)>,
}

impl InterruptibleSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wake any current sleeper and make every later sleep return immediately.
    pub fn interrupt(&self) {
        let (flag, cvar) = &*self.state;
        let mut interrupted = flag.lock().unwrap_or_else(|e| e.into_inner());
        *interrupted = true;
        cvar.notify_all();
    }

    pub fn is_interrupted(&self) -> bool {
        let (flag, _) = &*self.state;
        *flag.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Sleeper for InterruptibleSleeper {
    fn sleep(&self, duration: Duration) -> bool {
        let (flag, cvar) = &*self.state;
        let guard = flag.lock().unwrap_or_else(|e| e.into_inner());
        let (guard, _) = cvar
            .wait_timeout_while(guard, duration, |interrupted| !*interrupted)
            .unwrap_or_else(|e| e.into_inner());
        !*guard
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// All attempts failed, or the wait between attempts was interrupted.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
    pub interrupted: bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    ///
    /// `op` receives the 1-based attempt number. Every error is treated as
    /// retryable. No wait follows the final attempt.
    pub fn run<T, E, F>(
        &self,
        backoff: &mut dyn Backoff,
        sleeper: &dyn Sleeper,
        mut op: F,
    ) -> Result<T, RetryExhausted<E>>
    where
        E: fmt::Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let max = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let err = match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let remaining = max - attempt;
            warn!("attempt {attempt}/{max} failed: {err} ({remaining} remaining)");
            if remaining == 0 {
                return Err(RetryExhausted {
                    attempts: attempt,
                    last_error: err,
                    interrupted: false,
                });
            }

            let delay = backoff.next_delay();
            debug!("waiting {:.2}s before retry", delay.as_secs_f64());
            if !sleeper.sleep(delay) {
                return Err(RetryExhausted {
                    attempts: attempt,
                    last_error: err,
                    interrupted: true,
                });
            }
            attempt += 1;
        }
    }
}
