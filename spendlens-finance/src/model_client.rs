//! Retry-wrapped access to a text-generation backend.
//!
//! `query` never fails: after the last attempt it logs the error and returns
//! `None`, and callers treat that as "no result".

use std::thread;
use std::time::Duration;
use tracing::{error, warn};

use crate::error::ModelError;
use crate::ollama::OllamaBackend;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 250;

/// Turns a prompt into raw model text. One call is one attempt.
pub trait ModelBackend {
    fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

impl<T: ModelBackend + ?Sized> ModelBackend for &T {
    fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        (**self).generate(prompt)
    }
}

/// Attempt count and delay between attempts.
///
/// Delay before retry `n` (1-based) is `backoff * 2^(n-1)`; a zero backoff
/// retries immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per query, including the first. 0 is treated as 1, so
    /// every query reaches the backend at least once.
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Duration::ZERO,
        }
    }

    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(retry - 1).unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelClient<B = OllamaBackend> {
    backend: B,
    retry: RetryPolicy,
}

impl<B: ModelBackend> ModelClient<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Query with the configured retry count.
    pub fn query(&self, prompt: &str) -> Option<String> {
        self.query_with_retries(prompt, self.retry.max_retries)
    }

    /// Up to `max_retries` attempts in total (at least one). Returns the
    /// trimmed response of the first successful attempt.
    pub fn query_with_retries(&self, prompt: &str, max_retries: u32) -> Option<String> {
        let attempts = max_retries.max(1);

        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = self.retry.delay_before_retry(attempt - 1);
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
            }

            match self.backend.generate(prompt) {
                Ok(text) => return Some(text.trim().to_string()),
                Err(e) if attempt < attempts => {
                    warn!(attempt, attempts, error = %e, "model query failed, retrying");
                }
                Err(e) => {
                    error!(attempts, error = %e, "model query failed after all attempts");
                }
            }
        }

        None
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{client, ScriptedBackend};
    use super::*;

    #[test]
    fn test_success_is_trimmed() {
        let backend = ScriptedBackend::new([Ok("  Groceries\n")]);
        assert_eq!(client(&backend).query("p"), Some("Groceries".to_string()));
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn test_retries_until_success() {
        let backend = ScriptedBackend::new([Err("busy"), Err("busy"), Ok("ok")]);
        assert_eq!(client(&backend).query("p"), Some("ok".to_string()));
        assert_eq!(backend.calls(), 3);
    }

    #[test]
    fn test_gives_up_after_max_retries() {
        let backend = ScriptedBackend::new([Err("a"), Err("b"), Err("c"), Ok("late")]);
        assert_eq!(client(&backend).query("p"), None);
        assert_eq!(backend.calls(), 3);
    }

    #[test]
    fn test_explicit_retry_count() {
        let backend = ScriptedBackend::new([Err("a"), Ok("second")]);
        assert_eq!(client(&backend).query_with_retries("p", 1), None);
        assert_eq!(backend.calls(), 1);

        let backend = ScriptedBackend::new([Err("a"), Ok("second")]);
        assert_eq!(client(&backend).query_with_retries("p", 0), None);
        assert_eq!(backend.calls(), 1, "zero still makes one attempt");
    }

    #[test]
    fn test_zero_retry_policy_still_attempts_once() {
        let backend = ScriptedBackend::new([Ok("Rent/Mortgage")]);
        let c = ModelClient::new(&backend).with_retry(RetryPolicy::immediate(0));
        assert_eq!(c.query("p"), Some("Rent/Mortgage".to_string()));
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_retries: 4,
            backoff: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_before_retry(0), Duration::ZERO);
        assert_eq!(policy.delay_before_retry(1), Duration::from_millis(100));
        assert_eq!(policy.delay_before_retry(2), Duration::from_millis(200));
        assert_eq!(policy.delay_before_retry(3), Duration::from_millis(400));
        assert_eq!(RetryPolicy::immediate(3).delay_before_retry(2), Duration::ZERO);
    }
}
