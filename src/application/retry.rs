//! Bounded retry around a single remote read operation.
//!
//! The policy is deliberately simple: a fixed delay between attempts, no
//! exponential backoff, and retries only for the tagged error kinds that
//! signal authentication or signed-URL transience. Everything else
//! propagates on the first failure.

use crate::domain::errors::Result;
use crate::domain::events::FetchEvent;
use crate::ports::event_port::EventSink;
use log::warn;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub max_attempts: u32,
    /// Fixed sleep between attempts.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

/// Runs `op` up to `policy.max_attempts` times.
///
/// Returns the first successful result. A non-retryable error propagates
/// immediately without consuming further attempts; a retryable error on
/// the last attempt propagates as-is. Each failed try is logged and
/// emitted as an [`FetchEvent::AttemptFailed`]; error messages are the
/// tagged summaries from the catalog boundary, never raw credentials.
pub fn fetch_with_retry<T, F>(
    label: &str,
    policy: &RetryPolicy,
    events: &dyn EventSink,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => {
                events.emit(&FetchEvent::AttemptFailed {
                    label: label.to_string(),
                    attempt,
                    max_attempts,
                    error: e.to_string(),
                });

                if !e.is_retryable() {
                    warn!("{label}: non-retryable error on attempt {attempt}: {e}");
                    return Err(e);
                }
                if attempt >= max_attempts {
                    warn!("{label}: giving up after {attempt} attempts: {e}");
                    return Err(e);
                }
                warn!(
                    "{label}: attempt {attempt}/{max_attempts} failed ({e}), retrying in {:?}",
                    policy.base_delay
                );
                std::thread::sleep(policy.base_delay);
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{ErrorKind, FetchError};
    use crate::ports::event_port::NullSink;
    use std::cell::Cell;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(0),
        }
    }

    #[test]
    fn test_success_on_first_attempt() {
        let calls = Cell::new(0u32);
        let result = fetch_with_retry("t", &fast_policy(3), &NullSink, || {
            calls.set(calls.get() + 1);
            Ok(42)
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_retryable_then_success() {
        let calls = Cell::new(0u32);
        let result = fetch_with_retry("t", &fast_policy(3), &NullSink, || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(FetchError::catalog(ErrorKind::Auth, "HTTP 401"))
            } else {
                Ok("ok")
            }
        });
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_retryable_exhaustion() {
        let calls = Cell::new(0u32);
        let result: Result<()> = fetch_with_retry("t", &fast_policy(3), &NullSink, || {
            calls.set(calls.get() + 1);
            Err(FetchError::catalog(ErrorKind::NotFound, "signed URL expired"))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_fixed_delay_between_attempts() {
        let policy = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(50),
        };
        let start = std::time::Instant::now();
        let result: Result<()> = fetch_with_retry("t", &policy, &NullSink, || {
            Err(FetchError::catalog(ErrorKind::Auth, "HTTP 401"))
        });
        assert!(result.is_err());
        // One sleep separates the two attempts.
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_fatal_error_single_attempt() {
        let calls = Cell::new(0u32);
        let result: Result<()> = fetch_with_retry("t", &fast_policy(5), &NullSink, || {
            calls.set(calls.get() + 1);
            Err(FetchError::Decode("corrupt parquet footer".into()))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_attempt_events_emitted() {
        use crate::domain::events::FetchEvent;
        use std::sync::Mutex;

        struct Recorder(Mutex<Vec<FetchEvent>>);
        impl EventSink for Recorder {
            fn emit(&self, event: &FetchEvent) {
                self.0.lock().unwrap().push(event.clone());
            }
        }

        let sink = Recorder(Mutex::new(Vec::new()));
        let _: Result<()> = fetch_with_retry("load table", &fast_policy(2), &sink, || {
            Err(FetchError::catalog(ErrorKind::Auth, "HTTP 401"))
        });

        let events = sink.0.lock().unwrap();
        assert_eq!(events.len(), 2);
        match &events[0] {
            FetchEvent::AttemptFailed {
                label,
                attempt,
                max_attempts,
                ..
            } => {
                assert_eq!(label, "load table");
                assert_eq!(*attempt, 1);
                assert_eq!(*max_attempts, 2);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
