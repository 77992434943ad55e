//! Bare retry for the noisy analog queries
//!
//! Some readings occasionally come back truncated. The remedy is to re-issue
//! the whole command: no backoff, and no distinction between failure kinds
//! beyond refusing to retry transport errors.

use super::CommandError;

/// Run `attempt` up to `attempts` times (at least once).
///
/// Returns the first success, or the failure of the last attempt. The
/// closure receives the 1-based attempt number. A non-retryable error
/// (see [`CommandError::is_retryable`]) is returned immediately.
pub fn with_retries<T>(
    attempts: u32,
    mut attempt: impl FnMut(u32) -> Result<T, CommandError>,
) -> Result<T, CommandError> {
    let attempts = attempts.max(1);
    let mut n = 1;
    loop {
        match attempt(n) {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() || n >= attempts => return Err(e),
            Err(e) => {
                tracing::warn!(attempt = n, of = attempts, error = %e, "attempt failed, retrying");
                n += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::TransportError;

    #[test]
    fn test_first_success_wins() {
        let mut calls = 0;
        let result = with_retries(3, |_| {
            calls += 1;
            Ok::<_, CommandError>(42)
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_success_after_failures() {
        let mut calls = 0;
        let result = with_retries(3, |n| {
            calls += 1;
            if n < 3 {
                Err(CommandError::NoResponse)
            } else {
                Ok(n)
            }
        });
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_last_failure_is_returned() {
        let mut calls = 0;
        let result: Result<(), _> = with_retries(3, |n| {
            calls += 1;
            if n == 3 {
                Err(CommandError::Decode("third".into()))
            } else {
                Err(CommandError::NoResponse)
            }
        });
        assert_eq!(calls, 3);
        match result {
            Err(CommandError::Decode(msg)) => assert_eq!(msg, "third"),
            other => panic!("expected last failure, got {:?}", other),
        }
    }

    #[test]
    fn test_transport_error_stops_immediately() {
        let mut calls = 0;
        let result: Result<(), _> = with_retries(3, |_| {
            calls += 1;
            Err(CommandError::Transport(TransportError::NotOpen))
        });
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(CommandError::Transport(_))));
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        let mut calls = 0;
        let _ = with_retries(0, |_| {
            calls += 1;
            Err::<(), _>(CommandError::NoResponse)
        });
        assert_eq!(calls, 1);
    }
}
