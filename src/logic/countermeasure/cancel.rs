//! Cancellation token honored at every blocking point

use std::sync::Arc;
use std::time::{Duration, Instant};
use parking_lot::{Condvar, Mutex};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cancelled")]
pub struct Cancelled;

#[derive(Default)]
struct Inner {
    cancelled: Mutex<bool>,
    cond: Condvar,
}

/// Cloneable handle; cancelling any clone wakes every sleeper
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let mut flag = self.inner.cancelled.lock();
        *flag = true;
        self.inner.cond.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.lock()
    }

    /// Block for `duration` unless cancelled first. A duration too large to
    /// form a deadline blocks until cancelled.
    pub fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        let deadline = Instant::now().checked_add(duration);
        let mut flag = self.inner.cancelled.lock();
        while !*flag {
            match deadline {
                Some(d) if Instant::now() >= d => return Ok(()),
                Some(d) => {
                    self.inner.cond.wait_until(&mut flag, d);
                }
                None => self.inner.cond.wait(&mut flag),
            }
        }
        Err(Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_completes() {
        let token = CancelToken::new();
        assert!(token.sleep(Duration::from_millis(5)).is_ok());
    }

    #[test]
    fn test_zero_sleep_returns_immediately() {
        assert!(CancelToken::new().sleep(Duration::ZERO).is_ok());
    }

    #[test]
    fn test_cancelled_token_refuses_to_sleep() {
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(token.sleep(Duration::from_secs(60)), Err(Cancelled));
    }

    #[test]
    fn test_cancel_wakes_sleeper() {
        let token = CancelToken::new();
        let sleeper = token.clone();
        let started = Instant::now();
        let handle = std::thread::spawn(move || sleeper.sleep(Duration::from_secs(600)));

        std::thread::sleep(Duration::from_millis(50));
        token.cancel();

        assert_eq!(handle.join().unwrap(), Err(Cancelled));
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[test]
    fn test_unbounded_sleep_ends_on_cancel() {
        let token = CancelToken::new();
        let sleeper = token.clone();
        let handle = std::thread::spawn(move || sleeper.sleep(Duration::MAX));

        std::thread::sleep(Duration::from_millis(20));
        token.cancel();
        assert_eq!(handle.join().unwrap(), Err(Cancelled));
    }
}
