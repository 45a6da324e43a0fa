//! Periodic tick abstraction for the elapsed-time timer.
//!
//! The engine pairs every subscription open with exactly one live ticker;
//! [`ThreadTicker`] is the production implementation, tests inject a manual
//! one. Stopping is prompt: the worker blocks on a channel with the tick
//! period as timeout, so a stop never waits for a full period.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Starts tick loops. One `start` call produces one live tick loop, owned by
/// the returned handle.
pub trait Ticker: Send + Sync {
    fn start(&self, on_tick: Box<dyn Fn() + Send + Sync>) -> Box<dyn TickerHandle>;
}

/// Owner of a running tick loop. Dropping the handle stops the loop.
pub trait TickerHandle: Send {
    fn stop(&mut self);
}

/// Production ticker: a plain thread waking up once per period.
#[derive(Debug, Clone)]
pub struct ThreadTicker {
    period: Duration,
}

impl ThreadTicker {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }
}

impl Default for ThreadTicker {
    /// The 1-second UI tick used for elapsed-time display.
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Ticker for ThreadTicker {
    fn start(&self, on_tick: Box<dyn Fn() + Send + Sync>) -> Box<dyn TickerHandle> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let period = self.period;
        let join = thread::spawn(move || loop {
            match stop_rx.recv_timeout(period) {
                Err(RecvTimeoutError::Timeout) => on_tick(),
                // Stop signal, or the handle was dropped.
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        Box::new(ThreadTickerHandle {
            stop_tx: Some(stop_tx),
            join: Some(join),
        })
    }
}

struct ThreadTickerHandle {
    stop_tx: Option<mpsc::Sender<()>>,
    join: Option<thread::JoinHandle<()>>,
}

impl TickerHandle for ThreadTickerHandle {
    fn stop(&mut self) {
        drop(self.stop_tx.take());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for ThreadTickerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn ticks_repeatedly_until_stopped() {
        let count = Arc::new(AtomicUsize::new(0));
        let ticker = ThreadTicker::new(Duration::from_millis(5));
        let mut handle = {
            let count = Arc::clone(&count);
            ticker.start(Box::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            }))
        };

        thread::sleep(Duration::from_millis(100));
        handle.stop();
        let at_stop = count.load(Ordering::SeqCst);
        assert!(at_stop >= 2, "expected several ticks, got {}", at_stop);

        // stop() joins the worker, so the count is final.
        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), at_stop);
    }

    #[test]
    fn drop_stops_the_loop() {
        let count = Arc::new(AtomicUsize::new(0));
        let ticker = ThreadTicker::new(Duration::from_millis(5));
        let handle = {
            let count = Arc::clone(&count);
            ticker.start(Box::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            }))
        };
        thread::sleep(Duration::from_millis(30));
        drop(handle);
        let after_drop = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn stop_is_idempotent() {
        let ticker = ThreadTicker::new(Duration::from_millis(5));
        let mut handle = ticker.start(Box::new(|| {}));
        handle.stop();
        handle.stop();
    }
}
