//! Cancellable repeating task.
//!
//! Each tick runs to completion on one background thread before the next
//! interval starts, so ticks from a single poller never overlap. The stop
//! channel doubles as the timer: `recv_timeout` returns `Timeout` once per
//! interval and anything else ends the loop.

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

#[derive(Debug)]
pub struct Poller {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    interval: Duration,
}

impl Poller {
    /// Start calling `tick` every `interval` on a named background thread.
    ///
    /// The first tick fires one interval after spawning.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn spawn<F>(name: &str, interval: Duration, mut tick: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop, stopped) = mpsc::channel::<()>();
        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => tick(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            debug!("poller stopped");
        })?;

        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
            interval,
        })
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Stop the task and wait for an in-flight tick to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    /// Block until the task ends (which only happens after a stop).
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("poller thread panicked");
            }
        }
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("poller thread panicked");
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn wait_for(counter: &AtomicUsize, at_least: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while counter.load(Ordering::SeqCst) < at_least {
            assert!(Instant::now() < deadline, "ticks never reached {at_least}");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn ticks_repeat_until_stopped() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let poller = Poller::spawn("test-poll", Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .expect("spawn");

        wait_for(&ticks, 3);
        poller.stop();

        let after_stop = ticks.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(ticks.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn drop_stops_the_task() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        {
            let _poller = Poller::spawn("test-drop", Duration::from_millis(5), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .expect("spawn");
            wait_for(&ticks, 1);
        }
        let after_drop = ticks.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(ticks.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn slow_tick_delays_but_never_overlaps() {
        let running = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let done = Arc::new(AtomicUsize::new(0));
        let (r, m, d) = (Arc::clone(&running), Arc::clone(&max_seen), Arc::clone(&done));

        let poller = Poller::spawn("test-slow", Duration::from_millis(1), move || {
            let now = r.fetch_add(1, Ordering::SeqCst) + 1;
            m.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            r.fetch_sub(1, Ordering::SeqCst);
            d.fetch_add(1, Ordering::SeqCst);
        })
        .expect("spawn");

        wait_for(&done, 3);
        poller.stop();
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }
}
