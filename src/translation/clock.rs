/*!
 * Time source for backoff and polling.
 *
 * Production code sleeps on the tokio timer; tests swap in `VirtualClock`,
 * which advances instantly and records every requested sleep.
 */

use std::fmt::Debug;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

#[async_trait]
pub trait Clock: Send + Sync + Debug {
    /// Time elapsed since the clock was created
    fn elapsed(&self) -> Duration;

    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `tokio::time`
#[derive(Debug)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Default)]
struct VirtualState {
    elapsed: Duration,
    sleeps: Vec<Duration>,
}

/// Clock whose sleeps return immediately after advancing virtual time
#[derive(Debug, Default)]
pub struct VirtualClock {
    state: Mutex<VirtualState>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every sleep requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().sleeps.clone()
    }

    /// Move time forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        self.state.lock().elapsed += duration;
    }
}

#[async_trait]
impl Clock for VirtualClock {
    fn elapsed(&self) -> Duration {
        self.state.lock().elapsed
    }

    async fn sleep(&self, duration: Duration) {
        {
            let mut state = self.state.lock();
            state.elapsed += duration;
            state.sleeps.push(duration);
        }
        // let other tasks (and cancellation) run between virtual sleeps
        tokio::task::yield_now().await;
    }
}
