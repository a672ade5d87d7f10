//! Idle animation: the eyes blink at random intervals.

use std::{ops::Range, pin::Pin, time::Duration};

use rand::{rngs::StdRng, Rng as _, SeedableRng as _};
use tokio::time::{sleep, Sleep};

/// Milliseconds between blinks
const OPEN_MS: Range<u64> = 2000..8000;
const CLOSED: Duration = Duration::from_millis(300);

pub struct Blinker {
    rng: StdRng,
    closed: bool,
    timer: Pin<Box<Sleep>>,
}

impl Blinker {
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    #[must_use]
    pub fn with_rng(mut rng: StdRng) -> Self {
        let first = Self::open_for(&mut rng);
        Self {
            rng,
            closed: false,
            timer: Box::pin(sleep(first)),
        }
    }

    fn open_for(rng: &mut StdRng) -> Duration {
        Duration::from_millis(rng.random_range(OPEN_MS))
    }

    /// Wait for the next change and return whether the eyes are now closed.
    pub async fn next(&mut self) -> bool {
        self.timer.as_mut().await;
        self.closed = !self.closed;
        let wait = if self.closed {
            CLOSED
        } else {
            Self::open_for(&mut self.rng)
        };
        self.timer.as_mut().reset(tokio::time::Instant::now() + wait);
        self.closed
    }
}

impl Default for Blinker {
    fn default() -> Self {
        Self::new()
    }
}
