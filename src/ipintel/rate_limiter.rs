// Token-bucket rate limiter for getipintel.net queries.
//
// The service allows 15 queries per minute per contact address, with bursts
// of up to 15. The bucket starts full and regains one token every 4 seconds.
// The limit is enforced account-wide, so every client in the process must
// draw from the same bucket: construct it once and hand clones of the handle
// to each client.
//
// Refill is lazy. The token count is brought up to date from the elapsed time
// whenever the bucket is touched, so no background task is needed. A caller
// that has to wait reserves its tokens up front (the count goes negative) and
// then sleeps outside the lock until the reservation matures.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::info;

/// Burst capacity published by getipintel.net.
pub const CAPACITY: u64 = 15;

/// One token is added per interval (15 per minute sustained).
pub const REFILL_INTERVAL: Duration = Duration::from_secs(4);

/// Tokens added per refill interval.
pub const REFILL_QUANTUM: u64 = 1;

/// A shared token bucket. Cloning produces another handle to the same bucket.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<Bucket>>,
    capacity: u64,
    interval: Duration,
    quantum: u64,
}

struct Bucket {
    capacity: i64,
    quantum: i64,
    interval: Duration,
    /// Reference point for tick numbering.
    start: Instant,
    /// Last tick already credited to `available`.
    latest_tick: u64,
    /// Negative while callers hold reservations they are waiting on.
    available: i64,
}

impl Bucket {
    fn tick_at(&self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.start).as_nanos();
        (elapsed / self.interval.as_nanos()) as u64
    }

    fn time_of_tick(&self, tick: u64) -> Instant {
        let nanos = self.interval.as_nanos().saturating_mul(tick as u128);
        self.start + Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Credit every tick that has passed since the last adjustment.
    fn refill(&mut self, now: Instant) {
        let tick = self.tick_at(now);
        if self.available < self.capacity {
            let ticks = i64::try_from(tick.saturating_sub(self.latest_tick)).unwrap_or(i64::MAX);
            let gained = ticks.saturating_mul(self.quantum);
            self.available = self.available.saturating_add(gained).min(self.capacity);
        }
        self.latest_tick = self.latest_tick.max(tick);
    }

    /// Reserve `count` tokens and return how long the caller must wait before
    /// they are usable. Returns `None`, reserving nothing, when that wait would
    /// exceed `max_wait`. A `max_wait` of `None` accepts any wait.
    fn reserve(&mut self, now: Instant, count: u64, max_wait: Option<Duration>) -> Option<Duration> {
        self.refill(now);

        let count = i64::try_from(count).unwrap_or(i64::MAX);
        let remaining = self.available.saturating_sub(count);
        if remaining >= 0 {
            self.available = remaining;
            return Some(Duration::ZERO);
        }

        // Round the shortfall up to whole refill ticks.
        let missing = remaining.unsigned_abs();
        let ticks = missing.div_ceil(self.quantum as u64);
        let ready_at = self.time_of_tick(self.latest_tick.saturating_add(ticks));
        let wait = ready_at.saturating_duration_since(now);

        if matches!(max_wait, Some(limit) if wait > limit) {
            return None;
        }

        self.available = remaining;
        Some(wait)
    }
}

impl RateLimiter {
    /// The bucket matching getipintel.net's published limit: 15 tokens,
    /// refilled one at a time every 4 seconds.
    pub fn getipintel() -> Self {
        Self::build(CAPACITY, REFILL_INTERVAL, REFILL_QUANTUM)
    }

    /// A bucket with custom parameters. The bucket starts full.
    pub fn with_params(capacity: u64, interval: Duration, quantum: u64) -> Result<Self> {
        if capacity == 0 {
            anyhow::bail!("rate limiter capacity must be greater than zero");
        }
        if quantum == 0 {
            anyhow::bail!("rate limiter refill quantum must be greater than zero");
        }
        if interval.is_zero() {
            anyhow::bail!("rate limiter refill interval must be greater than zero");
        }
        Ok(Self::build(capacity, interval, quantum))
    }

    fn build(capacity: u64, interval: Duration, quantum: u64) -> Self {
        let bucket = Bucket {
            capacity: i64::try_from(capacity).unwrap_or(i64::MAX),
            quantum: i64::try_from(quantum).unwrap_or(i64::MAX),
            interval,
            start: Instant::now(),
            latest_tick: 0,
            available: i64::try_from(capacity).unwrap_or(i64::MAX),
        };
        Self {
            inner: Arc::new(Mutex::new(bucket)),
            capacity,
            interval,
            quantum,
        }
    }

    /// Take `tokens` from the bucket, waiting for them if necessary.
    ///
    /// A zero `max_wait` means no bound: the call waits as long as it takes
    /// and always returns `true`. Otherwise the call returns `false` straight
    /// away, consuming nothing, if the tokens cannot be ready within `max_wait`.
    pub async fn acquire(&self, tokens: u64, max_wait: Duration) -> bool {
        if tokens == 0 {
            return true;
        }

        let limit = if max_wait.is_zero() { None } else { Some(max_wait) };

        // Reserve under the lock, sleep without it.
        let reserved = {
            let mut bucket = self.inner.lock().await;
            bucket.reserve(Instant::now(), tokens, limit)
        };

        match reserved {
            None => false,
            Some(wait) if wait.is_zero() => true,
            Some(wait) => {
                info!(
                    delay_ms = wait.as_millis() as u64,
                    tokens = tokens,
                    "Rate limit: waiting {}ms for a query slot",
                    wait.as_millis()
                );
                tokio::time::sleep(wait).await;
                true
            }
        }
    }

    /// Take `tokens` only if they are available right now.
    pub async fn try_acquire(&self, tokens: u64) -> bool {
        if tokens == 0 {
            return true;
        }
        let mut bucket = self.inner.lock().await;
        bucket.reserve(Instant::now(), tokens, Some(Duration::ZERO)).is_some()
    }

    /// Tokens available at this moment. Negative while callers are waiting
    /// on reservations.
    pub async fn available(&self) -> i64 {
        let mut bucket = self.inner.lock().await;
        bucket.refill(Instant::now());
        bucket.available
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn refill_interval(&self) -> Duration {
        self.interval
    }

    pub fn refill_quantum(&self) -> u64 {
        self.quantum
    }
}
