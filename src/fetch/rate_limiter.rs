use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Request bookkeeping for one upstream key
#[derive(Debug, Default)]
struct UpstreamState {
    /// Number of requests granted to this upstream in the current run
    request_count: u64,

    /// When the last request to this upstream was granted
    last_request_time: Option<Instant>,
}

impl UpstreamState {
    /// Time left before the next request may go out, None if it may go now
    fn time_until_next_request(&self, min_interval: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < min_interval {
            Some(min_interval - elapsed)
        } else {
            None
        }
    }

    fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }
}

/// Per-upstream minimum-interval gate
///
/// Every upstream key has its own lock, so callers for unrelated upstreams
/// never wait on each other. Callers for the same upstream are serialized and
/// granted slots at least `min_interval` apart, however many worker threads
/// ask at once.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    upstreams: DashMap<String, Arc<Mutex<UpstreamState>>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            upstreams: DashMap::new(),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Blocks the calling thread until a request to `key` may go out
    ///
    /// Returns the instant the slot was granted at.
    pub fn acquire(&self, key: &str) -> Instant {
        let state = self.state_for(key);
        let mut state = state.lock();

        loop {
            let now = Instant::now();
            match state.time_until_next_request(self.min_interval, now) {
                Some(wait) => {
                    tracing::trace!("Upstream {} throttled for {:?}", key, wait);
                    std::thread::sleep(wait);
                }
                None => {
                    state.record_request(now);
                    return now;
                }
            }
        }
    }

    /// Number of requests granted to `key` so far
    pub fn request_count(&self, key: &str) -> u64 {
        self.upstreams
            .get(key)
            .map(|state| state.lock().request_count)
            .unwrap_or(0)
    }

    fn state_for(&self, key: &str) -> Arc<Mutex<UpstreamState>> {
        if let Some(state) = self.upstreams.get(key) {
            return Arc::clone(&state);
        }
        Arc::clone(&self.upstreams.entry(key.to_string()).or_default())
    }
}
