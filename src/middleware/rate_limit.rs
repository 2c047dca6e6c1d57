//! Per-user sliding window for the summary endpoint, which calls a paid
//! text-generation API on every request.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Clone)]
pub struct RateLimiter {
    attempts: Arc<Mutex<HashMap<Uuid, VecDeque<Instant>>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            attempts: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    /// Records an attempt for `user_id`. Over the limit, returns how long
    /// until the oldest attempt leaves the window.
    pub async fn check(&self, user_id: Uuid) -> Result<(), Duration> {
        let now = Instant::now();
        let mut attempts = self.attempts.lock().await;
        let history = attempts.entry(user_id).or_default();

        while history
            .front()
            .is_some_and(|at| now.duration_since(*at) >= self.window)
        {
            history.pop_front();
        }

        if history.len() < self.max_requests {
            history.push_back(now);
            return Ok(());
        }

        let retry_after = history
            .front()
            .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
            .unwrap_or(self.window);
        Err(retry_after)
    }

    /// Forgets users whose attempts have all aged out. Returns how many remain.
    pub async fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut attempts = self.attempts.lock().await;
        attempts.retain(|_, history| {
            history
                .back()
                .is_some_and(|latest| now.duration_since(*latest) < self.window)
        });
        attempts.len()
    }
}
