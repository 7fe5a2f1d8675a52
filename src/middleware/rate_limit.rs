//! In-memory sliding-window limiter for face verification attempts.
//! State is per process; a multi-instance deployment needs a shared store.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone)]
pub struct RateLimiter {
    attempts: Arc<RwLock<HashMap<Uuid, Vec<Instant>>>>,
    max_attempts: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_attempts: usize, window_secs: u64) -> Self {
        Self {
            attempts: Arc::new(RwLock::new(HashMap::new())),
            max_attempts,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Records an attempt for `user_id` and reports whether it is allowed.
    /// Rejected attempts are not recorded.
    pub async fn check(&self, user_id: Uuid) -> bool {
        let now = Instant::now();
        let mut attempts = self.attempts.write().await;

        let history = attempts.entry(user_id).or_default();
        history.retain(|&at| now.duration_since(at) < self.window);

        if history.len() < self.max_attempts {
            history.push(now);
            true
        } else {
            false
        }
    }

    /// Drops users with no attempts left in the window.
    pub async fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut attempts = self.attempts.write().await;

        attempts.retain(|_, history| {
            history.retain(|&at| now.duration_since(at) < self.window);
            !history.is_empty()
        });

        tracing::debug!("Face attempt limiter: {} active users", attempts.len());
        attempts.len()
    }
}
