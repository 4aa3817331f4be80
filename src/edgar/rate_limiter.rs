use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Caps concurrent outbound EDGAR requests. SEC's fair access policy
/// allows 10 requests per second; staying under that avoids 403s.
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
}

impl RateLimiter {
    pub fn new(max_concurrent: usize) -> Self {
        RateLimiter {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>> {
        self.semaphore
            .acquire()
            .await
            .map_err(|_| anyhow!("Rate limiter semaphore closed"))
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(8)
    }
}
