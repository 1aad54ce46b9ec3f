use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::Csrf;
use crate::Raw;

/// Lifetime of an issued OAuth state.
pub const STATE_TTL: Duration = Duration::from_secs(10 * 60);

/// Single-use, expiring association of issued OAuth states.
#[async_trait]
pub trait StateStore {
    async fn put(&self, csrf: &Csrf);

    /// Removes the state and reports whether it was issued and still live.
    async fn take(&self, csrf: &Csrf) -> bool;
}

pub struct InMemoryStateStore {
    ttl: Duration,
    deadlines: RwLock<HashMap<String, Instant>>,
}

impl InMemoryStateStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            deadlines: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new(STATE_TTL)
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn put(&self, csrf: &Csrf) {
        let now = Instant::now();
        let mut deadlines = self.deadlines.write().await;

        deadlines.retain(|_, deadline| *deadline > now);
        deadlines.insert(csrf.raw().to_owned(), now + self.ttl);
        debug!("Issued {csrf:?}, {} state(s) pending", deadlines.len());
    }

    async fn take(&self, csrf: &Csrf) -> bool {
        let deadline = self.deadlines.write().await.remove(csrf.raw());
        deadline.is_some_and(|d| d > Instant::now())
    }
}
