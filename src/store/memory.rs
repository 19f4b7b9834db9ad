use super::{DEFAULT_CHANNEL_CAPACITY, SignupStore, Subscription};
use crate::error::{EtiSignupsError, Result};
use crate::signup::Signup;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};

/// In-process signup store. Backs the offline CLI mode and the tests.
#[derive(Debug, Clone)]
pub struct MemorySignupStore {
    signups: Arc<RwLock<Vec<Signup>>>,
    changes: broadcast::Sender<()>,
    capacity: usize,
}

impl Default for MemorySignupStore {
    fn default() -> Self {
        Self::with_capacity(Vec::new(), DEFAULT_CHANNEL_CAPACITY)
    }
}

impl MemorySignupStore {
    pub fn new(signups: Vec<Signup>) -> Self {
        Self::with_capacity(signups, DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(signups: Vec<Signup>, capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            signups: Arc::new(RwLock::new(signups)),
            changes,
            capacity,
        }
    }

    /// Load a JSON array of signup documents.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| EtiSignupsError::Config {
            message: format!("failed to read fixture {}: {}", path.display(), e),
        })?;
        let signups: Vec<Signup> = serde_json::from_str(&content)?;
        info!("Loaded {} signups from {}", signups.len(), path.display());
        Ok(Self::new(signups))
    }

    /// Insert or replace by id, then notify subscribers.
    pub async fn upsert(&self, signup: Signup) {
        {
            let mut signups = self.signups.write().await;
            match signups.iter_mut().find(|s| s.id == signup.id) {
                Some(existing) => *existing = signup,
                None => signups.push(signup),
            }
        }
        let _ = self.changes.send(());
    }

    pub async fn get(&self, id: &str) -> Option<Signup> {
        self.signups.read().await.iter().find(|s| s.id == id).cloned()
    }

    async fn snapshot(&self, event_id: &str, is_admin: bool) -> Vec<Signup> {
        self.signups
            .read()
            .await
            .iter()
            .filter(|s| s.eti_event_id == event_id)
            .map(|s| if is_admin { s.clone() } else { s.public_only() })
            .collect()
    }
}

#[async_trait]
impl SignupStore for MemorySignupStore {
    async fn subscribe(&self, event_id: &str, is_admin: bool) -> Result<Subscription> {
        let (tx, subscription) = Subscription::channel(event_id, self.capacity);
        // subscribe before spawning so no change between now and the first fetch is lost
        let mut changes = self.changes.subscribe();
        let store = self.clone();
        let event_id = event_id.to_string();
        info!("Subscribing to signups of event {} (admin: {})", event_id, is_admin);

        tokio::spawn(async move {
            if !tx.loading(true).await {
                return;
            }
            let initial = store.snapshot(&event_id, is_admin).await;
            if !tx.snapshot(initial).await || !tx.loading(false).await {
                return;
            }
            loop {
                tokio::select! {
                    _ = tx.cancelled() => break,
                    change = changes.recv() => {
                        if let Err(broadcast::error::RecvError::Closed) = change {
                            break;
                        }
                        let list = store.snapshot(&event_id, is_admin).await;
                        if !tx.snapshot(list).await {
                            break;
                        }
                    }
                }
            }
            debug!("Memory feed for event {} stopped", event_id);
        });

        Ok(subscription)
    }

    async fn mark_attendance(&self, signup: &Signup) -> Result<()> {
        {
            let mut signups = self.signups.write().await;
            let target = signups
                .iter_mut()
                .find(|s| s.id == signup.id)
                .ok_or_else(|| EtiSignupsError::NotFound {
                    message: format!("signup {}", signup.id),
                })?;
            target.did_attend = true;
            target.last_modified_at = Some(chrono::Utc::now());
        }
        info!("Marked attendance for signup {}", signup.id);
        let _ = self.changes.send(());
        Ok(())
    }
}
