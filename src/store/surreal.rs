use super::{SignupStore, SnapshotSender, Subscription};
use crate::config::Config;
use crate::error::{EtiSignupsError, Result};
use crate::signup::Signup;
use anyhow::Context;
use async_trait::async_trait;
use futures_util::StreamExt;
use std::sync::Arc;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::method::QueryStream;
use surrealdb::{Notification, Surreal};
use tracing::{debug, error, info, warn};

const ADMIN_SELECT: &str = "SELECT *, meta::id(id) AS id FROM type::table($tb) \
     WHERE etiEventId = $event ORDER BY lastModifiedAt ASC";

const PUBLIC_SELECT: &str = "SELECT meta::id(id) AS id, etiEventId, orderNumber, nameFirst, nameLast, \
     country, province, city, status, lastModifiedAt, didAttend FROM type::table($tb) \
     WHERE etiEventId = $event ORDER BY lastModifiedAt ASC";

const LIVE_SELECT: &str = "LIVE SELECT * FROM type::table($tb) WHERE etiEventId = $event";

const MARK_ATTENDANCE: &str =
    "UPDATE type::thing($tb, $id) SET didAttend = true, lastModifiedAt = time::now() RETURN NONE";

type LiveStream = QueryStream<Notification<serde_json::Value>>;

/// SurrealDB-backed signup store over WebSocket.
#[derive(Clone)]
pub struct SurrealSignupStore {
    db: Arc<Surreal<Client>>,
    table: String,
    capacity: usize,
}

/// The Ws engine expects host:port without a scheme.
fn normalize_ws_url(s: &str) -> String {
    s.strip_prefix("ws://")
        .or_else(|| s.strip_prefix("wss://"))
        .or_else(|| s.strip_prefix("http://"))
        .or_else(|| s.strip_prefix("https://"))
        .unwrap_or(s)
        .to_string()
}

/// 1s, 2s, 4s, 8s, 16s, then capped at 32s.
fn backoff_ms(attempt: u32) -> u64 {
    (1000 * (1u64 << attempt.min(5))).min(60000)
}

impl SurrealSignupStore {
    pub async fn connect(config: &Config) -> Result<Self> {
        let url = normalize_ws_url(&config.database.url);
        let user = &config.runtime.database_user;
        let pass = &config.runtime.database_pass;
        let ns = &config.database.namespace;
        let dbname = &config.database.database;
        info!("Connecting to signup store at {}", url);

        let max_retries: u32 = if config.runtime.db_reconnect { 5 } else { 0 };
        let mut attempt = 0;
        let db = loop {
            match Surreal::new::<Ws>(url.clone()).await {
                Ok(conn) => {
                    if attempt > 0 {
                        info!("Connected to SurrealDB after {} attempts", attempt + 1);
                    }
                    break conn;
                }
                Err(e) if attempt < max_retries => {
                    let delay_ms = backoff_ms(attempt);
                    warn!(
                        "SurrealDB connection attempt {} failed: {}. Retrying in {}ms...",
                        attempt + 1,
                        e,
                        delay_ms
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(EtiSignupsError::Database {
                        message: format!(
                            "Failed to connect to SurrealDB at {} after {} attempts: {}",
                            config.database.url,
                            attempt + 1,
                            e
                        ),
                    });
                }
            }
        };

        db.signin(surrealdb::opt::auth::Root {
            username: user.as_str(),
            password: pass.as_str(),
        })
        .await
        .with_context(|| format!("Failed to authenticate with SurrealDB as user '{}'", user))?;

        db.use_ns(ns)
            .await
            .with_context(|| format!("Failed to select namespace '{}'", ns))?;
        db.use_db(dbname)
            .await
            .with_context(|| format!("Failed to select database '{}'", dbname))?;

        Ok(Self {
            db: Arc::new(db),
            table: config.database.signups_table.clone(),
            capacity: config.runtime.channel_capacity,
        })
    }

    /// One-shot read of the signups of an event.
    pub async fn fetch(&self, event_id: &str, is_admin: bool) -> Result<Vec<Signup>> {
        let sql = if is_admin { ADMIN_SELECT } else { PUBLIC_SELECT };
        let mut response = self
            .db
            .query(sql)
            .bind(("tb", self.table.clone()))
            .bind(("event", event_id.to_string()))
            .await?;
        let rows: Vec<serde_json::Value> = response.take(0)?;
        Ok(fetch_signups(rows))
    }

    async fn feed(self, event_id: String, is_admin: bool, mut live: LiveStream, tx: SnapshotSender) {
        if !tx.loading(true).await {
            return;
        }
        let initial = match self.fetch(&event_id, is_admin).await {
            Ok(list) => list,
            Err(e) => {
                error!("Initial fetch for event {} failed: {}", event_id, e);
                Vec::new()
            }
        };
        if !tx.snapshot(initial).await || !tx.loading(false).await {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.cancelled() => break,
                notification = live.next() => match notification {
                    Some(Ok(n)) => {
                        debug!("Live {:?} on event {}", n.action, event_id);
                        match self.fetch(&event_id, is_admin).await {
                            Ok(list) => {
                                if !tx.snapshot(list).await {
                                    break;
                                }
                            }
                            Err(e) => error!("Refetch for event {} failed: {}", event_id, e),
                        }
                    }
                    Some(Err(e)) => warn!("Live query error on event {}: {}", event_id, e),
                    None => {
                        warn!("Live query for event {} closed by server", event_id);
                        break;
                    }
                },
            }
        }
        // dropping the stream kills the live query server side
        debug!("Surreal feed for event {} stopped", event_id);
    }
}

/// Decode rows, skipping documents that don't match the model.
fn fetch_signups(rows: Vec<serde_json::Value>) -> Vec<Signup> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<Signup>(row) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("Skipping malformed signup document: {}", e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl SignupStore for SurrealSignupStore {
    async fn subscribe(&self, event_id: &str, is_admin: bool) -> Result<Subscription> {
        info!("Subscribing to signups of event {} (admin: {})", event_id, is_admin);
        let mut response = self
            .db
            .query(LIVE_SELECT)
            .bind(("tb", self.table.clone()))
            .bind(("event", event_id.to_string()))
            .await?;
        let live: LiveStream = response.stream::<Notification<serde_json::Value>>(0)?;

        let (tx, subscription) = Subscription::channel(event_id, self.capacity);
        tokio::spawn(self.clone().feed(event_id.to_string(), is_admin, live, tx));
        Ok(subscription)
    }

    async fn mark_attendance(&self, signup: &Signup) -> Result<()> {
        self.db
            .query(MARK_ATTENDANCE)
            .bind(("tb", self.table.clone()))
            .bind(("id", signup.id.clone()))
            .await?
            .check()?;
        info!("Marked attendance for signup {}", signup.id);
        Ok(())
    }
}
