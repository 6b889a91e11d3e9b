//! Session store implementations.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::Instant;

use studio_core::{Session, SessionId};

use crate::ports::{SessionStore, StoreError};

/// In-memory session store with per-entry expiry.
///
/// Expired entries read as absent and are removed lazily on access.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, MemoryEntry>>,
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    session: Session,
    expires_at: Instant,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop every expired entry, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(
        &self,
        id: &SessionId,
        session: &Session,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| StoreError::Backend(format!("Session TTL out of range: {ttl:?}")))?;
        let entry = MemoryEntry {
            session: session.clone(),
            expires_at,
        };
        self.entries
            .write()
            .await
            .insert(id.as_str().to_string(), entry);
        Ok(())
    }

    async fn get(&self, id: &SessionId) -> Result<Session, StoreError> {
        {
            let entries = self.entries.read().await;
            match entries.get(id.as_str()) {
                None => return Err(StoreError::NotFound),
                Some(e) if e.expires_at > Instant::now() => return Ok(e.session.clone()),
                Some(_) => {}
            }
        }

        // Expired: remove unless a concurrent save replaced it.
        let mut entries = self.entries.write().await;
        if entries
            .get(id.as_str())
            .is_some_and(|e| e.expires_at <= Instant::now())
        {
            entries.remove(id.as_str());
        }
        Err(StoreError::NotFound)
    }

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
        self.entries.write().await.remove(id.as_str());
        Ok(())
    }
}

/// Session record persisted by [`SledSessionStore`].
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    session: Session,
    expires_at: DateTime<Utc>,
}

/// Session store backed by sled.
///
/// Keys are `<prefix><session id>`; expiry is checked on read.
pub struct SledSessionStore {
    tree: sled::Tree,
    prefix: String,
}

impl SledSessionStore {
    /// Open or create a session store at the given path.
    ///
    /// # Errors
    ///
    /// Returns error if database cannot be opened.
    pub fn open(path: &Path, prefix: impl Into<String>) -> Result<Self, StoreError> {
        let db = sled::open(path.join("sessions"))?;
        Self::with_db(&db, prefix)
    }

    /// Create a session store on an existing sled database.
    ///
    /// # Errors
    ///
    /// Returns error if tree cannot be opened.
    pub fn with_db(db: &sled::Db, prefix: impl Into<String>) -> Result<Self, StoreError> {
        let tree = db.open_tree("sessions")?;
        Ok(Self {
            tree,
            prefix: prefix.into(),
        })
    }

    fn key(&self, id: &SessionId) -> String {
        format!("{}{}", self.prefix, id.as_str())
    }
}

impl std::fmt::Debug for SledSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledSessionStore")
            .field("prefix", &self.prefix)
            .field("entries", &self.tree.len())
            .finish()
    }
}

#[async_trait]
impl SessionStore for SledSessionStore {
    async fn save(
        &self,
        id: &SessionId,
        session: &Session,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| StoreError::Backend(format!("Session TTL out of range: {ttl:?}")))?;
        let record = StoredSession {
            session: session.clone(),
            expires_at,
        };
        let value = serde_json::to_vec(&record)?;

        self.tree.insert(self.key(id).as_bytes(), value)?;
        self.tree.flush_async().await?;
        Ok(())
    }

    async fn get(&self, id: &SessionId) -> Result<Session, StoreError> {
        let key = self.key(id);
        let Some(value) = self.tree.get(key.as_bytes())? else {
            return Err(StoreError::NotFound);
        };

        let record: StoredSession = serde_json::from_slice(&value)?;
        if record.expires_at <= Utc::now() {
            self.tree.remove(key.as_bytes())?;
            return Err(StoreError::NotFound);
        }
        Ok(record.session)
    }

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
        self.tree.remove(self.key(id).as_bytes())?;
        self.tree.flush_async().await?;
        Ok(())
    }
}
