//! # File Store
//!
//! Fallback persistence when the remote store is unconfigured or failing.
//!
//! Each record kind lives in a single JSON document holding a top-level array. Every write
//! reads the whole array, appends, and rewrites the document. That is O(n) per write and
//! only suitable for low volume.
//!
//! A missing or unparseable document reads as empty; any other I/O error is returned so a
//! write never replaces a document it could not read. Within one process the read-modify-write
//! cycle is serialized per store; separate processes sharing a data directory can still lose
//! updates.
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::{fs, sync::Mutex};
use tracing::warn;

use super::Storage;
use crate::{
    error::StorageError,
    models::{AnalyticsEvent, SignupRecord},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Signups,
    Analytics,
}

impl RecordKind {
    pub fn file_name(self) -> &'static str {
        match self {
            RecordKind::Signups => "signups.json",
            RecordKind::Analytics => "analytics.json",
        }
    }
}

pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path(&self, kind: RecordKind) -> PathBuf {
        self.data_dir.join(kind.file_name())
    }

    pub async fn read_all<T: DeserializeOwned>(
        &self,
        kind: RecordKind,
    ) -> Result<Vec<T>, StorageError> {
        let path = self.path(kind);

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                warn!("Failed to read {}: {e}", path.display());
                return Err(e.into());
            }
        };

        Ok(serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            warn!("Ignoring unparseable {}: {e}", path.display());
            Vec::new()
        }))
    }

    pub async fn write_all<T: Serialize>(
        &self,
        kind: RecordKind,
        records: &[T],
    ) -> Result<(), StorageError> {
        fs::create_dir_all(&self.data_dir).await?;
        fs::write(self.path(kind), serde_json::to_vec_pretty(records)?).await?;

        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

pub struct FileStorage {
    store: FileStore,
    signups_lock: Mutex<()>,
    analytics_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: FileStore::new(data_dir),
            signups_lock: Mutex::new(()),
            analytics_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn find_signup(&self, email: &str) -> Result<Option<SignupRecord>, StorageError> {
        let signups: Vec<SignupRecord> = self.store.read_all(RecordKind::Signups).await?;

        Ok(signups.into_iter().find(|s| s.email == email))
    }

    async fn insert_signup(&self, record: &SignupRecord) -> Result<(), StorageError> {
        let _guard = self.signups_lock.lock().await;

        // rows stay untyped so the rewrite keeps whatever else is in the document
        let mut signups: Vec<Value> = self.store.read_all(RecordKind::Signups).await?;
        signups.push(serde_json::to_value(record)?);

        self.store.write_all(RecordKind::Signups, &signups).await
    }

    async fn list_signups(&self) -> Result<Vec<SignupRecord>, StorageError> {
        self.store.read_all(RecordKind::Signups).await
    }

    async fn insert_event(&self, event: &AnalyticsEvent) -> Result<(), StorageError> {
        let _guard = self.analytics_lock.lock().await;

        let mut events: Vec<Value> = self.store.read_all(RecordKind::Analytics).await?;
        events.push(serde_json::to_value(event)?);

        self.store.write_all(RecordKind::Analytics, &events).await
    }

    async fn recent_events(&self, limit: usize) -> Result<Vec<Value>, StorageError> {
        let mut events: Vec<Value> = self.store.read_all(RecordKind::Analytics).await?;

        // appended in arrival order; reverse first so equal timestamps stay newest-first
        events.reverse();
        events.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
        events.truncate(limit);

        Ok(events)
    }
}

/// Creation time of a stored row, under either key; rows without one sort last.
fn created_at(row: &Value) -> Option<DateTime<Utc>> {
    ["created_at", "timestamp"]
        .iter()
        .find_map(|key| row.get(*key)?.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}
