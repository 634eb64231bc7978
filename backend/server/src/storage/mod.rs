//! # Storage
//!
//! Two backends behind one [`Storage`] trait.
//!
//! - [`RemoteStorage`]: hosted PostgREST tables (`SignUps`, `Analytics`)
//! - [`FileStorage`]: one JSON array document per record kind under the data directory
//!
//! [`FallbackStorage`] picks between them on every call. The remote backend is tried first
//! when configured; any failure is logged and the same call is replayed against the files.
//! Reads and writes follow the same rule.
use async_trait::async_trait;
use serde_json::Value;

pub mod fallback;
pub mod file;
pub mod remote;

pub use fallback::FallbackStorage;
pub use file::{FileStorage, FileStore, RecordKind};
pub use remote::{RemoteStorage, RemoteStore};

use crate::{
    error::StorageError,
    models::{AnalyticsEvent, SignupRecord},
};

#[async_trait]
pub trait Storage: Send + Sync {
    async fn find_signup(&self, email: &str) -> Result<Option<SignupRecord>, StorageError>;

    async fn insert_signup(&self, record: &SignupRecord) -> Result<(), StorageError>;

    /// Every signup, oldest first.
    async fn list_signups(&self) -> Result<Vec<SignupRecord>, StorageError>;

    async fn insert_event(&self, event: &AnalyticsEvent) -> Result<(), StorageError>;

    /// Up to `limit` stored event rows, newest first.
    ///
    /// Rows come back untyped: columns this server never writes (`id`, anything added to the
    /// table later) are kept, and a row with an unexpected shape is still returned.
    async fn recent_events(&self, limit: usize) -> Result<Vec<Value>, StorageError>;
}
