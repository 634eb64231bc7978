use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use super::{FileStorage, RemoteStorage, Storage};
use crate::{
    error::StorageError,
    models::{AnalyticsEvent, SignupRecord},
};

/// Tries the remote backend, then replays the call against the files.
///
/// The remote attempt always finishes before the file attempt starts and only one result is
/// returned. With no remote configured every call goes straight to the files.
pub struct FallbackStorage {
    remote: Option<RemoteStorage>,
    file: FileStorage,
}

macro_rules! with_fallback {
    ($storage:expr, $op:literal, |$backend:ident| $call:expr) => {{
        if let Some($backend) = &$storage.remote {
            match $call.await {
                Ok(value) => return Ok(value),
                Err(e) => warn!("Remote {} failed, falling back to file storage: {e}", $op),
            }
        }

        let $backend = &$storage.file;
        $call.await
    }};
}

impl FallbackStorage {
    pub fn new(remote: Option<RemoteStorage>, file: FileStorage) -> Self {
        Self { remote, file }
    }

    pub fn remote(&self) -> Option<&RemoteStorage> {
        self.remote.as_ref()
    }
}

#[async_trait]
impl Storage for FallbackStorage {
    async fn find_signup(&self, email: &str) -> Result<Option<SignupRecord>, StorageError> {
        with_fallback!(*self, "signup lookup", |backend| backend.find_signup(email))
    }

    async fn insert_signup(&self, record: &SignupRecord) -> Result<(), StorageError> {
        with_fallback!(*self, "signup insert", |backend| backend.insert_signup(record))
    }

    async fn list_signups(&self) -> Result<Vec<SignupRecord>, StorageError> {
        with_fallback!(*self, "signup listing", |backend| backend.list_signups())
    }

    async fn insert_event(&self, event: &AnalyticsEvent) -> Result<(), StorageError> {
        with_fallback!(*self, "event insert", |backend| backend.insert_event(event))
    }

    async fn recent_events(&self, limit: usize) -> Result<Vec<Value>, StorageError> {
        with_fallback!(*self, "event listing", |backend| backend.recent_events(limit))
    }
}
