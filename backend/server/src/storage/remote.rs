//! # Remote Store
//!
//! Hosted relational tables reached through a PostgREST-style HTTP API (`/rest/v1/<table>`).
//!
//! ## Queries
//! - Lookup: `GET ?select=*&<field>=eq.<value>&limit=1`
//! - Recent: `GET ?select=*&order=<field>.desc&limit=<n>`
//! - Listing: `GET ?select=*&order=<field>.asc`
//! - Insert: `POST` a one-element array, `Prefer: return=minimal`
//! - Delete: `DELETE ?<field>=eq.<value>`
//!
//! Every call shares one client with a bounded timeout. A timeout is reported like any other
//! failure so the caller can fall back.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use super::Storage;
use crate::{
    config::RemoteConfig,
    error::StorageError,
    models::{
        ANALYTICS_TABLE, AnalyticsEvent, CREATED_AT_FIELD, EMAIL_FIELD, SIGNUPS_TABLE, SignupRecord,
    },
};

#[derive(Clone)]
pub struct RemoteStore {
    client: Client,
    url: String,
    key: String,
}

impl RemoteStore {
    pub fn new(config: &RemoteConfig, timeout: Duration) -> Result<Self, StorageError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            key: config.key.clone(),
        })
    }

    fn table(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", self.key))
    }

    pub async fn find_by_key<T: DeserializeOwned>(
        &self,
        table: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<T>, StorageError> {
        let filter = format!("eq.{value}");
        let request = self.client.get(self.table(table)).query(&[
            ("select", "*"),
            (field, filter.as_str()),
            ("limit", "1"),
        ]);

        let rows: Vec<T> = check(self.authorize(request).send().await?)
            .await?
            .json()
            .await?;

        Ok(rows.into_iter().next())
    }

    pub async fn insert<T: Serialize + Sync>(
        &self,
        table: &str,
        record: &T,
    ) -> Result<(), StorageError> {
        let request = self
            .client
            .post(self.table(table))
            .header("Prefer", "return=minimal")
            .json(&[record]);

        check(self.authorize(request).send().await?).await?;

        Ok(())
    }

    pub async fn list_recent<T: DeserializeOwned>(
        &self,
        table: &str,
        order_field: &str,
        limit: usize,
    ) -> Result<Vec<T>, StorageError> {
        self.select_ordered(table, &format!("{order_field}.desc"), Some(limit))
            .await
    }

    pub async fn list_all<T: DeserializeOwned>(
        &self,
        table: &str,
        order_field: &str,
    ) -> Result<Vec<T>, StorageError> {
        self.select_ordered(table, &format!("{order_field}.asc"), None)
            .await
    }

    async fn select_ordered<T: DeserializeOwned>(
        &self,
        table: &str,
        order: &str,
        limit: Option<usize>,
    ) -> Result<Vec<T>, StorageError> {
        let mut request = self
            .client
            .get(self.table(table))
            .query(&[("select", "*"), ("order", order)]);

        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }

        Ok(check(self.authorize(request).send().await?)
            .await?
            .json()
            .await?)
    }

    pub async fn delete_by_key(
        &self,
        table: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StorageError> {
        let request = self
            .client
            .delete(self.table(table))
            .query(&[(field, format!("eq.{value}"))]);

        check(self.authorize(request).send().await?).await?;

        Ok(())
    }

    /// Cheapest query that proves the table is reachable with our key.
    pub async fn ping(&self, table: &str) -> Result<(), StorageError> {
        let request = self
            .client
            .get(self.table(table))
            .query(&[("select", "*"), ("limit", "1")]);

        check(self.authorize(request).send().await?).await?;

        Ok(())
    }
}

async fn check(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(StorageError::Status {
        status: status.as_u16(),
        body,
    })
}

pub struct RemoteStorage {
    store: RemoteStore,
}

impl RemoteStorage {
    pub fn new(store: RemoteStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RemoteStore {
        &self.store
    }
}

#[async_trait]
impl Storage for RemoteStorage {
    async fn find_signup(&self, email: &str) -> Result<Option<SignupRecord>, StorageError> {
        self.store.find_by_key(SIGNUPS_TABLE, EMAIL_FIELD, email).await
    }

    async fn insert_signup(&self, record: &SignupRecord) -> Result<(), StorageError> {
        self.store.insert(SIGNUPS_TABLE, record).await
    }

    async fn list_signups(&self) -> Result<Vec<SignupRecord>, StorageError> {
        self.store.list_all(SIGNUPS_TABLE, CREATED_AT_FIELD).await
    }

    async fn insert_event(&self, event: &AnalyticsEvent) -> Result<(), StorageError> {
        self.store.insert(ANALYTICS_TABLE, event).await
    }

    async fn recent_events(&self, limit: usize) -> Result<Vec<Value>, StorageError> {
        self.store
            .list_recent(ANALYTICS_TABLE, CREATED_AT_FIELD, limit)
            .await
    }
}
