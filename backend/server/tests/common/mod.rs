#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path as UrlPath, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use waitlist_server::{
    app,
    config::{Config, RemoteConfig},
    state::AppState,
};

pub const TEST_KEY: &str = "test-anon-key";

/// In-memory stand-in for the hosted PostgREST API.
#[derive(Clone, Default)]
pub struct FakeRemote {
    tables: Arc<Mutex<HashMap<String, Vec<Value>>>>,
    failing: Arc<AtomicBool>,
}

impl FakeRemote {
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables.lock().get(table).cloned().unwrap_or_default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn spawn(&self) -> SocketAddr {
        let router = Router::new()
            .route(
                "/rest/v1/{table}",
                get(select_rows).post(insert_rows).delete(delete_rows),
            )
            .with_state(self.clone());

        serve(router).await
    }

    fn guard(&self, headers: &HeaderMap) -> Option<Response> {
        if self.failing.load(Ordering::SeqCst) {
            return Some(
                (StatusCode::SERVICE_UNAVAILABLE, "database unavailable").into_response(),
            );
        }

        if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some(TEST_KEY) {
            return Some((StatusCode::UNAUTHORIZED, "bad key").into_response());
        }

        None
    }
}

fn matches_filters(row: &Value, params: &HashMap<String, String>) -> bool {
    params
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), "select" | "order" | "limit"))
        .all(|(field, filter)| match filter.strip_prefix("eq.") {
            Some(expected) => row.get(field).and_then(Value::as_str) == Some(expected),
            None => false,
        })
}

fn created_at(row: &Value) -> Option<DateTime<Utc>> {
    row.get("created_at")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

async fn select_rows(
    State(remote): State<FakeRemote>,
    UrlPath(table): UrlPath<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Some(rejection) = remote.guard(&headers) {
        return rejection;
    }

    let mut rows: Vec<Value> = remote
        .rows(&table)
        .into_iter()
        .filter(|row| matches_filters(row, &params))
        .collect();

    if let Some(order) = params.get("order") {
        rows.sort_by_key(created_at);
        if order.ends_with(".desc") {
            rows.reverse();
        }
    }

    if let Some(limit) = params.get("limit").and_then(|l| l.parse().ok()) {
        rows.truncate(limit);
    }

    Json(rows).into_response()
}

async fn insert_rows(
    State(remote): State<FakeRemote>,
    UrlPath(table): UrlPath<String>,
    headers: HeaderMap,
    Json(rows): Json<Vec<Value>>,
) -> Response {
    if let Some(rejection) = remote.guard(&headers) {
        return rejection;
    }

    let mut tables = remote.tables.lock();
    let stored = tables.entry(table).or_default();
    for mut row in rows {
        row["id"] = json!(stored.len() + 1);
        if row.get("created_at").is_none_or(Value::is_null) {
            row["created_at"] = json!(Utc::now());
        }
        stored.push(row);
    }

    StatusCode::CREATED.into_response()
}

async fn delete_rows(
    State(remote): State<FakeRemote>,
    UrlPath(table): UrlPath<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Some(rejection) = remote.guard(&headers) {
        return rejection;
    }

    if let Some(rows) = remote.tables.lock().get_mut(&table) {
        rows.retain(|row| !matches_filters(row, &params));
    }

    StatusCode::NO_CONTENT.into_response()
}

/// A remote that accepts connections and never answers.
pub async fn spawn_unresponsive() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    address
}

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    address
}

pub fn file_config(data_dir: &Path) -> Config {
    Config {
        environment: "test".to_string(),
        data_dir: data_dir.to_path_buf(),
        remote_timeout: Duration::from_secs(2),
        ..Config::default()
    }
}

pub fn remote_config(data_dir: &Path, remote: SocketAddr) -> Config {
    Config {
        remote: Some(RemoteConfig {
            url: format!("http://{remote}"),
            key: TEST_KEY.to_string(),
        }),
        ..file_config(data_dir)
    }
}

pub struct TestServer {
    pub base: String,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn start(config: Config) -> Self {
        let state = AppState::new(config).unwrap();
        let address = serve(app(state)).await;

        Self {
            base: format!("http://{address}"),
            client: reqwest::Client::new(),
        }
    }

    pub async fn post(&self, path: &str, source: &str, body: Value) -> (u16, Value) {
        let response = self
            .client
            .post(format!("{}{path}", self.base))
            .header("x-forwarded-for", source)
            .header("user-agent", "integration-test")
            .json(&body)
            .send()
            .await
            .unwrap();

        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    pub async fn post_raw(&self, path: &str, source: &str, body: &'static str) -> (u16, Value) {
        let response = self
            .client
            .post(format!("{}{path}", self.base))
            .header("x-forwarded-for", source)
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap();

        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    pub async fn get(&self, path: &str) -> (u16, Value) {
        let response = self
            .client
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .unwrap();

        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }
}
