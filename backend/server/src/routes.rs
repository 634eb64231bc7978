//! # Endpoints
//!
//! JSON in, JSON out. Errors are always `{ "error": "<message>" }`.
//!
//! ## Signup
//! - `POST /signup` `{ email }`: 200 `{ success, message }`, 400 invalid/duplicate,
//!   429 rate limited, 500 storage failure
//! - `GET /signup`: `{ count, signups: [{ email, timestamp }] }`, 404 unless
//!   `SIGNUP_LIST_ENABLED` is set
//!
//! ## Analytics
//! - `POST /analytics` `{ event, action?, platform?, currentTime?, page?, userAgent?, referrer? }`:
//!   always 200 `{ success: true }`
//! - `GET /analytics`: tag counts over the latest 1000 events plus the 10 newest
//!
//! ## Health
//! - `GET /health`: `{ status, environment, storageConfigured, timestamp }`
//! - `GET /health/storage`: round trip to the remote store
use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use tracing::warn;

use crate::{
    error::AppError,
    models::{Health, SIGNUPS_TABLE, SignupSuccess, StorageCheck},
    signup::SUCCESS_MESSAGE,
    state::AppState,
    utils::{source_key, user_agent},
};

pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    state
        .signups
        .signup(&source_key(&headers), user_agent(&headers), &body)
        .await?;

    Ok(Json(SignupSuccess {
        success: true,
        message: SUCCESS_MESSAGE,
    }))
}

pub async fn signup_list_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    if !state.config.signup_list_enabled {
        return Err(AppError::NotFound);
    }

    Ok(Json(state.signups.list().await?))
}

pub async fn analytics_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    state
        .analytics
        .record(&source_key(&headers), user_agent(&headers), &body)
        .await;

    (StatusCode::OK, Json(json!({ "success": true })))
}

pub async fn analytics_summary_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.analytics.summary().await?))
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(Health {
        status: "ok",
        environment: state.config.environment.clone(),
        storage_configured: state.config.storage_configured(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

pub async fn storage_check_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let Some(remote) = state.storage.remote() else {
        return Json(StorageCheck {
            status: "not_configured",
            message: "Remote store not configured",
            error: None,
        });
    };

    match remote.store().ping(SIGNUPS_TABLE).await {
        Ok(()) => Json(StorageCheck {
            status: "success",
            message: "Remote store connection working",
            error: None,
        }),
        Err(e) => {
            warn!("Remote store check failed: {e}");

            Json(StorageCheck {
                status: "error",
                message: "Remote store connection failed",
                error: Some(e.to_string()),
            })
        }
    }
}
