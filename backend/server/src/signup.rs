//! # Signups
//!
//! `received -> validated -> checked_duplicate -> persisted | rejected`
//!
//! The rate limiter is consulted before the body is even looked at. Only duplicates and
//! successful inserts count as attempts; malformed or invalid emails are rejected without
//! touching storage or the limiter.
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{error, info};

use crate::{
    error::AppError,
    models::{SignupEntry, SignupList, SignupRecord, SignupRequest},
    rate_limit::RateLimiter,
    storage::Storage,
    utils::{UNKNOWN, is_valid_email, normalize_email},
};

pub const SUCCESS_MESSAGE: &str = "Successfully signed up!";

pub struct SignupService {
    storage: Arc<dyn Storage>,
    limiter: RateLimiter,
}

impl SignupService {
    pub fn new(storage: Arc<dyn Storage>, limiter: RateLimiter) -> Self {
        Self { storage, limiter }
    }

    pub async fn signup(
        &self,
        source: &str,
        user_agent: Option<String>,
        body: &[u8],
    ) -> Result<(), AppError> {
        if !self.limiter.allow(source) {
            info!("Rate limited signup from {source}");
            return Err(AppError::RateLimited);
        }

        let request: SignupRequest =
            serde_json::from_slice(body).map_err(|_| AppError::MalformedPayload)?;
        let email = validate(request.email)?;

        let existing = self.storage.find_signup(&email).await.map_err(|e| {
            error!("Signup lookup failed: {e}");
            AppError::LookupFailed(e)
        })?;

        if existing.is_some() {
            self.limiter.record(source);
            return Err(AppError::AlreadyRegistered);
        }

        let record = SignupRecord {
            email,
            created_at: Utc::now(),
            ip_address: Some(source.to_string()),
            user_agent: Some(user_agent.unwrap_or_else(|| UNKNOWN.to_string())),
        };

        self.storage.insert_signup(&record).await.map_err(|e| {
            error!("Signup insert failed: {e}");
            AppError::SaveFailed(e)
        })?;

        self.limiter.record(source);
        info!("New signup from {source}");

        Ok(())
    }

    pub async fn list(&self) -> Result<SignupList, AppError> {
        let signups = self
            .storage
            .list_signups()
            .await
            .map_err(AppError::LookupFailed)?;

        Ok(SignupList {
            count: signups.len(),
            signups: signups
                .into_iter()
                .map(|s| SignupEntry {
                    email: s.email,
                    timestamp: s.created_at,
                })
                .collect(),
        })
    }
}

fn validate(email: Option<Value>) -> Result<String, AppError> {
    let email = match email {
        Some(Value::String(email)) if !email.is_empty() => email,
        _ => return Err(AppError::MissingEmail),
    };

    let trimmed = email.trim();
    if !is_valid_email(trimmed) {
        return Err(AppError::InvalidEmail);
    }

    Ok(normalize_email(trimmed))
}
