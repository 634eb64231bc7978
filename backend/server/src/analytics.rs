//! # Analytics
//!
//! Fire-and-forget event log. Writes never fail from the caller's point of view: unparseable
//! payloads and storage errors are logged and dropped.
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{error, warn};

use crate::{
    error::AppError,
    models::{
        AnalyticsEvent, AnalyticsPayload, AnalyticsSummary, PAGE_VIEW, SIGNUP_ATTEMPT,
        SIGNUP_SUCCESS, VIDEO_INTERACTION,
    },
    storage::Storage,
    utils::UNKNOWN,
};

pub const SUMMARY_WINDOW: usize = 1000;
pub const RECENT_EVENTS: usize = 10;

pub struct AnalyticsService {
    storage: Arc<dyn Storage>,
}

impl AnalyticsService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn record(&self, source: &str, user_agent: Option<String>, body: &[u8]) {
        let payload: AnalyticsPayload = match serde_json::from_slice(body) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Discarding unparseable analytics payload from {source}: {e}");
                return;
            }
        };

        let event = AnalyticsEvent {
            event: payload.event,
            action: payload.action,
            platform: payload.platform,
            current_time: payload.current_time,
            page: payload.page,
            user_agent: Some(
                payload
                    .user_agent
                    .or(user_agent)
                    .unwrap_or_else(|| UNKNOWN.to_string()),
            ),
            referrer: payload.referrer,
            ip_address: Some(source.to_string()),
            created_at: Utc::now(),
        };

        if let Err(e) = self.storage.insert_event(&event).await {
            error!("Dropping analytics event: {e}");
        }
    }

    pub async fn summary(&self) -> Result<AnalyticsSummary, AppError> {
        let events = self
            .storage
            .recent_events(SUMMARY_WINDOW)
            .await
            .map_err(|e| {
                error!("Analytics fetch failed: {e}");
                AppError::AnalyticsUnavailable(e)
            })?;

        Ok(summarize(events))
    }
}

/// Counts known tags over `events` (newest first) and keeps the head as the recent list.
pub fn summarize(mut events: Vec<Value>) -> AnalyticsSummary {
    let count = |tag: &str| {
        events
            .iter()
            .filter(|row| row.get("event").and_then(Value::as_str) == Some(tag))
            .count()
    };

    let mut summary = AnalyticsSummary {
        total_events: events.len(),
        page_views: count(PAGE_VIEW),
        signup_attempts: count(SIGNUP_ATTEMPT),
        signup_successes: count(SIGNUP_SUCCESS),
        video_interactions: count(VIDEO_INTERACTION),
        recent_events: Vec::new(),
    };

    events.truncate(RECENT_EVENTS);
    summary.recent_events = events;

    summary
}
