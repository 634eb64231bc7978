use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SIGNUPS_TABLE: &str = "SignUps";
pub const ANALYTICS_TABLE: &str = "Analytics";

pub const EMAIL_FIELD: &str = "email";
pub const CREATED_AT_FIELD: &str = "created_at";

pub const PAGE_VIEW: &str = "page_view";
pub const SIGNUP_ATTEMPT: &str = "signup_attempt";
pub const SIGNUP_SUCCESS: &str = "signup_success";
pub const VIDEO_INTERACTION: &str = "video_interaction";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SignupRecord {
    pub email: String,

    // older fallback documents wrote the creation time as `timestamp`
    #[serde(alias = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AnalyticsEvent {
    pub event: Option<String>,
    pub action: Option<String>,
    pub platform: Option<String>,
    pub current_time: Option<f64>,
    pub page: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub ip_address: Option<String>,

    #[serde(alias = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct SignupRequest {
    // kept loose so a non-string email is a validation error, not a decode error
    pub email: Option<serde_json::Value>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsPayload {
    pub event: Option<String>,
    pub action: Option<String>,
    pub platform: Option<String>,
    pub current_time: Option<f64>,
    pub page: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

#[derive(Serialize)]
pub struct SignupSuccess {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct SignupEntry {
    pub email: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct SignupList {
    pub count: usize,
    pub signups: Vec<SignupEntry>,
}

#[derive(Serialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_events: usize,
    pub page_views: usize,
    pub signup_attempts: usize,
    pub signup_successes: usize,
    pub video_interactions: usize,
    /// Stored rows as returned by the backend, unknown columns included.
    pub recent_events: Vec<serde_json::Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: &'static str,
    pub environment: String,
    pub storage_configured: bool,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct StorageCheck {
    pub status: &'static str,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
