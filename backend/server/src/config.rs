use std::{env, fmt::Display, fs::read_to_string, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

const PLACEHOLDER_URL: &str = "your-supabase-url-here";
const PLACEHOLDER_KEY: &str = "your-supabase-anon-key-here";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    pub data_dir: PathBuf,
    pub remote_timeout: Duration,
    pub signup_list_enabled: bool,
    pub remote: Option<RemoteConfig>,
}

/// Credentials for the hosted store. Only built when both halves are real values.
#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub url: String,
    pub key: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let remote = RemoteConfig::resolve(
            var("SUPABASE_URL").ok(),
            var("SUPABASE_ANON_KEY")
                .ok()
                .or_else(|| read_secret("SUPABASE_ANON_KEY")),
        );

        match &remote {
            Some(remote) => info!("Remote store configured at {}", remote.url),
            None => warn!("Remote store not configured, using local file storage"),
        }

        Ok(Self {
            port: try_load("RUST_PORT", "3000")?,
            environment: try_load("APP_ENV", "development")?,
            data_dir: try_load("DATA_DIR", "data")?,
            remote_timeout: Duration::from_millis(try_load("REMOTE_TIMEOUT_MS", "5000")?),
            signup_list_enabled: try_load("SIGNUP_LIST_ENABLED", "false")?,
            remote,
        })
    }

    pub fn storage_configured(&self) -> bool {
        self.remote.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            environment: "development".to_string(),
            data_dir: PathBuf::from("data"),
            remote_timeout: Duration::from_secs(5),
            signup_list_enabled: false,
            remote: None,
        }
    }
}

impl RemoteConfig {
    /// Missing, empty, or placeholder settings mean "not configured".
    pub fn resolve(url: Option<String>, key: Option<String>) -> Option<Self> {
        let url = url.map(|s| s.trim().trim_end_matches('/').to_string())?;
        let key = key.map(|s| s.trim().to_string())?;

        if url.is_empty() || key.is_empty() || url == PLACEHOLDER_URL || key == PLACEHOLDER_KEY {
            return None;
        }

        Some(Self { url, key })
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        info!("Environment variable {key} not found");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            anyhow!("invalid {key} value: {e}")
        })
        .context("Environment misconfigured!")
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            info!("No {secret_name} secret file: {e}");
        })
        .ok()
}
