use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use waitlist_server::{
    config::Config,
    models::{EMAIL_FIELD, SIGNUPS_TABLE},
    storage::RemoteStore,
};

/// Checks the hosted database end to end: read, insert a throwaway signup, delete it.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Leave the throwaway row in place
    #[arg(long)]
    keep: bool,

    /// Only check that the table is reachable
    #[arg(long)]
    read_only: bool,
}

#[derive(Serialize, Deserialize)]
struct TestSignup {
    email: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let config = Config::load()?;

    let Some(remote) = &config.remote else {
        bail!("SUPABASE_URL and SUPABASE_ANON_KEY must be set");
    };
    let store = RemoteStore::new(remote, config.remote_timeout)?;

    info!("Checking {SIGNUPS_TABLE} at {}", remote.url);
    store
        .ping(SIGNUPS_TABLE)
        .await
        .context("Remote store connection failed")?;
    info!("Connection OK");

    if args.read_only {
        return Ok(());
    }

    let email = format!("test-{}@example.com", Utc::now().timestamp_millis());
    store
        .insert(SIGNUPS_TABLE, &TestSignup { email: email.clone() })
        .await
        .context("Insert failed")?;
    info!("Inserted {email}");

    let found: Option<TestSignup> = store
        .find_by_key(SIGNUPS_TABLE, EMAIL_FIELD, &email)
        .await
        .context("Lookup failed")?;
    if found.is_none() {
        warn!("Inserted row not visible, check row level security read policy");
    }

    if args.keep {
        info!("Keeping {email}");
    } else {
        store
            .delete_by_key(SIGNUPS_TABLE, EMAIL_FIELD, &email)
            .await
            .context("Cleanup failed")?;
        info!("Removed {email}");
    }

    info!("All checks passed");
    Ok(())
}
