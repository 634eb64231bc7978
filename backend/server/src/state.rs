use std::sync::Arc;

use tracing::info;

use super::{
    analytics::AnalyticsService,
    config::Config,
    error::StorageError,
    rate_limit::{Clock, RateLimiter, SystemClock},
    signup::SignupService,
    storage::{FallbackStorage, FileStorage, RemoteStorage, RemoteStore, Storage},
};

pub struct AppState {
    pub config: Config,
    pub storage: Arc<FallbackStorage>,
    pub signups: SignupService,
    pub analytics: AnalyticsService,
}

impl AppState {
    pub fn new(config: Config) -> Result<Arc<Self>, StorageError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Arc<Self>, StorageError> {
        let remote = match &config.remote {
            Some(remote) => Some(RemoteStorage::new(RemoteStore::new(
                remote,
                config.remote_timeout,
            )?)),
            None => None,
        };

        let file = FileStorage::new(&config.data_dir);
        info!("Fallback data directory: {}", file.store().data_dir().display());

        let storage = Arc::new(FallbackStorage::new(remote, file));
        let shared: Arc<dyn Storage> = storage.clone();

        Ok(Arc::new(Self {
            signups: SignupService::new(shared.clone(), RateLimiter::new(clock)),
            analytics: AnalyticsService::new(shared),
            storage,
            config,
        }))
    }
}
