use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::QueryCache;
use crate::config::{AppConfig, MonthBoundary};
use crate::errors::{AppError, Result};
use crate::notify::Notifier;
use crate::remote::{AuthService, DataService, MemoryBackend, RestBackend};
use crate::session::Session;

/// Everything the views share, built once at startup and handed down.
///
/// The session lives in the auth service; views only read it.
pub struct AppContext {
    config: AppConfig,
    data: Arc<dyn DataService>,
    auth: Arc<dyn AuthService>,
    cache: QueryCache,
    notifier: Notifier,
}

impl AppContext {
    pub fn new(config: AppConfig, data: Arc<dyn DataService>, auth: Arc<dyn AuthService>) -> Self {
        Self {
            config,
            data,
            auth,
            cache: QueryCache::new(),
            notifier: Notifier::new(),
        }
    }

    /// Context over a backend that serves both data and auth
    pub fn with_backend<B>(config: AppConfig, backend: Arc<B>) -> Self
    where
        B: DataService + AuthService + 'static,
    {
        info!(backend = backend.backend_name(), "Building application context");
        Self::new(config, backend.clone(), backend)
    }

    /// Context talking to the configured hosted backend
    pub fn connect(config: AppConfig) -> Result<Self> {
        config.require_remote()?;
        if config.app.month_boundary == MonthBoundary::Fixed {
            warn!("month_boundary = \"fixed\" sends dates like 2024-02-31, which the hosted database rejects");
        }
        let backend = Arc::new(RestBackend::new(&config.remote)?);
        Ok(Self::with_backend(config, backend))
    }

    /// Context over an in-process backend seeded with sample data
    pub async fn offline(config: AppConfig) -> Self {
        let backend = Arc::new(MemoryBackend::with_sample_data().await);
        Self::with_backend(config, backend)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn data(&self) -> &dyn DataService {
        self.data.as_ref()
    }

    pub fn auth(&self) -> &dyn AuthService {
        self.auth.as_ref()
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub async fn session(&self) -> Result<Session> {
        self.auth.current_session().await.ok_or(AppError::SessionMissing)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.auth.current_session().await.is_some()
    }

    /// Id of the signed-in account, checked before any data call
    pub async fn owner(&self) -> Result<Uuid> {
        Ok(self.session().await?.user_id())
    }
}
