//! Engine wiring.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;

use erpguard_auth::Hs256Jwt;
use erpguard_events::InMemoryChannelLayer;
use erpguard_infra::{AccessEngine, Argon2Credentials, InMemoryEntityStore, seed};

use crate::config::AppConfig;

pub type Engine = AccessEngine<InMemoryEntityStore, InMemoryChannelLayer>;

#[derive(Clone)]
pub struct AppServices {
    pub engine: Engine,
    pub jwt: Arc<Hs256Jwt>,
}

/// Build the engine on in-memory collaborators, seed the permission catalog
/// and create the bootstrap superuser if one is configured.
pub fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let store = Arc::new(InMemoryEntityStore::new());
    let channels = Arc::new(InMemoryChannelLayer::new());
    let credentials = Arc::new(Argon2Credentials::new());

    seed::seed_permission_catalog(store.as_ref()).context("failed to seed permission catalog")?;
    if let Some(bootstrap) = &config.bootstrap_superuser {
        seed::ensure_superuser(
            store.as_ref(),
            credentials.as_ref(),
            &bootstrap.email,
            &bootstrap.password,
            Utc::now(),
        )
        .context("failed to create bootstrap superuser")?;
    }

    let engine = AccessEngine::new(store, channels, credentials).with_lockout(config.lockout);
    let jwt = Arc::new(Hs256Jwt::new(config.jwt_secret.as_bytes(), config.access_token_ttl));

    Ok(AppServices { engine, jwt })
}

/// Run a blocking engine call (argon2 hashing) off the async workers.
pub async fn blocking<T, F>(f: F) -> Result<T, erpguard_infra::ServiceError>
where
    F: FnOnce() -> Result<T, erpguard_infra::ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| erpguard_infra::ServiceError::Internal(e.to_string()))?
}
