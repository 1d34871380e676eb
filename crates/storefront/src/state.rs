//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::config::StorefrontConfig;
use crate::services::ZoneDirectory;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the backend client, the zone catalog, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    zones: ZoneDirectory,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api)?;
        let zones = ZoneDirectory::new(api.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner { config, api, zones }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the delivery-zone directory.
    #[must_use]
    pub fn zones(&self) -> &ZoneDirectory {
        &self.inner.zones
    }

    /// Fetch the delivery zones in the background so the first checkout does
    /// not wait on them.
    pub fn start_zone_prefetch(&self) {
        let state = self.clone();
        tokio::spawn(async move {
            let catalog = state.zones().load().await;
            if catalog.is_loading() {
                tracing::warn!("Delivery zones unavailable at startup, will retry on demand");
            }
        });
    }
}
