//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::catalog::{CatalogClient, CatalogError, CatalogStore, RetryPolicy};
use crate::config::StorefrontConfig;
use crate::models::ShopperStore;
use crate::payments::{CheckoutRegistry, CheckoutSessionClient, HostedCheckout, PaymentError};

/// How often idle shoppers and abandoned checkout flows are swept.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("catalog client: {0}")]
    Catalog(#[from] CatalogError),
    #[error("checkout client: {0}")]
    Payment(#[from] PaymentError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// catalog, visitor state, the checkout clients and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogStore,
    catalog_client: CatalogClient,
    shoppers: ShopperStore,
    sessions: CheckoutSessionClient,
    gateway: HostedCheckout,
    checkouts: CheckoutRegistry,
}

impl AppState {
    /// Create a new application state with an empty, not-yet-loaded catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        Self::with_catalog(config, CatalogStore::new())
    }

    /// Create a new application state around an existing catalog store.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn with_catalog(
        config: StorefrontConfig,
        catalog: CatalogStore,
    ) -> Result<Self, StateError> {
        let catalog_client = CatalogClient::new(&config.catalog)?;
        let sessions = CheckoutSessionClient::new(&config.checkout)?;
        let gateway = HostedCheckout::new(&config.checkout);
        let checkouts = CheckoutRegistry::new(config.checkout.failure_retention);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                catalog_client,
                shoppers: ShopperStore::default(),
                sessions,
                gateway,
                checkouts,
            }),
        })
    }

    /// Spawn the background catalog load.
    pub fn start_catalog_load(&self) {
        crate::catalog::load_catalog_async(
            self.inner.catalog.clone(),
            self.inner.catalog_client.clone(),
            self.retry_policy(),
        );
    }

    /// Load the catalog in the current task, returning the product count.
    pub async fn load_catalog(&self) -> usize {
        self.inner
            .catalog
            .load(&self.inner.catalog_client, self.retry_policy())
            .await
    }

    /// Spawn the background task that drops expired visitor state.
    pub fn start_pruning(&self) {
        let state = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PRUNE_INTERVAL);
            loop {
                interval.tick().await;
                state.prune_expired();
            }
        });
    }

    /// Drop idle shoppers and abandoned checkout flows, returning how many
    /// entries were removed.
    pub fn prune_expired(&self) -> usize {
        let shoppers = self.inner.shoppers.prune_idle();
        let checkouts = self.inner.checkouts.prune_settled();
        if shoppers + checkouts > 0 {
            tracing::info!(shoppers, checkouts, "Pruned expired visitor state");
        }
        shoppers + checkouts
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_attempts(self.inner.config.catalog.fetch_attempts)
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &CatalogStore {
        &self.inner.catalog
    }

    /// Get a reference to the per-visitor cart and wishlist store.
    #[must_use]
    pub fn shoppers(&self) -> &ShopperStore {
        &self.inner.shoppers
    }

    /// Get a reference to the checkout session backend client.
    #[must_use]
    pub fn sessions(&self) -> &CheckoutSessionClient {
        &self.inner.sessions
    }

    /// Get a reference to the hosted checkout gateway.
    #[must_use]
    pub fn gateway(&self) -> &HostedCheckout {
        &self.inner.gateway
    }

    /// Get a reference to the per-visitor checkout flows.
    #[must_use]
    pub fn checkouts(&self) -> &CheckoutRegistry {
        &self.inner.checkouts
    }
}
