//! Product catalog store.
//!
//! The catalog is fetched once at startup by a background task. Until that
//! task finishes, [`CatalogStore::is_loaded`] is false and catalog pages show
//! a loading screen. A failed load is retried with exponential backoff; if
//! every attempt fails the store is marked loaded with whatever it held
//! before (empty at startup) and the failure is only logged.

mod client;

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use elitestore_core::{Catalog, Product, ProductId};
use tracing::{error, info, instrument, warn};

pub use client::{CatalogClient, CatalogError};

/// Upper bound for a single backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// How often and how patiently to attempt the catalog load.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first (at least 1).
    pub attempts: u32,
    /// Delay before the second attempt; doubles after each failure.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Policy with the default 500ms base delay.
    #[must_use]
    pub const fn with_attempts(attempts: u32) -> Self {
        Self {
            attempts,
            base_delay: Duration::from_millis(500),
        }
    }

    /// Delay after the given failed attempt (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

struct CatalogState {
    products: Arc<[Product]>,
    loaded: bool,
}

/// Shared, read-mostly product catalog.
///
/// Cheaply cloneable. Readers get immutable snapshots and never hold the
/// lock across an `.await`.
#[derive(Clone)]
pub struct CatalogStore {
    inner: Arc<RwLock<CatalogState>>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    /// Create an empty, not-yet-loaded store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(CatalogState {
                products: Arc::from(Vec::new()),
                loaded: false,
            })),
        }
    }

    /// Create a store that is already loaded with `products`.
    #[must_use]
    pub fn with_products(products: Vec<Product>) -> Self {
        let store = Self::new();
        store.finish_load(Some(products));
        store
    }

    /// Whether the startup load has finished (successfully or not).
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .loaded
    }

    /// The full product set.
    #[must_use]
    pub fn products(&self) -> Arc<[Product]> {
        Arc::clone(
            &self
                .inner
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .products,
        )
    }

    /// An unfiltered catalog view over the current product set.
    #[must_use]
    pub fn snapshot(&self) -> Catalog {
        Catalog::new(self.products())
    }

    /// Look up a product by ID.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<Product> {
        self.products().iter().find(|p| p.id == id).cloned()
    }

    /// Mark the load finished, replacing the product set if one was fetched.
    fn finish_load(&self, products: Option<Vec<Product>>) {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(products) = products {
            state.products = Arc::from(products);
        }
        state.loaded = true;
    }

    /// Fetch the catalog, retrying per `policy`.
    ///
    /// Always marks the store loaded. Returns the number of products held
    /// afterwards.
    #[instrument(skip_all, fields(endpoint = %client.endpoint(), attempts = policy.attempts))]
    pub async fn load(&self, client: &CatalogClient, policy: RetryPolicy) -> usize {
        let attempts = policy.attempts.max(1);

        for attempt in 1..=attempts {
            match client.fetch_products().await {
                Ok(products) => {
                    let count = products.len();
                    self.finish_load(Some(products));
                    info!(count, attempt, "Catalog loaded");
                    return count;
                }
                Err(e) if attempt < attempts => {
                    let delay = policy.delay_after(attempt);
                    warn!(
                        error = %e,
                        attempt,
                        retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Catalog fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(error = %e, attempt, "Catalog fetch failed, serving existing catalog");
                }
            }
        }

        self.finish_load(None);
        self.products().len()
    }
}

/// Spawn a background task that loads the catalog.
///
/// Catalog pages render a loading screen until the task finishes.
pub fn load_catalog_async(store: CatalogStore, client: CatalogClient, policy: RetryPolicy) {
    info!("Spawning background catalog load task");
    tokio::spawn(async move {
        store.load(&client, policy).await;
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::config::CatalogConfig;

    async fn serve(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/products")).unwrap()
    }

    fn client(api_url: Url) -> CatalogClient {
        CatalogClient::new(&CatalogConfig {
            api_url,
            fetch_attempts: 1,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn fast(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            base_delay: Duration::from_millis(1),
        }
    }

    fn sample_json() -> serde_json::Value {
        json!([
            {"id": 1, "title": "Shirt", "category": "men", "price": 20,
             "description": "Cotton", "image": "https://img.test/1.png",
             "rating": {"rate": 4.1, "count": 259}},
            {"id": 2, "title": "Mug", "category": "home", "price": 8}
        ])
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::with_attempts(10);
        assert_eq!(policy.delay_after(1), Duration::from_millis(500));
        assert_eq!(policy.delay_after(2), Duration::from_secs(1));
        assert_eq!(policy.delay_after(3), Duration::from_secs(2));
        assert_eq!(policy.delay_after(9), MAX_BACKOFF);
        assert_eq!(policy.delay_after(u32::MAX), MAX_BACKOFF);
    }

    #[test]
    fn test_new_store_is_empty_and_loading() {
        let store = CatalogStore::new();
        assert!(!store.is_loaded());
        assert!(store.products().is_empty());
        assert!(store.snapshot().categories().is_empty());
    }

    #[tokio::test]
    async fn test_load_success() {
        let url =
            serve(Router::new().route("/products", get(|| async { Json(sample_json()) }))).await;
        let store = CatalogStore::new();

        let count = store.load(&client(url), fast(3)).await;

        assert_eq!(count, 2);
        assert!(store.is_loaded());
        assert_eq!(store.get(ProductId::new(2)).unwrap().title, "Mug");
        assert_eq!(store.snapshot().categories(), vec!["men", "home"]);
    }

    #[tokio::test]
    async fn test_load_retries_then_succeeds() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let router = Router::new().route(
            "/products",
            get(move || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        (StatusCode::SERVICE_UNAVAILABLE, "try later").into_response()
                    } else {
                        Json(sample_json()).into_response()
                    }
                }
            }),
        );
        let url = serve(router).await;
        let store = CatalogStore::new();

        assert_eq!(store.load(&client(url), fast(3)).await, 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_load_failure_marks_loaded_with_empty_catalog() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let router = Router::new().route(
            "/products",
            get(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }
            }),
        );
        let url = serve(router).await;
        let store = CatalogStore::new();

        assert_eq!(store.load(&client(url), fast(2)).await, 0);
        assert!(store.is_loaded());
        assert!(store.products().is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_load_failure_keeps_existing_products() {
        let url = serve(Router::new().route("/products", get(|| async { "not json" }))).await;
        let store = CatalogStore::new();
        store.finish_load(Some(serde_json::from_value(sample_json()).unwrap()));

        assert_eq!(store.load(&client(url), fast(1)).await, 2);
        assert!(store.get(ProductId::new(1)).is_some());
    }

    #[tokio::test]
    async fn test_fetch_reports_status_and_parse_errors() {
        let router = Router::new()
            .route("/products", get(|| async { (StatusCode::NOT_FOUND, "missing") }))
            .route("/bad", get(|| async { Json(json!({"not": "an array"})) }));
        let url = serve(router).await;

        let err = client(url.clone()).fetch_products().await.unwrap_err();
        assert!(matches!(err, CatalogError::Api { status: 404, .. }));

        let err = client(url.join("/bad").unwrap())
            .fetch_products()
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Bind and drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{addr}/products")).unwrap();
        let err = client(url).fetch_products().await.unwrap_err();
        assert!(matches!(err, CatalogError::Http(_)));
    }
}
