//! Integration tests for EliteStore.
//!
//! Each test binds a real storefront on an ephemeral port, backed by two
//! mock upstreams (the product catalog and the checkout session backend),
//! and drives it over HTTP with a cookie-carrying client that does not
//! follow redirects.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p elitestore-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use elitestore_storefront::config::StorefrontConfig;
use elitestore_storefront::state::AppState;
use serde_json::{Value, json};
use url::Url;

/// Hosted checkout base used by every test storefront.
pub const HOSTED_CHECKOUT_URL: &str = "https://checkout.test/pay/";

/// Publishable test-mode key used by every test storefront.
pub const TEST_PUBLISHABLE_KEY: &str = "pk_test_51IntegrationSuite";

/// How the mock session backend answers.
#[derive(Debug, Clone)]
pub enum SessionBehavior {
    /// `200 {"id": ...}`
    Created(&'static str),
    /// `400 {"error": {"message": ...}}`
    GatewayError(&'static str),
    /// `500` with a plain-text body.
    ServerError,
    /// Wait before answering `Created`.
    Slow(Duration, &'static str),
}

/// Options for [`TestStorefront::start_with`].
#[derive(Debug, Clone)]
pub struct TestOptions {
    pub products: Value,
    pub session: SessionBehavior,
    /// Load the catalog before returning.
    pub load_catalog: bool,
    /// How long failed checkout flows are kept (whole seconds).
    pub failure_retention: Duration,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            products: sample_products(),
            session: SessionBehavior::Created("sess_abc"),
            load_catalog: true,
            failure_retention: Duration::from_secs(600),
        }
    }
}

/// Shared state of the mock session backend.
#[derive(Clone)]
struct SessionMock {
    behavior: SessionBehavior,
    hits: Arc<AtomicUsize>,
    amounts: Arc<Mutex<Vec<String>>>,
}

/// A running storefront plus its mock upstreams.
pub struct TestStorefront {
    pub base_url: Url,
    pub catalog_url: Url,
    pub state: AppState,
    /// Cookie-carrying client that never follows redirects.
    pub client: reqwest::Client,
    session_hits: Arc<AtomicUsize>,
    session_amounts: Arc<Mutex<Vec<String>>>,
}

impl TestStorefront {
    /// Start with the sample catalog and a backend issuing `sess_abc`.
    pub async fn start() -> Self {
        Self::start_with(TestOptions::default()).await
    }

    pub async fn start_with(options: TestOptions) -> Self {
        let products = options.products;
        let catalog_router = Router::new().route(
            "/products",
            get(move || {
                let products = products.clone();
                async move { Json(products) }
            }),
        );
        let catalog_url = serve(catalog_router)
            .await
            .join("products")
            .expect("catalog url");

        let session_mock = SessionMock {
            behavior: options.session,
            hits: Arc::new(AtomicUsize::new(0)),
            amounts: Arc::new(Mutex::new(Vec::new())),
        };
        let session_hits = Arc::clone(&session_mock.hits);
        let session_amounts = Arc::clone(&session_mock.amounts);
        let session_router = Router::new()
            .route("/create-checkout-session/{amount}", post(create_session))
            .with_state(session_mock);
        let session_url = serve(session_router).await;

        let vars: HashMap<&str, String> = HashMap::from([
            ("STOREFRONT_BASE_URL", "http://127.0.0.1".to_string()),
            ("PAYMENT_PUBLISHABLE_KEY", TEST_PUBLISHABLE_KEY.to_string()),
            ("CATALOG_API_URL", catalog_url.to_string()),
            ("CATALOG_FETCH_ATTEMPTS", "1".to_string()),
            ("CHECKOUT_SESSION_URL", session_url.to_string()),
            ("CHECKOUT_HOSTED_URL", HOSTED_CHECKOUT_URL.to_string()),
            ("CHECKOUT_TIMEOUT_SECS", "5".to_string()),
            (
                "CHECKOUT_FAILURE_RETENTION_SECS",
                options.failure_retention.as_secs().to_string(),
            ),
        ]);
        let config = StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
            .expect("test configuration");

        let state = AppState::new(config).expect("application state");
        if options.load_catalog {
            state.load_catalog().await;
        }

        let base_url = serve(elitestore_storefront::router(state.clone())).await;

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("http client");

        Self {
            base_url,
            catalog_url,
            state,
            client,
            session_hits,
            session_amounts,
        }
    }

    /// Absolute URL for a storefront path.
    pub fn url(&self, path: &str) -> Url {
        self.base_url.join(path).expect("valid path")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request")
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request")
    }

    /// GET a page and return its body, asserting `200 OK`.
    pub async fn page(&self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK, "GET {path}");
        response.text().await.expect("response body")
    }

    /// Number of session-creation requests the backend received.
    pub fn session_requests(&self) -> usize {
        self.session_hits.load(Ordering::SeqCst)
    }

    /// Amount path segments the backend received, in order.
    pub fn session_amounts(&self) -> Vec<String> {
        self.session_amounts
            .lock()
            .expect("amounts lock")
            .clone()
    }
}

/// Product array in the catalog's wire format.
pub fn sample_products() -> Value {
    json!([
        {
            "id": 1,
            "title": "Cotton Shirt",
            "price": 20,
            "description": "Everyday cotton shirt",
            "category": "men",
            "image": "https://img.test/1.png",
            "rating": {"rate": 4.1, "count": 259}
        },
        {
            "id": 2,
            "title": "Coffee Mug",
            "price": 8.5,
            "description": "Ceramic mug",
            "category": "home",
            "image": "https://img.test/2.png",
            "rating": {"rate": 3.2, "count": 40}
        },
        {
            "id": 3,
            "title": "Linen Shirt",
            "price": 45.99,
            "description": "Breathable linen",
            "category": "men",
            "image": "https://img.test/3.png"
        },
        {
            "id": 4,
            "title": "Gold Ring",
            "price": 695,
            "description": "Solid gold",
            "category": "jewelery",
            "image": "https://img.test/4.png",
            "rating": {"rate": 4.9, "count": 12}
        }
    ])
}

async fn serve(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server");
    });
    Url::parse(&format!("http://{addr}/")).expect("server url")
}

async fn create_session(State(mock): State<SessionMock>, Path(amount): Path<String>) -> Response {
    mock.hits.fetch_add(1, Ordering::SeqCst);
    mock.amounts.lock().expect("amounts lock").push(amount);

    match mock.behavior {
        SessionBehavior::Created(id) => Json(json!({ "id": id })).into_response(),
        SessionBehavior::GatewayError(message) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": { "message": message } })),
        )
            .into_response(),
        SessionBehavior::ServerError => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
        SessionBehavior::Slow(delay, id) => {
            tokio::time::sleep(delay).await;
            Json(json!({ "id": id })).into_response()
        }
    }
}
