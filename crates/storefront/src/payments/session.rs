//! Client for the checkout session backend.
//!
//! The backend exposes a single endpoint,
//! `POST /create-checkout-session/{amount}`, which answers with
//! `{"id": "...", "url": "..."}` on success or `{"error": {"message": "..."}}`
//! when the gateway refuses.

use elitestore_core::{CheckoutAmount, CheckoutSessionId};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use super::PaymentError;
use crate::config::CheckoutConfig;

/// A checkout session issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: CheckoutSessionId,
    /// Hosted page URL, when the backend supplies one directly.
    pub url: Option<Url>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SessionResponse {
    Error { error: ErrorBody },
    Created {
        id: String,
        #[serde(default)]
        url: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Session-creation backend client.
#[derive(Clone)]
pub struct CheckoutSessionClient {
    client: reqwest::Client,
    base_url: Url,
}

impl CheckoutSessionClient {
    /// Create a new session client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CheckoutConfig) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.session_url.clone(),
        })
    }

    /// Endpoint used for `amount`.
    ///
    /// # Errors
    ///
    /// Returns error if the joined URL is invalid.
    pub fn endpoint(&self, amount: &CheckoutAmount) -> Result<Url, PaymentError> {
        self.base_url
            .join(&format!("create-checkout-session/{}", amount.path_segment()))
            .map_err(|e| PaymentError::Parse(format!("Invalid session URL: {e}")))
    }

    /// Ask the backend for a checkout session.
    ///
    /// # Errors
    ///
    /// - [`PaymentError::Gateway`] when the backend reports an error message
    /// - [`PaymentError::Timeout`] when the request exceeds the configured timeout
    /// - [`PaymentError::Http`], [`PaymentError::Api`] or [`PaymentError::Parse`]
    ///   for transport failures and unexpected responses
    #[instrument(skip(self), fields(amount = %amount))]
    pub async fn create_session(
        &self,
        amount: &CheckoutAmount,
    ) -> Result<CheckoutSession, PaymentError> {
        let url = self.endpoint(amount)?;

        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(classify)?;
        let status = response.status();
        let body = response.text().await.map_err(classify)?;

        match serde_json::from_str::<SessionResponse>(&body) {
            Ok(SessionResponse::Error { error }) => {
                tracing::warn!(
                    status = status.as_u16(),
                    message = %error.message,
                    "Gateway refused checkout"
                );
                Err(PaymentError::Gateway(error.message))
            }
            _ if !status.is_success() => Err(PaymentError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            }),
            Ok(SessionResponse::Created { id, url }) => {
                let id = CheckoutSessionId::parse(&id)
                    .ok_or_else(|| PaymentError::Parse("invalid session id".to_string()))?;
                let url = url
                    .map(|u| Url::parse(&u))
                    .transpose()
                    .map_err(|e| PaymentError::Parse(format!("invalid session url: {e}")))?;
                Ok(CheckoutSession { id, url })
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse session response"
                );
                Err(PaymentError::Parse(e.to_string()))
            }
        }
    }
}

fn classify(error: reqwest::Error) -> PaymentError {
    if error.is_timeout() {
        PaymentError::Timeout
    } else {
        PaymentError::Http(error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::{Json, Router, extract::Path, http::StatusCode, routing::post};
    use serde_json::json;

    use super::*;

    async fn serve(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    fn client(session_url: Url, timeout: Duration) -> CheckoutSessionClient {
        CheckoutSessionClient::new(&CheckoutConfig {
            session_url,
            hosted_url: Url::parse("https://pay.test/c/").unwrap(),
            publishable_key: "pk_test_abc".to_string(),
            timeout,
            failure_retention: Duration::from_secs(600),
        })
        .unwrap()
    }

    fn amount(s: &str) -> CheckoutAmount {
        CheckoutAmount::parse(s).unwrap()
    }

    #[test]
    fn test_endpoint_appends_amount() {
        let client = client(
            Url::parse("http://localhost:8081/").unwrap(),
            Duration::from_secs(1),
        );
        assert_eq!(
            client.endpoint(&amount("500")).unwrap().as_str(),
            "http://localhost:8081/create-checkout-session/500"
        );
        assert_eq!(
            client.endpoint(&amount("19.90")).unwrap().as_str(),
            "http://localhost:8081/create-checkout-session/19.9"
        );
    }

    #[tokio::test]
    async fn test_create_session_success() {
        let router = Router::new().route(
            "/create-checkout-session/{amount}",
            post(|Path(amount): Path<String>| async move {
                assert_eq!(amount, "500");
                Json(json!({"id": "sess_abc"}))
            }),
        );
        let base = serve(router).await;

        let session = client(base, Duration::from_secs(5))
            .create_session(&amount("500"))
            .await
            .unwrap();

        assert_eq!(session.id.as_str(), "sess_abc");
        assert!(session.url.is_none());
    }

    #[tokio::test]
    async fn test_create_session_with_url() {
        let router = Router::new().route(
            "/create-checkout-session/{amount}",
            post(|| async {
                Json(json!({"id": "cs_test_1", "url": "https://pay.test/c/cs_test_1#frag"}))
            }),
        );
        let base = serve(router).await;

        let session = client(base, Duration::from_secs(5))
            .create_session(&amount("12.50"))
            .await
            .unwrap();

        assert_eq!(
            session.url.unwrap().as_str(),
            "https://pay.test/c/cs_test_1#frag"
        );
    }

    #[tokio::test]
    async fn test_gateway_error_message() {
        let router = Router::new().route(
            "/create-checkout-session/{amount}",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": {"message": "Amount too small"}})),
                )
            }),
        );
        let base = serve(router).await;

        let err = client(base, Duration::from_secs(5))
            .create_session(&amount("0.01"))
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Gateway(ref m) if m == "Amount too small"));
    }

    #[tokio::test]
    async fn test_server_error_without_body() {
        let router = Router::new().route(
            "/create-checkout-session/{amount}",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "oops") }),
        );
        let base = serve(router).await;

        let err = client(base, Duration::from_secs(5))
            .create_session(&amount("5"))
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_invalid_session_id_rejected() {
        let router = Router::new().route(
            "/create-checkout-session/{amount}",
            post(|| async { Json(json!({"id": "../../admin"})) }),
        );
        let base = serve(router).await;

        let err = client(base, Duration::from_secs(5))
            .create_session(&amount("5"))
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Parse(_)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let router = Router::new().route(
            "/create-checkout-session/{amount}",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"id": "late"}))
            }),
        );
        let base = serve(router).await;

        let err = client(base, Duration::from_millis(100))
            .create_session(&amount("5"))
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Timeout));
    }
}
