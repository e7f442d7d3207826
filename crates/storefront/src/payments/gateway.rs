//! Hosted payment page redirect.

use url::Url;

use super::{CheckoutSession, PaymentError};
use crate::config::CheckoutConfig;

/// The payment gateway's hosted checkout page.
#[derive(Debug, Clone)]
pub struct HostedCheckout {
    hosted_url: Url,
    test_mode: bool,
}

impl HostedCheckout {
    #[must_use]
    pub fn new(config: &CheckoutConfig) -> Self {
        Self {
            hosted_url: config.hosted_url.clone(),
            test_mode: config.is_test_mode(),
        }
    }

    /// Whether payments run against the gateway's test environment.
    #[must_use]
    pub const fn is_test_mode(&self) -> bool {
        self.test_mode
    }

    /// Where to send the shopper for `session`.
    ///
    /// Uses the URL supplied by the backend when present, otherwise the
    /// session ID appended to the configured hosted page base.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Parse`] if the backend URL is not HTTP(S) or
    /// the joined URL is invalid.
    pub fn redirect_url(&self, session: &CheckoutSession) -> Result<Url, PaymentError> {
        if let Some(url) = &session.url {
            if !matches!(url.scheme(), "https" | "http") {
                return Err(PaymentError::Parse(format!(
                    "refusing redirect to '{}' URL",
                    url.scheme()
                )));
            }
            return Ok(url.clone());
        }

        self.hosted_url
            .join(session.id.as_str())
            .map_err(|e| PaymentError::Parse(format!("Invalid hosted checkout URL: {e}")))
    }
}
