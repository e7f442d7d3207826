//! Hosted checkout integration.
//!
//! # Flow
//!
//! 1. [`CheckoutRegistry::begin`] moves the visitor's flow to `Requesting`
//!    and hands back an [`InFlight`] guard
//! 2. [`CheckoutSessionClient::create_session`] asks the session backend for
//!    a checkout session
//! 3. [`HostedCheckout::redirect_url`] turns the session into the hosted
//!    payment page URL
//! 4. The guard is settled with the outcome; dropping it unsettled marks the
//!    flow cancelled

mod gateway;
mod registry;
mod session;

use elitestore_core::CheckoutFailure;
use thiserror::Error;

pub use gateway::HostedCheckout;
pub use registry::{CheckoutRegistry, InFlight};
pub use session::{CheckoutSession, CheckoutSessionClient};

/// Errors that can occur while starting a hosted checkout.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Session backend returned a non-success status without an error body.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response could not be understood.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The backend or gateway rejected the checkout with a message meant for
    /// the shopper.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Session creation did not answer in time.
    #[error("Session creation timed out")]
    Timeout,
}

impl PaymentError {
    /// Classify the error for the checkout flow.
    ///
    /// Only gateway-reported messages reach the shopper; everything else is
    /// a generic "try again".
    #[must_use]
    pub fn to_failure(&self) -> CheckoutFailure {
        match self {
            Self::Gateway(message) => CheckoutFailure::Gateway(message.clone()),
            Self::Http(_) | Self::Api { .. } | Self::Parse(_) | Self::Timeout => {
                CheckoutFailure::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_gateway_messages_reach_shopper() {
        assert_eq!(
            PaymentError::Gateway("Card declined".to_string()).to_failure(),
            CheckoutFailure::Gateway("Card declined".to_string())
        );
        assert_eq!(PaymentError::Timeout.to_failure(), CheckoutFailure::Unavailable);
        assert_eq!(
            PaymentError::Api {
                status: 500,
                message: "stack trace".to_string()
            }
            .to_failure(),
            CheckoutFailure::Unavailable
        );
        assert_eq!(
            PaymentError::Parse("bad json".to_string()).to_failure(),
            CheckoutFailure::Unavailable
        );
    }
}
