//! Hosted checkout state machine.
//!
//! ```text
//!                 submit                session_created
//! Idle ───────────────────▶ Requesting ───────────────▶ Redirecting
//!  ▲                         │    ▲                        │
//!  │                    fail │    │ submit           fail  │
//!  │                         ▼    │                        ▼
//!  └──── take_failure ─── Failed ─┴──────────────────── Failed
//! ```
//!
//! A flow in `Requesting` rejects further submissions, so a visitor can have
//! at most one session-creation request outstanding. The storefront performs
//! the I/O and reports each outcome back through these transitions.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::CheckoutAmount;

/// Identifier of a checkout session issued by the session-creation backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckoutSessionId(String);

impl CheckoutSessionId {
    /// Maximum accepted length.
    pub const MAX_LENGTH: usize = 256;

    /// Wrap a session identifier, rejecting values that are empty, too long,
    /// or not URL-path safe.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let valid = !s.is_empty()
            && s.len() <= Self::MAX_LENGTH
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        valid.then(|| Self(s.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CheckoutSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a checkout attempt ended without a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutFailure {
    /// The payment gateway or session backend reported an error. The message
    /// is shown to the visitor.
    Gateway(String),
    /// The session-creation request failed in transport or returned garbage.
    Unavailable,
    /// The request was abandoned before an outcome arrived.
    Cancelled,
}

impl CheckoutFailure {
    /// Message shown on the checkout form.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Gateway(message) => message,
            Self::Unavailable => "We couldn't start checkout right now. Please try again.",
            Self::Cancelled => "Your previous checkout attempt was interrupted. Please try again.",
        }
    }
}

/// Checkout flow states.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutState {
    #[default]
    Idle,
    Requesting { amount: CheckoutAmount },
    Redirecting { session_id: CheckoutSessionId },
    Failed { failure: CheckoutFailure },
}

impl CheckoutState {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting { .. } => "requesting",
            Self::Redirecting { .. } => "redirecting",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Errors returned by invalid checkout transitions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// A session-creation request for this visitor is still outstanding.
    #[error("a checkout is already in progress")]
    InProgress,
    /// The transition is not valid from the current state.
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

/// One visitor's checkout flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutFlow {
    state: CheckoutState,
}

impl CheckoutFlow {
    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    #[must_use]
    pub const fn is_requesting(&self) -> bool {
        matches!(self.state, CheckoutState::Requesting { .. })
    }

    /// The visitor submitted an amount.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InProgress`] while a request is outstanding.
    pub fn submit(&mut self, amount: CheckoutAmount) -> Result<(), CheckoutError> {
        if self.is_requesting() {
            return Err(CheckoutError::InProgress);
        }
        self.state = CheckoutState::Requesting { amount };
        Ok(())
    }

    /// The backend issued a session; the visitor is being redirected.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] unless `Requesting`.
    pub fn session_created(&mut self, session_id: CheckoutSessionId) -> Result<(), CheckoutError> {
        if !self.is_requesting() {
            return Err(self.invalid("complete a checkout"));
        }
        self.state = CheckoutState::Redirecting { session_id };
        Ok(())
    }

    /// The attempt failed.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] unless `Requesting` or
    /// `Redirecting`.
    pub fn fail(&mut self, failure: CheckoutFailure) -> Result<(), CheckoutError> {
        match self.state {
            CheckoutState::Requesting { .. } | CheckoutState::Redirecting { .. } => {
                self.state = CheckoutState::Failed { failure };
                Ok(())
            }
            _ => Err(self.invalid("fail a checkout")),
        }
    }

    /// Take the failure for display, returning the flow to `Idle`.
    ///
    /// Any other state is left untouched.
    pub fn take_failure(&mut self) -> Option<CheckoutFailure> {
        if !matches!(self.state, CheckoutState::Failed { .. }) {
            return None;
        }
        match std::mem::take(&mut self.state) {
            CheckoutState::Failed { failure } => Some(failure),
            _ => None,
        }
    }

    const fn invalid(&self, action: &'static str) -> CheckoutError {
        CheckoutError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }
}
