//! Checkout route handlers.
//!
//! `POST /checkout` validates the amount, asks the session backend for a
//! checkout session and answers with a `303 See Other` to the gateway's
//! hosted payment page. Failures re-render the form with a message.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use elitestore_core::{CheckoutAmount, CheckoutError, CheckoutFailure};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::PageChrome;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::{load_shopper, visitor_id};
use crate::state::AppState;

/// Checkout form query parameters.
#[derive(Debug, Deserialize)]
pub struct CheckoutQuery {
    /// Prefill for the amount field.
    pub amount: Option<String>,
}

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub amount: String,
}

/// Checkout form template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/form.html")]
pub struct CheckoutFormTemplate {
    pub chrome: PageChrome,
    pub amount: String,
    pub error: Option<String>,
}

/// Post-payment landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct CheckoutSuccessTemplate {
    pub chrome: PageChrome,
}

impl CheckoutFormTemplate {
    async fn render(
        state: &AppState,
        session: &Session,
        amount: String,
        error: Option<String>,
    ) -> Result<Self> {
        let shopper = load_shopper(state.shoppers(), session).await?;
        Ok(Self {
            chrome: PageChrome::new(state, &shopper),
            amount,
            error,
        })
    }
}

/// Display the checkout form.
///
/// Shows the outcome of the visitor's last failed attempt, once.
#[instrument(skip(state, session))]
pub async fn form(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CheckoutQuery>,
) -> Result<impl IntoResponse> {
    let visitor = visitor_id(&session).await?;
    let error = state
        .checkouts()
        .take_failure(visitor)
        .map(|failure| failure.user_message().to_string());

    CheckoutFormTemplate::render(&state, &session, query.amount.unwrap_or_default(), error).await
}

/// Start a hosted checkout.
#[instrument(skip(state, session))]
pub async fn start(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let amount = match CheckoutAmount::parse(&form.amount) {
        Ok(amount) => amount,
        Err(e) => {
            let page =
                CheckoutFormTemplate::render(&state, &session, form.amount, Some(e.to_string()))
                    .await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let visitor = visitor_id(&session).await?;
    let in_flight = state
        .checkouts()
        .begin(visitor, amount)
        .map_err(|e| match e {
            CheckoutError::InProgress => AppError::Conflict(e.to_string()),
            CheckoutError::InvalidTransition { .. } => AppError::Internal(e.to_string()),
        })?;

    let amount_text = amount.path_segment();
    add_breadcrumb(
        "checkout",
        "Checkout started",
        Some(&[("amount", amount_text.as_str())]),
    );

    let outcome = match state.sessions().create_session(&amount).await {
        Ok(checkout_session) => state
            .gateway()
            .redirect_url(&checkout_session)
            .map(|url| (checkout_session.id, url)),
        Err(e) => Err(e),
    };

    let failure = match outcome {
        Ok((session_id, url)) => {
            tracing::info!(
                visitor = %visitor,
                session_id = %session_id,
                "Redirecting to hosted checkout"
            );
            in_flight
                .succeed(session_id)
                .map_err(|e| AppError::Internal(e.to_string()))?;
            return Ok(Redirect::to(url.as_str()).into_response());
        }
        Err(e) => {
            let failure = e.to_failure();
            if matches!(failure, CheckoutFailure::Gateway(_)) {
                tracing::warn!(visitor = %visitor, error = %e, "Checkout refused by gateway");
            } else {
                let event_id = sentry::capture_error(&e);
                tracing::error!(
                    visitor = %visitor,
                    error = %e,
                    sentry_event_id = %event_id,
                    "Checkout session creation failed"
                );
            }
            in_flight.fail(failure.clone());
            failure
        }
    };

    // The failure is displayed right here; don't show it again on the next visit.
    let _ = state.checkouts().take_failure(visitor);

    let status = match failure {
        CheckoutFailure::Gateway(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CheckoutFailure::Unavailable | CheckoutFailure::Cancelled => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    let page = CheckoutFormTemplate::render(
        &state,
        &session,
        amount.path_segment(),
        Some(failure.user_message().to_string()),
    )
    .await?;

    Ok((status, page).into_response())
}

/// Post-payment landing page.
#[instrument(skip(state, session))]
pub async fn success(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let shopper = load_shopper(state.shoppers(), &session).await?;
    Ok(CheckoutSuccessTemplate {
        chrome: PageChrome::new(&state, &shopper),
    })
}
