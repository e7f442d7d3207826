//! Router assembly.

use axum::{Router, middleware as axum_middleware};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware::{
    SecurityHeaders, create_session_layer, request_id_middleware, security_headers_middleware,
};
use crate::routes;
use crate::state::AppState;

/// Static asset directory, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Build the full storefront application.
pub fn router(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());
    let security = SecurityHeaders::from_config(state.config());

    Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(request_id_middleware))
                .layer(session_layer)
                .layer(axum_middleware::from_fn_with_state(
                    security,
                    security_headers_middleware,
                )),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
