//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Catalog page (q, category, min_price, max_price, sort)
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (catalog loaded)
//!
//! # Products
//! GET  /products/{id}          - Product detail
//!
//! # Cart
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add product (redirects back to return_to)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Wishlist
//! GET  /wishlist               - Wishlist page
//! POST /wishlist/toggle        - Toggle product (redirects back to return_to)
//!
//! # Checkout
//! GET  /checkout               - Amount form
//! POST /checkout               - Create session and redirect to hosted page
//! GET  /checkout/success       - Post-payment landing page
//! ```

pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};
use elitestore_core::ShopperState;

use crate::state::AppState;

/// Values every page needs for the header.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageChrome {
    /// Cart badge count.
    pub cart_count: u64,
    pub wishlist_count: usize,
    /// Show the "test payments" banner.
    pub test_mode: bool,
}

impl PageChrome {
    #[must_use]
    pub fn new(state: &AppState, shopper: &ShopperState) -> Self {
        Self {
            cart_count: shopper.cart_total_quantity(),
            wishlist_count: shopper.wishlist.len(),
            test_mode: state.gateway().is_test_mode(),
        }
    }
}

/// Validate a post-action redirect target.
///
/// Only same-site absolute paths are accepted; anything else (including
/// protocol-relative `//host` URLs) falls back to `fallback`.
#[must_use]
pub fn safe_return_to(candidate: Option<&str>, fallback: &str) -> String {
    match candidate.map(str::trim) {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.starts_with("/\\")
                && !path.chars().any(char::is_control) =>
        {
            path.to_string()
        }
        _ => fallback.to_string(),
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new().route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/count", get(cart::count))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/toggle", post(wishlist::toggle))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::form).post(checkout::start))
        .route("/success", get(checkout::success))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/health", get(home::health))
        .route("/health/ready", get(home::readiness))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/checkout", checkout_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_return_to_accepts_local_paths() {
        assert_eq!(safe_return_to(Some("/"), "/cart"), "/");
        assert_eq!(
            safe_return_to(Some("/?q=shirt&category=men"), "/cart"),
            "/?q=shirt&category=men"
        );
        assert_eq!(safe_return_to(Some("/products/3"), "/cart"), "/products/3");
    }

    #[test]
    fn test_safe_return_to_rejects_external_targets() {
        assert_eq!(safe_return_to(None, "/cart"), "/cart");
        assert_eq!(safe_return_to(Some(""), "/cart"), "/cart");
        assert_eq!(safe_return_to(Some("https://evil.test/"), "/cart"), "/cart");
        assert_eq!(safe_return_to(Some("//evil.test/"), "/cart"), "/cart");
        assert_eq!(safe_return_to(Some("/\\evil.test"), "/cart"), "/cart");
        assert_eq!(safe_return_to(Some("/a\r\nSet-Cookie: x"), "/cart"), "/cart");
    }
}
