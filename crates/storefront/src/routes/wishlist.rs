//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use elitestore_core::ShopperAction;
use tower_sessions::Session;
use tracing::instrument;

use super::cart::ProductActionForm;
use super::products::ProductView;
use super::{PageChrome, safe_return_to};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::{apply_action, load_shopper};
use crate::state::AppState;

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/show.html")]
pub struct WishlistShowTemplate {
    pub chrome: PageChrome,
    pub products: Vec<ProductView>,
    pub return_to: String,
}

/// Display wishlist page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let shopper = load_shopper(state.shoppers(), &session).await?;

    Ok(WishlistShowTemplate {
        chrome: PageChrome::new(&state, &shopper),
        products: shopper
            .wishlist
            .items()
            .iter()
            .map(|product| ProductView::new(product, &shopper))
            .collect(),
        return_to: "/wishlist".to_string(),
    })
}

/// Add a product to the wishlist, or remove it if already there.
#[instrument(skip(state, session))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductActionForm>,
) -> Result<Redirect> {
    let product = state
        .catalog()
        .get(form.product_id)
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product_id)))?;

    let product_id = product.id;
    let shopper =
        apply_action(state.shoppers(), &session, ShopperAction::ToggleWishlist(product)).await?;
    let saved = shopper.is_wishlisted(product_id);

    let id = product_id.to_string();
    add_breadcrumb(
        "wishlist",
        if saved { "Saved to wishlist" } else { "Removed from wishlist" },
        Some(&[("product_id", id.as_str())]),
    );
    tracing::info!(product_id = %product_id, saved, "Wishlist toggled");

    Ok(Redirect::to(&safe_return_to(form.return_to.as_deref(), "/wishlist")))
}
