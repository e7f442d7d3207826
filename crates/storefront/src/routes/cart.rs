//! Cart route handlers.
//!
//! Cart state lives in the visitor's session. Adding is the only mutation;
//! there is no removal or quantity editing.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use elitestore_core::{CartEntry, ProductId, ShopperAction};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{PageChrome, safe_return_to};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::{apply_action, load_shopper};
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub id: u32,
    pub title: String,
    pub image: String,
    pub price: String,
    pub quantity: u32,
    pub line_total: String,
}

impl From<&CartEntry> for CartLineView {
    fn from(entry: &CartEntry) -> Self {
        Self {
            id: entry.product.id.as_u32(),
            title: entry.product.title.clone(),
            image: entry.product.image.clone(),
            price: entry.product.price.to_string(),
            quantity: entry.quantity.get(),
            line_total: format_money(entry.line_total()),
        }
    }
}

/// Format a decimal amount as a price string.
fn format_money(amount: Decimal) -> String {
    format!("${amount:.2}")
}

/// Add to cart / toggle wishlist form data.
#[derive(Debug, Deserialize)]
pub struct ProductActionForm {
    pub product_id: ProductId,
    pub return_to: Option<String>,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub chrome: PageChrome,
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    /// Subtotal as a bare number, prefilled into the checkout form.
    pub checkout_amount: String,
}

/// Cart count badge fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let shopper = load_shopper(state.shoppers(), &session).await?;
    let subtotal = shopper.cart.subtotal();

    Ok(CartShowTemplate {
        chrome: PageChrome::new(&state, &shopper),
        lines: shopper.cart.entries().iter().map(CartLineView::from).collect(),
        subtotal: format_money(subtotal),
        checkout_amount: subtotal.round_dp(2).normalize().to_string(),
    })
}

/// Add one unit of a product to the cart.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductActionForm>,
) -> Result<Redirect> {
    let product = state
        .catalog()
        .get(form.product_id)
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product_id)))?;

    let product_id = product.id.to_string();
    let shopper =
        apply_action(state.shoppers(), &session, ShopperAction::AddToCart(product)).await?;

    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
    tracing::info!(
        product_id = %product_id,
        cart_count = shopper.cart_total_quantity(),
        "Added to cart"
    );

    Ok(Redirect::to(&safe_return_to(form.return_to.as_deref(), "/cart")))
}

/// Cart count badge fragment.
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let shopper = load_shopper(state.shoppers(), &session).await?;
    Ok(CartCountTemplate {
        count: shopper.cart_total_quantity(),
    })
}
