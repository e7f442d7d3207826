//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use elitestore_core::{Product, ProductId, ShopperState};
use tower_sessions::Session;
use tracing::instrument;

use super::PageChrome;
use super::home::CatalogLoadingTemplate;
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::load_shopper;
use crate::state::AppState;

/// Number of stars in a rating display.
const STAR_COUNT: usize = 5;

const FILLED_STAR: &str = "\u{2605}";
const EMPTY_STAR: &str = "\u{2606}";

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: u32,
    pub title: String,
    pub category: String,
    pub category_label: String,
    pub description: String,
    pub image: String,
    pub price: String,
    /// Marked-up "was" price.
    pub list_price: String,
    pub discount_percent: u32,
    /// One glyph per star, filled ones first.
    pub stars: Vec<&'static str>,
    pub rating_count: Option<u32>,
    pub wishlisted: bool,
    pub in_cart: u32,
}

impl ProductView {
    #[must_use]
    pub fn new(product: &Product, shopper: &ShopperState) -> Self {
        let filled = product.rating.map_or(0, |r| r.filled_stars());
        Self {
            id: product.id.as_u32(),
            title: product.title.clone(),
            category: product.category.clone(),
            category_label: capitalize_first(&product.category),
            description: product.description.clone(),
            image: product.image.clone(),
            price: product.price.to_string(),
            list_price: product.price.list_price().to_string(),
            discount_percent: product.price.discount_percent(),
            stars: (0..STAR_COUNT)
                .map(|i| if i < filled { FILLED_STAR } else { EMPTY_STAR })
                .collect(),
            rating_count: product.rating.map(|r| r.count),
            wishlisted: shopper.is_wishlisted(product.id),
            in_cart: shopper.cart.quantity_of(product.id),
        }
    }
}

/// Uppercase the first character, leaving the rest untouched.
#[must_use]
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub chrome: PageChrome,
    pub product: ProductView,
    pub return_to: String,
}

/// Display product detail page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let shopper = load_shopper(state.shoppers(), &session).await?;
    let chrome = PageChrome::new(&state, &shopper);

    // Unknown IDs can't be told apart from unloaded ones yet.
    if !state.catalog().is_loaded() {
        return Ok(CatalogLoadingTemplate { chrome }.into_response());
    }

    let product = state
        .catalog()
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(ProductShowTemplate {
        chrome,
        product: ProductView::new(&product, &shopper),
        return_to: format!("/products/{id}"),
    }
    .into_response())
}
