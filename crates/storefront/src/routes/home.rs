//! Catalog page and health check handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{OriginalUri, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use elitestore_core::{ALL_CATEGORIES, CategoryFilter, FilterCriteria, SortOrder};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::PageChrome;
use super::products::ProductView;
use crate::error::Result;
use crate::filters;
use crate::models::load_shopper;
use crate::state::AppState;

/// Catalog page query parameters.
///
/// Every request carries the complete criteria; missing or unparseable
/// values fall back to "no restriction".
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort: Option<String>,
}

impl CatalogQuery {
    /// The filter criteria requested.
    #[must_use]
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            search_text: self.q.as_deref().map(str::trim).unwrap_or_default().to_string(),
            category: CategoryFilter::parse(self.category.as_deref().unwrap_or_default()),
            min_price: parse_price(self.min_price.as_deref()).unwrap_or(Decimal::ZERO),
            max_price: parse_price(self.max_price.as_deref()).unwrap_or(Decimal::MAX),
        }
    }

    /// The sort order requested.
    #[must_use]
    pub fn sort(&self) -> SortOrder {
        SortOrder::parse(self.sort.as_deref().unwrap_or_default())
    }
}

/// Parse a non-negative price bound; blank or invalid input means "unset".
fn parse_price(value: Option<&str>) -> Option<Decimal> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<Decimal>().ok())
        .filter(|d| !d.is_sign_negative())
}

/// An entry in a `<select>`.
#[derive(Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/index.html")]
pub struct CatalogIndexTemplate {
    pub chrome: PageChrome,
    pub products: Vec<ProductView>,
    pub categories: Vec<SelectOption>,
    pub sort_options: Vec<SelectOption>,
    pub search: String,
    pub min_price: String,
    pub max_price: String,
    pub result_count: usize,
    pub total_count: usize,
    pub return_to: String,
}

/// Shown until the startup catalog load finishes.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/loading.html")]
pub struct CatalogLoadingTemplate {
    pub chrome: PageChrome,
}

/// Display the filtered, sorted catalog.
#[instrument(skip(state, session, uri))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<CatalogQuery>,
) -> Result<Response> {
    let shopper = load_shopper(state.shoppers(), &session).await?;
    let chrome = PageChrome::new(&state, &shopper);

    if !state.catalog().is_loaded() {
        return Ok(CatalogLoadingTemplate { chrome }.into_response());
    }

    let criteria = query.criteria();
    let order = query.sort();

    let mut catalog = state.catalog().snapshot();
    catalog.set_filter(criteria.clone());

    let products: Vec<ProductView> = catalog
        .sorted(order)
        .into_iter()
        .map(|product| ProductView::new(product, &shopper))
        .collect();

    let categories = std::iter::once(SelectOption {
        value: ALL_CATEGORIES.to_string(),
        label: "All".to_string(),
        selected: criteria.category == CategoryFilter::All,
    })
    .chain(catalog.categories().into_iter().map(|category| SelectOption {
        value: category.to_string(),
        label: category.to_string(),
        selected: criteria.category.as_str() == category
            && criteria.category != CategoryFilter::All,
    }))
    .collect();

    let sort_options = SortOrder::ALL
        .into_iter()
        .map(|option| SelectOption {
            value: option.as_str().to_string(),
            label: option.label().to_string(),
            selected: option == order,
        })
        .collect();

    tracing::debug!(
        matched = catalog.filtered_len(),
        total = catalog.products().len(),
        sort = order.as_str(),
        "Catalog filtered"
    );

    Ok(CatalogIndexTemplate {
        chrome,
        result_count: catalog.filtered_len(),
        total_count: catalog.products().len(),
        products,
        categories,
        sort_options,
        search: criteria.search_text,
        min_price: bound_text(criteria.min_price, Decimal::ZERO),
        max_price: bound_text(criteria.max_price, Decimal::MAX),
        return_to: uri
            .path_and_query()
            .map_or_else(|| "/".to_string(), |pq| pq.as_str().to_string()),
    }
    .into_response())
}

/// Echo a price bound back into its input, blank when unrestricted.
fn bound_text(value: Decimal, unrestricted: Decimal) -> String {
    if value == unrestricted {
        String::new()
    } else {
        value.normalize().to_string()
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable until the startup catalog load finishes.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.catalog().is_loaded() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
