//! Catalog filtering and sorting.
//!
//! The filtered view is a pure function of the full product set and a
//! [`FilterCriteria`]. It is recomputed by a linear scan whenever the
//! criteria change; there is no index. Catalogs are expected to hold tens
//! of products.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Product, ProductId};

/// Category selector value meaning "no category restriction".
pub const ALL_CATEGORIES: &str = "all";

/// Category restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// Parse a category selector value. Empty and `"all"` mean no restriction.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == ALL_CATEGORIES {
            Self::All
        } else {
            Self::Only(s.to_string())
        }
    }

    /// Value used in query strings and form controls.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_CATEGORIES,
            Self::Only(category) => category,
        }
    }

    /// Whether a product category passes this filter (exact match).
    #[must_use]
    pub fn matches(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == category,
        }
    }
}

/// The combined search, category, and price constraints.
///
/// Criteria are always replaced as a whole; there is no partial update.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub search_text: String,
    pub category: CategoryFilter,
    pub min_price: Decimal,
    pub max_price: Decimal,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            category: CategoryFilter::All,
            min_price: Decimal::ZERO,
            max_price: Decimal::MAX,
        }
    }
}

impl FilterCriteria {
    /// Whether `product` satisfies all three predicates.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.matches_with_needle(product, &self.search_text.to_lowercase())
    }

    fn matches_with_needle(&self, product: &Product, needle: &str) -> bool {
        let price = product.price.amount();
        product.title_contains(needle)
            && self.category.matches(&product.category)
            && price >= self.min_price
            && price <= self.max_price
    }

    /// Whether these criteria impose no restriction at all.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.search_text.is_empty()
            && self.category == CategoryFilter::All
            && self.min_price <= Decimal::ZERO
            && self.max_price == Decimal::MAX
    }
}

/// Indices of the products matching `criteria`, in source order.
#[must_use]
pub fn filter_indices(products: &[Product], criteria: &FilterCriteria) -> Vec<usize> {
    let needle = criteria.search_text.to_lowercase();
    products
        .iter()
        .enumerate()
        .filter(|(_, product)| criteria.matches_with_needle(product, &needle))
        .map(|(index, _)| index)
        .collect()
}

/// Distinct categories in first-seen order.
#[must_use]
pub fn categories(products: &[Product]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for product in products {
        if !seen.contains(&product.category.as_str()) {
            seen.push(&product.category);
        }
    }
    seen
}

/// Sort order for the catalog listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    /// Catalog source order.
    #[default]
    Featured,
    PriceLowToHigh,
    PriceHighToLow,
    /// Highest average rating first.
    Rating,
    /// Most ratings first.
    Popularity,
}

impl SortOrder {
    /// All sort orders, in selector order.
    pub const ALL: [Self; 5] = [
        Self::Featured,
        Self::Popularity,
        Self::PriceLowToHigh,
        Self::PriceHighToLow,
        Self::Rating,
    ];

    /// Parse a sort selector value, falling back to `Featured`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "popularity" => Self::Popularity,
            "price-asc" => Self::PriceLowToHigh,
            "price-desc" => Self::PriceHighToLow,
            "rating" => Self::Rating,
            _ => Self::Featured,
        }
    }

    /// Value used in query strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::Popularity => "popularity",
            Self::PriceLowToHigh => "price-asc",
            Self::PriceHighToLow => "price-desc",
            Self::Rating => "rating",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Featured => "Featured",
            Self::Popularity => "Popularity",
            Self::PriceLowToHigh => "Price: Low to High",
            Self::PriceHighToLow => "Price: High to Low",
            Self::Rating => "Customer Rating",
        }
    }

    /// Stable sort of matching products; ties keep source order.
    pub fn apply(self, products: &mut [&Product]) {
        match self {
            Self::Featured => {}
            Self::PriceLowToHigh => products.sort_by_key(|p| p.price),
            Self::PriceHighToLow => products.sort_by(|a, b| b.price.cmp(&a.price)),
            Self::Rating => products.sort_by(|a, b| b.rating_rate().total_cmp(&a.rating_rate())),
            Self::Popularity => products.sort_by(|a, b| b.rating_count().cmp(&a.rating_count())),
        }
    }
}

/// A catalog with its current filter applied.
///
/// Holds a shared, immutable product set plus the derived view. Cloning is
/// cheap; the product set is reference-counted.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Arc<[Product]>,
    criteria: FilterCriteria,
    visible: Vec<usize>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(Arc::from(Vec::new()))
    }
}

impl Catalog {
    /// Create a catalog view over `products` with default criteria.
    #[must_use]
    pub fn new(products: Arc<[Product]>) -> Self {
        let visible = (0..products.len()).collect();
        Self {
            products,
            criteria: FilterCriteria::default(),
            visible,
        }
    }

    /// Replace the full product set, keeping the current criteria.
    pub fn replace_products(&mut self, products: Arc<[Product]>) {
        self.products = products;
        self.recompute();
    }

    /// Replace the filter criteria and recompute the view.
    ///
    /// Identical criteria leave the view untouched.
    pub fn set_filter(&mut self, criteria: FilterCriteria) {
        if criteria == self.criteria {
            return;
        }
        self.criteria = criteria;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.visible = filter_indices(&self.products, &self.criteria);
    }

    /// The active criteria.
    #[must_use]
    pub const fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// The full product set.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Products matching the criteria, in source order.
    pub fn filtered(&self) -> impl Iterator<Item = &Product> {
        self.visible
            .iter()
            .filter_map(|&index| self.products.get(index))
    }

    /// Matching products in the requested order.
    #[must_use]
    pub fn sorted(&self, order: SortOrder) -> Vec<&Product> {
        let mut view: Vec<&Product> = self.filtered().collect();
        order.apply(&mut view);
        view
    }

    /// Number of matching products.
    #[must_use]
    pub fn filtered_len(&self) -> usize {
        self.visible.len()
    }

    /// Distinct categories of the full set, in first-seen order.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        categories(&self.products)
    }

    /// Look up a product by ID.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Price, Rating};

    fn product(id: u32, title: &str, category: &str, price: i64) -> Product {
        Product {
            id: ProductId::new(id),
            title: title.to_string(),
            category: category.to_string(),
            price: Price::new(Decimal::new(price, 0)).unwrap(),
            description: String::new(),
            image: String::new(),
            rating: None,
        }
    }

    fn rated(mut p: Product, rate: f64, count: u32) -> Product {
        p.rating = Some(Rating { rate, count });
        p
    }

    fn sample() -> Arc<[Product]> {
        Arc::from(vec![
            rated(product(1, "Slim Fit Shirt", "men's clothing", 20), 4.1, 259),
            rated(product(2, "Coffee Mug", "home", 8), 4.7, 40),
            rated(product(3, "Gold Ring", "jewelery", 168), 3.9, 70),
            product(4, "Rain Jacket", "women's clothing", 40),
            rated(product(5, "Cotton T-Shirt", "men's clothing", 15), 2.1, 430),
        ])
    }

    fn ids<'a>(products: impl IntoIterator<Item = &'a Product>) -> Vec<u32> {
        products.into_iter().map(|p| p.id.as_u32()).collect()
    }

    fn all_criteria() -> Vec<FilterCriteria> {
        let mut out = Vec::new();
        for search in ["", "shirt", "SHIRT", "mug", "zzz"] {
            for category in ["all", "men's clothing", "home", "toys"] {
                for (min, max) in [(0, i64::from(u32::MAX)), (10, 40), (0, 8), (50, 10)] {
                    out.push(FilterCriteria {
                        search_text: search.to_string(),
                        category: CategoryFilter::parse(category),
                        min_price: Decimal::new(min, 0),
                        max_price: Decimal::new(max, 0),
                    });
                }
            }
        }
        out
    }

    #[test]
    fn test_default_criteria_yield_full_set() {
        let catalog = Catalog::new(sample());
        assert!(catalog.criteria().is_unrestricted());
        assert_eq!(ids(catalog.filtered()), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_filtered_is_subset_and_satisfies_predicates() {
        let products = sample();
        for criteria in all_criteria() {
            let mut catalog = Catalog::new(Arc::clone(&products));
            catalog.set_filter(criteria.clone());
            let needle = criteria.search_text.to_lowercase();
            for p in catalog.filtered() {
                assert!(products.contains(p));
                assert!(p.title.to_lowercase().contains(&needle));
                assert!(criteria.category.matches(&p.category));
                assert!(p.price.amount() >= criteria.min_price);
                assert!(p.price.amount() <= criteria.max_price);
            }
            // Nothing matching was dropped
            let expected = products.iter().filter(|p| criteria.matches(p)).count();
            assert_eq!(catalog.filtered_len(), expected);
        }
    }

    #[test]
    fn test_filtered_preserves_source_order() {
        let mut catalog = Catalog::new(sample());
        catalog.set_filter(FilterCriteria {
            search_text: "shirt".to_string(),
            ..FilterCriteria::default()
        });
        assert_eq!(ids(catalog.filtered()), vec![1, 5]);
    }

    #[test]
    fn test_set_filter_is_idempotent() {
        let criteria = FilterCriteria {
            search_text: "i".to_string(),
            category: CategoryFilter::Only("men's clothing".to_string()),
            min_price: Decimal::new(16, 0),
            max_price: Decimal::new(100, 0),
        };

        let mut once = Catalog::new(sample());
        once.set_filter(criteria.clone());

        let mut twice = Catalog::new(sample());
        twice.set_filter(criteria.clone());
        twice.set_filter(criteria);

        assert_eq!(ids(once.filtered()), ids(twice.filtered()));
        assert_eq!(ids(once.filtered()), vec![1]);
    }

    #[test]
    fn test_category_scenario() {
        let products: Vec<Product> = serde_json::from_str(
            r#"[{"id":1,"title":"Shirt","category":"men","price":20},
                {"id":2,"title":"Mug","category":"home","price":8}]"#,
        )
        .unwrap();
        let mut catalog = Catalog::new(Arc::from(products));
        catalog.set_filter(FilterCriteria {
            category: CategoryFilter::parse("home"),
            ..FilterCriteria::default()
        });
        assert_eq!(ids(catalog.filtered()), vec![2]);
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let mut catalog = Catalog::new(sample());
        catalog.set_filter(FilterCriteria {
            min_price: Decimal::new(8, 0),
            max_price: Decimal::new(20, 0),
            ..FilterCriteria::default()
        });
        assert_eq!(ids(catalog.filtered()), vec![1, 2, 5]);
    }

    #[test]
    fn test_inverted_price_range_is_empty() {
        let mut catalog = Catalog::new(sample());
        catalog.set_filter(FilterCriteria {
            min_price: Decimal::new(50, 0),
            max_price: Decimal::new(10, 0),
            ..FilterCriteria::default()
        });
        assert_eq!(catalog.filtered().count(), 0);
    }

    #[test]
    fn test_replace_products_keeps_criteria() {
        let mut catalog = Catalog::default();
        catalog.set_filter(FilterCriteria {
            category: CategoryFilter::parse("home"),
            ..FilterCriteria::default()
        });
        assert_eq!(catalog.filtered().count(), 0);

        catalog.replace_products(sample());
        assert_eq!(ids(catalog.filtered()), vec![2]);
    }

    #[test]
    fn test_categories_first_seen_order() {
        let catalog = Catalog::new(sample());
        assert_eq!(
            catalog.categories(),
            vec!["men's clothing", "home", "jewelery", "women's clothing"]
        );
        assert!(Catalog::default().categories().is_empty());
    }

    #[test]
    fn test_category_filter_parse() {
        assert_eq!(CategoryFilter::parse(""), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse("all"), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::parse(" home "),
            CategoryFilter::Only("home".to_string())
        );
        assert_eq!(CategoryFilter::Only("home".to_string()).as_str(), "home");
        assert_eq!(CategoryFilter::All.as_str(), "all");
    }

    #[test]
    fn test_sort_orders() {
        let catalog = Catalog::new(sample());
        assert_eq!(ids(catalog.sorted(SortOrder::Featured)), vec![1, 2, 3, 4, 5]);
        assert_eq!(
            ids(catalog.sorted(SortOrder::PriceLowToHigh)),
            vec![2, 5, 1, 4, 3]
        );
        assert_eq!(
            ids(catalog.sorted(SortOrder::PriceHighToLow)),
            vec![3, 4, 1, 5, 2]
        );
        // Unrated products sort last
        assert_eq!(ids(catalog.sorted(SortOrder::Rating)), vec![2, 1, 3, 5, 4]);
        assert_eq!(
            ids(catalog.sorted(SortOrder::Popularity)),
            vec![5, 1, 3, 2, 4]
        );
    }

    #[test]
    fn test_sort_order_parse_roundtrip() {
        for order in SortOrder::ALL {
            assert_eq!(SortOrder::parse(order.as_str()), order);
        }
        assert_eq!(SortOrder::parse("bogus"), SortOrder::Featured);
    }

    #[test]
    fn test_get() {
        let catalog = Catalog::new(sample());
        assert_eq!(catalog.get(ProductId::new(3)).unwrap().title, "Gold Ring");
        assert!(catalog.get(ProductId::new(99)).is_none());
    }
}
