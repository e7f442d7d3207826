//! Catalog product types.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A product as served by the external catalog.
///
/// Products are immutable once fetched. Unknown fields in the upstream JSON
/// are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub category: String,
    pub price: Price,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub rating: Option<Rating>,
}

/// Aggregate customer rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    /// Average rating on a 0-5 scale.
    pub rate: f64,
    /// Number of ratings.
    pub count: u32,
}

impl Rating {
    /// Number of whole stars to fill, clamped to 0-5.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to 0..=5 first
    pub fn filled_stars(&self) -> usize {
        if !self.rate.is_finite() {
            return 0;
        }
        self.rate.floor().clamp(0.0, 5.0) as usize
    }
}

impl Product {
    /// Case-insensitive substring match against the title.
    ///
    /// `needle` must already be lowercase.
    #[must_use]
    pub fn title_contains(&self, needle: &str) -> bool {
        needle.is_empty() || self.title.to_lowercase().contains(needle)
    }

    /// Ordering key for the "customer rating" sort (missing ratings sort last).
    #[must_use]
    pub fn rating_rate(&self) -> f64 {
        self.rating.map_or(f64::NEG_INFINITY, |r| r.rate)
    }

    /// Ordering key for the "popularity" sort.
    #[must_use]
    pub fn rating_count(&self) -> u32 {
        self.rating.map_or(0, |r| r.count)
    }
}
