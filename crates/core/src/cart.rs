//! Per-visitor cart and wishlist state.
//!
//! [`ShopperState`] is the whole mutable state of one visitor. It only
//! changes through [`ShopperState::apply`]; callers load it, apply an
//! action, and store it back.

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Product, ProductId};

/// One cart line. At most one entry exists per product ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    /// Snapshot of the product when it was first added.
    pub product: Product,
    pub quantity: NonZeroU32,
}

impl CartEntry {
    /// Line total (price × quantity).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price.times(self.quantity.get())
    }
}

/// Shopping cart keyed by product ID, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    /// Add one unit of `product`.
    ///
    /// Increments the existing entry if the product is already in the cart,
    /// otherwise appends a new entry with quantity 1. Quantities saturate at
    /// `u32::MAX`.
    pub fn add(&mut self, product: Product) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.product.id == product.id) {
            entry.quantity = entry.quantity.saturating_add(1);
            return;
        }
        self.entries.push(CartEntry {
            product,
            quantity: NonZeroU32::MIN,
        });
    }

    /// Cart lines in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    /// Quantity of a product (0 if absent).
    #[must_use]
    pub fn quantity_of(&self, id: ProductId) -> u32 {
        self.entries
            .iter()
            .find(|e| e.product.id == id)
            .map_or(0, |e| e.quantity.get())
    }

    /// Sum of all quantities, used for the cart badge.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.entries
            .iter()
            .map(|e| u64::from(e.quantity.get()))
            .sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.entries.iter().map(CartEntry::line_total).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Wishlist with set semantics, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wishlist {
    items: Vec<Product>,
}

impl Wishlist {
    /// Remove the product if present, otherwise add it.
    ///
    /// Returns `true` if the product is wishlisted afterwards.
    pub fn toggle(&mut self, product: Product) -> bool {
        if let Some(pos) = self.items.iter().position(|p| p.id == product.id) {
            self.items.remove(pos);
            false
        } else {
            self.items.push(product);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.items.iter().any(|p| p.id == id)
    }

    #[must_use]
    pub fn items(&self) -> &[Product] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// User actions that change a visitor's state.
#[derive(Debug, Clone)]
pub enum ShopperAction {
    AddToCart(Product),
    ToggleWishlist(Product),
}

/// Everything a visitor accumulates during a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopperState {
    pub cart: Cart,
    pub wishlist: Wishlist,
}

impl ShopperState {
    /// Apply an action.
    pub fn apply(&mut self, action: ShopperAction) {
        match action {
            ShopperAction::AddToCart(product) => self.cart.add(product),
            ShopperAction::ToggleWishlist(product) => {
                self.wishlist.toggle(product);
            }
        }
    }

    /// Cart badge count.
    #[must_use]
    pub fn cart_total_quantity(&self) -> u64 {
        self.cart.total_quantity()
    }

    #[must_use]
    pub fn is_wishlisted(&self, id: ProductId) -> bool {
        self.wishlist.contains(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Price;

    fn product(id: u32, price: i64) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            category: "misc".to_string(),
            price: Price::new(Decimal::new(price, 0)).unwrap(),
            description: String::new(),
            image: String::new(),
            rating: None,
        }
    }

    #[test]
    fn test_add_twice_increments_quantity() {
        let mut cart = Cart::default();
        cart.add(product(1, 20));
        cart.add(product(1, 20));

        assert_eq!(cart.entries().len(), 1);
        assert_eq!(cart.entries().first().unwrap().product.id, ProductId::new(1));
        assert_eq!(cart.quantity_of(ProductId::new(1)), 2);
    }

    #[test]
    fn test_entries_unique_and_quantities_count_calls() {
        let sequence = [1, 2, 1, 3, 3, 3, 2, 1, 4];
        let mut cart = Cart::default();
        for &id in &sequence {
            cart.add(product(id, 5));
        }

        for id in 1..=4 {
            let occurrences = cart
                .entries()
                .iter()
                .filter(|e| e.product.id == ProductId::new(id))
                .count();
            assert!(occurrences <= 1);

            let calls = sequence.iter().filter(|&&s| s == id).count();
            assert_eq!(cart.quantity_of(ProductId::new(id)), u32::try_from(calls).unwrap());
        }
        assert_eq!(cart.total_quantity(), u64::try_from(sequence.len()).unwrap());
    }

    #[test]
    fn test_entries_keep_insertion_order() {
        let mut cart = Cart::default();
        cart.add(product(3, 1));
        cart.add(product(1, 1));
        cart.add(product(3, 1));
        let ids: Vec<u32> = cart.entries().iter().map(|e| e.product.id.as_u32()).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_quantity_saturates() {
        let mut cart = Cart {
            entries: vec![CartEntry {
                product: product(1, 1),
                quantity: NonZeroU32::MAX,
            }],
        };
        cart.add(product(1, 1));
        assert_eq!(cart.quantity_of(ProductId::new(1)), u32::MAX);
    }

    #[test]
    fn test_subtotal() {
        let mut cart = Cart::default();
        assert_eq!(cart.subtotal(), Decimal::ZERO);
        cart.add(product(1, 20));
        cart.add(product(1, 20));
        cart.add(product(2, 8));
        assert_eq!(cart.subtotal(), Decimal::new(48, 0));
    }

    #[test]
    fn test_wishlist_double_toggle_restores_state() {
        let mut wishlist = Wishlist::default();
        wishlist.toggle(product(7, 1));
        let before = wishlist.clone();

        for id in [7, 8] {
            wishlist.toggle(product(id, 1));
            wishlist.toggle(product(id, 1));
            assert_eq!(wishlist, before);
        }
    }

    #[test]
    fn test_wishlist_toggle_reports_membership() {
        let mut wishlist = Wishlist::default();
        assert!(wishlist.toggle(product(1, 1)));
        assert!(wishlist.contains(ProductId::new(1)));
        assert_eq!(wishlist.len(), 1);
        assert!(!wishlist.toggle(product(1, 1)));
        assert!(!wishlist.contains(ProductId::new(1)));
        assert!(wishlist.is_empty());
    }

    #[test]
    fn test_shopper_state_apply() {
        let mut state = ShopperState::default();
        state.apply(ShopperAction::AddToCart(product(1, 10)));
        state.apply(ShopperAction::AddToCart(product(1, 10)));
        state.apply(ShopperAction::ToggleWishlist(product(2, 3)));

        assert_eq!(state.cart_total_quantity(), 2);
        assert!(state.is_wishlisted(ProductId::new(2)));
        assert!(!state.is_wishlisted(ProductId::new(1)));
    }

    #[test]
    fn test_shopper_state_survives_session_serialization() {
        let mut state = ShopperState::default();
        state.apply(ShopperAction::AddToCart(product(1, 10)));
        state.apply(ShopperAction::ToggleWishlist(product(2, 3)));

        let json = serde_json::to_value(&state).unwrap();
        let restored: ShopperState = serde_json::from_value(json).unwrap();
        assert_eq!(restored, state);
    }
}
