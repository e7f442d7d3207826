//! Cart and wishlist state, keyed by visitor.
//!
//! The session cookie only carries the visitor ID. Each change runs
//! load, apply and store under one lock, so concurrent requests from the
//! same visitor never overwrite each other's updates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use elitestore_core::{ShopperAction, ShopperState};
use uuid::Uuid;

use crate::middleware::session::SESSION_EXPIRY;

#[derive(Debug)]
struct Shopper {
    state: ShopperState,
    touched: Instant,
}

/// In-memory shopper state for every visitor.
///
/// Entries idle for longer than the session expiry are dropped by
/// [`ShopperStore::prune_idle`], since their cookie can no longer reach them.
#[derive(Debug, Clone)]
pub struct ShopperStore {
    shoppers: Arc<Mutex<HashMap<Uuid, Shopper>>>,
    idle_ttl: Duration,
}

impl Default for ShopperStore {
    fn default() -> Self {
        Self::new(SESSION_EXPIRY)
    }
}

impl ShopperStore {
    #[must_use]
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            shoppers: Arc::new(Mutex::new(HashMap::new())),
            idle_ttl,
        }
    }

    /// The visitor's current state (empty for unknown visitors).
    #[must_use]
    pub fn get(&self, visitor: Uuid) -> ShopperState {
        self.lock()
            .get_mut(&visitor)
            .map(|shopper| {
                shopper.touched = Instant::now();
                shopper.state.clone()
            })
            .unwrap_or_default()
    }

    /// Apply `action` atomically and return the resulting state.
    pub fn apply(&self, visitor: Uuid, action: ShopperAction) -> ShopperState {
        let mut shoppers = self.lock();
        let shopper = shoppers.entry(visitor).or_insert_with(|| Shopper {
            state: ShopperState::default(),
            touched: Instant::now(),
        });
        shopper.state.apply(action);
        shopper.touched = Instant::now();
        shopper.state.clone()
    }

    /// Drop visitors idle for longer than the TTL, returning how many.
    pub fn prune_idle(&self) -> usize {
        let ttl = self.idle_ttl;
        let mut shoppers = self.lock();
        let before = shoppers.len();
        shoppers.retain(|_, shopper| shopper.touched.elapsed() < ttl);
        before - shoppers.len()
    }

    /// Number of visitors with stored state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Shopper>> {
        self.shoppers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use elitestore_core::{Price, Product, ProductId};
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: u32) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            category: "misc".to_string(),
            price: Price::new(Decimal::TEN).unwrap(),
            description: String::new(),
            image: String::new(),
            rating: None,
        }
    }

    #[test]
    fn test_unknown_visitor_is_empty() {
        let store = ShopperStore::default();
        assert_eq!(store.get(Uuid::new_v4()), ShopperState::default());
        assert!(store.is_empty());
    }

    #[test]
    fn test_visitors_are_isolated() {
        let store = ShopperStore::default();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.apply(alice, ShopperAction::AddToCart(product(1)));
        store.apply(bob, ShopperAction::ToggleWishlist(product(2)));

        assert_eq!(store.get(alice).cart_total_quantity(), 1);
        assert!(!store.get(alice).is_wishlisted(ProductId::new(2)));
        assert_eq!(store.get(bob).cart_total_quantity(), 0);
        assert!(store.get(bob).is_wishlisted(ProductId::new(2)));
    }

    #[test]
    fn test_concurrent_adds_are_all_counted() {
        let store = ShopperStore::default();
        let visitor = Uuid::new_v4();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        store.apply(visitor, ShopperAction::AddToCart(product(1)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let shopper = store.get(visitor);
        assert_eq!(shopper.cart_total_quantity(), 400);
        assert_eq!(shopper.cart.entries().len(), 1);
    }

    #[test]
    fn test_prune_idle_drops_stale_visitors() {
        let store = ShopperStore::new(Duration::from_millis(200));
        let stale = Uuid::new_v4();
        store.apply(stale, ShopperAction::AddToCart(product(1)));

        std::thread::sleep(Duration::from_millis(300));
        let fresh = Uuid::new_v4();
        store.apply(fresh, ShopperAction::AddToCart(product(1)));

        assert_eq!(store.prune_idle(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(stale), ShopperState::default());
        assert_eq!(store.get(fresh).cart_total_quantity(), 1);
    }
}
