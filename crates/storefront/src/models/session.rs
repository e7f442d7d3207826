//! Session-backed visitor identity.
//!
//! The session only stores the visitor's ID. Cart and wishlist state lives
//! in the [`ShopperStore`] under that ID.

use elitestore_core::{ShopperAction, ShopperState};
use tower_sessions::Session;
use uuid::Uuid;

use super::ShopperStore;

/// Session key for the visitor's stable ID.
const VISITOR_ID_KEY: &str = "visitor_id";

/// Load the visitor's cart and wishlist (empty for new visitors).
///
/// Does not assign an ID, so browsing alone never creates a session.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_shopper(
    shoppers: &ShopperStore,
    session: &Session,
) -> Result<ShopperState, tower_sessions::session::Error> {
    Ok(session
        .get::<Uuid>(VISITOR_ID_KEY)
        .await?
        .map(|visitor| shoppers.get(visitor))
        .unwrap_or_default())
}

/// Apply `action` to the visitor's state and return the result.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn apply_action(
    shoppers: &ShopperStore,
    session: &Session,
    action: ShopperAction,
) -> Result<ShopperState, tower_sessions::session::Error> {
    let visitor = visitor_id(session).await?;
    Ok(shoppers.apply(visitor, action))
}

/// The visitor's ID, assigned on first use.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn visitor_id(session: &Session) -> Result<Uuid, tower_sessions::session::Error> {
    if let Some(id) = session.get::<Uuid>(VISITOR_ID_KEY).await? {
        return Ok(id);
    }
    let id = Uuid::new_v4();
    session.insert(VISITOR_ID_KEY, id).await?;
    Ok(id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use elitestore_core::{Price, Product, ProductId};
    use rust_decimal::Decimal;
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

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

    #[tokio::test]
    async fn test_new_visitor_has_empty_state() {
        let session = session();
        let shoppers = ShopperStore::default();

        assert_eq!(
            load_shopper(&shoppers, &session).await.unwrap(),
            ShopperState::default()
        );
        assert!(session.get::<Uuid>(VISITOR_ID_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_actions_follow_the_visitor() {
        let session = session();
        let shoppers = ShopperStore::default();

        apply_action(&shoppers, &session, ShopperAction::AddToCart(product(1)))
            .await
            .unwrap();
        apply_action(&shoppers, &session, ShopperAction::AddToCart(product(1)))
            .await
            .unwrap();
        apply_action(&shoppers, &session, ShopperAction::ToggleWishlist(product(2)))
            .await
            .unwrap();

        let shopper = load_shopper(&shoppers, &session).await.unwrap();
        assert_eq!(shopper.cart_total_quantity(), 2);
        assert_eq!(shopper.cart.entries().len(), 1);
        assert!(shopper.is_wishlisted(ProductId::new(2)));

        let visitor = visitor_id(&session).await.unwrap();
        assert_eq!(shoppers.get(visitor), shopper);
        assert_eq!(
            load_shopper(&shoppers, &self::session()).await.unwrap(),
            ShopperState::default()
        );
    }

    #[tokio::test]
    async fn test_visitor_id_is_stable() {
        let session = session();
        let first = visitor_id(&session).await.unwrap();
        assert_eq!(visitor_id(&session).await.unwrap(), first);
        assert_ne!(visitor_id(&self::session()).await.unwrap(), first);
    }
}
