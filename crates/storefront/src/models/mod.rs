//! Domain models for storefront.

pub mod session;
pub mod shoppers;

pub use session::{apply_action, load_shopper, visitor_id};
pub use shoppers::ShopperStore;
