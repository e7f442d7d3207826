//! EliteStore Core - Shared domain types and state transitions.
//!
//! This crate provides the storefront's domain model:
//! - [`types`] - Newtype wrappers for product IDs, prices, and checkout amounts
//! - [`catalog`] - Filter criteria, sort orders, and the filtered catalog view
//! - [`cart`] - Per-visitor cart and wishlist state
//! - [`checkout`] - The hosted checkout state machine
//!
//! # Architecture
//!
//! The core crate contains only types and pure transition functions - no I/O,
//! no HTTP clients, no sessions. The storefront binary owns all side effects
//! and feeds their outcomes back into the transitions defined here.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod types;

pub use cart::{Cart, CartEntry, ShopperAction, ShopperState, Wishlist};
pub use catalog::{ALL_CATEGORIES, Catalog, CategoryFilter, FilterCriteria, SortOrder};
pub use checkout::{CheckoutError, CheckoutFailure, CheckoutFlow, CheckoutSessionId, CheckoutState};
pub use types::*;
