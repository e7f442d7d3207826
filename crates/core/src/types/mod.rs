//! Core types for EliteStore.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod amount;
pub mod id;
pub mod price;
pub mod product;

pub use amount::{AmountError, CheckoutAmount};
pub use id::*;
pub use price::Price;
pub use product::{Product, Rating};
