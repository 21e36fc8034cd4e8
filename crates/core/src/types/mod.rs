//! Core types for Shopfront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod id;
pub mod role;

pub use cart::{CartItem, CartItemError};
pub use email::{Email, EmailError};
pub use id::*;
pub use role::Role;
