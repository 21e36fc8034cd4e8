//! Shopfront client library.
//!
//! Client-side state for a storefront whose business logic lives in a remote
//! HTTP backend:
//!
//! - [`session`] - logged-in user and bearer token, persisted across runs
//! - [`cart`] - cart line items, written through to storage on every change
//! - [`checkout`] - turns the cart into an order
//! - [`catalog`], [`orders`], [`reports`] - typed wrappers for the remaining
//!   backend endpoints
//!
//! [`api::ApiClient`] is the single HTTP entry point and [`storage::Storage`]
//! the single persistence seam. Both stores are plain values owned by the
//! caller; nothing here is global.

#![cfg_attr(not(test), forbid(unsafe_code))]

mod amount;
pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod orders;
pub mod reports;
pub mod session;
pub mod storage;

pub use api::{ApiClient, ApiError, Method};
pub use cart::{CartError, CartStore};
pub use checkout::{CheckoutError, checkout};
pub use config::{ClientConfig, ConfigError};
pub use session::{AuthError, Session, SessionState, SessionStore, User};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
