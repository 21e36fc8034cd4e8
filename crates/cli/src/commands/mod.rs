//! Command implementations.
//!
//! Every command receives the [`App`] built in `main`, which owns the API
//! client and both stores for the lifetime of the process.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;

use std::io::Write;
use std::sync::Arc;

use rust_decimal::Decimal;
use shopfront_client::catalog::CatalogError;
use shopfront_client::{
    ApiClient, ApiError, AuthError, CartError, CartStore, CheckoutError, ClientConfig,
    FileStorage, SessionStore, Storage, StorageError,
};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed to open local state: {0}")]
    Storage(#[from] StorageError),

    /// The requested product is not in the catalog.
    #[error("product not found: {0}")]
    ProductNotFound(String),

    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Process-wide state handed to commands.
#[derive(Debug)]
pub struct App {
    pub api: ApiClient,
    pub session: SessionStore,
    pub cart: CartStore,
}

impl App {
    /// Open the data directory and restore both stores from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the HTTP
    /// client cannot be built.
    pub fn open(config: &ClientConfig) -> Result<Self, CommandError> {
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::open(&config.data_dir)?);
        let api = ApiClient::new(config)?;

        tracing::debug!(
            api = %api.base_url(),
            data_dir = %config.data_dir.display(),
            "Opened shopfront state"
        );

        Ok(Self {
            session: SessionStore::hydrate(api.clone(), Arc::clone(&storage)),
            cart: CartStore::hydrate(storage),
            api,
        })
    }
}

/// Write one line of command output to stdout.
pub fn out(line: impl std::fmt::Display) -> Result<(), CommandError> {
    writeln!(std::io::stdout().lock(), "{line}")?;
    Ok(())
}

/// Format an amount with two decimal places.
pub fn money(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}
