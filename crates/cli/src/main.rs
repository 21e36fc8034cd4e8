//! Shopfront CLI - storefront and admin tools against the Shopfront backend.
//!
//! # Usage
//!
//! ```bash
//! # Create an account and log in
//! shopfront register -n "Asha" -e asha@example.com -p secret
//! shopfront login -e asha@example.com -p secret
//!
//! # Browse and shop
//! shopfront products --sort asc --search mug
//! shopfront cart add 665f1c --quantity 2
//! shopfront cart show
//! shopfront checkout
//! shopfront orders --date 2024-06-01
//!
//! # Admin
//! shopfront admin products create --sku P001 --name Widget --price 9.99 --category Tools
//! shopfront admin dashboard
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPFRONT_API_BASE_URL` - Backend base URL (overridden by `--api-url`)
//! - `SHOPFRONT_DATA_DIR` - Where the session and cart are kept (overridden by
//!   `--data-dir`)
//! - `SHOPFRONT_LOG_FORMAT` - Set to `json` for JSON log lines
//! - `RUST_LOG` - Log filter (default `shopfront=info,shopfront_client=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use secrecy::SecretString;
use shopfront_client::{ClientConfig, ConfigError};
use shopfront_client::config::{DEFAULT_API_BASE_URL, default_data_dir};
use shopfront_client::catalog::SortOrder;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::App;

#[derive(Parser)]
#[command(name = "shopfront")]
#[command(author, version, about = "Shopfront storefront CLI")]
struct Cli {
    /// Backend base URL, including any path prefix such as `/api`
    #[arg(
        long,
        global = true,
        env = "SHOPFRONT_API_BASE_URL",
        default_value = DEFAULT_API_BASE_URL
    )]
    api_url: String,

    /// Directory holding the saved session and cart
    #[arg(long, global = true, env = "SHOPFRONT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a customer account
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long, env = "SHOPFRONT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in and remember the session
    Login {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long, env = "SHOPFRONT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the saved session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List products
    Products {
        /// Listing order (`asc` or `desc`)
        #[arg(long)]
        sort: Option<SortOrder>,

        /// Only products whose name or SKU contains this text
        #[arg(long)]
        search: Option<String>,

        /// Only products in this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Order everything in the cart
    Checkout,
    /// List past orders
    Orders {
        /// Only orders placed on this day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Admin tools
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents and total
    Show,
    /// Add a catalog product to the cart
    Add {
        /// Product ID
        product_id: String,

        /// How many to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        product_id: String,
    },
    /// Set a product's quantity (0 or less removes it)
    Update {
        /// Product ID
        product_id: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Manage catalog products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Show the sales dashboard
    Dashboard,
}

#[derive(Subcommand)]
enum ProductAction {
    /// Create a product
    Create {
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Replace a product's fields
    Update {
        /// Product ID
        id: String,

        #[command(flatten)]
        fields: ProductFields,
    },
    /// Delete a product
    Delete {
        /// Product ID
        id: String,
    },
}

#[derive(clap::Args)]
struct ProductFields {
    /// Stock keeping unit
    #[arg(long)]
    sku: String,

    /// Product name
    #[arg(long)]
    name: String,

    /// Unit price
    #[arg(long)]
    price: Decimal,

    /// Category
    #[arg(long)]
    category: String,
}

#[tokio::main]
async fn main() {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Install the global subscriber. `SHOPFRONT_LOG_FORMAT=json` switches to
/// JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("shopfront=info,shopfront_client=info"));

    let json = std::env::var("SHOPFRONT_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Client configuration from flags, falling back to the environment.
fn load_config(cli: &Cli) -> Result<ClientConfig, ConfigError> {
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    ClientConfig::new(&cli.api_url, data_dir)
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&cli)?;
    let mut app = App::open(&config)?;

    match cli.command {
        Commands::Register {
            name,
            email,
            password,
        } => {
            commands::auth::register(&app, &name, &email, &SecretString::from(password)).await?;
        }
        Commands::Login { email, password } => {
            commands::auth::login(&mut app, &email, &SecretString::from(password)).await?;
        }
        Commands::Logout => commands::auth::logout(&mut app)?,
        Commands::Whoami => commands::auth::whoami(&app)?,
        Commands::Products {
            sort,
            search,
            category,
        } => {
            commands::products::list(&app, sort, search.as_deref(), category.as_deref()).await?;
        }
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&app)?,
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(&mut app, &product_id, quantity).await?,
            CartAction::Remove { product_id } => commands::cart::remove(&mut app, &product_id)?,
            CartAction::Update {
                product_id,
                quantity,
            } => commands::cart::update(&mut app, &product_id, quantity)?,
            CartAction::Clear => commands::cart::clear(&mut app)?,
        },
        Commands::Checkout => commands::cart::checkout(&mut app).await?,
        Commands::Orders { date } => commands::orders::list(&app, date).await?,
        Commands::Admin { action } => match action {
            AdminAction::Products { action } => match action {
                ProductAction::Create { fields } => {
                    commands::admin::create_product(&app, &fields.into_input()?).await?;
                }
                ProductAction::Update { id, fields } => {
                    commands::admin::update_product(&app, &id, &fields.into_input()?).await?;
                }
                ProductAction::Delete { id } => commands::admin::delete_product(&app, &id).await?,
            },
            AdminAction::Dashboard => commands::admin::dashboard(&app).await?,
        },
    }
    Ok(())
}

impl ProductFields {
    fn into_input(self) -> Result<shopfront_client::catalog::ProductInput, commands::CommandError> {
        Ok(shopfront_client::catalog::ProductInput::new(
            &self.sku,
            &self.name,
            self.price,
            &self.category,
        )?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_build_config() {
        let cli = Cli::try_parse_from([
            "shopfront",
            "--api-url",
            "http://127.0.0.1:4000/api",
            "--data-dir",
            "/tmp/shopfront-cli",
            "whoami",
        ])
        .unwrap();

        let config = load_config(&cli).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://127.0.0.1:4000/api");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/shopfront-cli"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["shopfront", "logout", "--api-url", "http://localhost/api"])
            .unwrap();
        assert_eq!(cli.api_url, "http://localhost/api");
    }

    #[test]
    fn test_invalid_api_url_is_config_error() {
        let cli = Cli::try_parse_from(["shopfront", "--api-url", "ftp://example.com", "whoami"])
            .unwrap();
        assert!(matches!(
            load_config(&cli),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }
}
