//! StyleAura CLI - command-line storefront client.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the session is persisted under STOREFRONT_SESSION_DIR)
//! sa-cli login -e shopper@styleaura.in -p secret
//!
//! # Browse the catalog
//! sa-cli products --search kurta --brand Biba --max-price 2500 --min-rating 4
//! sa-cli product 12 --all-reviews
//!
//! # Manage the cart
//! sa-cli cart add 12 --quantity 2
//! sa-cli cart dec 12
//! sa-cli cart list
//!
//! # Admin views (admin sessions only)
//! sa-cli admin users
//! ```
//!
//! # Commands
//!
//! - `login`, `register`, `google-login`, `logout`, `whoami` - Session
//! - `products`, `product` - Catalog and product detail
//! - `cart` - Cart operations
//! - `admin` - Admin listings and product management

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use styleaura_core::{CategoryId, ProductId};
use styleaura_storefront::AppState;
use styleaura_storefront::config::StorefrontConfig;

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "sa-cli")]
#[command(author, version, about = "StyleAura storefront client")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        /// Page to return to after signing in (e.g. `/checkout`)
        #[arg(long)]
        redirect: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        confirm_password: String,
    },
    /// Sign in with a Google ID token
    GoogleLogin {
        #[arg(long)]
        id_token: String,

        #[arg(long)]
        redirect: Option<String>,
    },
    /// Sign out and forget the persisted session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List products
    Products {
        /// Search query
        #[arg(short, long)]
        search: Option<String>,

        /// Only this brand
        #[arg(short, long)]
        brand: Option<String>,

        #[arg(long)]
        min_price: Option<Decimal>,

        #[arg(long)]
        max_price: Option<Decimal>,

        /// Minimum average rating (0 shows unrated products too)
        #[arg(long, default_value_t = 0.0)]
        min_rating: f64,
    },
    /// Show one product with its reviews
    Product {
        id: ProductId,

        /// Show every review instead of the first few
        #[arg(long)]
        all_reviews: bool,
    },
    /// Cart operations
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Admin operations
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    List,
    /// Add a product
    Add {
        id: ProductId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product
    Remove { id: ProductId },
    /// Increase a line's quantity by one
    Inc { id: ProductId },
    /// Decrease a line's quantity by one (never below 1)
    Dec { id: ProductId },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List users
    Users,
    /// List products
    Products,
    /// Create a product
    AddProduct {
        #[arg(short, long)]
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(short, long)]
        price: Decimal,

        #[arg(long, default_value = "")]
        image_url: String,

        #[arg(long, default_value_t = 0)]
        stock: i64,

        #[arg(long)]
        category: CategoryId,
    },
    /// Delete a product
    DeleteProduct { id: ProductId },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Tracing is not up yet
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Failed to load configuration: {e}");
            }
            return ExitCode::from(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let sentry_guard = init_sentry(&config);

    // Logs go to stderr so command output stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "styleaura_storefront=warn,styleaura_cli=info".into());

    let json_layer = cli.log_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!cli.log_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let code = match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    };
    // Flushes queued Sentry events before the process exits
    drop(sentry_guard);
    code
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), CliError> {
    let state = AppState::new(config)?;

    match cli.command {
        Commands::Login {
            email,
            password,
            redirect,
        } => commands::auth::login(&state, &email, &password, redirect.as_deref()).await?,
        Commands::Register {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
        } => {
            let form = styleaura_storefront::services::Registration {
                first_name,
                last_name,
                email,
                password,
                confirm_password,
            };
            commands::auth::register(&state, &form).await?;
        }
        Commands::GoogleLogin { id_token, redirect } => {
            commands::auth::google_login(&state, &id_token, redirect.as_deref()).await?;
        }
        Commands::Logout => commands::auth::logout(&state),
        Commands::Whoami => commands::auth::whoami(&state),
        Commands::Products {
            search,
            brand,
            min_price,
            max_price,
            min_rating,
        } => {
            let filters = commands::catalog::ProductFilters {
                search,
                brand,
                min_price,
                max_price,
                min_rating,
            };
            commands::catalog::products(&state, filters).await?;
        }
        Commands::Product { id, all_reviews } => {
            commands::catalog::product(&state, id, all_reviews).await?;
        }
        Commands::Cart { action } => match action {
            CartAction::List => commands::cart::list(&state).await?,
            CartAction::Add { id, quantity } => commands::cart::add(&state, id, quantity).await?,
            CartAction::Remove { id } => commands::cart::remove(&state, id).await?,
            CartAction::Inc { id } => commands::cart::adjust(&state, id, 1).await?,
            CartAction::Dec { id } => commands::cart::adjust(&state, id, -1).await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::Users => commands::admin::users(&state).await?,
            AdminAction::Products => commands::admin::products(&state).await?,
            AdminAction::AddProduct {
                name,
                description,
                price,
                image_url,
                stock,
                category,
            } => {
                let product = styleaura_storefront::models::NewProduct {
                    name,
                    description,
                    price,
                    image_url,
                    stock_quantity: stock,
                    category_id: category,
                };
                commands::admin::add_product(&state, &product).await?;
            }
            AdminAction::DeleteProduct { id } => commands::admin::delete_product(&state, id).await?,
        },
    }
    Ok(())
}
