//! JustMart CLI - browse the marketplace and manage a cart from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse listings
//! jm products list
//! jm products show 64f1c2
//!
//! # Manage the signed-in user's cart and wishlist
//! jm --email student@just.edu.bd cart add 64f1c2
//! jm --email student@just.edu.bd cart set 64f1c2 3
//! jm --email student@just.edu.bd wishlist toggle 64f1c2
//!
//! # Place an order for the cart
//! jm --email student@just.edu.bd checkout --address "Hall 2, Room 114"
//!
//! # Sell an item and manage your listings
//! jm --email seller@just.edu.bd listings create --title "Desk Lamp" \
//!     --description "Warm light" --price 300 --category Electronics \
//!     --location "Hall 3" --image https://img.example/lamp.jpg
//! jm --email seller@just.edu.bd listings mine
//! jm --email seller@just.edu.bd profile set --buying-contact 01711000000
//! ```
//!
//! Output is pretty-printed JSON on stdout. Logs go to stderr.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use just_mart_core::{Email, Identity};
use just_mart_storefront::config::parse_base_url;
use just_mart_storefront::{Storefront, StorefrontConfig};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliResult;

#[derive(Parser)]
#[command(name = "jm")]
#[command(author, version, about = "JustMart storefront CLI")]
struct Cli {
    /// Act as this signed-in user
    #[arg(short, long, global = true)]
    email: Option<String>,

    /// Marketplace backend base URL (overrides `JUST_MART_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Review past orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Place an order for everything in the cart
    Checkout {
        /// Delivery address for the order
        #[arg(short, long)]
        address: String,
    },
    /// Sell items and manage your own listings
    Listings {
        #[command(subcommand)]
        action: ListingsAction,
    },
    /// View or edit your profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List all listings
    List,
    /// Show one listing
    Show { id: String },
    /// List category names
    Categories,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines, item count and total
    Show,
    /// Add one unit of a product
    Add { id: String },
    /// Remove a product's line
    Remove { id: String },
    /// Set a line's quantity (0 or less removes it)
    Set {
        id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove every line
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Show saved products
    Show,
    /// Save a product
    Add { id: String },
    /// Unsave a product
    Remove { id: String },
    /// Save a product, or unsave it if already saved
    Toggle { id: String },
    /// Unsave everything
    Clear,
}

#[derive(Subcommand)]
enum ListingsAction {
    /// List the listings you are selling
    Mine,
    /// Put an item up for sale
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Price in taka
        #[arg(long)]
        price: String,
        #[arg(long)]
        category: String,
        #[arg(long, default_value = just_mart_core::types::listing::DEFAULT_CONDITION)]
        condition: String,
        /// Pickup location
        #[arg(long)]
        location: String,
        #[arg(long, default_value_t = 1)]
        stock: u32,
        /// Search tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Image URL (repeatable, at least one)
        #[arg(long = "image")]
        images: Vec<String>,
    },
    /// Take one of your listings down
    Delete { id: String },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Show your profile
    Show,
    /// Change profile fields
    Set {
        #[arg(long)]
        buying_contact: Option<String>,
        #[arg(long)]
        selling_contact: Option<String>,
        /// e.g. "Inside Campus"
        #[arg(long)]
        location_type: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List the user's orders
    List,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
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

fn init_tracing(json_logs: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "just_mart_storefront=info,just_mart_cli=info".into());

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter));

    if json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing(cli.json_logs);

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<StorefrontConfig, Box<dyn std::error::Error>> {
    let mut config = StorefrontConfig::from_env()?;
    if let Some(raw) = &cli.api_url {
        config.api_base_url = parse_base_url(raw)?;
    }
    Ok(config)
}

async fn run(cli: Cli, config: &StorefrontConfig) -> CliResult {
    let store = Storefront::connect(config)?;

    if let Some(raw) = &cli.email {
        store.sign_in(Identity::new(Email::parse(raw)?)).await;
    }

    match cli.command {
        Commands::Products { action } => match action {
            ProductsAction::List => commands::catalog::list(&store).await?,
            ProductsAction::Show { id } => commands::catalog::show(&store, &id).await?,
            ProductsAction::Categories => commands::catalog::categories(&store).await?,
        },
        Commands::Cart { action } => {
            commands::require_sign_in(&store)?;
            match action {
                CartAction::Show => commands::cart::show(&store)?,
                CartAction::Add { id } => commands::cart::add(&store, &id).await?,
                CartAction::Remove { id } => commands::cart::remove(&store, &id).await?,
                CartAction::Set { id, quantity } => {
                    commands::cart::set(&store, &id, quantity).await?;
                }
                CartAction::Clear => commands::cart::clear(&store).await?,
            }
        }
        Commands::Wishlist { action } => {
            commands::require_sign_in(&store)?;
            match action {
                WishlistAction::Show => commands::wishlist::show(&store)?,
                WishlistAction::Add { id } => commands::wishlist::add(&store, &id).await?,
                WishlistAction::Remove { id } => commands::wishlist::remove(&store, &id).await?,
                WishlistAction::Toggle { id } => commands::wishlist::toggle(&store, &id).await?,
                WishlistAction::Clear => commands::wishlist::clear(&store).await?,
            }
        }
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(&store).await?,
        },
        Commands::Checkout { address } => commands::orders::checkout(&store, &address).await?,
        Commands::Listings { action } => {
            commands::require_sign_in(&store)?;
            match action {
                ListingsAction::Mine => commands::listings::mine(&store).await?,
                ListingsAction::Create {
                    title,
                    description,
                    price,
                    category,
                    condition,
                    location,
                    stock,
                    tags,
                    images,
                } => {
                    let args = commands::listings::ListingArgs {
                        title,
                        description,
                        price,
                        category,
                        condition,
                        location,
                        stock,
                        tags,
                        images,
                    };
                    commands::listings::create(&store, args).await?;
                }
                ListingsAction::Delete { id } => commands::listings::delete(&store, &id).await?,
            }
        }
        Commands::Profile { action } => {
            commands::require_sign_in(&store)?;
            match action {
                ProfileAction::Show => commands::profile::show(&store).await?,
                ProfileAction::Set {
                    buying_contact,
                    selling_contact,
                    location_type,
                    address,
                } => {
                    let changes = commands::profile::ProfileChanges {
                        buying_contact,
                        selling_contact,
                        location_type,
                        address,
                    };
                    commands::profile::set(&store, changes).await?;
                }
            }
        }
    }
    Ok(())
}
