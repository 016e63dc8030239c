//! SuturaHub CLI - terminal front end for the storefront client.
//!
//! # Usage
//!
//! ```bash
//! # Browse and add to cart
//! suturahub products --search kente --page 2
//! suturahub cart add-product 42
//! suturahub cart set 42 3
//! suturahub cart show
//!
//! # Sign in and check out
//! suturahub login --as buyer -e ama@example.com -p secret1
//! suturahub checkout
//!
//! # Sellers
//! suturahub login --as seller -e shop@example.com -p secret1
//! suturahub sell --title "Kente Wrap" --price 300 ... --image front.jpg
//! ```
//!
//! # Environment Variables
//!
//! See `suturahub_storefront::config` for the full list. `SUTURAHUB_API_BASE`
//! is required.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use suturahub_core::Role;
use suturahub_storefront::config::StorefrontConfig;
use suturahub_storefront::error::AppError;
use suturahub_storefront::models::ProductInput;
use suturahub_storefront::state::AppState;

mod commands;

#[derive(Parser)]
#[command(name = "suturahub")]
#[command(author, version, about = "SuturaHub marketplace client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and change the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Sign in as a buyer or seller
    Login {
        /// Account type
        #[arg(long = "as", default_value = "buyer")]
        role: Role,

        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "SUTURAHUB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create a buyer or seller account
    Signup {
        /// Account type
        #[arg(long = "as", default_value = "buyer")]
        role: Role,

        /// Full name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 6 characters)
        #[arg(short, long, env = "SUTURAHUB_PASSWORD", hide_env_values = true)]
        password: String,

        /// Password again
        #[arg(long)]
        confirm_password: String,

        /// Phone number
        #[arg(long, default_value = "")]
        phone: String,

        /// City or region
        #[arg(long, default_value = "")]
        location: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in account
    Whoami {
        /// Re-fetch the profile from the backend
        #[arg(long)]
        refresh: bool,
    },
    /// Browse the product catalog
    Products {
        /// Filter by title, category, or description
        #[arg(short, long)]
        search: Option<String>,

        /// Page number (20 products per page)
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Show the checkout summary for the current cart
    Checkout,
    /// List a product for sale (sellers only)
    Sell(Box<SellArgs>),
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents and totals
    Show,
    /// Add a product by hand
    Add {
        /// Product id
        id: String,

        /// Display title
        #[arg(short, long)]
        title: String,

        /// List price
        #[arg(short, long)]
        price: Decimal,

        /// Discount percentage
        #[arg(long, requires = "discount_price")]
        discount_percent: Option<Decimal>,

        /// Discounted price
        #[arg(long, requires = "discount_percent")]
        discount_price: Option<Decimal>,

        /// Image URL
        #[arg(long)]
        picture: Option<String>,
    },
    /// Add a catalog product by id
    AddProduct {
        /// Product id
        id: String,
    },
    /// Remove a product's line
    Remove {
        /// Product id
        id: String,
    },
    /// Set a line's quantity (0 or less removes it)
    Set {
        /// Product id
        id: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear {
        /// Confirm clearing the cart
        #[arg(long)]
        yes: bool,
    },
}

/// Product listing fields.
#[derive(clap::Args)]
struct SellArgs {
    #[arg(long)]
    category: String,
    #[arg(long)]
    sub_category: String,
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: String,
    #[arg(long)]
    price: Decimal,
    #[arg(long)]
    quantity: u32,
    /// e.g. "3-5 days"
    #[arg(long)]
    delivery_time: String,
    /// Enables a discount (1-99)
    #[arg(long)]
    discount_percent: Option<Decimal>,
    /// Repeat for each size
    #[arg(long = "size")]
    sizes: Vec<String>,
    /// Repeat for each colour
    #[arg(long = "color")]
    colors: Vec<String>,
    /// Repeat for each tag
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Repeat for each image file
    #[arg(long = "image")]
    images: Vec<PathBuf>,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry.dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(config.sentry.environment.clone().into()),
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

    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "suturahub_storefront=info,suturahub_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => match AppState::new(config) {
            Ok(state) => run(cli, &state).await,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize storefront state");
                return ExitCode::FAILURE;
            }
        },
        Err(e) => Err(AppError::from(e)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Error: {}", e.user_message());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, state: &AppState) -> Result<(), AppError> {
    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(state),
            CartAction::Add {
                id,
                title,
                price,
                discount_percent,
                discount_price,
                picture,
            } => {
                let mut input = ProductInput::new(id, title, price);
                if let (Some(percent), Some(discounted)) = (discount_percent, discount_price) {
                    input = input.with_discount(percent, discounted);
                }
                if let Some(picture) = picture {
                    input = input.with_picture(picture);
                }
                commands::cart::add(state, input)?;
            }
            CartAction::AddProduct { id } => commands::cart::add_product(state, &id).await?,
            CartAction::Remove { id } => commands::cart::remove(state, &id)?,
            CartAction::Set { id, quantity } => commands::cart::set(state, &id, quantity)?,
            CartAction::Clear { yes } => commands::cart::clear(state, yes)?,
        },
        Commands::Login {
            role,
            email,
            password,
        } => commands::account::login(state, role, &email, password.into()).await?,
        Commands::Signup {
            role,
            name,
            email,
            password,
            confirm_password,
            phone,
            location,
        } => {
            let form = suturahub_storefront::api::SignupForm {
                full_name: name,
                email,
                password: password.into(),
                confirm_password: confirm_password.into(),
                phone,
                location,
            };
            commands::account::signup(state, role, &form).await?;
        }
        Commands::Logout => commands::account::logout(state),
        Commands::Whoami { refresh } => commands::account::whoami(state, refresh).await?,
        Commands::Products { search, page } => {
            commands::catalog::list(state, search.as_deref().unwrap_or_default(), page).await?;
        }
        Commands::Checkout => commands::checkout::summary(state)?,
        Commands::Sell(args) => commands::sell::submit(state, *args).await?,
    }
    Ok(())
}
