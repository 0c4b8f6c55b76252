//! Wrapsody CLI - storefront accounts, catalog and cart from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Create an account and log in
//! wrapsody signup -e ada@example.com -f Ada -l Lovelace --password ... --accept-eula
//! wrapsody login -e ada@example.com --password ... --stay-logged-in
//!
//! # Browse
//! wrapsody collections
//! wrapsody products gid://shopify/Collection/1 --after <cursor>
//!
//! # Interactive cart
//! wrapsody shop
//!
//! # Run profile database migrations
//! wrapsody migrate
//! ```
//!
//! # Commands
//!
//! - `signup`, `login`, `logout`, `reset-password`, `update-password`,
//!   `delete-account`, `eula` - account management
//! - `collections`, `products`, `random-product`, `orders`, `favorites` - catalog
//! - `shop` - interactive cart shell with checkout
//! - `migrate` - Run database migrations

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wrapsody_storefront::{AppError, StorefrontConfig};

mod commands;

#[derive(Parser)]
#[command(name = "wrapsody")]
#[command(author, version, about = "Wrapsody storefront from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Signup {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        first_name: String,

        #[arg(short, long)]
        last_name: String,

        #[arg(long)]
        password: String,

        /// Password confirmation (defaults to --password)
        #[arg(long)]
        confirm_password: Option<String>,

        /// Accept the End User License Agreement
        #[arg(long)]
        accept_eula: bool,
    },
    /// Log in
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(long)]
        password: String,

        /// Remember this login for the next run
        #[arg(long)]
        stay_logged_in: bool,
    },
    /// Log out and forget the remembered login
    Logout,
    /// Email a password reset link
    ResetPassword {
        #[arg(short, long)]
        email: String,
    },
    /// Change the account password
    UpdatePassword {
        #[arg(short, long)]
        email: String,

        #[arg(long)]
        current_password: String,

        #[arg(long)]
        new_password: String,

        #[arg(long)]
        confirm_password: String,
    },
    /// Delete the account
    DeleteAccount {
        #[arg(short, long)]
        email: String,

        #[arg(long)]
        password: String,
    },
    /// Show or accept the End User License Agreement
    Eula {
        #[command(subcommand)]
        action: EulaAction,
    },
    /// List collections with a preview of their products
    Collections,
    /// List one page of a collection's products
    Products {
        /// Collection ID (global ID or numeric)
        collection: String,

        /// Cursor printed by the previous page
        #[arg(long)]
        after: Option<String>,

        #[arg(long, default_value_t = 20)]
        page_size: i64,
    },
    /// Show a random product
    RandomProduct,
    /// List past orders of the logged-in customer
    Orders,
    /// Manage favorite products
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Interactive cart shell
    Shop,
    /// Run profile database migrations
    Migrate,
}

#[derive(Subcommand)]
enum EulaAction {
    /// Whether the account accepted the EULA
    Status {
        #[arg(short, long)]
        email: String,
    },
    /// Accept the EULA
    Accept {
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// List favorite product IDs
    List,
    /// Add or remove a favorite
    Toggle {
        /// Product ID (global ID or numeric)
        product: String,
    },
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
            sample_rate: config.sentry_sample_rate,
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
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            fail(&AppError::from(e));
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "wrapsody_storefront=info,wrapsody_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, config).await {
        fail(&e);
    }
}

/// Report the error, show its alert text and exit.
fn fail(error: &AppError) -> ! {
    error.report();
    #[allow(clippy::print_stderr)]
    {
        eprintln!("Error: {}", error.alert_message());
    }
    std::process::exit(1);
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), AppError> {
    if matches!(cli.command, Commands::Migrate) {
        return commands::migrate::run(&config).await;
    }

    let checkout = matches!(cli.command, Commands::Shop).then(commands::shop::terminal_checkout);
    let ctx = commands::Context::load(&config, checkout.as_ref()).await?;

    match cli.command {
        Commands::Signup {
            email,
            first_name,
            last_name,
            password,
            confirm_password,
            accept_eula,
        } => {
            let confirm_password = confirm_password.unwrap_or_else(|| password.clone());
            commands::account::signup(
                &ctx,
                commands::account::SignUpArgs {
                    email,
                    first_name,
                    last_name,
                    password,
                    confirm_password,
                    accept_eula,
                },
            )
            .await?;
        }
        Commands::Login {
            email,
            password,
            stay_logged_in,
        } => commands::account::login(&ctx, &email, &password, stay_logged_in).await?,
        Commands::Logout => commands::account::logout(&ctx).await?,
        Commands::ResetPassword { email } => {
            commands::account::reset_password(&ctx, &email).await?;
        }
        Commands::UpdatePassword {
            email,
            current_password,
            new_password,
            confirm_password,
        } => {
            commands::account::update_password(
                &ctx,
                email,
                current_password,
                new_password,
                confirm_password,
            )
            .await?;
        }
        Commands::DeleteAccount { email, password } => {
            commands::account::delete_account(&ctx, &email, &password).await?;
        }
        Commands::Eula { action } => match action {
            EulaAction::Status { email } => commands::account::eula_status(&ctx, &email).await?,
            EulaAction::Accept { email } => commands::account::accept_eula(&ctx, &email).await?,
        },
        Commands::Collections => commands::catalog::collections(&ctx).await?,
        Commands::Products {
            collection,
            after,
            page_size,
        } => {
            commands::catalog::products(&ctx, &collection, after.as_deref(), page_size).await?;
        }
        Commands::RandomProduct => commands::catalog::random_product(&ctx).await?,
        Commands::Orders => commands::catalog::orders(&ctx).await?,
        Commands::Favorites { action } => match action {
            FavoritesAction::List => commands::catalog::list_favorites(&ctx).await,
            FavoritesAction::Toggle { product } => {
                commands::catalog::toggle_favorite(&ctx, &product).await?;
            }
        },
        Commands::Shop => {
            let Some(terminal) = checkout else {
                return Err(AppError::Internal("checkout surface missing".to_string()));
            };
            commands::shop::run(&ctx, &terminal).await?;
        }
        Commands::Migrate => {}
    }
    Ok(())
}
