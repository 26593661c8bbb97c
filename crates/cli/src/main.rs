//! Shoebox CLI - Admin dashboard operations from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Check the dashboard passcode
//! shoebox login 1290
//!
//! # Overview counts
//! shoebox stats
//!
//! # Search users, second page
//! shoebox users list --search london --page 2
//!
//! # Give a user 100 loyalty points
//! shoebox users award 1
//!
//! # Create a product with stock in two sizes
//! shoebox products create --title Trainer --sku SH-100 --price 75 --size-6 10 --size-9 4
//!
//! # Upload an image and attach it to a product
//! shoebox products upload-image ./trainer.png --product 3
//!
//! # Work against throwaway in-memory storage
//! shoebox --ephemeral products list
//! ```
//!
//! # Commands
//!
//! - `login` - Check the dashboard passcode
//! - `stats` - Overview counts
//! - `users` - List, create, update, award points to and delete users
//! - `products` - List, create, update, delete products and upload images

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use shoebox_admin::auth::PinError;
use shoebox_admin::{DataError, ShoeboxConfig};
use shoebox_admin::fallback::LocalStorage;
use shoebox_admin::services::DataLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::products::ProductAction;
use commands::users::UserAction;

#[derive(Parser)]
#[command(name = "shoebox")]
#[command(author, version, about = "Shoebox admin dashboard CLI")]
struct Cli {
    /// Keep the fallback store in memory for this run only
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the dashboard passcode
    Login {
        /// Four-digit passcode
        pin: String,
    },
    /// Show overview counts
    Stats,
    /// Manage users
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ShoeboxConfig) -> Option<sentry::ClientInitGuard> {
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

fn init_tracing(json: bool) {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shoebox_admin=info,shoebox_cli=info".into());

    // Logs go to stderr so command output on stdout stays clean
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ShoeboxConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(false);
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);
    init_tracing(config.log_json);

    if let Err(e) = run(cli, &config).await {
        if is_user_error(e.as_ref()) {
            // Below the Sentry event level.
            tracing::warn!("{e}");
        } else {
            tracing::error!("Command failed: {e}");
        }
        std::process::exit(1);
    }
}

/// Whether a command failed because of what was typed rather than a fault.
fn is_user_error(error: &(dyn std::error::Error + 'static)) -> bool {
    error.is::<PinError>()
        || error
            .downcast_ref::<DataError>()
            .is_some_and(DataError::is_user_error)
}

async fn run(cli: Cli, config: &ShoeboxConfig) -> Result<(), Box<dyn std::error::Error>> {
    let ephemeral = cli.ephemeral;
    match cli.command {
        Commands::Login { pin } => commands::session::login(config, &pin)?,
        Commands::Stats => commands::session::stats(&open_layer(config, ephemeral)?).await?,
        Commands::Users { action } => {
            commands::users::run(&open_layer(config, ephemeral)?, action).await?;
        }
        Commands::Products { action } => {
            commands::products::run(&open_layer(config, ephemeral)?, action).await?;
        }
    }
    Ok(())
}

fn open_layer(config: &ShoeboxConfig, ephemeral: bool) -> Result<DataLayer, DataError> {
    if ephemeral {
        DataLayer::with_storage(config, LocalStorage::memory())
    } else {
        DataLayer::from_config(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoebox_admin::fallback::FallbackError;
    use shoebox_core::ValidationError;

    #[test]
    fn test_user_errors_are_told_apart_from_faults() {
        let typo: Box<dyn std::error::Error> = Box::new(PinError::Incorrect);
        assert!(is_user_error(typo.as_ref()));

        let invalid: Box<dyn std::error::Error> =
            Box::new(DataError::from(ValidationError::EmptyUpdate));
        assert!(is_user_error(invalid.as_ref()));

        let broken: Box<dyn std::error::Error> =
            Box::new(DataError::from(FallbackError::InvalidKey("a b".to_string())));
        assert!(!is_user_error(broken.as_ref()));
    }
}
