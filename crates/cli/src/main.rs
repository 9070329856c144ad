//! DirectPay CLI - Database migrations and shipping configuration.
//!
//! # Usage
//!
//! ```bash
//! # Run checkout database migrations
//! dp-cli migrate
//!
//! # Pickup locations
//! dp-cli locations list chronopost
//! dp-cli locations add chronopost -n "Relais Centre" -a "1 rue de Rivoli" -c Paris -p 75001 --country FR
//! dp-cli locations remove chronopost loc_0123456789abc
//!
//! # Country pricing
//! dp-cli pricing list mondial-relay
//! dp-cli pricing set mondial-relay FR --express 9.90 --normal 4.90
//! dp-cli pricing remove mondial-relay FR
//!
//! # Free-shipping sessions
//! dp-cli session-settings show
//! dp-cli session-settings set --enabled true --duration-hours 5
//!
//! # Rate label title
//! dp-cli rate-title show
//! dp-cli rate-title set "Point relais"
//! ```
//!
//! # Environment Variables
//!
//! - `CHECKOUT_DATABASE_URL` or `DATABASE_URL` - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use directpay_core::{CountryCode, Money, ShippingProvider};

mod commands;

#[derive(Parser)]
#[command(name = "dp-cli")]
#[command(author, version, about = "DirectPay CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run checkout database migrations
    Migrate,
    /// Manage pickup locations
    Locations {
        #[command(subcommand)]
        action: LocationAction,
    },
    /// Manage per-country pickup pricing
    Pricing {
        #[command(subcommand)]
        action: PricingAction,
    },
    /// Show or change free-shipping session settings
    SessionSettings {
        #[command(subcommand)]
        action: SessionSettingsAction,
    },
    /// Show or change the title used in shipping rate labels
    RateTitle {
        #[command(subcommand)]
        action: RateTitleAction,
    },
}

#[derive(Subcommand)]
enum LocationAction {
    /// List locations for a provider
    List {
        /// Provider (`chronopost`, `mondial-relay`)
        provider: ShippingProvider,
    },
    /// Add a location
    Add {
        /// Provider (`chronopost`, `mondial-relay`)
        provider: ShippingProvider,

        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        address: String,

        #[arg(short, long)]
        city: String,

        #[arg(short, long)]
        postal_code: String,

        /// ISO 3166-1 alpha-2 country code
        #[arg(long)]
        country: CountryCode,
    },
    /// Remove a location by id
    Remove {
        provider: ShippingProvider,
        id: String,
    },
}

#[derive(Subcommand)]
enum PricingAction {
    /// List pricing rules for a provider
    List { provider: ShippingProvider },
    /// Insert or replace the rule for a country
    Set {
        provider: ShippingProvider,
        country: CountryCode,

        /// Express delivery price (0 hides the express rate)
        #[arg(long, default_value = "0")]
        express: Money,

        /// Normal delivery price (0 hides the normal rate)
        #[arg(long, default_value = "0")]
        normal: Money,
    },
    /// Remove the rule for a country
    Remove {
        provider: ShippingProvider,
        country: CountryCode,
    },
}

#[derive(Subcommand)]
enum SessionSettingsAction {
    /// Print the current settings
    Show,
    /// Update the settings
    Set {
        #[arg(long)]
        enabled: bool,

        /// Session length in hours (1 to 48)
        #[arg(long)]
        duration_hours: i64,
    },
}

#[derive(Subcommand)]
enum RateTitleAction {
    /// Print the current title
    Show,
    /// Replace the title
    Set { title: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    use commands::{migrate, settings, shipping};

    match cli.command {
        Commands::Migrate => migrate::run().await?,
        Commands::Locations { action } => match action {
            LocationAction::List { provider } => shipping::list_locations(provider).await?,
            LocationAction::Add {
                provider,
                name,
                address,
                city,
                postal_code,
                country,
            } => {
                let location = directpay_checkout::services::catalog::NewLocation {
                    name,
                    address,
                    city,
                    postal_code,
                    country,
                };
                shipping::add_location(provider, location).await?;
            }
            LocationAction::Remove { provider, id } => {
                shipping::remove_location(provider, &id).await?;
            }
        },
        Commands::Pricing { action } => match action {
            PricingAction::List { provider } => shipping::list_pricing(provider).await?,
            PricingAction::Set {
                provider,
                country,
                express,
                normal,
            } => shipping::set_pricing(provider, country, express, normal).await?,
            PricingAction::Remove { provider, country } => {
                shipping::remove_pricing(provider, &country).await?;
            }
        },
        Commands::SessionSettings { action } => match action {
            SessionSettingsAction::Show => settings::show_session_settings().await?,
            SessionSettingsAction::Set {
                enabled,
                duration_hours,
            } => settings::set_session_settings(enabled, duration_hours).await?,
        },
        Commands::RateTitle { action } => match action {
            RateTitleAction::Show => settings::show_rate_title().await?,
            RateTitleAction::Set { title } => settings::set_rate_title(title).await?,
        },
    }
    Ok(())
}
