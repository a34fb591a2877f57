//! Orderline CLI - price file and quoting tools.
//!
//! # Usage
//!
//! ```bash
//! # Validate a price file, requiring some items to be present
//! ol-cli prices check prices.json --require "Classic Burger" --require "Small Fries"
//!
//! # Print the built-in menu as a starting point for a price file
//! ol-cli prices default > prices.json
//!
//! # Price a cart offline, exactly as /checkout would
//! ol-cli quote cart.json --tax-rate 8 --delivery --delivery-fee 300
//! ```
//!
//! # Commands
//!
//! - `prices check` - Validate a price file
//! - `prices default` - Print the built-in menu
//! - `quote` - Sanitize and total a cart without contacting Square

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::CommandError;
use rust_decimal::Decimal;

mod commands;

#[derive(Parser)]
#[command(name = "ol-cli")]
#[command(author, version, about = "Orderline operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with price files
    Prices {
        #[command(subcommand)]
        action: PricesAction,
    },
    /// Price a cart offline
    Quote {
        /// JSON file with the cart: `[{"name": "...", "qty": 1}, ...]`
        cart: PathBuf,

        /// Sales tax percentage (default: TAX_RATE_PERCENT or 0)
        #[arg(long)]
        tax_rate: Option<Decimal>,

        /// Delivery fee in cents (default: DELIVERY_FEE_CENTS or 0)
        #[arg(long)]
        delivery_fee: Option<u64>,

        /// Quote for delivery instead of pickup
        #[arg(long)]
        delivery: bool,

        /// Price file to use instead of the built-in menu
        #[arg(long)]
        prices: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PricesAction {
    /// Validate a price file
    Check {
        /// Path to the JSON price file
        file: PathBuf,

        /// Item that must be priced (repeatable)
        #[arg(short, long)]
        require: Vec<String>,
    },
    /// Print the built-in menu as JSON
    Default,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    match cli.command {
        Commands::Prices { action } => match action {
            PricesAction::Check { file, require } => {
                commands::prices::check(&file, &require).await?;
            }
            PricesAction::Default => commands::prices::print_default()?,
        },
        Commands::Quote {
            cart,
            tax_rate,
            delivery_fee,
            delivery,
            prices,
        } => {
            let options = commands::quote::QuoteOptions {
                tax_rate,
                delivery_fee,
                delivery,
                prices,
            };
            commands::quote::run(&cart, options).await?;
        }
    }
    Ok(())
}
