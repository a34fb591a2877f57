//! CLI command implementations.

pub mod prices;
pub mod quote;

use std::io::Write;
use std::path::PathBuf;

use orderline_core::CheckoutError;
use orderline_server::config::ConfigError;
use orderline_server::prices::PriceFileError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The price file is unreadable or invalid.
    #[error(transparent)]
    PriceFile(#[from] PriceFileError),

    /// The environment configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Required items are not priced.
    #[error("{0} required item(s) missing")]
    MissingItems(usize),

    /// The tax rate override is negative.
    #[error("tax rate must not be negative")]
    NegativeTaxRate,

    /// The cart file could not be read.
    #[error("failed to read cart {path}: {source}")]
    CartFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cart file is not a JSON list of items.
    #[error("invalid cart: {0}")]
    Cart(#[source] serde_json::Error),

    /// The cart does not price.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Output could not be written.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Write pretty JSON to stdout.
pub(crate) fn write_json<T: serde::Serialize>(value: &T) -> Result<(), CommandError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).map_err(std::io::Error::from)?;
    writeln!(stdout)?;
    Ok(())
}
