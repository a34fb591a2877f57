//! File-backed price table with background reload.
//!
//! The price file is a JSON object mapping item names to integer cents:
//!
//! ```json
//! { "Classic Burger": 899, "Small Fries": 299 }
//! ```
//!
//! The reload task polls the file's modification time. A changed file is
//! parsed in full and published as one snapshot; a file that fails to parse
//! is ignored and the previous table stays in effect.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use orderline_core::PriceAuthority;
use orderline_core::PriceTable;
use orderline_core::pricing::PriceTableError;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Errors loading a price file.
#[derive(Debug, Error)]
pub enum PriceFileError {
    #[error("failed to read price file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid price file {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: PriceTableError,
    },
}

/// Read and validate a price file.
///
/// # Errors
///
/// Returns error if the file cannot be read or is not a valid price table.
pub async fn load_price_file(path: &Path) -> Result<PriceTable, PriceFileError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| PriceFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    PriceTable::from_json_str(&json).map_err(|source| PriceFileError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}

/// Table to start from when `path` is configured.
///
/// A file that does not exist yet or that fails validation leaves the
/// built-in menu in effect; the reload task publishes the file once it
/// appears or is fixed.
///
/// # Errors
///
/// Returns error if the file exists but cannot be read.
pub async fn initial_table(path: &Path) -> Result<PriceTable, PriceFileError> {
    match load_price_file(path).await {
        Ok(table) => Ok(table),
        Err(PriceFileError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "Price file not found, using built-in menu");
            Ok(PriceTable::default_menu())
        }
        Err(e @ PriceFileError::Invalid { .. }) => {
            warn!(error = %e, "Price file rejected, using built-in menu");
            Ok(PriceTable::default_menu())
        }
        Err(e) => Err(e),
    }
}

/// Stops the reload task when told to or when dropped.
#[derive(Debug)]
pub struct ReloadTaskHandle {
    cancel: watch::Sender<bool>,
}

impl ReloadTaskHandle {
    /// Signal the reload task to stop.
    pub fn stop(&self) {
        let _ = self.cancel.send(true);
    }
}

impl Drop for ReloadTaskHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawn a task that republishes the price file into `authority` whenever its
/// modification time changes.
pub fn spawn_reload_task(
    authority: Arc<PriceAuthority>,
    path: PathBuf,
    poll_interval: Duration,
) -> ReloadTaskHandle {
    let (cancel_tx, mut cancel_rx) = watch::channel(false);

    tokio::spawn(async move {
        info!(
            path = %path.display(),
            poll_secs = poll_interval.as_secs(),
            "Price reload task started"
        );
        let mut last_seen = modified_at(&path).await;

        loop {
            tokio::select! {
                () = tokio::time::sleep(poll_interval) => {
                    let modified = modified_at(&path).await;
                    if modified.is_none() || modified == last_seen {
                        continue;
                    }
                    last_seen = modified;
                    reload(&authority, &path).await;
                }
                changed = cancel_rx.changed() => {
                    if changed.is_err() || *cancel_rx.borrow() {
                        info!("Price reload task stopped");
                        break;
                    }
                }
            }
        }
    });

    ReloadTaskHandle { cancel: cancel_tx }
}

async fn modified_at(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path)
        .await
        .and_then(|metadata| metadata.modified())
        .ok()
}

/// Load the file and publish it, keeping the current table on failure.
async fn reload(authority: &PriceAuthority, path: &Path) {
    match load_price_file(path).await {
        Ok(table) => {
            let items = table.len();
            authority.replace(table);
            info!(items, "Price table reloaded");
        }
        Err(e) => warn!(error = %e, "Price file rejected, keeping current prices"),
    }
    debug!(path = %path.display(), "Price file checked");
}
