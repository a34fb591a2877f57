//! Price file commands.

use std::path::Path;

use orderline_core::PriceTable;
use orderline_server::prices::load_price_file;
use tracing::{error, info};

use super::{CommandError, write_json};

/// Validate a price file and check that every `required` item is priced.
///
/// # Errors
///
/// Returns an error if the file is unreadable, invalid, or missing items.
pub async fn check(file: &Path, required: &[String]) -> Result<(), CommandError> {
    info!(path = %file.display(), "Checking price file");

    let table = load_price_file(file).await?;
    info!(items = table.len(), "Price file parsed");

    let missing = missing_items(&table, required);
    if !missing.is_empty() {
        error!("Required items without a price:");
        for name in &missing {
            error!("  - {name}");
        }
        return Err(CommandError::MissingItems(missing.len()));
    }

    info!("Price file OK");
    Ok(())
}

/// Print the built-in menu.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn print_default() -> Result<(), CommandError> {
    write_json(&PriceTable::default_menu())
}

fn missing_items(table: &PriceTable, required: &[String]) -> Vec<String> {
    table.health_check(required).missing_keys
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    fn price_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_check_accepts_complete_file() {
        let file = price_file(r#"{"Small Fries": 299, "Lemonade": 249}"#);
        check(file.path(), &["Small Fries".to_string()]).await.unwrap();
    }

    #[tokio::test]
    async fn test_check_reports_missing_items() {
        let file = price_file(r#"{"Small Fries": 299}"#);
        let err = check(file.path(), &["Milkshake".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "1 required item(s) missing");
    }

    #[tokio::test]
    async fn test_check_rejects_invalid_file() {
        let file = price_file(r#"{"Small Fries": "cheap"}"#);
        assert!(matches!(
            check(file.path(), &[]).await,
            Err(CommandError::PriceFile(_))
        ));
    }

    #[test]
    fn test_default_menu_has_no_missing_items_against_itself() {
        let table = PriceTable::default_menu();
        let names: Vec<String> = table.names().map(str::to_string).collect();
        assert!(missing_items(&table, &names).is_empty());
    }
}
