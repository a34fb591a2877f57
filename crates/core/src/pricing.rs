//! The price authority: trusted menu prices.
//!
//! Client carts only ever name items. The unit price charged for an item is
//! always looked up here.
//!
//! [`PriceTable`] is an immutable snapshot. [`PriceAuthority`] holds the
//! current snapshot and swaps it wholesale on [`PriceAuthority::replace`], so a
//! reader holding a snapshot never observes a half-applied update.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use thiserror::Error;

/// Built-in menu used until (or unless) a price file is loaded.
const DEFAULT_MENU: &[(&str, u64)] = &[
    ("Classic Burger", 899),
    ("Cheeseburger", 999),
    ("Chicken Sandwich", 949),
    ("Veggie Wrap", 849),
    ("Small Fries", 299),
    ("Large Fries", 449),
    ("Onion Rings", 399),
    ("Soft Drink", 199),
    ("Lemonade", 249),
    ("Milkshake", 549),
];

/// Errors from parsing an external price table.
#[derive(Debug, Error)]
pub enum PriceTableError {
    /// The document is not a JSON object.
    #[error("price table is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A price is negative, fractional or not a number.
    #[error("price for {name:?} must be a non-negative integer number of cents")]
    InvalidPrice {
        /// Offending item name.
        name: String,
    },

    /// An item name is blank.
    #[error("price table contains a blank item name")]
    BlankName,

    /// Two entries name the same item once surrounding whitespace is trimmed.
    #[error("price table lists {0:?} more than once")]
    DuplicateName(String),

    /// The table has no items at all.
    #[error("price table is empty")]
    Empty,
}

/// Immutable mapping from item name to unit price in cents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PriceTable {
    prices: BTreeMap<String, u64>,
}

impl PriceTable {
    /// Build a table from `(name, cents)` pairs. Later duplicates win.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            prices: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// The built-in menu.
    #[must_use]
    pub fn default_menu() -> Self {
        Self::from_entries(DEFAULT_MENU.iter().copied())
    }

    /// Parse a JSON object of the form `{ "<name>": <cents>, ... }`.
    ///
    /// The whole document is rejected if any entry is invalid.
    ///
    /// # Errors
    ///
    /// Returns [`PriceTableError`] if the document is not an object of
    /// non-negative integer prices keyed by distinct, non-blank names.
    pub fn from_json_str(json: &str) -> Result<Self, PriceTableError> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;
        if raw.is_empty() {
            return Err(PriceTableError::Empty);
        }

        let mut prices = BTreeMap::new();
        for (name, value) in raw {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(PriceTableError::BlankName);
            }
            let cents = value
                .as_u64()
                .ok_or_else(|| PriceTableError::InvalidPrice { name: name.clone() })?;
            if prices.insert(trimmed.to_string(), cents).is_some() {
                return Err(PriceTableError::DuplicateName(trimmed.to_string()));
            }
        }

        Ok(Self { prices })
    }

    /// Unit price for `name`, if it is on the menu.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<u64> {
        self.prices.get(name).copied()
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether the table has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Item names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.prices.keys().map(String::as_str)
    }

    /// Iterate `(name, cents)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.prices.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Check that every required item is priced.
    #[must_use]
    pub fn health_check<S: AsRef<str>>(&self, required: &[S]) -> PriceHealth {
        let missing_keys: Vec<String> = required
            .iter()
            .map(AsRef::as_ref)
            .filter(|key| !self.prices.contains_key(*key))
            .map(str::to_string)
            .collect();

        PriceHealth {
            ok: missing_keys.is_empty(),
            missing_keys,
        }
    }
}

impl Serialize for PriceTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.prices.serialize(serializer)
    }
}

/// Result of [`PriceTable::health_check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHealth {
    /// `true` when no required key is missing.
    pub ok: bool,
    /// Required item names absent from the table.
    pub missing_keys: Vec<String>,
}

/// Process-wide holder of the current [`PriceTable`].
///
/// Reads clone an `Arc` to the current snapshot; writes replace the whole
/// snapshot under a short write lock.
#[derive(Debug)]
pub struct PriceAuthority {
    current: RwLock<Arc<PriceTable>>,
}

impl PriceAuthority {
    /// Create an authority serving `table`.
    #[must_use]
    pub fn new(table: PriceTable) -> Self {
        Self {
            current: RwLock::new(Arc::new(table)),
        }
    }

    /// The current table. Hold on to it for the duration of one checkout.
    #[must_use]
    pub fn snapshot(&self) -> Arc<PriceTable> {
        // A poisoned lock still guards a whole Arc; the data cannot be torn.
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Unit price for `name` in the current table.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<u64> {
        self.snapshot().get(name)
    }

    /// Atomically replace the whole table.
    pub fn replace(&self, table: PriceTable) {
        let table = Arc::new(table);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = table;
    }

    /// Check the current table for required items.
    #[must_use]
    pub fn health_check<S: AsRef<str>>(&self, required: &[S]) -> PriceHealth {
        self.snapshot().health_check(required)
    }
}

impl Default for PriceAuthority {
    fn default() -> Self {
        Self::new(PriceTable::default_menu())
    }
}
