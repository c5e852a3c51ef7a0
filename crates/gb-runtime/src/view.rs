//! Read-only projections of a session for display.

use gb_core::{Attribute, Item, Session};
use serde::Serialize;

/// Held items and currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryView {
    pub items: Vec<Item>,
    pub currency: i64,
    /// `Use <item>` labels registered for usable items.
    pub use_choices: Vec<String>,
}

/// Attributes in key order, plus currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributesView {
    pub attributes: Vec<(String, Attribute)>,
    pub currency: i64,
}

impl AttributesView {
    pub fn of(session: &Session) -> Self {
        Self {
            attributes: session
                .attributes
                .iter()
                .map(|(key, attribute)| (key.clone(), attribute.clone()))
                .collect(),
            currency: session.currency,
        }
    }

    /// Value of an attribute by key.
    pub fn value(&self, key: &str) -> Option<i64> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, a)| a.value)
    }
}

impl InventoryView {
    pub fn of(session: &Session, use_choices: Vec<String>) -> Self {
        Self {
            items: session.inventory.clone(),
            currency: session.currency,
            use_choices,
        }
    }

    /// Whether an item is held and usable.
    pub fn is_usable(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.items
            .iter()
            .any(|item| item.usable && item.name.to_lowercase() == name)
    }
}
