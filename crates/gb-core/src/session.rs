use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::chapter::{ChapterId, Target};

/// Identifier of a player, as supplied by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Wrap a player identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PlayerId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A named numeric attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Display name (falls back to the key).
    pub name: String,
    /// Current value.
    pub value: i64,
}

/// An inventory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Normalized item name.
    pub name: String,
    /// Whether a use-chapter exists for this item.
    pub usable: bool,
}

/// Bounded LIFO record of previously visited chapters.
///
/// Pushing onto a full history silently drops the oldest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    capacity: usize,
    entries: VecDeque<ChapterId>,
}

impl History {
    /// Create an empty history holding at most `capacity` chapters.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Record a chapter, evicting the oldest entry when full.
    pub fn push(&mut self, chapter: ChapterId) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(chapter);
    }

    /// Remove and return the most recent chapter.
    pub fn pop(&mut self) -> Option<ChapterId> {
        self.entries.pop_back()
    }

    /// The most recent chapter without removing it.
    pub fn peek(&self) -> Option<&ChapterId> {
        self.entries.back()
    }

    /// Number of recorded chapters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no chapters are recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of recorded chapters.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate from oldest to most recent.
    pub fn iter(&self) -> impl Iterator<Item = &ChapterId> {
        self.entries.iter()
    }
}

/// A choice registered while rendering the current chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChoice {
    /// Label the player selects.
    pub label: String,
    /// Where the choice leads.
    pub target: Target,
    /// Actions executed before navigating (extended choices).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

/// One player's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Chapter the player is currently in.
    pub chapter: ChapterId,
    /// Numeric attributes by key.
    pub attributes: BTreeMap<String, Attribute>,
    /// Held items, in acquisition order.
    pub inventory: Vec<Item>,
    /// Currency counter. May go negative.
    pub currency: i64,
    /// Previously visited chapters for `return`.
    pub history: History,
    /// Choices offered by the most recent render.
    pub choices: Vec<PendingChoice>,
}

impl Session {
    /// Create a fresh session positioned at `start`.
    pub fn new(start: ChapterId, history_limit: usize) -> Self {
        Self {
            chapter: start,
            attributes: BTreeMap::new(),
            inventory: Vec::new(),
            currency: 0,
            history: History::new(history_limit),
            choices: Vec::new(),
        }
    }

    /// Current value of an attribute.
    pub fn attribute(&self, key: &str) -> Option<i64> {
        self.attributes.get(key).map(|a| a.value)
    }

    /// Store an attribute value. Without a display name the attribute keeps
    /// the name it already has, or falls back to the key.
    pub fn set_attribute(&mut self, key: &str, value: i64, display_name: Option<&str>) {
        let display_name = display_name.filter(|n| !n.is_empty());
        match self.attributes.get_mut(key) {
            Some(attribute) => {
                attribute.value = value;
                if let Some(name) = display_name {
                    attribute.name = name.to_string();
                }
            }
            None => {
                let name = display_name.unwrap_or(key).to_string();
                self.attributes
                    .insert(key.to_string(), Attribute { name, value });
            }
        }
    }

    /// Whether an item is held (case-insensitive).
    pub fn has_item(&self, name: &str) -> bool {
        self.item(name).is_some()
    }

    /// Look up a held item (case-insensitive).
    pub fn item(&self, name: &str) -> Option<&Item> {
        let name = name.trim().to_lowercase();
        self.inventory
            .iter()
            .find(|item| item.name.to_lowercase() == name)
    }

    /// Add an item. Returns `false` if it was already held.
    pub fn add_item(&mut self, name: &str, usable: bool) -> bool {
        if self.has_item(name) {
            return false;
        }
        self.inventory.push(Item {
            name: name.trim().to_string(),
            usable,
        });
        true
    }

    /// Remove an item. Returns `false` if it was not held.
    pub fn remove_item(&mut self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        if let Some(pos) = self
            .inventory
            .iter()
            .position(|item| item.name.to_lowercase() == name)
        {
            self.inventory.remove(pos);
            true
        } else {
            false
        }
    }

    /// Register a choice for the current chapter. A choice with a label
    /// already registered replaces it in place.
    pub fn register_choice(&mut self, choice: PendingChoice) {
        match self.choices.iter_mut().find(|c| c.label == choice.label) {
            Some(existing) => *existing = choice,
            None => self.choices.push(choice),
        }
    }

    /// Find a registered choice by its label. An exact match wins over a
    /// case-insensitive one.
    pub fn find_choice(&self, label: &str) -> Option<&PendingChoice> {
        let label = label.trim();
        self.choices
            .iter()
            .find(|c| c.label == label)
            .or_else(|| {
                let label = label.to_lowercase();
                self.choices.iter().find(|c| c.label.to_lowercase() == label)
            })
    }

    /// Labels of registered choices, in registration order.
    pub fn choice_labels(&self) -> Vec<String> {
        self.choices.iter().map(|c| c.label.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(ChapterId::new("start"), 3)
    }

    #[test]
    fn new_session_is_empty() {
        let s = session();
        assert_eq!(s.chapter.as_str(), "start");
        assert!(s.attributes.is_empty());
        assert!(s.inventory.is_empty());
        assert_eq!(s.currency, 0);
        assert!(s.history.is_empty());
        assert!(s.choices.is_empty());
    }

    #[test]
    fn history_evicts_oldest() {
        let mut history = History::new(3);
        for id in ["a", "b", "c", "d"] {
            history.push(ChapterId::new(id));
        }
        let ids: Vec<_> = history.iter().map(|c| c.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "d"]);
        assert_eq!(history.pop(), Some(ChapterId::new("d")));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn zero_capacity_history_records_nothing() {
        let mut history = History::new(0);
        history.push(ChapterId::new("a"));
        assert!(history.is_empty());
        assert_eq!(history.pop(), None);
    }

    #[test]
    fn inventory_add_is_idempotent() {
        let mut s = session();
        assert!(s.add_item("rope", false));
        assert!(!s.add_item("Rope", false));
        assert_eq!(s.inventory.len(), 1);
    }

    #[test]
    fn inventory_remove_absent_is_noop() {
        let mut s = session();
        assert!(!s.remove_item("lamp"));
        s.add_item("lamp", false);
        assert!(s.remove_item("LAMP"));
        assert!(!s.has_item("lamp"));
    }

    #[test]
    fn inventory_matches_non_ascii_names() {
        let mut s = session();
        s.add_item("волшебный меч", false);
        assert!(s.has_item("Волшебный Меч"));
    }

    #[test]
    fn attribute_name_falls_back_to_key() {
        let mut s = session();
        s.set_attribute("str", 10, None);
        s.set_attribute("dex", 7, Some("Dexterity"));
        assert_eq!(s.attributes["str"].name, "str");
        assert_eq!(s.attributes["dex"].name, "Dexterity");
        assert_eq!(s.attribute("dex"), Some(7));
        assert_eq!(s.attribute("luck"), None);
    }

    #[test]
    fn reassignment_keeps_display_name() {
        let mut s = session();
        s.set_attribute("str", 10, Some("Strength"));
        s.set_attribute("str", 12, None);
        assert_eq!(s.attributes["str"].name, "Strength");
        assert_eq!(s.attribute("str"), Some(12));

        s.set_attribute("str", 13, Some(""));
        assert_eq!(s.attributes["str"].name, "Strength");
        s.set_attribute("str", 14, Some("Might"));
        assert_eq!(s.attributes["str"].name, "Might");
    }

    #[test]
    fn registering_same_label_replaces_choice() {
        let mut s = session();
        s.register_choice(PendingChoice {
            label: "Go".to_string(),
            target: Target::parse("a"),
            actions: vec![],
        });
        s.register_choice(PendingChoice {
            label: "Go".to_string(),
            target: Target::parse("b"),
            actions: vec![],
        });
        assert_eq!(s.choices.len(), 1);
        assert_eq!(s.find_choice("Go").unwrap().target, Target::parse("b"));
        assert_eq!(s.find_choice(" go ").unwrap().target, Target::parse("b"));
        assert!(s.find_choice("Stay").is_none());
    }

    #[test]
    fn replaced_choice_keeps_its_position() {
        let mut s = session();
        for (label, target) in [("Go", "a"), ("Stay", "b"), ("Go", "c")] {
            s.register_choice(PendingChoice {
                label: label.to_string(),
                target: Target::parse(target),
                actions: vec![],
            });
        }
        let labels: Vec<_> = s.choices.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Go", "Stay"]);
        assert_eq!(s.choices[0].target, Target::parse("c"));
    }
}
