use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::action::Action;

/// Default prefix marking a chapter as the "use" action of an item.
pub const DEFAULT_USE_PREFIX: &str = "use_";

/// Case-normalized chapter identifier.
///
/// Identifiers are lower-cased and trimmed on construction so that lookups
/// are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ChapterId(String);

impl ChapterId {
    /// Create a normalized chapter identifier.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_lowercase())
    }

    /// The normalized identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The use-chapter of an item: `prefix` followed by the item name.
    pub fn use_chapter(prefix: &str, item: &str) -> Self {
        Self::new(format!("{prefix}{}", item.trim()))
    }

    /// The item this chapter is the use-chapter of, if it carries `prefix`.
    pub fn used_item(&self, prefix: &str) -> Option<&str> {
        self.0
            .strip_prefix(&prefix.to_lowercase())
            .filter(|item| !item.is_empty())
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ChapterId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ChapterId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<ChapterId> for String {
    fn from(id: ChapterId) -> Self {
        id.0
    }
}

/// Destination of a navigation or a choice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Target {
    /// A named chapter.
    Chapter(ChapterId),
    /// Go back to the most recent chapter in the navigation history.
    Return,
}

impl Target {
    /// The reserved target word for back-navigation.
    pub const RETURN: &'static str = "return";

    /// Parse a target, recognizing the `return` sentinel case-insensitively.
    pub fn parse(s: &str) -> Self {
        let id = ChapterId::new(s);
        if id.as_str() == Self::RETURN {
            Self::Return
        } else {
            Self::Chapter(id)
        }
    }

    /// The chapter this target names, if it is not `return`.
    pub fn chapter(&self) -> Option<&ChapterId> {
        match self {
            Self::Chapter(id) => Some(id),
            Self::Return => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chapter(id) => write!(f, "{id}"),
            Self::Return => write!(f, "{}", Self::RETURN),
        }
    }
}

impl From<String> for Target {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Target> for String {
    fn from(target: Target) -> Self {
        target.to_string()
    }
}

/// Immutable mapping from chapter identifier to its ordered action list.
///
/// The first chapter inserted is the starting chapter of a new session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterTable {
    start: Option<ChapterId>,
    chapters: BTreeMap<ChapterId, Vec<Action>>,
}

impl ChapterTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a chapter, returning the previous action list if the id was
    /// already present. The first inserted chapter becomes the start chapter.
    pub fn insert(&mut self, id: ChapterId, actions: Vec<Action>) -> Option<Vec<Action>> {
        if self.start.is_none() {
            self.start = Some(id.clone());
        }
        self.chapters.insert(id, actions)
    }

    /// The chapter a fresh session begins in.
    pub fn start(&self) -> Option<&ChapterId> {
        self.start.as_ref()
    }

    /// Look up the actions of a chapter.
    pub fn get(&self, id: &ChapterId) -> Option<&[Action]> {
        self.chapters.get(id).map(Vec::as_slice)
    }

    /// Whether a chapter with this id exists.
    pub fn contains(&self, id: &ChapterId) -> bool {
        self.chapters.contains_key(id)
    }

    /// Whether a target can be resolved: `return` always can, chapters must exist.
    pub fn resolves(&self, target: &Target) -> bool {
        match target {
            Target::Chapter(id) => self.contains(id),
            Target::Return => true,
        }
    }

    /// Number of chapters.
    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    /// Whether the table has no chapters.
    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// Iterate over chapters in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&ChapterId, &[Action])> {
        self.chapters.iter().map(|(id, actions)| (id, actions.as_slice()))
    }

    /// Total number of actions, counting nested branches and inline choice actions.
    pub fn action_count(&self) -> usize {
        self.chapters.values().map(|a| Action::count_all(a)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_id_is_case_normalized() {
        assert_eq!(ChapterId::new("  Start "), ChapterId::new("start"));
        assert_eq!(ChapterId::new("Use_Potion").as_str(), "use_potion");
    }

    #[test]
    fn use_chapter_naming() {
        let id = ChapterId::use_chapter("use_", "Healing Potion");
        assert_eq!(id.as_str(), "use_healing potion");
        assert_eq!(id.used_item("use_"), Some("healing potion"));
        assert_eq!(ChapterId::new("use_").used_item("use_"), None);
        assert_eq!(ChapterId::new("cave").used_item("use_"), None);
    }

    #[test]
    fn target_parses_return_sentinel() {
        assert_eq!(Target::parse("RETURN"), Target::Return);
        assert_eq!(
            Target::parse("Cave"),
            Target::Chapter(ChapterId::new("cave"))
        );
        assert_eq!(Target::Return.to_string(), "return");
    }

    #[test]
    fn first_insert_is_start() {
        let mut table = ChapterTable::new();
        table.insert(ChapterId::new("intro"), vec![]);
        table.insert(ChapterId::new("cave"), vec![]);
        assert_eq!(table.start(), Some(&ChapterId::new("intro")));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn insert_reports_duplicates() {
        let mut table = ChapterTable::new();
        assert!(table.insert(ChapterId::new("a"), vec![Action::Terminate]).is_none());
        let previous = table.insert(ChapterId::new("A"), vec![]);
        assert_eq!(previous, Some(vec![Action::Terminate]));
        assert_eq!(table.get(&ChapterId::new("a")), Some(&[][..]));
    }

    #[test]
    fn resolves_targets() {
        let mut table = ChapterTable::new();
        table.insert(ChapterId::new("cave"), vec![]);
        assert!(table.resolves(&Target::Return));
        assert!(table.resolves(&Target::parse("cave")));
        assert!(!table.resolves(&Target::parse("forest")));
    }

    #[test]
    fn json_round_trip() {
        let mut table = ChapterTable::new();
        table.insert(
            ChapterId::new("start"),
            vec![
                Action::Text("Hello".to_string()),
                Action::Navigate(Target::Return),
            ],
        );
        let json = serde_json::to_string(&table).unwrap();
        assert!(json.contains(r#""type":"navigate","value":"return""#));
        let back: ChapterTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
