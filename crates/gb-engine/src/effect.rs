//! Outward effects produced by rendering a chapter.

use std::fmt;

use gb_core::ChapterId;

/// A problem the player or author should know about. Rendering continues
/// after every notice except [`Notice::DepthLimit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Navigation named a chapter that does not exist.
    UnknownChapter(ChapterId),
    /// `return` with an empty navigation history.
    NothingToReturnTo,
    /// An image could not be found under the asset root.
    MissingAsset(String),
    /// An action faulted and was skipped.
    ActionFailed {
        /// The action, as written.
        action: String,
        /// What went wrong.
        reason: String,
    },
    /// A script line the compiler did not recognize was reached.
    UnknownDirective(String),
    /// Nesting or chained navigation went deeper than the configured limit.
    DepthLimit(usize),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::UnknownChapter(id) => write!(f, "Chapter not found: {id}"),
            Notice::NothingToReturnTo => write!(f, "There is nowhere to return to."),
            Notice::MissingAsset(path) => write!(f, "Image not available: {path}"),
            Notice::ActionFailed { action, reason } => {
                write!(f, "Something went wrong ({action}: {reason}), continuing.")
            }
            Notice::UnknownDirective(line) => write!(f, "Unrecognized script line: {line}"),
            Notice::DepthLimit(limit) => {
                write!(f, "Stopped after {limit} nested steps without a choice.")
            }
        }
    }
}

/// One outward effect, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Narrative text with placeholders already substituted.
    Text(String),
    /// Normalized relative image path.
    Asset(String),
    /// A contained fault.
    Notice(Notice),
}

/// Everything a chapter render produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Render {
    /// Chapter the session ended up in.
    pub chapter: ChapterId,
    /// Effects in emission order.
    pub effects: Vec<Effect>,
    /// Selectable choice labels, in registration order.
    pub choices: Vec<String>,
}

impl Render {
    /// Text segments only.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.effects.iter().filter_map(|e| match e {
            Effect::Text(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Notices only.
    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.effects.iter().filter_map(|e| match e {
            Effect::Notice(notice) => Some(notice),
            _ => None,
        })
    }

    /// Asset paths only.
    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.effects.iter().filter_map(|e| match e {
            Effect::Asset(path) => Some(path.as_str()),
            _ => None,
        })
    }

    /// Whether the player has nothing left to choose.
    pub fn is_ending(&self) -> bool {
        self.choices.is_empty()
    }
}
