use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chapter::Target;

/// Whether an inventory directive adds or removes an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryOp {
    /// Put the item into the inventory (idempotent).
    Add,
    /// Take the item out of the inventory (no-op if absent).
    Remove,
}

/// How a currency directive changes the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrencyOp {
    /// Increase by the amount.
    Add,
    /// Decrease by the amount.
    Remove,
    /// Replace the counter with the amount.
    Set,
}

impl CurrencyOp {
    /// Apply this operation to a currency counter. No clamping is performed.
    pub fn apply(self, current: i64, amount: i64) -> i64 {
        match self {
            Self::Add => current.saturating_add(amount),
            Self::Remove => current.saturating_sub(amount),
            Self::Set => amount,
        }
    }
}

/// One compiled instruction within a chapter.
///
/// `ExtendedChoice` and `Conditional` own their nested action lists, so a
/// chapter's actions always form a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Action {
    /// Narrative text, possibly containing `{key}` attribute placeholders.
    Text(String),
    /// A selectable choice.
    Choice {
        /// User-facing label, original casing preserved.
        label: String,
        /// Where the choice leads.
        target: Target,
    },
    /// A choice that runs extra actions before navigating.
    ExtendedChoice {
        /// User-facing label, original casing preserved.
        label: String,
        /// Where the choice leads.
        target: Target,
        /// Actions executed when the choice is selected.
        actions: Vec<Action>,
    },
    /// Add or remove an inventory item.
    InventoryDelta {
        /// Add or remove.
        op: InventoryOp,
        /// Normalized item name.
        item: String,
        /// Whether a matching use-chapter exists.
        usable: bool,
    },
    /// Change the currency counter.
    CurrencyDelta {
        /// Add, remove, or set.
        op: CurrencyOp,
        /// Non-negative amount.
        amount: i64,
    },
    /// Evaluate an expression and store it as an attribute.
    Assign {
        /// Attribute key.
        key: String,
        /// Unevaluated value expression.
        expression: String,
        /// Human-readable attribute name, if the script supplied one.
        display_name: Option<String>,
    },
    /// Unconditional transfer to another chapter or back through history.
    Navigate(Target),
    /// Run one of two action lists depending on a condition.
    Conditional {
        /// Unevaluated boolean condition.
        condition: String,
        /// Actions run when the condition holds.
        then_actions: Vec<Action>,
        /// Actions run otherwise.
        else_actions: Vec<Action>,
    },
    /// Reference to an image, with `/` path separators.
    Asset(String),
    /// Stop processing the current action list.
    Terminate,
    /// A script line no directive recognized, kept verbatim.
    Unknown(String),
}

impl Action {
    /// Short, stable name of the action kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Choice { .. } => "choice",
            Self::ExtendedChoice { .. } => "extended_choice",
            Self::InventoryDelta { .. } => "inventory_delta",
            Self::CurrencyDelta { .. } => "currency_delta",
            Self::Assign { .. } => "assign",
            Self::Navigate(_) => "navigate",
            Self::Conditional { .. } => "conditional",
            Self::Asset(_) => "asset",
            Self::Terminate => "terminate",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Visit every navigation and choice target in this action tree.
    pub fn for_each_target<'a>(&'a self, f: &mut impl FnMut(&'a Target)) {
        match self {
            Self::Choice { target, .. } | Self::Navigate(target) => f(target),
            Self::ExtendedChoice {
                target, actions, ..
            } => {
                f(target);
                for action in actions {
                    action.for_each_target(f);
                }
            }
            Self::Conditional {
                then_actions,
                else_actions,
                ..
            } => {
                for action in then_actions.iter().chain(else_actions) {
                    action.for_each_target(f);
                }
            }
            _ => {}
        }
    }

    /// Count actions in a list, including every nested list.
    pub fn count_all(actions: &[Action]) -> usize {
        actions
            .iter()
            .map(|action| {
                1 + match action {
                    Self::ExtendedChoice { actions, .. } => Self::count_all(actions),
                    Self::Conditional {
                        then_actions,
                        else_actions,
                        ..
                    } => Self::count_all(then_actions) + Self::count_all(else_actions),
                    _ => 0,
                }
            })
            .sum()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "text {text:?}"),
            Self::Choice { label, target } => write!(f, "choice {label:?} -> {target}"),
            Self::ExtendedChoice {
                label,
                target,
                actions,
            } => write!(
                f,
                "choice {label:?} -> {target} (+{} actions)",
                actions.len()
            ),
            Self::InventoryDelta { op, item, usable } => {
                let sign = match op {
                    InventoryOp::Add => '+',
                    InventoryOp::Remove => '-',
                };
                let tag = if *usable { " [usable]" } else { "" };
                write!(f, "inventory {sign}{item}{tag}")
            }
            Self::CurrencyDelta { op, amount } => match op {
                CurrencyOp::Add => write!(f, "currency +{amount}"),
                CurrencyOp::Remove => write!(f, "currency -{amount}"),
                CurrencyOp::Set => write!(f, "currency ={amount}"),
            },
            Self::Assign {
                key, expression, ..
            } => write!(f, "assign {key} = {expression}"),
            Self::Navigate(target) => write!(f, "goto {target}"),
            Self::Conditional { condition, .. } => write!(f, "if {condition}"),
            Self::Asset(path) => write!(f, "image {path}"),
            Self::Terminate => write!(f, "end"),
            Self::Unknown(line) => write!(f, "unknown {line:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_ops() {
        assert_eq!(CurrencyOp::Add.apply(100, 20), 120);
        assert_eq!(CurrencyOp::Remove.apply(10, 25), -15);
        assert_eq!(CurrencyOp::Set.apply(-15, 7), 7);
    }

    #[test]
    fn collects_nested_targets() {
        let action = Action::Conditional {
            condition: "key".to_string(),
            then_actions: vec![
                Action::Navigate(Target::parse("vault")),
                Action::ExtendedChoice {
                    label: "Sneak".to_string(),
                    target: Target::parse("hall"),
                    actions: vec![],
                },
            ],
            else_actions: vec![Action::Choice {
                label: "Back".to_string(),
                target: Target::Return,
            }],
        };

        let mut targets = Vec::new();
        action.for_each_target(&mut |t| targets.push(t.to_string()));
        assert_eq!(targets, vec!["vault", "hall", "return"]);
    }

    #[test]
    fn counts_nested_actions() {
        let actions = vec![
            Action::Text("a".to_string()),
            Action::Conditional {
                condition: "x".to_string(),
                then_actions: vec![Action::Terminate, Action::Terminate],
                else_actions: vec![Action::Terminate],
            },
        ];
        assert_eq!(Action::count_all(&actions), 5);
    }

    #[test]
    fn serializes_with_type_and_value() {
        let action = Action::InventoryDelta {
            op: InventoryOp::Add,
            item: "rope".to_string(),
            usable: false,
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "inventory_delta");
        assert_eq!(json["value"]["item"], "rope");

        let json = serde_json::to_value(Action::Terminate).unwrap();
        assert_eq!(json["type"], "terminate");
    }

    #[test]
    fn display_is_compact() {
        let action = Action::InventoryDelta {
            op: InventoryOp::Remove,
            item: "potion".to_string(),
            usable: true,
        };
        assert_eq!(action.to_string(), "inventory -potion [usable]");
    }
}
