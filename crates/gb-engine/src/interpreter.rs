//! Executes chapter action lists against a session.

use std::path::PathBuf;

use gb_core::{
    Action, ChapterId, ChapterTable, DEFAULT_USE_PREFIX, InventoryOp, PendingChoice, Session,
    Target,
};
use rand::Rng;
use tracing::{debug, warn};

use crate::effect::{Effect, Notice, Render};
use crate::error::{EngineError, EngineResult};
use crate::expr;
use crate::text;

/// Default bound on nested action lists plus chained navigation.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Configuration for an [`Interpreter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Maximum nesting of branches, inline choice actions and chained
    /// navigations within one render.
    pub max_depth: usize,
    /// Chapter id prefix of item use-chapters.
    pub use_prefix: String,
    /// When set, asset paths are checked for existence under this directory.
    pub asset_root: Option<PathBuf>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            use_prefix: DEFAULT_USE_PREFIX.to_string(),
            asset_root: None,
        }
    }
}

impl InterpreterConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_use_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.use_prefix = prefix.into().to_lowercase();
        self
    }

    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }
}

/// How execution continues after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Go on with the next action.
    Continue,
    /// `end` was reached: stop this list and the lists it is inlined into.
    Terminate,
    /// Control moved to another chapter, or the depth limit was hit.
    Halt,
}

/// Mutable state of one interpreter entry-point call.
struct Run<'a, R: ?Sized> {
    session: &'a mut Session,
    rng: &'a mut R,
    effects: Vec<Effect>,
}

impl<'a, R: Rng + ?Sized> Run<'a, R> {
    fn new(session: &'a mut Session, rng: &'a mut R) -> Self {
        Self {
            session,
            rng,
            effects: Vec::new(),
        }
    }

    fn notice(&mut self, notice: Notice) {
        self.effects.push(Effect::Notice(notice));
    }

    fn finish(self) -> Render {
        Render {
            chapter: self.session.chapter.clone(),
            effects: self.effects,
            choices: self.session.choice_labels(),
        }
    }
}

/// Walks compiled actions, mutating a session and collecting effects.
///
/// The interpreter borrows the immutable chapter table; sessions are passed
/// in per call so one interpreter can serve any number of players.
pub struct Interpreter<'t> {
    table: &'t ChapterTable,
    config: &'t InterpreterConfig,
}

impl<'t> Interpreter<'t> {
    pub fn new(table: &'t ChapterTable, config: &'t InterpreterConfig) -> Self {
        Self { table, config }
    }

    /// Execute the session's current chapter from the top.
    ///
    /// The pending-choice registry is rebuilt from scratch; a `goto` in the
    /// chapter continues into the destination chapter.
    pub fn render_chapter<R: Rng + ?Sized>(&self, session: &mut Session, rng: &mut R) -> Render {
        let mut run = Run::new(session, rng);
        self.enter(&mut run, 0);
        run.finish()
    }

    /// Resolve a registered choice: run its inline actions, then navigate.
    ///
    /// The target is validated first, so a rejected choice leaves the
    /// session untouched.
    pub fn submit_choice<R: Rng + ?Sized>(
        &self,
        session: &mut Session,
        label: &str,
        rng: &mut R,
    ) -> EngineResult<Render> {
        let choice = session
            .find_choice(label)
            .cloned()
            .ok_or_else(|| EngineError::InvalidChoice(label.trim().to_string()))?;
        self.check_target(session, &choice.target)?;
        debug!(label = %choice.label, target = %choice.target, "choice selected");

        let mut run = Run::new(session, rng);
        if !choice.actions.is_empty() && self.execute(&mut run, &choice.actions, 1) == Flow::Halt {
            return Ok(run.finish());
        }
        self.navigate(&mut run, &choice.target, 0);
        Ok(run.finish())
    }

    /// Navigate to the use-chapter of a held, usable item.
    pub fn use_item<R: Rng + ?Sized>(
        &self,
        session: &mut Session,
        item: &str,
        rng: &mut R,
    ) -> EngineResult<Render> {
        let held = session
            .item(item)
            .ok_or_else(|| EngineError::ItemNotHeld(item.trim().to_string()))?;
        if !held.usable {
            return Err(EngineError::ItemNotUsable(held.name.clone()));
        }
        let chapter = ChapterId::use_chapter(&self.config.use_prefix, &held.name);
        if !self.table.contains(&chapter) {
            return Err(EngineError::UnknownChapter(chapter));
        }

        let mut run = Run::new(session, rng);
        self.navigate(&mut run, &Target::Chapter(chapter), 0);
        Ok(run.finish())
    }

    /// Register a `Use <item>` choice for every held item that has a
    /// use-chapter, and return the new labels.
    pub fn offer_item_uses(&self, session: &mut Session) -> Vec<String> {
        let offers: Vec<PendingChoice> = session
            .inventory
            .iter()
            .filter(|item| item.usable)
            .map(|item| (item, ChapterId::use_chapter(&self.config.use_prefix, &item.name)))
            .filter(|(_, chapter)| self.table.contains(chapter))
            .map(|(item, chapter)| PendingChoice {
                label: format!("Use {}", item.name),
                target: Target::Chapter(chapter),
                actions: Vec::new(),
            })
            .collect();

        let labels = offers.iter().map(|c| c.label.clone()).collect();
        for offer in offers {
            session.register_choice(offer);
        }
        labels
    }

    fn check_target(&self, session: &Session, target: &Target) -> EngineResult<()> {
        match target {
            Target::Return if session.history.is_empty() => Err(EngineError::NothingToReturnTo),
            Target::Return => Ok(()),
            Target::Chapter(id) if !self.table.contains(id) => {
                Err(EngineError::UnknownChapter(id.clone()))
            }
            Target::Chapter(_) => Ok(()),
        }
    }

    /// Render the session's current chapter at `depth`.
    fn enter<R: Rng + ?Sized>(&self, run: &mut Run<'_, R>, depth: usize) -> Flow {
        run.session.choices.clear();
        let chapter = run.session.chapter.clone();
        let Some(actions) = self.table.get(&chapter) else {
            warn!(chapter = %chapter, "current chapter missing from table");
            run.notice(Notice::UnknownChapter(chapter));
            return Flow::Halt;
        };
        debug!(chapter = %chapter, depth, "rendering chapter");
        self.execute(run, actions, depth)
    }

    fn execute<R: Rng + ?Sized>(&self, run: &mut Run<'_, R>, actions: &[Action], depth: usize) -> Flow {
        if depth > self.config.max_depth {
            warn!(
                chapter = %run.session.chapter,
                limit = self.config.max_depth,
                "depth limit reached"
            );
            run.notice(Notice::DepthLimit(self.config.max_depth));
            return Flow::Halt;
        }
        for action in actions {
            match self.step(run, action, depth) {
                Flow::Continue => {}
                flow => return flow,
            }
        }
        Flow::Continue
    }

    fn step<R: Rng + ?Sized>(&self, run: &mut Run<'_, R>, action: &Action, depth: usize) -> Flow {
        match action {
            Action::Text(raw) => {
                let text = text::substitute(raw, &*run.session);
                run.effects.push(Effect::Text(text));
            }
            Action::Choice { label, target } => run.session.register_choice(PendingChoice {
                label: label.clone(),
                target: target.clone(),
                actions: Vec::new(),
            }),
            Action::ExtendedChoice {
                label,
                target,
                actions,
            } => run.session.register_choice(PendingChoice {
                label: label.clone(),
                target: target.clone(),
                actions: actions.clone(),
            }),
            Action::InventoryDelta { op, item, usable } => match op {
                InventoryOp::Add => {
                    run.session.add_item(item, *usable);
                }
                InventoryOp::Remove => {
                    run.session.remove_item(item);
                }
            },
            Action::CurrencyDelta { op, amount } => {
                run.session.currency = op.apply(run.session.currency, *amount);
            }
            Action::Assign {
                key,
                expression,
                display_name,
            } => match expr::evaluate_sum(expression, &*run.session, &mut *run.rng) {
                Ok(value) => run.session.set_attribute(key, value, display_name.as_deref()),
                Err(e) => {
                    warn!(chapter = %run.session.chapter, key = %key, expression = %expression, error = %e, "assignment failed");
                    run.notice(Notice::ActionFailed {
                        action: action.to_string(),
                        reason: e.to_string(),
                    });
                }
            },
            Action::Conditional {
                condition,
                then_actions,
                else_actions,
            } => {
                let holds = match expr::evaluate_condition(condition, &*run.session, &mut *run.rng) {
                    Ok(holds) => holds,
                    Err(e) => {
                        warn!(chapter = %run.session.chapter, condition = %condition, error = %e, "condition failed");
                        run.notice(Notice::ActionFailed {
                            action: action.to_string(),
                            reason: e.to_string(),
                        });
                        false
                    }
                };
                let branch = if holds { then_actions } else { else_actions };
                return self.execute(run, branch, depth + 1);
            }
            Action::Navigate(target) => return self.navigate(run, target, depth),
            Action::Asset(path) => {
                let missing = self
                    .config
                    .asset_root
                    .as_ref()
                    .is_some_and(|root| !root.join(path).is_file());
                if missing {
                    warn!(path = %path, "asset not found");
                    run.notice(Notice::MissingAsset(path.clone()));
                } else {
                    run.effects.push(Effect::Asset(path.clone()));
                }
            }
            Action::Terminate => return Flow::Terminate,
            Action::Unknown(line) => {
                debug!(chapter = %run.session.chapter, line = %line, "unknown directive reached");
                run.notice(Notice::UnknownDirective(line.clone()));
            }
        }
        Flow::Continue
    }

    /// Move to `target` and render it. A failed navigation is a notice and
    /// execution continues; a successful one halts the originating list.
    fn navigate<R: Rng + ?Sized>(&self, run: &mut Run<'_, R>, target: &Target, depth: usize) -> Flow {
        match target {
            Target::Return => match run.session.history.pop() {
                Some(previous) => run.session.chapter = previous,
                None => {
                    debug!(chapter = %run.session.chapter, "return with empty history");
                    run.notice(Notice::NothingToReturnTo);
                    return Flow::Continue;
                }
            },
            Target::Chapter(id) => {
                if !self.table.contains(id) {
                    warn!(chapter = %run.session.chapter, target = %id, "navigation to unknown chapter");
                    run.notice(Notice::UnknownChapter(id.clone()));
                    return Flow::Continue;
                }
                let from = std::mem::replace(&mut run.session.chapter, id.clone());
                run.session.history.push(from);
            }
        }
        debug!(to = %run.session.chapter, "navigated");
        self.enter(run, depth + 1);
        Flow::Halt
    }
}
