//! Linear undo/redo history of reversible effectful actions.
//!
//! Provides:
//! - `UndoStack` - capped history with a single cursor
//! - `HistoryAction` - a pair of effects (execute / undo) plus metadata
//! - `KeyChord` / `handle_shortcut` - editor-standard keyboard routing
//!
//! Standard linear-undo semantics: appending a new action destroys the
//! redo tail, and the front of the history is trimmed silently once the cap
//! (default 50) is exceeded. An action whose undo or redo effect fails
//! leaves the cursor untouched so the same step can be retried.

use std::fmt;

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::clock::WallClock;
use crate::service::{Notice, Notifier, ServiceError};

/// Default history cap.
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// How long the "Undone"/"Redone" toast stays up.
const UNDO_NOTICE_MS: u64 = 3_000;

/// A reversible effect. The cooperative single-threaded rendition of a
/// zero-argument async effect: invoked at most once per undo/redo step,
/// mutating whatever it captured.
pub type Effect = Box<dyn FnMut() -> Result<(), ServiceError>>;

/// Semantic tag for an action. Drives the human-readable description only,
/// never branching logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    Create,
    Update,
    Delete,
    Duplicate,
    Archive,
    Favorite,
    Reversible,
    Batch,
}

impl ActionKind {
    fn verb(self) -> &'static str {
        match self {
            ActionKind::Create => "Create",
            ActionKind::Update => "Update",
            ActionKind::Delete => "Delete",
            ActionKind::Duplicate => "Duplicate",
            ActionKind::Archive => "Archive",
            ActionKind::Favorite => "Favorite",
            ActionKind::Reversible => "Change",
            ActionKind::Batch => "Batch change",
        }
    }
}

/// One reversible step in the history.
pub struct HistoryAction {
    pub id: Uuid,
    pub kind: ActionKind,
    pub description: String,
    pub registered_at: WallClock,
    execute: Effect,
    undo: Effect,
}

impl fmt::Debug for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryAction")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("description", &self.description)
            .field("registered_at", &self.registered_at)
            .finish_non_exhaustive()
    }
}

/// Undo or redo effect failure. The cursor is left where it was.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("undo failed for {description}: {source}")]
    UndoFailed {
        description: String,
        source: ServiceError,
    },

    #[error("redo failed for {description}: {source}")]
    RedoFailed {
        description: String,
        source: ServiceError,
    },
}

impl HistoryError {
    pub fn retryable(&self) -> bool {
        match self {
            HistoryError::UndoFailed { source, .. } | HistoryError::RedoFailed { source, .. } => {
                source.retryable()
            }
        }
    }
}

/// Linear history with a cursor.
///
/// `applied` counts the actions currently in effect; the undoable range is
/// `history[..applied]` and the redoable tail is `history[applied..]`.
pub struct UndoStack {
    history: Vec<HistoryAction>,
    applied: usize,
    /// Non-reentrancy guard: set while an undo/redo effect runs, so the
    /// effect cannot register itself as a fresh action.
    performing: bool,
    max_history: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl UndoStack {
    pub fn new(max_history: usize) -> Self {
        Self {
            history: Vec::new(),
            applied: 0,
            performing: false,
            max_history: max_history.max(1),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    pub fn can_redo(&self) -> bool {
        self.applied < self.history.len()
    }

    /// Append a new action.
    ///
    /// Returns false (ignored) while an undo/redo is itself executing.
    /// Otherwise the redo tail is discarded, the action appended, and the
    /// oldest entries trimmed past the cap.
    pub fn record(
        &mut self,
        kind: ActionKind,
        description: impl Into<String>,
        execute: Effect,
        undo: Effect,
        now: WallClock,
    ) -> bool {
        if self.performing {
            debug!("action recorded during undo/redo, ignoring");
            return false;
        }

        self.history.truncate(self.applied);
        self.history.push(HistoryAction {
            id: Uuid::new_v4(),
            kind,
            description: description.into(),
            registered_at: now,
            execute,
            undo,
        });

        if self.history.len() > self.max_history {
            let excess = self.history.len() - self.max_history;
            self.history.drain(..excess);
        }
        self.applied = self.history.len();
        true
    }

    /// Undo the most recent applied action.
    ///
    /// `Ok(false)` when there is nothing to undo or the call is re-entrant.
    /// On effect failure the cursor stays put, a destructive notice is
    /// emitted, and the error is returned.
    pub fn undo(&mut self, notify: &dyn Notifier) -> Result<bool, HistoryError> {
        if self.performing || !self.can_undo() {
            return Ok(false);
        }

        let index = self.applied - 1;
        self.performing = true;
        let outcome = (self.history[index].undo)();
        self.performing = false;

        let action = &self.history[index];
        match outcome {
            Ok(()) => {
                self.applied = index;
                notify.notify(
                    Notice::success("Undone", action.description.clone())
                        .with_duration(UNDO_NOTICE_MS),
                );
                Ok(true)
            }
            Err(source) => {
                notify.notify(Notice::destructive("Undo failed", action.description.clone()));
                Err(HistoryError::UndoFailed {
                    description: action.description.clone(),
                    source,
                })
            }
        }
    }

    /// Re-apply the next undone action. Symmetric with `undo`.
    pub fn redo(&mut self, notify: &dyn Notifier) -> Result<bool, HistoryError> {
        if self.performing || !self.can_redo() {
            return Ok(false);
        }

        let index = self.applied;
        self.performing = true;
        let outcome = (self.history[index].execute)();
        self.performing = false;

        let action = &self.history[index];
        match outcome {
            Ok(()) => {
                self.applied = index + 1;
                notify.notify(
                    Notice::success("Redone", action.description.clone())
                        .with_duration(UNDO_NOTICE_MS),
                );
                Ok(true)
            }
            Err(source) => {
                notify.notify(Notice::destructive("Redo failed", action.description.clone()));
                Err(HistoryError::RedoFailed {
                    description: action.description.clone(),
                    source,
                })
            }
        }
    }

    /// Empty the history and reset the cursor.
    pub fn clear(&mut self) {
        self.history.clear();
        self.applied = 0;
    }

    /// The most recent actions, newest first.
    pub fn recent(&self, count: usize) -> Vec<&HistoryAction> {
        self.history.iter().rev().take(count).collect()
    }

    pub fn action_at(&self, index: usize) -> Option<&HistoryAction> {
        self.history.get(index)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Route an editor-standard keyboard shortcut. Ignored while an effect
    /// is running.
    pub fn handle_shortcut(
        &mut self,
        chord: &KeyChord,
        notify: &dyn Notifier,
    ) -> Result<bool, HistoryError> {
        match shortcut_for(chord) {
            Some(Shortcut::Undo) => self.undo(notify),
            Some(Shortcut::Redo) => self.redo(notify),
            None => Ok(false),
        }
    }
}

// =============================================================================
// Domain helpers - canned descriptions per verb
// =============================================================================

macro_rules! record_helper {
    ($name:ident, $kind:expr) => {
        impl UndoStack {
            /// Record an action with the canned description for this verb.
            pub fn $name(
                &mut self,
                product_name: &str,
                execute: Effect,
                undo: Effect,
                now: WallClock,
            ) -> bool {
                let description = format!("{} product \"{}\"", $kind.verb(), product_name);
                self.record($kind, description, execute, undo, now)
            }
        }
    };
}

record_helper!(record_create, ActionKind::Create);
record_helper!(record_update, ActionKind::Update);
record_helper!(record_delete, ActionKind::Delete);
record_helper!(record_duplicate, ActionKind::Duplicate);
record_helper!(record_archive, ActionKind::Archive);
record_helper!(record_favorite, ActionKind::Favorite);

// =============================================================================
// Keyboard shortcuts
// =============================================================================

/// A key press with its modifiers, normalized by the embedding UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyChord {
    /// Lowercased key character.
    pub key: char,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shortcut {
    Undo,
    Redo,
}

/// Ctrl/Cmd+Z undoes; Ctrl/Cmd+Shift+Z and Ctrl/Cmd+Y redo.
fn shortcut_for(chord: &KeyChord) -> Option<Shortcut> {
    if !chord.ctrl && !chord.meta {
        return None;
    }
    match (chord.key, chord.shift) {
        ('z', false) => Some(Shortcut::Undo),
        ('z', true) => Some(Shortcut::Redo),
        ('y', _) => Some(Shortcut::Redo),
        _ => None,
    }
}
