//! Per-card interaction state machine.
//!
//! Each card in the collection carries an [`InteractionState`]:
//!
//! ```text
//!            begin_edit                 finish_edit / cancel_edit
//!   View ──────────────────▶ Edit ──────────────────────────────▶ View
//!   (answer as toggled)      (answer shown)                       (answer hidden)
//!
//!   View | Edit ── mark_pending_delete ──▶ PendingDelete (frozen)
//! ```
//!
//! Transitions only come from user actions, never from network events.
//! The state is transient: it is created with the card, dropped with it,
//! reset on every reload, and never sent to the server.

use crate::error::{SyncError, SyncResult};
use cardsync_protocol::FlashCard;
use std::fmt;

/// Whether a card is shown or being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Read-only display.
    #[default]
    View,
    /// Question and answer are editable.
    Edit,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::View => "view",
            Mode::Edit => "edit",
        })
    }
}

/// Text being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    /// Question text.
    pub question: String,
    /// Answer text.
    pub answer: String,
}

impl Draft {
    /// Creates a draft.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// UI state of a single card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionState {
    answer_visible: bool,
    mode: Mode,
    pending_delete: bool,
    draft: Option<Draft>,
}

impl InteractionState {
    /// Creates the default state: view mode, answer hidden, not deleting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the state of a card that is waiting to be removed.
    pub fn deleting() -> Self {
        Self {
            pending_delete: true,
            ..Self::default()
        }
    }

    /// Whether the answer is shown.
    pub fn answer_visible(&self) -> bool {
        self.answer_visible
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether the card is fading out before removal.
    pub fn pending_delete(&self) -> bool {
        self.pending_delete
    }

    /// The draft, while in edit mode.
    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    /// Returns true in edit mode.
    pub fn is_editing(&self) -> bool {
        self.mode == Mode::Edit
    }

    /// Name of the current state, for error messages.
    pub fn state_name(&self) -> &'static str {
        if self.pending_delete {
            "pending-delete"
        } else {
            match self.mode {
                Mode::View => "view",
                Mode::Edit => "edit",
            }
        }
    }

    fn invalid(&self, to: &str) -> SyncError {
        SyncError::InvalidStateTransition {
            from: self.state_name().to_string(),
            to: to.to_string(),
        }
    }

    /// Fails if the card is pending deletion.
    pub fn ensure_active(&self, action: &str) -> SyncResult<()> {
        if self.pending_delete {
            return Err(self.invalid(action));
        }
        Ok(())
    }

    /// Shows or hides the answer. Returns the new visibility.
    pub fn toggle_answer(&mut self) -> SyncResult<bool> {
        self.ensure_active("peek")?;
        self.answer_visible = !self.answer_visible;
        Ok(self.answer_visible)
    }

    /// Enters edit mode with a draft copied from `card`. The answer is shown.
    pub fn begin_edit(&mut self, card: &FlashCard) -> SyncResult<()> {
        self.ensure_active("edit")?;
        if self.is_editing() {
            return Err(self.invalid("edit"));
        }
        self.mode = Mode::Edit;
        self.answer_visible = true;
        self.draft = Some(Draft::new(card.question.clone(), card.answer.clone()));
        Ok(())
    }

    /// Replaces the draft text.
    pub fn set_draft(
        &mut self,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> SyncResult<()> {
        self.ensure_active("edit")?;
        if !self.is_editing() || self.draft.is_none() {
            return Err(self.invalid("edit"));
        }
        self.draft = Some(Draft::new(question, answer));
        Ok(())
    }

    /// Leaves edit mode and returns the draft. The answer is hidden.
    pub fn finish_edit(&mut self) -> SyncResult<Draft> {
        self.ensure_active("view")?;
        if !self.is_editing() {
            return Err(self.invalid("view"));
        }
        let draft = self.draft.take().ok_or_else(|| self.invalid("view"))?;
        self.mode = Mode::View;
        self.answer_visible = false;
        Ok(draft)
    }

    /// Leaves edit mode without saving. The answer is hidden.
    pub fn cancel_edit(&mut self) -> SyncResult<()> {
        self.finish_edit().map(|_| ())
    }

    /// Marks the card as fading out. Any draft is discarded.
    pub fn mark_pending_delete(&mut self) -> SyncResult<()> {
        self.ensure_active("pending-delete")?;
        self.pending_delete = true;
        self.mode = Mode::View;
        self.draft = None;
        Ok(())
    }
}
