//! Thread-safe handle to a running dialog session
//!
//! Every method posts a `Trigger` to the session mailbox; nothing here
//! touches session state directly. Handles are cheap to clone and can be
//! used from any thread, before or after the dialog is shown.

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use super::Trigger;
use crate::error::{DialogError, Result};
use crate::outcome::{DialogOutcome, OutcomeCell};
use crate::position::{WindowPosition, WorkArea};
use crate::view::ButtonSlot;

#[derive(Debug, Clone)]
pub struct DialogHandle {
    id: Uuid,
    tx: UnboundedSender<Trigger>,
    outcome: OutcomeCell,
}

impl DialogHandle {
    pub(crate) fn new(id: Uuid, tx: UnboundedSender<Trigger>, outcome: OutcomeCell) -> Self {
        Self { id, tx, outcome }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn post(&self, trigger: Trigger) -> Result<()> {
        self.tx.send(trigger).map_err(|_| DialogError::SessionClosed)
    }

    /// User clicked a button
    pub fn click(&self, slot: ButtonSlot) -> Result<()> {
        self.post(Trigger::ButtonClicked(slot))
    }

    /// Input field text changed
    pub fn set_input_text(&self, text: impl Into<String>) -> Result<()> {
        self.post(Trigger::InputChanged(text.into()))
    }

    /// User dragged the window
    pub fn window_moved(&self, position: WindowPosition) -> Result<()> {
        self.post(Trigger::WindowMoved(position))
    }

    /// Screen layout or work area changed
    pub fn display_changed(&self, area: WorkArea) -> Result<()> {
        self.post(Trigger::DisplayChanged(area))
    }

    /// Update a progress dialog. `None` fields keep their current value.
    pub fn update_progress(
        &self,
        message: Option<String>,
        detail: Option<String>,
        percent: Option<f64>,
    ) -> Result<()> {
        self.post(Trigger::UpdateProgress {
            message,
            detail,
            percent,
        })
    }

    /// Ask the dialog to close with whatever outcome is pending.
    ///
    /// Idempotent: closing an already closed dialog does nothing.
    pub fn close_dialog(&self) {
        let _ = self.tx.send(Trigger::CloseRequested);
    }

    /// Terminal outcome, once decided
    pub fn outcome(&self) -> Option<DialogOutcome> {
        self.outcome.get()
    }

    /// Session has been torn down and accepts no more input
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
