//! Reconciliation of externally supplied document values with local editing state.
//!
//! The host passes the document in on every re-render, so most incoming values
//! are echoes of what the editor just emitted. Those must be recognised and
//! ignored; replacing the document for an echo would reset the cursor on every
//! keystroke.

use serde_json::Value;

use crate::editing::document::Document;
use crate::editing::json;
use crate::editing::position::Bias;
use crate::editing::schema::SchemaError;
use crate::editing::selection::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    Reconciling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Incoming value equals the current document
    Unchanged,
    /// Document was replaced; the old selection was re-resolved to `selection`
    Replaced { selection: Selection },
}

/// Owner of the live document and selection
#[derive(Debug, Clone)]
pub struct SyncController {
    doc: Document,
    selection: Selection,
    state: SyncState,
    replacements: u64,
}

impl SyncController {
    pub fn new(doc: Document) -> Self {
        let selection = Selection::near(&doc, 0, Bias::Forward);
        Self {
            doc,
            selection,
            state: SyncState::Idle,
            replacements: 0,
        }
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection.resolve_in(&self.doc);
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// How many times an external value has replaced the document
    pub fn replacements(&self) -> u64 {
        self.replacements
    }

    /// Reconcile an externally supplied document
    pub fn receive(&mut self, incoming: Document) -> SyncOutcome {
        debug_assert_eq!(self.state, SyncState::Idle);
        if incoming == self.doc {
            log::debug!("external document equals current one, keeping local state");
            return SyncOutcome::Unchanged;
        }

        self.state = SyncState::Reconciling;
        let previous = self.selection;
        self.doc = incoming;
        self.selection = previous.resolve_in(&self.doc);
        self.replacements += 1;
        self.state = SyncState::Idle;

        log::debug!(
            "replaced document from external value, selection {:?} -> {:?}",
            previous,
            self.selection
        );
        SyncOutcome::Replaced {
            selection: self.selection,
        }
    }

    /// Validate a JSON document value and reconcile it. Invalid values leave the
    /// current document in place.
    pub fn receive_json(&mut self, value: &Value) -> Result<SyncOutcome, SchemaError> {
        let incoming = json::apply_schema(value).inspect_err(|err| {
            log::warn!("rejected external document: {err}");
        })?;
        Ok(self.receive(incoming))
    }

    /// Install the result of a local transaction
    pub(crate) fn commit(&mut self, doc: Document, selection: Selection) {
        self.doc = doc;
        self.selection = selection;
    }
}
