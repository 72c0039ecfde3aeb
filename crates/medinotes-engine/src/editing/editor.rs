//! The editor facade: owns the live document and routes every local mutation
//! through [`Editor::dispatch`].

use std::fmt;
use std::ops::Range;

use serde_json::Value;

use crate::editing::commands::{compile_command, Cmd};
use crate::editing::dialogs::DialogState;
use crate::editing::document::Document;
use crate::editing::drag::{
    DragAborted, DragController, DragState, DropTarget, DEFAULT_DRAG_THRESHOLD,
};
use crate::editing::history::{History, HistoryEntry};
use crate::editing::patch::Patch;
use crate::editing::position::Bias;
use crate::editing::render::render_html;
use crate::editing::schema::SchemaError;
use crate::editing::selection::Selection;
use crate::editing::step::StepMap;
use crate::editing::sync::{SyncController, SyncOutcome};
use crate::editing::transaction::{Transaction, TransactionError};
use crate::layout::{
    bounding_rect_for_range, compute_menu_position, MenuOptions, MenuPlacement, MenuSize, Point,
    Rect, RenderedLayout,
};

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorOptions {
    pub history_limit: usize,
    pub drag_threshold: f32,
    pub menu: MenuOptions,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            drag_threshold: DEFAULT_DRAG_THRESHOLD,
            menu: MenuOptions::default(),
        }
    }
}

type ChangeListener = Box<dyn FnMut(&Document, &str)>;

pub struct Editor {
    sync: SyncController,
    history: History,
    drag: DragController,
    dialog: DialogState,
    menu: MenuOptions,
    version: u64,
    listener: Option<ChangeListener>,
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("doc", self.sync.doc())
            .field("selection", &self.sync.selection())
            .field("version", &self.version)
            .field("dialog", &self.dialog)
            .finish_non_exhaustive()
    }
}

impl Editor {
    pub fn new(doc: Document, options: EditorOptions) -> Self {
        Self {
            sync: SyncController::new(doc),
            history: History::new(options.history_limit),
            drag: DragController::new(options.drag_threshold),
            dialog: DialogState::Closed,
            menu: options.menu,
            version: 0,
            listener: None,
        }
    }

    /// Called with the new document and its HTML after every committed local change
    pub fn on_change(&mut self, listener: impl FnMut(&Document, &str) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn doc(&self) -> &Document {
        self.sync.doc()
    }

    pub fn selection(&self) -> Selection {
        self.sync.selection()
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.sync.set_selection(selection);
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Apply a transaction as one undoable change
    pub fn dispatch(&mut self, tx: Transaction) -> Result<Patch, TransactionError> {
        let before = self.selection();
        let (patch, inverse) = self.commit(&tx)?;
        self.history.record(inverse, before);
        Ok(patch)
    }

    /// Compile and dispatch a command. Failures make the command a no-op.
    pub fn apply(&mut self, cmd: Cmd) -> Option<Patch> {
        let result = compile_command(self.doc(), self.selection(), &cmd).and_then(|tx| {
            if tx.is_empty() {
                Ok(None)
            } else {
                self.dispatch(tx).map(Some)
            }
        });
        match result {
            Ok(patch) => patch,
            Err(err) => {
                log::debug!("command {cmd:?} ignored: {err}");
                None
            }
        }
    }

    pub fn undo(&mut self) -> Option<Patch> {
        let entry = self.history.pop_undo()?;
        let before = self.selection();
        match self.commit(&entry.transaction.clone().with_selection(entry.selection)) {
            Ok((patch, inverse)) => {
                self.history.push_redo(HistoryEntry {
                    transaction: inverse,
                    selection: before,
                });
                Some(patch)
            }
            Err(err) => {
                log::warn!("undo entry no longer applies, dropping history: {err}");
                self.history.clear();
                None
            }
        }
    }

    pub fn redo(&mut self) -> Option<Patch> {
        let entry = self.history.pop_redo()?;
        let before = self.selection();
        match self.commit(&entry.transaction.clone().with_selection(entry.selection)) {
            Ok((patch, inverse)) => {
                self.history.push_undo(HistoryEntry {
                    transaction: inverse,
                    selection: before,
                });
                Some(patch)
            }
            Err(err) => {
                log::warn!("redo entry no longer applies, dropping history: {err}");
                self.history.clear();
                None
            }
        }
    }

    /// Reconcile a document supplied from outside. Replacing the document drops
    /// undo history, any drag in progress and the open dialog.
    pub fn set_content(&mut self, doc: Document) -> SyncOutcome {
        let outcome = self.sync.receive(doc);
        if let SyncOutcome::Replaced { .. } = outcome {
            self.reset_interaction();
        }
        outcome
    }

    pub fn receive_json(&mut self, value: &Value) -> Result<SyncOutcome, SchemaError> {
        let outcome = self.sync.receive_json(value)?;
        if let SyncOutcome::Replaced { .. } = outcome {
            self.reset_interaction();
        }
        Ok(outcome)
    }

    fn reset_interaction(&mut self) {
        self.history.clear();
        self.drag.cancel();
        self.dialog.close();
    }

    fn commit(&mut self, tx: &Transaction) -> Result<(Patch, Transaction), TransactionError> {
        let applied = tx.apply(self.doc())?;
        let changed = changed_ranges(&applied.maps);
        self.drag.map_through(&applied);
        self.sync.commit(applied.doc, applied.selection);
        self.version += 1;

        if let Some(listener) = self.listener.as_mut() {
            let html = render_html(self.sync.doc());
            listener(self.sync.doc(), &html);
        }

        Ok((
            Patch {
                changed,
                new_selection: applied.selection,
                version: self.version,
            },
            applied.inverse,
        ))
    }

    pub fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    pub fn drag_press(&mut self, source_pos: usize, at: Point) -> bool {
        self.drag.press(self.sync.doc(), source_pos, at)
    }

    pub fn drag_move(&mut self, layout: &RenderedLayout, at: Point) -> Option<DropTarget> {
        self.drag.pointer_move(self.sync.doc(), layout, at)
    }

    /// Finish a drag, moving the block as one undoable change
    pub fn drag_drop(&mut self) -> Result<Patch, DragAborted> {
        let tx = self.drag.drop(self.sync.doc())?;
        self.dispatch(tx).map_err(|err| {
            log::warn!("drop rejected: {err}");
            DragAborted::Rejected(err)
        })
    }

    pub fn drag_cancel(&mut self) {
        self.drag.cancel();
    }

    pub fn dialog(&self) -> &DialogState {
        &self.dialog
    }

    pub fn dialog_mut(&mut self) -> &mut DialogState {
        &mut self.dialog
    }

    pub fn open_link_editor(&mut self) -> bool {
        self.dialog = DialogState::link_editor(self.sync.doc(), self.selection());
        self.dialog.is_open()
    }

    pub fn open_image_dialog(&mut self) {
        self.dialog = DialogState::image_insert(self.sync.doc(), self.selection());
    }

    pub fn confirm_dialog(&mut self) -> Option<Patch> {
        let cmd = self.dialog.confirm()?;
        self.apply(cmd)
    }

    pub fn close_dialog(&mut self) {
        self.dialog.close();
    }

    /// Where the formatting menu goes for the current selection. Hidden while
    /// dragging or while a dialog is open.
    pub fn menu_position(
        &self,
        layout: &RenderedLayout,
        container: Rect,
        size: MenuSize,
    ) -> MenuPlacement {
        if self.drag.is_dragging() || self.dialog.is_open() {
            return MenuPlacement::Hidden;
        }
        let selection = self.selection();
        let anchor = bounding_rect_for_range(self.doc(), layout, selection.from(), selection.to());
        compute_menu_position(anchor, container, size, self.menu)
    }
}

/// Ranges of the final document written by a sequence of steps
fn changed_ranges(maps: &[StepMap]) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = Vec::new();
    for map in maps {
        for range in &mut ranges {
            let start = map.map(range.start, Bias::Backward);
            let end = map.map(range.end, Bias::Forward);
            *range = start..end.max(start);
        }
        ranges.push(map.start..map.start + map.new_size);
    }
    ranges.sort_by_key(|range| range.start);
    ranges.dedup();
    ranges
}
