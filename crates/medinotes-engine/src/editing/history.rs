//! Bounded undo/redo stacks of inverse transactions.

use std::collections::VecDeque;

use crate::editing::selection::Selection;
use crate::editing::transaction::Transaction;

/// One undoable change: the transaction that reverts it, plus the selection to
/// restore alongside
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub transaction: Transaction,
    pub selection: Selection,
}

#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
        }
    }

    /// Record a local edit. Any redo entries are discarded; the oldest undo entry
    /// falls off once the limit is reached.
    pub fn record(&mut self, inverse: Transaction, selection_before: Selection) {
        if self.limit == 0 || inverse.is_empty() {
            return;
        }
        self.redo.clear();
        if self.undo.len() == self.limit {
            self.undo.pop_front();
        }
        self.undo.push_back(HistoryEntry {
            transaction: inverse,
            selection: selection_before,
        });
    }

    pub fn pop_undo(&mut self) -> Option<HistoryEntry> {
        self.undo.pop_back()
    }

    pub fn pop_redo(&mut self) -> Option<HistoryEntry> {
        self.redo.pop()
    }

    /// Push the inverse of an undo so it can be redone
    pub fn push_redo(&mut self, entry: HistoryEntry) {
        self.redo.push(entry);
    }

    /// Push the inverse of a redo without clearing the redo stack
    pub fn push_undo(&mut self, entry: HistoryEntry) {
        if self.limit == 0 {
            return;
        }
        if self.undo.len() == self.limit {
            self.undo.pop_front();
        }
        self.undo.push_back(entry);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
