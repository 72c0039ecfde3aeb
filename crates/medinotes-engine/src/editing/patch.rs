use std::ops::Range;

use crate::editing::selection::Selection;

/// Result of applying a transaction through the editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Ranges of the new document that were written
    pub changed: Vec<Range<usize>>,
    pub new_selection: Selection,
    pub version: u64,
}
