use std::ops::Range;

use crate::editing::document::{Document, Node, NodeKind};
use crate::editing::marks::{Mark, MarkType};
use crate::editing::schema;
use crate::editing::selection::Selection;
use crate::editing::step::Step;
use crate::editing::transaction::{Transaction, TransactionError};

/// Editing commands that UI input is translated into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Insert text carrying `marks` at an absolute position
    InsertText {
        at: usize,
        text: String,
        marks: Vec<Mark>,
    },
    /// Replace the selection with typed text, inheriting marks from the character
    /// before the cursor
    TypeText { text: String },
    InsertNodes { at: usize, nodes: Vec<Node> },
    DeleteRange { range: Range<usize> },
    DeleteSelection,
    /// Backspace: delete the character before the cursor, or join with the
    /// previous block at a block start
    DeleteBackward,
    /// Enter: split the block at the cursor
    SplitBlock,
    SetMark { range: Range<usize>, mark: Mark },
    RemoveMark {
        range: Range<usize>,
        mark_type: MarkType,
    },
    /// Apply `mark` to the selection, or remove it when the whole selection
    /// already carries it
    ToggleMark { mark: Mark },
    /// Change the block at `at` to `kind`, keeping its content
    SetBlockType { at: usize, kind: NodeKind },
    ToggleTask { at: usize },
    /// Set (or with `None`, clear) a link over a range
    SetLink {
        range: Range<usize>,
        href: Option<String>,
    },
}

/// Turn a command into a transaction against `doc` with the current `selection`
pub fn compile_command(
    doc: &Document,
    selection: Selection,
    cmd: &Cmd,
) -> Result<Transaction, TransactionError> {
    let tx = match cmd {
        Cmd::InsertText { at, text, marks } => {
            if text.is_empty() {
                return Ok(Transaction::new());
            }
            Transaction::from(Step::Insert {
                pos: *at,
                nodes: vec![Node::marked_text(text.clone(), marks.iter().cloned())],
            })
        }
        Cmd::TypeText { text } => type_text(doc, selection, text)?,
        Cmd::InsertNodes { at, nodes } => Transaction::from(Step::Insert {
            pos: *at,
            nodes: nodes.clone(),
        }),
        Cmd::DeleteRange { range } => Transaction::from(Step::Delete {
            from: range.start,
            to: range.end,
        }),
        Cmd::DeleteSelection => delete_selection(selection),
        Cmd::DeleteBackward => delete_backward(doc, selection)?,
        Cmd::SplitBlock => {
            let tx = delete_selection(selection);
            tx.step(Step::Split {
                pos: selection.from(),
            })
        }
        Cmd::SetMark { range, mark } => Transaction::from(Step::SetMark {
            from: range.start,
            to: range.end,
            mark: mark.clone(),
        }),
        Cmd::RemoveMark { range, mark_type } => Transaction::from(Step::RemoveMark {
            from: range.start,
            to: range.end,
            mark_type: *mark_type,
        }),
        Cmd::ToggleMark { mark } => {
            if selection.is_empty() {
                return Ok(Transaction::new());
            }
            let (from, to) = (selection.from(), selection.to());
            let step = if range_has_mark(doc, from, to, mark.mark_type()) {
                Step::RemoveMark {
                    from,
                    to,
                    mark_type: mark.mark_type(),
                }
            } else {
                Step::SetMark {
                    from,
                    to,
                    mark: mark.clone(),
                }
            };
            Transaction::from(step).with_selection(selection)
        }
        Cmd::SetBlockType { at, kind } => Transaction::from(Step::ReplaceNode {
            pos: *at,
            node: Node::element(kind.clone(), Vec::new()),
        }),
        Cmd::ToggleTask { at } => {
            let Some(Node::Element(item)) = doc.node_at(*at) else {
                return Err(TransactionError::InvalidPosition { pos: *at });
            };
            let NodeKind::TaskItem { checked } = item.kind else {
                return Err(TransactionError::InvalidPosition { pos: *at });
            };
            Transaction::from(Step::ReplaceNode {
                pos: *at,
                node: Node::element(NodeKind::TaskItem { checked: !checked }, item.content.clone()),
            })
            .with_selection(selection)
        }
        Cmd::SetLink { range, href } => {
            let step = match href {
                Some(href) => Step::SetMark {
                    from: range.start,
                    to: range.end,
                    mark: Mark::link(href.clone()),
                },
                None => Step::RemoveMark {
                    from: range.start,
                    to: range.end,
                    mark_type: MarkType::Link,
                },
            };
            Transaction::from(step)
        }
    };
    Ok(tx)
}

fn delete_selection(selection: Selection) -> Transaction {
    if selection.is_empty() {
        return Transaction::new();
    }
    Transaction::from(Step::Delete {
        from: selection.from(),
        to: selection.to(),
    })
}

fn type_text(
    doc: &Document,
    selection: Selection,
    text: &str,
) -> Result<Transaction, TransactionError> {
    let at = selection.from();
    let resolved = doc.resolve(at)?;
    if !resolved.parent(doc).kind.is_textblock() {
        return Err(TransactionError::InvalidPosition { pos: at });
    }
    let tx = delete_selection(selection);
    if text.is_empty() {
        return Ok(tx);
    }
    let marks = marks_before(doc, at);
    Ok(tx.step(Step::Insert {
        pos: at,
        nodes: vec![Node::marked_text(text, marks)],
    }))
}

/// Marks of the character directly before `pos` in its textblock
fn marks_before(doc: &Document, pos: usize) -> Vec<Mark> {
    let Ok(resolved) = doc.resolve(pos) else {
        return Vec::new();
    };
    let parent = resolved.parent(doc);
    if resolved.parent_offset == 0 || !schema::allows_marks(&parent.kind) {
        return Vec::new();
    }
    let (index, _) = parent.child_at_offset(resolved.parent_offset - 1);
    match parent.content.get(index) {
        Some(Node::Text(run)) => run.marks.iter().cloned().collect(),
        _ => Vec::new(),
    }
}

fn delete_backward(doc: &Document, selection: Selection) -> Result<Transaction, TransactionError> {
    if !selection.is_empty() {
        return Ok(delete_selection(selection));
    }
    let cursor = selection.head;
    let resolved = doc.resolve(cursor)?;
    if !resolved.parent(doc).kind.is_textblock() {
        return Ok(Transaction::new());
    }
    if resolved.parent_offset > 0 {
        return Ok(Transaction::from(Step::Delete {
            from: cursor - 1,
            to: cursor,
        }));
    }

    let depth = resolved.depth();
    let Some(&index) = depth.checked_sub(1).and_then(|d| resolved.path.get(d)) else {
        return Ok(Transaction::new());
    };

    // An atom directly before the block is removed on its own
    let container = resolved.node_at_depth(doc, depth - 1);
    let before = resolved.before(depth);
    if index > 0
        && let Some(Node::Element(previous)) = container.content.get(index - 1)
        && previous.kind.is_atom()
    {
        return Ok(Transaction::from(Step::Delete {
            from: before - 2,
            to: before,
        }));
    }

    let previous_end = doc
        .textblocks()
        .into_iter()
        .map(|(start, block)| start + block.content_size())
        .take_while(|end| *end < cursor)
        .last();
    Ok(match previous_end {
        Some(end) => Transaction::from(Step::Delete {
            from: end,
            to: cursor,
        }),
        None => Transaction::new(),
    })
}

/// Whether every character in `from..to` that can carry marks has one of
/// `mark_type`
pub fn range_has_mark(doc: &Document, from: usize, to: usize, mark_type: MarkType) -> bool {
    let mut seen = false;
    for (start, block) in doc.textblocks() {
        if !schema::allows_marks(&block.kind) {
            continue;
        }
        let mut run_start = start;
        for node in &block.content {
            let run_end = run_start + node.node_size();
            if let Node::Text(run) = node
                && run_end > from
                && run_start < to
            {
                if !run.marks.has_type(mark_type) {
                    return false;
                }
                seen = true;
            }
            run_start = run_end;
        }
    }
    seen
}
