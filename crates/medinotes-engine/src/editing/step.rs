use crate::editing::document::{Document, Node};
use crate::editing::marks::{Mark, MarkType};
use crate::editing::position::Bias;
use crate::editing::selection::Selection;
use crate::editing::transaction::TransactionError;
use crate::editing::transform::{self, Plan};

/// One primitive edit. Transactions are ordered lists of steps; each step is
/// applied to the document produced by the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Insert whole nodes (text runs or blocks) at a position
    Insert { pos: usize, nodes: Vec<Node> },
    /// Remove a range, merging whatever the range cuts open
    Delete { from: usize, to: usize },
    SetMark { from: usize, to: usize, mark: Mark },
    RemoveMark {
        from: usize,
        to: usize,
        mark_type: MarkType,
    },
    /// Replace the node starting at `pos`
    ReplaceNode { pos: usize, node: Node },
    /// Split the textblock (or list item) containing `pos`
    Split { pos: usize },
    /// Raw replacement of sibling content between two positions of one parent.
    /// Produced as the inverse of every other step.
    Replace {
        from: usize,
        to: usize,
        content: Vec<Node>,
    },
}

/// How positions move across one applied step.
///
/// `start..start + old_size` in the old document became `start..start + new_size`
/// in the new one; everything before is untouched and everything after shifts by
/// the size difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepMap {
    pub start: usize,
    pub old_size: usize,
    pub new_size: usize,
}

impl StepMap {
    /// Map `pos` from the old document into the new one. Positions inside a
    /// changed range collapse to its start or end depending on `bias`; positions
    /// inside a range whose size did not change (mark edits) stay put.
    pub fn map(&self, pos: usize, bias: Bias) -> usize {
        let old_end = self.start + self.old_size;
        if pos < self.start || (pos == self.start && bias == Bias::Backward) {
            return pos;
        }
        if pos > old_end {
            return pos - self.old_size + self.new_size;
        }
        if self.old_size == self.new_size {
            return pos;
        }
        match bias {
            Bias::Backward if pos < old_end || self.old_size == 0 => self.start,
            _ => self.start + self.new_size,
        }
    }
}

/// Outcome of applying one step
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub doc: Document,
    /// Step that turns `doc` back into the input document
    pub inverse: Step,
    pub map: StepMap,
    pub selection: Selection,
}

impl Step {
    pub fn apply(&self, doc: &Document) -> Result<StepResult, TransactionError> {
        let plan = self.plan(doc)?;
        let (new_doc, inverse) = transform::apply_replacement(doc, &plan.replacement)?;

        let touched = plan.touched.len();
        let grown = new_doc.size() + touched;
        let map = StepMap {
            start: plan.touched.start,
            old_size: touched,
            new_size: grown.saturating_sub(doc.size()),
        };
        let selection = plan.selection.resolve(&new_doc);

        log::trace!("applied {self:?}, size {} -> {}", doc.size(), new_doc.size());
        Ok(StepResult {
            doc: new_doc,
            inverse: Step::Replace {
                from: inverse.from,
                to: inverse.to,
                content: inverse.content,
            },
            map,
            selection,
        })
    }

    fn plan(&self, doc: &Document) -> Result<Plan, TransactionError> {
        match self {
            Step::Insert { pos, nodes } => transform::plan_insert(doc, *pos, nodes),
            Step::Delete { from, to } => transform::plan_delete(doc, *from, *to),
            Step::SetMark { from, to, mark } => {
                transform::plan_marks(doc, *from, *to, &|marks| marks.with(mark.clone()))
            }
            Step::RemoveMark {
                from,
                to,
                mark_type,
            } => transform::plan_marks(doc, *from, *to, &|marks| marks.without(*mark_type)),
            Step::ReplaceNode { pos, node } => transform::plan_replace_node(doc, *pos, node),
            Step::Split { pos } => transform::plan_split(doc, *pos),
            Step::Replace { from, to, content } => transform::plan_replace(doc, *from, *to, content),
        }
    }
}
