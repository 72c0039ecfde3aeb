use crate::editing::document::{Document, NodeType};
use crate::editing::position::Bias;
use crate::editing::schema::SchemaError;
use crate::editing::selection::Selection;
use crate::editing::step::{Step, StepMap};

/// Why a transaction was rejected. The document is never modified when one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionError {
    #[error("position {pos} is not valid for this edit")]
    InvalidPosition { pos: usize },
    #[error("cannot convert {from} into {to}")]
    IncompatibleConversion { from: NodeType, to: NodeType },
    #[error("edit would break the document schema: {0}")]
    Schema(#[from] SchemaError),
}

/// Ordered list of steps applied atomically
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    steps: Vec<Step>,
    selection: Option<Selection>,
}

/// A successfully applied transaction
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub doc: Document,
    /// Transaction that restores the input document exactly
    pub inverse: Transaction,
    /// One map per step, in application order
    pub maps: Vec<StepMap>,
    pub selection: Selection,
}

impl Applied {
    /// Map a position from the input document through every step
    pub fn map(&self, pos: usize, bias: Bias) -> usize {
        self.maps.iter().fold(pos, |pos, map| map.map(pos, bias))
    }
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self {
            steps,
            selection: None,
        }
    }

    /// Builder-style step append
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Selection to use after applying, instead of the one the last step implies
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Apply every step in order. Either all steps succeed or `doc` is left as the
    /// only valid state and the first error is returned.
    pub fn apply(&self, doc: &Document) -> Result<Applied, TransactionError> {
        let mut current: Option<Document> = None;
        let mut inverse = Vec::with_capacity(self.steps.len());
        let mut maps = Vec::with_capacity(self.steps.len());
        let mut selection = None;

        for step in &self.steps {
            let result = step.apply(current.as_ref().unwrap_or(doc))?;
            inverse.push(result.inverse);
            maps.push(result.map);
            selection = Some(result.selection);
            current = Some(result.doc);
        }

        let doc = current.unwrap_or_else(|| doc.clone());
        let selection = match (self.selection, selection) {
            (Some(explicit), _) => explicit.resolve_in(&doc),
            (None, Some(implied)) => implied,
            (None, None) => Selection::near(&doc, 0, Bias::Forward),
        };
        inverse.reverse();

        Ok(Applied {
            doc,
            inverse: Transaction::from_steps(inverse),
            maps,
            selection,
        })
    }
}

impl From<Step> for Transaction {
    fn from(step: Step) -> Self {
        Transaction::from_steps(vec![step])
    }
}
