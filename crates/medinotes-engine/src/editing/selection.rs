use std::ops::Range;

use crate::editing::document::Document;
use crate::editing::position::Bias;

/// Anchor/head pair of positions; equal positions denote a collapsed cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn cursor(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    /// Collapsed cursor at the valid position nearest to `pos`
    pub fn near(doc: &Document, pos: usize, bias: Bias) -> Self {
        Self::cursor(doc.nearest_cursor_position(pos, bias))
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn range(&self) -> Range<usize> {
        self.from()..self.to()
    }

    /// Re-resolve both ends against `doc`: positions that are still valid cursor
    /// positions are kept, others fall back to the nearest valid one
    pub fn resolve_in(&self, doc: &Document) -> Self {
        let fix = |pos: usize, bias: Bias| {
            if doc.is_cursor_position(pos) {
                pos
            } else {
                doc.nearest_cursor_position(pos, bias)
            }
        };
        if self.is_empty() {
            return Self::cursor(fix(self.head, Bias::Backward));
        }
        let (anchor_bias, head_bias) = if self.anchor <= self.head {
            (Bias::Forward, Bias::Backward)
        } else {
            (Bias::Backward, Bias::Forward)
        };
        Self::new(fix(self.anchor, anchor_bias), fix(self.head, head_bias))
    }
}
