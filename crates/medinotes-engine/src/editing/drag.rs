//! Block drag-reorder gesture: `Idle -> Armed -> Dragging -> Idle`.
//!
//! Nothing touches the document until the drop. While dragging, every pointer
//! move recomputes the drop target from scratch; the drop then turns the session
//! into one transaction (delete source, insert snapshot) so that undo reverts the
//! move as a unit.

use crate::editing::document::{Document, Node};
use crate::editing::position::Bias;
use crate::editing::schema;
use crate::editing::step::Step;
use crate::editing::transaction::{Applied, Transaction, TransactionError};
use crate::layout::hit_test::RenderedLayout;
use crate::layout::rect::{Point, Rect};

/// Drag distance (in layout units) used when the host does not configure one
pub const DEFAULT_DRAG_THRESHOLD: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropSide {
    Before,
    After,
}

/// Where the dragged block would land, and the indicator line to draw for it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropTarget {
    pub pos: usize,
    pub side: DropSide,
    pub indicator: Rect,
}

/// One drag gesture in progress
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub source_pos: usize,
    /// Full copy of the dragged block, taken at drag start
    pub source_node: Node,
    pub drop_target: Option<DropTarget>,
}

impl DragSession {
    fn source_end(&self) -> usize {
        self.source_pos + self.source_node.node_size()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Pointer is down on a handle but has not moved far enough yet
    Armed { origin: Point, source_pos: usize },
    Dragging(DragSession),
}

/// Why a drop produced no transaction. Never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DragAborted {
    #[error("no drag in progress")]
    NotDragging,
    #[error("no valid drop target")]
    NoTarget,
    #[error("block dropped at its own position")]
    SamePosition,
    #[error("dragged block no longer matches the document")]
    SourceChanged,
    #[error("move rejected: {0}")]
    Rejected(#[from] TransactionError),
}

#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
    threshold: f32,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(DEFAULT_DRAG_THRESHOLD)
    }
}

impl DragController {
    pub fn new(threshold: f32) -> Self {
        Self {
            state: DragState::Idle,
            threshold,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Dragging(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Pointer down on the handle of the block starting at `source_pos`. Returns
    /// whether a drag was armed.
    pub fn press(&mut self, doc: &Document, source_pos: usize, at: Point) -> bool {
        if !matches!(self.state, DragState::Idle) {
            return false;
        }
        if !matches!(doc.node_at(source_pos), Some(Node::Element(_))) {
            return false;
        }
        log::debug!("drag armed at {source_pos}");
        self.state = DragState::Armed {
            origin: at,
            source_pos,
        };
        true
    }

    /// Pointer moved. Starts the drag once past the threshold, then recomputes the
    /// drop target.
    pub fn pointer_move(
        &mut self,
        doc: &Document,
        layout: &RenderedLayout,
        at: Point,
    ) -> Option<DropTarget> {
        if let DragState::Armed { origin, source_pos } = self.state {
            if origin.distance(at) <= self.threshold {
                return None;
            }
            let Some(source_node) = doc.node_at(source_pos).cloned() else {
                self.state = DragState::Idle;
                return None;
            };
            log::debug!("drag started for {} at {source_pos}", source_node.node_type());
            self.state = DragState::Dragging(DragSession {
                source_pos,
                source_node,
                drop_target: None,
            });
        }

        let DragState::Dragging(session) = &mut self.state else {
            return None;
        };
        session.drop_target = find_drop_target(doc, layout, session, at);
        session.drop_target
    }

    /// Release the pointer. A drop always ends the gesture; the transaction is
    /// only produced for a real move.
    pub fn drop(&mut self, doc: &Document) -> Result<Transaction, DragAborted> {
        let state = std::mem::take(&mut self.state);
        let DragState::Dragging(session) = state else {
            return Err(DragAborted::NotDragging);
        };
        let target = session.drop_target.ok_or(DragAborted::NoTarget)?;
        if target.pos == session.source_pos || target.pos == session.source_end() {
            return Err(DragAborted::SamePosition);
        }

        // Edits made during the drag are mapped in by `map_through`
        if doc.node_at(session.source_pos) != Some(&session.source_node) {
            log::warn!("drag source at {} out of date", session.source_pos);
            return Err(DragAborted::SourceChanged);
        }

        let delete = Step::Delete {
            from: session.source_pos,
            to: session.source_end(),
        };
        let removed = delete.apply(doc).map_err(|err| {
            log::warn!("drag source could not be removed: {err}");
            DragAborted::Rejected(err)
        })?;
        let adjusted = removed.map.map(target.pos, Bias::Backward);
        log::debug!(
            "drop {} from {} to {} (adjusted {adjusted})",
            session.source_node.node_type(),
            session.source_pos,
            target.pos
        );
        let insert = Step::Insert {
            pos: adjusted,
            nodes: vec![session.source_node],
        };
        Ok(Transaction::from_steps(vec![delete, insert]))
    }

    /// Follow a change committed while a gesture is in progress. The gesture is
    /// cancelled when the dragged block does not survive the change intact.
    pub fn map_through(&mut self, applied: &Applied) {
        let doc = &applied.doc;
        let keep = match &mut self.state {
            DragState::Idle => true,
            DragState::Armed { source_pos, .. } => {
                let pos = applied.map(*source_pos, Bias::Forward);
                *source_pos = pos;
                matches!(doc.node_at(pos), Some(Node::Element(_)))
            }
            DragState::Dragging(session) => {
                let start = applied.map(session.source_pos, Bias::Forward);
                let end = applied.map(session.source_end(), Bias::Backward);
                match doc.node_at(start) {
                    Some(node @ Node::Element(_)) if start + node.node_size() == end => {
                        session.source_pos = start;
                        session.source_node = node.clone();
                        let target = session.drop_target.and_then(|target| {
                            let pos = applied.map(target.pos, Bias::Backward);
                            accepts_drop(doc, session, pos).then_some(DropTarget { pos, ..target })
                        });
                        session.drop_target = target;
                        true
                    }
                    _ => false,
                }
            }
        };
        if !keep {
            log::debug!("dragged block removed by an edit");
            self.cancel();
        }
    }

    /// Abandon the gesture without touching the document
    pub fn cancel(&mut self) {
        if !matches!(self.state, DragState::Idle) {
            log::debug!("drag cancelled");
        }
        self.state = DragState::Idle;
    }
}

/// Hit-test the blocks under `at` from the innermost outwards and take the first
/// one the dragged block may be dropped next to
fn find_drop_target(
    doc: &Document,
    layout: &RenderedLayout,
    session: &DragSession,
    at: Point,
) -> Option<DropTarget> {
    layout.blocks_at(at).into_iter().find_map(|block| {
        let node = doc.node_at(block.pos)?;
        let (pos, side, y) = if at.y < block.rect.center_y() {
            (block.pos, DropSide::Before, block.rect.top())
        } else {
            (
                block.pos + node.node_size(),
                DropSide::After,
                block.rect.bottom(),
            )
        };

        accepts_drop(doc, session, pos).then(|| DropTarget {
            pos,
            side,
            indicator: Rect::new(block.rect.left(), y, block.rect.width, 0.0),
        })
    })
}

/// Whether the dragged block may be inserted at `pos`
fn accepts_drop(doc: &Document, session: &DragSession, pos: usize) -> bool {
    // Never inside the dragged block itself
    if pos > session.source_pos && pos < session.source_end() {
        return false;
    }
    doc.resolve(pos).is_ok_and(|resolved| {
        schema::accepts(&resolved.parent(doc).kind, session.source_node.node_type())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::hit_test::BlockBox;
    use pretty_assertions::assert_eq;

    fn p(text: &str) -> Node {
        Node::paragraph(vec![Node::text(text)])
    }

    fn doc() -> Document {
        // one 0..5, two 5..10, three 10..17
        Document::new(vec![p("one"), p("two"), p("three")]).unwrap()
    }

    fn layout() -> RenderedLayout {
        RenderedLayout::new(
            Vec::new(),
            vec![
                BlockBox::new(0, Rect::new(0.0, 0.0, 100.0, 10.0)),
                BlockBox::new(5, Rect::new(0.0, 10.0, 100.0, 10.0)),
                BlockBox::new(10, Rect::new(0.0, 20.0, 100.0, 10.0)),
            ],
        )
    }

    fn start_drag(controller: &mut DragController, doc: &Document, source: usize, y: f32) {
        assert!(controller.press(doc, source, Point::new(-5.0, y)));
        controller.pointer_move(doc, &layout(), Point::new(-5.0, y + 4.0));
        assert!(controller.is_dragging());
    }

    #[test]
    fn test_small_moves_do_not_start_drag() {
        let doc = doc();
        let mut controller = DragController::new(3.0);
        controller.press(&doc, 5, Point::new(0.0, 15.0));
        controller.pointer_move(&doc, &layout(), Point::new(1.0, 16.0));
        assert!(matches!(controller.state(), DragState::Armed { .. }));
    }

    #[test]
    fn test_press_inside_text_is_ignored() {
        let mut controller = DragController::default();
        assert!(!controller.press(&doc(), 2, Point::default()));
        assert_eq!(controller.state(), &DragState::Idle);
    }

    #[test]
    fn test_drag_second_paragraph_before_first() {
        let doc = doc();
        let mut controller = DragController::default();
        start_drag(&mut controller, &doc, 5, 15.0);

        let target = controller.pointer_move(&doc, &layout(), Point::new(50.0, 2.0));
        assert_eq!(
            target,
            Some(DropTarget {
                pos: 0,
                side: DropSide::Before,
                indicator: Rect::new(0.0, 0.0, 100.0, 0.0),
            })
        );

        let tx = controller.drop(&doc).unwrap();
        let applied = tx.apply(&doc).unwrap();
        assert_eq!(
            applied.doc,
            Document::new(vec![p("two"), p("one"), p("three")]).unwrap()
        );
        assert_eq!(applied.inverse.apply(&applied.doc).unwrap().doc, doc);
        assert_eq!(controller.state(), &DragState::Idle);
    }

    #[test]
    fn test_drag_forward_adjusts_for_removed_source() {
        let doc = doc();
        let mut controller = DragController::default();
        start_drag(&mut controller, &doc, 0, 5.0);

        // lower half of "three": after it, position 17 before the delete
        let target = controller.pointer_move(&doc, &layout(), Point::new(50.0, 28.0));
        assert_eq!(target.map(|t| t.pos), Some(17));

        let tx = controller.drop(&doc).unwrap();
        assert_eq!(
            tx.steps()[1],
            Step::Insert {
                pos: 12,
                nodes: vec![p("one")],
            }
        );
        assert_eq!(
            tx.apply(&doc).unwrap().doc,
            Document::new(vec![p("two"), p("three"), p("one")]).unwrap()
        );
    }

    #[test]
    fn test_drop_on_own_position_is_no_op() {
        let doc = doc();
        let mut controller = DragController::default();
        start_drag(&mut controller, &doc, 5, 15.0);

        // upper half of itself
        controller.pointer_move(&doc, &layout(), Point::new(50.0, 12.0));
        assert_eq!(controller.drop(&doc), Err(DragAborted::SamePosition));
    }

    #[test]
    fn test_drop_without_target_is_no_op() {
        let doc = doc();
        let mut controller = DragController::default();
        start_drag(&mut controller, &doc, 5, 15.0);

        controller.pointer_move(&doc, &layout(), Point::new(50.0, 90.0));
        assert_eq!(controller.drop(&doc), Err(DragAborted::NoTarget));
        assert_eq!(controller.state(), &DragState::Idle);
    }

    #[test]
    fn test_cancel_discards_session() {
        let doc = doc();
        let mut controller = DragController::default();
        start_drag(&mut controller, &doc, 5, 15.0);
        controller.pointer_move(&doc, &layout(), Point::new(50.0, 2.0));

        controller.cancel();
        assert_eq!(controller.drop(&doc), Err(DragAborted::NotDragging));
    }

    #[test]
    fn test_list_item_cannot_drop_between_paragraphs() {
        let doc = Document::new(vec![
            Node::bullet_list(vec![Node::list_item(vec![p("a")]), Node::list_item(vec![p("b")])]),
            p("c"),
        ])
        .unwrap();
        // list 0..12, item a 1..6, item b 6..11, c 12..15
        let layout = RenderedLayout::new(
            Vec::new(),
            vec![
                BlockBox::new(0, Rect::new(0.0, 0.0, 100.0, 20.0)),
                BlockBox::new(1, Rect::new(4.0, 0.0, 96.0, 10.0)),
                BlockBox::new(6, Rect::new(4.0, 10.0, 96.0, 10.0)),
                BlockBox::new(12, Rect::new(0.0, 20.0, 100.0, 10.0)),
            ],
        );
        let mut controller = DragController::default();
        assert!(controller.press(&doc, 6, Point::new(50.0, 15.0)));
        controller.pointer_move(&doc, &layout, Point::new(50.0, 2.0));
        assert_eq!(controller.session().and_then(|s| s.drop_target).map(|t| t.pos), Some(1));

        let target = controller.pointer_move(&doc, &layout, Point::new(50.0, 27.0));
        assert_eq!(target, None);
    }

    #[test]
    fn test_stale_document_is_refused() {
        let doc = doc();
        let mut controller = DragController::default();
        start_drag(&mut controller, &doc, 5, 15.0);
        controller.pointer_move(&doc, &layout(), Point::new(50.0, 2.0));

        let edited = Document::new(vec![p("one"), p("TWO"), p("three")]).unwrap();
        assert_eq!(controller.drop(&edited), Err(DragAborted::SourceChanged));
        assert_eq!(controller.state(), &DragState::Idle);
    }

    #[test]
    fn test_pointer_outside_blocks_horizontally_has_no_target() {
        let doc = doc();
        let mut controller = DragController::default();
        start_drag(&mut controller, &doc, 5, 15.0);

        for x in [-500.0, 100.0, 10_000.0] {
            assert_eq!(controller.pointer_move(&doc, &layout(), Point::new(x, 2.0)), None);
        }
        assert_eq!(controller.drop(&doc), Err(DragAborted::NoTarget));
    }

    #[test]
    fn test_edit_before_source_shifts_session() {
        let doc = doc();
        let mut controller = DragController::default();
        start_drag(&mut controller, &doc, 5, 15.0);
        controller.pointer_move(&doc, &layout(), Point::new(50.0, 28.0));

        // "one" becomes "Xone"
        let applied = Transaction::from(Step::Insert {
            pos: 1,
            nodes: vec![Node::text("X")],
        })
        .apply(&doc)
        .unwrap();
        controller.map_through(&applied);

        let session = controller.session().unwrap();
        assert_eq!(session.source_pos, 6);
        assert_eq!(session.drop_target.map(|t| t.pos), Some(18));

        let tx = controller.drop(&applied.doc).unwrap();
        assert_eq!(
            tx.apply(&applied.doc).unwrap().doc,
            Document::new(vec![p("Xone"), p("three"), p("two")]).unwrap()
        );
    }

    #[test]
    fn test_edit_inside_source_refreshes_snapshot() {
        let doc = doc();
        let mut controller = DragController::default();
        start_drag(&mut controller, &doc, 5, 15.0);
        controller.pointer_move(&doc, &layout(), Point::new(50.0, 2.0));

        let applied = Transaction::from(Step::Insert {
            pos: 9,
            nodes: vec![Node::text("s")],
        })
        .apply(&doc)
        .unwrap();
        controller.map_through(&applied);
        assert_eq!(controller.session().map(|s| &s.source_node), Some(&p("twos")));

        let tx = controller.drop(&applied.doc).unwrap();
        assert_eq!(
            tx.apply(&applied.doc).unwrap().doc,
            Document::new(vec![p("twos"), p("one"), p("three")]).unwrap()
        );
    }

    #[test]
    fn test_deleting_source_cancels_drag() {
        let doc = doc();
        let mut controller = DragController::default();
        start_drag(&mut controller, &doc, 5, 15.0);

        let applied = Transaction::from(Step::Delete { from: 5, to: 10 })
            .apply(&doc)
            .unwrap();
        controller.map_through(&applied);
        assert_eq!(controller.state(), &DragState::Idle);
    }
}
