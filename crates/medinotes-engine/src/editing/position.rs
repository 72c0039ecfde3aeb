use crate::editing::document::{Document, Element, Node};
use crate::editing::transaction::TransactionError;

/// Which way to lean when a position has to move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bias {
    #[default]
    Backward,
    Forward,
}

/// A position resolved against a document: the chain of elements that contain it.
///
/// Text nodes are never part of the path; a position inside a text run resolves to
/// the textblock holding that run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPos {
    pub pos: usize,
    /// Child index taken at each depth, from the root down to the parent
    pub path: Vec<usize>,
    /// Content start of the ancestor at each depth; `starts[0]` is the root's (0)
    starts: Vec<usize>,
    /// Offset of `pos` into the parent's content
    pub parent_offset: usize,
}

impl ResolvedPos {
    /// Depth of the innermost containing element (0 = the document itself)
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn parent<'a>(&self, doc: &'a Document) -> &'a Element {
        element_at_path(doc.root(), &self.path)
    }

    pub fn node_at_depth<'a>(&self, doc: &'a Document, depth: usize) -> &'a Element {
        element_at_path(doc.root(), &self.path[..depth])
    }

    /// Content start of the ancestor at `depth`
    pub fn start(&self, depth: usize) -> usize {
        self.starts[depth]
    }

    /// Position directly before the ancestor at `depth` (depth must be at least 1)
    pub fn before(&self, depth: usize) -> usize {
        self.starts[depth] - 1
    }

    /// Position directly after the ancestor at `depth` (depth must be at least 1)
    pub fn after(&self, doc: &Document, depth: usize) -> usize {
        self.before(depth) + self.node_at_depth(doc, depth).content_size() + 2
    }

    /// Number of leading path entries shared with `other`
    pub fn shared_depth(&self, other: &ResolvedPos) -> usize {
        self.path
            .iter()
            .zip(&other.path)
            .take_while(|(a, b)| a == b)
            .count()
    }
}

pub(crate) fn element_at_path<'a>(root: &'a Element, path: &[usize]) -> &'a Element {
    let mut element = root;
    for &index in path {
        match element.content.get(index) {
            Some(Node::Element(child)) => element = child,
            _ => break,
        }
    }
    element
}

impl Document {
    /// Resolve `pos` into its containing elements
    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos, TransactionError> {
        if pos > self.size() {
            return Err(TransactionError::InvalidPosition { pos });
        }

        let mut path = Vec::new();
        let mut starts = vec![0];
        let mut element = self.root();
        let mut start = 0;

        'descend: loop {
            let mut child_start = start;
            for (index, child) in element.content.iter().enumerate() {
                if child_start >= pos {
                    break;
                }
                let child_end = child_start + child.node_size();
                if let Node::Element(inner) = child
                    && pos < child_end
                {
                    path.push(index);
                    start = child_start + 1;
                    starts.push(start);
                    element = inner;
                    continue 'descend;
                }
                child_start = child_end;
            }
            break;
        }

        Ok(ResolvedPos {
            pos,
            path,
            starts,
            parent_offset: pos - start,
        })
    }

    /// Whether a collapsed cursor can rest at `pos` (inside a textblock)
    pub fn is_cursor_position(&self, pos: usize) -> bool {
        self.resolve(pos)
            .map(|resolved| resolved.parent(self).kind.is_textblock())
            .unwrap_or(false)
    }

    /// The valid cursor position closest to `pos`.
    ///
    /// Ties between the end of one textblock and the start of the next are broken by
    /// `bias`. Documents without any textblock fall back to `pos` clamped to the
    /// document.
    pub fn nearest_cursor_position(&self, pos: usize, bias: Bias) -> usize {
        let mut best: Option<(usize, usize)> = None;
        for (start, element) in self.textblocks() {
            let end = start + element.content_size();
            if (start..=end).contains(&pos) {
                return pos;
            }
            let candidate = if pos < start { start } else { end };
            let distance = candidate.abs_diff(pos);
            let better = match best {
                None => true,
                Some((_, best_distance)) if distance < best_distance => true,
                Some((best_candidate, best_distance)) if distance == best_distance => match bias {
                    Bias::Backward => candidate < best_candidate,
                    Bias::Forward => candidate > best_candidate,
                },
                Some(_) => false,
            };
            if better {
                best = Some((candidate, distance));
            }
        }
        best.map(|(candidate, _)| candidate)
            .unwrap_or_else(|| pos.min(self.size()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::document::{Node, NodeKind};
    use pretty_assertions::assert_eq;

    fn doc() -> Document {
        // 0 <p> 1 "Hi" 3 </p> 4 <ul> 5 <li> 6 <p> 7 "Yo" 9 </p> 10 </li> 11 </ul> 12 <hr> 14
        Document::new(vec![
            Node::paragraph(vec![Node::text("Hi")]),
            Node::bullet_list(vec![Node::list_item(vec![Node::paragraph(vec![
                Node::text("Yo"),
            ])])]),
            Node::horizontal_rule(),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_inside_text() {
        let doc = doc();
        let resolved = doc.resolve(2).unwrap();
        assert_eq!(resolved.path, vec![0]);
        assert_eq!(resolved.parent_offset, 1);
        assert_eq!(resolved.parent(&doc).kind, NodeKind::Paragraph);
    }

    #[test]
    fn test_resolve_block_boundaries_stay_in_parent() {
        let doc = doc();
        let resolved = doc.resolve(4).unwrap();
        assert_eq!(resolved.depth(), 0);
        assert_eq!(resolved.parent_offset, 4);

        let resolved = doc.resolve(5).unwrap();
        assert_eq!(resolved.path, vec![1]);
        assert_eq!(resolved.parent(&doc).kind, NodeKind::BulletList);
    }

    #[test]
    fn test_resolve_nested_textblock() {
        let doc = doc();
        let resolved = doc.resolve(8).unwrap();
        assert_eq!(resolved.path, vec![1, 0, 0]);
        assert_eq!(resolved.start(3), 7);
        assert_eq!(resolved.before(1), 4);
        assert_eq!(resolved.after(&doc, 1), 12);
    }

    #[test]
    fn test_resolve_out_of_range() {
        assert_eq!(
            doc().resolve(15),
            Err(TransactionError::InvalidPosition { pos: 15 })
        );
    }

    #[test]
    fn test_nearest_cursor_position() {
        let doc = doc();
        assert_eq!(doc.nearest_cursor_position(2, Bias::Backward), 2);
        assert_eq!(doc.nearest_cursor_position(0, Bias::Backward), 1);
        // 4 is 1 away from the end of "Hi" (3) and 3 away from "Yo" (7)
        assert_eq!(doc.nearest_cursor_position(4, Bias::Forward), 3);
        // past the rule: back to the end of "Yo"
        assert_eq!(doc.nearest_cursor_position(14, Bias::Forward), 9);
    }

    #[test]
    fn test_nearest_cursor_position_tie_uses_bias() {
        let doc = Document::new(vec![
            Node::paragraph(vec![Node::text("a")]),
            Node::paragraph(vec![Node::text("b")]),
        ])
        .unwrap();
        // 0 <p> 1 a 2 </p> 3 <p> 4 b 5 </p> 6 ; position 3 is 1 from 2 and 1 from 4
        assert_eq!(doc.nearest_cursor_position(3, Bias::Backward), 2);
        assert_eq!(doc.nearest_cursor_position(3, Bias::Forward), 4);
    }

    #[test]
    fn test_is_cursor_position() {
        let doc = doc();
        assert!(doc.is_cursor_position(1));
        assert!(!doc.is_cursor_position(4));
        assert!(!doc.is_cursor_position(13));
    }
}
