//! Tree surgery behind every edit step.
//!
//! Every primitive edit is planned as a [`Replacement`]: a run of siblings inside
//! one parent is swapped for new nodes. Planning is where the interesting work
//! happens (boundary healing for deletes, run splitting for marks); applying a
//! replacement is uniform, validates the parent against the schema, and yields the
//! exact inverse replacement for undo.

use std::ops::Range;

use crate::editing::document::{Document, Element, Node, NodeKind, TextRun, normalize_nodes};
use crate::editing::marks::{Mark, MarkSet, MarkType};
use crate::editing::position::{Bias, ResolvedPos};
use crate::editing::schema::{self, SchemaError};
use crate::editing::selection::Selection;
use crate::editing::step::Step;
use crate::editing::transaction::TransactionError;

/// Replace the siblings between `from` and `to` (which must share a parent) with
/// `content`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Replacement {
    pub from: usize,
    pub to: usize,
    pub content: Vec<Node>,
}

/// Where the selection lands once a plan has been applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectionHint {
    Cursor(usize, Bias),
    Range(usize, usize),
}

impl SelectionHint {
    pub(crate) fn resolve(self, doc: &Document) -> Selection {
        match self {
            SelectionHint::Cursor(pos, bias) => Selection::near(doc, pos, bias),
            SelectionHint::Range(anchor, head) => Selection::new(anchor, head).resolve_in(doc),
        }
    }
}

/// A planned edit: the replacement to perform, the range of the old document the
/// edit touches (used for position mapping), and the resulting selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Plan {
    pub replacement: Replacement,
    pub touched: Range<usize>,
    pub selection: SelectionHint,
}

impl Plan {
    fn new(replacement: Replacement, touched: Range<usize>, selection: SelectionHint) -> Self {
        Self {
            replacement,
            touched,
            selection,
        }
    }

    fn noop(pos: usize, selection: SelectionHint) -> Self {
        Self::new(
            Replacement {
                from: pos,
                to: pos,
                content: Vec::new(),
            },
            pos..pos,
            selection,
        )
    }
}

/// Result of one of the edit operations: the new document, the steps that undo
/// it, and where the selection lands
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub doc: Document,
    pub inverse: Vec<Step>,
    pub selection: Selection,
}

fn run(step: Step, doc: &Document) -> Result<Edit, TransactionError> {
    let result = step.apply(doc)?;
    Ok(Edit {
        doc: result.doc,
        inverse: vec![result.inverse],
        selection: result.selection,
    })
}

/// Insert whole nodes at `pos`. The node containing `pos` must accept every node.
pub fn insert(doc: &Document, pos: usize, nodes: Vec<Node>) -> Result<Edit, TransactionError> {
    run(Step::Insert { pos, nodes }, doc)
}

/// Delete `from..to`, merging the nodes cut open at either end
pub fn delete(doc: &Document, from: usize, to: usize) -> Result<Edit, TransactionError> {
    run(Step::Delete { from, to }, doc)
}

/// Apply `mark` to every character in `from..to`, splitting runs at the edges
pub fn set_mark(
    doc: &Document,
    from: usize,
    to: usize,
    mark: Mark,
) -> Result<Edit, TransactionError> {
    run(Step::SetMark { from, to, mark }, doc)
}

/// Strip marks of `mark_type` from every character in `from..to`
pub fn remove_mark(
    doc: &Document,
    from: usize,
    to: usize,
    mark_type: MarkType,
) -> Result<Edit, TransactionError> {
    run(Step::RemoveMark { from, to, mark_type }, doc)
}

/// Swap the node starting at `pos` for `node`, carrying the old content over when
/// `node` is given without content
pub fn replace_node(doc: &Document, pos: usize, node: Node) -> Result<Edit, TransactionError> {
    run(Step::ReplaceNode { pos, node }, doc)
}

/// Split the textblock (or list item) at `pos` in two
pub fn split_block(doc: &Document, pos: usize) -> Result<Edit, TransactionError> {
    run(Step::Split { pos }, doc)
}

// ---------------------------------------------------------------------------
// Applying replacements

/// Perform `replacement`, returning the new document and the replacement that
/// restores the old one
pub(crate) fn apply_replacement(
    doc: &Document,
    replacement: &Replacement,
) -> Result<(Document, Replacement), TransactionError> {
    let Replacement { from, to, content } = replacement;
    if from > to {
        return Err(TransactionError::InvalidPosition { pos: *from });
    }
    let start = doc.resolve(*from)?;
    let end = doc.resolve(*to)?;
    if start.path != end.path {
        return Err(TransactionError::InvalidPosition { pos: *to });
    }

    let parent = start.parent(doc);
    let (children, lo) = split_children_at(parent.content.clone(), start.parent_offset);
    let (mut children, hi) = split_children_at(children, end.parent_offset);

    let removed: Vec<Node> = children.splice(lo..hi, content.iter().cloned()).collect();
    let children = normalize_nodes(children);

    let mut path = start.path.clone();
    schema::validate_children(&parent.kind, &children, &mut path)?;
    if schema::requires_content(&parent.kind) && children.is_empty() {
        return Err(SchemaError::MissingContent {
            path: start.path.clone(),
            node: parent.kind.node_type(),
        }
        .into());
    }

    let inserted: usize = content.iter().map(Node::node_size).sum();
    let root = rebuild(doc.root(), &start.path, children);
    let inverse = Replacement {
        from: *from,
        to: *from + inserted,
        content: removed,
    };
    Ok((Document::from_valid_root(root), inverse))
}

/// Locate the child at `offset` inside `nodes`, as [`Element::child_at_offset`]
fn locate(nodes: &[Node], offset: usize) -> (usize, usize) {
    let mut start = 0;
    for (index, child) in nodes.iter().enumerate() {
        if offset == start {
            return (index, 0);
        }
        let end = start + child.node_size();
        if offset < end {
            return (index, offset - start);
        }
        start = end;
    }
    (nodes.len(), 0)
}

/// Make sure there is a child boundary at `offset`, splitting a text run if needed.
/// Returns the index of the child starting at that boundary.
fn split_children_at(mut nodes: Vec<Node>, offset: usize) -> (Vec<Node>, usize) {
    let (index, inner) = locate(&nodes, offset);
    if inner == 0 {
        return (nodes, index);
    }
    if let Node::Text(run) = &nodes[index] {
        let head = Node::Text(run.slice(0, inner));
        let tail = Node::Text(run.slice(inner, run.len()));
        nodes.splice(index..=index, [head, tail]);
        return (nodes, index + 1);
    }
    // Positions strictly inside an element resolve into it, so this is unreachable
    // for offsets produced by `Document::resolve`.
    (nodes, index)
}

fn rebuild(element: &Element, path: &[usize], content: Vec<Node>) -> Element {
    match path.split_first() {
        None => Element::new(element.kind.clone(), content),
        Some((&index, rest)) => {
            let mut children = element.content.clone();
            if let Some(Node::Element(child)) = element.content.get(index) {
                children[index] = Node::Element(rebuild(child, rest, content));
            }
            Element::new(element.kind.clone(), children)
        }
    }
}

// ---------------------------------------------------------------------------
// Planning

fn check_range(doc: &Document, from: usize, to: usize) -> Result<(), TransactionError> {
    if from > to {
        return Err(TransactionError::InvalidPosition { pos: from });
    }
    if to > doc.size() {
        return Err(TransactionError::InvalidPosition { pos: to });
    }
    Ok(())
}

pub(crate) fn plan_insert(
    doc: &Document,
    pos: usize,
    nodes: &[Node],
) -> Result<Plan, TransactionError> {
    let resolved = doc.resolve(pos)?;
    let parent = resolved.parent(doc);
    if nodes
        .iter()
        .any(|node| !schema::accepts(&parent.kind, node.node_type()))
    {
        return Err(TransactionError::InvalidPosition { pos });
    }
    let size: usize = nodes.iter().map(Node::node_size).sum();
    Ok(Plan::new(
        Replacement {
            from: pos,
            to: pos,
            content: nodes.to_vec(),
        },
        pos..pos,
        SelectionHint::Cursor(pos + size, Bias::Backward),
    ))
}

pub(crate) fn plan_replace(
    doc: &Document,
    from: usize,
    to: usize,
    content: &[Node],
) -> Result<Plan, TransactionError> {
    check_range(doc, from, to)?;
    let size: usize = content.iter().map(Node::node_size).sum();
    Ok(Plan::new(
        Replacement {
            from,
            to,
            content: content.to_vec(),
        },
        from..to,
        SelectionHint::Cursor(from + size, Bias::Backward),
    ))
}

pub(crate) fn plan_delete(doc: &Document, from: usize, to: usize) -> Result<Plan, TransactionError> {
    check_range(doc, from, to)?;
    let cursor = SelectionHint::Cursor(from, Bias::Backward);
    if from == to {
        return Ok(Plan::noop(from, cursor));
    }

    let start = doc.resolve(from)?;
    let end = doc.resolve(to)?;
    let depth = start.shared_depth(&end);
    let parent = start.node_at_depth(doc, depth);
    let parent_start = start.start(depth);
    let parent_end = parent_start + parent.content_size();

    if depth == start.depth() && depth == end.depth() {
        // Both ends sit directly in one parent: text, or whole sibling nodes
        if !parent.kind.is_textblock() && from == parent_start && to == parent_end {
            return empty_parent(doc, &start, depth, from, to);
        }
        return Ok(Plan::new(
            Replacement {
                from,
                to,
                content: Vec::new(),
            },
            from..to,
            cursor,
        ));
    }

    let (flat_from, left) = if start.depth() > depth {
        let before = start.before(depth + 1);
        let child = start.node_at_depth(doc, depth + 1);
        let open = start.depth() - depth;
        (before, Some((cut_after(child, from - before - 1), open)))
    } else {
        (from, None)
    };
    let (flat_to, right) = if end.depth() > depth {
        let before = end.before(depth + 1);
        let child = end.node_at_depth(doc, depth + 1);
        let open = end.depth() - depth;
        let after = before + child.content_size() + 2;
        (after, Some((cut_before(child, to - before - 1), open)))
    } else {
        (to, None)
    };

    let content = match (left, right) {
        (Some((left, l)), Some((right, r))) => join_open(&parent.kind, &left, l, &right, r)
            .unwrap_or_else(|| vec![Node::Element(left), Node::Element(right)]),
        (Some((left, _)), None) => vec![Node::Element(left)],
        (None, Some((right, _))) => vec![Node::Element(right)],
        (None, None) => Vec::new(),
    };
    let content = prune_empty(content);

    if content.is_empty() && flat_from == parent_start && flat_to == parent_end {
        return empty_parent(doc, &start, depth, flat_from, flat_to);
    }

    Ok(Plan::new(
        Replacement {
            from: flat_from,
            to: flat_to,
            content,
        },
        from..to,
        cursor,
    ))
}

/// A delete would leave the parent at `depth` without content: the document gets
/// an empty paragraph, any other container is removed as a whole
fn empty_parent(
    doc: &Document,
    resolved: &ResolvedPos,
    depth: usize,
    from: usize,
    to: usize,
) -> Result<Plan, TransactionError> {
    if depth == 0 {
        let fill = schema::fill_content(&NodeKind::Doc)
            .map(|node| vec![node])
            .unwrap_or_default();
        return Ok(Plan::new(
            Replacement { from, to, content: fill },
            from..to,
            SelectionHint::Cursor(from + 1, Bias::Forward),
        ));
    }
    plan_delete(doc, resolved.before(depth), resolved.after(doc, depth))
}

/// Keep the content of `element` before `offset`
fn cut_after(element: &Element, offset: usize) -> Element {
    let mut content = Vec::new();
    let mut start = 0;
    for child in &element.content {
        if start >= offset {
            break;
        }
        let end = start + child.node_size();
        if end <= offset {
            content.push(child.clone());
        } else {
            match child {
                Node::Text(run) => content.push(Node::Text(run.slice(0, offset - start))),
                Node::Element(inner) => {
                    content.push(Node::Element(cut_after(inner, offset - start - 1)))
                }
            }
        }
        start = end;
    }
    Element::new(element.kind.clone(), content)
}

/// Keep the content of `element` from `offset` on
fn cut_before(element: &Element, offset: usize) -> Element {
    let mut content = Vec::new();
    let mut start = 0;
    for child in &element.content {
        let end = start + child.node_size();
        if start >= offset {
            content.push(child.clone());
        } else if end > offset {
            match child {
                Node::Text(run) => content.push(Node::Text(run.slice(offset - start, run.len()))),
                Node::Element(inner) => {
                    content.push(Node::Element(cut_before(inner, offset - start - 1)))
                }
            }
        }
        start = end;
    }
    Element::new(element.kind.clone(), content)
}

/// Heal the seam between two cut-open nodes that end up adjacent inside `parent`.
///
/// `l` and `r` count how many levels are open on the facing sides (1 = only the
/// node itself). Returns `None` when no join fits the schema, in which case the
/// caller keeps both nodes as they are.
fn join_open(
    parent: &NodeKind,
    left: &Element,
    l: usize,
    right: &Element,
    r: usize,
) -> Option<Vec<Node>> {
    let accepted = |nodes: Vec<Node>| {
        nodes
            .iter()
            .all(|node| schema::accepts(parent, node.node_type()))
            .then_some(nodes)
    };
    let siblings = || vec![Node::Element(left.clone()), Node::Element(right.clone())];

    if left.kind.is_isolating() || right.kind.is_isolating() {
        return accepted(siblings());
    }

    if left.kind.is_textblock() && right.kind.is_textblock() {
        let mut content = left.content.clone();
        if schema::allows_marks(&left.kind) {
            content.extend(right.content.iter().cloned());
        } else {
            content.extend(strip_marks(&right.content));
        }
        let merged = Element::new(left.kind.clone(), normalize_nodes(content));
        return accepted(vec![Node::Element(merged)]);
    }

    if left.kind.node_type() == right.kind.node_type() {
        let mut content = left.content.clone();
        if l > 1
            && r > 1
            && let (Some(Node::Element(last)), Some(Node::Element(first))) =
                (left.content.last(), right.content.first())
        {
            content.pop();
            let seam = join_open(&left.kind, last, l - 1, first, r - 1).unwrap_or_else(|| {
                vec![Node::Element(last.clone()), Node::Element(first.clone())]
            });
            content.extend(seam);
            content.extend(right.content[1..].iter().cloned());
        } else {
            content.extend(right.content.iter().cloned());
        }
        return accepted(vec![Node::element(left.kind.clone(), content)]);
    }

    let descend_left = || -> Option<Vec<Node>> {
        let Some(Node::Element(last)) = left.content.last() else {
            return None;
        };
        if l < 2 {
            return None;
        }
        let seam = join_open(&left.kind, last, l - 1, right, r)?;
        let mut content = left.content[..left.content.len() - 1].to_vec();
        content.extend(seam);
        accepted(vec![Node::element(left.kind.clone(), content)])
    };
    let descend_right = || -> Option<Vec<Node>> {
        let Some(Node::Element(first)) = right.content.first() else {
            return None;
        };
        if r < 2 {
            return None;
        }
        let mut out = join_open(parent, left, l, first, r - 1)?;
        let rest = right.content[1..].to_vec();
        if !rest.is_empty() {
            out.push(Node::element(right.kind.clone(), rest));
        }
        accepted(out)
    };

    let joined = if right.kind.is_textblock() {
        descend_left()
    } else if left.kind.is_textblock() {
        descend_right()
    } else {
        descend_right().or_else(descend_left)
    };
    joined.or_else(|| accepted(siblings()))
}

fn strip_marks(nodes: &[Node]) -> Vec<Node> {
    nodes
        .iter()
        .map(|node| match node {
            Node::Text(run) => Node::Text(TextRun {
                text: run.text.clone(),
                marks: MarkSet::new(),
            }),
            other => other.clone(),
        })
        .collect()
}

/// Drop containers left without the content they require
fn prune_empty(nodes: Vec<Node>) -> Vec<Node> {
    nodes
        .into_iter()
        .filter_map(|node| match node {
            Node::Element(element) => {
                let content = prune_empty(element.content);
                if content.is_empty() && schema::requires_content(&element.kind) {
                    None
                } else {
                    Some(Node::element(element.kind, content))
                }
            }
            text => Some(text),
        })
        .collect()
}

pub(crate) fn plan_marks(
    doc: &Document,
    from: usize,
    to: usize,
    restyle: &dyn Fn(&MarkSet) -> MarkSet,
) -> Result<Plan, TransactionError> {
    check_range(doc, from, to)?;
    let selection = SelectionHint::Range(from, to);
    if from == to {
        return Ok(Plan::noop(from, selection));
    }

    let start = doc.resolve(from)?;
    let end = doc.resolve(to)?;
    let depth = start.shared_depth(&end);
    let parent = start.node_at_depth(doc, depth);
    let parent_start = start.start(depth);

    let (flat_from, flat_to) = if parent.kind.is_textblock() {
        (parent_start, parent_start + parent.content_size())
    } else {
        let lo = if start.depth() > depth {
            start.before(depth + 1)
        } else {
            from
        };
        let hi = if end.depth() > depth {
            end.after(doc, depth + 1)
        } else {
            to
        };
        (lo, hi)
    };

    let (first, _) = parent.child_at_offset(flat_from - parent_start);
    let (last, _) = parent.child_at_offset(flat_to - parent_start);
    let content = restyle_nodes(
        &parent.kind,
        &parent.content[first..last],
        flat_from,
        from..to,
        restyle,
    );

    Ok(Plan::new(
        Replacement {
            from: flat_from,
            to: flat_to,
            content,
        },
        from..to,
        selection,
    ))
}

fn restyle_nodes(
    parent: &NodeKind,
    nodes: &[Node],
    start: usize,
    range: Range<usize>,
    restyle: &dyn Fn(&MarkSet) -> MarkSet,
) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut child_start = start;
    for node in nodes {
        let child_end = child_start + node.node_size();
        let overlaps = child_end > range.start && child_start < range.end;
        match node {
            Node::Text(run) if overlaps && schema::allows_marks(parent) => {
                let lo = range.start.max(child_start) - child_start;
                let hi = range.end.min(child_end) - child_start;
                if lo > 0 {
                    out.push(Node::Text(run.slice(0, lo)));
                }
                out.push(Node::Text(TextRun {
                    text: run.slice(lo, hi).text,
                    marks: restyle(&run.marks),
                }));
                if hi < run.len() {
                    out.push(Node::Text(run.slice(hi, run.len())));
                }
            }
            Node::Element(element) if overlaps => {
                out.push(Node::element(
                    element.kind.clone(),
                    restyle_nodes(
                        &element.kind,
                        &element.content,
                        child_start + 1,
                        range.clone(),
                        restyle,
                    ),
                ));
            }
            other => out.push(other.clone()),
        }
        child_start = child_end;
    }
    out
}

pub(crate) fn plan_replace_node(
    doc: &Document,
    pos: usize,
    node: &Node,
) -> Result<Plan, TransactionError> {
    let Some(Node::Element(old)) = doc.node_at(pos) else {
        return Err(TransactionError::InvalidPosition { pos });
    };
    let incompatible = || TransactionError::IncompatibleConversion {
        from: old.kind.node_type(),
        to: node.node_type(),
    };
    let Node::Element(new) = node else {
        return Err(incompatible());
    };

    let parent = doc.resolve(pos)?.parent(doc);
    if !schema::accepts(&parent.kind, new.kind.node_type()) {
        return Err(incompatible());
    }

    let converted = if new.content.is_empty() {
        let content = if schema::allows_marks(&new.kind) {
            old.content.clone()
        } else {
            strip_marks(&old.content)
        };
        let fits = content
            .iter()
            .all(|child| schema::accepts(&new.kind, child.node_type()));
        let filled = !content.is_empty() || !schema::requires_content(&new.kind);
        if !fits || !filled {
            return Err(incompatible());
        }
        Element::new(new.kind.clone(), content)
    } else {
        new.clone()
    };

    let old_size = old.content_size() + 2;
    Ok(Plan::new(
        Replacement {
            from: pos,
            to: pos + old_size,
            content: vec![Node::Element(converted)],
        },
        pos..pos + old_size,
        SelectionHint::Cursor(pos + 1, Bias::Forward),
    ))
}

pub(crate) fn plan_split(doc: &Document, pos: usize) -> Result<Plan, TransactionError> {
    let resolved = doc.resolve(pos)?;
    let block = resolved.parent(doc);
    if !block.kind.is_textblock() {
        return Err(TransactionError::InvalidPosition { pos });
    }
    if matches!(block.kind, NodeKind::CodeBlock { .. }) {
        return plan_insert(doc, pos, &[Node::text("\n")]);
    }

    // Inside a list item the whole item splits, otherwise just the textblock
    let mut depth = resolved.depth();
    if depth >= 2
        && matches!(
            resolved.node_at_depth(doc, depth - 1).kind,
            NodeKind::ListItem | NodeKind::TaskItem { .. }
        )
    {
        depth -= 1;
    }
    let target = resolved.node_at_depth(doc, depth);
    let before = resolved.before(depth);
    let after = resolved.after(doc, depth);
    let offset = pos - resolved.start(depth);

    let head = cut_after(target, offset);
    let mut tail = cut_before(target, offset);
    if let NodeKind::TaskItem { checked } = &mut tail.kind {
        *checked = false;
    }
    if matches!(tail.kind, NodeKind::Heading { .. }) && tail.content.is_empty() {
        tail.kind = NodeKind::Paragraph;
    }

    let levels = resolved.depth() - depth + 1;
    Ok(Plan::new(
        Replacement {
            from: before,
            to: after,
            content: vec![Node::Element(head), Node::Element(tail)],
        },
        pos..pos,
        SelectionHint::Cursor(pos + 2 * levels, Bias::Forward),
    ))
}
