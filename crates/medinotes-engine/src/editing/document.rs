use std::fmt;

use serde::{Deserialize, Serialize};

use crate::editing::json::WireNode;
use crate::editing::marks::{Mark, MarkSet};
use crate::editing::schema::{self, SchemaError};

/// Node type tag from the closed set the editor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Doc,
    Paragraph,
    Heading,
    BulletList,
    OrderedList,
    ListItem,
    TaskList,
    TaskItem,
    Blockquote,
    CodeBlock,
    HorizontalRule,
    Table,
    TableRow,
    TableCell,
    TableHeader,
    Image,
    Text,
}

impl NodeType {
    /// Name used on the JSON wire format
    pub fn name(self) -> &'static str {
        match self {
            NodeType::Doc => "doc",
            NodeType::Paragraph => "paragraph",
            NodeType::Heading => "heading",
            NodeType::BulletList => "bulletList",
            NodeType::OrderedList => "orderedList",
            NodeType::ListItem => "listItem",
            NodeType::TaskList => "taskList",
            NodeType::TaskItem => "taskItem",
            NodeType::Blockquote => "blockquote",
            NodeType::CodeBlock => "codeBlock",
            NodeType::HorizontalRule => "horizontalRule",
            NodeType::Table => "table",
            NodeType::TableRow => "tableRow",
            NodeType::TableCell => "tableCell",
            NodeType::TableHeader => "tableHeader",
            NodeType::Image => "image",
            NodeType::Text => "text",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let node_type = match name {
            "doc" => NodeType::Doc,
            "paragraph" => NodeType::Paragraph,
            "heading" => NodeType::Heading,
            "bulletList" => NodeType::BulletList,
            "orderedList" => NodeType::OrderedList,
            "listItem" => NodeType::ListItem,
            "taskList" => NodeType::TaskList,
            "taskItem" => NodeType::TaskItem,
            "blockquote" => NodeType::Blockquote,
            "codeBlock" => NodeType::CodeBlock,
            "horizontalRule" => NodeType::HorizontalRule,
            "table" => NodeType::Table,
            "tableRow" => NodeType::TableRow,
            "tableCell" => NodeType::TableCell,
            "tableHeader" => NodeType::TableHeader,
            "image" => NodeType::Image,
            "text" => NodeType::Text,
            _ => return None,
        };
        Some(node_type)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type and attributes of a non-text node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Doc,
    Paragraph,
    /// Heading, level 1 to 3
    Heading { level: u8 },
    BulletList,
    OrderedList { start: u32 },
    ListItem,
    TaskList,
    TaskItem { checked: bool },
    Blockquote,
    CodeBlock { language: Option<String> },
    HorizontalRule,
    Table,
    TableRow,
    TableCell,
    TableHeader,
    Image { src: String, alt: Option<String> },
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Doc => NodeType::Doc,
            NodeKind::Paragraph => NodeType::Paragraph,
            NodeKind::Heading { .. } => NodeType::Heading,
            NodeKind::BulletList => NodeType::BulletList,
            NodeKind::OrderedList { .. } => NodeType::OrderedList,
            NodeKind::ListItem => NodeType::ListItem,
            NodeKind::TaskList => NodeType::TaskList,
            NodeKind::TaskItem { .. } => NodeType::TaskItem,
            NodeKind::Blockquote => NodeType::Blockquote,
            NodeKind::CodeBlock { .. } => NodeType::CodeBlock,
            NodeKind::HorizontalRule => NodeType::HorizontalRule,
            NodeKind::Table => NodeType::Table,
            NodeKind::TableRow => NodeType::TableRow,
            NodeKind::TableCell => NodeType::TableCell,
            NodeKind::TableHeader => NodeType::TableHeader,
            NodeKind::Image { .. } => NodeType::Image,
        }
    }

    /// Blocks whose content is inline text (the only places a cursor can rest)
    pub fn is_textblock(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph | NodeKind::Heading { .. } | NodeKind::CodeBlock { .. }
        )
    }

    /// Leaf nodes that never have content
    pub fn is_atom(&self) -> bool {
        matches!(self, NodeKind::HorizontalRule | NodeKind::Image { .. })
    }

    /// Table structure is never merged by delete healing
    pub fn is_isolating(&self) -> bool {
        matches!(
            self,
            NodeKind::Table | NodeKind::TableRow | NodeKind::TableCell | NodeKind::TableHeader
        )
    }
}

/// Non-text node: a kind plus ordered children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: NodeKind,
    pub content: Vec<Node>,
}

impl Element {
    pub fn new(kind: NodeKind, content: Vec<Node>) -> Self {
        Self { kind, content }
    }

    /// Sum of the children's sizes
    pub fn content_size(&self) -> usize {
        self.content.iter().map(Node::node_size).sum()
    }

    /// Locate the child at `offset` (relative to this element's content start).
    ///
    /// Returns the child index and the offset inside that child. An inner offset of
    /// zero means `offset` sits on the boundary before the child; `offset` at the end
    /// of the content yields `(content.len(), 0)`.
    pub(crate) fn child_at_offset(&self, offset: usize) -> (usize, usize) {
        let mut start = 0;
        for (index, child) in self.content.iter().enumerate() {
            if offset == start {
                return (index, 0);
            }
            let end = start + child.node_size();
            if offset < end {
                return (index, offset - start);
            }
            start = end;
        }
        (self.content.len(), 0)
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.content, &mut out);
        out
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(run) => out.push_str(&run.text),
            Node::Element(element) => collect_text(&element.content, out),
        }
    }
}

/// A run of characters sharing one mark set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub marks: MarkSet,
}

impl TextRun {
    /// Length in characters, which is the run's size in positions
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Characters `from..to` as a new run with the same marks
    pub(crate) fn slice(&self, from: usize, to: usize) -> TextRun {
        TextRun {
            text: char_slice(&self.text, from, to).to_string(),
            marks: self.marks.clone(),
        }
    }
}

/// One element of the document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(TextRun),
}

impl Node {
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Element(element) => element.kind.node_type(),
            Node::Text(_) => NodeType::Text,
        }
    }

    /// Number of positions this node occupies: characters for text, two boundary
    /// tokens plus content for everything else
    pub fn node_size(&self) -> usize {
        match self {
            Node::Element(element) => element.content_size() + 2,
            Node::Text(run) => run.len(),
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn is_textblock(&self) -> bool {
        self.as_element().is_some_and(|e| e.kind.is_textblock())
    }

    pub fn text_content(&self) -> String {
        match self {
            Node::Element(element) => element.text_content(),
            Node::Text(run) => run.text.clone(),
        }
    }

    pub fn element(kind: NodeKind, content: Vec<Node>) -> Node {
        Node::Element(Element::new(kind, content))
    }

    pub fn text(text: impl Into<String>) -> Node {
        Node::Text(TextRun {
            text: text.into(),
            marks: MarkSet::new(),
        })
    }

    pub fn marked_text(text: impl Into<String>, marks: impl IntoIterator<Item = Mark>) -> Node {
        Node::Text(TextRun {
            text: text.into(),
            marks: MarkSet::from_marks(marks),
        })
    }

    pub fn paragraph(content: Vec<Node>) -> Node {
        Node::element(NodeKind::Paragraph, content)
    }

    pub fn heading(level: u8, content: Vec<Node>) -> Node {
        Node::element(NodeKind::Heading { level }, content)
    }

    pub fn bullet_list(items: Vec<Node>) -> Node {
        Node::element(NodeKind::BulletList, items)
    }

    pub fn ordered_list(items: Vec<Node>) -> Node {
        Node::element(NodeKind::OrderedList { start: 1 }, items)
    }

    pub fn list_item(blocks: Vec<Node>) -> Node {
        Node::element(NodeKind::ListItem, blocks)
    }

    pub fn task_list(items: Vec<Node>) -> Node {
        Node::element(NodeKind::TaskList, items)
    }

    pub fn task_item(checked: bool, blocks: Vec<Node>) -> Node {
        Node::element(NodeKind::TaskItem { checked }, blocks)
    }

    pub fn blockquote(blocks: Vec<Node>) -> Node {
        Node::element(NodeKind::Blockquote, blocks)
    }

    pub fn code_block(code: &str) -> Node {
        let content = if code.is_empty() {
            Vec::new()
        } else {
            vec![Node::text(code)]
        };
        Node::element(NodeKind::CodeBlock { language: None }, content)
    }

    pub fn horizontal_rule() -> Node {
        Node::element(NodeKind::HorizontalRule, Vec::new())
    }

    pub fn image(src: impl Into<String>, alt: Option<&str>) -> Node {
        Node::element(
            NodeKind::Image {
                src: src.into(),
                alt: alt.map(str::to_string),
            },
            Vec::new(),
        )
    }

    pub fn table(rows: Vec<Node>) -> Node {
        Node::element(NodeKind::Table, rows)
    }

    pub fn table_row(cells: Vec<Node>) -> Node {
        Node::element(NodeKind::TableRow, cells)
    }

    pub fn table_cell(blocks: Vec<Node>) -> Node {
        Node::element(NodeKind::TableCell, blocks)
    }

    pub fn table_header(blocks: Vec<Node>) -> Node {
        Node::element(NodeKind::TableHeader, blocks)
    }
}

/// Immutable, rooted document tree.
///
/// A `Document` is always normalized and schema-valid: construction goes through
/// [`Document::new`] (or JSON deserialization) and edits go through the transaction
/// engine, which validates every replacement. Equality is structural, which for a
/// normalized tree is the same as equality of the JSON forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireNode", into = "WireNode")]
pub struct Document {
    root: Element,
}

impl Document {
    /// Build a document from top-level blocks, normalizing text runs and checking
    /// the schema
    pub fn new(content: Vec<Node>) -> Result<Self, SchemaError> {
        let root = Element::new(NodeKind::Doc, normalize_nodes(content));
        schema::validate_root(&root)?;
        Ok(Self { root })
    }

    /// Document holding a single empty paragraph
    pub fn empty() -> Self {
        Self {
            root: Element::new(NodeKind::Doc, vec![Node::paragraph(Vec::new())]),
        }
    }

    /// Wrap a root that the caller has already validated
    pub(crate) fn from_valid_root(root: Element) -> Self {
        debug_assert_eq!(root.kind, NodeKind::Doc);
        Self { root }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn content(&self) -> &[Node] {
        &self.root.content
    }

    /// Largest valid position
    pub fn size(&self) -> usize {
        self.root.content_size()
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        schema::validate_root(&self.root)
    }

    /// The node that starts exactly at `pos`, if any
    pub fn node_at(&self, pos: usize) -> Option<&Node> {
        let resolved = self.resolve(pos).ok()?;
        let parent = resolved.parent(self);
        match parent.child_at_offset(resolved.parent_offset) {
            (index, 0) => parent.content.get(index),
            _ => None,
        }
    }

    /// Plain text in `from..to`, with a newline between textblocks
    pub fn text_between(&self, from: usize, to: usize) -> String {
        let mut out = String::new();
        text_between_in(&self.root.content, 0, from, to, &mut out);
        out
    }

    pub fn text_content(&self) -> String {
        self.text_between(0, self.size())
    }

    /// Every textblock with the absolute position where its content starts, in
    /// document order
    pub fn textblocks(&self) -> Vec<(usize, &Element)> {
        let mut out = Vec::new();
        collect_textblocks(&self.root.content, 0, &mut out);
        out
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

fn text_between_in(nodes: &[Node], start: usize, from: usize, to: usize, out: &mut String) {
    let mut child_start = start;
    for node in nodes {
        let child_end = child_start + node.node_size();
        if child_end > from && child_start < to {
            match node {
                Node::Text(run) => {
                    let lo = from.max(child_start) - child_start;
                    let hi = to.min(child_end) - child_start;
                    out.push_str(char_slice(&run.text, lo, hi));
                }
                Node::Element(element) => {
                    if element.kind.is_textblock() && !out.is_empty() {
                        out.push('\n');
                    }
                    text_between_in(&element.content, child_start + 1, from, to, out);
                }
            }
        }
        child_start = child_end;
    }
}

fn collect_textblocks<'a>(nodes: &'a [Node], start: usize, out: &mut Vec<(usize, &'a Element)>) {
    let mut child_start = start;
    for node in nodes {
        if let Node::Element(element) = node {
            if element.kind.is_textblock() {
                out.push((child_start + 1, element));
            } else {
                collect_textblocks(&element.content, child_start + 1, out);
            }
        }
        child_start += node.node_size();
    }
}

/// Merge adjacent runs with equal marks and drop empty runs, recursively.
///
/// Positions are unaffected because text contributes only its characters.
pub(crate) fn normalize_nodes(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text(run) => {
                if run.is_empty() {
                    continue;
                }
                if let Some(Node::Text(prev)) = out.last_mut()
                    && prev.marks == run.marks
                {
                    prev.text.push_str(&run.text);
                    continue;
                }
                out.push(Node::Text(run));
            }
            Node::Element(element) => out.push(Node::Element(Element::new(
                element.kind,
                normalize_nodes(element.content),
            ))),
        }
    }
    out
}

/// Substring by character offsets
pub(crate) fn char_slice(text: &str, from: usize, to: usize) -> &str {
    let byte_at = |n: usize| {
        text.char_indices()
            .nth(n)
            .map(|(i, _)| i)
            .unwrap_or(text.len())
    };
    let start = byte_at(from);
    let end = byte_at(to).max(start);
    &text[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Document {
        Document::new(vec![
            Node::heading(1, vec![Node::text("Cardio")]),
            Node::bullet_list(vec![Node::list_item(vec![Node::paragraph(vec![
                Node::text("ECG "),
                Node::marked_text("basics", [Mark::Bold]),
            ])])]),
            Node::horizontal_rule(),
        ])
        .unwrap()
    }

    #[test]
    fn test_node_sizes_count_boundaries_and_characters() {
        let doc = sample();
        // heading: 2 + 6, list: 2 + item(2 + paragraph(2 + 10)), rule: 2
        assert_eq!(doc.content()[0].node_size(), 8);
        assert_eq!(doc.content()[1].node_size(), 16);
        assert_eq!(doc.content()[2].node_size(), 2);
        assert_eq!(doc.size(), 26);
    }

    #[test]
    fn test_characters_not_bytes_define_text_size() {
        let run = Node::text("Herz 🫀");
        assert_eq!(run.node_size(), 6);
    }

    #[test]
    fn test_node_at_returns_node_starting_at_position() {
        let doc = sample();
        assert_eq!(doc.node_at(0).map(Node::node_type), Some(NodeType::Heading));
        assert_eq!(doc.node_at(8).map(Node::node_type), Some(NodeType::BulletList));
        assert_eq!(doc.node_at(9).map(Node::node_type), Some(NodeType::ListItem));
        assert_eq!(doc.node_at(24).map(Node::node_type), Some(NodeType::HorizontalRule));
        // inside the heading text
        assert_eq!(doc.node_at(3).map(Node::node_type), None);
    }

    #[test]
    fn test_text_between_joins_blocks_with_newline() {
        let doc = sample();
        assert_eq!(doc.text_content(), "Cardio\nECG basics");
        assert_eq!(doc.text_between(5, 14), "io\nECG");
    }

    #[test]
    fn test_new_merges_adjacent_runs_with_equal_marks() {
        let doc = Document::new(vec![Node::paragraph(vec![
            Node::text("ab"),
            Node::text(""),
            Node::text("cd"),
            Node::marked_text("e", [Mark::Italic]),
        ])])
        .unwrap();

        let expected = Document::new(vec![Node::paragraph(vec![
            Node::text("abcd"),
            Node::marked_text("e", [Mark::Italic]),
        ])])
        .unwrap();
        assert_eq!(doc, expected);
    }

    #[test]
    fn test_textblocks_reports_content_start() {
        let doc = sample();
        let starts: Vec<usize> = doc.textblocks().iter().map(|(start, _)| *start).collect();
        assert_eq!(starts, vec![1, 11]);
    }

    #[test]
    fn test_char_slice_handles_multibyte() {
        assert_eq!(char_slice("äöü", 1, 2), "ö");
        assert_eq!(char_slice("abc", 2, 10), "c");
    }
}
