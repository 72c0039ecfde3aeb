//! Node-type schema: which children each node accepts and which attributes are
//! legal. A document that fails these checks is never rendered or edited.

use std::sync::OnceLock;

use regex::Regex;

use crate::editing::document::{Element, Node, NodeKind, NodeType};
use crate::editing::marks::{Mark, MarkType};

/// Child indices from the root down to the offending node
pub type NodePath = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("node at {path:?}: expected one of [{}], found {actual}", type_list(.expected))]
    UnexpectedNode {
        path: NodePath,
        expected: Vec<NodeType>,
        actual: NodeType,
    },
    #[error("{node} at {path:?} must have content")]
    MissingContent { path: NodePath, node: NodeType },
    #[error("invalid `{attr}` on {node} at {path:?}: {reason}")]
    InvalidAttribute {
        path: NodePath,
        node: NodeType,
        attr: &'static str,
        reason: String,
    },
    #[error("mark `{mark}` is not allowed inside {node} at {path:?}")]
    DisallowedMark {
        path: NodePath,
        node: NodeType,
        mark: MarkType,
    },
    #[error("empty text node at {path:?}")]
    EmptyText { path: NodePath },
    #[error("unknown node type `{name}` at {path:?}")]
    UnknownNodeType { path: NodePath, name: String },
    #[error("unknown mark `{name}` at {path:?}")]
    UnknownMark { path: NodePath, name: String },
    #[error("malformed document: {0}")]
    Malformed(String),
}

fn type_list(types: &[NodeType]) -> String {
    types
        .iter()
        .map(|t| t.name())
        .collect::<Vec<_>>()
        .join(", ")
}

const BLOCK: &[NodeType] = &[
    NodeType::Paragraph,
    NodeType::Heading,
    NodeType::BulletList,
    NodeType::OrderedList,
    NodeType::TaskList,
    NodeType::Blockquote,
    NodeType::CodeBlock,
    NodeType::HorizontalRule,
    NodeType::Table,
    NodeType::Image,
];

/// Node types `kind` may contain
pub fn allowed_children(kind: &NodeKind) -> &'static [NodeType] {
    match kind {
        NodeKind::Doc
        | NodeKind::Blockquote
        | NodeKind::ListItem
        | NodeKind::TaskItem { .. }
        | NodeKind::TableCell
        | NodeKind::TableHeader => BLOCK,
        NodeKind::Paragraph | NodeKind::Heading { .. } | NodeKind::CodeBlock { .. } => {
            &[NodeType::Text]
        }
        NodeKind::BulletList | NodeKind::OrderedList { .. } => &[NodeType::ListItem],
        NodeKind::TaskList => &[NodeType::TaskItem],
        NodeKind::Table => &[NodeType::TableRow],
        NodeKind::TableRow => &[NodeType::TableCell, NodeType::TableHeader],
        NodeKind::HorizontalRule | NodeKind::Image { .. } => &[],
    }
}

pub fn accepts(parent: &NodeKind, child: NodeType) -> bool {
    allowed_children(parent).contains(&child)
}

/// Containers must hold at least one child; textblocks and atoms may be empty
pub fn requires_content(kind: &NodeKind) -> bool {
    !kind.is_textblock() && !kind.is_atom()
}

pub fn allows_marks(kind: &NodeKind) -> bool {
    !matches!(kind, NodeKind::CodeBlock { .. })
}

/// Default content for a container that would otherwise be left empty
pub(crate) fn fill_content(kind: &NodeKind) -> Option<Node> {
    match kind {
        NodeKind::Doc
        | NodeKind::Blockquote
        | NodeKind::ListItem
        | NodeKind::TaskItem { .. }
        | NodeKind::TableCell
        | NodeKind::TableHeader => Some(Node::paragraph(Vec::new())),
        _ => None,
    }
}

pub(crate) fn validate_root(root: &Element) -> Result<(), SchemaError> {
    if root.kind != NodeKind::Doc {
        return Err(SchemaError::UnexpectedNode {
            path: Vec::new(),
            expected: vec![NodeType::Doc],
            actual: root.kind.node_type(),
        });
    }
    validate_element(root, &mut Vec::new())
}

/// Check `nodes` as (part of) the content of a `parent` at `path`
pub(crate) fn validate_children(
    parent: &NodeKind,
    nodes: &[Node],
    path: &mut NodePath,
) -> Result<(), SchemaError> {
    for (index, child) in nodes.iter().enumerate() {
        path.push(index);
        check_child(parent, child, path)?;
        path.pop();
    }
    Ok(())
}

fn validate_element(element: &Element, path: &mut NodePath) -> Result<(), SchemaError> {
    validate_attributes(&element.kind, path)?;
    validate_children(&element.kind, &element.content, path)?;
    if requires_content(&element.kind) && element.content.is_empty() {
        return Err(SchemaError::MissingContent {
            path: path.clone(),
            node: element.kind.node_type(),
        });
    }
    Ok(())
}

fn check_child(parent: &NodeKind, child: &Node, path: &mut NodePath) -> Result<(), SchemaError> {
    if !accepts(parent, child.node_type()) {
        return Err(SchemaError::UnexpectedNode {
            path: path.clone(),
            expected: allowed_children(parent).to_vec(),
            actual: child.node_type(),
        });
    }
    match child {
        Node::Element(element) => validate_element(element, path),
        Node::Text(run) => {
            if run.is_empty() {
                return Err(SchemaError::EmptyText { path: path.clone() });
            }
            for mark in &run.marks {
                if !allows_marks(parent) {
                    return Err(SchemaError::DisallowedMark {
                        path: path.clone(),
                        node: parent.node_type(),
                        mark: mark.mark_type(),
                    });
                }
                validate_mark(mark, path)?;
            }
            Ok(())
        }
    }
}

fn validate_attributes(kind: &NodeKind, path: &NodePath) -> Result<(), SchemaError> {
    let invalid = |attr: &'static str, reason: String| SchemaError::InvalidAttribute {
        path: path.clone(),
        node: kind.node_type(),
        attr,
        reason,
    };
    match kind {
        NodeKind::Heading { level } if !(1..=3).contains(level) => Err(invalid(
            "level",
            format!("heading level must be 1-3, got {level}"),
        )),
        NodeKind::OrderedList { start: 0 } => {
            Err(invalid("start", "list must start at 1 or later".to_string()))
        }
        NodeKind::Image { src, .. } if src.trim().is_empty() => {
            Err(invalid("src", "image source is empty".to_string()))
        }
        _ => Ok(()),
    }
}

fn validate_mark(mark: &Mark, path: &NodePath) -> Result<(), SchemaError> {
    let invalid = |attr: &'static str, reason: String| SchemaError::InvalidAttribute {
        path: path.clone(),
        node: NodeType::Text,
        attr,
        reason,
    };
    match mark {
        Mark::TextColor(color) | Mark::Highlight(color) if !is_hex_color(color) => Err(invalid(
            "color",
            format!("`{color}` is not a #rgb or #rrggbb colour"),
        )),
        Mark::Link { href } if href.trim().is_empty() => {
            Err(invalid("href", "link target is empty".to_string()))
        }
        _ => Ok(()),
    }
}

pub fn is_hex_color(value: &str) -> bool {
    static HEX_COLOR: OnceLock<Regex> = OnceLock::new();
    let pattern = HEX_COLOR.get_or_init(|| {
        Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("Invalid colour regex")
    });
    pattern.is_match(value)
}
