//! JSON document value contract.
//!
//! Documents travel as ProseMirror-style trees:
//!
//! ```json
//! {"type": "doc", "content": [
//!   {"type": "heading", "attrs": {"level": 2}, "content": [
//!     {"type": "text", "text": "Renal ", "marks": [{"type": "bold"}]}
//!   ]}
//! ]}
//! ```
//!
//! Loading never coerces: unknown types, missing attributes and schema violations
//! are all reported as [`SchemaError`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::editing::document::{Document, Element, Node, NodeKind, NodeType, TextRun};
use crate::editing::marks::{Mark, MarkSet, MarkType};
use crate::editing::schema::{NodePath, SchemaError};

/// One node as it appears on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<WireNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<WireMark>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMark {
    #[serde(rename = "type")]
    pub mark_type: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
}

/// Parse and validate an external document value
pub fn apply_schema(value: &Value) -> Result<Document, SchemaError> {
    let wire = WireNode::deserialize(value).map_err(|e| SchemaError::Malformed(e.to_string()))?;
    Document::try_from(wire)
}

/// Serialize a document into its JSON value
pub fn to_json(doc: &Document) -> Value {
    WireNode::from(doc).into_value()
}

impl TryFrom<WireNode> for Document {
    type Error = SchemaError;

    fn try_from(wire: WireNode) -> Result<Self, Self::Error> {
        if wire.node_type != NodeType::Doc.name() {
            return Err(match NodeType::from_name(&wire.node_type) {
                Some(actual) => SchemaError::UnexpectedNode {
                    path: Vec::new(),
                    expected: vec![NodeType::Doc],
                    actual,
                },
                None => SchemaError::UnknownNodeType {
                    path: Vec::new(),
                    name: wire.node_type,
                },
            });
        }
        let mut path = Vec::new();
        let content = nodes_from_wire(wire.content, &mut path)?;
        Document::new(content)
    }
}

impl From<Document> for WireNode {
    fn from(doc: Document) -> Self {
        WireNode::from(&doc)
    }
}

impl From<&Document> for WireNode {
    fn from(doc: &Document) -> Self {
        element_to_wire(doc.root())
    }
}

impl WireNode {
    fn into_value(self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(self.node_type));
        if !self.attrs.is_empty() {
            map.insert("attrs".to_string(), Value::Object(self.attrs));
        }
        if !self.content.is_empty() {
            let content = self.content.into_iter().map(WireNode::into_value).collect();
            map.insert("content".to_string(), Value::Array(content));
        }
        if let Some(text) = self.text {
            map.insert("text".to_string(), Value::String(text));
        }
        if !self.marks.is_empty() {
            let marks = self
                .marks
                .into_iter()
                .map(|mark| {
                    let mut map = Map::new();
                    map.insert("type".to_string(), Value::String(mark.mark_type));
                    if !mark.attrs.is_empty() {
                        map.insert("attrs".to_string(), Value::Object(mark.attrs));
                    }
                    Value::Object(map)
                })
                .collect();
            map.insert("marks".to_string(), Value::Array(marks));
        }
        Value::Object(map)
    }
}

fn nodes_from_wire(nodes: Vec<WireNode>, path: &mut NodePath) -> Result<Vec<Node>, SchemaError> {
    let mut out = Vec::with_capacity(nodes.len());
    for (index, wire) in nodes.into_iter().enumerate() {
        path.push(index);
        out.push(node_from_wire(wire, path)?);
        path.pop();
    }
    Ok(out)
}

fn node_from_wire(wire: WireNode, path: &mut NodePath) -> Result<Node, SchemaError> {
    let Some(node_type) = NodeType::from_name(&wire.node_type) else {
        return Err(SchemaError::UnknownNodeType {
            path: path.clone(),
            name: wire.node_type,
        });
    };

    if node_type == NodeType::Text {
        let Some(text) = wire.text else {
            return Err(SchemaError::Malformed(format!(
                "text node at {path:?} has no `text`"
            )));
        };
        if text.is_empty() {
            return Err(SchemaError::EmptyText { path: path.clone() });
        }
        let marks = wire
            .marks
            .into_iter()
            .map(|mark| mark_from_wire(mark, path))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Node::Text(TextRun {
            text,
            marks: MarkSet::from_marks(marks),
        }));
    }

    let kind = kind_from_attrs(node_type, &wire.attrs, path)?;
    let content = nodes_from_wire(wire.content, path)?;
    Ok(Node::Element(Element::new(kind, content)))
}

fn kind_from_attrs(
    node_type: NodeType,
    attrs: &Map<String, Value>,
    path: &NodePath,
) -> Result<NodeKind, SchemaError> {
    let invalid = |attr: &'static str, reason: &str| SchemaError::InvalidAttribute {
        path: path.clone(),
        node: node_type,
        attr,
        reason: reason.to_string(),
    };
    let optional_string = |attr: &'static str| match attrs.get(attr) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(invalid(attr, "expected a string")),
    };
    let unsigned = |attr: &'static str, default: u64| match attrs.get(attr) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value
            .as_u64()
            .ok_or_else(|| invalid(attr, "expected a non-negative integer")),
    };

    let kind = match node_type {
        NodeType::Doc => NodeKind::Doc,
        NodeType::Paragraph => NodeKind::Paragraph,
        NodeType::Heading => {
            let level = unsigned("level", 1)?;
            let level = u8::try_from(level).map_err(|_| invalid("level", "out of range"))?;
            NodeKind::Heading { level }
        }
        NodeType::BulletList => NodeKind::BulletList,
        NodeType::OrderedList => {
            let start = unsigned("start", 1)?;
            let start = u32::try_from(start).map_err(|_| invalid("start", "out of range"))?;
            NodeKind::OrderedList { start }
        }
        NodeType::ListItem => NodeKind::ListItem,
        NodeType::TaskList => NodeKind::TaskList,
        NodeType::TaskItem => {
            let checked = match attrs.get("checked") {
                None | Some(Value::Null) => false,
                Some(Value::Bool(checked)) => *checked,
                Some(_) => return Err(invalid("checked", "expected a boolean")),
            };
            NodeKind::TaskItem { checked }
        }
        NodeType::Blockquote => NodeKind::Blockquote,
        NodeType::CodeBlock => NodeKind::CodeBlock {
            language: optional_string("language")?,
        },
        NodeType::HorizontalRule => NodeKind::HorizontalRule,
        NodeType::Table => NodeKind::Table,
        NodeType::TableRow => NodeKind::TableRow,
        NodeType::TableCell => NodeKind::TableCell,
        NodeType::TableHeader => NodeKind::TableHeader,
        NodeType::Image => {
            let src = optional_string("src")?.ok_or_else(|| invalid("src", "missing"))?;
            NodeKind::Image {
                src,
                alt: optional_string("alt")?,
            }
        }
        NodeType::Text => {
            return Err(SchemaError::Malformed(format!(
                "text at {path:?} handled as an element"
            )));
        }
    };
    Ok(kind)
}

fn mark_from_wire(wire: WireMark, path: &NodePath) -> Result<Mark, SchemaError> {
    let Some(mark_type) = MarkType::from_name(&wire.mark_type) else {
        return Err(SchemaError::UnknownMark {
            path: path.clone(),
            name: wire.mark_type,
        });
    };
    let string_attr = |attr: &'static str| match wire.attrs.get(attr) {
        Some(Value::String(value)) => Ok(value.clone()),
        _ => Err(SchemaError::InvalidAttribute {
            path: path.clone(),
            node: NodeType::Text,
            attr,
            reason: format!("`{mark_type}` needs a string `{attr}`"),
        }),
    };
    let mark = match mark_type {
        MarkType::Bold => Mark::Bold,
        MarkType::Italic => Mark::Italic,
        MarkType::Underline => Mark::Underline,
        MarkType::Strike => Mark::Strike,
        MarkType::Code => Mark::Code,
        MarkType::Subscript => Mark::Subscript,
        MarkType::Superscript => Mark::Superscript,
        MarkType::TextColor => Mark::TextColor(string_attr("color")?),
        MarkType::Highlight => Mark::Highlight(string_attr("color")?),
        MarkType::Link => Mark::Link {
            href: string_attr("href")?,
        },
    };
    Ok(mark)
}

fn element_to_wire(element: &Element) -> WireNode {
    let mut attrs = Map::new();
    match &element.kind {
        NodeKind::Heading { level } => {
            attrs.insert("level".to_string(), Value::from(*level));
        }
        NodeKind::OrderedList { start } => {
            attrs.insert("start".to_string(), Value::from(*start));
        }
        NodeKind::TaskItem { checked } => {
            attrs.insert("checked".to_string(), Value::Bool(*checked));
        }
        NodeKind::CodeBlock {
            language: Some(language),
        } => {
            attrs.insert("language".to_string(), Value::from(language.as_str()));
        }
        NodeKind::Image { src, alt } => {
            attrs.insert("src".to_string(), Value::from(src.as_str()));
            if let Some(alt) = alt {
                attrs.insert("alt".to_string(), Value::from(alt.as_str()));
            }
        }
        _ => {}
    }
    WireNode {
        node_type: element.kind.node_type().name().to_string(),
        attrs,
        content: element.content.iter().map(node_to_wire).collect(),
        text: None,
        marks: Vec::new(),
    }
}

fn node_to_wire(node: &Node) -> WireNode {
    match node {
        Node::Element(element) => element_to_wire(element),
        Node::Text(run) => WireNode {
            node_type: NodeType::Text.name().to_string(),
            attrs: Map::new(),
            content: Vec::new(),
            text: Some(run.text.clone()),
            marks: run.marks.iter().map(mark_to_wire).collect(),
        },
    }
}

fn mark_to_wire(mark: &Mark) -> WireMark {
    let mut attrs = Map::new();
    match mark {
        Mark::TextColor(color) | Mark::Highlight(color) => {
            attrs.insert("color".to_string(), Value::from(color.as_str()));
        }
        Mark::Link { href } => {
            attrs.insert("href".to_string(), Value::from(href.as_str()));
        }
        _ => {}
    }
    WireMark {
        mark_type: mark.mark_type().name().to_string(),
        attrs,
    }
}
