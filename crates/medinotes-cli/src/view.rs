//! Lays a document out on a grid of terminal cells and reports the geometry
//! back to the engine as a [`RenderedLayout`].

use medinotes_engine::editing::{Document, Element, MarkSet, Node, NodeKind};
use medinotes_engine::layout::{BlockBox, Rect, RenderedLayout, TextRunBox};

pub const HANDLE: &str = "⠿ ";
pub const HANDLE_WIDTH: usize = 2;

const QUOTE: &str = "▌ ";
const CELL: &str = "│ ";
const HEADER_CELL: &str = "┃ ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Text,
    Heading(u8),
    Code,
    Rule,
    Image,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub pos: usize,
    pub marks: MarkSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenLine {
    pub prefix: String,
    pub kind: LineKind,
    pub cells: Vec<Cell>,
    /// Text shown for atoms, which have no cells
    pub label: String,
}

impl ScreenLine {
    #[cfg(test)]
    pub fn text(&self) -> String {
        let body: String = self.cells.iter().map(|cell| cell.ch).collect();
        format!("{}{}{}", self.prefix, body, self.label)
    }
}

/// Drag handle of a top-level block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle {
    pub row: usize,
    pub pos: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Screen {
    pub lines: Vec<ScreenLine>,
    pub handles: Vec<Handle>,
    pub layout: RenderedLayout,
}

impl Screen {
    pub fn handle_at(&self, column: usize, row: usize) -> Option<Handle> {
        if column >= HANDLE_WIDTH {
            return None;
        }
        self.handles.iter().copied().find(|handle| handle.row == row)
    }

    /// Cell coordinates of the cursor at `pos`
    pub fn cursor_cell(&self, pos: usize) -> Option<(f32, f32)> {
        self.layout
            .runs()
            .find(|run| run.from <= pos && pos <= run.to)
            .map(|run| {
                let offset = (pos - run.from) as f32;
                (run.rect.left() + offset, run.rect.top())
            })
    }
}

pub fn layout_document(doc: &Document, width: u16) -> Screen {
    let mut builder = Builder {
        width: usize::from(width).max(HANDLE_WIDTH + 1),
        lines: Vec::new(),
        runs: Vec::new(),
        blocks: Vec::new(),
        handles: Vec::new(),
    };
    let mut pos = 0;
    for node in doc.content() {
        builder.handles.push(Handle {
            row: builder.lines.len(),
            pos,
        });
        builder.block(node, pos, HANDLE, &" ".repeat(HANDLE_WIDTH));
        pos += node.node_size();
    }
    Screen {
        layout: RenderedLayout::new(builder.runs, builder.blocks),
        lines: builder.lines,
        handles: builder.handles,
    }
}

struct Builder {
    width: usize,
    lines: Vec<ScreenLine>,
    runs: Vec<TextRunBox>,
    blocks: Vec<BlockBox>,
    handles: Vec<Handle>,
}

impl Builder {
    fn children(&mut self, nodes: &[Node], start: usize, first: &str, rest: &str) {
        let mut pos = start;
        for (index, node) in nodes.iter().enumerate() {
            self.block(node, pos, if index == 0 { first } else { rest }, rest);
            pos += node.node_size();
        }
    }

    fn block(&mut self, node: &Node, pos: usize, first: &str, rest: &str) {
        let Node::Element(element) = node else {
            return;
        };
        let row_start = self.lines.len();
        match &element.kind {
            NodeKind::Paragraph => self.textblock(element, pos + 1, first, rest, LineKind::Text),
            NodeKind::Heading { level } => {
                self.textblock(element, pos + 1, first, rest, LineKind::Heading(*level))
            }
            NodeKind::CodeBlock { .. } => {
                self.textblock(element, pos + 1, first, rest, LineKind::Code)
            }
            NodeKind::BulletList | NodeKind::OrderedList { .. } | NodeKind::TaskList => {
                self.list(element, pos, first, rest)
            }
            NodeKind::Blockquote => self.children(
                &element.content,
                pos + 1,
                &format!("{first}{QUOTE}"),
                &format!("{rest}{QUOTE}"),
            ),
            NodeKind::Table => self.table(element, pos, first, rest),
            NodeKind::HorizontalRule => {
                let avail = self.avail(rest);
                self.atom(first, LineKind::Rule, "─".repeat(avail));
            }
            NodeKind::Image { src, alt } => {
                let label = format!("[image: {}]", alt.as_deref().unwrap_or(src));
                self.atom(first, LineKind::Image, label);
            }
            // the root and nodes only valid inside lists or tables
            _ => self.children(&element.content, pos + 1, first, rest),
        }
        let rows = self.lines.len() - row_start;
        self.blocks.push(BlockBox::new(
            pos,
            Rect::new(0.0, row_start as f32, self.width as f32, rows as f32),
        ));
    }

    fn list(&mut self, list: &Element, pos: usize, first: &str, rest: &str) {
        let mut item_pos = pos + 1;
        for (index, node) in list.content.iter().enumerate() {
            let marker = match (&list.kind, node) {
                (NodeKind::OrderedList { start }, _) => format!("{}. ", *start as usize + index),
                (NodeKind::TaskList, Node::Element(item)) => match item.kind {
                    NodeKind::TaskItem { checked: true } => "[x] ".to_string(),
                    _ => "[ ] ".to_string(),
                },
                _ => "• ".to_string(),
            };
            let lead = if index == 0 { first } else { rest };
            let row_start = self.lines.len();
            if let Node::Element(item) = node {
                self.children(
                    &item.content,
                    item_pos + 1,
                    &format!("{lead}{marker}"),
                    &format!("{rest}{}", " ".repeat(marker.chars().count())),
                );
            }
            let rows = self.lines.len() - row_start;
            self.blocks.push(BlockBox::new(
                item_pos,
                Rect::new(0.0, row_start as f32, self.width as f32, rows as f32),
            ));
            item_pos += node.node_size();
        }
    }

    fn table(&mut self, table: &Element, pos: usize, first: &str, rest: &str) {
        let mut row_pos = pos + 1;
        let mut lead = first;
        for row in &table.content {
            let Node::Element(row_element) = row else {
                continue;
            };
            let mut cell_pos = row_pos + 1;
            for cell in &row_element.content {
                if let Node::Element(cell_element) = cell {
                    let rule = match cell_element.kind {
                        NodeKind::TableHeader => HEADER_CELL,
                        _ => CELL,
                    };
                    self.children(
                        &cell_element.content,
                        cell_pos + 1,
                        &format!("{lead}{rule}"),
                        &format!("{rest}{rule}"),
                    );
                    lead = rest;
                }
                cell_pos += cell.node_size();
            }
            row_pos += row.node_size();
        }
    }

    fn atom(&mut self, prefix: &str, kind: LineKind, label: String) {
        self.lines.push(ScreenLine {
            prefix: prefix.to_string(),
            kind,
            cells: Vec::new(),
            label,
        });
    }

    fn avail(&self, prefix: &str) -> usize {
        self.width.saturating_sub(prefix.chars().count()).max(1)
    }

    fn textblock(
        &mut self,
        block: &Element,
        content_start: usize,
        first: &str,
        rest: &str,
        kind: LineKind,
    ) {
        // Logical lines split at newlines (code blocks only), each with the
        // position its first character would have
        let mut logical: Vec<(usize, Vec<Cell>)> = vec![(content_start, Vec::new())];
        let mut pos = content_start;
        for node in &block.content {
            let Node::Text(run) = node else {
                pos += node.node_size();
                continue;
            };
            for ch in run.text.chars() {
                if ch == '\n' {
                    logical.push((pos + 1, Vec::new()));
                } else if let Some((_, cells)) = logical.last_mut() {
                    cells.push(Cell {
                        ch,
                        pos,
                        marks: run.marks.clone(),
                    });
                }
                pos += 1;
            }
        }

        let avail = self.avail(rest);
        let mut prefix = first;
        for (line_start, cells) in logical {
            let mut chunks: Vec<Vec<Cell>> = cells.chunks(avail).map(<[Cell]>::to_vec).collect();
            if chunks.is_empty() {
                chunks.push(Vec::new());
            }
            for chunk in chunks {
                let from = chunk.first().map_or(line_start, |cell| cell.pos);
                let to = chunk.last().map_or(line_start, |cell| cell.pos + 1);
                let row = self.lines.len() as f32;
                let left = prefix.chars().count() as f32;
                self.runs.push(TextRunBox::new(
                    from,
                    to,
                    Rect::new(left, row, (to - from).max(1) as f32, 1.0),
                ));
                self.lines.push(ScreenLine {
                    prefix: prefix.to_string(),
                    kind,
                    cells: chunk,
                    label: String::new(),
                });
                prefix = rest;
            }
        }
    }
}
