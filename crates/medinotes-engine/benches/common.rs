// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use medinotes_engine::editing::{Document, Mark, Node};
use medinotes_engine::layout::{BlockBox, Rect, RenderedLayout, TextRunBox};

#[allow(dead_code)]
pub const LINE_HEIGHT: f32 = 20.0;
#[allow(dead_code)]
pub const CHAR_WIDTH: f32 = 8.0;

/// A notebook of `sections` headings, each followed by a marked paragraph and a
/// two item list
#[allow(dead_code)]
pub fn generate_notebook(sections: usize) -> Document {
    let mut blocks = Vec::with_capacity(sections * 3);
    for section in 0..sections {
        blocks.push(Node::heading(
            2,
            vec![Node::text(format!("Section {section}"))],
        ));
        blocks.push(Node::paragraph(vec![
            Node::text("Some paragraph content with "),
            Node::marked_text("important", [Mark::Bold]),
            Node::text(" terms for revision."),
        ]));
        blocks.push(Node::bullet_list(vec![
            Node::list_item(vec![Node::paragraph(vec![Node::text("First point")])]),
            Node::list_item(vec![Node::paragraph(vec![Node::text("Second point")])]),
        ]));
    }
    Document::new(blocks).unwrap_or_default()
}

/// One line per textblock, one block box per top-level block
#[allow(dead_code)]
pub fn generate_layout(doc: &Document) -> RenderedLayout {
    let runs = doc
        .textblocks()
        .into_iter()
        .enumerate()
        .map(|(line, (start, block))| {
            let len = block.content_size();
            TextRunBox::new(
                start,
                start + len,
                Rect::new(
                    0.0,
                    line as f32 * LINE_HEIGHT,
                    len as f32 * CHAR_WIDTH,
                    LINE_HEIGHT,
                ),
            )
        })
        .collect::<Vec<_>>();

    let mut pos = 0;
    let mut blocks = Vec::new();
    let mut line = 0;
    for node in doc.content() {
        let lines = match node {
            Node::Element(element) if element.kind.is_textblock() => 1,
            _ => node.text_content().lines().count().max(1),
        };
        blocks.push(BlockBox::new(
            pos,
            Rect::new(
                0.0,
                line as f32 * LINE_HEIGHT,
                800.0,
                lines as f32 * LINE_HEIGHT,
            ),
        ));
        pos += node.node_size();
        line += lines;
    }
    RenderedLayout::new(runs, blocks)
}
