//! HTML rendering of a document, as handed to the change listener.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::editing::document::{Document, Element, Node, NodeKind, TextRun};
use crate::editing::marks::Mark;

pub fn render_html(doc: &Document) -> String {
    let mut out = String::new();
    render_nodes(&doc.root().content, &mut out);
    out
}

fn render_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Element(element) => render_element(element, out),
            Node::Text(run) => render_text(run, out),
        }
    }
}

fn render_element(element: &Element, out: &mut String) {
    let (open, close) = match &element.kind {
        NodeKind::Doc => (String::new(), String::new()),
        NodeKind::Paragraph => ("<p>".into(), "</p>".into()),
        NodeKind::Heading { level } => (format!("<h{level}>"), format!("</h{level}>")),
        NodeKind::BulletList => ("<ul>".into(), "</ul>".into()),
        NodeKind::OrderedList { start: 1 } => ("<ol>".into(), "</ol>".into()),
        NodeKind::OrderedList { start } => (format!("<ol start=\"{start}\">"), "</ol>".into()),
        NodeKind::ListItem => ("<li>".into(), "</li>".into()),
        NodeKind::TaskList => ("<ul data-type=\"taskList\">".into(), "</ul>".into()),
        NodeKind::TaskItem { checked } => (
            format!("<li data-type=\"taskItem\" data-checked=\"{checked}\">"),
            "</li>".into(),
        ),
        NodeKind::Blockquote => ("<blockquote>".into(), "</blockquote>".into()),
        NodeKind::CodeBlock { language: None } => ("<pre><code>".into(), "</code></pre>".into()),
        NodeKind::CodeBlock {
            language: Some(language),
        } => (
            format!(
                "<pre><code class=\"language-{}\">",
                encode_double_quoted_attribute(language)
            ),
            "</code></pre>".into(),
        ),
        NodeKind::HorizontalRule => {
            out.push_str("<hr>");
            return;
        }
        NodeKind::Table => ("<table><tbody>".into(), "</tbody></table>".into()),
        NodeKind::TableRow => ("<tr>".into(), "</tr>".into()),
        NodeKind::TableCell => ("<td>".into(), "</td>".into()),
        NodeKind::TableHeader => ("<th>".into(), "</th>".into()),
        NodeKind::Image { src, alt } => {
            out.push_str("<img src=\"");
            out.push_str(&encode_double_quoted_attribute(src));
            out.push('"');
            if let Some(alt) = alt {
                out.push_str(" alt=\"");
                out.push_str(&encode_double_quoted_attribute(alt));
                out.push('"');
            }
            out.push('>');
            return;
        }
    };
    out.push_str(&open);
    render_nodes(&element.content, out);
    out.push_str(&close);
}

fn render_text(run: &TextRun, out: &mut String) {
    for mark in &run.marks {
        match mark {
            Mark::Bold => out.push_str("<strong>"),
            Mark::Italic => out.push_str("<em>"),
            Mark::Underline => out.push_str("<u>"),
            Mark::Strike => out.push_str("<s>"),
            Mark::Code => out.push_str("<code>"),
            Mark::Subscript => out.push_str("<sub>"),
            Mark::Superscript => out.push_str("<sup>"),
            Mark::TextColor(color) => {
                out.push_str("<span style=\"color: ");
                out.push_str(&encode_double_quoted_attribute(color));
                out.push_str("\">");
            }
            Mark::Highlight(color) => {
                out.push_str("<mark data-color=\"");
                out.push_str(&encode_double_quoted_attribute(color));
                out.push_str("\">");
            }
            Mark::Link { href } => {
                out.push_str("<a href=\"");
                out.push_str(&encode_double_quoted_attribute(href));
                out.push_str("\">");
            }
        }
    }
    out.push_str(&encode_text(&run.text));
    for mark in run.marks.iter().rev() {
        out.push_str(match mark {
            Mark::Bold => "</strong>",
            Mark::Italic => "</em>",
            Mark::Underline => "</u>",
            Mark::Strike => "</s>",
            Mark::Code => "</code>",
            Mark::Subscript => "</sub>",
            Mark::Superscript => "</sup>",
            Mark::TextColor(_) => "</span>",
            Mark::Highlight(_) => "</mark>",
            Mark::Link { .. } => "</a>",
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn test_render_marks_nest_in_canonical_order() {
        let doc = Document::new(vec![Node::paragraph(vec![
            Node::text("Na"),
            Node::marked_text("+", [Mark::Superscript, Mark::Bold]),
            Node::text(" & K"),
        ])])
        .unwrap();
        assert_snapshot!(render_html(&doc), @"<p>Na<strong><sup>+</sup></strong> &amp; K</p>");
    }

    #[test]
    fn test_render_blocks() {
        let doc = Document::new(vec![
            Node::heading(3, vec![Node::text("Pharmacology")]),
            Node::element(
                NodeKind::OrderedList { start: 3 },
                vec![Node::list_item(vec![Node::paragraph(vec![Node::text(
                    "Absorption",
                )])])],
            ),
            Node::task_list(vec![Node::task_item(
                false,
                vec![Node::paragraph(vec![Node::text("Flashcards")])],
            )]),
            Node::horizontal_rule(),
            Node::image("/a.png", Some("a \"quoted\" alt")),
        ])
        .unwrap();
        assert_snapshot!(
            render_html(&doc),
            @r#"<h3>Pharmacology</h3><ol start="3"><li><p>Absorption</p></li></ol><ul data-type="taskList"><li data-type="taskItem" data-checked="false"><p>Flashcards</p></li></ul><hr><img src="/a.png" alt="a &quot;quoted&quot; alt">"#
        );
    }

    #[test]
    fn test_render_code_and_table() {
        let doc = Document::new(vec![
            Node::element(
                NodeKind::CodeBlock {
                    language: Some("rust".into()),
                },
                vec![Node::text("a < b")],
            ),
            Node::table(vec![Node::table_row(vec![
                Node::table_header(vec![Node::paragraph(vec![Node::text("Drug")])]),
                Node::table_cell(vec![Node::paragraph(vec![Node::marked_text(
                    "warfarin",
                    [Mark::link("https://example.org/w")],
                )])]),
            ])]),
        ])
        .unwrap();
        assert_snapshot!(
            render_html(&doc),
            @r#"<pre><code class="language-rust">a &lt; b</code></pre><table><tbody><tr><th><p>Drug</p></th><td><p><a href="https://example.org/w">warfarin</a></p></td></tr></tbody></table>"#
        );
    }
}
