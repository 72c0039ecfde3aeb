//! Modal dialogs as one explicit state machine. Each dialog is a view of the
//! current [`DialogState`]; confirming turns the state into an editing command.

use crate::editing::commands::Cmd;
use crate::editing::document::{Document, Node};
use crate::editing::marks::{Mark, MarkType};
use crate::editing::selection::Selection;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DialogState {
    #[default]
    Closed,
    /// Editing the link over `from..to`; an empty `href` removes the link
    LinkEditor { from: usize, to: usize, href: String },
    /// Choosing an image to insert at block boundary `at`
    ImageInsert { at: usize, src: String, alt: String },
}

impl DialogState {
    pub fn is_open(&self) -> bool {
        !matches!(self, DialogState::Closed)
    }

    /// Open the link editor for the selection, prefilled with the link already
    /// there. Returns `Closed` for a collapsed selection.
    pub fn link_editor(doc: &Document, selection: Selection) -> Self {
        if selection.is_empty() {
            return DialogState::Closed;
        }
        let (from, to) = (selection.from(), selection.to());
        DialogState::LinkEditor {
            from,
            to,
            href: existing_link(doc, from, to).unwrap_or_default(),
        }
    }

    /// Open the image dialog; the image goes after the top-level block holding
    /// the cursor
    pub fn image_insert(doc: &Document, selection: Selection) -> Self {
        let at = doc
            .resolve(selection.head)
            .ok()
            .filter(|resolved| resolved.depth() > 0)
            .map(|resolved| resolved.after(doc, 1))
            .unwrap_or_else(|| doc.size());
        DialogState::ImageInsert {
            at,
            src: String::new(),
            alt: String::new(),
        }
    }

    /// Text field the open dialog is editing
    pub fn input(&self) -> Option<&str> {
        match self {
            DialogState::Closed => None,
            DialogState::LinkEditor { href, .. } => Some(href.as_str()),
            DialogState::ImageInsert { src, .. } => Some(src.as_str()),
        }
    }

    pub fn input_mut(&mut self) -> Option<&mut String> {
        match self {
            DialogState::Closed => None,
            DialogState::LinkEditor { href, .. } => Some(href),
            DialogState::ImageInsert { src, .. } => Some(src),
        }
    }

    /// Close the dialog, producing the command its inputs describe. Confirming
    /// an image dialog without a source produces nothing.
    pub fn confirm(&mut self) -> Option<Cmd> {
        match std::mem::take(self) {
            DialogState::Closed => None,
            DialogState::LinkEditor { from, to, href } => {
                let href = href.trim();
                Some(Cmd::SetLink {
                    range: from..to,
                    href: (!href.is_empty()).then(|| href.to_string()),
                })
            }
            DialogState::ImageInsert { at, src, alt } => {
                let src = src.trim();
                if src.is_empty() {
                    return None;
                }
                let alt = alt.trim();
                Some(Cmd::InsertNodes {
                    at,
                    nodes: vec![Node::image(src, (!alt.is_empty()).then_some(alt))],
                })
            }
        }
    }

    pub fn close(&mut self) {
        *self = DialogState::Closed;
    }
}

fn existing_link(doc: &Document, from: usize, to: usize) -> Option<String> {
    doc.textblocks().into_iter().find_map(|(start, block)| {
        let mut run_start = start;
        block.content.iter().find_map(|node| {
            let run_end = run_start + node.node_size();
            let overlaps = run_end > from && run_start < to;
            run_start = run_end;
            let Node::Text(run) = node else {
                return None;
            };
            if !overlaps || !run.marks.has_type(MarkType::Link) {
                return None;
            }
            run.marks.iter().find_map(|mark| match mark {
                Mark::Link { href } => Some(href.clone()),
                _ => None,
            })
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc() -> Document {
        Document::new(vec![
            Node::paragraph(vec![
                Node::text("see "),
                Node::marked_text("atlas", [Mark::link("https://atlas.example")]),
            ]),
            Node::paragraph(vec![Node::text("next")]),
        ])
        .unwrap()
    }

    #[test]
    fn test_link_editor_prefills_existing_link() {
        let state = DialogState::link_editor(&doc(), Selection::new(5, 10));
        assert_eq!(
            state,
            DialogState::LinkEditor {
                from: 5,
                to: 10,
                href: "https://atlas.example".into(),
            }
        );
    }

    #[test]
    fn test_link_editor_needs_a_selection() {
        assert_eq!(
            DialogState::link_editor(&doc(), Selection::cursor(3)),
            DialogState::Closed
        );
    }

    #[test]
    fn test_empty_href_removes_link() {
        let mut state = DialogState::link_editor(&doc(), Selection::new(5, 10));
        if let Some(input) = state.input_mut() {
            input.clear();
        }
        assert_eq!(
            state.confirm(),
            Some(Cmd::SetLink {
                range: 5..10,
                href: None,
            })
        );
        assert!(!state.is_open());
    }

    #[test]
    fn test_image_goes_after_current_block() {
        let mut state = DialogState::image_insert(&doc(), Selection::cursor(3));
        if let Some(input) = state.input_mut() {
            input.push_str("/img/heart.png");
        }
        assert_eq!(
            state.confirm(),
            Some(Cmd::InsertNodes {
                at: 11,
                nodes: vec![Node::image("/img/heart.png", None)],
            })
        );
    }

    #[test]
    fn test_image_without_source_does_nothing() {
        let mut state = DialogState::image_insert(&doc(), Selection::cursor(3));
        assert_eq!(state.confirm(), None);
        assert_eq!(state, DialogState::Closed);
    }
}
