use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use medinotes_config::Config;
use medinotes_engine::editing::{
    Bias, Cmd, DialogState, Document, DragState, Editor, EditorOptions, Mark, Node, NodeKind,
    ScrollPositionCache, Selection, Viewport,
};
use medinotes_engine::layout::{
    MenuOptions, MenuPlacement, MenuSize, Point, Rect, position_at_coordinates,
};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use crate::io;
use crate::view::{self, Screen};

pub const MENU_LABEL: &str = " B  I  U  S  Link ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

pub struct App {
    pub path: PathBuf,
    pub editor: Editor,
    pub screen: Screen,
    pub viewport: Viewport,
    pub status: String,
    dirty: Rc<Cell<bool>>,
    width: u16,
    height: u16,
    /// Anchor of a mouse selection in progress
    select_anchor: Option<usize>,
}

impl App {
    pub fn new(
        path: PathBuf,
        doc: Document,
        config: &Config,
        scroll_cache: Rc<RefCell<ScrollPositionCache>>,
    ) -> Self {
        let options = EditorOptions {
            history_limit: config.editor.history_limit,
            drag_threshold: config.editor.drag_threshold,
            menu: MenuOptions {
                gap: config.menu.gap,
                gutter: config.menu.gutter,
            },
        };
        let mut editor = Editor::new(doc, options);

        let dirty = Rc::new(Cell::new(false));
        let flag = Rc::clone(&dirty);
        editor.on_change(move |_, html| {
            log::debug!("document changed, {} bytes of html", html.len());
            flag.set(true);
        });

        let viewport = Viewport::new(path.to_string_lossy(), scroll_cache);
        let mut app = Self {
            path,
            editor,
            screen: Screen::default(),
            viewport,
            status: String::new(),
            dirty,
            width: 80,
            height: 24,
            select_anchor: None,
        };
        app.relayout();
        app
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Content area size in cells
    pub fn resize(&mut self, width: u16, height: u16) {
        if (width, height) != (self.width, self.height) {
            self.width = width;
            self.height = height;
            self.relayout();
        }
    }

    fn relayout(&mut self) {
        self.screen = view::layout_document(self.editor.doc(), self.width);
    }

    pub fn save(&mut self) -> Result<()> {
        io::write_document(&self.path, self.editor.doc())?;
        self.dirty.set(false);
        self.status = format!("Saved {}", self.path.display());
        log::info!("saved {}", self.path.display());
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if self.editor.dialog().is_open() {
            self.dialog_key(key);
            return Action::Continue;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        // Terminals deliver Ctrl+I as Tab and Ctrl+H as Backspace
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::Char('q') if ctrl => return Action::Quit,
            KeyCode::Char('s') if ctrl => {
                if let Err(err) = self.save() {
                    self.status = format!("Save failed: {err}");
                }
            }
            KeyCode::Char('z') if ctrl => {
                self.editor.undo();
            }
            KeyCode::Char('y') if ctrl => {
                self.editor.redo();
            }
            KeyCode::Char('b') if ctrl => self.toggle(Mark::Bold),
            KeyCode::Char('i') if alt => self.toggle(Mark::Italic),
            KeyCode::Char('u') if ctrl => self.toggle(Mark::Underline),
            KeyCode::Char('d') if ctrl => self.toggle(Mark::Strike),
            KeyCode::Char('k') if ctrl => {
                if !self.editor.open_link_editor() {
                    self.status = "Select text to link".to_string();
                }
            }
            KeyCode::Char('g') if ctrl => self.editor.open_image_dialog(),
            KeyCode::Char('t') if ctrl => self.toggle_task(),
            KeyCode::Char('h') if alt => self.cycle_block_type(),
            KeyCode::Char('n') if ctrl => self.insert_paragraph_after_current(),
            KeyCode::Char(ch) if !ctrl && !alt => {
                self.editor.apply(Cmd::TypeText {
                    text: ch.to_string(),
                });
            }
            KeyCode::Enter => {
                self.editor.apply(Cmd::SplitBlock);
            }
            KeyCode::Backspace => {
                self.editor.apply(Cmd::DeleteBackward);
            }
            KeyCode::Delete => {
                self.editor.apply(Cmd::DeleteSelection);
            }
            KeyCode::Left => self.step_cursor(Bias::Backward),
            KeyCode::Right => self.step_cursor(Bias::Forward),
            KeyCode::Up => self.move_vertically(-1.0),
            KeyCode::Down => self.move_vertically(1.0),
            KeyCode::Esc => {
                self.editor.drag_cancel();
                let head = self.editor.selection().head;
                self.editor.set_selection(Selection::cursor(head));
            }
            _ => {}
        }
        self.after_change();
        Action::Continue
    }

    fn dialog_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.editor.close_dialog(),
            KeyCode::Enter => {
                if self.editor.confirm_dialog().is_none() {
                    log::debug!("dialog closed without a change");
                }
                self.after_change();
            }
            KeyCode::Backspace => {
                if let Some(input) = self.editor.dialog_mut().input_mut() {
                    input.pop();
                }
            }
            KeyCode::Char(ch) => {
                if let Some(input) = self.editor.dialog_mut().input_mut() {
                    input.push(ch);
                }
            }
            _ => {}
        }
    }

    fn toggle(&mut self, mark: Mark) {
        if self.editor.apply(Cmd::ToggleMark { mark }).is_none() {
            self.status = "Select text to format".to_string();
        }
    }

    /// Position of the innermost block holding the cursor, at `depth`
    fn cursor_block(&self, depth: usize) -> Option<usize> {
        let resolved = self.editor.doc().resolve(self.editor.selection().head).ok()?;
        (resolved.depth() >= depth && depth > 0).then(|| resolved.before(depth))
    }

    fn toggle_task(&mut self) {
        let head = self.editor.selection().head;
        let Ok(resolved) = self.editor.doc().resolve(head) else {
            return;
        };
        let item = (1..=resolved.depth()).rev().find(|&depth| {
            matches!(
                resolved.node_at_depth(self.editor.doc(), depth).kind,
                NodeKind::TaskItem { .. }
            )
        });
        match item {
            Some(depth) => {
                self.editor.apply(Cmd::ToggleTask {
                    at: resolved.before(depth),
                });
            }
            None => self.status = "Not in a task".to_string(),
        }
    }

    /// Paragraph, heading 1-3, code block, back to paragraph
    fn cycle_block_type(&mut self) {
        let head = self.editor.selection().head;
        let Ok(resolved) = self.editor.doc().resolve(head) else {
            return;
        };
        let depth = resolved.depth();
        let Some(at) = self.cursor_block(depth) else {
            return;
        };
        let kind = match resolved.parent(self.editor.doc()).kind {
            NodeKind::Paragraph => NodeKind::Heading { level: 1 },
            NodeKind::Heading { level } if level < 3 => NodeKind::Heading { level: level + 1 },
            NodeKind::Heading { .. } => NodeKind::CodeBlock { language: None },
            _ => NodeKind::Paragraph,
        };
        if self.editor.apply(Cmd::SetBlockType { at, kind }).is_none() {
            self.status = "Cannot change this block".to_string();
        }
    }

    fn step_cursor(&mut self, bias: Bias) {
        let doc = self.editor.doc();
        let head = self.editor.selection().head;
        let target = match bias {
            Bias::Backward => head.saturating_sub(1),
            Bias::Forward => (head + 1).min(doc.size()),
        };
        let pos = doc.nearest_cursor_position(target, bias);
        self.editor.set_selection(Selection::cursor(pos));
    }

    fn move_vertically(&mut self, rows: f32) {
        let head = self.editor.selection().head;
        let Some((x, y)) = self.screen.cursor_cell(head) else {
            return;
        };
        if let Some(pos) =
            position_at_coordinates(self.editor.doc(), &self.screen.layout, x, y + rows)
        {
            let pos = self.editor.doc().nearest_cursor_position(pos, Bias::Forward);
            self.editor.set_selection(Selection::cursor(pos));
        }
    }

    /// Handle a mouse event at screen cell coordinates, with the content area
    /// starting at `origin`
    pub fn handle_mouse(&mut self, mouse: MouseEvent, origin: (u16, u16)) {
        if mouse.column < origin.0 || mouse.row < origin.1 {
            return;
        }
        let column = mouse.column - origin.0;
        let row = (mouse.row - origin.1) as f32 + self.viewport.offset();
        let point = Point::new(column as f32, row);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(handle) = self.screen.handle_at(column as usize, row as usize) {
                    self.editor.drag_press(handle.pos, point);
                    return;
                }
                if let Some(pos) = self.hit(point) {
                    self.editor.set_selection(Selection::cursor(pos));
                    self.select_anchor = Some(pos);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if !matches!(self.editor.drag_state(), DragState::Idle) {
                    self.editor.drag_move(&self.screen.layout, point);
                } else if let (Some(anchor), Some(pos)) = (self.select_anchor, self.hit(point)) {
                    self.editor.set_selection(Selection::new(anchor, pos));
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.select_anchor = None;
                if matches!(self.editor.drag_state(), DragState::Dragging(_)) {
                    if let Err(reason) = self.editor.drag_drop() {
                        log::debug!("drop ignored: {reason}");
                    }
                    self.after_change();
                } else {
                    self.editor.drag_cancel();
                }
            }
            MouseEventKind::ScrollUp => self.viewport.scroll_by(-3.0),
            MouseEventKind::ScrollDown => {
                let max = self.screen.lines.len().saturating_sub(1) as f32;
                self.viewport.scroll_to((self.viewport.offset() + 3.0).min(max));
            }
            _ => {}
        }
    }

    fn hit(&self, point: Point) -> Option<usize> {
        position_at_coordinates(self.editor.doc(), &self.screen.layout, point.x, point.y)
            .map(|pos| self.editor.doc().nearest_cursor_position(pos, Bias::Backward))
    }

    fn after_change(&mut self) {
        self.relayout();
        if let Some((_, y)) = self.screen.cursor_cell(self.editor.selection().head) {
            self.viewport.reveal(y, y + 1.0, f32::from(self.height));
        }
    }

    /// Menu placement in content-area rows relative to the scroll offset
    pub fn menu_placement(&self) -> MenuPlacement {
        let top = self.viewport.offset();
        let container = Rect::new(0.0, top, f32::from(self.width), f32::from(self.height));
        let size = MenuSize::new(MENU_LABEL.chars().count() as f32, 1.0);
        match self.editor.menu_position(&self.screen.layout, container, size) {
            MenuPlacement::Shown {
                top: menu_top,
                left,
                side,
            } => MenuPlacement::Shown {
                top: menu_top - top,
                left,
                side,
            },
            MenuPlacement::Hidden => MenuPlacement::Hidden,
        }
    }

    pub fn dialog_title(&self) -> Option<&'static str> {
        match self.editor.dialog() {
            DialogState::Closed => None,
            DialogState::LinkEditor { .. } => Some("Link (empty removes)"),
            DialogState::ImageInsert { .. } => Some("Image source"),
        }
    }

    pub fn insert_paragraph_after_current(&mut self) {
        let Some(at) = self.cursor_block(1).map(|before| {
            let doc = self.editor.doc();
            before + doc.node_at(before).map_or(0, Node::node_size)
        }) else {
            return;
        };
        self.editor.apply(Cmd::InsertNodes {
            at,
            nodes: vec![Node::paragraph(Vec::new())],
        });
        self.after_change();
    }
}
