/*!
 * # Editing Core Module
 *
 * Block-structured rich-text editing over an immutable document tree.
 *
 * ## Architecture Overview
 *
 * ### 1. Immutable Document Tree
 * - A **`Document`** is a schema-valid tree of block and inline nodes
 * - Every node has a size; integer **positions** address the gaps between
 *   characters and node boundaries, so the tree can be edited by position
 * - Documents are values: edits produce a new document and never mutate in place
 *
 * ### 2. Steps and Transactions
 * - Every edit is a **`Step`** (insert, delete, set/remove mark, replace node, split)
 * - Each step reduces to replacing a run of siblings of one parent, which makes
 *   its inverse exact and gives a **`StepMap`** for remapping positions
 * - A **`Transaction`** applies steps atomically and carries the inverse used by undo
 *
 * ### 3. Commands
 * - UI input is expressed as **Commands** (`Cmd` enum) compiled into transactions
 *   against the current selection
 * - Command failures are expected and make the command a no-op
 *
 * ### 4. Synchronization
 * - The **`SyncController`** owns the live document and selection
 * - Externally supplied documents equal to the current one are ignored so the
 *   cursor survives host re-renders
 *
 * ### 5. Pointer Interaction
 * - The **`DragController`** moves whole blocks by dragging their handle
 * - Hit-testing and menu placement live in [`crate::layout`]
 *
 * ## Module Structure
 *
 * - **`document`**, **`marks`**, **`schema`**: the tree, inline marks and content rules
 * - **`position`**, **`selection`**: position resolution and anchor/head selections
 * - **`transform`**, **`step`**, **`transaction`**: tree surgery and atomic edits
 * - **`commands`**, **`history`**, **`patch`**, **`editor`**: command layer and undo
 * - **`json`**, **`render`**: the JSON document contract and HTML output
 * - **`sync`**, **`drag`**, **`dialogs`**, **`view`**: interaction state
 *
 * ## Usage Pattern
 *
 * ```rust
 * use medinotes_engine::editing::*;
 *
 * let doc = Document::new(vec![Node::paragraph(vec![Node::text("Hello")])]).unwrap();
 * let mut editor = Editor::new(doc, EditorOptions::default());
 *
 * editor.set_selection(Selection::cursor(6));
 * let patch = editor.apply(Cmd::TypeText { text: " world".to_string() }).unwrap();
 * assert_eq!(patch.version, 1);
 * assert_eq!(editor.doc().text_content(), "Hello world");
 *
 * editor.undo();
 * assert_eq!(editor.doc().text_content(), "Hello");
 * ```
 */

// Module exports
pub mod commands;
pub mod dialogs;
pub mod document;
pub mod drag;
pub mod editor;
pub mod history;
pub mod json;
pub mod marks;
pub mod patch;
pub mod position;
pub mod render;
pub mod schema;
pub mod selection;
pub mod step;
pub mod sync;
pub mod transaction;
pub mod transform;
pub mod view;

// Public API re-exports
pub use commands::{Cmd, compile_command, range_has_mark};
pub use dialogs::DialogState;
pub use document::{Document, Element, Node, NodeKind, NodeType, TextRun};
pub use drag::{DragAborted, DragController, DragState, DropSide, DropTarget};
pub use editor::{Editor, EditorOptions};
pub use history::History;
pub use json::{apply_schema, to_json};
pub use marks::{Mark, MarkSet, MarkType};
pub use patch::Patch;
pub use position::{Bias, ResolvedPos};
pub use render::render_html;
pub use schema::SchemaError;
pub use selection::Selection;
pub use step::{Step, StepMap};
pub use sync::{SyncController, SyncOutcome, SyncState};
pub use transaction::{Applied, Transaction, TransactionError};
pub use view::{ScrollPositionCache, Viewport};
