/*!
 * # Editing Boundary
 *
 * Numbering passes never own the document. They read it line by line through
 * the [`Editor`] trait, queue replacements in an [`EditBatch`] computed against
 * that fixed pre-pass view, and hand the whole batch back to the editor as one
 * atomic transaction.
 *
 * ## Pass shape
 *
 * ```text
 * capture ViewState → read lines → EditBatch::replace_economically(...)
 *                   → EditBatch::commit (one transaction) → ViewState::restore
 * ```
 *
 * [`TextBuffer`] is the in-memory implementation used by the CLI and the
 * tests: an `xi_rope::Rope` whose transactions compile to a single delta.
 *
 * ## Usage
 *
 * ```rust
 * use markdown_autonumber_engine::editing::{EditBatch, Editor, Position, TextBuffer};
 *
 * let mut doc = TextBuffer::from_bytes(b"# Title\nBody").unwrap();
 * let mut batch = EditBatch::new();
 * batch.replace_economically(
 *     &doc,
 *     Position::new(0, 0),
 *     Position::new(0, 2),
 *     "# 1 ".to_string(),
 * );
 * assert!(batch.commit(&mut doc));
 * assert_eq!(doc.line(0), "# 1 Title");
 * ```
 */

pub mod buffer;
pub mod patch;

use std::borrow::Cow;

pub use buffer::TextBuffer;
pub use patch::Patch;

/// A caret position. `ch` is a byte column and always sits on a char boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub ch: usize,
}

impl Position {
    pub fn new(line: usize, ch: usize) -> Self {
        Self { line, ch }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollInfo {
    pub left: f64,
    pub top: f64,
}

/// Replace the text between `from` and `to` with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub from: Position,
    pub to: Position,
    pub text: String,
}

/// The host editor a numbering pass operates on.
pub trait Editor {
    fn line_count(&self) -> usize;

    /// Text of `line` without its line terminator; empty past the end.
    fn line(&self, line: usize) -> Cow<'_, str>;

    fn cursor(&self) -> Position;

    fn set_cursor(&mut self, position: Position);

    fn scroll_info(&self) -> ScrollInfo;

    fn scroll_to(&mut self, left: f64, top: f64);

    /// Apply every change or none of them. All positions refer to the text
    /// as it was before the transaction.
    fn transaction(&mut self, changes: Vec<Change>);

    /// Text between two positions, lines joined with `\n`.
    fn range_text(&self, from: Position, to: Position) -> String {
        if from.line == to.line {
            let line = self.line(from.line);
            let end = to.ch.min(line.len());
            let start = from.ch.min(end);
            return line.get(start..end).unwrap_or_default().to_string();
        }

        let mut out = String::new();
        for n in from.line..=to.line {
            let line = self.line(n);
            let start = if n == from.line { from.ch.min(line.len()) } else { 0 };
            let end = if n == to.line { to.ch.min(line.len()) } else { line.len() };
            out.push_str(line.get(start..end.max(start)).unwrap_or_default());
            if n != to.line {
                out.push('\n');
            }
        }
        out
    }

    /// Whole document, lines joined with `\n`.
    fn text(&self) -> String {
        (0..self.line_count())
            .map(|n| self.line(n).into_owned())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Changes gathered during one pass, applied together at the end.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EditBatch {
    changes: Vec<Change>,
}

impl EditBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a replacement unless `text` already matches the range contents.
    /// Returns whether a change was queued.
    pub fn replace_economically<E: Editor + ?Sized>(
        &mut self,
        editor: &E,
        from: Position,
        to: Position,
        text: String,
    ) -> bool {
        if editor.range_text(from, to) == text {
            return false;
        }
        self.changes.push(Change { from, to, text });
        true
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Hand the batch to the editor as one transaction. Returns false (and
    /// leaves the editor alone) when nothing was queued.
    pub fn commit<E: Editor + ?Sized>(self, editor: &mut E) -> bool {
        if self.changes.is_empty() {
            return false;
        }
        editor.transaction(self.changes);
        true
    }
}

/// How a numbering pass treats settings and the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassOptions {
    /// Run even when the settings say numbering is disabled.
    pub force: bool,
    /// Put cursor and scroll back after editing.
    pub restore_view: bool,
}

impl Default for PassOptions {
    fn default() -> Self {
        Self {
            force: false,
            restore_view: true,
        }
    }
}

/// Cursor and scroll offset captured before a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub cursor: Position,
    pub scroll: ScrollInfo,
}

impl ViewState {
    pub fn capture<E: Editor + ?Sized>(editor: &E) -> Self {
        Self {
            cursor: editor.cursor(),
            scroll: editor.scroll_info(),
        }
    }

    pub fn restore<E: Editor + ?Sized>(&self, editor: &mut E) {
        restore_cursor(editor, self.cursor);
        editor.scroll_to(self.scroll.left, self.scroll.top);
    }
}

/// Put the cursor back on its old line, clamped to that line's new length.
/// A line that no longer exists leaves the cursor where the editor put it.
pub fn restore_cursor<E: Editor + ?Sized>(editor: &mut E, cursor: Position) {
    if cursor.line >= editor.line_count() {
        return;
    }

    let line = editor.line(cursor.line);
    let mut ch = cursor.ch.min(line.len());
    while !line.is_char_boundary(ch) {
        ch -= 1;
    }
    drop(line);

    editor.set_cursor(Position::new(cursor.line, ch));
}
