use std::borrow::Cow;
use std::ops::Range;

use xi_rope::Rope;
use xi_rope::delta::Builder;

use crate::editing::{Change, Editor, Patch, Position, ScrollInfo};

/// In-memory editor backed by an `xi_rope::Rope`.
///
/// The rope is the single source of truth: bytes that a pass does not edit
/// come back out of [`TextBuffer::to_bytes`] exactly as they went in, line
/// endings included. A transaction compiles all of its changes into one
/// delta, so the buffer is never observed half-edited.
#[derive(Clone)]
pub struct TextBuffer {
    buffer: Rope,
    cursor: Position,
    scroll: ScrollInfo,
    /// Incremented once per applied transaction.
    version: u64,
}

impl TextBuffer {
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::from(text))
    }

    /// Get the buffer's content as raw bytes (exact round-trip)
    pub fn to_bytes(&self) -> Vec<u8> {
        self.buffer.to_string().into_bytes()
    }

    /// Get the buffer's content, line terminators preserved.
    pub fn contents(&self) -> String {
        self.buffer.to_string()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Apply `changes` as one delta and report what moved.
    ///
    /// Changes may arrive in any order but must not overlap; an overlapping
    /// set is rejected as a whole and the buffer is left untouched.
    pub fn apply(&mut self, changes: &[Change]) -> Patch {
        let mut edits: Vec<(Range<usize>, &str)> = changes
            .iter()
            .map(|c| {
                let start = self.offset_of(c.from);
                let end = self.offset_of(c.to).max(start);
                (start..end, c.text.as_str())
            })
            .collect();
        edits.sort_by_key(|(range, _)| (range.start, range.end));

        if edits.windows(2).any(|w| w[1].0.start < w[0].0.end) {
            log::warn!("rejecting transaction with overlapping changes");
            return Patch {
                changed: Vec::new(),
                cursor: self.cursor,
                version: self.version,
            };
        }

        let cursor_offset = self.offset_of(self.cursor);
        let mut new_cursor_offset = cursor_offset;
        let mut changed = Vec::with_capacity(edits.len());
        let mut shift: isize = 0;

        let mut builder = Builder::new(self.buffer.len());
        for (range, text) in &edits {
            builder.replace(range.clone(), Rope::from(*text));

            let start = (range.start as isize + shift) as usize;
            changed.push(start..start + text.len());

            if cursor_offset >= range.end {
                new_cursor_offset = (new_cursor_offset as isize + text.len() as isize
                    - range.len() as isize) as usize;
            } else if cursor_offset > range.start {
                new_cursor_offset = start + text.len();
            }
            shift += text.len() as isize - range.len() as isize;
        }

        let delta = builder.build();
        self.buffer = delta.apply(&self.buffer);
        self.version += 1;
        self.cursor = self.position_of(new_cursor_offset);

        Patch {
            changed,
            cursor: self.cursor,
            version: self.version,
        }
    }

    /// Byte span of `line` without its terminator.
    fn line_span(&self, line: usize) -> Range<usize> {
        let start = self.buffer.offset_of_line(line);
        let end = self.buffer.offset_of_line(line + 1);
        let raw = self.buffer.slice_to_cow(start..end);
        let content = raw.trim_end_matches('\n').trim_end_matches('\r');
        start..start + content.len()
    }

    /// Byte offset of `position`, clamped to the end of its line.
    fn offset_of(&self, position: Position) -> usize {
        if position.line >= self.line_count() {
            return self.buffer.len();
        }
        let span = self.line_span(position.line);
        (span.start + position.ch).min(span.end)
    }

    fn position_of(&self, offset: usize) -> Position {
        let offset = offset.min(self.buffer.len());
        let line = self.buffer.line_of_offset(offset);
        let span = self.line_span(line);
        Position::new(line, offset.min(span.end) - span.start)
    }
}

impl From<&str> for TextBuffer {
    fn from(text: &str) -> Self {
        Self {
            buffer: Rope::from(text),
            cursor: Position::default(),
            scroll: ScrollInfo::default(),
            version: 0,
        }
    }
}

impl Editor for TextBuffer {
    fn line_count(&self) -> usize {
        self.buffer.line_of_offset(self.buffer.len()) + 1
    }

    fn line(&self, line: usize) -> Cow<'_, str> {
        if line >= self.line_count() {
            return Cow::Borrowed("");
        }
        self.buffer.slice_to_cow(self.line_span(line))
    }

    fn cursor(&self) -> Position {
        self.cursor
    }

    fn set_cursor(&mut self, position: Position) {
        self.cursor = position;
    }

    fn scroll_info(&self) -> ScrollInfo {
        self.scroll
    }

    fn scroll_to(&mut self, left: f64, top: f64) {
        self.scroll = ScrollInfo { left, top };
    }

    fn transaction(&mut self, changes: Vec<Change>) {
        let patch = self.apply(&changes);
        log::trace!(
            "applied {} change(s), buffer now at version {}",
            patch.changed.len(),
            patch.version
        );
    }
}

impl std::fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextBuffer")
            .field("text", &self.buffer.to_string())
            .field("cursor", &self.cursor)
            .field("version", &self.version)
            .finish()
    }
}
