//! Heading renumbering.
//!
//! The pass walks the scanned headings in document order and keeps one
//! counter per open level in a [`NumberingStack`]. Each heading's prefix is
//! recomposed from the stack and queued only when it differs from what the
//! line already says, so a second pass over its own output is a no-op.

pub mod shift;

use crate::editing::{EditBatch, Editor, PassOptions, Position, ViewState};
use crate::metadata::{DocumentMetadata, HeadingInfo};
use crate::numbering::NumberingToken;
use crate::settings::HeadingSettings;
use crate::text::{find_prefix_range, heading_hashes, is_line_ignored};

pub use shift::{
    ShiftError, apply_heading, apply_heading_to_lines, decrease_headings, heading_level,
    increase_headings,
};

/// Counters of the currently open heading levels, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberingStack {
    tokens: Vec<NumberingToken>,
}

impl NumberingStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[NumberingToken] {
        &self.tokens
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    pub fn push(&mut self, token: NumberingToken) {
        self.tokens.push(token);
    }

    pub fn pop(&mut self) -> Option<NumberingToken> {
        self.tokens.pop()
    }

    /// Replace the innermost counter with its successor.
    pub fn advance(&mut self) {
        if let Some(top) = self.tokens.pop() {
            self.tokens.push(top.next());
        }
    }

    /// The numbering text for the stack: a leading space, then each token
    /// preceded by the separator configured for its position.
    pub fn render(&self, settings: &HeadingSettings) -> String {
        let mut out = String::new();
        for (position, token) in self.tokens.iter().enumerate() {
            if position == 0 {
                out.push(' ');
            } else {
                out.push_str(settings.separator(position));
            }
            out.push_str(&token.printable());
        }
        out
    }
}

/// Renumber every heading in the document. Returns whether anything changed.
pub fn renumber_headings<E: Editor + ?Sized>(
    editor: &mut E,
    metadata: &DocumentMetadata,
    settings: &HeadingSettings,
    options: PassOptions,
) -> bool {
    if !settings.enabled && !options.force {
        return false;
    }
    if metadata.headings.is_empty() {
        return false;
    }

    let view = ViewState::capture(&*editor);
    let batch = plan_renumbering(&*editor, metadata, settings, |_, _| {});
    let edits = batch.len();
    let changed = batch.commit(editor);

    if changed && options.restore_view {
        view.restore(editor);
    }
    log::debug!("heading pass queued {edits} edit(s)");
    changed
}

/// Strip numbering from every heading, whatever the settings say.
pub fn remove_heading_numbering<E: Editor + ?Sized>(
    editor: &mut E,
    metadata: &DocumentMetadata,
) -> bool {
    let mut batch = EditBatch::new();

    for heading in &metadata.headings {
        let line = editor.line(heading.line);
        if is_line_ignored(heading.line, &line, &metadata.code_blocks) {
            continue;
        }
        let (Some(range), Some(hashes)) = (find_prefix_range(&line), heading_hashes(&line)) else {
            continue;
        };

        let replacement = format!("{hashes} ");
        batch.replace_economically(
            &*editor,
            Position::new(heading.line, range.start),
            Position::new(heading.line, range.end),
            replacement,
        );
    }

    log::debug!("heading removal queued {} edit(s)", batch.len());
    batch.commit(editor)
}

/// Walk the headings and queue prefix edits against the current text.
/// `observe` sees each heading that reached the stack, with the stack as it
/// stands after that heading.
fn plan_renumbering<E, F>(
    editor: &E,
    metadata: &DocumentMetadata,
    settings: &HeadingSettings,
    mut observe: F,
) -> EditBatch
where
    E: Editor + ?Sized,
    F: FnMut(&HeadingInfo, &NumberingStack),
{
    let first_level = usize::from(settings.first_level);
    let max_level = usize::from(settings.max_level);

    let mut batch = EditBatch::new();
    let mut stack = NumberingStack::new();
    let mut previous_level = first_level.saturating_sub(1);

    for heading in &metadata.headings {
        let level = usize::from(heading.level);
        let line = editor.line(heading.line);

        if is_line_ignored(heading.line, &line, &metadata.code_blocks) {
            continue;
        }

        if level < first_level {
            previous_level = first_level.saturating_sub(1);
            stack.clear();
            observe(heading, &stack);
            continue;
        }

        if settings.should_skip(&heading.text) {
            continue;
        }

        if level == previous_level {
            stack.advance();
        } else if level < previous_level {
            for _ in level..previous_level {
                stack.pop();
            }
            stack.advance();
        } else {
            for level_index in previous_level..level {
                stack.push(settings.first_token(level_index));
            }
        }
        previous_level = level;
        observe(heading, &stack);

        if level > max_level {
            continue;
        }

        let Some(range) = find_prefix_range(&line) else {
            log::debug!("no heading prefix on line {}", heading.line);
            continue;
        };
        let Some(hashes) = heading_hashes(&line) else {
            continue;
        };

        let replacement = format!(
            "{hashes}{}{} ",
            stack.render(settings),
            settings.primary_separator()
        );
        batch.replace_economically(
            editor,
            Position::new(heading.line, range.start),
            Position::new(heading.line, range.end),
            replacement,
        );
    }

    batch
}
