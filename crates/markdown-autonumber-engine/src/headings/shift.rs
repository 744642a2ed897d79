//! Raising and lowering heading levels over a block of lines.

use thiserror::Error;

use crate::editing::{EditBatch, Editor, Position};
use crate::metadata::DocumentMetadata;

const DEEPEST_LEVEL: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShiftError {
    #[error("Cannot increase: selection already contains a level 6 heading")]
    AlreadyDeepest,

    #[error("Cannot decrease: selection contains a heading at or above level {0}")]
    AtLimit(u8),
}

/// Level of an ATX heading line (`#` run followed by whitespace), 0 otherwise.
pub fn heading_level(line: &str) -> usize {
    let hashes = line.len() - line.trim_start_matches('#').len();
    let rest = &line[hashes..];
    if hashes > 0 && rest.starts_with(char::is_whitespace) {
        hashes
    } else {
        0
    }
}

/// `line` with its heading markers replaced by a level `level` marker;
/// level 0 leaves plain text.
pub fn apply_heading(line: &str, level: usize) -> String {
    let body = if heading_level(line) > 0 {
        line.trim_start_matches('#').trim_start()
    } else {
        line
    };

    if level == 0 {
        body.to_string()
    } else {
        format!("{} {body}", "#".repeat(level))
    }
}

/// Set every line in `from..=to` to a level `level` heading. Front matter,
/// code and table rows are left alone.
pub fn apply_heading_to_lines<E: Editor + ?Sized>(
    editor: &mut E,
    from: usize,
    to: usize,
    level: usize,
) -> bool {
    let metadata = DocumentMetadata::from_editor(&*editor);
    let lines: Vec<usize> = clamp_lines(&*editor, from, to)
        .filter(|&n| !metadata.is_excluded(n, &editor.line(n)))
        .collect();
    rewrite_lines(editor, &lines, |line| apply_heading(line, level))
}

/// Push every heading in `from..=to` one level deeper. With
/// `include_plain`, non-heading lines become level 1 headings.
pub fn increase_headings<E: Editor + ?Sized>(
    editor: &mut E,
    from: usize,
    to: usize,
    include_plain: bool,
) -> Result<bool, ShiftError> {
    let selection = HeadingLines::collect(&*editor, from, to, include_plain);
    if selection.deepest.is_some_and(|level| level >= DEEPEST_LEVEL) {
        return Err(ShiftError::AlreadyDeepest);
    }

    Ok(rewrite_lines(editor, &selection.lines, |line| {
        apply_heading(line, heading_level(line) + 1)
    }))
}

/// Lift every heading in `from..=to` one level. Refuses when any heading is
/// already at `limit_from` or shallower.
pub fn decrease_headings<E: Editor + ?Sized>(
    editor: &mut E,
    from: usize,
    to: usize,
    limit_from: u8,
) -> Result<bool, ShiftError> {
    let selection = HeadingLines::collect(&*editor, from, to, false);
    if selection
        .shallowest
        .is_some_and(|level| level <= usize::from(limit_from))
    {
        return Err(ShiftError::AtLimit(limit_from));
    }

    Ok(rewrite_lines(editor, &selection.lines, |line| {
        apply_heading(line, heading_level(line).saturating_sub(1))
    }))
}

struct HeadingLines {
    lines: Vec<usize>,
    deepest: Option<usize>,
    shallowest: Option<usize>,
}

impl HeadingLines {
    fn collect<E: Editor + ?Sized>(editor: &E, from: usize, to: usize, include_plain: bool) -> Self {
        let metadata = DocumentMetadata::from_editor(editor);
        let mut lines = Vec::new();
        let mut deepest = None;
        let mut shallowest = None;

        for n in clamp_lines(editor, from, to) {
            let text = editor.line(n);
            if metadata.is_excluded(n, &text) {
                continue;
            }
            let level = heading_level(&text);
            if level > 0 {
                deepest = deepest.max(Some(level));
                shallowest = Some(shallowest.map_or(level, |s: usize| s.min(level)));
            }
            if level > 0 || include_plain {
                lines.push(n);
            }
        }

        Self {
            lines,
            deepest,
            shallowest,
        }
    }
}

fn clamp_lines<E: Editor + ?Sized>(editor: &E, from: usize, to: usize) -> std::ops::RangeInclusive<usize> {
    let last = editor.line_count().saturating_sub(1);
    from.min(last)..=to.min(last)
}

fn rewrite_lines<E, F>(editor: &mut E, lines: &[usize], rewrite: F) -> bool
where
    E: Editor + ?Sized,
    F: Fn(&str) -> String,
{
    let mut batch = EditBatch::new();
    for &n in lines {
        let line = editor.line(n);
        let replacement = rewrite(&line);
        let end = line.len();
        drop(line);
        batch.replace_economically(
            &*editor,
            Position::new(n, 0),
            Position::new(n, end),
            replacement,
        );
    }
    batch.commit(editor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::TextBuffer;
    use rstest::rstest;

    #[rstest]
    #[case("# Title", 1)]
    #[case("###\tTabbed", 3)]
    #[case("#hashtag", 0)]
    #[case("Plain", 0)]
    #[case("####### Seven", 7)]
    fn reads_heading_level(#[case] line: &str, #[case] level: usize) {
        assert_eq!(heading_level(line), level);
    }

    #[rstest]
    #[case("Plain", 2, "## Plain")]
    #[case("### Deep", 1, "# Deep")]
    #[case("## Gone", 0, "Gone")]
    #[case("#tag stays", 1, "# #tag stays")]
    fn applies_heading_level(#[case] line: &str, #[case] level: usize, #[case] expected: &str) {
        assert_eq!(apply_heading(line, level), expected);
    }

    #[test]
    fn increase_shifts_only_headings() {
        let mut doc = TextBuffer::from("# A\ntext\n## B");

        assert_eq!(increase_headings(&mut doc, 0, 2, false), Ok(true));
        assert_eq!(doc.contents(), "## A\ntext\n### B");
    }

    #[test]
    fn forced_increase_promotes_plain_lines() {
        let mut doc = TextBuffer::from("# A\ntext");

        assert_eq!(increase_headings(&mut doc, 0, 1, true), Ok(true));
        assert_eq!(doc.contents(), "## A\n# text");
    }

    #[test]
    fn increase_refuses_past_level_six() {
        let mut doc = TextBuffer::from("# A\n###### B");

        assert_eq!(
            increase_headings(&mut doc, 0, 1, false),
            Err(ShiftError::AlreadyDeepest)
        );
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn decrease_respects_limit() {
        let mut doc = TextBuffer::from("## A\n### B");

        assert_eq!(decrease_headings(&mut doc, 0, 1, 1), Ok(true));
        assert_eq!(doc.contents(), "# A\n## B");

        assert_eq!(
            decrease_headings(&mut doc, 0, 1, 1),
            Err(ShiftError::AtLimit(1))
        );
    }

    #[test]
    fn shifting_leaves_code_and_front_matter_alone() {
        let text = "---\n# yaml comment\n---\n# Title\n```python\n# comment\n```";
        let mut doc = TextBuffer::from(text);

        assert_eq!(increase_headings(&mut doc, 0, 6, true), Ok(true));
        assert_eq!(
            doc.contents(),
            "---\n# yaml comment\n---\n## Title\n```python\n# comment\n```"
        );

        assert_eq!(decrease_headings(&mut doc, 0, 6, 1), Ok(true));
        assert_eq!(doc.contents(), text);
    }

    #[test]
    fn fenced_level_six_comment_does_not_block_increase() {
        let mut doc = TextBuffer::from("# A\n```\n###### not a heading\n```");

        assert_eq!(increase_headings(&mut doc, 0, 3, false), Ok(true));
        assert_eq!(doc.line(0), "## A");
    }

    #[test]
    fn apply_to_lines_clamps_range() {
        let mut doc = TextBuffer::from("one\ntwo");

        assert!(apply_heading_to_lines(&mut doc, 1, 10, 3));
        assert_eq!(doc.contents(), "one\n### two");
    }
}
