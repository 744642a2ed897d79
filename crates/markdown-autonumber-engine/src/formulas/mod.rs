//! Display-math equation numbering.
//!
//! Equations are the spans between consecutive `$$` delimiters. Each gets a
//! `\tag{...}` label: a running counter, or in heading-based mode the number
//! currently written on the nearest qualifying heading followed by a
//! per-heading ordinal.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::editing::{Change, EditBatch, Editor, PassOptions, Position, ViewState};
use crate::metadata::DocumentMetadata;
use crate::settings::{FormulaMode, FormulaSettings};
use crate::text::{existing_numbering, is_line_ignored};

const DELIMITER: &str = "$$";

static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static TAG_WITH_SPACE_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_tag_regex() -> &'static Regex {
    TAG_REGEX.get_or_init(|| Regex::new(r"\\tag\{([^}]*)\}").expect("Invalid tag regex"))
}

fn get_tag_with_space_regex() -> &'static Regex {
    TAG_WITH_SPACE_REGEX
        .get_or_init(|| Regex::new(r"\s*\\tag\{[^}]*\}").expect("Invalid tag removal regex"))
}

/// One `$$ ... $$` pair; positions point at the first `$` of each delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Equation {
    pub open: Position,
    pub close: Position,
}

impl Equation {
    /// Byte range strictly between the delimiters on `line`, if the
    /// equation covers it.
    fn segment(&self, line: usize, line_len: usize) -> Option<std::ops::Range<usize>> {
        if line < self.open.line || line > self.close.line {
            return None;
        }
        let start = if line == self.open.line {
            self.open.ch + DELIMITER.len()
        } else {
            0
        };
        let end = if line == self.close.line {
            self.close.ch
        } else {
            line_len
        };
        (start <= end).then_some(start..end)
    }
}

/// Pair up `$$` delimiters in document order. Lines the exclusion classifier
/// rejects contribute none; an unpaired trailing delimiter is dropped.
pub fn find_equations<E: Editor + ?Sized>(editor: &E, metadata: &DocumentMetadata) -> Vec<Equation> {
    let mut delimiters = Vec::new();
    for n in 0..editor.line_count() {
        let line = editor.line(n);
        if is_line_ignored(n, &line, &metadata.code_blocks) {
            continue;
        }
        delimiters.extend(line.match_indices(DELIMITER).map(|(ch, _)| Position::new(n, ch)));
    }

    if delimiters.len() % 2 == 1 {
        log::debug!("ignoring unpaired $$ at line {}", delimiters[delimiters.len() - 1].line);
    }

    delimiters
        .chunks_exact(2)
        .map(|pair| Equation {
            open: pair[0],
            close: pair[1],
        })
        .collect()
}

/// Existing `\tag{...}` inside an equation: where its label sits and what it says.
struct ExistingTag {
    line: usize,
    label: std::ops::Range<usize>,
    text: String,
}

fn find_tag<E: Editor + ?Sized>(
    editor: &E,
    metadata: &DocumentMetadata,
    equation: &Equation,
) -> Option<ExistingTag> {
    (equation.open.line..=equation.close.line).find_map(|n| {
        let line = editor.line(n);
        if is_line_ignored(n, &line, &metadata.code_blocks) {
            return None;
        }
        let segment = equation.segment(n, line.len())?;
        let captures = get_tag_regex().captures(&line[segment.clone()])?;
        let label = captures.get(1)?;
        Some(ExistingTag {
            line: n,
            label: segment.start + label.start()..segment.start + label.end(),
            text: label.as_str().to_string(),
        })
    })
}

/// Hands out equation labels in document order.
struct Labeler<'a> {
    settings: &'a FormulaSettings,
    metadata: &'a DocumentMetadata,
    counter: usize,
    per_heading: HashMap<String, usize>,
}

impl<'a> Labeler<'a> {
    fn new(settings: &'a FormulaSettings, metadata: &'a DocumentMetadata) -> Self {
        Self {
            settings,
            metadata,
            counter: 0,
            per_heading: HashMap::new(),
        }
    }

    fn next_label<E: Editor + ?Sized>(&mut self, editor: &E, equation: &Equation) -> String {
        if self.settings.mode == FormulaMode::HeadingBased
            && let Some(number) = self.heading_number(editor, equation.open.line)
        {
            let ordinal = self.per_heading.entry(number.clone()).or_insert(0);
            *ordinal += 1;
            return format!("{number}-{ordinal}");
        }

        self.counter += 1;
        self.counter.to_string()
    }

    /// Number written on the nearest heading at or above `line` whose level
    /// is within the configured depth.
    fn heading_number<E: Editor + ?Sized>(&self, editor: &E, line: usize) -> Option<String> {
        let headings = &self.metadata.headings;
        let nearest = headings.iter().rposition(|h| h.line <= line)?;
        let target = headings[..=nearest]
            .iter()
            .rev()
            .find(|h| h.level <= self.settings.max_depth)?;

        let text = editor.line(target.line);
        existing_numbering(&text).map(str::to_string)
    }
}

/// Label every equation. Returns whether anything changed.
pub fn renumber_formulas<E: Editor + ?Sized>(
    editor: &mut E,
    metadata: &DocumentMetadata,
    settings: &FormulaSettings,
    options: PassOptions,
) -> bool {
    if !settings.enabled && !options.force {
        return false;
    }

    let view = ViewState::capture(&*editor);
    let equations = find_equations(&*editor, metadata);
    let mut labeler = Labeler::new(settings, metadata);
    let mut batch = EditBatch::new();

    for equation in &equations {
        let label = labeler.next_label(&*editor, equation);
        match find_tag(&*editor, metadata, equation) {
            Some(tag) if tag.text == label => {}
            Some(tag) => batch.push(Change {
                from: Position::new(tag.line, tag.label.start),
                to: Position::new(tag.line, tag.label.end),
                text: label,
            }),
            None => batch.push(Change {
                from: equation.close,
                to: equation.close,
                text: format!(" \\tag{{{label}}}"),
            }),
        }
    }

    let edits = batch.len();
    let changed = batch.commit(editor);
    if changed && options.restore_view {
        view.restore(editor);
    }
    log::debug!(
        "formula pass over {} equation(s) queued {edits} edit(s)",
        equations.len()
    );
    changed
}

/// Strip every `\tag{...}` (and the whitespace before it) from equations.
pub fn remove_formula_numbering<E: Editor + ?Sized>(
    editor: &mut E,
    metadata: &DocumentMetadata,
) -> bool {
    let mut batch = EditBatch::new();

    for equation in find_equations(&*editor, metadata) {
        for n in equation.open.line..=equation.close.line {
            let line = editor.line(n);
            if is_line_ignored(n, &line, &metadata.code_blocks) {
                continue;
            }
            let Some(segment) = equation.segment(n, line.len()) else {
                continue;
            };
            for found in get_tag_with_space_regex().find_iter(&line[segment.clone()]) {
                batch.push(Change {
                    from: Position::new(n, segment.start + found.start()),
                    to: Position::new(n, segment.start + found.end()),
                    text: String::new(),
                });
            }
        }
    }

    log::debug!("formula removal queued {} edit(s)", batch.len());
    batch.commit(editor)
}
