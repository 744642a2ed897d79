//! Read-only document structure: headings, code blocks and front matter.
//!
//! [`DocumentMetadata::scan`] is a snapshot taken once per pass; numbering
//! code reads it and never mutates it.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::editing::Editor;
use crate::text::{ExclusionRange, is_line_ignored};

/// One heading as found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingInfo {
    /// 1 to 6.
    pub level: u8,
    /// Line the heading starts on.
    pub line: usize,
    /// Inline text of the heading, numbering included, trimmed.
    pub text: String,
}

/// YAML front matter: a `---` line at the very top and its closing line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    /// Line of the closing `---` (or `...`).
    pub end_line: usize,
    /// Everything between the delimiters.
    pub yaml: String,
}

impl FrontMatter {
    pub fn detect(text: &str) -> Option<Self> {
        let mut lines = text.split('\n').map(|l| l.trim_end_matches('\r'));
        if lines.next()?.trim_end() != "---" {
            return None;
        }

        let mut body = Vec::new();
        for (index, line) in lines.enumerate() {
            let trimmed = line.trim_end();
            if trimmed == "---" || trimmed == "..." {
                return Some(Self {
                    end_line: index + 1,
                    yaml: body.join("\n"),
                });
            }
            body.push(line);
        }
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub headings: Vec<HeadingInfo>,
    pub code_blocks: Vec<ExclusionRange>,
    pub front_matter: Option<FrontMatter>,
}

impl DocumentMetadata {
    pub fn scan(text: &str) -> Self {
        let lines = LineIndex::new(text);
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);

        let mut headings = Vec::new();
        let mut code_blocks = Vec::new();
        let mut current: Option<HeadingInfo> = None;

        for (event, range) in Parser::new_ext(text, options).into_offset_iter() {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    current = Some(HeadingInfo {
                        level: level as u8,
                        line: lines.line_of(range.start),
                        text: String::new(),
                    });
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(mut heading) = current.take() {
                        heading.text = heading.text.trim().to_string();
                        headings.push(heading);
                    }
                }
                Event::Text(s) | Event::Code(s) | Event::InlineMath(s) | Event::InlineHtml(s) => {
                    if let Some(heading) = current.as_mut() {
                        heading.text.push_str(&s);
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    if let Some(heading) = current.as_mut() {
                        heading.text.push(' ');
                    }
                }
                Event::Start(Tag::CodeBlock(_)) => {
                    let end = range.end.saturating_sub(1).max(range.start);
                    code_blocks.push(ExclusionRange::new(
                        lines.line_of(range.start),
                        lines.line_of(end),
                    ));
                }
                _ => {}
            }
        }

        log::trace!(
            "scanned {} heading(s), {} code block(s)",
            headings.len(),
            code_blocks.len()
        );

        Self {
            headings,
            code_blocks,
            front_matter: FrontMatter::detect(text),
        }
    }

    pub fn from_editor<E: Editor + ?Sized>(editor: &E) -> Self {
        Self::scan(&editor.text())
    }

    /// Whether `line` (whose content is `text`) sits in front matter, a code
    /// block or a table row. Line-oriented edits must leave such lines alone.
    pub fn is_excluded(&self, line: usize, text: &str) -> bool {
        self.front_matter
            .as_ref()
            .is_some_and(|front_matter| line <= front_matter.end_line)
            || is_line_ignored(line, text, &self.code_blocks)
    }
}

/// Byte offset to line number lookup.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        }
    }
}
