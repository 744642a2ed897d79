//! Numbering settings and their per-document front-matter overrides.

pub mod frontmatter;

use serde::{Deserialize, Serialize};

use crate::numbering::{NumberingStyle, NumberingToken};

pub use frontmatter::{
    FORMULAS_KEY, FrontMatterError, HEADINGS_KEY, Overrides, parse_formula_override,
    parse_heading_override, read_overrides, save_overrides, serialize_formula_override,
    serialize_heading_override,
};

pub const DEFAULT_HEADING_STYLES: [NumberingStyle; 6] = [
    NumberingStyle::Arabic,
    NumberingStyle::LowerLatin,
    NumberingStyle::UpperLatin,
    NumberingStyle::CjkNumeral,
    NumberingStyle::CircledDigit,
    NumberingStyle::Arabic,
];

pub const DEFAULT_HEADING_SEPARATORS: [&str; 6] = ["", "-", ":", ".", "—", "-"];

pub const DEFAULT_HEADING_START_VALUES: [&str; 6] = ["1", "1", "1", "1", "1", "1"];

/// Heading numbering configuration, global or merged with a document override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingSettings {
    pub enabled: bool,
    /// Renumber automatically when the editor loses focus.
    pub auto: bool,
    pub first_level: u8,
    pub max_level: u8,
    /// Per-level styles; deeper levels reuse the last entry.
    pub styles: Vec<NumberingStyle>,
    /// `separators[i]` goes before the token at stack position `i`;
    /// `separators[0]` also closes the prefix.
    pub separators: Vec<String>,
    /// Per-level start values; deeper levels reuse the last entry.
    pub start_values: Vec<String>,
    /// Headings whose text ends with this are left alone. Empty disables.
    pub skip_suffix: String,
    /// Shallowest level `decrease_headings` may produce.
    pub limit_heading_from: u8,
}

impl Default for HeadingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            auto: false,
            first_level: 1,
            max_level: 6,
            styles: DEFAULT_HEADING_STYLES.to_vec(),
            separators: DEFAULT_HEADING_SEPARATORS.map(String::from).to_vec(),
            start_values: DEFAULT_HEADING_START_VALUES.map(String::from).to_vec(),
            skip_suffix: String::new(),
            limit_heading_from: 1,
        }
    }
}

impl HeadingSettings {
    /// First token of the counter opened for heading level `level_index + 1`.
    ///
    /// The index is clamped against `styles`, and the start value is read at
    /// that same index. A `start_values` list shorter than `styles` therefore
    /// falls back to `"1"` rather than repeating its last entry.
    pub fn first_token(&self, level_index: usize) -> NumberingToken {
        let index = level_index.min(self.styles.len().saturating_sub(1));
        let style = self
            .styles
            .get(index)
            .copied()
            .unwrap_or(NumberingStyle::Arabic);
        let start = self.start_values.get(index).map_or("1", String::as_str);
        NumberingToken::first(style, start)
    }

    pub fn separator(&self, position: usize) -> &str {
        self.separators.get(position).map_or("", String::as_str)
    }

    pub fn primary_separator(&self) -> &str {
        self.separator(0)
    }

    pub fn should_skip(&self, heading_text: &str) -> bool {
        !self.skip_suffix.is_empty() && heading_text.ends_with(&self.skip_suffix)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormulaMode {
    /// One counter for the whole document.
    #[default]
    Continuous,
    /// `{heading number}-{n}` under the nearest numbered heading.
    HeadingBased,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaSettings {
    pub enabled: bool,
    pub auto: bool,
    pub mode: FormulaMode,
    /// Deepest heading level whose number labels equations.
    pub max_depth: u8,
}

impl Default for FormulaSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            auto: false,
            mode: FormulaMode::Continuous,
            max_depth: 4,
        }
    }
}
