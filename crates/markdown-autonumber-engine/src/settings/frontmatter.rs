use serde_yaml::Value;
use thiserror::Error;

use crate::editing::{Change, EditBatch, Editor, Position};
use crate::metadata::FrontMatter;
use crate::numbering::NumberingStyle;
use crate::settings::{FormulaMode, FormulaSettings, HeadingSettings};

pub const HEADINGS_KEY: &str = "number headings";
pub const FORMULAS_KEY: &str = "number formulas";

const SEPARATOR_CHARS: [char; 4] = ['-', ':', '.', '—'];

#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("Front matter YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Front matter is not a mapping")]
    NotAMapping,
}

/// Raw override strings found in a document's front matter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub headings: Option<String>,
    pub formulas: Option<String>,
}

impl Overrides {
    pub fn apply_headings(&self, defaults: &HeadingSettings) -> HeadingSettings {
        match &self.headings {
            Some(value) => parse_heading_override(value, defaults),
            None => defaults.clone(),
        }
    }

    pub fn apply_formulas(&self, defaults: &FormulaSettings) -> FormulaSettings {
        match &self.formulas {
            Some(value) => parse_formula_override(value, defaults),
            None => defaults.clone(),
        }
    }
}

pub fn read_overrides(front_matter: Option<&FrontMatter>) -> Result<Overrides, FrontMatterError> {
    let Some(front_matter) = front_matter else {
        return Ok(Overrides::default());
    };
    if front_matter.yaml.trim().is_empty() {
        return Ok(Overrides::default());
    }

    let value: Value = serde_yaml::from_str(&front_matter.yaml)?;
    if value.is_null() {
        return Ok(Overrides::default());
    }
    if !value.is_mapping() {
        return Err(FrontMatterError::NotAMapping);
    }

    Ok(Overrides {
        headings: value.get(HEADINGS_KEY).and_then(scalar_to_string),
        formulas: value.get(FORMULAS_KEY).and_then(scalar_to_string),
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Merge a `number headings` value over `defaults`.
///
/// Tokens are comma separated and order independent. Each positional shape
/// (level range, styles, separators, start values) is claimed by the first
/// token that fits it; anything unrecognised is ignored.
pub fn parse_heading_override(value: &str, defaults: &HeadingSettings) -> HeadingSettings {
    let mut settings = defaults.clone();
    let mut range_found = false;
    let mut styles_found = false;
    let mut separators_found = false;
    let mut start_values_found = false;

    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if part == "auto" {
            settings.auto = true;
        } else if part == "off" {
            settings.enabled = false;
        } else if let Some(n) = part.strip_prefix("first-level-") {
            if let Some(level) = parse_level(n) {
                settings.first_level = level;
            }
        } else if let Some(n) = part.strip_prefix("max-") {
            if let Some(level) = parse_level(n) {
                settings.max_level = level;
            }
        } else if let Some(suffix) = part.strip_prefix("skip-") {
            settings.skip_suffix = suffix.to_string();
        } else if !range_found && let Some((first, max)) = parse_range(part) {
            settings.first_level = first;
            settings.max_level = max;
            range_found = true;
        } else if !styles_found && let Some(styles) = parse_styles(part) {
            settings.styles = styles;
            styles_found = true;
        } else if !start_values_found && is_start_values(part) {
            settings.start_values = part.chars().map(String::from).collect();
            start_values_found = true;
        } else if !separators_found && is_separators(part) {
            settings.separators = std::iter::once(String::new())
                .chain(part.chars().map(String::from))
                .collect();
            separators_found = true;
        } else {
            log::debug!("ignoring heading override token {part:?}");
        }
    }

    settings
}

fn parse_level(s: &str) -> Option<u8> {
    s.parse::<u8>().ok().filter(|n| (1..=6).contains(n))
}

fn parse_range(part: &str) -> Option<(u8, u8)> {
    let (first, max) = part.split_once('-')?;
    if first.len() != 1 || max.len() != 1 {
        return None;
    }
    Some((first.parse().ok()?, max.parse().ok()?))
}

fn parse_styles(part: &str) -> Option<Vec<NumberingStyle>> {
    let styles: Vec<NumberingStyle> = part
        .chars()
        .map(NumberingStyle::from_symbol)
        .collect::<Option<_>>()?;
    (styles.len() == 6).then_some(styles)
}

fn is_start_values(part: &str) -> bool {
    part.len() == 6 && part.chars().all(|c| c.is_ascii_digit())
}

fn is_separators(part: &str) -> bool {
    part.chars().count() == 5 && part.chars().all(|c| SEPARATOR_CHARS.contains(&c))
}

/// Compact `number headings` value for `settings`. Parts that cannot be
/// expressed in the compact form are left out.
pub fn serialize_heading_override(settings: &HeadingSettings) -> String {
    if !settings.enabled {
        return "off".to_string();
    }

    let mut parts = Vec::new();
    if settings.auto {
        parts.push("auto".to_string());
    }
    parts.push(format!("{}-{}", settings.first_level, settings.max_level));

    let styles: String = (0..6)
        .map(|i| settings.first_token(i).style.symbol())
        .collect();
    parts.push(styles);

    let separators: String = (1..6).map(|i| settings.separator(i)).collect();
    if is_separators(&separators) {
        parts.push(separators);
    }

    let last = settings.start_values.len().saturating_sub(1);
    let start_values: String = (0..6)
        .filter_map(|i| settings.start_values.get(i.min(last)))
        .map(String::as_str)
        .collect();
    if is_start_values(&start_values) {
        parts.push(start_values);
    }

    if !settings.skip_suffix.is_empty() {
        parts.push(format!("skip-{}", settings.skip_suffix));
    }

    parts.join(", ")
}

/// Merge a `number formulas` value over `defaults`.
pub fn parse_formula_override(value: &str, defaults: &FormulaSettings) -> FormulaSettings {
    let mut settings = defaults.clone();

    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if part == "auto" {
            settings.auto = true;
        } else if part == "off" {
            settings.enabled = false;
        } else if part == "continuous" {
            settings.mode = FormulaMode::Continuous;
        } else if let Some(rest) = part.strip_prefix("heading-based") {
            settings.mode = FormulaMode::HeadingBased;
            if let Some(depth) = rest
                .strip_prefix('(')
                .and_then(|r| r.strip_suffix(')'))
                .and_then(parse_level)
            {
                settings.max_depth = depth;
            }
        } else {
            log::debug!("ignoring formula override token {part:?}");
        }
    }

    settings
}

pub fn serialize_formula_override(settings: &FormulaSettings) -> String {
    if !settings.enabled {
        return "off".to_string();
    }

    let mut parts = Vec::new();
    if settings.auto {
        parts.push("auto".to_string());
    }
    match settings.mode {
        FormulaMode::Continuous => parts.push("continuous".to_string()),
        FormulaMode::HeadingBased => parts.push(format!("heading-based({})", settings.max_depth)),
    }
    parts.join(", ")
}

/// Write the given settings into the document's front matter as one edit,
/// replacing existing override lines and creating the block when absent.
/// Returns whether the document changed.
pub fn save_overrides<E: Editor + ?Sized>(
    editor: &mut E,
    headings: Option<&HeadingSettings>,
    formulas: Option<&FormulaSettings>,
) -> Result<bool, FrontMatterError> {
    let mut entries = Vec::new();
    if let Some(settings) = headings {
        entries.push(yaml_entry(HEADINGS_KEY, &serialize_heading_override(settings))?);
    }
    if let Some(settings) = formulas {
        entries.push(yaml_entry(FORMULAS_KEY, &serialize_formula_override(settings))?);
    }
    if entries.is_empty() {
        return Ok(false);
    }

    let mut batch = EditBatch::new();
    match FrontMatter::detect(&editor.text()) {
        Some(front_matter) => {
            let mut missing = String::new();
            for (key, line_text) in &entries {
                let existing = (1..front_matter.end_line)
                    .find(|&n| editor.line(n).starts_with(&format!("{key}:")));
                match existing {
                    Some(n) => {
                        let len = editor.line(n).len();
                        batch.replace_economically(
                            &*editor,
                            Position::new(n, 0),
                            Position::new(n, len),
                            line_text.clone(),
                        );
                    }
                    None => {
                        missing.push_str(line_text);
                        missing.push('\n');
                    }
                }
            }
            if !missing.is_empty() {
                let at = Position::new(front_matter.end_line, 0);
                batch.push(Change {
                    from: at,
                    to: at,
                    text: missing,
                });
            }
        }
        None => {
            let mut block = String::from("---\n");
            for (_, line_text) in &entries {
                block.push_str(line_text);
                block.push('\n');
            }
            block.push_str("---\n");
            let at = Position::new(0, 0);
            batch.push(Change {
                from: at,
                to: at,
                text: block,
            });
        }
    }

    log::debug!("saving {} front matter override(s)", entries.len());
    Ok(batch.commit(editor))
}

fn yaml_entry(key: &'static str, value: &str) -> Result<(&'static str, String), FrontMatterError> {
    let rendered = serde_yaml::to_string(&Value::String(value.to_string()))?;
    Ok((key, format!("{key}: {}", rendered.trim_end())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::TextBuffer;
    use pretty_assertions::assert_eq;

    fn front_matter(yaml: &str) -> FrontMatter {
        FrontMatter {
            end_line: yaml.lines().count() + 1,
            yaml: yaml.to_string(),
        }
    }

    #[test]
    fn parses_full_heading_override() {
        let settings = parse_heading_override(
            "auto, 2-4, 1aA一①1, .:.—-, 011111",
            &HeadingSettings::default(),
        );

        assert!(settings.auto);
        assert_eq!((settings.first_level, settings.max_level), (2, 4));
        assert_eq!(settings.styles[1], NumberingStyle::LowerLatin);
        assert_eq!(settings.separators, vec!["", ".", ":", ".", "—", "-"]);
        assert_eq!(settings.start_values[0], "0");
    }

    #[test]
    fn heading_override_tokens_are_order_independent() {
        let a = parse_heading_override("011111, -:.—-, auto", &HeadingSettings::default());
        let b = parse_heading_override("auto, -:.—-, 011111", &HeadingSettings::default());
        assert_eq!(a, b);
    }

    #[test]
    fn each_shape_is_claimed_once() {
        let settings =
            parse_heading_override("1-3, 2-5, 1111aa, IIIIII", &HeadingSettings::default());

        assert_eq!((settings.first_level, settings.max_level), (1, 3));
        assert_eq!(settings.styles[5], NumberingStyle::LowerLatin);
    }

    #[test]
    fn six_digit_token_becomes_start_values_once_styles_are_taken() {
        let settings = parse_heading_override("1aA一①1, 211111", &HeadingSettings::default());
        assert_eq!(settings.start_values[0], "2");
    }

    #[test]
    fn unknown_tokens_are_ignored() {
        let settings =
            parse_heading_override("off, bogus, max-9, first-level-3", &HeadingSettings::default());

        assert!(!settings.enabled);
        assert_eq!(settings.max_level, 6);
        assert_eq!(settings.first_level, 3);
    }

    #[test]
    fn skip_token_sets_suffix() {
        let settings = parse_heading_override("skip-(draft)", &HeadingSettings::default());
        assert_eq!(settings.skip_suffix, "(draft)");
    }

    #[test]
    fn heading_override_serialisation_parses_back() {
        let settings = HeadingSettings {
            auto: true,
            first_level: 2,
            max_level: 5,
            skip_suffix: "!".to_string(),
            ..HeadingSettings::default()
        };

        let text = serialize_heading_override(&settings);

        assert_eq!(text, "auto, 2-5, 1aA一①1, -:.—-, 111111, skip-!");
        assert_eq!(parse_heading_override(&text, &HeadingSettings::default()), settings);
    }

    #[test]
    fn disabled_headings_serialise_as_off() {
        let settings = HeadingSettings {
            enabled: false,
            ..HeadingSettings::default()
        };
        assert_eq!(serialize_heading_override(&settings), "off");
    }

    #[test]
    fn parses_formula_override() {
        let defaults = FormulaSettings::default();

        let settings = parse_formula_override("auto, heading-based(2)", &defaults);
        assert!(settings.auto);
        assert_eq!(settings.mode, FormulaMode::HeadingBased);
        assert_eq!(settings.max_depth, 2);

        let settings = parse_formula_override("heading-based(9)", &defaults);
        assert_eq!(settings.max_depth, 4);

        assert_eq!(
            parse_formula_override("continuous", &settings).mode,
            FormulaMode::Continuous
        );
    }

    #[test]
    fn formula_override_serialisation() {
        let settings = FormulaSettings {
            mode: FormulaMode::HeadingBased,
            max_depth: 3,
            ..FormulaSettings::default()
        };
        assert_eq!(serialize_formula_override(&settings), "heading-based(3)");
        assert_eq!(
            serialize_formula_override(&FormulaSettings::default()),
            "continuous"
        );
    }

    #[test]
    fn reads_overrides_from_yaml() {
        let fm = front_matter("title: Notes\nnumber headings: auto, 1-3\nnumber formulas: off");
        let overrides = read_overrides(Some(&fm)).unwrap();

        assert_eq!(overrides.headings.as_deref(), Some("auto, 1-3"));
        assert_eq!(overrides.formulas.as_deref(), Some("off"));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let fm = front_matter("number headings: [unclosed");
        assert!(read_overrides(Some(&fm)).is_err());

        let fm = front_matter("- a list");
        assert!(matches!(
            read_overrides(Some(&fm)),
            Err(FrontMatterError::NotAMapping)
        ));
    }

    #[test]
    fn save_creates_front_matter_block() {
        let mut doc = TextBuffer::from("# Title\n");

        let changed = save_overrides(&mut doc, None, Some(&FormulaSettings::default())).unwrap();

        assert!(changed);
        assert_eq!(doc.contents(), "---\nnumber formulas: continuous\n---\n# Title\n");
    }

    #[test]
    fn save_replaces_existing_line_and_appends_missing_key() {
        let mut doc = TextBuffer::from("---\ntags: x\nnumber formulas: continuous\n---\nBody");
        let formulas = FormulaSettings {
            auto: true,
            ..FormulaSettings::default()
        };
        let headings = HeadingSettings {
            enabled: false,
            ..HeadingSettings::default()
        };

        save_overrides(&mut doc, Some(&headings), Some(&formulas)).unwrap();

        let saved = read_overrides(FrontMatter::detect(&doc.contents()).as_ref()).unwrap();
        assert_eq!(saved.headings.as_deref(), Some("off"));
        assert_eq!(saved.formulas.as_deref(), Some("auto, continuous"));
        assert!(doc.contents().starts_with("---\ntags: x\n"));
        assert!(doc.contents().ends_with("---\nBody"));
    }

    #[test]
    fn saving_nothing_leaves_document_alone() {
        let mut doc = TextBuffer::from("# Title");
        assert!(!save_overrides(&mut doc, None, None).unwrap());
        assert_eq!(doc.version(), 0);
    }
}
