use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

/// One numbering token as it appears in a heading prefix: a digit run, an
/// uppercase roman run, a single Latin letter, a CJK numeral run, a circled
/// digit, or the Latin zero sentinel.
const TOKEN: &str = r"(?:[0-9]+|[IVXLCDM]+|[A-Za-z]|[零一二三四五六七八九十]+|[\x{2460}-\x{2473}\x{24EA}]|&)";

const SEPARATOR: &str = r"[.:—\-]";

static PREFIX_REGEX: OnceLock<Regex> = OnceLock::new();
static HASHES_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_prefix_regex() -> &'static Regex {
    PREFIX_REGEX.get_or_init(|| {
        let pattern = format!(
            r"^\s{{0,3}}#+(?: )?(?:{TOKEN}{SEPARATOR}+(?: )?)*(?:{TOKEN})?(?: )?{SEPARATOR}?(?: )+"
        );
        Regex::new(&pattern).expect("Invalid heading prefix regex")
    })
}

fn get_hashes_regex() -> &'static Regex {
    HASHES_REGEX.get_or_init(|| Regex::new(r"^\s{0,4}#+").expect("Invalid heading hashes regex"))
}

/// Byte range on a heading line covering the hashes, any existing numbering
/// and the whitespace before the heading text. Always starts at column 0.
///
/// `None` when the line does not look like an ATX heading.
pub fn find_prefix_range(line: &str) -> Option<Range<usize>> {
    get_prefix_regex().find(line).map(|m| 0..m.end())
}

/// The run of `#` characters opening a heading line, leading indent dropped.
pub fn heading_hashes(line: &str) -> Option<&str> {
    get_hashes_regex()
        .find(line)
        .map(|m| m.as_str().trim_start())
}

/// Numbering currently written on a heading line, without hashes, spacing or
/// a trailing separator. `None` for an unnumbered heading.
pub fn existing_numbering(line: &str) -> Option<&str> {
    let range = find_prefix_range(line)?;
    let body = line[range].trim().trim_start_matches('#').trim();
    let body = body
        .strip_suffix(['.', ':', '—', '-'])
        .unwrap_or(body)
        .trim_end();
    (!body.is_empty()).then_some(body)
}
