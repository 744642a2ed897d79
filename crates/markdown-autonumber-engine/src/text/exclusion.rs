/// An inclusive line interval, such as a fenced code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExclusionRange {
    pub start: usize,
    pub end: usize,
}

impl ExclusionRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, line: usize) -> bool {
        self.start <= line && line <= self.end
    }
}

/// Lines numbering must never touch: anything inside a code range, and
/// Markdown table rows.
pub fn is_line_ignored(line: usize, text: &str, code_ranges: &[ExclusionRange]) -> bool {
    code_ranges.iter().any(|range| range.contains(line)) || is_table_row(text)
}

fn is_table_row(text: &str) -> bool {
    text.trim_start().starts_with('|')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(3, "# Heading", true)]
    #[case(5, "```", true)]
    #[case(6, "# Heading", false)]
    #[case(2, "# Heading", false)]
    #[case(0, "| a | b |", true)]
    #[case(0, "   |---|---|", true)]
    #[case(0, "a | b", false)]
    fn classifies_lines(#[case] line: usize, #[case] text: &str, #[case] ignored: bool) {
        let code = [ExclusionRange::new(3, 5)];
        assert_eq!(is_line_ignored(line, text, &code), ignored);
    }

    #[test]
    fn no_ranges_only_tables_are_ignored() {
        assert!(!is_line_ignored(0, "$$", &[]));
        assert!(is_line_ignored(0, "\t| cell |", &[]));
    }
}
