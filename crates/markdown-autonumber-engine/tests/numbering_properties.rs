use markdown_autonumber_engine::{
    DocumentMetadata, Editor, FormulaMode, FormulaSettings, HeadingSettings, NumberingStyle,
    PassOptions, Position, ScrollInfo, TextBuffer, remove_formula_numbering,
    remove_heading_numbering, renumber_formulas, renumber_headings,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

const NOTES: &str = r"---
title: Notes
---
# Introduction
Some text.

## Background

$$
E = mc^2
$$

## Method

```rust
# not a heading
$$ not math $$
```

| # | $$x$$ |
|---|---|

### Details

#### Deep

# Results

$$a$$ and $$b \tag{old}$$";

fn headings(doc: &mut TextBuffer, settings: &HeadingSettings) -> bool {
    let meta = DocumentMetadata::from_editor(&*doc);
    renumber_headings(doc, &meta, settings, PassOptions::default())
}

fn formulas(doc: &mut TextBuffer, settings: &FormulaSettings) -> bool {
    let meta = DocumentMetadata::from_editor(&*doc);
    renumber_formulas(doc, &meta, settings, PassOptions::default())
}

fn strip(doc: &mut TextBuffer) -> bool {
    let meta = DocumentMetadata::from_editor(&*doc);
    remove_heading_numbering(doc, &meta)
}

#[test]
fn renumbers_a_whole_note() {
    let mut doc = TextBuffer::from(NOTES);

    assert!(headings(&mut doc, &HeadingSettings::default()));
    assert!(formulas(&mut doc, &FormulaSettings::default()));

    insta::assert_snapshot!(doc.contents(), @r"
    ---
    title: Notes
    ---
    # 1 Introduction
    Some text.

    ## 1-a Background

    $$
    E = mc^2
     \tag{1}$$

    ## 1-b Method

    ```rust
    # not a heading
    $$ not math $$
    ```

    | # | $$x$$ |
    |---|---|

    ### 1-b:A Details

    #### 1-b:A.一 Deep

    # 2 Results

    $$a \tag{2}$$ and $$b \tag{3}$$
    ");
}

#[test]
fn flat_document_scenario() {
    let mut doc = TextBuffer::from("# Intro\n# Body\n# End");
    headings(&mut doc, &HeadingSettings::default());
    assert_eq!(doc.contents(), "# 1 Intro\n# 2 Body\n# 3 End");
}

#[test]
fn nested_alphabetic_scenario() {
    let settings = HeadingSettings {
        styles: vec![NumberingStyle::Arabic, NumberingStyle::LowerLatin],
        ..HeadingSettings::default()
    };
    let mut doc = TextBuffer::from("# A\n## B\n## C\n# D\n## E");

    headings(&mut doc, &settings);

    assert_eq!(doc.contents(), "# 1 A\n## 1-a B\n## 1-b C\n# 2 D\n## 2-a E");
}

#[test]
fn continuous_formula_scenario() {
    let mut doc = TextBuffer::from("$$a$$\n$$b$$\n$$c$$");
    formulas(&mut doc, &FormulaSettings::default());
    assert_eq!(
        doc.contents(),
        "$$a \\tag{1}$$\n$$b \\tag{2}$$\n$$c \\tag{3}$$"
    );
}

#[test]
fn heading_based_formula_scenario() {
    let heading_settings = HeadingSettings {
        styles: vec![NumberingStyle::Arabic],
        separators: vec![String::new(), ".".to_string()],
        ..HeadingSettings::default()
    };
    let formula_settings = FormulaSettings {
        mode: FormulaMode::HeadingBased,
        ..FormulaSettings::default()
    };
    let mut doc = TextBuffer::from("$$z$$\n# A\n# B\n## C\n$$x$$\n$$y$$");

    headings(&mut doc, &heading_settings);
    formulas(&mut doc, &formula_settings);

    assert_eq!(
        doc.contents(),
        "$$z \\tag{1}$$\n# 1 A\n# 2 B\n## 2.1 C\n$$x \\tag{2.1-1}$$\n$$y \\tag{2.1-2}$$"
    );
}

#[rstest]
#[case::notes(NOTES)]
#[case::stale_numbers("# 4 A\n### 9-z:Q B\n## C\n# 1. D")]
#[case::first_level("# Title\n## One\n### Two\n## Three")]
#[case::crlf("# A\r\n## B\r\n\r\n# C\r\n")]
fn second_pass_is_a_no_op(#[case] text: &str) {
    let mut doc = TextBuffer::from(text);
    headings(&mut doc, &HeadingSettings::default());
    formulas(&mut doc, &FormulaSettings::default());
    let version = doc.version();

    assert!(!headings(&mut doc, &HeadingSettings::default()));
    assert!(!formulas(&mut doc, &FormulaSettings::default()));
    assert_eq!(doc.version(), version);
}

#[rstest]
#[case::notes(NOTES)]
#[case::nested("# A\n## B\n### C\n## D\n# E")]
#[case::cjk("# 一 甲\n## 乙")]
fn remove_then_renumber_matches_single_renumber(#[case] text: &str) {
    let mut once = TextBuffer::from(text);
    headings(&mut once, &HeadingSettings::default());

    let mut round_trip = TextBuffer::from(text);
    headings(&mut round_trip, &HeadingSettings::default());
    strip(&mut round_trip);
    headings(&mut round_trip, &HeadingSettings::default());

    assert_eq!(round_trip.contents(), once.contents());
}

#[test]
fn code_and_table_lines_are_never_touched() {
    let mut doc = TextBuffer::from(NOTES);
    let meta = DocumentMetadata::scan(NOTES);
    let before: Vec<String> = NOTES.split('\n').map(str::to_string).collect();

    headings(&mut doc, &HeadingSettings::default());
    formulas(&mut doc, &FormulaSettings::default());

    let protected = (0..before.len()).filter(|&n| {
        meta.code_blocks.iter().any(|r| r.contains(n)) || before[n].trim_start().starts_with('|')
    });
    for n in protected {
        assert_eq!(doc.line(n), before[n].as_str(), "line {n}");
    }
}

#[test]
fn tags_on_table_rows_inside_equations_are_left_alone() {
    let text = "$$\n| x | \\tag{9}\n$$";
    let mut doc = TextBuffer::from(text);

    assert!(formulas(&mut doc, &FormulaSettings::default()));

    assert_eq!(doc.line(1), "| x | \\tag{9}");
    assert_eq!(doc.contents(), "$$\n| x | \\tag{9}\n \\tag{1}$$");
}

#[test]
fn formula_removal_skips_fenced_code_inside_equations() {
    let text = "$$ a\n```\n\\tag{9}\n```\n$$";
    let mut doc = TextBuffer::from(text);
    let meta = DocumentMetadata::from_editor(&doc);

    assert!(!remove_formula_numbering(&mut doc, &meta));
    assert_eq!(doc.contents(), text);
}

#[test]
fn crlf_line_endings_survive() {
    let mut doc = TextBuffer::from("# A\r\n## B\r\n");
    headings(&mut doc, &HeadingSettings::default());
    assert_eq!(doc.contents(), "# 1 A\r\n## 1-a B\r\n");
}

#[test]
fn cursor_and_scroll_are_restored() {
    let mut doc = TextBuffer::from("# Intro\n## Background");
    doc.set_cursor(Position::new(1, 5));
    doc.scroll_to(0.0, 48.0);

    headings(&mut doc, &HeadingSettings::default());

    assert_eq!(doc.cursor(), Position::new(1, 5));
    assert_eq!(doc.scroll_info(), ScrollInfo { left: 0.0, top: 48.0 });
}

#[test]
fn cursor_beyond_shortened_line_is_clamped() {
    let mut doc = TextBuffer::from("# 99 Title");
    doc.set_cursor(Position::new(0, 10));

    headings(&mut doc, &HeadingSettings::default());

    assert_eq!(doc.line(0), "# 1 Title");
    assert_eq!(doc.cursor(), Position::new(0, 9));
}
