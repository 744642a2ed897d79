const NUMERALS: [(i64, &str); 13] = [
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

/// Uppercase roman numeral for `1..=3999`.
pub(super) fn to_roman(value: i64) -> Option<String> {
    if !(1..=3999).contains(&value) {
        return None;
    }

    let mut remaining = value;
    let mut out = String::new();
    for (weight, numeral) in NUMERALS {
        while remaining >= weight {
            out.push_str(numeral);
            remaining -= weight;
        }
    }
    Some(out)
}
