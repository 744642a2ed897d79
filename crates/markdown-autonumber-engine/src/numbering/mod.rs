//! Numbering token algebra.
//!
//! A [`NumberingToken`] is one heading level's counter tagged with the style it
//! is displayed in. The four operations (`first`, `next`, `previous`,
//! `printable`) are total: values that fall outside a style's alphabet are
//! carried as an arabic-numeral fallback instead of failing, so a hand-edited
//! or corrupt prefix never stops a renumbering pass.

mod roman;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Zeroth predecessor of the Latin alphabets.
const LATIN_SENTINEL: char = '&';

/// CJK numerals, position 0 being the zero sentinel.
const CJK_NUMERALS: [char; 11] = ['零', '一', '二', '三', '四', '五', '六', '七', '八', '九', '十'];

/// Circled digits, position 0 being the zero sentinel.
const CIRCLED_DIGITS: [char; 21] = [
    '⓪', '①', '②', '③', '④', '⑤', '⑥', '⑦', '⑧', '⑨', '⑩', '⑪', '⑫', '⑬', '⑭', '⑮', '⑯', '⑰',
    '⑱', '⑲', '⑳',
];

/// Display style of a heading level's counter.
///
/// Settings and front-matter strings name a style by its first symbol:
/// `1`, `A`, `a`, `I`, `一` or `①`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub enum NumberingStyle {
    Arabic,
    UpperLatin,
    LowerLatin,
    Roman,
    CjkNumeral,
    CircledDigit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown numbering style symbol: {0:?}")]
pub struct UnknownStyle(pub char);

impl NumberingStyle {
    pub const ALL: [NumberingStyle; 6] = [
        NumberingStyle::Arabic,
        NumberingStyle::UpperLatin,
        NumberingStyle::LowerLatin,
        NumberingStyle::Roman,
        NumberingStyle::CjkNumeral,
        NumberingStyle::CircledDigit,
    ];

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '1' => Some(Self::Arabic),
            'A' => Some(Self::UpperLatin),
            'a' => Some(Self::LowerLatin),
            'I' => Some(Self::Roman),
            '一' => Some(Self::CjkNumeral),
            '①' => Some(Self::CircledDigit),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Self::Arabic => '1',
            Self::UpperLatin => 'A',
            Self::LowerLatin => 'a',
            Self::Roman => 'I',
            Self::CjkNumeral => '一',
            Self::CircledDigit => '①',
        }
    }

    /// Number of alphabet positions including the sentinel; 0 for counting styles.
    fn alphabet_len(self) -> usize {
        match self {
            Self::UpperLatin | Self::LowerLatin => 27,
            Self::CjkNumeral => CJK_NUMERALS.len(),
            Self::CircledDigit => CIRCLED_DIGITS.len(),
            Self::Arabic | Self::Roman => 0,
        }
    }

    /// Symbol at alphabet position `index`; position 0 is the sentinel.
    fn symbol_at(self, index: usize) -> Option<char> {
        match self {
            Self::UpperLatin => latin_at('A', index),
            Self::LowerLatin => latin_at('a', index),
            Self::CjkNumeral => CJK_NUMERALS.get(index).copied(),
            Self::CircledDigit => CIRCLED_DIGITS.get(index).copied(),
            Self::Arabic | Self::Roman => None,
        }
    }

    fn position_of(self, symbol: char) -> Option<usize> {
        (0..self.alphabet_len()).find(|&i| self.symbol_at(i) == Some(symbol))
    }

    /// Latin alphabets loop back to their first letter; the others overflow
    /// into arabic numerals.
    fn wraps(self) -> bool {
        matches!(self, Self::UpperLatin | Self::LowerLatin)
    }

    fn value_at(self, index: usize) -> TokenValue {
        match self.symbol_at(index) {
            Some(symbol) => TokenValue::Symbol(symbol),
            None => TokenValue::Overflow(index as i64),
        }
    }

    /// The value a fresh counter takes when nothing else applies.
    fn restart(self) -> TokenValue {
        match self {
            Self::Arabic | Self::Roman => TokenValue::Integer(1),
            _ => self.value_at(1),
        }
    }
}

fn latin_at(first: char, index: usize) -> Option<char> {
    match index {
        0 => Some(LATIN_SENTINEL),
        1..=26 => char::from_u32(first as u32 + index as u32 - 1),
        _ => None,
    }
}

impl TryFrom<char> for NumberingStyle {
    type Error = UnknownStyle;

    fn try_from(symbol: char) -> Result<Self, Self::Error> {
        Self::from_symbol(symbol).ok_or(UnknownStyle(symbol))
    }
}

impl From<NumberingStyle> for char {
    fn from(style: NumberingStyle) -> Self {
        style.symbol()
    }
}

/// Value carried by a [`NumberingToken`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenValue {
    /// Counter of the arabic and roman styles.
    Integer(i64),
    /// A member of a symbolic style's alphabet, sentinel included.
    Symbol(char),
    /// Arabic-numeral fallback once a symbolic alphabet is exhausted.
    Overflow(i64),
}

/// One level's counter together with its display style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberingToken {
    pub style: NumberingStyle,
    pub value: TokenValue,
}

impl NumberingToken {
    /// First token of a level configured with `style` and `start_value`.
    ///
    /// A numeric start is an offset into the style's alphabet (`0` is the
    /// sentinel, `1` the first symbol); a non-numeric start is taken as a
    /// literal symbol when it belongs to the alphabet.
    pub fn first(style: NumberingStyle, start_value: &str) -> Self {
        let start = start_value.trim();
        let numeric = start.parse::<i64>().ok();

        let value = match style {
            NumberingStyle::Arabic | NumberingStyle::Roman => {
                numeric.map_or_else(|| style.restart(), TokenValue::Integer)
            }
            _ => match numeric {
                Some(n) if n >= 0 => style.value_at(n as usize),
                Some(_) => style.restart(),
                None => single_char(start)
                    .filter(|&c| style.position_of(c).is_some())
                    .map_or_else(|| style.restart(), TokenValue::Symbol),
            },
        };

        Self { style, value }
    }

    pub fn next(&self) -> Self {
        let style = self.style;
        let value = match self.value {
            TokenValue::Integer(n) => TokenValue::Integer(n.saturating_add(1)),
            TokenValue::Overflow(n) => TokenValue::Overflow(n.saturating_add(1)),
            TokenValue::Symbol(symbol) => match style.position_of(symbol) {
                Some(i) if i + 1 < style.alphabet_len() => style.value_at(i + 1),
                Some(_) if style.wraps() => style.value_at(1),
                Some(_) => TokenValue::Overflow(style.alphabet_len() as i64),
                None => style.restart(),
            },
        };
        Self { style, value }
    }

    pub fn previous(&self) -> Self {
        let style = self.style;
        let value = match self.value {
            TokenValue::Integer(n) => TokenValue::Integer(n.saturating_sub(1)),
            TokenValue::Overflow(n) => {
                let index = n.saturating_sub(1);
                if index >= 0 && (index as usize) < style.alphabet_len() {
                    style.value_at(index as usize)
                } else {
                    TokenValue::Overflow(index)
                }
            }
            TokenValue::Symbol(symbol) => match style.position_of(symbol) {
                Some(0) if style.wraps() => style.value_at(style.alphabet_len() - 1),
                Some(0) => style.value_at(0),
                Some(i) => style.value_at(i - 1),
                None => style.restart(),
            },
        };
        Self { style, value }
    }

    pub fn printable(&self) -> String {
        match self.value {
            TokenValue::Integer(n) if self.style == NumberingStyle::Roman => {
                roman::to_roman(n).unwrap_or_else(|| n.to_string())
            }
            TokenValue::Integer(n) | TokenValue::Overflow(n) => n.to_string(),
            TokenValue::Symbol(symbol) => symbol.to_string(),
        }
    }
}

impl fmt::Display for NumberingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.printable())
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
