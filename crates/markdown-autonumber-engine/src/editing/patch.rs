use crate::editing::Position;

/// Result of applying a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Byte ranges of the inserted text, in post-edit coordinates.
    pub changed: Vec<std::ops::Range<usize>>,
    pub cursor: Position,
    pub version: u64,
}
