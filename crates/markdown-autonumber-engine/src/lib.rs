pub mod controller;
pub mod editing;
pub mod formulas;
pub mod headings;
pub mod io;
pub mod metadata;
pub mod numbering;
pub mod settings;
pub mod text;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use controller::{EffectiveSettings, NumberingController};
pub use editing::{Change, EditBatch, Editor, PassOptions, Position, ScrollInfo, TextBuffer};
pub use formulas::{remove_formula_numbering, renumber_formulas};
pub use headings::{remove_heading_numbering, renumber_headings};
pub use io::*;
pub use metadata::{DocumentMetadata, HeadingInfo};
pub use numbering::{NumberingStyle, NumberingToken};
pub use settings::{FormulaMode, FormulaSettings, HeadingSettings};
