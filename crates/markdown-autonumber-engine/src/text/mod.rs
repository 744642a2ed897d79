//! Line-level text classification shared by the heading and formula passes.

pub mod exclusion;
pub mod prefix;

pub use exclusion::{ExclusionRange, is_line_ignored};
pub use prefix::{existing_numbering, find_prefix_range, heading_hashes};
