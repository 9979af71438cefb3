//! Bulk load front end: splits delimited text lines and routes each one
//! without parsing more of it than routing needs.

pub mod dispatch;
pub mod input;
pub mod splitter;

// Re-exports
pub use dispatch::{DispatchedRow, ParseMode, RowDispatcher};
pub use input::parse_text;
pub use splitter::{LineSplitter, SplitLine};
