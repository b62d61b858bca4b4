//! Output formatting modules.

pub mod json;
pub mod text;

pub use json::format_json;
pub use text::{format_text, offset_to_line_col};
