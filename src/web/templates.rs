//! HTML templates for the board UI.
//!
//! Templates are embedded at compile time using `include_str!`; dynamic
//! fragments are rendered by the handlers and swapped in with htmx.

/// The board page shell. The board itself loads as an htmx fragment.
pub const INDEX_TEMPLATE: &str = include_str!("templates/index.html");
