//! Parser options.

use vellum_carton::String;

/// Parser options
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Delimiters for expression placeholders (default: `{{` / `}}`)
    pub delimiters: (String, String),
    /// Whether a tag never has children or an end tag
    pub is_void_tag: fn(&str) -> bool,
    /// Keep comment nodes in the tree
    pub comments: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            delimiters: (String::from("{{"), String::from("}}")),
            is_void_tag: vellum_carton::is_void_tag,
            comments: true,
        }
    }
}
