//! # vellum_armature
//!
//! Armature - The structural parser for Vellum templates.
//!
//! Turns template markup into the arena AST defined by `vellum_relief`.
//! Parsing is total: malformed input still produces a tree plus diagnostics.
//!
//! ```
//! use vellum_armature::parse;
//! use vellum_carton::Bump;
//!
//! let bump = Bump::new();
//! let (root, errors) = parse(&bump, r#"<image src="./a.png" />"#);
//! assert!(errors.is_empty());
//! assert_eq!(root.children.len(), 1);
//! ```

pub mod parser;
pub mod tokenizer;

pub use parser::{parse, parse_with_options, Parser};
pub use tokenizer::{Callbacks, QuoteType, State, Tokenizer};
