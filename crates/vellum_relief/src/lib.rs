//! Relief - The sculptured AST surface for Vellum templates.
//!
//! Node types produced by `vellum_armature` and consumed by the loader in
//! `vellum_atelier`, together with parser options and parse diagnostics.

pub mod ast;
pub mod errors;
pub mod options;

pub use ast::*;
pub use errors::{CompilerError, ErrorCode};
pub use options::ParserOptions;
