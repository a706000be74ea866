//! # Vellum
//!
//! Build-time dependency extraction for mini-program templates, written in Rust.
//!
//! This crate re-exports all Vellum sub-crates for unified documentation.
//!
//! ## Crates
//!
//! - [`carton`] - Arena, collection, hashing and path utilities
//! - [`relief`] - Template AST, parser options and diagnostics
//! - [`armature`] - Markup tokenizer and parser
//! - [`atelier`] - The reference-extracting template transform

/// Arena, collection, hashing and path utilities.
pub use vellum_carton as carton;

/// Template AST, parser options and diagnostics.
pub use vellum_relief as relief;

/// Markup tokenizer and parser.
pub use vellum_armature as armature;

/// The reference-extracting template transform.
pub use vellum_atelier as atelier;

pub use vellum_atelier::{transform_document, BuildContext, LoaderOptions, LoaderOutput};
