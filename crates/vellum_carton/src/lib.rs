//! Carton - The artist's toolbox for Vellum.
//!
//! This crate provides the foundational utilities shared by every Vellum crate:
//! the arena types the markup AST is built from, fast collections, content
//! hashing for output names, and lexical path helpers that behave the same on
//! every platform.
//!
//! # Modules
//!
//! - **Allocator**: Arena-based memory allocation for AST construction
//! - **Shared utilities**: tag configuration, hashing and path manipulation
//!
//! # Example
//!
//! ```
//! use vellum_carton::{Box, Bump, Vec};
//!
//! let bump = Bump::new();
//!
//! let boxed = Box::new_in(42, &bump);
//! assert_eq!(*boxed, 42);
//!
//! let mut vec = Vec::new_in(&bump);
//! vec.push(1);
//! vec.push(2);
//! assert_eq!(vec.len(), 2);
//! ```

// Shared modules
pub mod dom_tag_config;
pub mod hash;
pub mod path;

// Re-export arena types
pub use bumpalo::boxed::Box;
pub use bumpalo::collections::Vec;
pub use bumpalo::Bump;

// Re-export compact_str::CompactString for convenience
pub use compact_str::CompactString;
pub use compact_str::CompactString as String;

// Re-export rustc-hash for fast hash maps/sets
pub use rustc_hash::{FxHashMap, FxHashSet};

// Re-export phf for compile-time perfect hash functions
pub use phf::{phf_map, phf_set, Map as PhfMap, Set as PhfSet};

// Re-export shared utilities
pub use dom_tag_config::*;
