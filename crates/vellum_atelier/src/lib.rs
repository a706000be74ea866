//! # vellum_atelier
//!
//! Atelier - The workshop where Vellum templates become build dependencies.
//!
//! For one template document the transform
//!
//! 1. appends the globally configured `<include>` fragments,
//! 2. parses the result and classifies every resource reference,
//! 3. resolves references against the source root or the document,
//! 4. emits one `require('...');` statement per distinct dependency,
//!    routing `.js` references through an optional fallback loader chain,
//! 5. returns the (optionally minified) document as an asset to write.
//!
//! ```no_run
//! use std::path::Path;
//! use vellum_atelier::{transform_document, BuildContext, LoaderOptions};
//!
//! let ctx = BuildContext::new("/project");
//! let output = transform_document(
//!     &ctx,
//!     Path::new("/project/src/pages/index/index.wxml"),
//!     r#"<import src="/common/header.wxml"/>"#,
//!     &LoaderOptions::default(),
//! )?;
//! assert_eq!(output.code, "require('../../common/header.wxml');");
//! # Ok::<(), vellum_atelier::AtelierError>(())
//! ```

pub mod classify;
pub mod context;
pub mod emit;
pub mod error;
pub mod fallback;
pub mod manifest;
pub mod minify;
pub mod naming;
pub mod options;
pub mod pattern;
pub mod resolve;
pub mod templates;
pub mod transform;

pub use classify::{classify_path, collect_references, Reference, ReferenceKind};
pub use context::BuildContext;
pub use emit::{render_statement, EmittedDependencies, ResolvedDependency};
pub use error::{AtelierError, AtelierResult};
pub use fallback::{build_fallback_chain, FallbackRule, LoaderUse};
pub use manifest::{ManifestCache, PackageLookup, PackageManifest};
pub use options::{LoaderOptions, OutputPath};
pub use pattern::Pattern;
pub use resolve::{DocumentLocation, PathResolver};
pub use templates::{render_global_templates, TemplateConfig};
pub use transform::{transform_document, EmittedAsset, LoaderOutput};
