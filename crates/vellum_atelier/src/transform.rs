//! Document transform: the entry point tying the pieces together.

use std::path::Path;

use vellum_armature::parse;
use vellum_carton::path::{join_reference, to_slash};
use vellum_carton::Bump;
use vellum_relief::CompilerError;

use crate::classify::{collect_references, ReferenceKind};
use crate::context::BuildContext;
use crate::emit::{render_statement, DependencyEmitter, ResolvedDependency};
use crate::error::AtelierResult;
use crate::fallback::build_fallback_chain;
use crate::minify::minify;
use crate::naming::{interpolate_name, output_template, NameContext};
use crate::options::{LoaderOptions, OutputPath};
use crate::templates::render_global_templates;

/// A file the host should write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedAsset {
    /// Output path, `/`-separated
    pub path: String,
    pub content: String,
}

/// Everything produced for one document.
#[derive(Debug, Clone)]
pub struct LoaderOutput {
    /// Concatenated `require('...');` statements
    pub code: String,
    pub asset: Option<EmittedAsset>,
    /// Resolved non-script references, in first-seen order
    pub dependencies: Vec<ResolvedDependency>,
    /// Resolved script references that went through the fallback chain
    pub scripts: Vec<ResolvedDependency>,
    pub diagnostics: Vec<CompilerError>,
}

/// Transform one document.
///
/// `resource_path` may be absolute or relative to the working root. Nothing
/// is written; the caller decides what to do with the returned asset.
pub fn transform_document(
    ctx: &BuildContext,
    resource_path: &Path,
    source: &str,
    options: &LoaderOptions,
) -> AtelierResult<LoaderOutput> {
    let resolver = ctx.resolver();
    let location = resolver.locate(resource_path)?;

    let relative_root = resolver.relative_root(&location, ctx.manifests())?;
    let context = options
        .context
        .as_deref()
        .unwrap_or_else(|| ctx.working_root());
    let url = interpolate_name(
        &output_template(&relative_root, &options.filename),
        &NameContext {
            resource_path: &location.path,
            context,
            content: source,
            reg_exp: options.reg_exp.as_ref(),
        },
    );

    let config = ctx.template_config()?;
    let includes = render_global_templates(&config, &location);
    let augmented = format!("{source}\n{includes}");

    let allocator = Bump::new();
    let (root, errors) = parse(&allocator, &augmented);
    let diagnostics: Vec<CompilerError> = errors.into_iter().collect();
    for diagnostic in &diagnostics {
        let (line, column) = diagnostic.position().unwrap_or((0, 0));
        tracing::warn!(
            "{}:{}:{}: {}",
            location.path.display(),
            line,
            column,
            diagnostic
        );
    }

    let references = collect_references(&root);
    let mut assets = DependencyEmitter::new(resolver, &location);
    let mut script_refs = Vec::new();
    for reference in &references {
        match reference.kind {
            ReferenceKind::Asset => {
                assets.push(reference.raw_path.as_str());
            }
            ReferenceKind::Script => script_refs.push(reference.raw_path.as_str()),
            ReferenceKind::Ignored => {}
        }
    }
    let assets = assets.finish();
    let mut code = assets.statements();

    let mut scripts = Vec::new();
    if let Some(rule) = options.fallback.as_ref().filter(|_| !script_refs.is_empty()) {
        let mut emitter = DependencyEmitter::new(resolver, &location);
        for raw in &script_refs {
            emitter.push(raw);
        }
        for dependency in emitter.finish().dependencies {
            if let Some(chain) = build_fallback_chain(&dependency.specifier, rule)? {
                code.push_str(&render_statement(&chain));
                scripts.push(dependency);
            }
        }
    }

    let asset = options.emit_file.then(|| {
        let path = match &options.output_path {
            Some(OutputPath::Prefix(prefix)) => to_slash(&join_reference(Path::new(prefix), &url)),
            Some(OutputPath::Custom(f)) => f(&url, &location.path, context),
            None => url.clone(),
        };
        // A recovered tree may have lost or reshaped markup; only a clean
        // parse is rebuilt from the AST.
        let content = if options.minimize && diagnostics.is_empty() {
            minify(&root)
        } else {
            if options.minimize {
                tracing::warn!(
                    "{}: not minified, the document has parse errors",
                    location.path.display()
                );
            }
            augmented.clone()
        };
        EmittedAsset { path, content }
    });

    tracing::debug!(
        "{}: {} dependencies, {} fallback scripts",
        location.path.display(),
        assets.len(),
        scripts.len()
    );

    Ok(LoaderOutput {
        code,
        asset,
        dependencies: assets.dependencies,
        scripts,
        diagnostics,
    })
}
