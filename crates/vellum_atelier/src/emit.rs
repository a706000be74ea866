//! Dependency statements.

use std::path::{Path, PathBuf};

use vellum_carton::path::{relative_to, to_slash};
use vellum_carton::FxHashSet;

use crate::resolve::{DocumentLocation, PathResolver};

/// A reference resolved to its absolute identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub absolute_path: PathBuf,
    /// Module specifier relative to the requesting document
    pub specifier: String,
}

/// Specifier for `target` as seen from directory `from_dir`.
///
/// Always `/`-separated and always explicitly relative.
pub fn module_specifier(from_dir: &Path, target: &Path) -> String {
    let relative = to_slash(&relative_to(from_dir, target));
    if relative.starts_with("./") || relative.starts_with("../") {
        relative
    } else {
        format!("./{relative}")
    }
}

/// Render one `require('<specifier>');` statement.
pub fn render_statement(specifier: &str) -> String {
    let mut out = String::with_capacity(specifier.len() + 12);
    out.push_str("require('");
    for c in specifier.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push_str("');");
    out
}

/// Resolves and deduplicates the references of one document.
///
/// Identity is the absolute path; the first occurrence wins and keeps its
/// position.
pub struct DependencyEmitter<'r> {
    resolver: &'r PathResolver,
    location: &'r DocumentLocation,
    seen: FxHashSet<PathBuf>,
    dependencies: Vec<ResolvedDependency>,
}

impl<'r> DependencyEmitter<'r> {
    pub fn new(resolver: &'r PathResolver, location: &'r DocumentLocation) -> Self {
        Self {
            resolver,
            location,
            seen: FxHashSet::default(),
            dependencies: Vec::new(),
        }
    }

    /// Add a raw reference. Returns `false` when it duplicates an earlier one.
    pub fn push(&mut self, raw: &str) -> bool {
        let absolute_path = self.resolver.resolve(self.location, raw);
        if !self.seen.insert(absolute_path.clone()) {
            tracing::trace!("duplicate reference {} dropped", raw);
            return false;
        }

        let specifier = module_specifier(&self.location.dir, &absolute_path);
        self.dependencies.push(ResolvedDependency {
            absolute_path,
            specifier,
        });
        true
    }

    pub fn finish(self) -> EmittedDependencies {
        EmittedDependencies {
            dependencies: self.dependencies,
        }
    }
}

/// Ordered, deduplicated dependencies of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmittedDependencies {
    pub dependencies: Vec<ResolvedDependency>,
}

impl EmittedDependencies {
    pub fn specifiers(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(|d| d.specifier.as_str())
    }

    /// All statements concatenated without separators.
    pub fn statements(&self) -> String {
        self.specifiers().map(render_statement).collect()
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_specifier_prefix() {
        let dir = Path::new("/p/src/pages/a");
        assert_eq!(module_specifier(dir, Path::new("/p/src/pages/a/x.wxml")), "./x.wxml");
        assert_eq!(
            module_specifier(dir, Path::new("/p/src/common/x.wxml")),
            "../../common/x.wxml"
        );
    }

    #[test]
    fn test_render_statement_escapes() {
        assert_eq!(render_statement("./a.png"), "require('./a.png');");
        assert_eq!(render_statement("./it's.png"), r"require('./it\'s.png');");
    }

    #[test]
    fn test_dedup_keeps_first_position() {
        let resolver = PathResolver::new("/p");
        let location = resolver.locate(Path::new("/p/src/pages/a/index.wxml")).unwrap();
        let mut emitter = DependencyEmitter::new(&resolver, &location);

        assert!(emitter.push("./x.wxml"));
        assert!(emitter.push("/common/y.wxml"));
        assert!(!emitter.push("x.wxml"));
        assert!(!emitter.push("/pages/a/x.wxml"));
        assert!(!emitter.push("../a/./x.wxml"));

        let emitted = emitter.finish();
        assert_eq!(
            emitted.specifiers().collect::<Vec<_>>(),
            vec!["./x.wxml", "../../common/y.wxml"]
        );
        assert_eq!(
            emitted.statements(),
            "require('./x.wxml');require('../../common/y.wxml');"
        );
    }

    #[test]
    fn test_empty() {
        let emitted = EmittedDependencies::default();
        assert!(emitted.is_empty());
        assert_eq!(emitted.statements(), "");
    }
}
