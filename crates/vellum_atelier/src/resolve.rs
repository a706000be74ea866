//! Path resolution for template references.
//!
//! References starting with `/` are anchored at the document's source root,
//! the first directory below the working root (`src` by default). All other
//! references are relative to the document's own directory.

use std::path::{Path, PathBuf};

use vellum_carton::path::{join_reference, normalize, relative_to, segments, to_slash};

use crate::error::{AtelierError, AtelierResult};
use crate::manifest::{ManifestCache, PackageLookup};

/// Source root used for documents sitting directly in the working root.
pub const DEFAULT_SOURCE_ROOT: &str = "src";

/// Directory holding third-party packages.
pub const PACKAGES_DIR: &str = "node_modules";

/// Where a document lives, relative to the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLocation {
    /// Absolute, normalized document path
    pub path: PathBuf,
    /// Directory containing the document
    pub dir: PathBuf,
    /// Absolute source root anchoring `/` references
    pub source_root: PathBuf,
}

impl DocumentLocation {
    /// The document addressed the way templates address it: `/` followed by
    /// its path under the source root.
    pub fn root_relative(&self) -> String {
        format!("/{}", to_slash(&relative_to(&self.source_root, &self.path)))
    }
}

/// Resolves references against one working root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    working_root: PathBuf,
}

impl PathResolver {
    pub fn new(working_root: impl AsRef<Path>) -> Self {
        Self {
            working_root: normalize(working_root.as_ref()),
        }
    }

    pub fn working_root(&self) -> &Path {
        &self.working_root
    }

    /// Place a document inside the build.
    ///
    /// Relative document paths are taken from the working root. Documents
    /// outside the working root are rejected.
    pub fn locate(&self, document: &Path) -> AtelierResult<DocumentLocation> {
        let path = if document.is_absolute() {
            normalize(document)
        } else {
            normalize(&self.working_root.join(document))
        };

        let Ok(relative) = path.strip_prefix(&self.working_root) else {
            return Err(AtelierError::OutsideWorkingRoot {
                document: path,
                root: self.working_root.clone(),
            });
        };

        let dir = path
            .parent()
            .map_or_else(|| self.working_root.clone(), Path::to_path_buf);
        let source_root = self.source_root_for(relative.parent().unwrap_or(Path::new("")));

        Ok(DocumentLocation {
            path,
            dir,
            source_root,
        })
    }

    fn source_root_for(&self, relative_dir: &Path) -> PathBuf {
        let name = segments(relative_dir)
            .into_iter()
            .next()
            .unwrap_or_else(|| DEFAULT_SOURCE_ROOT.to_string());
        self.working_root.join(name)
    }

    /// Resolve a raw reference to an absolute path.
    pub fn resolve(&self, location: &DocumentLocation, raw: &str) -> PathBuf {
        if raw.starts_with('/') {
            join_reference(&location.source_root, raw)
        } else {
            join_reference(&location.dir, raw)
        }
    }

    /// The location used for output naming.
    ///
    /// Documents inside a dependency package that declares its entry
    /// directory have that directory flattened away:
    /// `node_modules/libA/dist/x.wxml` is named as `node_modules/libA/x.wxml`.
    pub fn effective_location(
        &self,
        location: &DocumentLocation,
        manifests: &ManifestCache,
    ) -> AtelierResult<DocumentLocation> {
        let packages_dir = self.working_root.join(PACKAGES_DIR);
        let Ok(inside) = location.path.strip_prefix(&packages_dir) else {
            return Ok(location.clone());
        };

        let mut parts = segments(inside);
        let depth = match manifests.lookup(&packages_dir, &parts)? {
            PackageLookup::Found { manifest, depth } if manifest.declares_entry() => depth,
            _ => return Ok(location.clone()),
        };

        // Keep the file name: only a directory between package and file goes.
        if parts.len() <= depth + 1 {
            return Ok(location.clone());
        }
        let flattened = parts.remove(depth);
        tracing::debug!(
            "flattening package directory `{}` for {}",
            flattened,
            location.path.display()
        );

        let mut rewritten = packages_dir;
        rewritten.extend(&parts);
        self.locate(&rewritten)
    }

    /// Directory of the document relative to its source root, after the
    /// package rewrite. This is the directory part of the output name.
    pub fn relative_root(
        &self,
        location: &DocumentLocation,
        manifests: &ManifestCache,
    ) -> AtelierResult<PathBuf> {
        let effective = self.effective_location(location, manifests)?;
        Ok(relative_to(&effective.source_root, &effective.dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PathResolver {
        PathResolver::new("/project")
    }

    #[test]
    fn test_locate_source_root() {
        let loc = resolver()
            .locate(Path::new("/project/src/pages/a/index.wxml"))
            .unwrap();
        assert_eq!(loc.dir, PathBuf::from("/project/src/pages/a"));
        assert_eq!(loc.source_root, PathBuf::from("/project/src"));
        assert_eq!(loc.root_relative(), "/pages/a/index.wxml");
    }

    #[test]
    fn test_locate_other_top_level_dir() {
        let loc = resolver().locate(Path::new("/project/app/index.wxml")).unwrap();
        assert_eq!(loc.source_root, PathBuf::from("/project/app"));
    }

    #[test]
    fn test_locate_default_source_root() {
        let loc = resolver().locate(Path::new("/project/index.wxml")).unwrap();
        assert_eq!(loc.source_root, PathBuf::from("/project/src"));
    }

    #[test]
    fn test_locate_relative_document() {
        let loc = resolver().locate(Path::new("src/./pages/x.wxml")).unwrap();
        assert_eq!(loc.path, PathBuf::from("/project/src/pages/x.wxml"));
    }

    #[test]
    fn test_locate_outside_root() {
        let err = resolver().locate(Path::new("/elsewhere/x.wxml")).unwrap_err();
        assert!(matches!(err, AtelierError::OutsideWorkingRoot { .. }));

        let err = resolver().locate(Path::new("/project/../x.wxml")).unwrap_err();
        assert!(matches!(err, AtelierError::OutsideWorkingRoot { .. }));
    }

    #[test]
    fn test_resolve_root_vs_relative() {
        let r = resolver();
        let loc = r.locate(Path::new("/project/src/pages/a/index.wxml")).unwrap();

        assert_eq!(
            r.resolve(&loc, "/common/x.wxml"),
            PathBuf::from("/project/src/common/x.wxml")
        );
        assert_eq!(
            r.resolve(&loc, "./x.wxml"),
            PathBuf::from("/project/src/pages/a/x.wxml")
        );
        assert_eq!(
            r.resolve(&loc, "x.wxml"),
            PathBuf::from("/project/src/pages/a/x.wxml")
        );
        assert_eq!(
            r.resolve(&loc, "../../img/a.png"),
            PathBuf::from("/project/src/img/a.png")
        );
    }

    #[test]
    fn test_relative_root_outside_packages() {
        let r = resolver();
        let loc = r.locate(Path::new("/project/src/pages/a/index.wxml")).unwrap();
        let root = r.relative_root(&loc, &ManifestCache::new()).unwrap();
        assert_eq!(root, PathBuf::from("pages/a"));
    }

    #[test]
    fn test_relative_root_package_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/libA");
        std::fs::create_dir_all(pkg.join("dist")).unwrap();
        std::fs::write(pkg.join("package.json"), r#"{"miniprogramRoot": "dist"}"#).unwrap();

        let r = PathResolver::new(dir.path());
        let manifests = ManifestCache::new();

        let loc = r.locate(&pkg.join("dist/x.wxml")).unwrap();
        assert_eq!(r.relative_root(&loc, &manifests).unwrap(), PathBuf::from("libA"));

        // Directly in the package root: nothing to flatten
        let loc = r.locate(&pkg.join("x.wxml")).unwrap();
        assert_eq!(r.relative_root(&loc, &manifests).unwrap(), PathBuf::from("libA"));

        let loc = r.locate(&pkg.join("dist/sub/y.wxml")).unwrap();
        assert_eq!(
            r.relative_root(&loc, &manifests).unwrap(),
            PathBuf::from("libA/sub")
        );
    }

    #[test]
    fn test_relative_root_scoped_package_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/@scope/ui");
        std::fs::create_dir_all(pkg.join("lib")).unwrap();
        std::fs::write(pkg.join("package.json"), r#"{"files": ["lib"]}"#).unwrap();

        let r = PathResolver::new(dir.path());
        let manifests = ManifestCache::new();

        let loc = r.locate(&pkg.join("lib/x.wxml")).unwrap();
        assert_eq!(
            r.relative_root(&loc, &manifests).unwrap(),
            PathBuf::from("@scope/ui")
        );

        let loc = r.locate(&pkg.join("lib/sub/y.wxml")).unwrap();
        assert_eq!(
            r.relative_root(&loc, &manifests).unwrap(),
            PathBuf::from("@scope/ui/sub")
        );
    }

    #[test]
    fn test_relative_root_package_without_entry() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/libB");
        std::fs::create_dir_all(pkg.join("dist")).unwrap();
        std::fs::write(pkg.join("package.json"), r#"{"name": "libB"}"#).unwrap();

        let r = PathResolver::new(dir.path());
        let loc = r.locate(&pkg.join("dist/x.wxml")).unwrap();
        assert_eq!(
            r.relative_root(&loc, &ManifestCache::new()).unwrap(),
            PathBuf::from("libB/dist")
        );
    }
}
