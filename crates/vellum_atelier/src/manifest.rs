//! Dependency package manifests (`package.json`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;

use crate::error::{AtelierError, AtelierResult};
use crate::pattern::OneOrMany;

pub const MANIFEST_FILE: &str = "package.json";

/// The subset of `package.json` that decides entry-directory flattening.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub files: Option<OneOrMany<String>>,
    #[serde(default)]
    pub miniprogram_root: Option<String>,
    /// Older spelling of `miniprogramRoot`.
    #[serde(default)]
    pub miniprogram: Option<String>,
}

impl PackageManifest {
    /// Declared mini-program entry directory, either spelling.
    pub fn entry_root(&self) -> Option<&str> {
        self.miniprogram_root
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.miniprogram.as_deref().filter(|s| !s.is_empty()))
    }

    /// Whether the package declares where its distributable files live.
    ///
    /// An empty `files` string does not count; an empty `files` list does.
    pub fn declares_entry(&self) -> bool {
        let has_files = match &self.files {
            Some(OneOrMany::One(file)) => !file.is_empty(),
            Some(OneOrMany::Many(_)) => true,
            None => false,
        };
        has_files || self.entry_root().is_some()
    }
}

/// Result of probing for the manifest of the package that owns a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageLookup {
    /// `depth` is the number of segments naming the package
    /// (1 for `pkg`, 2 for `@scope/pkg`).
    Found {
        manifest: Arc<PackageManifest>,
        depth: usize,
    },
    NotAPackage,
}

/// Load-once cache of package manifests, shared across documents.
#[derive(Debug, Default)]
pub struct ManifestCache {
    entries: DashMap<PathBuf, Arc<PackageManifest>>,
}

impl ManifestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the manifest for a document given its segments below the
    /// packages directory: `<seg0>/package.json` first, then
    /// `<seg0>/<seg1>/package.json`.
    pub fn lookup(&self, packages_dir: &Path, segments: &[String]) -> AtelierResult<PackageLookup> {
        let Some(first) = segments.first() else {
            return Ok(PackageLookup::NotAPackage);
        };

        let mut package_dir = packages_dir.join(first);
        if let Some(manifest) = self.load(&package_dir.join(MANIFEST_FILE))? {
            return Ok(PackageLookup::Found { manifest, depth: 1 });
        }

        if let Some(second) = segments.get(1) {
            package_dir.push(second);
            if let Some(manifest) = self.load(&package_dir.join(MANIFEST_FILE))? {
                return Ok(PackageLookup::Found { manifest, depth: 2 });
            }
        }

        Ok(PackageLookup::NotAPackage)
    }

    /// Number of cached manifests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn load(&self, path: &Path) -> AtelierResult<Option<Arc<PackageManifest>>> {
        if let Some(hit) = self.entries.get(path) {
            return Ok(Some(Arc::clone(hit.value())));
        }
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| AtelierError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: PackageManifest =
            serde_json::from_str(&content).map_err(|source| AtelierError::Manifest {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!("loaded package manifest {}", path.display());

        // A concurrent first load may have won; keep whichever landed first.
        let entry = self
            .entries
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(manifest));
        Ok(Some(Arc::clone(entry.value())))
    }
}
