//! Build-wide shared state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::AtelierResult;
use crate::manifest::ManifestCache;
use crate::resolve::PathResolver;
use crate::templates::{TemplateConfig, TEMPLATE_CONFIG_PATH};

/// State shared by every document of one build.
///
/// Holds only read-mostly data: the template rule table, loaded on first
/// use, and the package manifest cache. Safe to share across threads.
#[derive(Debug)]
pub struct BuildContext {
    resolver: PathResolver,
    template_config_path: PathBuf,
    templates: OnceCell<Arc<TemplateConfig>>,
    manifests: ManifestCache,
}

impl BuildContext {
    pub fn new(working_root: impl AsRef<Path>) -> Self {
        let resolver = PathResolver::new(working_root);
        let template_config_path = resolver.working_root().join(TEMPLATE_CONFIG_PATH);
        Self {
            resolver,
            template_config_path,
            templates: OnceCell::new(),
            manifests: ManifestCache::new(),
        }
    }

    /// Read the rule table from `path` instead of `src/templates.json`.
    pub fn with_template_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_config_path = path.into();
        self
    }

    /// Use an already-built rule table.
    pub fn with_templates(self, config: TemplateConfig) -> Self {
        Self {
            templates: OnceCell::with_value(Arc::new(config)),
            ..self
        }
    }

    pub fn working_root(&self) -> &Path {
        self.resolver.working_root()
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn manifests(&self) -> &ManifestCache {
        &self.manifests
    }

    pub fn template_config_path(&self) -> &Path {
        &self.template_config_path
    }

    /// The rule table, loaded on first call.
    ///
    /// A load failure is returned to the caller and retried on the next call.
    pub fn template_config(&self) -> AtelierResult<Arc<TemplateConfig>> {
        self.templates
            .get_or_try_init(|| TemplateConfig::load(&self.template_config_path).map(Arc::new))
            .cloned()
    }
}
