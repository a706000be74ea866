//! CLI subcommands and the helpers they share.

pub mod build;
pub mod deps;

use std::path::{Path, PathBuf};

use glob::glob;
use ignore::Walk;
use serde::Serialize;
use vellum_atelier::{BuildContext, LoaderOutput};
use vellum_carton::path::{normalize, relative_to, to_slash};

use crate::config::VellumConfig;

/// Default document pattern
pub const DEFAULT_PATTERN: &str = "./src/**/*.wxml";

/// Default extension when walking directories
pub const DEFAULT_EXTENSION: &str = "wxml";

/// Absolute working root: `root` if given, the current directory otherwise.
pub fn resolve_root(root: Option<&Path>) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_default();
    match root {
        Some(root) => normalize(&cwd.join(root)),
        None => normalize(&cwd),
    }
}

/// Shared build state for `root`, honoring the config's rule table path.
pub fn build_context(root: &Path, config: &VellumConfig) -> BuildContext {
    let ctx = BuildContext::new(root);
    match &config.templates {
        Some(path) => ctx.with_template_config(root.join(path)),
        None => ctx,
    }
}

/// Anchor a relative pattern at the working root.
fn anchor_pattern(root: &Path, pattern: &str) -> String {
    if Path::new(pattern).is_absolute() {
        return pattern.to_string();
    }
    let relative = pattern.trim_start_matches("./");
    root.join(relative).to_string_lossy().into_owned()
}

/// Collect documents from glob patterns or directories.
///
/// Relative patterns are taken from `root`. Glob matches skip
/// `node_modules` unless the pattern names it. Directory walks respect
/// `.gitignore` and keep only files with `extension`. Results are absolute,
/// sorted and deduplicated.
pub fn collect_files(root: &Path, patterns: &[String], extension: &str) -> Vec<PathBuf> {
    let default_pattern = [DEFAULT_PATTERN.to_string()];
    let patterns = if patterns.is_empty() {
        &default_pattern[..]
    } else {
        patterns
    };

    let mut files: Vec<PathBuf> = patterns
        .iter()
        .flat_map(|pattern| {
            let anchored = anchor_pattern(root, pattern);
            if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
                let wants_packages = pattern.contains("node_modules");
                glob(&anchored)
                    .ok()
                    .into_iter()
                    .flatten()
                    .filter_map(|r| r.ok())
                    .filter(|p| p.is_file())
                    .filter(|p| {
                        wants_packages
                            || !p
                                .strip_prefix(root)
                                .unwrap_or(p)
                                .components()
                                .any(|c| c.as_os_str() == "node_modules")
                    })
                    .collect::<Vec<_>>()
            } else {
                Walk::new(&anchored)
                    .filter_map(|e| e.ok())
                    .filter(|e| e.path().extension().is_some_and(|ext| ext == extension))
                    .map(|e| e.path().to_path_buf())
                    .collect::<Vec<_>>()
            }
        })
        .map(|p| normalize(&p))
        .collect();

    files.sort();
    files.dedup();
    files
}

/// Serializable summary of one transformed document.
#[derive(Debug, Serialize)]
pub struct DocumentReport {
    /// Document path relative to the working root
    pub document: String,
    /// Output path of the emitted template, if any
    pub output: Option<String>,
    pub code: String,
    pub dependencies: Vec<String>,
    pub scripts: Vec<String>,
    pub diagnostics: Vec<String>,
}

impl DocumentReport {
    pub fn new(root: &Path, path: &Path, output: &LoaderOutput) -> Self {
        Self {
            document: to_slash(&relative_to(root, path)),
            output: output.asset.as_ref().map(|asset| asset.path.clone()),
            code: output.code.clone(),
            dependencies: output
                .dependencies
                .iter()
                .map(|d| d.specifier.clone())
                .collect(),
            scripts: output.scripts.iter().map(|d| d.specifier.clone()).collect(),
            diagnostics: output
                .diagnostics
                .iter()
                .map(|d| match d.position() {
                    Some((line, column)) => format!("{}:{}: {}", line, column, d),
                    None => d.to_string(),
                })
                .collect(),
        }
    }

    /// Where the dependency module is written: next to the emitted template,
    /// or mirroring the document when nothing is emitted.
    pub fn module_path(&self) -> String {
        format!("{}.js", self.output.as_deref().unwrap_or(&self.document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_atelier::{transform_document, LoaderOptions};

    #[test]
    fn test_document_report() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let ctx = BuildContext::new(root);
        let path = root.join("src/pages/a/index.wxml");
        let output = transform_document(
            &ctx,
            &path,
            r#"<image src="/img/a.png"/><view>"#,
            &LoaderOptions::default(),
        )
        .unwrap();

        let report = DocumentReport::new(root, &path, &output);
        assert_eq!(report.document, "src/pages/a/index.wxml");
        assert_eq!(report.output.as_deref(), Some("pages/a/index.wxml"));
        assert_eq!(report.dependencies, vec!["../../img/a.png"]);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.module_path(), "pages/a/index.wxml.js");
    }

    #[test]
    fn test_collect_files_walks_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src/pages")).unwrap();
        std::fs::write(dir.path().join("src/pages/a.wxml"), "<view/>").unwrap();
        std::fs::write(dir.path().join("src/pages/a.js"), "").unwrap();

        let pattern = dir.path().join("src").to_string_lossy().into_owned();
        let files = collect_files(dir.path(), &[pattern], DEFAULT_EXTENSION);
        assert_eq!(files, vec![dir.path().join("src/pages/a.wxml")]);
    }

    #[test]
    fn test_collect_files_glob_skips_packages() {
        let dir = tempfile::tempdir().unwrap();
        for rel in ["src/a.wxml", "node_modules/lib/b.wxml"] {
            let path = dir.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "<view/>").unwrap();
        }

        let pattern = format!("{}/**/*.wxml", dir.path().display());
        let files = collect_files(dir.path(), &[pattern], DEFAULT_EXTENSION);
        assert_eq!(files, vec![dir.path().join("src/a.wxml")]);
    }

    #[test]
    fn test_collect_files_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        for rel in ["src/pages/a.wxml", "src/b.wxml", "lib/c.wxml"] {
            let path = dir.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "<view/>").unwrap();
        }
        let root = normalize(dir.path());
        assert_ne!(std::env::current_dir().unwrap(), root);

        let files = collect_files(&root, &[], DEFAULT_EXTENSION);
        assert_eq!(files, vec![root.join("src/b.wxml"), root.join("src/pages/a.wxml")]);

        let files = collect_files(&root, &["lib".to_string()], DEFAULT_EXTENSION);
        assert_eq!(files, vec![root.join("lib/c.wxml")]);
    }
}
