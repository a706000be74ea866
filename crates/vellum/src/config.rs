//! Configuration file loading for vellum.
//!
//! Reads `vellum.config.json` from the working root. The `loader` section
//! holds the per-document transform options shared by every template.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use vellum_atelier::LoaderOptions;

pub const CONFIG_FILE: &str = "vellum.config.json";

/// Top-level vellum configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VellumConfig {
    /// JSON Schema reference (for editor autocompletion).
    #[serde(rename = "$schema", default)]
    #[allow(dead_code)]
    pub schema: Option<String>,

    /// Rule table for global templates, relative to the working root.
    /// Defaults to `src/templates.json`.
    #[serde(default)]
    pub templates: Option<PathBuf>,

    /// Transform options applied to every template.
    #[serde(default)]
    pub loader: LoaderOptions,
}

/// Load `vellum.config.json` from `root`, falling back to defaults.
pub fn load_config(root: &Path) -> VellumConfig {
    let config_path = root.join(CONFIG_FILE);

    if !config_path.exists() {
        return VellumConfig::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "\x1b[33mWarning:\x1b[0m Failed to parse {}: {}",
                    config_path.display(),
                    e
                );
                VellumConfig::default()
            }
        },
        Err(e) => {
            eprintln!(
                "\x1b[33mWarning:\x1b[0m Failed to read {}: {}",
                config_path.display(),
                e
            );
            VellumConfig::default()
        }
    }
}
