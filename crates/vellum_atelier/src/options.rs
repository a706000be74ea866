//! Per-document loader options.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Deserializer};

use crate::fallback::FallbackRule;
use crate::naming::DEFAULT_FILENAME;
use crate::pattern::Pattern;

/// Host callback computing the final output path from
/// `(url, resource_path, context)`.
pub type OutputPathFn = Arc<dyn Fn(&str, &Path, &Path) -> String + Send + Sync>;

/// Post-processing of the interpolated output name.
#[derive(Clone)]
pub enum OutputPath {
    /// Joined in front of the name with `/`
    Prefix(String),
    Custom(OutputPathFn),
}

impl fmt::Debug for OutputPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix(prefix) => f.debug_tuple("Prefix").field(prefix).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for OutputPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::Prefix)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoaderOptions {
    /// Naming pattern for the emitted template
    pub filename: String,
    pub output_path: Option<OutputPath>,
    pub emit_file: bool,
    pub minimize: bool,
    pub fallback: Option<FallbackRule>,
    /// Base directory for `[path]`; the working root when unset
    pub context: Option<PathBuf>,
    pub reg_exp: Option<Pattern>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            filename: DEFAULT_FILENAME.to_string(),
            output_path: None,
            emit_file: true,
            minimize: false,
            fallback: None,
            context: None,
            reg_exp: None,
        }
    }
}

impl LoaderOptions {
    pub fn from_json(json: &str) -> crate::AtelierResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
