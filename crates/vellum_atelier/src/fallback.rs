//! Fallback loader chains for script references.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{AtelierError, AtelierResult};
use crate::pattern::Pattern;

/// `{ test, use }` as written in loader options.
///
/// Both fields are optional at parse time so that a half-written rule only
/// fails for documents that actually contain script references.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FallbackRule {
    #[serde(default)]
    pub test: Option<Pattern>,
    #[serde(default, rename = "use")]
    pub chain: Option<Vec<LoaderUse>>,
}

/// One step of the chain: a loader id and its options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawLoaderUse")]
pub struct LoaderUse {
    pub loader: String,
    pub options: Option<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLoaderUse {
    Id(String),
    Full {
        loader: String,
        #[serde(default)]
        options: Option<Value>,
    },
}

impl From<RawLoaderUse> for LoaderUse {
    fn from(raw: RawLoaderUse) -> Self {
        match raw {
            RawLoaderUse::Id(loader) => Self {
                loader,
                options: None,
            },
            RawLoaderUse::Full { loader, options } => Self { loader, options },
        }
    }
}

impl LoaderUse {
    /// `loader?<compact json>`, or the bare id without options.
    pub fn render(&self) -> String {
        match &self.options {
            None | Some(Value::Null) => self.loader.clone(),
            Some(options) => format!("{}?{}", self.loader, options),
        }
    }
}

/// Build the chained specifier for `path`.
///
/// Returns `Ok(None)` when the rule's test does not match.
pub fn build_fallback_chain(path: &str, rule: &FallbackRule) -> AtelierResult<Option<String>> {
    if path.is_empty() {
        return Err(AtelierError::InvalidFallbackPath);
    }
    let test = rule.test.as_ref().ok_or(AtelierError::FallbackMissingTest)?;
    if !test.is_match(path) {
        return Ok(None);
    }
    let chain = rule.chain.as_ref().ok_or(AtelierError::FallbackMissingUse)?;

    let mut segments: Vec<String> = chain.iter().map(LoaderUse::render).collect();
    segments.push(path.to_string());
    Ok(Some(segments.join("!")))
}
