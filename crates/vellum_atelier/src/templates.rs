//! Global template injection.
//!
//! `src/templates.json` maps path patterns to template fragments that every
//! matching document includes implicitly:
//!
//! ```json
//! {
//!   "ignore": false,
//!   "loaders": [
//!     { "test": ["pages/", "!pages/login"], "templates": [{ "path": "common/toast.wxml" }] }
//!   ]
//! }
//! ```
//!
//! A rule applies when every one of its tests holds; a test prefixed with `!`
//! must not match. Templates of all applying rules are appended in rule order.

use std::path::Path;

use serde::Deserialize;
use vellum_carton::path::to_slash;

use crate::error::{AtelierError, AtelierResult};
use crate::pattern::{OneOrMany, Pattern};
use crate::resolve::DocumentLocation;

/// Default location of the rule table, relative to the working root.
pub const TEMPLATE_CONFIG_PATH: &str = "src/templates.json";

#[derive(Debug, Clone, Default)]
pub struct TemplateConfig {
    /// Disables injection entirely
    pub ignore: bool,
    pub rules: Vec<TemplateRule>,
}

#[derive(Debug, Clone)]
pub struct TemplateRule {
    pub tests: Vec<RuleTest>,
    pub templates: Vec<TemplateEntry>,
}

/// A pattern that must match, or with `negated`, must not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTest {
    pub pattern: Pattern,
    pub negated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateEntry {
    pub path: String,
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    ignore: bool,
    #[serde(default)]
    loaders: Vec<RawRule>,
}

#[derive(Deserialize)]
struct RawRule {
    #[serde(default)]
    test: Option<OneOrMany<String>>,
    #[serde(default)]
    templates: Vec<Option<RawEntry>>,
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(default)]
    path: Option<String>,
}

impl RuleTest {
    /// Parse `pattern` or `!pattern`.
    pub fn parse(source: &str) -> AtelierResult<Self> {
        match source.strip_prefix('!') {
            Some(rest) => Ok(Self {
                pattern: Pattern::new(rest)?,
                negated: true,
            }),
            None => Ok(Self {
                pattern: Pattern::new(source)?,
                negated: false,
            }),
        }
    }

    pub fn holds(&self, document: &str) -> bool {
        self.pattern.is_match(document) != self.negated
    }
}

impl TemplateRule {
    /// All tests hold. A rule without tests always applies.
    pub fn applies(&self, document: &str) -> bool {
        self.tests.iter().all(|test| test.holds(document))
    }
}

impl TemplateConfig {
    /// Read the rule table. A missing or blank file is an empty table.
    pub fn load(path: &Path) -> AtelierResult<Self> {
        if !path.is_file() {
            tracing::debug!("no template config at {}", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| AtelierError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content, path)
    }

    /// Parse a rule table; `origin` only labels errors.
    pub fn from_json(content: &str, origin: &Path) -> AtelierResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawConfig =
            serde_json::from_str(content).map_err(|source| AtelierError::TemplateConfig {
                path: origin.to_path_buf(),
                source,
            })?;

        let mut rules = Vec::with_capacity(raw.loaders.len());
        for rule in raw.loaders {
            let tests = rule
                .test
                .map(OneOrMany::into_vec)
                .unwrap_or_default()
                .iter()
                .map(|test| RuleTest::parse(test))
                .collect::<AtelierResult<Vec<_>>>()?;
            let templates = rule
                .templates
                .into_iter()
                .map(|entry| TemplateEntry {
                    path: entry.and_then(|e| e.path).unwrap_or_default(),
                })
                .collect();
            rules.push(TemplateRule { tests, templates });
        }

        Ok(Self {
            ignore: raw.ignore,
            rules,
        })
    }

    /// Templates of every rule applying to `document`, in rule order.
    pub fn matching_templates<'c>(
        &'c self,
        document: &'c str,
    ) -> impl Iterator<Item = &'c TemplateEntry> + 'c {
        self.rules
            .iter()
            .filter(move |rule| rule.applies(document))
            .flat_map(|rule| rule.templates.iter())
    }
}

/// Normalize a configured template path to a root-relative reference.
///
/// `./common/x.wxml` and `common/x.wxml` both become `/common/x.wxml`.
pub fn normalize_template_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('.') {
        rest.to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Render the `<include>` elements to append to a document.
///
/// Empty entries and entries naming the document itself are dropped.
pub fn render_global_templates(config: &TemplateConfig, location: &DocumentLocation) -> String {
    if config.ignore {
        return String::new();
    }

    let document = to_slash(&location.path);
    let root_relative = location.root_relative();

    let includes: Vec<String> = config
        .matching_templates(&document)
        .filter(|entry| !entry.path.is_empty())
        .map(|entry| normalize_template_path(&entry.path))
        .filter(|path| !path.is_empty() && *path != document && *path != root_relative)
        .map(|path| format!("<include src=\"{path}\" ></include>"))
        .collect();

    if !includes.is_empty() {
        tracing::debug!("injecting {} global template(s) into {}", includes.len(), document);
    }
    includes.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::PathResolver;

    fn config(json: &str) -> TemplateConfig {
        TemplateConfig::from_json(json, Path::new("templates.json")).unwrap()
    }

    fn location(path: &str) -> DocumentLocation {
        PathResolver::new("/p").locate(Path::new(path)).unwrap()
    }

    #[test]
    fn test_normalize_template_path() {
        assert_eq!(normalize_template_path("./common/x.wxml"), "/common/x.wxml");
        assert_eq!(normalize_template_path("common/x.wxml"), "/common/x.wxml");
        assert_eq!(normalize_template_path("/common/x.wxml"), "/common/x.wxml");
    }

    #[test]
    fn test_rule_test_negation() {
        let test = RuleTest::parse("!login").unwrap();
        assert!(test.negated);
        assert!(test.holds("/p/src/pages/home/index.wxml"));
        assert!(!test.holds("/p/src/pages/login/index.wxml"));
    }

    #[test]
    fn test_conjunction_and_union() {
        let cfg = config(
            r#"{"loaders": [
                {"test": ["pages/", "!login"], "templates": [{"path": "common/a.wxml"}]},
                {"test": "pages/", "templates": [{"path": "./common/b.wxml"}, null, {"path": ""}]},
                {"test": "components/", "templates": [{"path": "/common/c.wxml"}]}
            ]}"#,
        );

        let home = render_global_templates(&cfg, &location("/p/src/pages/home/index.wxml"));
        assert_eq!(
            home,
            "<include src=\"/common/a.wxml\" ></include>\n<include src=\"/common/b.wxml\" ></include>"
        );

        let login = render_global_templates(&cfg, &location("/p/src/pages/login/index.wxml"));
        assert_eq!(login, "<include src=\"/common/b.wxml\" ></include>");

        let other = render_global_templates(&cfg, &location("/p/src/utils/x.wxml"));
        assert_eq!(other, "");
    }

    #[test]
    fn test_self_exclusion() {
        let cfg = config(
            r#"{"loaders": [{"templates": [{"path": "common/toast.wxml"}, {"path": "common/modal.wxml"}]}]}"#,
        );
        let rendered = render_global_templates(&cfg, &location("/p/src/common/toast.wxml"));
        assert_eq!(rendered, "<include src=\"/common/modal.wxml\" ></include>");
    }

    #[test]
    fn test_ignore() {
        let cfg = config(r#"{"ignore": true, "loaders": [{"templates": [{"path": "a.wxml"}]}]}"#);
        assert_eq!(render_global_templates(&cfg, &location("/p/src/x.wxml")), "");
    }

    #[test]
    fn test_empty_and_invalid_config() {
        assert!(config("").rules.is_empty());
        assert!(config("  \n").rules.is_empty());
        assert!(config("{}").rules.is_empty());

        let err = TemplateConfig::from_json("{", Path::new("t.json")).unwrap_err();
        assert!(matches!(err, AtelierError::TemplateConfig { .. }));

        let err = TemplateConfig::from_json(r#"{"loaders": [{"test": "("}]}"#, Path::new("t.json"))
            .unwrap_err();
        assert!(matches!(err, AtelierError::InvalidPattern { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TemplateConfig::load(&dir.path().join(TEMPLATE_CONFIG_PATH)).unwrap();
        assert!(!cfg.ignore);
        assert!(cfg.rules.is_empty());
    }
}
