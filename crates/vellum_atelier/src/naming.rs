//! Output name interpolation.
//!
//! Supported placeholders: `[name]`, `[ext]`, `[path]`, `[folder]`,
//! `[hash]`, `[contenthash]` (both with an optional `:N` length) and `[N]`
//! for capture group `N` of the naming pattern.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use vellum_carton::hash::{content_hash, short_content_hash};
use vellum_carton::path::{relative_to, to_slash};

use crate::pattern::Pattern;

pub const DEFAULT_FILENAME: &str = "[name].[ext]";

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(?:(hash|contenthash)(?::(\d+))?|(name|ext|path|folder)|(\d+))\]")
        .expect("valid naming regex")
});

/// What a name is computed from.
#[derive(Debug, Clone, Copy)]
pub struct NameContext<'a> {
    pub resource_path: &'a Path,
    /// Base directory for `[path]`
    pub context: &'a Path,
    /// Hashed by `[hash]` / `[contenthash]`
    pub content: &'a str,
    /// Feeds `[N]` placeholders
    pub reg_exp: Option<&'a Pattern>,
}

/// Substitute placeholders in `template`. Unknown placeholders are kept.
pub fn interpolate_name(template: &str, ctx: &NameContext<'_>) -> String {
    let resource = ctx.resource_path;
    let name = resource
        .file_stem()
        .map_or_else(|| "file".to_string(), |s| s.to_string_lossy().into_owned());
    let ext = resource
        .extension()
        .map_or_else(|| "bin".to_string(), |s| s.to_string_lossy().into_owned());
    let dir = resource.parent().unwrap_or(Path::new(""));
    let folder = dir
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let captures = ctx
        .reg_exp
        .and_then(|pattern| pattern.captures(&to_slash(resource)))
        .unwrap_or_default();

    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures<'_>| {
            if caps.get(1).is_some() {
                return match caps.get(2).and_then(|n| n.as_str().parse().ok()) {
                    Some(len) => short_content_hash(ctx.content, len),
                    None => content_hash(ctx.content),
                };
            }
            if let Some(key) = caps.get(3) {
                return match key.as_str() {
                    "name" => name.clone(),
                    "ext" => ext.clone(),
                    "path" => path_placeholder(ctx.context, dir),
                    _ => folder.clone(),
                };
            }
            caps.get(4)
                .and_then(|n| n.as_str().parse::<usize>().ok())
                .and_then(|n| captures.get(n).cloned())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Directory relative to `context` with a trailing `/`; `..` becomes `_`.
fn path_placeholder(context: &Path, dir: &Path) -> String {
    let relative = to_slash(&relative_to(context, dir));
    if relative.is_empty() {
        return String::new();
    }
    let mut out: String = relative
        .split('/')
        .map(|segment| if segment == ".." { "_" } else { segment })
        .collect::<Vec<_>>()
        .join("/");
    out.push('/');
    out
}

/// `relative_root/filename` as a `/`-separated naming template.
pub fn output_template(relative_root: &Path, filename: &str) -> String {
    let root = to_slash(relative_root);
    if root.is_empty() || root == "." {
        filename.to_string()
    } else {
        format!("{root}/{filename}")
    }
}
