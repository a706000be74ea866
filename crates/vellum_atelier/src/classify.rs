//! Reference classification.
//!
//! Walks a parsed document and lists every attribute that points at another
//! resource, in depth-first pre-order.

use once_cell::sync::Lazy;
use phf::phf_map;
use regex::Regex;
use vellum_carton::String;
use vellum_relief::ast::{RootNode, TemplateChildNode};

/// Tags that carry a resource reference, and the attribute holding it.
static REFERENCE_ATTRS: phf::Map<&'static str, &'static str> = phf_map! {
    "image" => "src",
    "cover-image" => "src",
    "filter" => "src",
    "import" => "src",
    "include" => "src",
    "wxs" => "src",
    "import-sjs" => "from",
};

/// `{{` up to the first `}`.
static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{[\s\S]*?\}").expect("valid placeholder regex"));

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\w+:)?//(\S+)$").expect("valid url regex"));

static LOCALHOST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^localhost[:?\d]*(?:[^:?\d]\S*)?$").expect("valid localhost regex")
});

static DOMAIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s.]+\.\S{2,}$").expect("valid domain regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// Script module (`.js`), eligible for the fallback chain
    Script,
    /// Any other static resource
    Asset,
    /// Dynamic, inline or external; never resolved
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub raw_path: String,
}

/// Attribute holding the reference for `tag`, if the tag carries one.
pub fn reference_attr(tag: &str) -> Option<&'static str> {
    REFERENCE_ATTRS.get(tag).copied()
}

/// Whether `value` is an absolute or protocol-relative URL with a real host.
pub fn is_external_url(value: &str) -> bool {
    let Some(caps) = URL_RE.captures(value) else {
        return false;
    };
    let rest = caps.get(1).map_or("", |m| m.as_str());
    !rest.is_empty() && (LOCALHOST_RE.is_match(rest) || DOMAIN_RE.is_match(rest))
}

/// Classify one attribute value.
pub fn classify_path(raw: &str) -> ReferenceKind {
    if raw.is_empty()
        || raw.starts_with("data:")
        || raw.starts_with("<svg")
        || PLACEHOLDER_RE.is_match(raw)
        || is_external_url(raw)
    {
        return ReferenceKind::Ignored;
    }

    if raw.ends_with(".js") {
        ReferenceKind::Script
    } else {
        ReferenceKind::Asset
    }
}

/// Collect the references of a document in depth-first pre-order.
///
/// A reference-bearing tag without its attribute still yields an
/// [`ReferenceKind::Ignored`] entry.
pub fn collect_references(root: &RootNode<'_>) -> Vec<Reference> {
    let mut references = Vec::new();
    walk(&root.children, &mut references);
    references
}

fn walk(children: &[TemplateChildNode<'_>], out: &mut Vec<Reference>) {
    for child in children {
        let Some(element) = child.as_element() else {
            continue;
        };

        if let Some(attr) = reference_attr(element.tag.as_str()) {
            let raw_path = element.attr(attr).unwrap_or_default();
            out.push(Reference {
                kind: classify_path(raw_path),
                raw_path: raw_path.into(),
            });
        }

        walk(&element.children, out);
    }
}
