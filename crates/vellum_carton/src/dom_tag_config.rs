//! Tag configuration shared by the parser and the minifier.

use phf::phf_set;

/// Tags that never have children or an end tag.
static VOID_TAGS: phf::Set<&'static str> = phf_set! {
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr",
};

/// Check whether a tag is a void tag (`<br>`, `<input>`, ...).
#[inline]
pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_tags() {
        assert!(is_void_tag("input"));
        assert!(is_void_tag("img"));
        assert!(!is_void_tag("image"));
        assert!(!is_void_tag("include"));
    }
}
