//! Lexical path helpers.
//!
//! Reference strings found in templates are always `/`-separated, while the
//! documents they live in are addressed with native paths. Everything here
//! works on path components only and never touches the filesystem, so the
//! same input resolves identically on every platform.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

/// Remove `.` segments and fold `..` into its parent.
///
/// `..` never climbs above a root; on relative paths leading `..` segments
/// are kept.
///
/// ```
/// use std::path::{Path, PathBuf};
/// use vellum_carton::path::normalize;
///
/// assert_eq!(normalize(Path::new("/src/./pages/../common")), PathBuf::from("/src/common"));
/// assert_eq!(normalize(Path::new("../a/./b")), PathBuf::from("../a/b"));
/// ```
pub fn normalize(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            c => components.push(c),
        }
    }

    if components.is_empty() {
        return PathBuf::from(".");
    }
    components.iter().collect()
}

/// Join a `/`-separated reference onto `base` and normalize the result.
///
/// A leading `/` on the reference does not reset the join: the reference is
/// always taken relative to `base`.
pub fn join_reference(base: &Path, reference: &str) -> PathBuf {
    let mut joined = base.to_path_buf();
    for segment in reference.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        joined.push(segment);
    }
    normalize(&joined)
}

/// Compute the path that leads from directory `from_dir` to `to`.
///
/// Both paths are normalized first. Identical inputs produce an empty path.
pub fn relative_to(from_dir: &Path, to: &Path) -> PathBuf {
    let from = normalize(from_dir);
    let to = normalize(to);
    let from_parts: Vec<Component<'_>> = from.components().collect();
    let to_parts: Vec<Component<'_>> = to.components().collect();

    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..from_parts.len() {
        relative.push("..");
    }
    for part in &to_parts[common..] {
        relative.push(part.as_os_str());
    }
    relative
}

/// Render a path with `/` separators regardless of platform.
pub fn to_slash(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        let segment: Cow<'_, str> = match component {
            Component::RootDir => {
                out.push('/');
                continue;
            }
            Component::Prefix(prefix) => {
                out.push_str(&prefix.as_os_str().to_string_lossy());
                continue;
            }
            Component::CurDir => ".".into(),
            Component::ParentDir => "..".into(),
            Component::Normal(s) => s.to_string_lossy(),
        };
        if !out.is_empty() && !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(&segment);
    }
    out
}

/// Split a path into its normal (named) segments, dropping roots and prefixes.
pub fn segments(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_parent_dirs() {
        assert_eq!(
            normalize(Path::new("/project/src/pages/../common/./x.wxml")),
            PathBuf::from("/project/src/common/x.wxml")
        );
    }

    #[test]
    fn test_normalize_stops_at_root() {
        assert_eq!(normalize(Path::new("/../../a")), PathBuf::from("/a"));
    }

    #[test]
    fn test_normalize_keeps_leading_parent_on_relative() {
        assert_eq!(normalize(Path::new("../../a/b/..")), PathBuf::from("../../a"));
        assert_eq!(normalize(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn test_join_reference_root_relative() {
        assert_eq!(
            join_reference(Path::new("/project/src"), "/common/x.wxml"),
            PathBuf::from("/project/src/common/x.wxml")
        );
    }

    #[test]
    fn test_join_reference_relative() {
        let base = Path::new("/project/src/pages/a");
        assert_eq!(
            join_reference(base, "./x.wxml"),
            PathBuf::from("/project/src/pages/a/x.wxml")
        );
        assert_eq!(
            join_reference(base, "../../images//logo.png"),
            PathBuf::from("/project/src/images/logo.png")
        );
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(
            relative_to(
                Path::new("/project/src/pages/a"),
                Path::new("/project/src/common/x.wxml")
            ),
            PathBuf::from("../../common/x.wxml")
        );
        assert_eq!(
            relative_to(Path::new("/project/src"), Path::new("/project/src/a.png")),
            PathBuf::from("a.png")
        );
        assert_eq!(
            relative_to(Path::new("/project/src"), Path::new("/project/src")),
            PathBuf::new()
        );
    }

    #[test]
    fn test_to_slash() {
        assert_eq!(to_slash(Path::new("/a/b/c")), "/a/b/c");
        assert_eq!(to_slash(Path::new("../a/b")), "../a/b");
        assert_eq!(to_slash(Path::new("")), "");
    }

    #[test]
    fn test_segments() {
        assert_eq!(
            segments(Path::new("/project/node_modules/@scope/pkg")),
            vec!["project", "node_modules", "@scope", "pkg"]
        );
    }
}
