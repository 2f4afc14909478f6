//! Maps user-supplied relative paths onto the configured root directory.

use super::CoreError;
use std::path::{Component, Path, PathBuf};

/// Resolves request paths against a fixed root.
///
/// Resolution is purely lexical: nothing here touches the filesystem, so
/// callers are responsible for checking existence.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    enforce_containment: bool,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>, enforce_containment: bool) -> Self {
        Self {
            root: root.into(),
            enforce_containment,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Percent-decodes `relative`, normalizes it and joins it onto the root.
    ///
    /// With containment enforced, a `..` that would climb above the root is
    /// rejected. Without it, the path may end up at an ancestor of the root.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, CoreError> {
        let decoded = percent_decode(relative)?;
        let resolved = self.normalize_onto(self.root.clone(), &decoded)?;
        tracing::debug!("Absolute path: {}", resolved.display());
        Ok(resolved)
    }

    /// Joins a client-supplied child name onto an already resolved directory.
    pub fn resolve_child(&self, base: &Path, name: &str) -> Result<PathBuf, CoreError> {
        self.normalize_onto(base.to_path_buf(), name)
    }

    /// Renders `absolute` with the root prefix stripped, e.g. `/videos/a.mp4`.
    ///
    /// Paths outside the root are returned unchanged.
    pub fn display_relative(&self, absolute: &Path) -> String {
        match absolute.strip_prefix(&self.root) {
            Ok(relative) => format!("/{}", slash_path(relative)),
            Err(_) => absolute.to_string_lossy().to_string(),
        }
    }

    fn normalize_onto(&self, start: PathBuf, relative: &str) -> Result<PathBuf, CoreError> {
        let relative = relative.trim_start_matches(['/', '\\']);
        let mut result = start;

        for component in Path::new(relative).components() {
            match component {
                Component::Normal(name) => result.push(name),
                Component::CurDir => continue,
                Component::ParentDir => {
                    if self.enforce_containment && !self.is_strictly_inside(&result) {
                        tracing::warn!("Path escapes root directory: {:?}", relative);
                        return Err(CoreError::PathOutsideRoot(relative.to_string()));
                    }
                    if !result.starts_with(&self.root) {
                        tracing::warn!("Resolving {:?} above the root directory", relative);
                    }
                    result.pop();
                }
                Component::RootDir | Component::Prefix(_) => {
                    if self.enforce_containment {
                        tracing::warn!("Absolute path component in relative path: {:?}", relative);
                        return Err(CoreError::PathOutsideRoot(relative.to_string()));
                    }
                }
            }
        }

        Ok(result)
    }

    fn is_strictly_inside(&self, path: &Path) -> bool {
        path != self.root && path.starts_with(&self.root)
    }
}

/// Joins the components of a relative path with `/` regardless of platform.
pub fn slash_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Strict percent-decoding: every `%` must start a two-digit hex escape and
/// the decoded bytes must be UTF-8.
fn percent_decode(raw: &str) -> Result<String, CoreError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            let valid = escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return Err(CoreError::InvalidPath(
                    raw.to_string(),
                    format!("invalid escape at byte {}", i),
                ));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| CoreError::InvalidPath(raw.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(enforce: bool) -> PathResolver {
        PathResolver::new("/srv/media", enforce)
    }

    #[test]
    fn test_empty_and_slash_resolve_to_root() {
        let r = resolver(true);
        assert_eq!(r.resolve("").unwrap(), PathBuf::from("/srv/media"));
        assert_eq!(r.resolve("/").unwrap(), PathBuf::from("/srv/media"));
        assert_eq!(r.resolve(".").unwrap(), PathBuf::from("/srv/media"));
    }

    #[test]
    fn test_leading_separator_is_stripped_and_dots_collapse() {
        let r = resolver(true);
        assert_eq!(
            r.resolve("/movies/./2024/../2023/clip.mp4").unwrap(),
            PathBuf::from("/srv/media/movies/2023/clip.mp4")
        );
    }

    #[test]
    fn test_percent_decoding() {
        let r = resolver(true);
        assert_eq!(
            r.resolve("my%20videos/a%2Bb.mp4").unwrap(),
            PathBuf::from("/srv/media/my videos/a+b.mp4")
        );
        assert!(matches!(
            r.resolve("bad%zzpath"),
            Err(CoreError::InvalidPath(..))
        ));
        assert!(matches!(r.resolve("trailing%2"), Err(CoreError::InvalidPath(..))));
        assert!(matches!(r.resolve("%ff%fe"), Err(CoreError::InvalidPath(..))));
    }

    #[test]
    fn test_containment_rejects_escape() {
        let r = resolver(true);
        assert!(matches!(
            r.resolve("../etc/passwd"),
            Err(CoreError::PathOutsideRoot(_))
        ));
        assert!(matches!(
            r.resolve("a/../../b"),
            Err(CoreError::PathOutsideRoot(_))
        ));
        // Climbing back down inside the root is fine.
        assert_eq!(r.resolve("a/b/../c").unwrap(), PathBuf::from("/srv/media/a/c"));
    }

    #[test]
    fn test_permissive_mode_allows_ancestors() {
        let r = resolver(false);
        assert_eq!(r.resolve("../..").unwrap(), PathBuf::from("/"));
        assert_eq!(
            r.resolve("%2E%2E/other").unwrap(),
            PathBuf::from("/srv/other")
        );
    }

    #[test]
    fn test_resolve_child() {
        let r = resolver(true);
        let base = r.resolve("uploads").unwrap();
        assert_eq!(
            r.resolve_child(&base, "new/nested").unwrap(),
            PathBuf::from("/srv/media/uploads/new/nested")
        );
        assert_eq!(
            r.resolve_child(&base, "../sibling").unwrap(),
            PathBuf::from("/srv/media/sibling")
        );
        assert!(r.resolve_child(&base, "../../escape").is_err());
    }

    #[test]
    fn test_display_relative() {
        let r = resolver(true);
        assert_eq!(
            r.display_relative(Path::new("/srv/media/a/b.mp4")),
            "/a/b.mp4"
        );
        assert_eq!(r.display_relative(Path::new("/elsewhere/x")), "/elsewhere/x");
    }
}
