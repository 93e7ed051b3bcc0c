use super::DomainError;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A path inside the generated project, guaranteed to be relative.
///
/// Invariant: never absolute and never escapes its root through `..`.
/// Enforced at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath(PathBuf);

impl RelativePath {
    /// Fallible constructor. A leading `./` is dropped.
    pub fn try_new(path: impl AsRef<str>) -> Result<Self, DomainError> {
        let raw = path.as_ref();
        let trimmed = raw.strip_prefix("./").unwrap_or(raw);
        let candidate = PathBuf::from(trimmed);

        let escapes = candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if candidate.is_absolute() || trimmed.starts_with('/') || escapes {
            return Err(DomainError::AbsolutePathNotAllowed { path: raw.into() });
        }
        Ok(Self(candidate))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Resolve against a project root.
    pub fn under(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }
}

impl AsRef<Path> for RelativePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_dot_slash() {
        let p = RelativePath::try_new("./src/main.tsx").unwrap();
        assert_eq!(p.as_path(), Path::new("src/main.tsx"));
    }

    #[test]
    fn rejects_absolute_and_escaping_paths() {
        assert!(RelativePath::try_new("/etc/passwd").is_err());
        assert!(RelativePath::try_new("../outside.txt").is_err());
        assert!(RelativePath::try_new("src/../../x").is_err());
    }

    #[test]
    fn under_joins_root() {
        let p = RelativePath::try_new("src/a.ts").unwrap();
        assert_eq!(p.under(Path::new("/proj")), PathBuf::from("/proj/src/a.ts"));
    }
}
