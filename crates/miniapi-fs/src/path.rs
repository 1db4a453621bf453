//! Logical path representation.
//!
//! All paths crossing the abstract API use a single logical separator
//! (`/`). Adapters normalize to the platform's native representation
//! before touching the filesystem and back to logical form in results,
//! so callers never see native separators.

use std::path::{Path, PathBuf};

use miniapi_core::{Family, MiniapiError, MiniapiResult};

/// Characters rejected in logical paths.
///
/// The set is the intersection-unsafe portion of Windows reserved
/// characters plus NUL and the native Windows separator; rejecting them
/// everywhere keeps logical paths portable across every backend. `:` is
/// allowed so drive-qualified paths (`C:/Users`) survive the round trip.
const RESERVED: &[char] = &['<', '>', '"', '|', '?', '*', '\0', '\\'];

/// A `/`-separated path in the abstract namespace.
///
/// Invariant: contains no reserved characters and no empty string.
/// Round-trip property: `LogicalPath -> to_native -> from_native` is the
/// identity for ASCII paths without reserved characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct LogicalPath(String);

impl LogicalPath {
    /// Validate and wrap a logical path.
    ///
    /// Rejects empty input and reserved characters with
    /// `MiniapiError::InvalidArgument`.
    pub fn new(path: impl Into<String>) -> MiniapiResult<Self> {
        let path = path.into();
        if path.is_empty() {
            return Err(MiniapiError::invalid_argument("path must not be empty"));
        }
        if let Some(bad) = path.chars().find(|c| RESERVED.contains(c)) {
            return Err(MiniapiError::invalid_argument(format!(
                "path {path:?} contains reserved character {bad:?}"
            )));
        }
        Ok(LogicalPath(path))
    }

    /// The logical (`/`-separated) form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to the native representation for `family`.
    ///
    /// Windows swaps the separator; Unix families use the logical form
    /// directly.
    pub fn to_native(&self, family: Family) -> PathBuf {
        match family {
            Family::Windows => PathBuf::from(self.0.replace('/', "\\")),
            _ => PathBuf::from(&self.0),
        }
    }

    /// Convert a native path back to logical form.
    ///
    /// Non-UTF-8 native paths cannot be represented in the abstract
    /// namespace and are rejected as `InvalidArgument`.
    pub fn from_native(path: &Path, family: Family) -> MiniapiResult<Self> {
        let raw = path
            .to_str()
            .ok_or_else(|| MiniapiError::invalid_argument("native path is not valid UTF-8"))?;
        let logical = match family {
            Family::Windows => raw.replace('\\', "/"),
            _ => raw.to_string(),
        };
        LogicalPath::new(logical)
    }

    /// Append one segment.
    pub fn join(&self, segment: &str) -> MiniapiResult<Self> {
        if segment.contains('/') {
            return Err(MiniapiError::invalid_argument(
                "segment must not contain separators",
            ));
        }
        let mut joined = self.0.clone();
        if !joined.ends_with('/') {
            joined.push('/');
        }
        joined.push_str(segment);
        LogicalPath::new(joined)
    }

    /// Final path component, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.0.rsplit('/').next().filter(|s| !s.is_empty())
    }
}

impl std::fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_reserved() {
        assert!(matches!(
            LogicalPath::new(""),
            Err(MiniapiError::InvalidArgument { .. })
        ));
        for bad in ["a<b", "a>b", "a\"b", "a|b", "a?b", "a*b", "a\\b", "a\0b"] {
            assert!(
                matches!(
                    LogicalPath::new(bad),
                    Err(MiniapiError::InvalidArgument { .. })
                ),
                "expected rejection of {bad:?}"
            );
        }
    }

    #[test]
    fn allows_drive_qualified_paths() {
        let p = LogicalPath::new("C:/Users/test").unwrap();
        assert_eq!(p.to_native(Family::Windows), PathBuf::from("C:\\Users\\test"));
    }

    #[test]
    fn round_trip_is_identity_per_family() {
        let inputs = ["/tmp/a/b.txt", "relative/dir/file", "C:/Program Files/app"];
        for family in [Family::Linux, Family::Macos, Family::Windows, Family::Unknown] {
            for input in inputs {
                let logical = LogicalPath::new(input).unwrap();
                let native = logical.to_native(family);
                let back = LogicalPath::from_native(&native, family).unwrap();
                assert_eq!(back, logical, "round trip failed for {input} on {family:?}");
            }
        }
    }

    #[test]
    fn join_builds_child_paths() {
        let base = LogicalPath::new("/tmp/dir").unwrap();
        let child = base.join("file.txt").unwrap();
        assert_eq!(child.as_str(), "/tmp/dir/file.txt");
        assert_eq!(child.file_name(), Some("file.txt"));
        assert!(base.join("a/b").is_err());
    }
}
