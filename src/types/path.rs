//! Normalized store paths
//!
//! A [`Path`] is an immutable sequence of non-empty segments parsed from a
//! `/`-separated string. Leading, trailing and repeated separators are
//! ignored, so `"a/b"`, `"/a/b"` and `"a//b/"` all denote the same path.

use crate::constants::PATH_SEPARATOR;
use crate::core::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Normalized path into the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// The root path (no segments). Only reachable internally; references
    /// cannot be built on it.
    pub fn root() -> Self {
        Self { segments: Vec::new() }
    }

    /// Parse a path string, allowing the result to be the root
    pub fn parse_lenient(raw: &str) -> Self {
        let segments = raw
            .split(PATH_SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .collect();
        Self { segments }
    }

    /// Parse a path string, rejecting strings that resolve to the root
    pub fn parse(raw: &str) -> Result<Self> {
        let path = Self::parse_lenient(raw);
        if path.is_root() {
            return Err(Error::invalid_path(raw));
        }
        Ok(path)
    }

    /// Segments of this path
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True for the root path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, `None` at the root
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Parent path, `None` at the root
    pub fn parent(&self) -> Option<Path> {
        if self.is_root() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    /// Append a relative path (itself normalized)
    pub fn join(&self, relative: &str) -> Path {
        let mut segments = self.segments.clone();
        segments.extend(Self::parse_lenient(relative).segments);
        Self { segments }
    }

    /// True if `self` equals `other` or is one of its ancestors
    pub fn is_ancestor_or_equal(&self, other: &Path) -> bool {
        self.segments.len() <= other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|(a, b)| a == b)
    }

    /// True if either path contains the other
    pub fn overlaps(&self, other: &Path) -> bool {
        self.is_ancestor_or_equal(other) || other.is_ancestor_or_equal(self)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", PATH_SEPARATOR)?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn leading_slash_is_ignored() {
        let a = Path::parse("resumes/123").unwrap();
        let b = Path::parse("/resumes/123").unwrap();
        assert_eq!(a, b);
        assert_eq!(b.to_string(), "resumes/123");
    }

    #[test]
    fn empty_segments_collapse() {
        let path = Path::parse("//users///u1/").unwrap();
        assert_eq!(path.segments(), &["users".to_string(), "u1".to_string()]);
    }

    #[test]
    fn root_strings_are_rejected() {
        for raw in ["", "/", "///"] {
            assert!(matches!(Path::parse(raw), Err(Error::InvalidPath(_))), "{raw:?}");
        }
        assert!(Path::parse_lenient("/").is_root());
    }

    #[test]
    fn navigation() {
        let path = Path::parse("resumes/r1/name").unwrap();
        assert_eq!(path.key(), Some("name"));
        assert_eq!(path.parent().unwrap().to_string(), "resumes/r1");
        assert_eq!(Path::root().parent(), None);
        assert_eq!(path.join("/a//b").to_string(), "resumes/r1/name/a/b");
    }

    #[test]
    fn ancestry() {
        let parent = Path::parse("resumes").unwrap();
        let child = Path::parse("resumes/r1").unwrap();
        let other = Path::parse("resumesX").unwrap();
        assert!(parent.is_ancestor_or_equal(&child));
        assert!(!child.is_ancestor_or_equal(&parent));
        assert!(child.overlaps(&parent));
        assert!(!other.overlaps(&child));
        assert!(Path::root().is_ancestor_or_equal(&child));
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(raw in "[a-z/]{0,24}") {
            let once = Path::parse_lenient(&raw);
            let twice = Path::parse_lenient(&once.to_string());
            prop_assert_eq!(&once, &twice);
            let prefixed = format!("/{}", raw);
            prop_assert_eq!(Path::parse_lenient(&prefixed), once);
        }
    }
}
