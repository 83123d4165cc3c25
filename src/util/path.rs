//! Hierarchical scene paths.
//!
//! A path is an absolute, `/`-separated list of prim names. `/` alone is
//! the root. Paths are immutable and cheap to clone.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{Error, Result};

/// Path separator.
pub const SEPARATOR: char = '/';

/// Absolute path to a prim in the scene graph.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path(Arc<str>);

impl Path {
    /// The root path `/`.
    pub fn root() -> Self {
        Self(Arc::from("/"))
    }

    /// Parse and validate a path.
    ///
    /// Accepts `/` and `/a/b/c`. Rejects relative paths, empty segments,
    /// trailing separators and whitespace.
    pub fn parse(text: &str) -> Result<Self> {
        if text == "/" {
            return Ok(Self::root());
        }
        if !text.starts_with(SEPARATOR) {
            return Err(Error::InvalidPath(format!("'{}' is not absolute", text)));
        }
        for segment in text[1..].split(SEPARATOR) {
            validate_segment(segment).map_err(|reason| {
                Error::InvalidPath(format!("'{}': {}", text, reason))
            })?;
        }
        Ok(Self(Arc::from(text)))
    }

    /// Full path text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this is the root path.
    #[inline]
    pub fn is_root(&self) -> bool {
        &*self.0 == "/"
    }

    /// Iterate over path segments (empty for the root).
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).filter(|s| !s.is_empty())
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Last segment, or `""` for the root.
    pub fn name(&self) -> &str {
        match self.0.rfind(SEPARATOR) {
            Some(pos) => &self.0[pos + 1..],
            None => "",
        }
    }

    /// Parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind(SEPARATOR) {
            Some(0) => Some(Self::root()),
            Some(pos) => Some(Self(Arc::from(&self.0[..pos]))),
            None => None,
        }
    }

    /// Append a child segment.
    pub fn child(&self, name: &str) -> Result<Path> {
        validate_segment(name)
            .map_err(|reason| Error::InvalidPath(format!("child '{}': {}", name, reason)))?;
        let text = if self.is_root() {
            format!("/{}", name)
        } else {
            format!("{}/{}", self.0, name)
        };
        Ok(Self(Arc::from(text)))
    }

    /// All ancestors from the root down, excluding `self`.
    pub fn ancestors(&self) -> Vec<Path> {
        let mut chain = Vec::with_capacity(self.depth());
        let mut cur = self.parent();
        while let Some(p) = cur {
            cur = p.parent();
            chain.push(p);
        }
        chain.reverse();
        chain
    }

    /// Check if `prefix` is this path or one of its ancestors.
    pub fn has_prefix(&self, prefix: &Path) -> bool {
        if prefix.is_root() {
            return true;
        }
        let mut mine = self.segments();
        prefix.segments().all(|seg| mine.next() == Some(seg))
    }
}

fn validate_segment(segment: &str) -> std::result::Result<(), &'static str> {
    if segment.is_empty() {
        return Err("empty segment");
    }
    if segment.chars().any(|c| c.is_whitespace()) {
        return Err("whitespace in segment");
    }
    if segment.contains(SEPARATOR) {
        return Err("separator in segment");
    }
    Ok(())
}

impl Ord for Path {
    fn cmp(&self, other: &Self) -> Ordering {
        let a: SmallVec<[&str; 8]> = self.segments().collect();
        let b: SmallVec<[&str; 8]> = other.segments().collect();
        a.cmp(&b)
    }
}

impl PartialOrd for Path {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Path {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl TryFrom<&str> for Path {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Path> for String {
    fn from(p: Path) -> Self {
        p.0.to_string()
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    #[test]
    fn test_parse() {
        assert!(p("/").is_root());
        assert_eq!(p("/a/b").depth(), 2);
        assert!(Path::parse("a/b").is_err());
        assert!(Path::parse("/a//b").is_err());
        assert!(Path::parse("/a/").is_err());
        assert!(Path::parse("/a b").is_err());
        assert!(Path::parse("").is_err());
    }

    #[test]
    fn test_navigation() {
        let path = p("/World/Geom/mesh");
        assert_eq!(path.name(), "mesh");
        assert_eq!(path.parent(), Some(p("/World/Geom")));
        assert_eq!(p("/World").parent(), Some(Path::root()));
        assert_eq!(Path::root().parent(), None);
        assert_eq!(Path::root().child("a").unwrap(), p("/a"));
        assert_eq!(p("/a").child("b").unwrap(), p("/a/b"));
        assert!(p("/a").child("b/c").is_err());
        assert_eq!(path.ancestors(), vec![Path::root(), p("/World"), p("/World/Geom")]);
    }

    #[test]
    fn test_prefix() {
        assert!(p("/a/b").has_prefix(&p("/a")));
        assert!(p("/a/b").has_prefix(&p("/a/b")));
        assert!(p("/a/b").has_prefix(&Path::root()));
        assert!(!p("/ab").has_prefix(&p("/a")));
        assert!(!p("/a").has_prefix(&p("/a/b")));
    }

    #[test]
    fn test_segment_ordering() {
        // '-' sorts below '/' as raw text; segment-wise "a" < "a-b".
        assert!(p("/a/b") < p("/a-b"));
        assert!(p("/a/b") < p("/a0"));
        assert!(p("/a") < p("/a/b"));
        assert!(p("/a/b") < p("/a/c"));
        assert!(Path::root() < p("/a"));
        let mut paths = vec![p("/b"), p("/a0"), p("/a/z"), p("/a")];
        paths.sort();
        assert_eq!(paths, vec![p("/a"), p("/a/z"), p("/a0"), p("/b")]);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&p("/a/b")).unwrap();
        assert_eq!(json, "\"/a/b\"");
        let back: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p("/a/b"));
        assert!(serde_json::from_str::<Path>("\"nope\"").is_err());
    }
}
