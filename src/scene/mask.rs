//! Access mask: restricts reads to prims and members known to vary.
//!
//! While the owning scene is *populating*, every successful read records
//! the attributes of that prim which might vary over time. A prim with no
//! varying attributes is dropped from the mask. Once populating stops, the
//! mask is *applied*: prims missing from it are treated as not found, and
//! only the recorded attributes of included prims are read.

use std::collections::{HashMap, HashSet};

use crate::util::Path;

/// Per-prim mask entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaskEntry {
    /// Qualified names of attributes that may change between frames.
    pub dynamic_members: HashSet<String>,
}

/// Set of included prims with their dynamic members.
#[derive(Clone, Debug, Default)]
pub struct AccessMask {
    included: HashMap<Path, MaskEntry>,
}

impl AccessMask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include a prim, returning its entry.
    pub fn include(&mut self, path: Path) -> &mut MaskEntry {
        self.included.entry(path).or_default()
    }

    /// Include a prim with the given dynamic members.
    pub fn include_members<I, S>(&mut self, path: Path, members: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include(path)
            .dynamic_members
            .extend(members.into_iter().map(Into::into));
    }

    /// Remove a prim. Returns true if it was included.
    pub fn exclude(&mut self, path: &Path) -> bool {
        self.included.remove(path).is_some()
    }

    #[inline]
    pub fn contains(&self, path: &Path) -> bool {
        self.included.contains_key(path)
    }

    pub fn get(&self, path: &Path) -> Option<&MaskEntry> {
        self.included.get(path)
    }

    pub fn len(&self) -> usize {
        self.included.len()
    }

    pub fn is_empty(&self) -> bool {
        self.included.is_empty()
    }

    /// Included prims in path order.
    pub fn paths(&self) -> Vec<Path> {
        let mut paths: Vec<Path> = self.included.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Merge the result of a populating read.
    ///
    /// Prims with nothing varying are removed.
    pub(crate) fn record(&mut self, path: &Path, varying: HashSet<String>) {
        if varying.is_empty() {
            self.included.remove(path);
        } else {
            self.include(path.clone()).dynamic_members.extend(varying);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    #[test]
    fn test_include_exclude() {
        let mut mask = AccessMask::new();
        mask.include_members(p("/b"), ["points"]);
        mask.include(p("/a"));
        assert_eq!(mask.paths(), vec![p("/a"), p("/b")]);
        assert!(mask.get(&p("/b")).unwrap().dynamic_members.contains("points"));

        assert!(mask.exclude(&p("/a")));
        assert!(!mask.exclude(&p("/a")));
        assert_eq!(mask.len(), 1);
    }

    #[test]
    fn test_record() {
        let mut mask = AccessMask::new();
        mask.include(p("/static"));
        mask.record(&p("/static"), HashSet::new());
        assert!(!mask.contains(&p("/static")));

        mask.record(&p("/anim"), HashSet::from(["x".to_string()]));
        mask.record(&p("/anim"), HashSet::from(["y".to_string()]));
        assert_eq!(mask.get(&p("/anim")).unwrap().dynamic_members.len(), 2);
    }
}
