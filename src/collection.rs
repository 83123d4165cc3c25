//! Lazy, synchronous sample enumeration.

use std::marker::PhantomData;

use crate::scene::Scene;
use crate::schema::Sample;
use crate::util::{Path, Result};

/// A path paired with the sample read from it.
///
/// `sample` is `None` when the prim does not exist or was masked out.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleHolder<T> {
    pub path: Path,
    pub sample: Option<T>,
}

/// Paths to read as `T` from one scene.
///
/// Each call to [`iter`](Self::iter) starts a fresh pass that reads one
/// sample per step at the scene's current time.
pub struct SampleCollection<'a, T: Sample> {
    scene: &'a Scene,
    paths: Vec<Path>,
    _sample: PhantomData<fn() -> T>,
}

impl<'a, T: Sample> SampleCollection<'a, T> {
    pub fn new(scene: &'a Scene, paths: Vec<Path>) -> Self {
        Self {
            scene,
            paths,
            _sample: PhantomData,
        }
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Start a new pass over the paths.
    pub fn iter(&self) -> SampleIter<'_, T> {
        SampleIter {
            scene: self.scene,
            paths: self.paths.iter(),
            _sample: PhantomData,
        }
    }
}

impl<'c, 'a, T: Sample> IntoIterator for &'c SampleCollection<'a, T> {
    type Item = Result<SampleHolder<T>>;
    type IntoIter = SampleIter<'c, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One pass over a [`SampleCollection`].
pub struct SampleIter<'c, T: Sample> {
    scene: &'c Scene,
    paths: std::slice::Iter<'c, Path>,
    _sample: PhantomData<fn() -> T>,
}

impl<T: Sample> Iterator for SampleIter<'_, T> {
    type Item = Result<SampleHolder<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.next()?;
        Some(self.scene.read::<T>(path).map(|sample| SampleHolder {
            path: path.clone(),
            sample,
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.paths.size_hint()
    }
}

impl<T: Sample> ExactSizeIterator for SampleIter<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::XformSample;
    use glam::DMat4;

    #[test]
    fn test_iter_is_restartable() {
        let scene = Scene::create_in_memory().unwrap();
        let a = Path::parse("/a").unwrap();
        let sample = XformSample {
            transform: DMat4::from_scale(glam::DVec3::splat(2.0)),
            ..Default::default()
        };
        scene.write(&a, &sample).unwrap();

        let paths = vec![a.clone(), Path::parse("/missing").unwrap()];
        let coll: SampleCollection<'_, XformSample> = scene.read_paths(paths);
        assert_eq!(coll.len(), 2);

        for _ in 0..2 {
            let items: Vec<_> = coll.iter().map(|r| r.unwrap()).collect();
            assert_eq!(items.len(), 2);
            assert_eq!(items[0].path, a);
            assert_eq!(items[0].sample.as_ref(), Some(&sample));
            assert_eq!(items[1].sample, None);
        }
    }

    #[test]
    fn test_read_all_typed() {
        let scene = Scene::create_in_memory().unwrap();
        for name in ["/x", "/x/y", "/z"] {
            scene
                .write(&Path::parse(name).unwrap(), &XformSample::default())
                .unwrap();
        }
        let under_x = scene.read_all::<XformSample>(&Path::parse("/x").unwrap()).unwrap();
        let got: Vec<Path> = under_x.iter().map(|r| r.unwrap().path).collect();
        assert_eq!(got, vec![Path::parse("/x").unwrap(), Path::parse("/x/y").unwrap()]);
    }
}
