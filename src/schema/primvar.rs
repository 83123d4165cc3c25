//! Primvars, relationships and connectable values.

use crate::core::Interpolation;
use crate::util::{Error, Path};

/// Primitive variable: a value plus interpolation, element size and
/// optional indices into the value array.
#[derive(Clone, Debug, PartialEq)]
pub struct Primvar<T> {
    pub value: T,
    pub interpolation: Interpolation,
    /// Number of array entries forming one logical element.
    pub element_size: usize,
    /// Indices of logical elements; `None` when stored flat.
    pub indices: Option<Vec<i32>>,
}

impl<T: Default> Default for Primvar<T> {
    fn default() -> Self {
        Self {
            value: T::default(),
            interpolation: Interpolation::Constant,
            element_size: 1,
            indices: None,
        }
    }
}

impl<T> Primvar<T> {
    /// Constant primvar with element size 1.
    pub fn new(value: T) -> Self {
        Self {
            value,
            interpolation: Interpolation::Constant,
            element_size: 1,
            indices: None,
        }
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Set element size, clamped to at least 1.
    pub fn with_element_size(mut self, element_size: usize) -> Self {
        self.element_size = element_size.max(1);
        self
    }

    pub fn with_indices(mut self, indices: Vec<i32>) -> Self {
        self.indices = Some(indices);
        self
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }
}

/// Result of flattening an indexed primvar.
#[derive(Debug)]
pub struct Flattened<E> {
    pub values: Vec<E>,
    /// One entry per skipped index.
    pub issues: Vec<Error>,
}

impl<E> Flattened<E> {
    /// Check if every index resolved.
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl<E: Clone> Primvar<Vec<E>> {
    /// Resolve indices into a flat array.
    ///
    /// Out-of-range indices are reported as schema mismatches and skipped.
    /// Unindexed primvars are returned as-is.
    pub fn flatten(&self) -> Flattened<E> {
        let Some(indices) = &self.indices else {
            return Flattened {
                values: self.value.clone(),
                issues: Vec::new(),
            };
        };

        let es = self.element_size.max(1);
        let groups = self.value.len() / es;
        let mut values = Vec::with_capacity(indices.len() * es);
        let mut issues = Vec::new();
        for (pos, &idx) in indices.iter().enumerate() {
            match usize::try_from(idx).ok().filter(|&i| i < groups) {
                Some(i) => values.extend_from_slice(&self.value[i * es..(i + 1) * es]),
                None => issues.push(Error::mismatch(
                    format!("indices[{}]", pos),
                    format!("index in 0..{}", groups),
                    idx.to_string(),
                )),
            }
        }
        Flattened { values, issues }
    }

    /// Flatten and expand a constant primvar to `count` elements.
    ///
    /// Non-constant primvars are flattened only.
    pub fn expand(&self, count: usize) -> Flattened<E> {
        let flat = self.flatten();
        if !self.interpolation.is_constant() {
            return flat;
        }
        let es = self.element_size.max(1);
        let mut issues = flat.issues;
        if flat.values.len() < es {
            issues.push(Error::mismatch(
                "value",
                format!("at least {} elements", es),
                flat.values.len().to_string(),
            ));
            return Flattened {
                values: Vec::new(),
                issues,
            };
        }
        let group = &flat.values[..es];
        let values = group.iter().cloned().cycle().take(es * count).collect();
        Flattened { values, issues }
    }
}

/// Targets of a relationship.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Relationship {
    pub targets: Vec<Path>,
}

impl Relationship {
    pub fn new(targets: Vec<Path>) -> Self {
        Self { targets }
    }

    /// Relationship with a single target.
    pub fn to(target: Path) -> Self {
        Self {
            targets: vec![target],
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// A value that may instead be connected to another prim's output.
///
/// The value is always authored; the connection is stored as a
/// relationship next to it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Connectable<V> {
    pub value: V,
    pub connected: Option<Path>,
}

impl<V> Connectable<V> {
    pub fn new(value: V) -> Self {
        Self {
            value,
            connected: None,
        }
    }

    pub fn connected_to(mut self, source: Path) -> Self {
        self.connected = Some(source);
        self
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected.is_some()
    }
}
