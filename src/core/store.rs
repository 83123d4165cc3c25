//! Backing store contract and the in-memory reference store.
//!
//! The scene layer never touches storage directly; it goes through
//! [`SceneStore`]. Implementations must tolerate concurrent reads at
//! different paths. Writes are never issued concurrently with reads.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path as FsPath, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{AttributeData, AttributeSpec, InterpolationMode, TimeCode, Value};
use crate::util::{Error, Path, Result};

// ============================================================================
// Store trait
// ============================================================================

/// Path-addressable, time-sampled attribute store.
pub trait SceneStore: Send + Sync {
    /// Human-readable identifier (file path or anonymous tag).
    fn identifier(&self) -> &str;

    /// Type name of the prim at `path`, `None` if there is no prim.
    /// Untyped prims report `""`.
    fn prim_type(&self, path: &Path) -> Result<Option<String>>;

    /// Create the prim (and missing ancestors). A `Some` type name retypes
    /// an existing prim.
    fn define_prim(&self, path: &Path, type_name: Option<&str>) -> Result<()>;

    /// Declared spec of an attribute, `None` if it was never authored.
    fn attribute_spec(&self, path: &Path, name: &str) -> Result<Option<AttributeSpec>>;

    /// Value of an attribute at `time`.
    fn attribute_value(
        &self,
        path: &Path,
        name: &str,
        time: TimeCode,
        mode: InterpolationMode,
    ) -> Result<Option<Value>>;

    /// Author an attribute value, creating the attribute from `spec` if needed.
    fn set_attribute(
        &self,
        path: &Path,
        name: &str,
        spec: &AttributeSpec,
        value: Value,
        time: TimeCode,
    ) -> Result<()>;

    /// Block an existing attribute at `time` so it resolves to no value
    /// there. Does nothing if the attribute was never authored.
    fn block_attribute(&self, path: &Path, name: &str, time: TimeCode) -> Result<()>;

    /// Whether the attribute has more than one time sample.
    fn might_be_time_varying(&self, path: &Path, name: &str) -> Result<bool>;

    /// Authored sample times of an attribute.
    fn time_samples(&self, path: &Path, name: &str) -> Result<Vec<f64>>;

    /// Names of all authored attributes on a prim, sorted.
    fn attribute_names(&self, path: &Path) -> Result<Vec<String>>;

    /// Targets of a relationship, `None` if it was never authored.
    fn relationship_targets(&self, path: &Path, name: &str) -> Result<Option<Vec<Path>>>;

    /// Replace the targets of a relationship.
    fn set_relationship_targets(&self, path: &Path, name: &str, targets: &[Path]) -> Result<()>;

    /// Every prim (excluding the root) with its type name, in path order.
    fn prims(&self) -> Result<Vec<(Path, String)>>;

    /// Stage-level metadata value.
    fn metadata(&self, key: &str) -> Result<Option<Value>>;

    /// Set stage-level metadata.
    fn set_metadata(&self, key: &str, value: Value) -> Result<()>;

    /// Persist to the store's own location.
    fn save(&self) -> Result<()>;

    /// Persist a copy to `file`.
    fn export(&self, file: &FsPath) -> Result<()>;
}

// ============================================================================
// Scene document
// ============================================================================

/// A prim in the scene document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimData {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeData>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relationships: BTreeMap<String, Vec<Path>>,
}

/// Serializable content of a [`MemoryStore`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    #[serde(default)]
    pub prims: BTreeMap<Path, PrimData>,
}

impl SceneDocument {
    /// Load a document, gunzipping `.gz` files.
    pub fn load(file: &FsPath) -> Result<Self> {
        let reader = BufReader::new(File::open(file)?);
        let doc = if is_gzip(file) {
            let mut json = Vec::new();
            GzDecoder::new(reader).read_to_end(&mut json)?;
            serde_json::from_slice(&json)?
        } else {
            serde_json::from_reader(reader)?
        };
        Ok(doc)
    }

    /// Write the document, gzipping `.gz` files.
    pub fn write_to(&self, file: &FsPath) -> Result<()> {
        let writer = BufWriter::new(File::create(file)?);
        if is_gzip(file) {
            let mut encoder = GzEncoder::new(writer, Compression::default());
            serde_json::to_writer(&mut encoder, self)?;
            encoder.finish()?.flush()?;
        } else {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.flush()?;
        }
        Ok(())
    }

    fn prim(&self, path: &Path) -> Option<&PrimData> {
        self.prims.get(path)
    }

    fn attribute(&self, path: &Path, name: &str) -> Option<&AttributeData> {
        self.prim(path).and_then(|p| p.attributes.get(name))
    }

    fn prim_mut(&mut self, path: &Path) -> Result<&mut PrimData> {
        self.prims
            .get_mut(path)
            .ok_or_else(|| Error::NotFound(path.clone()))
    }
}

fn is_gzip(file: &FsPath) -> bool {
    file.extension().is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

// ============================================================================
// Memory store
// ============================================================================

/// In-memory store persisted as a JSON scene document.
pub struct MemoryStore {
    identifier: String,
    file: Option<PathBuf>,
    doc: RwLock<SceneDocument>,
}

impl MemoryStore {
    /// Anonymous store that is never written to disk by [`SceneStore::save`].
    pub fn in_memory() -> Self {
        Self {
            identifier: "anon:memory".to_string(),
            file: None,
            doc: RwLock::new(SceneDocument::default()),
        }
    }

    /// Empty store that saves to `file`.
    pub fn create(file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        Self {
            identifier: file.display().to_string(),
            file: Some(file),
            doc: RwLock::new(SceneDocument::default()),
        }
    }

    /// Load a store from `file`.
    pub fn open(file: impl Into<PathBuf>) -> Result<Self> {
        let file = file.into();
        let doc = SceneDocument::load(&file)?;
        Ok(Self {
            identifier: file.display().to_string(),
            file: Some(file),
            doc: RwLock::new(doc),
        })
    }

    /// Snapshot of the current document.
    pub fn document(&self) -> SceneDocument {
        self.doc.read().clone()
    }
}

impl SceneStore for MemoryStore {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn prim_type(&self, path: &Path) -> Result<Option<String>> {
        if path.is_root() {
            return Ok(Some(String::new()));
        }
        Ok(self.doc.read().prim(path).map(|p| p.type_name.clone()))
    }

    fn define_prim(&self, path: &Path, type_name: Option<&str>) -> Result<()> {
        if path.is_root() {
            return Ok(());
        }
        let mut doc = self.doc.write();
        for ancestor in path.ancestors() {
            if !ancestor.is_root() {
                doc.prims.entry(ancestor).or_default();
            }
        }
        let prim = doc.prims.entry(path.clone()).or_default();
        if let Some(t) = type_name {
            prim.type_name = t.to_string();
        }
        Ok(())
    }

    fn attribute_spec(&self, path: &Path, name: &str) -> Result<Option<AttributeSpec>> {
        Ok(self.doc.read().attribute(path, name).map(|a| a.spec.clone()))
    }

    fn attribute_value(
        &self,
        path: &Path,
        name: &str,
        time: TimeCode,
        mode: InterpolationMode,
    ) -> Result<Option<Value>> {
        Ok(self
            .doc
            .read()
            .attribute(path, name)
            .and_then(|a| a.value_at(time, mode)))
    }

    fn set_attribute(
        &self,
        path: &Path,
        name: &str,
        spec: &AttributeSpec,
        value: Value,
        time: TimeCode,
    ) -> Result<()> {
        if !value.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "{}.{}: non-finite {} cannot be stored",
                path,
                name,
                value.type_name()
            )));
        }
        let mut doc = self.doc.write();
        let prim = doc.prim_mut(path)?;
        let attr = prim
            .attributes
            .entry(name.to_string())
            .or_insert_with(|| AttributeData::new(spec.clone()));
        if attr.spec.type_name != value.type_name() {
            return Err(Error::mismatch(
                format!("{}.{}", path, name),
                attr.spec.type_name.clone(),
                value.type_name(),
            ));
        }
        // Primvar metadata is not time-sampled; last write wins.
        attr.spec.interpolation = spec.interpolation;
        attr.spec.element_size = spec.element_size;
        attr.set(value, time);
        Ok(())
    }

    fn block_attribute(&self, path: &Path, name: &str, time: TimeCode) -> Result<()> {
        let mut doc = self.doc.write();
        if let Some(attr) = doc.prim_mut(path)?.attributes.get_mut(name) {
            attr.block(time);
        }
        Ok(())
    }

    fn might_be_time_varying(&self, path: &Path, name: &str) -> Result<bool> {
        Ok(self
            .doc
            .read()
            .attribute(path, name)
            .is_some_and(|a| a.might_be_time_varying()))
    }

    fn time_samples(&self, path: &Path, name: &str) -> Result<Vec<f64>> {
        Ok(self
            .doc
            .read()
            .attribute(path, name)
            .map(|a| a.time_samples())
            .unwrap_or_default())
    }

    fn attribute_names(&self, path: &Path) -> Result<Vec<String>> {
        Ok(self
            .doc
            .read()
            .prim(path)
            .map(|p| p.attributes.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn relationship_targets(&self, path: &Path, name: &str) -> Result<Option<Vec<Path>>> {
        Ok(self
            .doc
            .read()
            .prim(path)
            .and_then(|p| p.relationships.get(name).cloned()))
    }

    fn set_relationship_targets(&self, path: &Path, name: &str, targets: &[Path]) -> Result<()> {
        let mut doc = self.doc.write();
        let prim = doc.prim_mut(path)?;
        prim.relationships.insert(name.to_string(), targets.to_vec());
        Ok(())
    }

    fn prims(&self) -> Result<Vec<(Path, String)>> {
        let doc = self.doc.read();
        Ok(doc
            .prims
            .iter()
            .map(|(p, d)| (p.clone(), d.type_name.clone()))
            .collect())
    }

    fn metadata(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.doc.read().metadata.get(key).cloned())
    }

    fn set_metadata(&self, key: &str, value: Value) -> Result<()> {
        if !value.is_finite() {
            return Err(Error::InvalidArgument(format!("{}: non-finite metadata", key)));
        }
        self.doc.write().metadata.insert(key.to_string(), value);
        Ok(())
    }

    fn save(&self) -> Result<()> {
        match &self.file {
            Some(file) => {
                tracing::debug!(file = %file.display(), "saving scene document");
                self.doc.read().write_to(file)
            }
            None => {
                tracing::debug!("anonymous scene, nothing to save");
                Ok(())
            }
        }
    }

    fn export(&self, file: &FsPath) -> Result<()> {
        tracing::debug!(file = %file.display(), "exporting scene document");
        self.doc.read().write_to(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Variability;

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    #[test]
    fn test_define_creates_ancestors() {
        let store = MemoryStore::in_memory();
        store.define_prim(&p("/a/b/c"), Some("Mesh")).unwrap();

        assert_eq!(store.prim_type(&p("/a")).unwrap(), Some(String::new()));
        assert_eq!(store.prim_type(&p("/a/b")).unwrap(), Some(String::new()));
        assert_eq!(store.prim_type(&p("/a/b/c")).unwrap(), Some("Mesh".to_string()));
        assert_eq!(store.prim_type(&p("/x")).unwrap(), None);
        assert_eq!(store.prims().unwrap().len(), 3);
    }

    #[test]
    fn test_set_attribute_requires_prim() {
        let store = MemoryStore::in_memory();
        let spec = AttributeSpec::for_value(&Value::Int(1), Variability::Varying);
        let err = store
            .set_attribute(&p("/missing"), "x", &spec, Value::Int(1), TimeCode::Default)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_type_is_fixed_on_first_write() {
        let store = MemoryStore::in_memory();
        store.define_prim(&p("/a"), None).unwrap();
        let spec = AttributeSpec::for_value(&Value::Int(1), Variability::Varying);
        store
            .set_attribute(&p("/a"), "x", &spec, Value::Int(1), TimeCode::Default)
            .unwrap();
        let err = store
            .set_attribute(&p("/a"), "x", &spec, Value::Float(1.0), TimeCode::Default)
            .unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let store = MemoryStore::in_memory();
        store.define_prim(&p("/a"), None).unwrap();
        let spec = AttributeSpec::for_value(&Value::Float(0.0), Variability::Varying);
        let err = store
            .set_attribute(&p("/a"), "gain", &spec, Value::Float(f32::NAN), TimeCode::At(1.0))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(ref msg) if msg.contains("/a.gain")));
        assert_eq!(store.attribute_spec(&p("/a"), "gain").unwrap(), None);

        let err = store.set_metadata("startTimeCode", Value::Double(f64::INFINITY)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_blocked_samples_survive_save() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("blocked.json");
        let store = MemoryStore::create(&file);
        store.define_prim(&p("/a"), None).unwrap();
        let spec = AttributeSpec::for_value(&Value::Int(0), Variability::Varying);
        store
            .set_attribute(&p("/a"), "x", &spec, Value::Int(1), TimeCode::At(1.0))
            .unwrap();
        store.block_attribute(&p("/a"), "x", TimeCode::At(2.0)).unwrap();
        // Never authored: nothing to block.
        store.block_attribute(&p("/a"), "y", TimeCode::At(2.0)).unwrap();
        store.save().unwrap();

        let loaded = MemoryStore::open(&file).unwrap();
        let held = InterpolationMode::Held;
        assert_eq!(
            loaded.attribute_value(&p("/a"), "x", TimeCode::At(1.5), held).unwrap(),
            Some(Value::Int(1))
        );
        assert_eq!(loaded.attribute_value(&p("/a"), "x", TimeCode::At(2.0), held).unwrap(), None);
        assert_eq!(loaded.attribute_spec(&p("/a"), "y").unwrap(), None);
    }

    #[test]
    fn test_document_roundtrip_plain_and_gzip() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["scene.json", "scene.json.gz"] {
            let file = dir.path().join(name);
            let store = MemoryStore::create(&file);
            store.define_prim(&p("/a"), Some("Xform")).unwrap();
            let spec = AttributeSpec::for_value(&Value::Double(0.0), Variability::Varying);
            store
                .set_attribute(&p("/a"), "v", &spec, Value::Double(2.0), TimeCode::At(1.0))
                .unwrap();
            store.set_metadata("upAxis", Value::Token("Y".into())).unwrap();
            store.save().unwrap();

            let loaded = MemoryStore::open(&file).unwrap();
            assert_eq!(loaded.document(), store.document());
        }
    }
}
