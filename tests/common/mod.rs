//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path as FsPath;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use stagebind::core::{AttributeSpec, InterpolationMode, MemoryStore, SceneStore, TimeCode, Value};
use stagebind::prelude::*;

/// Test record `{ name, value }`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Named {
    pub name: String,
    pub value: i32,
}

impl Named {
    const NAME: FieldSpec = FieldSpec::new("name");
    const VALUE: FieldSpec = FieldSpec::new("value");

    pub fn new(name: &str, value: i32) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

impl Sample for Named {
    fn write(&self, w: &mut SampleWriter<'_>) -> Result<()> {
        w.value(&Self::NAME, &self.name)?;
        w.value(&Self::VALUE, &self.value)
    }

    fn read(&mut self, r: &mut SampleReader<'_>) -> Result<()> {
        r.value(&Self::NAME, &mut self.name)?;
        r.value(&Self::VALUE, &mut self.value)
    }
}

pub fn p(s: &str) -> Path {
    Path::parse(s).unwrap()
}

/// Store wrapper that counts prim lookups and can slow down or block paths.
pub struct InstrumentedStore {
    inner: MemoryStore,
    lookups: Mutex<HashMap<Path, usize>>,
    delays: Mutex<HashMap<Path, Duration>>,
    gated: Mutex<Option<Path>>,
    gate_open: Mutex<bool>,
    gate_cv: Condvar,
    failing: Mutex<Option<Path>>,
}

impl InstrumentedStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::in_memory(),
            lookups: Mutex::new(HashMap::new()),
            delays: Mutex::new(HashMap::new()),
            gated: Mutex::new(None),
            gate_open: Mutex::new(false),
            gate_cv: Condvar::new(),
            failing: Mutex::new(None),
        }
    }

    /// Number of prim lookups at `path` so far.
    pub fn lookups(&self, path: &Path) -> usize {
        self.lookups.lock().get(path).copied().unwrap_or(0)
    }

    pub fn total_lookups(&self) -> usize {
        self.lookups.lock().values().sum()
    }

    pub fn delay(&self, path: Path, by: Duration) {
        self.delays.lock().insert(path, by);
    }

    /// Block lookups at `path` until [`open_gate`](Self::open_gate).
    pub fn gate(&self, path: Path) {
        *self.gated.lock() = Some(path);
    }

    pub fn open_gate(&self) {
        *self.gate_open.lock() = true;
        self.gate_cv.notify_all();
    }

    /// Fail lookups at `path` with a backing store error.
    pub fn fail(&self, path: Path) {
        *self.failing.lock() = Some(path);
    }
}

impl SceneStore for InstrumentedStore {
    fn identifier(&self) -> &str {
        "anon:instrumented"
    }

    fn prim_type(&self, path: &Path) -> Result<Option<String>> {
        *self.lookups.lock().entry(path.clone()).or_default() += 1;
        if self.failing.lock().as_ref() == Some(path) {
            return Err(Error::store(format!("cannot read {}", path)));
        }
        let delay = self.delays.lock().get(path).copied();
        if let Some(d) = delay {
            std::thread::sleep(d);
        }
        if self.gated.lock().as_ref() == Some(path) {
            let mut open = self.gate_open.lock();
            while !*open {
                if self.gate_cv.wait_for(&mut open, Duration::from_secs(10)).timed_out() {
                    break;
                }
            }
        }
        self.inner.prim_type(path)
    }

    fn define_prim(&self, path: &Path, type_name: Option<&str>) -> Result<()> {
        self.inner.define_prim(path, type_name)
    }

    fn attribute_spec(&self, path: &Path, name: &str) -> Result<Option<AttributeSpec>> {
        self.inner.attribute_spec(path, name)
    }

    fn attribute_value(
        &self,
        path: &Path,
        name: &str,
        time: TimeCode,
        mode: InterpolationMode,
    ) -> Result<Option<Value>> {
        self.inner.attribute_value(path, name, time, mode)
    }

    fn set_attribute(
        &self,
        path: &Path,
        name: &str,
        spec: &AttributeSpec,
        value: Value,
        time: TimeCode,
    ) -> Result<()> {
        self.inner.set_attribute(path, name, spec, value, time)
    }

    fn block_attribute(&self, path: &Path, name: &str, time: TimeCode) -> Result<()> {
        self.inner.block_attribute(path, name, time)
    }

    fn might_be_time_varying(&self, path: &Path, name: &str) -> Result<bool> {
        self.inner.might_be_time_varying(path, name)
    }

    fn time_samples(&self, path: &Path, name: &str) -> Result<Vec<f64>> {
        self.inner.time_samples(path, name)
    }

    fn attribute_names(&self, path: &Path) -> Result<Vec<String>> {
        self.inner.attribute_names(path)
    }

    fn relationship_targets(&self, path: &Path, name: &str) -> Result<Option<Vec<Path>>> {
        self.inner.relationship_targets(path, name)
    }

    fn set_relationship_targets(&self, path: &Path, name: &str, targets: &[Path]) -> Result<()> {
        self.inner.set_relationship_targets(path, name, targets)
    }

    fn prims(&self) -> Result<Vec<(Path, String)>> {
        self.inner.prims()
    }

    fn metadata(&self, key: &str) -> Result<Option<Value>> {
        self.inner.metadata(key)
    }

    fn set_metadata(&self, key: &str, value: Value) -> Result<()> {
        self.inner.set_metadata(key, value)
    }

    fn save(&self) -> Result<()> {
        self.inner.save()
    }

    fn export(&self, file: &FsPath) -> Result<()> {
        self.inner.export(file)
    }
}

/// Scene over an instrumented store holding `Named` samples at `entries`.
pub fn instrumented_scene(entries: &[(&str, i32)]) -> (Arc<Scene>, Arc<InstrumentedStore>) {
    let store = Arc::new(InstrumentedStore::new());
    let scene = Scene::with_store(store.clone());
    for (path, value) in entries {
        let name = p(path).name().to_string();
        scene.write(&p(path), &Named::new(&name, *value)).unwrap();
    }
    (Arc::new(scene), store)
}
