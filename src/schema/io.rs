//! Field-level reader and writer handed to [`Sample`] implementations.

use std::collections::{BTreeMap, HashSet};

use super::field::{connection_name, indices_name, primvar_name, FieldSpec};
use super::{AttrValue, Connectable, Primvar, Relationship, Sample, TokenEnum};
use crate::core::{AttributeSpec, Interpolation, InterpolationMode, SceneStore, TimeCode, Value, Variability};
use crate::util::{Error, Path, Result};

/// Attribute holding a plain value field: a primvar for vertex data.
fn value_name(field: &FieldSpec, namespace: &str) -> String {
    match field.vertex_data {
        Some(_) => primvar_name(field, namespace),
        None => field.qualified(namespace),
    }
}

// ============================================================================
// Writer
// ============================================================================

/// Writes sample fields as attributes of one prim at one time.
pub struct SampleWriter<'a> {
    store: &'a dyn SceneStore,
    path: &'a Path,
    time: TimeCode,
    namespace: String,
}

impl<'a> SampleWriter<'a> {
    pub fn new(store: &'a dyn SceneStore, path: &'a Path, time: TimeCode) -> Self {
        Self {
            store,
            path,
            time,
            namespace: String::new(),
        }
    }

    /// Prim being written.
    pub fn path(&self) -> &Path {
        self.path
    }

    /// Current attribute namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn put(&self, name: &str, spec: &AttributeSpec, value: Value) -> Result<()> {
        let time = if spec.variability == Variability::Uniform {
            TimeCode::Default
        } else {
            self.time
        };
        self.store.set_attribute(self.path, name, spec, value, time)
    }

    /// Unset an attribute written at an earlier time.
    fn block(&self, name: &str, field: &FieldSpec) -> Result<()> {
        let time = if field.is_uniform() {
            TimeCode::Default
        } else {
            self.time
        };
        self.store.block_attribute(self.path, name, time)
    }

    /// Write a plain value field. An unset value blocks the attribute.
    pub fn value<V: AttrValue>(&mut self, field: &FieldSpec, value: &V) -> Result<()> {
        let name = value_name(field, &self.namespace);
        let Some(v) = value.to_value() else {
            return self.block(&name, field);
        };
        let spec = AttributeSpec::for_value(&v, field.variability);
        match field.vertex_data {
            Some(element_size) => {
                self.put(&name, &spec.primvar(Interpolation::Vertex, element_size), v)
            }
            None => self.put(&name, &spec, v),
        }
    }

    /// Write an enum field as a token.
    pub fn token<E: TokenEnum>(&mut self, field: &FieldSpec, value: E) -> Result<()> {
        let v = Value::Token(value.token().to_string());
        let spec = AttributeSpec::for_value(&v, field.variability);
        self.put(&field.qualified(&self.namespace), &spec, v)
    }

    /// Write a primvar with its interpolation, element size and indices.
    pub fn primvar<V: AttrValue>(&mut self, field: &FieldSpec, primvar: &Primvar<V>) -> Result<()> {
        let name = primvar_name(field, &self.namespace);
        let Some(v) = primvar.value.to_value() else {
            self.block(&name, field)?;
            return self.block(&indices_name(&name), field);
        };
        let spec = AttributeSpec::for_value(&v, field.variability)
            .primvar(primvar.interpolation, primvar.element_size);
        self.put(&name, &spec, v)?;

        match &primvar.indices {
            Some(indices) => {
                let iv = Value::IntArray(indices.clone());
                let ispec = AttributeSpec::for_value(&iv, field.variability);
                self.put(&indices_name(&name), &ispec, iv)
            }
            None => self.block(&indices_name(&name), field),
        }
    }

    /// Write a connectable value and its connection.
    pub fn connectable<V: AttrValue>(
        &mut self,
        field: &FieldSpec,
        conn: &Connectable<V>,
    ) -> Result<()> {
        self.value(field, &conn.value)?;
        let rel = connection_name(&value_name(field, &self.namespace));
        match &conn.connected {
            Some(source) => {
                self.store
                    .set_relationship_targets(self.path, &rel, std::slice::from_ref(source))
            }
            None if self.store.relationship_targets(self.path, &rel)?.is_some() => {
                self.store.set_relationship_targets(self.path, &rel, &[])
            }
            None => Ok(()),
        }
    }

    /// Write a nested sample under the field's namespace.
    pub fn nested<S: Sample>(&mut self, field: &FieldSpec, sample: &S) -> Result<()> {
        let inner = field.child_namespace(&self.namespace);
        let outer = std::mem::replace(&mut self.namespace, inner);
        let res = sample.write(self);
        self.namespace = outer;
        res
    }

    /// Write relationship targets.
    pub fn relationship(&mut self, field: &FieldSpec, rel: &Relationship) -> Result<()> {
        self.store
            .set_relationship_targets(self.path, &field.qualified(&self.namespace), &rel.targets)
    }

    /// Write every map entry as `<namespace>:<key>`.
    ///
    /// Entries authored earlier but absent from `map` are blocked.
    pub fn dictionary<V: AttrValue>(
        &mut self,
        field: &FieldSpec,
        map: &BTreeMap<String, V>,
    ) -> Result<()> {
        let ns = field.child_namespace(&self.namespace);
        let mut written = HashSet::new();
        for (key, value) in map {
            if let Some(v) = value.to_value() {
                let name = super::join_namespace(&ns, key);
                let spec = AttributeSpec::for_value(&v, field.variability);
                self.put(&name, &spec, v)?;
                written.insert(name);
            }
        }
        let prefix = format!("{}:", ns);
        for name in self.store.attribute_names(self.path)? {
            if name.starts_with(&prefix) && !written.contains(&name) {
                self.block(&name, field)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Reader
// ============================================================================

/// Non-fatal problems found while reading one sample.
#[derive(Debug, Default)]
pub struct ReadReport {
    /// Whether the prim exists (and was not masked out).
    pub found: bool,
    /// Per-field mismatches; affected fields keep their prior value.
    pub issues: Vec<Error>,
}

impl ReadReport {
    pub(crate) fn not_found() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// What a finished reader hands back to the scene.
#[derive(Debug, Default)]
pub(crate) struct ReaderOutcome {
    pub issues: Vec<Error>,
    /// Attributes seen to be time-varying while tracking.
    pub varying: HashSet<String>,
}

/// Reads sample fields from one prim at one time.
///
/// Reads are best effort: a missing attribute leaves the field untouched,
/// a mismatched one is recorded as an issue. Only backing store failures
/// are returned as errors.
pub struct SampleReader<'a> {
    store: &'a dyn SceneStore,
    path: &'a Path,
    time: TimeCode,
    mode: InterpolationMode,
    namespace: String,
    filter: Option<&'a HashSet<String>>,
    tracking: bool,
    outcome: ReaderOutcome,
}

impl<'a> SampleReader<'a> {
    pub fn new(
        store: &'a dyn SceneStore,
        path: &'a Path,
        time: TimeCode,
        mode: InterpolationMode,
    ) -> Self {
        Self {
            store,
            path,
            time,
            mode,
            namespace: String::new(),
            filter: None,
            tracking: false,
            outcome: ReaderOutcome::default(),
        }
    }

    /// Only read the listed attributes.
    pub(crate) fn with_filter(mut self, filter: &'a HashSet<String>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Record which attributes are time-varying.
    pub(crate) fn with_tracking(mut self) -> Self {
        self.tracking = true;
        self
    }

    pub(crate) fn finish(self) -> ReaderOutcome {
        self.outcome
    }

    /// Prim being read.
    pub fn path(&self) -> &Path {
        self.path
    }

    pub fn time(&self) -> TimeCode {
        self.time
    }

    fn wants(&self, name: &str) -> bool {
        self.filter.map_or(true, |f| f.contains(name))
    }

    fn track(&mut self, name: &str) -> Result<()> {
        if self.tracking && self.store.might_be_time_varying(self.path, name)? {
            self.outcome.varying.insert(name.to_string());
        }
        Ok(())
    }

    fn fetch(&mut self, name: &str, field: &FieldSpec) -> Result<Option<Value>> {
        self.track(name)?;
        let time = if field.is_uniform() {
            TimeCode::Default
        } else {
            self.time
        };
        self.store.attribute_value(self.path, name, time, self.mode)
    }

    fn mismatch(&mut self, name: &str, expected: impl Into<String>, actual: impl Into<String>) {
        self.outcome
            .issues
            .push(Error::mismatch(format!("{}.{}", self.path, name), expected, actual));
    }

    fn convert<V: AttrValue>(&mut self, name: &str, value: Value) -> Option<V> {
        match V::from_value(value) {
            Ok(v) => Some(v),
            Err(v) => {
                self.mismatch(name, V::TYPE_NAME, v.type_name());
                None
            }
        }
    }

    fn check_shape(&mut self, name: &str, value: &Value, element_size: usize) {
        if let Some(len) = value.len() {
            if element_size > 1 && len % element_size != 0 {
                self.mismatch(
                    name,
                    format!("multiple of {} elements", element_size),
                    format!("{} elements", len),
                );
            }
        }
    }

    /// Field contents when an authored attribute resolves to nothing.
    fn clear<V: AttrValue>(&self, name: &str, out: &mut V) -> Result<()> {
        if let Some(cleared) = V::cleared() {
            if self.store.attribute_spec(self.path, name)?.is_some() {
                *out = cleared;
            }
        }
        Ok(())
    }

    /// Read a plain value field.
    pub fn value<V: AttrValue>(&mut self, field: &FieldSpec, out: &mut V) -> Result<()> {
        let name = value_name(field, &self.namespace);
        if !self.wants(&name) {
            return Ok(());
        }
        let Some(v) = self.fetch(&name, field)? else {
            return self.clear(&name, out);
        };
        if let Some(element_size) = field.vertex_data {
            self.check_shape(&name, &v, element_size);
        }
        if let Some(x) = self.convert(&name, v) {
            *out = x;
        }
        Ok(())
    }

    /// Read an enum token field.
    pub fn token<E: TokenEnum>(&mut self, field: &FieldSpec, out: &mut E) -> Result<()> {
        let name = field.qualified(&self.namespace);
        if !self.wants(&name) {
            return Ok(());
        }
        let Some(v) = self.fetch(&name, field)? else {
            return Ok(());
        };
        match v.as_str().map(E::from_token) {
            Some(Some(e)) => *out = e,
            Some(None) => {
                let token = v.as_str().unwrap_or_default().to_string();
                self.mismatch(&name, E::allowed(), token);
            }
            None => self.mismatch(&name, "token", v.type_name()),
        }
        Ok(())
    }

    /// Read a primvar together with its metadata and indices.
    pub fn primvar<V: AttrValue>(&mut self, field: &FieldSpec, out: &mut Primvar<V>) -> Result<()> {
        let name = primvar_name(field, &self.namespace);
        let idx_name = indices_name(&name);
        if !self.wants(&name) && !self.wants(&idx_name) {
            return Ok(());
        }
        let Some(spec) = self.store.attribute_spec(self.path, &name)? else {
            return Ok(());
        };
        out.interpolation = spec.interpolation.unwrap_or_default();
        out.element_size = spec.element_size.unwrap_or(1).max(1);

        out.indices = match self.fetch(&idx_name, field)? {
            Some(iv) => self.convert::<Vec<i32>>(&idx_name, iv),
            None => None,
        };
        match self.fetch(&name, field)? {
            Some(v) => {
                self.check_shape(&name, &v, out.element_size);
                if let Some(x) = self.convert(&name, v) {
                    out.value = x;
                }
                Ok(())
            }
            None => self.clear(&name, &mut out.value),
        }
    }

    /// Read a connectable value and its connection.
    pub fn connectable<V: AttrValue>(
        &mut self,
        field: &FieldSpec,
        out: &mut Connectable<V>,
    ) -> Result<()> {
        self.value(field, &mut out.value)?;
        let name = value_name(field, &self.namespace);
        if !self.wants(&name) {
            return Ok(());
        }
        if let Some(targets) = self.store.relationship_targets(self.path, &connection_name(&name))? {
            out.connected = targets.into_iter().next();
        }
        Ok(())
    }

    /// Read a nested sample from the field's namespace.
    pub fn nested<S: Sample>(&mut self, field: &FieldSpec, out: &mut S) -> Result<()> {
        let inner = field.child_namespace(&self.namespace);
        let outer = std::mem::replace(&mut self.namespace, inner);
        let res = out.read(self);
        self.namespace = outer;
        res
    }

    /// Read relationship targets.
    pub fn relationship(&mut self, field: &FieldSpec, out: &mut Relationship) -> Result<()> {
        let name = field.qualified(&self.namespace);
        if !self.wants(&name) {
            return Ok(());
        }
        if let Some(targets) = self.store.relationship_targets(self.path, &name)? {
            out.targets = targets;
        }
        Ok(())
    }

    /// Read every attribute under the field's namespace into a map.
    ///
    /// The map is replaced wholesale when any entry is read.
    pub fn dictionary<V: AttrValue>(
        &mut self,
        field: &FieldSpec,
        out: &mut BTreeMap<String, V>,
    ) -> Result<()> {
        let prefix = format!("{}:", field.child_namespace(&self.namespace));
        let names: Vec<String> = self
            .store
            .attribute_names(self.path)?
            .into_iter()
            .filter(|n| n.starts_with(&prefix) && self.wants(n))
            .collect();
        if names.is_empty() {
            return Ok(());
        }
        out.clear();
        for name in names {
            if let Some(v) = self.fetch(&name, field)? {
                if let Some(x) = self.convert(&name, v) {
                    out.insert(name[prefix.len()..].to_string(), x);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MemoryStore;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Probe {
        count: i32,
        label: String,
    }

    impl Probe {
        const COUNT: FieldSpec = FieldSpec::new("count");
        const LABEL: FieldSpec = FieldSpec::new("label").uniform();
    }

    impl Sample for Probe {
        fn write(&self, w: &mut SampleWriter<'_>) -> Result<()> {
            w.value(&Self::COUNT, &self.count)?;
            w.value(&Self::LABEL, &self.label)
        }

        fn read(&mut self, r: &mut SampleReader<'_>) -> Result<()> {
            r.value(&Self::COUNT, &mut self.count)?;
            r.value(&Self::LABEL, &mut self.label)
        }
    }

    fn setup() -> (MemoryStore, Path) {
        let store = MemoryStore::in_memory();
        let path = Path::parse("/probe").unwrap();
        store.define_prim(&path, None).unwrap();
        (store, path)
    }

    #[test]
    fn test_uniform_field_writes_default() {
        let (store, path) = setup();
        let probe = Probe { count: 3, label: "x".into() };
        probe.write(&mut SampleWriter::new(&store, &path, TimeCode::At(5.0))).unwrap();

        assert_eq!(store.time_samples(&path, "count").unwrap(), vec![5.0]);
        assert!(store.time_samples(&path, "label").unwrap().is_empty());
    }

    #[test]
    fn test_mismatch_keeps_prior_value() {
        let (store, path) = setup();
        let spec = AttributeSpec::for_value(&Value::Float(0.0), Variability::Varying);
        store
            .set_attribute(&path, "count", &spec, Value::Float(1.5), TimeCode::Default)
            .unwrap();

        let mut probe = Probe { count: 9, label: String::new() };
        let mut reader = SampleReader::new(&store, &path, TimeCode::Default, InterpolationMode::Held);
        probe.read(&mut reader).unwrap();
        let outcome = reader.finish();

        assert_eq!(probe.count, 9);
        assert_eq!(outcome.issues.len(), 1);
        assert!(outcome.issues[0].to_string().contains("/probe.count"));
    }

    #[test]
    fn test_filter_and_tracking() {
        let (store, path) = setup();
        for t in [1.0, 2.0] {
            let probe = Probe { count: t as i32, label: "l".into() };
            probe.write(&mut SampleWriter::new(&store, &path, TimeCode::At(t))).unwrap();
        }

        let mut probe = Probe::default();
        let mut reader = SampleReader::new(&store, &path, TimeCode::At(2.0), InterpolationMode::Held)
            .with_tracking();
        probe.read(&mut reader).unwrap();
        let outcome = reader.finish();
        assert_eq!(outcome.varying, HashSet::from(["count".to_string()]));

        let only_label = HashSet::from(["label".to_string()]);
        let mut probe = Probe::default();
        let mut reader = SampleReader::new(&store, &path, TimeCode::At(2.0), InterpolationMode::Held)
            .with_filter(&only_label);
        probe.read(&mut reader).unwrap();
        assert_eq!(probe, Probe { count: 0, label: "l".into() });
    }
}
