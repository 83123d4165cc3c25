//! Scene handle: store ownership, time cursor, typed reads and writes.
//!
//! A [`Scene`] is shared between threads (typically as `Arc<Scene>`). Reads
//! at different paths run concurrently; the time cursor, modes and access
//! mask are guarded by `parking_lot` locks.

mod mask;

pub use mask::{AccessMask, MaskEntry};
pub use crate::schema::UpAxis;

use std::collections::BTreeMap;
use std::path::{Path as FsPath, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::collection::SampleCollection;
use crate::core::{InterpolationMode, MemoryStore, SceneStore, TimeCode, Value};
use crate::schema::{ReadReport, Sample, SampleReader, SampleWriter, TokenEnum};
use crate::util::{Error, Path, Result};

/// Stage metadata keys.
pub mod keys {
    pub const FRAME_RATE: &str = "framesPerSecond";
    pub const START_TIME: &str = "startTimeCode";
    pub const END_TIME: &str = "endTimeCode";
    pub const UP_AXIS: &str = "upAxis";
    pub const METERS_PER_UNIT: &str = "metersPerUnit";
}

/// Frame rate reported when none is authored.
pub const DEFAULT_FRAME_RATE: f64 = 24.0;
/// Meters per unit reported when none is authored.
pub const DEFAULT_METERS_PER_UNIT: f64 = 0.01;

/// How [`Scene::write`] authors prims.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Define the prim, typed by [`Sample::schema`].
    #[default]
    Define,
    /// Author opinions without changing the prim type.
    Over,
}

/// Open scene.
pub struct Scene {
    store: RwLock<Option<Arc<dyn SceneStore>>>,
    identifier: String,
    time: RwLock<TimeCode>,
    write_mode: RwLock<WriteMode>,
    interpolation: RwLock<InterpolationMode>,
    mask: RwLock<Option<AccessMask>>,
    populating: AtomicBool,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("identifier", &self.identifier)
            .field("time", &self.time())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Scene {
    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Wrap an existing store.
    pub fn with_store(store: Arc<dyn SceneStore>) -> Self {
        let identifier = store.identifier().to_string();
        tracing::debug!(%identifier, "scene opened");
        Self {
            store: RwLock::new(Some(store)),
            identifier,
            time: RwLock::new(TimeCode::Default),
            write_mode: RwLock::new(WriteMode::Define),
            interpolation: RwLock::new(InterpolationMode::Held),
            mask: RwLock::new(None),
            populating: AtomicBool::new(false),
        }
    }

    /// New scene saved to `file`. Up axis is `Y`, one unit per meter.
    pub fn create(file: impl Into<PathBuf>) -> Result<Self> {
        let scene = Self::with_store(Arc::new(MemoryStore::create(file)));
        scene.init_new()?;
        Ok(scene)
    }

    /// New anonymous scene. Saving is a no-op.
    pub fn create_in_memory() -> Result<Self> {
        let scene = Self::with_store(Arc::new(MemoryStore::in_memory()));
        scene.init_new()?;
        Ok(scene)
    }

    /// Open a saved scene (`.json` or `.json.gz`).
    pub fn open(file: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::with_store(Arc::new(MemoryStore::open(file)?)))
    }

    fn init_new(&self) -> Result<()> {
        self.set_up_axis(UpAxis::Y)?;
        self.set_meters_per_unit(1.0)
    }

    fn store(&self) -> Result<Arc<dyn SceneStore>> {
        self.store.read().clone().ok_or(Error::HandleClosed)
    }

    /// Store identifier (file path or anonymous tag).
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Release the store. Later operations fail with [`Error::HandleClosed`].
    pub fn close(&self) {
        match self.store.write().take() {
            Some(_) => tracing::debug!(identifier = %self.identifier, "scene closed"),
            None => tracing::warn!(identifier = %self.identifier, "scene already closed"),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.store.read().is_none()
    }

    /// Persist to the scene's own file.
    pub fn save(&self) -> Result<()> {
        self.store()?.save()
    }

    /// Persist a copy to `file`.
    pub fn save_as(&self, file: impl AsRef<FsPath>) -> Result<()> {
        self.store()?.export(file.as_ref())
    }

    // ------------------------------------------------------------------
    // Cursor and modes
    // ------------------------------------------------------------------

    /// Move the shared time cursor. Numeric times must be finite.
    pub fn set_time(&self, time: impl Into<TimeCode>) -> Result<()> {
        self.store()?;
        let time = time.into();
        if let TimeCode::At(t) = time {
            if !t.is_finite() {
                return Err(Error::InvalidArgument(format!("time must be finite, got {}", t)));
            }
        }
        *self.time.write() = time;
        Ok(())
    }

    pub fn time(&self) -> TimeCode {
        *self.time.read()
    }

    pub fn write_mode(&self) -> WriteMode {
        *self.write_mode.read()
    }

    pub fn set_write_mode(&self, mode: WriteMode) {
        *self.write_mode.write() = mode;
    }

    pub fn interpolation_mode(&self) -> InterpolationMode {
        *self.interpolation.read()
    }

    pub fn set_interpolation_mode(&self, mode: InterpolationMode) {
        *self.interpolation.write() = mode;
    }

    // ------------------------------------------------------------------
    // Stage metadata
    // ------------------------------------------------------------------

    fn metadata_f64(&self, key: &str) -> Result<Option<f64>> {
        match self.store()?.metadata(key)? {
            None => Ok(None),
            Some(Value::Double(v)) => Ok(Some(v)),
            Some(Value::Float(v)) => Ok(Some(v as f64)),
            Some(other) => Err(Error::mismatch(key, "double", other.type_name())),
        }
    }

    fn set_positive(&self, key: &str, value: f64) -> Result<()> {
        if value.is_nan() || value <= 0.0 {
            return Err(Error::InvalidArgument(format!("{} must be > 0, got {}", key, value)));
        }
        self.store()?.set_metadata(key, Value::Double(value))
    }

    /// Frames per second.
    pub fn frame_rate(&self) -> Result<f64> {
        Ok(self.metadata_f64(keys::FRAME_RATE)?.unwrap_or(DEFAULT_FRAME_RATE))
    }

    pub fn set_frame_rate(&self, fps: f64) -> Result<()> {
        self.set_positive(keys::FRAME_RATE, fps)
    }

    pub fn start_time(&self) -> Result<f64> {
        Ok(self.metadata_f64(keys::START_TIME)?.unwrap_or(0.0))
    }

    pub fn set_start_time(&self, t: f64) -> Result<()> {
        self.store()?.set_metadata(keys::START_TIME, Value::Double(t))
    }

    pub fn end_time(&self) -> Result<f64> {
        Ok(self.metadata_f64(keys::END_TIME)?.unwrap_or(0.0))
    }

    pub fn set_end_time(&self, t: f64) -> Result<()> {
        self.store()?.set_metadata(keys::END_TIME, Value::Double(t))
    }

    /// Up axis; `Z` when unauthored.
    pub fn up_axis(&self) -> Result<UpAxis> {
        match self.store()?.metadata(keys::UP_AXIS)? {
            None => Ok(UpAxis::default()),
            Some(v) => v
                .as_str()
                .and_then(UpAxis::from_token)
                .ok_or_else(|| Error::mismatch(keys::UP_AXIS, UpAxis::allowed(), format!("{:?}", v))),
        }
    }

    pub fn set_up_axis(&self, axis: UpAxis) -> Result<()> {
        self.store()?
            .set_metadata(keys::UP_AXIS, Value::Token(axis.token().to_string()))
    }

    pub fn meters_per_unit(&self) -> Result<f64> {
        Ok(self
            .metadata_f64(keys::METERS_PER_UNIT)?
            .unwrap_or(DEFAULT_METERS_PER_UNIT))
    }

    pub fn set_meters_per_unit(&self, mpu: f64) -> Result<()> {
        self.set_positive(keys::METERS_PER_UNIT, mpu)
    }

    // ------------------------------------------------------------------
    // Access mask
    // ------------------------------------------------------------------

    /// Attach or detach an access mask.
    pub fn set_access_mask(&self, mask: Option<AccessMask>) {
        *self.mask.write() = mask;
    }

    /// Detach and return the access mask.
    pub fn take_access_mask(&self) -> Option<AccessMask> {
        self.mask.write().take()
    }

    /// Copy of the attached access mask.
    pub fn access_mask(&self) -> Option<AccessMask> {
        self.mask.read().clone()
    }

    /// Switch between recording (true) and applying (false) the mask.
    pub fn set_populating_access_mask(&self, populating: bool) {
        self.populating.store(populating, Ordering::Release);
    }

    pub fn is_populating_access_mask(&self) -> bool {
        self.populating.load(Ordering::Acquire)
    }

    /// Check if `path` should be read under the current mask.
    pub fn should_read(&self, path: &Path) -> bool {
        match &*self.mask.read() {
            None => true,
            Some(_) if self.is_populating_access_mask() => true,
            Some(mask) => mask.contains(path),
        }
    }

    // ------------------------------------------------------------------
    // Reading and writing
    // ------------------------------------------------------------------

    /// Read a sample at the current time. `None` if the prim does not exist
    /// or is masked out. Field issues are logged.
    pub fn read<T: Sample>(&self, path: &Path) -> Result<Option<T>> {
        let (sample, report) = self.read_report::<T>(path)?;
        for issue in &report.issues {
            tracing::warn!(%path, "{}", issue);
        }
        Ok(sample)
    }

    /// Read a sample and return field issues instead of logging them.
    pub fn read_report<T: Sample>(&self, path: &Path) -> Result<(Option<T>, ReadReport)> {
        let mut sample = T::default();
        let report = self.read_into(path, &mut sample)?;
        Ok((report.found.then_some(sample), report))
    }

    /// Read into an existing sample.
    ///
    /// Fields without an authored value, and fields outside an applied
    /// access mask, keep their current contents. Reusing one sample across
    /// frames with an applied mask therefore only refreshes what varies.
    pub fn read_into<T: Sample>(&self, path: &Path, sample: &mut T) -> Result<ReadReport> {
        let store = self.store()?;
        if !self.should_read(path) {
            tracing::trace!(%path, "masked out");
            return Ok(ReadReport::not_found());
        }
        if store.prim_type(path)?.is_none() {
            return Ok(ReadReport::not_found());
        }

        let populating = self.is_populating_access_mask();
        let tracking = populating && self.mask.read().is_some();
        let members = if populating {
            None
        } else {
            self.mask
                .read()
                .as_ref()
                .and_then(|m| m.get(path))
                .map(|e| e.dynamic_members.clone())
        };
        if members.as_ref().is_some_and(|m| m.is_empty()) {
            return Ok(ReadReport {
                found: true,
                issues: Vec::new(),
            });
        }

        let mut reader =
            SampleReader::new(&*store, path, self.time(), self.interpolation_mode());
        if let Some(m) = &members {
            reader = reader.with_filter(m);
        }
        if tracking {
            reader = reader.with_tracking();
        }
        sample.read(&mut reader)?;
        let outcome = reader.finish();

        if tracking {
            if let Some(mask) = self.mask.write().as_mut() {
                mask.record(path, outcome.varying);
            }
        }
        Ok(ReadReport {
            found: true,
            issues: outcome.issues,
        })
    }

    /// Write a sample at the current time.
    ///
    /// Paths excluded by an applied access mask are skipped. A non-finite
    /// float fails with [`Error::InvalidArgument`]; fields written before it
    /// stay authored.
    pub fn write<T: Sample>(&self, path: &Path, sample: &T) -> Result<()> {
        let store = self.store()?;
        if !self.should_read(path) {
            tracing::debug!(%path, "masked out, write skipped");
            return Ok(());
        }
        let type_name = match self.write_mode() {
            WriteMode::Define => Some(T::schema()).filter(|s| !s.is_empty()),
            WriteMode::Over => None,
        };
        store.define_prim(path, type_name)?;
        let mut writer = SampleWriter::new(&*store, path, self.time());
        sample.write(&mut writer)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Type name of the prim at `path`, `None` if it does not exist.
    pub fn prim_type(&self, path: &Path) -> Result<Option<String>> {
        self.store()?.prim_type(path)
    }

    /// Names of every authored attribute on a prim.
    pub fn attribute_names(&self, path: &Path) -> Result<Vec<String>> {
        self.store()?.attribute_names(path)
    }

    /// Raw attribute value at the current time.
    pub fn attribute_value(&self, path: &Path, name: &str) -> Result<Option<Value>> {
        self.store()?
            .attribute_value(path, name, self.time(), self.interpolation_mode())
    }

    /// Every prim path in path order.
    pub fn all_paths(&self) -> Result<Vec<Path>> {
        Ok(self.store()?.prims()?.into_iter().map(|(p, _)| p).collect())
    }

    /// Prims at or below `root`.
    pub fn paths_under(&self, root: &Path) -> Result<Vec<Path>> {
        Ok(self
            .store()?
            .prims()?
            .into_iter()
            .filter(|(p, _)| p.has_prefix(root))
            .map(|(p, _)| p)
            .collect())
    }

    /// Prims at or below `root` with the given type name.
    pub fn find_by_type(&self, root: &Path, type_name: &str) -> Result<Vec<Path>> {
        Ok(self
            .store()?
            .prims()?
            .into_iter()
            .filter(|(p, t)| t == type_name && p.has_prefix(root))
            .map(|(p, _)| p)
            .collect())
    }

    /// Every prim typed as `T`.
    pub fn find<T: Sample>(&self) -> Result<Vec<Path>> {
        self.find_under::<T>(&Path::root())
    }

    /// Prims typed as `T` at or below `root`.
    pub fn find_under<T: Sample>(&self, root: &Path) -> Result<Vec<Path>> {
        let schema = T::schema();
        if schema.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "{} has no prim type",
                std::any::type_name::<T>()
            )));
        }
        self.find_by_type(root, schema)
    }

    /// Lazily read every prim under `root` as `T`.
    ///
    /// Typed samples visit prims of their own type; untyped samples visit
    /// every prim below `root`.
    pub fn read_all<T: Sample>(&self, root: &Path) -> Result<SampleCollection<'_, T>> {
        let paths = if T::schema().is_empty() {
            self.paths_under(root)?
        } else {
            self.find_under::<T>(root)?
        };
        Ok(SampleCollection::new(self, paths))
    }

    /// Lazily read the given paths as `T`.
    pub fn read_paths<T: Sample>(&self, paths: Vec<Path>) -> SampleCollection<'_, T> {
        SampleCollection::new(self, paths)
    }

    /// Time samples of `attribute` on every prim below `root`.
    ///
    /// Prims without samples are omitted.
    pub fn compute_key_frames(&self, root: &Path, attribute: &str) -> Result<BTreeMap<Path, Vec<f64>>> {
        let store = self.store()?;
        if store.prim_type(root)?.is_none() {
            return Err(Error::NotFound(root.clone()));
        }
        let mut keys = BTreeMap::new();
        for (path, _) in store.prims()? {
            if !path.has_prefix(root) {
                continue;
            }
            let times = store.time_samples(&path, attribute)?;
            if !times.is_empty() {
                keys.insert(path, times);
            }
        }
        Ok(keys)
    }
}
