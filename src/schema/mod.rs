//! Schema engine: mapping typed samples onto prim attributes.
//!
//! A sample type lists its fields as [`FieldSpec`] constants and implements
//! [`Sample`] by walking them with a [`SampleWriter`] / [`SampleReader`]:
//!
//! ```ignore
//! #[derive(Clone, Default)]
//! struct Marker {
//!     name: String,
//!     weight: f32,
//! }
//!
//! impl Marker {
//!     const NAME: FieldSpec = FieldSpec::new("name").uniform();
//!     const WEIGHT: FieldSpec = FieldSpec::new("weight");
//! }
//!
//! impl Sample for Marker {
//!     fn write(&self, w: &mut SampleWriter<'_>) -> Result<()> {
//!         w.value(&Self::NAME, &self.name)?;
//!         w.value(&Self::WEIGHT, &self.weight)
//!     }
//!
//!     fn read(&mut self, r: &mut SampleReader<'_>) -> Result<()> {
//!         r.value(&Self::NAME, &mut self.name)?;
//!         r.value(&Self::WEIGHT, &mut self.weight)
//!     }
//! }
//! ```
//!
//! Naming rules:
//! - attribute name = `<namespace>:<field namespace>:<name or rename>`
//! - nested samples recurse into `<namespace>:<field namespace or name>`
//! - primvars live under `primvars:`, indices under `<primvar>:indices`
//! - dictionaries store each entry as `<namespace>:<field name>:<key>`
//! - connectable values add a `<attribute>.connect` relationship
//! - a field written as unset blocks the attribute at that time

mod convert;
mod enums;
mod field;
mod io;
mod primvar;
mod samples;

pub use convert::AttrValue;
pub use enums::{Orientation, Purpose, SubdivScheme, TokenEnum, UpAxis, Visibility};
pub use field::{
    connection_name, indices_name, join_namespace, primvar_name, FieldSpec, CONNECT_SUFFIX,
    INDICES_SUFFIX, NAMESPACE_SEPARATOR, PRIMVARS_NAMESPACE,
};
pub use io::{ReadReport, SampleReader, SampleWriter};
pub use primvar::{Connectable, Flattened, Primvar, Relationship};
pub use samples::{MeshSample, XformSample};

use crate::util::Result;

/// A record type that can be read from and written to a prim.
pub trait Sample: Default + Clone + Send + Sync + 'static {
    /// Prim type written on define, and used by typed lookups.
    /// Empty for untyped samples.
    fn schema() -> &'static str {
        ""
    }

    /// Write every field.
    fn write(&self, w: &mut SampleWriter<'_>) -> Result<()>;

    /// Read every field. Fields without an authored value keep their
    /// current contents.
    fn read(&mut self, r: &mut SampleReader<'_>) -> Result<()>;
}
