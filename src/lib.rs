//! # stagebind
//!
//! Typed sample binding for hierarchical, time-sampled scene graphs.
//!
//! Strongly typed records ("samples") are mapped onto the attributes of
//! prims in a scene. Many samples can be read concurrently with results
//! streamed back in path order, and an access mask can restrict repeated
//! reads to the prims and attributes that actually change over time.
//!
//! ## Modules
//!
//! - [`util`] - Errors, paths, logging setup
//! - [`core`] - Values, time codes, attribute storage, the store contract
//! - [`schema`] - Sample trait, field descriptors, primvars, enums
//! - [`scene`] - Scene handle and access mask
//! - [`read_job`] - Concurrent bulk reader
//! - [`collection`] - Lazy synchronous enumeration
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use stagebind::prelude::*;
//!
//! let scene = Scene::create("shot.json")?;
//! scene.set_time(1.0)?;
//! scene.write(&Path::parse("/World/Cube")?, &XformSample::default())?;
//! scene.save()?;
//!
//! let scene = Arc::new(Scene::open("shot.json")?);
//! let paths = scene.find::<XformSample>()?;
//! for item in ReadAllJob::<XformSample>::new(scene, paths) {
//!     let item = item?;
//!     println!("{} {:?}", item.path, item.sample);
//! }
//! ```

pub mod util;
pub mod core;
pub mod schema;
pub mod scene;
pub mod read_job;
pub mod collection;

// Re-export commonly used types
pub use util::{Error, Path, Result};
pub use scene::Scene;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Path, Result};
    pub use crate::core::{Interpolation, InterpolationMode, TimeCode, Value, Variability};
    pub use crate::schema::{
        Connectable, FieldSpec, MeshSample, Primvar, Relationship, Sample, SampleReader,
        SampleWriter, TokenEnum, XformSample,
    };
    pub use crate::scene::{AccessMask, Scene, UpAxis, WriteMode};
    pub use crate::read_job::{ExecutionMode, JobState, ReadAllJob, ReadJobOptions};
    pub use crate::collection::{SampleCollection, SampleHolder};
}
