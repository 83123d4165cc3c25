//! Core layer - attribute values, time sampling and the store contract.
//!
//! This module provides:
//! - [`Value`] - Typed attribute payloads
//! - [`TimeCode`] / [`Variability`] / [`Interpolation`] - Sampling descriptors
//! - [`AttributeSpec`] / [`AttributeData`] - Time-sampled attribute storage
//! - [`SceneStore`] - Backing store trait, with [`MemoryStore`] as reference

mod value;
mod sample;
mod attribute;
mod store;

pub use value::Value;
pub use sample::{TimeCode, Variability, Interpolation, InterpolationMode};
pub use attribute::{AttributeSpec, AttributeData};
pub use store::{SceneStore, MemoryStore, SceneDocument, PrimData};
