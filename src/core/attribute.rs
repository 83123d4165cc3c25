//! Time-sampled attribute storage.
//!
//! An attribute holds an optional default value plus a sorted list of
//! `(time, value)` samples. Resolution at a time picks the floor sample
//! (largest time <= t) and falls back to the default when the requested time
//! precedes every sample. A sample may be blocked, which resolves to no value
//! at all until the next sample.

use serde::{Deserialize, Serialize};

use super::{Interpolation, InterpolationMode, TimeCode, Value, Variability};

/// Declared shape of an attribute, fixed when it is first authored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    /// Value type name (see [`Value::type_name`]).
    pub type_name: String,
    pub variability: Variability,
    /// Set for primvars only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpolation: Option<Interpolation>,
    /// Set for primvars only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_size: Option<usize>,
}

impl AttributeSpec {
    /// Spec for a plain attribute holding `value`.
    pub fn for_value(value: &Value, variability: Variability) -> Self {
        Self {
            type_name: value.type_name().to_string(),
            variability,
            interpolation: None,
            element_size: None,
        }
    }

    /// Mark as primvar with the given interpolation and element size.
    pub fn primvar(mut self, interpolation: Interpolation, element_size: usize) -> Self {
        self.interpolation = Some(interpolation);
        self.element_size = Some(element_size.max(1));
        self
    }

    /// Check if primvar metadata is present.
    #[inline]
    pub fn is_primvar(&self) -> bool {
        self.interpolation.is_some()
    }
}

/// Stored attribute: spec, default value, and time samples.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeData {
    #[serde(flatten)]
    pub spec: AttributeSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Sorted by time, unique times. `None` marks a blocked sample.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<(f64, Option<Value>)>,
}

impl AttributeData {
    /// Create an empty attribute.
    pub fn new(spec: AttributeSpec) -> Self {
        Self {
            spec,
            default: None,
            samples: Vec::new(),
        }
    }

    /// Author a value. Uniform attributes always write the default.
    pub fn set(&mut self, value: Value, time: TimeCode) {
        self.author(Some(value), time);
    }

    /// Block the value at `time`: lookups resolve to nothing until the next
    /// sample. Blocking the default clears it.
    pub fn block(&mut self, time: TimeCode) {
        self.author(None, time);
    }

    fn author(&mut self, value: Option<Value>, time: TimeCode) {
        let time = match self.spec.variability {
            Variability::Uniform => TimeCode::Default,
            Variability::Varying => time,
        };
        match time {
            TimeCode::Default => self.default = value,
            TimeCode::At(t) => match self.samples.binary_search_by(|(st, _)| st.total_cmp(&t)) {
                Ok(idx) => self.samples[idx].1 = value,
                Err(idx) => self.samples.insert(idx, (t, value)),
            },
        }
    }

    /// Find the floor sample index (largest sample time <= `t`).
    pub fn floor_index(&self, t: f64) -> Option<usize> {
        // Binary search for the first sample strictly after t
        let mut lo = 0;
        let mut hi = self.samples.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.samples[mid].0 <= t {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        if lo > 0 {
            Some(lo - 1)
        } else {
            None
        }
    }

    /// Numeric lookup time, or `None` when the default value applies.
    fn lookup_time(&self, time: TimeCode) -> Option<f64> {
        match (self.spec.variability, time) {
            (Variability::Uniform, _) | (_, TimeCode::Default) => None,
            (Variability::Varying, TimeCode::At(t)) => Some(t),
        }
    }

    /// Held value at `time`: the floor sample, else the default.
    pub fn held(&self, time: TimeCode) -> Option<&Value> {
        match self.lookup_time(time).and_then(|t| self.floor_index(t)) {
            Some(idx) => self.samples[idx].1.as_ref(),
            None => self.default.as_ref(),
        }
    }

    /// Resolve the value at `time`, blending in linear mode.
    pub fn value_at(&self, time: TimeCode, mode: InterpolationMode) -> Option<Value> {
        if mode == InterpolationMode::Linear {
            if let Some(t) = self.lookup_time(time) {
                if let Some(idx) = self.floor_index(t) {
                    if let (Some((floor_t, Some(floor_v))), Some((ceil_t, Some(ceil_v)))) =
                        (self.samples.get(idx), self.samples.get(idx + 1))
                    {
                        let alpha = (t - floor_t) / (ceil_t - floor_t);
                        if let Some(blended) = floor_v.lerp(ceil_v, alpha) {
                            return Some(blended);
                        }
                    }
                }
            }
        }
        self.held(time).cloned()
    }

    /// Sample times in ascending order.
    pub fn time_samples(&self) -> Vec<f64> {
        self.samples.iter().map(|(t, _)| *t).collect()
    }

    /// Check if the value might differ between two times.
    ///
    /// A single time sample is treated as constant.
    #[inline]
    pub fn might_be_time_varying(&self) -> bool {
        self.spec.variability == Variability::Varying && self.samples.len() > 1
    }

    /// Check if any value was authored.
    #[inline]
    pub fn has_value(&self) -> bool {
        self.default.is_some() || self.samples.iter().any(|(_, v)| v.is_some())
    }
}
