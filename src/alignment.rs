//! Depth-axis alignment across platforms
//!
//! Source platforms index their depth arrays starting from vertical index 0 or 1
//! (recorded in the `geospatial_vertical_min` attribute). For platforms starting
//! at 1 the DEPTH axis is left-padded with NaN so that depth index `k` refers to the
//! same physical depth on every platform.
//!
//! Padding must happen at most once per (platform, variable): a second shift would
//! move the data two positions. [`AlignmentState`] records what has been done and
//! is passed explicitly to [`check_alignment`].

use crate::dataset::{dims, DataCatalog};
use crate::errors::{OceanDapError, Result};
use ndarray::{concatenate, ArrayD, Axis, Slice};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Whether `check_alignment` should shift the data or only record that the
/// fetch layer already returned aligned data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignMode {
    /// Pad with NaN and shift
    Align,
    /// Data already aligned when it was extracted; only record it
    AlreadyAlignedUpstream,
}

impl AlignMode {
    pub fn from_flag(align_and_nan: bool) -> Self {
        if align_and_nan {
            Self::Align
        } else {
            Self::AlreadyAlignedUpstream
        }
    }
}

/// What `check_alignment` did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlignmentOutcome {
    /// Vertical minimum 0: depth axis already canonical
    Canonical,
    /// Data padded and shifted, state marked
    Shifted,
    /// State marked without touching the data
    MarkedUpstream,
    /// State already marked; nothing done
    AlreadyAligned,
    /// Vertical minimum neither 0 nor 1; nothing done
    UnrecognizedVerticalMin(f64),
}

/// Per platform, per variable alignment flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlignmentState {
    flags: BTreeMap<String, BTreeMap<String, bool>>,
}

impl AlignmentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A state with every variable of every platform in `catalog` not aligned
    pub fn for_catalog(catalog: &DataCatalog) -> Self {
        let mut state = Self::new();
        state.register_catalog(catalog);
        state
    }

    /// Add entries for new platforms and variables; existing flags are kept.
    pub fn register_catalog(&mut self, catalog: &DataCatalog) {
        for (platform, dataset) in catalog.iter() {
            let vars = self.flags.entry(platform.to_string()).or_default();
            for var in dataset.variable_names() {
                vars.entry(var.to_string()).or_insert(false);
            }
        }
    }

    /// Missing entries count as not aligned
    pub fn is_aligned(&self, platform: &str, variable: &str) -> bool {
        self.flags
            .get(platform)
            .and_then(|vars| vars.get(variable))
            .copied()
            .unwrap_or(false)
    }

    pub fn mark_aligned(&mut self, platform: &str, variable: &str) {
        self.flags
            .entry(platform.to_string())
            .or_default()
            .insert(variable.to_string(), true);
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a state file, or start empty when it does not exist yet
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Insert `value` at index 0 of `axis`, shift the rest right and drop the last
/// element so the shape is unchanged.
///
/// # Errors
///
/// Returns an error if `axis` is out of bounds.
pub fn adjust_with_vmin(array: &ArrayD<f32>, axis: usize, value: f32) -> Result<ArrayD<f32>> {
    if axis >= array.ndim() {
        return Err(OceanDapError::InvalidSlice {
            message: format!(
                "axis {axis} is out of bounds for array with {} dimensions",
                array.ndim()
            ),
        });
    }

    let len = array.len_of(Axis(axis));
    if len == 0 {
        return Ok(array.clone());
    }

    let mut pad_shape = array.shape().to_vec();
    pad_shape[axis] = 1;
    let pad = ArrayD::from_elem(pad_shape, value);
    let kept = array.slice_axis(Axis(axis), Slice::from(..len - 1));

    Ok(concatenate(Axis(axis), &[pad.view(), kept])?)
}

/// Align `variable` of `platform` according to its vertical minimum.
///
/// * vmin 0: nothing to do.
/// * vmin 1, not yet aligned, [`AlignMode::Align`]: pad DEPTH with NaN and mark.
/// * vmin 1, not yet aligned, [`AlignMode::AlreadyAlignedUpstream`]: only mark.
/// * vmin 1, already aligned: nothing to do.
/// * any other vmin: nothing is changed and a warning is logged; the outcome
///   carries the value so callers can decide.
///
/// # Errors
///
/// Returns an error if the platform or variable is unknown, or the variable has no
/// DEPTH dimension when a shift is needed.
pub fn check_alignment(
    catalog: &mut DataCatalog,
    platform: &str,
    variable: &str,
    mode: AlignMode,
    state: &mut AlignmentState,
) -> Result<AlignmentOutcome> {
    let dataset = catalog.get_mut(platform)?;
    let vmin = dataset.attributes.vertical_min;
    let var = dataset.variable_mut(variable)?;

    if vmin == 0.0 {
        info!(platform, variable, vmin, "depth axis already canonical");
        return Ok(AlignmentOutcome::Canonical);
    }

    if vmin != 1.0 {
        warn!(
            platform,
            variable, vmin, "unrecognized vertical minimum, leaving data untouched"
        );
        return Ok(AlignmentOutcome::UnrecognizedVerticalMin(vmin));
    }

    if state.is_aligned(platform, variable) {
        return Ok(AlignmentOutcome::AlreadyAligned);
    }

    let outcome = match mode {
        AlignMode::Align => {
            let axis = var.require_axis(dims::DEPTH)?;
            var.data = adjust_with_vmin(&var.data, axis, f32::NAN)?;
            info!(platform, variable, vmin, "aligned depth axis and padded with NaN");
            AlignmentOutcome::Shifted
        }
        AlignMode::AlreadyAlignedUpstream => {
            info!(platform, variable, vmin, "data has been aligned already");
            AlignmentOutcome::MarkedUpstream
        }
    };

    state.mark_aligned(platform, variable);
    Ok(outcome)
}
