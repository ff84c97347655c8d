//! Position tables, platform/depth filtering and cross-platform merging

use crate::dataset::{dims, DataCatalog, PlatformDataset, Variable};
use crate::errors::{OceanDapError, Result};
use ndarray::{concatenate, ArrayView1, ArrayViewD, Axis, Ix1, Slice};
use serde::{Deserialize, Serialize};

/// One sample position of one platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRow {
    /// Row number across the whole table
    pub index_abs: usize,
    pub platform: String,
    /// Sample index within the platform's own arrays
    pub index: usize,
    pub lon: f64,
    pub lat: f64,
}

/// Sample positions of several platforms
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionTable {
    rows: Vec<PositionRow>,
}

impl PositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a position; `index_abs` is assigned from the row count.
    pub fn push(&mut self, platform: impl Into<String>, index: usize, lon: f64, lat: f64) {
        let index_abs = self.rows.len();
        self.rows.push(PositionRow {
            index_abs,
            platform: platform.into(),
            index,
            lon,
            lat,
        });
    }

    /// Build the table from each platform's LONGITUDE and LATITUDE variables.
    ///
    /// A coordinate of length 1 (fixed station) is repeated to the length of the other.
    pub fn from_catalog(catalog: &DataCatalog) -> Result<Self> {
        let mut table = Self::new();
        for (platform, dataset) in catalog.iter() {
            let lon = coordinate(dataset, dims::LONGITUDE)?;
            let lat = coordinate(dataset, dims::LATITUDE)?;
            let n = match (lon.len(), lat.len()) {
                (a, b) if a == b => a,
                (1, b) => b,
                (a, 1) => a,
                (a, b) => {
                    return Err(OceanDapError::InvalidSlice {
                        message: format!(
                            "platform '{platform}' has {a} longitudes but {b} latitudes"
                        ),
                    })
                }
            };
            for i in 0..n {
                let x = lon[i.min(lon.len() - 1)];
                let y = lat[i.min(lat.len() - 1)];
                table.push(platform, i, f64::from(x), f64::from(y));
            }
        }
        Ok(table)
    }

    /// Sample indices belonging to `platform`, in table order
    pub fn indices_for(&self, platform: &str) -> Vec<usize> {
        self.rows
            .iter()
            .filter(|r| r.platform == platform)
            .map(|r| r.index)
            .collect()
    }

    /// Distinct platforms in order of first appearance
    pub fn platforms(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.platform.as_str()) {
                seen.push(&row.platform);
            }
        }
        seen
    }

    pub fn rows_for<'a>(&'a self, platform: &'a str) -> impl Iterator<Item = &'a PositionRow> + 'a {
        self.rows.iter().filter(move |r| r.platform == platform)
    }

    pub fn rows(&self) -> &[PositionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn coordinate<'a>(dataset: &'a PlatformDataset, name: &str) -> Result<ArrayView1<'a, f32>> {
    let var = dataset.variable(name)?;
    let view: ArrayViewD<'a, f32> = var.data.view();
    view.into_dimensionality::<Ix1>()
        .map_err(|_| OceanDapError::InvalidSlice {
            message: format!(
                "coordinate '{name}' of '{}' is not one-dimensional",
                dataset.platform
            ),
        })
}

/// Select samples `indices` of `variable` and the inclusive depth range `[lo, hi]`.
///
/// `indices` apply to each of TIME, LATITUDE and LONGITUDE the variable has.
///
/// # Errors
///
/// Fails if the variable is missing, has no DEPTH axis, an index is out of range,
/// or the depth range is reversed or beyond the axis.
pub fn filter_by_depth(
    dataset: &PlatformDataset,
    variable: &str,
    indices: &[usize],
    depth_range: (usize, usize),
) -> Result<Variable> {
    let var = dataset.variable(variable)?;
    let depth_axis = var.require_axis(dims::DEPTH)?;
    let mut data = var.data.clone();

    for dim in [dims::TIME, dims::LATITUDE, dims::LONGITUDE] {
        let Some(axis) = var.axis_of(dim) else {
            continue;
        };
        let len = data.len_of(Axis(axis));
        if let Some(bad) = indices.iter().find(|&&i| i >= len) {
            return Err(OceanDapError::InvalidSlice {
                message: format!("index {bad} out of range for {dim} of length {len}"),
            });
        }
        data = data.select(Axis(axis), indices);
    }

    let (lo, hi) = depth_range;
    let depth_len = data.len_of(Axis(depth_axis));
    if lo > hi || hi >= depth_len {
        return Err(OceanDapError::InvalidSlice {
            message: format!("depth range [{lo}, {hi}] invalid for DEPTH of length {depth_len}"),
        });
    }
    let data = data
        .slice_axis(Axis(depth_axis), Slice::from(lo..hi + 1))
        .to_owned();

    Variable::new(var.name.clone(), var.dimensions.clone(), data)
}

/// Concatenate `variable` of each platform along TIME.
///
/// All platforms must label the variable's axes identically and agree on every
/// axis except TIME, which is what depth alignment guarantees for DEPTH.
pub fn merge_platforms<S: AsRef<str>>(
    catalog: &DataCatalog,
    platforms: &[S],
    variable: &str,
) -> Result<Variable> {
    let vars = platforms
        .iter()
        .map(|p| catalog.get(p.as_ref())?.variable(variable))
        .collect::<Result<Vec<&Variable>>>()?;

    let Some(first) = vars.first() else {
        return Err(OceanDapError::Generic(format!(
            "no platforms given to merge '{variable}'"
        )));
    };
    let time_axis = first.require_axis(dims::TIME)?;

    for (platform, var) in platforms.iter().zip(&vars) {
        if var.dimensions != first.dimensions {
            return Err(OceanDapError::InvalidSlice {
                message: format!(
                    "'{variable}' of '{}' has dimensions {:?}, expected {:?}",
                    platform.as_ref(),
                    var.dimensions,
                    first.dimensions
                ),
            });
        }
    }

    let views: Vec<ArrayViewD<f32>> = vars.iter().map(|v| v.data.view()).collect();
    let data = concatenate(Axis(time_axis), &views)?;
    Variable::new(variable, first.dimensions.clone(), data)
}
