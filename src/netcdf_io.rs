//! NetCDF / OPeNDAP dataset access
//!
//! `fetch_data` opens a dataset through libnetcdf, which accepts both local paths
//! and OPeNDAP URLs (the latter only when libnetcdf was built with DAP support),
//! and loads it into a [`PlatformDataset`]. Times are left undecoded. Other
//! variables get the usual CF decoding: samples equal to `_FillValue` or
//! `missing_value` become NaN (so missing data looks the same as alignment
//! padding) and packed values are unpacked with `scale_factor` / `add_offset`.
//!
//! `write_dataset` is the reverse direction, used to persist aligned or filtered
//! datasets locally.

use crate::alignment::{check_alignment, AlignMode, AlignmentOutcome, AlignmentState};
use crate::dataset::{DataCatalog, PlatformDataset, Variable};
use crate::errors::{OceanDapError, Result};
use crate::metadata::{attribute_to_f64, names, DatasetAttributes};
use ndarray::{ArrayD, IxDyn};
use netcdf::File;
use std::{fs, path::Path};
use tracing::{debug, info};

/// Open `url` (remote dataset or local file) and load its attributes and variables.
///
/// # Errors
///
/// Fails if the dataset cannot be opened or a required global attribute is missing
/// or unreadable. Variables that cannot be read as numbers are skipped.
pub fn fetch_data(url: &str, year: i32) -> Result<PlatformDataset> {
    info!(url, year, "opening dataset");
    let file = netcdf::open(url)?;
    read_dataset(&file, year)
}

/// Load an already open file into a [`PlatformDataset`] keyed by its platform code.
pub fn read_dataset(file: &File, year: i32) -> Result<PlatformDataset> {
    let attributes = DatasetAttributes::from_file(file, year)?;
    let mut dataset = PlatformDataset::new(attributes.platform_code.clone(), attributes);

    for var in file.variables() {
        let name = var.name();
        let dimensions: Vec<String> = var
            .dimensions()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

        let raw: Vec<f64> = match var.get_values::<f64, _>(..) {
            Ok(values) => values,
            Err(e) => {
                debug!(variable = %name, error = %e, "skipping non-numeric variable");
                continue;
            }
        };
        let values = CfEncoding::from_variable(&var).decode(raw);

        let data = ArrayD::from_shape_vec(IxDyn(&shape), values)?;
        dataset.insert_variable(Variable::new(name, dimensions, data)?);
    }

    debug!(
        platform = %dataset.platform,
        variables = dataset.variable_names().count(),
        "dataset loaded"
    );
    Ok(dataset)
}

/// Missing-value markers and packing parameters of one variable
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CfEncoding {
    pub missing: Vec<f64>,
    pub scale_factor: Option<f64>,
    pub add_offset: Option<f64>,
}

impl CfEncoding {
    /// Read `_FillValue`, `missing_value`, `scale_factor` and `add_offset`.
    /// Attributes that are absent or not numeric are ignored.
    pub fn from_variable(var: &netcdf::Variable) -> Self {
        let number = |attr_name: &str| {
            var.attribute(attr_name)
                .and_then(|attr| attr.value().ok())
                .and_then(|value| attribute_to_f64(attr_name, &value).ok())
        };
        Self {
            missing: ["_FillValue", "missing_value"]
                .into_iter()
                .filter_map(|attr_name| number(attr_name))
                .collect(),
            scale_factor: number("scale_factor"),
            add_offset: number("add_offset"),
        }
    }

    /// Mask missing markers (compared in the stored domain) to NaN, then unpack.
    pub fn decode(&self, raw: Vec<f64>) -> Vec<f32> {
        let scale = self.scale_factor.unwrap_or(1.0);
        let offset = self.add_offset.unwrap_or(0.0);
        raw.into_iter()
            .map(|v| {
                if v.is_nan() || self.missing.contains(&v) {
                    f32::NAN
                } else {
                    (v * scale + offset) as f32
                }
            })
            .collect()
    }
}

/// Write a dataset's variables and global attributes to a new NetCDF file.
///
/// An existing file at `path` is replaced. Variables sharing a dimension name
/// must agree on its length.
pub fn write_dataset(path: &Path, dataset: &PlatformDataset) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }

    let mut file = netcdf::create(path)?;

    for variable in dataset.variables() {
        for (dim_name, &dim_len) in variable.dimensions.iter().zip(variable.shape()) {
            let existing_len = file.dimension(dim_name).map(|d| d.len());
            match existing_len {
                Some(existing) if existing != dim_len => {
                    return Err(OceanDapError::InvalidSlice {
                        message: format!(
                            "dimension '{dim_name}' has length {existing} \
                             but variable '{}' needs {dim_len}",
                            variable.name
                        ),
                    });
                }
                Some(_) => {}
                None => {
                    file.add_dimension(dim_name, dim_len)?;
                }
            }
        }
    }

    for variable in dataset.variables() {
        let dim_refs: Vec<&str> = variable.dimensions.iter().map(String::as_str).collect();
        let mut nc_var = file.add_variable::<f32>(&variable.name, &dim_refs)?;
        nc_var.put(variable.data.view(), ..)?;
    }

    let a = &dataset.attributes;
    file.add_attribute(names::PLATFORM_CODE, a.platform_code.as_str())?;
    file.add_attribute(names::PLATFORM_NAME, a.platform_name.as_str())?;
    file.add_attribute(names::DATA_TYPE, a.data_type.as_str())?;
    file.add_attribute(names::TITLE, a.title.as_str())?;
    file.add_attribute(names::INSTRUMENT, a.instrument.as_str())?;
    file.add_attribute(names::VERTICAL_MIN, a.vertical_min)?;
    file.add_attribute(names::VERTICAL_MAX, a.vertical_max)?;
    file.add_attribute(names::LON_MIN, a.lon_min)?;
    file.add_attribute(names::LON_MAX, a.lon_max)?;
    file.add_attribute(names::LAT_MIN, a.lat_min)?;
    file.add_attribute(names::LAT_MAX, a.lat_max)?;

    info!(path = %path.display(), platform = %dataset.platform, "dataset written");
    Ok(())
}

/// Align `variable` of the local file at `path` and persist the result.
///
/// The alignment state is read from and saved back to `state_path` when given.
/// Aligned data is written to `output` before the state is saved, so an "aligned"
/// flag on disk always has shifted data behind it.
///
/// # Errors
///
/// Refuses a shift with no `output` before anything is saved. Also fails when
/// [`fetch_data`], [`check_alignment`] or [`write_dataset`] fail.
pub fn align_file(
    path: &Path,
    year: i32,
    variable: &str,
    mode: AlignMode,
    state_path: Option<&Path>,
    output: Option<&Path>,
) -> Result<AlignmentOutcome> {
    let dataset = fetch_data(&path.to_string_lossy(), year)?;
    let platform = dataset.platform.clone();

    let mut catalog = DataCatalog::new();
    catalog.insert(dataset);

    let mut state = match state_path {
        Some(state_path) => AlignmentState::load(state_path)?,
        None => AlignmentState::new(),
    };
    state.register_catalog(&catalog);

    let outcome = check_alignment(&mut catalog, &platform, variable, mode, &mut state)?;

    match output {
        Some(output) => write_dataset(output, catalog.get(&platform)?)?,
        None if outcome == AlignmentOutcome::Shifted => {
            return Err(OceanDapError::Generic(format!(
                "'{variable}' of platform {platform} was shifted but no output path was \
                 given; the alignment state was not saved"
            )));
        }
        None => {}
    }
    if let Some(state_path) = state_path {
        state.save(state_path)?;
    }
    Ok(outcome)
}
