//! In-memory platform datasets
//!
//! A [`DataCatalog`] maps platform identifiers to [`PlatformDataset`]s, each holding
//! its global attributes and its variables as labelled `f32` arrays.

use crate::errors::{OceanDapError, Result};
use crate::metadata::DatasetAttributes;
use ndarray::ArrayD;
use std::collections::BTreeMap;

/// Canonical dimension names of platform datasets
pub mod dims {
    pub const TIME: &str = "TIME";
    pub const LATITUDE: &str = "LATITUDE";
    pub const LONGITUDE: &str = "LONGITUDE";
    pub const DEPTH: &str = "DEPTH";
}

/// A named n-dimensional array with labelled axes
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub dimensions: Vec<String>,
    pub data: ArrayD<f32>,
}

impl Variable {
    /// Create a variable, checking that every axis has a label.
    pub fn new(
        name: impl Into<String>,
        dimensions: Vec<String>,
        data: ArrayD<f32>,
    ) -> Result<Self> {
        let name = name.into();
        if dimensions.len() != data.ndim() {
            return Err(OceanDapError::Generic(format!(
                "variable '{}' has {} dimension names for a {}-d array",
                name,
                dimensions.len(),
                data.ndim()
            )));
        }
        Ok(Self {
            name,
            dimensions,
            data,
        })
    }

    /// Axis index of `dim`, if the variable has it
    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d == dim)
    }

    /// Axis index of `dim`, or `DimensionNotFound`
    pub fn require_axis(&self, dim: &str) -> Result<usize> {
        self.axis_of(dim)
            .ok_or_else(|| OceanDapError::DimensionNotFound {
                var: self.name.clone(),
                dim: dim.to_string(),
            })
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }
}

/// One platform's attributes and variables
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformDataset {
    pub platform: String,
    pub attributes: DatasetAttributes,
    variables: BTreeMap<String, Variable>,
}

impl PlatformDataset {
    pub fn new(platform: impl Into<String>, attributes: DatasetAttributes) -> Self {
        Self {
            platform: platform.into(),
            attributes,
            variables: BTreeMap::new(),
        }
    }

    /// Add or replace a variable, keyed by its name
    pub fn insert_variable(&mut self, variable: Variable) {
        self.variables.insert(variable.name.clone(), variable);
    }

    pub fn variable(&self, name: &str) -> Result<&Variable> {
        self.variables
            .get(name)
            .ok_or_else(|| OceanDapError::VariableNotFound {
                var: name.to_string(),
            })
    }

    pub fn variable_mut(&mut self, name: &str) -> Result<&mut Variable> {
        self.variables
            .get_mut(name)
            .ok_or_else(|| OceanDapError::VariableNotFound {
                var: name.to_string(),
            })
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }
}

/// Platform identifier -> dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataCatalog {
    platforms: BTreeMap<String, PlatformDataset>,
}

impl DataCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a dataset, keyed by its platform identifier
    pub fn insert(&mut self, dataset: PlatformDataset) {
        self.platforms.insert(dataset.platform.clone(), dataset);
    }

    pub fn get(&self, platform: &str) -> Result<&PlatformDataset> {
        self.platforms
            .get(platform)
            .ok_or_else(|| OceanDapError::PlatformNotFound {
                platform: platform.to_string(),
            })
    }

    pub fn get_mut(&mut self, platform: &str) -> Result<&mut PlatformDataset> {
        self.platforms
            .get_mut(platform)
            .ok_or_else(|| OceanDapError::PlatformNotFound {
                platform: platform.to_string(),
            })
    }

    pub fn platforms(&self) -> impl Iterator<Item = &str> {
        self.platforms.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlatformDataset)> {
        self.platforms.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}
