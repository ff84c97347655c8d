//! Global attribute extraction and the per-platform attribute table
//!
//! OPeNDAP platform datasets carry their provenance and extent as global
//! attributes (`platform_code`, `geospatial_vertical_min`, ...). This module reads
//! them into a typed [`DatasetAttributes`] record and gathers the records of many
//! platforms into an [`AttributeTable`].

use crate::dataset::DataCatalog;
use crate::errors::{OceanDapError, Result};
use netcdf::{AttributeValue, File};
use serde::{Deserialize, Serialize};

/// Global attribute names read from every platform dataset
pub mod names {
    pub const LON_MIN: &str = "geospatial_lon_min";
    pub const LON_MAX: &str = "geospatial_lon_max";
    pub const LAT_MIN: &str = "geospatial_lat_min";
    pub const LAT_MAX: &str = "geospatial_lat_max";
    pub const PLATFORM_CODE: &str = "platform_code";
    pub const PLATFORM_NAME: &str = "platform_name";
    pub const DATA_TYPE: &str = "data_type";
    pub const TITLE: &str = "title";
    pub const INSTRUMENT: &str = "instrument";
    pub const VERTICAL_MIN: &str = "geospatial_vertical_min";
    pub const VERTICAL_MAX: &str = "geospatial_vertical_max";
}

/// Number of fields in a flat attribute record
pub const RECORD_LEN: usize = 12;

/// Provenance and extent of one platform dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetAttributes {
    pub platform_code: String,
    pub platform_name: String,
    pub year: i32,
    pub data_type: String,
    pub title: String,
    pub instrument: String,
    pub vertical_min: f64,
    pub vertical_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl DatasetAttributes {
    /// Read the attributes of an open dataset. `year` is supplied by the caller
    /// because the datasets do not record which yearly subset they belong to.
    pub fn from_file(file: &File, year: i32) -> Result<Self> {
        Ok(Self {
            platform_code: global_string(file, names::PLATFORM_CODE)?,
            platform_name: global_string(file, names::PLATFORM_NAME)?,
            year,
            data_type: global_string(file, names::DATA_TYPE)?,
            title: global_string(file, names::TITLE)?,
            instrument: global_string(file, names::INSTRUMENT)?,
            vertical_min: global_f64(file, names::VERTICAL_MIN)?,
            vertical_max: global_f64(file, names::VERTICAL_MAX)?,
            lon_min: global_f64(file, names::LON_MIN)?,
            lon_max: global_f64(file, names::LON_MAX)?,
            lat_min: global_f64(file, names::LAT_MIN)?,
            lat_max: global_f64(file, names::LAT_MAX)?,
        })
    }

    /// Flatten into the 12-field record: code, name, year, data type, title,
    /// instrument, vertical min/max, lon min/max, lat min/max.
    pub fn to_record(&self) -> Vec<String> {
        vec![
            self.platform_code.clone(),
            self.platform_name.clone(),
            self.year.to_string(),
            self.data_type.clone(),
            self.title.clone(),
            self.instrument.clone(),
            self.vertical_min.to_string(),
            self.vertical_max.to_string(),
            self.lon_min.to_string(),
            self.lon_max.to_string(),
            self.lat_min.to_string(),
            self.lat_max.to_string(),
        ]
    }

    /// Parse a record produced by [`Self::to_record`] (or stored by a caller).
    pub fn from_record<S: AsRef<str>>(record: &[S]) -> Result<Self> {
        if record.len() != RECORD_LEN {
            return Err(OceanDapError::Generic(format!(
                "attribute record has {} fields, expected {RECORD_LEN}",
                record.len()
            )));
        }
        let field = |i: usize| record[i].as_ref().trim();
        let float = |i: usize, name: &str| -> Result<f64> {
            field(i).parse::<f64>().map_err(|e| OceanDapError::InvalidAttribute {
                name: name.to_string(),
                message: e.to_string(),
            })
        };

        Ok(Self {
            platform_code: field(0).to_string(),
            platform_name: field(1).to_string(),
            year: field(2)
                .parse::<i32>()
                .map_err(|e| OceanDapError::InvalidAttribute {
                    name: "year".to_string(),
                    message: e.to_string(),
                })?,
            data_type: field(3).to_string(),
            title: field(4).to_string(),
            instrument: field(5).to_string(),
            vertical_min: float(6, names::VERTICAL_MIN)?,
            vertical_max: float(7, names::VERTICAL_MAX)?,
            lon_min: float(8, names::LON_MIN)?,
            lon_max: float(9, names::LON_MAX)?,
            lat_min: float(10, names::LAT_MIN)?,
            lat_max: float(11, names::LAT_MAX)?,
        })
    }
}

/// One row of an [`AttributeTable`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRow {
    pub platform: String,
    #[serde(flatten)]
    pub attributes: DatasetAttributes,
}

/// Attributes of several platforms, one row per platform in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeTable {
    rows: Vec<AttributeRow>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect one row per platform of `catalog`
    pub fn from_catalog(catalog: &DataCatalog) -> Self {
        let mut table = Self::new();
        for (platform, dataset) in catalog.iter() {
            table.insert(platform, dataset.attributes.clone());
        }
        table
    }

    /// Add or replace the row of `platform`
    pub fn insert(&mut self, platform: impl Into<String>, attributes: DatasetAttributes) {
        let platform = platform.into();
        match self.rows.iter_mut().find(|r| r.platform == platform) {
            Some(row) => row.attributes = attributes,
            None => self.rows.push(AttributeRow {
                platform,
                attributes,
            }),
        }
    }

    pub fn get(&self, platform: &str) -> Option<&DatasetAttributes> {
        self.rows
            .iter()
            .find(|r| r.platform == platform)
            .map(|r| &r.attributes)
    }

    pub fn rows(&self) -> &[AttributeRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.rows)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let rows: Vec<AttributeRow> = serde_json::from_str(json)?;
        Ok(Self { rows })
    }

    /// Prints the table, one block per platform.
    pub fn print(&self) {
        println!("\n===== Platform Attributes =====");
        if self.rows.is_empty() {
            println!("   (No platforms)");
            return;
        }
        for row in &self.rows {
            let a = &row.attributes;
            println!("- {} ({}, {})", row.platform, a.platform_code, a.platform_name);
            println!("    Year: {}", a.year);
            println!("    Data type: {}", a.data_type);
            println!("    Title: {}", a.title);
            println!("    Instrument: {}", a.instrument);
            println!("    Vertical: [{}, {}]", a.vertical_min, a.vertical_max);
            println!("    Lon: [{}, {}]", a.lon_min, a.lon_max);
            println!("    Lat: [{}, {}]", a.lat_min, a.lat_max);
        }
    }
}

fn global_value(file: &File, name: &str) -> Result<AttributeValue> {
    let attr = file
        .attribute(name)
        .ok_or_else(|| OceanDapError::AttributeNotFound {
            name: name.to_string(),
        })?;
    Ok(attr.value()?)
}

/// Read a global attribute as text; numeric attributes are formatted.
pub fn global_string(file: &File, name: &str) -> Result<String> {
    attribute_to_string(name, &global_value(file, name)?)
}

/// Read a global attribute as a float; textual attributes are parsed.
pub fn global_f64(file: &File, name: &str) -> Result<f64> {
    attribute_to_f64(name, &global_value(file, name)?)
}

/// Convert a scalar attribute value to text.
pub fn attribute_to_string(name: &str, value: &AttributeValue) -> Result<String> {
    let text = match value {
        AttributeValue::Str(s) => s.clone(),
        AttributeValue::Strs(ss) if ss.len() == 1 => ss[0].clone(),
        AttributeValue::Double(v) => v.to_string(),
        AttributeValue::Float(v) => v.to_string(),
        AttributeValue::Int(v) => v.to_string(),
        AttributeValue::Short(v) => v.to_string(),
        AttributeValue::Longlong(v) => v.to_string(),
        AttributeValue::Uint(v) => v.to_string(),
        AttributeValue::Ushort(v) => v.to_string(),
        AttributeValue::Uchar(v) => v.to_string(),
        AttributeValue::Schar(v) => v.to_string(),
        other => {
            return Err(OceanDapError::InvalidAttribute {
                name: name.to_string(),
                message: format!("expected a scalar, found {other:?}"),
            })
        }
    };
    Ok(text)
}

/// Convert a scalar attribute value to a float.
pub fn attribute_to_f64(name: &str, value: &AttributeValue) -> Result<f64> {
    let number = match value {
        AttributeValue::Double(v) => *v,
        AttributeValue::Float(v) => f64::from(*v),
        AttributeValue::Int(v) => f64::from(*v),
        AttributeValue::Short(v) => f64::from(*v),
        AttributeValue::Longlong(v) => *v as f64,
        AttributeValue::Uint(v) => f64::from(*v),
        AttributeValue::Ushort(v) => f64::from(*v),
        AttributeValue::Uchar(v) => f64::from(*v),
        AttributeValue::Schar(v) => f64::from(*v),
        AttributeValue::Str(s) => {
            s.trim()
                .parse::<f64>()
                .map_err(|e| OceanDapError::InvalidAttribute {
                    name: name.to_string(),
                    message: format!("'{s}' is not a number: {e}"),
                })?
        }
        other => {
            return Err(OceanDapError::InvalidAttribute {
                name: name.to_string(),
                message: format!("expected a number, found {other:?}"),
            })
        }
    };
    Ok(number)
}
