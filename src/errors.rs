//! Centralized error handling for oceandap
//!
//! Every fallible helper returns [`Result`], so callers in a notebook-style session
//! can match on what went wrong instead of parsing messages.

use thiserror::Error;

/// Failures while discovering dimensions in a DDS document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DdsError {
    /// No declaration carries the requested dimension name
    #[error("dimension '{0}' is not declared in the DDS document")]
    DimensionNotFound(String),

    /// The same name is declared with more than one size
    #[error("dimension '{name}' is declared {count} times with different sizes")]
    AmbiguousDimension { name: String, count: usize },

    /// The declared size is zero, so there is no last valid index
    #[error("dimension '{0}' has size 0")]
    EmptyDimension(String),
}

/// Main error type for oceandap operations
#[derive(Debug, Error)]
pub enum OceanDapError {
    /// NetCDF / OPeNDAP access errors
    #[error("NetCDF error: {0}")]
    NetCDFError(#[from] netcdf::Error),

    /// HTTP errors while fetching remote documents
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed or ambiguous DDS document
    #[error("DDS error: {0}")]
    Dds(#[from] DdsError),

    /// I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Array shape or dimension error
    #[error("Array error: {0}")]
    ArrayError(#[from] ndarray::ShapeError),

    /// Platform missing from the data catalog
    #[error("Platform '{platform}' not found in catalog")]
    PlatformNotFound { platform: String },

    /// Variable missing from a dataset
    #[error("Variable '{var}' not found in dataset")]
    VariableNotFound { var: String },

    /// Dimension missing from a variable
    #[error("Dimension '{dim}' not found in variable '{var}'")]
    DimensionNotFound { var: String, dim: String },

    /// Global attribute missing from a dataset
    #[error("Attribute '{name}' not found in dataset")]
    AttributeNotFound { name: String },

    /// Global attribute present but not convertible
    #[error("Attribute '{name}' has an unusable value: {message}")]
    InvalidAttribute { name: String, message: String },

    /// Invalid index selection or depth range
    #[error("Invalid slice specification: {message}")]
    InvalidSlice { message: String },

    /// Unsupported coordinate reference system
    #[error("Unsupported CRS: {0}")]
    InvalidCrs(String),

    /// Coordinates outside the domain of a projection
    #[error("Projection error: {0}")]
    Projection(String),

    /// Plot rendering errors
    #[error("Plot error: {0}")]
    Plot(String),

    /// Generic error for ad hoc messages
    #[error("{0}")]
    Generic(String),
}

impl From<String> for OceanDapError {
    fn from(error: String) -> Self {
        OceanDapError::Generic(error)
    }
}

impl From<&str> for OceanDapError {
    fn from(error: &str) -> Self {
        OceanDapError::Generic(error.to_string())
    }
}

/// Result type alias for oceandap operations
pub type Result<T> = std::result::Result<T, OceanDapError>;
