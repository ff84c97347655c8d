//! oceandap: helpers for OPeNDAP oceanographic platform data
//!
//! A small Rust library for the notebook-style workflow of selecting platforms and
//! variables from an OPeNDAP service, fetching them, putting their depth axes on a
//! common footing and plotting the result.
//!
//! ## Key Features
//!
//! - **Dimension Discovery**: Parse DDS documents into TIME/LATITUDE/LONGITUDE/DEPTH bounds
//! - **Query Building**: Hyperslab query strings and constrained fetch URLs
//! - **Dataset Access**: Open remote or local datasets and extract platform attributes
//! - **Depth Alignment**: Pad platforms whose depth index starts at 1, exactly once
//! - **Filtering & Merging**: Select samples and depth ranges, merge platforms along TIME
//! - **Plotting**: SVG/PNG variable plots and an interactive HTML platform map
//!
//! ## Module Organization
//!
//! - [`dds`]: DDS declaration grammar, dimension discovery and query strings
//! - [`data_source`]: Document sources (HTTP, in-memory) used by discovery
//! - [`netcdf_io`]: Dataset fetching and writing
//! - [`metadata`]: Platform attributes and the attribute table
//! - [`dataset`]: In-memory variables, platform datasets and the catalog
//! - [`alignment`]: Depth-axis alignment and its state
//! - [`filter`]: Position tables, depth filtering, platform merging
//! - [`geo`]: Reprojection and bounding-box margins
//! - [`plot`]: Static and interactive plots
//! - [`errors`]: Centralized error handling
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use oceandap::prelude::*;
//!
//! # async fn run() -> oceandap::Result<()> {
//! let source = HttpSource::new()?;
//! let sizes = retrieve_dds_info(&source, "https://example.org/dataset.nc.dds").await?;
//! let query = query_string(&sizes, &["TIME", "DEPTH"]);
//! println!("{query}");
//!
//! let mut catalog = DataCatalog::new();
//! catalog.insert(fetch_data("https://example.org/dataset.nc", 2020)?);
//!
//! let mut state = AlignmentState::for_catalog(&catalog);
//! let platform = catalog.platforms().next().unwrap_or_default().to_string();
//! check_alignment(&mut catalog, &platform, "TEMP", AlignMode::Align, &mut state)?;
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod alignment;
pub mod data_source;
pub mod dataset;
pub mod dds;
pub mod errors;
pub mod filter;
pub mod geo;
pub mod metadata;
pub mod netcdf_io;
pub mod plot;

// Direct re-exports for the public API
pub use alignment::*;
pub use data_source::*;
pub use dataset::*;
pub use dds::*;
pub use errors::*;
pub use filter::*;
pub use geo::*;
pub use metadata::*;
pub use netcdf_io::*;

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::alignment::{check_alignment, AlignMode, AlignmentOutcome, AlignmentState};
    pub use crate::data_source::{DocumentSource, HttpSource, MemorySource};
    pub use crate::dataset::{DataCatalog, PlatformDataset, Variable};
    pub use crate::dds::{fetch_url, query_string, retrieve_dds_info, DimensionSizes};
    pub use crate::errors::{OceanDapError, Result};
    pub use crate::filter::{filter_by_depth, merge_platforms, PositionTable};
    pub use crate::geo::{apply_margin, reproject, BoundingBox, Crs};
    pub use crate::metadata::{AttributeTable, DatasetAttributes};
    pub use crate::netcdf_io::fetch_data;
    pub use crate::plot::{plot_variable, InteractiveMap};
}
