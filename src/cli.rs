//! Defines command-line interface options using `clap` for the oceandap tool.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// A CLI tool for OPeNDAP oceanographic platform datasets
#[derive(Parser, Debug)]
#[command(
    version,
    name = "oceandap",
    about = "Discover, fetch, align and plot OPeNDAP platform datasets"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Log filter, e.g. "info" or "oceandap=debug"
    #[arg(long, global = true, default_value = "warn", env = "RUST_LOG")]
    pub log_level: String,

    /// HTTP request timeout in seconds
    #[arg(long, global = true, default_value_t = 60, env = "OCEANDAP_TIMEOUT")]
    pub timeout: u64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover dimension sizes from a DDS document and print the query string
    Dims {
        /// URL of the DDS document (usually the dataset URL + ".dds")
        #[arg(long)]
        url: String,

        /// Dimensions to include in the query string
        #[arg(long, value_delimiter = ',', default_value = "TIME,LATITUDE,LONGITUDE,DEPTH")]
        keys: Vec<String>,

        /// Variables to build a constrained fetch URL for
        #[arg(long, value_delimiter = ',')]
        vars: Vec<String>,
    },

    /// Open a dataset and print its platform attributes
    Fetch {
        /// Dataset URL or local NetCDF path
        #[arg(long)]
        url: String,

        /// Year of the dataset subset
        #[arg(long)]
        year: i32,

        /// Print the attribute table as JSON
        #[arg(long)]
        json: bool,
    },

    /// Align the depth axis of one variable
    Align(AlignArgs),

    /// Plot a variable (1-D or 2-D) to SVG, optionally PNG
    Plot {
        /// Local NetCDF file
        #[arg(short, long)]
        file: PathBuf,

        /// Variable to plot
        #[arg(long)]
        var: String,

        /// SVG output path
        #[arg(short, long)]
        output: PathBuf,

        /// Also rasterize to this PNG path
        #[arg(long)]
        png: Option<PathBuf>,

        /// Plot title, defaults to the variable name
        #[arg(long)]
        title: Option<String>,
    },

    /// Apply the 20% bounding-box margin to a value
    Margin {
        #[arg(long, allow_hyphen_values = true)]
        value: f64,

        /// "low" or "high"
        #[arg(long)]
        flag: String,
    },

    /// Reproject one point between EPSG:4326 and EPSG:3857
    Reproject {
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
}

#[derive(ClapArgs, Debug)]
pub struct AlignArgs {
    /// Local NetCDF file of the platform
    #[arg(short, long)]
    pub file: PathBuf,

    /// Year of the dataset subset
    #[arg(long, default_value_t = 0)]
    pub year: i32,

    /// Variable to align
    #[arg(long)]
    pub var: String,

    /// The data was aligned when it was extracted; only record it
    #[arg(long)]
    pub upstream: bool,

    /// JSON file holding the alignment state, read and updated
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Write the aligned dataset to this NetCDF path
    #[arg(long)]
    pub output: Option<PathBuf>,
}
