//! Coordinate reprojection and bounding-box margins

use crate::errors::{OceanDapError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Spherical Web Mercator radius (metres)
const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude limit of Web Mercator (degrees)
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Margin applied by [`apply_margin`], in percent of the value
pub const MARGIN_PERCENT: f64 = 20.0;

/// Supported coordinate reference systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crs {
    /// WGS84 geographic (degrees)
    Epsg4326,
    /// Web Mercator (metres)
    Epsg3857,
}

impl FromStr for Crs {
    type Err = OceanDapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "EPSG:4326" | "CRS:84" | "WGS84" => Ok(Crs::Epsg4326),
            "EPSG:3857" | "EPSG:900913" => Ok(Crs::Epsg3857),
            _ => Err(OceanDapError::InvalidCrs(s.to_string())),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Epsg4326 => write!(f, "EPSG:4326"),
            Crs::Epsg3857 => write!(f, "EPSG:3857"),
        }
    }
}

fn to_mercator(lat: f64, lon: f64) -> Result<(f64, f64)> {
    if !(-MERCATOR_MAX_LAT..=MERCATOR_MAX_LAT).contains(&lat) {
        return Err(OceanDapError::Projection(format!(
            "latitude {lat} is outside the Web Mercator domain"
        )));
    }
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    Ok((x, y))
}

fn from_mercator(y: f64, x: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    (lon, lat)
}

/// Reproject one point, returning `(x, y)`: the reprojected longitude/easting
/// followed by latitude/northing.
///
/// Input is given latitude first. For EPSG:3857 input the arguments keep their
/// axis meaning: `lat` is the northing and `lon` the easting. Positional projection
/// libraries such as PROJ read the first value of a 3857 point as the easting, so
/// callers porting such calls must swap the projected pair.
///
/// # Errors
///
/// Fails for latitudes outside the Web Mercator domain when projecting to EPSG:3857.
pub fn reproject(from: Crs, to: Crs, lat: f64, lon: f64) -> Result<(f64, f64)> {
    match (from, to) {
        (Crs::Epsg4326, Crs::Epsg3857) => to_mercator(lat, lon),
        (Crs::Epsg3857, Crs::Epsg4326) => Ok(from_mercator(lat, lon)),
        _ => Ok((lon, lat)),
    }
}

/// Reproject paired latitude/longitude slices, returning `(xs, ys)`.
pub fn reproject_all(
    from: Crs,
    to: Crs,
    lats: &[f64],
    lons: &[f64],
) -> Result<(Vec<f64>, Vec<f64>)> {
    if lats.len() != lons.len() {
        return Err(OceanDapError::Projection(format!(
            "{} latitudes but {} longitudes",
            lats.len(),
            lons.len()
        )));
    }
    let mut xs = Vec::with_capacity(lats.len());
    let mut ys = Vec::with_capacity(lats.len());
    for (&lat, &lon) in lats.iter().zip(lons) {
        let (x, y) = reproject(from, to, lat, lon)?;
        xs.push(x);
        ys.push(y);
    }
    Ok((xs, ys))
}

/// Which side of a range a margin widens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginBound {
    Low,
    High,
}

impl MarginBound {
    /// Move `value` by [`MARGIN_PERCENT`] of itself: down for `Low`, up for `High`.
    pub fn apply(self, value: f64) -> f64 {
        let delta = value * MARGIN_PERCENT / 100.0;
        match self {
            MarginBound::Low => value - delta,
            MarginBound::High => value + delta,
        }
    }
}

impl FromStr for MarginBound {
    type Err = OceanDapError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(MarginBound::Low),
            "high" => Ok(MarginBound::High),
            _ => Err(OceanDapError::Generic(format!(
                "Wrong margin flag '{s}', must be \"low\" or \"high\"."
            ))),
        }
    }
}

/// Apply the margin named by `flag` ("low" or "high") to `value`.
///
/// Any other flag yields `None` and emits a `tracing` warning. Nothing is printed
/// directly, so library callers only see the warning with a subscriber installed;
/// the `margin` subcommand prints its own message. The margin is relative to the
/// value itself, so for negative values "low" moves towards zero.
pub fn apply_margin(value: f64, flag: &str) -> Option<f64> {
    match flag.parse::<MarginBound>() {
        Ok(bound) => Some(bound.apply(value)),
        Err(e) => {
            warn!(flag, "{e}");
            None
        }
    }
}

/// Geographic extent in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl BoundingBox {
    pub fn new(lon_min: f64, lon_max: f64, lat_min: f64, lat_max: f64) -> Self {
        Self {
            lon_min,
            lon_max,
            lat_min,
            lat_max,
        }
    }

    /// Minimums widened with `Low`, maximums with `High`
    pub fn with_margin(&self) -> Self {
        Self {
            lon_min: MarginBound::Low.apply(self.lon_min),
            lon_max: MarginBound::High.apply(self.lon_max),
            lat_min: MarginBound::Low.apply(self.lat_min),
            lat_max: MarginBound::High.apply(self.lat_max),
        }
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        (self.lon_min..=self.lon_max).contains(&lon) && (self.lat_min..=self.lat_max).contains(&lat)
    }
}
