//! Interactive platform map
//!
//! Produces a self-contained HTML page backed by Leaflet and OpenStreetMap tiles:
//! one colour per platform, hover tooltips, wheel/box zoom, pan, a reset button,
//! an optional bounding-box overlay and a legend whose entries hide or show their
//! layer when clicked.

use super::escape_xml;
use crate::errors::Result;
use crate::filter::PositionTable;
use crate::geo::{reproject, BoundingBox, Crs};
use serde::Serialize;
use std::{fs, path::Path};
use tracing::info;

/// Marker colours, assigned to platforms in order and cycled
pub const PLATFORM_COLORS: [&str; 9] = [
    "blue", "red", "green", "orange", "purple", "gold", "cyan", "lime", "magenta",
];

const DEFAULT_SIZE: u32 = 500;
const MARKER_RADIUS: u32 = 4;

#[derive(Debug, Serialize)]
struct MapPoint {
    index_abs: usize,
    lat: f64,
    lon: f64,
    /// Coordinates as given, shown in the tooltip
    x: f64,
    y: f64,
}

#[derive(Debug, Serialize)]
struct MapLayer {
    label: String,
    platform: String,
    color: &'static str,
    points: Vec<MapPoint>,
}

#[derive(Debug, Serialize)]
struct MapOverlay {
    label: String,
    south: f64,
    west: f64,
    north: f64,
    east: f64,
}

#[derive(Debug, Serialize)]
struct MapPayload {
    bounds: [[f64; 2]; 2],
    radius: u32,
    layers: Vec<MapLayer>,
    bbox: Option<MapOverlay>,
}

/// Builder for the interactive position map
#[derive(Debug, Clone)]
pub struct InteractiveMap {
    title: String,
    positions: PositionTable,
    x_range: (f64, f64),
    y_range: (f64, f64),
    crs: Crs,
    bbox: Option<(String, BoundingBox)>,
    width: u32,
    height: u32,
}

impl InteractiveMap {
    /// A map of `positions` initially showing `x_range` (longitude / easting) and
    /// `y_range` (latitude / northing). Coordinates default to EPSG:4326.
    pub fn new(
        title: impl Into<String>,
        positions: &PositionTable,
        x_range: (f64, f64),
        y_range: (f64, f64),
    ) -> Self {
        Self {
            title: title.into(),
            positions: positions.clone(),
            x_range,
            y_range,
            crs: Crs::Epsg4326,
            bbox: None,
            width: DEFAULT_SIZE,
            height: DEFAULT_SIZE,
        }
    }

    /// CRS of the positions, ranges and bounding box
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = crs;
        self
    }

    /// Outline `bbox` (in the map's CRS) with `label` in the legend
    pub fn with_bbox(mut self, label: impl Into<String>, bbox: BoundingBox) -> Self {
        self.bbox = Some((label.into(), bbox));
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// (lat, lon) in degrees of a point given in the map's CRS
    fn to_latlon(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let (lon, lat) = reproject(self.crs, Crs::Epsg4326, y, x)?;
        Ok((lat, lon))
    }

    fn payload(&self) -> Result<MapPayload> {
        let (south, west) = self.to_latlon(self.x_range.0, self.y_range.0)?;
        let (north, east) = self.to_latlon(self.x_range.1, self.y_range.1)?;

        let mut layers = Vec::new();
        for (i, platform) in self.positions.platforms().into_iter().enumerate() {
            let mut points = Vec::new();
            for row in self.positions.rows_for(platform) {
                let (lat, lon) = self.to_latlon(row.lon, row.lat)?;
                points.push(MapPoint {
                    index_abs: row.index_abs,
                    lat,
                    lon,
                    x: row.lon,
                    y: row.lat,
                });
            }
            layers.push(MapLayer {
                label: format!("Platform {platform}"),
                platform: platform.to_string(),
                color: PLATFORM_COLORS[i % PLATFORM_COLORS.len()],
                points,
            });
        }

        let bbox = match &self.bbox {
            Some((label, b)) => {
                let (s, w) = self.to_latlon(b.lon_min, b.lat_min)?;
                let (n, e) = self.to_latlon(b.lon_max, b.lat_max)?;
                Some(MapOverlay {
                    label: label.clone(),
                    south: s,
                    west: w,
                    north: n,
                    east: e,
                })
            }
            None => None,
        };

        Ok(MapPayload {
            bounds: [[south, west], [north, east]],
            radius: MARKER_RADIUS,
            layers,
            bbox,
        })
    }

    /// Render the map as a standalone HTML page.
    pub fn to_html(&self) -> Result<String> {
        // keep "</script>" inside names from closing the script element
        let payload = serde_json::to_string(&self.payload()?)?.replace("</", "<\\/");
        Ok(PAGE_TEMPLATE
            .replace("__TITLE__", &escape_xml(&self.title))
            .replace("__WIDTH__", &self.width.to_string())
            .replace("__HEIGHT__", &self.height.to_string())
            .replace("__PAYLOAD__", &payload))
    }

    pub fn write_html(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_html()?)?;
        info!(path = %path.display(), platforms = self.positions.platforms().len(), "map written");
        Ok(())
    }
}

/// Write the interactive map of `positions` to `path`.
///
/// `bbox` is an optional labelled area drawn as an unfilled rectangle.
pub fn plot_interactive(
    positions: &PositionTable,
    title: &str,
    x_range: (f64, f64),
    y_range: (f64, f64),
    crs: Crs,
    bbox: Option<(&str, BoundingBox)>,
    path: &Path,
) -> Result<()> {
    let mut map = InteractiveMap::new(title, positions, x_range, y_range).with_crs(crs);
    if let Some((label, b)) = bbox {
        map = map.with_bbox(label, b);
    }
    map.write_html(path)
}

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>__TITLE__</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>
  body { font-family: sans-serif; }
  #map { width: __WIDTH__px; height: __HEIGHT__px; }
  .legend { background: white; padding: 6px 8px; border: 1px solid #999; font-size: 12px; }
  .legend-item { cursor: pointer; user-select: none; }
  .legend-item.hidden { opacity: 0.4; }
  .swatch { display: inline-block; width: 10px; height: 10px; margin-right: 6px;
            border: 2px solid; border-radius: 50%; background: white; }
  .reset { background: white; border: 1px solid #999; cursor: pointer; padding: 2px 6px; }
</style>
</head>
<body>
<h3>__TITLE__</h3>
<div id="map"></div>
<script>
const data = __PAYLOAD__;
const map = L.map('map', { scrollWheelZoom: true, boxZoom: true, dragging: true });
L.tileLayer('https://tile.openstreetmap.org/{z}/{x}/{y}.png', {
  maxZoom: 19,
  attribution: '&copy; OpenStreetMap contributors'
}).addTo(map);
map.fitBounds(data.bounds);

const Reset = L.Control.extend({
  options: { position: 'topleft' },
  onAdd: function () {
    const button = L.DomUtil.create('button', 'reset');
    button.textContent = 'Reset';
    L.DomEvent.on(button, 'click', function (e) {
      L.DomEvent.stop(e);
      map.fitBounds(data.bounds);
    });
    return button;
  }
});
map.addControl(new Reset());

const entries = [];
for (const layer of data.layers) {
  const group = L.layerGroup();
  for (const p of layer.points) {
    L.circleMarker([p.lat, p.lon], {
      radius: data.radius, color: layer.color, weight: 1.5,
      fillColor: 'white', fillOpacity: 1.0
    }).bindTooltip(
      'Index_ABS: ' + p.index_abs +
      '<br>(Long, Lat): (' + p.x + ', ' + p.y + ')' +
      '<br>Platform: ' + layer.platform
    ).addTo(group);
  }
  group.addTo(map);
  entries.push({ label: layer.label, color: layer.color, layer: group });
}

if (data.bbox) {
  const b = data.bbox;
  const rect = L.rectangle([[b.south, b.west], [b.north, b.east]], {
    color: 'black', weight: 1, fillColor: 'grey', fillOpacity: 0.0
  }).addTo(map);
  entries.push({ label: b.label, color: 'black', layer: rect });
}

const legend = L.control({ position: 'bottomright' });
legend.onAdd = function () {
  const div = L.DomUtil.create('div', 'legend');
  for (const entry of entries) {
    const item = L.DomUtil.create('div', 'legend-item', div);
    const swatch = L.DomUtil.create('span', 'swatch', item);
    swatch.style.borderColor = entry.color;
    item.appendChild(document.createTextNode(entry.label));
    L.DomEvent.on(item, 'click', function () {
      if (map.hasLayer(entry.layer)) {
        map.removeLayer(entry.layer);
        item.classList.add('hidden');
      } else {
        map.addLayer(entry.layer);
        item.classList.remove('hidden');
      }
    });
  }
  L.DomEvent.disableClickPropagation(div);
  return div;
};
legend.addTo(map);
</script>
</body>
</html>
"#;
