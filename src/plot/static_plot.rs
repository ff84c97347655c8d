//! SVG plots of a single variable
//!
//! 1-D variables are drawn as a line (gaps at NaN), 2-D variables as a heatmap
//! with the first dimension on the y axis and the second on the x axis, NaN
//! cells left transparent. Higher-dimensional variables must be filtered or
//! merged down first.

use super::escape_xml;
use crate::dataset::{DataCatalog, Variable};
use crate::errors::{OceanDapError, Result};
use crate::filter::merge_platforms;
use chrono::Utc;
use std::fmt::{self, Write as _};
use std::{fs, path::Path};
use tracing::info;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 480.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 100.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 50.0;

const PLOT_W: f64 = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
const PLOT_H: f64 = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

/// Viridis stops, low to high
const GRADIENT: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

const LINE_COLOR: &str = "#1f77b4";
const COLORBAR_STEPS: usize = 32;

/// Colour for a value normalised to `[0, 1]`
fn gradient_color(t: f64) -> String {
    let t = t.clamp(0.0, 1.0) * (GRADIENT.len() - 1) as f64;
    let i = (t.floor() as usize).min(GRADIENT.len() - 2);
    let frac = t - i as f64;
    let (r0, g0, b0) = GRADIENT[i];
    let (r1, g1, b1) = GRADIENT[i + 1];
    let lerp = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * frac).round() as u8;
    format!("#{:02x}{:02x}{:02x}", lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

/// Min and max of the finite values, widened when they coincide
fn value_range(values: impl Iterator<Item = f32>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .map(f64::from)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return None;
    }
    if lo == hi {
        return Some((lo - 0.5, hi + 0.5));
    }
    Some((lo, hi))
}

fn format_value(v: f64) -> String {
    let a = v.abs();
    if a != 0.0 && !(0.01..10_000.0).contains(&a) {
        format!("{v:.2e}")
    } else {
        format!("{v:.2}")
    }
}

fn write_header(svg: &mut String, title: &str) -> fmt::Result {
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif" font-size="12">"#
    )?;
    writeln!(
        svg,
        "<desc>Created by oceandap on {}</desc>",
        Utc::now().to_rfc3339()
    )?;
    writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
    writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="16">{}</text>"#,
        WIDTH / 2.0,
        MARGIN_TOP / 2.0 + 6.0,
        escape_xml(title)
    )
}

fn write_frame(svg: &mut String, x_label: &str, y_label: &str) -> fmt::Result {
    writeln!(
        svg,
        r#"<rect x="{MARGIN_LEFT}" y="{MARGIN_TOP}" width="{PLOT_W}" height="{PLOT_H}" fill="none" stroke="black"/>"#
    )?;
    writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle">{}</text>"#,
        MARGIN_LEFT + PLOT_W / 2.0,
        HEIGHT - 12.0,
        escape_xml(x_label)
    )?;
    let (cx, cy) = (18.0, MARGIN_TOP + PLOT_H / 2.0);
    writeln!(
        svg,
        r#"<text x="{cx}" y="{cy}" text-anchor="middle" transform="rotate(-90 {cx} {cy})">{}</text>"#,
        escape_xml(y_label)
    )
}

fn write_tick(svg: &mut String, x: f64, y: f64, anchor: &str, label: &str) -> fmt::Result {
    writeln!(
        svg,
        r#"<text x="{x:.1}" y="{y:.1}" text-anchor="{anchor}" font-size="10">{}</text>"#,
        escape_xml(label)
    )
}

fn write_no_data(svg: &mut String) -> fmt::Result {
    writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle" fill="grey">no finite values</text>"#,
        MARGIN_LEFT + PLOT_W / 2.0,
        MARGIN_TOP + PLOT_H / 2.0
    )
}

fn write_line(svg: &mut String, variable: &Variable) -> fmt::Result {
    let values: Vec<f32> = variable.data.iter().copied().collect();
    write_frame(svg, &variable.dimensions[0], &variable.name)?;

    let Some((lo, hi)) = value_range(values.iter().copied()) else {
        return write_no_data(svg);
    };

    let n = values.len();
    let step = PLOT_W / (n.max(2) - 1) as f64;
    let y_of = |v: f64| MARGIN_TOP + PLOT_H - (v - lo) / (hi - lo) * PLOT_H;

    let mut path = String::new();
    let mut pen_down = false;
    for (i, v) in values.iter().enumerate() {
        if !v.is_finite() {
            pen_down = false;
            continue;
        }
        let cmd = if pen_down { 'L' } else { 'M' };
        write!(path, "{cmd}{:.2},{:.2} ", MARGIN_LEFT + i as f64 * step, y_of(f64::from(*v)))?;
        pen_down = true;
    }
    writeln!(
        svg,
        r#"<path d="{}" fill="none" stroke="{LINE_COLOR}" stroke-width="1.5"/>"#,
        path.trim_end()
    )?;

    let bottom = MARGIN_TOP + PLOT_H;
    write_tick(svg, MARGIN_LEFT - 4.0, bottom, "end", &format_value(lo))?;
    write_tick(svg, MARGIN_LEFT - 4.0, MARGIN_TOP + 10.0, "end", &format_value(hi))?;
    write_tick(svg, MARGIN_LEFT, bottom + 14.0, "middle", "0")?;
    write_tick(
        svg,
        MARGIN_LEFT + PLOT_W,
        bottom + 14.0,
        "middle",
        &(n.saturating_sub(1)).to_string(),
    )
}

fn write_heatmap(svg: &mut String, variable: &Variable) -> fmt::Result {
    let (rows, cols) = (variable.shape()[0], variable.shape()[1]);
    write_frame(svg, &variable.dimensions[1], &variable.dimensions[0])?;

    let Some((lo, hi)) = value_range(variable.data.iter().copied()) else {
        return write_no_data(svg);
    };

    let cell_w = PLOT_W / cols as f64;
    let cell_h = PLOT_H / rows as f64;
    for ((r, c), v) in variable
        .data
        .indexed_iter()
        .map(|(idx, v)| ((idx[0], idx[1]), *v))
    {
        if !v.is_finite() {
            continue;
        }
        // row 0 at the bottom
        let x = MARGIN_LEFT + c as f64 * cell_w;
        let y = MARGIN_TOP + PLOT_H - (r + 1) as f64 * cell_h;
        writeln!(
            svg,
            r#"<rect x="{x:.2}" y="{y:.2}" width="{:.2}" height="{:.2}" fill="{}"/>"#,
            cell_w + 0.05,
            cell_h + 0.05,
            gradient_color((f64::from(v) - lo) / (hi - lo))
        )?;
    }

    let bottom = MARGIN_TOP + PLOT_H;
    write_tick(svg, MARGIN_LEFT - 4.0, bottom, "end", "0")?;
    write_tick(svg, MARGIN_LEFT - 4.0, MARGIN_TOP + 10.0, "end", &(rows - 1).to_string())?;
    write_tick(svg, MARGIN_LEFT, bottom + 14.0, "middle", "0")?;
    write_tick(svg, MARGIN_LEFT + PLOT_W, bottom + 14.0, "middle", &(cols - 1).to_string())?;

    // colour bar
    let bar_x = MARGIN_LEFT + PLOT_W + 20.0;
    let step_h = PLOT_H / COLORBAR_STEPS as f64;
    for i in 0..COLORBAR_STEPS {
        let t = (i as f64 + 0.5) / COLORBAR_STEPS as f64;
        writeln!(
            svg,
            r#"<rect x="{bar_x}" y="{:.2}" width="16" height="{:.2}" fill="{}"/>"#,
            MARGIN_TOP + PLOT_H - (i + 1) as f64 * step_h,
            step_h + 0.05,
            gradient_color(t)
        )?;
    }
    write_tick(svg, bar_x + 20.0, bottom, "start", &format_value(lo))?;
    write_tick(svg, bar_x + 20.0, MARGIN_TOP + 10.0, "start", &format_value(hi))?;
    write_tick(svg, bar_x + 8.0, MARGIN_TOP - 6.0, "middle", &variable.name)
}

/// Render `variable` as an SVG document.
///
/// # Errors
///
/// Fails for variables that are not 1-D or 2-D, or have an empty axis.
pub fn variable_svg(variable: &Variable, title: &str) -> Result<String> {
    let ndim = variable.data.ndim();
    if !(1..=2).contains(&ndim) {
        return Err(OceanDapError::Plot(format!(
            "cannot plot '{}' with {ndim} dimensions; filter or merge it to 1 or 2",
            variable.name
        )));
    }
    if variable.data.is_empty() {
        return Err(OceanDapError::Plot(format!(
            "cannot plot '{}' with shape {:?}",
            variable.name,
            variable.shape()
        )));
    }

    let mut svg = String::new();
    let drawn = write_header(&mut svg, title).and_then(|_| {
        if ndim == 1 {
            write_line(&mut svg, variable)
        } else {
            write_heatmap(&mut svg, variable)
        }
    });
    drawn.map_err(|e| OceanDapError::Plot(e.to_string()))?;
    svg.push_str("</svg>\n");
    Ok(svg)
}

/// Plot `variable` to an SVG file at `path`.
pub fn plot_variable(variable: &Variable, title: &str, path: &Path) -> Result<()> {
    let svg = variable_svg(variable, title)?;
    fs::write(path, svg)?;
    info!(variable = %variable.name, path = %path.display(), "plot written");
    Ok(())
}

/// Merge `variable` across `platforms` along TIME and plot it to `path`.
pub fn plot_merged_platforms<S: AsRef<str>>(
    catalog: &DataCatalog,
    platforms: &[S],
    variable: &str,
    title: &str,
    path: &Path,
) -> Result<()> {
    let merged = merge_platforms(catalog, platforms, variable)?;
    plot_variable(&merged, title, path)
}

/// Rasterize an SVG document to a PNG file at its natural size.
///
/// Text is only drawn when fonts are available to the renderer.
pub fn render_png(svg: &str, path: &Path) -> Result<()> {
    let opt = usvg::Options::default();
    let tree =
        usvg::Tree::from_str(svg, &opt).map_err(|e| OceanDapError::Plot(e.to_string()))?;

    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| OceanDapError::Plot(format!("invalid image size {size:?}")))?;
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

    let png = pixmap
        .encode_png()
        .map_err(|e| OceanDapError::Plot(e.to_string()))?;
    fs::write(path, png)?;
    info!(path = %path.display(), "png written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_endpoints_match_stops() {
        assert_eq!(gradient_color(0.0), "#440154");
        assert_eq!(gradient_color(1.0), "#fde725");
        assert_eq!(gradient_color(-3.0), "#440154");
    }

    #[test]
    fn value_range_skips_nan_and_widens_constants() {
        let range = value_range([f32::NAN, 2.0, 5.0].into_iter());
        assert_eq!(range, Some((2.0, 5.0)));
        assert_eq!(value_range([3.0f32].into_iter()), Some((2.5, 3.5)));
        assert_eq!(value_range([f32::NAN].into_iter()), None);
    }
}
