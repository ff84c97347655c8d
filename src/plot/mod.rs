//! Static and interactive plots
//!
//! # Organization
//!
//! - [`static_plot`]: SVG line plots and heatmaps of one variable, PNG rasterization
//! - [`interactive`]: browser map of platform positions (Leaflet + OpenStreetMap)

pub mod interactive;
pub mod static_plot;

pub use interactive::{plot_interactive, InteractiveMap, PLATFORM_COLORS};
pub use static_plot::{plot_merged_platforms, plot_variable, render_png, variable_svg};

/// Escape text for inclusion in SVG/HTML markup
pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
