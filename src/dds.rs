//! Dimension discovery from OPeNDAP DDS documents
//!
//! A DDS (Dataset Descriptor Structure) lists every array of a dataset together
//! with its shape, written as bracketed declarations after the array name:
//!
//! ```text
//! Dataset {
//!     Float64 TIME[TIME = 8760];
//!     Grid {
//!      ARRAY:
//!         Float32 TEMP[TIME = 8760][DEPTH = 20];
//!      MAPS:
//!         Float64 TIME[TIME = 8760];
//!         Float32 DEPTH[DEPTH = 20];
//!     } TEMP;
//! } ...;
//! ```
//!
//! # Declaration grammar
//!
//! ```text
//! declaration := "[" ws name ws "=" ws size ws "]"
//! name        := ( letter | "_" ) { letter | digit | "_" | "." | "-" }
//! size        := digit { digit }
//! ```
//!
//! Any other bracketed text (constraint slices such as `[0:1:5]`, prose) is
//! ignored. Identical declarations collapse into one, because a dimension is
//! repeated on every array that uses it.
//!
//! The discovered values are *maximum valid indices* (`size - 1`), which is what
//! an OPeNDAP hyperslab `NAME[start:stride:stop]` expects as its inclusive stop.

use crate::data_source::DocumentSource;
use crate::errors::{DdsError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use tracing::debug;

/// Dimension names looked up in every DDS document, in mapping order
pub const DDS_DIMENSIONS: [&str; 4] = ["TIME", "LATITUDE", "LONGITUDE", "DEPTH"];

lazy_static! {
    static ref DECLARATION: Regex =
        Regex::new(r"\[\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*=\s*(\d+)\s*\]").unwrap();
}

/// One `[NAME = SIZE]` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionDeclaration {
    pub name: String,
    pub size: usize,
}

/// Insertion-ordered mapping from dimension name to its last valid index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionSizes {
    entries: Vec<(String, usize)>,
}

impl DimensionSizes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the last valid index of `name`, keeping its original position if present
    pub fn insert(&mut self, name: impl Into<String>, max_index: usize) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = max_index,
            None => self.entries.push((name, max_index)),
        }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, max)| *max)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(n, max)| (n.as_str(), *max))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for DimensionSizes {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        let mut sizes = Self::new();
        for (name, max) in iter {
            sizes.insert(name, max);
        }
        sizes
    }
}

impl fmt::Display for DimensionSizes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(name, max)| format!("{name}={max}"))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Extract the unique dimension declarations of a DDS document, in order of first appearance.
pub fn parse_declarations(text: &str) -> Vec<DimensionDeclaration> {
    let mut declarations: Vec<DimensionDeclaration> = Vec::new();

    for caps in DECLARATION.captures_iter(text) {
        // sizes that overflow usize cannot describe a real array
        let Ok(size) = caps[2].parse::<usize>() else {
            debug!(declaration = &caps[0], "skipping oversized declaration");
            continue;
        };
        let declaration = DimensionDeclaration {
            name: caps[1].to_string(),
            size,
        };
        if !declarations.contains(&declaration) {
            declarations.push(declaration);
        }
    }

    debug!(count = declarations.len(), "parsed DDS declarations");
    declarations
}

/// Find the last valid index of `name` among `declarations`.
///
/// # Errors
///
/// Fails when `name` is not declared, is declared with conflicting sizes, or has size 0.
pub fn find_dimension(declarations: &[DimensionDeclaration], name: &str) -> Result<usize> {
    let matches: Vec<&DimensionDeclaration> =
        declarations.iter().filter(|d| d.name == name).collect();

    match matches.as_slice() {
        [] => Err(DdsError::DimensionNotFound(name.to_string()).into()),
        [single] => single
            .size
            .checked_sub(1)
            .ok_or_else(|| DdsError::EmptyDimension(name.to_string()).into()),
        many => Err(DdsError::AmbiguousDimension {
            name: name.to_string(),
            count: many.len(),
        }
        .into()),
    }
}

/// Parse a DDS document into the last valid index of TIME, LATITUDE, LONGITUDE and DEPTH.
///
/// # Errors
///
/// A missing, ambiguous or empty dimension fails the whole document; no partial
/// mapping is returned.
pub fn parse_dds(text: &str) -> Result<DimensionSizes> {
    let declarations = parse_declarations(text);

    let mut sizes = DimensionSizes::new();
    for name in DDS_DIMENSIONS {
        sizes.insert(name, find_dimension(&declarations, name)?);
    }
    Ok(sizes)
}

/// Fetch the DDS document at `url` and discover its dimension sizes.
///
/// # Errors
///
/// Returns an error if the document cannot be fetched or fails [`parse_dds`].
pub async fn retrieve_dds_info<S>(source: &S, url: &str) -> Result<DimensionSizes>
where
    S: DocumentSource + ?Sized,
{
    let text = source.fetch_text(url).await?;
    let sizes = parse_dds(&text)?;
    debug!(url, %sizes, "discovered dimensions");
    Ok(sizes)
}

/// Build the `NAME[0:1:MAX]` query fragment for every entry of `sizes` named in `keys`.
///
/// Entries keep the mapping's order; the order of `keys` is irrelevant.
pub fn query_string<K: AsRef<str>>(sizes: &DimensionSizes, keys: &[K]) -> String {
    sizes
        .iter()
        .filter(|(name, _)| keys.iter().any(|k| k.as_ref() == *name))
        .map(|(name, max)| format!("{name}{}", index_range(0, max)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Format a hyperslab range `[start:1:stop]` (stride is always 1).
pub fn index_range(start: usize, stop: usize) -> String {
    format!("[{start}:1:{stop}]")
}

/// Append a constraint expression to a dataset URL.
///
/// Without variables the expression is the plain [`query_string`]. With variables
/// every variable is followed by the ranges of the selected dimensions, e.g.
/// `url?TEMP[0:1:5][0:1:3],PSAL[0:1:5][0:1:3]`.
pub fn fetch_url<V, K>(
    dataset_url: &str,
    variables: &[V],
    sizes: &DimensionSizes,
    keys: &[K],
) -> String
where
    V: AsRef<str>,
    K: AsRef<str>,
{
    let constraint = if variables.is_empty() {
        query_string(sizes, keys)
    } else {
        let ranges: String = sizes
            .iter()
            .filter(|(name, _)| keys.iter().any(|k| k.as_ref() == *name))
            .map(|(_, max)| index_range(0, max))
            .collect();
        variables
            .iter()
            .map(|v| format!("{}{ranges}", v.as_ref()))
            .collect::<Vec<_>>()
            .join(",")
    };

    if constraint.is_empty() {
        dataset_url.to_string()
    } else {
        format!("{dataset_url}?{constraint}")
    }
}
