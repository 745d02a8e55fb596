//! Import of CASA image coordinate systems.
//!
//! A CASA `coordsys` record describes each axis by a human-readable name
//! (`"Right Ascension"`, `"Frequency"`, ...) and carries reference pixel,
//! increment and reference value as tagged vectors. [`import_casa_coordsys`]
//! turns such a record into a FITS-style [`CoordinateSystem`].

use serde::{Deserialize, Serialize};
use specube_core::{CoordinateSystem, CubeError, Result};

/// CASA axis name → FITS `CTYPE` prefix.
pub const AXIS_TYPES: &[(&str, &str)] = &[
    ("Right Ascension", "RA--"),
    ("Declination", "DEC-"),
    ("Longitude", "GLON"),
    ("Latitude", "GLAT"),
    ("Frequency", "FREQ"),
    ("Stokes", "STOKES"),
];

/// A numeric vector tagged with how its values are expressed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaggedVector {
    /// `"absolute"` or `"relative"`.
    pub ar_type: String,
    /// `"pixel"` or `"world"`.
    pub pw_type: String,
    /// One value per axis, in coordinate order.
    pub numeric: Vec<f64>,
}

impl TaggedVector {
    /// An absolute vector with the given pixel/world tag.
    pub fn absolute(pw_type: &str, numeric: Vec<f64>) -> Self {
        Self {
            ar_type: "absolute".to_string(),
            pw_type: pw_type.to_string(),
            numeric,
        }
    }

    fn require(&self, pw_type: &str) -> Result<&[f64]> {
        if self.ar_type != "absolute" {
            return Err(CubeError::UnexpectedCoordinateTag {
                tag: "ar_type",
                value: self.ar_type.clone(),
            });
        }
        if self.pw_type != pw_type {
            return Err(CubeError::UnexpectedCoordinateTag {
                tag: "pw_type",
                value: self.pw_type.clone(),
            });
        }
        Ok(&self.numeric)
    }
}

/// The parts of a CASA coordinate-system record needed for import.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CasaCoordSys {
    /// Reference pixel; must be absolute pixel values.
    pub reference_pixel: TaggedVector,
    /// Pixel increment; must be absolute world values.
    pub increment: TaggedVector,
    /// Reference value; must be absolute world values.
    pub reference_value: TaggedVector,
    /// Unit per axis.
    pub units: Vec<String>,
    /// Axis name per axis, e.g. `"Right Ascension"`.
    pub names: Vec<String>,
    /// Coordinate type per axis, e.g. `"Direction"`, `"Spectral"`.
    pub axis_coordinate_types: Vec<String>,
    /// Celestial projection code, e.g. `"SIN"`.
    pub projection: String,
}

/// Look up the FITS `CTYPE` prefix for a CASA axis name.
pub fn axis_type(name: &str) -> Option<&'static str> {
    AXIS_TYPES
        .iter()
        .find(|(casa, _)| *casa == name)
        .map(|(_, fits)| *fits)
}

/// Projection suffix: the code right-aligned in four characters, padded
/// with `-`. `"SIN"` becomes `"-SIN"`.
pub fn projection_suffix(projection: &str) -> String {
    format!("{projection:>4}").replace(' ', "-")
}

/// Convert a CASA coordinate-system record into a [`CoordinateSystem`].
///
/// Reference pixels are taken as stored.
///
/// # Errors
///
/// - [`CubeError::UnexpectedCoordinateTag`] if a vector is not absolute or
///   has the wrong pixel/world tag.
/// - [`CubeError::UnknownAxisName`] for an axis name outside
///   [`AXIS_TYPES`].
/// - [`CubeError::AxisCount`] if the per-axis vectors differ in length.
pub fn import_casa_coordsys(cs: &CasaCoordSys) -> Result<CoordinateSystem> {
    let crpix = cs.reference_pixel.require("pixel")?.to_vec();
    let cdelt = cs.increment.require("world")?.to_vec();
    let crval = cs.reference_value.require("world")?.to_vec();

    let mut ctype = Vec::with_capacity(cs.names.len());
    for (i, name) in cs.names.iter().enumerate() {
        let prefix = axis_type(name).ok_or_else(|| CubeError::UnknownAxisName { name: name.clone() })?;
        let mut code = prefix.to_string();
        if cs.axis_coordinate_types.get(i).map(String::as_str) == Some("Direction") {
            code.push_str(&projection_suffix(&cs.projection));
        }
        ctype.push(code);
    }

    let wcs = CoordinateSystem::from_parts(crpix, crval, cdelt, ctype, cs.units.clone())?;
    tracing::debug!(ctype = ?wcs.ctype(), "imported CASA coordinate system");
    Ok(wcs)
}
