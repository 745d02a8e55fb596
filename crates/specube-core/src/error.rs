//! Error types for cube construction, mask composition, and format I/O.
//!
//! Every fallible operation in the workspace returns [`CubeError`]. Variants
//! are grouped by subsystem: construction/validation, spectral units,
//! coordinate import, and I/O.

use std::path::PathBuf;

use crate::shape::ShapeDisplay;
use crate::stokes::VALID_STOKES_LIST;

/// Shorthand result type used across the workspace.
pub type Result<T> = std::result::Result<T, CubeError>;

/// Errors arising from cube, mask, coordinate, or format operations.
#[derive(Debug, thiserror::Error)]
pub enum CubeError {
    // ── Construction and validation ─────────────────────────────────
    /// Input to a multi-component cube is empty or not made of cubes.
    #[error("{reason}")]
    Construction {
        /// What was wrong with the input.
        reason: String,
    },

    /// Two coordinate systems that must agree do not.
    #[error("{context}")]
    CoordinateMismatch {
        /// Description of where the mismatch was detected.
        context: String,
    },

    /// A Stokes component key outside the fixed valid set.
    #[error("Invalid Stokes component: {key} - should be one of {}", VALID_STOKES_LIST)]
    InvalidComponentKey {
        /// The offending key.
        key: String,
    },

    /// Component shapes differ from the reference component.
    #[error(
        "All spectral cubes should have the same shape: {} vs {}",
        ShapeDisplay(.found),
        ShapeDisplay(.expected)
    )]
    ShapeMismatch {
        /// Shape of the reference component.
        expected: Vec<usize>,
        /// Shape of the offending component.
        found: Vec<usize>,
    },

    /// A mask cannot be broadcast onto the data it is applied to.
    #[error(
        "Mask shape is not broadcastable to data shape: {} vs {}",
        ShapeDisplay(.mask),
        ShapeDisplay(.data)
    )]
    MaskShape {
        /// Shape of the mask.
        mask: Vec<usize>,
        /// Shape of the data.
        data: Vec<usize>,
    },

    /// Two masks cannot be combined because their shapes do not broadcast.
    #[error(
        "Mask shapes are not mutually broadcastable: {} vs {}",
        ShapeDisplay(.left),
        ShapeDisplay(.right)
    )]
    MaskBroadcast {
        /// Shape of the left operand.
        left: Vec<usize>,
        /// Shape of the right operand.
        right: Vec<usize>,
    },

    /// Array dimensionality disagrees with the coordinate system.
    #[error("data has {data_ndim} dimensions but the coordinate system has {wcs_naxis} axes")]
    DimensionMismatch {
        /// Number of array dimensions.
        data_ndim: usize,
        /// Number of coordinate axes.
        wcs_naxis: usize,
    },

    /// Coordinate-system vectors of differing lengths.
    #[error("coordinate system attribute '{attribute}' has {found} entries, expected {expected}")]
    AxisCount {
        /// Which attribute was malformed.
        attribute: &'static str,
        /// Required length.
        expected: usize,
        /// Actual length.
        found: usize,
    },

    /// A region selection that does not fit the array it is applied to.
    #[error("invalid view: {reason}")]
    InvalidView {
        /// What was wrong with the selection.
        reason: String,
    },

    /// Component lookup for a key that is not present.
    #[error("StokesSpectralCube has no component {key}")]
    NoSuchComponent {
        /// The requested key.
        key: String,
    },

    // ── Capability ──────────────────────────────────────────────────
    /// An external library or tool required by a format adapter is unavailable.
    #[error("{capability}")]
    MissingCapability {
        /// Description of the missing capability.
        capability: String,
    },

    /// The requested operation is not supported for this object.
    #[error("{operation} is not supported")]
    UnsupportedOperation {
        /// The operation that was requested.
        operation: String,
    },

    // ── Spectral units ──────────────────────────────────────────────
    /// A unit string that is not a recognised spectral unit.
    #[error("unknown spectral unit '{unit}'")]
    UnknownUnit {
        /// The unparseable unit string.
        unit: String,
    },

    /// A unit that is recognised but not usable in this context.
    #[error("unit '{unit}' is not valid for {context}")]
    IncompatibleUnit {
        /// The unit in question.
        unit: String,
        /// Where it was used.
        context: String,
    },

    /// Conversion to or from velocity needs a rest frequency or wavelength.
    #[error("a rest frequency or wavelength is required to convert between {from} and {to}")]
    MissingRestValue {
        /// Source physical type.
        from: &'static str,
        /// Target physical type.
        to: &'static str,
    },

    /// Conversion to velocity needs a Doppler convention.
    #[error("a velocity convention (radio, optical, relativistic) is required to convert to {unit}")]
    MissingVelocityConvention {
        /// The requested velocity unit.
        unit: String,
    },

    /// The coordinate system has no spectral axis.
    #[error("coordinate system has no spectral axis (ctype = {ctype:?})")]
    NoSpectralAxis {
        /// Axis types that were inspected.
        ctype: Vec<String>,
    },

    /// A spectral conversion produced a non-finite reference or increment.
    #[error("spectral conversion produced a non-finite value for {what}")]
    NonFiniteSpectral {
        /// Which quantity went non-finite.
        what: &'static str,
    },

    // ── Foreign coordinate import ───────────────────────────────────
    /// A tagged coordinate vector carries an unexpected tag.
    #[error("Unexpected {tag}: {value}")]
    UnexpectedCoordinateTag {
        /// Tag name (`ar_type` or `pw_type`).
        tag: &'static str,
        /// The tag value that was found.
        value: String,
    },

    /// An axis name missing from the axis-type table.
    #[error("Don't know how to convert: {name}")]
    UnknownAxisName {
        /// The unknown axis name.
        name: String,
    },

    // ── I/O ─────────────────────────────────────────────────────────
    /// No adapter is registered for the requested or detected format.
    #[error("no format adapter for {target}")]
    UnknownFormat {
        /// Format name or path that could not be resolved.
        target: String,
    },

    /// An image selector cannot name any image.
    #[error("invalid image selection: {reason}")]
    InvalidSelection {
        /// What was wrong with the selector.
        reason: String,
    },

    /// Destination exists and overwriting was not requested.
    #[error("file {} already exists and overwrite is false", .path.display())]
    FileExists {
        /// The destination path.
        path: PathBuf,
    },

    /// A file parsed but its contents violate the format's rules.
    #[error("malformed file {}: {reason}", .path.display())]
    MalformedFile {
        /// Offending file.
        path: PathBuf,
        /// What was wrong.
        reason: String,
    },

    /// Underlying filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CubeError {
    /// Whether this error belongs to the value-validation family
    /// (coordinate, key, shape, or mask-shape mismatches).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::CoordinateMismatch { .. }
                | Self::InvalidComponentKey { .. }
                | Self::ShapeMismatch { .. }
                | Self::MaskShape { .. }
                | Self::MaskBroadcast { .. }
                | Self::DimensionMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_key_message_lists_valid_set() {
        let err = CubeError::InvalidComponentKey { key: "BANANA".into() };
        assert_eq!(
            err.to_string(),
            "Invalid Stokes component: BANANA - should be one of I, Q, U, V, RR, LL, RL, LR"
        );
    }

    #[test]
    fn mask_shape_message_uses_tuple_rendering() {
        let err = CubeError::MaskShape {
            mask: vec![5, 20, 15],
            data: vec![5, 20, 30],
        };
        assert_eq!(
            err.to_string(),
            "Mask shape is not broadcastable to data shape: (5, 20, 15) vs (5, 20, 30)"
        );
    }

    #[test]
    fn shape_mismatch_reports_both_shapes() {
        let err = CubeError::ShapeMismatch {
            expected: vec![5, 20, 30],
            found: vec![6, 2, 30],
        };
        let msg = err.to_string();
        assert!(msg.contains("(6, 2, 30)"));
        assert!(msg.contains("(5, 20, 30)"));
        assert!(err.is_validation());
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CubeError = io.into();
        assert!(matches!(err, CubeError::Io(_)));
        assert!(!err.is_validation());
    }
}
