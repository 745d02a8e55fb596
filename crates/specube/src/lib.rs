//! Specube: masked spectral cubes and Stokes polarization cubes.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the specube sub-crates. Most users only need `specube` as a dependency.
//!
//! # Quick start
//!
//! ```rust
//! use ndarray::{ArrayD, IxDyn};
//! use specube::prelude::*;
//!
//! let wcs = CoordinateSystem::new(3).with_ctype(["RA---TAN", "DEC--TAN", "FREQ"]);
//! let shape = [4, 8, 8];
//! let cube = |value: f64| {
//!     SpectralCube::new(ArrayD::from_elem(IxDyn(&shape), value), wcs.clone()).unwrap()
//! };
//!
//! let stokes = StokesSpectralCube::from_cubes([("I", cube(1.0)), ("Q", cube(0.1))]).unwrap();
//!
//! // Keep only the first channel.
//! let mut keep = ArrayD::from_elem(IxDyn(&shape), false);
//! keep.index_axis_mut(ndarray::Axis(0), 0).fill(true);
//! let stokes = stokes.with_mask(keep, true).unwrap();
//!
//! let q = stokes.get_component("Q").unwrap();
//! let filled = q.filled_data(&View::all()).unwrap();
//! assert_eq!(filled[[0, 3, 3]], 0.1);
//! assert!(filled[[1, 3, 3]].is_nan());
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`core`] | `specube-core` | Coordinate systems, spectral units, Stokes names, errors |
//! | [`mask`] | `specube-mask` | Boolean, lazy and composite masks; array views |
//! | [`cube`] | `specube-cube` | `SpectralCube` and `StokesSpectralCube` |
//! | [`io`] | `specube-io` | Format adapters, reading and writing |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Coordinate systems, spectral units and shared errors (`specube-core`).
///
/// [`core::check_equality`] is the tolerance-based coordinate comparison
/// used everywhere cubes must agree.
pub use specube_core as core;

/// Validity masks and array views (`specube-mask`).
///
/// [`mask::Mask`] composes [`mask::BooleanArrayMask`] and
/// [`mask::LazyMask`] leaves without materializing them.
pub use specube_mask as mask;

/// Cube containers (`specube-cube`).
pub use specube_cube as cube;

/// Reading and writing (`specube-io`).
///
/// [`io::read`] picks a format adapter from the file name;
/// [`io::FormatRegistry`] accepts custom adapters.
pub use specube_io as io;

/// Common imports for typical specube usage.
///
/// ```rust
/// use specube::prelude::*;
/// ```
pub mod prelude {
    // Coordinates and units
    pub use specube_core::{
        check_equality, CoordinateSystem, SpectralUnit, SpectralUnitOptions, StokesParameter,
        VelocityConvention,
    };

    // Errors
    pub use specube_core::{CubeError, Result};

    // Masks
    pub use specube_mask::{BooleanArrayMask, LazyMask, Mask, View};

    // Cubes
    pub use specube_cube::{SpectralCube, StokesSpectralCube};

    // I/O
    pub use specube_io::{read, read_stokes, LoadedCube, ReadOptions, WriteCube, WriteOptions};
}
