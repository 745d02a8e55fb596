//! Core types for the specube spectral-cube workspace.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by masks, cubes and format adapters: the error
//! taxonomy, array shapes and broadcasting, world coordinate systems and
//! their equality, the Stokes component set, and spectral units.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod shape;
pub mod stokes;
pub mod units;
pub mod wcs;

pub use error::{CubeError, Result};
pub use shape::{broadcast_shapes, is_broadcastable_and_smaller, Shape, ShapeDisplay};
pub use stokes::{is_valid_stokes, StokesParameter, VALID_STOKES};
pub use units::{
    RestValue, SpectralKind, SpectralType, SpectralUnit, SpectralUnitOptions, VelocityConvention,
};
pub use wcs::{check_equality, CoordinateSystem, WCS_TOLERANCE};
