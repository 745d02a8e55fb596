//! Masked spectral cubes.
//!
//! [`SpectralCube`] is a single data cube with a world coordinate system
//! and an optional validity mask. [`StokesSpectralCube`] groups several
//! such cubes under polarization keys and layers a shared mask over them.
//!
//! Both types are immutable: masking, unit conversion and fill-value
//! changes return new values that share the backing arrays.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod spectral_cube;
pub mod stokes_cube;

pub use spectral_cube::{MaskInput, Metadata, SpectralAxisValues, SpectralCube, SpectralCubeBuilder};
pub use stokes_cube::{ComponentValue, StokesSpectralCube, StokesSpectralCubeBuilder};
