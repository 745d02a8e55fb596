//! Reading and writing specube cubes.
//!
//! Format adapters ([`FormatAdapter`]) turn files into canonical arrays
//! ([`RawImage`]); this crate then assembles them into
//! [`SpectralCube`]s or [`StokesSpectralCube`]s. Two adapters ship by
//! default:
//!
//! - `native`: JSON documents ending in `.cube.json` (read and write).
//! - `casa_image`: CASA `.image` directories, read through an
//!   [`ImageTool`] supplied by the caller.
//!
//! ```no_run
//! use specube_io::{read, LoadedCube, ReadOptions};
//!
//! match read("m51.cube.json", &ReadOptions::default())? {
//!     LoadedCube::Spectral(cube) => println!("{:?}", cube.shape()),
//!     LoadedCube::Stokes(cube) => println!("{:?}", cube.components()),
//! }
//! # Ok::<(), specube_core::CubeError>(())
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod axes;
pub mod casa;
pub mod config;
pub mod coordsys;
pub mod native;
pub mod registry;

use std::path::Path;

use indexmap::IndexMap;
use specube_core::Result;
use specube_cube::{ComponentValue, SpectralCube, StokesSpectralCube};
use specube_mask::{LazyMask, Mask, View};

pub use axes::{drop_degenerate, orient, split_stokes};
pub use casa::{CasaImageAdapter, ImageTool, ImageToolFactory, MISSING_CASA};
pub use config::{HduSelector, ReadOptions, WriteOptions};
pub use coordsys::{import_casa_coordsys, CasaCoordSys, TaggedVector, AXIS_TYPES};
pub use native::NativeAdapter;
pub use registry::{FormatAdapter, FormatRegistry, RawCube, RawImage};

/// Result of a generic read: the file decides which kind of cube it holds.
#[derive(Clone, Debug)]
pub enum LoadedCube {
    /// A single-component cube.
    Spectral(SpectralCube),
    /// A cube with polarization components.
    Stokes(StokesSpectralCube),
}

impl LoadedCube {
    /// The single-component cube, if that is what was read.
    pub fn into_spectral(self) -> Option<SpectralCube> {
        match self {
            Self::Spectral(cube) => Some(cube),
            Self::Stokes(_) => None,
        }
    }

    /// The result as a Stokes cube; a single cube becomes component `I`.
    pub fn into_stokes(self) -> Result<StokesSpectralCube> {
        match self {
            Self::Spectral(cube) => StokesSpectralCube::from_cubes([("I", cube)]),
            Self::Stokes(cube) => Ok(cube),
        }
    }
}

/// Read `path` with the default registry.
pub fn read(path: impl AsRef<Path>, options: &ReadOptions) -> Result<LoadedCube> {
    read_with(&FormatRegistry::default(), path, options)
}

/// Read `path` as a Stokes cube; single cubes are wrapped as `{I: cube}`.
pub fn read_stokes(path: impl AsRef<Path>, options: &ReadOptions) -> Result<StokesSpectralCube> {
    read(path, options)?.into_stokes()
}

/// Read `path` through `registry`.
pub fn read_with(
    registry: &FormatRegistry,
    path: impl AsRef<Path>,
    options: &ReadOptions,
) -> Result<LoadedCube> {
    let path = path.as_ref();
    options.validate()?;
    let adapter = registry.resolve(path, options.format.as_deref())?;
    tracing::info!(path = %path.display(), format = adapter.name(), "reading cube");
    assemble(adapter.read(path, options)?)
}

/// Build cubes from an adapter's output.
///
/// Single images get their stored validity as a boolean mask. Polarized
/// components get a finite-sample mask, AND-ed with their stored validity
/// plane when there is one.
pub fn assemble(image: RawImage) -> Result<LoadedCube> {
    match image {
        RawImage::Single(raw) => {
            let mut builder = SpectralCube::builder(raw.data, raw.wcs).meta(raw.meta);
            if let Some(valid) = raw.valid {
                builder = builder.mask(valid);
            }
            Ok(LoadedCube::Spectral(builder.build()?))
        }
        RawImage::Polarized { components, meta } => {
            let mut data = IndexMap::with_capacity(components.len());
            for (key, raw) in components {
                let cube = SpectralCube::builder(raw.data, raw.wcs).meta(raw.meta).build()?;
                let finite: Mask = LazyMask::finite(cube.data().clone(), cube.wcs().clone()).into();
                let cube = match raw.valid {
                    Some(valid) => cube.with_mask(valid, true)?.with_mask(finite, true)?,
                    None => cube.with_mask(finite, true)?,
                };
                data.insert(key, ComponentValue::Cube(cube));
            }
            let stokes = StokesSpectralCube::builder(data).meta(meta).build()?;
            Ok(LoadedCube::Stokes(stokes))
        }
    }
}

/// Persisting a cube to disk.
pub trait WriteCube {
    /// Write to `path` with the default registry.
    ///
    /// Fails with [`FileExists`](specube_core::CubeError::FileExists) rather than replacing an
    /// existing file unless [`WriteOptions::overwrite`] is set.
    fn write(&self, path: impl AsRef<Path>, options: &WriteOptions) -> Result<()> {
        self.write_with(&FormatRegistry::default(), path, options)
    }

    /// Write to `path` through `registry`.
    fn write_with(
        &self,
        registry: &FormatRegistry,
        path: impl AsRef<Path>,
        options: &WriteOptions,
    ) -> Result<()>;
}

impl WriteCube for SpectralCube {
    fn write_with(
        &self,
        registry: &FormatRegistry,
        path: impl AsRef<Path>,
        options: &WriteOptions,
    ) -> Result<()> {
        let path = path.as_ref();
        options.validate()?;
        let adapter = registry.resolve(path, options.format.as_deref())?;
        let valid = match self.mask() {
            Some(_) => Some(self.include(&View::all())?),
            None => None,
        };
        let raw = RawCube {
            data: ndarray::ArrayD::clone(self.data()),
            wcs: self.wcs().clone(),
            valid,
            meta: self.meta().clone(),
        };
        adapter.write(path, &raw, options)
    }
}

impl WriteCube for StokesSpectralCube {
    fn write_with(
        &self,
        _registry: &FormatRegistry,
        path: impl AsRef<Path>,
        _options: &WriteOptions,
    ) -> Result<()> {
        StokesSpectralCube::write(self, path.as_ref())
    }
}
