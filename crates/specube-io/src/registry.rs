//! Format adapters and their registry.

use std::path::Path;

use indexmap::IndexMap;
use ndarray::ArrayD;
use specube_core::{CoordinateSystem, CubeError, Result};
use specube_cube::Metadata;

use crate::casa::CasaImageAdapter;
use crate::config::{ReadOptions, WriteOptions};
use crate::native::NativeAdapter;

// ── Raw payloads ───────────────────────────────────────────────────

/// One array as handed over by an adapter, already in canonical order.
#[derive(Clone, Debug)]
pub struct RawCube {
    /// Sample values.
    pub data: ArrayD<f64>,
    /// Coordinate system of `data`.
    pub wcs: CoordinateSystem,
    /// Stored validity (`true` = valid), if the file carries one.
    pub valid: Option<ArrayD<bool>>,
    /// File-level metadata.
    pub meta: Metadata,
}

/// What an adapter read from a file.
#[derive(Clone, Debug)]
pub enum RawImage {
    /// A single-component cube.
    Single(RawCube),
    /// One cube per polarization key, each split and oriented.
    ///
    /// Components are assembled with a finite-sample mask layered over
    /// any stored validity.
    Polarized {
        /// Component key → payload.
        components: IndexMap<String, RawCube>,
        /// File-level metadata.
        meta: Metadata,
    },
}

// ── FormatAdapter ──────────────────────────────────────────────────

/// A reader/writer for one on-disk format.
pub trait FormatAdapter: Send + Sync {
    /// Registry name, e.g. `"native"`.
    fn name(&self) -> &str;

    /// Whether `path` looks like this format.
    fn identify(&self, path: &Path) -> bool;

    /// Read `path` into canonical arrays.
    fn read(&self, path: &Path, options: &ReadOptions) -> Result<RawImage>;

    /// Write one cube to `path`.
    ///
    /// The default refuses: most adapters are read-only.
    fn write(&self, path: &Path, cube: &RawCube, options: &WriteOptions) -> Result<()> {
        let _ = (path, cube, options);
        Err(CubeError::UnsupportedOperation {
            operation: format!("writing with the {} format", self.name()),
        })
    }
}

// ── FormatRegistry ─────────────────────────────────────────────────

/// Ordered set of adapters consulted by [`read_with`](crate::read_with).
///
/// Lookup is by explicit name first, otherwise the first adapter whose
/// [`identify`](FormatAdapter::identify) accepts the path.
pub struct FormatRegistry {
    adapters: Vec<Box<dyn FormatAdapter>>,
}

impl FormatRegistry {
    /// A registry with no adapters.
    pub fn empty() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    /// Append an adapter. Later registrations lose identification ties.
    pub fn register(&mut self, adapter: Box<dyn FormatAdapter>) {
        tracing::debug!(format = adapter.name(), "registered format adapter");
        self.adapters.push(adapter);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, adapter: impl FormatAdapter + 'static) -> Self {
        self.register(Box::new(adapter));
        self
    }

    /// Registered adapter names, in order.
    pub fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Adapter registered under `name`.
    pub fn get(&self, name: &str) -> Option<&dyn FormatAdapter> {
        self.adapters
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.as_ref())
    }

    /// Resolve the adapter for `path`, honouring an explicit `format`.
    ///
    /// Returns [`CubeError::UnknownFormat`] if nothing matches.
    pub fn resolve(&self, path: &Path, format: Option<&str>) -> Result<&dyn FormatAdapter> {
        match format {
            Some(name) => self.get(name).ok_or_else(|| CubeError::UnknownFormat {
                target: name.to_string(),
            }),
            None => self
                .adapters
                .iter()
                .find(|a| a.identify(path))
                .map(|a| a.as_ref())
                .ok_or_else(|| CubeError::UnknownFormat {
                    target: path.display().to_string(),
                }),
        }
    }
}

impl Default for FormatRegistry {
    /// `native` then `casa_image` (without an image tool).
    fn default() -> Self {
        Self::empty()
            .with(NativeAdapter)
            .with(CasaImageAdapter::unavailable())
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("adapters", &self.names())
            .finish()
    }
}
