//! CASA `.image` reader.
//!
//! CASA images are read through an external image tool, modelled here by
//! the [`ImageTool`] trait. The tool returns arrays in coordinate order
//! (first axis fastest), so the adapter reverses them into canonical order,
//! drops degenerate axes, and splits a polarization axis when present.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use ndarray::ArrayD;
use specube_core::{CubeError, Result};
use specube_cube::Metadata;

use crate::axes::{drop_degenerate, drop_like, orient, split_stokes};
use crate::config::ReadOptions;
use crate::coordsys::{import_casa_coordsys, CasaCoordSys};
use crate::registry::{FormatAdapter, RawCube, RawImage};

/// Message used when no image tool is available.
pub const MISSING_CASA: &str =
    "Could not import CASA (casac) and therefore cannot read CASA .image files";

/// Access to one CASA image on disk.
///
/// Arrays are returned in coordinate order: axis 0 of the returned array
/// is coordinate axis 0.
pub trait ImageTool {
    /// Open the image at `path`.
    fn open(&mut self, path: &Path) -> Result<()>;
    /// Pixel values.
    fn get_chunk(&mut self) -> Result<ArrayD<f64>>;
    /// Pixel validity, `true` = valid.
    fn get_mask(&mut self) -> Result<ArrayD<bool>>;
    /// Coordinate-system record.
    fn coordsys(&mut self) -> Result<CasaCoordSys>;
    /// Brightness unit, e.g. `"Jy/beam"`.
    fn brightness_unit(&mut self) -> Result<String>;
    /// Release the image.
    fn close(&mut self) -> Result<()>;
}

struct Fetched {
    data: ArrayD<f64>,
    valid: Option<ArrayD<bool>>,
    coordsys: CasaCoordSys,
    unit: String,
}

/// Creates a fresh [`ImageTool`] per read.
pub type ImageToolFactory = Arc<dyn Fn() -> Box<dyn ImageTool> + Send + Sync>;

/// Reader for CASA `.image` directories.
#[derive(Clone, Default)]
pub struct CasaImageAdapter {
    factory: Option<ImageToolFactory>,
}

impl CasaImageAdapter {
    /// An adapter with no image tool; every read fails with
    /// [`CubeError::MissingCapability`].
    pub fn unavailable() -> Self {
        Self { factory: None }
    }

    /// An adapter backed by `factory`.
    pub fn with_tool<F>(factory: F) -> Self
    where
        F: Fn() -> Box<dyn ImageTool> + Send + Sync + 'static,
    {
        Self {
            factory: Some(Arc::new(factory)),
        }
    }

    /// Whether an image tool is configured.
    pub fn is_available(&self) -> bool {
        self.factory.is_some()
    }

    fn fetch(tool: &mut dyn ImageTool, options: &ReadOptions) -> Result<Fetched> {
        let data = tool.get_chunk()?;
        let valid = if options.skip_valid {
            None
        } else {
            Some(tool.get_mask()?)
        };
        Ok(Fetched {
            data,
            valid,
            coordsys: tool.coordsys()?,
            unit: tool.brightness_unit()?,
        })
    }

    /// Read everything from an opened tool. The tool is closed whether or
    /// not the reads succeed; a read error wins over a close error.
    fn load(tool: &mut dyn ImageTool, path: &Path, options: &ReadOptions) -> Result<RawImage> {
        tool.open(path)?;
        let fetched = Self::fetch(tool, options);
        let closed = tool.close();
        if let Err(e) = &fetched {
            tracing::debug!(path = %path.display(), error = %e, "CASA read failed; tool closed");
        }
        let Fetched {
            data,
            valid,
            coordsys,
            unit,
        } = fetched?;
        closed?;

        let wcs = import_casa_coordsys(&coordsys)?;
        let mut meta = Metadata::new();
        meta.insert("filename".into(), path.display().to_string().into());
        meta.insert("BUNIT".into(), unit.into());

        let data = data.reversed_axes();
        let valid = valid.map(ArrayD::reversed_axes);
        let stored_shape = data.shape().to_vec();
        let (data, wcs, valid) = if options.keep_degenerate {
            (data, wcs, valid)
        } else {
            let (data, wcs) = drop_degenerate(data, wcs);
            (data, wcs, valid.map(|v| drop_like(v, &stored_shape)))
        };
        tracing::debug!(
            path = %path.display(),
            shape = ?data.shape(),
            ctype = ?wcs.ctype(),
            "read CASA image"
        );

        if wcs.naxis() != 4 || wcs.stokes_axis().is_none() {
            return Ok(RawImage::Single(RawCube {
                data,
                wcs,
                valid,
                meta,
            }));
        }

        let (planes, plane_wcs) = split_stokes(&data, &wcs)?;
        let mut valid_planes = match &valid {
            Some(v) => Some(split_stokes(v, &wcs)?.0),
            None => None,
        };
        let mut components = IndexMap::with_capacity(planes.len());
        for (key, plane) in planes {
            let (plane, oriented) = orient(plane, &plane_wcs)?;
            let valid = match valid_planes.as_mut().and_then(|v| v.shift_remove(&key)) {
                Some(v) => Some(orient(v, &plane_wcs)?.0),
                None => None,
            };
            components.insert(
                key,
                RawCube {
                    data: plane,
                    wcs: oriented,
                    valid,
                    meta: meta.clone(),
                },
            );
        }
        Ok(RawImage::Polarized { components, meta })
    }
}

impl fmt::Debug for CasaImageAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CasaImageAdapter")
            .field("available", &self.is_available())
            .finish()
    }
}

impl FormatAdapter for CasaImageAdapter {
    fn name(&self) -> &str {
        "casa_image"
    }

    fn identify(&self, path: &Path) -> bool {
        path.to_str().is_some_and(|p| p.ends_with(".image"))
    }

    fn read(&self, path: &Path, options: &ReadOptions) -> Result<RawImage> {
        let factory = self.factory.as_ref().ok_or_else(|| CubeError::MissingCapability {
            capability: MISSING_CASA.to_string(),
        })?;
        let mut tool = factory();
        Self::load(tool.as_mut(), path, options)
    }
}
