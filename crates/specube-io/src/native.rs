//! The `native` JSON cube format.
//!
//! A file ending in `.cube.json` holds either one image document or a JSON
//! array of them:
//!
//! ```json
//! {
//!   "name": "CUBE",
//!   "shape": [2, 3, 4],
//!   "data": [0.0, 1.5, null, ...],
//!   "valid": [true, true, false, ...],
//!   "wcs": { "crpix": [...], "crval": [...], "cdelt": [...],
//!            "ctype": [...], "cunit": [...] },
//!   "meta": { "BUNIT": "Jy/beam" }
//! }
//! ```
//!
//! `data` is flattened in canonical (row-major, outermost axis first)
//! order; `null` stands for NaN. Non-finite values are written as `null`.
//! `name` and `valid` are optional. A document whose coordinate system
//! has a `STOKES` axis is split into per-component cubes.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::Path;

use indexmap::IndexMap;
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use specube_core::{CoordinateSystem, CubeError, Result};
use specube_cube::Metadata;

use crate::axes::{drop_degenerate, drop_like, split_stokes};
use crate::config::{HduSelector, ReadOptions, WriteOptions};
use crate::registry::{FormatAdapter, RawCube, RawImage};

/// File suffix identifying the native format.
pub const NATIVE_SUFFIX: &str = ".cube.json";

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    shape: Vec<usize>,
    data: Vec<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    valid: Option<Vec<bool>>,
    wcs: CoordinateSystem,
    #[serde(default)]
    meta: Metadata,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NativeFile {
    Single(Document),
    Many(Vec<Document>),
}

/// Reader and writer for `.cube.json` files.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeAdapter;

impl NativeAdapter {
    fn select(path: &Path, file: NativeFile, hdu: Option<&HduSelector>) -> Result<Document> {
        let mut docs = match file {
            NativeFile::Single(doc) => vec![doc],
            NativeFile::Many(docs) => docs,
        };
        let index = match hdu {
            None => {
                if docs.len() > 1 {
                    tracing::warn!(
                        path = %path.display(),
                        images = docs.len(),
                        "no image selected; reading the first"
                    );
                }
                0
            }
            Some(HduSelector::Index(i)) => *i,
            Some(HduSelector::Name(name)) => docs
                .iter()
                .position(|d| d.name.as_deref() == Some(name.as_str()))
                .ok_or_else(|| malformed(path, format!("no image named {name}")))?,
        };
        if index >= docs.len() {
            return Err(malformed(
                path,
                format!("image {index} requested but the file holds {}", docs.len()),
            ));
        }
        Ok(docs.swap_remove(index))
    }

    fn decode(path: &Path, doc: Document, options: &ReadOptions) -> Result<RawImage> {
        let expected: usize = doc.shape.iter().product();
        if doc.data.len() != expected {
            return Err(malformed(
                path,
                format!("data has {} values for shape {:?}", doc.data.len(), doc.shape),
            ));
        }
        if doc.wcs.naxis() != doc.shape.len() {
            return Err(CubeError::DimensionMismatch {
                data_ndim: doc.shape.len(),
                wcs_naxis: doc.wcs.naxis(),
            });
        }
        let values = doc.data.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        let data = ArrayD::from_shape_vec(IxDyn(&doc.shape), values)
            .map_err(|e| malformed(path, e.to_string()))?;
        let valid = match doc.valid {
            Some(v) if !options.skip_valid => Some(
                ArrayD::from_shape_vec(IxDyn(&doc.shape), v)
                    .map_err(|e| malformed(path, format!("valid: {e}")))?,
            ),
            _ => None,
        };

        let (data, wcs, valid) = if options.keep_degenerate {
            (data, doc.wcs, valid)
        } else {
            let (data, wcs) = drop_degenerate(data, doc.wcs);
            (data, wcs, valid.map(|v| drop_like(v, &doc.shape)))
        };

        if wcs.stokes_axis().is_none() {
            return Ok(RawImage::Single(RawCube {
                data,
                wcs,
                valid,
                meta: doc.meta,
            }));
        }

        let (planes, plane_wcs) = split_stokes(&data, &wcs)?;
        let mut valid_planes = match &valid {
            Some(v) => Some(split_stokes(v, &wcs)?.0),
            None => None,
        };
        let mut components = IndexMap::with_capacity(planes.len());
        for (key, plane) in planes {
            let valid = valid_planes.as_mut().and_then(|v| v.shift_remove(&key));
            components.insert(
                key,
                RawCube {
                    data: plane,
                    wcs: plane_wcs.clone(),
                    valid,
                    meta: doc.meta.clone(),
                },
            );
        }
        Ok(RawImage::Polarized {
            components,
            meta: doc.meta,
        })
    }
}

impl FormatAdapter for NativeAdapter {
    fn name(&self) -> &str {
        "native"
    }

    fn identify(&self, path: &Path) -> bool {
        path.to_str().is_some_and(|p| p.ends_with(NATIVE_SUFFIX))
    }

    fn read(&self, path: &Path, options: &ReadOptions) -> Result<RawImage> {
        let reader = BufReader::new(File::open(path)?);
        let file: NativeFile = serde_json::from_reader(reader)?;
        let doc = Self::select(path, file, options.hdu.as_ref())?;
        tracing::debug!(path = %path.display(), shape = ?doc.shape, "read native cube");
        Self::decode(path, doc, options)
    }

    fn write(&self, path: &Path, cube: &RawCube, options: &WriteOptions) -> Result<()> {
        let doc = Document {
            name: None,
            shape: cube.data.shape().to_vec(),
            data: cube
                .data
                .iter()
                .map(|&v| v.is_finite().then_some(v))
                .collect(),
            valid: cube.valid.as_ref().map(|v| v.iter().copied().collect()),
            wcs: cube.wcs.clone(),
            meta: cube.meta.clone(),
        };
        let mut open = OpenOptions::new();
        open.write(true);
        if options.overwrite {
            open.create(true).truncate(true);
        } else {
            open.create_new(true);
        }
        let file = open.open(path).map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => CubeError::FileExists {
                path: path.to_path_buf(),
            },
            _ => e.into(),
        })?;
        let writer = BufWriter::new(file);
        serde_json::to_writer(writer, &doc)?;
        tracing::info!(path = %path.display(), shape = ?doc.shape, "wrote native cube");
        Ok(())
    }
}

fn malformed(path: &Path, reason: String) -> CubeError {
    CubeError::MalformedFile {
        path: path.to_path_buf(),
        reason,
    }
}
