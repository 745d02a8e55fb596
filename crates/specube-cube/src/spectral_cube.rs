//! Single-component spectral cube.
//!
//! A [`SpectralCube`] pairs a shared data array with its world coordinate
//! system, an optional validity [`Mask`], free-form metadata and a fill
//! value. Every operation that "changes" a cube returns a new cube that
//! shares the backing array; element data is never copied.

use std::sync::Arc;

use indexmap::IndexMap;
use ndarray::{ArrayD, ArrayViewD};
use specube_core::{
    is_broadcastable_and_smaller, CoordinateSystem, CubeError, Result, Shape, SpectralUnit,
    SpectralUnitOptions,
};
use specube_mask::{BooleanArrayMask, LazyMask, Mask, SharedArray, View};

/// Ordered free-form metadata (`filename`, `BUNIT`, ...).
pub type Metadata = IndexMap<String, serde_json::Value>;

/// A mask argument: either a mask object or a raw boolean array.
///
/// Raw arrays are wrapped as a [`BooleanArrayMask`] bound to the receiving
/// cube's coordinate system; `true` marks included samples.
#[derive(Clone, Debug)]
pub enum MaskInput {
    /// A mask object, checked against the cube's shape and coordinates.
    Mask(Mask),
    /// A raw boolean array, checked against the cube's shape.
    Array(ArrayD<bool>),
}

impl From<Mask> for MaskInput {
    fn from(m: Mask) -> Self {
        Self::Mask(m)
    }
}

impl From<BooleanArrayMask> for MaskInput {
    fn from(m: BooleanArrayMask) -> Self {
        Self::Mask(m.into())
    }
}

impl From<LazyMask> for MaskInput {
    fn from(m: LazyMask) -> Self {
        Self::Mask(m.into())
    }
}

impl From<ArrayD<bool>> for MaskInput {
    fn from(a: ArrayD<bool>) -> Self {
        Self::Array(a)
    }
}

impl MaskInput {
    /// Resolve into a mask bound to `wcs`, checking it against `shape`.
    ///
    /// Raw arrays are checked for shape only. Mask objects are checked for
    /// shape and coordinate-system equality on every leaf.
    pub fn into_mask(self, shape: &[usize], wcs: &CoordinateSystem) -> Result<Mask> {
        match self {
            Self::Array(a) => {
                check_mask_shape(a.shape(), shape)?;
                Ok(BooleanArrayMask::new(a, wcs.clone()).into())
            }
            Self::Mask(m) => {
                check_mask_shape(&m.shape(), shape)?;
                m.validate_wcs(wcs)?;
                Ok(m)
            }
        }
    }
}

pub(crate) fn check_mask_shape(mask: &[usize], data: &[usize]) -> Result<()> {
    if is_broadcastable_and_smaller(mask, data) {
        Ok(())
    } else {
        Err(CubeError::MaskShape {
            mask: mask.to_vec(),
            data: data.to_vec(),
        })
    }
}

/// World values along the spectral axis of a cube.
#[derive(Clone, Debug, PartialEq)]
pub struct SpectralAxisValues {
    /// One value per channel, in array order.
    pub values: Vec<f64>,
    /// Unit string of the values, as recorded in the coordinate system.
    pub unit: String,
    /// Axis type code, e.g. `FREQ` or `VRAD`.
    pub ctype: String,
}

/// A masked spectral cube.
///
/// # Examples
///
/// ```
/// use ndarray::{ArrayD, IxDyn};
/// use specube_core::CoordinateSystem;
/// use specube_cube::SpectralCube;
///
/// let data = ArrayD::from_elem(IxDyn(&[2, 3, 4]), 1.0);
/// let cube = SpectralCube::new(data, CoordinateSystem::new(3)).unwrap();
/// let masked = cube
///     .with_mask(ArrayD::from_elem(IxDyn(&[1, 3, 4]), false), true)
///     .unwrap();
/// assert!(masked.shares_data_with(&cube));
/// assert!(masked.filled_data(&Default::default()).unwrap()[[0, 0, 0]].is_nan());
/// ```
#[derive(Clone, Debug)]
pub struct SpectralCube {
    data: SharedArray,
    wcs: Arc<CoordinateSystem>,
    mask: Option<Mask>,
    meta: Metadata,
    fill_value: f64,
}

/// Builder for [`SpectralCube`].
///
/// Required: data and coordinate system, given to
/// [`SpectralCube::builder`].
#[derive(Debug)]
pub struct SpectralCubeBuilder {
    data: SharedArray,
    wcs: CoordinateSystem,
    mask: Option<MaskInput>,
    meta: Metadata,
    fill_value: f64,
}

impl SpectralCubeBuilder {
    /// Attach a mask (default: none).
    pub fn mask(mut self, mask: impl Into<MaskInput>) -> Self {
        self.mask = Some(mask.into());
        self
    }

    /// Replace the metadata (default: empty).
    pub fn meta(mut self, meta: Metadata) -> Self {
        self.meta = meta;
        self
    }

    /// Insert one metadata entry.
    pub fn meta_entry(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Set the fill value for masked samples (default: NaN).
    pub fn fill_value(mut self, fill_value: f64) -> Self {
        self.fill_value = fill_value;
        self
    }

    /// Build the cube.
    ///
    /// # Errors
    ///
    /// - [`CubeError::DimensionMismatch`] if the data's dimensionality
    ///   differs from the coordinate system's axis count.
    /// - [`CubeError::MaskShape`] or [`CubeError::CoordinateMismatch`] if
    ///   the mask does not fit the cube.
    pub fn build(self) -> Result<SpectralCube> {
        if self.data.ndim() != self.wcs.naxis() {
            return Err(CubeError::DimensionMismatch {
                data_ndim: self.data.ndim(),
                wcs_naxis: self.wcs.naxis(),
            });
        }
        let mask = match self.mask {
            Some(input) => Some(input.into_mask(self.data.shape(), &self.wcs)?),
            None => None,
        };
        Ok(SpectralCube {
            data: self.data,
            wcs: Arc::new(self.wcs),
            mask,
            meta: self.meta,
            fill_value: self.fill_value,
        })
    }
}

impl SpectralCube {
    /// Unmasked cube over `data`.
    ///
    /// Returns [`CubeError::DimensionMismatch`] if `data.ndim()` differs
    /// from `wcs.naxis()`.
    pub fn new(data: impl Into<SharedArray>, wcs: CoordinateSystem) -> Result<Self> {
        Self::builder(data, wcs).build()
    }

    /// Start a builder for a cube over `data`.
    pub fn builder(data: impl Into<SharedArray>, wcs: CoordinateSystem) -> SpectralCubeBuilder {
        SpectralCubeBuilder {
            data: data.into(),
            wcs,
            mask: None,
            meta: Metadata::new(),
            fill_value: f64::NAN,
        }
    }

    /// Shape of the backing array.
    pub fn shape(&self) -> Shape {
        self.data.shape().iter().copied().collect()
    }

    /// Number of array dimensions.
    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// World coordinate system.
    pub fn wcs(&self) -> &CoordinateSystem {
        &self.wcs
    }

    /// Attached mask, if any.
    pub fn mask(&self) -> Option<&Mask> {
        self.mask.as_ref()
    }

    /// Metadata.
    pub fn meta(&self) -> &Metadata {
        &self.meta
    }

    /// Value substituted for masked samples by [`filled_data`](Self::filled_data).
    pub fn fill_value(&self) -> f64 {
        self.fill_value
    }

    /// Shared handle to the backing array.
    pub fn data(&self) -> &SharedArray {
        &self.data
    }

    /// Whether two cubes share one backing array.
    pub fn shares_data_with(&self, other: &SpectralCube) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// New cube with a different mask.
    ///
    /// With `inherit_mask` set and a mask already attached, the result's
    /// mask is the deferred AND of the existing mask and `mask`; otherwise
    /// `mask` replaces it. The result shares this cube's data.
    ///
    /// # Errors
    ///
    /// [`CubeError::MaskShape`] if `mask` cannot be broadcast onto the
    /// cube, [`CubeError::CoordinateMismatch`] if a mask object is bound
    /// to a different coordinate system.
    pub fn with_mask(&self, mask: impl Into<MaskInput>, inherit_mask: bool) -> Result<Self> {
        let mask = mask.into().into_mask(self.data.shape(), &self.wcs)?;
        let mask = match (&self.mask, inherit_mask) {
            (Some(existing), true) => existing.and(&mask)?,
            _ => mask,
        };
        Ok(Self {
            mask: Some(mask),
            ..self.clone()
        })
    }

    /// New cube with a different fill value.
    pub fn with_fill_value(&self, fill_value: f64) -> Self {
        Self {
            fill_value,
            ..self.clone()
        }
    }

    /// New cube with different metadata.
    pub fn with_meta(&self, meta: Metadata) -> Self {
        Self {
            meta,
            ..self.clone()
        }
    }

    /// New cube whose spectral axis is expressed in `unit`.
    ///
    /// The mask is rebound to the converted coordinate system; data is
    /// shared.
    pub fn with_spectral_unit(&self, unit: SpectralUnit, options: &SpectralUnitOptions) -> Result<Self> {
        let wcs = self.wcs.with_spectral_unit(unit, options)?;
        tracing::debug!(unit = unit.symbol(), ctype = ?wcs.ctype(), "converted spectral axis");
        Ok(Self {
            mask: self.mask.as_ref().map(|m| m.with_wcs(&wcs)),
            wcs: Arc::new(wcs),
            ..self.clone()
        })
    }

    /// Raw data over `view`, ignoring the mask. Borrows the backing array.
    pub fn unmasked_data(&self, view: &View) -> Result<ArrayViewD<'_, f64>> {
        view.apply(self.data.view())
    }

    /// Owned copy of the data over `view` with masked samples set to the
    /// fill value.
    pub fn filled_data(&self, view: &View) -> Result<ArrayD<f64>> {
        match &self.mask {
            Some(mask) => mask.filled(self.data.view(), self.fill_value, view),
            None => Ok(view.apply(self.data.view())?.to_owned()),
        }
    }

    /// Validity over `view`; all `true` when no mask is attached.
    pub fn include(&self, view: &View) -> Result<ArrayD<bool>> {
        match &self.mask {
            Some(mask) => mask.include_for(self.data.shape(), view),
            None => Ok(ArrayD::from_elem(view.shape_of(self.data.shape())?.as_slice(), true)),
        }
    }

    /// World values of every channel along the spectral axis.
    ///
    /// Returns [`CubeError::NoSpectralAxis`] if no axis is spectral.
    pub fn spectral_axis(&self) -> Result<SpectralAxisValues> {
        let axis = self.wcs.spectral_axis().ok_or_else(|| CubeError::NoSpectralAxis {
            ctype: self.wcs.ctype().to_vec(),
        })?;
        let len = self.data.shape()[self.wcs.naxis() - 1 - axis];
        Ok(SpectralAxisValues {
            values: self.wcs.world_along_axis(axis, len),
            unit: self.wcs.cunit()[axis].clone(),
            ctype: self.wcs.ctype()[axis].clone(),
        })
    }

    /// World coordinates of a 0-based array index.
    ///
    /// `index` is in array order (outermost axis first); the result is in
    /// coordinate-system axis order.
    pub fn world(&self, index: &[f64]) -> Result<Vec<f64>> {
        let pixel: Vec<f64> = index.iter().rev().copied().collect();
        self.wcs.pixel_to_world(&pixel)
    }
}
