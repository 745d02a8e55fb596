//! Multi-component Stokes cube.
//!
//! A [`StokesSpectralCube`] groups same-shaped, same-coordinate
//! [`SpectralCube`]s under polarization keys (`I`, `Q`, `U`, `V`, `RR`,
//! `LL`, `RL`, `LR`). Components keep their own masks; an optional
//! cube-level mask is layered on top whenever a component is fetched.

use std::sync::Arc;

use indexmap::IndexMap;
use ndarray::ArrayD;
use specube_core::{
    check_equality, is_valid_stokes, CoordinateSystem, CubeError, Result, Shape, ShapeDisplay,
    SpectralUnit, SpectralUnitOptions,
};
use specube_mask::Mask;

use crate::spectral_cube::{check_mask_shape, MaskInput, Metadata, SpectralCube};

/// A value offered as a Stokes component.
///
/// Only [`ComponentValue::Cube`] is accepted; raw arrays are rejected at
/// construction so callers bind coordinates explicitly.
#[derive(Clone, Debug)]
pub enum ComponentValue {
    /// A spectral cube.
    Cube(SpectralCube),
    /// A bare array with no coordinate system.
    Array(ArrayD<f64>),
}

impl From<SpectralCube> for ComponentValue {
    fn from(cube: SpectralCube) -> Self {
        Self::Cube(cube)
    }
}

impl From<ArrayD<f64>> for ComponentValue {
    fn from(array: ArrayD<f64>) -> Self {
        Self::Array(array)
    }
}

/// Spectral cubes keyed by Stokes component.
#[derive(Clone, Debug)]
pub struct StokesSpectralCube {
    components: IndexMap<String, SpectralCube>,
    mask: Option<Mask>,
    meta: Metadata,
    fill_value: f64,
    shape: Shape,
    wcs: Arc<CoordinateSystem>,
}

/// Builder for [`StokesSpectralCube`].
#[derive(Debug)]
pub struct StokesSpectralCubeBuilder {
    data: IndexMap<String, ComponentValue>,
    mask: Option<MaskInput>,
    meta: Metadata,
    fill_value: f64,
}

impl StokesSpectralCubeBuilder {
    /// Attach a cube-level mask (default: none).
    pub fn mask(mut self, mask: impl Into<MaskInput>) -> Self {
        self.mask = Some(mask.into());
        self
    }

    /// Replace the metadata (default: empty).
    pub fn meta(mut self, meta: Metadata) -> Self {
        self.meta = meta;
        self
    }

    /// Set the fill value (default: NaN).
    pub fn fill_value(mut self, fill_value: f64) -> Self {
        self.fill_value = fill_value;
        self
    }

    /// Validate the components and build the cube.
    ///
    /// Components are checked in insertion order against the first one:
    /// value type, coordinate system, key, then shape. A cube-level mask is
    /// checked last.
    ///
    /// # Errors
    ///
    /// - [`CubeError::Construction`] for an empty mapping or a non-cube
    ///   component.
    /// - [`CubeError::CoordinateMismatch`] if coordinate systems differ.
    /// - [`CubeError::InvalidComponentKey`] for an unknown key.
    /// - [`CubeError::ShapeMismatch`] if shapes differ.
    /// - [`CubeError::MaskShape`] if an array-backed mask does not fit.
    /// - [`CubeError::CoordinateMismatch`] if a mask leaf is bound to other
    ///   coordinates.
    pub fn build(self) -> Result<StokesSpectralCube> {
        StokesSpectralCube::assemble(self.data, self.mask, self.meta, self.fill_value)
    }
}

impl StokesSpectralCube {
    /// Build from a key → value mapping with no cube-level mask.
    pub fn new(data: IndexMap<String, ComponentValue>) -> Result<Self> {
        Self::builder(data).build()
    }

    /// Start a builder over a key → value mapping.
    pub fn builder(data: IndexMap<String, ComponentValue>) -> StokesSpectralCubeBuilder {
        StokesSpectralCubeBuilder {
            data,
            mask: None,
            meta: Metadata::new(),
            fill_value: f64::NAN,
        }
    }

    /// Build from already-typed components, in iteration order.
    ///
    /// ```
    /// use ndarray::{ArrayD, IxDyn};
    /// use specube_core::CoordinateSystem;
    /// use specube_cube::{SpectralCube, StokesSpectralCube};
    ///
    /// let wcs = CoordinateSystem::new(3);
    /// let cube = |v: f64| SpectralCube::new(ArrayD::from_elem(IxDyn(&[2, 2, 2]), v), wcs.clone()).unwrap();
    /// let stokes = StokesSpectralCube::from_cubes([("I", cube(1.0)), ("V", cube(0.1))]).unwrap();
    /// assert_eq!(stokes.components(), vec!["I", "V"]);
    /// ```
    pub fn from_cubes<I, K>(cubes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, SpectralCube)>,
        K: Into<String>,
    {
        let components = cubes
            .into_iter()
            .map(|(k, c)| (k.into(), ComponentValue::Cube(c)))
            .collect();
        Self::assemble(components, None, Metadata::new(), f64::NAN)
    }

    fn assemble(
        data: IndexMap<String, ComponentValue>,
        mask: Option<MaskInput>,
        meta: Metadata,
        fill_value: f64,
    ) -> Result<Self> {
        let (_, reference) = data.first().ok_or_else(|| CubeError::Construction {
            reason: "stokes_data should contain at least one SpectralCube".to_string(),
        })?;
        let reference = expect_cube(reference)?;
        let wcs = Arc::new(reference.wcs().clone());
        let shape = reference.shape();

        let mut components = IndexMap::with_capacity(data.len());
        for (key, value) in data {
            let cube = match value {
                ComponentValue::Cube(cube) => cube,
                ComponentValue::Array(_) => return Err(not_a_cube()),
            };
            if !check_equality(cube.wcs(), &wcs) {
                return Err(CubeError::CoordinateMismatch {
                    context: "All spectral cubes in stokes_data should have the same WCS"
                        .to_string(),
                });
            }
            if !is_valid_stokes(&key) {
                return Err(CubeError::InvalidComponentKey { key });
            }
            if cube.shape() != shape {
                return Err(CubeError::ShapeMismatch {
                    expected: shape.to_vec(),
                    found: cube.shape().to_vec(),
                });
            }
            components.insert(key, cube);
        }

        let mask = match mask {
            Some(MaskInput::Array(a)) => {
                check_mask_shape(a.shape(), &shape)?;
                Some(specube_mask::BooleanArrayMask::new(a, (*wcs).clone()).into())
            }
            Some(MaskInput::Mask(m)) => {
                if m.is_array_backed() {
                    check_mask_shape(&m.shape(), &shape)?;
                }
                m.validate_wcs(&wcs)?;
                Some(m)
            }
            None => None,
        };

        tracing::debug!(
            components = ?components.keys().collect::<Vec<_>>(),
            shape = %ShapeDisplay(&shape),
            masked = mask.is_some(),
            "built Stokes cube"
        );

        Ok(Self {
            components,
            mask,
            meta,
            fill_value,
            shape,
            wcs,
        })
    }

    /// Shape shared by every component.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Coordinate system shared by every component.
    pub fn wcs(&self) -> &CoordinateSystem {
        &self.wcs
    }

    /// Cube-level mask, if any.
    pub fn mask(&self) -> Option<&Mask> {
        self.mask.as_ref()
    }

    /// Metadata.
    pub fn meta(&self) -> &Metadata {
        &self.meta
    }

    /// Fill value.
    pub fn fill_value(&self) -> f64 {
        self.fill_value
    }

    /// Component keys in insertion order.
    pub fn components(&self) -> Vec<&str> {
        self.components.keys().map(String::as_str).collect()
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Always false: construction rejects empty mappings.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Stored components, without the cube-level mask applied.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, SpectralCube> {
        self.components.iter()
    }

    /// One component with the cube-level mask layered on top.
    ///
    /// Returns [`CubeError::NoSuchComponent`] for keys not present.
    pub fn get_component(&self, key: &str) -> Result<SpectralCube> {
        let cube = self
            .components
            .get(key)
            .ok_or_else(|| CubeError::NoSuchComponent {
                key: key.to_string(),
            })?;
        match &self.mask {
            Some(mask) => cube.with_mask(mask.clone(), true),
            None => Ok(cube.clone()),
        }
    }

    /// New cube with a different cube-level mask.
    ///
    /// Raw arrays are shape-checked and bound to this cube's coordinates.
    /// With `inherit_mask` set the new mask is AND-ed onto the existing
    /// one. Component masks are untouched.
    pub fn with_mask(&self, mask: impl Into<MaskInput>, inherit_mask: bool) -> Result<Self> {
        let mask = match mask.into() {
            MaskInput::Array(a) => {
                check_mask_shape(a.shape(), &self.shape)?;
                specube_mask::BooleanArrayMask::new(a, self.wcs().clone()).into()
            }
            MaskInput::Mask(m) => m,
        };
        let mask = match (&self.mask, inherit_mask) {
            (Some(existing), true) => existing.and(&mask)?,
            _ => mask,
        };
        Self::assemble(
            as_values(&self.components),
            Some(MaskInput::Mask(mask)),
            self.meta.clone(),
            self.fill_value,
        )
    }

    /// New cube with every component's spectral axis expressed in `unit`.
    ///
    /// The cube-level mask is rebound to the converted coordinates.
    pub fn with_spectral_unit(&self, unit: SpectralUnit, options: &SpectralUnitOptions) -> Result<Self> {
        let components = self
            .components
            .iter()
            .map(|(k, c)| Ok((k.clone(), c.with_spectral_unit(unit, options)?)))
            .collect::<Result<IndexMap<_, _>>>()?;
        let mask = match (&self.mask, components.first()) {
            (Some(m), Some((_, first))) => Some(MaskInput::Mask(m.with_wcs(first.wcs()))),
            _ => None,
        };
        Self::assemble(as_values(&components), mask, self.meta.clone(), self.fill_value)
    }

    /// Persisting multi-component cubes is not supported.
    pub fn write(&self, _path: &std::path::Path) -> Result<()> {
        Err(CubeError::UnsupportedOperation {
            operation: "writing StokesSpectralCube".to_string(),
        })
    }
}

fn not_a_cube() -> CubeError {
    CubeError::Construction {
        reason: "stokes_data should be a dictionary of SpectralCube objects".to_string(),
    }
}

fn expect_cube(value: &ComponentValue) -> Result<&SpectralCube> {
    match value {
        ComponentValue::Cube(cube) => Ok(cube),
        ComponentValue::Array(_) => Err(not_a_cube()),
    }
}

fn as_values(components: &IndexMap<String, SpectralCube>) -> IndexMap<String, ComponentValue> {
    components
        .iter()
        .map(|(k, c)| (k.clone(), ComponentValue::Cube(c.clone())))
        .collect()
}

impl<'a> IntoIterator for &'a StokesSpectralCube {
    type Item = (&'a String, &'a SpectralCube);
    type IntoIter = indexmap::map::Iter<'a, String, SpectralCube>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    fn wcs() -> CoordinateSystem {
        CoordinateSystem::new(3).with_ctype(["RA---SIN", "DEC--SIN", "FREQ"])
    }

    fn cube(shape: &[usize]) -> SpectralCube {
        SpectralCube::new(ArrayD::from_elem(IxDyn(shape), 1.0), wcs()).unwrap()
    }

    fn data(pairs: Vec<(&str, ComponentValue)>) -> IndexMap<String, ComponentValue> {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn rejects_raw_arrays() {
        let err = StokesSpectralCube::new(data(vec![
            ("I", cube(&[2, 2, 2]).into()),
            ("Q", ArrayD::from_elem(IxDyn(&[2, 2, 2]), 0.0).into()),
        ]))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "stokes_data should be a dictionary of SpectralCube objects"
        );
    }

    #[test]
    fn rejects_empty_mapping() {
        let err = StokesSpectralCube::new(IndexMap::new()).unwrap_err();
        assert!(matches!(err, CubeError::Construction { .. }));
    }

    #[test]
    fn rejects_invalid_key() {
        let err = StokesSpectralCube::from_cubes([("I", cube(&[2, 2, 2])), ("X", cube(&[2, 2, 2]))])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid Stokes component: X - should be one of I, Q, U, V, RR, LL, RL, LR"
        );
    }

    #[test]
    fn rejects_shape_mismatch() {
        let err = StokesSpectralCube::from_cubes([("I", cube(&[2, 2, 2])), ("Q", cube(&[2, 2, 3]))])
            .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("All spectral cubes should have the same shape"));
    }

    #[test]
    fn coordinate_check_precedes_key_check() {
        let shifted = SpectralCube::new(
            ArrayD::from_elem(IxDyn(&[2, 2, 2]), 1.0),
            wcs().with_axis(2, 5.0, 0.0, 1.0),
        )
        .unwrap();
        let err = StokesSpectralCube::from_cubes([("I", cube(&[2, 2, 2])), ("X", shifted)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "All spectral cubes in stokes_data should have the same WCS"
        );
    }

    fn galactic_cube(shape: &[usize]) -> SpectralCube {
        let galactic = CoordinateSystem::new(3).with_ctype(["GLON-SIN", "GLAT-SIN", "FREQ"]);
        SpectralCube::new(ArrayD::from_elem(IxDyn(shape), 1.0), galactic).unwrap()
    }

    fn galactic_mask(shape: &[usize]) -> Mask {
        let galactic = CoordinateSystem::new(3).with_ctype(["GLON-SIN", "GLAT-SIN", "FREQ"]);
        specube_mask::BooleanArrayMask::new(ArrayD::from_elem(IxDyn(shape), true), galactic).into()
    }

    #[test]
    fn coordinate_check_precedes_type_check_of_later_components() {
        let err = StokesSpectralCube::new(data(vec![
            ("I", cube(&[2, 2, 2]).into()),
            ("Q", galactic_cube(&[2, 2, 2]).into()),
            ("U", ArrayD::from_elem(IxDyn(&[2, 2, 2]), 0.0).into()),
        ]))
        .unwrap_err();
        assert!(matches!(err, CubeError::CoordinateMismatch { .. }));
    }

    #[test]
    fn raw_array_first_is_a_construction_error() {
        let err = StokesSpectralCube::new(data(vec![
            ("I", ArrayD::from_elem(IxDyn(&[2, 2, 2]), 0.0).into()),
            ("Q", cube(&[2, 2, 2]).into()),
        ]))
        .unwrap_err();
        assert!(matches!(err, CubeError::Construction { .. }));
    }

    #[test]
    fn mask_bound_to_other_coordinates_is_rejected() {
        let err = StokesSpectralCube::builder(data(vec![("I", cube(&[2, 2, 2]).into())]))
            .mask(galactic_mask(&[2, 2, 2]))
            .build()
            .unwrap_err();
        assert!(matches!(err, CubeError::CoordinateMismatch { .. }));
    }

    #[test]
    fn with_mask_rejects_mask_bound_to_other_coordinates() {
        let stokes = StokesSpectralCube::from_cubes([("I", cube(&[2, 2, 2]))]).unwrap();
        for inherit in [false, true] {
            let err = stokes.with_mask(galactic_mask(&[2, 2, 2]), inherit).unwrap_err();
            assert!(matches!(err, CubeError::CoordinateMismatch { .. }));
        }
        let own: Mask =
            specube_mask::BooleanArrayMask::new(ArrayD::from_elem(IxDyn(&[2, 2, 2]), true), wcs())
                .into();
        assert!(stokes.with_mask(own, false).unwrap().mask().is_some());
    }

    #[test]
    fn unknown_component_is_an_error() {
        let stokes = StokesSpectralCube::from_cubes([("I", cube(&[2, 2, 2]))]).unwrap();
        let err = stokes.get_component("Q").unwrap_err();
        assert_eq!(err.to_string(), "StokesSpectralCube has no component Q");
    }

    #[test]
    fn write_is_unsupported() {
        let stokes = StokesSpectralCube::from_cubes([("I", cube(&[2, 2, 2]))]).unwrap();
        assert!(matches!(
            stokes.write(std::path::Path::new("out.cube.json")),
            Err(CubeError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn iteration_preserves_order() {
        let stokes = StokesSpectralCube::from_cubes([
            ("V", cube(&[2, 2, 2])),
            ("I", cube(&[2, 2, 2])),
            ("U", cube(&[2, 2, 2])),
        ])
        .unwrap();
        let keys: Vec<&String> = stokes.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["V", "I", "U"]);
        assert_eq!(stokes.len(), 3);
        assert!(!stokes.is_empty());
    }
}
