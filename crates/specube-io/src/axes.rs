//! Axis canonicalisation shared by format adapters.
//!
//! Adapters hand the core arrays in canonical order: outermost array axis
//! first, which is the last coordinate axis. These helpers drop degenerate
//! axes, split a polarization axis into per-component planes, and permute
//! a cube into (spectral, latitude, longitude) array order.

use indexmap::IndexMap;
use ndarray::{ArrayD, Axis, IxDyn};
use specube_core::{CoordinateSystem, CubeError, Result, StokesParameter};

/// Array axis holding coordinate axis `wcs_axis` in an `ndim`-dimensional array.
pub fn array_axis(ndim: usize, wcs_axis: usize) -> usize {
    ndim - 1 - wcs_axis
}

/// Drop every length-1 axis from `data` and the matching coordinate axes.
pub fn drop_degenerate<A>(data: ArrayD<A>, wcs: CoordinateSystem) -> (ArrayD<A>, CoordinateSystem) {
    let mut data = data;
    let mut wcs = wcs;
    for axis in (0..data.ndim()).rev() {
        if data.len_of(Axis(axis)) == 1 {
            let wcs_axis = array_axis(data.ndim(), axis);
            data = data.index_axis_move(Axis(axis), 0);
            wcs = wcs.drop_axis(wcs_axis);
        }
    }
    (data, wcs)
}

/// Drop the axes that are length-1 in `reference` from a companion array
/// of that shape.
pub fn drop_like<A>(data: ArrayD<A>, reference: &[usize]) -> ArrayD<A> {
    let mut data = data;
    for axis in (0..reference.len()).rev() {
        if reference[axis] == 1 && axis < data.ndim() {
            data = data.index_axis_move(Axis(axis), 0);
        }
    }
    data
}

/// Split `data` along its `STOKES` axis.
///
/// Returns one plane per component, keyed by the component name decoded
/// from the axis's world value, plus the coordinate system without the
/// polarization axis. Fails with [`CubeError::InvalidComponentKey`] for a
/// world value that is not a known Stokes code and with
/// [`CubeError::AxisCount`] when there is no `STOKES` axis.
pub fn split_stokes<A: Clone>(
    data: &ArrayD<A>,
    wcs: &CoordinateSystem,
) -> Result<(IndexMap<String, ArrayD<A>>, CoordinateSystem)> {
    let stokes = wcs.stokes_axis().ok_or(CubeError::AxisCount {
        attribute: "STOKES axis",
        expected: 1,
        found: 0,
    })?;
    let axis = Axis(array_axis(data.ndim(), stokes));
    let mut planes = IndexMap::with_capacity(data.len_of(axis));
    for index in 0..data.len_of(axis) {
        let code = wcs.world_along(stokes, index as f64).round() as i32;
        let parameter = StokesParameter::from_fits_code(code)?;
        planes.insert(
            parameter.as_str().to_string(),
            data.index_axis(axis, index).to_owned(),
        );
    }
    Ok((planes, wcs.drop_axis(stokes)))
}

/// Permute a 3-axis cube into (spectral, latitude, longitude) array order.
///
/// The coordinate system is reordered to (longitude, latitude, spectral).
/// No elements are copied; the result may have non-standard strides.
pub fn orient<A>(data: ArrayD<A>, wcs: &CoordinateSystem) -> Result<(ArrayD<A>, CoordinateSystem)> {
    if data.ndim() != 3 || wcs.naxis() != 3 {
        return Err(CubeError::DimensionMismatch {
            data_ndim: data.ndim(),
            wcs_naxis: wcs.naxis(),
        });
    }
    let spectral = wcs.spectral_axis().ok_or_else(|| CubeError::NoSpectralAxis {
        ctype: wcs.ctype().to_vec(),
    })?;
    let (lon, lat) = wcs.celestial_axes().ok_or(CubeError::AxisCount {
        attribute: "celestial axes",
        expected: 2,
        found: 0,
    })?;
    let order = [lon, lat, spectral];
    let oriented = wcs.reorder_axes(&order)?;
    let n = order.len();
    let permutation: Vec<usize> = (0..n)
        .map(|k| array_axis(n, order[array_axis(n, k)]))
        .collect();
    Ok((data.permuted_axes(IxDyn(&permutation)), oriented))
}
