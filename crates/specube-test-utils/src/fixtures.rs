//! Reusable arrays, coordinate systems and cubes.
//!
//! Random content is drawn from a `ChaCha8Rng` seeded by the caller, so
//! every fixture is reproducible.

use indexmap::IndexMap;
use ndarray::{ArrayD, IxDyn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use specube_core::CoordinateSystem;
use specube_cube::{ComponentValue, SpectralCube, StokesSpectralCube};

/// Rest frequency of the HI line, Hz.
pub const HI_REST_HZ: f64 = 1.420_405_751_8e9;

/// Equatorial SIN-projected cube: (RA, DEC, FREQ) coordinate order.
pub fn standard_wcs() -> CoordinateSystem {
    CoordinateSystem::new(3)
        .with_ctype(["RA---SIN", "DEC--SIN", "FREQ"])
        .with_cunit(["deg", "deg", "Hz"])
        .with_axis(0, 15.0, 202.47, -0.001)
        .with_axis(1, 10.0, 47.19, 0.001)
        .with_axis(2, 1.0, 1.42e9, 1e5)
        .with_rest_frequency(HI_REST_HZ)
}

/// Galactic CAR-projected cube: (GLON, GLAT, FREQ) coordinate order.
pub fn galactic_wcs() -> CoordinateSystem {
    CoordinateSystem::new(3)
        .with_ctype(["GLON-CAR", "GLAT-CAR", "FREQ"])
        .with_cunit(["deg", "deg", "Hz"])
        .with_axis(2, 1.0, 1.42e9, 1e5)
}

/// [`standard_wcs`] with a trailing `STOKES` axis holding codes 1..=n.
pub fn stokes_wcs() -> CoordinateSystem {
    let base = standard_wcs();
    let mut cunit = base.cunit().to_vec();
    cunit.push(String::new());
    let mut ctype = base.ctype().to_vec();
    ctype.push("STOKES".into());
    let mut crpix = base.crpix().to_vec();
    crpix.push(1.0);
    let mut crval = base.crval().to_vec();
    crval.push(1.0);
    let mut cdelt = base.cdelt().to_vec();
    cdelt.push(1.0);
    CoordinateSystem::from_parts(crpix, crval, cdelt, ctype, cunit)
        .expect("fixture vectors have equal length")
}

/// Values `0, 1, 2, ...` in row-major order.
pub fn ramp(shape: &[usize]) -> ArrayD<f64> {
    let n: usize = shape.iter().product();
    ArrayD::from_shape_vec(IxDyn(shape), (0..n).map(|i| i as f64).collect())
        .expect("length matches shape")
}

/// Uniform `[0, 1)` samples.
pub fn random_data(seed: u64, shape: &[usize]) -> ArrayD<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n: usize = shape.iter().product();
    ArrayD::from_shape_vec(IxDyn(shape), (0..n).map(|_| rng.random::<f64>()).collect())
        .expect("length matches shape")
}

/// `random_data(seed, shape) > threshold`.
pub fn random_mask(seed: u64, shape: &[usize], threshold: f64) -> ArrayD<bool> {
    random_data(seed, shape).mapv(|v| v > threshold)
}

/// Unmasked cube of random data over [`standard_wcs`].
pub fn random_cube(seed: u64, shape: &[usize]) -> SpectralCube {
    SpectralCube::new(random_data(seed, shape), standard_wcs()).expect("3-axis fixture")
}

/// Unmasked Stokes cube with one random component per key.
pub fn random_stokes(seed: u64, keys: &[&str], shape: &[usize]) -> StokesSpectralCube {
    let data: IndexMap<String, ComponentValue> = keys
        .iter()
        .enumerate()
        .map(|(i, k)| (k.to_string(), random_cube(seed + i as u64, shape).into()))
        .collect();
    StokesSpectralCube::new(data).expect("valid fixture components")
}
