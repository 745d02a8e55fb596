//! Benchmark profiles for specube.
//!
//! Provides pre-built cubes for benchmarking:
//!
//! - [`reference_cube`]: 64x128x128 channels (~1M samples) with a few NaNs
//! - [`reference_stokes`]: four [`reference_cube`]-sized IQUV components
//!
//! Seeded masks come from `specube_test_utils::random_mask`.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use indexmap::IndexMap;
use ndarray::{ArrayD, IxDyn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use specube_core::CoordinateSystem;
use specube_cube::{ComponentValue, SpectralCube, StokesSpectralCube};

/// Array shape of every reference profile: (spectral, latitude, longitude).
pub const REFERENCE_SHAPE: [usize; 3] = [64, 128, 128];

/// Coordinate system shared by the reference profiles.
pub fn reference_wcs() -> CoordinateSystem {
    CoordinateSystem::new(3)
        .with_ctype(["RA---SIN", "DEC--SIN", "FREQ"])
        .with_cunit(["deg", "deg", "Hz"])
        .with_axis(0, 64.0, 202.47, -0.0005)
        .with_axis(1, 64.0, 47.19, 0.0005)
        .with_axis(2, 1.0, 1.42e9, 5e4)
        .with_rest_frequency(1.420_405_751_8e9)
}

/// Uniform `[0, 1)` samples with one NaN per 1000, from `seed`.
pub fn reference_data(seed: u64, shape: &[usize]) -> ArrayD<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    ArrayD::from_shape_simple_fn(IxDyn(shape), || {
        let v = rng.random::<f64>();
        if v < 0.001 {
            f64::NAN
        } else {
            v
        }
    })
}

/// Unmasked cube of [`REFERENCE_SHAPE`].
pub fn reference_cube(seed: u64) -> SpectralCube {
    // reference_wcs has three axes, matching REFERENCE_SHAPE.
    SpectralCube::new(reference_data(seed, &REFERENCE_SHAPE), reference_wcs())
        .unwrap()
}

/// IQUV cube whose components are [`reference_cube`]s.
pub fn reference_stokes(seed: u64) -> StokesSpectralCube {
    let data: IndexMap<String, ComponentValue> = ["I", "Q", "U", "V"]
        .iter()
        .enumerate()
        .map(|(i, k)| (k.to_string(), reference_cube(seed + i as u64).into()))
        .collect();
    StokesSpectralCube::new(data).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_stokes_builds() {
        let stokes = reference_stokes(42);
        assert_eq!(stokes.shape(), &REFERENCE_SHAPE);
        assert_eq!(stokes.len(), 4);
    }

    #[test]
    fn reference_data_is_reproducible() {
        let a = reference_data(7, &[4, 4, 4]);
        let b = reference_data(7, &[4, 4, 4]);
        assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
    }
}
