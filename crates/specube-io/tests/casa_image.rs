//! Integration tests: CASA `.image` reading through a mock image tool.
//!
//! The mock serves arrays in coordinate order (RA fastest); cubes come
//! back in canonical order, so `cube[[k, j, i]] == served[[i, j, k]]`.

use ndarray::{ArrayD, IxDyn};
use specube_core::CubeError;
use specube_io::{
    read, read_with, FormatRegistry, LoadedCube, NativeAdapter, ReadOptions, MISSING_CASA,
};
use specube_mask::View;
use specube_test_utils::{casa_coordsys, ramp, standard_wcs, MockImageTool};

fn registry(tool: &MockImageTool) -> FormatRegistry {
    FormatRegistry::empty().with(NativeAdapter).with(tool.adapter())
}

#[test]
fn three_axis_image_reads_as_spectral_cube() {
    let served = ramp(&[5, 6, 4]);
    let mut valid = ArrayD::from_elem(IxDyn(&[5, 6, 4]), true);
    valid[[0, 0, 0]] = false;
    valid[[4, 5, 3]] = false;
    let tool = MockImageTool::new(served.clone(), casa_coordsys(false))
        .with_mask(valid)
        .with_unit("K");

    let loaded = read_with(&registry(&tool), "m51.image", &ReadOptions::default()).unwrap();
    let cube = loaded.into_spectral().expect("single cube");
    assert_eq!(cube.shape().as_slice(), &[4, 6, 5]);
    assert_eq!(cube.wcs(), &standard_wcs());
    assert_eq!(cube.meta()["BUNIT"], "K");
    assert_eq!(cube.meta()["filename"], "m51.image");

    let data = cube.unmasked_data(&View::all()).unwrap();
    assert_eq!(data[[3, 2, 1]], served[[1, 2, 3]]);
    let include = cube.include(&View::all()).unwrap();
    assert!(!include[[0, 0, 0]]);
    assert!(!include[[3, 5, 4]]);
    assert_eq!(include.iter().filter(|&&b| b).count(), 4 * 6 * 5 - 2);

    let log = tool.log();
    assert_eq!(log.opened.len(), 1);
    assert_eq!(log.closed, 1);
    assert_eq!(log.mask_reads, 1);
}

#[test]
fn four_axis_image_reads_as_stokes_cube() {
    let served = ramp(&[5, 6, 4, 4]);
    let mut valid = ArrayD::from_elem(IxDyn(&[5, 6, 4, 4]), true);
    valid[[2, 3, 1, 2]] = false;
    let tool = MockImageTool::new(served.clone(), casa_coordsys(true)).with_mask(valid);

    let LoadedCube::Stokes(stokes) =
        read_with(&registry(&tool), "pol.image", &ReadOptions::default()).unwrap()
    else {
        panic!("expected a Stokes cube");
    };
    assert_eq!(stokes.components(), vec!["I", "Q", "U", "V"]);
    assert_eq!(stokes.shape(), &[4, 6, 5]);
    assert_eq!(stokes.wcs(), &standard_wcs());
    assert_eq!(stokes.meta()["BUNIT"], "Jy/beam");

    for (s, key) in ["I", "Q", "U", "V"].iter().enumerate() {
        let component = stokes.get_component(key).unwrap();
        let data = component.unmasked_data(&View::all()).unwrap();
        assert_eq!(data[[1, 3, 2]], served[[2, 3, 1, s]]);
        let excluded = component
            .include(&View::all())
            .unwrap()
            .iter()
            .filter(|&&b| !b)
            .count();
        assert_eq!(excluded, usize::from(*key == "U"));
    }
}

#[test]
fn non_finite_samples_are_masked_in_components() {
    let mut served = ramp(&[5, 6, 4, 2]);
    served[[0, 1, 2, 1]] = f64::NAN;
    let tool = MockImageTool::new(served, casa_coordsys(true));
    let stokes = read_with(&registry(&tool), "nan.image", &ReadOptions::default())
        .unwrap()
        .into_stokes()
        .unwrap();
    let q = stokes.get_component("Q").unwrap();
    assert!(!q.include(&View::all()).unwrap()[[2, 1, 0]]);
    let i = stokes.get_component("I").unwrap();
    assert!(i.include(&View::all()).unwrap().iter().all(|&b| b));
}

#[test]
fn degenerate_stokes_axis_is_dropped() {
    let served = ramp(&[5, 6, 4, 1]);
    let tool = MockImageTool::new(served, casa_coordsys(true));
    let loaded = read_with(&registry(&tool), "i.image", &ReadOptions::default()).unwrap();
    let cube = loaded.into_spectral().expect("degenerate STOKES axis dropped");
    assert_eq!(cube.ndim(), 3);
    assert!(cube.wcs().stokes_axis().is_none());

    let keep = ReadOptions {
        keep_degenerate: true,
        ..ReadOptions::default()
    };
    let kept = read_with(&registry(&tool), "i.image", &keep).unwrap();
    let LoadedCube::Stokes(stokes) = kept else {
        panic!("expected a Stokes cube");
    };
    assert_eq!(stokes.components(), vec!["I"]);
}

#[test]
fn skip_valid_does_not_read_the_mask() {
    let tool = MockImageTool::new(ramp(&[5, 6, 4]), casa_coordsys(false));
    let options = ReadOptions {
        skip_valid: true,
        ..ReadOptions::default()
    };
    let cube = read_with(&registry(&tool), "m51.image", &options)
        .unwrap()
        .into_spectral()
        .unwrap();
    assert!(cube.mask().is_none());
    assert_eq!(tool.log().mask_reads, 0);
    assert_eq!(tool.log().closed, 1);
}

#[test]
fn default_registry_reports_missing_casa() {
    let err = read("m51.image", &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, CubeError::MissingCapability { .. }));
    assert_eq!(err.to_string(), MISSING_CASA);
}

#[test]
fn unknown_format_name_is_rejected() {
    let err = read("m51.image", &ReadOptions::default().with_format("fits")).unwrap_err();
    assert!(matches!(err, CubeError::UnknownFormat { .. }));
}
