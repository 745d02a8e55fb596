//! Stand-in for the CASA image tool.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ndarray::ArrayD;
use specube_core::Result;
use specube_io::{CasaCoordSys, CasaImageAdapter, ImageTool, TaggedVector};

/// Calls observed by every clone of one [`MockImageTool`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MockImageToolLog {
    pub opened: Vec<PathBuf>,
    pub closed: usize,
    pub mask_reads: usize,
}

/// An [`ImageTool`] serving fixed arrays.
///
/// Arrays are given in coordinate order, as CASA returns them.
#[derive(Clone, Debug)]
pub struct MockImageTool {
    data: ArrayD<f64>,
    mask: ArrayD<bool>,
    coordsys: CasaCoordSys,
    unit: String,
    log: Arc<Mutex<MockImageToolLog>>,
}

impl MockImageTool {
    /// Serve `data` with every pixel valid.
    pub fn new(data: ArrayD<f64>, coordsys: CasaCoordSys) -> Self {
        let mask = ArrayD::from_elem(data.raw_dim(), true);
        Self {
            data,
            mask,
            coordsys,
            unit: "Jy/beam".to_string(),
            log: Arc::default(),
        }
    }

    pub fn with_mask(mut self, mask: ArrayD<bool>) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = unit.to_string();
        self
    }

    /// Snapshot of the calls made so far.
    pub fn log(&self) -> MockImageToolLog {
        self.log.lock().expect("log lock").clone()
    }

    /// A CASA adapter whose factory hands out clones of this tool.
    pub fn adapter(&self) -> CasaImageAdapter {
        let tool = self.clone();
        CasaImageAdapter::with_tool(move || Box::new(tool.clone()))
    }
}

impl ImageTool for MockImageTool {
    fn open(&mut self, path: &Path) -> Result<()> {
        self.log.lock().expect("log lock").opened.push(path.to_path_buf());
        Ok(())
    }

    fn get_chunk(&mut self) -> Result<ArrayD<f64>> {
        Ok(self.data.clone())
    }

    fn get_mask(&mut self) -> Result<ArrayD<bool>> {
        self.log.lock().expect("log lock").mask_reads += 1;
        Ok(self.mask.clone())
    }

    fn coordsys(&mut self) -> Result<CasaCoordSys> {
        Ok(self.coordsys.clone())
    }

    fn brightness_unit(&mut self) -> Result<String> {
        Ok(self.unit.clone())
    }

    fn close(&mut self) -> Result<()> {
        self.log.lock().expect("log lock").closed += 1;
        Ok(())
    }
}

/// Coordinate record for (RA, DEC, FREQ), plus `STOKES` when `stokes` is set.
pub fn casa_coordsys(stokes: bool) -> CasaCoordSys {
    let mut names = vec!["Right Ascension", "Declination", "Frequency"];
    let mut types = vec!["Direction", "Direction", "Spectral"];
    let mut units = vec!["deg", "deg", "Hz"];
    let mut crpix = vec![15.0, 10.0, 1.0];
    let mut cdelt = vec![-0.001, 0.001, 1e5];
    let mut crval = vec![202.47, 47.19, 1.42e9];
    if stokes {
        names.push("Stokes");
        types.push("Stokes");
        units.push("");
        crpix.push(1.0);
        cdelt.push(1.0);
        crval.push(1.0);
    }
    let owned = |v: Vec<&str>| -> Vec<String> { v.into_iter().map(String::from).collect() };
    CasaCoordSys {
        reference_pixel: TaggedVector::absolute("pixel", crpix),
        increment: TaggedVector::absolute("world", cdelt),
        reference_value: TaggedVector::absolute("world", crval),
        units: owned(units),
        names: owned(names),
        axis_coordinate_types: owned(types),
        projection: "SIN".to_string(),
    }
}
