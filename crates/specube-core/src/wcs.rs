//! World coordinate systems: linear pixel-to-world mappings per axis.
//!
//! A [`CoordinateSystem`] follows the FITS WCS keyword model (`CRPIX`,
//! `CRVAL`, `CDELT`, `CTYPE`, `CUNIT`). Axes are stored in FITS order, which
//! is the reverse of array order: array axis `k` of an `n`-dimensional
//! cube corresponds to WCS axis `n - 1 - k`.

use serde::{Deserialize, Serialize};

use crate::error::{CubeError, Result};
use crate::units::{
    convert_si, ctype_basis, SpectralType, SpectralUnit, SpectralUnitOptions, VelocityConvention,
};

/// Relative tolerance used by [`check_equality`].
pub const WCS_TOLERANCE: f64 = 1e-10;

/// Immutable N-axis world coordinate system.
///
/// Constructed with [`CoordinateSystem::new`] (defaults) or
/// [`CoordinateSystem::from_parts`] (explicit, length-checked). All
/// "modifying" methods return a new value.
///
/// # Examples
///
/// ```
/// use specube_core::CoordinateSystem;
///
/// let wcs = CoordinateSystem::new(3).with_ctype(["RA---TAN", "DEC--TAN", "FREQ"]);
/// assert_eq!(wcs.naxis(), 3);
/// assert_eq!(wcs.spectral_axis(), Some(2));
/// assert_eq!(wcs.celestial_axes(), Some((0, 1)));
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "CoordinateSystemRepr")]
pub struct CoordinateSystem {
    crpix: Vec<f64>,
    crval: Vec<f64>,
    cdelt: Vec<f64>,
    ctype: Vec<String>,
    cunit: Vec<String>,
    #[serde(default)]
    restfrq: Option<f64>,
}

// Deserialization goes through the length-checked constructor.
#[derive(Deserialize)]
struct CoordinateSystemRepr {
    crpix: Vec<f64>,
    crval: Vec<f64>,
    cdelt: Vec<f64>,
    ctype: Vec<String>,
    cunit: Vec<String>,
    #[serde(default)]
    restfrq: Option<f64>,
}

impl TryFrom<CoordinateSystemRepr> for CoordinateSystem {
    type Error = CubeError;

    fn try_from(repr: CoordinateSystemRepr) -> Result<Self> {
        let mut wcs = Self::from_parts(repr.crpix, repr.crval, repr.cdelt, repr.ctype, repr.cunit)?;
        wcs.restfrq = repr.restfrq;
        Ok(wcs)
    }
}

impl CoordinateSystem {
    /// A fresh `naxis`-axis system: `crpix = 0`, `crval = 0`, `cdelt = 1`,
    /// empty types and units.
    pub fn new(naxis: usize) -> Self {
        Self {
            crpix: vec![0.0; naxis],
            crval: vec![0.0; naxis],
            cdelt: vec![1.0; naxis],
            ctype: vec![String::new(); naxis],
            cunit: vec![String::new(); naxis],
            restfrq: None,
        }
    }

    /// Build from explicit attribute vectors.
    ///
    /// Returns [`CubeError::AxisCount`] if the vectors differ in length.
    pub fn from_parts(
        crpix: Vec<f64>,
        crval: Vec<f64>,
        cdelt: Vec<f64>,
        ctype: Vec<String>,
        cunit: Vec<String>,
    ) -> Result<Self> {
        let naxis = crpix.len();
        let lens = [
            ("crval", crval.len()),
            ("cdelt", cdelt.len()),
            ("ctype", ctype.len()),
            ("cunit", cunit.len()),
        ];
        for (attribute, found) in lens {
            if found != naxis {
                return Err(CubeError::AxisCount {
                    attribute,
                    expected: naxis,
                    found,
                });
            }
        }
        Ok(Self {
            crpix,
            crval,
            cdelt,
            ctype,
            cunit,
            restfrq: None,
        })
    }

    /// Replace all axis types.
    ///
    /// # Panics
    ///
    /// Panics if the number of types differs from `naxis`. Use
    /// [`CoordinateSystem::from_parts`] for unchecked input.
    pub fn with_ctype<I, S>(mut self, ctype: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ctype: Vec<String> = ctype.into_iter().map(Into::into).collect();
        assert_eq!(ctype.len(), self.naxis(), "ctype length must equal naxis");
        self.ctype = ctype;
        self
    }

    /// Replace all axis units.
    ///
    /// # Panics
    ///
    /// Panics if the number of units differs from `naxis`. Use
    /// [`CoordinateSystem::from_parts`] for unchecked input.
    pub fn with_cunit<I, S>(mut self, cunit: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cunit: Vec<String> = cunit.into_iter().map(Into::into).collect();
        assert_eq!(cunit.len(), self.naxis(), "cunit length must equal naxis");
        self.cunit = cunit;
        self
    }

    /// Set the linear mapping of one axis.
    ///
    /// # Panics
    ///
    /// Panics if `axis >= naxis`.
    pub fn with_axis(mut self, axis: usize, crpix: f64, crval: f64, cdelt: f64) -> Self {
        assert!(
            axis < self.naxis(),
            "axis {axis} out of range for {} axes",
            self.naxis()
        );
        self.crpix[axis] = crpix;
        self.crval[axis] = crval;
        self.cdelt[axis] = cdelt;
        self
    }

    /// Attach a rest frequency in Hz.
    pub fn with_rest_frequency(mut self, hz: f64) -> Self {
        self.restfrq = Some(hz);
        self
    }

    /// Number of axes.
    pub fn naxis(&self) -> usize {
        self.crpix.len()
    }

    /// Reference pixels (1-based).
    pub fn crpix(&self) -> &[f64] {
        &self.crpix
    }

    /// Reference values.
    pub fn crval(&self) -> &[f64] {
        &self.crval
    }

    /// Pixel scales.
    pub fn cdelt(&self) -> &[f64] {
        &self.cdelt
    }

    /// Axis type codes.
    pub fn ctype(&self) -> &[String] {
        &self.ctype
    }

    /// Axis units.
    pub fn cunit(&self) -> &[String] {
        &self.cunit
    }

    /// Rest frequency in Hz, if recorded.
    pub fn rest_frequency(&self) -> Option<f64> {
        self.restfrq
    }

    /// World coordinate of a 0-based pixel position along one axis.
    ///
    /// Axes carrying a non-linear algorithm code (`VOPT-F2W`, ...) are
    /// evaluated in their linear approximation about the reference pixel.
    pub fn world_along(&self, axis: usize, pixel: f64) -> f64 {
        self.crval[axis] + self.cdelt[axis] * (pixel + 1.0 - self.crpix[axis])
    }

    /// World coordinates for a 0-based pixel position, in WCS axis order.
    pub fn pixel_to_world(&self, pixel: &[f64]) -> Result<Vec<f64>> {
        self.check_len(pixel.len())?;
        Ok((0..self.naxis()).map(|i| self.world_along(i, pixel[i])).collect())
    }

    /// 0-based pixel position for world coordinates, in WCS axis order.
    pub fn world_to_pixel(&self, world: &[f64]) -> Result<Vec<f64>> {
        self.check_len(world.len())?;
        Ok((0..self.naxis())
            .map(|i| (world[i] - self.crval[i]) / self.cdelt[i] + self.crpix[i] - 1.0)
            .collect())
    }

    /// World values for pixels `0..len` along one axis.
    pub fn world_along_axis(&self, axis: usize, len: usize) -> Vec<f64> {
        (0..len).map(|p| self.world_along(axis, p as f64)).collect()
    }

    fn check_len(&self, found: usize) -> Result<()> {
        if found != self.naxis() {
            return Err(CubeError::AxisCount {
                attribute: "coordinate",
                expected: self.naxis(),
                found,
            });
        }
        Ok(())
    }

    /// Index of the spectral axis, if any.
    pub fn spectral_axis(&self) -> Option<usize> {
        self.ctype
            .iter()
            .position(|c| SpectralType::from_ctype(c).is_some())
    }

    /// Index of the `STOKES` axis, if any.
    pub fn stokes_axis(&self) -> Option<usize> {
        self.ctype.iter().position(|c| c.trim() == "STOKES")
    }

    /// Indices of the (longitude, latitude) celestial axes, if both exist.
    pub fn celestial_axes(&self) -> Option<(usize, usize)> {
        let lon = self.ctype.iter().position(|c| is_longitude(c))?;
        let lat = self.ctype.iter().position(|c| is_latitude(c))?;
        Some((lon, lat))
    }

    /// Sub-system with one axis removed.
    pub fn drop_axis(&self, axis: usize) -> Self {
        let keep: Vec<usize> = (0..self.naxis()).filter(|&i| i != axis).collect();
        self.select(&keep)
    }

    /// Permute axes: new axis `i` is old axis `order[i]`.
    ///
    /// Returns [`CubeError::AxisCount`] unless `order` is a permutation of
    /// `0..naxis`.
    pub fn reorder_axes(&self, order: &[usize]) -> Result<Self> {
        let mut seen = vec![false; self.naxis()];
        for &i in order {
            if i >= self.naxis() || seen[i] {
                return Err(CubeError::AxisCount {
                    attribute: "axis order",
                    expected: self.naxis(),
                    found: order.len(),
                });
            }
            seen[i] = true;
        }
        self.check_len(order.len())?;
        Ok(self.select(order))
    }

    fn select(&self, axes: &[usize]) -> Self {
        Self {
            crpix: axes.iter().map(|&i| self.crpix[i]).collect(),
            crval: axes.iter().map(|&i| self.crval[i]).collect(),
            cdelt: axes.iter().map(|&i| self.cdelt[i]).collect(),
            ctype: axes.iter().map(|&i| self.ctype[i].clone()).collect(),
            cunit: axes.iter().map(|&i| self.cunit[i].clone()).collect(),
            restfrq: self.restfrq,
        }
    }

    /// Reinterpret the spectral axis in `unit`.
    ///
    /// Same-kind changes rescale `CRVAL`/`CDELT` exactly. Cross-kind
    /// changes convert the reference value and take `CDELT` as the local
    /// derivative at the reference pixel; when the new type is not linear
    /// in the axis's sampling basis the `CTYPE` gains a `-X2Y` algorithm
    /// code.
    pub fn with_spectral_unit(&self, unit: SpectralUnit, options: &SpectralUnitOptions) -> Result<Self> {
        options.validate()?;
        let axis = self.spectral_axis().ok_or_else(|| CubeError::NoSpectralAxis {
            ctype: self.ctype.clone(),
        })?;
        let from_ctype = &self.ctype[axis];
        let from_type = SpectralType::from_ctype(from_ctype).ok_or_else(|| {
            CubeError::NoSpectralAxis {
                ctype: self.ctype.clone(),
            }
        })?;
        let from_unit = if self.cunit[axis].trim().is_empty() {
            SpectralUnit::si_for(from_type.kind())
        } else {
            self.cunit[axis].parse::<SpectralUnit>()?
        };
        if from_unit.kind() != from_type.kind() {
            return Err(CubeError::IncompatibleUnit {
                unit: from_unit.symbol().to_string(),
                context: format!("axis of type {from_ctype}"),
            });
        }

        let to_type = match unit.kind() {
            crate::units::SpectralKind::Frequency => SpectralType::Frequency,
            crate::units::SpectralKind::Wavelength => SpectralType::Wavelength,
            crate::units::SpectralKind::Velocity => {
                let convention = match (options.velocity_convention, from_type) {
                    (Some(c), _) => c,
                    (None, SpectralType::Velocity(c)) => c,
                    (None, _) => {
                        return Err(CubeError::MissingVelocityConvention {
                            unit: unit.symbol().to_string(),
                        })
                    }
                };
                SpectralType::Velocity(convention)
            }
        };

        let rest_hz = match options.rest_value {
            Some(rest) => Some(rest.to_hz()?),
            None => self.restfrq,
        };

        let crval_si = self.crval[axis] * from_unit.si_scale();
        let cdelt_si = self.cdelt[axis] * from_unit.si_scale();
        let new_crval_si = convert_si(crval_si, from_type, to_type, rest_hz)?;
        let derivative = if from_type == to_type {
            1.0
        } else {
            let h = if cdelt_si != 0.0 { cdelt_si.abs() / 2.0 } else { crval_si.abs() * 1e-6 };
            let hi = convert_si(crval_si + h, from_type, to_type, rest_hz)?;
            let lo = convert_si(crval_si - h, from_type, to_type, rest_hz)?;
            (hi - lo) / (2.0 * h)
        };
        let new_crval = new_crval_si / unit.si_scale();
        let new_cdelt = derivative * cdelt_si / unit.si_scale();
        if !new_crval.is_finite() {
            return Err(CubeError::NonFiniteSpectral { what: "reference value" });
        }
        if !new_cdelt.is_finite() {
            return Err(CubeError::NonFiniteSpectral { what: "pixel scale" });
        }

        let basis = ctype_basis(from_ctype).unwrap_or_else(|| from_type.natural_basis());
        let target = to_type.natural_basis();
        let ctype = if basis == target {
            to_type.ctype_base().to_string()
        } else {
            format!("{}-{}2{}", to_type.ctype_base(), basis, target)
        };

        let mut out = self.clone();
        out.crval[axis] = new_crval;
        out.cdelt[axis] = new_cdelt;
        out.ctype[axis] = ctype;
        out.cunit[axis] = unit.symbol().to_string();
        out.restfrq = rest_hz;
        Ok(out)
    }

    /// Doppler convention of the spectral axis, if it is a velocity axis.
    pub fn velocity_convention(&self) -> Option<VelocityConvention> {
        let axis = self.spectral_axis()?;
        match SpectralType::from_ctype(&self.ctype[axis])? {
            SpectralType::Velocity(c) => Some(c),
            _ => None,
        }
    }
}

fn is_longitude(ctype: &str) -> bool {
    ["RA--", "GLON", "ELON"].iter().any(|p| ctype.starts_with(p))
}

fn is_latitude(ctype: &str) -> bool {
    ["DEC-", "GLAT", "ELAT"].iter().any(|p| ctype.starts_with(p))
}

fn near(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= WCS_TOLERANCE * scale
}

/// Structural near-equality of two coordinate systems.
///
/// True iff axis counts match, reference pixels, reference values and
/// pixel scales agree within [`WCS_TOLERANCE`], and axis types and units
/// match exactly and in order. The rest frequency is not compared.
pub fn check_equality(a: &CoordinateSystem, b: &CoordinateSystem) -> bool {
    a.naxis() == b.naxis()
        && a.crpix.iter().zip(&b.crpix).all(|(x, y)| near(*x, *y))
        && a.crval.iter().zip(&b.crval).all(|(x, y)| near(*x, *y))
        && a.cdelt.iter().zip(&b.cdelt).all(|(x, y)| near(*x, *y))
        && a.ctype == b.ctype
        && a.cunit == b.cunit
}

impl PartialEq for CoordinateSystem {
    fn eq(&self, other: &Self) -> bool {
        check_equality(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "ctype length must equal naxis")]
    fn with_ctype_rejects_wrong_count() {
        let _ = CoordinateSystem::new(3).with_ctype(["RA---TAN", "DEC--TAN"]);
    }

    #[test]
    #[should_panic(expected = "out of range for 2 axes")]
    fn with_axis_rejects_out_of_range_axis() {
        let _ = CoordinateSystem::new(2).with_axis(2, 1.0, 0.0, 1.0);
    }
    use crate::units::SPEED_OF_LIGHT;

    fn cube_wcs() -> CoordinateSystem {
        CoordinateSystem::new(3).with_ctype(["RA---TAN", "DEC--TAN", "FREQ"])
    }

    #[test]
    fn defaults_match_fresh_wcs() {
        let w = CoordinateSystem::new(2);
        assert_eq!(w.crpix(), &[0.0, 0.0]);
        assert_eq!(w.crval(), &[0.0, 0.0]);
        assert_eq!(w.cdelt(), &[1.0, 1.0]);
        assert_eq!(w.ctype(), &[String::new(), String::new()]);
    }

    #[test]
    fn from_parts_rejects_ragged_vectors() {
        let err = CoordinateSystem::from_parts(
            vec![1.0, 1.0],
            vec![0.0],
            vec![1.0, 1.0],
            vec!["A".into(), "B".into()],
            vec![String::new(), String::new()],
        )
        .unwrap_err();
        assert!(matches!(err, CubeError::AxisCount { attribute: "crval", .. }));
    }

    #[test]
    fn equality_tolerates_rounding() {
        let a = cube_wcs().with_axis(2, 1.0, 1.4e9, 1e5);
        let b = cube_wcs().with_axis(2, 1.0, 1.4e9 * (1.0 + 1e-13), 1e5);
        assert!(check_equality(&a, &b));
        let c = cube_wcs().with_axis(2, 1.0, 1.4e9 * (1.0 + 1e-6), 1e5);
        assert!(!check_equality(&a, &c));
    }

    #[test]
    fn equality_is_order_sensitive_on_types() {
        let a = cube_wcs();
        let b = CoordinateSystem::new(3).with_ctype(["GLON-CAR", "GLAT-CAR", "FREQ"]);
        assert_ne!(a, b);
        let c = cube_wcs().with_cunit(["deg", "deg", "Hz"]);
        assert_ne!(a, c);
        assert_ne!(CoordinateSystem::new(2), CoordinateSystem::new(3));
    }

    #[test]
    fn pixel_world_round_trip() {
        let w = cube_wcs()
            .with_axis(0, 10.0, 83.0, -0.01)
            .with_axis(1, 10.0, -5.0, 0.01)
            .with_axis(2, 1.0, 1.4e9, 1e5);
        let world = w.pixel_to_world(&[9.0, 9.0, 0.0]).unwrap();
        assert_eq!(world, vec![83.0, -5.0, 1.4e9]);
        let pix = w.world_to_pixel(&world).unwrap();
        assert!((pix[0] - 9.0).abs() < 1e-9);
        assert!(w.pixel_to_world(&[0.0]).is_err());
    }

    #[test]
    fn drop_and_reorder() {
        let w = CoordinateSystem::new(4).with_ctype(["RA---SIN", "DEC--SIN", "FREQ", "STOKES"]);
        assert_eq!(w.stokes_axis(), Some(3));
        let sub = w.drop_axis(3);
        assert_eq!(sub.ctype(), cube_wcs_sin().ctype());
        let r = sub.reorder_axes(&[2, 0, 1]).unwrap();
        assert_eq!(r.ctype()[0], "FREQ");
        assert!(sub.reorder_axes(&[0, 0, 1]).is_err());
    }

    fn cube_wcs_sin() -> CoordinateSystem {
        CoordinateSystem::new(3).with_ctype(["RA---SIN", "DEC--SIN", "FREQ"])
    }

    #[test]
    fn hz_to_ghz_rescales_exactly() {
        let w = cube_wcs().with_cunit(["deg", "deg", "Hz"]).with_axis(2, 1.0, 1.4e9, 1e6);
        let g = w
            .with_spectral_unit(SpectralUnit::GHz, &SpectralUnitOptions::default())
            .unwrap();
        assert_eq!(g.cunit()[2], "GHz");
        assert_eq!(g.ctype()[2], "FREQ");
        assert!((g.crval()[2] - 1.4).abs() < 1e-12);
        assert!((g.cdelt()[2] - 1e-3).abs() < 1e-15);
    }

    #[test]
    fn frequency_to_radio_velocity() {
        let rest = 1.0e9;
        let w = cube_wcs()
            .with_cunit(["deg", "deg", "Hz"])
            .with_axis(2, 1.0, 0.999e9, 1e5);
        let opts = SpectralUnitOptions::default()
            .with_convention(VelocityConvention::Radio)
            .with_rest_value(rest, SpectralUnit::Hz);
        let v = w.with_spectral_unit(SpectralUnit::KilometrePerSecond, &opts).unwrap();
        assert_eq!(v.ctype()[2], "VRAD");
        assert!((v.crval()[2] - SPEED_OF_LIGHT * 1e-3 / 1e3).abs() < 1e-6);
        // dv/dν = -c/ν₀ for the radio convention.
        let expected_cdelt = -SPEED_OF_LIGHT / rest * 1e5 / 1e3;
        assert!((v.cdelt()[2] - expected_cdelt).abs() < 1e-6);
        assert_eq!(v.rest_frequency(), Some(rest));
        assert_eq!(v.velocity_convention(), Some(VelocityConvention::Radio));
    }

    #[test]
    fn frequency_to_wavelength_gains_algorithm_code() {
        let w = cube_wcs().with_cunit(["deg", "deg", "Hz"]).with_axis(2, 1.0, 1e9, 1e6);
        let l = w
            .with_spectral_unit(SpectralUnit::Metre, &SpectralUnitOptions::default())
            .unwrap();
        assert_eq!(l.ctype()[2], "WAVE-F2W");
        // Converting back lands on a frequency axis linear in F again.
        let f = l
            .with_spectral_unit(SpectralUnit::Hz, &SpectralUnitOptions::default())
            .unwrap();
        assert_eq!(f.ctype()[2], "FREQ");
        assert!((f.crval()[2] - 1e9).abs() < 1e-3);
    }

    #[test]
    fn velocity_target_needs_convention() {
        let w = cube_wcs().with_axis(2, 1.0, 1e9, 1e6);
        let opts = SpectralUnitOptions::default().with_rest_value(1e9, SpectralUnit::Hz);
        let err = w
            .with_spectral_unit(SpectralUnit::KilometrePerSecond, &opts)
            .unwrap_err();
        assert!(matches!(err, CubeError::MissingVelocityConvention { .. }));
    }

    #[test]
    fn no_spectral_axis_is_reported() {
        let w = CoordinateSystem::new(2).with_ctype(["RA---TAN", "DEC--TAN"]);
        let err = w
            .with_spectral_unit(SpectralUnit::Hz, &SpectralUnitOptions::default())
            .unwrap_err();
        assert!(matches!(err, CubeError::NoSpectralAxis { .. }));
    }

    #[test]
    fn json_round_trip_checks_lengths() {
        let w = cube_wcs().with_rest_frequency(1.4e9);
        let json = serde_json::to_string(&w).unwrap();
        let back: CoordinateSystem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, w);
        assert_eq!(back.rest_frequency(), Some(1.4e9));

        let bad = r#"{"crpix":[0,0],"crval":[0],"cdelt":[1,1],"ctype":["A","B"],"cunit":["",""]}"#;
        assert!(serde_json::from_str::<CoordinateSystem>(bad).is_err());
    }
}
