//! Spectral units, Doppler conventions, and spectral-axis conversions.
//!
//! Conversions route every quantity through frequency in Hz. Velocity
//! requires a rest frequency and a Doppler convention; frequency and
//! wavelength convert through `c = λν` alone.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CubeError, Result};

/// Speed of light in vacuum, m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Physical kind of a spectral quantity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpectralKind {
    /// Frequency (Hz family).
    Frequency,
    /// Vacuum wavelength (m family).
    Wavelength,
    /// Line-of-sight velocity (m/s family).
    Velocity,
}

impl SpectralKind {
    /// Lower-case name used in messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Frequency => "frequency",
            Self::Wavelength => "wavelength",
            Self::Velocity => "velocity",
        }
    }
}

/// A spectral unit with a fixed scale to SI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpectralUnit {
    /// Hertz.
    Hz,
    /// Kilohertz.
    KHz,
    /// Megahertz.
    MHz,
    /// Gigahertz.
    GHz,
    /// Metres per second.
    MetrePerSecond,
    /// Kilometres per second.
    KilometrePerSecond,
    /// Metres.
    Metre,
    /// Centimetres.
    Centimetre,
    /// Millimetres.
    Millimetre,
    /// Micrometres.
    Micrometre,
    /// Nanometres.
    Nanometre,
    /// Ångström.
    Angstrom,
}

impl SpectralUnit {
    /// Physical kind measured by this unit.
    pub fn kind(self) -> SpectralKind {
        match self {
            Self::Hz | Self::KHz | Self::MHz | Self::GHz => SpectralKind::Frequency,
            Self::MetrePerSecond | Self::KilometrePerSecond => SpectralKind::Velocity,
            Self::Metre
            | Self::Centimetre
            | Self::Millimetre
            | Self::Micrometre
            | Self::Nanometre
            | Self::Angstrom => SpectralKind::Wavelength,
        }
    }

    /// Multiplier taking a value in this unit to SI (Hz, m/s, or m).
    pub fn si_scale(self) -> f64 {
        match self {
            Self::Hz => 1.0,
            Self::KHz => 1e3,
            Self::MHz => 1e6,
            Self::GHz => 1e9,
            Self::MetrePerSecond => 1.0,
            Self::KilometrePerSecond => 1e3,
            Self::Metre => 1.0,
            Self::Centimetre => 1e-2,
            Self::Millimetre => 1e-3,
            Self::Micrometre => 1e-6,
            Self::Nanometre => 1e-9,
            Self::Angstrom => 1e-10,
        }
    }

    /// FITS `CUNIT` spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Hz => "Hz",
            Self::KHz => "kHz",
            Self::MHz => "MHz",
            Self::GHz => "GHz",
            Self::MetrePerSecond => "m/s",
            Self::KilometrePerSecond => "km/s",
            Self::Metre => "m",
            Self::Centimetre => "cm",
            Self::Millimetre => "mm",
            Self::Micrometre => "um",
            Self::Nanometre => "nm",
            Self::Angstrom => "Angstrom",
        }
    }

    /// The SI unit of a kind, assumed when an axis carries no unit string.
    pub fn si_for(kind: SpectralKind) -> Self {
        match kind {
            SpectralKind::Frequency => Self::Hz,
            SpectralKind::Wavelength => Self::Metre,
            SpectralKind::Velocity => Self::MetrePerSecond,
        }
    }
}

impl fmt::Display for SpectralUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for SpectralUnit {
    type Err = CubeError;

    fn from_str(s: &str) -> Result<Self> {
        let unit = match s.trim() {
            "Hz" | "hz" => Self::Hz,
            "kHz" | "khz" => Self::KHz,
            "MHz" | "mhz" => Self::MHz,
            "GHz" | "ghz" => Self::GHz,
            "m/s" | "m s-1" | "m.s-1" => Self::MetrePerSecond,
            "km/s" | "km s-1" | "km.s-1" => Self::KilometrePerSecond,
            "m" => Self::Metre,
            "cm" => Self::Centimetre,
            "mm" => Self::Millimetre,
            "um" | "micron" => Self::Micrometre,
            "nm" => Self::Nanometre,
            "Angstrom" | "AA" | "angstrom" => Self::Angstrom,
            other => {
                return Err(CubeError::UnknownUnit {
                    unit: other.to_string(),
                })
            }
        };
        Ok(unit)
    }
}

/// Doppler convention relating velocity to frequency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VelocityConvention {
    /// `v = c (1 - ν/ν₀)`; linear in frequency.
    Radio,
    /// `v = c (ν₀/ν - 1)`; linear in wavelength.
    Optical,
    /// Full special-relativistic Doppler relation.
    Relativistic,
}

/// Physical type of a spectral axis, as encoded in the first four
/// characters of its `CTYPE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpectralType {
    /// `FREQ`.
    Frequency,
    /// `WAVE`.
    Wavelength,
    /// `VRAD`, `VOPT`, or `VELO`.
    Velocity(VelocityConvention),
}

impl SpectralType {
    /// Recognise a spectral `CTYPE`, ignoring any algorithm code suffix.
    pub fn from_ctype(ctype: &str) -> Option<Self> {
        let base = ctype.get(..4)?;
        match base {
            "FREQ" => Some(Self::Frequency),
            "WAVE" => Some(Self::Wavelength),
            "VRAD" => Some(Self::Velocity(VelocityConvention::Radio)),
            "VOPT" => Some(Self::Velocity(VelocityConvention::Optical)),
            "VELO" => Some(Self::Velocity(VelocityConvention::Relativistic)),
            _ => None,
        }
    }

    /// Four-character `CTYPE` prefix.
    pub fn ctype_base(self) -> &'static str {
        match self {
            Self::Frequency => "FREQ",
            Self::Wavelength => "WAVE",
            Self::Velocity(VelocityConvention::Radio) => "VRAD",
            Self::Velocity(VelocityConvention::Optical) => "VOPT",
            Self::Velocity(VelocityConvention::Relativistic) => "VELO",
        }
    }

    /// Physical kind.
    pub fn kind(self) -> SpectralKind {
        match self {
            Self::Frequency => SpectralKind::Frequency,
            Self::Wavelength => SpectralKind::Wavelength,
            Self::Velocity(_) => SpectralKind::Velocity,
        }
    }

    /// Basis letter of the variable this type is linear in (WCS Paper III):
    /// `F` for frequency-like, `W` for wavelength-like, `V` for relativistic
    /// velocity.
    pub fn natural_basis(self) -> char {
        match self {
            Self::Frequency | Self::Velocity(VelocityConvention::Radio) => 'F',
            Self::Wavelength | Self::Velocity(VelocityConvention::Optical) => 'W',
            Self::Velocity(VelocityConvention::Relativistic) => 'V',
        }
    }
}

/// Basis letter of an existing spectral `CTYPE`: the `X` in a `-X2Y`
/// algorithm code if present, else the type's natural basis.
pub fn ctype_basis(ctype: &str) -> Option<char> {
    let ty = SpectralType::from_ctype(ctype)?;
    let code = ctype.get(4..).unwrap_or("");
    let mut chars = code.chars();
    match (chars.next(), chars.next(), chars.next(), chars.next()) {
        (Some('-'), Some(x), Some('2'), Some(_)) => Some(x),
        _ => Some(ty.natural_basis()),
    }
}

/// Convert a quantity in SI units of `from` to frequency in Hz.
fn to_hz(value: f64, from: SpectralType, rest_hz: Option<f64>) -> Result<f64> {
    match from {
        SpectralType::Frequency => Ok(value),
        SpectralType::Wavelength => Ok(SPEED_OF_LIGHT / value),
        SpectralType::Velocity(conv) => {
            let rest = rest_hz.ok_or(CubeError::MissingRestValue {
                from: "velocity",
                to: "frequency",
            })?;
            let beta = value / SPEED_OF_LIGHT;
            Ok(match conv {
                VelocityConvention::Radio => rest * (1.0 - beta),
                VelocityConvention::Optical => rest / (1.0 + beta),
                VelocityConvention::Relativistic => rest * ((1.0 - beta) / (1.0 + beta)).sqrt(),
            })
        }
    }
}

/// Convert a frequency in Hz to SI units of `to`.
fn from_hz(freq: f64, to: SpectralType, rest_hz: Option<f64>) -> Result<f64> {
    match to {
        SpectralType::Frequency => Ok(freq),
        SpectralType::Wavelength => Ok(SPEED_OF_LIGHT / freq),
        SpectralType::Velocity(conv) => {
            let rest = rest_hz.ok_or(CubeError::MissingRestValue {
                from: "frequency",
                to: "velocity",
            })?;
            Ok(match conv {
                VelocityConvention::Radio => SPEED_OF_LIGHT * (1.0 - freq / rest),
                VelocityConvention::Optical => SPEED_OF_LIGHT * (rest / freq - 1.0),
                VelocityConvention::Relativistic => {
                    let (r2, f2) = (rest * rest, freq * freq);
                    SPEED_OF_LIGHT * (r2 - f2) / (r2 + f2)
                }
            })
        }
    }
}

/// Convert an SI value between spectral types.
///
/// Identical types pass through without needing a rest frequency.
pub fn convert_si(value: f64, from: SpectralType, to: SpectralType, rest_hz: Option<f64>) -> Result<f64> {
    if from == to {
        return Ok(value);
    }
    if rest_hz.is_none()
        && (from.kind() == SpectralKind::Velocity || to.kind() == SpectralKind::Velocity)
    {
        return Err(CubeError::MissingRestValue {
            from: from.kind().name(),
            to: to.kind().name(),
        });
    }
    let hz = to_hz(value, from, rest_hz)?;
    from_hz(hz, to, rest_hz)
}

/// Rest frequency or wavelength used by velocity conversions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RestValue {
    /// Numeric value in `unit`.
    pub value: f64,
    /// Frequency or wavelength unit.
    pub unit: SpectralUnit,
}

impl RestValue {
    /// Create a rest value.
    pub fn new(value: f64, unit: SpectralUnit) -> Self {
        Self { value, unit }
    }

    /// The rest value expressed as a frequency in Hz.
    pub fn to_hz(self) -> Result<f64> {
        let si = self.value * self.unit.si_scale();
        match self.unit.kind() {
            SpectralKind::Frequency => Ok(si),
            SpectralKind::Wavelength => Ok(SPEED_OF_LIGHT / si),
            SpectralKind::Velocity => Err(CubeError::IncompatibleUnit {
                unit: self.unit.symbol().to_string(),
                context: "a rest value".to_string(),
            }),
        }
    }
}

/// Options for reinterpreting a spectral axis in a new unit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpectralUnitOptions {
    /// Doppler convention; required when converting to a velocity.
    /// Defaults to the axis's own convention when it already is a velocity.
    pub velocity_convention: Option<VelocityConvention>,
    /// Rest frequency or wavelength. Falls back to the coordinate system's
    /// stored rest frequency.
    pub rest_value: Option<RestValue>,
}

impl SpectralUnitOptions {
    /// Options with the given Doppler convention.
    pub fn with_convention(mut self, convention: VelocityConvention) -> Self {
        self.velocity_convention = Some(convention);
        self
    }

    /// Options with the given rest value.
    pub fn with_rest_value(mut self, value: f64, unit: SpectralUnit) -> Self {
        self.rest_value = Some(RestValue::new(value, unit));
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<()> {
        if let Some(rest) = self.rest_value {
            if !rest.value.is_finite() || rest.value <= 0.0 {
                return Err(CubeError::IncompatibleUnit {
                    unit: format!("{} {}", rest.value, rest.unit),
                    context: "a rest value (must be finite and positive)".to_string(),
                });
            }
            rest.to_hz()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, rel: f64) -> bool {
        (a - b).abs() <= rel * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn parses_fits_unit_spellings() {
        assert_eq!("km s-1".parse::<SpectralUnit>().unwrap(), SpectralUnit::KilometrePerSecond);
        assert_eq!("GHz".parse::<SpectralUnit>().unwrap(), SpectralUnit::GHz);
        assert!(matches!(
            "furlong".parse::<SpectralUnit>(),
            Err(CubeError::UnknownUnit { .. })
        ));
    }

    #[test]
    fn ctype_recognition_ignores_algorithm_code() {
        assert_eq!(SpectralType::from_ctype("FREQ"), Some(SpectralType::Frequency));
        assert_eq!(
            SpectralType::from_ctype("VOPT-F2W"),
            Some(SpectralType::Velocity(VelocityConvention::Optical))
        );
        assert_eq!(SpectralType::from_ctype("RA---TAN"), None);
        assert_eq!(ctype_basis("VOPT-F2W"), Some('F'));
        assert_eq!(ctype_basis("VOPT"), Some('W'));
    }

    #[test]
    fn frequency_wavelength_round_trip() {
        let f = 1.420405751e9;
        let w = convert_si(f, SpectralType::Frequency, SpectralType::Wavelength, None).unwrap();
        assert!(close(w, 0.2110611405, 1e-9));
        let back = convert_si(w, SpectralType::Wavelength, SpectralType::Frequency, None).unwrap();
        assert!(close(back, f, 1e-12));
    }

    #[test]
    fn velocity_conventions_agree_at_rest() {
        let rest = 1e9;
        for conv in [
            VelocityConvention::Radio,
            VelocityConvention::Optical,
            VelocityConvention::Relativistic,
        ] {
            let v = convert_si(rest, SpectralType::Frequency, SpectralType::Velocity(conv), Some(rest))
                .unwrap();
            assert!(v.abs() < 1e-6, "{conv:?} gave {v}");
        }
    }

    #[test]
    fn radio_velocity_is_linear_in_frequency() {
        let rest = 1e9;
        let v = convert_si(
            0.999e9,
            SpectralType::Frequency,
            SpectralType::Velocity(VelocityConvention::Radio),
            Some(rest),
        )
        .unwrap();
        assert!(close(v, SPEED_OF_LIGHT * 1e-3, 1e-9));
    }

    #[test]
    fn velocity_without_rest_fails() {
        let err = convert_si(
            1e9,
            SpectralType::Frequency,
            SpectralType::Velocity(VelocityConvention::Radio),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CubeError::MissingRestValue { .. }));
    }

    #[test]
    fn rest_wavelength_converts_to_hz() {
        let rest = RestValue::new(21.106114, SpectralUnit::Centimetre);
        assert!(close(rest.to_hz().unwrap(), 1.420405751e9, 1e-6));
        assert!(RestValue::new(1.0, SpectralUnit::MetrePerSecond).to_hz().is_err());
    }

    #[test]
    fn options_validate_rest_value() {
        assert!(SpectralUnitOptions::default().validate().is_ok());
        let bad = SpectralUnitOptions::default().with_rest_value(-1.0, SpectralUnit::GHz);
        assert!(bad.validate().is_err());
    }
}
