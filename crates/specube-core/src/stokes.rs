//! The fixed set of polarization (Stokes) component keys.

use std::fmt;
use std::str::FromStr;

use crate::error::CubeError;

/// Valid component keys, in canonical order.
pub const VALID_STOKES: [&str; 8] = ["I", "Q", "U", "V", "RR", "LL", "RL", "LR"];

/// Human-readable rendering of [`VALID_STOKES`] used in error messages.
pub const VALID_STOKES_LIST: &str = "I, Q, U, V, RR, LL, RL, LR";

/// Whether `key` names a valid Stokes component.
pub fn is_valid_stokes(key: &str) -> bool {
    VALID_STOKES.contains(&key)
}

/// A polarization state.
///
/// `I`, `Q`, `U`, `V` are the classical Stokes parameters; `RR`, `LL`,
/// `RL`, `LR` are circular-feed correlation products.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StokesParameter {
    /// Total intensity.
    I,
    /// Linear polarization, 0/90 degrees.
    Q,
    /// Linear polarization, 45/135 degrees.
    U,
    /// Circular polarization.
    V,
    /// Right-right circular correlation.
    RR,
    /// Left-left circular correlation.
    LL,
    /// Right-left circular correlation.
    RL,
    /// Left-right circular correlation.
    LR,
}

impl StokesParameter {
    /// All parameters in canonical order.
    pub const ALL: [StokesParameter; 8] = [
        Self::I,
        Self::Q,
        Self::U,
        Self::V,
        Self::RR,
        Self::LL,
        Self::RL,
        Self::LR,
    ];

    /// The component key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::I => "I",
            Self::Q => "Q",
            Self::U => "U",
            Self::V => "V",
            Self::RR => "RR",
            Self::LL => "LL",
            Self::RL => "RL",
            Self::LR => "LR",
        }
    }

    /// FITS `STOKES` axis code (WCS Paper I, table 7).
    pub fn fits_code(self) -> i32 {
        match self {
            Self::I => 1,
            Self::Q => 2,
            Self::U => 3,
            Self::V => 4,
            Self::RR => -1,
            Self::LL => -2,
            Self::RL => -3,
            Self::LR => -4,
        }
    }

    /// Inverse of [`fits_code`](Self::fits_code).
    ///
    /// Linear-feed products (`XX`, `YY`, ...; codes -5 to -8) have no
    /// counterpart in the valid set and are rejected.
    pub fn from_fits_code(code: i32) -> Result<Self, CubeError> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.fits_code() == code)
            .ok_or_else(|| CubeError::InvalidComponentKey {
                key: format!("STOKES={code}"),
            })
    }
}

impl fmt::Display for StokesParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StokesParameter {
    type Err = CubeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| CubeError::InvalidComponentKey { key: s.to_string() })
    }
}
