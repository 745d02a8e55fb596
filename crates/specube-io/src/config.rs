//! Read and write options.

use specube_core::{CubeError, Result};

// ── HduSelector ────────────────────────────────────────────────────

/// Which image to read from a file holding several.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HduSelector {
    /// Zero-based position in the file.
    Index(usize),
    /// Image name as recorded in the file.
    Name(String),
}

impl From<usize> for HduSelector {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for HduSelector {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

// ── ReadOptions ────────────────────────────────────────────────────

/// Options for [`read`](crate::read) and friends.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Adapter name. `None` = detect from the path. Default: `None`.
    pub format: Option<String>,
    /// Image to read from multi-image files. `None` = the first.
    pub hdu: Option<HduSelector>,
    /// Keep length-1 axes instead of dropping them. Default: false.
    pub keep_degenerate: bool,
    /// Ignore any stored validity array. Default: false.
    pub skip_valid: bool,
}

impl ReadOptions {
    /// Options forcing a named format.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Options selecting one image of a multi-image file.
    pub fn with_hdu(mut self, hdu: impl Into<HduSelector>) -> Self {
        self.hdu = Some(hdu.into());
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<()> {
        if let Some(format) = &self.format {
            check_format_name(format)?;
        }
        if let Some(HduSelector::Name(name)) = &self.hdu {
            if name.trim().is_empty() {
                return Err(CubeError::InvalidSelection {
                    reason: "image name is empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

// ── WriteOptions ───────────────────────────────────────────────────

/// Options for [`WriteCube::write`](crate::WriteCube::write).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Adapter name. `None` = detect from the path. Default: `None`.
    pub format: Option<String>,
    /// Replace an existing file. Default: false.
    pub overwrite: bool,
}

impl WriteOptions {
    /// Options that replace existing files.
    pub fn overwriting() -> Self {
        Self {
            overwrite: true,
            ..Self::default()
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<()> {
        match &self.format {
            Some(format) => check_format_name(format),
            None => Ok(()),
        }
    }
}

fn check_format_name(format: &str) -> Result<()> {
    if format.trim().is_empty() {
        return Err(CubeError::UnknownFormat {
            target: "an empty format name".to_string(),
        });
    }
    Ok(())
}
