//! Test fixtures and mock types for specube development.
//!
//! Provides seeded random arrays and masks, standard coordinate systems,
//! ready-made cubes, and a [`MockImageTool`] standing in for the CASA
//! image tool.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod mock_casa;

pub use fixtures::*;
pub use mock_casa::{casa_coordsys, MockImageTool, MockImageToolLog};
