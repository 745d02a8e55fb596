//! Validity masks for spectral cubes.
//!
//! A mask is a boolean predicate over array positions, bound to the world
//! coordinate system of the data it describes. Four variants share one
//! [`Mask`] type:
//!
//! - [`BooleanArrayMask`]: a dense stored array.
//! - [`LazyMask`]: a predicate applied to bound data on demand.
//! - [`CompositeMask`]: deferred AND/OR of two masks.
//! - [`InvertedMask`]: deferred NOT.
//!
//! Masks are evaluated over a [`View`], a per-axis rectangular selection.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod mask;
pub mod view;

pub use mask::{
    BooleanArrayMask, CompositeMask, InvertedMask, LazyMask, Mask, MaskOp, Predicate, SharedArray,
};
pub use view::View;
