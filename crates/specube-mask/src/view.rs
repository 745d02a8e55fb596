//! Rectangular region selections over array axes.

use ndarray::{ArrayViewD, Slice};
use smallvec::SmallVec;
use specube_core::{CubeError, Result, Shape};

/// A per-axis selection, outermost axis first.
///
/// Axes without an explicit [`Slice`] select their full range, so
/// [`View::all()`] selects the entire domain of any array. Negative
/// `start`/`end` count from the end of the axis, as in `ndarray`.
///
/// ```
/// use ndarray::Slice;
/// use specube_mask::View;
///
/// let v = View::all().axis(Slice::from(1..3)).axis(Slice::from(..));
/// assert_eq!(v.shape_of(&[5, 20, 30]).unwrap().as_slice(), &[2, 20, 30]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct View {
    slices: SmallVec<[Slice; 4]>,
}

impl View {
    /// Select everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Build from explicit per-axis slices.
    pub fn new<I: IntoIterator<Item = Slice>>(slices: I) -> Self {
        Self {
            slices: slices.into_iter().collect(),
        }
    }

    /// Append the selection for the next axis.
    pub fn axis(mut self, slice: Slice) -> Self {
        self.slices.push(slice);
        self
    }

    /// Number of explicitly selected axes.
    pub fn explicit_axes(&self) -> usize {
        self.slices.len()
    }

    /// Whether this view selects every element.
    pub fn is_all(&self) -> bool {
        self.slices
            .iter()
            .all(|s| s.start == 0 && s.end.is_none() && s.step == 1)
    }

    /// Resolve against a shape: one bounds-checked, non-negative slice per axis.
    ///
    /// Returns [`CubeError::InvalidView`] for zero steps, out-of-range
    /// bounds, inverted ranges, or more slices than axes.
    pub fn resolve(&self, shape: &[usize]) -> Result<Vec<Slice>> {
        if self.slices.len() > shape.len() {
            return Err(CubeError::InvalidView {
                reason: format!(
                    "{} slices given for a {}-dimensional array",
                    self.slices.len(),
                    shape.len()
                ),
            });
        }
        let mut out = Vec::with_capacity(shape.len());
        for (axis, &len) in shape.iter().enumerate() {
            let s = self.slices.get(axis).copied().unwrap_or(Slice::from(..));
            if s.step == 0 {
                return Err(CubeError::InvalidView {
                    reason: format!("axis {axis}: step must be non-zero"),
                });
            }
            let start = absolute(s.start, len).ok_or_else(|| out_of_range(axis, s, len))?;
            let end = match s.end {
                Some(e) => absolute(e, len).ok_or_else(|| out_of_range(axis, s, len))?,
                None => len,
            };
            if start > end {
                return Err(out_of_range(axis, s, len));
            }
            out.push(Slice::new(start as isize, Some(end as isize), s.step));
        }
        Ok(out)
    }

    /// Shape of the selection when applied to an array of `shape`.
    pub fn shape_of(&self, shape: &[usize]) -> Result<Shape> {
        Ok(self
            .resolve(shape)?
            .iter()
            .map(|s| {
                let span = (s.end.unwrap_or(0) - s.start) as usize;
                let step = s.step.unsigned_abs();
                span.div_ceil(step)
            })
            .collect())
    }

    /// Narrow an array view to this selection. No elements are copied.
    pub fn apply<'a, A>(&self, mut array: ArrayViewD<'a, A>) -> Result<ArrayViewD<'a, A>> {
        let resolved = self.resolve(array.shape())?;
        array.slice_each_axis_inplace(|desc| resolved[desc.axis.index()]);
        Ok(array)
    }
}

impl From<Vec<Slice>> for View {
    fn from(slices: Vec<Slice>) -> Self {
        Self::new(slices)
    }
}

fn absolute(index: isize, len: usize) -> Option<usize> {
    let len = len as isize;
    let i = if index < 0 { len + index } else { index };
    (0..=len).contains(&i).then_some(i as usize)
}

fn out_of_range(axis: usize, slice: Slice, len: usize) -> CubeError {
    CubeError::InvalidView {
        reason: format!("axis {axis}: {slice:?} is out of range for length {len}"),
    }
}
