//! Array shapes and numpy-style broadcasting rules.

use smallvec::SmallVec;
use std::fmt;

/// Dimensions of an array, outermost (slowest-varying) first.
///
/// Four inline slots cover position-position-spectral-Stokes data without
/// a heap allocation.
pub type Shape = SmallVec<[usize; 4]>;

/// Renders a shape as a tuple, e.g. `(5, 20, 30)` or `(7,)`.
///
/// Error messages rely on this exact rendering.
pub struct ShapeDisplay<'a>(pub &'a [usize]);

impl fmt::Display for ShapeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        if self.0.len() == 1 {
            write!(f, ",")?;
        }
        write!(f, ")")
    }
}

/// Returns `true` if `small` can be broadcast onto `large` without
/// growing `large`.
///
/// `small` may have fewer dimensions (it is padded on the left with
/// size-1 axes). After right-aligning, every axis of `small` must equal
/// the matching axis of `large` or be 1.
///
/// ```
/// use specube_core::shape::is_broadcastable_and_smaller;
///
/// assert!(is_broadcastable_and_smaller(&[20, 30], &[5, 20, 30]));
/// assert!(is_broadcastable_and_smaller(&[1, 20, 1], &[5, 20, 30]));
/// assert!(!is_broadcastable_and_smaller(&[5, 20, 15], &[5, 20, 30]));
/// assert!(!is_broadcastable_and_smaller(&[2, 5, 20, 30], &[5, 20, 30]));
/// ```
pub fn is_broadcastable_and_smaller(small: &[usize], large: &[usize]) -> bool {
    if small.len() > large.len() {
        return false;
    }
    small
        .iter()
        .rev()
        .zip(large.iter().rev())
        .all(|(&s, &l)| s == l || s == 1)
}

/// Combined shape of two mutually broadcastable shapes, or `None`.
///
/// This is the symmetric rule: aligned from the right, each pair of axes
/// must be equal or one of them must be 1.
pub fn broadcast_shapes(a: &[usize], b: &[usize]) -> Option<Shape> {
    let ndim = a.len().max(b.len());
    let mut out: Shape = SmallVec::with_capacity(ndim);
    for i in 0..ndim {
        // Index from the right; missing axes behave as 1.
        let da = axis_from_right(a, ndim - 1 - i);
        let db = axis_from_right(b, ndim - 1 - i);
        let d = match (da, db) {
            (x, y) if x == y => x,
            (1, y) => y,
            (x, 1) => x,
            _ => return None,
        };
        out.push(d);
    }
    Some(out)
}

fn axis_from_right(shape: &[usize], k: usize) -> usize {
    if k < shape.len() {
        shape[shape.len() - 1 - k]
    } else {
        1
    }
}

/// Total number of elements for a shape.
pub fn element_count(shape: &[usize]) -> usize {
    shape.iter().product()
}
