//! Validity masks: dense, lazy, and composite.
//!
//! A [`Mask`] answers "which positions are valid" over a region of the
//! array it is bound to. Composition never materialises: `a.and(&b)`
//! records both operands and evaluates them pointwise on demand, so long
//! chains of `with_mask` calls cost one small node each.

use std::fmt;
use std::sync::Arc;

use ndarray::{ArrayD, ArrayViewD, Zip};
use specube_core::{
    broadcast_shapes, check_equality, is_broadcastable_and_smaller, CoordinateSystem, CubeError,
    Result, Shape,
};

use crate::view::View;

/// Shared, immutable-by-convention handle to cube data.
///
/// Cloning the handle never copies elements. Callers must not mutate the
/// array behind a handle while derived cubes or masks still reference it;
/// nothing guards against that.
pub type SharedArray = Arc<ArrayD<f64>>;

/// Elementwise validity predicate for [`LazyMask`].
pub type Predicate = Arc<dyn Fn(f64) -> bool + Send + Sync>;

/// Boolean combinator of a [`CompositeMask`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskOp {
    /// Both operands must include the position.
    And,
    /// Either operand may include the position.
    Or,
}

/// Dense boolean mask bound to a coordinate system.
///
/// `true` marks an included (valid) sample.
#[derive(Clone, Debug)]
pub struct BooleanArrayMask {
    mask: Arc<ArrayD<bool>>,
    wcs: Arc<CoordinateSystem>,
}

impl BooleanArrayMask {
    /// Wrap an owned boolean array.
    pub fn new(mask: ArrayD<bool>, wcs: CoordinateSystem) -> Self {
        Self {
            mask: Arc::new(mask),
            wcs: Arc::new(wcs),
        }
    }

    /// Wrap already-shared storage.
    pub fn from_shared(mask: Arc<ArrayD<bool>>, wcs: Arc<CoordinateSystem>) -> Self {
        Self { mask, wcs }
    }

    /// The stored array.
    pub fn array(&self) -> &ArrayD<bool> {
        &self.mask
    }
}

/// Mask computed on demand by applying a predicate to bound data.
#[derive(Clone)]
pub struct LazyMask {
    func: Predicate,
    data: SharedArray,
    wcs: Arc<CoordinateSystem>,
}

impl LazyMask {
    /// Bind `func` to `data`.
    pub fn new<F>(func: F, data: SharedArray, wcs: CoordinateSystem) -> Self
    where
        F: Fn(f64) -> bool + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            data,
            wcs: Arc::new(wcs),
        }
    }

    /// Include every finite sample of `data`.
    pub fn finite(data: SharedArray, wcs: CoordinateSystem) -> Self {
        Self::new(f64::is_finite, data, wcs)
    }

    /// The bound data.
    pub fn data(&self) -> &SharedArray {
        &self.data
    }
}

impl fmt::Debug for LazyMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyMask")
            .field("shape", &self.data.shape())
            .field("wcs", &self.wcs)
            .finish_non_exhaustive()
    }
}

/// Deferred combination of two masks.
#[derive(Clone, Debug)]
pub struct CompositeMask {
    op: MaskOp,
    left: Arc<Mask>,
    right: Arc<Mask>,
    shape: Shape,
}

impl CompositeMask {
    /// The combinator.
    pub fn op(&self) -> MaskOp {
        self.op
    }

    /// Left operand.
    pub fn left(&self) -> &Mask {
        &self.left
    }

    /// Right operand.
    pub fn right(&self) -> &Mask {
        &self.right
    }
}

/// Logical negation of another mask.
#[derive(Clone, Debug)]
pub struct InvertedMask {
    inner: Arc<Mask>,
}

impl InvertedMask {
    /// The negated mask.
    pub fn inner(&self) -> &Mask {
        &self.inner
    }
}

/// A boolean validity predicate over array positions.
///
/// # Examples
///
/// ```
/// use ndarray::{ArrayD, IxDyn};
/// use specube_core::CoordinateSystem;
/// use specube_mask::{BooleanArrayMask, Mask, View};
///
/// let wcs = CoordinateSystem::new(1);
/// let a: Mask = BooleanArrayMask::new(
///     ArrayD::from_shape_vec(IxDyn(&[3]), vec![true, true, false]).unwrap(),
///     wcs.clone(),
/// )
/// .into();
/// let b: Mask = BooleanArrayMask::new(
///     ArrayD::from_shape_vec(IxDyn(&[3]), vec![false, true, true]).unwrap(),
///     wcs,
/// )
/// .into();
/// let both = a.and(&b).unwrap();
/// assert_eq!(both.include(&View::all()).unwrap().as_slice().unwrap(), &[false, true, false]);
/// ```
#[derive(Clone, Debug)]
pub enum Mask {
    /// Dense boolean array.
    Array(BooleanArrayMask),
    /// Predicate over bound data.
    Lazy(LazyMask),
    /// AND/OR of two masks.
    Composite(CompositeMask),
    /// NOT of a mask.
    Inverted(InvertedMask),
}

impl Mask {
    /// Declared shape of the mask.
    ///
    /// Composites report the broadcast of their operands' shapes.
    pub fn shape(&self) -> Shape {
        match self {
            Self::Array(m) => m.mask.shape().iter().copied().collect(),
            Self::Lazy(m) => m.data.shape().iter().copied().collect(),
            Self::Composite(m) => m.shape.clone(),
            Self::Inverted(m) => m.inner.shape(),
        }
    }

    /// Coordinate system the mask is bound to.
    ///
    /// For composites this is the left-most leaf's system.
    pub fn wcs(&self) -> &CoordinateSystem {
        match self {
            Self::Array(m) => &m.wcs,
            Self::Lazy(m) => &m.wcs,
            Self::Composite(m) => m.left.wcs(),
            Self::Inverted(m) => m.inner.wcs(),
        }
    }

    /// Evaluate validity over `view` of the mask's own shape.
    pub fn include(&self, view: &View) -> Result<ArrayD<bool>> {
        let shape = self.shape();
        self.evaluate(&shape, view)
    }

    /// Evaluate validity over `view` after broadcasting to `shape`.
    ///
    /// Returns [`CubeError::MaskShape`] if the mask cannot be broadcast
    /// onto `shape`.
    pub fn include_for(&self, shape: &[usize], view: &View) -> Result<ArrayD<bool>> {
        let own = self.shape();
        if !is_broadcastable_and_smaller(&own, shape) {
            return Err(CubeError::MaskShape {
                mask: own.to_vec(),
                data: shape.to_vec(),
            });
        }
        self.evaluate(shape, view)
    }

    /// Elementwise negation of [`include`](Self::include).
    pub fn exclude(&self, view: &View) -> Result<ArrayD<bool>> {
        Ok(self.include(view)?.mapv(|b| !b))
    }

    /// Number of included positions over the mask's full domain.
    pub fn count_included(&self) -> Result<usize> {
        Ok(self.include(&View::all())?.iter().filter(|&&b| b).count())
    }

    /// `data` over `view`, with excluded positions replaced by `fill`.
    pub fn filled(&self, data: ArrayViewD<'_, f64>, fill: f64, view: &View) -> Result<ArrayD<f64>> {
        let include = self.include_for(data.shape(), view)?;
        let selected = view.apply(data)?;
        let mut out = selected.to_owned();
        Zip::from(&mut out).and(&include).for_each(|v, &keep| {
            if !keep {
                *v = fill;
            }
        });
        Ok(out)
    }

    /// Deferred logical AND.
    ///
    /// Returns [`CubeError::MaskBroadcast`] if the shapes are not mutually
    /// broadcastable.
    pub fn and(&self, other: &Mask) -> Result<Mask> {
        self.combine(MaskOp::And, other)
    }

    /// Deferred logical OR.
    pub fn or(&self, other: &Mask) -> Result<Mask> {
        self.combine(MaskOp::Or, other)
    }

    fn combine(&self, op: MaskOp, other: &Mask) -> Result<Mask> {
        let (left, right) = (self.shape(), other.shape());
        let shape = broadcast_shapes(&left, &right).ok_or_else(|| CubeError::MaskBroadcast {
            left: left.to_vec(),
            right: right.to_vec(),
        })?;
        tracing::trace!(?op, ?shape, "composing masks");
        Ok(Mask::Composite(CompositeMask {
            op,
            left: Arc::new(self.clone()),
            right: Arc::new(other.clone()),
            shape,
        }))
    }

    /// Check that every leaf is bound to a system equal to `wcs`.
    ///
    /// Returns [`CubeError::CoordinateMismatch`] on the first mismatch.
    pub fn validate_wcs(&self, wcs: &CoordinateSystem) -> Result<()> {
        match self {
            Self::Array(m) => check_leaf(&m.wcs, wcs),
            Self::Lazy(m) => check_leaf(&m.wcs, wcs),
            Self::Composite(m) => {
                m.left.validate_wcs(wcs)?;
                m.right.validate_wcs(wcs)
            }
            Self::Inverted(m) => m.inner.validate_wcs(wcs),
        }
    }

    /// The same mask with every leaf rebound to `wcs`.
    ///
    /// Arrays and predicates are shared, not copied.
    pub fn with_wcs(&self, wcs: &CoordinateSystem) -> Mask {
        let shared = Arc::new(wcs.clone());
        self.rebind(&shared)
    }

    fn rebind(&self, wcs: &Arc<CoordinateSystem>) -> Mask {
        match self {
            Self::Array(m) => Self::Array(BooleanArrayMask {
                mask: Arc::clone(&m.mask),
                wcs: Arc::clone(wcs),
            }),
            Self::Lazy(m) => Self::Lazy(LazyMask {
                func: Arc::clone(&m.func),
                data: Arc::clone(&m.data),
                wcs: Arc::clone(wcs),
            }),
            Self::Composite(m) => Self::Composite(CompositeMask {
                op: m.op,
                left: Arc::new(m.left.rebind(wcs)),
                right: Arc::new(m.right.rebind(wcs)),
                shape: m.shape.clone(),
            }),
            Self::Inverted(m) => Self::Inverted(InvertedMask {
                inner: Arc::new(m.inner.rebind(wcs)),
            }),
        }
    }

    /// Whether the mask is a single dense array.
    pub fn is_array_backed(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    fn evaluate(&self, target: &[usize], view: &View) -> Result<ArrayD<bool>> {
        match self {
            Self::Array(m) => {
                let full = broadcast_view(&m.mask, target)?;
                Ok(view.apply(full)?.to_owned())
            }
            Self::Lazy(m) => {
                let full = broadcast_view(&m.data, target)?;
                let func = &m.func;
                Ok(view.apply(full)?.mapv(|x| func(x)))
            }
            Self::Composite(m) => {
                let mut out = m.left.evaluate(target, view)?;
                let right = m.right.evaluate(target, view)?;
                match m.op {
                    MaskOp::And => Zip::from(&mut out).and(&right).for_each(|a, &b| *a = *a && b),
                    MaskOp::Or => Zip::from(&mut out).and(&right).for_each(|a, &b| *a = *a || b),
                }
                Ok(out)
            }
            Self::Inverted(m) => Ok(m.inner.evaluate(target, view)?.mapv(|b| !b)),
        }
    }
}

fn broadcast_view<'a, A>(array: &'a ArrayD<A>, target: &[usize]) -> Result<ArrayViewD<'a, A>> {
    if array.shape() == target {
        return Ok(array.view());
    }
    array
        .broadcast(target)
        .ok_or_else(|| CubeError::MaskShape {
            mask: array.shape().to_vec(),
            data: target.to_vec(),
        })
}

fn check_leaf(leaf: &CoordinateSystem, wcs: &CoordinateSystem) -> Result<()> {
    if check_equality(leaf, wcs) {
        Ok(())
    } else {
        Err(CubeError::CoordinateMismatch {
            context: "Mask coordinate system does not match the cube's".to_string(),
        })
    }
}

impl From<BooleanArrayMask> for Mask {
    fn from(m: BooleanArrayMask) -> Self {
        Self::Array(m)
    }
}

impl From<LazyMask> for Mask {
    fn from(m: LazyMask) -> Self {
        Self::Lazy(m)
    }
}

impl std::ops::Not for &Mask {
    type Output = Mask;

    fn not(self) -> Mask {
        Mask::Inverted(InvertedMask {
            inner: Arc::new(self.clone()),
        })
    }
}

impl std::ops::Not for Mask {
    type Output = Mask;

    fn not(self) -> Mask {
        Mask::Inverted(InvertedMask {
            inner: Arc::new(self),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{IxDyn, Slice};
    use proptest::prelude::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const SHAPE: [usize; 3] = [3, 4, 5];

    fn wcs() -> CoordinateSystem {
        CoordinateSystem::new(3).with_ctype(["RA---TAN", "DEC--TAN", "FREQ"])
    }

    fn bools(shape: &[usize], values: Vec<bool>) -> ArrayD<bool> {
        ArrayD::from_shape_vec(IxDyn(shape), values).unwrap()
    }

    fn random(seed: u64, threshold: f64) -> ArrayD<bool> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let n: usize = SHAPE.iter().product();
        bools(&SHAPE, (0..n).map(|_| rng.random::<f64>() > threshold).collect())
    }

    fn array_mask(a: ArrayD<bool>) -> Mask {
        BooleanArrayMask::new(a, wcs()).into()
    }

    #[test]
    fn array_mask_include_returns_stored_values() {
        let a = random(1, 0.3);
        let m = array_mask(a.clone());
        assert_eq!(m.include(&View::all()).unwrap(), a);
        assert_eq!(m.shape().as_slice(), &SHAPE);
        assert!(m.is_array_backed());
    }

    #[test]
    fn include_over_view_selects_region() {
        let a = random(2, 0.5);
        let m = array_mask(a.clone());
        let v = View::new([Slice::from(1..2), Slice::from(..), Slice::from(2..4)]);
        let got = m.include(&v).unwrap();
        assert_eq!(got.shape(), &[1, 4, 2]);
        assert_eq!(got[[0, 3, 1]], a[[1, 3, 3]]);
    }

    #[test]
    fn lazy_mask_evaluates_predicate() {
        let data = ArrayD::from_shape_vec(IxDyn(&[4]), vec![1.0, f64::NAN, 3.0, f64::INFINITY])
            .unwrap();
        let m: Mask = LazyMask::finite(Arc::new(data), CoordinateSystem::new(1)).into();
        assert_eq!(
            m.include(&View::all()).unwrap().as_slice().unwrap(),
            &[true, false, true, false]
        );
        assert_eq!(m.count_included().unwrap(), 2);
    }

    #[test]
    fn lazy_mask_tracks_shared_data() {
        let data: SharedArray = Arc::new(ArrayD::from_elem(IxDyn(&[2, 2]), 5.0));
        let m = LazyMask::new(|x| x > 4.0, Arc::clone(&data), CoordinateSystem::new(2));
        assert!(Arc::ptr_eq(m.data(), &data));
    }

    #[test]
    fn and_is_pointwise_conjunction() {
        let (a, b) = (random(3, 0.2), random(4, 0.4));
        let both = array_mask(a.clone()).and(&array_mask(b.clone())).unwrap();
        let expected = ndarray::Zip::from(&a).and(&b).map_collect(|&x, &y| x && y);
        assert_eq!(both.include(&View::all()).unwrap(), expected);
    }

    #[test]
    fn or_and_not_are_pointwise() {
        let (a, b) = (random(5, 0.5), random(6, 0.5));
        let either = array_mask(a.clone()).or(&array_mask(b.clone())).unwrap();
        let expected = ndarray::Zip::from(&a).and(&b).map_collect(|&x, &y| x || y);
        assert_eq!(either.include(&View::all()).unwrap(), expected);
        let neg = !array_mask(a.clone());
        assert_eq!(neg.include(&View::all()).unwrap(), a.mapv(|x| !x));
        assert_eq!(array_mask(a.clone()).exclude(&View::all()).unwrap(), a.mapv(|x| !x));
    }

    #[test]
    fn smaller_mask_broadcasts_in_composite() {
        let plane = bools(&[1, 4, 5], (0..20).map(|i| i % 2 == 0).collect());
        let full = array_mask(random(7, 0.1));
        let small: Mask = BooleanArrayMask::new(plane.clone(), wcs()).into();
        let both = small.and(&full).unwrap();
        assert_eq!(both.shape().as_slice(), &SHAPE);
        let got = both.include(&View::all()).unwrap();
        let full_values = full.include(&View::all()).unwrap();
        for k in 0..3 {
            for j in 0..4 {
                for i in 0..5 {
                    assert_eq!(got[[k, j, i]], plane[[0, j, i]] && full_values[[k, j, i]]);
                }
            }
        }
    }

    #[test]
    fn and_rejects_incompatible_shapes() {
        let a = array_mask(random(8, 0.5));
        let b: Mask = BooleanArrayMask::new(ArrayD::from_elem(IxDyn(&[3, 4, 2]), true), wcs()).into();
        let err = a.and(&b).unwrap_err();
        assert!(matches!(err, CubeError::MaskBroadcast { .. }));
    }

    #[test]
    fn include_for_rejects_larger_mask() {
        let m = array_mask(random(9, 0.5));
        let err = m.include_for(&[3, 4, 2], &View::all()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Mask shape is not broadcastable to data shape: (3, 4, 5) vs (3, 4, 2)"
        );
    }

    #[test]
    fn filled_replaces_excluded_samples() {
        let data = ArrayD::from_shape_vec(IxDyn(&[3]), vec![1.0, 2.0, 3.0]).unwrap();
        let m: Mask =
            BooleanArrayMask::new(bools(&[3], vec![true, false, true]), CoordinateSystem::new(1)).into();
        let out = m.filled(data.view(), -1.0, &View::all()).unwrap();
        assert_eq!(out.as_slice().unwrap(), &[1.0, -1.0, 3.0]);
    }

    #[test]
    fn validate_wcs_checks_every_leaf() {
        let other = CoordinateSystem::new(3).with_ctype(["GLON-CAR", "GLAT-CAR", "FREQ"]);
        let a = array_mask(random(10, 0.5));
        let b: Mask = BooleanArrayMask::new(random(11, 0.5), other.clone()).into();
        let both = a.and(&b).unwrap();
        assert!(a.validate_wcs(&wcs()).is_ok());
        assert!(matches!(
            both.validate_wcs(&wcs()),
            Err(CubeError::CoordinateMismatch { .. })
        ));
        let rebound = both.with_wcs(&other);
        assert!(rebound.validate_wcs(&other).is_ok());
        assert_eq!(
            rebound.include(&View::all()).unwrap(),
            both.include(&View::all()).unwrap()
        );
    }

    fn arb_bools() -> impl Strategy<Value = ArrayD<bool>> {
        let n: usize = SHAPE.iter().product();
        prop::collection::vec(any::<bool>(), n).prop_map(|v| bools(&SHAPE, v))
    }

    proptest! {
        #[test]
        fn and_is_commutative(a in arb_bools(), b in arb_bools()) {
            let (ma, mb) = (array_mask(a), array_mask(b));
            let ab = ma.and(&mb).unwrap().include(&View::all()).unwrap();
            let ba = mb.and(&ma).unwrap().include(&View::all()).unwrap();
            prop_assert_eq!(ab, ba);
        }

        #[test]
        fn and_is_associative(a in arb_bools(), b in arb_bools(), c in arb_bools()) {
            let (ma, mb, mc) = (array_mask(a), array_mask(b), array_mask(c));
            let left = ma.and(&mb).unwrap().and(&mc).unwrap();
            let right = ma.and(&mb.and(&mc).unwrap()).unwrap();
            prop_assert_eq!(
                left.include(&View::all()).unwrap(),
                right.include(&View::all()).unwrap()
            );
        }

        #[test]
        fn composite_include_matches_operands(a in arb_bools(), b in arb_bools()) {
            let (ma, mb) = (array_mask(a), array_mask(b));
            let v = View::new([Slice::from(1..3), Slice::from(..), Slice::new(0, None, 2)]);
            let composite = ma.and(&mb).unwrap().include(&v).unwrap();
            let la = ma.include(&v).unwrap();
            let lb = mb.include(&v).unwrap();
            let expected = ndarray::Zip::from(&la).and(&lb).map_collect(|&x, &y| x && y);
            prop_assert_eq!(composite, expected);
        }
    }
}
