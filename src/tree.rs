//! Vector arithmetic over nested containers of arrays
//!
//! Solvers in this crate are generic over the optimization variable: it
//! can be a single `ndarray` of any dimension, a `Vec` of such arrays, or
//! a tuple nesting either, to arbitrary depth. The [`TreeVector`] trait
//! captures the small set of operations the solvers need: elementwise
//! scalar-multiply-and-add, subtraction, inner product, and L2 norm, each
//! applied leaf-wise and aggregated over the whole structure.

use ndarray::prelude::*;
use ndarray::NdFloat;
use num_traits::Float;

/// Vector-space operations over a (possibly nested) container of arrays.
///
/// The two sides of every binary operation must have identical structure;
/// mismatches propagate as shape panics from the underlying arithmetic.
pub trait TreeVector<S: NdFloat>: Clone {
    /// `self + alpha * other`, leaf-wise.
    fn add_scaled(&self, alpha: S, other: &Self) -> Self;

    /// `self - other`, leaf-wise.
    fn sub(&self, other: &Self) -> Self;

    /// Inner product aggregated over all leaves.
    fn vdot(&self, other: &Self) -> S;

    /// Squared L2 norm aggregated over all leaves.
    fn l2_norm_squared(&self) -> S {
        self.vdot(self)
    }

    /// L2 norm aggregated over all leaves.
    fn l2_norm(&self) -> S {
        Float::sqrt(self.l2_norm_squared())
    }
}

impl<S, D> TreeVector<S> for Array<S, D>
where
    S: NdFloat,
    D: Dimension,
{
    fn add_scaled(&self, alpha: S, other: &Self) -> Self {
        let mut out = self.clone();
        out.scaled_add(alpha, other);
        out
    }

    fn sub(&self, other: &Self) -> Self {
        self - other
    }

    fn vdot(&self, other: &Self) -> S {
        // elementwise, so it works for any dimension
        self.iter()
            .zip(other.iter())
            .fold(S::zero(), |acc, (a, b)| acc + *a * *b)
    }
}

impl<S, T> TreeVector<S> for Vec<T>
where
    S: NdFloat,
    T: TreeVector<S>,
{
    fn add_scaled(&self, alpha: S, other: &Self) -> Self {
        debug_assert_eq!(self.len(), other.len());
        self.iter()
            .zip(other.iter())
            .map(|(a, b)| a.add_scaled(alpha, b))
            .collect()
    }

    fn sub(&self, other: &Self) -> Self {
        debug_assert_eq!(self.len(), other.len());
        self.iter().zip(other.iter()).map(|(a, b)| a.sub(b)).collect()
    }

    fn vdot(&self, other: &Self) -> S {
        debug_assert_eq!(self.len(), other.len());
        self.iter()
            .zip(other.iter())
            .fold(S::zero(), |acc, (a, b)| acc + a.vdot(b))
    }
}

impl<S, A, B> TreeVector<S> for (A, B)
where
    S: NdFloat,
    A: TreeVector<S>,
    B: TreeVector<S>,
{
    fn add_scaled(&self, alpha: S, other: &Self) -> Self {
        (
            self.0.add_scaled(alpha, &other.0),
            self.1.add_scaled(alpha, &other.1),
        )
    }

    fn sub(&self, other: &Self) -> Self {
        (self.0.sub(&other.0), self.1.sub(&other.1))
    }

    fn vdot(&self, other: &Self) -> S {
        self.0.vdot(&other.0) + self.1.vdot(&other.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn array_ops() {
        let a = array![1., 2., 3.];
        let b = array![4., 5., 6.];
        assert_abs_diff_eq!(TreeVector::add_scaled(&a, 2., &b), array![9., 12., 15.]);
        assert_abs_diff_eq!(TreeVector::sub(&b, &a), array![3., 3., 3.]);
        assert_abs_diff_eq!(a.vdot(&b), 32.);
        assert_abs_diff_eq!(a.l2_norm_squared(), 14.);
        assert_abs_diff_eq!(array![3., 4.].l2_norm(), 5.);
    }

    #[test]
    fn array2_ops() {
        let a = array![[1., 2.], [3., 4.]];
        assert_abs_diff_eq!(a.vdot(&a), 30.);
        assert_abs_diff_eq!(a.l2_norm(), 30f64.sqrt());
    }

    #[test]
    fn vec_of_arrays() {
        let a = vec![array![1., 2.], array![3.]];
        let b = vec![array![1., 1.], array![1.]];
        let c = a.add_scaled(-1., &b);
        assert_abs_diff_eq!(c[0], array![0., 1.]);
        assert_abs_diff_eq!(c[1], array![2.]);
        assert_abs_diff_eq!(a.vdot(&b), 6.);
    }

    #[test]
    fn nested_tuple() {
        let a = (array![1., 2.], vec![array![2.]]);
        let b = (array![0., 1.], vec![array![3.]]);
        let c = a.add_scaled(2., &b);
        assert_abs_diff_eq!(c.0, array![1., 4.]);
        assert_abs_diff_eq!((c.1)[0], array![8.]);
        assert_abs_diff_eq!(a.vdot(&b), 8.);
        assert_abs_diff_eq!(a.l2_norm_squared(), 9.);
    }
}
