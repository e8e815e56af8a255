//! Common proximity operators
//!
//! For a function $`g`$ and scale $`t > 0`$, the proximity operator is
//! ```math
//! \mathrm{prox}_g(v, t) = \mathrm{arg}\!\min_u g(u) + \frac{1}{2t}\|u - v\|_2^2
//! ```
//! Each operator below takes the point, the hyperparameters of $`g`$, and
//! the scale (typically the step size), matching the prox oracle signature
//! expected by the solvers in this module, so they can be passed directly
//! as the `prox` argument.

use ndarray::prelude::*;
use ndarray::NdFloat;

/// Proximity operator of $`g = 0`$, i.e. the identity.
///
/// Hyperparameters of any type are accepted and ignored, so this is a
/// drop-in replacement for any other operator at the same call site.
/// With it, proximal gradient descent reduces to plain (accelerated)
/// gradient descent.
pub fn prox_none<S: NdFloat, T, Pp>(v: T, _hyperparams: &Pp, _scaling: S) -> T {
    v
}

/// Proximity operator of $`g(u) = \lambda \|u\|_1`$, the soft-thresholding
/// operator with threshold `l1reg * scaling`.
pub fn prox_lasso<S, D>(mut v: Array<S, D>, l1reg: &S, scaling: S) -> Array<S, D>
where
    S: NdFloat,
    D: Dimension,
{
    let thresh = *l1reg * scaling;
    v.mapv_inplace(|vi| vi.signum() * (vi.abs() - thresh).max(S::zero()));
    v
}

/// Proximity operator of $`g(u) = \frac{\lambda}{2} \|u\|_2^2`$, a
/// uniform shrinkage by `1 / (1 + l2reg * scaling)`.
pub fn prox_ridge<S, D>(v: Array<S, D>, l2reg: &S, scaling: S) -> Array<S, D>
where
    S: NdFloat,
    D: Dimension,
{
    v / (S::one() + *l2reg * scaling)
}

/// Projection onto the non-negative orthant.
///
/// Hyperparameters and scale are both ignored, as for any
/// parameter-free projection.
pub fn projection_non_negative<S, D, Pp>(mut v: Array<S, D>, _hyperparams: &Pp, _scaling: S) -> Array<S, D>
where
    S: NdFloat,
    D: Dimension,
{
    v.mapv_inplace(|vi| vi.max(S::zero()));
    v
}

/// Projection onto the box `[lower, upper]`, elementwise.
pub fn projection_box<S, D>(mut v: Array<S, D>, bounds: &(S, S), _scaling: S) -> Array<S, D>
where
    S: NdFloat,
    D: Dimension,
{
    let (lower, upper) = *bounds;
    v.mapv_inplace(|vi| vi.max(lower).min(upper));
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn none_is_identity() {
        let v = array![1., -2., 3.];
        assert_abs_diff_eq!(prox_none(v.clone(), &(), 0.7), v);
        // hyperparameters of any type are accepted and ignored
        assert_abs_diff_eq!(prox_none(v.clone(), &1.0, 0.7), v);
    }

    #[test]
    fn lasso_soft_thresholds() {
        let v = array![3., -3., 0.5, -0.5, 0.];
        let out = prox_lasso(v, &1.0, 1.0);
        assert_abs_diff_eq!(out, array![2., -2., 0., 0., 0.]);
    }

    #[test]
    fn lasso_threshold_scales_with_stepsize() {
        let out = prox_lasso(array![3.], &1.0, 0.5);
        assert_abs_diff_eq!(out, array![2.5]);
    }

    #[test]
    fn ridge_shrinks_uniformly() {
        let out = prox_ridge(array![2., -4.], &1.0, 1.0);
        assert_abs_diff_eq!(out, array![1., -2.]);
    }

    #[test]
    fn non_negative_clips() {
        let out = projection_non_negative(array![[1., -2.], [-3., 4.]], &(), 1.0);
        assert_abs_diff_eq!(out, array![[1., 0.], [0., 4.]]);
        let out = projection_non_negative(array![-1., 2.], &0.5, 1.0);
        assert_abs_diff_eq!(out, array![0., 2.]);
    }

    #[test]
    fn box_projection_clamps_both_sides() {
        let out = projection_box(array![-1., 0.5, 2.], &(0.0, 1.0), 1.0);
        assert_abs_diff_eq!(out, array![0., 0.5, 1.]);
    }
}
