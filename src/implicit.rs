//! Implicit differentiation of solver outputs
//!
//! The solvers in [`crate::prox`] are differentiation-agnostic: they never
//! inspect derivatives of their own iteration. Derivatives of a solution
//! with respect to problem parameters are instead obtained from the fixed
//! point characterization
//! ```math
//! x^* = T(x^*, \theta), \qquad T(x, \theta) = \mathrm{prox}_g(x - \nabla f(x, \theta))
//! ```
//! Differentiating both sides gives the linear system
//! ```math
//! (I - \partial_x T) \dot{x}^* = (\partial_\theta T) \dot{\theta}
//! ```
//! which is cheaper, lower-memory, and numerically more stable than
//! differentiating through the unrolled iteration. The caller supplies the
//! Jacobian-vector products of $`T`$ (this crate performs no automatic
//! differentiation); this module supplies the fixed-point map itself and a
//! matrix-free conjugate-gradient default for the linear solve, with a
//! hook for substituting a custom solve routine.

use crate::prox::prox_gradient_step;
use crate::tree::TreeVector;
use ndarray::NdFloat;

/// The unit-step proximal-gradient map
/// $`T(x) = \mathrm{prox}_g(x - \nabla f(x, \mathrm{params\_fun}), \mathrm{params\_prox})`$.
///
/// Solutions of the composite problem are exactly the fixed points of this
/// map; it is the function the implicit-function theorem is applied to.
pub fn fixed_point_map<S, T, G, P, Pf, Pp>(
    grad: &G,
    prox: &P,
    x: &T,
    params_fun: &Pf,
    params_prox: &Pp,
) -> T
where
    S: NdFloat,
    T: TreeVector<S>,
    G: Fn(&T, &Pf) -> T,
    P: Fn(T, &Pp, S) -> T,
{
    let grad_x = grad(x, params_fun);
    prox_gradient_step(prox, params_prox, x, &grad_x, S::one())
}

/// Matrix-free conjugate gradient for `A u = b` with `A` symmetric
/// positive definite, given only the matrix-vector product.
///
/// The iteration cap is a soft stop like everywhere else in this crate;
/// `tol` bounds the residual norm at exit when the cap is not hit.
pub fn solve_cg<S, T>(
    matvec: impl Fn(&T) -> T,
    b: &T,
    init: T,
    maxiter: usize,
    tol: S,
) -> T
where
    S: NdFloat,
    T: TreeVector<S>,
{
    let mut x = init;
    let mut r = b.add_scaled(-S::one(), &matvec(&x));
    let mut p = r.clone();
    let mut rs = r.vdot(&r);
    for _iter in 0..maxiter {
        if rs.sqrt() <= tol {
            break;
        }
        let ap = matvec(&p);
        let pap = p.vdot(&ap);
        if pap <= S::zero() {
            // curvature breakdown, the operator is not PD along p
            break;
        }
        let alpha = rs / pap;
        x = x.add_scaled(alpha, &p);
        r = r.add_scaled(-alpha, &ap);
        let rs_next = r.vdot(&r);
        p = r.add_scaled(rs_next / rs, &p);
        rs = rs_next;
    }
    x
}

/// Solves the implicit-function system `(I - dT/dx) u = rhs` at a fixed
/// point, given the Jacobian-vector product `jvp(v) = (dT/dx) v` of the
/// proximal-gradient map there, using [`solve_cg`].
///
/// `rhs` is the parameter-side product `(dT/dtheta) theta_dot`; the result
/// is the directional derivative of the solution.
pub fn implicit_jvp<S, T>(jvp: impl Fn(&T) -> T, rhs: &T, maxiter: usize, tol: S) -> T
where
    S: NdFloat,
    T: TreeVector<S>,
{
    implicit_jvp_with(
        |matvec: &dyn Fn(&T) -> T, b: &T| {
            solve_cg(matvec, b, b.add_scaled(-S::one(), b), maxiter, tol)
        },
        jvp,
        rhs,
    )
}

/// Like [`implicit_jvp`], but with a caller-supplied linear solve routine
/// in place of the conjugate-gradient default.
///
/// The solve routine receives the matrix-vector product of
/// `I - dT/dx` and the right-hand side.
pub fn implicit_jvp_with<S, T, Solve>(solve: Solve, jvp: impl Fn(&T) -> T, rhs: &T) -> T
where
    S: NdFloat,
    T: TreeVector<S>,
    Solve: FnOnce(&dyn Fn(&T) -> T, &T) -> T,
{
    solve(&|u: &T| u.add_scaled(-S::one(), &jvp(u)), rhs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prox::{prox_lasso, proximal_gradient, SolverOptions};
    use approx::assert_abs_diff_eq;
    use ndarray::prelude::*;

    #[test]
    fn cg_solves_spd_system() {
        let a = array![[3., 1.], [1., 2.]];
        let b = array![5., 5.];
        let x = solve_cg(
            |v: &Array1<f64>| a.dot(v),
            &b,
            Array1::zeros(2),
            50,
            1e-12,
        );
        assert_abs_diff_eq!(x, array![1., 2.], epsilon = 1e-8);
    }

    #[test]
    fn cg_iteration_cap_is_soft() {
        let a = array![[4., 0.], [0., 1.]];
        let b = array![4., 2.];
        let x = solve_cg(|v: &Array1<f64>| a.dot(v), &b, Array1::zeros(2), 1, 0.0);
        // one pass made progress but did not solve the system
        assert!(x.vdot(&x) > 0.);
    }

    #[test]
    fn implicit_jvp_contractive_map() {
        // dT/dx = 0.5 I, so (I - dT/dx) u = rhs gives u = 2 rhs
        let rhs = array![1., -3.];
        let u = implicit_jvp(|v: &Array1<f64>| v.mapv(|vi| 0.5 * vi), &rhs, 50, 1e-12);
        assert_abs_diff_eq!(u, array![2., -6.], epsilon = 1e-8);
    }

    #[test]
    fn custom_solve_routine_is_used() {
        let rhs = array![1., 2.];
        let u = implicit_jvp_with(
            |matvec: &dyn Fn(&Array1<f64>) -> Array1<f64>, b: &Array1<f64>| {
                solve_cg(matvec, b, Array1::zeros(2), 50, 1e-12)
            },
            |v: &Array1<f64>| v.mapv(|vi| 0.5 * vi),
            &rhs,
        );
        assert_abs_diff_eq!(u, array![2., 4.], epsilon = 1e-8);
    }

    #[test]
    fn solver_output_is_a_fixed_point() {
        // lasso solution: x* = prox(x* - grad f(x*))
        let fun = |x: &Array1<f64>, c: &Array1<f64>| {
            let d = x - c;
            0.5 * d.dot(&d)
        };
        let grad = |x: &Array1<f64>, c: &Array1<f64>| x - c;
        let c = array![3.0];
        let options = SolverOptions {
            tol: 1e-10,
            ..Default::default()
        };
        let res = proximal_gradient(fun, grad, prox_lasso, array![0.0], &c, &1.0, &options);
        let mapped = fixed_point_map(&grad, &prox_lasso, &res.x, &c, &1.0);
        assert_abs_diff_eq!(mapped, res.x, epsilon = 1e-8);
    }
}
