//! Fast Iterative Shrinking/Thresholding Algorithm
//!
//! Proximal gradient descent, plain and accelerated (FISTA), for
//! composite minimization
//! ```math
//! \mathrm{arg}\!\min_x f(x, \mathrm{params\_fun}) + g(x, \mathrm{params\_prox})
//! ```
//! where $`f`$ is smooth and $`g`$ is accessed only through its proximity
//! operator. The smooth part is consumed as a pair of black-box oracles,
//! one for the value and one for the gradient. The stopping criterion is
//! the fixed-point residual of the unit-step proximal-gradient map,
//! ```math
//! \| x - \mathrm{prox}_g(x - \nabla f(x)) \|_2 \leq \mathrm{tol}
//! ```
//! which is zero exactly at solutions of the composite problem.
//!
//! References
//! ----------
//! \[BT09\]: [ Beck A, Teboulle M,
//!       "A Fast Iterative Shrinkage-Thresholding Algorithm for Linear
//!        Inverse Problems", SIAM Imaging Sciences (2009) ](https://epubs.siam.org/doi/10.1137/080716542)
//!
//! \[N13\]: [ Nesterov Y, "Gradient methods for minimizing composite
//!       functions", Mathematical Programming (2013) ](https://doi.org/10.1007/s10107-012-0629-5)

use crate::loops::while_loop;
use crate::tree::TreeVector;
use ndarray::NdFloat;

/// Configuration for [`proximal_gradient`] and the solver factories.
#[derive(Debug, Clone, Copy)]
pub struct SolverOptions<S> {
    /// Step size to use; `<= 0` enables backtracking line search.
    pub stepsize: S,
    /// Cap on outer iterations. Reaching it is a soft stop, not an error.
    pub maxiter: usize,
    /// Cap on line-search shrink attempts per outer iteration.
    pub maxls: usize,
    /// Stopping threshold on the fixed-point residual.
    pub tol: S,
    /// Multiplicative factor by which the line search shrinks the step.
    pub stepfactor: S,
    /// Use Nesterov momentum (FISTA) instead of plain proximal gradient.
    pub acceleration: bool,
    /// Print `iter error` after every iteration. Debugging only.
    pub verbose: bool,
}

impl<S: NdFloat> Default for SolverOptions<S> {
    fn default() -> Self {
        SolverOptions {
            stepsize: S::zero(),
            maxiter: 500,
            maxls: 15,
            tol: S::from(1e-3).unwrap(),
            stepfactor: S::from(0.5).unwrap(),
            acceleration: true,
            verbose: false,
        }
    }
}

/// Final point together with convergence diagnostics.
///
/// Failure to converge within the iteration caps is not raised as an
/// error; inspect `nit` and `error` to judge convergence quality.
#[derive(Debug, Clone)]
pub struct OptimizeResults<T, S> {
    /// Final point.
    pub x: T,
    /// Number of outer iterations taken.
    pub nit: usize,
    /// Fixed-point residual at the last error evaluation.
    pub error: S,
}

/// One proximal-gradient step,
/// $`\mathrm{prox}_g(x - \mathrm{stepsize} \cdot \nabla f(x), \mathrm{stepsize})`$.
///
/// Reduces to a plain gradient step when `prox` is
/// [`prox_none`](crate::prox::prox_none).
pub fn prox_gradient_step<S, T, P, Pp>(
    prox: &P,
    params_prox: &Pp,
    x: &T,
    grad_x: &T,
    stepsize: S,
) -> T
where
    S: NdFloat,
    T: TreeVector<S>,
    P: Fn(T, &Pp, S) -> T,
{
    prox(x.add_scaled(-stepsize, grad_x), params_prox, stepsize)
}

/// Fixed-point residual of the unit-step proximal-gradient map,
/// $`\|x - \mathrm{prox}_g(x - \nabla f(x))\|_2`$.
///
/// A scale-invariant stationarity measure for the composite objective;
/// zero iff `x` is a fixed point of the proximal-gradient map. Used as
/// the solver's stopping criterion.
pub fn fixed_point_residual<S, T, P, Pp>(prox: &P, params_prox: &Pp, x: &T, grad_x: &T) -> S
where
    S: NdFloat,
    T: TreeVector<S>,
    P: Fn(T, &Pp, S) -> T,
{
    prox_gradient_step(prox, params_prox, x, grad_x, S::one())
        .sub(x)
        .l2_norm()
}

/// Backtracking line search on the proximal-gradient step.
///
/// Starting from the trial `stepsize`, shrinks by `stepfactor` until the
/// sufficient decrease condition
/// ```math
/// s (f(x^+) - f(x)) \leq s \langle \nabla f(x), x^+ - x \rangle + \tfrac12 \|x^+ - x\|_2^2 + \epsilon
/// ```
/// holds, with $`\epsilon`$ the scalar type's machine epsilon to avoid
/// rejecting steps due to floating-point noise near convergence. Bounded
/// by `maxls` attempts; on exhaustion the last candidate is returned
/// regardless of the condition.
#[allow(clippy::too_many_arguments)]
fn linesearch<S, T, F, P, Pf, Pp>(
    fun: &F,
    params_fun: &Pf,
    prox: &P,
    params_prox: &Pp,
    x: &T,
    f_x: S,
    grad_x: &T,
    stepsize: S,
    maxls: usize,
    stepfactor: S,
) -> (T, S)
where
    S: NdFloat,
    T: TreeVector<S>,
    F: Fn(&T, &Pf) -> S,
    P: Fn(T, &Pp, S) -> T,
{
    let eps = S::epsilon();
    let half = S::from(0.5).unwrap();

    let sufficient_decrease = |next_x: &T, stepsize: S| {
        let diff_x = next_x.sub(x);
        let sqdist = diff_x.l2_norm_squared();
        // reordered relative to the textbook form for numerical stability
        let fun_decrease = stepsize * (fun(next_x, params_fun) - f_x);
        fun_decrease <= stepsize * diff_x.vdot(grad_x) + half * sqdist + eps
    };

    let init_x = prox_gradient_step(prox, params_prox, x, grad_x, stepsize);
    while_loop(
        |state: &(T, S)| !sufficient_decrease(&state.0, state.1),
        |state: (T, S)| {
            let next_stepsize = state.1 * stepfactor;
            let next_x = prox_gradient_step(prox, params_prox, x, grad_x, next_stepsize);
            (next_x, next_stepsize)
        },
        (init_x, stepsize),
        maxls,
    )
}

/// Picks the next point from `x`: one fixed-size prox-gradient step when a
/// positive step size was configured, otherwise a line search from the
/// current trial step size, followed by the standard grow/reset adaptation
/// of the trial size for the next iteration.
#[allow(clippy::too_many_arguments)]
fn step_candidate<S, T, F, P, Pf, Pp>(
    fun: &F,
    params_fun: &Pf,
    prox: &P,
    params_prox: &Pp,
    x: &T,
    f_x: S,
    grad_x: &T,
    stepsize: S,
    options: &SolverOptions<S>,
) -> (T, S)
where
    S: NdFloat,
    T: TreeVector<S>,
    F: Fn(&T, &Pf) -> S,
    P: Fn(T, &Pp, S) -> T,
{
    if options.stepsize <= S::zero() {
        let (next_x, accepted) = linesearch(
            fun, params_fun, prox, params_prox, x, f_x, grad_x, stepsize, options.maxls,
            options.stepfactor,
        );
        // if the accepted step collapsed, restart the trial at 1.0;
        // otherwise attempt a larger step next iteration
        let floor = S::from(1e-6).unwrap();
        let next_stepsize = if accepted <= floor {
            S::one()
        } else {
            accepted / options.stepfactor
        };
        (next_x, next_stepsize)
    } else {
        let next_x = prox_gradient_step(prox, params_prox, x, grad_x, options.stepsize);
        (next_x, options.stepsize)
    }
}

#[derive(Debug, Clone)]
struct PgState<T, S> {
    iter: usize,
    x: T,
    stepsize: S,
    error: S,
}

#[derive(Debug, Clone)]
struct FistaState<T, S> {
    iter: usize,
    x: T,
    y: T,
    t: S,
    stepsize: S,
    error: S,
}

fn run_plain<S, T, F, G, P, Pf, Pp>(
    fun: &F,
    grad: &G,
    prox: &P,
    init: T,
    params_fun: &Pf,
    params_prox: &Pp,
    options: &SolverOptions<S>,
) -> OptimizeResults<T, S>
where
    S: NdFloat,
    T: TreeVector<S>,
    F: Fn(&T, &Pf) -> S,
    G: Fn(&T, &Pf) -> T,
    P: Fn(T, &Pp, S) -> T,
{
    let init_state = PgState {
        iter: 0,
        x: init,
        stepsize: S::one(),
        error: S::infinity(),
    };
    let state = while_loop(
        |state: &PgState<T, S>| {
            if options.verbose {
                println!("{} {}", state.iter, state.error);
            }
            state.error > options.tol
        },
        |state: PgState<T, S>| {
            let f_x = fun(&state.x, params_fun);
            let grad_x = grad(&state.x, params_fun);
            let (next_x, next_stepsize) = step_candidate(
                fun, params_fun, prox, params_prox, &state.x, f_x, &grad_x, state.stepsize,
                options,
            );
            let error = fixed_point_residual(prox, params_prox, &state.x, &grad_x);
            PgState {
                iter: state.iter + 1,
                x: next_x,
                stepsize: next_stepsize,
                error,
            }
        },
        init_state,
        options.maxiter,
    );
    OptimizeResults {
        x: state.x,
        nit: state.iter,
        error: state.error,
    }
}

fn run_accelerated<S, T, F, G, P, Pf, Pp>(
    fun: &F,
    grad: &G,
    prox: &P,
    init: T,
    params_fun: &Pf,
    params_prox: &Pp,
    options: &SolverOptions<S>,
) -> OptimizeResults<T, S>
where
    S: NdFloat,
    T: TreeVector<S>,
    F: Fn(&T, &Pf) -> S,
    G: Fn(&T, &Pf) -> T,
    P: Fn(T, &Pp, S) -> T,
{
    let one = S::one();
    let half = S::from(0.5).unwrap();
    let four = S::from(4.).unwrap();

    let init_state = FistaState {
        iter: 0,
        x: init.clone(),
        y: init,
        t: one,
        stepsize: one,
        error: S::infinity(),
    };
    let state = while_loop(
        |state: &FistaState<T, S>| {
            if options.verbose {
                println!("{} {}", state.iter, state.error);
            }
            state.error > options.tol
        },
        |state: FistaState<T, S>| {
            // gradient is taken at the extrapolated point, not x
            let f_y = fun(&state.y, params_fun);
            let grad_y = grad(&state.y, params_fun);
            let (next_x, next_stepsize) = step_candidate(
                fun, params_fun, prox, params_prox, &state.y, f_y, &grad_y, state.stepsize,
                options,
            );
            let next_t = half * (one + (one + four * state.t * state.t).sqrt());
            let diff_x = next_x.sub(&state.x);
            let next_y = next_x.add_scaled((state.t - one) / next_t, &diff_x);
            // the error is measured at next_x with a fresh gradient there,
            // since grad_y was evaluated at the extrapolated point
            let next_grad = grad(&next_x, params_fun);
            let next_error = fixed_point_residual(prox, params_prox, &next_x, &next_grad);
            FistaState {
                iter: state.iter + 1,
                x: next_x,
                y: next_y,
                t: next_t,
                stepsize: next_stepsize,
                error: next_error,
            }
        },
        init_state,
        options.maxiter,
    );
    OptimizeResults {
        x: state.x,
        nit: state.iter,
        error: state.error,
    }
}

/// Proximal gradient descent (a.k.a. FISTA when accelerated) for
/// $`\mathrm{arg}\!\min_x f(x, \mathrm{params\_fun}) + g(x, \mathrm{params\_prox})`$.
///
/// This is a specific instance of (accelerated) projected gradient
/// descent when the prox is a projection, and of (accelerated) gradient
/// descent when the prox is [`prox_none`](crate::prox::prox_none).
///
/// Parameters
/// ----------
/// - __fun:__         value oracle of the smooth part, `fun(x, params_fun)`
/// - __grad:__        gradient oracle of the smooth part
/// - __prox:__        proximity operator of `g`, `prox(v, params_prox, scaling)`
/// - __init:__        initial point
/// - __params_fun:__  parameters of the smooth part
/// - __params_prox:__ hyperparameters of the proximity operator
/// - __options:__     see [`SolverOptions`]
///
/// The iteration body is selected once from `options.acceleration`; the
/// accelerated body spends one extra gradient evaluation per iteration on
/// the stopping criterion in exchange for the $`O(1/k^2)`$ rate.
pub fn proximal_gradient<S, T, F, G, P, Pf, Pp>(
    fun: F,
    grad: G,
    prox: P,
    init: T,
    params_fun: &Pf,
    params_prox: &Pp,
    options: &SolverOptions<S>,
) -> OptimizeResults<T, S>
where
    S: NdFloat,
    T: TreeVector<S>,
    F: Fn(&T, &Pf) -> S,
    G: Fn(&T, &Pf) -> T,
    P: Fn(T, &Pp, S) -> T,
{
    if options.acceleration {
        run_accelerated(&fun, &grad, &prox, init, params_fun, params_prox, options)
    } else {
        run_plain(&fun, &grad, &prox, init, params_fun, params_prox, options)
    }
}

/// Creates a solver function `(params_fun, params_prox) -> x` from the
/// oracles, the initial point, and the configuration.
///
/// Each call of the returned closure restarts from `init`; calls are
/// independent and reentrant, so identical inputs yield identical
/// outputs. Use [`make_solver_fun_with_info`] to also receive the
/// iteration count and final error.
pub fn make_solver_fun<S, T, F, G, P, Pf, Pp>(
    fun: F,
    grad: G,
    prox: P,
    init: T,
    options: SolverOptions<S>,
) -> impl Fn(&Pf, &Pp) -> T
where
    S: NdFloat,
    T: TreeVector<S>,
    F: Fn(&T, &Pf) -> S,
    G: Fn(&T, &Pf) -> T,
    P: Fn(T, &Pp, S) -> T,
{
    move |params_fun: &Pf, params_prox: &Pp| {
        proximal_gradient(
            &fun,
            &grad,
            &prox,
            init.clone(),
            params_fun,
            params_prox,
            &options,
        )
        .x
    }
}

/// Like [`make_solver_fun`], but the returned solver packages the final
/// point with convergence diagnostics in an [`OptimizeResults`].
pub fn make_solver_fun_with_info<S, T, F, G, P, Pf, Pp>(
    fun: F,
    grad: G,
    prox: P,
    init: T,
    options: SolverOptions<S>,
) -> impl Fn(&Pf, &Pp) -> OptimizeResults<T, S>
where
    S: NdFloat,
    T: TreeVector<S>,
    F: Fn(&T, &Pf) -> S,
    G: Fn(&T, &Pf) -> T,
    P: Fn(T, &Pp, S) -> T,
{
    move |params_fun: &Pf, params_prox: &Pp| {
        proximal_gradient(
            &fun,
            &grad,
            &prox,
            init.clone(),
            params_fun,
            params_prox,
            &options,
        )
    }
}

/// Adapts an objective returning `(loss, aux)` into a value oracle that
/// drives the optimization with the loss alone.
pub fn drop_aux<S, T, Pf, Aux>(fun: impl Fn(&T, &Pf) -> (S, Aux)) -> impl Fn(&T, &Pf) -> S {
    move |x, params| fun(x, params).0
}
