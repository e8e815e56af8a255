//! The `ndarray-proxgrad` crate provides proximal gradient solvers for
//! composite minimization problems of the form
//! ```math
//! \mathrm{arg}\!\min_x f(x) + g(x)
//! ```
//! where $`f`$ is smooth and differentiable and $`g`$ is a possibly
//! non-smooth regularizer accessed only through its proximity operator.
//!
//! It includes:
//! - plain proximal gradient descent with backtracking line search
//! - the accelerated variant (FISTA) with Nesterov momentum
//! - common proximity operators (soft-thresholding, projections)
//! - a seam for differentiating solver outputs via the implicit
//!   function theorem
//!
//! The optimization variable can be a single `ndarray` of any dimension,
//! or an arbitrarily nested container of arrays (see [`tree`]). Gradients
//! are treated as a black-box oracle: this crate performs no automatic
//! differentiation.
//!
//! This crate is in the early development stage and is actively changing.
//! The provided methods have been tested, but have not been tuned for
//! maximum performance or minimum memory usage.

pub mod implicit;
pub mod loops;
pub mod prox;
pub mod tree;
