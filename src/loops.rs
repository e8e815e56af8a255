//! Bounded loop with early exit
//!
//! Both the outer solver loop and the inner line search are bounded loops
//! over a value-like state: each pass consumes the previous state and
//! produces the next one. [`while_loop`] is the shared primitive; running
//! eagerly, it exits as soon as the condition fails, and the iteration cap
//! is a soft stop rather than an error.

/// Repeatedly applies `body` to the state while `cond` holds, for at most
/// `maxiter` passes, and returns the final state.
///
/// `cond` is evaluated before every pass, so `body` runs zero times when
/// the condition fails on the initial state.
pub fn while_loop<T>(
    mut cond: impl FnMut(&T) -> bool,
    mut body: impl FnMut(T) -> T,
    init: T,
    maxiter: usize,
) -> T {
    let mut state = init;
    for _iter in 0..maxiter {
        if !cond(&state) {
            break;
        }
        state = body(state);
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_until_cond_fails() {
        let n = while_loop(|&n| n < 7, |n| n + 1, 0, 100);
        assert_eq!(n, 7);
    }

    #[test]
    fn maxiter_is_a_soft_cap() {
        let n = while_loop(|&n| n < 1000, |n| n + 1, 0, 5);
        assert_eq!(n, 5);
    }

    #[test]
    fn body_skipped_when_cond_fails_initially() {
        let n = while_loop(|&n| n < 0, |n: i32| n + 1, 3, 100);
        assert_eq!(n, 3);
    }

    #[test]
    fn zero_maxiter_returns_init() {
        let n = while_loop(|&n| n < 10, |n| n + 1, 2, 0);
        assert_eq!(n, 2);
    }
}
