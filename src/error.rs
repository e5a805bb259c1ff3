//! Fallible outcomes of driving the march.
//!
//! Most of the solver is total: candidate updates either improve a jet or
//! they don't, reported as a `bool`. These are the exceptions that a
//! caller genuinely needs to observe.

use bevy_math::DVec2;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SolverError {
    /// The slowness oracle returned a non-positive value, which is not
    /// physical. Fatal: the solver halts on first encounter.
    #[error("slowness oracle returned non-positive value {value} at {x:?}")]
    NonPositiveSlowness { x: DVec2, value: f64 },

    /// The 1-D root finder used by a triangle update did not converge to
    /// `EPS` within its iteration cap. The update still completes using
    /// the best bracket endpoint found; this is a numerical warning, not a
    /// fatal error, since later updates can only improve on it.
    #[error("root finder stalled at node {node} after {iterations} iterations")]
    RootFinderStalled { node: usize, iterations: usize },
}
