//! Per-node state carried by the march: the Dijkstra-like acceptance state,
//! the jet (value + derivatives), and the factoring parent.

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// A node's position in the Dijkstra-like march.
///
/// Transitions are monotone: `Far -> Trial -> Valid`. A node never
/// regresses. `Boundary` marks the one-node padding ring and sentinel
/// positions; such nodes are never inserted into the heap and never
/// become `Valid`.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Far,
    Trial,
    Valid,
    Boundary,
}

/// The factoring status of a node: either untouched by any factored
/// point source, or attributed to the source at the given node index.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    Unfactored,
    Source(usize),
}

/// The value and derivatives of the travel-time field at a node, in
/// physical units.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jet {
    /// T(x), the travel time.
    pub f: f64,
    /// dT/dx.
    pub fx: f64,
    /// dT/dy.
    pub fy: f64,
    /// d^2T/dxdy.
    pub fxy: f64,
}

impl Jet {
    pub const ZERO: Self = Self {
        f: 0.0,
        fx: 0.0,
        fy: 0.0,
        fxy: 0.0,
    };

    #[inline]
    #[must_use]
    pub fn new(f: f64, fx: f64, fy: f64, fxy: f64) -> Self {
        Self { f, fx, fy, fxy }
    }
}

impl Default for Jet {
    fn default() -> Self {
        // FAR nodes carry no meaningful travel time yet; infinity makes
        // every first candidate update an improvement without a separate
        // "unset" flag.
        Self {
            f: f64::INFINITY,
            fx: 0.0,
            fy: 0.0,
            fxy: 0.0,
        }
    }
}
