//! eikonal_march
//! =============
//!
//! A Dijkstra-like marching solver for the 2-D eikonal equation
//! `|grad T(x)| = s(x)` on a regular Cartesian grid. Nodes are accepted in
//! non-decreasing travel time, same as a shortest-path Dijkstra, but each
//! acceptance carries a full jet `(T, dT/dx, dT/dy, d^2T/dxdy)` and updates
//! a neighbour via either a straight-line template or a 1-D minimisation
//! along the edge of a bicubic Hermite cell, giving fourth-order accuracy
//! rather than the first-order accuracy of a plain Dijkstra-on-a-grid
//! scheme.
//!
//! Start with [`EikonalSolver`]: build one from a [`GridSpec`] and a
//! [`Slowness`] oracle, seed it with [`EikonalSolver::add_point_source`],
//! then call [`EikonalSolver::solve`].

mod cell;
mod cubic;
mod direction;
mod error;
mod geometry;
mod heap;
mod node;
mod slowness;
mod solver;
mod update;

pub use self::{
    cubic::*, direction::*, error::*, geometry::*, node::*, slowness::*, solver::*,
};
