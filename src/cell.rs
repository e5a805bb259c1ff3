//! Per-cell bicubic refitting and the mixed-derivative (`fxy`) estimate
//! that bridges freshly-accepted nodes to their incident cells.

use crate::cubic::Bicubic;
use crate::geometry::GridGeometry;
use crate::node::{Jet, NodeState};

/// `true` iff every corner of the cell keyed at `cell` is VALID.
#[must_use]
pub fn is_cell_valid(geom: &GridGeometry, states: &[NodeState], cell: usize) -> bool {
    geom.cell_corners(cell)
        .iter()
        .all(|&corner| states[corner] == NodeState::Valid)
}

/// Refit the bicubic of the cell keyed at `cell` from its four corner
/// jets, using the corner order `(0,0), (1,0), (0,1), (1,1)`.
pub fn fit_cell(geom: &GridGeometry, jets: &[Jet], bicubics: &mut [Bicubic], cell: usize) {
    let [j00, j10, j01, j11] = geom.cell_corners(cell).map(|l| jets[l]);
    let data = [
        [j00.f, j01.f, j00.fy, j01.fy],
        [j10.f, j11.f, j10.fy, j11.fy],
        [j00.fx, j01.fx, j00.fxy, j01.fxy],
        [j10.fx, j11.fx, j10.fxy, j11.fxy],
    ];
    bicubics[cell] = Bicubic::fit(&data);
}

/// Finite-difference edge estimates of `fxy` for the cell keyed at `cell`,
/// one per edge: left, bottom, top, right (matching corner order
/// `(0,0), (1,0), (0,1), (1,1)`).
fn edge_fxy_estimates(geom: &GridGeometry, jets: &[Jet], cell: usize) -> [f64; 4] {
    let h = geom.spec.h;
    let [j00, j10, j01, j11] = geom.cell_corners(cell).map(|l| jets[l]);
    [
        (j10.fy - j00.fy) / h, // fy along the mu=0 edge
        (j11.fx - j10.fx) / h, // fx along the lambda=1 edge
        (j01.fx - j00.fx) / h, // fx along the lambda=0 edge
        (j11.fy - j01.fy) / h, // fy along the mu=1 edge
    ]
}

/// Estimate `fxy` at node `l` from the cell keyed at `cell`, by bilinearly
/// combining the cell's four edge finite differences at the `(lambda, mu)`
/// location of `l` within (or just outside, for the bilinear blend) that
/// cell.
#[must_use]
pub fn estimate_fxy(geom: &GridGeometry, jets: &[Jet], l: usize, cell: usize) -> f64 {
    let fxy = edge_fxy_estimates(geom, jets, cell);

    const LAMS: [f64; 4] = [-0.5, 0.5, 0.5, 1.5];
    const MUS: [f64; 4] = [0.5, -0.5, 1.5, 0.5];

    let corners = geom.cell_corners(cell);
    let corner_index = corners
        .iter()
        .position(|&c| c == l)
        .expect("l must be a corner of cell");
    let lam = LAMS[corner_index];
    let mu = MUS[corner_index];

    (1.0 - mu) * ((1.0 - lam) * fxy[0] + lam * fxy[1]) + mu * ((1.0 - lam) * fxy[2] + lam * fxy[3])
}

/// After a jet write at node `l`, refit every incident cell whose corners
/// are all VALID, and update `l`'s `fxy` to the mean of the per-cell
/// estimates over those same VALID cells (not, as a literal reading of the
/// reference solver does, averaged over all four incident cells while
/// dividing only by the valid count — see `DESIGN.md`).
pub fn update_adjacent_cells(
    geom: &GridGeometry,
    states: &[NodeState],
    jets: &mut [Jet],
    bicubics: &mut [Bicubic],
    l: usize,
) {
    let cells = geom.incident_cells(l);
    let valid: Vec<usize> = cells
        .iter()
        .copied()
        .filter(|&c| is_cell_valid(geom, states, c))
        .collect();

    if !valid.is_empty() {
        let mean: f64 =
            valid.iter().map(|&c| estimate_fxy(geom, jets, l, c)).sum::<f64>() / valid.len() as f64;
        jets[l].fxy = mean;
    }

    for &cell in &valid {
        fit_cell(geom, jets, bicubics, cell);
    }
}
