//! Padded linear grid indexing and the precomputed neighbour / cell offset
//! tables the march and its updates read through.

use crate::direction::{Direction, NUM_NEIGHBORS};
use bevy_math::{ivec2, DVec2, IVec2};

/// Edge-of-cell vertex offsets, matching the fixed corner order `(0,0)`,
/// `(1,0)`, `(0,1)`, `(1,1)` used throughout `cell.rs` and `update.rs`.
pub const NUM_CELL_VERTS: usize = 4;

/// The shape and step size of the marched grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    /// Node count along (x, y): `(M, N)`.
    pub shape: IVec2,
    /// Uniform grid step.
    pub h: f64,
}

impl GridSpec {
    #[inline]
    #[must_use]
    pub fn new(shape: IVec2, h: f64) -> Self {
        assert!(shape.x > 1 && shape.y > 1, "grid shape must be at least 2x2");
        assert!(h > 0.0, "grid step must be positive");
        Self { shape, h }
    }
}

/// Precomputed padded indexing and neighbour/cell offset tables for a grid
/// of the given shape. Nodes are stored in a `(M+2) x (N+2)` padded linear
/// array so that every neighbour offset can be applied unconditionally;
/// cells are keyed by their lower-left node's linear index.
#[derive(Debug, Clone)]
pub struct GridGeometry {
    pub spec: GridSpec,
    stride: i32,
    /// Linear-index deltas for the 8 neighbour directions, in
    /// [`Direction`]'s cyclic order, plus a trailing repeat of index 0 to
    /// simplify modular access in triangle updates.
    pub nb_ind_offsets: [i32; NUM_NEIGHBORS + 1],
    /// For each neighbour direction, the cell (by linear-index delta) used
    /// to pair that neighbour with its two adjacent neighbours in a
    /// triangle update.
    pub tri_cell_ind_offsets: [i32; NUM_NEIGHBORS],
    /// Linear-index deltas from a cell key to its four corner nodes, in
    /// `(0,0), (1,0), (0,1), (1,1)` order.
    pub cell_vert_ind_offsets: [i32; NUM_CELL_VERTS],
    /// Linear-index deltas from a node to the (up to four) cells it is a
    /// corner of.
    pub nb_cell_ind_offsets: [i32; NUM_CELL_VERTS],
}

const TRI_CELL_OFFSETS: [IVec2; NUM_NEIGHBORS] = [
    ivec2(-2, -1),
    ivec2(-2, 0),
    ivec2(-1, 1),
    ivec2(0, 1),
    ivec2(1, 0),
    ivec2(1, -1),
    ivec2(0, -2),
    ivec2(-1, -2),
];

const CELL_VERT_OFFSETS: [IVec2; NUM_CELL_VERTS] =
    [ivec2(0, 0), ivec2(1, 0), ivec2(0, 1), ivec2(1, 1)];

/// The four cells incident to a node, identified by the offset from the
/// node to each cell's lower-left-corner key: the cell where the node is
/// the bottom-left corner, bottom-right, top-left, and top-right corner,
/// respectively.
const NB_CELL_OFFSETS: [IVec2; NUM_CELL_VERTS] =
    [ivec2(0, 0), ivec2(-1, 0), ivec2(0, -1), ivec2(-1, -1)];

impl GridGeometry {
    #[must_use]
    pub fn new(spec: GridSpec) -> Self {
        let stride = spec.shape.x + 2;
        let delta = |off: IVec2| -> i32 { off.y * stride + off.x };

        let mut nb_ind_offsets = [0i32; NUM_NEIGHBORS + 1];
        for i in 0..NUM_NEIGHBORS {
            nb_ind_offsets[i] = delta(Direction::from_index(i).offset());
        }
        nb_ind_offsets[NUM_NEIGHBORS] = nb_ind_offsets[0];

        let mut tri_cell_ind_offsets = [0i32; NUM_NEIGHBORS];
        for i in 0..NUM_NEIGHBORS {
            tri_cell_ind_offsets[i] = delta(TRI_CELL_OFFSETS[i]);
        }

        let mut cell_vert_ind_offsets = [0i32; NUM_CELL_VERTS];
        for i in 0..NUM_CELL_VERTS {
            cell_vert_ind_offsets[i] = delta(CELL_VERT_OFFSETS[i]);
        }

        let mut nb_cell_ind_offsets = [0i32; NUM_CELL_VERTS];
        for i in 0..NUM_CELL_VERTS {
            nb_cell_ind_offsets[i] = delta(NB_CELL_OFFSETS[i]);
        }

        Self {
            spec,
            stride,
            nb_ind_offsets,
            tri_cell_ind_offsets,
            cell_vert_ind_offsets,
            nb_cell_ind_offsets,
        }
    }

    /// Total padded node count, `(M+2)(N+2)`.
    #[inline]
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        ((self.spec.shape.x + 2) * (self.spec.shape.y + 2)) as usize
    }

    /// Total cell count, `(M+1)(N+1)`.
    #[inline]
    #[must_use]
    pub fn num_cells(&self) -> usize {
        ((self.spec.shape.x + 1) * (self.spec.shape.y + 1)) as usize
    }

    /// The padded linear index `L(i, j) = (M+2)*(j+1) + (i+1)`.
    #[inline]
    #[must_use]
    pub fn lindex(&self, ind: IVec2) -> usize {
        (self.stride * (ind.y + 1) + (ind.x + 1)) as usize
    }

    /// Recover the grid coordinates of a linear index previously produced
    /// by [`Self::lindex`].
    #[inline]
    #[must_use]
    pub fn vindex(&self, l: usize) -> IVec2 {
        let l = l as i32;
        ivec2(l % self.stride - 1, l / self.stride - 1)
    }

    /// `true` if `ind` addresses a real (non-padding) node.
    #[inline]
    #[must_use]
    pub fn in_bounds(&self, ind: IVec2) -> bool {
        ind.x >= 0 && ind.y >= 0 && ind.x < self.spec.shape.x && ind.y < self.spec.shape.y
    }

    /// The physical position of the node at linear index `l`.
    #[inline]
    #[must_use]
    pub fn xy(&self, l: usize) -> DVec2 {
        let ind = self.vindex(l);
        DVec2::new(ind.x as f64, ind.y as f64) * self.spec.h
    }

    /// Step `l` by a neighbour direction's precomputed offset.
    #[inline]
    #[must_use]
    pub fn neighbor(&self, l: usize, dir: Direction) -> usize {
        (l as i32 + self.nb_ind_offsets[dir.index()]) as usize
    }

    /// Step `l` by the `i`-th entry of the cyclic neighbour table (mod 9),
    /// used by update scheduling which indexes past 8 to reuse index 0.
    #[inline]
    #[must_use]
    pub fn neighbor_at(&self, l: usize, i: usize) -> usize {
        (l as i32 + self.nb_ind_offsets[i]) as usize
    }

    /// The cell key used to pair neighbour direction `dir` into a triangle
    /// update centered at `l`.
    #[inline]
    #[must_use]
    pub fn tri_cell(&self, l: usize, dir: Direction) -> usize {
        (l as i32 + self.tri_cell_ind_offsets[dir.index()]) as usize
    }

    /// The four corner node indices of the cell keyed at `cell`.
    #[inline]
    #[must_use]
    pub fn cell_corners(&self, cell: usize) -> [usize; NUM_CELL_VERTS] {
        let mut out = [0usize; NUM_CELL_VERTS];
        for i in 0..NUM_CELL_VERTS {
            out[i] = (cell as i32 + self.cell_vert_ind_offsets[i]) as usize;
        }
        out
    }

    /// The (up to four) cells that node `l` is a corner of.
    #[inline]
    #[must_use]
    pub fn incident_cells(&self, l: usize) -> [usize; NUM_CELL_VERTS] {
        let mut out = [0usize; NUM_CELL_VERTS];
        for i in 0..NUM_CELL_VERTS {
            out[i] = (l as i32 + self.nb_cell_ind_offsets[i]) as usize;
        }
        out
    }
}
