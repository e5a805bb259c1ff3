use bevy_math::{ivec2, IVec2};

/// The eight neighbour directions of a grid node, in the fixed
/// counter-clockwise order the marching update depends on: starting at the
/// south-west diagonal, alternating diagonal/axial. Index parity matters
/// throughout `update.rs` — even variants are diagonal, odd are axial — so
/// this order is not cosmetic.
pub const NUM_NEIGHBORS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    SouthWest = 0,
    West = 1,
    NorthWest = 2,
    North = 3,
    NorthEast = 4,
    East = 5,
    SouthEast = 6,
    South = 7,
}

impl Direction {
    pub const ALL: [Direction; NUM_NEIGHBORS] = [
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
    ];

    /// Returns the grid-integer offset for this direction.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> IVec2 {
        match self {
            Direction::SouthWest => ivec2(-1, -1),
            Direction::West => ivec2(-1, 0),
            Direction::NorthWest => ivec2(-1, 1),
            Direction::North => ivec2(0, 1),
            Direction::NorthEast => ivec2(1, 1),
            Direction::East => ivec2(1, 0),
            Direction::SouthEast => ivec2(1, -1),
            Direction::South => ivec2(0, -1),
        }
    }

    /// Index into the fixed cyclic order above.
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        *self as usize
    }

    #[inline]
    #[must_use]
    pub fn from_index(i: usize) -> Direction {
        Self::ALL[i % NUM_NEIGHBORS]
    }

    /// Diagonal neighbours sit at even indices in the cyclic order; they are
    /// a step of length `sqrt(2)` away rather than `1`.
    #[inline]
    #[must_use]
    pub fn is_diagonal(&self) -> bool {
        self.index() % 2 == 0
    }

    /// Neighbour at cyclic index `i - 1`, wrapping.
    #[inline]
    #[must_use]
    pub fn prev(&self) -> Direction {
        Direction::from_index((self.index() + NUM_NEIGHBORS - 1) % NUM_NEIGHBORS)
    }

    /// Neighbour at cyclic index `i + 1`, wrapping.
    #[inline]
    #[must_use]
    pub fn next(&self) -> Direction {
        Direction::from_index((self.index() + 1) % NUM_NEIGHBORS)
    }
}
