//! Headings and the sector traversal orders they select.

use std::fmt;

use crate::error::{Error, Result};

/// Agent heading. The integer codes are part of the persisted layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    #[default]
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Orientation {
    /// Returns all headings in code order.
    #[must_use]
    pub const fn all() -> [Orientation; 8] {
        [
            Self::North,
            Self::NorthEast,
            Self::East,
            Self::SouthEast,
            Self::South,
            Self::SouthWest,
            Self::West,
            Self::NorthWest,
        ]
    }

    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::North => 0,
            Self::NorthEast => 1,
            Self::East => 2,
            Self::SouthEast => 3,
            Self::South => 4,
            Self::SouthWest => 5,
            Self::West => 6,
            Self::NorthWest => 7,
        }
    }

    pub fn from_code(code: i32) -> Result<Self> {
        Self::all()
            .into_iter()
            .find(|o| o.code() == code)
            .ok_or_else(|| Error::format(format!("unknown orientation code {code}")))
    }

    /// Cardinal heading whose traversal order rectifies this heading.
    ///
    /// Diagonals round counter-clockwise to the preceding cardinal heading.
    #[must_use]
    pub const fn canonical(self) -> Self {
        match self {
            Self::North | Self::NorthEast => Self::North,
            Self::East | Self::SouthEast => Self::East,
            Self::South | Self::SouthWest => Self::South,
            Self::West | Self::NorthWest => Self::West,
        }
    }

    /// Linearizes a `k x k` grid of `(x, y)` cells into the traversal order
    /// for this heading.
    #[must_use]
    pub fn traversal(self, k: usize) -> Vec<(usize, usize)> {
        let mut order = Vec::with_capacity(k * k);
        match self.canonical() {
            Self::North => {
                for y in 0..k {
                    for x in 0..k {
                        order.push((x, y));
                    }
                }
            }
            Self::South => {
                for y in (0..k).rev() {
                    for x in (0..k).rev() {
                        order.push((x, y));
                    }
                }
            }
            Self::East => {
                for x in (0..k).rev() {
                    for y in 0..k {
                        order.push((x, y));
                    }
                }
            }
            _ => {
                for x in 0..k {
                    for y in (0..k).rev() {
                        order.push((x, y));
                    }
                }
            }
        }
        order
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::North => "north",
            Self::NorthEast => "northeast",
            Self::East => "east",
            Self::SouthEast => "southeast",
            Self::South => "south",
            Self::SouthWest => "southwest",
            Self::West => "west",
            Self::NorthWest => "northwest",
        };
        f.write_str(name)
    }
}
