//! Static level description: a tile grid plus wall bitmaps.
//!
//! ```text
//!   x = 0     1     2
//!  y=0 +-----+-----+      horizontal wall line 0
//!      | 0,0 | 1,0 |
//! y=-1 +-----+-----+      horizontal wall line 1
//!      | 0,1 | 1,1 |
//! y=-2 +-----+-----+      horizontal wall line 2
//!      ^     ^     ^
//!      vertical wall lines 0, 1, 2
//! ```
//!
//! Walls sit on grid lines, so a wall between two tiles belongs to both.
//! Rows grow towards -Y; north is +Y.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ColorId, Vec2};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LevelError {
    #[error("level must be at least 1x1, got {width}x{height}")]
    EmptyLevel { width: usize, height: usize },
    #[error("({col}, {row}) is outside the {width}x{height} level")]
    OutOfBounds {
        col: usize,
        row: usize,
        width: usize,
        height: usize,
    },
    #[error("hole radius {0} must lie strictly between 0 and 0.5")]
    InvalidHoleRadius(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    Empty,
    Floor,
    /// A hole through the slab. With a goal colour it is a goal hole,
    /// otherwise balls falling in explode.
    Hole { goal: Option<ColorId> },
}

impl Tile {
    /// Floor and hole tiles are both part of the slab.
    pub fn is_solid(&self) -> bool {
        !matches!(self, Tile::Empty)
    }
}

/// The four sides of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    North,
    East,
    South,
    West,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::North, Side::East, Side::South, Side::West];

    /// Neighbouring tile across this side, if it has non-negative indices.
    pub fn step(&self, col: usize, row: usize) -> Option<(usize, usize)> {
        match self {
            Side::North => Some((col, row.checked_sub(1)?)),
            Side::East => Some((col + 1, row)),
            Side::South => Some((col, row + 1)),
            Side::West => Some((col.checked_sub(1)?, row)),
        }
    }
}

/// Runtime state of one hole tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hole {
    pub col: usize,
    pub row: usize,
    pub goal: Option<ColorId>,
    pub reached_goal: bool,
}

impl Hole {
    pub fn center(&self) -> Vec2 {
        tile_center(self.col, self.row)
    }

    pub fn is_goal(&self) -> bool {
        self.goal.is_some()
    }
}

/// Centre of tile `(col, row)` on the board plane.
pub fn tile_center(col: usize, row: usize) -> Vec2 {
    Vec2::new(col as f64 + 0.5, -(row as f64 + 0.5))
}

pub const DEFAULT_HOLE_RADIUS: f64 = 0.4;

#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
    /// `height x (width + 1)`: wall on the line `x = line` next to `row`.
    vertical_walls: Vec<bool>,
    /// `(height + 1) x width`: wall on the line `y = -line` next to `col`.
    horizontal_walls: Vec<bool>,
    hole_radius: f64,
}

impl Level {
    /// A level of the given size with every tile floor and no walls.
    pub fn new(width: usize, height: usize) -> Result<Self, LevelError> {
        if width == 0 || height == 0 {
            return Err(LevelError::EmptyLevel { width, height });
        }
        Ok(Self {
            width,
            height,
            tiles: vec![Tile::Floor; width * height],
            vertical_walls: vec![false; height * (width + 1)],
            horizontal_walls: vec![false; (height + 1) * width],
            hole_radius: DEFAULT_HOLE_RADIUS,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn hole_radius(&self) -> f64 {
        self.hole_radius
    }

    pub fn set_hole_radius(&mut self, radius: f64) -> Result<(), LevelError> {
        if !(radius > 0.0 && radius < 0.5) {
            return Err(LevelError::InvalidHoleRadius(radius));
        }
        self.hole_radius = radius;
        Ok(())
    }

    fn check(&self, col: usize, row: usize) -> Result<usize, LevelError> {
        if col < self.width && row < self.height {
            Ok(row * self.width + col)
        } else {
            Err(LevelError::OutOfBounds {
                col,
                row,
                width: self.width,
                height: self.height,
            })
        }
    }

    pub fn tile(&self, col: usize, row: usize) -> Option<Tile> {
        let index = self.check(col, row).ok()?;
        Some(self.tiles[index])
    }

    pub fn set_tile(&mut self, col: usize, row: usize, tile: Tile) -> Result<(), LevelError> {
        let index = self.check(col, row)?;
        self.tiles[index] = tile;
        Ok(())
    }

    pub fn is_solid(&self, col: usize, row: usize) -> bool {
        self.tile(col, row).is_some_and(|t| t.is_solid())
    }

    /// Whether the tile across `side` is part of the slab.
    pub fn neighbour_solid(&self, col: usize, row: usize, side: Side) -> bool {
        side.step(col, row)
            .is_some_and(|(c, r)| self.is_solid(c, r))
    }

    /// Index into the wall bitmap holding `side` of tile `(col, row)`.
    fn wall_slot(&self, col: usize, row: usize, side: Side) -> (bool, usize) {
        match side {
            Side::North => (false, row * self.width + col),
            Side::South => (false, (row + 1) * self.width + col),
            Side::West => (true, row * (self.width + 1) + col),
            Side::East => (true, row * (self.width + 1) + col + 1),
        }
    }

    pub fn has_wall(&self, col: usize, row: usize, side: Side) -> bool {
        if self.check(col, row).is_err() {
            return false;
        }
        match self.wall_slot(col, row, side) {
            (true, i) => self.vertical_walls[i],
            (false, i) => self.horizontal_walls[i],
        }
    }

    pub fn set_wall(
        &mut self,
        col: usize,
        row: usize,
        side: Side,
        present: bool,
    ) -> Result<(), LevelError> {
        self.check(col, row)?;
        match self.wall_slot(col, row, side) {
            (true, i) => self.vertical_walls[i] = present,
            (false, i) => self.horizontal_walls[i] = present,
        }
        Ok(())
    }

    /// Wall on the vertical grid line `x = line`, beside `row`.
    pub fn set_vertical_wall(
        &mut self,
        line: usize,
        row: usize,
        present: bool,
    ) -> Result<(), LevelError> {
        if line > self.width || row >= self.height {
            return Err(self.out_of_bounds(line, row));
        }
        self.vertical_walls[row * (self.width + 1) + line] = present;
        Ok(())
    }

    /// Wall on the horizontal grid line `y = -line`, beside `col`.
    pub fn set_horizontal_wall(
        &mut self,
        col: usize,
        line: usize,
        present: bool,
    ) -> Result<(), LevelError> {
        if col >= self.width || line > self.height {
            return Err(self.out_of_bounds(col, line));
        }
        self.horizontal_walls[line * self.width + col] = present;
        Ok(())
    }

    fn out_of_bounds(&self, col: usize, row: usize) -> LevelError {
        LevelError::OutOfBounds {
            col,
            row,
            width: self.width,
            height: self.height,
        }
    }

    /// Wall in the whole outer border.
    pub fn enclose(&mut self) {
        for row in 0..self.height {
            self.vertical_walls[row * (self.width + 1)] = true;
            self.vertical_walls[row * (self.width + 1) + self.width] = true;
        }
        for col in 0..self.width {
            self.horizontal_walls[col] = true;
            self.horizontal_walls[self.height * self.width + col] = true;
        }
    }

    /// Every solid tile, row by row.
    pub fn solid_tiles(&self) -> impl Iterator<Item = (usize, usize, Tile)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_solid())
            .map(|(i, t)| (i % self.width, i / self.width, *t))
    }

    /// Fresh hole states, row by row. The position in this list is the
    /// hole index used by colliders and triggers.
    pub fn holes(&self) -> Vec<Hole> {
        self.solid_tiles()
            .filter_map(|(col, row, tile)| match tile {
                Tile::Hole { goal } => Some(Hole {
                    col,
                    row,
                    goal,
                    reached_goal: false,
                }),
                _ => None,
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
