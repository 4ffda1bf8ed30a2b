//! # Grid Model
//!
//! The 2D occupancy grid underlying a dungeon level.
//!
//! Every level is a fixed-size field of wall/floor cells sized from the
//! world dimensions divided by the tile size. Generation carves floor into
//! it; movement and collision read it.

use crate::{config, Position};
use serde::{Deserialize, Serialize};

/// Binary occupancy state of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    Wall,
    Floor,
}

impl TileKind {
    /// Whether actors can stand on this tile.
    pub fn is_passable(self) -> bool {
        matches!(self, TileKind::Floor)
    }
}

/// A 2D wall/floor occupancy grid.
///
/// Stored row-major; out-of-bounds reads return `None` and out-of-bounds
/// writes are ignored, so carving code can clamp naturally at the edges.
///
/// # Examples
///
/// ```
/// use delve::{Grid, Position, TileKind};
///
/// let mut grid = Grid::new(10, 8);
/// assert_eq!(grid.get(Position::new(3, 3)), Some(TileKind::Wall));
///
/// grid.set(Position::new(3, 3), TileKind::Floor);
/// assert!(grid.is_floor(Position::new(3, 3)));
/// assert_eq!(grid.get(Position::new(99, 0)), None);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<TileKind>,
}

impl Grid {
    /// Creates an all-wall grid of the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![TileKind::Wall; (width * height) as usize],
        }
    }

    /// Creates an all-wall grid sized from the default world dimensions.
    pub fn world_sized() -> Self {
        Self::new(config::GRID_COLS, config::GRID_ROWS)
    }

    /// Grid width in cells.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the position lies inside the grid.
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    fn index(&self, pos: Position) -> usize {
        (pos.y as u32 * self.width + pos.x as u32) as usize
    }

    /// Reads the tile at a position, or `None` out of bounds.
    pub fn get(&self, pos: Position) -> Option<TileKind> {
        if self.in_bounds(pos) {
            Some(self.cells[self.index(pos)])
        } else {
            None
        }
    }

    /// Writes the tile at a position. Out-of-bounds writes are ignored.
    pub fn set(&mut self, pos: Position, kind: TileKind) {
        if self.in_bounds(pos) {
            let idx = self.index(pos);
            self.cells[idx] = kind;
        }
    }

    /// Whether the position is an in-bounds floor cell.
    pub fn is_floor(&self, pos: Position) -> bool {
        self.get(pos) == Some(TileKind::Floor)
    }

    /// Whether the position is out of bounds or a wall cell.
    pub fn is_wall(&self, pos: Position) -> bool {
        !self.is_floor(pos)
    }

    /// Counts how many of the 4 cardinal neighbors are floor.
    ///
    /// Used by the obstacle-scatter heuristic: a corridor cell only accepts
    /// an obstacle when at least 3 of its neighbors stay open.
    pub fn open_neighbor_count(&self, pos: Position) -> usize {
        pos.cardinal_adjacent_positions()
            .into_iter()
            .filter(|&p| self.is_floor(p))
            .count()
    }

    /// Total number of floor cells.
    pub fn floor_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c, TileKind::Floor))
            .count()
    }

    /// Iterates all in-bounds positions, row by row.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        let width = self.width as i32;
        let height = self.height as i32;
        (0..height).flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
    }

    /// Renders the grid as an ASCII map, `#` for wall and `.` for floor.
    ///
    /// Debug/inspection surface for the headless driver; not a renderer.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(((self.width + 1) * self.height) as usize);
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                out.push(match self.get(Position::new(x, y)) {
                    Some(TileKind::Floor) => '.',
                    _ => '#',
                });
            }
            out.push('\n');
        }
        out
    }
}
