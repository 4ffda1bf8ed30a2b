//! # Movement & Collision
//!
//! Grid-based actor movement with probe-rectangle collision and enemy
//! pursuit.
//!
//! Collision runs in pixel space: a candidate tile is tested with a probe
//! rectangle inset from the full tile, which gives actors a small squeeze
//! tolerance when passing diagonal-adjacent walls. Enemies additionally
//! collide with each other's tiles but never with the player — contact
//! with the player starts combat instead of blocking.

use crate::{config, Direction, Enemy, Grid, Player, Position};

/// Pixels shaved off each side of a tile to form the collision probe.
pub const PROBE_INSET: i32 = 2;

/// Axis-aligned pixel-space rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    /// The full bounding box of a grid tile.
    pub fn tile(pos: Position) -> Self {
        let size = config::TILE_SIZE as i32;
        Self {
            x: pos.x * size,
            y: pos.y * size,
            w: size,
            h: size,
        }
    }

    /// The collision probe for an actor standing on a tile: the tile box
    /// inset by [`PROBE_INSET`] on every side.
    pub fn probe(pos: Position) -> Self {
        let size = config::TILE_SIZE as i32;
        Self {
            x: pos.x * size + PROBE_INSET,
            y: pos.y * size + PROBE_INSET,
            w: size - 2 * PROBE_INSET,
            h: size - 2 * PROBE_INSET,
        }
    }

    /// Whether two rectangles overlap on both axes.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

/// Whether an actor's probe at `cell` would intersect any wall tile.
///
/// Only tiles in the 3×3 neighborhood can reach the probe; out-of-bounds
/// cells count as wall.
pub fn probe_hits_wall(grid: &Grid, cell: Position) -> bool {
    let probe = Rect::probe(cell);
    for dy in -1..=1 {
        for dx in -1..=1 {
            let tile = Position::new(cell.x + dx, cell.y + dy);
            if grid.is_wall(tile) && probe.intersects(&Rect::tile(tile)) {
                return true;
            }
        }
    }
    false
}

impl Player {
    /// Attempts a unit (or zero) move, returning whether the position
    /// changed.
    ///
    /// The hero turns to face the intent even when the move is blocked; the
    /// animation cursor advances only on an accepted step. The hero is
    /// never blocked by enemies — walking into one triggers combat at the
    /// session layer.
    pub fn attempt_move(&mut self, grid: &Grid, dx: i32, dy: i32) -> bool {
        if let Some(dir) = Direction::from_delta(Position::new(dx, dy)) {
            self.facing = dir;
        }
        if dx == 0 && dy == 0 {
            return false;
        }
        let candidate = Position::new(self.position.x + dx, self.position.y + dy);
        if probe_hits_wall(grid, candidate) {
            return false;
        }
        self.position = candidate;
        self.frame = (self.frame + 1) % 3;
        true
    }
}

impl Enemy {
    /// Attempts a unit step, colliding with walls and other living
    /// enemies' tiles. An accepted step restarts the move cooldown.
    pub fn attempt_step(
        &mut self,
        grid: &Grid,
        other_enemies: &[Position],
        dx: i32,
        dy: i32,
    ) -> bool {
        if let Some(dir) = Direction::from_delta(Position::new(dx, dy)) {
            self.facing = dir;
        }
        let candidate = Position::new(self.position.x + dx, self.position.y + dy);
        if probe_hits_wall(grid, candidate) {
            return false;
        }
        if other_enemies.contains(&candidate) {
            return false;
        }
        self.position = candidate;
        self.frame = (self.frame + 1) % 3;
        self.move_cooldown = self.move_delay;
        true
    }

    /// One pursuit tick toward the player.
    ///
    /// Gated twice: the per-move cooldown must reach zero, and the player
    /// must be inside the vision range. The step is taken along the single
    /// axis of greater absolute displacement, ties broken toward vertical.
    pub fn pursue(&mut self, player: Position, grid: &Grid, other_enemies: &[Position]) -> bool {
        if self.move_cooldown > 0 {
            self.move_cooldown -= 1;
            return false;
        }

        let pixel_distance = self.position.euclidean_distance(player) * config::TILE_SIZE as f64;
        if pixel_distance > self.vision_range {
            return false;
        }

        let dx = player.x - self.position.x;
        let dy = player.y - self.position.y;
        let (step_x, step_y) = if dx.abs() > dy.abs() {
            (dx.signum(), 0)
        } else if dy != 0 {
            (0, dy.signum())
        } else {
            return false; // already on the player's tile
        };

        self.attempt_step(grid, other_enemies, step_x, step_y)
    }
}
