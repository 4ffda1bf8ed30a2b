//! # Generation Module
//!
//! Procedural dungeon generation: sector-placed rooms, A*-routed corridors,
//! and depth-scaled population of enemies and items.
//!
//! Every draw flows through the caller's seeded RNG, so a level is a pure
//! function of its depth and the RNG stream state.

pub mod corridors;
pub mod dungeon;
pub mod rooms;

pub use corridors::*;
pub use dungeon::*;
pub use rooms::*;

use crate::{config, DelveResult, Position};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tunable parameters for dungeon generation.
///
/// Structural parameters (room sizes, sector counts, topology) come from
/// the depth-derived [`LevelTheme`]; this holds the knobs that stay fixed
/// across depths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Grid width in cells.
    pub grid_width: u32,
    /// Grid height in cells.
    pub grid_height: u32,
    /// Candidate placements attempted per sector before it is abandoned.
    pub placement_attempts: u32,
    /// Padding applied to the rectangle overlap test, in cells.
    pub room_padding: i32,
    /// Chance for a populated room to also hold one item.
    pub item_chance: f64,
    /// Hard cap on enemies spawned in a single room.
    pub enemy_cap: u32,
    /// Full-pass retries before generation gives up.
    pub max_attempts: u32,
    /// Base number of corridor obstacles; scales further with depth.
    pub obstacle_base: u32,
}

impl GenerationConfig {
    /// Creates the default configuration sized from the world constants.
    pub fn new() -> Self {
        Self {
            grid_width: config::GRID_COLS,
            grid_height: config::GRID_ROWS,
            placement_attempts: 12,
            room_padding: 1,
            item_chance: 0.7,
            enemy_cap: 5,
            max_attempts: 8,
            obstacle_base: 10,
        }
    }

    /// Smaller, simpler layouts for tests.
    pub fn for_testing() -> Self {
        Self {
            placement_attempts: 20,
            room_padding: 1,
            item_chance: 0.5,
            enemy_cap: 3,
            ..Self::new()
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// The five structural archetypes a depth cycles through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThemeArchetype {
    /// Few, big chambers.
    LargeSparse,
    /// Many cramped cells.
    SmallDense,
    /// Broad, low rooms.
    WideRooms,
    /// Narrow, tall rooms.
    TallRooms,
    /// Middle-of-the-road layout.
    Balanced,
}

/// Depth-derived structural parameters for one level.
///
/// `depth mod 5` selects the archetype; depth additionally widens corridors,
/// raises irregular-room odds, and unlocks extra cross-connections.
///
/// # Examples
///
/// ```
/// use delve::{LevelTheme, ThemeArchetype};
///
/// let theme = LevelTheme::from_depth(1);
/// assert_eq!(theme.archetype, ThemeArchetype::LargeSparse);
/// // Archetypes cycle every five depths.
/// assert_eq!(LevelTheme::from_depth(6).archetype, theme.archetype);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelTheme {
    pub archetype: ThemeArchetype,
    pub depth: u32,
    /// Sector subdivisions per axis (an S×S sector grid).
    pub sector_grid: u32,
    /// Inclusive room width range in cells.
    pub room_width: (u32, u32),
    /// Inclusive room height range in cells.
    pub room_height: (u32, u32),
    /// Carved corridor width in cells.
    pub corridor_width: u32,
    /// Whether corridors close into a loop instead of a chain.
    pub loop_topology: bool,
    /// Chance a placed room is carved irregular (core + extensions).
    pub irregular_chance: f64,
    /// Extra non-adjacent connections beyond the base topology.
    pub extra_connections: u32,
}

impl LevelTheme {
    /// Derives the theme for a dungeon depth (depth >= 1).
    pub fn from_depth(depth: u32) -> Self {
        let archetype = match depth % 5 {
            1 => ThemeArchetype::LargeSparse,
            2 => ThemeArchetype::SmallDense,
            3 => ThemeArchetype::WideRooms,
            4 => ThemeArchetype::TallRooms,
            _ => ThemeArchetype::Balanced,
        };

        let (sector_grid, room_width, room_height, base_corridor, loop_topology) = match archetype {
            ThemeArchetype::LargeSparse => (2, (8, 12), (6, 9), 2, false),
            ThemeArchetype::SmallDense => (4, (4, 6), (3, 5), 1, true),
            ThemeArchetype::WideRooms => (3, (8, 11), (4, 6), 1, false),
            ThemeArchetype::TallRooms => (3, (4, 6), (6, 8), 1, true),
            ThemeArchetype::Balanced => (3, (5, 8), (5, 8), 1, false),
        };

        Self {
            archetype,
            depth,
            sector_grid,
            room_width,
            room_height,
            corridor_width: (base_corridor + depth / 4).min(3),
            loop_topology,
            irregular_chance: (0.1 + 0.04 * depth as f64).min(0.5),
            extra_connections: if depth > 2 { (depth - 2).min(3) } else { 0 },
        }
    }

    /// Relaxed variant used when a generation pass fails: smaller rooms,
    /// no irregular carving, extra placement slack.
    pub fn relaxed(&self, relax: u32) -> Self {
        let shrink = |range: (u32, u32)| -> (u32, u32) {
            let min = range.0.saturating_sub(relax).max(3);
            (min, range.1.saturating_sub(relax).max(min))
        };
        Self {
            room_width: shrink(self.room_width),
            room_height: shrink(self.room_height),
            irregular_chance: if relax > 0 { 0.0 } else { self.irregular_chance },
            ..self.clone()
        }
    }
}

/// A rectangular carved region of the grid in grid coordinates.
///
/// For irregular rooms this is the bounding box; the actual floor area may
/// be smaller. Placement and overlap tests work on the bounding box — a
/// deliberate approximation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Room {
    /// Creates a room from its top-left corner and dimensions.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center of the bounding rectangle.
    pub fn center(&self) -> Position {
        Position::new(
            self.x + self.width as i32 / 2,
            self.y + self.height as i32 / 2,
        )
    }

    /// Bounding-box area in cells.
    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    /// Whether a position lies inside the bounding rectangle.
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.x
            && pos.y >= self.y
            && pos.x < self.x + self.width as i32
            && pos.y < self.y + self.height as i32
    }

    /// Whether two padding-grown rectangles intersect on both axes.
    ///
    /// Padding `p` enforces at least `p` cells of wall between rooms.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::Room;
    ///
    /// let a = Room::new(2, 2, 5, 5);
    /// let b = Room::new(7, 2, 5, 5); // edge-adjacent
    /// assert!(!a.overlaps(&b, 0));
    /// assert!(a.overlaps(&b, 1)); // padding demands a wall ring between rooms
    /// ```
    pub fn overlaps(&self, other: &Room, padding: i32) -> bool {
        let ax0 = self.x - padding;
        let ay0 = self.y - padding;
        let ax1 = self.x + self.width as i32 + padding;
        let ay1 = self.y + self.height as i32 + padding;
        ax0 < other.x + other.width as i32
            && other.x < ax1
            && ay0 < other.y + other.height as i32
            && other.y < ay1
    }

    /// Clamps a point to lie at least one cell inside the room bounds.
    pub fn clamp_inside(&self, pos: Position) -> Position {
        Position::new(
            pos.x.clamp(self.x + 1, self.x + self.width as i32 - 2),
            pos.y.clamp(self.y + 1, self.y + self.height as i32 - 2),
        )
    }

    /// The entrance/exit anchor: the bounding-box center clamped inside.
    pub fn anchor(&self) -> Position {
        self.clamp_inside(self.center())
    }

    /// All positions strictly inside the bounding rectangle (one-cell
    /// margin off every edge).
    pub fn interior_positions(&self) -> Vec<Position> {
        let mut positions = Vec::new();
        for y in (self.y + 1)..(self.y + self.height as i32 - 1) {
            for x in (self.x + 1)..(self.x + self.width as i32 - 1) {
                positions.push(Position::new(x, y));
            }
        }
        positions
    }

    /// A uniformly random interior position.
    pub fn random_interior(&self, rng: &mut StdRng) -> Position {
        Position::new(
            rng.gen_range(self.x + 1..self.x + self.width as i32 - 1),
            rng.gen_range(self.y + 1..self.y + self.height as i32 - 1),
        )
    }
}

/// Trait for procedural generators.
///
/// Generation is parameterized by dungeon depth and draws exclusively from
/// the caller's RNG, keeping output reproducible per seed.
pub trait Generator<T> {
    /// Generates content for the given depth.
    fn generate(&self, depth: u32, config: &GenerationConfig, rng: &mut StdRng) -> DelveResult<T>;

    /// Validates that generated content meets its postconditions.
    fn validate(&self, content: &T) -> DelveResult<()>;

    /// Generator type name for logging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Creates a seeded random number generator.
    pub fn create_rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }
}
