//! # Dungeon Generator
//!
//! Orchestrates room allocation, corridor routing, and entity population
//! into a complete level.
//!
//! A pass can fail — too few rooms, or an entrance cut off from the exit —
//! and failure is handled by retrying the whole pass with progressively
//! relaxed parameters. Within the retry budget the generator therefore
//! guarantees at least two rooms and an entrance→exit walkable path.

use crate::{
    DelveError, DelveResult, Enemy, GenerationConfig, Generator, Grid, ItemKind, ItemSpawn,
    LevelTheme, Position, Room, TileKind,
};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

use super::corridors::CorridorRouter;
use super::rooms::RoomAllocator;

/// A fully generated dungeon level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DungeonState {
    pub depth: u32,
    pub grid: Grid,
    pub rooms: Vec<Room>,
    /// Index of the entrance room in `rooms`.
    pub entrance_room: usize,
    /// Index of the exit room in `rooms`.
    pub exit_room: usize,
    /// Player spawn anchor inside the entrance room.
    pub entrance: Position,
    /// Stairs anchor inside the exit room.
    pub exit: Position,
    pub enemies: Vec<Enemy>,
    pub items: Vec<ItemSpawn>,
}

/// Primary dungeon generator.
#[derive(Debug, Clone, Default)]
pub struct DungeonGenerator {
    allocator: RoomAllocator,
    router: CorridorRouter,
}

impl DungeonGenerator {
    pub fn new() -> Self {
        Self {
            allocator: RoomAllocator::new(),
            router: CorridorRouter::new(),
        }
    }

    /// One generation pass. Returns `None` when the pass must be retried
    /// with relaxed parameters.
    fn try_generate(
        &self,
        depth: u32,
        theme: &LevelTheme,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> Option<DungeonState> {
        let mut grid = Grid::new(config.grid_width, config.grid_height);

        let rooms = self.allocator.place_rooms(&mut grid, theme, config, rng);
        if rooms.len() < 2 {
            warn!("pass produced {} rooms, need at least 2", rooms.len());
            return None;
        }

        self.router.connect_rooms(&mut grid, &rooms, theme, rng);

        let (entrance_room, exit_room) = self.pick_entrance_and_exit(&rooms);
        let entrance = rooms[entrance_room].anchor();
        let exit = rooms[exit_room].anchor();

        let mut state = DungeonState {
            depth,
            grid,
            rooms,
            entrance_room,
            exit_room,
            entrance,
            exit,
            enemies: Vec::new(),
            items: Vec::new(),
        };
        self.populate(&mut state, config, rng);
        self.scatter_obstacles(&mut state, config, rng);

        // Checked after obstacle scatter: the neighbor heuristic alone does
        // not prove the corridor survived.
        if !self.reachable(&state.grid, state.entrance, state.exit) {
            warn!("exit unreachable from entrance, retrying pass");
            return None;
        }
        Some(state)
    }

    /// Entrance and exit are the room pair whose centers lie farthest
    /// apart (Manhattan). O(n²) over the placed rooms, which stay in the
    /// tens.
    fn pick_entrance_and_exit(&self, rooms: &[Room]) -> (usize, usize) {
        let mut best = (0, 1);
        let mut best_dist = 0;
        for i in 0..rooms.len() {
            for j in (i + 1)..rooms.len() {
                let dist = rooms[i].center().manhattan_distance(rooms[j].center());
                if dist > best_dist {
                    best_dist = dist;
                    best = (i, j);
                }
            }
        }
        best
    }

    /// Flood fill over floor cells: is `goal` reachable from `start`?
    fn reachable(&self, grid: &Grid, start: Position, goal: Position) -> bool {
        if !grid.is_floor(start) || !grid.is_floor(goal) {
            return false;
        }
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some(pos) = queue.pop_front() {
            if pos == goal {
                return true;
            }
            for next in pos.cardinal_adjacent_positions() {
                if grid.is_floor(next) && visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }

    /// Populates rooms with enemies and items.
    ///
    /// Every room except entrance and exit gets 1..=cap enemies (cap grows
    /// with room area and depth) and, at the configured chance, one item
    /// with a depth-weighted kind. The entrance room never gets enemies
    /// but may get a health-biased item.
    fn populate(&self, state: &mut DungeonState, config: &GenerationConfig, rng: &mut StdRng) {
        let depth = state.depth;
        for idx in 0..state.rooms.len() {
            let room = state.rooms[idx];
            if idx == state.exit_room {
                continue;
            }
            if idx == state.entrance_room {
                if rng.gen_bool(config.item_chance) {
                    if let Some(pos) = self.free_floor_cell(state, &room, rng) {
                        let kind = ItemKind::entrance_draw(rng);
                        state.items.push(ItemSpawn { kind, position: pos });
                    }
                }
                continue;
            }

            let cap = config
                .enemy_cap
                .min(1 + room.area() / 30 + depth / 2)
                .max(1);
            let count = rng.gen_range(1..=cap);
            for _ in 0..count {
                if let Some(pos) = self.free_floor_cell(state, &room, rng) {
                    state.enemies.push(Enemy::spawn(pos, depth, rng));
                }
            }

            if rng.gen_bool(config.item_chance) {
                if let Some(pos) = self.free_floor_cell(state, &room, rng) {
                    let kind = ItemKind::weighted_draw(depth, rng);
                    state.items.push(ItemSpawn { kind, position: pos });
                }
            }
        }
        debug!(
            "populated depth {}: {} enemies, {} items",
            depth,
            state.enemies.len(),
            state.items.len()
        );
    }

    /// Draws an unoccupied interior floor cell of the room, a few attempts
    /// only; irregular rooms may reject draws that land on wall.
    fn free_floor_cell(
        &self,
        state: &DungeonState,
        room: &Room,
        rng: &mut StdRng,
    ) -> Option<Position> {
        for _ in 0..8 {
            let pos = room.random_interior(rng);
            let occupied = pos == state.entrance
                || pos == state.exit
                || state.enemies.iter().any(|e| e.position == pos)
                || state.items.iter().any(|i| i.position == pos);
            if state.grid.is_floor(pos) && !occupied {
                return Some(pos);
            }
        }
        None
    }

    /// Scatters extra wall obstacles into corridors.
    ///
    /// A candidate cell is accepted only when it is corridor floor (outside
    /// every room), unoccupied, and at least 3 of its 4 neighbors stay open
    /// — a local heuristic against sealing a corridor, not a proof.
    fn scatter_obstacles(&self, state: &mut DungeonState, config: &GenerationConfig, rng: &mut StdRng) {
        let attempts = config.obstacle_base + state.depth * 2;
        let mut placed = 0;
        for _ in 0..attempts {
            let pos = Position::new(
                rng.gen_range(1..state.grid.width() as i32 - 1),
                rng.gen_range(1..state.grid.height() as i32 - 1),
            );
            if !state.grid.is_floor(pos) {
                continue;
            }
            if state.rooms.iter().any(|r| r.contains(pos)) {
                continue;
            }
            if pos == state.entrance
                || pos == state.exit
                || state.enemies.iter().any(|e| e.position == pos)
                || state.items.iter().any(|i| i.position == pos)
            {
                continue;
            }
            if state.grid.open_neighbor_count(pos) < 3 {
                continue;
            }
            state.grid.set(pos, TileKind::Wall);
            placed += 1;
        }
        debug!("scattered {} corridor obstacles", placed);
    }
}

impl Generator<DungeonState> for DungeonGenerator {
    /// Generates a complete level for the given depth.
    ///
    /// Retries the whole pass with relaxed parameters when a pass yields
    /// fewer than two rooms or a severed entrance→exit path; errors only
    /// once the retry budget is spent.
    fn generate(
        &self,
        depth: u32,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> DelveResult<DungeonState> {
        let depth = depth.max(1);
        for relax in 0..config.max_attempts {
            let theme = LevelTheme::from_depth(depth).relaxed(relax);
            if let Some(state) = self.try_generate(depth, &theme, config, rng) {
                info!(
                    "generated depth {} ({:?}): {} rooms, {} enemies, {} items",
                    depth,
                    theme.archetype,
                    state.rooms.len(),
                    state.enemies.len(),
                    state.items.len()
                );
                self.validate(&state)?;
                return Ok(state);
            }
        }
        Err(DelveError::GenerationFailed(format!(
            "no valid layout for depth {} within {} attempts",
            depth, config.max_attempts
        )))
    }

    fn validate(&self, state: &DungeonState) -> DelveResult<()> {
        if state.rooms.len() < 2 {
            return Err(DelveError::GenerationFailed(
                "fewer than 2 rooms".to_string(),
            ));
        }
        if state.entrance_room == state.exit_room {
            return Err(DelveError::GenerationFailed(
                "entrance and exit rooms coincide".to_string(),
            ));
        }
        if !state.grid.is_floor(state.entrance) || !state.grid.is_floor(state.exit) {
            return Err(DelveError::GenerationFailed(
                "entrance or exit anchor is not floor".to_string(),
            ));
        }
        let entrance_room = &state.rooms[state.entrance_room];
        if state
            .enemies
            .iter()
            .any(|e| entrance_room.contains(e.position))
        {
            return Err(DelveError::GenerationFailed(
                "enemy spawned in the entrance room".to_string(),
            ));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "DungeonGenerator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils::create_rng;

    fn generate(seed: u64, depth: u32) -> DungeonState {
        let generator = DungeonGenerator::new();
        let config = GenerationConfig::for_testing();
        let mut rng = create_rng(seed);
        generator.generate(depth, &config, &mut rng).unwrap()
    }

    #[test]
    fn test_generation_yields_distinct_entrance_and_exit() {
        for seed in [1, 2, 3, 1234] {
            let state = generate(seed, 1);
            assert!(state.rooms.len() >= 2);
            assert_ne!(state.entrance_room, state.exit_room);
            assert_ne!(state.entrance, state.exit);
        }
    }

    #[test]
    fn test_exit_is_reachable_from_entrance() {
        let generator = DungeonGenerator::new();
        for seed in 0..10 {
            let state = generate(seed, 2);
            assert!(generator.reachable(&state.grid, state.entrance, state.exit));
        }
    }

    #[test]
    fn test_entrance_room_has_no_enemies() {
        for seed in 0..10 {
            let state = generate(seed, 3);
            let entrance_room = &state.rooms[state.entrance_room];
            assert!(state
                .enemies
                .iter()
                .all(|e| !entrance_room.contains(e.position)));
        }
    }

    #[test]
    fn test_enemies_present_when_interior_rooms_exist() {
        let state = generate(42, 1);
        if state.rooms.len() > 2 {
            assert!(!state.enemies.is_empty());
        }
    }

    #[test]
    fn test_spawns_rest_on_floor() {
        let state = generate(7, 4);
        for enemy in &state.enemies {
            assert!(state.grid.is_floor(enemy.position));
        }
        for item in &state.items {
            assert!(state.grid.is_floor(item.position));
        }
        assert!(state.grid.is_floor(state.entrance));
        assert!(state.grid.is_floor(state.exit));
    }

    #[test]
    fn test_same_seed_reproduces_layout() {
        let a = generate(99, 1);
        let b = generate(99, 1);
        assert_eq!(a.rooms, b.rooms);
        assert_eq!(a.entrance, b.entrance);
        assert_eq!(a.exit, b.exit);
        assert_eq!(a.enemies.len(), b.enemies.len());
        assert_eq!(a.grid.floor_count(), b.grid.floor_count());
    }

    #[test]
    fn test_entrance_exit_pair_maximizes_center_distance() {
        let state = generate(5, 1);
        let picked = state.rooms[state.entrance_room]
            .center()
            .manhattan_distance(state.rooms[state.exit_room].center());
        for i in 0..state.rooms.len() {
            for j in (i + 1)..state.rooms.len() {
                let dist = state.rooms[i]
                    .center()
                    .manhattan_distance(state.rooms[j].center());
                assert!(dist <= picked);
            }
        }
    }

    #[test]
    fn test_deep_levels_generate() {
        for depth in 1..=12 {
            let state = generate(1000 + depth as u64, depth);
            assert!(state.rooms.len() >= 2, "depth {} too few rooms", depth);
        }
    }
}
