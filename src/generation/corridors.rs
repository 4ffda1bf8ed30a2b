//! # Corridor Router
//!
//! Connects room centers with A*-derived corridors carved into the grid.
//!
//! Routing runs over the full in-bounds grid (walls are carvable, not
//! obstacles), with unit step cost and a Manhattan heuristic, so a path
//! between two in-bounds points always exists. A no-path result is treated
//! as non-fatal: the connection is skipped and logged.

use crate::{Grid, LevelTheme, Position, Room, TileKind};
use log::{debug, warn};
use pathfinding::prelude::astar;
use rand::rngs::StdRng;
use rand::Rng;

/// A*-based corridor routing and carving.
#[derive(Debug, Clone, Default)]
pub struct CorridorRouter;

impl CorridorRouter {
    pub fn new() -> Self {
        Self
    }

    /// Finds a 4-connected path between two in-bounds grid points.
    ///
    /// Returns the ordered cell sequence including both endpoints, or
    /// `None` if no path exists (out-of-bounds endpoints).
    pub fn route(&self, grid: &Grid, start: Position, goal: Position) -> Option<Vec<Position>> {
        if !grid.in_bounds(start) || !grid.in_bounds(goal) {
            return None;
        }
        let result = astar(
            &start,
            |pos| {
                pos.cardinal_adjacent_positions()
                    .into_iter()
                    .filter(|p| grid.in_bounds(*p))
                    .map(|p| (p, 1u32))
                    .collect::<Vec<_>>()
            },
            |pos| pos.manhattan_distance(goal),
            |pos| *pos == goal,
        );
        result.map(|(path, _cost)| path)
    }

    /// Carves a routed path to floor, widened symmetrically.
    ///
    /// Width 1 carves the path cells only; each extra width step adds a
    /// one-cell ring around every path cell.
    pub fn carve(&self, grid: &mut Grid, path: &[Position], width: u32) {
        let radius = width.saturating_sub(1) as i32;
        for cell in path {
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    grid.set(Position::new(cell.x + dx, cell.y + dy), TileKind::Floor);
                }
            }
        }
    }

    /// Routes and carves one connection; returns whether a path was found.
    pub fn connect_points(
        &self,
        grid: &mut Grid,
        start: Position,
        goal: Position,
        width: u32,
    ) -> bool {
        match self.route(grid, start, goal) {
            Some(path) => {
                self.carve(grid, &path, width);
                true
            }
            None => {
                warn!(
                    "no corridor path from {:?} to {:?}; connection skipped",
                    start, goal
                );
                false
            }
        }
    }

    /// Connects every room per the theme's topology.
    ///
    /// Chain topology links room `i` to `i + 1`; loop topology additionally
    /// closes the cycle. Deeper themes add a bounded number of extra
    /// non-adjacent connections, each under a small retry budget so sparse
    /// layouts cannot spin forever looking for a valid pair.
    pub fn connect_rooms(
        &self,
        grid: &mut Grid,
        rooms: &[Room],
        theme: &LevelTheme,
        rng: &mut StdRng,
    ) -> usize {
        if rooms.len() < 2 {
            return 0;
        }

        let mut connected = 0;
        let last_pair = if theme.loop_topology {
            rooms.len()
        } else {
            rooms.len() - 1
        };
        for i in 0..last_pair {
            let a = rooms[i].center();
            let b = rooms[(i + 1) % rooms.len()].center();
            if self.connect_points(grid, a, b, theme.corridor_width) {
                connected += 1;
            }
        }

        // Extra shortcuts between non-adjacent rooms.
        let mut extras = 0;
        let mut budget = theme.extra_connections * 4;
        while extras < theme.extra_connections && budget > 0 {
            budget -= 1;
            let i = rng.gen_range(0..rooms.len());
            let j = rng.gen_range(0..rooms.len());
            let adjacent =
                i == j || i.abs_diff(j) == 1 || (theme.loop_topology && i.abs_diff(j) == rooms.len() - 1);
            if adjacent {
                continue;
            }
            if self.connect_points(
                grid,
                rooms[i].center(),
                rooms[j].center(),
                theme.corridor_width,
            ) {
                extras += 1;
                connected += 1;
            }
        }

        debug!(
            "connected {} corridors ({} extra) across {} rooms",
            connected, extras, rooms.len()
        );
        connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils::create_rng;

    #[test]
    fn test_route_is_contiguous_and_acyclic() {
        let grid = Grid::new(20, 20);
        let router = CorridorRouter::new();
        let start = Position::new(2, 3);
        let goal = Position::new(15, 11);

        let path = router.route(&grid, start, goal).unwrap();
        assert_eq!(*path.first().unwrap(), start);
        assert_eq!(*path.last().unwrap(), goal);

        // Each consecutive pair is 4-adjacent.
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
        }

        // No cell repeats: path length equals the chain length.
        let unique: std::collections::HashSet<_> = path.iter().copied().collect();
        assert_eq!(unique.len(), path.len());

        // Unit-cost A* on an open grid returns a Manhattan-optimal path.
        assert_eq!(path.len() as u32, start.manhattan_distance(goal) + 1);
    }

    #[test]
    fn test_route_rejects_out_of_bounds_endpoints() {
        let grid = Grid::new(10, 10);
        let router = CorridorRouter::new();
        assert!(router.route(&grid, Position::new(-1, 0), Position::new(5, 5)).is_none());
        assert!(router.route(&grid, Position::new(0, 0), Position::new(10, 5)).is_none());
    }

    #[test]
    fn test_carve_width_one_carves_path_only() {
        let mut grid = Grid::new(10, 10);
        let router = CorridorRouter::new();
        let path = router
            .route(&grid, Position::new(1, 1), Position::new(5, 1))
            .unwrap();
        router.carve(&mut grid, &path, 1);
        assert_eq!(grid.floor_count(), path.len());
    }

    #[test]
    fn test_carve_width_two_widens_symmetrically() {
        let mut grid = Grid::new(10, 10);
        let router = CorridorRouter::new();
        let path = vec![Position::new(4, 4)];
        router.carve(&mut grid, &path, 2);

        // One cell widened to a full ring.
        assert_eq!(grid.floor_count(), 9);
        assert!(grid.is_floor(Position::new(3, 3)));
        assert!(grid.is_floor(Position::new(5, 5)));
    }

    #[test]
    fn test_connect_rooms_chain_links_consecutive_centers() {
        let mut grid = Grid::new(40, 30);
        let rooms = vec![
            Room::new(2, 2, 6, 6),
            Room::new(20, 2, 6, 6),
            Room::new(20, 20, 6, 6),
        ];
        let mut theme = LevelTheme::from_depth(1);
        theme.loop_topology = false;
        theme.extra_connections = 0;
        theme.corridor_width = 1;

        let mut rng = create_rng(5);
        let connected =
            CorridorRouter::new().connect_rooms(&mut grid, &rooms, &theme, &mut rng);
        assert_eq!(connected, 2);
        for room in &rooms {
            assert!(grid.is_floor(room.center()));
        }
    }

    #[test]
    fn test_extra_connection_budget_is_bounded() {
        let mut grid = Grid::new(40, 30);
        // Two rooms only: every pair is adjacent, so extras can never land.
        let rooms = vec![Room::new(2, 2, 6, 6), Room::new(20, 2, 6, 6)];
        let mut theme = LevelTheme::from_depth(6);
        theme.extra_connections = 3;

        let mut rng = create_rng(9);
        // Must terminate despite no valid extra pair existing.
        CorridorRouter::new().connect_rooms(&mut grid, &rooms, &theme, &mut rng);
    }
}
