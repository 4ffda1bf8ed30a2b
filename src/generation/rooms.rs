//! # Room Allocator
//!
//! Places non-overlapping rooms into spatial sectors and carves them into
//! the grid.
//!
//! The world is partitioned into an S×S sector grid; each sector gets a
//! bounded number of placement attempts and contributes at most one room.
//! A sector that never finds a fitting, non-overlapping candidate simply
//! stays empty, so callers must tolerate fewer rooms than sectors.

use crate::{GenerationConfig, Grid, LevelTheme, Position, Room, TileKind};
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

/// Sector-grid room placement.
#[derive(Debug, Clone, Default)]
pub struct RoomAllocator;

impl RoomAllocator {
    pub fn new() -> Self {
        Self
    }

    /// Places rooms sector by sector and carves them to floor.
    ///
    /// Room dimensions are drawn from the theme's ranges; candidates that
    /// leave the world border or overlap an existing room (padding-grown)
    /// are rejected. With the theme's irregular chance a room is carved as
    /// a core rectangle plus random extensions instead of a solid block;
    /// its bounding box is still what gets recorded and overlap-tested.
    pub fn place_rooms(
        &self,
        grid: &mut Grid,
        theme: &LevelTheme,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> Vec<Room> {
        let sectors = theme.sector_grid.max(1);
        let sector_w = config.grid_width / sectors;
        let sector_h = config.grid_height / sectors;
        let mut rooms: Vec<Room> = Vec::new();

        for sy in 0..sectors {
            for sx in 0..sectors {
                let candidate = self.try_place_in_sector(
                    grid, theme, config, rng, &rooms, sx, sy, sector_w, sector_h,
                );
                if let Some(room) = candidate {
                    self.carve_room(grid, &room, theme, rng);
                    rooms.push(room);
                }
            }
        }

        debug!(
            "placed {} rooms across {}x{} sectors",
            rooms.len(),
            sectors,
            sectors
        );
        rooms
    }

    /// Attempts up to `placement_attempts` candidates inside one sector.
    #[allow(clippy::too_many_arguments)]
    fn try_place_in_sector(
        &self,
        grid: &Grid,
        theme: &LevelTheme,
        config: &GenerationConfig,
        rng: &mut StdRng,
        existing: &[Room],
        sx: u32,
        sy: u32,
        sector_w: u32,
        sector_h: u32,
    ) -> Option<Room> {
        for _ in 0..config.placement_attempts {
            let width = rng.gen_range(theme.room_width.0..=theme.room_width.1);
            let height = rng.gen_range(theme.room_height.0..=theme.room_height.1);

            // Keep a one-cell wall ring inside the sector and the world.
            let x0 = (sx * sector_w) as i32 + 1;
            let y0 = (sy * sector_h) as i32 + 1;
            let x1 = ((sx + 1) * sector_w) as i32 - width as i32 - 1;
            let y1 = ((sy + 1) * sector_h) as i32 - height as i32 - 1;
            if x1 < x0 || y1 < y0 {
                continue; // room cannot fit this sector at these dimensions
            }

            let room = Room::new(
                rng.gen_range(x0..=x1),
                rng.gen_range(y0..=y1),
                width,
                height,
            );

            if !self.fits_in_grid(grid, &room) {
                continue;
            }
            if existing
                .iter()
                .any(|other| room.overlaps(other, config.room_padding))
            {
                continue;
            }
            return Some(room);
        }
        None
    }

    fn fits_in_grid(&self, grid: &Grid, room: &Room) -> bool {
        room.x >= 1
            && room.y >= 1
            && room.x + room.width as i32 <= grid.width() as i32 - 1
            && room.y + room.height as i32 <= grid.height() as i32 - 1
    }

    /// Carves the room's floor area into the grid.
    fn carve_room(&self, grid: &mut Grid, room: &Room, theme: &LevelTheme, rng: &mut StdRng) {
        if rng.gen_bool(theme.irregular_chance) && room.width >= 6 && room.height >= 6 {
            self.carve_irregular(grid, room, rng);
        } else {
            for y in room.y..room.y + room.height as i32 {
                for x in room.x..room.x + room.width as i32 {
                    grid.set(Position::new(x, y), TileKind::Floor);
                }
            }
        }
    }

    /// Irregular carve: a centered core rectangle plus random rectangular
    /// extensions, all inside the bounding box. The center stays floor, so
    /// anchors and spawn draws keep a guaranteed landing spot.
    fn carve_irregular(&self, grid: &mut Grid, room: &Room, rng: &mut StdRng) {
        let core_w = (room.width * 2 / 3).max(2);
        let core_h = (room.height * 2 / 3).max(2);
        let core = Room::new(
            room.x + ((room.width - core_w) / 2) as i32,
            room.y + ((room.height - core_h) / 2) as i32,
            core_w,
            core_h,
        );
        for y in core.y..core.y + core.height as i32 {
            for x in core.x..core.x + core.width as i32 {
                grid.set(Position::new(x, y), TileKind::Floor);
            }
        }

        let extensions = rng.gen_range(2..=4);
        for _ in 0..extensions {
            let ext_w = rng.gen_range(2..=room.width.max(3) - 1);
            let ext_h = rng.gen_range(2..=room.height.max(3) - 1);
            let ext_x = rng.gen_range(room.x..=room.x + (room.width - ext_w.min(room.width)) as i32);
            let ext_y =
                rng.gen_range(room.y..=room.y + (room.height - ext_h.min(room.height)) as i32);
            for y in ext_y..ext_y + ext_h.min(room.height) as i32 {
                for x in ext_x..ext_x + ext_w.min(room.width) as i32 {
                    grid.set(Position::new(x, y), TileKind::Floor);
                }
            }
        }
    }
}
