//! # Delve
//!
//! Simulation core for a turn-based fantasy dungeon crawler.
//!
//! ## Architecture Overview
//!
//! Delve is split into three cooperating subsystems:
//!
//! - **Generation**: procedural dungeon layout — sector-placed rooms,
//!   A*-routed corridors, and depth-scaled population of enemies and items
//! - **Game**: the grid model, actor records, movement/collision rules, and
//!   the [`GameSession`] that owns a running dungeon crawl
//! - **Combat**: the turn-based encounter state machine with initiative
//!   ordering, skills, and win/flee/defeat termination
//!
//! Rendering, audio, and input polling are external collaborators: the core
//! exposes read-only state accessors and accepts move intents and combat
//! commands, nothing more. All randomness flows through a seeded [`rand`]
//! generator, so a run is reproducible from its seed.

pub mod combat;
pub mod game;
pub mod generation;

pub use combat::{
    CombatCommand, CombatOutcome, CombatSession, CombatSide, Skill, SkillEffect, SkillTarget,
    TurnEntry,
};
pub use game::{
    new_entity_id, Direction, Enemy, EntityId, GameSession, Grid, ItemKind, ItemSpawn, PartyMember,
    Player, Position, Role, RunCompletion, RunStats, Stats, TileKind,
};
pub use generation::{
    CorridorRouter, DungeonGenerator, DungeonState, GenerationConfig, Generator, LevelTheme, Room,
    RoomAllocator, ThemeArchetype,
};

/// Core error type for the Delve simulation.
#[derive(thiserror::Error, Debug)]
pub enum DelveError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Session state is invalid for the requested operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A combat command was rejected without mutating state
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Dungeon generation exhausted its retry budget
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the Delve codebase.
pub type DelveResult<T> = Result<T, DelveError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation configuration constants.
pub mod config {
    /// World width in pixels
    pub const WORLD_WIDTH: u32 = 800;

    /// World height in pixels
    pub const WORLD_HEIGHT: u32 = 600;

    /// Edge length of one grid tile in pixels
    pub const TILE_SIZE: u32 = 20;

    /// Grid columns derived from the world width
    pub const GRID_COLS: u32 = WORLD_WIDTH / TILE_SIZE;

    /// Grid rows derived from the world height
    pub const GRID_ROWS: u32 = WORLD_HEIGHT / TILE_SIZE;

    /// Default hero starting health
    pub const HERO_HEALTH: i32 = 100;

    /// Default hero attack stat
    pub const HERO_ATTACK: i32 = 10;

    /// Flat mana restored to the party on a level transition
    pub const LEVEL_TRANSITION_MANA: i32 = 50;
}
