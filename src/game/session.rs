//! # Game Session
//!
//! The owning context for one dungeon run: grid, rooms, party, roaming
//! enemies, floor items, and the active combat session if an encounter is
//! underway.
//!
//! All state lives here explicitly and is passed by reference; nothing in
//! the crate reads ambient globals. The party vector is handed to the
//! combat session for an encounter's duration and taken back when it
//! resolves.

use crate::{
    config, CombatCommand, CombatOutcome, CombatSession, DelveError, DelveResult, Direction,
    DungeonGenerator, Enemy, Generator, GenerationConfig, Grid, ItemSpawn, PartyMember, Player,
    Position, Room,
};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Cumulative tallies for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub enemies_defeated: u32,
    pub items_collected: u32,
    pub steps_taken: u64,
    pub levels_cleared: u32,
    pub flees: u32,
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunCompletion {
    /// The run is in progress.
    Delving,
    /// The whole party fell in combat.
    Defeated,
    /// The external caller ended the run at an input boundary.
    Abandoned,
}

fn restored_rng() -> StdRng {
    StdRng::seed_from_u64(0)
}

/// One dungeon run: a party descending through generated levels.
///
/// # Examples
///
/// ```
/// use delve::GameSession;
///
/// let session = GameSession::new(12345).unwrap();
/// assert_eq!(session.depth(), 1);
/// assert!(session.rooms().len() >= 2);
/// assert!(!session.in_combat());
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct GameSession {
    seed: u64,
    depth: u32,
    grid: Grid,
    rooms: Vec<Room>,
    entrance: Position,
    exit: Position,
    player: Player,
    /// Empty while a combat session owns the party.
    party: Vec<PartyMember>,
    enemies: Vec<Enemy>,
    items: Vec<ItemSpawn>,
    combat: Option<CombatSession>,
    stats: RunStats,
    completion: RunCompletion,
    gen_config: GenerationConfig,
    /// Not serialized: a restored session continues from a fresh stream.
    #[serde(skip, default = "restored_rng")]
    rng: StdRng,
}

impl GameSession {
    /// Starts a new run at depth 1 with the default party.
    pub fn new(seed: u64) -> DelveResult<Self> {
        Self::with_config(seed, GenerationConfig::new())
    }

    /// Starts a new run with explicit generation parameters.
    pub fn with_config(seed: u64, gen_config: GenerationConfig) -> DelveResult<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let dungeon = DungeonGenerator::new().generate(1, &gen_config, &mut rng)?;

        info!("run started with seed {}", seed);
        Ok(Self {
            seed,
            depth: dungeon.depth,
            player: Player::at(dungeon.entrance),
            grid: dungeon.grid,
            rooms: dungeon.rooms,
            entrance: dungeon.entrance,
            exit: dungeon.exit,
            party: PartyMember::default_party(),
            enemies: dungeon.enemies,
            items: dungeon.items,
            combat: None,
            stats: RunStats::default(),
            completion: RunCompletion::Delving,
            gen_config,
            rng,
        })
    }

    /// Processes one directional move intent for the hero.
    ///
    /// At most one intent is consumed per external tick. An accepted step
    /// is followed by collision responses in order: enemy contact (starts
    /// combat), item pickup, stairs. Rejected while combat is active or
    /// after the run has ended.
    pub fn handle_move_intent(&mut self, direction: Direction) -> DelveResult<bool> {
        self.ensure_roaming()?;

        let delta = direction.to_delta();
        let moved = self.player.attempt_move(&self.grid, delta.x, delta.y);
        if moved {
            self.stats.steps_taken += 1;
            self.resolve_player_cell()?;
        }
        Ok(moved)
    }

    /// Advances the world one tick: enemy cooldowns and pursuit, then
    /// contact checks. A no-op while combat is active or after the run has
    /// ended — timer pulses are harmless.
    pub fn tick(&mut self) -> DelveResult<()> {
        if self.combat.is_some() || self.completion != RunCompletion::Delving {
            return Ok(());
        }

        for i in 0..self.enemies.len() {
            let others: Vec<Position> = self
                .enemies
                .iter()
                .enumerate()
                .filter(|(j, e)| *j != i && e.stats.alive)
                .map(|(_, e)| e.position)
                .collect();
            let player_pos = self.player.position;
            self.enemies[i].pursue(player_pos, &self.grid, &others);
        }

        if self
            .enemies
            .iter()
            .any(|e| e.stats.alive && e.position == self.player.position)
        {
            self.start_combat();
        }
        Ok(())
    }

    /// Executes one combat command for the acting party member.
    pub fn combat_command(&mut self, command: CombatCommand) -> DelveResult<()> {
        if self.completion != RunCompletion::Delving {
            return Err(DelveError::InvalidState("the run has ended".to_string()));
        }
        let combat = self
            .combat
            .as_mut()
            .ok_or_else(|| DelveError::InvalidState("no active combat".to_string()))?;
        combat.execute(command, &mut self.rng)?;
        self.maybe_finish_combat();
        Ok(())
    }

    /// Ends the run from outside at an input boundary.
    ///
    /// If an encounter is active the party is taken back first; a single
    /// action is never cut mid-resolution.
    pub fn abandon(&mut self) {
        if let Some(combat) = self.combat.take() {
            self.party = combat.into_party();
        }
        if self.completion == RunCompletion::Delving {
            self.completion = RunCompletion::Abandoned;
            info!("run abandoned at depth {}", self.depth);
        }
    }

    /// Collision responses for the hero's current cell.
    fn resolve_player_cell(&mut self) -> DelveResult<()> {
        if self
            .enemies
            .iter()
            .any(|e| e.stats.alive && e.position == self.player.position)
        {
            self.start_combat();
            return Ok(());
        }

        if let Some(idx) = self
            .items
            .iter()
            .position(|item| item.position == self.player.position)
        {
            let item = self.items.remove(idx);
            item.kind.apply(&mut self.party[0].stats);
            self.stats.items_collected += 1;
            info!("picked up {:?}", item.kind);
        }

        if self.player.position == self.exit {
            self.advance_level()?;
        }
        Ok(())
    }

    /// Starts an encounter with every living enemy within one tile of the
    /// hero. Drafted enemies leave the map for the session's lifetime.
    fn start_combat(&mut self) {
        let player_pos = self.player.position;
        let near = |e: &Enemy| {
            e.stats.alive
                && (e.position.x - player_pos.x).abs() <= 1
                && (e.position.y - player_pos.y).abs() <= 1
        };

        let mut drafted = Vec::new();
        let mut remaining = Vec::new();
        for enemy in self.enemies.drain(..) {
            if near(&enemy) {
                drafted.push(enemy.stats);
            } else {
                remaining.push(enemy);
            }
        }
        self.enemies = remaining;
        if drafted.is_empty() {
            return;
        }

        info!("combat begins against {} enemies", drafted.len());
        let party = std::mem::take(&mut self.party);
        self.combat = Some(CombatSession::begin(party, drafted, &mut self.rng));
        // Leading enemy turns may already have resolved the encounter.
        self.maybe_finish_combat();
    }

    /// Takes the party back once the active encounter reaches a terminal
    /// outcome, and applies the outcome to the run.
    fn maybe_finish_combat(&mut self) {
        let finished = self
            .combat
            .as_ref()
            .map(|combat| combat.outcome() != CombatOutcome::Ongoing)
            .unwrap_or(false);
        if !finished {
            return;
        }
        if let Some(combat) = self.combat.take() {
            let outcome = combat.outcome();
            match outcome {
                CombatOutcome::PartyWon => {
                    self.stats.enemies_defeated += combat.enemies().len() as u32;
                }
                CombatOutcome::PartyFled => {
                    self.stats.flees += 1;
                }
                CombatOutcome::PartyDefeated => {
                    self.completion = RunCompletion::Defeated;
                }
                CombatOutcome::Ongoing => {}
            }
            self.party = combat.into_party();
            info!("combat resolved: {:?}", outcome);
        }
    }

    /// Stairs contact: heal and regenerate one level deeper.
    ///
    /// The hero is fully healed; companions recover half their missing
    /// health; everyone gains a flat mana restore and a defense reset.
    fn advance_level(&mut self) -> DelveResult<()> {
        self.depth += 1;
        self.stats.levels_cleared += 1;

        for (idx, member) in self.party.iter_mut().enumerate() {
            if idx == 0 {
                member.stats.health = member.stats.max_health;
            } else {
                let missing = member.stats.max_health - member.stats.health;
                member.stats.heal(missing / 2);
            }
            member.stats.restore_mana(config::LEVEL_TRANSITION_MANA);
            member.stats.reset_defense();
        }

        let dungeon =
            DungeonGenerator::new().generate(self.depth, &self.gen_config, &mut self.rng)?;
        self.grid = dungeon.grid;
        self.rooms = dungeon.rooms;
        self.entrance = dungeon.entrance;
        self.exit = dungeon.exit;
        self.enemies = dungeon.enemies;
        self.items = dungeon.items;
        self.player = Player::at(self.entrance);

        info!("descended to depth {}", self.depth);
        Ok(())
    }

    fn ensure_roaming(&self) -> DelveResult<()> {
        if self.completion != RunCompletion::Delving {
            return Err(DelveError::InvalidState("the run has ended".to_string()));
        }
        if self.combat.is_some() {
            return Err(DelveError::InvalidState(
                "combat is in progress".to_string(),
            ));
        }
        Ok(())
    }

    // Read-only accessors for the rendering collaborator.

    /// Current dungeon depth (1-based).
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Seed the run was started with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The current level's occupancy grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Rooms of the current level.
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Player spawn anchor of the current level.
    pub fn entrance(&self) -> Position {
        self.entrance
    }

    /// Stairs anchor of the current level.
    pub fn exit(&self) -> Position {
        self.exit
    }

    /// The hero's grid-side body.
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Party records; empty while a combat session owns them.
    pub fn party(&self) -> &[PartyMember] {
        &self.party
    }

    /// Living and dead roaming enemies of the current level.
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    /// Items still on the floor.
    pub fn items(&self) -> &[ItemSpawn] {
        &self.items
    }

    /// The active combat session, if any.
    pub fn combat(&self) -> Option<&CombatSession> {
        self.combat.as_ref()
    }

    /// Whether an encounter is currently running.
    pub fn in_combat(&self) -> bool {
        self.combat.is_some()
    }

    /// Terminal state of the run.
    pub fn completion(&self) -> RunCompletion {
        self.completion
    }

    /// Cumulative run tallies.
    pub fn run_stats(&self) -> &RunStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ItemKind, TileKind};

    fn session() -> GameSession {
        GameSession::with_config(12345, GenerationConfig::for_testing()).unwrap()
    }

    /// A floor cell with a floor neighbor to its east, away from the
    /// stairs so the move cannot trigger a level transition.
    fn floor_pair(session: &GameSession) -> (Position, Position) {
        let grid = session.grid();
        let exit = session.exit();
        for pos in grid.positions() {
            let east = Position::new(pos.x + 1, pos.y);
            if grid.is_floor(pos) && grid.is_floor(east) && pos != exit && east != exit {
                return (pos, east);
            }
        }
        panic!("no adjacent floor pair in generated level");
    }

    #[test]
    fn test_new_session_spawns_player_at_entrance() {
        let session = session();
        assert_eq!(session.player().position, session.entrance());
        assert_eq!(session.party().len(), 4);
        assert_eq!(session.completion(), RunCompletion::Delving);
    }

    #[test]
    fn test_move_intent_counts_steps() {
        let mut session = session();
        let mut moved_any = false;
        for dir in Direction::all() {
            if session.handle_move_intent(dir).unwrap() {
                moved_any = true;
                break;
            }
        }
        // Entrance anchors sit at least one cell inside a room, so some
        // direction must be open.
        assert!(moved_any);
        assert_eq!(session.run_stats().steps_taken, 1);
    }

    #[test]
    fn test_health_potion_pickup_is_clamped() {
        let mut session = session();
        let (start, item_cell) = floor_pair(&session);

        session.enemies.clear();
        session.items.clear();
        session.player.position = start;
        session.party[0].stats.apply_damage(10); // 90/100
        session.items.push(ItemSpawn {
            kind: ItemKind::HealthPotion,
            position: item_cell,
        });

        session.handle_move_intent(Direction::East).unwrap();
        assert_eq!(session.player().position, item_cell);
        assert_eq!(session.party()[0].stats.health, 100);
        assert!(session.items().is_empty());
        assert_eq!(session.run_stats().items_collected, 1);
    }

    #[test]
    fn test_walking_into_enemy_starts_combat() {
        let mut session = session();
        let (start, enemy_cell) = floor_pair(&session);

        session.enemies.clear();
        session.items.clear();
        session.player.position = start;
        let mut rng = StdRng::seed_from_u64(5);
        let mut enemy = Enemy::spawn(enemy_cell, 1, &mut rng);
        enemy.stats.attack = 0; // keep the opener harmless for the test
        session.enemies.push(enemy);

        session.handle_move_intent(Direction::East).unwrap();
        assert!(session.in_combat());
        // The party is owned by the combat session for the duration.
        assert!(session.party().is_empty());
        assert_eq!(session.combat().unwrap().enemies().len(), 1);

        // Roaming input is rejected mid-encounter.
        assert!(session.handle_move_intent(Direction::East).is_err());
    }

    #[test]
    fn test_winning_combat_returns_party_and_clears_enemy() {
        let mut session = session();
        let (start, enemy_cell) = floor_pair(&session);

        session.enemies.clear();
        session.items.clear();
        session.player.position = start;
        let mut rng = StdRng::seed_from_u64(5);
        let mut enemy = Enemy::spawn(enemy_cell, 1, &mut rng);
        enemy.stats.attack = 0;
        enemy.stats.health = 10; // one hero swing
        session.enemies.push(enemy);

        session.handle_move_intent(Direction::East).unwrap();
        while session.in_combat() {
            if session.combat().unwrap().awaiting_input() {
                session
                    .combat_command(CombatCommand::Attack { target: 0 })
                    .unwrap();
            }
        }
        assert_eq!(session.party().len(), 4);
        assert!(session.enemies().is_empty());
        assert_eq!(session.run_stats().enemies_defeated, 1);
        assert_eq!(session.completion(), RunCompletion::Delving);
    }

    #[test]
    fn test_stairs_advance_depth_and_heal() {
        let mut session = session();
        let exit = session.exit();

        // Stand one cell west of the stairs if open, else approach from
        // whichever side is floor.
        let approach = Direction::all()
            .into_iter()
            .find_map(|dir| {
                let delta = dir.to_delta();
                let from = Position::new(exit.x - delta.x, exit.y - delta.y);
                session.grid().is_floor(from).then_some((from, dir))
            })
            .expect("stairs must have a floor approach");

        session.enemies.clear();
        session.items.clear();
        session.player.position = approach.0;
        session.party[0].stats.apply_damage(40);
        session.party[1].stats.apply_damage(40);
        session.party[1].stats.mana = 0;

        session.handle_move_intent(approach.1).unwrap();

        assert_eq!(session.depth(), 2);
        assert_eq!(session.run_stats().levels_cleared, 1);
        assert_eq!(session.player().position, session.entrance());
        // Hero fully healed, companion half of the 40 missing.
        assert_eq!(session.party()[0].stats.health, 100);
        assert_eq!(session.party()[1].stats.health, 100);
        assert_eq!(session.party()[1].stats.mana, 50);
        assert_eq!(session.party()[1].stats.defense_bonus, 1);
    }

    #[test]
    fn test_tick_is_noop_after_abandon() {
        let mut session = session();
        session.abandon();
        assert_eq!(session.completion(), RunCompletion::Abandoned);
        assert!(session.tick().is_ok());
        assert!(session.handle_move_intent(Direction::East).is_err());
    }

    #[test]
    fn test_enemy_pursuit_reaches_player_and_triggers_combat() {
        let mut session = session();

        // Build a corridor under our control.
        let mut grid = Grid::new(12, 5);
        for x in 1..11 {
            grid.set(Position::new(x, 2), TileKind::Floor);
        }
        session.grid = grid;
        session.rooms.clear();
        session.items.clear();
        session.enemies.clear();
        session.exit = Position::new(11, 4); // off the corridor
        session.player.position = Position::new(2, 2);

        let mut rng = StdRng::seed_from_u64(5);
        let mut enemy = Enemy::spawn(Position::new(5, 2), 1, &mut rng);
        enemy.stats.attack = 0;
        enemy.move_cooldown = 0;
        enemy.move_delay = 0; // step every tick for the test
        session.enemies.push(enemy);

        for _ in 0..8 {
            session.tick().unwrap();
            if session.in_combat() {
                break;
            }
        }
        assert!(session.in_combat());
    }
}
