//! # Actor Model
//!
//! Shared attribute schema for everything that fights or roams: the hero,
//! party members, and enemies, plus the floor items that mutate them.
//!
//! Actors are tagged variants over a common [`Stats`] record rather than an
//! inheritance hierarchy; combat and movement only ever talk to the stats.

use crate::combat::Skill;
use crate::{config, new_entity_id, Direction, EntityId, Position};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Enemy name table, ordered roughly by menace. Deeper levels draw from
/// further down the list.
const ENEMY_NAMES: &[&str] = &[
    "Rat", "Bat", "Goblin", "Skeleton", "Orc", "Ghoul", "Troll", "Wraith", "Ogre",
];

/// Shared combat/roaming attributes for every actor.
///
/// Invariants enforced here:
/// - `0 <= health <= max_health` after every damage or heal application
/// - `health == 0` implies `alive == false`, and the transition is one-way
/// - `defense_bonus` never drops below its baseline of 1
///
/// # Examples
///
/// ```
/// use delve::Stats;
///
/// let mut stats = Stats::new("Goblin", 30, 5, 0);
/// stats.apply_damage(40);
/// assert_eq!(stats.health, 0);
/// assert!(!stats.alive);
///
/// // Death is one-way: healing a corpse does nothing.
/// stats.heal(10);
/// assert_eq!(stats.health, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub name: String,
    pub health: i32,
    pub max_health: i32,
    pub attack: i32,
    pub mana: i32,
    pub max_mana: i32,
    /// Divisor applied to incoming damage; baseline 1, set to 2 by Defend.
    pub defense_bonus: i32,
    /// Movement cadence multiplier; only potions raise it.
    pub speed: f32,
    pub alive: bool,
}

impl Stats {
    /// Creates a full-health, full-mana stat block.
    pub fn new(name: impl Into<String>, max_health: i32, attack: i32, max_mana: i32) -> Self {
        Self {
            name: name.into(),
            health: max_health,
            max_health,
            attack,
            mana: max_mana,
            max_mana,
            defense_bonus: 1,
            speed: 0.5,
            alive: true,
        }
    }

    /// Applies raw damage, flooring health at 0 and flipping `alive` on a
    /// lethal hit.
    pub fn apply_damage(&mut self, amount: i32) {
        self.health = (self.health - amount.max(0)).max(0);
        if self.health == 0 {
            self.alive = false;
        }
    }

    /// Incoming damage after defense mitigation: integer floor division by
    /// the current defense bonus.
    pub fn mitigate(&self, raw: i32) -> i32 {
        raw / self.defense_bonus.max(1)
    }

    /// Heals up to `max_health`. Dead actors are never revived.
    pub fn heal(&mut self, amount: i32) {
        if self.alive {
            self.health = (self.health + amount.max(0)).min(self.max_health);
        }
    }

    /// Deducts mana if enough is available; returns whether it was spent.
    pub fn spend_mana(&mut self, cost: i32) -> bool {
        if self.mana >= cost {
            self.mana -= cost;
            true
        } else {
            false
        }
    }

    /// Restores mana, capped at `max_mana`.
    pub fn restore_mana(&mut self, amount: i32) {
        self.mana = (self.mana + amount.max(0)).min(self.max_mana);
    }

    /// Resets the defense bonus to its baseline of 1.
    pub fn reset_defense(&mut self) {
        self.defense_bonus = 1;
    }
}

/// Party roles, each with a fixed stat block and skill loadout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The dungeon-roaming protagonist; always first in the party.
    Hero,
    Warrior,
    Mage,
    Healer,
}

impl Role {
    /// Base stat block for this role.
    pub fn base_stats(self) -> Stats {
        match self {
            Role::Hero => Stats::new("Hero", config::HERO_HEALTH, config::HERO_ATTACK, 50),
            Role::Warrior => Stats::new("Warrior", 120, 12, 60),
            Role::Mage => Stats::new("Mage", 80, 15, 150),
            Role::Healer => Stats::new("Healer", 90, 8, 120),
        }
    }

    /// Fixed initiative modifier added to the d20 roll at combat start.
    pub fn initiative_modifier(self) -> i32 {
        match self {
            Role::Hero => 2,
            Role::Warrior => 1,
            Role::Mage => 3,
            Role::Healer => 2,
        }
    }
}

/// A party member: the hero or one of the companions.
///
/// Party records persist across levels and across combat sessions; only
/// their stats mutate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyMember {
    pub role: Role,
    pub stats: Stats,
    pub skills: Vec<Skill>,
}

impl PartyMember {
    /// Creates a party member with the role's stats and skill loadout.
    pub fn new(role: Role) -> Self {
        Self {
            role,
            stats: role.base_stats(),
            skills: Skill::loadout(role),
        }
    }

    /// The default four-member party, hero first.
    pub fn default_party() -> Vec<PartyMember> {
        vec![
            PartyMember::new(Role::Hero),
            PartyMember::new(Role::Warrior),
            PartyMember::new(Role::Mage),
            PartyMember::new(Role::Healer),
        ]
    }
}

/// The hero's dungeon-roaming body.
///
/// Combat stats live in the hero's party record; this carries only the
/// grid-side state that movement needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub position: Position,
    pub facing: Direction,
    /// 3-frame facing animation cursor.
    pub frame: u8,
}

impl Player {
    /// Places the hero's body at a position, facing south.
    pub fn at(position: Position) -> Self {
        Self {
            position,
            facing: Direction::South,
            frame: 0,
        }
    }
}

/// A dungeon-roaming enemy.
///
/// Scoped to a single level: regeneration discards all enemy records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub stats: Stats,
    pub position: Position,
    /// Pursuit activation radius in pixels.
    pub vision_range: f64,
    /// Ticks remaining until the next step may be attempted.
    pub move_cooldown: u32,
    /// Cooldown restarted after each accepted step.
    pub move_delay: u32,
    pub facing: Direction,
    /// 3-frame facing animation cursor.
    pub frame: u8,
}

impl Enemy {
    /// Spawns an enemy scaled to the dungeon depth (depth >= 1).
    pub fn spawn(position: Position, depth: u32, rng: &mut StdRng) -> Self {
        let depth = depth.max(1);
        let name_idx =
            ((depth as usize - 1) + rng.gen_range(0..3)).min(ENEMY_NAMES.len() - 1);
        let depth = depth as i32;
        Self {
            id: new_entity_id(),
            stats: Stats::new(ENEMY_NAMES[name_idx], 30 + depth * 10, 5 + depth * 2, 0),
            position,
            vision_range: 5.0 * config::TILE_SIZE as f64,
            move_cooldown: 0,
            move_delay: 60,
            facing: Direction::South,
            frame: 0,
        }
    }
}

/// Kinds of consumable floor items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    HealthPotion,
    StrengthPotion,
    SpeedPotion,
}

impl ItemKind {
    /// Applies this item's effect to the given stats.
    ///
    /// Health restoration is clamped; strength and speed gains are
    /// permanent and uncapped.
    pub fn apply(self, stats: &mut Stats) {
        match self {
            ItemKind::HealthPotion => stats.heal(20),
            ItemKind::StrengthPotion => stats.attack += 5,
            ItemKind::SpeedPotion => stats.speed += 0.2,
        }
    }

    /// Depth-weighted random draw: stat potions grow more common the
    /// deeper the dungeon goes.
    pub fn weighted_draw(depth: u32, rng: &mut StdRng) -> Self {
        let stat_weight = 2 + depth.min(6);
        let total = 6 + 2 * stat_weight;
        let roll = rng.gen_range(0..total);
        if roll < 6 {
            ItemKind::HealthPotion
        } else if roll < 6 + stat_weight {
            ItemKind::StrengthPotion
        } else {
            ItemKind::SpeedPotion
        }
    }

    /// Health-biased draw used for the entrance room.
    pub fn entrance_draw(rng: &mut StdRng) -> Self {
        match rng.gen_range(0..10) {
            0..=6 => ItemKind::HealthPotion,
            7..=8 => ItemKind::StrengthPotion,
            _ => ItemKind::SpeedPotion,
        }
    }
}

/// An item lying on the dungeon floor, consumed on pickup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSpawn {
    pub kind: ItemKind,
    pub position: Position,
}
