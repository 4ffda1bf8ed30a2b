//! # Skills
//!
//! Immutable skill records and the per-role loadouts.
//!
//! A skill's damage or heal magnitude is a fixed property of the skill
//! itself, never derived from the caster's attack stat.

use crate::Role;
use serde::{Deserialize, Serialize};

/// Whether a skill hits one combatant or a whole side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillTarget {
    Single,
    All,
}

/// What a skill does to its targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillEffect {
    Damage,
    Heal,
}

/// An actor-owned combat skill.
///
/// # Examples
///
/// ```
/// use delve::{Skill, SkillEffect, SkillTarget};
///
/// let heal = Skill::new("Heal", 20, 10, SkillTarget::All, SkillEffect::Heal);
/// assert_eq!(heal.power, 20);
/// assert_eq!(heal.mana_cost, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    /// Damage dealt or health restored, per target.
    pub power: i32,
    pub mana_cost: i32,
    pub target: SkillTarget,
    pub effect: SkillEffect,
}

impl Skill {
    /// Creates a skill record.
    pub fn new(
        name: impl Into<String>,
        power: i32,
        mana_cost: i32,
        target: SkillTarget,
        effect: SkillEffect,
    ) -> Self {
        Self {
            name: name.into(),
            power,
            mana_cost,
            target,
            effect,
        }
    }

    /// The fixed skill loadout for a party role.
    pub fn loadout(role: Role) -> Vec<Skill> {
        match role {
            Role::Hero => vec![Skill::new(
                "Power Strike",
                18,
                15,
                SkillTarget::Single,
                SkillEffect::Damage,
            )],
            Role::Warrior => vec![
                Skill::new("Shield Bash", 15, 10, SkillTarget::Single, SkillEffect::Damage),
                Skill::new("Cleave", 10, 20, SkillTarget::All, SkillEffect::Damage),
            ],
            Role::Mage => vec![
                Skill::new("Fireball", 30, 25, SkillTarget::Single, SkillEffect::Damage),
                Skill::new("Chain Lightning", 18, 40, SkillTarget::All, SkillEffect::Damage),
            ],
            Role::Healer => vec![
                Skill::new("Mend", 25, 15, SkillTarget::Single, SkillEffect::Heal),
                Skill::new("Heal", 20, 10, SkillTarget::All, SkillEffect::Heal),
            ],
        }
    }
}
