//! # Combat Module
//!
//! The turn-based encounter state machine.
//!
//! A [`CombatSession`] owns the party records for the duration of one
//! encounter: initiative is rolled once at the start, turns cycle through
//! living combatants in initiative order, party turns wait for an external
//! command, and enemy turns resolve immediately and atomically. The session
//! ends with exactly one of [`CombatOutcome::PartyWon`],
//! [`CombatOutcome::PartyFled`], or [`CombatOutcome::PartyDefeated`].

pub mod skills;

pub use skills::*;

use crate::{DelveError, DelveResult, PartyMember, Stats};
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Which side of the encounter a combatant fights on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatSide {
    Party,
    Enemies,
}

/// One slot in the initiative order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnEntry {
    pub side: CombatSide,
    /// Index into the party or enemy list, per `side`.
    pub index: usize,
    pub initiative: i32,
}

/// Terminal and non-terminal encounter states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatOutcome {
    Ongoing,
    PartyWon,
    PartyFled,
    PartyDefeated,
}

/// Commands the external input collaborator may issue for the acting party
/// member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatCommand {
    /// Basic attack against one living enemy.
    Attack { target: usize },
    /// Cast a skill from the actor's loadout; `target` selects the enemy
    /// (damage) or party member (heal) for single-target skills.
    UseSkill { skill: usize, target: Option<usize> },
    /// Halve incoming damage until the actor's next turn starts.
    Defend,
    /// Attempt to escape the encounter; succeeds half the time.
    Flee,
}

/// One full turn-based battle between the party and a set of enemies.
///
/// The session owns the party vector while the encounter runs; callers get
/// it back through [`CombatSession::into_party`] once an outcome is
/// reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatSession {
    party: Vec<PartyMember>,
    enemies: Vec<Stats>,
    turn_order: Vec<TurnEntry>,
    current: usize,
    outcome: CombatOutcome,
    log: Vec<String>,
}

impl CombatSession {
    /// Starts an encounter: rolls initiative for every combatant, sorts the
    /// turn order descending (stable, party entries first on ties), and
    /// resolves any enemy turns that lead the order before yielding.
    pub fn begin(party: Vec<PartyMember>, enemies: Vec<Stats>, rng: &mut StdRng) -> Self {
        let mut turn_order = Vec::with_capacity(party.len() + enemies.len());
        for (index, member) in party.iter().enumerate() {
            turn_order.push(TurnEntry {
                side: CombatSide::Party,
                index,
                initiative: rng.gen_range(1..=20) + member.role.initiative_modifier(),
            });
        }
        for (index, _) in enemies.iter().enumerate() {
            turn_order.push(TurnEntry {
                side: CombatSide::Enemies,
                index,
                initiative: rng.gen_range(1..=20),
            });
        }
        // Stable sort keeps party before enemies on equal rolls.
        turn_order.sort_by(|a, b| b.initiative.cmp(&a.initiative));

        let mut session = Self {
            party,
            enemies,
            turn_order,
            current: 0,
            outcome: CombatOutcome::Ongoing,
            log: Vec::new(),
        };

        session.push_log("=== COMBAT BEGINS ===".to_string());
        let rolls: Vec<String> = session
            .turn_order
            .iter()
            .map(|e| format!("{} rolled {} for initiative", session.entry_name(e), e.initiative))
            .collect();
        for roll in rolls {
            session.push_log(roll);
        }

        session.run_turns(rng);
        session
    }

    /// Executes one command for the currently acting party member.
    ///
    /// Invalid commands (resolved session, enemy turn, dead or out-of-range
    /// target, insufficient mana) are rejected with no state change. After
    /// a valid action the session advances, resolving enemy turns until the
    /// next party turn or a terminal outcome.
    pub fn execute(&mut self, command: CombatCommand, rng: &mut StdRng) -> DelveResult<()> {
        if self.outcome != CombatOutcome::Ongoing {
            return Err(DelveError::InvalidCommand(
                "the encounter is already resolved".to_string(),
            ));
        }
        let entry = self.turn_order[self.current];
        if entry.side != CombatSide::Party {
            return Err(DelveError::InvalidCommand(
                "it is not the party's turn".to_string(),
            ));
        }
        if !self.party[entry.index].stats.alive {
            return Err(DelveError::InvalidCommand(
                "the acting combatant is dead".to_string(),
            ));
        }

        match command {
            CombatCommand::Attack { target } => self.resolve_attack(entry.index, target)?,
            CombatCommand::UseSkill { skill, target } => {
                self.resolve_skill(entry.index, skill, target)?
            }
            CombatCommand::Defend => self.resolve_defend(entry.index),
            CombatCommand::Flee => self.resolve_flee(entry.index, rng),
        }

        self.check_termination();
        if self.outcome == CombatOutcome::Ongoing {
            self.advance_cursor();
            self.run_turns(rng);
        }
        Ok(())
    }

    fn resolve_attack(&mut self, actor: usize, target: usize) -> DelveResult<()> {
        let enemy = self
            .enemies
            .get(target)
            .ok_or_else(|| DelveError::InvalidCommand("no such enemy".to_string()))?;
        if !enemy.alive {
            return Err(DelveError::InvalidCommand(
                "that enemy is already dead".to_string(),
            ));
        }

        let damage = self.party[actor].stats.attack;
        self.enemies[target].apply_damage(damage);
        let line = format!(
            "{} attacks {} for {} damage",
            self.party[actor].stats.name, self.enemies[target].name, damage
        );
        self.push_log(line);
        if !self.enemies[target].alive {
            let felled = format!("{} is slain!", self.enemies[target].name);
            self.push_log(felled);
        }
        Ok(())
    }

    fn resolve_skill(
        &mut self,
        actor: usize,
        skill_idx: usize,
        target: Option<usize>,
    ) -> DelveResult<()> {
        let skill = self.party[actor]
            .skills
            .get(skill_idx)
            .ok_or_else(|| DelveError::InvalidCommand("no such skill".to_string()))?
            .clone();

        if self.party[actor].stats.mana < skill.mana_cost {
            return Err(DelveError::InvalidCommand(format!(
                "not enough mana for {} ({} needed, {} left)",
                skill.name, skill.mana_cost, self.party[actor].stats.mana
            )));
        }

        // Validate targeting before any mutation.
        let single_target = match (skill.effect, skill.target) {
            (SkillEffect::Damage, SkillTarget::Single) => {
                let t = target.ok_or_else(|| {
                    DelveError::InvalidCommand("this skill needs a target".to_string())
                })?;
                match self.enemies.get(t) {
                    Some(enemy) if enemy.alive => Some(t),
                    Some(_) => {
                        return Err(DelveError::InvalidCommand(
                            "that enemy is already dead".to_string(),
                        ))
                    }
                    None => {
                        return Err(DelveError::InvalidCommand("no such enemy".to_string()))
                    }
                }
            }
            (SkillEffect::Heal, SkillTarget::Single) => {
                let t = target.ok_or_else(|| {
                    DelveError::InvalidCommand("this skill needs a target".to_string())
                })?;
                match self.party.get(t) {
                    Some(member) if member.stats.alive => Some(t),
                    Some(_) => {
                        return Err(DelveError::InvalidCommand(
                            "cannot heal a fallen party member".to_string(),
                        ))
                    }
                    None => {
                        return Err(DelveError::InvalidCommand(
                            "no such party member".to_string(),
                        ))
                    }
                }
            }
            _ => None,
        };

        self.party[actor].stats.spend_mana(skill.mana_cost);
        let caster = self.party[actor].stats.name.clone();
        let cast_line = format!("{} casts {}", caster, skill.name);
        self.push_log(cast_line);

        match (skill.effect, skill.target) {
            (SkillEffect::Damage, SkillTarget::Single) => {
                if let Some(t) = single_target {
                    self.enemies[t].apply_damage(skill.power);
                    let line = format!(
                        "{} takes {} damage from {}",
                        self.enemies[t].name, skill.power, skill.name
                    );
                    self.push_log(line);
                    if !self.enemies[t].alive {
                        let felled = format!("{} is slain!", self.enemies[t].name);
                        self.push_log(felled);
                    }
                }
            }
            (SkillEffect::Damage, SkillTarget::All) => {
                for i in 0..self.enemies.len() {
                    if self.enemies[i].alive {
                        self.enemies[i].apply_damage(skill.power);
                        let line = format!(
                            "{} takes {} damage from {}",
                            self.enemies[i].name, skill.power, skill.name
                        );
                        self.push_log(line);
                        if !self.enemies[i].alive {
                            let felled = format!("{} is slain!", self.enemies[i].name);
                            self.push_log(felled);
                        }
                    }
                }
            }
            (SkillEffect::Heal, SkillTarget::Single) => {
                if let Some(t) = single_target {
                    self.party[t].stats.heal(skill.power);
                    let line = format!(
                        "{} is healed for {}",
                        self.party[t].stats.name, skill.power
                    );
                    self.push_log(line);
                }
            }
            (SkillEffect::Heal, SkillTarget::All) => {
                for i in 0..self.party.len() {
                    if self.party[i].stats.alive {
                        self.party[i].stats.heal(skill.power);
                    }
                }
                let line = format!("the party is healed for {}", skill.power);
                self.push_log(line);
            }
        }
        Ok(())
    }

    fn resolve_defend(&mut self, actor: usize) {
        self.party[actor].stats.defense_bonus = 2;
        let line = format!("{} braces behind their guard", self.party[actor].stats.name);
        self.push_log(line);
    }

    fn resolve_flee(&mut self, actor: usize, rng: &mut StdRng) {
        if rng.gen::<f64>() > 0.5 {
            let line = format!("{} leads the party out of the fight!", self.party[actor].stats.name);
            self.push_log(line);
            self.outcome = CombatOutcome::PartyFled;
        } else {
            let line = format!("{} fails to find an opening to escape", self.party[actor].stats.name);
            self.push_log(line);
        }
    }

    /// Runs automatic turns until a living party member is up for input or
    /// the encounter resolves. Dead slots are skipped circularly; the
    /// acting combatant's defense bonus resets at the start of its turn.
    fn run_turns(&mut self, rng: &mut StdRng) {
        self.check_termination();
        while self.outcome == CombatOutcome::Ongoing {
            let entry = self.turn_order[self.current];
            if !self.entry_alive(&entry) {
                self.advance_cursor();
                continue;
            }
            self.reset_defense(&entry);
            match entry.side {
                CombatSide::Party => break,
                CombatSide::Enemies => {
                    self.resolve_enemy_turn(entry.index, rng);
                    self.check_termination();
                    if self.outcome == CombatOutcome::Ongoing {
                        self.advance_cursor();
                    }
                }
            }
        }
    }

    /// Enemy turn: one uniformly random living party member takes
    /// `floor(attack / defense_bonus)` damage.
    fn resolve_enemy_turn(&mut self, enemy_idx: usize, rng: &mut StdRng) {
        let living: Vec<usize> = (0..self.party.len())
            .filter(|&i| self.party[i].stats.alive)
            .collect();
        if living.is_empty() {
            return;
        }
        let target = living[rng.gen_range(0..living.len())];

        let raw = self.enemies[enemy_idx].attack;
        let damage = self.party[target].stats.mitigate(raw);
        self.party[target].stats.apply_damage(damage);

        let line = format!(
            "{} hits {} for {} damage",
            self.enemies[enemy_idx].name, self.party[target].stats.name, damage
        );
        self.push_log(line);
        if !self.party[target].stats.alive {
            let fell = format!("{} falls!", self.party[target].stats.name);
            self.push_log(fell);
        }
    }

    fn check_termination(&mut self) {
        if self.outcome != CombatOutcome::Ongoing {
            return;
        }
        if self.enemies.iter().all(|e| !e.alive) {
            self.push_log("=== VICTORY ===".to_string());
            self.outcome = CombatOutcome::PartyWon;
        } else if self.party.iter().all(|m| !m.stats.alive) {
            self.push_log("=== THE PARTY HAS FALLEN ===".to_string());
            self.outcome = CombatOutcome::PartyDefeated;
        }
    }

    fn reset_defense(&mut self, entry: &TurnEntry) {
        match entry.side {
            CombatSide::Party => self.party[entry.index].stats.reset_defense(),
            CombatSide::Enemies => self.enemies[entry.index].reset_defense(),
        }
    }

    fn entry_alive(&self, entry: &TurnEntry) -> bool {
        match entry.side {
            CombatSide::Party => self.party[entry.index].stats.alive,
            CombatSide::Enemies => self.enemies[entry.index].alive,
        }
    }

    fn entry_name(&self, entry: &TurnEntry) -> &str {
        match entry.side {
            CombatSide::Party => &self.party[entry.index].stats.name,
            CombatSide::Enemies => &self.enemies[entry.index].name,
        }
    }

    fn advance_cursor(&mut self) {
        self.current = (self.current + 1) % self.turn_order.len();
    }

    fn push_log(&mut self, line: String) {
        debug!("combat: {}", line);
        self.log.push(line);
    }

    // Read-only accessors for the rendering collaborator.

    /// Current encounter outcome.
    pub fn outcome(&self) -> CombatOutcome {
        self.outcome
    }

    /// Whether the session is waiting on a party command.
    pub fn awaiting_input(&self) -> bool {
        self.outcome == CombatOutcome::Ongoing
            && self.turn_order[self.current].side == CombatSide::Party
    }

    /// The full initiative order as rolled at encounter start.
    pub fn turn_order(&self) -> &[TurnEntry] {
        &self.turn_order
    }

    /// The entry whose turn it currently is.
    pub fn current_turn(&self) -> &TurnEntry {
        &self.turn_order[self.current]
    }

    /// Party records, hero first.
    pub fn party(&self) -> &[PartyMember] {
        &self.party
    }

    /// Enemy combatant stats.
    pub fn enemies(&self) -> &[Stats] {
        &self.enemies
    }

    /// Battle message log, oldest first.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Consumes the session, returning the party records to the caller.
    ///
    /// This is the ownership handoff back to the roaming world once the
    /// encounter has resolved.
    pub fn into_party(self) -> Vec<PartyMember> {
        self.party
    }
}
