#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn scheduler for the Spirit Crypt.
//!
//! A [`Game`] owns the dungeon, the player's spirit and the follow-up prompt
//! state. Each submitted [`PlayerCommand`] is resolved synchronously: the
//! player's action first, then every autonomous creature that accumulated
//! enough time, then the field of view. Nothing suspends between those steps;
//! commands that need more input park the scheduler in a [`Prompt`].

use std::mem;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use spirit_crypt_core::{
    CreatureId, Direction, Event, Offset, PlayerCommand, Position, WELCOME_BANNER,
};
use spirit_crypt_system_generation::{spawn_point, DungeonGenerator, GenerationError};
use spirit_crypt_world::{Creature, Dungeon, Level, MessageLog, MessageTone, PressureRule};
use tracing::{debug, info};

mod ai;
pub mod combat;
mod interaction;
mod navigation;
mod prompt;

pub use prompt::{DirectionIntent, ItemIntent, Prompt};

/// Bulk of the disembodied spirit when checking whether it fits a cell.
const SPIRIT_BULK: i32 = 1;

/// Starting stats of the disembodied spirit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpiritStats {
    /// Willpower pitted against creatures during possession.
    pub willpower: i32,
    /// Maximum stability; the spirit dissipates when it runs out.
    pub stability: f32,
    /// Extra damage dealt by possessed bodies.
    pub power: i32,
}

impl Default for SpiritStats {
    fn default() -> Self {
        Self {
            willpower: 8,
            stability: 8.0,
            power: 0,
        }
    }
}

/// Configuration parameters required to construct the scheduler.
#[derive(Clone, Debug)]
pub struct Config {
    /// Seed of the scheduler's random number generator.
    pub seed: u64,
    /// Sight radius of the player in cells.
    pub fov_radius: i32,
    /// Time granted to creatures per action taken in spirit form.
    pub spirit_delta: i32,
    /// Stability spent per spirit step.
    pub spirit_move_cost: f32,
    /// Stability spent per failed possession in spirit form.
    pub failed_possession_cost: f32,
    /// Pressure plate kinds and threshold.
    pub pressure: PressureRule,
    /// Bulk from which creatures operate furniture blocking their way.
    pub door_opener_bulk: i32,
    /// Creature kind whose death wins the game.
    pub final_boss_kind: String,
    /// Cell inside the start slot where the spirit appears.
    pub spawn_offset: Offset,
    /// Number of message lines kept.
    pub log_capacity: usize,
    /// Column after which message lines wrap.
    pub log_wrap_width: usize,
    /// Whether the first possession attempt always succeeds.
    pub guaranteed_first_possession: bool,
    /// Starting spirit stats.
    pub spirit: SpiritStats,
    /// Item kind that opens the upgrade prompt when touched.
    pub orb_kind: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 0x5eed_c0de,
            fov_radius: 7,
            spirit_delta: 3,
            spirit_move_cost: 0.5,
            failed_possession_cost: 1.0,
            pressure: PressureRule::default(),
            door_opener_bulk: 5,
            final_boss_kind: "vitalius".to_owned(),
            spawn_offset: Offset::new(8, 3),
            log_capacity: 10,
            log_wrap_width: 90,
            guaranteed_first_possession: true,
            spirit: SpiritStats::default(),
            orb_kind: "orb".to_owned(),
        }
    }
}

/// The player's spirit and the body it currently controls.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    position: Position,
    body: Option<CreatureId>,
    /// Willpower pitted against creatures during possession.
    pub willpower: i32,
    /// Stability restored by a successful possession.
    pub max_stability: f32,
    /// Remaining stability.
    pub stability: f32,
    /// Extra damage dealt by possessed bodies.
    pub spirit_power: i32,
}

impl Player {
    fn new(position: Position, stats: SpiritStats) -> Self {
        Self {
            position,
            body: None,
            willpower: stats.willpower,
            max_stability: stats.stability,
            stability: stats.stability,
            spirit_power: stats.power,
        }
    }

    /// Cell of the spirit, or of the possessed body.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Creature currently possessed, if any.
    #[must_use]
    pub const fn body(&self) -> Option<CreatureId> {
        self.body
    }

    /// Reports whether the player roams without a body.
    #[must_use]
    pub const fn is_spirit(&self) -> bool {
        self.body.is_none()
    }
}

/// How a run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The final boss was slain.
    Victory {
        /// Category of the attacker or kind of tile that slew the boss.
        cause: String,
    },
    /// The spirit ran out of stability.
    SpiritDissipated,
}

/// Adds `delta` to an accumulator and returns the actions it pays for.
///
/// Every action costs `speed`; an accumulator exactly equal to `speed` does
/// not yet pay for one. Non-positive speeds never act.
pub fn grant_actions(time: &mut i32, delta: i32, speed: i32) -> u32 {
    *time += delta;
    if speed <= 0 {
        return 0;
    }

    let mut actions = 0;
    while *time > speed {
        *time -= speed;
        actions += 1;
    }
    actions
}

/// Turn-based scheduler driving a single run.
#[derive(Debug)]
pub struct Game {
    config: Config,
    generator: DungeonGenerator,
    dungeon: Dungeon,
    player: Player,
    messages: MessageLog,
    prompt: Prompt,
    rng: ChaCha8Rng,
    outcome: Option<Outcome>,
    tutorial_pending: bool,
}

impl Game {
    /// Generates the first depth and places the spirit in the start room.
    pub fn new(config: Config, mut generator: DungeonGenerator) -> Result<Self, GenerationError> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let generated = generator.generate_level(1, &mut rng)?;
        let start = generated
            .plan
            .start_slot
            .ok_or(GenerationError::MissingMandatoryRoom { role: "start" })?;
        let position = spawn_point(start, config.spawn_offset);

        let mut messages = MessageLog::new(config.log_capacity, config.log_wrap_width);
        messages.add(WELCOME_BANNER);

        let mut game = Self {
            player: Player::new(position, config.spirit),
            tutorial_pending: config.guaranteed_first_possession,
            config,
            generator,
            dungeon: Dungeon::new(generated.level),
            messages,
            prompt: Prompt::Idle,
            rng,
            outcome: None,
        };
        game.read_descriptions();
        game.refresh_sight();

        info!(
            seed = game.config.seed,
            x = position.x(),
            y = position.y(),
            "game_started"
        );
        Ok(game)
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The player's spirit.
    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// The level the player is on.
    #[must_use]
    pub fn level(&self) -> &Level {
        self.dungeon.current()
    }

    /// Every level generated so far.
    #[must_use]
    pub fn dungeon(&self) -> &Dungeon {
        &self.dungeon
    }

    /// Bounded log of messages for the player.
    #[must_use]
    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    /// Follow-up input the scheduler is waiting for.
    #[must_use]
    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    /// How the run ended, once it has.
    #[must_use]
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// The possessed body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Creature> {
        self.player.body.and_then(|body| self.level().creature(body))
    }

    /// Resolves a single player command and everything it sets in motion.
    ///
    /// Events produced along the way are appended to `out`. Commands
    /// submitted after the run ended are ignored. The only error is a failure
    /// to generate a deeper level when taking the stairs down.
    pub fn submit(
        &mut self,
        command: PlayerCommand,
        out: &mut Vec<Event>,
    ) -> Result<(), GenerationError> {
        if self.outcome.is_some() {
            debug!(?command, "command_after_outcome_ignored");
            return Ok(());
        }

        let advance = match mem::take(&mut self.prompt) {
            Prompt::Idle => self.handle_idle(command, out)?,
            Prompt::AwaitingDirection(intent) => match command {
                PlayerCommand::Step { direction, .. } => {
                    self.resolve_direction(intent, direction, out)
                }
                PlayerCommand::Cancel => false,
                other => self.handle_idle(other, out)?,
            },
            Prompt::AwaitingItemChoice(intent) => self.resolve_item_choice(intent, command),
        };

        self.read_descriptions();

        if advance && self.outcome.is_none() {
            let delta = self.time_delta();
            self.update_loop(delta, out);
        }

        self.refresh_sight();
        Ok(())
    }

    fn handle_idle(
        &mut self,
        command: PlayerCommand,
        out: &mut Vec<Event>,
    ) -> Result<bool, GenerationError> {
        let advance = match command {
            PlayerCommand::Step { direction, possess } => self.step(direction, possess, out),
            PlayerCommand::Activate => self.await_direction(
                DirectionIntent::Activate,
                "You can not activate objects as a spirit.",
            ),
            PlayerCommand::Push => {
                self.await_direction(DirectionIntent::Push, "You can not push objects as a spirit.")
            }
            PlayerCommand::Describe => {
                self.prompt = Prompt::AwaitingDirection(DirectionIntent::Describe);
                false
            }
            PlayerCommand::PickUp => {
                self.pick_up();
                false
            }
            PlayerCommand::UseStairs => {
                self.use_stairs(out)?;
                false
            }
            PlayerCommand::Choose { number } => {
                self.open_slot_menu(number);
                false
            }
            PlayerCommand::ItemAction(_) | PlayerCommand::Cancel => {
                debug!(?command, "command_without_prompt_ignored");
                false
            }
        };
        Ok(advance)
    }

    fn await_direction(&mut self, intent: DirectionIntent, refusal: &str) -> bool {
        if self.player.is_spirit() {
            self.messages.add(refusal);
        } else {
            self.prompt = Prompt::AwaitingDirection(intent);
        }
        false
    }

    fn time_delta(&self) -> i32 {
        self.body()
            .map_or(self.config.spirit_delta, |body| body.def().speed)
    }

    fn step(&mut self, direction: Direction, possess: bool, out: &mut Vec<Event>) -> bool {
        let target = self.player.position.step(direction);
        let occupant = self.level().creature_at(target).map(Creature::id);
        if let Some(occupant) = occupant {
            if possess && (self.player.is_spirit() || direction.is_moving()) {
                return self.attempt_possession(occupant, target, out);
            }
        }

        let advance = match self.player.body {
            None => {
                if self.level().can_hold(SPIRIT_BULK, target) {
                    self.player.position = target;
                    self.reduce_stability(self.config.spirit_move_cost, out);
                    true
                } else {
                    false
                }
            }
            Some(body) => self.steer_body(body, target, possess, out),
        };

        if direction.is_moving() {
            self.report_floor(self.player.position);
        }
        self.offer_orb();
        advance
    }

    fn steer_body(
        &mut self,
        body: CreatureId,
        target: Position,
        detach: bool,
        out: &mut Vec<Event>,
    ) -> bool {
        let level = self.dungeon.current();
        let (bulk, kind) = level.creature(body).map_or((SPIRIT_BULK, String::new()), |creature| {
            (creature.def().bulk, creature.def().kind.clone())
        });
        let spirit_fits = level.can_hold(SPIRIT_BULK, target);
        let body_fits = level.can_hold(bulk, target);
        let open_tile = level.tile_def_at(target).max_bulk > 0;

        if detach && spirit_fits {
            self.player.position = target;
            self.player.body = None;
            self.messages.add(format!("You detach from the {kind}."));
            out.push(Event::SpiritDetached {
                body,
                ejected: false,
            });
            return true;
        }

        if body_fits {
            self.move_creature(body, target, out);
            let level = self.dungeon.current_mut();
            if let Some(position) = level.creature(body).map(Creature::position) {
                self.player.position = position;
            }
            level.cleanup_dead_creatures();
            return true;
        }

        if open_tile {
            self.messages.add("You are too big to move there.");
        }
        false
    }

    fn attempt_possession(
        &mut self,
        occupant: CreatureId,
        target: Position,
        out: &mut Vec<Event>,
    ) -> bool {
        let Some(creature) = self.level().creature(occupant) else {
            return false;
        };
        let name = creature.def().name.clone();
        let chance = combat::possession_chance(
            self.player.willpower,
            creature.willpower,
            creature.current_hp,
            creature.def().max_hp,
        );

        if chance < 1.0 {
            let percent = (chance * 100.0).floor() as i32;
            self.messages
                .add(format!("You try to possess the {name} ({percent}% chance)"));
        }

        let success = self.tutorial_pending || self.rng.gen::<f32>() < chance;
        out.push(Event::PossessionAttempted {
            target: occupant,
            chance,
            success,
        });

        if success {
            if chance < 1.0 {
                self.messages
                    .add("You were more potent and overcame the feeble creature.");
            } else {
                self.messages.add(format!("You return to the body of {name}."));
            }
            if let Some(creature) = self.dungeon.current_mut().creature_mut(occupant) {
                creature.willpower = 0;
            }
            self.player.body = Some(occupant);
            self.player.stability = self.player.max_stability;
            self.player.position = target;
            self.tutorial_pending = false;
            debug!(creature = occupant.get(), chance, "possession_succeeded");
        } else if self.player.is_spirit() {
            self.messages.add(
                "The creature did not submit to you. You lose some of your stability.",
            );
            self.reduce_stability(self.config.failed_possession_cost, out);
        } else {
            self.messages.add("The creature did not submit to you.");
        }
        true
    }

    fn reduce_stability(&mut self, amount: f32, out: &mut Vec<Event>) {
        self.player.stability -= amount;
        if self.player.stability <= 0.0 && self.outcome.is_none() {
            self.messages.add_toned(
                "Your spirit can no longer keep its form and is doomed to linger between worlds.",
                MessageTone::Danger,
            );
            self.outcome = Some(Outcome::SpiritDissipated);
            out.push(Event::SpiritDissipated);
            info!("spirit_dissipated");
        }
    }

    /// Moves a creature one cell, or attacks whoever stands there.
    ///
    /// Creatures of the same category leave each other alone unless one of
    /// them is the player's body or the defender has no will of its own.
    pub(crate) fn move_creature(&mut self, id: CreatureId, target: Position, out: &mut Vec<Event>) {
        let level = self.dungeon.current();
        let Some(creature) = level.creature(id) else {
            return;
        };
        let from = creature.position();
        let bulk = creature.def().bulk;
        let flying = creature.def().flying;

        if let Some(defender) = level.creature_at(target).filter(|other| other.id() != id) {
            let player_controlled =
                self.player.body == Some(id) || self.player.body == Some(defender.id());
            if defender.willpower == 0
                || player_controlled
                || creature.def().category != defender.def().category
            {
                let defender = defender.id();
                self.fight(id, defender, out);
            }
            return;
        }

        if target == from || !level.can_hold(bulk, target) {
            return;
        }

        let level = self.dungeon.current_mut();
        level.relocate_creature(id, target);
        level.settle_pressure(&self.config.pressure, from, target);
        out.push(Event::CreatureMoved {
            creature: id,
            from,
            to: target,
        });

        let damage = level.tile_damage_at(target);
        if damage <= 0 || flying {
            return;
        }
        let tile_kind = level.tile_def_at(target).kind.clone();
        if let Some(creature) = level.creature_mut(id) {
            creature.current_hp -= damage;
        }
        if self.player.body == Some(id) {
            self.messages.add_toned(
                format!("You take {damage} damage from the {tile_kind}!"),
                MessageTone::Danger,
            );
        }
        self.check_death(id, &tile_kind, out);
    }

    fn fight(&mut self, attacker: CreatureId, defender: CreatureId, out: &mut Vec<Event>) {
        let level = self.dungeon.current();
        let (Some(striker), Some(target)) = (level.creature(attacker), level.creature(defender))
        else {
            return;
        };

        let attacker_is_body = self.player.body == Some(attacker);
        let defender_is_body = self.player.body == Some(defender);
        let spirit_power = if attacker_is_body {
            self.player.spirit_power
        } else {
            0
        };
        let attack = striker.weapon_bonus() + striker.def().strength + spirit_power;
        let defence = target.armour_bonus() + target.def().defence;
        let cause = striker.def().category.clone();
        let visible = level.line_of_sight(self.player.position, striker.position());
        let attacker_name = if attacker_is_body {
            "you".to_owned()
        } else {
            striker.def().name.clone()
        };
        let defender_name = if defender_is_body {
            "you".to_owned()
        } else {
            format!("the {}", target.def().name)
        };

        let damage = combat::roll_damage(&mut self.rng, attack, defence);
        if let Some(target) = self.dungeon.current_mut().creature_mut(defender) {
            target.current_hp -= damage;
        }

        if visible {
            let suffix = if attacker_is_body { "" } else { "s" };
            let tone = if defender_is_body {
                MessageTone::Danger
            } else {
                MessageTone::Combat
            };
            self.messages.add_toned(
                format!("{attacker_name} hit{suffix} {defender_name} and deal{suffix} {damage} damage."),
                tone,
            );
        }
        out.push(Event::CreatureAttacked {
            attacker,
            defender,
            damage,
        });

        self.check_death(defender, &cause, out);
    }

    /// Handles a creature whose hit points ran out, once.
    ///
    /// Carried items fall to the floor and a possessed body ejects the
    /// spirit. Killing the final boss ends the run.
    fn check_death(&mut self, id: CreatureId, cause: &str, out: &mut Vec<Event>) {
        let player_position = self.player.position;
        let level = self.dungeon.current_mut();
        let Some(creature) = level.creature_mut(id) else {
            return;
        };
        if creature.current_hp > 0 || creature.is_dead {
            return;
        }

        creature.is_dead = true;
        let position = creature.position();
        let kind = creature.def().kind.clone();
        for item in creature.take_all_items() {
            let _ = level.add_item(item, position);
        }

        let is_body = self.player.body == Some(id);
        if level.line_of_sight(player_position, position) {
            let your = if is_body { "your " } else { "" };
            self.messages.add(format!("{your}{kind} died."));
        }
        if is_body {
            self.player.body = None;
            self.messages
                .add_toned("You detach from the corpse.", MessageTone::Danger);
            out.push(Event::SpiritDetached {
                body: id,
                ejected: true,
            });
        }

        out.push(Event::CreatureDied {
            creature: id,
            cause: cause.to_owned(),
        });
        debug!(creature = %kind, cause, "creature_died");

        if kind == self.config.final_boss_kind {
            info!(cause, "final_boss_slain");
            self.outcome = Some(Outcome::Victory {
                cause: cause.to_owned(),
            });
            out.push(Event::Victory {
                cause: cause.to_owned(),
            });
        }
    }

    /// Grants every autonomous creature `delta` time and runs the actions it pays for.
    fn update_loop(&mut self, delta: i32, out: &mut Vec<Event>) {
        if delta <= 0 {
            return;
        }
        out.push(Event::TurnAdvanced { delta });

        for id in self.level().creature_ids() {
            if self.player.body == Some(id) {
                continue;
            }
            let actions = match self.dungeon.current_mut().creature_mut(id) {
                Some(creature) if creature.is_alive() => {
                    let speed = creature.def().speed;
                    grant_actions(&mut creature.time, delta, speed)
                }
                _ => continue,
            };

            for _ in 0..actions {
                let willing = self
                    .level()
                    .creature(id)
                    .is_some_and(|creature| creature.is_alive() && creature.willpower > 0);
                if !willing || self.outcome.is_some() {
                    break;
                }
                self.ai_turn(id, out);
            }
        }

        self.dungeon.current_mut().cleanup_dead_creatures();
    }

    fn read_descriptions(&mut self) {
        let texts = self
            .dungeon
            .current_mut()
            .take_unread_descriptions(self.player.position);
        for text in texts {
            self.messages.add_toned(text, MessageTone::Lore);
        }
    }

    fn refresh_sight(&mut self) {
        let origin = self.player.position;
        let radius = self.config.fov_radius;
        let level = self.dungeon.current_mut();
        level.calculate_fov(origin, radius);
        level.mark_remembered(origin, radius);
    }
}

#[cfg(test)]
mod tests {
    use super::grant_actions;

    #[test]
    fn accumulated_time_pays_for_whole_actions() {
        let mut time = 15;
        assert_eq!(grant_actions(&mut time, 10, 10), 2);
        assert_eq!(time, 5);
    }

    #[test]
    fn exactly_one_action_worth_of_time_waits() {
        let mut time = 0;
        assert_eq!(grant_actions(&mut time, 10, 10), 0);
        assert_eq!(time, 10);
        assert_eq!(grant_actions(&mut time, 1, 10), 1);
        assert_eq!(time, 1);
    }

    #[test]
    fn creatures_without_speed_never_act() {
        let mut time = 0;
        assert_eq!(grant_actions(&mut time, 100, 0), 0);
        assert_eq!(time, 100);
    }
}
