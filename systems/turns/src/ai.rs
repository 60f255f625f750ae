//! Autonomous creature behaviour.

use rand::Rng;
use spirit_crypt_core::{CreatureId, Event, Offset};
use spirit_crypt_world::Creature;
use tracing::debug;

use crate::{navigation, Game};

/// Random step over the 8-neighbourhood, possibly staying in place.
fn random_step<R: Rng + ?Sized>(rng: &mut R) -> Offset {
    Offset::new(rng.gen_range(-1..=1), rng.gen_range(-1..=1))
}

impl Game {
    /// Runs a single action for an autonomous creature.
    ///
    /// A creature that sees the player's body walks the shortest path toward
    /// it; otherwise it wanders. Bulky creatures operate furniture that blocks
    /// them, which lets them open doors.
    pub(crate) fn ai_turn(&mut self, id: CreatureId, out: &mut Vec<Event>) {
        let level = self.dungeon.current();
        let Some(creature) = level.creature(id).filter(|creature| creature.is_alive()) else {
            return;
        };
        let position = creature.position();
        let bulk = creature.def().bulk;
        let flying = creature.def().flying;
        let door_opener = bulk >= self.config.door_opener_bulk;

        let quarry = self
            .player
            .body
            .and_then(|body| level.creature(body))
            .map(Creature::position);
        let sees_quarry = quarry.is_some_and(|quarry| level.line_of_sight(quarry, position));

        let path = match quarry {
            Some(quarry) if sees_quarry => navigation::shortest_path(
                level.width(),
                level.height(),
                position,
                quarry,
                |cell| {
                    level.can_hold(bulk, cell)
                        || (door_opener
                            && level
                                .furniture_at(cell)
                                .any(|furniture| furniture.def.user_activation_kind.is_some()))
                },
            ),
            _ => Vec::new(),
        };

        let mut step = match path.get(1) {
            Some(hop) => Offset::new(hop.x() - position.x(), hop.y() - position.y()),
            None => random_step(&mut self.rng),
        };

        // Break up queues behind a creature that is already engaged.
        if path.len() > 2 && sees_quarry && level.creature_at(position.offset(step)).is_some() {
            step = random_step(&mut self.rng);
        }

        let destination = position.offset(step);
        if level.can_hold(bulk, destination) {
            let onto_body = self.player.body.is_some() && destination == self.player.position;
            if level.tile_damage_at(destination) == 0 || flying || onto_body {
                self.move_creature(id, destination, out);
            }
        } else if door_opener {
            if let Some(text) = self
                .dungeon
                .current_mut()
                .activate(destination, true, Some(id))
            {
                debug!(creature = id.get(), %text, "creature_operated_furniture");
            }
        }
    }
}
