//! Player interactions that go beyond stepping: prompts, items and stairs.

use std::rc::Rc;

use spirit_crypt_core::{
    Direction, Event, ItemAction, ItemCategory, ItemId, Offset, PlayerCommand, Position,
    Visibility,
};
use spirit_crypt_system_generation::GenerationError;
use spirit_crypt_world::{InventoryError, Item, ItemSlot, Level};
use tracing::{debug, info, warn};

use crate::{DirectionIntent, Game, ItemIntent, Prompt, SPIRIT_BULK};

/// Most floor items offered by a single pick-up prompt.
const MAX_CHOICES: usize = 9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stairs {
    Up,
    Down,
}

impl Game {
    pub(crate) fn resolve_direction(
        &mut self,
        intent: DirectionIntent,
        direction: Direction,
        out: &mut Vec<Event>,
    ) -> bool {
        let delta = direction.delta();
        match intent {
            DirectionIntent::Activate => self.activate_towards(delta),
            DirectionIntent::Push => self.push_towards(delta, out),
            DirectionIntent::Describe => {
                self.describe_position(self.player.position.offset(delta));
                false
            }
        }
    }

    pub(crate) fn resolve_item_choice(&mut self, intent: ItemIntent, command: PlayerCommand) -> bool {
        match (intent, command) {
            (ItemIntent::PickUp(items), PlayerCommand::Choose { number }) => {
                match choice_index(number).and_then(|index| items.get(index)) {
                    Some(item) => {
                        self.pickup_item(*item);
                        true
                    }
                    None => false,
                }
            }
            (ItemIntent::SlotMenu { slot }, PlayerCommand::ItemAction(action)) => {
                self.apply_slot_action(slot, action)
            }
            (ItemIntent::MoveSlot { from }, PlayerCommand::Choose { number }) => {
                self.move_slot(from, number);
                false
            }
            (ItemIntent::OrbUpgrade, command) => self.spend_orb(command),
            (intent, command) => {
                debug!(?intent, ?command, "item_choice_abandoned");
                false
            }
        }
    }

    /// Logs what is known about a cell, as pointer input would.
    ///
    /// Furniture and items are described in any known cell; creatures only
    /// while the cell is in sight.
    pub fn describe_position(&mut self, position: Position) {
        let level = self.dungeon.current();
        let Some(visibility) = level.memory_at(position).map(|memory| memory.visibility()) else {
            return;
        };
        if visibility == Visibility::Unknown {
            return;
        }

        let mut lines: Vec<String> = level
            .furniture_at(position)
            .map(|furniture| furniture.def.description.clone())
            .chain(level.items_at(position).map(|item| item.def().description.clone()))
            .collect();
        if visibility == Visibility::Visible {
            if let Some(creature) = level.creature_at(position) {
                lines.push(creature.def().description.clone());
            }
        }

        for line in lines.into_iter().filter(|line| !line.is_empty()) {
            self.messages.add(line);
        }
    }

    /// Lines describing the pending prompt, for display.
    #[must_use]
    pub fn prompt_lines(&self) -> Vec<String> {
        match &self.prompt {
            Prompt::Idle => Vec::new(),
            Prompt::AwaitingDirection(DirectionIntent::Activate) => {
                vec!["Choose a direction to activate (wait = current tile)".to_owned()]
            }
            Prompt::AwaitingDirection(DirectionIntent::Push) => {
                vec!["Choose a direction to push".to_owned()]
            }
            Prompt::AwaitingDirection(DirectionIntent::Describe) => {
                vec!["Choose a direction to look".to_owned()]
            }
            Prompt::AwaitingItemChoice(ItemIntent::PickUp(items)) => {
                let level = self.level();
                let mut lines = vec!["Select which item to pick up".to_owned()];
                lines.extend(items.iter().enumerate().filter_map(|(index, id)| {
                    level
                        .item(*id)
                        .map(|item| format!("  {}) {}", index + 1, item.def().name))
                }));
                lines
            }
            Prompt::AwaitingItemChoice(ItemIntent::SlotMenu { slot }) => {
                let name = self.held_name(*slot);
                vec![
                    format!("Use - use the {name}"),
                    format!("Drop - drop the {name}"),
                    format!("Move - move the {name} to another slot"),
                ]
            }
            Prompt::AwaitingItemChoice(ItemIntent::MoveSlot { from }) => {
                vec![format!(
                    "Choose a slot number where to move the {}.",
                    self.held_name(*from)
                )]
            }
            Prompt::AwaitingItemChoice(ItemIntent::OrbUpgrade) => vec![
                "The orb gives you power and you can increase one of your stats:".to_owned(),
                "  1 - Increase spirit stability".to_owned(),
                "  2 - Increase spirit power".to_owned(),
                "  3 - Increase willpower".to_owned(),
            ],
        }
    }

    fn held_name(&self, slot: usize) -> String {
        self.body()
            .and_then(|body| body.inventory().get(slot))
            .and_then(ItemSlot::held)
            .map(|item| item.name.clone())
            .unwrap_or_default()
    }

    fn activate_towards(&mut self, delta: Offset) -> bool {
        let Some(origin) = self.body().map(|body| body.position()) else {
            return false;
        };
        let actor = self.player.body;
        if let Some(text) = self
            .dungeon
            .current_mut()
            .activate(origin.offset(delta), true, actor)
        {
            self.messages.add(text);
        }
        true
    }

    /// Pushes furniture, then any creature, out of the neighbouring cell.
    ///
    /// Only the first furniture piece that can move is pushed.
    fn push_towards(&mut self, delta: Offset, out: &mut Vec<Event>) -> bool {
        let Some(body) = self.body() else {
            return false;
        };
        let strength = body.def().bulk;
        let target = body.position().offset(delta);
        let mut advance = false;

        for index in self.level().furniture_indices_at(target) {
            let level = self.dungeon.current();
            let Some(furniture) = level.furnitures().get(index) else {
                continue;
            };
            let name = furniture.def.name.clone();
            let bulk = furniture.def.bulk;
            let destination = furniture.position.offset(delta);

            if strength < furniture.def.push_threshold {
                self.messages
                    .add(format!("The {name} is too heavy for you to push."));
                continue;
            }
            let fits = level.is_in_bounds(destination)
                && level.occupied_bulk_at(destination) + bulk
                    <= level.tile_def_at(destination).max_bulk;
            if !fits {
                self.messages
                    .add(format!("Not enough space to push the {name} there."));
                continue;
            }

            let level = self.dungeon.current_mut();
            level.move_furniture(index, destination);
            level.settle_pressure(&self.config.pressure, target, destination);
            self.messages.add(format!("You push the {name}."));
            advance = true;
            break;
        }

        let level = self.dungeon.current();
        let Some(occupant) = level.creature_at(target) else {
            return advance;
        };
        let id = occupant.id();
        let name = occupant.def().name.clone();
        let bulk = occupant.def().bulk;
        let speed = occupant.def().speed;
        let destination = target.offset(delta);

        if strength < bulk {
            self.messages
                .add(format!("You are too weak to push the {name}."));
            return advance;
        }
        if level.creature_at(destination).is_some() || !level.can_hold(bulk, destination) {
            self.messages
                .add(format!("Not enough space to push the {name} there."));
            return advance;
        }

        self.messages.add(format!("You push the {name}."));
        self.move_creature(id, destination, out);
        if let Some(creature) = self.dungeon.current_mut().creature_mut(id) {
            creature.time = -speed;
        }
        true
    }

    /// Reports furniture and items in the cell the player stepped on.
    pub(crate) fn report_floor(&mut self, position: Position) {
        let level = self.dungeon.current();
        let furniture: Vec<String> = level
            .furniture_at(position)
            .map(|furniture| furniture.def.name.clone())
            .collect();
        let items: Vec<String> = level
            .items_at(position)
            .map(|item| item.def().name.clone())
            .collect();

        if !furniture.is_empty() {
            let article = if furniture.len() == 1 { "a " } else { "" };
            self.messages
                .add(format!("Here is {article}{}.", furniture.join(", ")));
        }
        if !items.is_empty() {
            let article = if items.len() == 1 { "a " } else { "" };
            self.messages
                .add(format!("You see here {article}{}.", items.join(", ")));
        }
    }

    /// Opens the upgrade prompt when the player touches an orb.
    pub(crate) fn offer_orb(&mut self) {
        let orb_here = self
            .level()
            .items_at(self.player.position)
            .any(|item| item.def().kind == self.config.orb_kind);
        if orb_here {
            self.messages
                .add("You touch the orb. Choose 1, 2 or 3 to select which upgrade you want.");
            self.prompt = Prompt::AwaitingItemChoice(ItemIntent::OrbUpgrade);
        }
    }

    fn spend_orb(&mut self, command: PlayerCommand) -> bool {
        let choice = match command {
            PlayerCommand::Choose { number } => number,
            _ => 0,
        };
        match choice {
            1 => {
                self.player.max_stability += 2.0;
                self.player.stability = self.player.max_stability;
                self.messages.add(
                    "Your stability increases and you can remain out of body longer. The orb vanishes.",
                );
            }
            2 => {
                self.player.spirit_power += 1;
                self.messages.add(
                    "You can now transfer more power to possessed creatures. The orb vanishes.",
                );
            }
            3 => {
                self.player.willpower += 1;
                self.messages
                    .add("Your willpower increases and possession is easier. The orb vanishes.");
            }
            _ => {
                self.prompt = Prompt::AwaitingItemChoice(ItemIntent::OrbUpgrade);
                return false;
            }
        }

        let position = self.player.position;
        let level = self.dungeon.current_mut();
        let orb = level
            .items_at(position)
            .find(|item| item.def().kind == self.config.orb_kind)
            .map(Item::id);
        if let Some(orb) = orb {
            let _ = level.remove_item(orb);
        }
        true
    }

    pub(crate) fn pick_up(&mut self) {
        if self.player.is_spirit() {
            self.messages.add("You can not pick up items as a spirit.");
            return;
        }

        let mut items: Vec<ItemId> = self
            .level()
            .items_at(self.player.position)
            .map(Item::id)
            .collect();
        match items.len() {
            0 => self.messages.add("Nothing to pick up here."),
            1 => self.pickup_item(items[0]),
            _ => {
                items.truncate(MAX_CHOICES);
                self.prompt = Prompt::AwaitingItemChoice(ItemIntent::PickUp(items));
            }
        }
    }

    fn pickup_item(&mut self, id: ItemId) {
        let Some(body) = self.player.body else {
            return;
        };
        let level = self.dungeon.current_mut();
        let Some(item) = level.item(id).map(|item| Rc::clone(item.def())) else {
            return;
        };
        let Some(creature) = level.creature_mut(body) else {
            return;
        };

        match creature.pickup(Rc::clone(&item)) {
            Ok(_) => {
                let _ = level.remove_item(id);
                self.messages.add(format!("You pick up the {}.", item.name));
            }
            Err(_) => self.messages.add(format!(
                "You do not have enough inventory slots to pick up the {}.",
                item.name
            )),
        }
    }

    pub(crate) fn open_slot_menu(&mut self, number: u8) {
        let Some(body) = self.body() else {
            return;
        };
        let Some(slot) = choice_index(number) else {
            return;
        };
        match body.inventory().get(slot) {
            Some(held) if held.held().is_some() => {
                self.prompt = Prompt::AwaitingItemChoice(ItemIntent::SlotMenu { slot });
            }
            Some(_) => self.messages.add("You do not have an item on that slot."),
            None => {}
        }
    }

    fn apply_slot_action(&mut self, slot: usize, action: ItemAction) -> bool {
        let Some(body) = self.player.body else {
            return false;
        };
        let level = self.dungeon.current_mut();
        let Some(creature) = level.creature_mut(body) else {
            return false;
        };
        let Some(item) = creature.inventory().get(slot).and_then(ItemSlot::held).cloned() else {
            return false;
        };

        match action {
            ItemAction::Use => match item.category {
                ItemCategory::Key => {
                    self.messages
                        .add("You use keys automatically by activating doors.");
                    false
                }
                ItemCategory::Potion => {
                    let _ = creature.take_slot(slot);
                    creature.current_hp = creature.def().max_hp;
                    self.messages.add(format!(
                        "You drink the {}. Your wounds heal instantly.",
                        item.name
                    ));
                    true
                }
                _ => {
                    self.messages.add("You can not use that.");
                    false
                }
            },
            ItemAction::Drop => {
                let _ = creature.take_slot(slot);
                let position = creature.position();
                let _ = level.add_item(Rc::clone(&item), position);
                self.messages.add(format!("You drop the {}.", item.name));
                true
            }
            ItemAction::Move => {
                self.prompt = Prompt::AwaitingItemChoice(ItemIntent::MoveSlot { from: slot });
                false
            }
        }
    }

    fn move_slot(&mut self, from: usize, number: u8) {
        let Some(body) = self.player.body else {
            return;
        };
        let Some(creature) = self.dungeon.current_mut().creature_mut(body) else {
            return;
        };
        let result = match choice_index(number) {
            Some(to) => creature.swap_slots(from, to),
            None => Err(InventoryError::NoSuchSlot { index: 0 }),
        };
        match result {
            Ok(()) => {}
            Err(InventoryError::Rejected { name, .. }) => self
                .messages
                .add(format!("The {name} does not fit in that slot.")),
            Err(_) => self.messages.add("Invalid item slot."),
        }
    }

    pub(crate) fn use_stairs(&mut self, out: &mut Vec<Event>) -> Result<(), GenerationError> {
        let up_kind = &self.generator.config().stairs_up_kind;
        let down_kind = &self.generator.config().stairs_down_kind;
        let stairs = self
            .level()
            .furniture_at(self.player.position)
            .find_map(|furniture| {
                if &furniture.def.kind == up_kind {
                    Some(Stairs::Up)
                } else if &furniture.def.kind == down_kind {
                    Some(Stairs::Down)
                } else {
                    None
                }
            });

        match stairs {
            None => self.messages.add("There are no stairs here."),
            Some(Stairs::Up) if self.dungeon.depth() <= 1 => self
                .messages
                .add("Those stairs lead out of the crypt. You do not want to go there."),
            Some(direction) => self.travel(direction, out)?,
        }
        Ok(())
    }

    /// Changes depth, generating the level below on first descent.
    ///
    /// The possessed body travels along and arrives on the matching stairs.
    fn travel(&mut self, direction: Stairs, out: &mut Vec<Event>) -> Result<(), GenerationError> {
        if direction == Stairs::Down && !self.dungeon.deeper_generated() {
            let depth = self.dungeon.depth() + 1;
            let generated = self.generator.generate_level(depth, &mut self.rng)?;
            self.dungeon.push_deeper(generated.level);
        }

        let carried = self
            .player
            .body
            .and_then(|body| self.dungeon.current_mut().remove_creature(body));
        self.dungeon.current_mut().forget_sight();

        let moved = match direction {
            Stairs::Down => self.dungeon.descend(),
            Stairs::Up => self.dungeon.ascend(),
        };
        if !moved {
            warn!(?direction, depth = self.dungeon.depth(), "stairs_lead_nowhere");
        }

        let arrival_kind = match direction {
            Stairs::Down => self.generator.config().stairs_up_kind.clone(),
            Stairs::Up => self.generator.config().stairs_down_kind.clone(),
        };
        let level = self.dungeon.current_mut();
        let stairs = level
            .furnitures()
            .iter()
            .find(|furniture| furniture.def.kind == arrival_kind)
            .map_or(self.player.position, |furniture| furniture.position);
        let bulk = carried
            .as_ref()
            .map_or(SPIRIT_BULK, |creature| creature.def().bulk);
        let arrival = landing_cell(level, stairs, bulk);

        self.player.position = arrival;
        self.player.body = carried.map(|creature| level.adopt_creature(creature, arrival));

        let depth = self.dungeon.depth();
        out.push(Event::LevelEntered { depth });
        info!(depth, "level_entered");
        Ok(())
    }
}

/// The stairs cell, or the first free neighbour when a creature waits on it.
fn landing_cell(level: &Level, stairs: Position, bulk: i32) -> Position {
    if level.creature_at(stairs).is_none() {
        return stairs;
    }
    (-1..=1)
        .flat_map(|dy| (-1..=1).map(move |dx| stairs.translate(dx, dy)))
        .find(|&cell| level.creature_at(cell).is_none() && level.can_hold(bulk, cell))
        .unwrap_or(stairs)
}

fn choice_index(number: u8) -> Option<usize> {
    usize::from(number).checked_sub(1)
}
