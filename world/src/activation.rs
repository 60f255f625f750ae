//! Mechanical causality between furniture pieces.
//!
//! Activating a cell visits every furniture piece on it, optionally swaps the
//! piece's definition for another kind and re-triggers the cells the piece
//! points at. Propagation runs on an explicit worklist so malformed cyclic
//! trigger data is cut off by [`MAX_TRIGGER_DEPTH`] and [`MAX_TRIGGER_STEPS`]
//! instead of overflowing the stack.

use std::rc::Rc;

use spirit_crypt_core::{CreatureId, Position};
use tracing::{debug, warn};

use crate::Level;

/// Longest chain of cells a single activation may propagate through.
pub const MAX_TRIGGER_DEPTH: usize = 32;

/// Most cells a single activation may visit in total.
pub const MAX_TRIGGER_STEPS: usize = 1024;

/// Kinds and threshold that make up a pressure plate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PressureRule {
    /// Kind of a plate waiting to be pressed.
    pub raised_kind: String,
    /// Kind of a plate held down.
    pub pressed_kind: String,
    /// Bulk at which a plate is held down.
    pub threshold: i32,
}

impl Default for PressureRule {
    fn default() -> Self {
        Self {
            raised_kind: "pressureplate".to_owned(),
            pressed_kind: "pressureplatedown".to_owned(),
            threshold: 8,
        }
    }
}

impl PressureRule {
    /// Reports whether the provided bulk holds a plate down.
    #[must_use]
    pub const fn is_pressed(&self, bulk: i32) -> bool {
        bulk >= self.threshold
    }
}

#[derive(Debug, Default)]
struct Report {
    lines: Vec<String>,
    has_activation_text: bool,
}

impl Report {
    fn gate(&mut self, line: String) {
        self.lines.push(line);
    }

    fn activation_text(&mut self, text: &str) {
        if !self.has_activation_text {
            self.has_activation_text = true;
            self.lines.push(text.to_owned());
        }
    }

    fn finish(self) -> Option<String> {
        (!self.lines.is_empty()).then(|| self.lines.join(" "))
    }
}

impl Level {
    /// Activates every furniture piece at the cell and propagates to its targets.
    ///
    /// `actor` is the creature operating the furniture for user-initiated
    /// activations; it pays for furniture that requires an item. Returns the
    /// text the operator should read, if any.
    pub fn activate(
        &mut self,
        position: Position,
        user_initiated: bool,
        actor: Option<CreatureId>,
    ) -> Option<String> {
        let mut report = Report::default();
        let mut worklist = vec![(position, user_initiated, 0_usize)];
        let mut steps = 0_usize;

        while let Some((cell, user, depth)) = worklist.pop() {
            steps += 1;
            if steps > MAX_TRIGGER_STEPS {
                warn!(origin = %position, "activation_step_budget_exhausted");
                break;
            }

            let targets = self.activate_cell(cell, user, actor, &mut report);
            if targets.is_empty() {
                continue;
            }
            if depth >= MAX_TRIGGER_DEPTH {
                warn!(origin = %position, cell = %cell, "activation_chain_too_deep");
                continue;
            }
            worklist.extend(targets.into_iter().rev().map(|target| (target, false, depth + 1)));
        }

        report.finish()
    }

    fn activate_cell(
        &mut self,
        cell: Position,
        user_initiated: bool,
        actor: Option<CreatureId>,
        report: &mut Report,
    ) -> Vec<Position> {
        let indices = self.furniture_indices_at(cell);
        if indices.is_empty() {
            return Vec::new();
        }

        let catalog = Rc::clone(&self.catalog);
        let mut targets = Vec::new();

        for index in indices {
            let furniture = &self.furnitures[index];

            if user_initiated {
                if let Some(required) = furniture.def.required_item.clone() {
                    let name = catalog.item_name(&required).to_owned();
                    let consumed = actor
                        .and_then(|id| self.creature_mut(id))
                        .is_some_and(|creature| creature.remove_item(&required));
                    if !consumed {
                        report.gate(format!("You need a {name}."));
                        continue;
                    }
                    report.gate(format!("You insert the {name}."));
                }
            }

            let furniture = &self.furnitures[index];
            if user_initiated {
                if let Some(text) = &furniture.def.user_activation_text {
                    report.activation_text(text);
                }
            }

            if !user_initiated || furniture.def.user_activation_kind.is_some() {
                let origin = furniture.room_origin;
                targets.extend(
                    furniture
                        .def
                        .activation_targets
                        .iter()
                        .map(|offset| origin.offset(*offset)),
                );
            }

            let next_kind = if user_initiated {
                furniture.def.user_activation_kind.clone()
            } else {
                furniture.def.activation_kind.clone()
            };
            if let Some(kind) = next_kind {
                match catalog.furniture(&kind) {
                    Ok(def) => {
                        debug!(cell = %cell, from = %furniture.def.kind, to = %kind, "furniture_transformed");
                        self.furnitures[index].def.assume(&def);
                    }
                    Err(error) => warn!(cell = %cell, %error, "furniture_transform_skipped"),
                }
            }
        }

        self.resort_furniture();
        targets
    }

    /// Swaps a plate at the cell to `transformed_kind` when `predicate` holds
    /// for the cell's occupied bulk, then triggers the plate's targets.
    ///
    /// Returns whether the plate changed state.
    pub fn check_pressure_activation<F>(
        &mut self,
        position: Position,
        plate_kind: &str,
        transformed_kind: &str,
        predicate: F,
    ) -> bool
    where
        F: Fn(i32) -> bool,
    {
        let Some(index) = self
            .furnitures
            .iter()
            .position(|furniture| furniture.position == position && furniture.def.kind == plate_kind)
        else {
            return false;
        };

        let bulk = self.occupied_bulk_at(position);
        let plate = &self.furnitures[index];
        if !predicate(bulk) || plate.def.activation_targets.is_empty() {
            return false;
        }

        let def = match self.catalog.furniture(transformed_kind) {
            Ok(def) => def,
            Err(error) => {
                warn!(cell = %position, %error, "pressure_plate_transform_skipped");
                return false;
            }
        };

        let origin = plate.room_origin;
        let targets: Vec<Position> = plate
            .def
            .activation_targets
            .iter()
            .map(|offset| origin.offset(*offset))
            .collect();

        debug!(cell = %position, bulk, to = transformed_kind, "pressure_plate_changed");
        self.furnitures[index].def.assume(&def);
        self.resort_furniture();

        for target in targets {
            let _ = self.activate(target, false, None);
        }
        true
    }

    /// Re-evaluates plates after something left `from` and arrived at `to`.
    pub fn settle_pressure(&mut self, rule: &PressureRule, from: Position, to: Position) {
        let _ = self.check_pressure_activation(from, &rule.pressed_kind, &rule.raised_kind, |bulk| {
            !rule.is_pressed(bulk)
        });
        let _ = self.check_pressure_activation(to, &rule.raised_kind, &rule.pressed_kind, |bulk| {
            rule.is_pressed(bulk)
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use spirit_crypt_core::{CreatureDef, FurnitureDef, ItemCategory, ItemDef, Offset, TileDef, TileId};

    use super::*;
    use crate::{Catalog, PlacedFurniture};

    fn catalog() -> Rc<Catalog> {
        let mut catalog = Catalog::new();
        catalog.insert_tile(TileDef {
            id: TileId::new(0),
            kind: "floor".to_owned(),
            max_bulk: 20,
            transparent: true,
            ..TileDef::default()
        });
        for (kind, activation) in [
            ("doorclosed", Some("dooropen")),
            ("dooropen", Some("doorclosed")),
            ("pressureplate", None),
            ("pressureplatedown", None),
        ] {
            catalog.insert_furniture(FurnitureDef {
                kind: kind.to_owned(),
                name: kind.to_owned(),
                bulk: if kind == "doorclosed" { 20 } else { 0 },
                activation_kind: activation.map(str::to_owned),
                ..FurnitureDef::default()
            });
        }
        catalog.insert_furniture(FurnitureDef {
            kind: "lockeddoor".to_owned(),
            bulk: 20,
            required_item: Some("key".to_owned()),
            user_activation_kind: Some("dooropen".to_owned()),
            user_activation_text: Some("The lock clicks.".to_owned()),
            ..FurnitureDef::default()
        });
        catalog.insert_item(ItemDef {
            kind: "key".to_owned(),
            name: "key".to_owned(),
            category: ItemCategory::Key,
            ..ItemDef::default()
        });
        catalog.insert_creature(CreatureDef {
            kind: "ogre".to_owned(),
            bulk: 9,
            has_offensive_slot: false,
            inventory_slot_count: 1,
            ..CreatureDef::default()
        });
        Rc::new(catalog)
    }

    fn place(level: &mut Level, kind: &str, at: Position, targets: Vec<Offset>) {
        let template = level.catalog().furniture(kind).expect("kind");
        let mut furniture =
            PlacedFurniture::from_definition(&template, at, Position::new(0, 0), &BTreeMap::new());
        furniture.def.activation_targets = targets;
        let _ = level.insert_furniture(furniture);
    }

    fn kinds_at(level: &Level, at: Position) -> Vec<String> {
        level.furniture_at(at).map(|f| f.def.kind.clone()).collect()
    }

    #[test]
    fn activating_an_empty_cell_changes_nothing() {
        let mut level = Level::new(5, 5, 1, TileId::new(0), catalog());
        place(&mut level, "doorclosed", Position::new(1, 1), Vec::new());

        assert_eq!(level.activate(Position::new(3, 3), true, None), None);
        assert_eq!(level.activate(Position::new(3, 3), false, None), None);
        assert_eq!(kinds_at(&level, Position::new(1, 1)), vec!["doorclosed"]);
    }

    #[test]
    fn mechanical_activation_swaps_the_instance_copy_only() {
        let mut level = Level::new(5, 5, 1, TileId::new(0), catalog());
        let door = Position::new(2, 2);
        place(&mut level, "doorclosed", door, Vec::new());

        let _ = level.activate(door, false, None);

        assert_eq!(kinds_at(&level, door), vec!["dooropen"]);
        let template = level.catalog().furniture("doorclosed").expect("template");
        assert_eq!(template.kind, "doorclosed");
        assert_eq!(template.bulk, 20);
    }

    #[test]
    fn required_items_gate_user_activation() {
        let mut level = Level::new(5, 5, 1, TileId::new(0), catalog());
        let door = Position::new(2, 1);
        place(&mut level, "lockeddoor", door, Vec::new());
        let ogre = level.catalog().creature("ogre").expect("ogre");
        let actor = level.spawn_creature(ogre, Position::new(2, 2), None);

        let message = level.activate(door, true, Some(actor));
        assert_eq!(message.as_deref(), Some("You need a key."));
        assert_eq!(kinds_at(&level, door), vec!["lockeddoor"]);

        let key = level.catalog().item("key").expect("key");
        let _ = level.creature_mut(actor).expect("actor").pickup(key);
        let message = level.activate(door, true, Some(actor));
        assert_eq!(
            message.as_deref(),
            Some("You insert the key. The lock clicks.")
        );
        assert_eq!(kinds_at(&level, door), vec!["dooropen"]);
        assert!(!level.creature(actor).expect("actor").has_item("key"));
    }

    #[test]
    fn pressing_a_plate_triggers_its_targets() {
        let mut level = Level::new(6, 6, 1, TileId::new(0), catalog());
        let plate = Position::new(1, 1);
        let door = Position::new(4, 1);
        place(&mut level, "pressureplate", plate, vec![Offset::new(4, 1)]);
        place(&mut level, "doorclosed", door, Vec::new());
        let ogre = level.catalog().creature("ogre").expect("ogre");
        let _ = level.spawn_creature(ogre, plate, None);

        let rule = PressureRule::default();
        level.settle_pressure(&rule, Position::new(0, 1), plate);

        assert_eq!(kinds_at(&level, plate), vec!["pressureplatedown"]);
        assert_eq!(kinds_at(&level, door), vec!["dooropen"]);
        let kept = level.furniture_at(plate).next().expect("plate");
        assert_eq!(kept.def.activation_targets, vec![Offset::new(4, 1)]);
    }

    #[test]
    fn releasing_a_plate_restores_it_and_retriggers_targets() {
        let mut level = Level::new(6, 6, 1, TileId::new(0), catalog());
        let plate = Position::new(1, 1);
        let door = Position::new(4, 1);
        place(&mut level, "pressureplate", plate, vec![Offset::new(4, 1)]);
        place(&mut level, "doorclosed", door, Vec::new());
        let ogre = level.catalog().creature("ogre").expect("ogre");
        let id = level.spawn_creature(ogre, plate, None);
        let rule = PressureRule::default();
        level.settle_pressure(&rule, Position::new(0, 1), plate);

        level.relocate_creature(id, Position::new(2, 1));
        level.settle_pressure(&rule, plate, Position::new(2, 1));

        assert_eq!(kinds_at(&level, plate), vec!["pressureplate"]);
        assert_eq!(kinds_at(&level, door), vec!["doorclosed"]);
    }

    #[test]
    fn light_loads_leave_the_plate_raised() {
        let mut level = Level::new(6, 6, 1, TileId::new(0), catalog());
        let plate = Position::new(1, 1);
        place(&mut level, "pressureplate", plate, vec![Offset::new(4, 1)]);

        let rule = PressureRule::default();
        assert!(!level.check_pressure_activation(plate, "pressureplate", "pressureplatedown", |bulk| {
            rule.is_pressed(bulk)
        }));
        assert_eq!(kinds_at(&level, plate), vec!["pressureplate"]);
    }

    #[test]
    fn cyclic_triggers_terminate() {
        let mut catalog = Catalog::new();
        catalog.insert_tile(TileDef {
            id: TileId::new(0),
            max_bulk: 20,
            ..TileDef::default()
        });
        catalog.insert_furniture(FurnitureDef {
            kind: "relay".to_owned(),
            activation_kind: Some("relay".to_owned()),
            ..FurnitureDef::default()
        });
        let mut level = Level::new(4, 4, 1, TileId::new(0), Rc::new(catalog));
        place(&mut level, "relay", Position::new(1, 1), vec![Offset::new(2, 2)]);
        place(&mut level, "relay", Position::new(2, 2), vec![Offset::new(1, 1)]);

        assert_eq!(level.activate(Position::new(1, 1), false, None), None);
        assert_eq!(kinds_at(&level, Position::new(2, 2)), vec!["relay"]);
    }
}
