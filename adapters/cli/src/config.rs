//! Optional TOML file overriding the built-in tunables.

use std::{fs, path::Path};

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use spirit_crypt_system_generation::Config as GenerationConfig;
use spirit_crypt_system_turns::Config as TurnsConfig;

/// Overrides read from a config file; absent keys keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ConfigFile {
    generation: GenerationOverrides,
    turns: TurnsOverrides,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct GenerationOverrides {
    rooms_x: Option<i32>,
    rooms_y: Option<i32>,
    final_depth: Option<u32>,
    placement_attempts: Option<u32>,
    pregenerated_rooms: Option<usize>,
    other_room_chance: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TurnsOverrides {
    seed: Option<u64>,
    fov_radius: Option<i32>,
    spirit_delta: Option<i32>,
    spirit_move_cost: Option<f32>,
    failed_possession_cost: Option<f32>,
    pressure_threshold: Option<i32>,
    door_opener_bulk: Option<i32>,
    final_boss_kind: Option<String>,
    log_capacity: Option<usize>,
    log_wrap_width: Option<usize>,
    guaranteed_first_possession: Option<bool>,
    spirit_willpower: Option<i32>,
    spirit_stability: Option<f32>,
    spirit_power: Option<i32>,
}

impl ConfigFile {
    /// Reads and parses a config file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to load config file at {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let file: Self = toml::from_str(contents).context("failed to parse config toml contents")?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> Result<()> {
        let fractions = [
            ("generation.other_room_chance", self.generation.other_room_chance),
            ("turns.spirit_move_cost", self.turns.spirit_move_cost.map(f64::from)),
            (
                "turns.failed_possession_cost",
                self.turns.failed_possession_cost.map(f64::from),
            ),
            ("turns.spirit_stability", self.turns.spirit_stability.map(f64::from)),
        ];
        for (key, value) in fractions {
            if let Some(value) = value {
                ensure!(value.is_finite(), "`{key}` must be a finite number, got {value}");
            }
        }
        Ok(())
    }

    /// Writes every present override into the provided configs.
    pub(crate) fn apply(self, generation: &mut GenerationConfig, turns: &mut TurnsConfig) {
        let GenerationOverrides {
            rooms_x,
            rooms_y,
            final_depth,
            placement_attempts,
            pregenerated_rooms,
            other_room_chance,
        } = self.generation;
        set(&mut generation.rooms_x, rooms_x);
        set(&mut generation.rooms_y, rooms_y);
        set(&mut generation.final_depth, final_depth);
        set(&mut generation.placement_attempts, placement_attempts);
        set(&mut generation.pregenerated_rooms, pregenerated_rooms);
        set(&mut generation.other_room_chance, other_room_chance);

        let overrides = self.turns;
        set(&mut turns.seed, overrides.seed);
        set(&mut turns.fov_radius, overrides.fov_radius);
        set(&mut turns.spirit_delta, overrides.spirit_delta);
        set(&mut turns.spirit_move_cost, overrides.spirit_move_cost);
        set(
            &mut turns.failed_possession_cost,
            overrides.failed_possession_cost,
        );
        set(&mut turns.pressure.threshold, overrides.pressure_threshold);
        set(&mut turns.door_opener_bulk, overrides.door_opener_bulk);
        set(&mut turns.final_boss_kind, overrides.final_boss_kind);
        set(&mut turns.log_capacity, overrides.log_capacity);
        set(&mut turns.log_wrap_width, overrides.log_wrap_width);
        set(
            &mut turns.guaranteed_first_possession,
            overrides.guaranteed_first_possession,
        );
        set(&mut turns.spirit.willpower, overrides.spirit_willpower);
        set(&mut turns.spirit.stability, overrides.spirit_stability);
        set(&mut turns.spirit.power, overrides.spirit_power);
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_keys_override_defaults() {
        let file = ConfigFile::parse(
            r#"
            [generation]
            rooms_x = 3
            final_depth = 4

            [turns]
            seed = 42
            pressure_threshold = 5
            spirit_stability = 12.0
            "#,
        )
        .expect("valid config");

        let mut generation = GenerationConfig::default();
        let mut turns = TurnsConfig::default();
        file.apply(&mut generation, &mut turns);

        assert_eq!(generation.rooms_x, 3);
        assert_eq!(generation.rooms_y, 5);
        assert_eq!(generation.final_depth, 4);
        assert_eq!(turns.seed, 42);
        assert_eq!(turns.pressure.threshold, 5);
        assert!((turns.spirit.stability - 12.0).abs() < f32::EPSILON);
        assert_eq!(turns.fov_radius, 7);
    }

    #[test]
    fn empty_files_keep_every_default() {
        let file = ConfigFile::parse("").expect("valid config");
        let mut generation = GenerationConfig::default();
        let mut turns = TurnsConfig::default();
        file.apply(&mut generation, &mut turns);

        assert_eq!(generation.rooms_x, 5);
        assert_eq!(turns.final_boss_kind, "vitalius");
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let error = ConfigFile::parse("[generation]\nother_room_chance = nan\n")
            .expect_err("nan chance");
        assert_eq!(
            error.to_string(),
            "`generation.other_room_chance` must be a finite number, got NaN"
        );

        let error =
            ConfigFile::parse("[turns]\nspirit_stability = inf\n").expect_err("infinite stability");
        assert!(error.to_string().contains("turns.spirit_stability"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = ConfigFile::parse("[turns]\nspeed = 3\n").expect_err("unknown key");
        assert!(error.to_string().contains("failed to parse config toml contents"));
    }
}
