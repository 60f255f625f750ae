//! Melee and possession arithmetic.

use rand::Rng;

/// Probability that a spirit of `attacker_willpower` takes over the defender.
///
/// Wounded or weak-willed defenders are easier to possess. The result is
/// clamped to `[0, 1]`; a zero willpower sum contributes nothing.
#[must_use]
pub fn possession_chance(
    attacker_willpower: i32,
    defender_willpower: i32,
    defender_hp: i32,
    defender_max_hp: i32,
) -> f32 {
    let wounds = if defender_max_hp > 0 {
        1.0 - defender_hp as f32 / defender_max_hp as f32
    } else {
        0.0
    };
    let total = attacker_willpower + defender_willpower;
    let dominance = if total != 0 {
        (attacker_willpower - defender_willpower) as f32 / total as f32
    } else {
        0.0
    };
    (wounds + dominance).clamp(0.0, 1.0)
}

/// Rolls melee damage between half and all of `attack - defence`, never negative.
pub fn roll_damage<R: Rng + ?Sized>(rng: &mut R, attack: i32, defence: i32) -> i32 {
    let max = attack - defence;
    if max <= 0 {
        return 0;
    }
    let min = (max + 1) / 2;
    rng.gen_range(min..=max)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn strong_will_against_a_healthy_body() {
        let chance = possession_chance(8, 2, 10, 10);
        assert!((chance - 0.6).abs() < 1e-6);
    }

    #[test]
    fn will_less_bodies_are_certain() {
        assert!((possession_chance(8, 0, 10, 10) - 1.0).abs() < f32::EPSILON);
        assert!((possession_chance(1, 0, 3, 3) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn chance_is_clamped() {
        assert_eq!(possession_chance(10, 0, 1, 10), 1.0);
        assert_eq!(possession_chance(0, 10, 10, 10), 0.0);
        assert_eq!(possession_chance(0, 0, 10, 0), 0.0);
    }

    #[test]
    fn damage_stays_within_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..200 {
            let damage = roll_damage(&mut rng, 9, 2);
            assert!((4..=7).contains(&damage), "damage {damage} out of range");
        }
    }

    #[test]
    fn damage_is_never_negative() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(roll_damage(&mut rng, 2, 5), 0);
        assert_eq!(roll_damage(&mut rng, 0, 0), 0);
        assert_eq!(roll_damage(&mut rng, 1, 0), 1);
    }
}
