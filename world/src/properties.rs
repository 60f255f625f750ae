//! Per-object property overrides written by the map editor.

use spirit_crypt_core::{DataError, FurnitureDef, Offset};
use tracing::debug;

/// Applies a single editor property to a furniture definition copy.
///
/// Unknown keys are ignored. Values that fail to parse leave the definition
/// untouched and are reported as [`DataError::MalformedProperty`].
pub(crate) fn apply(def: &mut FurnitureDef, key: &str, value: &str) -> Result<(), DataError> {
    match key {
        "activationtarget" => {
            let targets: Vec<Offset> =
                serde_json::from_str(value).map_err(|_| malformed(key, value))?;
            def.activation_targets = targets;
        }
        "activation" => def.activation_kind = optional(value),
        "useractivation" => def.user_activation_kind = optional(value),
        "useractivationtext" => def.user_activation_text = optional(value),
        "requireitem" => def.required_item = optional(value),
        "name" => def.name = value.to_owned(),
        "description" => def.description = value.to_owned(),
        "size" | "bulk" => def.bulk = integer(key, value)?,
        "movable" => def.push_threshold = integer(key, value)?,
        "draworder" => def.draw_order = integer(key, value)?,
        "damage" => def.damage_per_turn = integer(key, value)?,
        "transparent" => {
            def.transparent = value
                .trim()
                .parse::<bool>()
                .map_err(|_| malformed(key, value))?;
        }
        _ => debug!(key, "unrecognised_furniture_property"),
    }
    Ok(())
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn integer(key: &str, value: &str) -> Result<i32, DataError> {
    value.trim().parse().map_err(|_| malformed(key, value))
}

fn malformed(key: &str, value: &str) -> DataError {
    DataError::MalformedProperty {
        key: key.to_owned(),
        value: value.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_targets_parse_from_json_pairs() {
        let mut def = FurnitureDef::default();
        apply(&mut def, "activationtarget", "[[3, 0], [-1, 2]]").expect("valid targets");
        assert_eq!(
            def.activation_targets,
            vec![Offset::new(3, 0), Offset::new(-1, 2)]
        );
    }

    #[test]
    fn malformed_values_leave_the_definition_untouched() {
        let mut def = FurnitureDef {
            bulk: 4,
            ..FurnitureDef::default()
        };
        let error = apply(&mut def, "size", "heavy").expect_err("not a number");
        assert_eq!(
            error,
            DataError::MalformedProperty {
                key: "size".to_owned(),
                value: "heavy".to_owned(),
            }
        );
        assert_eq!(def.bulk, 4);
        assert!(apply(&mut def, "activationtarget", "[1, 2]").is_err());
    }

    #[test]
    fn empty_kinds_clear_optional_fields() {
        let mut def = FurnitureDef {
            activation_kind: Some("dooropen".to_owned()),
            ..FurnitureDef::default()
        };
        apply(&mut def, "activation", "").expect("valid");
        apply(&mut def, "requireitem", "key").expect("valid");
        assert_eq!(def.activation_kind, None);
        assert_eq!(def.required_item.as_deref(), Some("key"));
    }
}
