//! Plain-text projection of what the player knows.

use spirit_crypt_core::Position;
use spirit_crypt_system_turns::{Game, Outcome};
use spirit_crypt_world::query;

use crate::demo;

/// Draws the current level, one text line per row.
pub(crate) fn render(game: &Game) -> String {
    let level = game.level();
    let width = usize::try_from(level.width()).unwrap_or(0);
    let height = usize::try_from(level.height()).unwrap_or(0);
    let mut map = String::with_capacity((width + 1) * height);
    for y in 0..level.height() {
        map.extend((0..level.width()).map(|x| glyph(game, Position::new(x, y))));
        map.push('\n');
    }
    map
}

fn glyph(game: &Game, position: Position) -> char {
    if position == game.player().position() {
        return '@';
    }
    let view = query::cell_view(game.level(), position);
    if let Some(kind) = &view.creature_kind {
        return kind.chars().next().unwrap_or('?');
    }
    if view.has_items {
        return '!';
    }
    if let Some(icon) = view.furniture_icon {
        return demo::furniture_glyph(icon);
    }
    view.tile.map_or(' ', demo::tile_glyph)
}

/// One-line summary of the spirit and its body.
pub(crate) fn status(game: &Game) -> String {
    let player = game.player();
    let body = game.body().map_or_else(
        || "none".to_owned(),
        |body| format!("{} {}/{}", body.def().name, body.current_hp, body.def().max_hp),
    );
    format!(
        "depth {} | stability {:.1}/{:.1} | willpower {} | power {} | body {}",
        game.level().depth(),
        player.stability,
        player.max_stability,
        player.willpower,
        player.spirit_power,
        body,
    )
}

/// Closing line for a finished run.
pub(crate) fn outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Victory { cause } => format!("Vitalius has fallen to the {cause}. You win."),
        Outcome::SpiritDissipated => "Your spirit has dissipated. The run is over.".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use spirit_crypt_system_generation::{Config as GenerationConfig, DungeonGenerator};
    use spirit_crypt_system_turns::Config as TurnsConfig;

    use super::*;

    fn game() -> Game {
        let generator = DungeonGenerator::new(
            GenerationConfig::default(),
            demo::library(),
            Rc::new(demo::catalog()),
        )
        .expect("valid configuration");
        Game::new(TurnsConfig::default(), generator).expect("first level generates")
    }

    #[test]
    fn map_has_one_line_per_row_and_shows_the_player() {
        let game = game();
        let map = render(&game);
        let rows: Vec<&str> = map.lines().collect();

        assert_eq!(rows.len(), 62);
        assert!(rows.iter().all(|row| row.chars().count() == 62));
        assert_eq!(map.matches('@').count(), 1);
        let spawn = game.player().position();
        let row = rows[usize::try_from(spawn.y()).expect("on the map")];
        assert_eq!(
            row.chars().nth(usize::try_from(spawn.x()).expect("on the map")),
            Some('@')
        );
    }

    #[test]
    fn the_start_room_ghoul_is_in_sight() {
        let game = game();
        let map = render(&game);
        assert!(map.contains('g'));
        assert!(status(&game).starts_with("depth 1 | stability 8.0/8.0"));
        assert!(status(&game).ends_with("body none"));
    }
}
