//! Synchronous game runner: every seat is played by a bot strategy.
//! Used by the CLI, the arena and the diagnostics.

use crate::engine::bot_strategy::BotStrategy;
use crate::engine::models::{Event, GameConfig, GameResult};
use crate::error::GameError;
use crate::games::carcassonne::game::Game;

/// Play a whole game. Seat `i` is played by `strategies[i % len]`.
pub fn play_game(config: &GameConfig, strategies: &mut [Box<dyn BotStrategy>]) -> Result<GameResult, GameError> {
    play_game_with_events(config, strategies, |_| {})
}

/// Like [`play_game`], reporting every event as it happens.
pub fn play_game_with_events(
    config: &GameConfig,
    strategies: &mut [Box<dyn BotStrategy>],
    mut on_event: impl FnMut(&Event),
) -> Result<GameResult, GameError> {
    assert!(!strategies.is_empty(), "at least one strategy is required");
    let mut game = Game::new(config);

    while let Some(turn) = game.start_turn() {
        let choice = if turn.skipped {
            None
        } else {
            let player = game.players()[turn.seat];
            let remaining = game.remaining_draws();
            let strategy = &mut strategies[turn.seat % strategies.len()];
            strategy.choose_placement(game.board_mut(), &player, &turn.tile, remaining)
        };
        for event in game.commit_turn(choice)? {
            on_event(&event);
        }
    }

    // Decks too short to reach a last commit still get final scoring.
    for event in game.finish() {
        on_event(&event);
    }
    Ok(game.result().expect("finished game has a result"))
}
