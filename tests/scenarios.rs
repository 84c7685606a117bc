//! End-to-end rule scenarios through the public API.

use std::collections::HashSet;

use meeple_tiles::engine::bot_strategy::{BotStrategy, RandomStrategy};
use meeple_tiles::engine::models::{GameConfig, Player, TurnChoice};
use meeple_tiles::games::carcassonne::board::Board;
use meeple_tiles::games::carcassonne::features::is_closed;
use meeple_tiles::games::carcassonne::game::{award_majority, Game};
use meeple_tiles::games::carcassonne::scoring::{collect_all_points, collect_points, ScoredFeature, ScoringMode};
use meeple_tiles::games::carcassonne::tiles::{tile, CATALOG};
use meeple_tiles::games::carcassonne::types::*;

fn c() -> Position {
    Position::center()
}

fn final_scores(board: &mut Board) -> Vec<ScoredFeature> {
    let mut out = Vec::new();
    collect_all_points(board, ScoringMode::Final, |f| out.push(f));
    out
}

fn incremental_scores(board: &mut Board, pos: Position) -> Vec<ScoredFeature> {
    let mut out = Vec::new();
    collect_points(board, pos, ScoringMode::Incremental, |f| out.push(f));
    out
}

/// Advance a random-bot game until `stop` says so or the game ends.
fn play_until(game: &mut Game, bot: &mut RandomStrategy, mut stop: impl FnMut(&Game) -> bool) {
    while !stop(game) {
        let Some(turn) = game.start_turn() else {
            return;
        };
        let choice = if turn.skipped {
            None
        } else {
            let player = game.players()[turn.seat];
            let remaining = game.remaining_draws();
            bot.choose_placement(game.board_mut(), &player, &turn.tile, remaining)
        };
        game.commit_turn(choice).unwrap();
    }
}

#[test]
fn every_shape_survives_four_quarter_turns() {
    for shape in CATALOG.iter() {
        for k in 0..4 {
            let back = shape.tile.rotated(k).rotated(4 - k);
            assert_eq!(back, shape.tile, "shape {} rotation {}", shape.name, k);
        }
    }
}

#[test]
fn edge_matching_is_symmetric() {
    for a in CATALOG.iter() {
        for b in CATALOG.iter() {
            for ra in 0..4 {
                for rb in 0..4 {
                    let ta = a.tile.rotated(ra);
                    let tb = b.tile.rotated(rb);
                    for side in SIDES {
                        assert_eq!(
                            ta.matches(side, &tb),
                            tb.matches(side.opposite(), &ta),
                            "{}@{} vs {}@{} on {:?}",
                            a.name,
                            ra,
                            b.name,
                            rb,
                            side
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn closed_structures_stay_closed() {
    let config = GameConfig { num_players: 2, num_bots: 2, random_seed: Some(17), tile_limit: Some(40) };
    let mut game = Game::new(&config);
    let mut bot = RandomStrategy::new(3, 0.0);
    let mut closed: HashSet<(Position, usize)> = HashSet::new();

    while let Some(turn) = game.start_turn() {
        let choice = if turn.skipped {
            None
        } else {
            let player = game.players()[turn.seat];
            bot.choose_placement(game.board_mut(), &player, &turn.tile, 10)
        };
        game.commit_turn(choice).unwrap();

        let board = game.board();
        for &(pos, segment) in &closed {
            assert!(is_closed(board, pos, segment), "structure at {pos} segment {segment} reopened");
        }
        for (pos, tile) in board.placed() {
            for segment in 0..SEGMENT_COUNT {
                if !tile.segment(segment).is_empty() && is_closed(board, pos, segment) {
                    closed.insert((pos, segment));
                }
            }
        }
    }
    assert!(!closed.is_empty());
}

#[test]
fn final_scoring_runs_once() {
    let config = GameConfig { num_players: 3, num_bots: 3, random_seed: Some(23), tile_limit: Some(35) };
    let mut game = Game::new(&config);
    let mut bot = RandomStrategy::new(8, 1.0);
    play_until(&mut game, &mut bot, |g| g.tiles_left() <= 1);

    let mut board = game.board().clone();
    let first = final_scores(&mut board);
    assert!(final_scores(&mut board).is_empty());
    assert!(first.iter().all(|f| f.points > 0));

    // Only farmers next to no finished city can be left standing.
    for (_, tile) in board.placed() {
        if let Some(m) = tile.meeple {
            assert_eq!(tile.kind(m.segment), Some(FeatureType::Field));
        }
    }
}

#[test]
fn tied_majority_pays_both_leaders() {
    let mut board = Board::new();
    let owners = [MeepleColor::Green, MeepleColor::Green, MeepleColor::Red, MeepleColor::Red, MeepleColor::Blue];
    for (dx, color) in (-2..=2).zip(owners) {
        let pos = c().offset(dx, 0);
        board.place_permanent(tile("U"), pos);
        assert!(board.place_meeple(Meeple { color, segment: 4 }, pos));
    }

    let scored = final_scores(&mut board);
    assert_eq!(scored.len(), 1);
    assert_eq!(scored[0].points, 5);

    let mut players: Vec<Player> = [MeepleColor::Green, MeepleColor::Red, MeepleColor::Blue]
        .into_iter()
        .map(|color| Player::new(color, false))
        .collect();
    for p in players.iter_mut() {
        p.meeples = 3;
    }
    award_majority(&mut players, &scored[0]);

    assert_eq!(players.iter().map(|p| p.points).collect::<Vec<_>>(), vec![5, 5, 0]);
    assert_eq!(players.iter().map(|p| p.meeples).collect::<Vec<_>>(), vec![5, 5, 4]);
    assert!(board.placed().all(|(_, t)| t.meeple.is_none()));
}

#[test]
fn open_two_tile_road_pays_two_at_game_end() {
    let mut board = Board::new();
    board.place_permanent(tile("U"), c());
    board.place_permanent(tile("U"), c().neighbor(Side::East));
    board.place_meeple(Meeple { color: MeepleColor::Black, segment: 10 }, c());

    assert!(incremental_scores(&mut board, c().neighbor(Side::East)).is_empty());
    let scored = final_scores(&mut board);
    assert_eq!(scored.len(), 1);
    assert_eq!(scored[0].points, 2);
}

#[test]
fn closed_three_tile_road_pays_three() {
    let mut board = Board::new();
    board.place_permanent(tile("W"), c().neighbor(Side::West));
    board.place_permanent(tile("U"), c());
    board.place_meeple(Meeple { color: MeepleColor::Yellow, segment: CENTER_SEGMENT }, c());
    board.place_permanent(tile("W"), c().neighbor(Side::East));

    let roads: Vec<_> = incremental_scores(&mut board, c().neighbor(Side::East))
        .into_iter()
        .filter(|f| f.feature_type == FeatureType::Road)
        .collect();
    assert_eq!(roads.len(), 1);
    assert_eq!(roads[0].points, 3);
    assert_eq!(roads[0].winners(), vec![MeepleColor::Yellow]);
    assert!(board.get(c()).unwrap().meeple.is_none());
}

#[test]
fn single_pennant_city_pays_eight_then_four() {
    let mut segments = [Segment::new(FeatureType::Field, 1); SEGMENT_COUNT];
    segments[CENTER_SEGMENT] = Segment::new(FeatureType::City, 2);
    let mut walled = Tile::new(0, segments);
    walled.pennant = true;

    let mut board = Board::new();
    board.place_permanent(walled, c());
    board.place_meeple(Meeple { color: MeepleColor::Red, segment: CENTER_SEGMENT }, c());

    let mut mid_game = board.clone();
    let now = incremental_scores(&mut mid_game, c());
    assert_eq!(now.iter().map(|f| f.points).collect::<Vec<_>>(), vec![8]);

    let end = final_scores(&mut board);
    assert_eq!(end.iter().map(|f| f.points).collect::<Vec<_>>(), vec![4]);
}

#[test]
fn monastery_completes_with_eighth_neighbour() {
    let mut board = Board::new();
    board.place_permanent(tile("B"), c());
    board.place_meeple(Meeple { color: MeepleColor::Green, segment: CENTER_SEGMENT }, c());

    let ring: Vec<Position> = c().neighborhood().filter(|&p| p != c()).collect();
    for (i, &pos) in ring.iter().enumerate() {
        board.place_permanent(tile("B"), pos);
        let paid: Vec<_> = incremental_scores(&mut board, pos).into_iter().filter(|f| f.origin == c()).collect();
        if i < 7 {
            assert!(paid.is_empty(), "paid after {} neighbours", i + 1);
        } else {
            assert_eq!(paid.len(), 1);
            assert_eq!(paid[0].points, 9);
        }
    }
}

#[test]
fn meeple_options_follow_supply() {
    let config = GameConfig { num_players: 1, num_bots: 0, random_seed: Some(5), tile_limit: None };
    let mut game = Game::new(&config);
    let mut turns = 0;

    // A lone player claims whatever it can on every turn.
    while turns < MEEPLES_PER_PLAYER + 2 {
        let Some(turn) = game.start_turn() else {
            break;
        };
        if turn.skipped {
            game.commit_turn(None).unwrap();
            continue;
        }
        let &(pos, rotation) = game.board().legal_placements(&turn.tile).first().unwrap();
        let options = game.meeple_options(pos, rotation).unwrap();
        let supply = game.players()[0].meeples;
        if supply == 0 {
            assert!(options.iter().all(|&ok| !ok));
        }
        let meeple = options.iter().position(|&ok| ok);
        game.commit_turn(Some(TurnChoice { pos, rotation, meeple })).unwrap();
        turns += 1;
    }

    let on_board = game.board().placed().filter(|(_, t)| t.meeple.is_some()).count() as u32;
    assert_eq!(on_board + game.players()[0].meeples, MEEPLES_PER_PLAYER);
}
