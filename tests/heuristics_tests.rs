//! Heuristic Tests
//!
//! The move orderer and the static evaluator must leave the inspected state
//! untouched, and the city primitives must score the diversity scenarios exactly.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use divercite_agent::city::{evaluate_opponent_city, evaluate_own_city};
use divercite_agent::config::Config;
use divercite_agent::game::{Board, GameState};
use divercite_agent::heuristics::Heuristics;
use divercite_agent::types::{Color, Coord, Inventory, Piece, PieceType, Player, Role};

fn random_position(seed: u64, plies: usize) -> GameState {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut state = GameState::new();
    for _ in 0..plies {
        let actions = state.legal_actions();
        let action = match actions.choose(&mut rng) {
            Some(a) => *a,
            None => break,
        };
        state = state.heavy(action).next_state();
    }
    state
}

fn city(color: Color, owner: Player) -> Piece {
    Piece::new(PieceType::new(color, Role::City), owner)
}

fn resource(color: Color, owner: Player) -> Piece {
    Piece::new(PieceType::new(color, Role::Resource), owner)
}

#[test]
fn test_heuristics_leave_state_unchanged() {
    let config = Config::default_hardcoded();
    for seed in 0..10 {
        let state = random_position(seed, 14);
        let before = state.clone();

        for player in Player::all().iter() {
            let h = Heuristics::new(&config, *player);
            for action in state.legal_actions() {
                h.rank_action(&state, &action);
            }
            h.evaluate_state(&state, 1.5);
        }

        assert_eq!(state, before, "seed {}", seed);
        assert_eq!(state.inventory(Player::White), before.inventory(Player::White));
        assert_eq!(state.board(), before.board());
    }
}

#[test]
fn test_ranks_are_never_negative() {
    let config = Config::default_hardcoded();
    let state = random_position(3, 20);
    let h = Heuristics::new(&config, state.to_move());
    for action in state.legal_actions() {
        assert!(h.rank_action(&state, &action) >= 0.0, "{}", action);
    }
}

/// White red city at (4, 5) with the given neighbour colours placed by Black
fn city_with_neighbors(colors: &[Color], white_inventory: Inventory) -> GameState {
    let spots = [Coord::new(3, 5), Coord::new(5, 5), Coord::new(4, 4), Coord::new(4, 6)];
    let mut board = Board::new();
    board.place(Coord::new(4, 5), city(Color::Red, Player::White));
    for (spot, color) in spots.iter().zip(colors.iter()) {
        board.place(*spot, resource(*color, Player::Black));
    }
    GameState::from_parts(board, [white_inventory, Inventory::starting()], Player::Black)
}

#[test]
fn test_four_distinct_neighbours_score_the_bonus_for_either_last_placer() {
    let config = Config::default_hardcoded();
    let colors = [Color::Red, Color::Green, Color::Blue, Color::Yellow];
    let at = Coord::new(4, 5);

    let by_black = city_with_neighbors(&colors, Inventory::starting());

    let mut board = by_black.board().clone();
    board.place(Coord::new(4, 6), resource(Color::Yellow, Player::White));
    let by_white = GameState::from_parts(board, [Inventory::starting(); 2], Player::Black);

    for state in [by_black, by_white].iter() {
        let c = *state.board().get(at).unwrap();
        assert_eq!(
            evaluate_own_city(state, at, &c, None, &config.own_city),
            config.own_city.diversity_score
        );
        assert_eq!(state.score(Player::White), 5);
    }
}

#[test]
fn test_missing_yellow_gives_fallback_not_progress() {
    let config = Config::default_hardcoded();
    let no_yellow = Inventory::starting().with_count(PieceType::new(Color::Yellow, Role::Resource), 0);
    let state = city_with_neighbors(&[Color::Red, Color::Green, Color::Blue], no_yellow);
    let at = Coord::new(4, 5);
    let c = *state.board().get(at).unwrap();

    let own = evaluate_own_city(&state, at, &c, None, &config.own_city);
    assert_eq!(own, config.own_city.score_for_color_mult);
    assert_ne!(own, config.own_city.still_possible_diversity_mult * 3.0);

    let rival = evaluate_opponent_city(&state, at, &c, None, &config.opponent_city);
    assert_eq!(rival, config.opponent_city.not_completable_diversity_score);
}

#[test]
fn test_yellow_in_stock_gives_progress() {
    let config = Config::default_hardcoded();
    let state = city_with_neighbors(&[Color::Red, Color::Green, Color::Blue], Inventory::starting());
    let at = Coord::new(4, 5);
    let c = *state.board().get(at).unwrap();

    assert_eq!(
        evaluate_own_city(&state, at, &c, None, &config.own_city),
        config.own_city.still_possible_diversity_mult * 3.0
    );
}

#[test]
fn test_evaluator_prefers_own_divercity() {
    let config = Config::default_hardcoded();
    let colors = [Color::Red, Color::Green, Color::Blue, Color::Yellow];
    let state = city_with_neighbors(&colors, Inventory::starting());

    let white = Heuristics::new(&config, Player::White).evaluate_state(&state, 0.0);
    let black = Heuristics::new(&config, Player::Black).evaluate_state(&state, 0.0);
    assert!(white > black);
}
