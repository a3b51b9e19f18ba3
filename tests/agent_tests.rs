//! Agent Tests
//!
//! End-to-end behaviour of the agent: the opening shortcut, the async move
//! endpoint path and legal play through a whole game.

use std::time::Duration;

use divercite_agent::bot::{Bot, MoveRequest};
use divercite_agent::config::Config;
use divercite_agent::game::GameState;
use divercite_agent::types::Player;

fn shallow_config() -> Config {
    let mut config = Config::default_hardcoded();
    for step in config.depth.steps.iter_mut() {
        step.depth = step.depth.min(2);
    }
    config.depth.default_depth = 2;
    config.depth.emergency_depth = 1;
    config
}

#[test]
fn test_untouched_inventory_places_city_without_search() {
    let mut config = shallow_config();
    config.opening.book.clear();
    let bot = Bot::with_seed(config, 42);
    let state = GameState::new();

    let decision = bot.decide(&state, Some(Duration::from_secs(900)));
    assert!(decision.opening);
    assert_eq!(decision.depth, 0, "depth controller must not run");
    assert_eq!(decision.stats.nodes, 0, "search must not run");
    let action = decision.action.expect("an opening city");
    assert!(action.is_city());
    assert!(state.is_legal(&action));

    let heavy = bot.compute_action(&state, None).expect("an opening city");
    assert!(heavy.light().is_city());
    assert_eq!(heavy.next_state().step(), 1);
}

#[test]
fn test_opening_book_skips_illegal_entries() {
    let bot = Bot::with_seed(shallow_config(), 1);
    let book = bot.config().opening.book.clone();

    let first = GameState::new();
    let after_white = bot.compute_action(&first, None).unwrap().next_state();
    // Black is still untouched; the first book cell is taken
    let black_move = bot.decide(&after_white, None);
    assert!(black_move.opening);
    assert_eq!(black_move.action, Some(book[1]));
}

#[test]
fn test_whole_game_is_legal() {
    let bot = Bot::with_seed(shallow_config(), 9);
    let mut state = GameState::new();
    let mut plies = 0;

    while !state.is_terminal() {
        let decision = bot.decide(&state, Some(Duration::from_secs(900)));
        let action = decision.action.expect("a legal action while the game runs");
        assert!(state.is_legal(&action), "step {}: {}", state.step(), action);
        state = state.heavy(action).next_state();
        plies += 1;
    }

    assert_eq!(plies, 40);
    assert!(state.outcome().is_some());
}

#[tokio::test]
async fn test_get_move_runs_search_off_the_executor() {
    let bot = Bot::with_seed(shallow_config(), 3);
    let mut state = GameState::new();
    for _ in 0..2 {
        state = bot.compute_action(&state, None).unwrap().next_state();
    }

    let request = MoveRequest {
        player: state.to_move(),
        state: state.clone(),
        remaining_time_ms: Some(600_000),
    };
    let response = bot.get_move(request).await.unwrap();

    assert!(response.depth >= 1);
    let action = response.action.expect("a move");
    assert!(state.is_legal(&action));
}

#[tokio::test]
async fn test_get_move_rejects_wrong_player() {
    let bot = Bot::with_seed(shallow_config(), 3);
    let request = MoveRequest {
        state: GameState::new(),
        player: Player::Black,
        remaining_time_ms: None,
    };
    assert!(bot.get_move(request).await.is_err());
}

#[test]
fn test_move_request_json() {
    let json = r#"{
        "state": {
            "board": [
                {"at": {"x": 6, "y": 5}, "piece": {"piece_type": {"color": "Red", "role": "City"}, "owner": "White"}}
            ],
            "inventories": [
                {"counts": [3, 2, 3, 2, 3, 2, 3, 2]},
                {"counts": [3, 2, 3, 2, 3, 2, 3, 2]}
            ],
            "scores": [0, 0],
            "to_move": "Black",
            "step": 1
        },
        "player": "Black",
        "remaining_time_ms": 899000
    }"#;
    let request: MoveRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.player, Player::Black);
    assert_eq!(request.state.board().len(), 1);
    assert_eq!(request.remaining_time_ms, Some(899_000));
}
