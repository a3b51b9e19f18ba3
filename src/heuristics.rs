// Move orderer and static evaluator
//
// `Heuristics` binds one immutable weight set to the searching player and plugs
// both scoring functions into the alpha-beta engine through `SearchPolicy`.

use std::time::Instant;

use crate::city::{
    balance_bonus, city_placement_heuristic, city_proximity_score, evaluate_opponent_city,
    evaluate_own_city,
};
use crate::config::Config;
use crate::depth::DepthController;
use crate::game::GameState;
use crate::search::SearchPolicy;
use crate::types::{LightAction, Player, Role};

/// Inner-node depth clamp: the controller plus the instant the player's clock
/// runs out, if a clock is tracked
#[derive(Debug, Clone, Copy)]
struct DepthClamp<'c> {
    controller: &'c DepthController,
    deadline: Option<Instant>,
}

#[derive(Debug, Clone, Copy)]
pub struct Heuristics<'c> {
    config: &'c Config,
    me: Player,
    clamp: Option<DepthClamp<'c>>,
}

impl<'c> Heuristics<'c> {
    pub fn new(config: &'c Config, me: Player) -> Self {
        Heuristics {
            config,
            me,
            clamp: None,
        }
    }

    /// Re-applies the depth table at inner nodes, reading the live remaining
    /// time against `deadline`
    pub fn with_depth_clamp(mut self, controller: &'c DepthController, deadline: Option<Instant>) -> Self {
        self.clamp = Some(DepthClamp {
            controller,
            deadline,
        });
        self
    }

    pub fn player(&self) -> Player {
        self.me
    }

    /// Ranks `action` for the player to move in `state`
    ///
    /// Resource placements are worth the tactical effect they have on adjacent
    /// cities and score 0 without one. City placements start at 1. Both get the
    /// inventory balance bonuses computed on the mover's inventory after the
    /// placement.
    pub fn rank_action(&self, state: &GameState, action: &LightAction) -> f64 {
        let mover = state.to_move();
        let weights = &self.config.action_heuristic;
        let at = action.at();

        let placement = match *action {
            LightAction::Resource { color, .. } => {
                let mut gain = 0.0;
                for neighbor in state.neighbors(at).iter() {
                    let city = match neighbor.cell.piece() {
                        Some(piece) if piece.is_city() => piece,
                        _ => continue,
                    };
                    if city.owner == mover {
                        let own = evaluate_own_city(state, neighbor.at, &city, Some(color), &self.config.own_city);
                        if own > 0.0 {
                            gain += own * weights.self_city_gain_mult;
                        }
                    } else {
                        let block = evaluate_opponent_city(
                            state,
                            neighbor.at,
                            &city,
                            Some(color),
                            &self.config.opponent_city,
                        );
                        if block > 0.0 {
                            gain += block * weights.opponent_city_gain_mult;
                        }
                    }
                }
                if gain <= 0.0 {
                    return 0.0;
                }
                gain
            }
            LightAction::City { color, .. } => {
                let neighbors = state.board().neighbor_colors(at);
                1.0 + city_placement_heuristic(&neighbors, color, &self.config.city_placement)
                    + city_proximity_score(state, at, color, mover, &self.config.city_placement)
            }
        };

        let remaining = state.inventory(mover).without(action.piece_type());
        placement
            + balance_bonus(remaining.by_color(Role::Resource), weights.resource_balance)
            + balance_bonus(remaining.by_color(Role::City), weights.city_balance)
    }

    /// Weight applied to the opponent's city total
    pub fn opponent_weight(&self, state: &GameState) -> f64 {
        let weights = &self.config.state_heuristic;
        let base = weights.opponent_score_mult;
        if !weights.adaptive_opponent_weight {
            return base;
        }

        let lead = state.score(self.me) - state.score(self.me.opponent());
        if lead >= weights.lead_threshold {
            base * (1.0 + weights.adaptive_step)
        } else if -lead >= weights.lead_threshold {
            (base * (1.0 - weights.adaptive_step)).max(0.0)
        } else {
            base
        }
    }

    /// Static value of `state` for the searching player
    pub fn evaluate_state(&self, state: &GameState, carried: f64) -> f64 {
        let weights = &self.config.state_heuristic;
        let mut mine = 0.0;
        let mut theirs = 0.0;

        for (at, city) in state.board().cities() {
            let proximity =
                (city_proximity_score(state, at, city.color(), city.owner, &self.config.city_placement)
                    / weights.div_city_heur)
                    .floor();
            let owner_view = evaluate_own_city(state, at, &city, None, &self.config.own_city) + proximity;
            let rival_view = evaluate_opponent_city(state, at, &city, None, &self.config.opponent_city);

            if city.owner == self.me {
                mine += owner_view;
                theirs += rival_view;
            } else {
                mine += rival_view;
                theirs += owner_view;
            }
        }

        let score_diff = (state.score(self.me) - state.score(self.me.opponent())) as f64;

        mine - theirs * self.opponent_weight(state)
            + weights.score_diff_weight * score_diff
            + weights.carried_move_weight * carried
    }
}

impl SearchPolicy<GameState> for Heuristics<'_> {
    fn rank(&self, state: &GameState, action: &LightAction) -> f64 {
        self.rank_action(state, action)
    }

    fn evaluate(&self, state: &GameState, carried: f64) -> f64 {
        self.evaluate_state(state, carried)
    }

    fn depth_cap(&self, candidates: usize) -> Option<u32> {
        if !self.config.depth.clamp_inner_nodes {
            return None;
        }
        self.clamp.map(|clamp| {
            let remaining = clamp
                .deadline
                .map(|deadline| deadline.saturating_duration_since(Instant::now()));
            clamp.controller.depth(candidates, remaining)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Board;
    use crate::types::{Color, Coord, Inventory, Piece, PieceType};

    fn piece(color: Color, role: Role, owner: Player) -> Piece {
        Piece::new(PieceType::new(color, role), owner)
    }

    /// White red city at (3, 4) with red and green neighbours, black to move
    fn contested() -> GameState {
        let mut board = Board::new();
        board.place(Coord::new(3, 4), piece(Color::Red, Role::City, Player::White));
        board.place(Coord::new(2, 4), piece(Color::Red, Role::Resource, Player::Black));
        board.place(Coord::new(4, 4), piece(Color::Green, Role::Resource, Player::White));
        board.place(Coord::new(3, 3), piece(Color::Blue, Role::Resource, Player::Black));
        GameState::from_parts(board, [Inventory::starting(); 2], Player::Black)
    }

    #[test]
    fn test_resource_without_city_neighbour_is_pruned() {
        let config = Config::default_hardcoded();
        let h = Heuristics::new(&config, Player::White);
        let state = GameState::new();
        let action = LightAction::Resource {
            color: Color::Red,
            at: Coord::new(4, 4),
        };
        assert_eq!(h.rank_action(&state, &action), 0.0);
    }

    #[test]
    fn test_blocking_move_outranks_completing_for_opponent() {
        let config = Config::default_hardcoded();
        let h = Heuristics::new(&config, Player::Black);
        let state = contested();
        let block = LightAction::Resource {
            color: Color::Green,
            at: Coord::new(3, 5),
        };
        let complete = LightAction::Resource {
            color: Color::Yellow,
            at: Coord::new(3, 5),
        };
        assert!(h.rank_action(&state, &block) > 0.0);
        // Completing the rival divercity has no blocking value, so it is pruned
        assert_eq!(h.rank_action(&state, &complete), 0.0);
    }

    #[test]
    fn test_city_placement_has_base_value() {
        let config = Config::default_hardcoded();
        let h = Heuristics::new(&config, Player::White);
        let state = GameState::new();
        let action = LightAction::City {
            color: Color::Red,
            at: Coord::new(6, 5),
        };
        assert!(h.rank_action(&state, &action) >= 1.0);
    }

    #[test]
    fn test_evaluate_is_antisymmetric_with_unit_weight() {
        let mut config = Config::default_hardcoded();
        config.state_heuristic.opponent_score_mult = 1.0;
        let state = contested();
        let white = Heuristics::new(&config, Player::White).evaluate_state(&state, 0.0);
        let black = Heuristics::new(&config, Player::Black).evaluate_state(&state, 0.0);
        assert!((white + black).abs() < 1e-9);
    }

    #[test]
    fn test_score_difference_and_carried_rank_terms() {
        let mut config = Config::default_hardcoded();
        let state = contested();
        let base_white = Heuristics::new(&config, Player::White).evaluate_state(&state, 4.0);
        let base_black = Heuristics::new(&config, Player::Black).evaluate_state(&state, 4.0);

        config.state_heuristic.score_diff_weight = 2.0;
        config.state_heuristic.carried_move_weight = 0.5;
        let white = Heuristics::new(&config, Player::White).evaluate_state(&state, 4.0);
        let black = Heuristics::new(&config, Player::Black).evaluate_state(&state, 4.0);

        // White leads 1-0: +2 * 1 for the score, +0.5 * 4 for the carried rank
        assert!((white - base_white - 4.0).abs() < 1e-9);
        assert!((black - base_black).abs() < 1e-9);
    }

    #[test]
    fn test_adaptive_opponent_weight() {
        let mut config = Config::default_hardcoded();
        config.state_heuristic.adaptive_opponent_weight = true;
        config.state_heuristic.lead_threshold = 1;
        let state = contested();
        // White's red city has one red neighbour: White leads by 1
        let white = Heuristics::new(&config, Player::White);
        let black = Heuristics::new(&config, Player::Black);
        assert_eq!(white.opponent_weight(&state), 0.5 * 1.5);
        assert_eq!(black.opponent_weight(&state), 0.5 * 0.5);
    }

    #[test]
    fn test_depth_cap_only_with_clamp() {
        let config = Config::default_hardcoded();
        let controller = DepthController::new(config.depth.clone());
        let plain = Heuristics::new(&config, Player::White);
        assert_eq!(SearchPolicy::<GameState>::depth_cap(&plain, 3), None);

        let clamped = plain.with_depth_clamp(&controller, None);
        assert_eq!(SearchPolicy::<GameState>::depth_cap(&clamped, 3), Some(10));
        assert_eq!(SearchPolicy::<GameState>::depth_cap(&clamped, 100), Some(3));
    }
}
