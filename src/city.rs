// City evaluation primitives
//
// Pure scoring functions over a single city's neighbourhood and over a remaining
// inventory. None of them mutate the state they inspect; "what if" questions are
// answered with derived values (an extra hypothetical colour, a decremented copy
// of the inventory).

use crate::config::{CityPlacementConfig, OpponentCityConfig, OwnCityConfig};
use crate::game::{distinct_count, GameState};
use crate::types::{Color, Coord, Inventory, Piece, PieceType, Player, Role};

/// True when, for every colour missing from `colors`, the owner still holds at
/// least one resource of that colour, i.e. the divercity is still reachable.
pub fn has_needed_pieces(colors: &[Color], owner_inventory: &Inventory) -> bool {
    Color::ALL
        .iter()
        .filter(|c| !colors.contains(c))
        .all(|&c| owner_inventory.has(PieceType::new(c, Role::Resource)))
}

fn neighbor_colors_with(state: &GameState, at: Coord, hypothetical: Option<Color>) -> Vec<Color> {
    let mut colors = state.board().neighbor_colors(at);
    colors.extend(hypothetical);
    colors
}

/// Scores the city at `at` from its owner's point of view
///
/// * four distinct colours: the diversity bonus
/// * pairwise distinct and still completable: partial progress per neighbour
/// * otherwise: neighbours matching the city colour
pub fn evaluate_own_city(
    state: &GameState,
    at: Coord,
    city: &Piece,
    hypothetical: Option<Color>,
    weights: &OwnCityConfig,
) -> f64 {
    let colors = neighbor_colors_with(state, at, hypothetical);
    let distinct = distinct_count(&colors);

    if distinct == 4 {
        return weights.diversity_score;
    }

    if distinct == colors.len() && has_needed_pieces(&colors, state.inventory(city.owner)) {
        return weights.still_possible_diversity_mult * colors.len() as f64;
    }

    let matching = colors.iter().filter(|&&c| c == city.color()).count();
    matching as f64 * weights.score_for_color_mult
}

/// Scores the city at `at` from the point of view of its owner's opponent
///
/// Rewards blocking a divercity that is still reachable; a city whose owner can
/// no longer complete it scores a small constant regardless of the move.
pub fn evaluate_opponent_city(
    state: &GameState,
    at: Coord,
    city: &Piece,
    hypothetical: Option<Color>,
    weights: &OpponentCityConfig,
) -> f64 {
    let mut colors = state.board().neighbor_colors(at);

    if distinct_count(&colors) == colors.len()
        && !has_needed_pieces(&colors, state.inventory(city.owner))
    {
        return weights.not_completable_diversity_score;
    }

    colors.extend(hypothetical);
    let distinct = distinct_count(&colors);

    if colors.len() == 4 && distinct != 4 {
        return weights.cancel_diversity_score;
    }

    if colors.len() == 3 && distinct != 3 {
        return if hypothetical != Some(city.color()) {
            weights.cancel_in_progress_diversity_score + weights.bonus_cancel_with_other_col
        } else {
            0.0
        };
    }

    0.0
}

/// Scores placing a city of `color` next to the given neighbour colours
pub fn city_placement_heuristic(
    neighbor_colors: &[Color],
    color: Color,
    weights: &CityPlacementConfig,
) -> f64 {
    if distinct_count(neighbor_colors) == neighbor_colors.len() {
        return weights.unique_neighbors_bonus
            + weights.in_progress_diversity_mult * neighbor_colors.len() as f64;
    }
    let matching = neighbor_colors.iter().filter(|&&c| c == color).count();
    matching as f64 * weights.city_color_score
}

/// Scores the cities on the diagonals of `at` for a city of `color` owned by
/// `owner`: foreign cities of another colour and own cities of the same colour
/// both count.
pub fn city_proximity_score(
    state: &GameState,
    at: Coord,
    color: Color,
    owner: Player,
    weights: &CityPlacementConfig,
) -> f64 {
    state
        .diagonal_cities(at)
        .iter()
        .map(|city| {
            if city.owner != owner {
                if city.color() != color {
                    weights.near_opponent_city_score + weights.different_color_city_bonus
                } else {
                    0.0
                }
            } else if city.color() == color {
                weights.near_my_city_score + weights.same_color_city_bonus
            } else {
                0.0
            }
        })
        .sum()
}

/// `base / (imbalance / 2 + 1)` where imbalance is the total absolute deviation
/// of the per-colour counts from their mean
pub fn balance_bonus(counts: [u8; 4], base: f64) -> f64 {
    let avg = counts.iter().map(|&c| c as f64).sum::<f64>() / counts.len() as f64;
    let imbalance: f64 = counts.iter().map(|&c| (c as f64 - avg).abs()).sum();
    base / (imbalance / 2.0 + 1.0)
}
