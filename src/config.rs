// Configuration module for reading Divercite.toml
// Every tunable constant of the agent lives here, so each agent instance owns its
// own immutable set of weights.

use serde::Deserialize;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::fs;
use std::path::Path;

use crate::types::{Color, Coord, LightAction};

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub timing: TimingConfig,
    pub depth: DepthConfig,
    pub pruning: PruningConfig,
    pub state_heuristic: StateHeuristicConfig,
    pub action_heuristic: ActionHeuristicConfig,
    pub own_city: OwnCityConfig,
    pub opponent_city: OpponentCityConfig,
    pub city_placement: CityPlacementConfig,
    pub opening: OpeningConfig,
    pub debug: DebugConfig,
}

/// Match clock
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TimingConfig {
    /// Total thinking time each player gets for a whole match
    pub match_time_budget_ms: u64,
}

/// One row of the depth table: fewer than `below` candidates searches `depth` plies
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct DepthStep {
    pub below: usize,
    pub depth: u32,
}

/// Depth controller constants
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DepthConfig {
    pub steps: Vec<DepthStep>,
    pub default_depth: u32,
    pub emergency_depth: u32,
    pub emergency_time_ms: u64,
    /// Re-apply the table at inner nodes with the live candidate count
    pub clamp_inner_nodes: bool,
}

/// Candidate filtering constants
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PruningConfig {
    /// Slicing only kicks in above this many positive-ranked candidates
    pub threshold: usize,
    pub len_divide: usize,
    pub max_actions: usize,
    /// Rank given to every action when the heuristic keeps nothing
    pub neutral_rank: f64,
}

/// Static evaluator constants
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StateHeuristicConfig {
    pub opponent_score_mult: f64,
    pub div_city_heur: f64,
    pub score_diff_weight: f64,
    pub carried_move_weight: f64,
    pub adaptive_opponent_weight: bool,
    pub lead_threshold: i32,
    pub adaptive_step: f64,
}

/// Move orderer constants
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ActionHeuristicConfig {
    pub self_city_gain_mult: f64,
    pub opponent_city_gain_mult: f64,
    pub resource_balance: f64,
    pub city_balance: f64,
}

/// Scores for a city seen by its owner
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OwnCityConfig {
    pub diversity_score: f64,
    pub still_possible_diversity_mult: f64,
    pub score_for_color_mult: f64,
}

/// Scores for a city seen by its owner's opponent
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OpponentCityConfig {
    pub cancel_diversity_score: f64,
    pub cancel_in_progress_diversity_score: f64,
    pub not_completable_diversity_score: f64,
    pub bonus_cancel_with_other_col: f64,
}

/// City placement and proximity constants
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CityPlacementConfig {
    pub unique_neighbors_bonus: f64,
    pub in_progress_diversity_mult: f64,
    pub city_color_score: f64,
    pub near_opponent_city_score: f64,
    pub different_color_city_bonus: f64,
    pub near_my_city_score: f64,
    pub same_color_city_bonus: f64,
}

/// First-move shortcut
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OpeningConfig {
    /// Pick a random city placement instead of the first legal one
    pub randomize: bool,
    /// Preferred opening moves, tried in order
    pub book: Vec<LightAction>,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Divercite.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: Config =
            toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads default configuration from Divercite.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Divercite.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Divercite.toml
    pub fn default_hardcoded() -> Self {
        Config {
            timing: TimingConfig {
                match_time_budget_ms: 900_000,
            },
            depth: DepthConfig {
                steps: vec![
                    DepthStep { below: 6, depth: 10 },
                    DepthStep { below: 11, depth: 8 },
                    DepthStep { below: 15, depth: 7 },
                    DepthStep { below: 18, depth: 6 },
                    DepthStep { below: 32, depth: 5 },
                    DepthStep { below: 70, depth: 4 },
                ],
                default_depth: 3,
                emergency_depth: 3,
                emergency_time_ms: 80_000,
                clamp_inner_nodes: true,
            },
            pruning: PruningConfig {
                threshold: 25,
                len_divide: 2,
                max_actions: 30,
                neutral_rank: 1.0,
            },
            state_heuristic: StateHeuristicConfig {
                opponent_score_mult: 0.5,
                div_city_heur: 0.5,
                score_diff_weight: 0.0,
                carried_move_weight: 0.0,
                adaptive_opponent_weight: false,
                lead_threshold: 6,
                adaptive_step: 0.5,
            },
            action_heuristic: ActionHeuristicConfig {
                self_city_gain_mult: 1.0,
                opponent_city_gain_mult: 1.0,
                resource_balance: 2.0,
                city_balance: 3.0,
            },
            own_city: OwnCityConfig {
                diversity_score: 6.0,
                still_possible_diversity_mult: 1.5,
                score_for_color_mult: 1.5,
            },
            opponent_city: OpponentCityConfig {
                cancel_diversity_score: 4.0,
                cancel_in_progress_diversity_score: 1.0,
                not_completable_diversity_score: 1.0,
                bonus_cancel_with_other_col: 0.0,
            },
            city_placement: CityPlacementConfig {
                unique_neighbors_bonus: 1.0,
                in_progress_diversity_mult: 1.0,
                city_color_score: 1.0,
                near_opponent_city_score: 1.0,
                different_color_city_bonus: 1.0,
                near_my_city_score: 0.5,
                same_color_city_bonus: 0.0,
            },
            opening: OpeningConfig {
                randomize: true,
                book: vec![
                    LightAction::City { color: Color::Red, at: Coord::new(6, 5) },
                    LightAction::City { color: Color::Blue, at: Coord::new(5, 6) },
                ],
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "divercite_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            eprintln!(
                "Warning: Could not load Divercite.toml ({}), using hardcoded defaults",
                e
            );
            Self::default_hardcoded()
        })
    }

    /// Checks the invariants the search relies on
    pub fn validate(&self) -> Result<(), String> {
        let depth = &self.depth;
        if depth.default_depth == 0 || depth.emergency_depth == 0 {
            return Err("Search depths must be at least 1".to_string());
        }
        for pair in depth.steps.windows(2) {
            if pair[0].below >= pair[1].below {
                return Err(format!(
                    "Depth steps must have strictly increasing thresholds ({} then {})",
                    pair[0].below, pair[1].below
                ));
            }
            if pair[0].depth < pair[1].depth {
                return Err(format!(
                    "Depth steps must not deepen as candidates grow ({} then {})",
                    pair[0].depth, pair[1].depth
                ));
            }
        }
        if depth.steps.iter().any(|s| s.depth == 0) {
            return Err("Depth steps must be at least 1".to_string());
        }
        if let Some(last) = depth.steps.last() {
            if last.depth < depth.default_depth {
                return Err(format!(
                    "Default depth {} exceeds the last step depth {}",
                    depth.default_depth, last.depth
                ));
            }
        }
        if self.pruning.len_divide == 0 || self.pruning.max_actions == 0 {
            return Err("len_divide and max_actions must be positive".to_string());
        }
        if self.state_heuristic.div_city_heur <= 0.0 {
            return Err("div_city_heur must be positive".to_string());
        }
        Ok(())
    }

    /// Applies a flat map of named constants on top of this configuration
    ///
    /// Names follow the tournament harness convention (`THRESHOLD`,
    /// `DIVERSITY_SCORE`, ...). Unknown names are rejected so a typo never
    /// silently plays with the defaults.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, f64>) -> Result<(), String> {
        let mut names: Vec<&String> = overrides.keys().collect();
        names.sort();

        for name in names {
            let value = overrides[name];
            if !value.is_finite() {
                return Err(format!("Override {} is not a finite number", name));
            }
            match name.as_str() {
                "THRESHOLD" => self.pruning.threshold = whole(name, value)?,
                "LEN_DIVIDE" => self.pruning.len_divide = whole(name, value)?,
                "MAX_ACTIONS" => self.pruning.max_actions = whole(name, value)?,
                "NEUTRAL_RANK" => self.pruning.neutral_rank = value,
                "DEFAULT_DEPTH" => self.depth.default_depth = whole(name, value)?,
                "EMERGENCY_DEPTH" => self.depth.emergency_depth = whole(name, value)?,
                "EMERGENCY_TIME_MS" => self.depth.emergency_time_ms = whole(name, value)?,
                "OPPONENT_SCORE_MULT" => self.state_heuristic.opponent_score_mult = value,
                "DIV_CITY_HEUR" => self.state_heuristic.div_city_heur = value,
                "SCORE_DIFF_WEIGHT" => self.state_heuristic.score_diff_weight = value,
                "CARRIED_MOVE_WEIGHT" => self.state_heuristic.carried_move_weight = value,
                "LEAD_THRESHOLD" => self.state_heuristic.lead_threshold = whole(name, value)?,
                "ADAPTIVE_STEP" => self.state_heuristic.adaptive_step = value,
                "SELF_CITY_GAIN_MULT" => self.action_heuristic.self_city_gain_mult = value,
                "OPPONENT_CITY_GAIN_MULT" => self.action_heuristic.opponent_city_gain_mult = value,
                "RESOURCE_BALANCE" | "RESSOURCE_BALANCE" => {
                    self.action_heuristic.resource_balance = value
                }
                "CITY_BALANCE" => self.action_heuristic.city_balance = value,
                "DIVERSITY_SCORE" => self.own_city.diversity_score = value,
                "STILL_POSSIBLE_DIVERSITY_MULT" => {
                    self.own_city.still_possible_diversity_mult = value
                }
                "SCORE_FOR_COLOR_MULT" => self.own_city.score_for_color_mult = value,
                "CANCEL_DIVERSITY_SCORE" => self.opponent_city.cancel_diversity_score = value,
                "CANCEL_IN_PROGRESS_DIVERSITY_SCORE" => {
                    self.opponent_city.cancel_in_progress_diversity_score = value
                }
                "NOT_COMPLETABLE_DIVERSITY_SCORE" => {
                    self.opponent_city.not_completable_diversity_score = value
                }
                "BONUS_CANCEL_WITH_OTHER_COL" => {
                    self.opponent_city.bonus_cancel_with_other_col = value
                }
                "UNIQUE_NEIGHBORS_BONUS" => self.city_placement.unique_neighbors_bonus = value,
                "IN_PROGRESS_DIVERSITY_MULT" => {
                    self.city_placement.in_progress_diversity_mult = value
                }
                "CITY_COLOR_SCORE" => self.city_placement.city_color_score = value,
                "NEAR_OPPONENT_CITY_SCORE" => self.city_placement.near_opponent_city_score = value,
                "DIFFERENT_COLOR_CITY_BONUS" => {
                    self.city_placement.different_color_city_bonus = value
                }
                "NEAR_MY_CITY_SCORE" => self.city_placement.near_my_city_score = value,
                "SAME_COLOR_CITY_BONUS" => self.city_placement.same_color_city_bonus = value,
                other => return Err(format!("Unknown parameter: {}", other)),
            }
        }

        self.validate()
    }

    /// Parses a JSON object of named constants, e.g. `{"THRESHOLD": 30}`
    pub fn parse_overrides(json: &str) -> Result<HashMap<String, f64>, String> {
        serde_json::from_str(json).map_err(|e| format!("Failed to parse parameters: {}", e))
    }
}

/// Converts an override to an integer field, rejecting fractions and values
/// outside the field's range
fn whole<T: TryFrom<i64>>(name: &str, value: f64) -> Result<T, String> {
    if value.fract() != 0.0 || value < i64::MIN as f64 || value >= i64::MAX as f64 {
        return Err(format!("Override {} must be an integer, got {}", name, value));
    }
    T::try_from(value as i64).map_err(|_| format!("Override {} is out of range: {}", name, value))
}
