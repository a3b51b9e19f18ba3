// Divercite agent
//
// Owns one immutable configuration and turns a position into a decision: the
// opening shortcut when the inventory is untouched, otherwise one alpha-beta
// search whose depth comes from the depth controller. The async `get_move` entry
// point serves the HTTP handler and keeps the search off the async executor.

use log::{info, warn};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::debug_logger::DebugLogger;
use crate::depth::DepthController;
use crate::game::{GameState, HeavyAction};
use crate::heuristics::Heuristics;
use crate::profile;
use crate::search::{AlphaBeta, SearchStats};
use crate::simple_profiler::Category;
use crate::types::{LightAction, Player};

/// Body of POST /move
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MoveRequest {
    pub state: GameState,
    pub player: Player,
    /// What is left of the player's match clock
    pub remaining_time_ms: Option<u64>,
}

/// Reply of POST /move; a null action means the agent passes
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct MoveResponse {
    pub action: Option<LightAction>,
    pub value: f64,
    pub depth: u32,
}

/// Everything the agent knows about one choice
#[derive(Debug, Clone)]
pub struct Decision {
    pub action: Option<LightAction>,
    pub value: f64,
    /// 0 when no search ran
    pub depth: u32,
    /// Candidates left after ranking and slicing at the root
    pub candidates: usize,
    pub stats: SearchStats,
    pub opening: bool,
    pub elapsed: Duration,
}

impl Decision {
    pub fn to_response(&self) -> MoveResponse {
        MoveResponse {
            action: self.action,
            value: self.value,
            depth: self.depth,
        }
    }
}

/// Divercite agent with an API mirroring the server endpoints
/// Takes a static configuration that does not change during the bot's lifetime
#[derive(Clone)]
pub struct Bot {
    config: Arc<Config>,
    depth: DepthController,
    rng: Arc<Mutex<StdRng>>,
    logger: DebugLogger,
}

impl Bot {
    /// Creates a new Bot instance with the given configuration
    pub fn new(config: Config) -> Self {
        Self::with_seed(config, rand::random())
    }

    /// Same as `new` with a fixed seed for the random opening
    pub fn with_seed(config: Config, seed: u64) -> Self {
        let depth = DepthController::new(config.depth.clone());
        Bot {
            config: Arc::new(config),
            depth,
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
            logger: DebugLogger::disabled(),
        }
    }

    /// Attaches a decision log used by `get_move`
    pub fn with_logger(mut self, logger: DebugLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns agent metadata
    /// Corresponds to GET / endpoint
    pub fn info(&self) -> Value {
        info!("INFO");

        json!({
            "apiversion": "1",
            "game": "divercite",
            "author": "divercite-agent",
            "version": env!("CARGO_PKG_VERSION"),
        })
    }

    /// Called when a game starts
    /// Corresponds to POST /start endpoint
    pub fn start(&self, state: &GameState) {
        info!("GAME START (step {}, {} to move)", state.step(), state.to_move().as_str());
    }

    /// Called when a game ends
    /// Corresponds to POST /end endpoint
    pub fn end(&self, state: &GameState) {
        let [white, black] = state.scores();
        info!("GAME OVER (white {} - black {}, {:?})", white, black, state.leader());
    }

    /// Chooses an action for the player to move
    ///
    /// `remaining` is what is left of that player's match clock; it drives the
    /// emergency depth and the inner-node depth clamp. Returns `None` only when
    /// the player has no legal action.
    pub fn compute_action<'s>(&self, state: &'s GameState, remaining: Option<Duration>) -> Option<HeavyAction<'s>> {
        self.decide(state, remaining).action.map(|a| state.heavy(a))
    }

    /// `compute_action` with the search details attached
    pub fn decide(&self, state: &GameState, remaining: Option<Duration>) -> Decision {
        let start = Instant::now();
        let me = state.to_move();

        if state.inventory(me).is_untouched() {
            if let Some(action) = self.opening_action(state) {
                info!("Step {}: {} opens with {}", state.step(), me.as_str(), action);
                return Decision {
                    action: Some(action),
                    value: 0.0,
                    depth: 0,
                    candidates: 0,
                    stats: SearchStats::default(),
                    opening: true,
                    elapsed: start.elapsed(),
                };
            }
        }

        let deadline = remaining.and_then(|r| start.checked_add(r));
        let heuristics = Heuristics::new(&self.config, me).with_depth_clamp(&self.depth, deadline);
        let mut engine = AlphaBeta::new(&heuristics, &self.config.pruning);

        let candidates = engine.candidates(state);
        let count = candidates.len();
        let depth = self.depth.depth(count, remaining);

        let outcome = profile!(Category::Search, {
            engine.search_candidates(state, candidates, depth, f64::NEG_INFINITY, f64::INFINITY)
        });

        let elapsed = start.elapsed();
        match outcome.action {
            Some(action) => info!(
                "Step {}: {} plays {} (value: {:.2}, depth: {}, candidates: {}, nodes: {}, time: {}ms)",
                state.step(),
                me.as_str(),
                action,
                outcome.value,
                depth,
                count,
                outcome.stats.nodes,
                elapsed.as_millis()
            ),
            None => warn!("Step {}: {} has no legal action", state.step(), me.as_str()),
        }

        Decision {
            action: outcome.action,
            value: outcome.value,
            depth,
            candidates: count,
            stats: outcome.stats,
            opening: false,
            elapsed,
        }
    }

    /// First move: a book entry if one is legal, else any city placement
    fn opening_action(&self, state: &GameState) -> Option<LightAction> {
        if let Some(entry) = self
            .config
            .opening
            .book
            .iter()
            .find(|entry| entry.is_city() && state.is_legal(entry))
        {
            return Some(*entry);
        }

        let cities: Vec<LightAction> = state
            .legal_actions()
            .into_iter()
            .filter(|a| a.is_city())
            .collect();

        if self.config.opening.randomize {
            let mut rng = self.rng.lock();
            cities.choose(&mut *rng).copied()
        } else {
            cities.first().copied()
        }
    }

    /// Computes the reply to a move request
    /// Corresponds to POST /move endpoint
    ///
    /// The search is CPU-bound, so it runs on tokio's blocking pool.
    pub async fn get_move(&self, request: MoveRequest) -> Result<MoveResponse, String> {
        if request.player != request.state.to_move() {
            return Err(format!(
                "It is {}'s turn, not {}'s",
                request.state.to_move().as_str(),
                request.player.as_str()
            ));
        }

        let remaining = request.remaining_time_ms.map(Duration::from_millis);
        let bot = self.clone();
        let state = request.state.clone();

        let decision = tokio::task::spawn_blocking(move || bot.decide(&state, remaining))
            .await
            .map_err(|e| format!("Search task failed: {}", e))?;

        self.logger
            .log_decision(request.state, request.player, request.remaining_time_ms, &decision);

        Ok(decision.to_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Inventory;

    fn fast_config() -> Config {
        let mut config = Config::default_hardcoded();
        for step in config.depth.steps.iter_mut() {
            step.depth = step.depth.min(2);
        }
        config.depth.default_depth = 2;
        config.depth.emergency_depth = 1;
        config
    }

    #[test]
    fn test_opening_uses_book() {
        let bot = Bot::with_seed(fast_config(), 7);
        let state = GameState::new();
        let decision = bot.decide(&state, None);
        assert!(decision.opening);
        assert_eq!(decision.depth, 0);
        assert_eq!(decision.action, Some(bot.config().opening.book[0]));
    }

    #[test]
    fn test_opening_without_book_places_city() {
        let mut config = fast_config();
        config.opening.book.clear();
        for seed in 0..5 {
            let bot = Bot::with_seed(config.clone(), seed);
            let decision = bot.decide(&GameState::new(), None);
            assert!(decision.opening);
            assert!(decision.action.map_or(false, |a| a.is_city()));
            assert_eq!(decision.stats, SearchStats::default());
        }
    }

    #[test]
    fn test_search_after_opening() {
        let bot = Bot::with_seed(fast_config(), 1);
        let first = GameState::new();
        let opened = bot.compute_action(&first, None).map(|h| h.next_state());
        let second = opened.expect("white has a legal opening");
        // Black is untouched too and opens
        let third = bot.compute_action(&second, None).map(|h| h.next_state()).unwrap();
        assert_ne!(third.inventory(Player::White), &Inventory::starting());

        let decision = bot.decide(&third, Some(Duration::from_secs(600)));
        assert!(!decision.opening);
        assert!(decision.depth >= 1);
        assert!(decision.action.map_or(false, |a| third.is_legal(&a)));
        assert!(decision.stats.nodes > 0);
    }
}
