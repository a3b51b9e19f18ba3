// Local match arena
//
// Plays a whole game between two configured bots in-process, each with its own
// match clock. A player forfeits by running out of clock, by passing, or by
// answering with an illegal action.

use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::bot::Bot;
use crate::game::{GameState, Outcome};
use crate::simple_profiler;
use crate::types::{LightAction, Player};

/// A named bot taking part in a match
pub struct Contender {
    pub name: String,
    pub bot: Bot,
}

impl Contender {
    pub fn new(name: impl Into<String>, bot: Bot) -> Self {
        Contender {
            name: name.into(),
            bot,
        }
    }
}

/// Why a match stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndReason {
    Completed,
    Timeout(Player),
    NoAction(Player),
    IllegalAction(Player),
}

impl EndReason {
    /// The player who lost by forfeit, if any
    pub fn forfeited_by(&self) -> Option<Player> {
        match *self {
            EndReason::Completed => None,
            EndReason::Timeout(p) | EndReason::NoAction(p) | EndReason::IllegalAction(p) => Some(p),
        }
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::Completed => write!(f, "completed"),
            EndReason::Timeout(p) => write!(f, "{} ran out of time", p.as_str()),
            EndReason::NoAction(p) => write!(f, "{} had no action", p.as_str()),
            EndReason::IllegalAction(p) => write!(f, "{} played an illegal action", p.as_str()),
        }
    }
}

/// Outcome of one arena match, indexed by `Player::index()`
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub names: [String; 2],
    pub scores: [i32; 2],
    pub times: [Duration; 2],
    pub outcome: Outcome,
    pub moves: Vec<LightAction>,
    pub reason: EndReason,
}

impl MatchResult {
    pub fn winner_name(&self) -> Option<&str> {
        match self.outcome {
            Outcome::Winner(p) => Some(&self.names[p.index()]),
            Outcome::Draw => None,
        }
    }

    /// Machine-readable summary scraped by the benchmark runner
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for p in Player::all().iter() {
            lines.push(format!("Score - {}: {}", self.names[p.index()], self.scores[p.index()]));
        }
        for p in Player::all().iter() {
            lines.push(format!(
                "Time - {}: {:.3}",
                self.names[p.index()],
                self.times[p.index()].as_secs_f64()
            ));
        }
        lines.push(format!("Reason - {}", self.reason));
        lines.push(format!("Winner - {}", self.winner_name().unwrap_or("draw")));
        lines
    }
}

pub struct Arena {
    time_budget: Duration,
}

impl Arena {
    pub fn new(time_budget: Duration) -> Self {
        Arena { time_budget }
    }

    /// Plays `white` against `black` from the initial position
    pub fn play(&self, white: &Contender, black: &Contender) -> MatchResult {
        self.play_from(white, black, GameState::new())
    }

    /// Plays from an arbitrary position; the clocks start full
    pub fn play_from(&self, white: &Contender, black: &Contender, mut state: GameState) -> MatchResult {
        let contenders = [white, black];
        let mut used = [Duration::ZERO; 2];
        let mut moves = Vec::new();
        let mut reason = EndReason::Completed;

        info!("Match: {} (white) vs {} (black)", white.name, black.name);

        while !state.is_terminal() {
            let player = state.to_move();
            let seat = player.index();
            let remaining = self.time_budget.saturating_sub(used[seat]);

            let decision = contenders[seat].bot.decide(&state, Some(remaining));
            used[seat] += decision.elapsed;

            if used[seat] >= self.time_budget {
                warn!("{} used up the {}ms budget", contenders[seat].name, self.time_budget.as_millis());
                reason = EndReason::Timeout(player);
                break;
            }

            let action = match decision.action {
                Some(action) => action,
                None => {
                    reason = EndReason::NoAction(player);
                    break;
                }
            };

            if !state.is_legal(&action) {
                warn!("{} chose illegal action {}", contenders[seat].name, action);
                reason = EndReason::IllegalAction(player);
                break;
            }

            debug!(
                "Step {}: {} plays {} ({}ms)",
                state.step(),
                contenders[seat].name,
                action,
                decision.elapsed.as_millis()
            );
            state = state.heavy(action).next_state();
            moves.push(action);
        }

        simple_profiler::merge_thread_local();

        let outcome = match reason.forfeited_by() {
            Some(loser) => Outcome::Winner(loser.opponent()),
            None => state.leader(),
        };

        let result = MatchResult {
            names: [white.name.clone(), black.name.clone()],
            scores: state.scores(),
            times: used,
            outcome,
            moves,
            reason,
        };

        info!(
            "Match over after {} moves: {} ({})",
            result.moves.len(),
            result.winner_name().unwrap_or("draw"),
            result.reason
        );

        result
    }
}
