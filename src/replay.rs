// Decision replay
//
// Feeds every position of a decision log back through a bot built from the
// current weights and reports where the new choice differs from the logged one.

use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use crate::bot::Bot;
use crate::config::Config;
pub use crate::debug_logger::LogEntry;
use crate::types::LightAction;

/// Result of replaying a single decision
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub step: u32,
    pub original_action: Option<LightAction>,
    pub replayed_action: Option<LightAction>,
    pub matches: bool,
    pub original_value: f64,
    pub replayed_value: f64,
    pub search_depth: u32,
    pub computation_time_ms: u128,
}

/// Aggregates over a set of replayed decisions
#[derive(Debug, Default, PartialEq)]
pub struct ReplayStats {
    pub total_steps: usize,
    pub matches: usize,
    pub match_rate: f64,
    /// Averages over the decisions that ran a search
    pub avg_depth: f64,
    pub avg_time_ms: f64,
}

impl ReplayStats {
    pub fn from_results(results: &[ReplayResult]) -> Self {
        let total_steps = results.len();
        if total_steps == 0 {
            return ReplayStats::default();
        }
        let matches = results.iter().filter(|r| r.matches).count();

        let searched: Vec<&ReplayResult> = results.iter().filter(|r| r.search_depth > 0).collect();
        let (avg_depth, avg_time_ms) = if searched.is_empty() {
            (0.0, 0.0)
        } else {
            let n = searched.len() as f64;
            (
                searched.iter().map(|r| r.search_depth as f64).sum::<f64>() / n,
                searched.iter().map(|r| r.computation_time_ms as f64).sum::<f64>() / n,
            )
        };

        ReplayStats {
            total_steps,
            matches,
            match_rate: 100.0 * matches as f64 / total_steps as f64,
            avg_depth,
            avg_time_ms,
        }
    }

    pub fn mismatches(&self) -> usize {
        self.total_steps - self.matches
    }
}

/// Replay engine for analyzing decision logs
pub struct ReplayEngine {
    bot: Bot,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a new replay engine with the given configuration
    pub fn new(config: Config, verbose: bool) -> Self {
        ReplayEngine {
            bot: Bot::new(config),
            verbose,
        }
    }

    /// Reads a JSONL decision log; blank lines are skipped
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<LogEntry>, String> {
        let path = log_path.as_ref();
        let file = File::open(path).map_err(|e| format!("Cannot open {}: {}", path.display(), e))?;

        let entries = BufReader::new(file)
            .lines()
            .enumerate()
            .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
            .map(|(i, line)| {
                let line = line.map_err(|e| format!("Line {}: {}", i + 1, e))?;
                serde_json::from_str::<LogEntry>(&line).map_err(|e| format!("Line {}: {}", i + 1, e))
            })
            .collect::<Result<Vec<_>, String>>()?;

        info!("Loaded {} decisions from {}", entries.len(), path.display());
        Ok(entries)
    }

    /// Replays a single log entry and compares the result
    ///
    /// Opening moves are picked at random, so any city placement counts as a
    /// match for them.
    pub fn replay_entry(&self, entry: &LogEntry) -> Result<ReplayResult, String> {
        if entry.state.to_move() != entry.player {
            return Err(format!(
                "Step {}: logged player {} is not the player to move",
                entry.step,
                entry.player.as_str()
            ));
        }

        if self.verbose {
            info!("Replaying step {}...", entry.step);
        }

        let remaining = entry.remaining_time_ms.map(Duration::from_millis);
        let decision = self.bot.decide(&entry.state, remaining);

        let matches = if entry.opening && decision.opening {
            entry.action.map_or(false, |a| a.is_city()) && decision.action.map_or(false, |a| a.is_city())
        } else {
            entry.action == decision.action
        };

        let result = ReplayResult {
            step: entry.step,
            original_action: entry.action,
            replayed_action: decision.action,
            matches,
            original_value: entry.value,
            replayed_value: decision.value,
            search_depth: decision.depth,
            computation_time_ms: decision.elapsed.as_millis(),
        };

        if self.verbose {
            if matches {
                info!(
                    "Step {}: ✓ MATCH - {} (value: {:.2}, depth: {}, time: {}ms)",
                    entry.step,
                    describe(result.replayed_action),
                    result.replayed_value,
                    result.search_depth,
                    result.computation_time_ms
                );
            } else {
                warn!(
                    "Step {}: ✗ MISMATCH - Original: {}, Replayed: {} (value: {:.2}, depth: {}, time: {}ms)",
                    entry.step,
                    describe(result.original_action),
                    describe(result.replayed_action),
                    result.replayed_value,
                    result.search_depth,
                    result.computation_time_ms
                );
            }
        }

        Ok(result)
    }

    /// Replays all entries in a log file
    pub fn replay_all(&self, entries: &[LogEntry]) -> Vec<ReplayResult> {
        let mut results = Vec::new();

        for entry in entries {
            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay step {}: {}", entry.step, e);
                }
            }
        }

        results
    }

    /// Replays specific steps from a log file
    pub fn replay_steps(&self, entries: &[LogEntry], steps: &[u32]) -> Result<Vec<ReplayResult>, String> {
        let mut results = Vec::new();

        for step in steps {
            let entry = entries
                .iter()
                .find(|e| e.step == *step)
                .ok_or_else(|| format!("Step {} not found in log file", step))?;

            results.push(self.replay_entry(entry)?);
        }

        Ok(results)
    }

    /// Match rate, depth and timing summary followed by every mismatch
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = ReplayStats::from_results(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Decisions:      {}", stats.total_steps);
        println!("Matches:        {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:     {}", stats.mismatches());
        println!("Avg depth:      {:.1}", stats.avg_depth);
        println!("Avg time:       {:.1}ms", stats.avg_time_ms);
        println!("═══════════════════════════════════════════════════════════\n");

        for result in results.iter().filter(|r| !r.matches) {
            println!(
                "Step {:>2}: {} -> {} (value {:.2} -> {:.2}, depth {})",
                result.step,
                describe(result.original_action),
                describe(result.replayed_action),
                result.original_value,
                result.replayed_value,
                result.search_depth
            );
        }
    }
}

fn describe(action: Option<LightAction>) -> String {
    action.map_or_else(|| "pass".to_string(), |a| a.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::Decision;
    use crate::game::GameState;
    use crate::search::SearchStats;
    use crate::types::{Color, Coord, Player};

    fn opening_entry(action: LightAction) -> LogEntry {
        let decision = Decision {
            action: Some(action),
            value: 0.0,
            depth: 0,
            candidates: 0,
            stats: SearchStats::default(),
            opening: true,
            elapsed: Duration::from_millis(1),
        };
        LogEntry::new(GameState::new(), Player::White, Some(900_000), &decision)
    }

    #[test]
    fn test_any_city_opening_matches() {
        let engine = ReplayEngine::new(Config::default_hardcoded(), false);
        let entry = opening_entry(LightAction::City {
            color: Color::Green,
            at: Coord::new(3, 2),
        });
        let result = engine.replay_entry(&entry).unwrap();
        assert!(result.matches);
        assert_eq!(result.search_depth, 0);
    }

    #[test]
    fn test_resource_opening_is_a_mismatch() {
        let engine = ReplayEngine::new(Config::default_hardcoded(), false);
        let entry = opening_entry(LightAction::Resource {
            color: Color::Green,
            at: Coord::new(4, 4),
        });
        assert!(!engine.replay_entry(&entry).unwrap().matches);
    }

    #[test]
    fn test_wrong_player_is_rejected() {
        let engine = ReplayEngine::new(Config::default_hardcoded(), false);
        let mut entry = opening_entry(LightAction::City {
            color: Color::Red,
            at: Coord::new(6, 5),
        });
        entry.player = Player::Black;
        assert!(engine.replay_entry(&entry).is_err());
    }

    fn result(step: u32, matches: bool, depth: u32, ms: u128) -> ReplayResult {
        ReplayResult {
            step,
            original_action: None,
            replayed_action: None,
            matches,
            original_value: 0.0,
            replayed_value: 0.0,
            search_depth: depth,
            computation_time_ms: ms,
        }
    }

    #[test]
    fn test_stats_average_only_searched_steps() {
        let results = vec![result(0, true, 0, 1), result(2, false, 4, 30), result(4, true, 6, 50)];
        let stats = ReplayStats::from_results(&results);
        assert_eq!(stats.total_steps, 3);
        assert_eq!(stats.mismatches(), 1);
        assert_eq!(stats.avg_depth, 5.0);
        assert_eq!(stats.avg_time_ms, 40.0);
        assert_eq!(ReplayStats::from_results(&[]), ReplayStats::default());
    }

    #[test]
    fn test_log_entry_json_round_trip() {
        let entry = opening_entry(LightAction::City {
            color: Color::Red,
            at: Coord::new(6, 5),
        });
        let line = serde_json::to_string(&entry).unwrap();
        let back: LogEntry = serde_json::from_str(&line).unwrap();
        assert_eq!(back.state, entry.state);
        assert_eq!(back.action, entry.action);
        assert!(back.opening);
    }
}
