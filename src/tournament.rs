// Benchmark runner
//
// Runs `play_match` subprocesses in a rayon pool, scrapes their stdout for the
// summary lines and tabulates the results. Each game is an isolated process, so
// the only shared state is the result list.

use log::{info, warn};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};

/// One agent of the benchmark: a display name and optional weight overrides
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpec {
    pub name: String,
    /// JSON object of named constants, passed through to `play_match`
    pub params: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Path to the `play_match` executable
    pub binary: PathBuf,
    pub games: usize,
    pub workers: usize,
    pub config: Option<PathBuf>,
    pub time_ms: Option<u64>,
}

/// What one scraped match log says
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMatch {
    pub scores: HashMap<String, i32>,
    pub times: HashMap<String, f64>,
    /// `None` for a draw
    pub winner: Option<String>,
}

/// One game of the benchmark
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub index: usize,
    /// Names in seat order (white, black)
    pub seats: [String; 2],
    pub result: Result<ParsedMatch, String>,
}

/// Per-agent totals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tally {
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    pub total_score: i64,
    pub total_time: f64,
}

/// Display names for the two seats; an agent playing itself gets `_1` and `_2`
/// suffixes so the summary lines stay unambiguous
pub fn seat_names(first: &str, second: &str) -> [String; 2] {
    if first == second {
        [format!("{}_1", first), format!("{}_2", second)]
    } else {
        [first.to_string(), second.to_string()]
    }
}

/// Extracts score, time and winner lines from `play_match` output
///
/// Lines are scanned from the end so a summary printed after earlier noise
/// wins. Names are matched exactly against `names`.
pub fn parse_match_output(output: &str, names: &[String]) -> Result<ParsedMatch, String> {
    let mut scores = HashMap::new();
    let mut times = HashMap::new();
    let mut winner: Option<Option<String>> = None;

    for line in output.lines().rev() {
        let line = line.trim();
        if line.contains("ERROR") {
            warn!("{}", line);
        }

        if let Some(rest) = line.strip_prefix("Winner - ") {
            if winner.is_none() {
                let name = rest.trim();
                winner = Some(if name == "draw" { None } else { Some(name.to_string()) });
            }
        } else if let Some(rest) = line.strip_prefix("Score - ") {
            if let Some((name, value)) = split_named(rest, names) {
                let score = value
                    .parse::<i32>()
                    .map_err(|e| format!("Bad score for {}: {}", name, e))?;
                scores.entry(name).or_insert(score);
            }
        } else if let Some(rest) = line.strip_prefix("Time - ") {
            if let Some((name, value)) = split_named(rest, names) {
                let secs = value
                    .parse::<f64>()
                    .map_err(|e| format!("Bad time for {}: {}", name, e))?;
                times.entry(name).or_insert(secs);
            }
        }
    }

    let winner = winner.ok_or("No winner line in match output")?;
    for name in names {
        if !scores.contains_key(name) {
            return Err(format!("No score line for {}", name));
        }
        if !times.contains_key(name) {
            return Err(format!("No time line for {}", name));
        }
    }
    if let Some(w) = &winner {
        if !names.contains(w) {
            return Err(format!("Unknown winner {}", w));
        }
    }

    Ok(ParsedMatch {
        scores,
        times,
        winner,
    })
}

/// Splits `<name>: <value>` for one of the known names
fn split_named(rest: &str, names: &[String]) -> Option<(String, String)> {
    let (name, value) = rest.rsplit_once(':')?;
    let name = name.trim();
    names
        .iter()
        .find(|n| n.as_str() == name)
        .map(|n| (n.clone(), value.trim().to_string()))
}

/// Launches one `play_match` process and scrapes its stdout
pub fn play_game(options: &RunnerOptions, white: &AgentSpec, black: &AgentSpec) -> Result<ParsedMatch, String> {
    let mut command = Command::new(&options.binary);
    command.arg(&white.name).arg(&black.name);
    if let Some(params) = &white.params {
        command.arg("--params1").arg(params);
    }
    if let Some(params) = &black.params {
        command.arg("--params2").arg(params);
    }
    if let Some(config) = &options.config {
        command.arg("--config").arg(config);
    }
    if let Some(time_ms) = options.time_ms {
        command.arg("--time-ms").arg(time_ms.to_string());
    }

    let output = command
        .output()
        .map_err(|e| format!("Failed to launch {}: {}", options.binary.display(), e))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "play_match exited with {}: {}",
            output.status,
            stderr.lines().last().unwrap_or("")
        ));
    }

    parse_match_output(&stdout, &[white.name.clone(), black.name.clone()])
}

/// Plays `options.games` games between `a` and `b`, the second half with sides
/// swapped, on a pool of `options.workers` threads
pub fn run_benchmark(options: &RunnerOptions, a: &AgentSpec, b: &AgentSpec) -> Result<Vec<GameRecord>, String> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers.max(1))
        .build()
        .map_err(|e| format!("Failed to build worker pool: {}", e))?;

    let records = Mutex::new(Vec::with_capacity(options.games));
    let start = Instant::now();
    let first_half = options.games / 2 + options.games % 2;

    pool.install(|| {
        (0..options.games).into_par_iter().for_each(|index| {
            let (white, black) = if index < first_half { (a, b) } else { (b, a) };
            info!("Start game {} - {} vs {}", index, white.name, black.name);
            let result = play_game(options, white, black);
            if let Err(e) = &result {
                warn!("Game {} failed: {}", index, e);
            }
            records.lock().push(GameRecord {
                index,
                seats: [white.name.clone(), black.name.clone()],
                result,
            });
        });
    });

    info!("Benchmark complete in {:.2}s", start.elapsed().as_secs_f64());

    let mut records = records.into_inner();
    records.sort_by_key(|r| r.index);
    Ok(records)
}

/// Win/draw/loss totals per agent name over the successful games
pub fn tabulate(records: &[GameRecord]) -> HashMap<String, Tally> {
    let mut tallies: HashMap<String, Tally> = HashMap::new();

    for record in records {
        let parsed = match &record.result {
            Ok(parsed) => parsed,
            Err(_) => continue,
        };
        for name in record.seats.iter() {
            let tally = tallies.entry(name.clone()).or_default();
            match &parsed.winner {
                None => tally.draws += 1,
                Some(w) if w == name => tally.wins += 1,
                Some(_) => tally.losses += 1,
            }
            tally.total_score += parsed.scores.get(name).copied().unwrap_or(0) as i64;
            tally.total_time += parsed.times.get(name).copied().unwrap_or(0.0);
        }
    }

    tallies
}

/// Agent with the most wins and its win ratio over all games played
pub fn best_agent(records: &[GameRecord]) -> Option<(String, f64)> {
    let tallies = tabulate(records);
    let mut names: Vec<&String> = tallies.keys().collect();
    names.sort();
    let best = names.into_iter().max_by_key(|n| tallies[*n].wins)?;
    let played = records.len().max(1);
    Some((best.clone(), tallies[best].wins as f64 / played as f64))
}

/// Prints the per-game table and the standings
pub fn print_report(records: &[GameRecord], elapsed: Duration) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("                    GAME RESULTS");
    println!("═══════════════════════════════════════════════════════════");
    println!("{:<6} {:<22} {:>8} {:<22} {:>8}", "Game", "White", "Time", "Black", "Time");

    for record in records {
        match &record.result {
            Ok(parsed) => {
                let cell = |name: &String| {
                    let mark = if parsed.winner.as_ref() == Some(name) { "*" } else { " " };
                    format!("{}{} : {}", mark, name, parsed.scores.get(name).copied().unwrap_or(0))
                };
                let time = |name: &String| parsed.times.get(name).copied().unwrap_or(0.0);
                println!(
                    "{:<6} {:<22} {:>8.2} {:<22} {:>8.2}",
                    record.index,
                    cell(&record.seats[0]),
                    time(&record.seats[0]),
                    cell(&record.seats[1]),
                    time(&record.seats[1])
                );
            }
            Err(e) => println!("{:<6} N/A ({})", record.index, e),
        }
    }

    let tallies = tabulate(records);
    let mut names: Vec<&String> = tallies.keys().collect();
    names.sort();

    println!("═══════════════════════════════════════════════════════════");
    println!("                    STANDINGS");
    println!("═══════════════════════════════════════════════════════════");
    for name in names {
        let t = &tallies[name];
        let games = (t.wins + t.draws + t.losses).max(1) as f64;
        println!(
            "{:<22} W {:>3}  D {:>3}  L {:>3}  avg score {:>5.1}  avg time {:>7.2}s",
            name,
            t.wins,
            t.draws,
            t.losses,
            t.total_score as f64 / games,
            t.total_time / games
        );
    }

    let failed = records.iter().filter(|r| r.result.is_err()).count();
    if failed > 0 {
        println!("Failed games: {}", failed);
    }
    if let Some((name, ratio)) = best_agent(records) {
        println!("\nBest Agent: {}, Win Ratio: {:.2}", name, ratio);
    }
    println!("Total Time: {:.2}s", elapsed.as_secs_f64());
    println!("═══════════════════════════════════════════════════════════\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["alpha".to_string(), "beta".to_string()]
    }

    const OUTPUT: &str = "\
[INFO] Match: alpha (white) vs beta (black)
Score - alpha: 14
Score - beta: 11
Time - alpha: 3.250
Time - beta: 2.125
Reason - completed
Winner - alpha
";

    #[test]
    fn test_self_play_seats_are_suffixed() {
        assert_eq!(seat_names("alpha", "alpha"), ["alpha_1".to_string(), "alpha_2".to_string()]);
        assert_eq!(seat_names("alpha", "beta"), ["alpha".to_string(), "beta".to_string()]);

        let output = OUTPUT.replace("alpha", "alpha_1").replace("beta", "alpha_2");
        let seats = seat_names("alpha", "alpha");
        let parsed = parse_match_output(&output, &seats).unwrap();
        assert_eq!(parsed.scores["alpha_1"], 14);
        assert_eq!(parsed.scores["alpha_2"], 11);
        assert_eq!(parsed.winner.as_deref(), Some("alpha_1"));
    }

    #[test]
    fn test_parse_match_output() {
        let parsed = parse_match_output(OUTPUT, &names()).unwrap();
        assert_eq!(parsed.scores["alpha"], 14);
        assert_eq!(parsed.scores["beta"], 11);
        assert_eq!(parsed.times["beta"], 2.125);
        assert_eq!(parsed.winner.as_deref(), Some("alpha"));
    }

    #[test]
    fn test_parse_draw() {
        let output = OUTPUT.replace("Winner - alpha", "Winner - draw");
        let parsed = parse_match_output(&output, &names()).unwrap();
        assert_eq!(parsed.winner, None);
    }

    #[test]
    fn test_parse_missing_lines_is_an_error() {
        assert!(parse_match_output("Score - alpha: 3\nWinner - alpha", &names()).is_err());
        assert!(parse_match_output("", &names()).is_err());
        let unknown = OUTPUT.replace("Winner - alpha", "Winner - gamma");
        assert!(parse_match_output(&unknown, &names()).is_err());
    }

    #[test]
    fn test_tabulate_and_best_agent() {
        let parsed = parse_match_output(OUTPUT, &names()).unwrap();
        let records = vec![
            GameRecord {
                index: 0,
                seats: ["alpha".to_string(), "beta".to_string()],
                result: Ok(parsed.clone()),
            },
            GameRecord {
                index: 1,
                seats: ["beta".to_string(), "alpha".to_string()],
                result: Ok(ParsedMatch {
                    winner: None,
                    ..parsed
                }),
            },
            GameRecord {
                index: 2,
                seats: ["beta".to_string(), "alpha".to_string()],
                result: Err("crashed".to_string()),
            },
        ];

        let tallies = tabulate(&records);
        assert_eq!(tallies["alpha"].wins, 1);
        assert_eq!(tallies["alpha"].draws, 1);
        assert_eq!(tallies["beta"].losses, 1);
        assert_eq!(tallies["alpha"].total_score, 28);

        let (best, ratio) = best_agent(&records).unwrap();
        assert_eq!(best, "alpha");
        assert!((ratio - 1.0 / 3.0).abs() < 1e-9);
    }
}
