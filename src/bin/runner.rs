// Benchmark runner: plays a batch of matches between two agents in parallel
//
// Usage:
//   cargo run --release --bin runner -- <name1> [<name2>] [options]
//
// With one name (or the same name twice) the agent plays itself as
// <name>_1 and <name>_2.
//
// Options:
//   --params1 <json>       Weight overrides for the first agent
//   --params2 <json>       Weight overrides for the second agent
//   --games <n>            Number of games, half with sides swapped (default: 6)
//   --workers <n>          Parallel matches (default: number of CPUs)
//   --config <path>        Base configuration passed to every match
//   --time-ms <n>          Match clock per player
//   --binary <path>        play_match executable (default: next to this binary)

use std::env;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use divercite_agent::tournament::{self, AgentSpec, RunnerOptions};

fn print_usage() {
    eprintln!("Divercite Benchmark Runner");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  runner <name1> [<name2>] [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --params1 <json>    Weight overrides for <name1>");
    eprintln!("  --params2 <json>    Weight overrides for <name2>");
    eprintln!("  --games <n>         Number of games (default: 6)");
    eprintln!("  --workers <n>       Parallel matches (default: number of CPUs)");
    eprintln!("  --config <path>     Base configuration for every match");
    eprintln!("  --time-ms <n>       Match clock per player in milliseconds");
    eprintln!("  --binary <path>     play_match executable");
    eprintln!("  --help              Show this help message");
}

fn default_binary() -> PathBuf {
    let name = format!("play_match{}", env::consts::EXE_SUFFIX);
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(&name)))
        .unwrap_or_else(|| PathBuf::from(name))
}

fn parse_args(args: &[String]) -> Result<(AgentSpec, AgentSpec, RunnerOptions), String> {
    let first = args.get(1).filter(|a| !a.starts_with("--")).ok_or("Expected an agent name")?;
    // A single name, or the same name twice, benchmarks the agent against itself
    let (second, mut i) = match args.get(2).filter(|a| !a.starts_with("--")) {
        Some(name) => (name, 3),
        None => (first, 2),
    };
    let [name_a, name_b] = tournament::seat_names(first, second);

    let mut a = AgentSpec {
        name: name_a,
        params: None,
    };
    let mut b = AgentSpec {
        name: name_b,
        params: None,
    };
    let mut options = RunnerOptions {
        binary: default_binary(),
        games: 6,
        workers: rayon::current_num_threads(),
        config: None,
        time_ms: None,
    };

    while i < args.len() {
        let flag = args[i].as_str();
        let value = args
            .get(i + 1)
            .ok_or_else(|| format!("{} requires an argument", flag))?;
        let count = || -> Result<usize, String> {
            value
                .parse::<usize>()
                .map_err(|e| format!("Invalid {} '{}': {}", flag, value, e))
        };
        match flag {
            "--params1" => a.params = Some(value.clone()),
            "--params2" => b.params = Some(value.clone()),
            "--games" => options.games = count()?,
            "--workers" => options.workers = count()?,
            "--config" => options.config = Some(PathBuf::from(value)),
            "--time-ms" => options.time_ms = Some(count()? as u64),
            "--binary" => options.binary = PathBuf::from(value),
            _ => return Err(format!("Unknown option '{}'", flag)),
        }
        i += 2;
    }

    Ok((a, b, options))
}

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--help") {
        print_usage();
        process::exit(0);
    }

    let (a, b, options) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            process::exit(1);
        }
    };

    println!("\n═══════════════════════════════════════════════════════════");
    println!("                 DIVERCITE BENCHMARK");
    println!("═══════════════════════════════════════════════════════════");
    println!("Agents:   {} vs {}", a.name, b.name);
    println!("Games:    {} ({} workers)", options.games, options.workers);
    println!("Binary:   {}", options.binary.display());
    println!("═══════════════════════════════════════════════════════════\n");

    let start = Instant::now();
    match tournament::run_benchmark(&options, &a, &b) {
        Ok(records) => tournament::print_report(&records, start.elapsed()),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
