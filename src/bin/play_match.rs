// Plays one local Divercite match between two configured agents
//
// Usage:
//   cargo run --release --bin play_match -- <name1> <name2> [options]
//
// Options:
//   --params1 <json>       Weight overrides for the first (white) agent
//   --params2 <json>       Weight overrides for the second (black) agent
//   --config <path>        Base configuration (default: Divercite.toml)
//   --time-ms <n>          Match clock per player (default: from config)
//   --seed <n>             Seed for the random openings
//
// Two equal names play the agent against itself as <name>_1 and <name>_2.
//
// The last lines of stdout are the summary scraped by the runner:
//   Score - <name>: <points>
//   Time - <name>: <seconds>
//   Reason - <why the match ended>
//   Winner - <name|draw>

use std::env;
use std::process;
use std::time::{Duration, Instant};

use divercite_agent::arena::{Arena, Contender};
use divercite_agent::bot::Bot;
use divercite_agent::config::Config;
use divercite_agent::simple_profiler;
use divercite_agent::tournament::seat_names;

fn print_usage() {
    eprintln!("Divercite Match Tool");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  play_match <name1> <name2> [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --params1 <json>    Weight overrides for <name1>, e.g. '{{\"THRESHOLD\": 30}}'");
    eprintln!("  --params2 <json>    Weight overrides for <name2>");
    eprintln!("  --config <path>     Path to Divercite.toml (default: Divercite.toml)");
    eprintln!("  --time-ms <n>       Match clock per player in milliseconds");
    eprintln!("  --seed <n>          Seed for the random openings");
    eprintln!("  --help              Show this help message");
}

struct Options {
    names: [String; 2],
    params: [Option<String>; 2],
    config_path: String,
    time_ms: Option<u64>,
    seed: Option<u64>,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    if args.len() < 3 {
        return Err("Expected two agent names".to_string());
    }

    let mut options = Options {
        names: seat_names(&args[1], &args[2]),
        params: [None, None],
        config_path: "Divercite.toml".to_string(),
        time_ms: None,
        seed: None,
    };

    let mut i = 3;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args
            .get(i + 1)
            .ok_or_else(|| format!("{} requires an argument", flag))?;
        match flag {
            "--params1" => options.params[0] = Some(value.clone()),
            "--params2" => options.params[1] = Some(value.clone()),
            "--config" => options.config_path = value.clone(),
            "--time-ms" => {
                options.time_ms =
                    Some(value.parse().map_err(|e| format!("Invalid --time-ms '{}': {}", value, e))?)
            }
            "--seed" => {
                options.seed = Some(value.parse().map_err(|e| format!("Invalid --seed '{}': {}", value, e))?)
            }
            _ => return Err(format!("Unknown option '{}'", flag)),
        }
        i += 2;
    }

    Ok(options)
}

fn build_bot(base: &Config, params: &Option<String>, seed: Option<u64>) -> Result<Bot, String> {
    let mut config = base.clone();
    if let Some(json) = params {
        let overrides = Config::parse_overrides(json)?;
        config.apply_overrides(&overrides)?;
    }
    Ok(match seed {
        Some(seed) => Bot::with_seed(config, seed),
        None => Bot::new(config),
    })
}

fn run(options: Options) -> Result<(), String> {
    let base = Config::from_file(&options.config_path).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from '{}': {}", options.config_path, e);
        eprintln!("Using default configuration");
        Config::default_hardcoded()
    });

    let white = Contender::new(
        options.names[0].clone(),
        build_bot(&base, &options.params[0], options.seed)?,
    );
    let black = Contender::new(
        options.names[1].clone(),
        build_bot(&base, &options.params[1], options.seed.map(|s| s.wrapping_add(1)))?,
    );

    let budget = Duration::from_millis(options.time_ms.unwrap_or(base.timing.match_time_budget_ms));
    let arena = Arena::new(budget);

    simple_profiler::reset();
    let start = Instant::now();
    let result = arena.play(&white, &black);
    simple_profiler::print_report(start.elapsed().as_millis() as u64);

    for line in result.summary_lines() {
        println!("{}", line);
    }
    Ok(())
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

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = run(options) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
