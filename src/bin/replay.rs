// Re-runs the decisions of a Divercite decision log with the current weights
//
// Usage:
//   cargo run --release --bin replay -- <log_file> (--all | --steps <s1,s2>) [options]
//
// Options:
//   --verbose              One line per replayed step
//   --config <path>        Weights to replay with (default: Divercite.toml)

use std::env;
use std::process;

use divercite_agent::config::Config;
use divercite_agent::replay::ReplayEngine;

fn print_usage() {
    eprintln!("Divercite Replay Tool");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  replay <log_file> (--all | --steps <S1,S2,...>) [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --verbose           One line per replayed step");
    eprintln!("  --config <path>     Path to Divercite.toml (default: Divercite.toml)");
    eprintln!("  --help              Show this help message");
    eprintln!();
    eprintln!("EXAMPLES:");
    eprintln!("  replay divercite_debug.jsonl --all");
    eprintln!("  replay divercite_debug.jsonl --steps 4,10,22 --verbose");
}

enum Selection {
    All,
    Steps(Vec<u32>),
}

struct Options {
    log_file: String,
    selection: Selection,
    config_path: String,
    verbose: bool,
}

fn parse_steps(list: &str) -> Result<Vec<u32>, String> {
    list.split(',')
        .map(|t| {
            t.trim()
                .parse::<u32>()
                .map_err(|e| format!("Invalid step '{}': {}", t, e))
        })
        .collect()
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let log_file = args.get(1).ok_or("Expected a log file")?.clone();
    let mut selection = None;
    let mut config_path = "Divercite.toml".to_string();
    let mut verbose = false;

    let mut rest = args.iter().skip(2);
    while let Some(flag) = rest.next() {
        match flag.as_str() {
            "--all" => selection = Some(Selection::All),
            "--verbose" => verbose = true,
            "--steps" => {
                let list = rest.next().ok_or("--steps requires an argument")?;
                selection = Some(Selection::Steps(parse_steps(list)?));
            }
            "--config" => {
                config_path = rest.next().ok_or("--config requires an argument")?.clone();
            }
            other => return Err(format!("Unknown option '{}'", other)),
        }
    }

    Ok(Options {
        log_file,
        selection: selection.ok_or("Pass --all or --steps")?,
        config_path,
        verbose,
    })
}

fn run(options: Options) -> Result<(), String> {
    let config = Config::from_file(&options.config_path).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from '{}': {}", options.config_path, e);
        eprintln!("Using default configuration");
        Config::default_hardcoded()
    });

    let engine = ReplayEngine::new(config, options.verbose);
    let entries = engine.load_log_file(&options.log_file)?;
    if entries.is_empty() {
        return Err(format!("{} holds no decisions", options.log_file));
    }

    let results = match options.selection {
        Selection::All => {
            println!("Replaying {} decisions from {}\n", entries.len(), options.log_file);
            engine.replay_all(&entries)
        }
        Selection::Steps(steps) => {
            println!("Replaying steps {:?} from {}\n", steps, options.log_file);
            engine.replay_steps(&entries, &steps)?
        }
    };

    engine.print_report(&results);
    Ok(())
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--help") {
        print_usage();
        process::exit(0);
    }

    let outcome = parse_args(&args).and_then(run);
    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        print_usage();
        process::exit(1);
    }
}
