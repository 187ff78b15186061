//! Replays one conversation from a simulation log.
//!
//! Usage: `belief_replay <log_file> <conversation_number> [--delay SECS]`

use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process;
use tracing::error;

use belief_replay::{delay_from_secs, load, replay, select, ReplayError, DEFAULT_DELAY_SECS};

#[derive(Parser, Debug)]
#[command(name = "belief_replay")]
#[command(version)]
#[command(about = "Replay a conversation from a belief simulation log", long_about = None)]
struct Args {
    /// Simulation log file
    log_file: PathBuf,

    /// Conversation (iteration) number, 1-based
    conversation: u32,

    /// Seconds between messages
    #[arg(short, long, default_value_t = DEFAULT_DELAY_SECS)]
    delay: f64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(&args) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), ReplayError> {
    let delay = delay_from_secs(args.delay)?;

    println!("Parsing log file: {}", args.log_file.display());
    let log = load(&args.log_file)?;
    println!("Found {} conversations.", log.iterations.len());
    if !log.is_complete() {
        println!("Note: this run did not complete.");
    }

    let iteration = select(&log, args.conversation)?;
    println!("Delay: {}s between messages\n", args.delay);

    let stdout = io::stdout();
    replay(&mut stdout.lock(), iteration, delay)?;
    println!("\nReplay complete.");
    Ok(())
}
