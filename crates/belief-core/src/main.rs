//! Belief Simulation Runner
//!
//! Runs one simulation against an Ollama server (or the offline echo
//! collaborator), streaming the conversations to the console and writing the
//! full log plus a JSON summary.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info};

use belief_core::config::{default_config_toml, DEFAULT_CONFIG_PATH};
use belief_core::display::{belief_listing, belief_map};
use belief_core::{
    BeliefCatalog, ConversationCollaborator, Dialogue, EchoCollaborator, LayoutKind,
    OllamaBackend, Result, RunObserver, SimConfig, SimulationEngine, Topology,
};
use belief_events::{ChangeType, IterationRecord, LogWriter, Participant, TranscriptEntry};

#[derive(Parser, Debug)]
#[command(name = "belief_sim")]
#[command(version)]
#[command(about = "Agentic belief propagation simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a simulation
    Run(RunArgs),

    /// Print the default configuration file
    DefaultConfig,

    /// Print the connectivity report of the configured layout
    Topology(Overrides),
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    overrides: Overrides,

    /// Use the offline echo collaborator instead of the chat backend
    #[arg(long)]
    dry_run: bool,

    /// Do not stream conversation messages to the console
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Config file plus per-field overrides.
#[derive(Args, Debug)]
struct Overrides {
    /// Configuration file (TOML); `belief_sim.toml` is used when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Topology: grid4, grid8, ring, mesh or star
    #[arg(short, long)]
    layout: Option<LayoutKind>,

    /// Agent count for ring, mesh and star
    #[arg(short, long)]
    agents: Option<usize>,

    /// Side length for grid layouts
    #[arg(long)]
    grid_size: Option<usize>,

    /// Exchanges per conversation
    #[arg(long)]
    rounds: Option<u32>,

    /// Number of conversations
    #[arg(short, long)]
    iterations: Option<u32>,

    /// Random seed for reproducibility
    #[arg(long, conflicts_with = "no_seed")]
    seed: Option<u64>,

    /// Seed from the OS (non-reproducible run)
    #[arg(long)]
    no_seed: bool,

    /// Belief catalog (JSON)
    #[arg(short, long)]
    beliefs: Option<PathBuf>,

    /// Directory for simulation logs
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Chat model name
    #[arg(short, long)]
    model: Option<String>,

    /// Ollama server URL
    #[arg(long)]
    host: Option<String>,
}

impl Overrides {
    fn load(&self) -> Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                SimConfig::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => SimConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut SimConfig) {
        if let Some(layout) = self.layout {
            config.layout = layout;
        }
        if let Some(agents) = self.agents {
            config.agents = agents;
        }
        if let Some(grid_size) = self.grid_size {
            config.grid_size = grid_size;
        }
        if let Some(rounds) = self.rounds {
            config.rounds = rounds;
        }
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if self.no_seed {
            config.seed = None;
        } else if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(beliefs) = &self.beliefs {
            config.beliefs_file = beliefs.clone();
        }
        if let Some(log_dir) = &self.log_dir {
            config.log_dir = log_dir.clone();
        }
        if let Some(model) = &self.model {
            config.backend.model = model.clone();
        }
        if let Some(host) = &self.host {
            config.backend.host = host.clone();
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let verbose = matches!(&cli.command, Commands::Run(args) if args.verbose);
    init_tracing(verbose);

    let result = match cli.command {
        Commands::Run(args) => cmd_run(&args),
        Commands::DefaultConfig => {
            print!("{}", default_config_toml());
            Ok(())
        }
        Commands::Topology(overrides) => cmd_topology(&overrides),
    };

    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let log_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_run(args: &RunArgs) -> Result<()> {
    let config = args.overrides.load()?;
    config.validate()?;
    let catalog = BeliefCatalog::load(&config.beliefs_file)?;
    info!(path = %config.beliefs_file.display(), beliefs = catalog.len(), "catalog loaded");

    if args.dry_run {
        run_with(&config, catalog, EchoCollaborator::new(), args.quiet)
    } else {
        let backend = OllamaBackend::new(
            &config.backend.host,
            config.backend.model.clone(),
            config.backend.timeout(),
        )?;
        run_with(&config, catalog, Dialogue::new(backend), args.quiet)
    }
}

fn run_with<C: ConversationCollaborator>(
    config: &SimConfig,
    catalog: BeliefCatalog,
    collaborator: C,
    quiet: bool,
) -> Result<()> {
    let mut engine = SimulationEngine::new(config, catalog, collaborator)?;
    let mut log = LogWriter::create(&config.log_dir)?;

    let rule = "=".repeat(60);
    println!("{}", rule);
    println!("AGENTIC BELIEF PROPAGATION SIMULATION");
    println!("{}", rule);
    println!("Layout: {}", engine.topology().layout());
    println!("Conversation rounds: {}", config.rounds);
    println!("Simulation iterations: {}", config.iterations);
    println!("Model: {}", engine.collaborator().backend_id());
    if let Some(path) = log.path() {
        println!("Log file: {}", path.display());
    }
    match engine.seed() {
        Some(seed) => println!("Random seed: {} (reproducible)", seed),
        None => println!("Random seed: None (non-reproducible)"),
    }
    println!("{}", rule);

    println!("\nLoaded {} beliefs:", engine.catalog().len());
    for (i, belief) in engine.catalog().beliefs().iter().enumerate() {
        println!("  [{}] {}", i, preview(belief, 60));
    }
    println!("\nStarting beliefs:");
    print!("{}", belief_listing(engine.topology()));
    print!("{}", belief_map(engine.topology(), engine.catalog()));

    let mut console = Console {
        catalog: engine.catalog().clone(),
        total: config.iterations,
        quiet,
    };
    let summary = engine.run(&mut log, &mut console)?;

    println!("\n{}", rule);
    println!("SIMULATION COMPLETE");
    println!("{}", rule);
    println!("Total iterations: {}", summary.completed_iterations);
    println!("Belief changes detected: {}", summary.belief_changes);
    println!("Change rate: {:.1}%", summary.change_rate);
    println!("\nFinal beliefs:");
    print!("{}", belief_listing(engine.topology()));
    print!("{}", belief_map(engine.topology(), engine.catalog()));

    if let Some(path) = log.path() {
        let summary_path = path.with_extension("summary.json");
        summary.write_json(&summary_path)?;
        println!("\nFull log saved to: {}", path.display());
        println!("Summary saved to: {}", summary_path.display());
    }
    Ok(())
}

fn cmd_topology(overrides: &Overrides) -> Result<()> {
    let config = overrides.load()?;
    let topology = Topology::new(config.build_layout()?);
    print!("{}", topology.describe());
    println!("Edges: {}", topology.edges().len());
    Ok(())
}

/// Live console presentation of a run.
struct Console {
    catalog: BeliefCatalog,
    total: u32,
    quiet: bool,
}

impl RunObserver for Console {
    fn on_iteration_start(&mut self, iteration: u32, persuader: &Participant, defender: &Participant) {
        let rule = "=".repeat(60);
        println!("\n{}", rule);
        println!("ITERATION {}/{}", iteration, self.total);
        println!("{}", rule);
        println!("\nAgent {} (persuader) @ {}", persuader.agent_id, persuader.position);
        println!("  Belief: {}", preview(&persuader.belief, 50));
        println!("Agent {} (defender) @ {}", defender.agent_id, defender.position);
        println!("  Belief: {}", preview(&defender.belief, 50));
        if !self.quiet {
            println!("\n--- Conversation ---");
        }
    }

    fn on_message(&mut self, entry: &TranscriptEntry) {
        if !self.quiet {
            println!("[R{}] {}: {}", entry.round, entry.speaker.label(), preview(&entry.text, 100));
        }
    }

    fn on_iteration_end(&mut self, record: &IterationRecord, topology: &Topology) {
        println!("\n--- Defender's Decision ---");
        println!("Old belief: {}", preview(&record.decision.old_belief, 60));
        println!("New belief: {}", preview(&record.decision.new_belief, 60));
        match record.decision.change {
            ChangeType::Changed => println!(">>> BELIEF UPDATED!"),
            ChangeType::Similar => println!(">>> Belief rephrased but similar"),
            ChangeType::Unchanged => println!(">>> Belief unchanged"),
        }
        println!("\nCurrent beliefs (catalog indices, * = modified):");
        print!("{}", belief_map(topology, &self.catalog));
    }
}

/// First `max` characters of `text`, with an ellipsis when cut.
fn preview(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
