use clap::{Parser, Subcommand};
use partrack_core::{replay, EventOutput, ParticleTracker, Trace, TrackerConfig};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "partrack")]
#[command(about = "Particle genealogy and trajectory tracking for cascade simulations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded kernel traces through the tracker
    Replay {
        /// Trace files, replayed in order as consecutive batches
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Tracker configuration (TOML); defaults are used when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        /// Log level: error, warn, info, debug or trace
        #[arg(long, default_value = "info")]
        log_level: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            files,
            config,
            log_level,
        } => {
            init_logging(&log_level);
            if let Err(e) = run_replay(&files, config.as_deref()) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn init_logging(level: &str) {
    let level = level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .init();
}

fn run_replay(files: &[PathBuf], config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::default(),
    };
    let mut tracker = ParticleTracker::new(config)?;

    for file in files {
        info!(target: "partrack::cli", file = %file.display(), "replaying trace");
        let trace = Trace::load(file)?;
        let outputs = replay(&mut tracker, &trace)?;
        println!("{}: {} event(s)", file.display(), outputs.len());
        for (index, output) in outputs.iter().enumerate() {
            print_summary(index, output);
        }
    }

    println!("next track id offset = {}", tracker.offset());
    Ok(())
}

fn print_summary(index: usize, output: &EventOutput) {
    println!("event {}", index);
    println!("  particles = {}", output.particles.len());
    println!("  associations = {}", output.associations.len());
    println!("  dropped ancestry entries = {}", output.dropped_ancestry.len());
    if let Ok(dropped) = output.dropped_particles() {
        println!("  dropped particles = {}", dropped.len());
    }
    for (process, count) in &output.process_counters {
        println!("  {} = {}", process, count);
    }
    println!("  next offset = {}", output.next_offset);
    for diagnostic in output.diagnostics.iter() {
        println!("  {}", diagnostic);
    }
}
