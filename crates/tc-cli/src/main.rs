//! TopCal CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use tc_core::Event;
use tc_reco::{run_parallel, Analysis, AnalysisArtifact, AnalysisConfig};

#[derive(Parser)]
#[command(name = "topcal")]
#[command(about = "TopCal - hadronic top reconstruction and jet response calibration")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct events and reduce the calibration artifact
    Run {
        /// Input event file (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the artifact (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Analysis configuration (JSON). Defaults apply when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the matching ΔR threshold
        #[arg(long)]
        delta_r_max: Option<f64>,

        /// Override the anchor b-jet pT threshold (GeV)
        #[arg(long)]
        anchor_pt_min: Option<f64>,

        /// Threads (0 = auto). Use 1 for deterministic sequential processing.
        #[arg(long, default_value = "1")]
        threads: usize,
    },
}

/// On-disk event record: the collections the event source hands the core.
#[derive(Debug, Deserialize)]
struct EventFile {
    events: Vec<Event>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match cli.command {
        Commands::Run { input, output, config, delta_r_max, anchor_pt_min, threads } => cmd_run(
            &input,
            output.as_deref(),
            config.as_deref(),
            delta_r_max,
            anchor_pt_min,
            threads,
        ),
    }
}

fn load_config(
    path: Option<&Path>,
    delta_r_max: Option<f64>,
    anchor_pt_min: Option<f64>,
) -> Result<AnalysisConfig> {
    let mut config = match path {
        Some(path) => AnalysisConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(dr) = delta_r_max {
        config.delta_r_max = dr;
    }
    if let Some(pt) = anchor_pt_min {
        config.anchor_pt_min = pt;
    }
    config.validate().context("invalid analysis configuration")?;
    Ok(config)
}

fn load_events(path: &Path) -> Result<Vec<Event>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read event file {}", path.display()))?;
    let file: EventFile = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse event file {}", path.display()))?;
    Ok(file.events)
}

fn cmd_run(
    input: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
    delta_r_max: Option<f64>,
    anchor_pt_min: Option<f64>,
    threads: usize,
) -> Result<()> {
    let config = load_config(config_path, delta_r_max, anchor_pt_min)?;

    tracing::info!(path = %input.display(), "loading events");
    let events = load_events(input)?;
    tracing::info!(n_events = events.len(), "events loaded");

    let analysis = if threads == 1 {
        let mut analysis = Analysis::new(config)?;
        for (idx, event) in events.iter().enumerate() {
            analysis.process(event);
            if (idx + 1) % 1000 == 0 {
                tracing::info!(processed = idx + 1, total = events.len(), "processing");
            }
        }
        analysis
    } else {
        let _ = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global();
        run_parallel(&config, &events)?
    };

    let artifact = analysis.finalize();
    tracing::info!(n_events = artifact.meta.n_events, "reconstruction complete");
    write_artifact(&artifact, output)
}

fn write_artifact(artifact: &AnalysisArtifact, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(artifact)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write artifact to {}", path.display()))?;
            tracing::info!(path = %path.display(), "artifact written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
