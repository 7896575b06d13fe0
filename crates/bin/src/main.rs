//! Hobart CLI binary.
//!
//! Runs the sliding-window network analysis over a price table and writes
//! tables and per-window artifacts to an output directory.

use clap::{Parser, Subcommand};
use hobart::{Pipeline, PipelineConfig, PipelineError, load_market_data};
use hobart_data::Sector;
use hobart_network::GraphKind;
use hobart_output::{ExportDirectory, ExportFormat, ReportBuilder, WindowArtifact};
use hobart_risk::ShrinkageTarget;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "hobart")]
#[command(about = "Hobart: dynamic dependence networks for equity universes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analysis over a price table
    Run {
        /// Price table: header of names, a sector row, then dated prices
        #[arg(long)]
        input: PathBuf,

        /// Directory for tables and per-window artifacts
        #[arg(long)]
        output: PathBuf,

        /// JSON configuration file; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Rows per window
        #[arg(long)]
        window_size: Option<usize>,

        /// Rows between window starts
        #[arg(long)]
        stride: Option<usize>,

        /// Clustering restarts per window
        #[arg(long)]
        restarts: Option<usize>,

        /// Shrinkage target: identity, diagonal or constant_correlation
        #[arg(long)]
        shrinkage_target: Option<ShrinkageTarget>,

        /// Base seed for clustering restarts
        #[arg(long)]
        seed: Option<u64>,

        /// Rows after each window used for forward outcomes
        #[arg(long)]
        forward_horizon: Option<usize>,

        /// Skip writing per-window matrices
        #[arg(long)]
        no_artifacts: bool,

        /// Emit logs as JSON
        #[arg(long)]
        json_logs: bool,
    },

    /// List the sector labels accepted in price tables
    Sectors,

    /// Print the default configuration as JSON
    Config,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(json_logs: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(json_logs.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json_logs).then(|| fmt::layer().with_target(false).with_writer(std::io::stderr)))
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            output,
            config,
            window_size,
            stride,
            restarts,
            shrinkage_target,
            seed,
            forward_horizon,
            no_artifacts,
            json_logs,
        } => {
            init_logging(json_logs);

            let mut config = match config {
                Some(path) => PipelineConfig::from_path(path)?,
                None => PipelineConfig::default(),
            };
            if let Some(v) = window_size {
                config.window_size = v;
            }
            if let Some(v) = stride {
                config.stride = v;
            }
            if let Some(v) = restarts {
                config.restart_count = v;
            }
            if let Some(v) = shrinkage_target {
                config.shrinkage_target = v;
            }
            if let Some(v) = seed {
                config.seed = v;
            }
            if forward_horizon.is_some() {
                config.forward_horizon = forward_horizon;
            }

            run_analysis(&input, &output, config, !no_artifacts)?;
        }
        Commands::Sectors => list_all_sectors(),
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&PipelineConfig::default())?);
        }
    }

    Ok(())
}

fn run_analysis(
    input: &Path,
    output: &Path,
    config: PipelineConfig,
    write_artifacts: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = load_market_data(input)?;
    let pipeline = Pipeline::new(config)?;
    let window_count = pipeline.window_count(&data)?;

    let out = ExportDirectory::create(output)?;
    let artifacts = if write_artifacts {
        Some(out.subdirectory("windows")?)
    } else {
        None
    };

    let pb = ProgressBar::new(window_count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.set_message("Analysing windows...");

    let result = pipeline.run_with(&data, |window| {
        if let (Some(dir), Some(matrices)) = (&artifacts, &window.matrices) {
            for kind in GraphKind::all() {
                let artifact = WindowArtifact::new(
                    window.window.index,
                    &matrices.estimate,
                    matrices.networks.get(kind),
                );
                dir.write(&artifact.file_stem(), &artifact, ExportFormat::Json)
                    .map_err(PipelineError::from)?;
            }
        }
        pb.inc(1);
        Ok(())
    });
    pb.finish_and_clear();
    let result = result?;

    out.write("summary", &result.summary, ExportFormat::Csv)?;
    out.write("rank_correlations", &result.rank_correlations, ExportFormat::Csv)?;
    out.write("rank_correlations", &result.rank_correlations, ExportFormat::PrettyJson)?;
    out.write("sector_centrality", &result.sector_centralities, ExportFormat::Csv)?;
    for centrality in &result.centralities {
        out.write(&centrality.file_stem(), centrality, ExportFormat::Csv)?;
    }

    let report = ReportBuilder::new()
        .title(input.display().to_string())
        .window_count(result.window_count())
        .contents(&json!({
            "config": pipeline.config(),
            "instruments": result.universe.names(),
            "eigen_series": result.eigen_series,
            "partition_series": result.partition_series,
            "rank_correlations": result.rank_correlations,
        }))?
        .build();
    std::fs::write(out.path().join("report.json"), report.to_json()?)?;

    tracing::info!(path = %out.path().display(), "results written");

    print!("{}", result.summary.to_ascii_table());
    print!("{}", result.rank_correlations.to_ascii_table());
    println!(
        "\n{} windows, {} window failures; results in {}",
        result.window_count(),
        result.failure_count(),
        out.path().display()
    );

    Ok(())
}

fn list_all_sectors() {
    println!("Sectors:");
    println!("========\n");

    for sector in Sector::all() {
        println!("{:<24} {}", sector.label(), sector.display_name());
    }
}
