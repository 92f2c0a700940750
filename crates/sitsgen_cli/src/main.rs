//! sitsgen CLI for the reference pixel classifier and time series datasets.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitsgen_core::Seed;
use sitsgen_data::{PreprocessConfig, TSDataset};
use sitsgen_train::{run_reference_classifier, Experiment, PipelineConfig};

#[derive(Parser)]
#[command(name = "sitsgen")]
#[command(author, version)]
#[command(about = "Synthetic satellite image time series - datasets and reference classifier")]
#[command(long_about = "sitsgen: toy satellite image time series tooling.

EXAMPLES:
  # Fit the reference pixel classifier and write its artifacts
  sitsgen reference-classifier --cfg configs/reference.json --o runs/reference --njobs 4

  # Summarize a labeled time series dataset
  sitsgen dataset info data/Crop_TRAIN.ts --ndim 1 --nclass 4 --rescale

  # Draw a time series window of a given label
  sitsgen dataset sample data/Crop_TRAIN.ts --label 2 --horizon 12 --seed 7")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit and evaluate the reference pixel classifier
    ReferenceClassifier {
        /// Path to the JSON pipeline configuration
        #[arg(long, value_name = "FILE")]
        cfg: PathBuf,

        /// Output directory for the classifier and its scores
        #[arg(long = "o", value_name = "DIR")]
        output: PathBuf,

        /// Worker threads for the classifier, 0 for one per core
        #[arg(long, default_value = "1", value_name = "N")]
        njobs: usize,
    },
    /// Inspect labeled time series datasets
    Dataset {
        #[command(subcommand)]
        command: DatasetCommands,
    },
}

/// Preprocessing applied after loading a `.ts` file.
#[derive(clap::Args)]
struct PreprocessArgs {
    /// Keep only the first N dimensions
    #[arg(long, value_name = "N")]
    ndim: Option<usize>,

    /// Group labels into N classes
    #[arg(long, value_name = "N")]
    nclass: Option<usize>,

    /// Min-max rescale every dimension to [0, 1]
    #[arg(long, default_value = "false")]
    rescale: bool,
}

impl PreprocessArgs {
    fn to_config(&self) -> PreprocessConfig {
        PreprocessConfig {
            ndim: self.ndim,
            nclass: self.nclass,
            rescale: self.rescale,
        }
    }
}

#[derive(Subcommand)]
enum DatasetCommands {
    /// Show dataset info
    Info {
        /// Path to a .ts file
        path: PathBuf,

        #[command(flatten)]
        preprocess: PreprocessArgs,
    },
    /// Draw one random time series and print its window
    Sample {
        /// Path to a .ts file
        path: PathBuf,

        /// Only draw among series with this label
        #[arg(long)]
        label: Option<i64>,

        /// Window length, the full series when unset
        #[arg(long, value_name = "STEPS")]
        horizon: Option<usize>,

        /// Random seed for reproducibility
        #[arg(long, default_value = "42", value_name = "SEED")]
        seed: u64,

        #[command(flatten)]
        preprocess: PreprocessArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    match cli.command {
        Commands::ReferenceClassifier { cfg, output, njobs } => handle_reference_classifier(&cfg, &output, njobs),
        Commands::Dataset { command } => handle_dataset(command),
    }
}

fn handle_reference_classifier(cfg: &Path, output: &Path, njobs: usize) -> Result<()> {
    let config = PipelineConfig::load(cfg)
        .with_context(|| format!("Failed to load configuration '{}'", cfg.display()))?;

    let mut experiment = Experiment::build(&config)
        .with_context(|| format!("Failed to build experiment from '{}'", config.dataset.root.display()))?;

    println!("Dataset: {}", config.dataset.root.display());
    println!(
        "  Frames: {} (horizon {})",
        experiment.dataset.len(),
        experiment.dataset.horizon()
    );
    println!(
        "  Split: {} train / {} valid / {} test frames",
        experiment.train_set.len(),
        experiment.val_set.len(),
        experiment.test_set.len()
    );
    println!();

    let report = run_reference_classifier(&mut experiment, &config, njobs, output)
        .context("Reference classifier run failed")?;

    println!("Reference classifier");
    println!("  Train pixels: {}", report.n_train);
    println!("  Valid pixels: {}", report.n_valid);
    println!("  Accuracy:     {:.2}%", report.accuracy * 100.0);
    if report.n_not_converged > 0 {
        println!("  {} chunk fit(s) did not converge", report.n_not_converged);
    }
    println!();
    println!("Artifacts:");
    for path in &report.artifacts {
        println!("  {}", path.display());
    }
    Ok(())
}

fn load_dataset(path: &Path, preprocess: &PreprocessArgs) -> Result<TSDataset> {
    if !path.exists() {
        bail!("Dataset file '{}' does not exist", path.display());
    }
    TSDataset::load_preprocessed(path, &preprocess.to_config())
        .with_context(|| format!("Failed to load dataset '{}'", path.display()))
}

fn handle_dataset(command: DatasetCommands) -> Result<()> {
    match command {
        DatasetCommands::Info { path, preprocess } => {
            let dataset = load_dataset(&path, &preprocess)?;
            println!("{}", dataset);

            println!();
            println!("Label counts:");
            for label in dataset.unique_labels() {
                let count = dataset.labels().iter().filter(|&&l| l == label).count();
                println!("  {:>6}: {}", label, count);
            }
            Ok(())
        }
        DatasetCommands::Sample {
            path,
            label,
            horizon,
            seed,
            preprocess,
        } => {
            let mut dataset = load_dataset(&path, &preprocess)?;
            let mut rng = Seed::new(seed).to_rng();
            let index = dataset
                .sample_index(label, true, &mut rng)
                .context("Failed to draw a series")?;
            let serie = dataset
                .series(index, horizon, None)
                .with_context(|| format!("Failed to window series {}", index))?;

            let window = serie.iter(&mut rng);
            println!(
                "Series {} (label {}), steps {}..{} of {}",
                index,
                serie.label(),
                window.start(),
                window.start() + serie.len(),
                serie.ts().nrows()
            );
            println!("{:.4}", window.to_array());
            Ok(())
        }
    }
}
