use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gesture_voice::classifier::{Classifier, DatasetStore, KnnClassifier};
use gesture_voice::presentation::format_report;
use gesture_voice::voice::grammar;
use gesture_voice::{Config, Daemon, Output, Report};

/// Gesture - voice-commanded rock/paper/scissor classifier
#[derive(Parser)]
#[command(name = "gesture", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory holding saved datasets
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Dataset name used by `load` and `save`
    #[arg(long, global = true)]
    dataset: Option<String>,

    /// Phrase that arms the session
    #[arg(long, global = true)]
    wake_word: Option<String>,

    /// JSON file of frames to replay instead of random frames
    #[arg(long, global = true)]
    frames: Option<PathBuf>,

    /// Report output: console, json or log
    #[arg(long, global = true)]
    output: Option<Output>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Listen for voice commands on stdin (default)
    Run,
    /// Print the JSGF grammar for the command vocabulary
    Grammar,
    /// Show per-label example counts of a saved dataset
    Counts,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so console reports stay readable on stdout
    let filter = match cli.verbose {
        0 => "info,gesture_voice=info",
        1 => "info,gesture_voice=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    apply_overrides(&mut config, &cli);
    config.validate()?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            tracing::info!(
                wake_word = %config.wake_word,
                dataset = %config.dataset_name,
                "starting gesture daemon"
            );
            let daemon = Daemon::new(config)?;
            daemon.run().await?;
        }
        Command::Grammar => println!("{}", grammar(&config.wake_word)),
        Command::Counts => print_counts(&config)?,
    }

    Ok(())
}

/// CLI flags take precedence over the file and the environment
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(dir) = &cli.data_dir {
        config.data_dir.clone_from(dir);
    }
    if let Some(name) = &cli.dataset {
        config.dataset_name.clone_from(name);
    }
    if let Some(wake_word) = &cli.wake_word {
        config.wake_word.clone_from(wake_word);
    }
    if let Some(frames) = &cli.frames {
        config.frames = Some(frames.clone());
    }
    if let Some(output) = cli.output {
        config.output = output;
    }
}

fn print_counts(config: &Config) -> anyhow::Result<()> {
    let store = DatasetStore::new(config.data_dir.clone());
    let message = format!(
        "dataset {} in {}",
        config.dataset_name,
        store.dir().display()
    );

    let mut knn = KnnClassifier::new(config.k, store);
    knn.load(&config.dataset_name)?;

    let report = Report::counts(message, knn.counts_by_label());
    println!("{}", format_report(&report));
    Ok(())
}
