use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use langid::{Checkpoint, InferenceEngine, ModelRegistry, TrainingConfig, TrainingOrchestrator};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "langid")]
#[command(about = "Language identification: train versioned checkpoints and serve them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fine-tune a classifier and write a versioned checkpoint
    Train(TrainArgs),

    /// Serve classification requests against one checkpoint
    Serve(ServeArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// Base model directory (encoder config, weights, tokenizer)
    #[arg(long, default_value = "google-bert/bert-base-multilingual-cased")]
    model: String,

    /// Dataset directory with train.jsonl and validation.jsonl
    #[arg(long, default_value = "papluca/language-identification")]
    data: String,

    /// Version tag for this run; auto-generated if not set
    #[arg(long)]
    version: Option<String>,

    /// Root directory for versioned checkpoints
    #[arg(long, default_value = "./models")]
    output_dir: PathBuf,

    /// Learning rate
    #[arg(long, default_value_t = 2e-5)]
    lr: f64,

    /// Number of training epochs
    #[arg(long, default_value_t = 3)]
    num_epochs: usize,

    /// Training batch size
    #[arg(long, default_value_t = 16)]
    train_batch_size: usize,

    /// Evaluation batch size
    #[arg(long, default_value_t = 16)]
    eval_batch_size: usize,

    /// AdamW weight decay
    #[arg(long, default_value_t = 0.01)]
    weight_decay: f64,

    /// Load the full configuration from a JSON file instead of flags
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct ServeArgs {
    /// Direct path to a checkpoint directory
    #[arg(long, conflicts_with_all = ["root", "version"])]
    checkpoint: Option<PathBuf>,

    /// Artifact root to resolve versions under
    #[arg(long, default_value = "./models")]
    root: PathBuf,

    /// Version to serve; latest complete checkpoint if not set
    #[arg(long)]
    version: Option<String>,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => train(args),
        Commands::Serve(args) => serve(args).await,
    }
}

fn train(args: TrainArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            TrainingConfig::from_file(path).context("Failed to load configuration file")?
        }
        None => TrainingConfig {
            model: args.model,
            data: args.data,
            version: args.version,
            output_dir: args.output_dir,
            lr: args.lr,
            num_epochs: args.num_epochs,
            train_batch_size: args.train_batch_size,
            eval_batch_size: args.eval_batch_size,
            weight_decay: args.weight_decay,
        },
    };

    let orchestrator = TrainingOrchestrator::new(config)?;
    let outcome = orchestrator.run().context("Training run failed")?;

    info!(
        "saved fine-tuned checkpoint {} to {}",
        outcome.version,
        outcome.output_dir.display()
    );
    for (name, value) in &outcome.metrics {
        info!("{}: {:.4}", name, value);
    }
    Ok(())
}

async fn serve(args: ServeArgs) -> Result<()> {
    let dir = match (&args.checkpoint, &args.version) {
        (Some(path), _) => path.clone(),
        (None, Some(version)) => ModelRegistry::new(&args.root).resolve(version)?,
        (None, None) => ModelRegistry::new(&args.root).latest()?,
    };

    // Blocking, one-time load; a failure here must keep us out of serving.
    let checkpoint = Checkpoint::load(&dir)
        .with_context(|| format!("Failed to load checkpoint from {}", dir.display()))?;
    let engine = Arc::new(InferenceEngine::new(checkpoint));

    langid::serve::run(engine, &args.host, args.port).await
}
