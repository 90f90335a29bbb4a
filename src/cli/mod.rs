// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`   — trains the classifier on a keypoint manifest
//   2. `predict` — loads a checkpoint and recognises one gesture
//   3. `inspect` — prints the metadata stored in a checkpoint
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, InspectArgs, PredictArgs, TrainArgs};

use crate::application::{
    inspect_use_case::inspect_checkpoint,
    predict_use_case::PredictUseCase,
    train_use_case::TrainUseCase,
};

#[derive(Parser, Debug)]
#[command(
    name = "sign-recognizer",
    version,
    about = "Train a transformer sign-gesture classifier on keypoint sequences, then recognise new gestures."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the matching use case. The CLI layer only parses and prints.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
            Commands::Inspect(args) => run_inspect(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let device = args.device.into();
    let config = args.into_config()?;
    tracing::info!("Starting training on manifest: {}", config.train_manifest.display());

    let summary = TrainUseCase::new(config).execute(device)?;

    match (&summary.best.path, summary.best.accuracy, summary.best.epoch) {
        (Some(path), Some(acc), Some(epoch)) => println!(
            "Training complete. Best val_acc {:.1}% at epoch {}, checkpoint: {}",
            acc * 100.0,
            epoch,
            path.display(),
        ),
        _ => println!("Training complete. No checkpoint was written."),
    }
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let use_case = PredictUseCase::new(&args.checkpoint, args.top_k);
    let report   = use_case.execute(&args.input, args.device.into())?;

    println!("\nPrediction: {} ({:.1}%)", report.label, report.confidence * 100.0);
    println!("Input: {} frames, resampled to {}", report.frames, report.seq_len);
    for (rank, (label, p)) in report.top.iter().enumerate() {
        println!("  {:>2}. {:<24} {:>6.2}%", rank + 1, label, p * 100.0);
    }
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let meta = inspect_checkpoint(&args.checkpoint)?;
    let arch = &meta.architecture;

    println!("Checkpoint:   {}", args.checkpoint.display());
    println!("Epoch:        {} (val_acc {:.1}%)", meta.epoch, meta.val_accuracy * 100.0);
    println!("Input:        [seq_len={}, input_width={}]", meta.seq_len, meta.input_width);
    println!(
        "Architecture: d_model={} heads={} layers={} d_ff={} max_seq_len={}",
        arch.d_model, arch.num_heads, arch.num_layers, arch.d_ff, arch.max_seq_len,
    );
    println!("Labels ({}):  {}", meta.labels.len(), meta.labels.join(", "));
    Ok(())
}
