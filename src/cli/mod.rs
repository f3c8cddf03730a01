// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`     — fine-tunes the classifier, keeps the
//                    best validation epoch
//   2. `visualize` — renders predictions of the saved model
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, TrainArgs, VisualizeArgs};

use crate::application::{
    train_use_case::TrainUseCase,
    visualize_use_case::VisualizeUseCase,
};

#[derive(Parser, Debug)]
#[command(
    name = "transfer-learn",
    version,
    about = "Fine-tune an image classifier on a folder of labelled images, then inspect its predictions."
)]
pub struct Cli {
    /// The subcommand to run (train or visualize)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)     => run_train(args),
            Commands::Visualize(args) => run_visualize(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Starting training on images in: {}", args.data_dir);

    let checkpoint_dir = args.checkpoint_dir.clone();
    let summary = TrainUseCase::new(args.into()).execute()?;

    match summary.best_epoch {
        Some(epoch) => println!(
            "Trained {} epochs; best model (epoch {epoch}) saved to '{checkpoint_dir}'.",
            summary.num_epochs
        ),
        None        => println!("No epoch improved on the initial model; saved it to '{checkpoint_dir}'."),
    }
    Ok(())
}

fn run_visualize(args: VisualizeArgs) -> Result<()> {
    let out_dir = args.out_dir.clone();
    let shown   = VisualizeUseCase::new(args.into()).execute()?;

    match out_dir {
        Some(dir) => println!("Rendered {shown} predictions to '{}'.", dir.display()),
        None      => println!("Rendered {shown} predictions."),
    }
    Ok(())
}
