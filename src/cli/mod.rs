// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Four commands are supported:
//   1. `train`    — trains generator + discriminator on aligned pairs
//   2. `generate` — loads a checkpoint and translates a folder
//   3. `embed`    — writes a watermark into one image
//   4. `extract`  — reads a watermark back out of one image
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EmbedArgs, ExtractArgs, GenerateArgs, TrainArgs};

/// The main CLI struct; clap derives the parser from its fields.
#[derive(Parser, Debug)]
#[command(
    name = "stego-pix2pix",
    version = "0.1.0",
    about = "Train a pix2pix GAN whose outputs carry a recoverable watermark."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. The CLI only routes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Generate(args) => run_generate(args),
            Commands::Embed(args)    => run_embed(args),
            Commands::Extract(args)  => run_extract(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on pairs in: {}/{}", args.dataroot, args.phase);

    let checkpoint_dir = args.checkpoint_dir.clone();
    TrainUseCase::new(args.into()).execute()?;

    println!("Training complete. Checkpoints saved to '{checkpoint_dir}'.");
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    use crate::application::generate_use_case::GenerateUseCase;

    let use_case = GenerateUseCase::new(
        args.checkpoint_dir,
        args.dataroot,
        args.phase,
        args.results_dir.clone(),
    );
    let count = use_case.execute()?;

    println!("Translated {count} images into '{}'.", args.results_dir.display());
    Ok(())
}

fn run_embed(args: EmbedArgs) -> Result<()> {
    use crate::application::watermark_use_case::EmbedUseCase;

    let output = args.output.clone();
    EmbedUseCase {
        watermark: args.watermark,
        host:      args.host,
        mark:      args.mark,
        reference: args.reference,
        output:    args.output,
    }
    .execute()?;

    println!("Watermarked image written to '{}'.", output.display());
    Ok(())
}

fn run_extract(args: ExtractArgs) -> Result<()> {
    use crate::application::watermark_use_case::ExtractUseCase;

    let output = args.output.clone();
    let mark = ExtractUseCase {
        watermark: args.watermark,
        image:     args.image,
        reference: args.reference,
        output:    args.output,
    }
    .execute()?;

    println!(
        "Recovered a {}x{} watermark ({:.1}% set) into '{}'.",
        mark.width(),
        mark.height(),
        mark.density() * 100.0,
        output.display(),
    );
    Ok(())
}
