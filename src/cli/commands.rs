// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the four subcommands and all their flags:
//
//   train     fit the GAN on an aligned dataset
//   generate  run a trained generator over a folder
//   embed     hide a mark image inside a host image
//   extract   read a mark back out of an image
//
// Enumerated options are plain strings here; they are parsed
// (and rejected with the list of valid names) in Layer 2.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the watermark-aware pix2pix model
    Train(TrainArgs),

    /// Translate images with a trained generator
    Generate(GenerateArgs),

    /// Embed a watermark into an image
    Embed(EmbedArgs),

    /// Extract a watermark from an image
    Extract(ExtractArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Dataset root; images are read from <dataroot>/<phase>
    #[arg(long, default_value = "datasets/facades")]
    pub dataroot: String,

    #[arg(long, default_value = "train")]
    pub phase: String,

    /// Where weights, train_config.json, metrics.csv and samples/ go
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// AtoB | BtoA
    #[arg(long, default_value = "AtoB")]
    pub direction: String,

    /// Channels of the input image (1 or 3)
    #[arg(long, default_value_t = 3)]
    pub input_nc: usize,

    /// Channels of the output image (1 or 3)
    #[arg(long, default_value_t = 3)]
    pub output_nc: usize,

    /// Scale images to this size before cropping
    #[arg(long, default_value_t = 286)]
    pub load_size: usize,

    #[arg(long, default_value_t = 256)]
    pub crop_size: usize,

    /// Disable random horizontal flips
    #[arg(long)]
    pub no_flip: bool,

    #[arg(long, default_value_t = 1)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 1)]
    pub num_workers: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// lsb | lsbm | lsbmr | rlsb | dct
    #[arg(long, default_value = "lsb")]
    pub watermark: String,

    /// Feed the networks 8 bit planes per channel
    #[arg(long)]
    pub expand_bits: bool,

    /// unet_32 | unet_64 | unet_128 | unet_256 | resnet_6blocks | resnet_9blocks
    #[arg(long, default_value = "unet_256")]
    pub netg: String,

    /// basic | n_layers | pixel
    #[arg(long, default_value = "basic")]
    pub netd: String,

    /// Depth of the PatchGAN when --netd n_layers
    #[arg(long, default_value_t = 3)]
    pub n_layers_d: usize,

    /// Generator filters in the first conv layer
    #[arg(long, default_value_t = 64)]
    pub ngf: usize,

    /// Discriminator filters in the first conv layer
    #[arg(long, default_value_t = 64)]
    pub ndf: usize,

    /// instance | none
    #[arg(long, default_value = "instance")]
    pub norm: String,

    #[arg(long)]
    pub no_dropout: bool,

    /// vanilla | lsgan | wgangp
    #[arg(long, default_value = "vanilla")]
    pub gan_mode: String,

    #[arg(long, default_value_t = 100.0)]
    pub lambda_l1: f64,

    #[arg(long, default_value_t = 100.0)]
    pub lambda_ssim: f64,

    /// Initial Adam learning rate
    #[arg(long, default_value_t = 2e-4)]
    pub lr: f64,

    /// Adam momentum term
    #[arg(long, default_value_t = 0.5)]
    pub beta1: f64,

    /// linear | step | cosine
    #[arg(long, default_value = "linear")]
    pub lr_policy: String,

    /// Epochs between ×0.1 steps for --lr-policy step
    #[arg(long, default_value_t = 50)]
    pub lr_decay_iters: usize,

    /// Epochs at the initial learning rate
    #[arg(long, default_value_t = 100)]
    pub n_epochs: usize,

    /// Epochs to decay the learning rate to zero
    #[arg(long, default_value_t = 100)]
    pub n_epochs_decay: usize,

    /// Resume from the latest checkpoint in --checkpoint-dir
    #[arg(long)]
    pub continue_train: bool,

    /// Log losses every N batches
    #[arg(long, default_value_t = 100)]
    pub print_freq: usize,

    /// Save visuals every N batches
    #[arg(long, default_value_t = 400)]
    pub display_freq: usize,

    /// Save networks every N epochs
    #[arg(long, default_value_t = 5)]
    pub save_epoch_freq: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            dataroot:        a.dataroot,
            phase:           a.phase,
            checkpoint_dir:  a.checkpoint_dir,
            direction:       a.direction,
            input_nc:        a.input_nc,
            output_nc:       a.output_nc,
            load_size:       a.load_size,
            crop_size:       a.crop_size,
            no_flip:         a.no_flip,
            batch_size:      a.batch_size,
            num_workers:     a.num_workers,
            seed:            a.seed,
            watermark:       a.watermark,
            expand_bits:     a.expand_bits,
            netg:            a.netg,
            netd:            a.netd,
            n_layers_d:      a.n_layers_d,
            ngf:             a.ngf,
            ndf:             a.ndf,
            norm:            a.norm,
            no_dropout:      a.no_dropout,
            gan_mode:        a.gan_mode,
            lambda_l1:       a.lambda_l1,
            lambda_ssim:     a.lambda_ssim,
            lr:              a.lr,
            beta1:           a.beta1,
            lr_policy:       a.lr_policy,
            lr_decay_iters:  a.lr_decay_iters,
            n_epochs:        a.n_epochs,
            n_epochs_decay:  a.n_epochs_decay,
            continue_train:  a.continue_train,
            print_freq:      a.print_freq,
            display_freq:    a.display_freq,
            save_epoch_freq: a.save_epoch_freq,
        }
    }
}

/// All arguments for the `generate` command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Dataset root; defaults to the one used for training
    #[arg(long)]
    pub dataroot: Option<String>,

    #[arg(long, default_value = "test")]
    pub phase: String,

    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,
}

/// All arguments for the `embed` command
#[derive(Args, Debug)]
pub struct EmbedArgs {
    /// lsb | lsbm | lsbmr | rlsb | dct
    #[arg(long, default_value = "lsb")]
    pub watermark: String,

    /// Image that will carry the mark
    #[arg(long)]
    pub host: PathBuf,

    /// Greyscale mark image (thresholded at mid-grey)
    #[arg(long)]
    pub mark: PathBuf,

    /// Aligned reference image, required by rlsb
    #[arg(long)]
    pub reference: Option<PathBuf>,

    #[arg(long)]
    pub output: PathBuf,
}

/// All arguments for the `extract` command
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// lsb | lsbm | lsbmr | rlsb | dct
    #[arg(long, default_value = "lsb")]
    pub watermark: String,

    #[arg(long)]
    pub image: PathBuf,

    /// Aligned reference image, required by rlsb
    #[arg(long)]
    pub reference: Option<PathBuf>,

    #[arg(long)]
    pub output: PathBuf,
}
