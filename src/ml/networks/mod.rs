// ============================================================
// Layer 5 — Network Factory
// ============================================================
// Builds the generator and discriminator from string-valued
// options. Unknown names become a ConfigError before any weights
// are allocated.
//
//   norm.rs           — normalisation wrapper, conv constructors
//   generator.rs      — U-Net and ResNet generators
//   discriminator.rs  — PatchGAN and PixelGAN discriminators
//
// Reference: Isola et al. (2017) Image-to-Image Translation with
//            Conditional Adversarial Networks

pub mod norm;
pub mod generator;
pub mod discriminator;

pub use discriminator::{Discriminator, DiscriminatorArch, DiscriminatorConfig};
pub use generator::{Generator, GeneratorArch, GeneratorConfig};
pub use norm::NormKind;
