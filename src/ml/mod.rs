// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains the Burn framework specific code: tensors,
// networks, losses, optimisers and the training loop.
//
// What's in this layer:
//
//   conversion.rs — tensor ⇄ image bridge and bit expansion
//                   (every channel → 8 binary planes and back)
//
//   networks/     — generator and discriminator factory
//                   • U-Net / ResNet generators
//                   • PatchGAN / PixelGAN discriminators
//
//   loss.rs       — adversarial objectives, L1, SSIM
//
//   schedule.rs   — learning-rate policies per epoch
//
//   trainer.rs    — the four-step GAN iteration and the
//                   epoch loop around it
//
//   inferencer.rs — loads the generator only and translates
//                   single images
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Isola et al. (2017) Image-to-Image Translation with
//            Conditional Adversarial Networks

/// Tensor ⇄ image conversion and bit-plane expansion
pub mod conversion;

/// Generator and discriminator architectures
pub mod networks;

/// GAN, L1 and SSIM loss terms
pub mod loss;

/// Learning-rate schedule
pub mod schedule;

/// Four-step training iteration, epoch loop and checkpointing
pub mod trainer;

/// Generator-only inference from a checkpoint
pub mod inferencer;
