// ============================================================
// Layer 5 — Training Orchestrator
// ============================================================
// One iteration is a strict four-step sequence:
//
//   1. ingest                 direction → (input, target), optional
//                             bit expansion, watermark of the real
//                             target
//   2. generate               G(input), collapsed back to image
//                             space, watermark of the fake output
//   3. discriminator update   loss_D on the DETACHED fake,
//                             backward, one Adam step for D
//   4. generator update       loss_G through a frozen copy of D,
//                             backward, one Adam step for G
//
// Gradient isolation:
//   - step 3 detaches fake_B, so loss_D has no path into G
//   - step 4 runs D through `no_grad()`, so loss_G produces no
//     gradients for D's parameters
//   - GradientsParams::from_grads only ever collects the params
//     of the network being stepped
//
// Per-iteration state is threaded through `Ingested` and
// `Generated` and handed back as an `IterationResult`. The trainer
// itself only owns the networks, their optimisers and the codec.
//
// The watermark codecs work on pixels, so every watermark in this
// file is taken from the first element of the batch.
//
// Reference: Isola et al. (2017) pix2pix
//            Burn Book §5 (Custom Training Loop)

use std::{fmt, time::Instant};
use anyhow::{bail, Context, Result};
use burn::{
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    module::Module,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use image::RgbImage;

use crate::application::train_use_case::{Resolved, TrainConfig};
use crate::data::{batcher::{PairedBatch, PairedBatcher}, dataset::PairedDataset};
use crate::domain::{direction::Direction, watermark::Watermark};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{LossMeter, MetricsLogger},
    visuals::VisualWriter,
};
use crate::ml::{
    conversion::{expand_bits, to_image, to_image_space, to_unit},
    loss::{l1, ssim, GanMode},
    networks::{Discriminator, Generator},
};
use crate::watermark::Codec;

type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

pub const NET_G: &str = "net_G";
pub const NET_D: &str = "net_D";

// ─── Reported values ──────────────────────────────────────────────────────────
/// The five scalar losses of one iteration. L1 and SSIM are already weighted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LossReport {
    pub g_gan:  f64,
    pub g_l1:   f64,
    pub g_ssim: f64,
    pub d_real: f64,
    pub d_fake: f64,
}

impl LossReport {
    pub const NAMES: [&'static str; 5] = ["G_GAN", "G_L1", "G_SSIM", "D_real", "D_fake"];

    pub fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("G_GAN",  self.g_gan),
            ("G_L1",   self.g_l1),
            ("G_SSIM", self.g_ssim),
            ("D_real", self.d_real),
            ("D_fake", self.d_fake),
        ]
    }

    pub fn values(&self) -> [f64; 5] {
        [self.g_gan, self.g_l1, self.g_ssim, self.d_real, self.d_fake]
    }
}

impl fmt::Display for LossReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.named().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{name}: {value:.3}")?;
        }
        Ok(())
    }
}

/// Images worth looking at after an iteration.
#[derive(Debug, Clone)]
pub struct Visuals {
    pub real_b_img:     RgbImage,
    pub fake_b_img:     RgbImage,
    pub real_watermark: Watermark,
    pub fake_watermark: Watermark,
}

impl Visuals {
    pub fn named(&self) -> Vec<(&'static str, RgbImage)> {
        vec![
            ("real_B_img",     self.real_b_img.clone()),
            ("fake_B_img",     self.fake_b_img.clone()),
            ("real_watermark", self.real_watermark.to_rgb()),
            ("fake_watermark", self.fake_watermark.to_rgb()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct IterationResult {
    pub losses:  LossReport,
    pub visuals: Visuals,
}

// ─── Per-iteration context ────────────────────────────────────────────────────
/// Step 1 output. Tensors are in network space (expanded when enabled).
pub struct Ingested<B: Backend> {
    pub real_a:         Tensor<B, 4>,
    pub real_b:         Tensor<B, 4>,
    pub real_a_img:     RgbImage,
    pub real_b_img:     RgbImage,
    pub real_watermark: Watermark,
}

/// Step 2 output. `fake_b` is still attached to G's graph.
pub struct Generated<B: Backend> {
    pub ingested:       Ingested<B>,
    pub fake_b:         Tensor<B, 4>,
    pub fake_b_img:     RgbImage,
    pub fake_watermark: Watermark,
}

struct DiscriminatorLosses<B: Backend> {
    real:  Tensor<B, 1>,
    fake:  Tensor<B, 1>,
    total: Tensor<B, 1>,
}

struct GeneratorLosses<B: Backend> {
    gan:   Tensor<B, 1>,
    l1:    Tensor<B, 1>,
    ssim:  Tensor<B, 1>,
    total: Tensor<B, 1>,
}

fn scalar<B: Backend>(t: Tensor<B, 1>) -> f64 {
    t.into_scalar().elem::<f64>()
}

// ─── Trainer ──────────────────────────────────────────────────────────────────
pub struct Pix2PixTrainer<B: AutodiffBackend, OG, OD> {
    pub generator:     Generator<B>,
    pub discriminator: Discriminator<B>,
    optim_g:     OG,
    optim_d:     OD,
    codec:       Codec,
    direction:   Direction,
    gan_mode:    GanMode,
    expand:      bool,
    lambda_l1:   f64,
    lambda_ssim: f64,
    lr:          f64,
}

/// Build both networks and their optimisers from already-resolved options.
pub fn build_trainer<B: AutodiffBackend>(
    cfg:      &TrainConfig,
    resolved: &Resolved,
    device:   &B::Device,
) -> Result<Pix2PixTrainer<B, impl Optimizer<Generator<B>, B>, impl Optimizer<Discriminator<B>, B>>> {
    let codec = resolved.watermark.codec();

    let generator: Generator<B> = cfg.generator_config().init(device)?;
    let discriminator: Discriminator<B> = cfg.discriminator_config().init(device)?;

    // m = β1·m + (1-β1)·g ;  v = β2·v + (1-β2)·g² ;  θ -= lr · m / (√v + ε)
    let optim_g = AdamConfig::new()
        .with_beta_1(cfg.beta1 as f32)
        .with_beta_2(0.999)
        .init::<B, Generator<B>>();
    let optim_d = AdamConfig::new()
        .with_beta_1(cfg.beta1 as f32)
        .with_beta_2(0.999)
        .init::<B, Discriminator<B>>();

    tracing::info!(
        "Networks ready: G={} D={} norm={} codec={} expand_bits={}",
        cfg.netg, cfg.netd, cfg.norm, codec.name(), cfg.expand_bits,
    );

    Ok(Pix2PixTrainer {
        generator,
        discriminator,
        optim_g,
        optim_d,
        codec,
        direction:   resolved.direction,
        gan_mode:    resolved.gan_mode,
        expand:      cfg.expand_bits,
        lambda_l1:   cfg.lambda_l1,
        lambda_ssim: cfg.lambda_ssim,
        lr:          cfg.lr,
    })
}

impl<B, OG, OD> Pix2PixTrainer<B, OG, OD>
where
    B:  AutodiffBackend,
    OG: Optimizer<Generator<B>, B>,
    OD: Optimizer<Discriminator<B>, B>,
{
    pub fn set_lr(&mut self, lr: f64) {
        self.lr = lr;
    }

    // ── Step 1 ────────────────────────────────────────────────────────────────
    pub fn ingest(&self, batch: PairedBatch<B>) -> Result<Ingested<B>> {
        let (input, target) = self.direction.arrange(batch.a, batch.b);

        let [n_in, _, h_in, w_in] = input.dims();
        let [n_tg, _, h_tg, w_tg] = target.dims();
        if (n_in, h_in, w_in) != (n_tg, h_tg, w_tg) {
            bail!(
                "input is {n_in}x{h_in}x{w_in} but target is {n_tg}x{h_tg}x{w_tg} (batch x height x width)"
            );
        }

        let real_a_img = to_image(input.clone())?;
        let real_b_img = to_image(target.clone())?;
        let real_watermark = self.codec
            .extract(&real_b_img, &real_a_img)
            .context("watermark extraction failed on the real target")?;

        let (real_a, real_b) = if self.expand {
            (expand_bits(input), expand_bits(target))
        } else {
            (input, target)
        };

        Ok(Ingested { real_a, real_b, real_a_img, real_b_img, real_watermark })
    }

    // ── Step 2 ────────────────────────────────────────────────────────────────
    pub fn generate(&self, ingested: Ingested<B>) -> Result<Generated<B>> {
        let fake_b = self.generator.forward(ingested.real_a.clone());

        let fake_b_img = to_image(to_image_space(fake_b.clone(), self.expand))?;
        let fake_watermark = self.codec
            .extract(&fake_b_img, &ingested.real_a_img)
            .context("watermark extraction failed on the generated image")?;

        Ok(Generated { ingested, fake_b, fake_b_img, fake_watermark })
    }

    // ── Step 3 ────────────────────────────────────────────────────────────────
    fn discriminator_losses(&self, gen: &Generated<B>) -> DiscriminatorLosses<B> {
        let real_a = gen.ingested.real_a.clone();

        let real_ab = Tensor::cat(vec![real_a.clone(), gen.ingested.real_b.clone()], 1);
        let fake_ab = Tensor::cat(vec![real_a, gen.fake_b.clone().detach()], 1);

        let real  = self.gan_mode.score(self.discriminator.forward(real_ab), true);
        let fake  = self.gan_mode.score(self.discriminator.forward(fake_ab), false);
        let total = real.clone().add(fake.clone()).mul_scalar(0.5);
        DiscriminatorLosses { real, fake, total }
    }

    pub fn discriminator_backward(&self, gen: &Generated<B>) -> ((f64, f64), B::Gradients) {
        let losses = self.discriminator_losses(gen);
        let grads  = losses.total.backward();
        ((scalar(losses.real), scalar(losses.fake)), grads)
    }

    pub fn update_discriminator(&mut self, grads: B::Gradients) {
        let grads = GradientsParams::from_grads(grads, &self.discriminator);
        self.discriminator = self.optim_d.step(self.lr, self.discriminator.clone(), grads);
    }

    // ── Step 4 ────────────────────────────────────────────────────────────────
    fn generator_losses(&self, gen: &Generated<B>) -> GeneratorLosses<B> {
        let frozen = self.discriminator.clone().no_grad();
        let real_a = gen.ingested.real_a.clone();
        let real_b = gen.ingested.real_b.clone();

        let fake_ab = Tensor::cat(vec![real_a, gen.fake_b.clone()], 1);
        let gan = self.gan_mode.score(frozen.forward(fake_ab), true);

        let l1 = l1(gen.fake_b.clone(), real_b.clone()).mul_scalar(self.lambda_l1);

        // SSIM compares images, never raw bit planes
        let fake_img = to_unit(to_image_space(gen.fake_b.clone(), self.expand));
        let real_img = to_unit(to_image_space(real_b, self.expand));
        let ssim = ssim(fake_img, real_img).neg().add_scalar(1.0).mul_scalar(self.lambda_ssim);

        let total = gan.clone().add(l1.clone()).add(ssim.clone());
        GeneratorLosses { gan, l1, ssim, total }
    }

    pub fn generator_backward(&self, gen: &Generated<B>) -> ((f64, f64, f64), B::Gradients) {
        let losses = self.generator_losses(gen);
        let grads  = losses.total.backward();
        ((scalar(losses.gan), scalar(losses.l1), scalar(losses.ssim)), grads)
    }

    pub fn update_generator(&mut self, grads: B::Gradients) {
        let grads = GradientsParams::from_grads(grads, &self.generator);
        self.generator = self.optim_g.step(self.lr, self.generator.clone(), grads);
    }

    // ── Full iteration ────────────────────────────────────────────────────────
    pub fn optimize(&mut self, batch: PairedBatch<B>) -> Result<IterationResult> {
        let ingested  = self.ingest(batch)?;
        let generated = self.generate(ingested)?;

        let ((d_real, d_fake), d_grads) = self.discriminator_backward(&generated);
        self.update_discriminator(d_grads);

        let ((g_gan, g_l1, g_ssim), g_grads) = self.generator_backward(&generated);
        self.update_generator(g_grads);

        let Generated { ingested, fake_b_img, fake_watermark, .. } = generated;
        Ok(IterationResult {
            losses: LossReport { g_gan, g_l1, g_ssim, d_real, d_fake },
            visuals: Visuals {
                real_b_img:     ingested.real_b_img,
                fake_b_img,
                real_watermark: ingested.real_watermark,
                fake_watermark,
            },
        })
    }

    // ── Checkpoints ───────────────────────────────────────────────────────────
    pub fn save(&self, ckpt: &CheckpointManager, epoch: usize) -> Result<()> {
        ckpt.save_network(&self.generator, NET_G, epoch)?;
        ckpt.save_network(&self.discriminator, NET_D, epoch)?;
        ckpt.mark_latest(epoch)
    }

    pub fn restore(&mut self, ckpt: &CheckpointManager, epoch: usize, device: &B::Device) -> Result<()> {
        self.generator     = ckpt.load_network(self.generator.clone(), NET_G, epoch, device)?;
        self.discriminator = ckpt.load_network(self.discriminator.clone(), NET_D, epoch, device)?;
        Ok(())
    }
}

// ─── Training loop ────────────────────────────────────────────────────────────
pub fn run_training(
    cfg:      &TrainConfig,
    resolved: &Resolved,
    dataset:  PairedDataset,
    ckpt:     &CheckpointManager,
    metrics:  &MetricsLogger,
    visuals:  &VisualWriter,
) -> Result<()> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    TrainBackend::seed(&device, cfg.seed);
    train_loop::<TrainBackend>(cfg, resolved, dataset, ckpt, metrics, visuals, device)
}

fn train_loop<B: AutodiffBackend>(
    cfg:      &TrainConfig,
    resolved: &Resolved,
    dataset:  PairedDataset,
    ckpt:     &CheckpointManager,
    metrics:  &MetricsLogger,
    visuals:  &VisualWriter,
    device:   B::Device,
) -> Result<()> {
    let schedule = cfg.schedule(resolved.lr_policy);
    let mut trainer = build_trainer::<B>(cfg, resolved, &device)?;

    // ── Resume ────────────────────────────────────────────────────────────────
    let mut first_epoch = 1;
    if cfg.continue_train {
        match ckpt.latest_epoch() {
            Ok(epoch) => {
                trainer.restore(ckpt, epoch, &device)?;
                first_epoch = epoch + 1;
                tracing::info!("Resuming after epoch {}", epoch);
            }
            Err(_) => tracing::warn!("No checkpoint in '{}', starting from scratch", ckpt.dir().display()),
        }
    }

    // ── Data loader ───────────────────────────────────────────────────────────
    let dataset_len = dataset.len();
    let loader = DataLoaderBuilder::<B, _, _>::new(PairedBatcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(cfg.num_workers)
        .set_device(device.clone())
        .build(dataset);
    tracing::info!("Training on {} pairs, batch size {}", dataset_len, cfg.batch_size);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    let last_epoch  = schedule.total_epochs();
    let mut lr      = schedule.lr_at(first_epoch);
    let mut iters   = 0usize;
    let mut batches = 0usize;

    for epoch in first_epoch..=last_epoch {
        let new_lr = schedule.lr_at(epoch);
        if new_lr != lr {
            tracing::info!("learning rate {:.7} -> {:.7}", lr, new_lr);
            lr = new_lr;
        }
        trainer.set_lr(lr);

        let epoch_start = Instant::now();
        let mut meter   = LossMeter::default();

        for batch in loader.iter() {
            let batch_len  = batch.a.dims()[0];
            let iter_start = Instant::now();

            let result = trainer.optimize(batch)?;
            iters   += batch_len;
            batches += 1;
            meter.add(result.losses.values());

            if batches % cfg.print_freq == 0 {
                let per_sample = iter_start.elapsed().as_secs_f64() / batch_len as f64;
                tracing::info!(
                    "(epoch: {}, iters: {}, time: {:.3}) {}",
                    epoch, iters, per_sample, result.losses,
                );
            }
            if batches % cfg.display_freq == 0 {
                visuals.save(epoch, iters, &result.visuals.named())?;
            }
        }

        if meter.count() == 0 {
            tracing::warn!("Epoch {} produced no batches", epoch);
        }
        metrics.log(&meter.finish(epoch, lr))?;

        if epoch % cfg.save_epoch_freq == 0 || epoch == last_epoch {
            trainer.save(ckpt, epoch)?;
            tracing::info!("Saved networks at the end of epoch {}, iters {}", epoch, iters);
        }

        tracing::info!(
            "End of epoch {} / {} \t Time Taken: {} sec",
            epoch, last_epoch, epoch_start.elapsed().as_secs(),
        );
    }

    tracing::info!("Training complete!");
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use crate::ml::conversion::to_tensor;
    use crate::watermark::{rlsb::RobustLsb, test_support::noisy_image};
    use crate::domain::{error::ConfigError, traits::ReferenceCodec};

    type TestBackend = Autodiff<NdArray<f32>>;

    fn tiny_config() -> TrainConfig {
        TrainConfig {
            netg:       "unet_32".into(),
            ngf:        4,
            ndf:        4,
            no_dropout: true,
            load_size:  32,
            crop_size:  32,
            ..TrainConfig::default()
        }
    }

    fn batch(seed: u64) -> PairedBatch<TestBackend> {
        let device = Default::default();
        let a = noisy_image(32, 32, seed);
        let b = noisy_image(32, 32, seed + 100);
        PairedBatch {
            a:       to_tensor(&[a], 3, &device).unwrap(),
            b:       to_tensor(&[b], 3, &device).unwrap(),
            a_paths: vec!["a.png".into()],
            b_paths: vec!["b.png".into()],
        }
    }

    fn build(
        cfg: &TrainConfig,
    ) -> Pix2PixTrainer<
        TestBackend,
        impl Optimizer<Generator<TestBackend>, TestBackend>,
        impl Optimizer<Discriminator<TestBackend>, TestBackend>,
    > {
        build_trainer::<TestBackend>(cfg, &cfg.resolve().unwrap(), &Default::default()).unwrap()
    }

    fn weights(t: Tensor<TestBackend, 4>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_one_iteration_reports_five_finite_losses() {
        let mut trainer = build(&tiny_config());
        let result = trainer.optimize(batch(1)).unwrap();

        let losses = result.losses;
        assert!(losses.values().iter().all(|v| v.is_finite()), "{losses}");
        assert!(losses.d_real + losses.d_fake >= 0.0);
        assert_eq!(losses.named().map(|(n, _)| n), LossReport::NAMES);

        let v = result.visuals;
        assert_eq!(v.real_watermark.dims(), v.fake_watermark.dims());
        assert_eq!(v.fake_b_img.dimensions(), (32, 32));
    }

    #[test]
    fn test_bit_expansion_multiplies_channels_and_reports_images() {
        let cfg = TrainConfig { expand_bits: true, ..tiny_config() };
        let mut trainer = build(&cfg);

        let ingested = trainer.ingest(batch(2)).unwrap();
        assert_eq!(ingested.real_a.dims(), [1, 24, 32, 32]);
        let generated = trainer.generate(ingested).unwrap();
        assert_eq!(generated.fake_b.dims(), [1, 24, 32, 32]);

        let result = trainer.optimize(batch(3)).unwrap();
        assert!(result.losses.values().iter().all(|v| v.is_finite()));
        assert_eq!(result.visuals.fake_b_img.dimensions(), (32, 32));
        assert_eq!(result.visuals.real_watermark.dims(), result.visuals.fake_watermark.dims());
    }

    #[test]
    fn test_generator_backward_touches_only_generator() {
        let trainer = build(&tiny_config());
        let generated = trainer.generate(trainer.ingest(batch(4)).unwrap()).unwrap();

        let (_, grads) = trainer.generator_backward(&generated);
        assert!(trainer.generator.probe_weight().grad(&grads).is_some());
        assert!(trainer.discriminator.probe_weight().grad(&grads).is_none());
    }

    #[test]
    fn test_discriminator_backward_touches_only_discriminator() {
        let trainer = build(&tiny_config());
        let generated = trainer.generate(trainer.ingest(batch(5)).unwrap()).unwrap();

        let (_, grads) = trainer.discriminator_backward(&generated);
        assert!(trainer.discriminator.probe_weight().grad(&grads).is_some());
        assert!(trainer.generator.probe_weight().grad(&grads).is_none());
    }

    #[test]
    fn test_each_step_changes_only_its_own_network() {
        let mut trainer = build(&tiny_config());
        let g0 = weights(trainer.generator.probe_weight());
        let d0 = weights(trainer.discriminator.probe_weight());

        let generated = trainer.generate(trainer.ingest(batch(6)).unwrap()).unwrap();
        let (_, d_grads) = trainer.discriminator_backward(&generated);
        trainer.update_discriminator(d_grads);

        let g1 = weights(trainer.generator.probe_weight());
        let d1 = weights(trainer.discriminator.probe_weight());
        assert_eq!(g0, g1);
        assert_ne!(d0, d1);

        let (_, g_grads) = trainer.generator_backward(&generated);
        trainer.update_generator(g_grads);

        let g2 = weights(trainer.generator.probe_weight());
        let d2 = weights(trainer.discriminator.probe_weight());
        assert_ne!(g1, g2);
        assert_eq!(d1, d2);
    }

    #[test]
    fn test_rlsb_uses_input_image_as_reference() {
        let cfg = TrainConfig { watermark: "rlsb".into(), ..tiny_config() };
        let trainer = build(&cfg);

        let ingested = trainer.ingest(batch(7)).unwrap();
        let direct = RobustLsb.extract(&ingested.real_b_img, &ingested.real_a_img).unwrap();
        assert_eq!(ingested.real_watermark, direct);

        let generated = trainer.generate(ingested).unwrap();
        let direct = RobustLsb
            .extract(&generated.fake_b_img, &generated.ingested.real_a_img)
            .unwrap();
        assert_eq!(generated.fake_watermark, direct);
    }

    #[test]
    fn test_b_to_a_swaps_input_and_target() {
        let cfg = TrainConfig { direction: "BtoA".into(), ..tiny_config() };
        let trainer = build(&cfg);
        let ingested = trainer.ingest(batch(8)).unwrap();
        assert_eq!(ingested.real_a_img, noisy_image(32, 32, 108));
        assert_eq!(ingested.real_b_img, noisy_image(32, 32, 8));
    }

    #[test]
    fn test_mismatched_halves_are_rejected() {
        let trainer = build(&tiny_config());
        let device = Default::default();
        let bad = PairedBatch {
            a:       to_tensor(&[noisy_image(32, 32, 9)], 3, &device).unwrap(),
            b:       to_tensor(&[noisy_image(16, 16, 9)], 3, &device).unwrap(),
            a_paths: vec![],
            b_paths: vec![],
        };
        assert!(trainer.ingest(bad).is_err());
    }

    #[test]
    fn test_unknown_watermark_fails_before_any_network_exists() {
        let cfg = TrainConfig { watermark: "steghide".into(), ..tiny_config() };
        assert!(matches!(
            cfg.resolve(),
            Err(ConfigError::UnknownVariant { kind: "watermark", .. })
        ));
    }

    fn write_pairs(dir: &std::path::Path, count: u64) {
        std::fs::create_dir_all(dir).unwrap();
        for i in 0..count {
            let a = noisy_image(32, 32, i);
            let b = noisy_image(32, 32, i + 50);
            let ab = RgbImage::from_fn(64, 32, |x, y| {
                if x < 32 { *a.get_pixel(x, y) } else { *b.get_pixel(x - 32, y) }
            });
            ab.save(dir.join(format!("{:04}.png", i + 1))).unwrap();
        }
    }

    fn run_epochs(cfg: &TrainConfig) {
        let resolved = cfg.resolve().unwrap();
        let dataset  = PairedDataset::from_dir(&cfg.phase_dir(), cfg.aligned_options(true)).unwrap();
        let ckpt     = CheckpointManager::new(&cfg.checkpoint_dir).unwrap();
        let metrics  = MetricsLogger::new(&cfg.checkpoint_dir).unwrap();
        let visuals  = VisualWriter::new(ckpt.dir().join("samples")).unwrap();
        train_loop::<TestBackend>(cfg, &resolved, dataset, &ckpt, &metrics, &visuals, Default::default())
            .unwrap();
    }

    fn logged_rates(csv: &std::path::Path) -> Vec<(usize, f64)> {
        std::fs::read_to_string(csv)
            .unwrap()
            .lines()
            .skip(1)
            .map(|row| {
                let cols: Vec<&str> = row.split(',').collect();
                (cols[0].parse().unwrap(), cols[6].parse().unwrap())
            })
            .collect()
    }

    #[test]
    fn test_epoch_loop_saves_logs_and_resumes() {
        let tmp = tempfile::tempdir().unwrap();
        let ckpt_dir = tmp.path().join("ckpt");
        write_pairs(&tmp.path().join("data").join("train"), 2);

        let cfg = TrainConfig {
            dataroot:        tmp.path().join("data").display().to_string(),
            checkpoint_dir:  ckpt_dir.display().to_string(),
            n_epochs:        1,
            n_epochs_decay:  1,
            save_epoch_freq: 1,
            print_freq:      1,
            display_freq:    1,
            ..tiny_config()
        };
        run_epochs(&cfg);

        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir).unwrap();
        assert_eq!(ckpt.latest_epoch().unwrap(), 2);
        let samples = ckpt_dir.join("samples");
        for name in ["real_B_img", "fake_B_img", "real_watermark", "fake_watermark"] {
            assert!(samples.join(format!("epoch001_iter000001_{name}.png")).exists(), "{name}");
        }

        // Same run, one more decay epoch
        let resumed = TrainConfig { n_epochs_decay: 2, continue_train: true, ..cfg };
        run_epochs(&resumed);
        assert_eq!(ckpt.latest_epoch().unwrap(), 3);

        let rates = logged_rates(&ckpt_dir.join("metrics.csv"));
        assert_eq!(rates.iter().map(|(e, _)| *e).collect::<Vec<_>>(), vec![1, 2, 3]);
        let expected = [2e-4, 1e-4, 2e-4 / 3.0];
        for ((_, lr), want) in rates.iter().zip(expected) {
            assert!((lr - want).abs() < 1e-8, "{lr} vs {want}");
        }
        assert!(samples.join("epoch003_iter000001_fake_B_img.png").exists());
    }

    #[test]
    fn test_loss_report_display_format() {
        let report = LossReport { g_gan: 1.0, g_l1: 2.0, g_ssim: 3.0, d_real: 0.5, d_fake: 0.25 };
        assert_eq!(
            report.to_string(),
            "G_GAN: 1.000 G_L1: 2.000 G_SSIM: 3.000 D_real: 0.500 D_fake: 0.250"
        );
    }
}
