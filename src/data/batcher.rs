// ============================================================
// Layer 4 — Paired Image Batcher
// ============================================================
// Implements Burn's Batcher trait to stack PairedItems into the
// two image tensors the trainer consumes.
//
//   Input:  Vec of N PairedItems, each A and B already CHW in [-1, 1]
//   Output: PairedBatch with A [N, Ca, S, S] and B [N, Cb, S, S]
//
// Every item in a batch was cropped to the same size by the
// dataset, so stacking is a flat concat followed by a reshape.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::PairedItem;

// ─── PairedBatch ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct PairedBatch<B: Backend> {
    /// Domain A images — shape: [batch_size, channels_a, size, size]
    pub a: Tensor<B, 4>,

    /// Domain B images — shape: [batch_size, channels_b, size, size]
    pub b: Tensor<B, 4>,

    /// Source file of each row of `a`
    pub a_paths: Vec<String>,

    /// Source file of each row of `b`; aligned pairs share a file
    pub b_paths: Vec<String>,
}

// ─── PairedBatcher ────────────────────────────────────────────────────────────
#[derive(Clone, Debug, Default)]
pub struct PairedBatcher;

impl<B: Backend> Batcher<B, PairedItem, PairedBatch<B>> for PairedBatcher {
    fn batch(&self, items: Vec<PairedItem>, device: &B::Device) -> PairedBatch<B> {
        let n = items.len();
        let (ca, cb, s) = items
            .first()
            .map(|i| (i.channels_a, i.channels_b, i.size))
            .unwrap_or((0, 0, 0));

        let a_flat: Vec<f32> = items.iter().flat_map(|i| i.a.iter().copied()).collect();
        let b_flat: Vec<f32> = items.iter().flat_map(|i| i.b.iter().copied()).collect();

        let a = Tensor::<B, 4>::from_data(TensorData::new(a_flat, [n, ca, s, s]), device);
        let b = Tensor::<B, 4>::from_data(TensorData::new(b_flat, [n, cb, s, s]), device);

        let paths: Vec<String> = items.into_iter().map(|i| i.path).collect();

        PairedBatch {
            a,
            b,
            a_paths: paths.clone(),
            b_paths: paths,
        }
    }
}
