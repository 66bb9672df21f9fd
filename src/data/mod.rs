// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from side-by-side images on disk
// all the way to tensor batches.
//
// The pipeline flows in this order:
//
//   <dataroot>/<phase>/*.png
//       │
//       ▼
//   loader           → lists files, splits each into A | B halves
//       │
//       ▼
//   PairedDataset    → resize, random crop, flip; values in [-1, 1]
//       │
//       ▼
//   PairedBatcher    → stacks items into [N, C, H, W] tensors
//       │
//       ▼
//   DataLoader       → shuffles and feeds batches to the trainer
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Lists aligned images and splits them into halves
pub mod loader;

/// Implements Burn's Dataset trait for aligned pairs
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
