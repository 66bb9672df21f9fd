// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles the file-system concerns shared by training and
// inference:
//
//   checkpoint.rs  — Saving and loading network weights
//                    Uses Burn's CompactRecorder, one file per
//                    network per epoch. Also saves/loads
//                    TrainConfig as JSON so inference can
//                    rebuild the generator.
//
//   metrics.rs     — Per-epoch loss averages appended to a CSV
//                    file for later plotting.
//
//   visuals.rs     — Real/fake images and their watermarks
//                    written as PNG snapshots during training.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Network checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// PNG snapshots of images and watermarks
pub mod visuals;
