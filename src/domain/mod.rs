// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that name the concepts of the system:
// which way a pair is translated, what a watermark is, what a
// watermark codec promises, and which errors are worth typing.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Pixel images (image crate) are fine: they are the codec's
//     native currency

/// Which half of an aligned pair is the input
pub mod direction;

/// Typed configuration and codec errors
pub mod error;

/// Binary watermark plane
pub mod watermark;

/// Codec capabilities (blind / reference-assisted)
pub mod traits;
