// ============================================================
// Layer 3 — Typed Errors
// ============================================================
// Most of the program reports failures through anyhow, exactly
// like the rest of the layers. Two families of failure need a
// concrete type so callers can tell them apart:
//
//   ConfigError — an enumerated configuration string that does not
//                 name anything we know. Raised while the run is
//                 being configured, before any data is touched or
//                 any network is built.
//
//   CodecError  — a watermark codec refused its input
//                 (missing reference, mismatched sizes, ...).
//
// Both convert into anyhow::Error automatically, and can be
// recovered with `err.downcast_ref::<ConfigError>()`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown {kind} '{name}'; choose one of [{valid}]")]
    UnknownVariant {
        kind:  &'static str,
        name:  String,
        valid: String,
    },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        field:  &'static str,
        reason: String,
    },
}

impl ConfigError {
    /// Build an `UnknownVariant` error listing every accepted name.
    pub fn unknown(kind: &'static str, name: &str, valid: &[&str]) -> Self {
        ConfigError::UnknownVariant {
            kind,
            name:  name.to_string(),
            valid: valid.join(" | "),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("{codec} needs a reference image to recover the watermark")]
    MissingReference { codec: &'static str },

    #[error("{codec}: image is {got_w}x{got_h} but the reference is {want_w}x{want_h}")]
    DimensionMismatch {
        codec:  &'static str,
        got_w:  u32,
        got_h:  u32,
        want_w: u32,
        want_h: u32,
    },

    #[error("{codec}: image {width}x{height} is smaller than one {block}x{block} block")]
    ImageTooSmall {
        codec:  &'static str,
        width:  u32,
        height: u32,
        block:  u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_variant_lists_names() {
        let err = ConfigError::unknown("watermark", "xor", &["lsb", "dct"]);
        let msg = err.to_string();
        assert!(msg.contains("'xor'"));
        assert!(msg.contains("lsb | dct"));
    }
}
