// ============================================================
// Layer 3 — Translation Direction
// ============================================================
// An aligned dataset stores pairs (A, B). The direction decides
// which half conditions the generator and which half is the
// target it must reproduce. It is fixed for a whole run.

use std::{fmt, str::FromStr};
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    AtoB,
    BtoA,
}

impl Direction {
    pub const NAMES: [&'static str; 2] = ["AtoB", "BtoA"];

    /// Order a pair as (input, target).
    pub fn arrange<T>(self, a: T, b: T) -> (T, T) {
        match self {
            Direction::AtoB => (a, b),
            Direction::BtoA => (b, a),
        }
    }
}

impl FromStr for Direction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AtoB" => Ok(Direction::AtoB),
            "BtoA" => Ok(Direction::BtoA),
            other  => Err(ConfigError::unknown("direction", other, &Self::NAMES)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::AtoB => write!(f, "AtoB"),
            Direction::BtoA => write!(f, "BtoA"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrange_swaps_for_b_to_a() {
        assert_eq!(Direction::AtoB.arrange("a", "b"), ("a", "b"));
        assert_eq!(Direction::BtoA.arrange("a", "b"), ("b", "a"));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!("BtoA".parse::<Direction>().unwrap(), Direction::BtoA);
        assert!(matches!(
            "AtoC".parse::<Direction>(),
            Err(ConfigError::UnknownVariant { kind: "direction", .. })
        ));
    }
}
