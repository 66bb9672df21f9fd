// Learning-rate policies, evaluated once at the start of every epoch.
//
//   linear  constant for n_epochs, then linear decay over n_epochs_decay
//   step    × 0.1 every lr_decay_iters epochs
//   cosine  cosine annealing to 0 over n_epochs + n_epochs_decay

use std::{f64::consts::PI, fmt, str::FromStr};
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LrPolicy {
    Linear,
    Step,
    Cosine,
}

impl LrPolicy {
    pub const NAMES: [&'static str; 3] = ["linear", "step", "cosine"];
}

impl FromStr for LrPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(LrPolicy::Linear),
            "step"   => Ok(LrPolicy::Step),
            "cosine" => Ok(LrPolicy::Cosine),
            other    => Err(ConfigError::unknown("lr policy", other, &Self::NAMES)),
        }
    }
}

impl fmt::Display for LrPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LrPolicy::Linear => "linear",
            LrPolicy::Step   => "step",
            LrPolicy::Cosine => "cosine",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LrSchedule {
    pub policy:         LrPolicy,
    pub base_lr:        f64,
    pub n_epochs:       usize,
    pub n_epochs_decay: usize,
    pub lr_decay_iters: usize,
}

impl LrSchedule {
    /// Learning rate for a 1-based epoch.
    pub fn lr_at(&self, epoch: usize) -> f64 {
        let e = epoch.max(1);
        let factor = match self.policy {
            LrPolicy::Linear => {
                let past = e.saturating_sub(self.n_epochs) as f64;
                1.0 - past / (self.n_epochs_decay as f64 + 1.0)
            }
            LrPolicy::Step => {
                let steps = (e - 1) / self.lr_decay_iters.max(1);
                0.1f64.powi(steps as i32)
            }
            LrPolicy::Cosine => {
                let total = (self.n_epochs + self.n_epochs_decay).max(1) as f64;
                let t = ((e - 1) as f64).min(total);
                0.5 * (1.0 + (PI * t / total).cos())
            }
        };
        self.base_lr * factor.max(0.0)
    }

    pub fn total_epochs(&self) -> usize {
        self.n_epochs + self.n_epochs_decay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(policy: LrPolicy) -> LrSchedule {
        LrSchedule { policy, base_lr: 2e-4, n_epochs: 10, n_epochs_decay: 10, lr_decay_iters: 5 }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_linear_holds_then_decays() {
        let s = schedule(LrPolicy::Linear);
        assert!(close(s.lr_at(1), 2e-4));
        assert!(close(s.lr_at(10), 2e-4));
        assert!(s.lr_at(11) < 2e-4);
        assert!(s.lr_at(20) > 0.0);
        assert!(s.lr_at(20) < s.lr_at(15));
    }

    #[test]
    fn test_step_divides_by_ten() {
        let s = schedule(LrPolicy::Step);
        assert!(close(s.lr_at(5), 2e-4));
        assert!(close(s.lr_at(6), 2e-5));
        assert!(close(s.lr_at(11), 2e-6));
    }

    #[test]
    fn test_cosine_starts_at_base_and_falls() {
        let s = schedule(LrPolicy::Cosine);
        assert!(close(s.lr_at(1), 2e-4));
        assert!(close(s.lr_at(11), 1e-4));
        assert!(s.lr_at(20) < s.lr_at(19));
    }

    #[test]
    fn test_unknown_policy() {
        assert!("plateau".parse::<LrPolicy>().is_err());
    }
}
