//! Exploration strategy of QR-DQN.
use crate::util::argmax_first;
use anyhow::Result;
use qrdqn_core::error::QrDqnError;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Epsilon-greedy explorer with multiplicative per-episode decay.
///
/// `eps` is the current exploration rate. It is multiplied by `eps_decay`
/// at the end of every episode and never goes below `eps_min`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Current exploration rate.
    pub eps: f64,

    /// Decay factor applied once per episode.
    pub eps_decay: f64,

    /// Lower bound of the exploration rate.
    pub eps_min: f64,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            eps: 0.95,
            eps_decay: 0.995,
            eps_min: 0.01,
        }
    }
}

impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial exploration rate.
    pub fn eps(mut self, v: f64) -> Self {
        self.eps = v;
        self
    }

    /// Set the decay factor.
    pub fn eps_decay(mut self, v: f64) -> Self {
        self.eps_decay = v;
        self
    }

    /// Set the lower bound of the exploration rate.
    pub fn eps_min(mut self, v: f64) -> Self {
        self.eps_min = v;
        self
    }

    /// Returns the current exploration rate.
    pub fn epsilon(&self) -> f64 {
        self.eps
    }

    /// Decays the exploration rate, returns the new value.
    pub fn decay(&mut self) -> f64 {
        if self.eps > self.eps_min {
            self.eps = (self.eps * self.eps_decay).max(self.eps_min);
        }
        self.eps
    }

    pub(super) fn check(&self) -> Result<(), QrDqnError> {
        for (name, v) in [
            ("eps", self.eps),
            ("eps_decay", self.eps_decay),
            ("eps_min", self.eps_min),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(QrDqnError::Config(format!(
                    "{} must be in [0, 1], got {}",
                    name, v
                )));
            }
        }
        Ok(())
    }
}

/// Epsilon-greedy selection over action values.
pub(super) fn select(values: &[f32], eps: f64, rng: &mut impl Rng) -> Result<usize> {
    if values.is_empty() {
        return Err(QrDqnError::Config("The action space is empty".to_string()).into());
    }
    if rng.gen::<f64>() < eps {
        Ok(rng.gen_range(0..values.len()))
    } else {
        argmax_first(values).ok_or_else(|| QrDqnError::Config("No action value".to_string()).into())
    }
}
