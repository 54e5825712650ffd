//! Configuration of QR-DQN agent.
use super::{EpsilonGreedy, QrDqnModelConfig};
use crate::{opt::OptimizerConfig, Device};
use anyhow::Result;
use qrdqn_core::error::QrDqnError;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`QrDqn`](super::QrDqn) agent.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct QrDqnConfig {
    pub(super) model_config: QrDqnModelConfig,
    pub(super) gamma: f64,
    pub(super) batch_size: usize,
    pub(super) update_freq: usize,
    pub(super) k: f64,
    pub(super) max_grad_norm: Option<f64>,
    pub(super) target_clamp: Option<(f64, f64)>,
    pub(super) train: bool,
    pub(super) explorer: EpsilonGreedy,
    pub(super) seed: u64,
    pub device: Option<Device>,
}

impl Default for QrDqnConfig {
    fn default() -> Self {
        Self {
            model_config: Default::default(),
            gamma: 0.99,
            batch_size: 64,
            update_freq: 200,
            k: 1.0,
            max_grad_norm: Some(0.5),
            target_clamp: Some((0.0, 1.0)),
            train: false,
            explorer: EpsilonGreedy::default(),
            seed: 42,
            device: Some(Device::Cpu),
        }
    }
}

impl QrDqnConfig {
    /// Sets the configuration of the model.
    pub fn model_config(mut self, model_config: QrDqnModelConfig) -> Self {
        self.model_config = model_config;
        self
    }

    /// Sets the cardinality of the observation space.
    pub fn observation_dim(mut self, v: usize) -> Self {
        self.model_config = self.model_config.observation_dim(v);
        self
    }

    /// Sets the number of actions.
    pub fn action_dim(mut self, v: usize) -> Self {
        self.model_config = self.model_config.action_dim(v);
        self
    }

    /// Sets the number of quantiles per action.
    pub fn quant_num(mut self, v: usize) -> Self {
        self.model_config = self.model_config.quant_num(v);
        self
    }

    /// Sets the learning rate of the optimizer.
    pub fn learning_rate(mut self, v: f64) -> Self {
        let opt_config = self.model_config.opt_config.clone().learning_rate(v);
        self.model_config = self.model_config.opt_config(opt_config);
        self
    }

    /// Sets the optimizer.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.model_config = self.model_config.opt_config(v);
        self
    }

    /// Discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Interval of hard updates of the target network in optimization steps.
    pub fn update_freq(mut self, v: usize) -> Self {
        self.update_freq = v;
        self
    }

    /// Threshold of the Huber loss.
    pub fn k(mut self, v: f64) -> Self {
        self.k = v;
        self
    }

    /// Bound of the global L2 norm of gradients, `None` disables clipping.
    pub fn max_grad_norm(mut self, v: Option<f64>) -> Self {
        self.max_grad_norm = v;
        self
    }

    /// Range of target quantiles, `None` disables clamping.
    pub fn target_clamp(mut self, v: Option<(f64, f64)>) -> Self {
        self.target_clamp = v;
        self
    }

    /// Set explorer.
    pub fn explorer(mut self, v: EpsilonGreedy) -> Self {
        self.explorer = v;
        self
    }

    /// Seed of the random number generator for exploration.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = Some(v);
        self
    }

    /// Rejects values the agent cannot work with.
    pub fn check(&self) -> Result<(), QrDqnError> {
        self.model_config.check()?;
        self.explorer.check()?;
        if self.batch_size == 0 {
            return Err(QrDqnError::Config("batch_size must be positive".into()));
        }
        if self.update_freq == 0 {
            return Err(QrDqnError::Config("update_freq must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(QrDqnError::Config(format!(
                "gamma must be in [0, 1], got {}",
                self.gamma
            )));
        }
        if self.k <= 0.0 {
            return Err(QrDqnError::Config(format!(
                "k must be positive, got {}",
                self.k
            )));
        }
        if let Some((min, max)) = self.target_clamp {
            if min > max {
                return Err(QrDqnError::Config(format!(
                    "target_clamp has min {} larger than max {}",
                    min, max
                )));
            }
        }
        if self.device.is_none() {
            return Err(QrDqnError::Config("No device is given".into()));
        }
        Ok(())
    }

    /// Constructs [`QrDqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        log::info!("Load config of QR-DQN agent from {}", path_.to_str().unwrap_or("?"));
        Ok(b)
    }

    /// Saves [`QrDqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        log::info!("Save config of QR-DQN agent into {}", path_.to_str().unwrap_or("?"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_qrdqn_config() -> Result<()> {
        let config = QrDqnConfig::default()
            .observation_dim(16)
            .action_dim(4)
            .quant_num(8)
            .learning_rate(5e-4)
            .target_clamp(None)
            .explorer(EpsilonGreedy::new().eps(0.5));

        let dir = TempDir::new("qrdqn_config")?;
        let path = dir.path().join("qrdqn_config.yaml");
        config.save(&path)?;
        let config_ = QrDqnConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_check() {
        let config = QrDqnConfig::default().observation_dim(16).action_dim(4);
        assert!(config.check().is_ok());
        assert!(config.clone().batch_size(0).check().is_err());
        assert!(config.clone().update_freq(0).check().is_err());
        assert!(config.clone().quant_num(0).check().is_err());
        assert!(config.clone().target_clamp(Some((1.0, 0.0))).check().is_err());
        assert!(QrDqnConfig::default().check().is_err());
    }
}
