//! Optimizers.
use crate::util::clip_grad_norm;
use anyhow::Result;
use candle_core::{backprop::GradStore, Tensor, Var};
use candle_nn::{AdamW, Optimizer as _, ParamsAdamW};
use candle_optimisers::adam::{Adam, ParamsAdam};
use serde::{Deserialize, Serialize};

/// Configuration of optimizer for training the quantile value network.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// AdamW optimizer.
    AdamW {
        /// Learning rate.
        lr: f64,
        /// Decay rate of the first moment.
        #[serde(default = "default_beta1")]
        beta1: f64,
        /// Decay rate of the second moment.
        #[serde(default = "default_beta2")]
        beta2: f64,
        /// Term added to the denominator for numerical stability.
        #[serde(default = "default_eps")]
        eps: f64,
        /// Weight decay.
        #[serde(default = "default_weight_decay")]
        weight_decay: f64,
    },

    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
    },
}

fn default_beta1() -> f64 {
    ParamsAdamW::default().beta1
}

fn default_beta2() -> f64 {
    ParamsAdamW::default().beta2
}

fn default_eps() -> f64 {
    ParamsAdamW::default().eps
}

fn default_weight_decay() -> f64 {
    ParamsAdamW::default().weight_decay
}

impl OptimizerConfig {
    /// Constructs an optimizer over the given variables.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        match &self {
            OptimizerConfig::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => {
                let params = ParamsAdamW {
                    lr: *lr,
                    beta1: *beta1,
                    beta2: *beta2,
                    eps: *eps,
                    weight_decay: *weight_decay,
                };
                let opt = AdamW::new(vars.clone(), params)?;
                Ok(Optimizer::AdamW(opt, vars))
            }
            OptimizerConfig::Adam { lr } => {
                let params = ParamsAdam {
                    lr: *lr,
                    ..ParamsAdam::default()
                };
                let opt = Adam::new(vars.clone(), params)?;
                Ok(Optimizer::Adam(opt, vars))
            }
        }
    }

    /// Override learning rate.
    pub fn learning_rate(self, lr: f64) -> Self {
        match self {
            Self::AdamW {
                lr: _,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => Self::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            },
            Self::Adam { lr: _ } => Self::Adam { lr },
        }
    }

    /// Returns the learning rate.
    pub fn lr(&self) -> f64 {
        match self {
            Self::AdamW { lr, .. } => *lr,
            Self::Adam { lr } => *lr,
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam { lr: 1e-3 }
    }
}

/// Optimizers.
///
/// Each variant keeps the variables it updates, which are needed for
/// gradient clipping.
pub enum Optimizer {
    /// AdamW optimizer.
    AdamW(AdamW, Vec<Var>),

    /// Adam optimizer.
    Adam(Adam, Vec<Var>),
}

impl Optimizer {
    fn vars(&self) -> &[Var] {
        match self {
            Self::AdamW(_, vars) => vars,
            Self::Adam(_, vars) => vars,
        }
    }

    /// Applies a backward step pass.
    ///
    /// If `max_grad_norm` is given, gradients are rescaled so that their
    /// global L2 norm does not exceed it. Returns the norm before clipping.
    pub fn backward_step(&mut self, loss: &Tensor, max_grad_norm: Option<f64>) -> Result<f32> {
        let mut grads = loss.backward()?;
        let grad_norm = clip_grad_norm(&mut grads, self.vars(), max_grad_norm)?;
        self.step(&grads)?;
        Ok(grad_norm)
    }

    /// Updates the variables with the given gradients.
    pub fn step(&mut self, grads: &GradStore) -> Result<()> {
        match self {
            Self::AdamW(opt, _) => Ok(opt.step(grads)?),
            Self::Adam(opt, _) => Ok(opt.step(grads)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_learning_rate() {
        let config = OptimizerConfig::default().learning_rate(5e-4);
        assert_eq!(config, OptimizerConfig::Adam { lr: 5e-4 });
        assert_eq!(config.lr(), 5e-4);
    }

    #[test]
    fn test_backward_step_moves_parameters() -> Result<()> {
        let var = Var::from_tensor(&Tensor::new(&[1f32, -2.0], &Device::Cpu)?)?;
        let mut opt = OptimizerConfig::Adam { lr: 0.1 }.build(vec![var.clone()])?;
        let loss = var.as_tensor().sqr()?.sum_all()?;
        let before = var.as_tensor().to_vec1::<f32>()?;
        opt.backward_step(&loss, Some(0.5))?;
        let after = var.as_tensor().to_vec1::<f32>()?;
        assert!(after[0] < before[0]);
        assert!(after[1] > before[1]);
        Ok(())
    }

    #[test]
    fn test_adamw() -> Result<()> {
        let config: OptimizerConfig = serde_yaml::from_str("AdamW:\n  lr: 0.1\n")?;
        let config = config.learning_rate(0.05);
        assert_eq!(config.lr(), 0.05);
        match &config {
            OptimizerConfig::AdamW { weight_decay, .. } => {
                assert_eq!(*weight_decay, ParamsAdamW::default().weight_decay)
            }
            _ => panic!("expected AdamW, got {:?}", config),
        }

        let var = Var::from_tensor(&Tensor::new(&[1f32, -2.0], &Device::Cpu)?)?;
        let mut opt = config.build(vec![var.clone()])?;
        assert!(matches!(opt, Optimizer::AdamW(..)));
        for _ in 0..3 {
            let loss = var.as_tensor().sqr()?.sum_all()?;
            opt.backward_step(&loss, None)?;
        }
        let after = var.as_tensor().to_vec1::<f32>()?;
        assert!(after[0] < 1.0 && after[0] > 0.0);
        assert!(after[1] > -2.0 && after[1] < 0.0);
        Ok(())
    }
}
