use crate::{
    mlp::{Mlp, MlpConfig},
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::hard_update,
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use qrdqn_core::error::QrDqnError;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`QrDqnModel`].
pub struct QrDqnModelConfig {
    pub(super) observation_dim: usize,
    pub(super) action_dim: usize,
    pub(super) quant_num: usize,
    pub(super) units: Vec<usize>,
    pub(super) opt_config: OptimizerConfig,
}

impl Default for QrDqnModelConfig {
    fn default() -> Self {
        Self {
            observation_dim: 0,
            action_dim: 0,
            quant_num: 10,
            units: vec![32, 64, 128],
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl QrDqnModelConfig {
    /// Sets the cardinality of the observation space.
    pub fn observation_dim(mut self, v: usize) -> Self {
        self.observation_dim = v;
        self
    }

    /// Sets the number of actions.
    pub fn action_dim(mut self, v: usize) -> Self {
        self.action_dim = v;
        self
    }

    /// Sets the number of quantiles per action.
    pub fn quant_num(mut self, v: usize) -> Self {
        self.quant_num = v;
        self
    }

    /// Sets the widths of the hidden layers.
    pub fn units(mut self, v: Vec<usize>) -> Self {
        self.units = v;
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Returns the number of quantiles per action.
    pub fn get_quant_num(&self) -> usize {
        self.quant_num
    }

    pub(super) fn check(&self) -> Result<(), QrDqnError> {
        for (name, v) in [
            ("observation_dim", self.observation_dim),
            ("action_dim", self.action_dim),
            ("quant_num", self.quant_num),
        ] {
            if v == 0 {
                return Err(QrDqnError::Config(format!("{} must be positive", name)));
            }
        }
        Ok(())
    }

    fn mlp_config(&self) -> MlpConfig {
        MlpConfig::new(
            self.observation_dim,
            self.units.clone(),
            self.action_dim * self.quant_num,
        )
    }

    /// Constructs [`QrDqnModelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`QrDqnModelConfig`] to as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Quantile value network.
///
/// Maps a batch of one-hot observations `[batch, observation_dim]` to
/// quantiles of the return distribution `[batch, action_dim, quant_num]`.
pub struct QrDqnModel {
    device: Device,
    varmap: VarMap,
    config: QrDqnModelConfig,
    q: Mlp,
    opt: Optimizer,
}

impl QrDqnModel {
    /// Constructs [`QrDqnModel`] with freshly initialized parameters.
    pub fn build(config: QrDqnModelConfig, device: Device) -> Result<Self> {
        config.check()?;
        let varmap = VarMap::new();
        let q = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            Mlp::build(vb, config.mlp_config())?
        };
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self {
            device,
            varmap,
            config,
            q,
            opt,
        })
    }

    /// Returns a model with its own parameters holding the same values as
    /// this one.
    pub fn try_clone(&self) -> Result<Self> {
        let model = Self::build(self.config.clone(), self.device.clone())?;
        hard_update(&model.varmap, &self.varmap)?;
        Ok(model)
    }

    /// Outputs quantiles of all actions, `[batch, action_dim, quant_num]`.
    pub fn forward(&self, obs: &Tensor) -> Result<Tensor> {
        let batch_size = obs.dims()[0];
        let xs = self.q.forward(obs)?;
        Ok(xs.reshape((batch_size, self.config.action_dim, self.config.quant_num))?)
    }

    /// Backpropagates `loss` and updates the parameters, see
    /// [`Optimizer::backward_step`].
    pub fn backward_step(&mut self, loss: &Tensor, max_grad_norm: Option<f64>) -> Result<f32> {
        self.opt.backward_step(loss, max_grad_norm)
    }

    /// Returns the parameters.
    pub fn get_varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Returns the device where the parameters live.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Cardinality of the observation space.
    pub fn observation_dim(&self) -> usize {
        self.config.observation_dim
    }

    /// Number of actions.
    pub fn action_dim(&self) -> usize {
        self.config.action_dim
    }

    /// Number of quantiles per action.
    pub fn quant_num(&self) -> usize {
        self.config.quant_num
    }

    /// Saves the parameters in safetensors format.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save qrdqn model to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads parameters saved with [`QrDqnModel::save`].
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load qrdqn model from {:?}", path.as_ref());
        Ok(())
    }
}
