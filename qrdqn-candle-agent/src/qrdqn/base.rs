//! QR-DQN agent implemented with candle.
use super::{
    config::QrDqnConfig, explorer::select, target_distribution, EpsilonGreedy, QrDqnModel,
};
use crate::{
    util::{one_hot, quantile_huber_loss},
    TensorBatch,
};
use anyhow::Result;
use candle_core::{Device, Tensor, D};
use log::{debug, trace};
use qrdqn_core::{
    error::QrDqnError,
    record::{Record, RecordValue},
    replay_buffer::TransitionBatch,
    Agent, Configurable, Policy, ReplayBufferBase,
};
use rand::{rngs::SmallRng, SeedableRng};
use std::{fs, path::Path};

/// QR-DQN agent.
///
/// Holds the online network, which is trained, and the target network, a
/// hard copy of the online network refreshed every `update_freq`
/// optimization steps.
pub struct QrDqn {
    pub(in crate::qrdqn) qnet: QrDqnModel,
    pub(in crate::qrdqn) qnet_tgt: QrDqnModel,
    pub(in crate::qrdqn) gamma: f64,
    pub(in crate::qrdqn) batch_size: usize,
    pub(in crate::qrdqn) update_freq: usize,
    pub(in crate::qrdqn) k: f64,
    pub(in crate::qrdqn) max_grad_norm: Option<f64>,
    pub(in crate::qrdqn) target_clamp: Option<(f64, f64)>,
    pub(in crate::qrdqn) train: bool,
    pub(in crate::qrdqn) explorer: EpsilonGreedy,
    pub(in crate::qrdqn) device: Device,
    pub(in crate::qrdqn) n_opts: usize,
    rng: SmallRng,
}

impl QrDqn {
    /// Returns the mean of the quantiles of each action for an observation.
    pub fn q_values(&self, obs: usize) -> Result<Vec<f32>> {
        let obs = one_hot(&[obs], self.qnet.observation_dim(), &self.device)?;
        let dist = self.qnet.forward(&obs)?;
        Ok(dist.mean(D::Minus1)?.squeeze(0)?.to_vec1::<f32>()?)
    }

    /// Selects an action for a single observation.
    ///
    /// With probability `epsilon` the action is uniformly random. Otherwise
    /// it is the action with the largest mean quantile, the lowest index
    /// among ties.
    pub fn act(&mut self, obs: usize, epsilon: f64) -> Result<usize> {
        let q = self.q_values(obs)?;
        select(&q, epsilon, &mut self.rng)
    }

    /// Computes the quantile Huber loss of the online network on a batch.
    ///
    /// The loss is summed over quantiles and the batch, then divided by the
    /// batch size.
    pub fn loss(&self, batch: &TensorBatch) -> Result<Tensor> {
        let batch_size = batch.len();
        let quant_num = self.qnet.quant_num();

        // Quantiles of the taken actions, [batch, quant_num]
        let dist = {
            let act = batch
                .act
                .reshape((batch_size, 1, 1))?
                .broadcast_as((batch_size, 1, quant_num))?
                .contiguous()?;
            self.qnet.forward(&batch.obs)?.gather(&act, 1)?.squeeze(1)?
        };

        let (target_dist, tau) = {
            let next_dist_all = self.qnet_tgt.forward(&batch.next_obs)?;
            target_distribution(
                &next_dist_all,
                &batch.reward,
                &batch.is_not_done,
                self.gamma,
                self.target_clamp,
            )?
        };

        let u = (target_dist - dist)?;
        let loss = quantile_huber_loss(&u, &tau, self.k)?
            .sum_all()?
            .affine(1.0 / batch_size as f64, 0.)?;

        Ok(loss)
    }

    /// Copies the online network into the target network.
    pub fn sync_target(&mut self) -> Result<()> {
        crate::util::hard_update(self.qnet_tgt.get_varmap(), self.qnet.get_varmap())
    }

    /// Returns the number of optimization steps done so far.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Returns the current exploration rate.
    pub fn epsilon(&self) -> f64 {
        self.explorer.epsilon()
    }

    /// Returns the online network.
    pub fn qnet(&self) -> &QrDqnModel {
        &self.qnet
    }

    /// Returns the target network.
    pub fn qnet_tgt(&self) -> &QrDqnModel {
        &self.qnet_tgt
    }

    fn opt_(&mut self, batch: TransitionBatch) -> Result<Record> {
        let action_dim = self.qnet.action_dim();
        if let Some(&action) = batch.act.iter().find(|a| **a >= action_dim) {
            return Err(QrDqnError::InvalidAction { action, action_dim }.into());
        }
        let batch = TensorBatch::from_batch(&batch, &self.device)?;
        let loss = self.loss(&batch)?;
        let loss_value = loss.to_scalar::<f32>()?;
        if !loss_value.is_finite() {
            return Err(QrDqnError::NonFiniteLoss(loss_value, self.n_opts).into());
        }

        let grad_norm = self.qnet.backward_step(&loss, self.max_grad_norm)?;
        self.n_opts += 1;
        trace!("n_opts: {}  loss: {}", self.n_opts, loss_value);

        if self.n_opts % self.update_freq == 0 {
            self.sync_target()?;
            debug!("Synchronized the target network at n_opts = {}", self.n_opts);
        }

        Ok(Record::from_slice(&[
            ("loss", RecordValue::Scalar(loss_value)),
            ("grad_norm", RecordValue::Scalar(grad_norm)),
        ]))
    }
}

impl Policy for QrDqn {
    /// In evaluation mode, the action is greedy.
    fn sample(&mut self, obs: usize) -> Result<usize> {
        let eps = match self.train {
            true => self.explorer.epsilon(),
            false => 0.0,
        };
        self.act(obs, eps)
    }
}

impl Configurable for QrDqn {
    type Config = QrDqnConfig;

    /// Constructs QR-DQN agent.
    ///
    /// The target network starts as a copy of the online network.
    fn build(config: Self::Config) -> Result<Self> {
        config.check()?;
        let device: Device = match config.device {
            Some(device) => device.try_into()?,
            None => return Err(QrDqnError::Config("No device is given".into()).into()),
        };
        let qnet = QrDqnModel::build(config.model_config, device.clone())?;
        let qnet_tgt = qnet.try_clone()?;

        Ok(QrDqn {
            qnet,
            qnet_tgt,
            gamma: config.gamma,
            batch_size: config.batch_size,
            update_freq: config.update_freq,
            k: config.k,
            max_grad_norm: config.max_grad_norm,
            target_clamp: config.target_clamp,
            train: config.train,
            explorer: config.explorer,
            device,
            n_opts: 0,
            rng: SmallRng::seed_from_u64(config.seed),
        })
    }
}

impl<R> Agent<R> for QrDqn
where
    R: ReplayBufferBase<Batch = TransitionBatch>,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn opt(&mut self, buffer: &mut R) -> Result<Record> {
        let batch = buffer.batch(self.batch_size)?;
        self.opt_(batch)
    }

    fn on_episode_end(&mut self) -> Record {
        let eps = self.explorer.decay();
        Record::from_scalar("epsilon", eps as f32)
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.qnet.save(path.join("qnet.safetensors"))?;
        self.qnet_tgt.save(path.join("qnet_tgt.safetensors"))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.qnet.load(path.join("qnet.safetensors"))?;
        self.qnet_tgt.load(path.join("qnet_tgt.safetensors"))?;
        Ok(())
    }
}
