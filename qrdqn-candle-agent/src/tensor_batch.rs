use anyhow::Result;
use candle_core::{Device, Tensor};
use qrdqn_core::replay_buffer::TransitionBatch;

/// A batch of transitions as tensors on a device.
///
/// `B` is the batch size and `D` the observation dimension.
#[derive(Clone, Debug)]
pub struct TensorBatch {
    /// One-hot observations, `[B, D]`, `f32`.
    pub obs: Tensor,

    /// Actions, `[B]`, `u32`.
    pub act: Tensor,

    /// Rewards, `[B]`, `f32`.
    pub reward: Tensor,

    /// One-hot next observations, `[B, D]`, `f32`.
    pub next_obs: Tensor,

    /// `1 - done`, `[B]`, `f32`.
    pub is_not_done: Tensor,
}

impl TensorBatch {
    /// Converts a batch sampled from the replay buffer.
    pub fn from_batch(batch: &TransitionBatch, device: &Device) -> Result<Self> {
        let n = batch.len();
        let dim = batch.observation_dim;
        let act = batch.act.iter().map(|a| *a as u32).collect::<Vec<_>>();
        let is_not_done = batch
            .is_done
            .iter()
            .map(|d| if *d { 0f32 } else { 1f32 })
            .collect::<Vec<_>>();

        Ok(Self {
            obs: Tensor::from_slice(&batch.obs[..], (n, dim), device)?,
            act: Tensor::from_vec(act, (n,), device)?,
            reward: Tensor::from_slice(&batch.reward[..], (n,), device)?,
            next_obs: Tensor::from_slice(&batch.next_obs[..], (n, dim), device)?,
            is_not_done: Tensor::from_vec(is_not_done, (n,), device)?,
        })
    }

    /// Returns the batch size.
    pub fn len(&self) -> usize {
        self.act.dims()[0]
    }

    /// Returns `true` if the batch has no transition.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
