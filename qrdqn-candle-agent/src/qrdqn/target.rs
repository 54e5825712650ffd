//! Distributional Bellman targets.
use crate::util::tau_hat;
use anyhow::Result;
use candle_core::{DType, Tensor, D};

/// Builds the target distribution and the quantile levels it is regressed on.
///
/// * `next_dist_all` - Output of the target network for the next observations,
///   `[batch, action_dim, quant_num]`. It is detached here.
/// * `reward`, `is_not_done` - `[batch]`.
/// * `clamp` - If given, target quantiles are clamped into `[min, max]`.
///
/// The greedy next action is chosen by the mean of the quantiles of the
/// target network itself. The returned tensors are both `[batch, quant_num]`:
/// `target = reward + gamma * (1 - done) * next_dist` and the levels
/// assigned by [`rank_tau`] to the gathered `next_dist`.
pub fn target_distribution(
    next_dist_all: &Tensor,
    reward: &Tensor,
    is_not_done: &Tensor,
    gamma: f64,
    clamp: Option<(f64, f64)>,
) -> Result<(Tensor, Tensor)> {
    let next_dist_all = next_dist_all.detach();
    let (batch_size, _, quant_num) = next_dist_all.dims3()?;

    // [batch, 1, quant_num]
    let next_act = next_dist_all
        .mean(D::Minus1)?
        .argmax_keepdim(D::Minus1)?
        .unsqueeze(D::Minus1)?
        .broadcast_as((batch_size, 1, quant_num))?
        .contiguous()?;
    let next_dist = next_dist_all.gather(&next_act, 1)?.squeeze(1)?;

    let discount = is_not_done.affine(gamma, 0.)?.unsqueeze(1)?;
    let target = next_dist
        .broadcast_mul(&discount)?
        .broadcast_add(&reward.unsqueeze(1)?)?;
    let target = match clamp {
        Some((min, max)) => target.clamp(min, max)?,
        None => target,
    };

    let tau = rank_tau(&next_dist)?;

    Ok((target.detach(), tau))
}

/// Assigns quantile levels to the elements of each row by their rank.
///
/// With `quant_idx = argsort(dist)` in ascending order, the result satisfies
/// `tau[b, quant_idx[b, r]] = tau_hat[r]`: the smallest element of a row gets
/// `tau_hat[0]` and the largest gets `tau_hat[quant_num - 1]`.
///
/// `dist` is `[batch, quant_num]`.
pub fn rank_tau(dist: &Tensor) -> Result<Tensor> {
    let (batch_size, quant_num) = dist.dims2()?;

    // The rank of each element is the argsort of the argsort
    let quant_idx = dist.contiguous()?.arg_sort_last_dim(true)?;
    let ranks = quant_idx
        .to_dtype(DType::F32)?
        .arg_sort_last_dim(true)?
        .contiguous()?;

    let tau_hat = tau_hat(quant_num, dist.device())?
        .unsqueeze(0)?
        .broadcast_as((batch_size, quant_num))?
        .contiguous()?;
    Ok(tau_hat.gather(&ranks, 1)?)
}
