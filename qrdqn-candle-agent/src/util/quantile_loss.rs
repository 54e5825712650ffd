//! Quantile loss.
use anyhow::Result;
use candle_core::{DType, Tensor};

/// Returns the element-wise Huber loss with threshold `k`.
///
/// `0.5 * u^2` for `|u| <= k` and `k * (|u| - 0.5 * k)` otherwise.
pub fn huber(u: &Tensor, k: f64) -> Result<Tensor> {
    let abs = u.abs()?;
    let clipped = abs.clamp(0f64, k)?;
    let quad = clipped.sqr()?.affine(0.5, 0.)?;
    let lin = (abs - &clipped)?.affine(k, 0.)?;
    Ok((quad + lin)?)
}

/// Returns the element-wise quantile Huber loss `|tau - 1{u < 0}| * huber(u)`.
///
/// `u` is the TD error `target - prediction`. `u` and `tau` have the same shape.
pub fn quantile_huber_loss(u: &Tensor, tau: &Tensor, k: f64) -> Result<Tensor> {
    debug_assert_eq!(u.dims(), tau.dims());

    let lt_0 = u.lt(0f32)?.to_dtype(DType::F32)?.detach();
    let weight = (tau - lt_0)?.abs()?;
    Ok((weight * huber(u, k)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_huber() -> Result<()> {
        let u = Tensor::new(&[-3f32, -0.5, 0.0, 0.5, 3.0], &Device::Cpu)?;
        let l = huber(&u, 1.0)?.to_vec1::<f32>()?;
        assert_eq!(l, vec![2.5, 0.125, 0.0, 0.125, 2.5]);
        Ok(())
    }

    #[test]
    fn test_asymmetric_weight() -> Result<()> {
        let u = Tensor::new(&[-0.5f32, 0.5], &Device::Cpu)?;
        let tau = Tensor::new(&[0.25f32, 0.25], &Device::Cpu)?;
        let l = quantile_huber_loss(&u, &tau, 1.0)?.to_vec1::<f32>()?;
        // Negative errors are weighted by 1 - tau, positive ones by tau
        assert_eq!(l, vec![0.75 * 0.125, 0.25 * 0.125]);
        Ok(())
    }
}
