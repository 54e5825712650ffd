//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::{backprop::GradStore, Device, Tensor, Var};
use candle_nn::VarMap;
use log::trace;
mod quantile_loss;
pub use quantile_loss::{huber, quantile_huber_loss};

/// Copies variables of `src` into `dest`.
///
/// Variables are identified by their names. After this call `dest` holds
/// the same values as `src` while the two maps still own separate storage.
pub fn hard_update(dest: &VarMap, src: &VarMap) -> Result<()> {
    trace!("dest");
    let dest = dest
        .data()
        .lock()
        .map_err(|_| anyhow!("Lock of the destination variables is poisoned"))?;
    trace!("src");
    let src = src
        .data()
        .lock()
        .map_err(|_| anyhow!("Lock of the source variables is poisoned"))?;

    for (k_dest, v_dest) in dest.iter() {
        let v_src = src
            .get(k_dest)
            .ok_or_else(|| anyhow!("Variable {} is not found in the source", k_dest))?;
        v_dest.set(v_src.as_tensor())?;
    }

    Ok(())
}

/// Rescales gradients of `vars` so that their global L2 norm is at most
/// `max_norm` and returns the norm before rescaling.
///
/// With `max_norm == None` the gradients are left untouched.
pub fn clip_grad_norm(grads: &mut GradStore, vars: &[Var], max_norm: Option<f64>) -> Result<f32> {
    let mut sq_sum = 0f32;
    for var in vars {
        if let Some(g) = grads.get(var.as_tensor()) {
            sq_sum += g.sqr()?.sum_all()?.to_scalar::<f32>()?;
        }
    }
    let total_norm = sq_sum.sqrt();

    if let Some(max_norm) = max_norm {
        let coef = max_norm / (total_norm as f64 + 1e-6);
        if coef < 1.0 {
            for var in vars {
                if let Some(g) = grads.remove(var.as_tensor()) {
                    grads.insert(var.as_tensor(), g.affine(coef, 0.)?);
                }
            }
        }
    }

    Ok(total_norm)
}

/// Returns the index of the largest value, the lowest index among ties.
///
/// Returns `None` for an empty slice.
pub fn argmax_first(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Midpoint quantile levels `tau_hat[i] = (i + 0.5) / n`, shape `[n]`.
pub fn tau_hat(n: usize, device: &Device) -> Result<Tensor> {
    let v = (0..n)
        .map(|i| (i as f32 + 0.5) / n as f32)
        .collect::<Vec<_>>();
    Ok(Tensor::from_vec(v, (n,), device)?)
}

/// Converts observation indices into one-hot rows, shape `[obs.len(), dim]`.
pub fn one_hot(obs: &[usize], dim: usize, device: &Device) -> Result<Tensor> {
    let mut v = vec![0f32; obs.len() * dim];
    for (i, &o) in obs.iter().enumerate() {
        if o >= dim {
            return Err(qrdqn_core::error::QrDqnError::ObservationOutOfRange {
                obs: o,
                observation_dim: dim,
            }
            .into());
        }
        v[i * dim + o] = 1.0;
    }
    Ok(Tensor::from_vec(v, (obs.len(), dim), device)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use candle_nn::Init;

    fn varmap_with(v: &[f32]) -> Result<VarMap> {
        let vm = VarMap::new();
        let init = Init::Randn {
            mean: 0.0,
            stdev: 1.0,
        };
        vm.get((v.len(),), "var1", init, DType::F32, &Device::Cpu)?;
        set(&vm, v)?;
        Ok(vm)
    }

    fn set(vm: &VarMap, v: &[f32]) -> Result<()> {
        let t = Tensor::from_slice(v, (v.len(),), &Device::Cpu)?;
        vm.data().lock().unwrap().get("var1").unwrap().set(&t)?;
        Ok(())
    }

    fn values(vm: &VarMap) -> Result<Vec<f32>> {
        let data = vm.data().lock().unwrap();
        Ok(data.get("var1").unwrap().as_tensor().to_vec1::<f32>()?)
    }

    #[test]
    fn test_hard_update() -> Result<()> {
        let vm_src = varmap_with(&[1.0, 2.0, 3.0])?;
        let vm_dest = varmap_with(&[4.0, 5.0, 6.0])?;
        hard_update(&vm_dest, &vm_src)?;
        assert_eq!(values(&vm_dest)?, vec![1.0, 2.0, 3.0]);

        // Storage is not shared
        set(&vm_src, &[7.0, 8.0, 9.0])?;
        assert_eq!(values(&vm_dest)?, vec![1.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_clip_grad_norm() -> Result<()> {
        let x = Var::from_tensor(&Tensor::new(&[3f32, 4.0], &Device::Cpu)?)?;
        // d/dx sum(x^2) = 2x, norm 10
        let loss = x.as_tensor().sqr()?.sum_all()?;

        let mut grads = loss.backward()?;
        let norm = clip_grad_norm(&mut grads, &[x.clone()], Some(0.5))?;
        assert!((norm - 10.0).abs() < 1e-4);
        let g = grads.get(x.as_tensor()).unwrap().to_vec1::<f32>()?;
        let clipped = (g[0] * g[0] + g[1] * g[1]).sqrt();
        assert!((clipped - 0.5).abs() < 1e-4);

        let mut grads = loss.backward()?;
        clip_grad_norm(&mut grads, &[x.clone()], None)?;
        let g = grads.get(x.as_tensor()).unwrap().to_vec1::<f32>()?;
        assert_eq!(g, vec![6.0, 8.0]);
        Ok(())
    }

    #[test]
    fn test_argmax_first() {
        assert_eq!(argmax_first(&[0.1, 0.5, 0.5, 0.2]), Some(1));
        assert_eq!(argmax_first(&[1.0, 1.0]), Some(0));
        assert_eq!(argmax_first(&[]), None);
    }

    #[test]
    fn test_tau_hat() -> Result<()> {
        let t = tau_hat(4, &Device::Cpu)?.to_vec1::<f32>()?;
        assert_eq!(t, vec![0.125, 0.375, 0.625, 0.875]);
        Ok(())
    }

    #[test]
    fn test_one_hot() -> Result<()> {
        let t = one_hot(&[2, 0], 3, &Device::Cpu)?.to_vec2::<f32>()?;
        assert_eq!(t, vec![vec![0., 0., 1.], vec![1., 0., 0.]]);
        assert!(one_hot(&[3], 3, &Device::Cpu).is_err());
        Ok(())
    }
}
