use super::MlpConfig;
use crate::model::SubModel1;
use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::{linear, Linear, Module, VarBuilder};

/// Returns vector of linear modules from [`MlpConfig`].
fn create_linear_layers(prefix: &str, vs: VarBuilder, config: &MlpConfig) -> Result<Vec<Linear>> {
    let vs = vs.pp(prefix);
    let mut layers = vec![];

    for (i, (in_dim, out_dim)) in config.in_out_pairs().into_iter().enumerate() {
        layers.push(linear(in_dim, out_dim, vs.pp(format!("ln{}", i)))?);
    }

    Ok(layers)
}

/// Multilayer perceptron with ReLU activation function.
///
/// No activation is applied after the last layer.
pub struct Mlp {
    device: Device,
    layers: Vec<Linear>,
}

impl SubModel1 for Mlp {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, xs: &Self::Input) -> Result<Tensor> {
        let n_layers = self.layers.len();
        let mut xs = xs.to_device(&self.device)?;

        for (i, layer) in self.layers.iter().enumerate() {
            xs = layer.forward(&xs)?;
            if i + 1 < n_layers {
                xs = xs.relu()?;
            }
        }

        Ok(xs)
    }

    fn build(vs: VarBuilder, config: Self::Config) -> Result<Self> {
        let device = vs.device().clone();
        let layers = create_linear_layers("mlp", vs, &config)?;

        Ok(Mlp { device, layers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use candle_nn::VarMap;

    #[test]
    fn test_mlp_shapes() -> Result<()> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let mlp = Mlp::build(vb, MlpConfig::new(16, vec![32, 64, 128], 40))?;

        // 4 layers, each with weight and bias
        assert_eq!(varmap.all_vars().len(), 8);

        let xs = Tensor::zeros((5, 16), DType::F32, &device)?;
        assert_eq!(mlp.forward(&xs)?.dims(), &[5, 40]);
        Ok(())
    }

    #[test]
    fn test_mlp_without_hidden_layers() -> Result<()> {
        let config = MlpConfig::new(3, vec![], 2);
        assert_eq!(config.in_out_pairs(), vec![(3, 2)]);
        Ok(())
    }
}
