//! Optimizers.
use anyhow::Result;
use candle_core::{Tensor, Var};
use candle_nn::{AdamW, Optimizer as _, ParamsAdamW};
use candle_optimisers::adam::{Adam, ParamsAdam};
use serde::{Deserialize, Serialize};

/// Update rule of an optimizer.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub enum Algorithm {
    /// Adam with the default moment decays.
    #[default]
    Adam,

    /// AdamW with decoupled weight decay.
    AdamW {
        #[serde(default = "default_weight_decay")]
        weight_decay: f64,
    },
}

fn default_weight_decay() -> f64 {
    ParamsAdamW::default().weight_decay
}

/// Configuration of the optimizer of the action-value network.
///
/// The learning rate is kept apart from the update rule so that a training
/// profile can override it without knowing which rule is in use.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct OptimizerConfig {
    /// Learning rate.
    pub lr: f64,

    /// Update rule.
    #[serde(default)]
    pub algorithm: Algorithm,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::adam(1e-3)
    }
}

impl OptimizerConfig {
    /// Adam with learning rate `lr`.
    pub fn adam(lr: f64) -> Self {
        Self {
            lr,
            algorithm: Algorithm::Adam,
        }
    }

    /// AdamW with learning rate `lr`.
    pub fn adam_w(lr: f64, weight_decay: f64) -> Self {
        Self {
            lr,
            algorithm: Algorithm::AdamW { weight_decay },
        }
    }

    /// Overrides the learning rate, keeping the update rule.
    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.lr = lr;
        self
    }

    /// Constructs an optimizer over the given variables.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        let opt = match self.algorithm {
            Algorithm::Adam => {
                let params = ParamsAdam {
                    lr: self.lr,
                    ..ParamsAdam::default()
                };
                Optimizer::Adam(Adam::new(vars, params)?)
            }
            Algorithm::AdamW { weight_decay } => {
                let params = ParamsAdamW {
                    lr: self.lr,
                    weight_decay,
                    ..ParamsAdamW::default()
                };
                Optimizer::AdamW(AdamW::new(vars, params)?)
            }
        };
        Ok(opt)
    }
}

/// Optimizers.
pub enum Optimizer {
    /// AdamW optimizer.
    AdamW(AdamW),

    /// Adam optimizer.
    Adam(Adam),
}

impl Optimizer {
    /// Applies a backward step pass.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        match self {
            Self::AdamW(opt) => Ok(opt.backward_step(loss)?),
            Self::Adam(opt) => Ok(opt.backward_step(loss)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    fn minimize_square(config: &OptimizerConfig) -> Result<f32> {
        let x = Var::new(&[1f32], &Device::Cpu)?;
        let mut opt = config.build(vec![x.clone()])?;
        let loss = x.as_tensor().sqr()?.sum_all()?;
        opt.backward_step(&loss)?;
        Ok(x.as_tensor().to_vec1::<f32>()?[0])
    }

    #[test]
    fn test_step_descends() -> Result<()> {
        assert!(minimize_square(&OptimizerConfig::adam(0.1))? < 1.0);
        assert!(minimize_square(&OptimizerConfig::adam_w(0.1, 0.0))? < 1.0);
        Ok(())
    }

    #[test]
    fn test_learning_rate_keeps_algorithm() {
        let config = OptimizerConfig::adam_w(1e-3, 0.01).learning_rate(5e-4);
        assert_eq!(config.lr, 5e-4);
        assert_eq!(config.algorithm, Algorithm::AdamW { weight_decay: 0.01 });
    }

    #[test]
    fn test_algorithm_defaults_to_adam() -> Result<()> {
        let config: OptimizerConfig = serde_yaml::from_str("lr: 0.0005")?;
        assert_eq!(config, OptimizerConfig::adam(5e-4));
        Ok(())
    }
}
