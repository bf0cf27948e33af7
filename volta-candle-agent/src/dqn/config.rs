//! Configuration of DQN agent.
use super::{explorer::EpsilonGreedy, DqnModelConfig};
use crate::{util::OutDim, Device};
use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Dqn`](super::Dqn) agent.
///
/// `C` is the configuration of the action-value network.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig<C>
where
    C: OutDim,
{
    pub(super) model_config: DqnModelConfig<C>,
    pub(super) batch_size: usize,
    pub(super) discount_factor: f64,
    pub(super) train: bool,
    pub(super) explorer: EpsilonGreedy,
    pub(super) seed: u64,
    pub(super) device: Option<Device>,
}

impl<C> Default for DqnConfig<C>
where
    C: OutDim,
{
    fn default() -> Self {
        Self {
            model_config: Default::default(),
            batch_size: 64,
            discount_factor: 0.95,
            train: false,
            explorer: EpsilonGreedy::default(),
            seed: 42,
            device: None,
        }
    }
}

impl<C> DqnConfig<C>
where
    C: DeserializeOwned + Serialize + OutDim,
{
    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.discount_factor = v;
        self
    }

    /// Set explorer.
    pub fn explorer(mut self, v: EpsilonGreedy) -> Self {
        self.explorer = v;
        self
    }

    /// Sets the configuration of the model.
    pub fn model_config(mut self, model_config: DqnModelConfig<C>) -> Self {
        self.model_config = model_config;
        self
    }

    /// Overrides the learning rate of the optimizer.
    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.model_config = self.model_config.learning_rate(lr);
        self
    }

    /// Learning rate of the optimizer.
    pub fn lr(&self) -> f64 {
        self.model_config.lr()
    }

    /// Sets the output dimension of the configuration of the model.
    pub fn out_dim(mut self, out_dim: usize) -> Self {
        self.model_config = self.model_config.out_dim(out_dim);
        self
    }

    /// Sets the seed of the random number generator used for exploration.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Starts the agent in training mode.
    pub fn train(mut self, v: bool) -> Self {
        self.train = v;
        self
    }

    /// Device.
    pub fn device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    /// Loads [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DqnConfig`] to YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mlp::MlpConfig, opt::OptimizerConfig};
    use tempdir::TempDir;

    #[test]
    fn test_serde_dqn_config() -> Result<()> {
        let model_config = DqnModelConfig::default()
            .q_config(MlpConfig::default())
            .opt_config(OptimizerConfig::adam_w(1e-3, 0.01));
        let config = DqnConfig::default()
            .model_config(model_config)
            .learning_rate(5e-4)
            .batch_size(32)
            .explorer(EpsilonGreedy::fine_tuning())
            .device(Device::Cpu);

        let dir = TempDir::new("dqn_config")?;
        let path = dir.path().join("dqn_config.yaml");
        config.save(&path)?;
        let config_ = DqnConfig::<MlpConfig>::load(&path)?;
        assert_eq!(config, config_);
        assert_eq!(config_.lr(), 5e-4);
        Ok(())
    }
}
