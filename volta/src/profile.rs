//! Training profiles.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use volta_candle_agent::{
    dqn::{DqnConfig, DqnModelConfig, EpsilonGreedy},
    mlp::MlpConfig,
    opt::OptimizerConfig,
    Device,
};
use volta_charging_env::ChargingEnvConfig;
use volta_core::{
    replay_buffer::{SimpleReplayBufferConfig, SimpleStepProcessorConfig},
    TrainerConfig,
};

/// Training procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Profile {
    /// Training from scratch on several maps with heavy exploration.
    Initial,

    /// Continuing from a trained model on a single map with little exploration.
    FineTune,
}

/// Everything a training run is configured with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltaConfig {
    /// Simulator.
    pub env: ChargingEnvConfig,

    /// DQN agent.
    pub agent: DqnConfig<MlpConfig>,

    /// Training loop.
    pub trainer: TrainerConfig,

    /// Replay buffer.
    pub replay_buffer: SimpleReplayBufferConfig,

    /// Conversion of steps into transitions.
    pub step_proc: SimpleStepProcessorConfig,

    /// Number of episodes per evaluation.
    pub n_eval_episodes: usize,

    /// Seed of the evaluation environment.
    pub eval_seed: i64,
}

fn agent_config(lr: f64, explorer: EpsilonGreedy) -> DqnConfig<MlpConfig> {
    let model_config = DqnModelConfig::default()
        .q_config(MlpConfig::default())
        .opt_config(OptimizerConfig::adam(lr));
    DqnConfig::default()
        .model_config(model_config)
        .batch_size(64)
        .discount_factor(0.95)
        .explorer(explorer)
        .device(Device::Cpu)
}

impl Profile {
    /// Configuration of the profile, saving models in `model_dir`.
    pub fn config(self, model_dir: &str) -> VoltaConfig {
        match self {
            Profile::Initial => VoltaConfig {
                env: ChargingEnvConfig::default(),
                agent: agent_config(1e-3, EpsilonGreedy::exploration()),
                trainer: TrainerConfig::default()
                    .max_episodes(1000)
                    .sync_interval(20)
                    .save_interval(25)
                    .model_dir(model_dir),
                replay_buffer: SimpleReplayBufferConfig::default().capacity(20000),
                step_proc: SimpleStepProcessorConfig::default(),
                n_eval_episodes: 5,
                eval_seed: 1000,
            },
            Profile::FineTune => VoltaConfig {
                env: ChargingEnvConfig::default().map_names(vec!["Pistonia"]),
                agent: agent_config(5e-4, EpsilonGreedy::fine_tuning()),
                trainer: TrainerConfig::default()
                    .max_episodes(300)
                    .sync_interval(15)
                    .save_interval(0)
                    .model_dir(model_dir),
                replay_buffer: SimpleReplayBufferConfig::default().capacity(10000),
                step_proc: SimpleStepProcessorConfig::default(),
                n_eval_episodes: 5,
                eval_seed: 1000,
            },
        }
    }

    /// Configuration of a command line run.
    ///
    /// A YAML file at `path` replaces the profile. `model_dir`, `episodes`
    /// and `lr` then override the respective settings.
    pub fn resolve(
        self,
        path: Option<&Path>,
        model_dir: &str,
        episodes: Option<usize>,
        lr: Option<f64>,
    ) -> Result<VoltaConfig> {
        let mut config = match path {
            Some(path) => VoltaConfig::load(path)?,
            None => self.config(model_dir),
        };
        config.trainer = config.trainer.model_dir(model_dir);
        if let Some(n) = episodes {
            config.trainer = config.trainer.max_episodes(n);
        }
        if let Some(lr) = lr {
            config = config.learning_rate(lr);
        }
        Ok(config)
    }
}

impl VoltaConfig {
    /// Overrides the learning rate of the agent.
    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.agent = self.agent.learning_rate(lr);
        self
    }

    /// Constructs [`VoltaConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`VoltaConfig`] to YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_volta_config() -> Result<()> {
        let dir = TempDir::new("volta_config")?;
        let path = dir.path().join("config.yaml");
        for profile in [Profile::Initial, Profile::FineTune] {
            let config = profile.config("model/dqn");
            config.save(&path)?;
            assert_eq!(VoltaConfig::load(&path)?, config);
        }
        Ok(())
    }

    #[test]
    fn test_fine_tune_uses_single_map() {
        let config = Profile::FineTune.config("model");
        assert_eq!(config.env.map_names, vec!["Pistonia".to_string()]);
        assert_eq!(config.trainer.max_episodes, 300);
        assert_eq!(config.trainer.sync_interval, 15);
        assert_eq!(config.agent.lr(), 5e-4);
    }

    #[test]
    fn test_resolve_overrides_profile() -> Result<()> {
        let config = Profile::FineTune.resolve(None, "model/ft", Some(10), Some(1e-4))?;
        assert_eq!(config.trainer.max_episodes, 10);
        assert_eq!(config.trainer.model_dir.as_deref(), Some("model/ft"));
        assert_eq!(config.agent.lr(), 1e-4);
        assert_eq!(config.env.map_names, vec!["Pistonia".to_string()]);

        let config = Profile::FineTune.resolve(None, "model/ft", None, None)?;
        assert_eq!(config, Profile::FineTune.config("model/ft"));
        Ok(())
    }

    #[test]
    fn test_resolve_prefers_config_file() -> Result<()> {
        let dir = TempDir::new("volta_resolve")?;
        let path = dir.path().join("config.yaml");
        Profile::FineTune.config("elsewhere").save(&path)?;

        let config = Profile::Initial.resolve(Some(path.as_path()), "model/dqn", None, None)?;
        assert_eq!(config.env.map_names, vec!["Pistonia".to_string()]);
        assert_eq!(config.trainer.model_dir.as_deref(), Some("model/dqn"));
        Ok(())
    }
}
