//! DQN agent implemented with candle.
use super::{config::DqnConfig, explorer::argmax, explorer::EpsilonGreedy, model::DqnModel};
use crate::{model::SubModel1, util::OutDim};
use anyhow::Result;
use candle_core::Tensor;
use log::debug;
use rand::{rngs::SmallRng, SeedableRng};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, path::Path};
use volta_core::{
    error::VoltaError,
    record::{Record, RecordValue},
    replay_buffer::TransitionBatch,
    Agent, ExperienceBufferBase, Policy, QFunction, ReplayBufferBase, State, N_ACTIONS,
};

const PARAMS_FILE: &str = "qnet.safetensors";

/// Computes the targets `r + gamma * max_a Q_tgt(s', a) * (1 - done)`.
///
/// `next_q` holds the action values of the target network for the next states.
pub fn bellman_targets(reward: &[f32], is_done: &[i8], next_q: &[Vec<f32>], gamma: f32) -> Vec<f32> {
    reward
        .iter()
        .zip(is_done.iter())
        .zip(next_q.iter())
        .map(|((r, d), q)| {
            let max_q = q.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            r + gamma * max_q * (1 - d) as f32
        })
        .collect()
}

#[allow(clippy::upper_case_acronyms)]
/// DQN agent implemented with candle.
///
/// The target network is a snapshot of the trained network taken at the
/// last call of [`Agent::sync_target`]. It never changes in between.
pub struct Dqn<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    pub(in crate::dqn) batch_size: usize,
    pub(in crate::dqn) qnet: DqnModel<Q>,
    pub(in crate::dqn) qnet_tgt: DqnModel<Q>,
    pub(in crate::dqn) train: bool,
    pub(in crate::dqn) discount_factor: f64,
    pub(in crate::dqn) explorer: EpsilonGreedy,
    pub(in crate::dqn) n_opts: usize,
    rng: SmallRng,
}

impl<Q> Dqn<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs DQN agent.
    ///
    /// The target network starts as a copy of the trained network.
    pub fn build(config: DqnConfig<Q::Config>) -> Result<Self> {
        let device: candle_core::Device = config.device.unwrap_or_default().try_into()?;
        let qnet = DqnModel::build(config.model_config.clone(), device.clone())?;
        if qnet.n_actions() != N_ACTIONS {
            return Err(VoltaError::Configuration(format!(
                "The network outputs {} action values, the action set has {}",
                qnet.n_actions(),
                N_ACTIONS
            ))
            .into());
        }
        let mut qnet_tgt = DqnModel::build(config.model_config, device)?;
        qnet.clone_parameters_into(&mut qnet_tgt)?;

        Ok(Dqn {
            qnet,
            qnet_tgt,
            batch_size: config.batch_size,
            discount_factor: config.discount_factor,
            train: config.train,
            explorer: config.explorer,
            n_opts: 0,
            rng: SmallRng::seed_from_u64(config.seed),
        })
    }

    /// Current exploration rate.
    pub fn eps(&self) -> f64 {
        self.explorer.eps
    }

    /// Number of optimization steps done so far.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Action values of the trained network for a single state.
    pub fn q_values(&self, state: &State) -> Result<Vec<f32>> {
        self.qnet.predict(state)
    }

    /// Action values of the target network for a single state.
    pub fn target_q_values(&self, state: &State) -> Result<Vec<f32>> {
        self.qnet_tgt.predict(state)
    }

    /// Saves the parameters of the trained network in the given directory.
    pub fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.qnet.save(&path.join(PARAMS_FILE))
    }

    /// Loads the parameters of the trained network from the given directory
    /// and copies them into the target network.
    pub fn load_params(&mut self, path: &Path) -> Result<()> {
        self.qnet.load(&path.join(PARAMS_FILE))?;
        self.qnet.clone_parameters_into(&mut self.qnet_tgt)
    }

    fn update_critic(&mut self, batch: TransitionBatch) -> Result<f32> {
        let (obs, act, next_obs, reward, is_done) = batch.unpack();
        let next_q = self.qnet_tgt.predict_batch(&next_obs)?;
        let tgt = bellman_targets(&reward, &is_done, &next_q, self.discount_factor as f32);
        self.qnet.fit_step(&obs, &act, &tgt)
    }
}

impl<Q> Policy for Dqn<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Epsilon-greedy in training mode, greedy in evaluation mode.
    fn sample(&mut self, obs: &[State]) -> Result<Vec<i64>> {
        let q = self.qnet.predict_batch(obs)?;
        let mut act = Vec::with_capacity(q.len());
        for q in q.iter() {
            let a = match self.train {
                true => self.explorer.action(q, &mut self.rng),
                false => argmax(q),
            };
            act.push(a as i64);
        }
        Ok(act)
    }
}

impl<Q, R> Agent<R> for Dqn<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
    R: ReplayBufferBase<Batch = TransitionBatch> + ExperienceBufferBase,
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

    fn opt(&mut self, buffer: &mut R) -> Result<Option<Record>> {
        if buffer.len() < self.batch_size {
            return Ok(None);
        }
        let batch = match buffer.batch(self.batch_size) {
            Ok(batch) => batch,
            Err(e) => match VoltaError::classify(&e) {
                Some(VoltaError::InsufficientData { .. }) => return Ok(None),
                _ => return Err(e),
            },
        };
        let loss = self.update_critic(batch)?;
        self.n_opts += 1;

        Ok(Some(Record::from_slice(&[(
            "loss",
            RecordValue::Scalar(loss),
        )])))
    }

    fn on_episode_end(&mut self) -> Record {
        self.explorer.decay();
        Record::from_scalar("eps", self.explorer.eps as f32)
    }

    fn sync_target(&mut self) -> Result<()> {
        debug!("Copy the trained network into the target network");
        self.qnet.clone_parameters_into(&mut self.qnet_tgt)
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        Dqn::save_params(self, path)
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        Dqn::load_params(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bellman_targets() {
        let reward = [1.0, -0.5];
        let is_done = [1, 0];
        let next_q = vec![vec![10.0, 20.0, 5.0, 0.0], vec![0.5, 2.0, -1.0, 1.0]];
        let tgt = bellman_targets(&reward, &is_done, &next_q, 0.95);

        // Terminal transitions do not bootstrap
        assert_eq!(tgt[0], 1.0);
        assert!((tgt[1] - (-0.5 + 0.95 * 2.0)).abs() < 1e-6);
    }
}
