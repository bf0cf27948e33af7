//! Q-learning for electric-vehicle charging logistics.
//!
//! This crate wires the pieces of volta together: the simulated
//! [`ChargingEnv`], the candle-based [`Dqn`] agent and the episode-based
//! [`Trainer`]. The training procedures differ only in their [`Profile`].
pub mod profile;
use anyhow::Result;
use log::info;
pub use profile::{Profile, VoltaConfig};
use std::path::Path;
use volta_candle_agent::{dqn::Dqn, mlp::Mlp};
use volta_charging_env::{
    map::{MapSnapshot, Recommendation},
    ChargingEnv,
};
use volta_core::{
    record::{AggregateRecorder, Record},
    replay_buffer::SimpleReplayBuffer,
    Action, DefaultEvaluator, Evaluator as _, Policy, Trainer,
};

/// DQN agent over an MLP.
pub type DqnAgent = Dqn<Mlp>;

/// Replay buffer used in training.
pub type ReplayBuffer = SimpleReplayBuffer;

/// Evaluator on the simulator.
pub type Evaluator = DefaultEvaluator<ChargingEnv>;

/// Builds an agent, optionally starting from the parameters saved in `init_params`.
///
/// Parameters are loaded into both the trained and the target network.
pub fn build_agent(config: &VoltaConfig, init_params: Option<&Path>) -> Result<DqnAgent> {
    let mut agent = DqnAgent::build(config.agent.clone())?;
    if let Some(path) = init_params {
        agent.load_params(path)?;
        info!("Start from the parameters in {:?}", path);
    }
    Ok(agent)
}

/// Trains an agent. Returns the agent and the reward of every episode.
///
/// Pass the directory of a trained model in `init_params` to fine-tune it.
pub fn train(
    config: &VoltaConfig,
    init_params: Option<&Path>,
    recorder: &mut dyn AggregateRecorder,
) -> Result<(DqnAgent, Vec<f32>)> {
    let mut agent = build_agent(config, init_params)?;
    let mut evaluator = Evaluator::new(&config.env, config.eval_seed, config.n_eval_episodes)?;
    let mut trainer = Trainer::<ChargingEnv, ReplayBuffer>::build(
        config.trainer.clone(),
        config.env.clone(),
        config.step_proc.clone(),
        config.replay_buffer.clone(),
    );
    let rewards = trainer.train(&mut agent, recorder, &mut evaluator)?;

    Ok((agent, rewards))
}

/// Evaluates the model saved in `model_dir` greedily on `n_episodes` indexed episodes.
pub fn play(config: &VoltaConfig, model_dir: &Path, n_episodes: usize) -> Result<Record> {
    let mut config = config.clone();
    config.agent = config.agent.train(false);
    let mut agent = build_agent(&config, Some(model_dir))?;
    let mut evaluator = Evaluator::new(&config.env, config.eval_seed, n_episodes)?;
    evaluator.evaluate(&mut agent)
}

/// Recommends an action for every customer of a dumped map with the model
/// saved in `model_dir`.
pub fn recommend(
    config: &VoltaConfig,
    model_dir: &Path,
    map: &MapSnapshot,
    current_tick: i64,
) -> Result<Vec<Recommendation>> {
    let mut config = config.clone();
    config.agent = config.agent.train(false);
    let mut agent = build_agent(&config, Some(model_dir))?;
    let obs = map.features(current_tick);
    let actions = agent
        .sample(&obs)?
        .into_iter()
        .map(Action::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(map.recommend(&actions))
}
