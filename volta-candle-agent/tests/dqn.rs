use anyhow::Result;
use tempdir::TempDir;
use volta_candle_agent::{
    dqn::{Dqn, DqnConfig, DqnModelConfig, EpsilonGreedy},
    mlp::{Mlp, MlpConfig},
    opt::OptimizerConfig,
};
use volta_core::{
    error::VoltaError,
    replay_buffer::{SimpleReplayBuffer, SimpleReplayBufferConfig},
    Agent, ExperienceBufferBase, Policy, ReplayBufferBase, Transition,
};

fn dqn_config(units: Vec<usize>) -> DqnConfig<MlpConfig> {
    let model_config = DqnModelConfig::default()
        .q_config(MlpConfig::new(5, units, 4, false))
        .opt_config(OptimizerConfig::adam(1e-2));
    DqnConfig::default()
        .model_config(model_config)
        .batch_size(8)
        .train(true)
}

fn filled_buffer(n: usize) -> Result<SimpleReplayBuffer> {
    let mut buffer = SimpleReplayBuffer::build(&SimpleReplayBufferConfig::default().capacity(100));
    for i in 0..n {
        let x = i as f32 / n as f32;
        buffer.push(Transition {
            obs: [x, 1.0 - x, 0.5, 0.1, 0.0],
            act: i % 4,
            reward: 1.0 + x,
            next_obs: [x, 0.5, 0.5, 0.1, 0.0],
            is_done: i % 5 == 0,
        })?;
    }
    Ok(buffer)
}

#[test]
fn test_target_is_isolated_until_sync() -> Result<()> {
    let mut agent = Dqn::<Mlp>::build(dqn_config(vec![32, 32]))?;
    let mut buffer = filled_buffer(32)?;
    let state = [0.3, 0.7, 0.5, 0.1, 0.0];

    let q_before = agent.q_values(&state)?;
    assert_eq!(agent.target_q_values(&state)?, q_before);

    for _ in 0..10 {
        assert!(agent.opt(&mut buffer)?.is_some());
    }
    let q_after = agent.q_values(&state)?;
    assert_ne!(q_after, q_before);

    // The target network still holds the parameters of the last sync
    assert_eq!(agent.target_q_values(&state)?, q_before);

    Agent::<SimpleReplayBuffer>::sync_target(&mut agent)?;
    assert_eq!(agent.target_q_values(&state)?, q_after);

    // Further updates do not leak into the new snapshot
    agent.opt(&mut buffer)?;
    assert_eq!(agent.target_q_values(&state)?, q_after);
    Ok(())
}

#[test]
fn test_opt_skipped_with_small_buffer() -> Result<()> {
    let mut agent = Dqn::<Mlp>::build(dqn_config(vec![16]))?;
    let mut buffer = filled_buffer(5)?;
    assert!(agent.opt(&mut buffer)?.is_none());
    assert_eq!(agent.n_opts(), 0);
    Ok(())
}

#[test]
fn test_eps_decays_per_episode() -> Result<()> {
    let config = dqn_config(vec![16]).explorer(EpsilonGreedy::fine_tuning());
    let mut agent = Dqn::<Mlp>::build(config)?;
    assert_eq!(agent.eps(), 0.2);
    let record = Agent::<SimpleReplayBuffer>::on_episode_end(&mut agent);
    assert!((agent.eps() - 0.2 * 0.995).abs() < 1e-12);
    assert!((record.get_scalar("eps")? - 0.199).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_greedy_in_eval_mode() -> Result<()> {
    let mut agent = Dqn::<Mlp>::build(dqn_config(vec![16]).train(false))?;
    let states = vec![[0.1, 0.2, 0.3, 0.4, 0.5], [0.9, 0.8, 0.7, 0.6, 0.5]];
    let act = agent.sample(&states)?;
    assert_eq!(act.len(), 2);
    for (s, a) in states.iter().zip(act.iter()) {
        let q = agent.q_values(s)?;
        let best = q.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(q[*a as usize], best);
    }
    assert!(agent.sample(&[])?.is_empty());
    Ok(())
}

#[test]
fn test_save_and_load_params() -> Result<()> {
    let dir = TempDir::new("dqn_params")?;
    let mut agent = Dqn::<Mlp>::build(dqn_config(vec![16, 16]))?;
    let mut buffer = filled_buffer(16)?;
    agent.opt(&mut buffer)?;
    agent.save_params(dir.path())?;
    assert!(dir.path().join("qnet.safetensors").is_file());

    let state = [0.2, 0.4, 0.6, 0.8, 1.0];
    let mut agent_ = Dqn::<Mlp>::build(dqn_config(vec![16, 16]).seed(7))?;
    agent_.load_params(dir.path())?;
    assert_eq!(agent_.q_values(&state)?, agent.q_values(&state)?);

    // Loading also refreshes the target network
    assert_eq!(agent_.target_q_values(&state)?, agent.q_values(&state)?);
    Ok(())
}

#[test]
fn test_load_mismatched_params_is_configuration_error() -> Result<()> {
    let dir = TempDir::new("dqn_params")?;
    let agent = Dqn::<Mlp>::build(dqn_config(vec![16]))?;
    agent.save_params(dir.path())?;

    let mut agent_ = Dqn::<Mlp>::build(dqn_config(vec![32]))?;
    let err = agent_.load_params(dir.path()).unwrap_err();
    assert!(matches!(
        VoltaError::classify(&err),
        Some(VoltaError::Configuration(_))
    ));
    Ok(())
}

#[test]
fn test_output_width_must_match_action_set() {
    let config = dqn_config(vec![16]).out_dim(3);
    let err = match Dqn::<Mlp>::build(config) {
        Ok(_) => panic!("A network with 3 outputs must be rejected"),
        Err(e) => e,
    };
    assert!(matches!(
        VoltaError::classify(&err),
        Some(VoltaError::Configuration(_))
    ));
}
