use anyhow::Result;
use tempdir::TempDir;
use volta::{Profile, VoltaConfig};
use volta_candle_agent::{
    dqn::{DqnConfig, DqnModelConfig},
    mlp::MlpConfig,
};
use volta_charging_env::{map::MapSnapshot, ChargingEnvConfig};
use volta_core::{error::VoltaError, record::BufferedRecorder, replay_buffer::SimpleReplayBufferConfig};

fn small_config(model_dir: &str, units: Vec<usize>) -> VoltaConfig {
    let mut config = Profile::Initial.config(model_dir);
    config.env = ChargingEnvConfig::default()
        .n_customers(6)
        .max_ticks(20)
        .min_deadline(10);
    config.agent = DqnConfig::default()
        .model_config(DqnModelConfig::default().q_config(MlpConfig::new(5, units, 4, false)))
        .batch_size(8);
    config.trainer = config
        .trainer
        .max_episodes(3)
        .sync_interval(1)
        .save_interval(2)
        .eval_interval(2);
    config.replay_buffer = SimpleReplayBufferConfig::default().capacity(500);
    config.n_eval_episodes = 1;
    config
}

#[test]
fn test_train_then_fine_tune() -> Result<()> {
    let dir = TempDir::new("volta_train")?;
    let model_dir = dir.path().join("dqn");
    let model_dir_str = model_dir.to_str().unwrap();
    let config = small_config(model_dir_str, vec![16]);

    let mut recorder = BufferedRecorder::new();
    let (agent, rewards) = volta::train(&config, None, &mut recorder)?;
    assert_eq!(rewards.len(), 3);
    assert!(agent.n_opts() > 0);
    assert!(!recorder.is_empty());
    assert!(model_dir.join("qnet.safetensors").is_file());
    assert!(model_dir.join("best").join("qnet.safetensors").is_file());

    // Fine-tuning starts from the saved parameters
    let fine_dir = dir.path().join("dqn_fine_tuned");
    let mut fine_config = small_config(fine_dir.to_str().unwrap(), vec![16]);
    fine_config.env = fine_config.env.map_names(vec!["Pistonia"]);
    fine_config.trainer = fine_config.trainer.max_episodes(2);
    let fine_config = fine_config.learning_rate(5e-4);
    assert_eq!(fine_config.agent.lr(), 5e-4);
    let mut recorder = BufferedRecorder::new();
    let (_, rewards) = volta::train(&fine_config, Some(&model_dir), &mut recorder)?;
    assert_eq!(rewards.len(), 2);
    assert!(fine_dir.join("qnet.safetensors").is_file());

    // Evaluation of the saved model
    let record = volta::play(&config, &model_dir, 2)?;
    assert_eq!(record.get_array1("episode_returns")?.len(), 2);
    Ok(())
}

#[test]
fn test_mismatched_checkpoint_is_fatal() -> Result<()> {
    let dir = TempDir::new("volta_mismatch")?;
    let model_dir = dir.path().join("dqn");
    let config = small_config(model_dir.to_str().unwrap(), vec![16]);
    volta::build_agent(&config, None)?.save_params(&model_dir)?;

    let wider = small_config(model_dir.to_str().unwrap(), vec![32]);
    let err = match volta::build_agent(&wider, Some(&model_dir)) {
        Ok(_) => panic!("Loading a mismatched checkpoint must fail"),
        Err(e) => e,
    };
    assert!(matches!(
        VoltaError::classify(&err),
        Some(VoltaError::Configuration(_))
    ));
    Ok(())
}

#[test]
fn test_recommend_on_map_dump() -> Result<()> {
    let dir = TempDir::new("volta_recommend")?;
    let model_dir = dir.path().join("dqn");
    let trained = small_config(model_dir.to_str().unwrap(), vec![16]);
    volta::build_agent(&trained, None)?.save_params(&model_dir)?;
    let config_path = dir.path().join("config.yaml");
    trained.save(&config_path)?;

    // The default profile has a wider network than the saved model
    let model_dir_str = model_dir.to_str().unwrap();
    let default = Profile::Initial.resolve(None, model_dir_str, None, None)?;
    assert!(volta::build_agent(&default, Some(&model_dir)).is_err());
    let config = Profile::Initial.resolve(Some(config_path.as_path()), model_dir_str, None, None)?;

    let map = MapSnapshot::from_json(
        r#"{
            "ticks": 50,
            "nodes": [
                {"id": 1, "posX": 0, "posY": 0, "customers": [
                    {"id": "x", "chargeRemaining": 10, "maxCharge": 40, "departureTick": 30, "toNode": 2},
                    {"id": "y", "chargeRemaining": 20, "maxCharge": 40, "departureTick": 30, "toNode": 2}
                ]},
                {"id": 2, "posX": 4, "posY": 3,
                 "target": {"Type": "ChargingStation", "chargeSpeedPerCharger": 100, "amountOfAvailableChargers": 4}}
            ]
        }"#,
    )?;
    let recs = volta::recommend(&config, &model_dir, &map, 5)?;
    assert!(recs.len() <= 2);
    for rec in recs {
        assert!(rec.path_to.is_some() || rec.charge_to.is_some());
    }
    Ok(())
}
