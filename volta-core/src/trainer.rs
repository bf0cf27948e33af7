//! Train [`Agent`].
mod config;
mod sampler;
use crate::{
    error::VoltaError,
    record::{AggregateRecorder, Record, RecordValue::Scalar},
    replay_buffer::{SimpleStepProcessor, SimpleStepProcessorConfig},
    Agent, Env, Evaluator, ExperienceBufferBase, ReplayBufferBase, Transition,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::{info, warn};
pub use sampler::{Sample, Sampler};
use std::path::Path;

/// Manages the episode-based training loop.
///
/// Every episode runs as follows:
///
/// 1. The environment is reset.
/// 2. Until the episode ends, the agent acts on the current state batch,
///    one transition per acting entity is pushed into the replay buffer, and
///    an optimization step runs every `opt_interval` environment steps.
///    Optimization steps are skipped while the buffer holds less than a batch.
/// 3. [`Agent::on_episode_end`] advances the exploration schedule. Skipped
///    episodes leave the schedule untouched.
/// 4. The target network is synchronised after episodes `0, n, 2n, ...`
///    where `n` is `sync_interval`.
/// 5. Model parameters are saved every `save_interval` episodes.
/// 6. The agent is evaluated every `eval_interval` episodes and the best
///    model is saved in `model_dir/best`.
///
/// The model is saved once more after the last episode.
///
/// A transport failure of the environment ends the current episode early
/// with zero reward for the failing tick. A failure in resetting the
/// environment skips the episode. Both are logged.
pub struct Trainer<E, R>
where
    E: Env,
    R: ExperienceBufferBase<Item = Transition> + ReplayBufferBase,
{
    env_config_train: E::Config,

    step_proc_config: SimpleStepProcessorConfig,

    replay_buffer_config: R::Config,

    max_episodes: usize,

    opt_interval: usize,

    sync_interval: usize,

    save_interval: usize,

    eval_interval: usize,

    flush_records_interval: usize,

    model_dir: Option<String>,

    seed: i64,
}

impl<E, R> Trainer<E, R>
where
    E: Env,
    R: ExperienceBufferBase<Item = Transition> + ReplayBufferBase,
{
    /// Constructs a trainer.
    pub fn build(
        config: TrainerConfig,
        env_config_train: E::Config,
        step_proc_config: SimpleStepProcessorConfig,
        replay_buffer_config: R::Config,
    ) -> Self {
        Self {
            env_config_train,
            step_proc_config,
            replay_buffer_config,
            max_episodes: config.max_episodes,
            opt_interval: config.opt_interval.max(1),
            sync_interval: config.sync_interval,
            save_interval: config.save_interval,
            eval_interval: config.eval_interval,
            flush_records_interval: config.flush_record_interval.max(1),
            model_dir: config.model_dir,
            seed: config.seed,
        }
    }

    fn save_model<A: Agent<R>>(agent: &A, model_dir: &Path) {
        match agent.save_params(model_dir) {
            Ok(()) => info!("Saved the model in {:?}.", model_dir),
            Err(e) => warn!("Failed to save model in {:?}: {}", model_dir, e),
        }
    }

    fn save_best_model<A: Agent<R>>(agent: &A, model_dir: &Path) {
        Self::save_model(agent, &model_dir.join("best"));
    }

    /// Runs one episode. Returns the episode reward, the number of ticks,
    /// the mean loss of the optimization steps and the last record of the
    /// environment.
    fn run_episode<A: Agent<R>>(
        &self,
        agent: &mut A,
        buffer: &mut R,
        sampler: &mut Sampler<E>,
        env_steps: &mut usize,
    ) -> Result<(f32, usize, Option<f32>, Record)> {
        let mut episode_reward = 0f32;
        let mut ticks = 0;
        let mut losses = vec![];
        let mut env_record = Record::empty();

        loop {
            let Sample {
                reward,
                is_done,
                record,
                ..
            } = sampler.sample_and_push(agent, buffer)?;
            *env_steps += 1;
            ticks += 1;
            episode_reward += reward;
            if !record.is_empty() {
                env_record = record;
            }

            if *env_steps % self.opt_interval == 0 {
                if let Some(record) = agent.opt(buffer)? {
                    if let Ok(loss) = record.get_scalar("loss") {
                        losses.push(loss);
                    }
                }
            }

            if is_done {
                break;
            }
        }

        let mean_loss = match losses.len() {
            0 => None,
            n => Some(losses.iter().sum::<f32>() / n as f32),
        };

        Ok((episode_reward, ticks, mean_loss, env_record))
    }

    /// Train the agent.
    ///
    /// Returns the total reward of every episode.
    pub fn train<A, D>(
        &mut self,
        agent: &mut A,
        recorder: &mut dyn AggregateRecorder,
        evaluator: &mut D,
    ) -> Result<Vec<f32>>
    where
        A: Agent<R>,
        D: Evaluator,
    {
        let env = E::build(&self.env_config_train, self.seed)?;
        let step_proc = SimpleStepProcessor::build(&self.step_proc_config);
        let mut buffer = R::build(&self.replay_buffer_config);
        let mut sampler = Sampler::new(env, step_proc);
        let mut max_eval_reward = f32::MIN;
        let mut env_steps: usize = 0;
        let mut episode_rewards = Vec::with_capacity(self.max_episodes);
        agent.train();

        for episode in 0..self.max_episodes {
            let mut record = match sampler.reset() {
                Ok(()) => {
                    let (reward, ticks, loss, env_record) =
                        self.run_episode(agent, &mut buffer, &mut sampler, &mut env_steps)?;
                    let mut record = env_record;
                    record.insert("episode_reward", Scalar(reward));
                    record.insert("ticks", Scalar(ticks as f32));
                    if let Some(loss) = loss {
                        record.insert("loss", Scalar(loss));
                    }
                    episode_rewards.push(reward);

                    // Advance exploration schedule
                    record.merge_inplace(agent.on_episode_end());
                    record
                }
                Err(e) => match VoltaError::classify(&e) {
                    Some(VoltaError::EnvironmentTransport(msg)) => {
                        warn!("Failed to reset the environment, skipping episode {}: {}", episode, msg);
                        episode_rewards.push(0.0);
                        Record::from_scalar("episode_reward", 0.0)
                    }
                    _ => return Err(e),
                },
            };

            record.insert("buffer_len", Scalar(buffer.len() as f32));

            // Target synchronisation
            if self.sync_interval > 0 && episode % self.sync_interval == 0 {
                agent.sync_target()?;
                info!("Synchronised the target network after episode {}", episode);
            }

            // Save the current model
            if let Some(model_dir) = &self.model_dir {
                if self.save_interval > 0 && (episode + 1) % self.save_interval == 0 {
                    Self::save_model(agent, Path::new(model_dir));
                }
            }

            // Evaluation
            if self.eval_interval > 0 && (episode + 1) % self.eval_interval == 0 {
                info!("Starts evaluation of the trained model");
                agent.eval();
                let eval_record = evaluator.evaluate(agent)?;
                agent.train();
                let eval_reward = eval_record.get_scalar("episode_return")?;
                record.insert("eval_reward", Scalar(eval_reward));

                // Save the best model up to the current episode
                if eval_reward > max_eval_reward {
                    max_eval_reward = eval_reward;
                    if let Some(model_dir) = &self.model_dir {
                        Self::save_best_model(agent, Path::new(model_dir));
                    }
                }
            }

            info!(
                "Episode {}/{} | map {} | reward {:.2} | eps {:.3} | buffer {} | loss {}",
                episode + 1,
                self.max_episodes,
                record.get_string("map").unwrap_or_else(|_| "-".to_string()),
                record.get_scalar("episode_reward").unwrap_or(0.0),
                record.get_scalar("eps").unwrap_or(0.0),
                buffer.len(),
                record
                    .get_scalar("loss")
                    .map(|l| format!("{:.4}", l))
                    .unwrap_or_else(|_| "-".to_string()),
            );

            recorder.store(record);
            if (episode + 1) % self.flush_records_interval == 0 {
                recorder.flush(episode as i64);
            }
        }

        if let Some(model_dir) = &self.model_dir {
            agent.save_params(Path::new(model_dir))?;
            info!("Saved the final model in {:?}.", model_dir);
        }
        recorder.flush(self.max_episodes as i64);

        Ok(episode_rewards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use crate::{
        record::{BufferedRecorder, NullRecorder},
        replay_buffer::{SimpleReplayBuffer, SimpleReplayBufferConfig},
        Policy, State, Step,
    };

    #[derive(Clone)]
    struct CountingEnvConfig {
        ticks: usize,
        fail_at: Option<usize>,
        reset_fails: bool,
    }

    struct CountingEnv {
        config: CountingEnvConfig,
        tick: usize,
    }

    impl Env for CountingEnv {
        type Config = CountingEnvConfig;

        fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
            Ok(Self {
                config: config.clone(),
                tick: 0,
            })
        }

        fn reset(&mut self) -> Result<Vec<State>> {
            if self.config.reset_fails {
                return Err(VoltaError::EnvironmentTransport("connection refused".into()).into());
            }
            self.tick = 0;
            Ok(vec![[0.5; 5]; 2])
        }

        fn reset_with_index(&mut self, _ix: usize) -> Result<Vec<State>> {
            self.reset()
        }

        fn step(&mut self, act: &[i64]) -> Result<(Step, Record)> {
            if self.config.fail_at == Some(self.tick) {
                return Err(VoltaError::EnvironmentTransport("connection reset".into()).into());
            }
            self.tick += 1;
            let done = self.tick >= self.config.ticks;
            let step = Step::new(act.to_vec(), vec![[0.5; 5]; 2], 1.0, done, false, None);
            Ok((step, Record::empty()))
        }
    }

    #[derive(Default)]
    struct CountingAgent {
        train: bool,
        episodes_ended: usize,
        opts: usize,
        syncs_at: Vec<usize>,
        saves_at: RefCell<Vec<usize>>,
    }

    impl Policy for CountingAgent {
        fn sample(&mut self, obs: &[State]) -> Result<Vec<i64>> {
            Ok(vec![0; obs.len()])
        }
    }

    impl Agent<SimpleReplayBuffer> for CountingAgent {
        fn train(&mut self) {
            self.train = true;
        }

        fn eval(&mut self) {
            self.train = false;
        }

        fn is_train(&self) -> bool {
            self.train
        }

        fn opt(&mut self, _buffer: &mut SimpleReplayBuffer) -> Result<Option<Record>> {
            self.opts += 1;
            Ok(None)
        }

        fn on_episode_end(&mut self) -> Record {
            self.episodes_ended += 1;
            Record::from_scalar("eps", 0.5)
        }

        fn sync_target(&mut self) -> Result<()> {
            self.syncs_at.push(self.episodes_ended);
            Ok(())
        }

        fn save_params(&self, _path: &Path) -> Result<()> {
            self.saves_at.borrow_mut().push(self.episodes_ended);
            Ok(())
        }

        fn load_params(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    fn trainer(
        config: TrainerConfig,
        env_config: CountingEnvConfig,
    ) -> Trainer<CountingEnv, SimpleReplayBuffer> {
        Trainer::build(
            config,
            env_config,
            SimpleStepProcessorConfig::default(),
            SimpleReplayBufferConfig::default().capacity(100),
        )
    }

    #[test]
    fn test_target_sync_schedule() -> Result<()> {
        let config = TrainerConfig::default()
            .max_episodes(7)
            .sync_interval(3)
            .save_interval(0);
        let env_config = CountingEnvConfig {
            ticks: 4,
            fail_at: None,
            reset_fails: false,
        };
        let mut trainer = trainer(config, env_config.clone());
        let mut agent = CountingAgent::default();
        let mut recorder = BufferedRecorder::new();
        let mut evaluator = crate::DefaultEvaluator::<CountingEnv>::new(&env_config, 0, 1)?;

        let rewards = trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

        // Syncs follow episodes 0, 3 and 6
        assert_eq!(agent.syncs_at, vec![1, 4, 7]);
        assert_eq!(agent.episodes_ended, 7);
        assert_eq!(agent.opts, 7 * 4);
        assert_eq!(rewards, vec![4.0; 7]);
        assert!(agent.is_train());
        Ok(())
    }

    #[test]
    fn test_transport_failure_ends_episode() -> Result<()> {
        let config = TrainerConfig::default()
            .max_episodes(2)
            .sync_interval(0)
            .save_interval(0);
        let env_config = CountingEnvConfig {
            ticks: 10,
            fail_at: Some(2),
            reset_fails: false,
        };
        let mut trainer = trainer(config, env_config.clone());
        let mut agent = CountingAgent::default();
        let mut recorder = BufferedRecorder::new();
        let mut evaluator = crate::DefaultEvaluator::<CountingEnv>::new(&env_config, 0, 1)?;

        let rewards = trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

        // Two successful ticks, then the failing tick adds nothing
        assert_eq!(rewards, vec![2.0, 2.0]);
        assert_eq!(agent.episodes_ended, 2);
        assert!(agent.syncs_at.is_empty());
        Ok(())
    }

    #[test]
    fn test_save_schedule() -> Result<()> {
        let config = TrainerConfig::default()
            .max_episodes(5)
            .sync_interval(0)
            .save_interval(2)
            .model_dir("model/counting");
        let env_config = CountingEnvConfig {
            ticks: 3,
            fail_at: None,
            reset_fails: false,
        };
        let mut trainer = trainer(config, env_config.clone());
        let mut agent = CountingAgent::default();
        let mut recorder = NullRecorder;
        let mut evaluator = crate::DefaultEvaluator::<CountingEnv>::new(&env_config, 0, 1)?;

        trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

        // After episodes 2 and 4, then the final save
        assert_eq!(*agent.saves_at.borrow(), vec![2, 4, 5]);
        Ok(())
    }

    #[test]
    fn test_save_requires_model_dir() -> Result<()> {
        let config = TrainerConfig::default()
            .max_episodes(4)
            .sync_interval(0)
            .save_interval(1);
        let env_config = CountingEnvConfig {
            ticks: 2,
            fail_at: None,
            reset_fails: false,
        };
        let mut trainer = trainer(config, env_config.clone());
        let mut agent = CountingAgent::default();
        let mut recorder = NullRecorder;
        let mut evaluator = crate::DefaultEvaluator::<CountingEnv>::new(&env_config, 0, 1)?;

        trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

        assert!(agent.saves_at.borrow().is_empty());
        Ok(())
    }

    #[test]
    fn test_failed_reset_keeps_schedule() -> Result<()> {
        let config = TrainerConfig::default()
            .max_episodes(3)
            .sync_interval(0)
            .save_interval(0);
        let env_config = CountingEnvConfig {
            ticks: 2,
            fail_at: None,
            reset_fails: true,
        };
        let mut trainer = trainer(config, env_config);
        let mut agent = CountingAgent::default();
        let mut recorder = BufferedRecorder::new();
        let eval_env_config = CountingEnvConfig {
            ticks: 2,
            fail_at: None,
            reset_fails: false,
        };
        let mut evaluator = crate::DefaultEvaluator::<CountingEnv>::new(&eval_env_config, 0, 1)?;

        let rewards = trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

        assert_eq!(rewards, vec![0.0; 3]);
        assert_eq!(agent.episodes_ended, 0);
        assert_eq!(agent.opts, 0);
        Ok(())
    }
}
