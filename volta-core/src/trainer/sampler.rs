//! Experience sampling and replay buffer management.
use crate::{
    error::VoltaError, record::Record, replay_buffer::SimpleStepProcessor, Env,
    ExperienceBufferBase, Policy, State, Transition,
};
use anyhow::Result;
use log::warn;

/// What happened in one call of [`Sampler::sample_and_push`].
#[derive(Debug)]
pub struct Sample {
    /// Aggregate reward of the tick.
    pub reward: f32,

    /// The episode ended with this tick.
    pub is_done: bool,

    /// Number of transitions pushed into the buffer.
    pub n_pushed: usize,

    /// Information reported by the environment.
    pub record: Record,
}

/// Drives the environment with a policy and pushes the resulting transitions
/// into a replay buffer.
pub struct Sampler<E: Env> {
    env: E,
    prev_obs: Option<Vec<State>>,
    step_processor: SimpleStepProcessor,
}

impl<E: Env> Sampler<E> {
    /// Creates a new sampler with the given environment and step processor.
    pub fn new(env: E, step_processor: SimpleStepProcessor) -> Self {
        Self {
            env,
            prev_obs: None,
            step_processor,
        }
    }

    /// Starts a new episode.
    pub fn reset(&mut self) -> Result<()> {
        let obs = self.env.reset()?;
        self.step_processor.reset(obs.clone());
        self.prev_obs = Some(obs);
        Ok(())
    }

    /// Samples actions for the current observation, applies them to the
    /// environment and pushes one transition per acting entity.
    ///
    /// A transport failure of the environment ends the episode with zero
    /// reward instead of failing.
    pub fn sample_and_push<P, B>(&mut self, policy: &mut P, buffer: &mut B) -> Result<Sample>
    where
        P: Policy,
        B: ExperienceBufferBase<Item = Transition>,
    {
        if self.prev_obs.is_none() {
            self.reset()?;
        }
        let obs = self.prev_obs.take().unwrap_or_default();

        let act = policy.sample(&obs)?;
        let (step, record) = match self.env.step(&act) {
            Ok(r) => r,
            Err(e) => match VoltaError::classify(&e) {
                Some(VoltaError::EnvironmentTransport(msg)) => {
                    warn!("Environment step failed, ending the episode: {}", msg);
                    return Ok(Sample {
                        reward: 0.0,
                        is_done: true,
                        n_pushed: 0,
                        record: Record::empty(),
                    });
                }
                _ => return Err(e),
            },
        };

        let transitions = self.step_processor.process(&step);
        let n_pushed = transitions.len();
        for tr in transitions {
            buffer.push(tr)?;
        }

        let is_done = step.is_done();
        if !is_done {
            self.prev_obs = Some(step.obs);
        }

        Ok(Sample {
            reward: step.reward,
            is_done,
            n_pushed,
            record,
        })
    }
}
