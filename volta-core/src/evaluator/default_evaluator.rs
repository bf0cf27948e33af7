//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{
    record::{Record, RecordValue},
    Env, Policy,
};
use anyhow::Result;
use log::info;

/// Runs a fixed number of indexed episodes and reports the mean return
/// under the key `"episode_return"`.
pub struct DefaultEvaluator<E: Env> {
    n_episodes: usize,
    env: E,
}

impl<E: Env> Evaluator for DefaultEvaluator<E> {
    fn evaluate<P: Policy>(&mut self, policy: &mut P) -> Result<Record> {
        let mut returns = Vec::with_capacity(self.n_episodes);

        for ix in 0..self.n_episodes {
            let mut obs = self.env.reset_with_index(ix)?;
            let mut r_total = 0f32;

            loop {
                let act = policy.sample(&obs)?;
                let (step, _) = self.env.step(&act)?;
                r_total += step.reward;
                if step.is_done() {
                    break;
                }
                obs = step.obs;
            }

            info!("Evaluation episode {}: return {:.3}", ix, r_total);
            returns.push(r_total);
        }

        let mean = returns.iter().sum::<f32>() / self.n_episodes.max(1) as f32;
        Ok(Record::from_slice(&[
            ("episode_return", RecordValue::Scalar(mean)),
            ("episode_returns", RecordValue::Array1(returns)),
        ]))
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`] with an environment built from
    /// `config` and `seed`.
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        Ok(Self {
            n_episodes,
            env: E::build(config, seed)?,
        })
    }
}
