//! Conversion of [`Step`]s into per-entity [`Transition`]s.
use crate::{Action, State, Step, Transition};
use log::{debug, trace};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// How a multi-entity tick is split into per-entity transitions.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
pub enum TransitionPairing {
    /// Every acting entity receives `tick_reward / n_acting` and is paired with
    /// an arbitrary post-tick state of the batch.
    Broadcast,

    /// Every acting entity receives its own reward and its own next state.
    ///
    /// Falls back to [`TransitionPairing::Broadcast`] when the environment does
    /// not report per-entity outcomes.
    PerEntity,
}

/// Configuration of [`SimpleStepProcessor`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct SimpleStepProcessorConfig {
    pub(super) pairing: TransitionPairing,
    pub(super) seed: u64,
}

impl Default for SimpleStepProcessorConfig {
    fn default() -> Self {
        Self {
            pairing: TransitionPairing::PerEntity,
            seed: 42,
        }
    }
}

impl SimpleStepProcessorConfig {
    /// Sets the pairing of entities and next states.
    pub fn pairing(mut self, pairing: TransitionPairing) -> Self {
        self.pairing = pairing;
        self
    }

    /// Sets the random seed used by [`TransitionPairing::Broadcast`].
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Builds 1-step transitions from consecutive observations.
pub struct SimpleStepProcessor {
    pairing: TransitionPairing,
    prev_obs: Option<Vec<State>>,
    rng: StdRng,
}

impl SimpleStepProcessor {
    /// Build a processor.
    pub fn build(config: &SimpleStepProcessorConfig) -> Self {
        Self {
            pairing: config.pairing,
            prev_obs: None,
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Sets the observation the next processed step starts from.
    pub fn reset(&mut self, init_obs: Vec<State>) {
        self.prev_obs = Some(init_obs);
    }

    /// Processes a [`Step`] object.
    ///
    /// Entities whose action value is outside the action set are skipped;
    /// the environment already charged them a penalty.
    pub fn process(&mut self, step: &Step) -> Vec<Transition> {
        let prev_obs = match self.prev_obs.replace(step.obs.clone()) {
            Some(obs) => obs,
            None => {
                debug!("No previous observation, dropping the step");
                return vec![];
            }
        };

        let outcomes = match (self.pairing, &step.outcomes) {
            (TransitionPairing::PerEntity, Some(outcomes)) if outcomes.len() == step.act.len() => {
                Some(outcomes)
            }
            (TransitionPairing::PerEntity, _) => {
                trace!("No per-entity outcomes, broadcasting the tick reward");
                None
            }
            (TransitionPairing::Broadcast, _) => None,
        };
        let n_acting = step.act.len().max(1) as f32;

        prev_obs
            .iter()
            .zip(step.act.iter())
            .enumerate()
            .filter_map(|(i, (obs, &a))| {
                let act = Action::try_from(a).ok()?.index();
                let tr = match outcomes {
                    Some(outcomes) => Transition {
                        obs: *obs,
                        act,
                        reward: outcomes[i].reward,
                        next_obs: outcomes[i].next_obs,
                        is_done: outcomes[i].is_done || step.is_done(),
                    },
                    None => Transition {
                        obs: *obs,
                        act,
                        reward: step.reward / n_acting,
                        next_obs: *step.obs.choose(&mut self.rng).unwrap_or(obs),
                        is_done: step.is_done(),
                    },
                };
                Some(tr)
            })
            .collect()
    }
}
