//! Environment.
use super::{State, Step};
use crate::record::Record;
use anyhow::Result;

/// Represents a multi-entity environment, typically an MDP.
///
/// Each observation is a batch of [`State`]s, one per currently active entity.
/// An action batch passed to [`Env::step`] holds one action value per entity,
/// in the order of the most recently returned observation.
///
/// The in-process simulator and a remote backend implement the same contract,
/// so [`Trainer`](crate::Trainer) is agnostic to which one it drives.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Starts a new episode and returns its initial observation.
    fn reset(&mut self) -> Result<Vec<State>>;

    /// Resets the environment with a given index.
    ///
    /// The index is used to derive a random seed, so episodes started with the
    /// same index are identical. [`DefaultEvaluator`](crate::DefaultEvaluator)
    /// relies on this for reproducible evaluation.
    fn reset_with_index(&mut self, ix: usize) -> Result<Vec<State>>;

    /// Performs an environment step.
    ///
    /// Remote backends report an unreachable service or a malformed answer as
    /// [`VoltaError::EnvironmentTransport`](crate::error::VoltaError::EnvironmentTransport).
    fn step(&mut self, act: &[i64]) -> Result<(Step, Record)>;
}
