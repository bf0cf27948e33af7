//! Agent.
use super::{Policy, ReplayBufferBase};
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy on an environment.
pub trait Agent<R: ReplayBufferBase>: Policy {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Performs an optimization step.
    ///
    /// `buffer` is a replay buffer from which transitions will be taken
    /// for updating model parameters. Returns `None` when the step was
    /// skipped, e.g., because the buffer holds fewer transitions than a batch.
    fn opt(&mut self, buffer: &mut R) -> Result<Option<Record>>;

    /// Called once after every completed episode.
    ///
    /// Exploration schedules advance here, never per environment step.
    fn on_episode_end(&mut self) -> Record;

    /// Copies the parameters of the trained network into the target network.
    fn sync_target(&mut self) -> Result<()>;

    /// Save the parameters of the agent in the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    ///
    /// A snapshot whose dimensions do not match the agent is a
    /// [`VoltaError::Configuration`](crate::error::VoltaError::Configuration).
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
