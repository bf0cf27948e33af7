//! Replay buffer interface.
use anyhow::Result;

/// Interface for buffers that store experiences from environments.
pub trait ExperienceBufferBase {
    /// Items pushed into the buffer.
    type Item;

    /// Pushes a transition into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// The number of transitions in the buffer.
    fn len(&self) -> usize;

    /// Returns `true` if no transition has been pushed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Interface of replay buffers generating batches for training.
pub trait ReplayBufferBase {
    /// Configuration of the replay buffer.
    type Config: Clone;

    /// Batch generated from the buffer.
    type Batch;

    /// Build a replay buffer from [Self::Config].
    fn build(config: &Self::Config) -> Self;

    /// Constructs a batch of `size` transitions.
    ///
    /// Fails with [`VoltaError::InsufficientData`](crate::error::VoltaError::InsufficientData)
    /// when fewer than `size` transitions are stored.
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;
}
