//! Simple ring replay buffer.
use super::{SimpleReplayBufferConfig, TransitionBatch};
use crate::{error::VoltaError, ExperienceBufferBase, ReplayBufferBase, Transition};
use anyhow::Result;
use rand::{rngs::StdRng, seq::index, SeedableRng};

/// A fixed-capacity replay buffer of [`Transition`]s.
///
/// When full, a push overwrites the oldest transition. Batches are sampled
/// uniformly without replacement within one call.
pub struct SimpleReplayBuffer {
    capacity: usize,
    i: usize,
    data: Vec<Transition>,
    rng: StdRng,
}

impl SimpleReplayBuffer {
    /// Capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl ExperienceBufferBase for SimpleReplayBuffer {
    type Item = Transition;

    fn len(&self) -> usize {
        self.data.len()
    }

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        if self.data.len() < self.capacity {
            self.data.push(tr);
        } else {
            self.data[self.i] = tr;
        }
        self.i = (self.i + 1) % self.capacity;
        Ok(())
    }
}

impl ReplayBufferBase for SimpleReplayBuffer {
    type Config = SimpleReplayBufferConfig;
    type Batch = TransitionBatch;

    fn build(config: &Self::Config) -> Self {
        let capacity = config.capacity.max(1);
        Self {
            capacity,
            i: 0,
            data: Vec::with_capacity(capacity),
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        if size > self.data.len() {
            return Err(VoltaError::InsufficientData {
                requested: size,
                available: self.data.len(),
            }
            .into());
        }

        let ixs = index::sample(&mut self.rng, self.data.len(), size).into_vec();
        let mut batch = TransitionBatch::with_capacity(size);
        for &ix in ixs.iter() {
            let tr = &self.data[ix];
            batch.obs.push(tr.obs);
            batch.act.push(tr.act);
            batch.next_obs.push(tr.next_obs);
            batch.reward.push(tr.reward);
            batch.is_done.push(tr.is_done as i8);
        }
        batch.ix_sample = ixs;
        Ok(batch)
    }
}
