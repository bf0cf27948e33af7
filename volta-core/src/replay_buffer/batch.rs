//! Batch of transitions sampled from a replay buffer.
use crate::State;

/// A batch of transitions in struct-of-arrays layout.
#[derive(Debug, Clone, Default)]
pub struct TransitionBatch {
    /// States `o_t`.
    pub obs: Vec<State>,

    /// Action indices `a_t`.
    pub act: Vec<usize>,

    /// Next states `o_t+1`.
    pub next_obs: Vec<State>,

    /// Rewards `r_t`.
    pub reward: Vec<f32>,

    /// Done flags, `1` if `o_t+1` is terminal.
    pub is_done: Vec<i8>,

    /// Indices of the transitions in the buffer.
    pub ix_sample: Vec<usize>,
}

impl TransitionBatch {
    /// Creates an empty batch with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            obs: Vec::with_capacity(capacity),
            act: Vec::with_capacity(capacity),
            next_obs: Vec::with_capacity(capacity),
            reward: Vec::with_capacity(capacity),
            is_done: Vec::with_capacity(capacity),
            ix_sample: Vec::with_capacity(capacity),
        }
    }

    /// Unpack the data `(o_t, a_t, o_t+1, r_t, is_done_t)`.
    pub fn unpack(self) -> (Vec<State>, Vec<usize>, Vec<State>, Vec<f32>, Vec<i8>) {
        (self.obs, self.act, self.next_obs, self.reward, self.is_done)
    }

    /// Returns the number of transitions.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch holds no transition.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }
}
