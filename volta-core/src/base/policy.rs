//! Policy.
use super::State;
use anyhow::Result;

/// A policy on a multi-entity environment.
///
/// Policy is a mapping from a batch of per-entity states to one action value
/// per entity, in the same order.
pub trait Policy {
    /// Sample actions given an observation.
    fn sample(&mut self, obs: &[State]) -> Result<Vec<i64>>;
}
