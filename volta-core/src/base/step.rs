//! Environment step.
use super::State;

/// Outcome of one tick for a single entity that acted in it.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityOutcome {
    /// Reward contributed by this entity in the tick.
    pub reward: f32,

    /// Features of this entity after the tick, even if it was deactivated.
    pub next_obs: State,

    /// The entity reached its goal or missed its deadline in this tick.
    pub is_done: bool,
}

/// Represents the result of an environment step `(a_t, o_t+1, r_t)`.
///
/// An environment emits a [`Step`] object at every interaction step.
/// This object is used to create transitions `(o_t, a_t, r_t, o_t+1, done)`.
#[derive(Debug, Clone)]
pub struct Step {
    /// Actions applied in the tick, one per entity that was active before it.
    pub act: Vec<i64>,

    /// Observation after the tick, one row per entity still active.
    pub obs: Vec<State>,

    /// Sum of all per-entity rewards of the tick.
    pub reward: f32,

    /// Every entity is inactive.
    pub is_terminated: bool,

    /// The tick counter reached the horizon.
    pub is_truncated: bool,

    /// Per-entity outcomes, aligned with `act`.
    ///
    /// Backends that only know the aggregate reward leave this `None`.
    pub outcomes: Option<Vec<EntityOutcome>>,
}

impl Step {
    /// Constructs a [`Step`] object.
    pub fn new(
        act: Vec<i64>,
        obs: Vec<State>,
        reward: f32,
        is_terminated: bool,
        is_truncated: bool,
        outcomes: Option<Vec<EntityOutcome>>,
    ) -> Self {
        Step {
            act,
            obs,
            reward,
            is_terminated,
            is_truncated,
            outcomes,
        }
    }

    #[inline]
    /// Terminated or truncated.
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}

/// A transition `(o_t, a_t, r_t, o_t+1, done)` of a single entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// State before the action.
    pub obs: State,

    /// Index of the action.
    pub act: usize,

    /// Reward.
    pub reward: f32,

    /// State after the action.
    pub next_obs: State,

    /// Whether `next_obs` is terminal.
    pub is_done: bool,
}
