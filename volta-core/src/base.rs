//! Core functionalities.
mod action;
mod agent;
mod env;
mod policy;
mod q_function;
mod replay_buffer;
mod step;
pub use action::{Action, N_ACTIONS};
pub use agent::Agent;
pub use env::Env;
pub use policy::Policy;
pub use q_function::QFunction;
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
pub use step::{EntityOutcome, Step, Transition};

/// Number of features describing one entity.
pub const STATE_DIM: usize = 5;

/// Feature vector of one active entity.
///
/// The components are, in order: charge fraction, at-station flag,
/// normalised ticks until the deadline, normalised distance to the nearest
/// station and normalised distance to the goal. Every component lies in `[0, 1]`.
pub type State = [f32; STATE_DIM];
