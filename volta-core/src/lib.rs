#![warn(missing_docs)]
//! Core of volta, a Q-learning trainer for electric-vehicle charging logistics.
//!
//! This crate is independent of any numeric backend. It defines the contracts
//! between the pieces of the training system and the backend-free machinery
//! that drives them:
//!
//! * [`Env`] - a transition model producing per-entity state batches,
//! * [`QFunction`] - an opaque function approximator with a fit/predict contract,
//! * [`Policy`] and [`Agent`] - action selection and learning,
//! * [`replay_buffer`] - a fixed-capacity experience store with uniform sampling,
//! * [`Trainer`] - the episode-based training loop with target synchronisation
//!   and checkpointing.
pub mod error;
pub mod record;
pub mod replay_buffer;

mod base;
pub use base::{
    Action, Agent, EntityOutcome, Env, ExperienceBufferBase, Policy, QFunction,
    ReplayBufferBase, State, Step, Transition, N_ACTIONS, STATE_DIM,
};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod trainer;
pub use trainer::{Sample, Sampler, Trainer, TrainerConfig};
