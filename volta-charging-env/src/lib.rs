//! Simulated electric-vehicle charging environment.
//!
//! [`ChargingEnv`] holds a population of customers. On every tick each
//! active customer receives one [`Action`](volta_core::Action), moves toward
//! its goal and drains its battery. A customer leaves the simulation when it
//! reaches its goal before its deadline (earning a completion bonus) or when
//! the deadline expires.
//!
//! [`map::MapSnapshot`] extracts the same five features from a map dumped by
//! the game server and turns greedy actions into per-customer
//! recommendations.
mod customer;
mod env;
pub mod map;
pub use customer::{Customer, EntityStatus};
pub use env::{ChargingEnv, ChargingEnvConfig, RewardConfig};
