//! DQN agent for volta built on [candle](https://crates.io/crates/candle-core).
//!
//! The action-value function is a [`mlp::Mlp`] wrapped in a
//! [`dqn::DqnModel`], which implements [`volta_core::QFunction`].
//! [`dqn::Dqn`] holds two of them, the trained network and its target
//! network, and implements [`volta_core::Agent`].
pub mod dqn;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod util;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq, Default)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    #[default]
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl TryFrom<Device> for candle_core::Device {
    type Error = candle_core::Error;

    fn try_from(device: Device) -> Result<Self, Self::Error> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Cuda(n) => candle_core::Device::new_cuda(n),
        }
    }
}
