//! Configuration of [`ChargingEnv`](super::ChargingEnv).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Reward contributions of the simulator.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct RewardConfig {
    /// Reward of staying idle.
    pub idle: f32,

    /// Reward of heading to the nearest station.
    pub nearest_station: f32,

    /// Reward of heading to the fastest station.
    pub fastest_station: f32,

    /// Multiplier of the charge gap closed by charging at a station.
    pub charge_multiplier: f32,

    /// Penalty of charging while not at a station.
    pub invalid_charge: f32,

    /// Penalty of an action value outside the action set.
    pub invalid_action: f32,

    /// Bonus for reaching the goal before the deadline.
    pub completion: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            idle: -0.05,
            nearest_station: 0.2,
            fastest_station: 0.4,
            charge_multiplier: 3.0,
            invalid_charge: -0.2,
            invalid_action: -0.2,
            completion: 2.0,
        }
    }
}

/// Configuration of [`ChargingEnv`](super::ChargingEnv).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ChargingEnvConfig {
    /// Maps one of which is picked on every reset.
    pub map_names: Vec<String>,

    /// Number of customers created on reset.
    pub n_customers: usize,

    /// Horizon of an episode in ticks.
    pub max_ticks: i64,

    /// Range of the initial charge.
    pub charge_range: (f32, f32),

    /// Probability that a customer starts at a station.
    pub p_at_station: f64,

    /// Smallest initial deadline. The largest one is `max_ticks`.
    pub min_deadline: i64,

    /// Factor applied to the distance to the goal when heading to the nearest station.
    pub nearest_goal_decay: f32,

    /// Charge added when heading to the fastest station.
    pub fastest_charge_bonus: f32,

    /// Level charging at a station aims for.
    pub charge_target: f32,

    /// Fraction of the gap to `charge_target` closed per charging tick.
    pub charge_step: f32,

    /// Distance travelled per tick per unit of charge.
    pub travel_rate: f32,

    /// Charge drained per tick.
    pub drain: f32,

    /// Distance to the goal below which the goal counts as reached.
    pub goal_threshold: f32,

    /// Rewards.
    pub rewards: RewardConfig,
}

impl Default for ChargingEnvConfig {
    fn default() -> Self {
        Self {
            map_names: ["Batterytown", "Clutchfield", "Turbohill", "Thunderroad", "Windcity"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            n_customers: 200,
            max_ticks: 300,
            charge_range: (0.2, 0.9),
            p_at_station: 0.2,
            min_deadline: 100,
            nearest_goal_decay: 0.95,
            fastest_charge_bonus: 0.15,
            charge_target: 0.95,
            charge_step: 0.3,
            travel_rate: 0.02,
            drain: 0.03,
            goal_threshold: 0.05,
            rewards: RewardConfig::default(),
        }
    }
}

impl ChargingEnvConfig {
    /// Sets the maps.
    pub fn map_names<T: Into<String>>(mut self, v: Vec<T>) -> Self {
        self.map_names = v.into_iter().map(|s| s.into()).collect();
        self
    }

    /// Sets the number of customers.
    pub fn n_customers(mut self, v: usize) -> Self {
        self.n_customers = v;
        self
    }

    /// Sets the horizon of an episode.
    pub fn max_ticks(mut self, v: i64) -> Self {
        self.max_ticks = v;
        self
    }

    /// Sets the smallest initial deadline.
    pub fn min_deadline(mut self, v: i64) -> Self {
        self.min_deadline = v;
        self
    }

    /// Sets the distance travelled per tick per unit of charge.
    pub fn travel_rate(mut self, v: f32) -> Self {
        self.travel_rate = v;
        self
    }

    /// Sets the rewards.
    pub fn rewards(mut self, v: RewardConfig) -> Self {
        self.rewards = v;
        self
    }

    /// Constructs [`ChargingEnvConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ChargingEnvConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
