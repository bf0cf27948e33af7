//! Simulated customer.
use crate::ChargingEnvConfig;
use volta_core::{Action, State};

/// Lifecycle of a customer after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityStatus {
    /// Still on its way.
    Active,

    /// Reached its goal before the deadline.
    Completed,

    /// Missed its deadline.
    Expired,
}

/// A customer of the simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    /// Charge of the battery.
    pub charge: f32,

    /// Capacity of the battery, `1.0` in the simulation.
    pub max_charge: f32,

    /// `false` once the customer reached its goal or missed its deadline.
    pub active: bool,

    /// Ticks left until the deadline.
    pub deadline: i64,

    /// Whether the customer is at a charging station.
    pub at_station: bool,

    /// Normalised distance to the nearest station.
    pub dist_to_station: f32,

    /// Normalised distance to the goal.
    pub dist_to_goal: f32,
}

impl Customer {
    /// Creates an active customer.
    pub fn new(charge: f32, at_station: bool, deadline: i64, dist_to_station: f32, dist_to_goal: f32) -> Self {
        Self {
            charge,
            max_charge: 1.0,
            active: true,
            deadline,
            at_station,
            dist_to_station,
            dist_to_goal,
        }
    }

    /// Applies one tick with the given action value and returns the reward
    /// contribution of this customer together with its status.
    ///
    /// `None` or a value outside the action set is a no-op with a penalty.
    /// Movement, battery drain and deadline countdown happen regardless of
    /// the action.
    pub fn step(&mut self, act: Option<i64>, config: &ChargingEnvConfig) -> (f32, EntityStatus) {
        let rewards = &config.rewards;
        let mut reward = match act.map(Action::try_from) {
            Some(Ok(Action::Idle)) => rewards.idle,
            Some(Ok(Action::NearestStation)) => {
                self.at_station = true;
                self.dist_to_station = 0.0;
                self.dist_to_goal *= config.nearest_goal_decay;
                rewards.nearest_station
            }
            Some(Ok(Action::FastestStation)) => {
                self.at_station = true;
                self.dist_to_station = 0.0;
                self.charge = (self.charge + config.fastest_charge_bonus).min(self.max_charge);
                rewards.fastest_station
            }
            Some(Ok(Action::ChargeTo95)) => match self.at_station {
                true => {
                    let gain = (config.charge_target - self.charge).max(0.0);
                    self.charge += config.charge_step * gain;
                    gain * rewards.charge_multiplier
                }
                false => rewards.invalid_charge,
            },
            Some(Err(_)) | None => rewards.invalid_action,
        };

        self.dist_to_goal = (self.dist_to_goal - config.travel_rate * self.charge).max(0.0);
        self.charge = (self.charge - config.drain).max(0.0);
        self.deadline -= 1;

        let status = if self.dist_to_goal < config.goal_threshold && self.deadline > 0 {
            reward += rewards.completion;
            EntityStatus::Completed
        } else if self.deadline <= 0 {
            EntityStatus::Expired
        } else {
            EntityStatus::Active
        };
        self.active = status == EntityStatus::Active;

        (reward, status)
    }

    /// Feature vector of the customer, every component clamped to `[0, 1]`.
    pub fn features(&self, max_ticks: i64) -> State {
        [
            (self.charge / self.max_charge).clamp(0.0, 1.0),
            if self.at_station { 1.0 } else { 0.0 },
            (self.deadline as f32 / max_ticks.max(1) as f32).clamp(0.0, 1.0),
            self.dist_to_station.clamp(0.0, 1.0),
            self.dist_to_goal.clamp(0.0, 1.0),
        ]
    }
}
