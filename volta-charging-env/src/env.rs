//! Simulated charging environment.
mod config;
use crate::{Customer, EntityStatus};
use anyhow::Result;
pub use config::{ChargingEnvConfig, RewardConfig};
use log::{debug, trace};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use volta_core::{
    record::{Record, RecordValue},
    EntityOutcome, Env, State, Step, N_ACTIONS,
};

/// Simulated population of customers driven by one action per active customer.
pub struct ChargingEnv {
    config: ChargingEnvConfig,
    seed: i64,
    rng: StdRng,
    customers: Vec<Customer>,
    map_name: String,
    tick: i64,
}

impl ChargingEnv {
    /// Creates an environment around a given population, starting at tick 0.
    pub fn from_customers(config: ChargingEnvConfig, customers: Vec<Customer>) -> Self {
        Self {
            config,
            seed: 0,
            rng: StdRng::seed_from_u64(0),
            customers,
            map_name: String::new(),
            tick: 0,
        }
    }

    /// Name of the map of the current episode.
    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    /// Current tick.
    pub fn tick(&self) -> i64 {
        self.tick
    }

    /// All customers, including inactive ones.
    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    /// Number of active customers.
    pub fn n_active(&self) -> usize {
        self.customers.iter().filter(|c| c.active).count()
    }

    /// One uniformly random action per active customer.
    pub fn sample_action(&mut self) -> Vec<i64> {
        (0..self.n_active())
            .map(|_| self.rng.gen_range(0..N_ACTIONS as i64))
            .collect()
    }

    /// Features of the active customers, in the order actions are assigned.
    fn observe(&self) -> Vec<State> {
        self.customers
            .iter()
            .filter(|c| c.active)
            .map(|c| c.features(self.config.max_ticks))
            .collect()
    }

    fn spawn_customer(&mut self) -> Customer {
        let (lo, hi) = self.config.charge_range;
        let max_ticks = self.config.max_ticks.max(1);
        let min_deadline = self.config.min_deadline.clamp(1, max_ticks);
        Customer::new(
            self.rng.gen_range(lo..=hi),
            self.rng.gen_bool(self.config.p_at_station.clamp(0.0, 1.0)),
            self.rng.gen_range(min_deadline..=max_ticks),
            self.rng.gen::<f32>(),
            self.rng.gen::<f32>(),
        )
    }
}

impl Env for ChargingEnv {
    type Config = ChargingEnvConfig;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            seed,
            rng: StdRng::seed_from_u64(seed as u64),
            customers: vec![],
            map_name: String::new(),
            tick: 0,
        })
    }

    fn reset(&mut self) -> Result<Vec<State>> {
        self.map_name = self
            .config
            .map_names
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_default();
        let customers = (0..self.config.n_customers)
            .map(|_| self.spawn_customer())
            .collect();
        self.customers = customers;
        self.tick = 0;
        debug!(
            "Reset {} with {} customers",
            self.map_name,
            self.customers.len()
        );

        Ok(self.observe())
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Vec<State>> {
        self.rng = StdRng::seed_from_u64(self.seed.wrapping_add(ix as i64) as u64);
        self.reset()
    }

    /// Applies the actions to the active customers in order.
    ///
    /// A missing action is treated like an invalid one. Surplus actions are
    /// ignored.
    fn step(&mut self, act: &[i64]) -> Result<(Step, Record)> {
        let n_active = self.n_active();
        if act.len() != n_active {
            trace!("Got {} actions for {} active customers", act.len(), n_active);
        }

        let acting = (0..self.customers.len())
            .filter(|&i| self.customers[i].active)
            .collect::<Vec<_>>();
        let mut reward = 0f32;
        let mut applied = Vec::with_capacity(n_active);
        let mut outcomes = Vec::with_capacity(n_active);
        let (mut n_completed, mut n_expired) = (0, 0);

        for (k, &i) in acting.iter().enumerate() {
            let a = act.get(k).copied();
            let c = &mut self.customers[i];
            let (r, status) = c.step(a, &self.config);
            match status {
                EntityStatus::Completed => n_completed += 1,
                EntityStatus::Expired => n_expired += 1,
                EntityStatus::Active => {}
            }
            reward += r;
            applied.push(a.unwrap_or(-1));
            outcomes.push(EntityOutcome {
                reward: r,
                next_obs: c.features(self.config.max_ticks),
                is_done: status != EntityStatus::Active,
            });
        }

        self.tick += 1;
        let is_truncated = self.tick >= self.config.max_ticks;
        let is_terminated = self.customers.iter().all(|c| !c.active);

        let obs = self.observe();
        let record = Record::from_slice(&[
            ("map", RecordValue::String(self.map_name.clone())),
            ("tick", RecordValue::Scalar(self.tick as f32)),
            ("n_active", RecordValue::Scalar(obs.len() as f32)),
            ("n_completed", RecordValue::Scalar(n_completed as f32)),
            ("n_expired", RecordValue::Scalar(n_expired as f32)),
        ]);
        let step = Step::new(
            applied,
            obs,
            reward,
            is_terminated,
            is_truncated,
            Some(outcomes),
        );

        Ok((step, record))
    }
}
