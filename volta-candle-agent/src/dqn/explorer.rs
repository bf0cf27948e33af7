//! Exploration strategy of DQN.
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Epsilon-greedy explorer for DQN.
///
/// Epsilon decays multiplicatively once per episode and never goes below
/// `eps_final`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Current exploration rate.
    pub eps: f64,

    /// Exploration rate at the start of training.
    pub eps_start: f64,

    /// Lower bound of the exploration rate.
    pub eps_final: f64,

    /// Multiplicative decay applied after every episode.
    pub decay: f64,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self::exploration()
    }
}

impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer.
    pub fn new(eps_start: f64, eps_final: f64, decay: f64) -> Self {
        Self {
            eps: eps_start,
            eps_start,
            eps_final,
            decay,
        }
    }

    /// Schedule for training from scratch, starting fully random.
    pub fn exploration() -> Self {
        Self::new(1.0, 0.05, 0.995)
    }

    /// Schedule for fine-tuning a trained model.
    pub fn fine_tuning() -> Self {
        Self::new(0.2, 0.05, 0.995)
    }

    /// Takes an action based on action values.
    ///
    /// * `q` - action values of a single state.
    pub fn action(&mut self, q: &[f32], rng: &mut impl Rng) -> usize {
        if rng.gen::<f64>() < self.eps {
            rng.gen_range(0..q.len())
        } else {
            argmax(q)
        }
    }

    /// Advances the schedule by one episode.
    pub fn decay(&mut self) {
        self.eps = (self.eps * self.decay).max(self.eps_final);
    }
}

/// Index of the largest value, the first one on ties.
pub(crate) fn argmax(q: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in q.iter().enumerate() {
        if *v > q[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn test_decay_is_bounded() {
        let mut explorer = EpsilonGreedy::exploration();
        explorer.decay();
        assert!((explorer.eps - 0.995).abs() < 1e-12);
        for _ in 0..2000 {
            explorer.decay();
        }
        assert_eq!(explorer.eps, 0.05);
    }

    #[test]
    fn test_greedy_when_eps_is_zero() {
        let mut explorer = EpsilonGreedy::new(0.0, 0.0, 1.0);
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..100 {
            assert_eq!(explorer.action(&[0.1, 0.7, -0.3, 0.2], &mut rng), 1);
        }
    }

    #[test]
    fn test_random_when_eps_is_one() {
        let mut explorer = EpsilonGreedy::new(1.0, 1.0, 1.0);
        let mut rng = SmallRng::seed_from_u64(42);
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[explorer.action(&[0.0, 1.0, 0.0, 0.0], &mut rng)] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_argmax_ties() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0, 0.0]), 1);
    }
}
