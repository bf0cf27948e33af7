//! Interface of action-value function approximators.
use super::State;
use anyhow::Result;
use std::path::Path;

/// A parametric mapping from a [`State`] to one value per discrete action.
///
/// The training machinery only talks to approximators through this trait, so
/// it is decoupled from any specific numeric or autograd backend.
pub trait QFunction {
    /// Number of actions, i.e., the length of a predicted value vector.
    fn n_actions(&self) -> usize;

    /// Predicts action values for a single state.
    fn predict(&self, state: &State) -> Result<Vec<f32>>;

    /// Predicts action values for a batch of states, one row per state.
    fn predict_batch(&self, states: &[State]) -> Result<Vec<Vec<f32>>>;

    /// Performs one gradient step minimizing the mean squared error between
    /// `Q(states[i], actions[i])` and `targets[i]`. Returns the loss.
    fn fit_step(&mut self, states: &[State], actions: &[usize], targets: &[f32]) -> Result<f32>;

    /// Copies the full parameter set into `other` by value.
    ///
    /// After this call, changing the parameters of `self` must not change the
    /// predictions of `other`.
    fn clone_parameters_into(&self, other: &mut Self) -> Result<()>
    where
        Self: Sized;

    /// Saves the parameters to a file.
    fn save(&self, path: &Path) -> Result<()>;

    /// Loads the parameters from a file.
    fn load(&mut self, path: &Path) -> Result<()>;
}
