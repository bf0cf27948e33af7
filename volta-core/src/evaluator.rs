//! Evaluate a [`Policy`].
use crate::{record::Record, Policy};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Evaluate a [`Policy`].
pub trait Evaluator {
    /// Evaluate a [`Policy`].
    ///
    /// The caller of this method needs to handle the internal state of the
    /// policy, like training/evaluation mode.
    fn evaluate<P: Policy>(&mut self, policy: &mut P) -> Result<Record>;
}
