use crate::{
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::{copy_varmap, OutDim},
};
use anyhow::{bail, Context, Result};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{loss::mse, VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use volta_core::{error::VoltaError, QFunction, State, STATE_DIM};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`DqnModel`].
pub struct DqnModelConfig<Q>
where
    Q: OutDim,
{
    pub(super) q_config: Option<Q>,
    pub(super) opt_config: OptimizerConfig,
}

impl<Q> Default for DqnModelConfig<Q>
where
    Q: OutDim,
{
    fn default() -> Self {
        Self {
            q_config: None,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<Q> DqnModelConfig<Q>
where
    Q: DeserializeOwned + Serialize + OutDim,
{
    /// Sets configurations for action-value function.
    pub fn q_config(mut self, v: Q) -> Self {
        self.q_config = Some(v);
        self
    }

    /// Sets output dimension of the model.
    pub fn out_dim(mut self, v: usize) -> Self {
        if let Some(q_config) = &mut self.q_config {
            q_config.set_out_dim(v);
        }
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Overrides the learning rate of the optimizer.
    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.opt_config = self.opt_config.learning_rate(lr);
        self
    }

    /// Learning rate of the optimizer.
    pub fn lr(&self) -> f64 {
        self.opt_config.lr
    }

    /// Constructs [`DqnModelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DqnModelConfig`] to as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Action-value network with its own parameters and optimizer.
pub struct DqnModel<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim,
{
    device: Device,
    varmap: VarMap,

    // Dimension of the output vector (equal to the number of actions).
    out_dim: usize,

    // Action-value function
    q: Q,

    // Optimizer
    opt: Optimizer,
}

impl<Q> DqnModel<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs [`DqnModel`].
    pub fn build(config: DqnModelConfig<Q::Config>, device: Device) -> Result<Self> {
        let q_config = config.q_config.context("q_config is not set.")?;
        let out_dim = q_config.get_out_dim();
        let varmap = VarMap::new();
        let q = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            Q::build(vb, q_config)?
        };
        let opt = config.opt_config.build(varmap.all_vars())?;
        info!(
            "Built {}x{} action-value network, {:?} with lr {}",
            STATE_DIM, out_dim, config.opt_config.algorithm, config.opt_config.lr
        );

        Ok(Self {
            device,
            varmap,
            out_dim,
            q,
            opt,
        })
    }

    /// Outputs the action-value given observation(s).
    pub fn forward(&self, obs: &Tensor) -> Result<Tensor> {
        Ok(self.q.forward(obs)?)
    }

    /// Applies a gradient step for the given loss.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    fn obs_tensor(&self, states: &[State]) -> Result<Tensor> {
        let data = states.iter().flatten().copied().collect::<Vec<f32>>();
        Ok(Tensor::from_vec(data, (states.len(), STATE_DIM), &self.device)?)
    }
}

impl<Q> QFunction for DqnModel<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    fn n_actions(&self) -> usize {
        self.out_dim
    }

    fn predict(&self, state: &State) -> Result<Vec<f32>> {
        let mut q = self.predict_batch(std::slice::from_ref(state))?;
        q.pop().context("Empty prediction")
    }

    fn predict_batch(&self, states: &[State]) -> Result<Vec<Vec<f32>>> {
        if states.is_empty() {
            return Ok(vec![]);
        }
        let obs = self.obs_tensor(states)?;
        Ok(self.forward(&obs)?.to_vec2::<f32>()?)
    }

    fn fit_step(&mut self, states: &[State], actions: &[usize], targets: &[f32]) -> Result<f32> {
        let n = states.len();
        if actions.len() != n || targets.len() != n {
            bail!(
                "Lengths of states ({}), actions ({}) and targets ({}) differ",
                n,
                actions.len(),
                targets.len()
            );
        }
        let obs = self.obs_tensor(states)?;
        let act = {
            let act = actions.iter().map(|&a| a as u32).collect::<Vec<_>>();
            Tensor::from_vec(act, (n, 1), &self.device)?
        };
        let tgt = Tensor::from_slice(targets, (n,), &self.device)?;
        let pred = self
            .forward(&obs)?
            .gather(&act, D::Minus1)?
            .squeeze(D::Minus1)?;
        let loss = mse(&pred, &tgt)?;
        self.backward_step(&loss)?;

        Ok(loss.to_scalar::<f32>()?)
    }

    fn clone_parameters_into(&self, other: &mut Self) -> Result<()> {
        copy_varmap(&other.varmap, &self.varmap)
    }

    fn save(&self, path: &Path) -> Result<()> {
        self.varmap.save(path)?;
        info!("Save dqnmodel to {:?}", path);
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        self.varmap.load(path).map_err(|e| {
            VoltaError::Configuration(format!("Failed to load {:?}: {}", path, e))
        })?;
        info!("Load dqnmodel from {:?}", path);
        Ok(())
    }
}
