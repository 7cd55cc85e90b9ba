use pyo3::prelude::*;

use super::trainer::{ConsumableTrainer, Trainer};
use crate::feedforward::{Hyperparameters, Net as InnerNet, NewNetError, ProcessError};
use crate::{Impl_to_PyErr, MakeConsumable};

MakeConsumable!(ConsumableNet, InnerNet, Net);

#[pyclass]
pub struct Net {
    pub(super) net: ConsumableNet,
}

#[pymethods]
impl Net {
    /// Omitted hyperparameters take their default values, omitted `seed` means random weights.
    #[new]
    pub fn new(
        topology: Vec<usize>,
        learning_rate: Option<f64>,
        momentum: Option<f64>,
        error_smoothing: Option<f64>,
        seed: Option<u64>,
    ) -> Result<Self, NewNetError> {
        let defaults = Hyperparameters::default();
        let hyperparameters = defaults
            .with_learning_rate(learning_rate.unwrap_or(defaults.learning_rate))
            .with_momentum(momentum.unwrap_or(defaults.momentum))
            .with_error_smoothing(error_smoothing.unwrap_or(defaults.error_smoothing));

        let net = match seed {
            Some(seed) => InnerNet::seeded(&topology, hyperparameters, seed)?,
            None => InnerNet::new(&topology, hyperparameters, &mut rand::thread_rng())?,
        };

        Ok(Self {
            net: ConsumableNet::acquire(net),
        })
    }

    pub fn geometry(&self) -> PyResult<Vec<usize>> {
        Ok(self.net.get_ref()?.geometry().to_vec())
    }

    pub fn feed_forward(&mut self, inputs: Vec<f64>) -> PyResult<()> {
        Ok(self.net.get_ref_mut()?.feed_forward(&inputs)?)
    }

    pub fn results(&self) -> PyResult<Vec<f64>> {
        Ok(self.net.get_ref()?.results())
    }

    pub fn back_prop(&mut self, targets: Vec<f64>) -> PyResult<f64> {
        Ok(self.net.get_ref_mut()?.back_prop(&targets)?)
    }

    pub fn process(&mut self, inputs: Vec<f64>) -> PyResult<Vec<f64>> {
        let net = self.net.get_ref_mut()?;
        net.feed_forward(&inputs)?;
        Ok(net.results())
    }

    pub fn recent_average_error(&self) -> PyResult<f64> {
        Ok(self.net.get_ref()?.recent_average_error())
    }

    pub fn last_error(&self) -> PyResult<f64> {
        Ok(self.net.get_ref()?.last_error())
    }

    pub fn build_trainer(&mut self) -> PyResult<Trainer> {
        Ok(Trainer {
            trainer: ConsumableTrainer::acquire(self.net.release()?.build_trainer()),
        })
    }
}

Impl_to_PyErr!(for NewNetError, ProcessError);
