use pyo3::prelude::*;

use super::net::{ConsumableNet, Net};
use crate::feedforward::{RunOutcome, Sample, TrainError, Trainer as InnerTrainer};
use crate::{Impl_to_PyErr, MakeConsumable};

MakeConsumable!(ConsumableTrainer, InnerTrainer, Trainer);

#[pyclass]
pub struct Trainer {
    pub(super) trainer: ConsumableTrainer,
}

#[pymethods]
impl Trainer {
    pub fn geometry(&self) -> PyResult<Vec<usize>> {
        Ok(self.trainer.get_ref()?.net_ref().geometry().to_vec())
    }

    pub fn passes(&self) -> PyResult<usize> {
        Ok(self.trainer.get_ref()?.passes())
    }

    pub fn recent_average_error(&self) -> PyResult<f64> {
        Ok(self.trainer.get_ref()?.net_ref().recent_average_error())
    }

    /// Returns `(outputs, error, recent_average_error)` of the trained example.
    pub fn train(&mut self, inputs: Vec<f64>, targets: Vec<f64>) -> PyResult<(Vec<f64>, f64, f64)> {
        let pass = self.trainer.get_ref_mut()?.train(&inputs, &targets)?;
        Ok((pass.outputs, pass.error, pass.recent_average_error))
    }

    /// Trains on `samples` in order, given as `(inputs, targets)` pairs.
    ///
    /// Returns `(passes, recent_average_error, abandoned_pass)`, where `abandoned_pass` is the
    /// number of the pass whose inputs had the wrong size, if any.
    pub fn run(
        &mut self,
        samples: Vec<(Vec<f64>, Vec<f64>)>,
    ) -> PyResult<(usize, f64, Option<usize>)> {
        let samples = samples
            .into_iter()
            .map(|(inputs, targets)| Sample { inputs, targets });
        let summary = self
            .trainer
            .get_ref_mut()?
            .run(samples, |_, _| {})?;

        let abandoned = match summary.outcome {
            RunOutcome::Exhausted => None,
            RunOutcome::Abandoned { pass, .. } => Some(pass),
        };
        Ok((summary.passes, summary.recent_average_error, abandoned))
    }

    pub fn teardown(&mut self) -> PyResult<Net> {
        Ok(Net {
            net: ConsumableNet::acquire(self.trainer.release()?.teardown()),
        })
    }
}

Impl_to_PyErr!(for TrainError);
