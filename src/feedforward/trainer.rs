use tracing::{debug, info, warn};

use super::backprop::TrainError;
use super::net::{Net, ProcessError, SizeMismatch};

/// Net trainer structure.
///
/// Drives a training run, one example at a time. Training procedure looks like this:
/// * One builds a trainer by calling `Net::build_trainer`, which consumes `Net` and returns
/// `Trainer` object. (While training, the network is reachable only through its `Trainer`,
/// so every pass is counted.)
/// * Examples are processed via `Trainer::train`, or a whole sequence via `Trainer::run`.
/// At any time one can call `Trainer::net_ref` to inspect the network.
/// * Once finished training, one can use `Trainer::teardown` to get `Net` object back.
#[derive(Debug)]
pub struct Trainer {
    /// The network object trainer posesses.
    pub(crate) net: Net,

    /// Number of examples trained so far.
    pub(crate) passes: usize,
}

/// Labeled example: inputs and the outputs the net should have produced for them.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub inputs: Vec<f64>,
    pub targets: Vec<f64>,
}

/// Outcome of one training pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Pass {
    /// 1-based number of the pass within the trainer's lifetime.
    pub number: usize,
    /// Outputs of the net before its weights were updated.
    pub outputs: Vec<f64>,
    /// RMS error of `outputs`.
    pub error: f64,
    pub recent_average_error: f64,
}

/// How a training run ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunOutcome {
    /// Every sample was trained on.
    Exhausted,
    /// Sample number `pass` had the wrong amount of inputs, so the run stopped before it.
    Abandoned { pass: usize, mismatch: SizeMismatch },
}

/// Summary of `Trainer::run`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Number of passes done during this run.
    pub passes: usize,
    pub recent_average_error: f64,
    pub outcome: RunOutcome,
}

impl Trainer {
    /// Consumes `Net` and builds `Trainer` object containing it.
    pub(super) fn build(net: Net) -> Trainer {
        Trainer { net, passes: 0 }
    }

    /// Returns reference to contained `Net`.
    pub fn net_ref(&self) -> &Net {
        &self.net
    }

    /// Returns mutable reference to contained `Net`, allowing the use of `Net::process`.
    pub fn net_mut(&mut self) -> &mut Net {
        &mut self.net
    }

    /// Number of examples trained so far.
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Performs training on a given example: feeds it forward, collects the outputs and
    /// back-propagates `targets`.
    ///
    /// # Arguments
    /// * `inputs` - slice that holds activations of input neurons;
    /// * `targets` - slice that holds desired activations of output neurons.
    ///
    /// # Returns
    /// * `Ok(Pass)` with the outputs and errors of this example;
    /// * `Err(TrainError)` if `inputs` or `targets` have wrong size, inputs being checked
    /// first. The weights are not touched then.
    ///
    /// # Examples
    /// ```
    /// # use bpnnet::feedforward::{Hyperparameters, Net};
    /// let mut trainer = Net::seeded(&[10, 20, 20, 3], Hyperparameters::default(), 8)
    ///     .unwrap()
    ///     .build_trainer();
    /// let inputs = [1.0; 10];
    /// let targets = [0.5; 3];
    /// let pass = trainer.train(&inputs, &targets).unwrap();
    /// assert_eq!(pass.outputs.len(), 3);
    /// ```
    pub fn train(&mut self, inputs: &[f64], targets: &[f64]) -> Result<Pass, TrainError> {
        // Inputs first: a run is abandoned on them whatever the targets are
        if inputs.len() != self.net.inputs_count() {
            return Err(ProcessError::BadInputs(SizeMismatch {
                expected: self.net.inputs_count(),
                got: inputs.len(),
            })
            .into());
        }
        if targets.len() != self.net.outputs_count() {
            return Err(TrainError::BadTargets(SizeMismatch {
                expected: self.net.outputs_count(),
                got: targets.len(),
            }));
        }

        self.net.feed_forward(inputs)?;
        let outputs = self.net.results();
        let error = self.net.back_prop(targets)?;

        self.passes += 1;
        debug!(
            pass = self.passes,
            ?inputs,
            ?outputs,
            ?targets,
            recent_average_error = self.net.recent_average_error(),
            "trained"
        );

        Ok(Pass {
            number: self.passes,
            outputs,
            error,
            recent_average_error: self.net.recent_average_error(),
        })
    }

    /// Performs training for every sample, in order, calling `on_pass` after each one.
    ///
    /// A sample with the wrong amount of inputs ends the run cleanly, see
    /// `RunOutcome::Abandoned`. A sample with the wrong amount of targets is a caller error.
    ///
    /// # Examples
    /// ```
    /// # use bpnnet::feedforward::{Hyperparameters, Net, RunOutcome, Sample};
    /// let mut trainer = Net::seeded(&[2, 2, 1], Hyperparameters::default(), 8)
    ///     .unwrap()
    ///     .build_trainer();
    /// let samples = vec![
    ///     Sample { inputs: vec![1.0, 0.0], targets: vec![1.0] },
    ///     Sample { inputs: vec![1.0], targets: vec![1.0] },
    ///     Sample { inputs: vec![0.0, 0.0], targets: vec![0.0] },
    /// ];
    /// let summary = trainer.run(samples, |_, _| {}).unwrap();
    /// assert_eq!(summary.passes, 1);
    /// assert!(matches!(summary.outcome, RunOutcome::Abandoned { pass: 2, .. }));
    /// ```
    pub fn run<I, F>(&mut self, samples: I, mut on_pass: F) -> Result<RunSummary, TrainError>
    where
        I: IntoIterator<Item = Sample>,
        F: FnMut(&Sample, &Pass),
    {
        let mut passes = 0;
        let mut outcome = RunOutcome::Exhausted;

        for sample in samples {
            match self.train(&sample.inputs, &sample.targets) {
                Ok(pass) => {
                    passes += 1;
                    on_pass(&sample, &pass);
                }
                Err(TrainError::Process(ProcessError::BadInputs(mismatch))) => {
                    let pass = self.passes + 1;
                    warn!(
                        pass,
                        expected = mismatch.expected,
                        got = mismatch.got,
                        "abandoning training run on mismatched inputs"
                    );
                    outcome = RunOutcome::Abandoned { pass, mismatch };
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        let summary = RunSummary {
            passes,
            recent_average_error: self.net.recent_average_error(),
            outcome,
        };
        info!(
            passes,
            recent_average_error = summary.recent_average_error,
            "training run finished"
        );
        Ok(summary)
    }

    /// Consumes `Trainer` object and returns contained `Net` back.
    pub fn teardown(self) -> Net {
        self.net
    }
}
