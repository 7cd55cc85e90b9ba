use thiserror::Error;
use tracing::debug;

use super::net::{Net, ProcessError, SizeMismatch};

/// Gradients of one backward pass.
///
/// Holds one gradient per functional neuron of every layer except the input one.
/// They are only meaningful for the example that was fed forward last, so they live in
/// this value rather than in the neurons. `Net::back_prop` computes and applies them in
/// one step; `Net::gradients` lets one inspect them without touching any weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    /// `layers[layer_num][neuron_num]`, `layers[0]` is empty.
    layers: Box<[Box<[f64]>]>,
}

impl Gradients {
    /// Gradients of the functional neurons of layer `layer_num`, if the net has such a layer.
    pub fn layer(&self, layer_num: usize) -> Option<&[f64]> {
        self.layers.get(layer_num).map(|layer| &**layer)
    }
}

impl Net {
    /// Performs training on a given example, previously fed with `Net::feed_forward`.
    ///
    /// * Calculates the RMS error of the outputs and folds it into the recent average error;
    /// * calculates gradients of the output layer, then of the hidden layers in reverse order;
    /// * updates every connection weight using gradients, previous layer outputs and momentum.
    ///
    /// # Returns
    /// * `Ok(f64)` - RMS error of the outputs against `targets`;
    /// * `Err(TrainError)` if `targets` has wrong size or nothing was fed forward.
    ///
    /// # Examples
    /// ```
    /// # use bpnnet::feedforward::{Hyperparameters, Net};
    /// let mut net = Net::seeded(&[2, 4, 1], Hyperparameters::default(), 3).unwrap();
    /// net.feed_forward(&[1.0, 0.0]).unwrap();
    /// let error = net.back_prop(&[1.0]).unwrap();
    /// assert_eq!(error, net.last_error());
    /// // Feed forward exactly once, then back-propagate exactly once
    /// assert!(net.back_prop(&[1.0]).is_err());
    /// ```
    pub fn back_prop(&mut self, targets: &[f64]) -> Result<f64, TrainError> {
        let gradients = self.gradients(targets)?;

        // Calculate overall net error (RMS of output neuron errors)
        let outputs = self.output_layer().functional();
        let count = outputs.len() as f64;
        let squares: f64 = outputs
            .iter()
            .zip(targets)
            .map(|(neuron, &target)| {
                let delta = target - neuron.output();
                delta * delta
            })
            .sum();
        self.error = (squares / count).sqrt();

        // Recent average measurement
        let k = self.hyperparameters.error_smoothing;
        self.recent_average_error = (self.recent_average_error * k + self.error) / (k + 1.0);

        self.apply_gradients(gradients);
        self.forward_pending = false;

        debug!(
            error = self.error,
            recent_average_error = self.recent_average_error,
            "back-propagated"
        );
        Ok(self.error)
    }

    /// Calculates gradients for the example fed forward last, without touching any weight.
    ///
    /// The output layer goes first, then hidden layers from the last one down to layer 1:
    /// each hidden layer needs the finished gradients of the layer after it.
    pub fn gradients(&self, targets: &[f64]) -> Result<Gradients, TrainError> {
        if targets.len() != self.outputs_count() {
            return Err(TrainError::BadTargets(SizeMismatch {
                expected: self.outputs_count(),
                got: targets.len(),
            }));
        }
        if !self.forward_pending {
            return Err(TrainError::NoForwardPass);
        }

        let layers_count = self.layers.len();
        let mut layers: Vec<Box<[f64]>> = Vec::with_capacity(layers_count);

        // Output layer gradients
        layers.push(
            self.output_layer()
                .functional()
                .iter()
                .zip(targets)
                .map(|(neuron, &target)| neuron.output_gradient(target))
                .collect(),
        );

        // Hidden layer gradients, in reverse order
        for layer_num in (1..layers_count - 1).rev() {
            let next_gradients = &layers[layers.len() - 1];
            let hidden: Box<[f64]> = self.layers[layer_num]
                .functional()
                .iter()
                .map(|neuron| neuron.hidden_gradient(next_gradients))
                .collect();
            layers.push(hidden);
        }

        // Input layer has no gradients
        layers.push(Vec::new().into_boxed_slice());
        layers.reverse();

        Ok(Gradients {
            layers: layers.into_boxed_slice(),
        })
    }

    /// Updates connection weights of all layers from the output one down to the first
    /// hidden one. `gradients` are the ones of this net for the example fed forward last.
    fn apply_gradients(&mut self, gradients: Gradients) {
        for (layer_num, layer_gradients) in gradients.layers.iter().enumerate().skip(1).rev() {
            let (before, after) = self.layers.split_at_mut(layer_num);
            let prev_layer = before[layer_num - 1].neurons_mut();

            for (neuron, &gradient) in after[0].functional().iter().zip(layer_gradients.iter()) {
                neuron.update_input_weights(gradient, prev_layer, &self.hyperparameters);
            }
        }
    }
}

/// Error structure for `Net::back_prop` and `Trainer::train`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainError {
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("Expected {} target(s), but got {}!", .0.expected, .0.got)]
    BadTargets(SizeMismatch),
    #[error("Nothing to back-propagate, feed an example forward first!")]
    NoForwardPass,
}
