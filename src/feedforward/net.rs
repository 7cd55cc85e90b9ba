use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::trace;

use super::hyperparameters::{BadHyperparameter, Hyperparameters};
use super::neuron::{Connection, Neuron};
use super::trainer::Trainer;

/// Ordered neurons of one layer. The last neuron is always the bias neuron.
#[derive(Debug, Clone)]
pub struct Layer {
    neurons: Box<[Neuron]>,
}

impl Layer {
    /// All neurons, bias neuron included.
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    /// Neurons that take part in the computation, i.e. all but the bias neuron.
    pub fn functional(&self) -> &[Neuron] {
        &self.neurons[..self.neurons.len() - 1]
    }

    pub(super) fn neurons_mut(&mut self) -> &mut [Neuron] {
        &mut self.neurons
    }

    pub(super) fn functional_mut(&mut self) -> &mut [Neuron] {
        let len = self.neurons.len();
        &mut self.neurons[..len - 1]
    }

    pub fn bias(&self) -> &Neuron {
        &self.neurons[self.neurons.len() - 1]
    }
}

/// Neural network structure
#[derive(Debug, Clone)]
pub struct Net {
    /// The number of functional (non-bias) neurons in each layer.
    pub(super) geometry: Box<[usize]>,

    /// `layers[layer_num][neuron_num]`, each layer with `geometry[layer_num] + 1` neurons.
    pub(super) layers: Box<[Layer]>,

    pub(super) hyperparameters: Hyperparameters,

    /// RMS error of the last back-propagated example.
    pub(super) error: f64,

    pub(super) recent_average_error: f64,

    /// Set by `Net::feed_forward`, cleared by `Net::back_prop`.
    pub(super) forward_pending: bool,
}

impl Net {
    /// Returns network for given geometry.
    /// It will have random weights from range [0,1), drawn from `rng`.
    ///
    /// # Arguments
    /// * `geometry` - a number slice that holds a desired number of neurons in each layer,
    /// bias neurons excluded;
    /// * `hyperparameters` - training hyperparameters of the network;
    /// * `rng` - source of the initial weights.
    ///
    /// # Returns
    /// * `Ok(Net)` if geometry and hyperparameters are valid;
    /// * `Err(NewNetError)` otherwise.
    ///
    /// # Examples
    /// ```
    /// # use bpnnet::feedforward::{Hyperparameters, Net};
    /// let mut rng = rand::thread_rng();
    /// let net = Net::new(&[3, 2, 1], Hyperparameters::default(), &mut rng).unwrap();
    /// assert_eq!(net.layers().len(), 3);
    /// ```
    pub fn new<R: Rng + ?Sized>(
        geometry: &[usize],
        hyperparameters: Hyperparameters,
        rng: &mut R,
    ) -> Result<Net, NewNetError> {
        if geometry.len() < 2 {
            return Err(NewNetError::BadGeometry(geometry.len()));
        }
        if let Some(layer_num) = geometry.iter().position(|&size| size == 0) {
            return Err(NewNetError::EmptyLayer(layer_num));
        }
        hyperparameters.validate()?;

        let layers_count = geometry.len();
        let mut layers = Vec::with_capacity(layers_count);

        for (layer_num, &layer_size) in geometry.iter().enumerate() {
            let num_outputs = if layer_num == layers_count - 1 {
                0
            } else {
                geometry[layer_num + 1]
            };

            // One more neuron than requested: the bias neuron goes last
            let mut neurons: Vec<Neuron> = (0..=layer_size)
                .map(|neuron_num| Neuron::new(num_outputs, neuron_num, rng))
                .collect();
            trace!(layer_num, neurons = neurons.len(), num_outputs, "made a layer");

            // Force the bias node's output value to 1.0, it's the last neuron created above
            if let Some(bias) = neurons.last_mut() {
                bias.set_output(1.0);
            }

            layers.push(Layer {
                neurons: neurons.into_boxed_slice(),
            });
        }

        Ok(Net {
            geometry: geometry.to_owned().into_boxed_slice(),
            layers: layers.into_boxed_slice(),
            hyperparameters,
            error: 0.0,
            recent_average_error: 0.0,
            forward_pending: false,
        })
    }

    /// Returns network for given geometry, with initial weights reproducible from `seed`.
    ///
    /// # Examples
    /// ```
    /// # use bpnnet::feedforward::{Hyperparameters, Net};
    /// let a = Net::seeded(&[2, 2, 1], Hyperparameters::default(), 42).unwrap();
    /// let b = Net::seeded(&[2, 2, 1], Hyperparameters::default(), 42).unwrap();
    /// assert_eq!(a.connection(0, 0, 1), b.connection(0, 0, 1));
    /// ```
    pub fn seeded(
        geometry: &[usize],
        hyperparameters: Hyperparameters,
        seed: u64,
    ) -> Result<Net, NewNetError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Net::new(geometry, hyperparameters, &mut rng)
    }

    pub fn geometry(&self) -> &[usize] {
        &self.geometry
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Connection from neuron `neuron_num` of layer `layer_num` to neuron `slot` of the next layer.
    pub fn connection(&self, layer_num: usize, neuron_num: usize, slot: usize) -> Option<&Connection> {
        self.layers
            .get(layer_num)?
            .neurons()
            .get(neuron_num)?
            .connections()
            .get(slot)
    }

    /// RMS error of the last back-propagated example.
    pub fn last_error(&self) -> f64 {
        self.error
    }

    /// Running average of the per-example RMS error.
    pub fn recent_average_error(&self) -> f64 {
        self.recent_average_error
    }

    /// Number of input values.
    pub fn inputs_count(&self) -> usize {
        self.geometry[0]
    }

    /// Number of output values.
    pub fn outputs_count(&self) -> usize {
        self.geometry[self.geometry.len() - 1]
    }

    /// Latches `inputs` into the input layer and propagates them forward, layer by layer.
    ///
    /// # Returns
    /// * `Ok(())` if amount of inputs is right;
    /// * `Err(ProcessError)` otherwise, leaving the network untouched.
    ///
    /// # Examples
    /// ```
    /// # use bpnnet::feedforward::{Hyperparameters, Net};
    /// let mut net = Net::seeded(&[2, 3, 1], Hyperparameters::default(), 1).unwrap();
    /// net.feed_forward(&[1.0, 0.0]).unwrap();
    /// assert!(net.feed_forward(&[1.0]).is_err());
    /// ```
    pub fn feed_forward(&mut self, inputs: &[f64]) -> Result<(), ProcessError> {
        if inputs.len() != self.inputs_count() {
            return Err(ProcessError::BadInputs(SizeMismatch {
                expected: self.inputs_count(),
                got: inputs.len(),
            }));
        }

        // Assign (latch) the input values into the input neurons, bias untouched
        for (neuron, &input) in self.layers[0].functional_mut().iter_mut().zip(inputs) {
            neuron.set_output(input);
        }

        // Forward propagate
        for layer_num in 1..self.layers.len() {
            let (before, after) = self.layers.split_at_mut(layer_num);
            let prev_layer = before[layer_num - 1].neurons();

            for neuron in after[0].functional_mut() {
                neuron.feed_forward(prev_layer);
            }
        }

        self.forward_pending = true;
        Ok(())
    }

    /// Returns outputs of the functional neurons of the output layer.
    pub fn results(&self) -> Vec<f64> {
        self.output_layer()
            .functional()
            .iter()
            .map(Neuron::output)
            .collect()
    }

    /// Fills `outputs` with the outputs of the functional neurons of the output layer.
    pub fn results_into(&self, outputs: &mut [f64]) -> Result<(), ProcessError> {
        if outputs.len() != self.outputs_count() {
            return Err(ProcessError::BadOutputs(SizeMismatch {
                expected: self.outputs_count(),
                got: outputs.len(),
            }));
        }
        for (o, neuron) in outputs.iter_mut().zip(self.output_layer().functional()) {
            *o = neuron.output();
        }
        Ok(())
    }

    /// Calculates output of the network using given input.
    ///
    /// # Arguments
    /// * `inputs` - slice that holds activations of input neurons;
    /// * `outputs` - mutable slice that will be filled with activations of output neurons.
    ///
    /// # Examples
    /// ```
    /// # use bpnnet::feedforward::{Hyperparameters, Net};
    /// let mut net = Net::seeded(&[10, 20, 20, 3], Hyperparameters::default(), 5).unwrap();
    /// let inputs = [1.0; 10];
    /// let mut outputs = [0.0, 0.0, 0.0];
    /// net.process(&inputs, &mut outputs).unwrap();
    /// ```
    pub fn process(&mut self, inputs: &[f64], outputs: &mut [f64]) -> Result<(), ProcessError> {
        if outputs.len() != self.outputs_count() {
            return Err(ProcessError::BadOutputs(SizeMismatch {
                expected: self.outputs_count(),
                got: outputs.len(),
            }));
        }
        self.feed_forward(inputs)?;
        self.results_into(outputs)
    }

    pub(super) fn output_layer(&self) -> &Layer {
        &self.layers[self.layers.len() - 1]
    }

    /// Consumes `Net` and builds `Trainer` object containing it.
    /// See `Trainer`'s documentation for details.
    pub fn build_trainer(self) -> Trainer {
        Trainer::build(self)
    }
}

/// Error structure for `Net::new`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NewNetError {
    #[error(
        "Net must have at least two layers (input and output), but got geometry with len {0}!"
    )]
    BadGeometry(usize),
    #[error("Every layer must have at least one neuron, but layer {0} is empty!")]
    EmptyLayer(usize),
    #[error(transparent)]
    BadHyperparameters(#[from] BadHyperparameter),
}

/// Error structure for `Net::feed_forward` and `Net::process`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessError {
    #[error("Expected {} input(s), but got {}!", .0.expected, .0.got)]
    BadInputs(SizeMismatch),
    #[error("Expected {} output(s), but got {}!", .0.expected, .0.got)]
    BadOutputs(SizeMismatch),
}

/// Error structure for collections size mismatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Expected {expected} values, but got {got}!")]
pub struct SizeMismatch {
    pub expected: usize,
    pub got: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand_chacha::ChaCha8Rng;

    fn net(geometry: &[usize]) -> Net {
        Net::seeded(geometry, Hyperparameters::default(), 1234).unwrap()
    }

    fn assert_biases(net: &Net) {
        for layer in net.layers() {
            assert_eq!(layer.bias().output(), 1.0);
        }
    }

    #[test]
    fn construction_shape() {
        let geometry = [4, 3, 2, 1];
        let net = net(&geometry);

        assert_eq!(net.layers().len(), geometry.len());
        for (layer_num, layer) in net.layers().iter().enumerate() {
            assert_eq!(layer.neurons().len(), geometry[layer_num] + 1);
            assert_eq!(layer.functional().len(), geometry[layer_num]);

            let expected_outputs = geometry.get(layer_num + 1).copied().unwrap_or(0);
            for (neuron_num, neuron) in layer.neurons().iter().enumerate() {
                assert_eq!(neuron.index(), neuron_num);
                assert_eq!(neuron.connections().len(), expected_outputs);
                for c in neuron.connections() {
                    assert!(c.weight >= 0.0 && c.weight < 1.0);
                    assert_eq!(c.delta_weight, 0.0);
                }
            }
        }
        assert_biases(&net);
        assert_eq!(net.recent_average_error(), 0.0);
        assert_eq!(net.last_error(), 0.0);
    }

    #[test]
    fn bad_geometry() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let h = Hyperparameters::default();
        assert_eq!(
            Net::new(&[3], h, &mut rng).unwrap_err(),
            NewNetError::BadGeometry(1)
        );
        assert_eq!(
            Net::new(&[], h, &mut rng).unwrap_err(),
            NewNetError::BadGeometry(0)
        );
        assert_eq!(
            Net::new(&[2, 0, 1], h, &mut rng).unwrap_err(),
            NewNetError::EmptyLayer(1)
        );
        assert!(matches!(
            Net::new(&[2, 1], h.with_learning_rate(-1.0), &mut rng),
            Err(NewNetError::BadHyperparameters(_))
        ));
    }

    #[test]
    fn same_seed_same_weights() {
        let a = net(&[3, 5, 2]);
        let b = net(&[3, 5, 2]);
        let c = Net::seeded(&[3, 5, 2], Hyperparameters::default(), 4321).unwrap();

        let weights = |net: &Net| -> Vec<f64> {
            net.layers()
                .iter()
                .flat_map(|l| l.neurons().iter())
                .flat_map(|n| n.connections().iter().map(|c| c.weight))
                .collect()
        };
        assert_eq!(weights(&a), weights(&b));
        assert_ne!(weights(&a), weights(&c));
    }

    #[test]
    fn feed_forward_small_net() {
        let mut net = net(&[2, 2, 1]);
        net.feed_forward(&[0.0, 0.0]).unwrap();

        let results = net.results();
        assert_eq!(results.len(), 1);
        assert!(results[0] > -1.0 && results[0] < 1.0);
        assert_biases(&net);
    }

    #[test]
    fn feed_forward_matches_hand_computation() {
        let mut net = net(&[2, 1]);
        net.feed_forward(&[0.5, -0.25]).unwrap();

        let w = |n| net.connection(0, n, 0).unwrap().weight;
        let expected = (0.5 * w(0) - 0.25 * w(1) + w(2)).tanh();
        assert_relative_eq!(net.results()[0], expected);
    }

    #[test]
    fn feed_forward_is_deterministic() {
        let mut net = net(&[3, 4, 4, 2]);
        net.feed_forward(&[0.1, -0.7, 0.3]).unwrap();
        let first = net.results();
        net.feed_forward(&[0.9, 0.9, 0.9]).unwrap();
        net.feed_forward(&[0.1, -0.7, 0.3]).unwrap();
        assert_eq!(net.results(), first);
        assert_biases(&net);
    }

    #[test]
    fn feed_forward_rejects_wrong_inputs() {
        let mut net = net(&[2, 2, 1]);
        net.feed_forward(&[0.3, 0.3]).unwrap();
        let before = net.results();

        assert_eq!(
            net.feed_forward(&[1.0, 1.0, 1.0]),
            Err(ProcessError::BadInputs(SizeMismatch {
                expected: 2,
                got: 3
            }))
        );
        assert_eq!(net.results(), before);
        assert_eq!(net.layers()[0].functional()[0].output(), 0.3);
    }

    #[test]
    fn results_skip_bias() {
        let mut net = net(&[2, 3]);
        net.feed_forward(&[1.0, 1.0]).unwrap();
        assert_eq!(net.results().len(), 3);

        let mut outputs = [0.0; 3];
        net.results_into(&mut outputs).unwrap();
        assert_eq!(outputs.to_vec(), net.results());

        let mut short = [0.0; 2];
        assert_eq!(
            net.process(&[1.0, 1.0], &mut short),
            Err(ProcessError::BadOutputs(SizeMismatch {
                expected: 3,
                got: 2
            }))
        );
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            ProcessError::BadInputs(SizeMismatch {
                expected: 2,
                got: 1
            })
            .to_string(),
            "Expected 2 input(s), but got 1!"
        );
        assert_eq!(
            NewNetError::BadGeometry(1).to_string(),
            "Net must have at least two layers (input and output), but got geometry with len 1!"
        );
    }
}
