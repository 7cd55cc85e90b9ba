use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use super::hyperparameters::Hyperparameters;

/// Directed weighted edge from a neuron to one neuron of the next layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    pub weight: f64,

    /// Previous update applied to `weight`, reused as the momentum term.
    pub delta_weight: f64,
}

/// Activation unit of a layer.
///
/// A neuron owns its *outgoing* connections: `connections[n]` leads to neuron `n` of the
/// next layer. So the weights feeding a neuron are stored in the previous layer, at slot
/// `index` of every neuron there.
#[derive(Debug, Clone)]
pub struct Neuron {
    output: f64,
    index: usize,
    connections: Box<[Connection]>,
}

impl Neuron {
    /// Returns neuron number `index` of its layer with `num_outputs` outgoing connections.
    ///
    /// Weights are drawn independently from [0,1), momentum starts at zero.
    pub fn new<R: Rng + ?Sized>(num_outputs: usize, index: usize, rng: &mut R) -> Neuron {
        let weights_between = Uniform::from(0.0..1.0);
        let connections = weights_between
            .sample_iter(rng)
            .take(num_outputs)
            .map(|weight| Connection {
                weight,
                delta_weight: 0.0,
            })
            .collect();

        Neuron {
            output: 0.0,
            index,
            connections,
        }
    }

    pub fn set_output(&mut self, output: f64) {
        self.output = output;
    }

    pub fn output(&self) -> f64 {
        self.output
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    #[cfg(test)]
    pub(super) fn connections_mut(&mut self) -> &mut [Connection] {
        &mut self.connections
    }

    /// Transfer function, tanh. Output range (-1.0..1.0).
    pub fn transfer(x: f64) -> f64 {
        x.tanh()
    }

    /// Transfer function derivative, expressed in terms of tanh itself.
    /// Implements the formula:
    /// `1 - t * t`.
    pub fn transfer_der_t(t: f64) -> f64 {
        1.0 - t * t
    }

    /// Sums the previous layer's outputs (which are our inputs), bias neuron included,
    /// weighted by the connections leading to us, and activates.
    pub fn feed_forward(&mut self, prev_layer: &[Neuron]) {
        let sum: f64 = prev_layer
            .iter()
            .map(|n| n.output * n.connections[self.index].weight)
            .sum();
        self.output = Neuron::transfer(sum);
    }

    /// Gradient of an output layer neuron for the desired value `target`.
    pub fn output_gradient(&self, target: f64) -> f64 {
        (target - self.output) * Neuron::transfer_der_t(self.output)
    }

    /// Gradient of a hidden neuron.
    ///
    /// `next_gradients` are the finished gradients of the functional neurons of the next
    /// layer, the bias neuron excluded.
    pub fn hidden_gradient(&self, next_gradients: &[f64]) -> f64 {
        self.sum_dow(next_gradients) * Neuron::transfer_der_t(self.output)
    }

    /// Sum of our contributions to the errors at the nodes we feed.
    fn sum_dow(&self, next_gradients: &[f64]) -> f64 {
        self.connections
            .iter()
            .zip(next_gradients.iter())
            .map(|(c, &g)| c.weight * g)
            .sum()
    }

    /// Updates the weights feeding this neuron. They are stored in the connections of
    /// `prev_layer`, bias neuron included, at slot `self.index`.
    pub fn update_input_weights(
        &self,
        gradient: f64,
        prev_layer: &mut [Neuron],
        hyperparameters: &Hyperparameters,
    ) {
        for neuron in prev_layer.iter_mut() {
            let output = neuron.output;
            let connection = &mut neuron.connections[self.index];

            let delta_weight = hyperparameters.learning_rate * output * gradient
                + hyperparameters.momentum * connection.delta_weight;

            connection.delta_weight = delta_weight;
            connection.weight += delta_weight;
        }
    }
}
