//! Feedforward neural network with momentum-based online backpropagation training

mod backprop;
mod hyperparameters;
mod net;
mod neuron;
mod trainer;

pub use backprop::*;
pub use hyperparameters::*;
pub use net::*;
pub use neuron::*;
pub use trainer::*;
