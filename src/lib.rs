//! Multilayer perceptron trained online by backpropagation with momentum.
//!
//! * [`feedforward`] holds the network, its forward and backward passes, and the run driver;
//! * [`training_data`] reads and writes the tagged text format used to feed training runs.

pub mod feedforward;
pub mod training_data;

#[cfg(feature = "python")]
mod python_ffi;
