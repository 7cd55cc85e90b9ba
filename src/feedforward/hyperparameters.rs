use thiserror::Error;

/// Training hyperparameters shared by every neuron of one `Net`.
///
/// Passed to `Net::new` and kept by the network, so independently configured
/// networks never interfere with each other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hyperparameters {
    /// Overall net training rate, `eta` (usually from [0.0..1.0]).
    pub learning_rate: f64,

    /// Multiplier of the last weight change, `alpha` (from [0.0..n]).
    pub momentum: f64,

    /// Number of training samples the recent average error is averaged over, `K`.
    ///
    /// The running average is updated as `(avg * K + error) / (K + 1)`.
    pub error_smoothing: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Hyperparameters {
            learning_rate: 0.15,
            momentum: 0.5,
            error_smoothing: 100.0,
        }
    }
}

impl Hyperparameters {
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    pub fn with_error_smoothing(mut self, error_smoothing: f64) -> Self {
        self.error_smoothing = error_smoothing;
        self
    }

    /// Checks that every hyperparameter is finite and non-negative.
    ///
    /// # Examples
    /// ```
    /// # use bpnnet::feedforward::Hyperparameters;
    /// assert!(Hyperparameters::default().validate().is_ok());
    /// assert!(Hyperparameters::default().with_momentum(-0.5).validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), BadHyperparameter> {
        let checks = [
            ("learning rate", self.learning_rate),
            ("momentum", self.momentum),
            ("error smoothing", self.error_smoothing),
        ];
        for &(name, value) in checks.iter() {
            if !value.is_finite() || value < 0.0 {
                return Err(BadHyperparameter { name, value });
            }
        }
        Ok(())
    }
}

/// Error structure for a hyperparameter that is negative, infinite or NaN
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Hyperparameter {name} must be finite and non-negative, but got {value}!")]
pub struct BadHyperparameter {
    pub name: &'static str,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let h = Hyperparameters::default();
        assert_eq!(h.learning_rate, 0.15);
        assert_eq!(h.momentum, 0.5);
        assert_eq!(h.error_smoothing, 100.0);
    }

    #[test]
    fn setters_chain() {
        let h = Hyperparameters::default()
            .with_learning_rate(0.3)
            .with_momentum(0.0)
            .with_error_smoothing(10.0);
        assert_eq!(
            h,
            Hyperparameters {
                learning_rate: 0.3,
                momentum: 0.0,
                error_smoothing: 10.0,
            }
        );
        assert!(h.validate().is_ok());
    }

    #[test]
    fn rejects_non_finite() {
        let err = Hyperparameters::default()
            .with_learning_rate(f64::NAN)
            .validate()
            .unwrap_err();
        assert_eq!(err.name, "learning rate");

        let err = Hyperparameters::default()
            .with_error_smoothing(f64::INFINITY)
            .validate()
            .unwrap_err();
        assert_eq!(err.name, "error smoothing");
    }
}
