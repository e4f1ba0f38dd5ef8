use std::f64::consts::E;

/// Activation applied by every unit after its weighted sum.
///
/// Only the logistic sigmoid is used: its output lies in (0, 1), which is
/// what the target encodings and the distance-based classification expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationFunction {
    #[default]
    Sigmoid,
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
        }
    }

    /// Derivative evaluated at the pre-activation value `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => {
                let fx = self.function(x);
                fx * (1.0 - fx)
            }
        }
    }
}
