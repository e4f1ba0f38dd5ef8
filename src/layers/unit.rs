use rand::Rng;

use crate::activation::activation::ActivationFunction;
use crate::error::{OcrError, Result};

/// A single weighted-sum unit.
///
/// `weights` holds one weight per input plus a trailing bias weight; the bias
/// input itself is the constant `-1` appended by the network's forward pass.
/// `previous_delta` is the correction applied last time, replayed scaled by
/// the momentum factor on the next correction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unit {
    weights: Vec<f64>,
    previous_delta: Vec<f64>,
    activator: ActivationFunction,
}

impl Unit {
    /// An empty unit; it has no weights until `initialize` is called.
    pub fn new() -> Unit {
        Unit::default()
    }

    /// Builds a unit from stored weights with a zeroed momentum buffer.
    pub fn from_weights(weights: Vec<f64>) -> Unit {
        let previous_delta = vec![0.0; weights.len()];
        Unit {
            weights,
            previous_delta,
            activator: ActivationFunction::Sigmoid,
        }
    }

    /// Draws `size` weights uniformly in [-0.5, 0.5] and clears the momentum buffer.
    pub fn initialize(&mut self, size: usize) {
        self.initialize_with(size, &mut rand::thread_rng());
    }

    pub fn initialize_with<R: Rng + ?Sized>(&mut self, size: usize, rng: &mut R) {
        self.weights = (0..size).map(|_| rng.gen_range(-0.5..=0.5)).collect();
        self.previous_delta = vec![0.0; size];
    }

    pub fn size(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn weight(&self, index: usize) -> f64 {
        self.weights[index]
    }

    fn weighted_sum(&self, input: &[f64]) -> Result<f64> {
        if input.len() != self.weights.len() {
            return Err(OcrError::DimensionMismatch {
                expected: self.weights.len(),
                actual: input.len(),
            });
        }
        Ok(self.weights.iter().zip(input).map(|(w, x)| w * x).sum())
    }

    /// Activation of the dot product between the weights and `input`.
    pub fn output(&self, input: &[f64]) -> Result<f64> {
        let z = self.weighted_sum(input)?;
        Ok(self.activator.function(z))
    }

    /// Activation derivative at the same dot product `output` uses.
    pub fn output_derivative(&self, input: &[f64]) -> Result<f64> {
        let z = self.weighted_sum(input)?;
        Ok(self.activator.derivative(z))
    }

    /// `w[i] += learning_rate * delta[i] + momentum * previous_delta[i]`,
    /// then remembers `delta` for the next call.
    pub fn correct(&mut self, delta: Vec<f64>, learning_rate: f64, momentum: f64) -> Result<()> {
        if delta.len() != self.weights.len() {
            return Err(OcrError::DimensionMismatch {
                expected: self.weights.len(),
                actual: delta.len(),
            });
        }
        for ((w, d), p) in self.weights.iter_mut().zip(&delta).zip(&self.previous_delta) {
            *w += learning_rate * d + momentum * p;
        }
        self.previous_delta = delta;
        Ok(())
    }
}
