use crate::error::{OcrError, Result};
use crate::layers::dense::Layer;
use crate::loss::mse::SquaredErrorLoss;

/// Backward iterator over per-unit error terms, output layer first.
///
/// Each step needs the error terms of the layer after it, so the iterator
/// keeps exactly one layer's worth of errors between calls; nothing earlier
/// is computed until the caller asks for it.
///
/// The iterator borrows the layers, so every term is computed from the
/// weights as they were before the step. Corrections can only be applied
/// once the iterator is dropped.
pub struct ErrorTerms<'a> {
    layers: &'a [Layer],
    outputs: &'a [Vec<f64>],
    target: &'a [f64],
    /// Index of the layer whose errors the next call yields.
    next: Option<usize>,
    later: Vec<f64>,
}

impl<'a> ErrorTerms<'a> {
    /// `outputs` is a forward pass over `layers` (input first, `layers.len() + 1` entries).
    pub(crate) fn new(layers: &'a [Layer], outputs: &'a [Vec<f64>], target: &'a [f64]) -> Result<Self> {
        if outputs.len() != layers.len() + 1 {
            return Err(OcrError::DimensionMismatch {
                expected: layers.len() + 1,
                actual: outputs.len(),
            });
        }
        let width = layers.last().map_or(0, Layer::size);
        if target.len() != width {
            return Err(OcrError::DimensionMismatch { expected: width, actual: target.len() });
        }
        Ok(ErrorTerms {
            layers,
            outputs,
            target,
            next: layers.len().checked_sub(1),
            later: Vec::new(),
        })
    }

    fn output_errors(&self, index: usize) -> Result<Vec<f64>> {
        let input = &self.outputs[index];
        let residual = SquaredErrorLoss::residual(&self.outputs[index + 1], self.target);
        self.layers[index].units().iter().zip(residual)
            .map(|(unit, r)| Ok(unit.output_derivative(input)? * r))
            .collect()
    }

    fn hidden_errors(&self, index: usize) -> Result<Vec<f64>> {
        let input = &self.outputs[index];
        let following = &self.layers[index + 1];
        self.layers[index].units().iter().enumerate()
            .map(|(k, unit)| {
                let propagated: f64 = following.units().iter().zip(&self.later)
                    .map(|(next_unit, e)| next_unit.weight(k) * e)
                    .sum();
                Ok(unit.output_derivative(input)? * propagated)
            })
            .collect()
    }
}

impl Iterator for ErrorTerms<'_> {
    type Item = Result<Vec<f64>>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        let errors = if index + 1 == self.layers.len() {
            self.output_errors(index)
        } else {
            self.hidden_errors(index)
        };
        match errors {
            Ok(errors) => {
                self.next = index.checked_sub(1);
                self.later = errors.clone();
                Some(Ok(errors))
            }
            Err(e) => {
                self.next = None;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.next.map_or(0, |i| i + 1);
        (remaining, Some(remaining))
    }
}
