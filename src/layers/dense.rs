use rand::Rng;

use crate::error::Result;
use crate::layers::unit::Unit;

/// A fully connected layer: an ordered list of units sharing the same input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    units: Vec<Unit>,
}

impl Layer {
    /// `size` fresh, uninitialized units.
    pub fn new(size: usize) -> Layer {
        Layer { units: vec![Unit::new(); size] }
    }

    pub fn from_units(units: Vec<Unit>) -> Layer {
        Layer { units }
    }

    pub fn size(&self) -> usize {
        self.units.len()
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut [Unit] {
        &mut self.units
    }

    /// Reinitializes every unit to take `input_size` inputs (bias included).
    pub fn initialize_with<R: Rng + ?Sized>(&mut self, input_size: usize, rng: &mut R) {
        for unit in &mut self.units {
            unit.initialize_with(input_size, rng);
        }
    }

    /// Output of every unit for `input` (which already carries the bias term).
    pub fn feed_from(&self, input: &[f64]) -> Result<Vec<f64>> {
        self.units.iter().map(|unit| unit.output(input)).collect()
    }

    /// True when every unit expects exactly `input_size` inputs.
    pub fn accepts(&self, input_size: usize) -> bool {
        self.units.iter().all(|unit| unit.size() == input_size)
    }
}
