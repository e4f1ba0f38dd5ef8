use crate::{error::Result, layers::unit::Unit};

/// Plain gradient step with a momentum term; no adaptive schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumSgd {
    pub learning_rate: f64,
    pub momentum: f64,
}

impl MomentumSgd {
    pub fn new(learning_rate: f64, momentum: f64) -> MomentumSgd {
        MomentumSgd { learning_rate, momentum }
    }

    /// Applies one correction to a unit given its raw (unscaled) delta.
    pub fn step(&self, unit: &mut Unit, delta: Vec<f64>) -> Result<()> {
        unit.correct(delta, self.learning_rate, self.momentum)
    }
}
