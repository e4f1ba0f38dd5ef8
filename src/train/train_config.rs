use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OcrError, Result};

/// Hyperparameters of a training run.
///
/// # Fields
/// - `learning_rate`: scale of each correction, in [0, 1]
/// - `momentum`: share of the previous correction replayed, in [0, 1]
/// - `max_cycles`: full passes over the training set before stopping
/// - `validation`: hold out one example per class to report a
///   validation error each cycle
/// - `reinitialize`: draw fresh weights before training starts
///
/// Missing fields in a JSON file take their default values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub learning_rate: f64,
    pub momentum: f64,
    pub max_cycles: usize,
    pub validation: bool,
    pub reinitialize: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            learning_rate: 0.1,
            momentum: 0.8,
            max_cycles: 100,
            validation: true,
            reinitialize: true,
        }
    }
}

impl TrainConfig {
    /// A config with validation and reinitialization enabled.
    pub fn new(learning_rate: f64, momentum: f64, max_cycles: usize) -> Self {
        TrainConfig { learning_rate, momentum, max_cycles, ..TrainConfig::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.learning_rate) {
            return Err(OcrError::InvalidConfig(format!(
                "learning_rate must be in [0, 1], got {}",
                self.learning_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.momentum) {
            return Err(OcrError::InvalidConfig(format!(
                "momentum must be in [0, 1], got {}",
                self.momentum
            )));
        }
        if self.max_cycles == 0 {
            return Err(OcrError::InvalidConfig("max_cycles must be at least 1".to_owned()));
        }
        Ok(())
    }
}

/// Reads and validates a JSON training configuration.
pub fn load_config(path: impl AsRef<Path>) -> Result<TrainConfig> {
    let contents = std::fs::read_to_string(path)?;
    let config: TrainConfig = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}
