use serde::{Serialize, Deserialize};

/// Error statistics of one completed training cycle.
///
/// A cycle is one full pass over the training set; both errors are means of
/// `½·Σ(target - output)²` over their respective example sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleStats {
    /// 0-based cycle number.
    pub cycle: usize,
    /// Mean error over the training set, each measured before its correction.
    pub train_error: f64,
    /// Mean error over the held-out set; `None` without validation examples.
    pub validation_error: Option<f64>,
    /// Wall-clock duration of the cycle in milliseconds.
    pub elapsed_ms: u64,
}
