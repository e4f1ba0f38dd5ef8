pub struct SquaredErrorLoss;

impl SquaredErrorLoss {
    /// Scalar error: ½·Σ(expected - predicted)²
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        0.5 * predicted.iter().zip(expected.iter())
            .map(|(y, t)| (t - y).powi(2))
            .sum::<f64>()
    }

    /// Per-output residual: expected - predicted (the descent direction).
    pub fn residual(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        predicted.iter().zip(expected.iter())
            .map(|(y, t)| t - y)
            .collect()
    }
}
