use std::time::Instant;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{OcrError, Result};
use crate::loss::mse::SquaredErrorLoss;
use crate::network::network::Network;
use crate::train::cycle_stats::CycleStats;
use crate::train::train_config::TrainConfig;

/// An (example, target) pair.
pub type Pair = (Vec<f64>, Vec<f64>);

/// Endless training generator: each `next()` runs one full cycle of online
/// backprop over the training set and yields its error statistics.
///
/// The examples are shuffled once, when the loop is built, and keep that
/// order on every cycle. With validation enabled, the first shuffled example
/// of every target that has at least two examples is held out; held-out
/// examples are only ever evaluated, never trained on.
///
/// The loop never stops on its own. Stop consuming it (`take`,
/// `take_while`, `break`) to end training; no work happens between calls.
pub struct TrainingLoop<'a> {
    network: &'a mut Network,
    training: Vec<Pair>,
    validation: Vec<Pair>,
    learning_rate: f64,
    momentum: f64,
    cycle: usize,
}

impl<'a> TrainingLoop<'a> {
    pub fn new(
        network: &'a mut Network,
        examples: &[Vec<f64>],
        targets: &[Vec<f64>],
        config: &TrainConfig,
    ) -> Result<Self> {
        Self::with_rng(network, examples, targets, config, &mut rand::thread_rng())
    }

    /// Same as `new`, shuffling with the given generator.
    pub fn with_rng<R: Rng + ?Sized>(
        network: &'a mut Network,
        examples: &[Vec<f64>],
        targets: &[Vec<f64>],
        config: &TrainConfig,
        rng: &mut R,
    ) -> Result<Self> {
        if examples.len() != targets.len() {
            return Err(OcrError::DimensionMismatch {
                expected: examples.len(),
                actual: targets.len(),
            });
        }
        if !network.is_initialized() {
            return Err(OcrError::UninitializedNetwork);
        }

        let mut pairs: Vec<Pair> = examples.iter().cloned()
            .zip(targets.iter().cloned())
            .collect();
        pairs.shuffle(rng);

        let held_out = if config.validation {
            validation_indices(&pairs, targets)
        } else {
            Vec::new()
        };
        let (validation, training): (Vec<_>, Vec<_>) = pairs.into_iter()
            .enumerate()
            .partition(|(i, _)| held_out.contains(i));
        let training: Vec<Pair> = training.into_iter().map(|(_, pair)| pair).collect();
        let validation: Vec<Pair> = validation.into_iter().map(|(_, pair)| pair).collect();

        if training.is_empty() {
            return Err(OcrError::EmptyTrainingSet);
        }
        log::debug!(
            "training loop over {} examples, {} held out for validation",
            training.len(),
            validation.len()
        );

        Ok(TrainingLoop {
            network,
            training,
            validation,
            learning_rate: config.learning_rate,
            momentum: config.momentum,
            cycle: 0,
        })
    }

    pub fn training_set(&self) -> &[Pair] {
        &self.training
    }

    pub fn validation_set(&self) -> &[Pair] {
        &self.validation
    }

    fn run_one_cycle(&mut self) -> Result<CycleStats> {
        let t_start = Instant::now();

        let mut total = 0.0;
        for (example, target) in &self.training {
            total += self.network.train_one_example(example, target, self.learning_rate, self.momentum)?;
        }
        let train_error = total / self.training.len() as f64;

        let validation_error = if self.validation.is_empty() {
            None
        } else {
            let mut total = 0.0;
            for (example, target) in &self.validation {
                let output = self.network.output(example)?;
                total += SquaredErrorLoss::loss(&output, target);
            }
            Some(total / self.validation.len() as f64)
        };

        Ok(CycleStats {
            cycle: self.cycle,
            train_error,
            validation_error,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        })
    }
}

impl Iterator for TrainingLoop<'_> {
    type Item = Result<CycleStats>;

    fn next(&mut self) -> Option<Self::Item> {
        let stats = self.run_one_cycle();
        if let Ok(ref s) = stats {
            log::debug!(
                "cycle {}: train error {:.6}, validation error {:?}",
                s.cycle,
                s.train_error,
                s.validation_error
            );
        }
        self.cycle += 1;
        Some(stats)
    }
}

/// Positions in `pairs` of one held-out example per distinct target, taken in
/// the order targets first appear in `targets`. Targets with fewer than two
/// examples keep all of theirs for training.
fn validation_indices(pairs: &[Pair], targets: &[Vec<f64>]) -> Vec<usize> {
    let mut seen: Vec<&Vec<f64>> = Vec::new();
    let mut held_out = Vec::new();
    for target in targets {
        if seen.contains(&target) {
            continue;
        }
        seen.push(target);
        let mut matching = pairs.iter().enumerate().filter(|(_, (_, t))| t == target);
        if let (Some((first, _)), Some(_)) = (matching.next(), matching.next()) {
            held_out.push(first);
        }
    }
    held_out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(x: f64, t: &[f64]) -> Pair {
        (vec![x], t.to_vec())
    }

    #[test]
    fn singleton_targets_are_not_held_out() {
        let pairs = vec![pair(0.0, &[1.0, 0.0]), pair(1.0, &[0.0, 1.0]), pair(2.0, &[0.0, 1.0])];
        let targets: Vec<_> = pairs.iter().map(|(_, t)| t.clone()).collect();
        assert_eq!(validation_indices(&pairs, &targets), vec![1]);
    }

    #[test]
    fn one_example_per_target() {
        let pairs = vec![
            pair(0.0, &[1.0]), pair(1.0, &[0.0]), pair(2.0, &[1.0]),
            pair(3.0, &[0.0]), pair(4.0, &[1.0]),
        ];
        let targets: Vec<_> = pairs.iter().map(|(_, t)| t.clone()).collect();
        assert_eq!(validation_indices(&pairs, &targets), vec![0, 1]);
    }
}
