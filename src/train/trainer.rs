use crate::{
    error::{OcrError, Result},
    network::network::Network,
    train::{cycle_stats::CycleStats, loop_fn::TrainingLoop, train_config::TrainConfig},
};

/// Trains `network` for `config.max_cycles` cycles and returns the
/// statistics of every cycle, in order.
///
/// With `config.reinitialize` set, the network first gets fresh weights
/// sized to the example length; otherwise it must already be initialized.
pub fn train_network(
    network: &mut Network,
    examples: &[Vec<f64>],
    targets: &[Vec<f64>],
    config: &TrainConfig,
) -> Result<Vec<CycleStats>> {
    config.validate()?;
    let input_size = examples.first().map(Vec::len).ok_or(OcrError::EmptyTrainingSet)?;
    if config.reinitialize {
        network.initialize(input_size);
    }

    log::info!(
        "training {network} on {} examples (learning rate {}, momentum {}, {} cycles)",
        examples.len(),
        config.learning_rate,
        config.momentum,
        config.max_cycles
    );

    let history = TrainingLoop::new(network, examples, targets, config)?
        .take(config.max_cycles)
        .collect::<Result<Vec<_>>>()?;

    if let Some(last) = history.last() {
        log::info!(
            "finished after {} cycles, train error {:.6}, validation error {:?}",
            history.len(),
            last.train_error,
            last.validation_error
        );
    }
    Ok(history)
}
