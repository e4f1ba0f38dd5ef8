pub mod trainer;
pub mod cycle_stats;
pub mod train_config;
pub mod loop_fn;

pub use trainer::train_network;
pub use cycle_stats::CycleStats;
pub use train_config::{load_config, TrainConfig};
pub use loop_fn::{Pair, TrainingLoop};
