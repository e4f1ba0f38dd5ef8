pub mod error;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;
pub mod bitmap;
pub mod ocr;
pub mod persist;

// Convenience re-exports
pub use error::{OcrError, Result};
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use layers::unit::Unit;
pub use network::encoding::Encoding;
pub use network::network::Network;
pub use loss::mse::SquaredErrorLoss;
pub use optim::sgd::MomentumSgd;
pub use train::trainer::train_network;
pub use train::train_config::TrainConfig;
pub use bitmap::binary_image::BinaryImage;
pub use ocr::ocr_network::{OcrNetwork, Segmentation};
