pub mod backprop;
pub mod encoding;
pub mod network;

pub use backprop::ErrorTerms;
pub use encoding::Encoding;
pub use network::{Network, NetworkKind, NetworkState, BIAS_INPUT};
