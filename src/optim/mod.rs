pub mod sgd;

pub use sgd::MomentumSgd;
