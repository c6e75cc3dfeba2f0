mod trainer;

pub use trainer::{LossTrace, Trainer};
