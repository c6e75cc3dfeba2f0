pub mod classifier;
pub mod config;
pub mod eeg;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod synthetic;

pub use classifier::P300Classifier;
pub use config::PipelineConfig;
pub use error::{PipelineErr, Result};
pub use pipeline::Pipeline;
