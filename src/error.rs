use std::{error::Error, fmt, io};

use machine_learning::MlErr;

use crate::eeg::EegErr;

/// The result type of the walkthrough's stages.
pub type Result<T> = std::result::Result<T, PipelineErr>;

/// All errors that can stop the walkthrough.
#[derive(Debug)]
pub enum PipelineErr {
    /// Invalid configuration, caught before anything runs.
    InvalidConfig(String),
    /// The model, trainer or snapshot failed.
    Ml(MlErr),
    /// The recording couldn't be turned into samples.
    Eeg(EegErr),
    /// Reading the configuration or writing a report failed.
    Io(io::Error),
    /// A configuration file or report couldn't be (de)serialized.
    Json(serde_json::Error),
}

impl fmt::Display for PipelineErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::Ml(e) => write!(f, "model error: {e}"),
            Self::Eeg(e) => write!(f, "eeg error: {e}"),
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Json(e) => write!(f, "json error: {e}"),
        }
    }
}

impl Error for PipelineErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidConfig(_) => None,
            Self::Ml(e) => Some(e),
            Self::Eeg(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
        }
    }
}

impl From<MlErr> for PipelineErr {
    fn from(e: MlErr) -> Self {
        Self::Ml(e)
    }
}

impl From<EegErr> for PipelineErr {
    fn from(e: EegErr) -> Self {
        Self::Eeg(e)
    }
}

impl From<io::Error> for PipelineErr {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for PipelineErr {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
