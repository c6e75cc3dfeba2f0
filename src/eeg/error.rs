use std::{error::Error, fmt, io};

use machine_learning::MlErr;
use ndarray::ShapeError;
use safetensors::SafeTensorError;

pub type Result<T> = std::result::Result<T, EegErr>;

/// Errors raised while turning a recording into sample vectors.
#[derive(Debug)]
pub enum EegErr {
    Io(io::Error),
    /// The recording or the event file is malformed.
    Format(String),
    /// A channel asked for by name isn't in the recording.
    MissingChannel(String),
    /// A split asks for more epochs than a class has.
    NotEnoughEpochs {
        what: &'static str,
        needed: usize,
        available: usize,
    },
    Ml(MlErr),
}

impl fmt::Display for EegErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Format(msg) => write!(f, "malformed input: {msg}"),
            Self::MissingChannel(name) => write!(f, "channel {name:?} not found"),
            Self::NotEnoughEpochs {
                what,
                needed,
                available,
            } => write!(
                f,
                "{what} needs {needed} epochs, only {available} are available"
            ),
            Self::Ml(e) => write!(f, "{e}"),
        }
    }
}

impl Error for EegErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Ml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for EegErr {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<MlErr> for EegErr {
    fn from(e: MlErr) -> Self {
        Self::Ml(e)
    }
}

impl From<ShapeError> for EegErr {
    fn from(e: ShapeError) -> Self {
        Self::Ml(MlErr::Shape(e))
    }
}

impl From<SafeTensorError> for EegErr {
    fn from(e: SafeTensorError) -> Self {
        Self::Format(e.to_string())
    }
}

impl From<serde_json::Error> for EegErr {
    fn from(e: serde_json::Error) -> Self {
        Self::Format(e.to_string())
    }
}
