//! Errors reported by network construction and training.

use std::error;
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Storage for a layer could not be reserved.
    Allocation,
    /// The network has no initialized layers to run.
    InvalidTopology,
    /// A layer was requested with zero neurons.
    EmptyLayer,
    /// The input vector does not match the input layer.
    InputSize { expected: usize, actual: usize },
    /// The target vector does not match the output layer.
    TargetSize { expected: usize, actual: usize },
    /// A delta buffer was built for a different layout.
    DeltaShape,
    /// The learning rate must be positive and finite.
    LearningRate(f64),
    /// A layer operation was called without the neighbour it reads from.
    MissingNeighbor,
    /// Training was started without any examples.
    NoExamples,
    /// A configuration could not be read or is inconsistent.
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Allocation => write!(f, "failed to allocate layer storage"),
            Error::InvalidTopology => {
                write!(f, "network has no layers to evaluate")
            }
            Error::EmptyLayer => {
                write!(f, "every layer must have at least one neuron")
            }
            Error::DeltaShape => {
                write!(f, "delta buffer does not match the network layout")
            }
            Error::InputSize { expected, actual } => {
                write!(f, "expected {} inputs, got {}", expected, actual)
            }
            Error::TargetSize { expected, actual } => {
                write!(f, "expected {} targets, got {}", expected, actual)
            }
            Error::LearningRate(rate) => {
                write!(f, "learning rate must be positive, got {}", rate)
            }
            Error::MissingNeighbor => {
                write!(f, "layer is missing the neighbour this step requires")
            }
            Error::NoExamples => write!(f, "no training examples provided"),
            Error::Config(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl error::Error for Error {}

/// Checks that `rate` can be used as a gradient step.
pub(crate) fn check_learning_rate(rate: f64) -> Result<()> {
    if rate > 0.0 && rate.is_finite() {
        Ok(())
    } else {
        Err(Error::LearningRate(rate))
    }
}
