//! Training configuration, loadable from JSON.

use crate::error::{check_learning_rate, Error, Result};
use crate::trainer::StopCondition;

use std::fs;
use std::path::Path;

/// Settings for building and training a network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The number of neurons in each layer, input layer first.
    pub layers: Vec<usize>,
    pub learning_rate: f64,
    /// Upper bound on passes over the training data.
    pub iterations: usize,
    /// Stop early once the training error drops below this value. The
    /// iteration bound still applies.
    pub error_threshold: Option<f64>,
    /// Seed for the weight initializer; a fresh one is used when absent.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            layers: vec![2, 3, 1],
            learning_rate: 0.5,
            iterations: 10_000,
            error_threshold: None,
            seed: None,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Config::from_json(&json)
    }

    /// Checks the settings before any network is built.
    pub fn validate(&self) -> Result<()> {
        if self.layers.len() < 2 {
            return Err(Error::Config(
                "need an input and an output layer".to_owned(),
            ));
        }
        if self.layers.contains(&0) {
            return Err(Error::EmptyLayer);
        }
        check_learning_rate(self.learning_rate)?;
        if self.iterations == 0 {
            return Err(Error::Config("iterations must be positive".to_owned()));
        }
        if let Some(threshold) = self.error_threshold {
            if !(threshold > 0.0 && threshold.is_finite()) {
                let msg = format!(
                    "error threshold must be positive, got {}",
                    threshold
                );
                return Err(Error::Config(msg));
            }
        }
        Ok(())
    }

    /// Returns the condition that ends training.
    pub fn stop_condition(&self) -> StopCondition {
        let iterations = self.iterations;
        match self.error_threshold {
            Some(threshold) => {
                StopCondition::ErrorOrIterations { threshold, iterations }
            }
            None => StopCondition::Iterations(iterations),
        }
    }
}
