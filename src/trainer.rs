//! An epoch loop that feeds labelled examples to a model one at a time.

use crate::error::{check_learning_rate, Error, Result};
use crate::network::{Deltas, Network};
use crate::utils::ZeroOut;

use log::info;
use std::time::{Duration, Instant};

/// A model that learns from one example at a time.
///
/// Training an example is split in two: `compute_update` measures the error
/// and fills an update buffer, and `apply_update` moves the parameters.
pub trait Trainable {
    type Input;
    type Output;
    /// Scratch state carried from `compute_update` to `apply_update`.
    type Update;

    /// Allocates an update buffer sized for this model.
    fn new_update(&self) -> Result<Self::Update>;

    /// Evaluates `example` against `expected`, writing the correction into
    /// `update`. Returns the squared error of the prediction, averaged over
    /// the outputs.
    fn compute_update(
        &mut self,
        example: &Self::Input,
        expected: &Self::Output,
        update: &mut Self::Update,
    ) -> Result<f64>;

    /// Moves the parameters by `rate` times `update`, then clears `update`.
    fn apply_update(
        &mut self,
        rate: f64,
        update: &mut Self::Update,
    ) -> Result<()>;
}

impl Trainable for Network {
    type Input = Vec<f64>;
    type Output = Vec<f64>;
    type Update = Deltas;

    fn new_update(&self) -> Result<Deltas> {
        self.new_deltas()
    }

    fn compute_update(
        &mut self,
        example: &Vec<f64>,
        expected: &Vec<f64>,
        update: &mut Deltas,
    ) -> Result<f64> {
        self.backpropagate(example, expected, update)
    }

    fn apply_update(&mut self, rate: f64, update: &mut Deltas) -> Result<()> {
        self.apply_deltas(rate, update)?;
        update.zero_out();
        Ok(())
    }
}

/// Runs stochastic training passes over a fixed set of examples.
///
/// Out of the box a trainer steps with rate 0.1, stops after 1000 passes and
/// logs a summary when it finishes.
#[derive(Debug)]
pub struct Trainer<T: Trainable> {
    model: T,
    learning_rate: f64,
    logging: Logging,
    stop_condition: StopCondition,
}

impl<T: Trainable> Trainer<T> {
    pub fn new(model: T) -> Self {
        Trainer {
            model,
            learning_rate: 0.1,
            logging: Logging::Completion,
            stop_condition: StopCondition::Iterations(1000),
        }
    }

    pub fn learning_rate(mut self, rate: f64) -> Self {
        self.learning_rate = rate;
        self
    }

    pub fn logging(mut self, logging: Logging) -> Self {
        self.logging = logging;
        self
    }

    pub fn stop_condition<C>(mut self, condition: C) -> Self
    where
        C: Into<StopCondition>,
    {
        self.stop_condition = condition.into();
        self
    }

    /// Consumes the trainer and hands back the trained model.
    ///
    /// Each pass visits `examples` in order, and every `(input, expected)`
    /// pair updates the model before the next one is evaluated. After each
    /// pass the summed example errors, halved and divided by the number of
    /// examples, are checked against the stop condition.
    pub fn train(mut self, examples: &[(T::Input, T::Output)]) -> Result<T> {
        check_learning_rate(self.learning_rate)?;
        if examples.is_empty() {
            return Err(Error::NoExamples);
        }
        let mut update = self.model.new_update()?;

        let started = Instant::now();
        let mut passes = 0;
        loop {
            let mut error = 0.0;
            for (example, expected) in examples {
                error +=
                    self.model.compute_update(example, expected, &mut update)?;
                self.model.apply_update(self.learning_rate, &mut update)?;
            }
            error /= 2.0 * examples.len() as f64;
            passes += 1;

            self.logging.pass(passes, error);
            if self.stop_condition.reached(passes, error, started) {
                self.logging.finish(passes, error, started);
                return Ok(self.model);
            }
        }
    }
}

/// How chatty training is.
#[derive(Copy, Clone, Debug)]
pub enum Logging {
    Silent,
    /// Only report the final error.
    Completion,
    /// Report the error every `n` passes, and the final error.
    Iterations(usize),
}

impl Logging {
    fn pass(&self, passes: usize, error: f64) {
        if let Logging::Iterations(every) = *self {
            if every > 0 && passes % every == 0 {
                info!("pass {}: error {}", passes, error);
            }
        }
    }

    fn finish(&self, passes: usize, error: f64, started: Instant) {
        if let Logging::Silent = *self {
            return;
        }
        let secs = started.elapsed().as_secs_f64();
        info!("stopped after {} passes in {:.3}s", passes, secs);
        info!("final error {}", error);
    }
}

/// Decides when a training run is over.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum StopCondition {
    /// A fixed number of passes.
    Iterations(usize),
    /// The pass error falls below the threshold. Unbounded if it never does.
    ErrorThreshold(f64),
    /// Whichever comes first: the error falls below `threshold`, or
    /// `iterations` passes are done.
    ErrorOrIterations { threshold: f64, iterations: usize },
    /// Wall-clock time since training started.
    Duration(Duration),
}

impl From<Duration> for StopCondition {
    fn from(duration: Duration) -> StopCondition {
        StopCondition::Duration(duration)
    }
}

impl StopCondition {
    fn reached(&self, passes: usize, error: f64, started: Instant) -> bool {
        match *self {
            StopCondition::Iterations(iterations) => passes >= iterations,
            StopCondition::ErrorThreshold(threshold) => error < threshold,
            StopCondition::ErrorOrIterations { threshold, iterations } => {
                error < threshold || passes >= iterations
            }
            StopCondition::Duration(limit) => started.elapsed() > limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::RandomWeights;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn network(sizes: &[usize]) -> Network {
        let mut source = RandomWeights::new(StdRng::seed_from_u64(1));
        Network::with_weights(sizes, &mut source).unwrap()
    }

    fn xor() -> Vec<(Vec<f64>, Vec<f64>)> {
        vec![
            (vec![0.0, 0.0], vec![0.0]),
            (vec![0.0, 1.0], vec![1.0]),
            (vec![1.0, 0.0], vec![1.0]),
            (vec![1.0, 1.0], vec![0.0]),
        ]
    }

    #[test]
    fn no_examples() {
        let examples: Vec<(Vec<f64>, Vec<f64>)> = vec![];
        assert_eq!(
            Trainer::new(network(&[1, 1])).train(&examples).unwrap_err(),
            Error::NoExamples
        );
    }

    #[test]
    fn zero_learning_rate() {
        let examples = vec![(vec![0.0], vec![0.0])];
        let trainer = Trainer::new(network(&[1, 1])).learning_rate(0.0);
        let err = trainer.train(&examples).unwrap_err();
        assert_eq!(err, Error::LearningRate(0.0));
    }

    #[test]
    fn wrong_input_size() {
        let examples = vec![(vec![0.0, 0.0], vec![0.0])];
        assert_eq!(
            Trainer::new(network(&[1, 1])).train(&examples).unwrap_err(),
            Error::InputSize { expected: 1, actual: 2 }
        );
    }

    #[test]
    fn wrong_output_size() {
        let examples = vec![(vec![0.0], vec![0.0, 0.0])];
        assert!(Trainer::new(network(&[1, 1])).train(&examples).is_err());
    }

    #[test]
    fn stops_on_error_threshold() {
        let examples = vec![(vec![1.0], vec![0.7]), (vec![0.0], vec![0.4])];
        let mut trained = Trainer::new(network(&[1, 1]))
            .learning_rate(1.0)
            .logging(Logging::Silent)
            .stop_condition(StopCondition::ErrorThreshold(1e-3))
            .train(&examples)
            .unwrap();
        for (input, expected) in &examples {
            let y = trained.predict(input).unwrap()[0];
            assert!((y - expected[0]).abs() < 0.1);
        }
    }

    #[test]
    fn unreachable_threshold_is_capped_by_iterations() {
        // A single sigmoid layer cannot fit XOR, so only the cap ends this.
        let condition =
            StopCondition::ErrorOrIterations { threshold: 1e-6, iterations: 5 };
        let before = network(&[2, 1]).output_layer().weights().cloned();
        let trained = Trainer::new(network(&[2, 1]))
            .logging(Logging::Silent)
            .stop_condition(condition)
            .train(&xor())
            .unwrap();
        assert_ne!(trained.output_layer().weights().cloned(), before);
    }

    #[test]
    fn stop_conditions() {
        let start = Instant::now();
        assert!(StopCondition::Iterations(3).reached(3, 1.0, start));
        assert!(!StopCondition::Iterations(3).reached(2, 0.0, start));
        assert!(StopCondition::ErrorThreshold(0.1).reached(1, 0.05, start));

        let either =
            StopCondition::ErrorOrIterations { threshold: 0.1, iterations: 5 };
        assert!(!either.reached(4, 0.5, start));
        assert!(either.reached(5, 0.5, start));
        assert!(either.reached(1, 0.05, start));
        assert!(!either.reached(4, std::f64::NAN, start));
        assert!(either.reached(5, std::f64::NAN, start));

        let forever: StopCondition = Duration::from_secs(3600).into();
        assert!(!forever.reached(1, 0.0, start));
    }
}
