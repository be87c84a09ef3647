//! Sources of initial weight values.

use rand::distributions::{Distribution, Uniform};
use rand::Rng;

/// Supplies a fresh value for every weight a layer allocates.
pub trait WeightSource {
    fn next_weight(&mut self) -> f64;
}

impl<F> WeightSource for F
where
    F: FnMut() -> f64,
{
    fn next_weight(&mut self) -> f64 {
        self()
    }
}

/// Draws weights uniformly from `[-1, 1)` using the wrapped generator.
#[derive(Debug)]
pub struct RandomWeights<R: Rng> {
    rng: R,
    range: Uniform<f64>,
}

impl<R: Rng> RandomWeights<R> {
    pub fn new(rng: R) -> Self {
        RandomWeights {
            rng,
            range: Uniform::new(-1.0, 1.0),
        }
    }
}

impl<R: Rng> WeightSource for RandomWeights<R> {
    fn next_weight(&mut self) -> f64 {
        self.range.sample(&mut self.rng)
    }
}
