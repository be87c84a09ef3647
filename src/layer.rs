use crate::activator::{sigmoid, sigmoid_prime};
use crate::error::{check_learning_rate, Error, Result};
use crate::matrix::Mat;
use crate::utils::try_zeros;
use crate::weights::WeightSource;

use itertools::multizip;
use log::trace;

/// The trainable parameters of a layer that has a predecessor.
#[derive(Debug)]
struct Params {
    /// `weights[(i, j)]` connects predecessor neuron `i` to neuron `j`.
    weights: Mat,
    biases: Vec<f64>,
}

/// A single layer of the network.
///
/// Every layer holds the activations of its last forward pass. Layers that
/// follow another layer additionally own a weight matrix and a bias vector.
/// `prev` and `next` are indices into the owning network's layer list.
#[derive(Debug, Default)]
pub struct Layer {
    outputs: Vec<f64>,
    params: Option<Params>,
    prev: Option<usize>,
    next: Option<usize>,
}

impl Layer {
    /// Creates an empty, uninitialized layer.
    pub fn new() -> Self {
        Layer::default()
    }

    /// Sizes the layer and allocates its storage.
    ///
    /// Arguments:
    ///
    ///  * `output_count` - the number of neurons in this layer.
    ///  * `predecessor` - the layer feeding this one, or `None` for the input
    ///                    layer, which gets no weights or biases.
    ///  * `source` - supplies one value per allocated weight.
    pub fn init<S>(
        &mut self,
        output_count: usize,
        predecessor: Option<&Layer>,
        source: &mut S,
    ) -> Result<()>
    where
        S: WeightSource + ?Sized,
    {
        if output_count == 0 {
            return Err(Error::EmptyLayer);
        }
        self.outputs = try_zeros(output_count)?;
        self.params = match predecessor {
            Some(prev) => {
                let input_count = prev.output_count();
                trace!("allocating {}x{} weights", input_count, output_count);
                Some(Params {
                    biases: try_zeros(output_count)?,
                    weights: Mat::random(source, input_count, output_count)?,
                })
            }
            None => None,
        };
        Ok(())
    }

    /// Returns true once `init` has sized the layer.
    pub fn is_initialized(&self) -> bool {
        !self.outputs.is_empty()
    }

    /// Returns the number of neurons in this layer.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Returns the number of neurons in the preceding layer, or 0 for the
    /// input layer.
    pub fn input_count(&self) -> usize {
        self.params.as_ref().map_or(0, |p| p.weights.rows())
    }

    /// Returns the activations computed by the last forward pass.
    pub fn outputs(&self) -> &[f64] {
        &self.outputs
    }

    pub fn weights(&self) -> Option<&Mat> {
        self.params.as_ref().map(|p| &p.weights)
    }

    pub fn biases(&self) -> Option<&[f64]> {
        self.params.as_ref().map(|p| p.biases.as_slice())
    }

    /// Returns the weight from predecessor neuron `i` to neuron `j`.
    pub fn weight(&self, i: usize, j: usize) -> Option<f64> {
        let weights = self.weights()?;
        if i < weights.rows() && j < weights.cols() {
            Some(weights[(i, j)])
        } else {
            None
        }
    }

    /// Returns the index of the preceding layer.
    pub fn prev(&self) -> Option<usize> {
        self.prev
    }

    /// Returns the index of the following layer.
    pub fn next(&self) -> Option<usize> {
        self.next
    }

    pub(crate) fn set_prev(&mut self, index: usize) {
        self.prev = Some(index);
    }

    pub(crate) fn set_next(&mut self, index: usize) {
        self.next = Some(index);
    }

    /// Overwrites the activations with raw feature values.
    pub(crate) fn load_inputs(&mut self, inputs: &[f64]) -> Result<()> {
        if inputs.len() != self.outputs.len() {
            return Err(Error::InputSize {
                expected: self.outputs.len(),
                actual: inputs.len(),
            });
        }
        self.outputs.copy_from_slice(inputs);
        Ok(())
    }

    /// Feeds the activations of `prev` forward through this layer.
    pub fn compute_outputs(&mut self, prev: &Layer) -> Result<()> {
        let params = self.params.as_ref().ok_or(Error::MissingNeighbor)?;
        let inputs = prev.outputs();
        if inputs.len() != params.weights.rows() {
            return Err(Error::InputSize {
                expected: params.weights.rows(),
                actual: inputs.len(),
            });
        }
        for (j, (y, b)) in
            self.outputs.iter_mut().zip(params.biases.iter()).enumerate()
        {
            let mut sum = 0.0;
            for (i, x) in inputs.iter().enumerate() {
                sum += params.weights[(i, j)] * x;
            }
            *y = sigmoid(b + sum);
        }
        Ok(())
    }

    /// Computes this layer's error signal from `targets`, for use on the
    /// output layer.
    pub fn compute_output_deltas(
        &self,
        targets: &[f64],
        deltas: &mut [f64],
    ) -> Result<()> {
        if self.params.is_none() {
            return Err(Error::MissingNeighbor);
        }
        if targets.len() != self.outputs.len() {
            return Err(Error::TargetSize {
                expected: self.outputs.len(),
                actual: targets.len(),
            });
        }
        if deltas.len() != self.outputs.len() {
            return Err(Error::DeltaShape);
        }
        for (y, t, d) in multizip((self.outputs.iter(), targets, deltas)) {
            *d = sigmoid_prime(*y) * (t - y);
        }
        Ok(())
    }

    /// Propagates the error signal of `next` back into `deltas`.
    ///
    /// `next_deltas` must already hold the freshly computed deltas of `next`.
    pub fn compute_deltas(
        &self,
        next: &Layer,
        next_deltas: &[f64],
        deltas: &mut [f64],
    ) -> Result<()> {
        let params = next.params.as_ref().ok_or(Error::MissingNeighbor)?;
        if params.weights.rows() != self.outputs.len() {
            return Err(Error::InputSize {
                expected: params.weights.rows(),
                actual: self.outputs.len(),
            });
        }
        if next_deltas.len() != params.weights.cols()
            || deltas.len() != self.outputs.len()
        {
            return Err(Error::DeltaShape);
        }
        for (i, (y, d)) in self.outputs.iter().zip(deltas).enumerate() {
            let mut sum = 0.0;
            for (w, nd) in params.weights.row(i).iter().zip(next_deltas) {
                sum += w * nd;
            }
            *d = sigmoid_prime(*y) * sum;
        }
        Ok(())
    }

    /// Moves weights and biases along `deltas`, scaled by `learning_rate`.
    ///
    /// `prev` must hold the same activations that produced `deltas`.
    pub fn update(
        &mut self,
        prev: &Layer,
        deltas: &[f64],
        learning_rate: f64,
    ) -> Result<()> {
        check_learning_rate(learning_rate)?;
        let params = self.params.as_mut().ok_or(Error::MissingNeighbor)?;
        let inputs = prev.outputs();
        if inputs.len() != params.weights.rows() {
            return Err(Error::InputSize {
                expected: params.weights.rows(),
                actual: inputs.len(),
            });
        }
        if deltas.len() != params.biases.len() {
            return Err(Error::DeltaShape);
        }
        for (j, (b, d)) in params.biases.iter_mut().zip(deltas).enumerate() {
            for (i, x) in inputs.iter().enumerate() {
                params.weights[(i, j)] += learning_rate * x * d;
            }
            *b += learning_rate * d;
        }
        Ok(())
    }
}
