//! A [Feedforward neural network]
//! (https://en.wikipedia.org/wiki/Feedforward_neural_network) trained one
//! example at a time with backpropagation.
//!
//! # Example
//!
//! Let's nudge a single sigmoid neuron towards an output of 1:
//!
//! ```
//! # use ann::network::Network;
//! // Start with every weight at zero, so the neuron outputs 0.5.
//! let mut network = Network::with_weights(&[1, 1], &mut || 0.0).unwrap();
//! let before = network.predict(&[1.0]).unwrap()[0];
//! assert_eq!(before, 0.5);
//!
//! network.train(&[1.0], &[1.0], 0.5).unwrap();
//! let after = network.predict(&[1.0]).unwrap()[0];
//! assert!(after > before);
//! ```

use crate::error::{check_learning_rate, Error, Result};
use crate::layer::Layer;
use crate::utils::{try_zeros, ZeroOut};
use crate::weights::{RandomWeights, WeightSource};

use log::debug;

/// A feedforward neural network.
///
/// The layers form a chain from the input layer (index 0) to the output
/// layer. Each layer refers to its neighbours by index into this network.
#[derive(Debug)]
pub struct Network {
    layers: Vec<Layer>,
    output: usize,
}

/// Per-layer error signals for a single training example.
///
/// The buffer is only meaningful between `Network::backpropagate` and
/// `Network::apply_deltas` for the same example.
#[derive(Clone, Debug, PartialEq)]
pub struct Deltas {
    layers: Vec<Vec<f64>>,
}

impl Deltas {
    /// Returns the deltas of the layer at `index`. The input layer has none.
    pub fn layer(&self, index: usize) -> Option<&[f64]> {
        self.layers.get(index).map(|d| d.as_slice())
    }
}

impl ZeroOut for Deltas {
    fn zero_out(&mut self) {
        self.layers.zero_out();
    }
}

impl Network {
    /// Creates a new, untrained network with weights drawn uniformly from
    /// `[-1, 1)`.
    ///
    /// `layer_sizes` holds the number of neurons in each layer, input layer
    /// first.
    pub fn new(layer_sizes: &[usize]) -> Result<Self> {
        Network::with_weights(
            layer_sizes,
            &mut RandomWeights::new(rand::thread_rng()),
        )
    }

    /// Creates a new, untrained network drawing every weight from `source`.
    ///
    /// An empty `layer_sizes` yields a network holding a single uninitialized
    /// layer, which refuses to predict or train.
    pub fn with_weights<S>(
        layer_sizes: &[usize],
        source: &mut S,
    ) -> Result<Self>
    where
        S: WeightSource + ?Sized,
    {
        let mut layers = Vec::new();
        layers
            .try_reserve_exact(layer_sizes.len().max(1))
            .map_err(|_| Error::Allocation)?;
        layers.push(Layer::new());

        let (first, rest) = match layer_sizes.split_first() {
            Some(split) => split,
            None => {
                debug!("created placeholder network without layers");
                return Ok(Network { layers, output: 0 });
            }
        };
        layers[0].init(*first, None, source)?;
        for &size in rest {
            let prev = layers.len() - 1;
            let mut layer = Layer::new();
            layer.init(size, Some(&layers[prev]), source)?;
            layer.set_prev(prev);
            layers[prev].set_next(prev + 1);
            layers.push(layer);
        }
        debug!("created network with layer sizes {:?}", layer_sizes);
        let output = layers.len() - 1;
        Ok(Network { layers, output })
    }

    /// Returns the input layer.
    pub fn input_layer(&self) -> &Layer {
        &self.layers[0]
    }

    /// Returns the output layer.
    pub fn output_layer(&self) -> &Layer {
        &self.layers[self.output]
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    /// Iterates the layers from input to output by following `next` links.
    pub fn layers(&self) -> Chain {
        Chain { layers: &self.layers, cur: Some(0) }
    }

    /// Returns the number of links between the input and output layer.
    pub fn depth(&self) -> usize {
        self.layers().count() - 1
    }

    /// Returns the size of the input layer to the network.
    pub fn input_len(&self) -> usize {
        self.input_layer().output_count()
    }

    /// Returns the size of the output layer from the network.
    pub fn output_len(&self) -> usize {
        self.output_layer().output_count()
    }

    /// Feeds the provided `inputs` through the network, returning the
    /// activations of the output layer.
    ///
    /// The input layer holds `inputs` verbatim; every later layer applies
    /// the sigmoid. Weights and biases are left untouched.
    pub fn predict(&mut self, inputs: &[f64]) -> Result<&[f64]> {
        self.ensure_initialized()?;
        self.layers[0].load_inputs(inputs)?;
        let mut cur = self.layers[0].next();
        while let Some(index) = cur {
            let (prev, layer) = link_mut(&mut self.layers, index)?;
            layer.compute_outputs(prev)?;
            cur = layer.next();
        }
        Ok(self.output_layer().outputs())
    }

    /// Trains the network on a single example with one backpropagation
    /// update.
    pub fn train(
        &mut self,
        inputs: &[f64],
        targets: &[f64],
        learning_rate: f64,
    ) -> Result<()> {
        check_learning_rate(learning_rate)?;
        let mut deltas = self.new_deltas()?;
        self.backpropagate(inputs, targets, &mut deltas)?;
        self.apply_deltas(learning_rate, &deltas)
    }

    /// Returns a zeroed delta buffer shaped for this network.
    pub fn new_deltas(&self) -> Result<Deltas> {
        let mut layers = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let len = if layer.prev().is_some() {
                layer.output_count()
            } else {
                0
            };
            layers.push(try_zeros(len)?);
        }
        Ok(Deltas { layers })
    }

    /// Runs the forward pass for `inputs` and propagates the error against
    /// `targets` back into `deltas`, from the output layer towards the input.
    ///
    /// Returns the mean squared error of the prediction.
    pub fn backpropagate(
        &mut self,
        inputs: &[f64],
        targets: &[f64],
        deltas: &mut Deltas,
    ) -> Result<f64> {
        self.ensure_initialized()?;
        if targets.len() != self.output_len() {
            return Err(Error::TargetSize {
                expected: self.output_len(),
                actual: targets.len(),
            });
        }
        if self.output_layer().prev().is_none() {
            return Err(Error::MissingNeighbor);
        }
        self.check_deltas(deltas)?;

        self.predict(inputs)?;

        let output = &self.layers[self.output];
        let output_deltas = &mut deltas.layers[self.output];
        output.compute_output_deltas(targets, output_deltas)?;
        let mut cur = output.prev();
        while let Some(index) = cur {
            if index == 0 {
                break;
            }
            let layer = &self.layers[index];
            let next = layer.next().ok_or(Error::MissingNeighbor)?;
            let (before, after) = deltas.layers.split_at_mut(next);
            let next_layer = &self.layers[next];
            layer.compute_deltas(next_layer, &after[0], &mut before[index])?;
            cur = layer.prev();
        }
        Ok(mean_square_error(self.output_layer().outputs(), targets))
    }

    /// Updates the weights and biases of every layer from `deltas`, scaling
    /// by the gradient descent `learning_rate`.
    ///
    /// `deltas` must come from the last call to `backpropagate`.
    pub fn apply_deltas(
        &mut self,
        learning_rate: f64,
        deltas: &Deltas,
    ) -> Result<()> {
        check_learning_rate(learning_rate)?;
        self.check_deltas(deltas)?;
        let mut cur = self.layers[0].next();
        while let Some(index) = cur {
            let (prev, layer) = link_mut(&mut self.layers, index)?;
            layer.update(prev, &deltas.layers[index], learning_rate)?;
            cur = layer.next();
        }
        Ok(())
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.layers[0].is_initialized() {
            Ok(())
        } else {
            Err(Error::InvalidTopology)
        }
    }

    fn check_deltas(&self, deltas: &Deltas) -> Result<()> {
        if deltas.layers.len() != self.layers.len() {
            return Err(Error::DeltaShape);
        }
        for (layer, d) in self.layers.iter().zip(&deltas.layers) {
            let expected = if layer.prev().is_some() {
                layer.output_count()
            } else {
                0
            };
            if d.len() != expected {
                return Err(Error::DeltaShape);
            }
        }
        Ok(())
    }
}

/// An iterator over a network's layers in chain order.
#[derive(Debug)]
pub struct Chain<'a> {
    layers: &'a [Layer],
    cur: Option<usize>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Layer;

    fn next(&mut self) -> Option<&'a Layer> {
        let layer = &self.layers[self.cur?];
        self.cur = layer.next();
        Some(layer)
    }
}

/// Splits out the layer at `index` and its predecessor.
fn link_mut(
    layers: &mut [Layer],
    index: usize,
) -> Result<(&Layer, &mut Layer)> {
    let prev = layers[index].prev().ok_or(Error::MissingNeighbor)?;
    assert!(prev < index);
    let (before, after) = layers.split_at_mut(index);
    Ok((&before[prev], &mut after[0]))
}

/// Computes the mean squared error between `actual` and `expected`.
fn mean_square_error(actual: &[f64], expected: &[f64]) -> f64 {
    let mut error = 0.0;
    for (&a, e) in actual.iter().zip(expected) {
        error += (a - e) * (a - e);
    }
    error / (actual.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activator::sigmoid;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded(sizes: &[usize]) -> Network {
        let mut source = RandomWeights::new(StdRng::seed_from_u64(42));
        Network::with_weights(sizes, &mut source).unwrap()
    }

    #[test]
    fn topology() {
        let network = seeded(&[3, 5, 4, 2]);
        assert_eq!(network.input_len(), 3);
        assert_eq!(network.output_len(), 2);
        assert_eq!(network.depth(), 3);
        let sizes: Vec<usize> =
            network.layers().map(|l| l.output_count()).collect();
        assert_eq!(sizes, vec![3, 5, 4, 2]);
    }

    #[test]
    fn links_are_consistent() {
        let network = seeded(&[2, 3, 3, 1]);
        assert!(network.input_layer().prev().is_none());
        assert!(network.output_layer().next().is_none());
        for index in 0..3 {
            let layer = network.layer(index).unwrap();
            let next = layer.next().unwrap();
            assert_eq!(network.layer(next).unwrap().prev(), Some(index));
            assert_eq!(
                network.layer(next).unwrap().input_count(),
                layer.output_count()
            );
        }
    }

    #[test]
    fn single_layer() {
        let mut network = seeded(&[2]);
        assert_eq!(network.depth(), 0);
        assert_eq!(network.predict(&[0.3, -4.0]).unwrap(), &[0.3, -4.0]);
        assert_eq!(
            network.train(&[0.3, -4.0], &[0.0, 0.0], 0.1),
            Err(Error::MissingNeighbor)
        );
    }

    #[test]
    fn empty_topology() {
        let mut network = seeded(&[]);
        assert_eq!(network.depth(), 0);
        assert!(!network.input_layer().is_initialized());
        assert_eq!(network.predict(&[]), Err(Error::InvalidTopology));
        assert_eq!(network.train(&[], &[], 0.1), Err(Error::InvalidTopology));
    }

    #[test]
    fn empty_layer() {
        let mut source = || 0.0;
        assert_eq!(
            Network::with_weights(&[2, 0, 1], &mut source).unwrap_err(),
            Error::EmptyLayer
        );
    }

    #[test]
    fn create_and_drop() {
        for sizes in &[vec![], vec![4], vec![4, 8, 8, 8, 2]] {
            let network = Network::new(sizes).unwrap();
            drop(network);
        }
    }

    #[test]
    fn predict_is_repeatable() {
        let mut network = seeded(&[4, 6, 3]);
        let input = [0.1, -0.7, 2.0, 0.0];
        let first = network.predict(&input).unwrap().to_vec();
        let second = network.predict(&input).unwrap().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn predict_ranges() {
        let mut network = seeded(&[3, 4, 2]);
        let input = [5.0, -3.0, 0.25];
        network.predict(&input).unwrap();
        let mut layers = network.layers();
        assert_eq!(layers.next().unwrap().outputs(), &input);
        for layer in layers {
            for &y in layer.outputs() {
                assert!(y > 0.0 && y < 1.0);
            }
        }
    }

    #[test]
    fn predict_checks_input_len() {
        let mut network = seeded(&[3, 1]);
        assert_eq!(
            network.predict(&[1.0]),
            Err(Error::InputSize { expected: 3, actual: 1 })
        );
    }

    #[test]
    fn single_step_exact() {
        let mut network = Network::with_weights(&[1, 1], &mut || 0.0).unwrap();
        assert_eq!(network.predict(&[1.0]).unwrap(), &[0.5]);
        network.train(&[1.0], &[1.0], 0.5).unwrap();
        // delta = 0.25 * (1 - 0.5), step = 0.5 * 1 * delta
        let output = network.output_layer();
        assert_eq!(output.weight(0, 0), Some(0.0625));
        assert_eq!(output.biases(), Some(&[0.0625][..]));
        assert_eq!(network.predict(&[1.0]).unwrap(), &[sigmoid(0.125)]);
        assert!(network.predict(&[1.0]).unwrap()[0] > 0.5);
    }

    #[test]
    fn converges_monotonically() {
        let mut network = seeded(&[1, 1]);
        let target = 0.75;
        let mut last = std::f64::INFINITY;
        for _ in 0..200 {
            network.train(&[1.0], &[target], 0.5).unwrap();
            let y = network.predict(&[1.0]).unwrap()[0];
            let error = (y - target) * (y - target);
            assert!(error < last);
            last = error;
        }
        assert!(last < 1e-4);
    }

    #[test]
    fn mismatched_targets_rejected() {
        let mut network = seeded(&[2, 3, 2]);
        let before = network.output_layer().weights().cloned();
        assert_eq!(
            network.train(&[0.0, 1.0], &[1.0], 0.1),
            Err(Error::TargetSize { expected: 2, actual: 1 })
        );
        assert_eq!(
            network.train(&[0.0, 1.0], &[1.0, 0.0, 0.0], 0.1),
            Err(Error::TargetSize { expected: 2, actual: 3 })
        );
        assert_eq!(network.output_layer().weights().cloned(), before);
    }

    #[test]
    fn bad_learning_rate_rejected() {
        let mut network = seeded(&[1, 1]);
        assert_eq!(
            network.train(&[1.0], &[1.0], -0.1),
            Err(Error::LearningRate(-0.1))
        );
    }

    #[test]
    fn backpropagate_through_hidden_layer() {
        let mut ones = || 1.0;
        let mut network = Network::with_weights(&[1, 2, 1], &mut ones).unwrap();
        let mut deltas = network.new_deltas().unwrap();
        assert_eq!(deltas.layer(0), Some(&[][..]));
        assert_eq!(deltas.layer(3), None);

        let mse = network.backpropagate(&[0.0], &[0.0], &mut deltas).unwrap();
        let h = sigmoid(1.0 * 0.0);
        let y = sigmoid(1.0 * h + 1.0 * h);
        assert_eq!(network.output_layer().outputs(), &[y]);
        assert_eq!(mse, y * y);

        let out_delta = y * (1.0 - y) * (0.0 - y);
        assert_eq!(deltas.layer(2), Some(&[out_delta][..]));
        let hidden = h * (1.0 - h) * (1.0 * out_delta);
        assert_eq!(deltas.layer(1), Some(&[hidden, hidden][..]));

        network.apply_deltas(0.5, &deltas).unwrap();
        let output = network.output_layer();
        assert_eq!(output.weight(1, 0), Some(1.0 + 0.5 * h * out_delta));
        let first = network.layer(1).unwrap();
        assert_eq!(first.weight(0, 0), Some(1.0));
        assert_eq!(first.biases(), Some(&[0.5 * hidden, 0.5 * hidden][..]));
    }

    #[test]
    fn foreign_deltas_rejected() {
        let mut network = seeded(&[2, 2, 1]);
        let mut deltas = seeded(&[2, 3, 1]).new_deltas().unwrap();
        assert_eq!(
            network.backpropagate(&[0.0, 0.0], &[1.0], &mut deltas),
            Err(Error::DeltaShape)
        );
    }

    #[test]
    fn learns_xor() {
        let examples = [
            ([0.0, 0.0], [0.0]),
            ([0.0, 1.0], [1.0]),
            ([1.0, 0.0], [1.0]),
            ([1.0, 1.0], [0.0]),
        ];
        let mut network = seeded(&[2, 4, 1]);
        let mut deltas = network.new_deltas().unwrap();
        let mut start = 0.0;
        let mut end = 0.0;
        for epoch in 0..2000 {
            let mut total = 0.0;
            for (input, target) in &examples {
                let error = network.backpropagate(input, target, &mut deltas);
                total += error.unwrap();
                network.apply_deltas(0.5, &deltas).unwrap();
            }
            if epoch == 0 {
                start = total;
            }
            end = total;
        }
        assert!(end < start);
    }
}
