//! The logistic activation used by every non-input neuron.

/// Evaluates the [sigmoid](https://en.wikipedia.org/wiki/Sigmoid_function)
/// `1 / (1 + e^-x)`.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Evaluates the sigmoid derivative at `x = sigmoid^{-1}(y)`.
///
/// Note that this function takes in the *output* of the sigmoid rather than
/// its input, so the pre-activation sums never need to be stored. It is only
/// exact when `y` really is a sigmoid output.
pub fn sigmoid_prime(y: f64) -> f64 {
    y * (1.0 - y)
}
