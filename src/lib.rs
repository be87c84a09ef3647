#[macro_use]
extern crate serde_derive;

pub mod activator;
pub mod config;
pub mod error;
pub mod layer;
pub mod matrix;
pub mod network;
pub mod trainer;
pub mod weights;

mod utils;

pub use crate::error::{Error, Result};
pub use crate::network::Network;
