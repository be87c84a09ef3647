use crate::error::{Error, Result};
use crate::utils::try_zeros;
use crate::weights::WeightSource;

use std::ops::{Index, IndexMut};

/// A dense matrix indexed as `(row, col)`.
///
/// Layers store one row per input neuron and one column per output neuron.
#[derive(Clone, Debug, PartialEq)]
pub struct Mat {
    rows: usize,
    cols: usize,
    data: Vec<f64>, // row-major array
}

impl Mat {
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        let len = rows.checked_mul(cols).ok_or(Error::Allocation)?;
        Ok(Mat { rows, cols, data: try_zeros(len)? })
    }

    /// Fills a new matrix row by row with values drawn from `source`.
    pub fn random<S>(source: &mut S, rows: usize, cols: usize) -> Result<Self>
    where
        S: WeightSource + ?Sized,
    {
        let mut mat = Mat::zeros(rows, cols)?;
        for w in mat.data.iter_mut() {
            *w = source.next_weight();
        }
        Ok(mat)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the weights leaving input neuron `row`.
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }
}

impl Index<(usize, usize)> for Mat {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(col < self.cols);
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Mat {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        assert!(col < self.cols);
        &mut self.data[row * self.cols + col]
    }
}
