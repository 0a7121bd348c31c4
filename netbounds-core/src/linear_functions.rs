/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

use ndarray::{Array1, Array2};

/// Splits a matrix into its elementwise positive part, `max(a, 0)`.
pub fn positive_part(m: &Array2<f32>) -> Array2<f32> {
    m.mapv(|v| v.max(0.))
}

/// Splits a matrix into its elementwise negative part, `min(a, 0)`.
pub fn negative_part(m: &Array2<f32>) -> Array2<f32> {
    m.mapv(|v| v.min(0.))
}

/// An affine map `x ↦ M·x + q` over the original network input `x`.
///
/// `M` has shape `(m, k)` and `q` has shape `(m,)`; `k` is the size of the
/// ambient input vector and `m` is the size of the layer value this
/// `LinearFunctions` bounds.
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct LinearFunctions {
    matrix: Array2<f32>,
    offset: Array1<f32>,
}

impl LinearFunctions {
    /// Builds a new `LinearFunctions`.
    ///
    /// # Panics
    ///
    /// If `matrix.nrows() != offset.len()`.
    pub fn new(matrix: Array2<f32>, offset: Array1<f32>) -> Self {
        assert_eq!(
            matrix.nrows(),
            offset.len(),
            "LinearFunctions: matrix rows ({}) must equal offset length ({})",
            matrix.nrows(),
            offset.len(),
        );

        Self { matrix, offset }
    }

    /// Builds the identity map of size `k`: `M = I_k`, `q = 0`.
    pub fn identity(k: usize) -> Self {
        Self::new(Array2::eye(k), Array1::zeros(k))
    }

    pub fn matrix(&self) -> &Array2<f32> {
        &self.matrix
    }

    pub fn offset(&self) -> &Array1<f32> {
        &self.offset
    }

    /// Output size `m`.
    pub fn size(&self) -> usize {
        self.offset.len()
    }

    /// Input size `k`.
    pub fn input_size(&self) -> usize {
        self.matrix.ncols()
    }

    /// Evaluates `M·x + q` at a concrete input.
    pub fn eval(&self, x: &Array1<f32>) -> Array1<f32> {
        self.matrix.dot(x) + &self.offset
    }
}
