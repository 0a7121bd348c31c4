/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

use ndarray::Array1;

use crate::{
    hyper_rect::HyperRectBounds,
    linear_functions::{negative_part, positive_part, LinearFunctions},
};

/// A pair `(L, U)` of [`LinearFunctions`] of the ambient input such that
/// `L(x) ≤ v(x) ≤ U(x)` for every `x` in the ambient box.
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolicLinearBounds {
    lower: LinearFunctions,
    upper: LinearFunctions,
}

impl SymbolicLinearBounds {
    /// Builds a new `SymbolicLinearBounds`.
    ///
    /// # Panics
    ///
    /// If `lower` and `upper` disagree on output size or input size.
    pub fn new(lower: LinearFunctions, upper: LinearFunctions) -> Self {
        assert_eq!(
            lower.size(),
            upper.size(),
            "SymbolicLinearBounds: lower and upper must bound the same number of neurons"
        );
        assert_eq!(
            lower.input_size(),
            upper.input_size(),
            "SymbolicLinearBounds: lower and upper must be affine in the same ambient input"
        );

        Self { lower, upper }
    }

    /// Builds the identity bound of size `k`: `L = U = I_k`, zero offsets.
    pub fn identity(k: usize) -> Self {
        Self::new(LinearFunctions::identity(k), LinearFunctions::identity(k))
    }

    pub fn get_lower(&self) -> &LinearFunctions {
        &self.lower
    }

    pub fn get_upper(&self) -> &LinearFunctions {
        &self.upper
    }

    pub fn size(&self) -> usize {
        self.lower.size()
    }

    pub fn input_size(&self) -> usize {
        self.lower.input_size()
    }

    /// The minimum value `f` can take over `box_`, by substituting the
    /// sign-appropriate corner into each coefficient.
    fn concretize_min(f: &LinearFunctions, box_: &HyperRectBounds) -> Array1<f32> {
        positive_part(f.matrix()).dot(box_.get_lower())
            + negative_part(f.matrix()).dot(box_.get_upper())
            + f.offset()
    }

    /// The maximum value `f` can take over `box_`.
    fn concretize_max(f: &LinearFunctions, box_: &HyperRectBounds) -> Array1<f32> {
        positive_part(f.matrix()).dot(box_.get_upper())
            + negative_part(f.matrix()).dot(box_.get_lower())
            + f.offset()
    }

    /// Concretizes this symbolic bound to a numeric box over `box_`:
    /// the componentwise minimum of `L` paired with the componentwise
    /// maximum of `U`.
    pub fn to_hyper_rectangle_bounds(&self, box_: &HyperRectBounds) -> HyperRectBounds {
        let lower = Self::concretize_min(&self.lower, box_);
        let upper = Self::concretize_max(&self.upper, box_);

        HyperRectBounds::new(lower, upper)
    }

    /// The four corners consumed by the ReLU transformer: `L`'s minimum and
    /// maximum over `box_`, followed by `U`'s minimum and maximum.
    pub fn get_all_bounds(
        &self,
        box_: &HyperRectBounds,
    ) -> (Array1<f32>, Array1<f32>, Array1<f32>, Array1<f32>) {
        let lower_l = Self::concretize_min(&self.lower, box_);
        let lower_u = Self::concretize_max(&self.lower, box_);
        let upper_l = Self::concretize_min(&self.upper, box_);
        let upper_u = Self::concretize_max(&self.upper, box_);

        (lower_l, lower_u, upper_l, upper_u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn identity_concretizes_to_the_box_itself() {
        let bounds = SymbolicLinearBounds::identity(2);
        let box_ = HyperRectBounds::new(Array1::from(vec![-1.0, -1.0]), Array1::from(vec![1.0, 1.0]));

        let concrete = bounds.to_hyper_rectangle_bounds(&box_);
        assert_eq!(concrete.get_lower(), box_.get_lower());
        assert_eq!(concrete.get_upper(), box_.get_upper());
    }

    #[test]
    fn mixed_sign_row_uses_the_right_corner_per_sign() {
        // f(x) = 2*x0 - 3*x1, over box x0 in [0,1], x1 in [0,1]
        let matrix = Array2::from_shape_vec((1, 2), vec![2.0, -3.0]).unwrap();
        let offset = Array1::zeros(1);
        let f = LinearFunctions::new(matrix, offset);
        let bounds = SymbolicLinearBounds::new(f.clone(), f);
        let box_ = HyperRectBounds::new(Array1::from(vec![0.0, 0.0]), Array1::from(vec![1.0, 1.0]));

        let concrete = bounds.to_hyper_rectangle_bounds(&box_);
        // min: 2*0 - 3*1 = -3 ; max: 2*1 - 3*0 = 2
        assert_eq!(concrete.get_lower()[0], -3.0);
        assert_eq!(concrete.get_upper()[0], 2.0);
    }
}
