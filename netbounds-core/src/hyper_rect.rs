/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

use ndarray::Array1;

/// Concrete componentwise lower/upper bounds: an axis-aligned hyper-rectangle.
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct HyperRectBounds {
    lower: Array1<f32>,
    upper: Array1<f32>,
}

impl HyperRectBounds {
    /// Builds a new `HyperRectBounds`.
    ///
    /// # Panics
    ///
    /// If `lower` and `upper` differ in length, or if any `lower[i] > upper[i]`.
    pub fn new(lower: Array1<f32>, upper: Array1<f32>) -> Self {
        assert_eq!(
            lower.len(),
            upper.len(),
            "HyperRectBounds: lower and upper must have the same size"
        );
        assert!(
            lower.iter().zip(upper.iter()).all(|(&l, &u)| l <= u),
            "HyperRectBounds: every lower bound must be <= the matching upper bound"
        );

        Self { lower, upper }
    }

    pub fn get_lower(&self) -> &Array1<f32> {
        &self.lower
    }

    pub fn get_upper(&self) -> &Array1<f32> {
        &self.upper
    }

    pub fn get_size(&self) -> usize {
        self.lower.len()
    }

    /// Whether `sub` is contained within `self` componentwise.
    pub fn contains(&self, sub: &HyperRectBounds) -> bool {
        self.lower.len() == sub.lower.len()
            && self
                .lower
                .iter()
                .zip(sub.lower.iter())
                .all(|(&l, &sl)| l <= sl)
            && self
                .upper
                .iter()
                .zip(sub.upper.iter())
                .all(|(&u, &su)| su <= u)
    }
}
