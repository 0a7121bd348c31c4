/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

use ndarray::{Array1, Array2};
use netbounds_core::{negative_part, positive_part, LinearFunctions, SymbolicLinearBounds};

/// The tightest affine-in-symbolic-bounds transformer: splits `weight` into
/// its positive and negative parts and pairs each with the matching
/// incoming envelope.
pub fn affine_transform(
    prev: &SymbolicLinearBounds,
    weight: &Array2<f32>,
    bias: &Array1<f32>,
) -> SymbolicLinearBounds {
    let w_pos = positive_part(weight);
    let w_neg = negative_part(weight);

    let lower = prev.get_lower();
    let upper = prev.get_upper();

    let m_lower = w_pos.dot(lower.matrix()) + w_neg.dot(upper.matrix());
    let q_lower = w_pos.dot(lower.offset()) + w_neg.dot(upper.offset()) + bias;

    let m_upper = w_pos.dot(upper.matrix()) + w_neg.dot(lower.matrix());
    let q_upper = w_pos.dot(upper.offset()) + w_neg.dot(lower.offset()) + bias;

    SymbolicLinearBounds::new(
        LinearFunctions::new(m_lower, q_lower),
        LinearFunctions::new(m_upper, q_upper),
    )
}
