/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

use ndarray::{Array1, Array2};
use netbounds_core::{HyperRectBounds, LinearFunctions, SymbolicLinearBounds};

/// Lower-envelope coefficient `(k, b)` for a single neuron with pre-activation
/// concretization `(lower, upper)` of its *lower* symbolic bound.
///
/// The line through the origin with slope `upper / (upper - lower)` is used
/// rather than the area-optimal choice of 0 or 1 — a deliberate, known
/// non-optimality of the triangle relaxation, not a bug.
fn lower_envelope_coefficients(lower: f32, upper: f32) -> (f32, f32) {
    if upper <= 0.0 {
        (0.0, 0.0)
    } else if lower >= 0.0 {
        (1.0, 0.0)
    } else {
        (upper / (upper - lower), 0.0)
    }
}

/// Upper-envelope coefficient `(k, b)`: the chord between `(lower, 0)` and
/// `(upper, upper)`.
fn upper_envelope_coefficients(lower: f32, upper: f32) -> (f32, f32) {
    if upper <= 0.0 {
        (0.0, 0.0)
    } else if lower >= 0.0 {
        (1.0, 0.0)
    } else {
        let k = upper / (upper - lower);
        (k, -(upper * lower) / (upper - lower))
    }
}

fn scale_rows(m: &Array2<f32>, k: &Array1<f32>) -> Array2<f32> {
    let mut out = m.clone();
    for (mut row, &ki) in out.rows_mut().into_iter().zip(k.iter()) {
        row.mapv_inplace(|v| v * ki);
    }
    out
}

/// Transforms pre-activation symbolic bounds through a ReLU: scales each row
/// of `L`/`U` by its own envelope slope and adds the envelope intercept.
pub fn relu_transform(pre: &SymbolicLinearBounds, box_: &HyperRectBounds) -> SymbolicLinearBounds {
    let (lower_l, lower_u, upper_l, upper_u) = pre.get_all_bounds(box_);

    let n = pre.size();
    let mut k_lower = Array1::zeros(n);
    let mut b_lower = Array1::zeros(n);
    let mut k_upper = Array1::zeros(n);
    let mut b_upper = Array1::zeros(n);

    for i in 0..n {
        let (kl, bl) = lower_envelope_coefficients(lower_l[i], lower_u[i]);
        let (ku, bu) = upper_envelope_coefficients(upper_l[i], upper_u[i]);
        k_lower[i] = kl;
        b_lower[i] = bl;
        k_upper[i] = ku;
        b_upper[i] = bu;
    }

    let m_lower = scale_rows(pre.get_lower().matrix(), &k_lower);
    let q_lower = &(pre.get_lower().offset() * &k_lower) + &b_lower;

    let m_upper = scale_rows(pre.get_upper().matrix(), &k_upper);
    let q_upper = &(pre.get_upper().offset() * &k_upper) + &b_upper;

    SymbolicLinearBounds::new(
        LinearFunctions::new(m_lower, q_lower),
        LinearFunctions::new(m_upper, q_upper),
    )
}

/// Post-activation concrete bounds, computed directly from the
/// pre-activation concrete bounds rather than by concretizing the scaled
/// post-symbolic bound — the known pre-activation numeric bounds are always
/// at least as tight.
pub fn post_concrete(pre: &HyperRectBounds) -> HyperRectBounds {
    HyperRectBounds::new(pre.get_lower().mapv(|v| v.max(0.0)), pre.get_upper().mapv(|v| v.max(0.0)))
}
