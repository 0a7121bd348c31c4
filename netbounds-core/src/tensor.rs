/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

use ndarray::{Array, ArrayD, Axis, IxDyn};

/// Dense, row-major, n-dimensional real tensor.
///
/// Rank-erased rather than compile-time-ranked: `LayerIR`'s shapes are
/// discovered at network-load time, not known at the call site, so `ArrayD`
/// is the correct representation.
pub type Tensor = ArrayD<f32>;

/// Builds a zero-filled tensor of the given shape.
pub fn zeros(shape: &[usize]) -> Tensor {
    Array::zeros(IxDyn(shape))
}

/// Zero-pads `tensor` along `axis` with `before` zeros on the low side and
/// `after` zeros on the high side.
pub fn pad_axis(tensor: &Tensor, axis: usize, before: usize, after: usize) -> Tensor {
    if before == 0 && after == 0 {
        return tensor.clone();
    }

    let mut new_shape = tensor.shape().to_vec();
    new_shape[axis] += before + after;

    let mut out = Tensor::zeros(IxDyn(&new_shape));
    let mut view = out.slice_axis_mut(
        Axis(axis),
        ndarray::Slice::from(before..before + tensor.len_of(Axis(axis))),
    );
    view.assign(tensor);

    out
}
