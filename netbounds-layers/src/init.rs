/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

use ndarray::{ArrayD, IxDyn};
use rand::Rng;
use rand_distr::Uniform;

/// Samples a tensor of the given `shape` uniformly in `[low, high)`.
pub fn uniform(shape: &[usize], low: f32, high: f32) -> ArrayD<f32> {
    let mut rng = rand::thread_rng();
    let dist = Uniform::new(low, high);
    ArrayD::from_shape_fn(IxDyn(shape), |_| rng.sample(dist))
}
