/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

use ndarray::Array1;
use netbounds_core::{Error, HyperRectBounds, Result, SymbolicLinearBounds};
use netbounds_layers::{LayerIR, Network};

use crate::affine::affine_transform;
use crate::config::BoundsConfig;
use crate::relu::{post_concrete, relu_transform};

/// The three id-keyed mappings `compute_bounds` produces, in the layers'
/// traversal order.
#[derive(Clone, Debug, Default)]
pub struct BoundsReport {
    symbolic: Vec<(String, (SymbolicLinearBounds, SymbolicLinearBounds))>,
    numeric_pre: Vec<(String, HyperRectBounds)>,
    numeric_post: Vec<(String, HyperRectBounds)>,
}

impl BoundsReport {
    fn new() -> Self {
        Self::default()
    }

    fn record(
        &mut self,
        id: &str,
        pre_symbolic: SymbolicLinearBounds,
        post_symbolic: SymbolicLinearBounds,
        pre: HyperRectBounds,
        post: HyperRectBounds,
    ) {
        self.symbolic.push((id.to_string(), (pre_symbolic, post_symbolic)));
        self.numeric_pre.push((id.to_string(), pre));
        self.numeric_post.push((id.to_string(), post));
    }

    pub fn symbolic(&self, id: &str) -> Option<&(SymbolicLinearBounds, SymbolicLinearBounds)> {
        self.symbolic.iter().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    pub fn numeric_pre(&self, id: &str) -> Option<&HyperRectBounds> {
        self.numeric_pre.iter().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    pub fn numeric_post(&self, id: &str) -> Option<&HyperRectBounds> {
        self.numeric_post.iter().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    /// The `numeric_post` mapping in insertion (layer traversal) order.
    pub fn numeric_post_ordered(&self) -> &[(String, HyperRectBounds)] {
        &self.numeric_post
    }

    /// The final layer's post-activation concrete bounds, if any layer ran.
    pub fn output_bounds(&self) -> Option<&HyperRectBounds> {
        self.numeric_post.last().map(|(_, v)| v)
    }
}

fn check_finite(bounds: &HyperRectBounds, id: &str, config: &BoundsConfig) -> Result<()> {
    let within_tolerance = |v: &f32| v.is_finite() && v.abs() <= config.nan_inf_tolerance;
    let ok = bounds.get_lower().iter().all(within_tolerance)
        && bounds.get_upper().iter().all(within_tolerance);
    if ok {
        Ok(())
    } else {
        Err(Error::Numerical { layer: id.to_string() })
    }
}

fn conv_weight_bias(layer: &LayerIR) -> Result<(ndarray::Array2<f32>, Array1<f32>)> {
    let affine = netbounds_conv::conv_to_affine(layer)?;
    Ok((affine.weight, affine.bias))
}

/// Walks a network's layers in order, propagating symbolic linear bounds
/// seeded from the identity map over `input_box`, using `BoundsConfig::default()`.
///
/// Only `FullyConnected`, `Conv` (reduced to affine by `netbounds-conv`),
/// and `ReLU` are supported; every other layer kind is an
/// `UnsupportedLayer` error. `MaxPool`'s handling (hard error vs. logged
/// pass-through) is controlled by `BoundsConfig::pooling_hard_error`; see
/// `compute_bounds_with_config` to override it.
pub fn compute_bounds(network: &Network, input_box: &HyperRectBounds) -> Result<BoundsReport> {
    compute_bounds_with_config(network, input_box, &BoundsConfig::default())
}

/// Same as [`compute_bounds`], with an explicit [`BoundsConfig`].
pub fn compute_bounds_with_config(
    network: &Network,
    input_box: &HyperRectBounds,
    config: &BoundsConfig,
) -> Result<BoundsReport> {
    let k = input_box.get_size();
    let mut current = SymbolicLinearBounds::identity(k);
    let mut report = BoundsReport::new();

    for layer in network {
        let id = layer.id();
        log::debug!("propagating bounds through layer `{}` ({})", id, layer.kind_name());

        match layer {
            LayerIR::FullyConnected { weight, bias, .. } => {
                let bias = bias.clone().unwrap_or_else(|| Array1::zeros(weight.nrows()));
                let transformed = affine_transform(&current, weight, &bias);
                let pre = transformed.to_hyper_rectangle_bounds(input_box);
                check_finite(&pre, id, config)?;

                log::trace!("layer `{}`: pre/post bounds = {:?}", id, pre);
                report.record(id, transformed.clone(), transformed.clone(), pre.clone(), pre);
                current = transformed;
            }

            LayerIR::Conv { .. } => {
                let (weight, bias) = conv_weight_bias(layer)?;
                let transformed = affine_transform(&current, &weight, &bias);
                let pre = transformed.to_hyper_rectangle_bounds(input_box);
                check_finite(&pre, id, config)?;

                log::trace!("layer `{}`: pre/post bounds = {:?}", id, pre);
                report.record(id, transformed.clone(), transformed.clone(), pre.clone(), pre);
                current = transformed;
            }

            LayerIR::ReLU { .. } => {
                let pre_symbolic = current.clone();
                let pre = pre_symbolic.to_hyper_rectangle_bounds(input_box);
                check_finite(&pre, id, config)?;

                let post_symbolic = relu_transform(&pre_symbolic, input_box);
                let post = post_concrete(&pre);
                check_finite(&post, id, config)?;

                log::trace!("layer `{}`: pre = {:?}, post = {:?}", id, pre, post);
                report.record(id, pre_symbolic, post_symbolic.clone(), pre, post);
                current = post_symbolic;
            }

            LayerIR::MaxPool { .. } => {
                if config.pooling_hard_error {
                    return Err(Error::UnsupportedLayer {
                        layer: id.to_string(),
                        kind: "MaxPool".to_string(),
                    });
                }
                log::warn!(
                    "layer `{}` (MaxPool) has no propagator; passing the previous bound through unchanged",
                    id
                );
                let pre_symbolic = current.clone();
                let pre = pre_symbolic.to_hyper_rectangle_bounds(input_box);
                check_finite(&pre, id, config)?;
                report.record(id, pre_symbolic.clone(), pre_symbolic, pre.clone(), pre);
            }

            other => {
                return Err(Error::UnsupportedLayer {
                    layer: id.to_string(),
                    kind: other.kind_name().to_string(),
                });
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, Array2, IxDyn};
    use rand::Rng;

    fn box_of(lower: Vec<f32>, upper: Vec<f32>) -> HyperRectBounds {
        HyperRectBounds::new(Array1::from(lower), Array1::from(upper))
    }

    #[test]
    fn scenario_1_identity_fc() {
        let fc = LayerIR::fully_connected("fc0", vec![2], 2, Some(Array2::eye(2)), false, None).unwrap();
        let input_box = box_of(vec![-1.0, -1.0], vec![1.0, 1.0]);

        let report = compute_bounds(&Network::new(vec![fc]).unwrap(), &input_box).unwrap();
        let post = report.numeric_post("fc0").unwrap();
        assert_eq!(post.get_lower(), &Array1::from(vec![-1.0, -1.0]));
        assert_eq!(post.get_upper(), &Array1::from(vec![1.0, 1.0]));

        let (_, post_symbolic) = report.symbolic("fc0").unwrap();
        assert_eq!(post_symbolic.get_lower().matrix(), post_symbolic.get_upper().matrix());
    }

    #[test]
    fn scenario_2_positive_weight_fc() {
        let w = Array2::from_shape_vec((2, 2), vec![2.0, 1.0, 0.0, 3.0]).unwrap();
        let b = Array1::from(vec![1.0, -1.0]);
        let fc = LayerIR::fully_connected("fc0", vec![2], 2, Some(w), true, Some(b)).unwrap();
        let input_box = box_of(vec![0.0, 0.0], vec![1.0, 1.0]);

        let report = compute_bounds(&Network::new(vec![fc]).unwrap(), &input_box).unwrap();
        let post = report.numeric_post("fc0").unwrap();
        assert_eq!(post.get_lower(), &Array1::from(vec![1.0, -1.0]));
        assert_eq!(post.get_upper(), &Array1::from(vec![4.0, 2.0]));
    }

    #[test]
    fn scenario_4_fc_relu_fc_is_sound_on_random_samples() {
        let w1 = Array2::from_shape_vec((2, 2), vec![1.0, -1.0, 1.0, 1.0]).unwrap();
        let fc1 = LayerIR::fully_connected("fc1", vec![2], 2, Some(w1.clone()), false, None).unwrap();
        let relu = LayerIR::relu("relu0", vec![2]).unwrap();
        let w2 = Array2::from_shape_vec((1, 2), vec![1.0, 1.0]).unwrap();
        let fc2 = LayerIR::fully_connected("fc2", vec![2], 1, Some(w2.clone()), false, None).unwrap();

        let input_box = box_of(vec![-1.0, -1.0], vec![1.0, 1.0]);
        let report = compute_bounds(&Network::new(vec![fc1, relu, fc2]).unwrap(), &input_box).unwrap();

        let output = report.output_bounds().unwrap();
        assert!(output.get_lower()[0] <= 0.0 + 1e-6);
        assert!(output.get_upper()[0] >= 2.0 - 1e-6);

        let mut rng = rand::thread_rng();
        for _ in 0..10_000 {
            let x = Array1::from(vec![rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)]);
            let h = (w1.dot(&x)).mapv(|v| v.max(0.0));
            let y = w2.dot(&h)[0];
            assert!(y >= output.get_lower()[0] - 1e-5);
            assert!(y <= output.get_upper()[0] + 1e-5);
        }
    }

    #[test]
    fn scenario_5_conv_1x1_one_channel() {
        let mut weight = Array::zeros(IxDyn(&[1, 1, 1, 1]));
        weight[[0, 0, 0, 0]] = 2.0;
        let conv = LayerIR::conv(
            "conv0",
            vec![1, 2, 2],
            1,
            vec![1, 1],
            vec![1, 1],
            vec![0, 0, 0, 0],
            vec![1, 1],
            1,
            Some(weight),
            None,
            false,
        )
        .unwrap();

        let input_box = box_of(vec![0.0; 4], vec![1.0; 4]);
        let report = compute_bounds(&Network::new(vec![conv]).unwrap(), &input_box).unwrap();
        let post = report.numeric_post("conv0").unwrap();
        assert_eq!(post.get_lower(), &Array1::from(vec![0.0; 4]));
        assert_eq!(post.get_upper(), &Array1::from(vec![2.0; 4]));
    }

    #[test]
    fn scenario_6_conv_2x2_on_3x3_all_ones() {
        let mut weight = Array::zeros(IxDyn(&[1, 1, 2, 2]));
        weight.fill(1.0);
        let conv = LayerIR::conv(
            "conv0",
            vec![1, 3, 3],
            1,
            vec![2, 2],
            vec![1, 1],
            vec![0, 0, 0, 0],
            vec![1, 1],
            1,
            Some(weight),
            None,
            false,
        )
        .unwrap();

        let input_box = box_of(vec![0.0; 9], vec![1.0; 9]);
        let report = compute_bounds(&Network::new(vec![conv]).unwrap(), &input_box).unwrap();
        let post = report.numeric_post("conv0").unwrap();
        assert_eq!(post.get_lower(), &Array1::from(vec![0.0; 4]));
        assert_eq!(post.get_upper(), &Array1::from(vec![4.0; 4]));
    }

    #[test]
    fn max_pool_is_a_hard_error_not_a_silent_passthrough() {
        let pool = LayerIR::max_pool("mp0", vec![1, 4, 4], vec![2, 2], vec![2, 2], vec![0, 0, 0, 0], vec![1, 1], false, false).unwrap();
        let input_box = box_of(vec![0.0; 16], vec![1.0; 16]);

        let err = compute_bounds(&Network::new(vec![pool]).unwrap(), &input_box).unwrap_err();
        assert!(matches!(err, Error::UnsupportedLayer { .. }));
    }

    #[test]
    fn max_pool_with_hard_error_disabled_passes_the_previous_bound_through() {
        let pool = LayerIR::max_pool("mp0", vec![1, 4, 4], vec![2, 2], vec![2, 2], vec![0, 0, 0, 0], vec![1, 1], false, false).unwrap();
        let input_box = box_of(vec![0.0; 16], vec![1.0; 16]);
        let network = Network::new(vec![pool]).unwrap();

        let config = BoundsConfig { pooling_hard_error: false, ..BoundsConfig::default() };
        let report = compute_bounds_with_config(&network, &input_box, &config).unwrap();

        let pre = report.numeric_pre("mp0").unwrap();
        let post = report.numeric_post("mp0").unwrap();
        assert_eq!(pre.get_lower(), input_box.get_lower());
        assert_eq!(pre.get_upper(), input_box.get_upper());
        assert_eq!(post, pre);
    }

    #[test]
    fn pure_affine_network_has_exact_bounds_matching_direct_composition() {
        let w1 = Array2::from_shape_vec((3, 2), vec![1.0, 2.0, -1.0, 0.5, 2.0, -2.0]).unwrap();
        let b1 = Array1::from(vec![0.5, -0.5, 1.0]);
        let fc1 = LayerIR::fully_connected("fc1", vec![2], 3, Some(w1.clone()), true, Some(b1.clone())).unwrap();

        let w2 = Array2::from_shape_vec((2, 3), vec![1.0, -1.0, 0.5, 0.0, 2.0, 1.0]).unwrap();
        let b2 = Array1::from(vec![-1.0, 0.0]);
        let fc2 = LayerIR::fully_connected("fc2", vec![3], 2, Some(w2.clone()), true, Some(b2.clone())).unwrap();

        let input_box = box_of(vec![-1.0, -1.0], vec![1.0, 1.0]);
        let report = compute_bounds(&Network::new(vec![fc1, fc2]).unwrap(), &input_box).unwrap();

        let (_, post_symbolic) = report.symbolic("fc2").unwrap();
        assert_eq!(post_symbolic.get_lower().matrix(), post_symbolic.get_upper().matrix());
        assert_eq!(post_symbolic.get_lower().offset(), post_symbolic.get_upper().offset());

        // The exact affine composition is W2*(W1*x + b1) + b2 = (W2*W1)*x + (W2*b1 + b2).
        let exact_matrix = w2.dot(&w1);
        let exact_offset = w2.dot(&b1) + &b2;
        assert!((post_symbolic.get_lower().matrix() - &exact_matrix).iter().all(|d| d.abs() < 1e-5));
        assert!((post_symbolic.get_lower().offset() - &exact_offset).iter().all(|d| d.abs() < 1e-5));
    }

    #[test]
    fn shrinking_the_input_box_never_loosens_the_output_bounds() {
        let w = Array2::from_shape_vec((1, 2), vec![1.0, -1.0]).unwrap();
        let fc = LayerIR::fully_connected("fc0", vec![2], 1, Some(w), false, None).unwrap();

        let wide = box_of(vec![-2.0, -2.0], vec![2.0, 2.0]);
        let narrow = box_of(vec![-1.0, -1.0], vec![1.0, 1.0]);

        let wide_report = compute_bounds(&Network::new(vec![fc.clone()]).unwrap(), &wide).unwrap();
        let narrow_report = compute_bounds(&Network::new(vec![fc]).unwrap(), &narrow).unwrap();

        let wide_bounds = wide_report.numeric_post("fc0").unwrap();
        let narrow_bounds = narrow_report.numeric_post("fc0").unwrap();

        assert!(narrow_bounds.get_lower()[0] >= wide_bounds.get_lower()[0]);
        assert!(narrow_bounds.get_upper()[0] <= wide_bounds.get_upper()[0]);
    }
}
