/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

//! Reduces a 2-D `Conv` layer to a doubly-blocked affine operator so that
//! downstream symbolic propagation can treat convolution and fully
//! connected layers uniformly.

use ndarray::{Array1, Array2};
use netbounds_core::{Error, Result};
use netbounds_layers::LayerIR;

/// A `Conv` layer expressed as a flat affine map over the channel-interleaved
/// flattening of its input: `weight` has shape `(F·out_h·out_w, C·H·W)` and
/// `bias` has shape `(F·out_h·out_w,)`, with rows in filter-major order
/// (matching the layer's own `out_dim = (F, out_h, out_w)`).
pub struct ConvAffine {
    pub weight: Array2<f32>,
    pub bias: Array1<f32>,
    pub out_channels: usize,
    pub out_spatial: Vec<usize>,
}

/// Builds the [`ConvAffine`] equivalent of a 2-D `Conv` layer.
///
/// Each output row corresponds to one `(filter, out_row, out_col)` triple;
/// each column corresponds to one `(in_row, in_col, in_channel)` triple,
/// with the input channel varying fastest (the "channel-interleaved"
/// flattening needed so the stacked Toeplitz blocks line up with a single
/// flattened input vector).
///
/// Supports `groups = 1` and symmetric per-axis padding; anything else is an
/// `UnsupportedLayer` error rather than a silent approximation.
pub fn conv_to_affine(layer: &LayerIR) -> Result<ConvAffine> {
    let (id, in_dim, out_dim, kernel, stride, padding, dilation, groups, weight, bias) = match layer
    {
        LayerIR::Conv {
            id,
            in_dim,
            out_dim,
            kernel,
            stride,
            padding,
            dilation,
            groups,
            weight,
            bias,
        } => (id, in_dim, out_dim, kernel, stride, padding, dilation, *groups, weight, bias),
        other => {
            return Err(Error::UnsupportedLayer {
                layer: other.id().to_string(),
                kind: "conv_to_affine called on a non-Conv layer".to_string(),
            })
        }
    };

    if groups != 1 {
        return Err(Error::UnsupportedLayer {
            layer: id.clone(),
            kind: format!("Conv with groups = {} (only groups = 1 reduces to affine)", groups),
        });
    }
    if kernel.len() != 2 {
        return Err(Error::UnsupportedLayer {
            layer: id.clone(),
            kind: format!("Conv over {} spatial axes (only 2-D Conv reduces to affine)", kernel.len()),
        });
    }
    let (ph, pw) = (padding[0], padding[1]);
    if padding[2] != ph || padding[3] != pw {
        return Err(Error::UnsupportedLayer {
            layer: id.clone(),
            kind: "Conv with asymmetric padding".to_string(),
        });
    }

    let (c, h, w) = (in_dim[0], in_dim[1], in_dim[2]);
    let (f, out_h, out_w) = (out_dim[0], out_dim[1], out_dim[2]);
    let (kh, kw) = (kernel[0], kernel[1]);
    let (sh, sw) = (stride[0], stride[1]);
    let (dh, dw) = (dilation[0], dilation[1]);

    let in_features = c * h * w;
    let out_features = f * out_h * out_w;
    let mut mat = Array2::<f32>::zeros((out_features, in_features));

    for fi in 0..f {
        for oh in 0..out_h {
            for ow in 0..out_w {
                let out_row = (fi * out_h + oh) * out_w + ow;
                for ch in 0..c {
                    for ki in 0..kh {
                        let ih = oh as isize * sh as isize - ph as isize + ki as isize * dh as isize;
                        if ih < 0 || ih as usize >= h {
                            continue;
                        }
                        for kj in 0..kw {
                            let iw = ow as isize * sw as isize - pw as isize + kj as isize * dw as isize;
                            if iw < 0 || iw as usize >= w {
                                continue;
                            }
                            let col = (ih as usize * w + iw as usize) * c + ch;
                            mat[[out_row, col]] += weight[[fi, ch, ki, kj]];
                        }
                    }
                }
            }
        }
    }

    let mut b = Array1::<f32>::zeros(out_features);
    if let Some(bias) = bias {
        for fi in 0..f {
            let v = bias[fi];
            for oh in 0..out_h {
                for ow in 0..out_w {
                    b[(fi * out_h + oh) * out_w + ow] = v;
                }
            }
        }
    }

    Ok(ConvAffine { weight: mat, bias: b, out_channels: f, out_spatial: vec![out_h, out_w] })
}
