/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

use ndarray::{Array1, Array2, ArrayD};
use netbounds_core::{Error, Result};

use crate::init;
use crate::shape::{normalize_axis, product, shape_error, windowed_output_spatial};

/// A single layer of a network under verification, carrying its own shape
/// arithmetic and parameter invariants.
///
/// Layers are immutable value objects except through [`LayerIR::update_input`],
/// which recomputes `out_dim` and re-validates parameter shapes in place.
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum LayerIR {
    ReLU { id: String, in_dim: Vec<usize> },
    ELU { id: String, in_dim: Vec<usize>, alpha: f32 },
    CELU { id: String, in_dim: Vec<usize>, alpha: f32 },
    LeakyReLU { id: String, in_dim: Vec<usize>, slope: f32 },
    Sigmoid { id: String, in_dim: Vec<usize> },
    Tanh { id: String, in_dim: Vec<usize> },
    Lrn { id: String, in_dim: Vec<usize>, size: usize, alpha: f32, beta: f32, k: f32 },
    Dropout { id: String, in_dim: Vec<usize>, p: f32 },
    SoftMax { id: String, in_dim: Vec<usize>, axis: usize },

    FullyConnected {
        id: String,
        in_dim: Vec<usize>,
        out_dim: Vec<usize>,
        weight: Array2<f32>,
        bias: Option<Array1<f32>>,
    },

    BatchNorm1D {
        id: String,
        in_dim: Vec<usize>,
        out_dim: Vec<usize>,
        running_mean: Array1<f32>,
        running_var: Array1<f32>,
        weight: Option<Array1<f32>>,
        bias: Option<Array1<f32>>,
        eps: f32,
        momentum: f32,
        affine: bool,
        track_running_stats: bool,
    },

    Conv {
        id: String,
        in_dim: Vec<usize>,
        out_dim: Vec<usize>,
        kernel: Vec<usize>,
        stride: Vec<usize>,
        padding: Vec<usize>,
        dilation: Vec<usize>,
        groups: usize,
        weight: ArrayD<f32>,
        bias: Option<Array1<f32>>,
    },

    AveragePool {
        id: String,
        in_dim: Vec<usize>,
        out_dim: Vec<usize>,
        kernel: Vec<usize>,
        stride: Vec<usize>,
        padding: Vec<usize>,
        ceil_mode: bool,
        count_include_pad: bool,
    },

    MaxPool {
        id: String,
        in_dim: Vec<usize>,
        out_dim: Vec<usize>,
        kernel: Vec<usize>,
        stride: Vec<usize>,
        padding: Vec<usize>,
        dilation: Vec<usize>,
        ceil_mode: bool,
        return_indices: bool,
    },

    Unsqueeze { id: String, in_dim: Vec<usize>, out_dim: Vec<usize>, axes: Vec<usize> },
    Reshape { id: String, in_dim: Vec<usize>, out_dim: Vec<usize>, shape: Vec<isize>, allow_zero: bool },
    Flatten { id: String, in_dim: Vec<usize>, out_dim: Vec<usize>, axis: usize },
    Transpose { id: String, in_dim: Vec<usize>, out_dim: Vec<usize>, perm: Vec<usize> },
    Concat { id: String, in_dim: Vec<usize>, out_dim: Vec<usize>, second_shape: Vec<usize>, axis: usize },
    Sum { id: String, in_dim: Vec<usize>, out_dim: Vec<usize>, second_shape: Vec<usize> },
}

fn require_non_empty(in_dim: &[usize], id: &str) -> Result<()> {
    if in_dim.is_empty() {
        return Err(shape_error(id, "in_dim", "non-empty shape", "[]"));
    }
    Ok(())
}

impl LayerIR {
    pub fn id(&self) -> &str {
        match self {
            LayerIR::ReLU { id, .. }
            | LayerIR::ELU { id, .. }
            | LayerIR::CELU { id, .. }
            | LayerIR::LeakyReLU { id, .. }
            | LayerIR::Sigmoid { id, .. }
            | LayerIR::Tanh { id, .. }
            | LayerIR::Lrn { id, .. }
            | LayerIR::Dropout { id, .. }
            | LayerIR::SoftMax { id, .. }
            | LayerIR::FullyConnected { id, .. }
            | LayerIR::BatchNorm1D { id, .. }
            | LayerIR::Conv { id, .. }
            | LayerIR::AveragePool { id, .. }
            | LayerIR::MaxPool { id, .. }
            | LayerIR::Unsqueeze { id, .. }
            | LayerIR::Reshape { id, .. }
            | LayerIR::Flatten { id, .. }
            | LayerIR::Transpose { id, .. }
            | LayerIR::Concat { id, .. }
            | LayerIR::Sum { id, .. } => id,
        }
    }

    pub fn in_dim(&self) -> &[usize] {
        match self {
            LayerIR::ReLU { in_dim, .. }
            | LayerIR::ELU { in_dim, .. }
            | LayerIR::CELU { in_dim, .. }
            | LayerIR::LeakyReLU { in_dim, .. }
            | LayerIR::Sigmoid { in_dim, .. }
            | LayerIR::Tanh { in_dim, .. }
            | LayerIR::Lrn { in_dim, .. }
            | LayerIR::Dropout { in_dim, .. }
            | LayerIR::SoftMax { in_dim, .. }
            | LayerIR::FullyConnected { in_dim, .. }
            | LayerIR::BatchNorm1D { in_dim, .. }
            | LayerIR::Conv { in_dim, .. }
            | LayerIR::AveragePool { in_dim, .. }
            | LayerIR::MaxPool { in_dim, .. }
            | LayerIR::Unsqueeze { in_dim, .. }
            | LayerIR::Reshape { in_dim, .. }
            | LayerIR::Flatten { in_dim, .. }
            | LayerIR::Transpose { in_dim, .. }
            | LayerIR::Concat { in_dim, .. }
            | LayerIR::Sum { in_dim, .. } => in_dim,
        }
    }

    pub fn out_dim(&self) -> &[usize] {
        match self {
            LayerIR::ReLU { in_dim, .. }
            | LayerIR::ELU { in_dim, .. }
            | LayerIR::CELU { in_dim, .. }
            | LayerIR::LeakyReLU { in_dim, .. }
            | LayerIR::Sigmoid { in_dim, .. }
            | LayerIR::Tanh { in_dim, .. }
            | LayerIR::Lrn { in_dim, .. }
            | LayerIR::Dropout { in_dim, .. }
            | LayerIR::SoftMax { in_dim, .. } => in_dim,
            LayerIR::FullyConnected { out_dim, .. }
            | LayerIR::BatchNorm1D { out_dim, .. }
            | LayerIR::Conv { out_dim, .. }
            | LayerIR::AveragePool { out_dim, .. }
            | LayerIR::MaxPool { out_dim, .. }
            | LayerIR::Unsqueeze { out_dim, .. }
            | LayerIR::Reshape { out_dim, .. }
            | LayerIR::Flatten { out_dim, .. }
            | LayerIR::Transpose { out_dim, .. }
            | LayerIR::Concat { out_dim, .. }
            | LayerIR::Sum { out_dim, .. } => out_dim,
        }
    }

    /// A short, stable name for the layer's kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            LayerIR::ReLU { .. } => "ReLU",
            LayerIR::ELU { .. } => "ELU",
            LayerIR::CELU { .. } => "CELU",
            LayerIR::LeakyReLU { .. } => "LeakyReLU",
            LayerIR::Sigmoid { .. } => "Sigmoid",
            LayerIR::Tanh { .. } => "Tanh",
            LayerIR::Lrn { .. } => "LRN",
            LayerIR::Dropout { .. } => "Dropout",
            LayerIR::SoftMax { .. } => "SoftMax",
            LayerIR::FullyConnected { .. } => "FullyConnected",
            LayerIR::BatchNorm1D { .. } => "BatchNorm1D",
            LayerIR::Conv { .. } => "Conv",
            LayerIR::AveragePool { .. } => "AveragePool",
            LayerIR::MaxPool { .. } => "MaxPool",
            LayerIR::Unsqueeze { .. } => "Unsqueeze",
            LayerIR::Reshape { .. } => "Reshape",
            LayerIR::Flatten { .. } => "Flatten",
            LayerIR::Transpose { .. } => "Transpose",
            LayerIR::Concat { .. } => "Concat",
            LayerIR::Sum { .. } => "Sum",
        }
    }

    // -- identity-shape activations --------------------------------------

    pub fn relu(id: impl Into<String>, in_dim: Vec<usize>) -> Result<Self> {
        let id = id.into();
        require_non_empty(&in_dim, &id)?;
        Ok(LayerIR::ReLU { id, in_dim })
    }

    pub fn sigmoid(id: impl Into<String>, in_dim: Vec<usize>) -> Result<Self> {
        let id = id.into();
        require_non_empty(&in_dim, &id)?;
        Ok(LayerIR::Sigmoid { id, in_dim })
    }

    pub fn tanh(id: impl Into<String>, in_dim: Vec<usize>) -> Result<Self> {
        let id = id.into();
        require_non_empty(&in_dim, &id)?;
        Ok(LayerIR::Tanh { id, in_dim })
    }

    pub fn elu(id: impl Into<String>, in_dim: Vec<usize>, alpha: f32) -> Result<Self> {
        let id = id.into();
        require_non_empty(&in_dim, &id)?;
        Ok(LayerIR::ELU { id, in_dim, alpha })
    }

    pub fn celu(id: impl Into<String>, in_dim: Vec<usize>, alpha: f32) -> Result<Self> {
        let id = id.into();
        require_non_empty(&in_dim, &id)?;
        Ok(LayerIR::CELU { id, in_dim, alpha })
    }

    pub fn leaky_relu(id: impl Into<String>, in_dim: Vec<usize>, slope: f32) -> Result<Self> {
        let id = id.into();
        require_non_empty(&in_dim, &id)?;
        Ok(LayerIR::LeakyReLU { id, in_dim, slope })
    }

    pub fn lrn(
        id: impl Into<String>,
        in_dim: Vec<usize>,
        size: usize,
        alpha: f32,
        beta: f32,
        k: f32,
    ) -> Result<Self> {
        let id = id.into();
        if in_dim.len() < 2 {
            return Err(shape_error(&id, "in_dim", "rank >= 2", in_dim.len()));
        }
        Ok(LayerIR::Lrn { id, in_dim, size, alpha, beta, k })
    }

    pub fn dropout(id: impl Into<String>, in_dim: Vec<usize>, p: f32) -> Result<Self> {
        let id = id.into();
        require_non_empty(&in_dim, &id)?;
        if !(0.0..=1.0).contains(&p) {
            return Err(shape_error(&id, "p", "in [0, 1]", p));
        }
        Ok(LayerIR::Dropout { id, in_dim, p })
    }

    pub fn softmax(id: impl Into<String>, in_dim: Vec<usize>, axis: isize) -> Result<Self> {
        let id = id.into();
        require_non_empty(&in_dim, &id)?;
        let axis = normalize_axis(axis, in_dim.len(), &id, "axis")?;
        Ok(LayerIR::SoftMax { id, in_dim, axis })
    }

    // -- affine ------------------------------------------------------------

    pub fn fully_connected(
        id: impl Into<String>,
        in_dim: Vec<usize>,
        out_features: usize,
        weight: Option<Array2<f32>>,
        has_bias: bool,
        bias: Option<Array1<f32>>,
    ) -> Result<Self> {
        let id = id.into();
        require_non_empty(&in_dim, &id)?;
        let in_features = *in_dim.last().unwrap();

        let weight = match weight {
            Some(w) => {
                if w.nrows() != out_features || w.ncols() != in_features {
                    return Err(shape_error(
                        &id,
                        "weight",
                        format!("({}, {})", out_features, in_features),
                        format!("({}, {})", w.nrows(), w.ncols()),
                    ));
                }
                w
            }
            None => {
                let k = (1.0 / in_features as f32).sqrt();
                init::uniform(&[out_features, in_features], -k, k)
                    .into_dimensionality()
                    .expect("2-D shape request yields a 2-D array")
            }
        };

        let bias = if has_bias {
            match bias {
                Some(b) => {
                    if b.len() != out_features {
                        return Err(shape_error(&id, "bias", out_features, b.len()));
                    }
                    Some(b)
                }
                None => {
                    let k = (1.0 / in_features as f32).sqrt();
                    let sampled = init::uniform(&[out_features], -k, k)
                        .into_dimensionality()
                        .expect("1-D shape request yields a 1-D array");
                    Some(sampled)
                }
            }
        } else {
            None
        };

        let mut out_dim = in_dim.clone();
        *out_dim.last_mut().unwrap() = out_features;

        Ok(LayerIR::FullyConnected { id, in_dim, out_dim, weight, bias })
    }

    // -- batch norm ----------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn batch_norm_1d(
        id: impl Into<String>,
        in_dim: Vec<usize>,
        running_mean: Array1<f32>,
        running_var: Array1<f32>,
        weight: Option<Array1<f32>>,
        bias: Option<Array1<f32>>,
        eps: f32,
        momentum: f32,
        affine: bool,
        track_running_stats: bool,
    ) -> Result<Self> {
        let id = id.into();
        require_non_empty(&in_dim, &id)?;
        let num_features = in_dim[0];

        for (name, len) in [
            ("running_mean", running_mean.len()),
            ("running_var", running_var.len()),
        ] {
            if len != num_features {
                return Err(shape_error(&id, name, num_features, len));
            }
        }
        if affine {
            for (name, opt) in [("weight", &weight), ("bias", &bias)] {
                let len = opt.as_ref().map(|v| v.len());
                if len != Some(num_features) {
                    return Err(shape_error(&id, name, num_features, format!("{:?}", len)));
                }
            }
        }

        let out_dim = in_dim.clone();
        Ok(LayerIR::BatchNorm1D {
            id,
            in_dim,
            out_dim,
            running_mean,
            running_var,
            weight,
            bias,
            eps,
            momentum,
            affine,
            track_running_stats,
        })
    }

    // -- conv ------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn conv(
        id: impl Into<String>,
        in_dim: Vec<usize>,
        out_channels: usize,
        kernel: Vec<usize>,
        stride: Vec<usize>,
        padding: Vec<usize>,
        dilation: Vec<usize>,
        groups: usize,
        weight: Option<ArrayD<f32>>,
        bias: Option<Array1<f32>>,
        has_bias: bool,
    ) -> Result<Self> {
        let id = id.into();
        let rank = in_dim.len();
        if rank < 2 {
            return Err(shape_error(&id, "in_dim", "rank >= 2", rank));
        }
        let nspatial = rank - 1;
        for (name, len) in [("kernel", kernel.len()), ("stride", stride.len()), ("dilation", dilation.len())] {
            if len != nspatial {
                return Err(shape_error(&id, name, nspatial, len));
            }
        }
        if padding.len() != 2 * nspatial {
            return Err(shape_error(&id, "padding", 2 * nspatial, padding.len()));
        }

        let in_channels = in_dim[0];
        if in_channels % groups != 0 {
            return Err(shape_error(&id, "in_channels", format!("divisible by groups ({})", groups), in_channels));
        }
        if out_channels % groups != 0 {
            return Err(shape_error(&id, "out_channels", format!("divisible by groups ({})", groups), out_channels));
        }

        let out_spatial = windowed_output_spatial(&in_dim, &kernel, &stride, &padding, &dilation, false);
        let mut out_dim = vec![out_channels];
        out_dim.extend(out_spatial);

        let mut weight_shape = vec![out_channels, in_channels / groups];
        weight_shape.extend(kernel.iter().copied());

        let weight = match weight {
            Some(w) => {
                if w.shape() != weight_shape.as_slice() {
                    return Err(shape_error(&id, "weight", format!("{:?}", weight_shape), format!("{:?}", w.shape())));
                }
                w
            }
            None => {
                let bound = (groups as f32 / (in_channels as f32 * product(&kernel) as f32)).sqrt();
                init::uniform(&weight_shape, -bound, bound)
            }
        };

        let bias = if has_bias {
            match bias {
                Some(b) => {
                    if b.len() != out_channels {
                        return Err(shape_error(&id, "bias", out_channels, b.len()));
                    }
                    Some(b)
                }
                None => {
                    let bound = (groups as f32 / (in_channels as f32 * product(&kernel) as f32)).sqrt();
                    let sampled = init::uniform(&[out_channels], -bound, bound)
                        .into_dimensionality()
                        .expect("1-D shape request yields a 1-D array");
                    Some(sampled)
                }
            }
        } else {
            None
        };

        Ok(LayerIR::Conv { id, in_dim, out_dim, kernel, stride, padding, dilation, groups, weight, bias })
    }

    // -- pooling -----------------------------------------------------------

    pub fn average_pool(
        id: impl Into<String>,
        in_dim: Vec<usize>,
        kernel: Vec<usize>,
        stride: Vec<usize>,
        padding: Vec<usize>,
        ceil_mode: bool,
        count_include_pad: bool,
    ) -> Result<Self> {
        let id = id.into();
        let rank = in_dim.len();
        if rank < 2 {
            return Err(shape_error(&id, "in_dim", "rank >= 2", rank));
        }
        let nspatial = rank - 1;
        for (name, len) in [("kernel", kernel.len()), ("stride", stride.len())] {
            if len != nspatial {
                return Err(shape_error(&id, name, nspatial, len));
            }
        }
        if padding.len() != 2 * nspatial {
            return Err(shape_error(&id, "padding", 2 * nspatial, padding.len()));
        }

        let dilation = vec![1; nspatial];
        let out_spatial = windowed_output_spatial(&in_dim, &kernel, &stride, &padding, &dilation, ceil_mode);
        let mut out_dim = vec![in_dim[0]];
        out_dim.extend(out_spatial);

        Ok(LayerIR::AveragePool { id, in_dim, out_dim, kernel, stride, padding, ceil_mode, count_include_pad })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn max_pool(
        id: impl Into<String>,
        in_dim: Vec<usize>,
        kernel: Vec<usize>,
        stride: Vec<usize>,
        padding: Vec<usize>,
        dilation: Vec<usize>,
        ceil_mode: bool,
        return_indices: bool,
    ) -> Result<Self> {
        let id = id.into();
        let rank = in_dim.len();
        if rank < 2 {
            return Err(shape_error(&id, "in_dim", "rank >= 2", rank));
        }
        let nspatial = rank - 1;
        for (name, len) in [("kernel", kernel.len()), ("stride", stride.len()), ("dilation", dilation.len())] {
            if len != nspatial {
                return Err(shape_error(&id, name, nspatial, len));
            }
        }
        if padding.len() != 2 * nspatial {
            return Err(shape_error(&id, "padding", 2 * nspatial, padding.len()));
        }

        let out_spatial = windowed_output_spatial(&in_dim, &kernel, &stride, &padding, &dilation, ceil_mode);
        let mut out_dim = vec![in_dim[0]];
        out_dim.extend(out_spatial);

        Ok(LayerIR::MaxPool { id, in_dim, out_dim, kernel, stride, padding, dilation, ceil_mode, return_indices })
    }

    // -- shape ops -----------------------------------------------------------

    pub fn unsqueeze(id: impl Into<String>, in_dim: Vec<usize>, axes: Vec<isize>) -> Result<Self> {
        let id = id.into();
        let r = in_dim.len();
        let k = axes.len();
        if k == 0 {
            return Err(shape_error(&id, "axes", "non-empty", 0));
        }
        let out_rank = r + k;
        let mut normalized: Vec<usize> = axes
            .iter()
            .map(|&a| normalize_axis(a, out_rank, &id, "axes"))
            .collect::<Result<_>>()?;
        normalized.sort_unstable();
        for w in normalized.windows(2) {
            if w[0] == w[1] {
                return Err(shape_error(&id, "axes", "unique", format!("{:?}", axes)));
            }
        }

        let mut out_dim = Vec::with_capacity(out_rank);
        let mut src = in_dim.iter().copied();
        for pos in 0..out_rank {
            if normalized.contains(&pos) {
                out_dim.push(1);
            } else {
                out_dim.push(src.next().expect("remaining in_dim axes cover all non-inserted positions"));
            }
        }

        Ok(LayerIR::Unsqueeze { id, in_dim, out_dim, axes: normalized })
    }

    pub fn reshape(id: impl Into<String>, in_dim: Vec<usize>, shape: Vec<isize>, allow_zero: bool) -> Result<Self> {
        let id = id.into();
        let neg_ones = shape.iter().filter(|&&d| d == -1).count();
        if neg_ones > 1 {
            return Err(shape_error(&id, "shape", "at most one -1", neg_ones));
        }

        let mut resolved: Vec<isize> = shape.clone();
        if !allow_zero {
            for (i, d) in resolved.iter_mut().enumerate() {
                if *d == 0 {
                    let src = in_dim.get(i).ok_or_else(|| {
                        shape_error(&id, "shape", format!("axis {} present in in_dim", i), "out of range")
                    })?;
                    *d = *src as isize;
                }
            }
        }

        let known_product: isize = resolved.iter().filter(|&&d| d != -1).product();
        let total = product(&in_dim) as isize;
        let out_dim: Vec<usize> = if neg_ones == 1 {
            if known_product == 0 || total % known_product != 0 {
                return Err(shape_error(&id, "shape", format!("divisor of {}", total), known_product));
            }
            let inferred = total / known_product;
            resolved.iter().map(|&d| if d == -1 { inferred as usize } else { d as usize }).collect()
        } else {
            resolved.iter().map(|&d| d as usize).collect()
        };

        if product(&out_dim) as isize != total {
            return Err(shape_error(&id, "shape", total, product(&out_dim)));
        }

        Ok(LayerIR::Reshape { id, in_dim, out_dim, shape, allow_zero })
    }

    pub fn flatten(id: impl Into<String>, in_dim: Vec<usize>, axis: isize) -> Result<Self> {
        let id = id.into();
        let r = in_dim.len();
        let axis_r = if axis < 0 { axis + r as isize } else { axis };
        if axis_r < 0 || axis_r > r as isize {
            return Err(shape_error(&id, "axis", format!("[{}, {}]", -(r as isize), r), axis));
        }
        let axis = axis_r as usize;

        let out_dim = if axis == 0 {
            vec![1, product(&in_dim)]
        } else {
            vec![product(&in_dim[..axis]), product(&in_dim[axis..])]
        };

        Ok(LayerIR::Flatten { id, in_dim, out_dim, axis })
    }

    pub fn transpose(id: impl Into<String>, in_dim: Vec<usize>, perm: Vec<usize>) -> Result<Self> {
        let id = id.into();
        let r = in_dim.len();
        let mut sorted = perm.clone();
        sorted.sort_unstable();
        if perm.len() != r || sorted != (0..r).collect::<Vec<_>>() {
            return Err(shape_error(&id, "perm", format!("permutation of 0..{}", r), format!("{:?}", perm)));
        }

        let out_dim = perm.iter().map(|&p| in_dim[p]).collect();
        Ok(LayerIR::Transpose { id, in_dim, out_dim, perm })
    }

    pub fn concat(id: impl Into<String>, in_dim: Vec<usize>, second_shape: Vec<usize>, axis: isize) -> Result<Self> {
        let id = id.into();
        require_non_empty(&in_dim, &id)?;
        let axis = normalize_axis(axis, in_dim.len(), &id, "axis")?;

        if in_dim.len() != second_shape.len() {
            return Err(shape_error(&id, "second_shape", format!("rank {}", in_dim.len()), second_shape.len()));
        }
        for (i, (&a, &b)) in in_dim.iter().zip(second_shape.iter()).enumerate() {
            if i != axis && a != b {
                return Err(shape_error(&id, "second_shape", format!("{} at axis {}", a, i), b));
            }
        }

        let mut out_dim = in_dim.clone();
        out_dim[axis] += second_shape[axis];

        Ok(LayerIR::Concat { id, in_dim, out_dim, second_shape, axis })
    }

    pub fn sum(id: impl Into<String>, in_dim: Vec<usize>, second_shape: Vec<usize>) -> Result<Self> {
        let id = id.into();
        if in_dim != second_shape {
            return Err(shape_error(&id, "second_shape", format!("{:?}", in_dim), format!("{:?}", second_shape)));
        }
        let out_dim = in_dim.clone();
        Ok(LayerIR::Sum { id, in_dim, out_dim, second_shape })
    }

    /// Recomputes `out_dim` (and re-validates parameter shapes) for a new
    /// `in_dim`, preserving all weights and hyperparameters.
    pub fn update_input(&mut self, new_in_dim: Vec<usize>) -> Result<()> {
        let rebuilt = match std::mem::replace(
            self,
            LayerIR::ReLU { id: String::new(), in_dim: Vec::new() },
        ) {
            LayerIR::ReLU { id, .. } => LayerIR::relu(id, new_in_dim),
            LayerIR::Sigmoid { id, .. } => LayerIR::sigmoid(id, new_in_dim),
            LayerIR::Tanh { id, .. } => LayerIR::tanh(id, new_in_dim),
            LayerIR::ELU { id, alpha, .. } => LayerIR::elu(id, new_in_dim, alpha),
            LayerIR::CELU { id, alpha, .. } => LayerIR::celu(id, new_in_dim, alpha),
            LayerIR::LeakyReLU { id, slope, .. } => LayerIR::leaky_relu(id, new_in_dim, slope),
            LayerIR::Lrn { id, size, alpha, beta, k, .. } => LayerIR::lrn(id, new_in_dim, size, alpha, beta, k),
            LayerIR::Dropout { id, p, .. } => LayerIR::dropout(id, new_in_dim, p),
            LayerIR::SoftMax { id, axis, .. } => LayerIR::softmax(id, new_in_dim, axis as isize),

            LayerIR::FullyConnected { id, weight, bias, .. } => {
                let out_features = weight.nrows();
                let has_bias = bias.is_some();
                LayerIR::fully_connected(id, new_in_dim, out_features, Some(weight), has_bias, bias)
            }

            LayerIR::BatchNorm1D {
                id, running_mean, running_var, weight, bias, eps, momentum, affine, track_running_stats, ..
            } => LayerIR::batch_norm_1d(
                id, new_in_dim, running_mean, running_var, weight, bias, eps, momentum, affine, track_running_stats,
            ),

            LayerIR::Conv { id, kernel, stride, padding, dilation, groups, weight, bias, .. } => {
                let out_channels = weight.shape()[0];
                let has_bias = bias.is_some();
                LayerIR::conv(id, new_in_dim, out_channels, kernel, stride, padding, dilation, groups, Some(weight), bias, has_bias)
            }

            LayerIR::AveragePool { id, kernel, stride, padding, ceil_mode, count_include_pad, .. } => {
                LayerIR::average_pool(id, new_in_dim, kernel, stride, padding, ceil_mode, count_include_pad)
            }

            LayerIR::MaxPool { id, kernel, stride, padding, dilation, ceil_mode, return_indices, .. } => {
                LayerIR::max_pool(id, new_in_dim, kernel, stride, padding, dilation, ceil_mode, return_indices)
            }

            LayerIR::Unsqueeze { id, axes, .. } => {
                LayerIR::unsqueeze(id, new_in_dim, axes.into_iter().map(|a| a as isize).collect())
            }
            LayerIR::Reshape { id, shape, allow_zero, .. } => LayerIR::reshape(id, new_in_dim, shape, allow_zero),
            LayerIR::Flatten { id, axis, .. } => LayerIR::flatten(id, new_in_dim, axis as isize),
            LayerIR::Transpose { id, perm, .. } => LayerIR::transpose(id, new_in_dim, perm),
            LayerIR::Concat { id, second_shape, axis, .. } => {
                LayerIR::concat(id, new_in_dim, second_shape, axis as isize)
            }
            LayerIR::Sum { id, second_shape, .. } => LayerIR::sum(id, new_in_dim, second_shape),
        }?;

        *self = rebuilt;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_connected_default_init_has_the_right_shape() {
        let layer = LayerIR::fully_connected("fc0", vec![4], 3, None, true, None).unwrap();
        assert_eq!(layer.out_dim(), &[3]);
        if let LayerIR::FullyConnected { weight, bias, .. } = layer {
            assert_eq!(weight.shape(), &[3, 4]);
            assert_eq!(bias.unwrap().len(), 3);
        } else {
            panic!("expected FullyConnected");
        }
    }

    #[test]
    fn fully_connected_rejects_mismatched_weight() {
        let bad = Array2::zeros((2, 5));
        let err = LayerIR::fully_connected("fc0", vec![4], 3, Some(bad), false, None);
        assert!(err.is_err());
    }

    #[test]
    fn conv_output_shape_matches_the_windowed_formula() {
        // in_dim (C=1, H=5, W=5), kernel 3x3, stride 1, no padding, no dilation
        let layer = LayerIR::conv(
            "conv0",
            vec![1, 5, 5],
            2,
            vec![3, 3],
            vec![1, 1],
            vec![0, 0, 0, 0],
            vec![1, 1],
            1,
            None,
            None,
            false,
        )
        .unwrap();
        assert_eq!(layer.out_dim(), &[2, 3, 3]);
    }

    #[test]
    fn conv_rejects_groups_not_dividing_channels() {
        let err = LayerIR::conv(
            "conv0",
            vec![3, 5, 5],
            4,
            vec![3, 3],
            vec![1, 1],
            vec![0, 0, 0, 0],
            vec![1, 1],
            2,
            None,
            None,
            false,
        );
        assert!(err.is_err());
    }

    #[test]
    fn update_input_reuses_weight_and_revalidates() {
        let mut layer = LayerIR::fully_connected("fc0", vec![4], 3, None, false, None).unwrap();
        layer.update_input(vec![4]).unwrap();
        assert_eq!(layer.out_dim(), &[3]);

        assert!(layer.update_input(vec![5]).is_err());
    }

    #[test]
    fn reshape_resolves_a_single_wildcard() {
        let layer = LayerIR::reshape("r0", vec![2, 6], vec![3, -1], false).unwrap();
        assert_eq!(layer.out_dim(), &[3, 4]);
    }

    #[test]
    fn reshape_rejects_two_wildcards() {
        assert!(LayerIR::reshape("r0", vec![2, 6], vec![-1, -1], false).is_err());
    }

    #[test]
    fn unsqueeze_inserts_axes_in_sorted_order() {
        let layer = LayerIR::unsqueeze("u0", vec![3, 4], vec![0, -1]).unwrap();
        assert_eq!(layer.out_dim(), &[1, 3, 4, 1]);
    }

    #[test]
    fn transpose_requires_a_permutation() {
        assert!(LayerIR::transpose("t0", vec![2, 3], vec![0, 0]).is_err());
        let layer = LayerIR::transpose("t0", vec![2, 3], vec![1, 0]).unwrap();
        assert_eq!(layer.out_dim(), &[3, 2]);
    }

    #[test]
    fn concat_requires_matching_shape_off_axis() {
        assert!(LayerIR::concat("c0", vec![2, 3], vec![2, 4], 0).is_err());
        let layer = LayerIR::concat("c0", vec![2, 3], vec![2, 3], 0).unwrap();
        assert_eq!(layer.out_dim(), &[4, 3]);
    }

    #[test]
    fn sum_requires_identical_shapes() {
        assert!(LayerIR::sum("s0", vec![2, 3], vec![2, 4]).is_err());
        let layer = LayerIR::sum("s0", vec![2, 3], vec![2, 3]).unwrap();
        assert_eq!(layer.out_dim(), &[2, 3]);
    }

    #[test]
    fn update_input_with_the_same_shape_leaves_out_dim_unchanged_for_every_kind() {
        let layers: Vec<LayerIR> = vec![
            LayerIR::relu("l", vec![4]).unwrap(),
            LayerIR::sigmoid("l", vec![4]).unwrap(),
            LayerIR::tanh("l", vec![4]).unwrap(),
            LayerIR::elu("l", vec![4], 1.0).unwrap(),
            LayerIR::celu("l", vec![4], 1.0).unwrap(),
            LayerIR::leaky_relu("l", vec![4], 0.01).unwrap(),
            LayerIR::lrn("l", vec![2, 4], 2, 1e-4, 0.75, 1.0).unwrap(),
            LayerIR::dropout("l", vec![4], 0.5).unwrap(),
            LayerIR::softmax("l", vec![4], -1).unwrap(),
            LayerIR::fully_connected("l", vec![4], 3, None, true, None).unwrap(),
            LayerIR::batch_norm_1d(
                "l",
                vec![4],
                Array1::zeros(4),
                Array1::ones(4),
                None,
                None,
                1e-5,
                0.1,
                false,
                true,
            )
            .unwrap(),
            LayerIR::conv(
                "l",
                vec![1, 5, 5],
                2,
                vec![3, 3],
                vec![1, 1],
                vec![0, 0, 0, 0],
                vec![1, 1],
                1,
                None,
                None,
                false,
            )
            .unwrap(),
            LayerIR::average_pool("l", vec![1, 4, 4], vec![2, 2], vec![2, 2], vec![0, 0, 0, 0], false, true)
                .unwrap(),
            LayerIR::max_pool(
                "l",
                vec![1, 4, 4],
                vec![2, 2],
                vec![2, 2],
                vec![0, 0, 0, 0],
                vec![1, 1],
                false,
                false,
            )
            .unwrap(),
            LayerIR::unsqueeze("l", vec![3, 4], vec![0]).unwrap(),
            LayerIR::reshape("l", vec![2, 6], vec![3, 4], false).unwrap(),
            LayerIR::flatten("l", vec![2, 3, 4], 1).unwrap(),
            LayerIR::transpose("l", vec![2, 3], vec![1, 0]).unwrap(),
            LayerIR::concat("l", vec![2, 3], vec![2, 3], 0).unwrap(),
            LayerIR::sum("l", vec![2, 3], vec![2, 3]).unwrap(),
        ];

        for mut layer in layers {
            let kind = layer.kind_name();
            let in_dim = layer.in_dim().to_vec();
            let out_dim_before = layer.out_dim().to_vec();
            layer.update_input(in_dim).unwrap();
            assert_eq!(layer.out_dim(), out_dim_before.as_slice(), "kind `{kind}` changed out_dim on a no-op update_input");
        }
    }
}
