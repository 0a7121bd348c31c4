/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

use netbounds_core::Error;

/// Resolves a possibly-negative axis (`-r..r`) against a rank `r`, erroring
/// with a `Shape` error naming `layer`/`parameter` if out of range.
pub fn normalize_axis(
    axis: isize,
    rank: usize,
    layer: &str,
    parameter: &str,
) -> Result<usize, Error> {
    let r = rank as isize;
    let normalized = if axis < 0 { axis + r } else { axis };
    if normalized < 0 || normalized >= r {
        let err = Error::Shape {
            layer: layer.to_string(),
            parameter: parameter.to_string(),
            expected: format!("axis in [{}, {})", -r, r),
            actual: axis.to_string(),
        };
        log::warn!("layer `{}`: {}", layer, err);
        return Err(err);
    }
    Ok(normalized as usize)
}

/// The product of a shape's dimensions (the empty shape has size 1).
pub fn product(dims: &[usize]) -> usize {
    dims.iter().product()
}

pub(crate) fn shape_error(
    layer: &str,
    parameter: &str,
    expected: impl std::fmt::Display,
    actual: impl std::fmt::Display,
) -> Error {
    let err = Error::Shape {
        layer: layer.to_string(),
        parameter: parameter.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    };
    log::warn!("layer `{}`: {}", layer, err);
    err
}

/// Output spatial sizes for Conv/AveragePool/MaxPool: `⌊(in[i] + pad_begin +
/// pad_end − dilation·(kernel−1) − 1) / stride⌋ + 1`, with `ceil` replacing
/// `floor` when `ceil_mode` is set.
pub fn windowed_output_spatial(
    in_dim: &[usize],
    kernel: &[usize],
    stride: &[usize],
    padding: &[usize],
    dilation: &[usize],
    ceil_mode: bool,
) -> Vec<usize> {
    let nspatial = kernel.len();
    (0..nspatial)
        .map(|i| {
            let numerator = in_dim[i + 1] as f64 + padding[i] as f64 + padding[i + nspatial] as f64
                - dilation[i] as f64 * (kernel[i] as f64 - 1.0)
                - 1.0;
            let quotient = numerator / stride[i] as f64;
            let q = if ceil_mode { quotient.ceil() } else { quotient.floor() };
            (q as isize + 1) as usize
        })
        .collect()
}
