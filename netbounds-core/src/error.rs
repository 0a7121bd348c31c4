/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

use thiserror::Error;

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The four error kinds a verification core can raise: a malformed layer,
/// a layer kind the propagator has no transformer for, a malformed
/// property, or a NaN/Inf produced during propagation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A layer construction parameter violates its shape invariant.
    #[error("layer `{layer}`: invalid `{parameter}` (expected {expected}, got {actual})")]
    Shape {
        layer: String,
        parameter: String,
        expected: String,
        actual: String,
    },

    /// The propagator has no symbolic transformer for this layer kind.
    #[error("layer `{layer}` ({kind}) is unsupported for bound propagation")]
    UnsupportedLayer { layer: String, kind: String },

    /// The property's input-side constraints could not be turned into a box.
    #[error("property error: {0}")]
    Property(String),

    /// Propagation produced a NaN or Inf value.
    #[error("layer `{layer}` produced a NaN or Inf value during bound propagation")]
    Numerical { layer: String },
}
