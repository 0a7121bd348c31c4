/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

/// Tunables for `compute_bounds` that aren't properties of the network or
/// the input box itself.
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundsConfig {
    /// Concrete bounds whose magnitude exceeds this are treated as the
    /// fatal numerical error, in addition to actual NaN/Inf. Defaults to
    /// `f32::INFINITY`, i.e. only NaN/Inf itself is fatal.
    pub nan_inf_tolerance: f32,

    /// Whether a pooling layer with no propagator (currently `MaxPool`) is
    /// a hard `UnsupportedLayer` error (the default) or a logged
    /// pass-through that forwards the previous symbolic bound unchanged.
    pub pooling_hard_error: bool,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            nan_inf_tolerance: f32::INFINITY,
            pooling_hard_error: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_strict() {
        let config = BoundsConfig::default();
        assert_eq!(config.nan_inf_tolerance, f32::INFINITY);
        assert!(config.pooling_hard_error);
    }
}
