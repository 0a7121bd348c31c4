/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

use netbounds_core::Result;

use crate::layer::LayerIR;
use crate::shape::shape_error;

/// An ordered, validated list of layers: every layer's `in_dim` matches
/// the previous layer's `out_dim`, and every identifier is unique.
///
/// The network owns its layers in list (topological) order and exposes
/// `first`/`next`/`last` traversal over them.
#[derive(Clone, Debug, PartialEq)]
pub struct Network {
    layers: Vec<LayerIR>,
}

impl Network {
    pub fn new(layers: Vec<LayerIR>) -> Result<Self> {
        let mut seen_ids = std::collections::HashSet::with_capacity(layers.len());
        for layer in &layers {
            if !seen_ids.insert(layer.id()) {
                return Err(shape_error(layer.id(), "id", "unique", layer.id()));
            }
        }
        for pair in layers.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.out_dim() != next.in_dim() {
                return Err(shape_error(
                    next.id(),
                    "in_dim",
                    format!("{:?} (out_dim of `{}`)", prev.out_dim(), prev.id()),
                    format!("{:?}", next.in_dim()),
                ));
            }
        }
        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[LayerIR] {
        &self.layers
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LayerIR> {
        self.layers.iter()
    }

    pub fn first(&self) -> Option<&LayerIR> {
        self.layers.first()
    }

    pub fn last(&self) -> Option<&LayerIR> {
        self.layers.last()
    }

    /// The layer immediately after the one identified by `id`, if any.
    pub fn next(&self, id: &str) -> Option<&LayerIR> {
        let idx = self.layers.iter().position(|l| l.id() == id)?;
        self.layers.get(idx + 1)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl<'a> IntoIterator for &'a Network {
    type Item = &'a LayerIR;
    type IntoIter = std::slice::Iter<'a, LayerIR>;

    fn into_iter(self) -> Self::IntoIter {
        self.layers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_chain_whose_shapes_line_up() {
        let fc = LayerIR::fully_connected("fc0", vec![4], 3, None, false, None).unwrap();
        let relu = LayerIR::relu("relu0", vec![3]).unwrap();
        let net = Network::new(vec![fc, relu]).unwrap();
        assert_eq!(net.len(), 2);
        assert_eq!(net.first().unwrap().id(), "fc0");
        assert_eq!(net.last().unwrap().id(), "relu0");
        assert_eq!(net.next("fc0").unwrap().id(), "relu0");
        assert!(net.next("relu0").is_none());
    }

    #[test]
    fn rejects_a_shape_mismatch_between_consecutive_layers() {
        let fc = LayerIR::fully_connected("fc0", vec![4], 3, None, false, None).unwrap();
        let relu = LayerIR::relu("relu0", vec![5]).unwrap();
        assert!(Network::new(vec![fc, relu]).is_err());
    }

    #[test]
    fn rejects_duplicate_identifiers() {
        let fc0 = LayerIR::fully_connected("fc0", vec![4], 3, None, false, None).unwrap();
        let fc1 = LayerIR::fully_connected("fc0", vec![3], 2, None, false, None).unwrap();
        assert!(Network::new(vec![fc0, fc1]).is_err());
    }

    #[test]
    fn empty_network_is_valid_and_has_no_first_or_last() {
        let net = Network::new(vec![]).unwrap();
        assert!(net.is_empty());
        assert!(net.first().is_none());
        assert!(net.last().is_none());
    }
}
