/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

//! Propagates symbolic linear bounds through a network's layers: the affine
//! and ReLU transformers, and the `BoundsManager` walk that ties them
//! together into a full `compute_bounds` pass.

pub mod affine;
pub mod config;
pub mod manager;
pub mod relu;

pub use affine::affine_transform;
pub use config::BoundsConfig;
pub use manager::{compute_bounds, compute_bounds_with_config, BoundsReport};
pub use relu::relu_transform;
