/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

//! The tagged `LayerIR` layer representation: shape arithmetic and parameter
//! invariants for every layer kind a verified network can contain.

pub mod init;
pub mod layer;
pub mod network;
pub mod shape;

pub use layer::LayerIR;
pub use network::Network;
