/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

//! Symbolic bound-propagation for neural network verification.
//!
//! The workspace is split the way its pieces are actually used:
//! [`netbounds_core`] holds the numerical primitives (tensors, linear
//! functions, hyper-rectangles, symbolic bounds), [`layers`] the
//! per-layer intermediate representation, [`conv`] the
//! convolution-to-affine reduction, [`bounds`] the propagation engine,
//! and [`property`] the input-property reader.

pub use netbounds_core::*;

pub mod layers {
    pub use netbounds_layers::*;
}

pub mod conv {
    pub use netbounds_conv::*;
}

pub mod bounds {
    pub use netbounds_bounds::*;
}

pub mod property {
    pub use netbounds_property::*;
}
