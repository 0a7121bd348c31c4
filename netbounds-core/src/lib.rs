/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

//! Core numeric and algebraic types shared by every `netbounds` crate:
//! the tensor alias, linear-function and hyper-rectangle primitives, the
//! symbolic linear bound algebra, and the workspace's error type.

pub mod error;
pub mod hyper_rect;
pub mod linear_functions;
pub mod symbolic;
pub mod tensor;

pub use error::{Error, Result};
pub use hyper_rect::HyperRectBounds;
pub use linear_functions::{negative_part, positive_part, LinearFunctions};
pub use symbolic::SymbolicLinearBounds;
pub use tensor::Tensor;
