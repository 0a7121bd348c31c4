/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

//! Turns a property's input-side linear constraints into the
//! [`HyperRectBounds`](netbounds_core::HyperRectBounds) a `BoundsManager`
//! propagates through a network.

mod constraint;
mod parser;

pub use constraint::{to_input_box, LinearConstraint, Relation};
pub use parser::parse_property_text;

use netbounds_core::{HyperRectBounds, Result};

/// Parses a property's source text and reduces it to an input box in a
/// single call.
pub fn input_box_from_text(text: &str) -> Result<HyperRectBounds> {
    let constraints = parse_property_text(text)?;
    to_input_box(&constraints)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_to_end_property_text_becomes_a_box() {
        let text = "\
            X_0 <= 1.0\n\
            X_0 >= -1.0\n\
            X_1 <= 2.0\n\
            X_1 >= 0.5\n\
            Y_0 >= 0.0\n\
        ";
        let box_ = input_box_from_text(text).unwrap();
        assert_eq!(box_.get_lower().to_vec(), vec![-1.0, 0.5]);
        assert_eq!(box_.get_upper().to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn end_to_end_unbounded_variable_surfaces_as_an_error() {
        let text = "X_0 <= 1.0\n";
        assert!(input_box_from_text(text).is_err());
    }
}
