/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

use itertools::Itertools;
use ndarray::Array1;
use netbounds_core::{Error, HyperRectBounds, Result};

/// Comparison operator of a single row of a linear constraint system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    Le,
    Lt,
    Ge,
    Gt,
    Eq,
}

/// One row of `A*x <= c` (or any of the other four relations), expressed
/// sparsely over input variables `X_0, X_1, ...`.
///
/// `coeffs` only ever references input-side variables: the parser drops
/// rows that mix in output variables, since a `PropertyConverter` builds
/// an input box, not a verification goal.
#[derive(Clone, Debug)]
pub struct LinearConstraint {
    pub coeffs: Vec<(usize, f32)>,
    pub relation: Relation,
    pub rhs: f32,
}

impl LinearConstraint {
    /// Returns the lone `(variable, coefficient)` pair if this row touches
    /// exactly one variable, `None` otherwise.
    fn single_variable(&self) -> Option<(usize, f32)> {
        match self.coeffs.as_slice() {
            [(idx, coeff)] if *coeff != 0.0 => Some((*idx, *coeff)),
            _ => None,
        }
    }
}

/// Reduces a linear constraint system to an axis-aligned input box.
///
/// Rows with more than one nonzero coefficient don't pin down a single
/// axis and are ignored here (they still constrain the property as a
/// whole, just not this box). Among rows that do pin down an axis, the
/// tightest bound wins. A variable left without both a lower and an
/// upper contribution is reported as unbounded.
pub fn to_input_box(constraints: &[LinearConstraint]) -> Result<HyperRectBounds> {
    let num_vars = constraints
        .iter()
        .flat_map(|c| c.coeffs.iter().map(|(idx, _)| *idx))
        .max()
        .map_or(0, |max_idx| max_idx + 1);

    if num_vars == 0 {
        return Err(Error::Property(
            "constraint system does not reference any input variable".to_string(),
        ));
    }

    let mut lower: Vec<Option<f32>> = vec![None; num_vars];
    let mut upper: Vec<Option<f32>> = vec![None; num_vars];

    let by_variable = constraints
        .iter()
        .filter_map(|c| {
            c.single_variable()
                .map(|(idx, coeff)| (idx, (coeff, c.relation, c.rhs)))
        })
        .into_group_map();

    for (idx, rows) in by_variable {
        for (coeff, relation, rhs) in rows {
            let bound = rhs / coeff;
            let negative = coeff < 0.0;
            let (tightens_upper, tightens_lower) = match relation {
                Relation::Le | Relation::Lt => (!negative, negative),
                Relation::Ge | Relation::Gt => (negative, !negative),
                Relation::Eq => (true, true),
            };
            if tightens_upper {
                upper[idx] = Some(upper[idx].map_or(bound, |u: f32| u.min(bound)));
            }
            if tightens_lower {
                lower[idx] = Some(lower[idx].map_or(bound, |l: f32| l.max(bound)));
            }
        }
    }

    let mut lower_out = Array1::zeros(num_vars);
    let mut upper_out = Array1::zeros(num_vars);
    for idx in 0..num_vars {
        let l = lower[idx].ok_or_else(|| {
            Error::Property(format!("input variable X_{idx} has no lower bound"))
        })?;
        let u = upper[idx].ok_or_else(|| {
            Error::Property(format!("input variable X_{idx} has no upper bound"))
        })?;
        if l > u {
            return Err(Error::Property(format!(
                "input variable X_{idx} has a lower bound ({l}) above its upper bound ({u})"
            )));
        }
        lower_out[idx] = l;
        upper_out[idx] = u;
    }

    Ok(HyperRectBounds::new(lower_out, upper_out))
}
