/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

use netbounds_core::{Error, Result};

use crate::constraint::{LinearConstraint, Relation};

/// Parses a property written as one linear constraint per line, e.g.
///
/// ```text
/// X_0 <= 1.0
/// X_0 >= -1.0
/// 2.0 X_1 + -1.0 X_2 <= 3.0
/// Y_0 >= 0.0
/// ```
///
/// Blank lines and lines starting with `#` are skipped. Rows that mix in
/// an output variable (`Y_i`) are dropped entirely: a property converter
/// only cares about the input-side constraints that pin down a box.
pub fn parse_property_text(text: &str) -> Result<Vec<LinearConstraint>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| parse_line(line).transpose())
        .collect()
}

/// Returns `Ok(None)` for a syntactically valid row that references an
/// output variable, `Ok(Some(_))` for an input-side row, `Err` otherwise.
fn parse_line(line: &str) -> Result<Option<LinearConstraint>> {
    let (op_str, relation) = find_relation(line)
        .ok_or_else(|| Error::Property(format!("no relational operator in line `{line}`")))?;
    let (lhs, rhs) = line
        .split_once(op_str)
        .ok_or_else(|| Error::Property(format!("malformed line `{line}`")))?;

    let rhs: f32 = rhs
        .trim()
        .parse()
        .map_err(|_| Error::Property(format!("malformed constant in line `{line}`")))?;

    let mut coeffs = Vec::new();
    for term in split_terms(lhs) {
        match parse_term(&term, line)? {
            Term::Input(idx, coeff) => coeffs.push((idx, coeff)),
            Term::Output(_, _) => return Ok(None),
        }
    }

    Ok(Some(LinearConstraint { coeffs, relation, rhs }))
}

/// Finds the first relational operator in `line`, checking multi-char
/// operators before their single-char prefixes so `<=` isn't mistaken
/// for `<`.
fn find_relation(line: &str) -> Option<(&'static str, Relation)> {
    const OPERATORS: [(&str, Relation); 6] = [
        ("<=", Relation::Le),
        (">=", Relation::Ge),
        ("==", Relation::Eq),
        ("<", Relation::Lt),
        (">", Relation::Gt),
        ("=", Relation::Eq),
    ];
    OPERATORS
        .into_iter()
        .find(|(op, _)| line.contains(op))
}

/// Splits a left-hand side into `+`-separated terms, folding a leading
/// `-` into the term itself (`"2 X_0 - 3 X_1"` becomes `["2 X_0", "-3 X_1"]`).
fn split_terms(lhs: &str) -> Vec<String> {
    let lhs = lhs.replace('-', "+-");
    lhs.split('+')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}

enum Term {
    Input(usize, f32),
    Output(usize, f32),
}

/// Parses a single term such as `"X_0"`, `"-X_0"`, or `"2.0 X_0"`.
fn parse_term(term: &str, line: &str) -> Result<Term> {
    let variable_mentions = term.matches("X_").count() + term.matches("Y_").count();
    if term.contains('^') || variable_mentions > 1 {
        return Err(Error::Property(format!(
            "nonlinear term `{term}` in line `{line}`"
        )));
    }
    // Fold a standalone leading sign ("- 1.0 X_0") into the coefficient
    // ("-1.0 X_0") so the token count below stays at one or two.
    let term = if let Some(rest) = term.strip_prefix('-') {
        format!("-{}", rest.trim_start())
    } else if let Some(rest) = term.strip_prefix('+') {
        rest.trim_start().to_string()
    } else {
        term.to_string()
    };
    let term = term.replace('*', " ");
    let tokens: Vec<&str> = term.split_whitespace().collect();

    let (coeff_str, var_str) = match tokens.as_slice() {
        [var] => ("1", *var),
        [coeff, var] => (*coeff, *var),
        _ => return Err(Error::Property(format!("malformed term `{term}` in line `{line}`"))),
    };

    let (sign, var_str) = if let Some(rest) = var_str.strip_prefix('-') {
        (-1.0, rest)
    } else {
        (1.0, var_str)
    };
    let coeff: f32 = if coeff_str == "-" {
        -1.0
    } else {
        coeff_str
            .parse::<f32>()
            .map_err(|_| Error::Property(format!("malformed coefficient `{coeff_str}` in line `{line}`")))?
    };
    let coeff = coeff * sign;

    if let Some(idx_str) = var_str.strip_prefix("X_") {
        let idx: usize = idx_str
            .parse()
            .map_err(|_| Error::Property(format!("malformed variable `{var_str}` in line `{line}`")))?;
        Ok(Term::Input(idx, coeff))
    } else if let Some(idx_str) = var_str.strip_prefix("Y_") {
        let idx: usize = idx_str
            .parse()
            .map_err(|_| Error::Property(format!("malformed variable `{var_str}` in line `{line}`")))?;
        Ok(Term::Output(idx, coeff))
    } else {
        Err(Error::Property(format!(
            "unrecognized variable `{var_str}` in line `{line}` (expected `X_i` or `Y_i`)"
        )))
    }
}
