//! Heuristic parameter values
//!
//! A parameter point may carry symbolic values of the form
//! `"heuristic:Name(key=value, ...)"`. They are resolved per dataset before
//! the point is hashed and handed to the algorithm, e.g.
//! `"heuristic:DefaultFactorHeuristic(factor=1.5)"` scales the declared
//! default of the parameter by 1.5.

use std::fmt;
use std::path::Path;

use serde_json::{Number, Value};

use crate::algorithm::Algorithm;
use crate::dataset::Dataset;
use crate::params::Params;
use crate::{Error, Result};

const HEURISTIC_PREFIX: &str = "heuristic:";

/// Computes a concrete parameter value from the algorithm and dataset context.
pub trait ParameterHeuristic: fmt::Debug {
    /// Resolve the value of `param_name`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Heuristic` if the value cannot be derived.
    fn resolve(
        &self,
        algorithm: &Algorithm,
        dataset: &Dataset,
        dataset_path: &Path,
        param_name: &str,
    ) -> Result<Value>;
}

/// Scales the declared default value of the parameter.
///
/// A zero default is replaced by `zero_fb` first. Integral defaults stay
/// integral (the product is truncated).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultFactorHeuristic {
    factor: f64,
    zero_fb: f64,
}

impl DefaultFactorHeuristic {
    /// Create the heuristic.
    ///
    /// # Errors
    ///
    /// Returns `Error::Heuristic` if `zero_fb` is 0.
    pub fn new(factor: f64, zero_fb: f64) -> Result<Self> {
        if zero_fb == 0.0 {
            return Err(Error::Heuristic(
                "DefaultFactorHeuristic needs a non-zero zero_fb".to_string(),
            ));
        }
        Ok(Self { factor, zero_fb })
    }
}

impl Default for DefaultFactorHeuristic {
    fn default() -> Self {
        Self {
            factor: 1.0,
            zero_fb: 1.0,
        }
    }
}

impl ParameterHeuristic for DefaultFactorHeuristic {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn resolve(
        &self,
        algorithm: &Algorithm,
        _dataset: &Dataset,
        _dataset_path: &Path,
        param_name: &str,
    ) -> Result<Value> {
        let default = algorithm
            .params()
            .get(param_name)
            .and_then(|spec| spec.default_value.as_ref())
            .ok_or_else(|| {
                Error::Heuristic(format!(
                    "could not find the default value for parameter {param_name} of {}",
                    algorithm.name()
                ))
            })?;

        let not_numeric = || {
            Error::Heuristic(format!(
                "default value {default} of parameter {param_name} is not numeric"
            ))
        };

        if let Some(integer) = default.as_i64() {
            if integer != 0 {
                return Ok(Value::from((self.factor * integer as f64).trunc() as i64));
            }
        }
        let float = default.as_f64().ok_or_else(not_numeric)?;
        let base = if float == 0.0 { self.zero_fb } else { float };
        Number::from_f64(self.factor * base)
            .map(Value::Number)
            .ok_or_else(|| {
                Error::Heuristic(format!(
                    "heuristic value for parameter {param_name} is not finite"
                ))
            })
    }
}

/// Parse `"heuristic:Name(key=value, ...)"` into a heuristic.
///
/// # Errors
///
/// Returns `Error::Heuristic` for malformed expressions, unknown heuristics or
/// unknown arguments.
pub fn parse_heuristic(expression: &str) -> Result<Box<dyn ParameterHeuristic>> {
    let malformed = || Error::Heuristic(format!("malformed heuristic expression {expression:?}"));

    let body = expression
        .strip_prefix(HEURISTIC_PREFIX)
        .ok_or_else(malformed)?
        .trim();
    let (name, arguments) = match body.split_once('(') {
        Some((name, rest)) => (name.trim(), rest.strip_suffix(')').ok_or_else(malformed)?),
        None => (body, ""),
    };

    let mut parsed = Vec::new();
    for argument in arguments.split(',').map(str::trim).filter(|a| !a.is_empty()) {
        let (key, value) = argument.split_once('=').ok_or_else(malformed)?;
        let value: f64 = value.trim().parse().map_err(|_| malformed())?;
        parsed.push((key.trim(), value));
    }

    match name {
        "DefaultFactorHeuristic" => {
            let mut factor = 1.0;
            let mut zero_fb = 1.0;
            for (key, value) in parsed {
                match key {
                    "factor" => factor = value,
                    "zero_fb" => zero_fb = value,
                    other => {
                        return Err(Error::Heuristic(format!(
                            "DefaultFactorHeuristic has no argument {other:?}"
                        )))
                    }
                }
            }
            Ok(Box::new(DefaultFactorHeuristic::new(factor, zero_fb)?))
        }
        other => Err(Error::Heuristic(format!("unknown heuristic {other:?}"))),
    }
}

/// Whether `value` is a heuristic expression.
#[must_use]
pub fn is_heuristic(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|text| text.starts_with(HEURISTIC_PREFIX))
}

/// Replace every heuristic expression in `params` with its resolved value.
///
/// # Errors
///
/// Returns `Error::Heuristic` if any expression fails to parse or resolve.
pub fn inject_heuristic_values(
    params: &Params,
    algorithm: &Algorithm,
    dataset: &Dataset,
    dataset_path: &Path,
) -> Result<Params> {
    let mut resolved = params.clone();
    for (name, value) in &mut resolved {
        let Some(expression) = value
            .as_str()
            .filter(|text| text.starts_with(HEURISTIC_PREFIX))
        else {
            continue;
        };
        let concrete =
            parse_heuristic(expression)?.resolve(algorithm, dataset, dataset_path, name)?;
        tracing::trace!(param = %name, expression, resolved = %concrete, "resolved heuristic");
        *value = concrete;
    }
    Ok(resolved)
}
