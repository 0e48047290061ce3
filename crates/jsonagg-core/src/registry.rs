//! Named aggregation functions and the registry that resolves them
//!
//! A [`Registry`] is a plain owned value mapping function names to
//! implementations. Callers start from [`Registry::builtin`], may extend or
//! override entries by name, and resolve a list of names into a validated
//! [`FunctionSet`] before aggregating. Resolution fails fast on unknown
//! names; later changes to a registry never affect already-resolved sets.

use crate::error::{Error, Result};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

/// An aggregation function: a pure reduction from a list of collected
/// values to a single output value
pub type AggFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Registry of aggregation functions, keyed by name
#[derive(Clone)]
pub struct Registry {
    fns: BTreeMap<String, AggFn>,
}

impl Registry {
    /// Create a registry holding the built-in functions:
    /// `count`, `sum`, `list`, `mean`, `median`, `mode`, `std`, `var`,
    /// `min`, `max`
    pub fn builtin() -> Self {
        let mut registry = Self {
            fns: BTreeMap::new(),
        };
        registry.register("count", |values| Ok(Value::from(values.len())));
        registry.register("sum", sum);
        registry.register("list", |values| Ok(Value::Array(values.to_vec())));
        registry.register("mean", mean);
        registry.register("median", median);
        registry.register("mode", mode);
        registry.register("std", std_dev);
        registry.register("var", variance);
        registry.register("min", |values| extremum("min", values, Ordering::Less));
        registry.register("max", |values| extremum("max", values, Ordering::Greater));
        registry
    }

    /// Create an empty registry
    pub fn empty() -> Self {
        Self {
            fns: BTreeMap::new(),
        }
    }

    /// Add a function, replacing any existing function with the same name
    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.fns.insert(name.into(), Arc::new(f));
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&AggFn> {
        self.fns.get(name)
    }

    /// All registered function names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.fns.keys().map(String::as_str).collect()
    }

    /// Resolve a list of names into a validated [`FunctionSet`]
    ///
    /// Fails with [`Error::UnknownFunction`] on the first name not present
    /// in the registry.
    pub fn function_set<I, S>(&self, names: I) -> Result<FunctionSet>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fns = BTreeMap::new();
        for name in names {
            let name = name.as_ref();
            let f = self.get(name).ok_or_else(|| Error::UnknownFunction {
                name: name.to_string(),
            })?;
            fns.insert(name.to_string(), Arc::clone(f));
        }
        Ok(FunctionSet { fns })
    }
}

/// A resolved set of aggregation functions applied to one key's values
#[derive(Clone, Default)]
pub struct FunctionSet {
    fns: BTreeMap<String, AggFn>,
}

impl FunctionSet {
    /// Check whether the set holds no functions
    pub fn is_empty(&self) -> bool {
        self.fns.is_empty()
    }

    /// Names of the functions in this set, sorted
    pub fn names(&self) -> Vec<&str> {
        self.fns.keys().map(String::as_str).collect()
    }

    /// Apply every function to the given values, keyed by function name
    pub fn apply(&self, values: &[Value]) -> Result<BTreeMap<String, Value>> {
        self.fns
            .iter()
            .map(|(name, f)| Ok((name.clone(), f(values)?)))
            .collect()
    }
}

impl std::fmt::Debug for FunctionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionSet")
            .field("names", &self.names())
            .finish()
    }
}

fn apply_error(function: &str, message: impl Into<String>) -> Error {
    Error::FunctionApplication {
        function: function.to_string(),
        message: message.into(),
    }
}

/// Require every value to be a JSON number, extracted as f64
fn numbers(function: &str, values: &[Value]) -> Result<Vec<f64>> {
    if values.is_empty() {
        return Err(apply_error(function, "empty value list"));
    }
    values
        .iter()
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| apply_error(function, format!("non-numeric value {v}")))
        })
        .collect()
}

/// Emit a numeric result, as a JSON integer when exactly integral
fn number(function: &str, x: f64) -> Result<Value> {
    if x.fract() == 0.0 && x >= i64::MIN as f64 && x <= i64::MAX as f64 {
        return Ok(Value::from(x as i64));
    }
    serde_json::Number::from_f64(x)
        .map(Value::Number)
        .ok_or_else(|| apply_error(function, "non-finite result"))
}

fn sum(values: &[Value]) -> Result<Value> {
    if values.is_empty() {
        return Err(apply_error("sum", "empty value list"));
    }
    // Stay in integer arithmetic when every input is i64-representable
    if let Some(ints) = values.iter().map(Value::as_i64).collect::<Option<Vec<i64>>>() {
        if let Some(total) = ints.into_iter().try_fold(0i64, |acc, x| acc.checked_add(x)) {
            return Ok(Value::from(total));
        }
    }
    let nums = numbers("sum", values)?;
    number("sum", nums.iter().sum())
}

fn mean(values: &[Value]) -> Result<Value> {
    let nums = numbers("mean", values)?;
    number("mean", nums.iter().sum::<f64>() / nums.len() as f64)
}

fn median(values: &[Value]) -> Result<Value> {
    let mut nums = numbers("median", values)?;
    nums.sort_by(f64::total_cmp);
    let mid = nums.len() / 2;
    let m = if nums.len() % 2 == 1 {
        nums[mid]
    } else {
        (nums[mid - 1] + nums[mid]) / 2.0
    };
    number("median", m)
}

/// Most frequent value; ties resolve to the first value encountered.
/// Unlike the numeric functions, works on values of any type.
fn mode(values: &[Value]) -> Result<Value> {
    if values.is_empty() {
        return Err(apply_error("mode", "empty value list"));
    }
    let mut counts: Vec<(&Value, usize)> = Vec::new();
    for v in values {
        match counts.iter_mut().find(|(seen, _)| *seen == v) {
            Some((_, n)) => *n += 1,
            None => counts.push((v, 1)),
        }
    }
    let mut best = &counts[0];
    for entry in &counts[1..] {
        if entry.1 > best.1 {
            best = entry;
        }
    }
    Ok(best.0.clone())
}

fn population_variance(function: &str, values: &[Value]) -> Result<f64> {
    let nums = numbers(function, values)?;
    let mean = nums.iter().sum::<f64>() / nums.len() as f64;
    Ok(nums.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / nums.len() as f64)
}

fn variance(values: &[Value]) -> Result<Value> {
    number("var", population_variance("var", values)?)
}

fn std_dev(values: &[Value]) -> Result<Value> {
    number("std", population_variance("std", values)?.sqrt())
}

/// Compare values numerically, returning the original extremal value
fn extremum(function: &str, values: &[Value], want: Ordering) -> Result<Value> {
    let nums = numbers(function, values)?;
    let mut best = 0;
    for (i, x) in nums.iter().enumerate().skip(1) {
        if x.total_cmp(&nums[best]) == want {
            best = i;
        }
    }
    Ok(values[best].clone())
}
