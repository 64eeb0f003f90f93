//! Strategy parameter values and parameter sets.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EvaluationError;

/// Parameter value that can be numeric, boolean or categorical.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Integer parameter.
    Int(i64),
    /// Floating point parameter.
    Float(f64),
    /// Boolean parameter.
    Bool(bool),
    /// Categorical parameter.
    String(String),
}

impl ParamValue {
    /// Get as integer if applicable. Floats are accepted only when integral.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }

    /// Get as float if applicable.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as boolean if applicable.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as string slice if categorical.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Whether the value is numeric.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    /// Value kind; integers and floats share "number".
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) | Self::Float(_) => "number",
            Self::Bool(_) => "bool",
            Self::String(_) => "string",
        }
    }
}

// Floats compare by bit pattern so that a ParameterSet can key a cache.
impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ParamValue {}

impl Hash for ParamValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Int(v) => v.hash(state),
            Self::Float(v) => v.to_bits().hash(state),
            Self::Bool(v) => v.hash(state),
            Self::String(v) => v.hash(state),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// One concrete assignment of values to all tunable parameters.
///
/// Immutable once built. Names keep their insertion (grid declaration)
/// order for display and serialization; equality and hashing cover the
/// mapping only. A repeated name keeps its first position and last value.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    values: Vec<(String, ParamValue)>,
}

impl ParameterSet {
    /// An empty parameter set (strategy defaults).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    fn insert(&mut self, name: String, value: ParamValue) {
        match self.values.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    fn sorted(&self) -> Vec<&(String, ParamValue)> {
        let mut pairs: Vec<_> = self.values.iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }

    /// Look up a value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Required integer parameter.
    pub fn int(&self, name: &str) -> Result<i64, EvaluationError> {
        match self.get(name) {
            Some(value) => value.as_int().ok_or_else(|| {
                EvaluationError::invalid_parameter(name, format!("expected integer, got {value}"))
            }),
            None => Err(EvaluationError::invalid_parameter(name, "missing")),
        }
    }

    /// Optional integer parameter with a default.
    pub fn int_or(&self, name: &str, default: i64) -> Result<i64, EvaluationError> {
        if self.contains(name) {
            self.int(name)
        } else {
            Ok(default)
        }
    }

    /// Required positive integer parameter, as `usize`.
    pub fn period(&self, name: &str) -> Result<usize, EvaluationError> {
        let value = self.int(name)?;
        if value <= 0 {
            return Err(EvaluationError::invalid_parameter(
                name,
                format!("must be positive, got {value}"),
            ));
        }
        usize::try_from(value)
            .map_err(|_| EvaluationError::invalid_parameter(name, "out of range"))
    }

    /// Required numeric parameter.
    pub fn float(&self, name: &str) -> Result<f64, EvaluationError> {
        match self.get(name) {
            Some(value) => value.as_float().ok_or_else(|| {
                EvaluationError::invalid_parameter(name, format!("expected number, got {value}"))
            }),
            None => Err(EvaluationError::invalid_parameter(name, "missing")),
        }
    }

    /// Optional numeric parameter with a default.
    pub fn float_or(&self, name: &str, default: f64) -> Result<f64, EvaluationError> {
        if self.contains(name) {
            self.float(name)
        } else {
            Ok(default)
        }
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PartialEq for ParameterSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.values.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Eq for ParameterSet {}

impl Hash for ParameterSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for (name, value) in self.sorted() {
            name.hash(state);
            value.hash(state);
        }
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::default();
        for (k, v) in iter {
            set.insert(k.into(), v.into());
        }
        set
    }
}

impl Serialize for ParameterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct ParameterSetVisitor;

impl<'de> Visitor<'de> for ParameterSetVisitor {
    type Value = ParameterSet;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of parameter names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut set = ParameterSet::default();
        while let Some((name, value)) = access.next_entry::<String, ParamValue>()? {
            set.insert(name, value);
        }
        Ok(set)
    }
}

impl<'de> Deserialize<'de> for ParameterSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ParameterSetVisitor)
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.values.is_empty() {
            return f.write_str("(defaults)");
        }
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_param_value_conversions() {
        let int_val = ParamValue::Int(42);
        assert_eq!(int_val.as_int(), Some(42));
        assert_eq!(int_val.as_float(), Some(42.0));
        assert_eq!(int_val.to_string(), "42");

        let float_val = ParamValue::Float(2.5);
        assert_eq!(float_val.as_int(), None);
        assert_eq!(ParamValue::Float(3.0).as_int(), Some(3));
        assert_eq!(float_val.as_float(), Some(2.5));

        let string_val = ParamValue::from("ema");
        assert_eq!(string_val.as_int(), None);
        assert_eq!(string_val.as_str(), Some("ema"));
    }

    #[test]
    fn test_untagged_deserialization_prefers_int() {
        let Ok(values) = serde_json::from_str::<Vec<ParamValue>>(r#"[10, 2.5, true, "sma"]"#)
        else {
            panic!("mixed values should deserialize");
        };
        assert_eq!(
            values,
            vec![
                ParamValue::Int(10),
                ParamValue::Float(2.5),
                ParamValue::Bool(true),
                ParamValue::String("sma".to_string()),
            ]
        );
    }

    #[test]
    fn test_parameter_set_equality_ignores_insertion_order() {
        let a: ParameterSet = [("fast", 10), ("slow", 50)].into_iter().collect();
        let b: ParameterSet = [("slow", 50), ("fast", 10)].into_iter().collect();
        assert_eq!(a, b);

        let mut cache = HashMap::new();
        cache.insert(a, 1.5);
        assert_eq!(cache.get(&b), Some(&1.5));
    }

    #[test]
    fn test_parameter_set_float_keys() {
        let a: ParameterSet = [("std_dev", 2.0)].into_iter().collect();
        let b: ParameterSet = [("std_dev", 2.0)].into_iter().collect();
        let c: ParameterSet = [("std_dev", 2.5)].into_iter().collect();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_typed_accessors() {
        let params: ParameterSet = [
            ("period", ParamValue::Int(14)),
            ("std_dev", ParamValue::Float(2.0)),
            ("mode", ParamValue::from("fast")),
        ]
        .into_iter()
        .collect();

        assert_eq!(params.int("period"), Ok(14));
        assert_eq!(params.period("period"), Ok(14));
        assert_eq!(params.float("std_dev"), Ok(2.0));
        assert_eq!(params.int_or("missing", 7), Ok(7));
        assert!(matches!(
            params.int("mode"),
            Err(EvaluationError::InvalidParameter { .. })
        ));
        assert!(matches!(
            params.float("missing"),
            Err(EvaluationError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_period_rejects_non_positive() {
        let params: ParameterSet = [("period", 0)].into_iter().collect();
        assert!(params.period("period").is_err());
    }

    #[test]
    fn test_display() {
        let params: ParameterSet = [("slow_period", 100), ("fast_period", 20)]
            .into_iter()
            .collect();
        assert_eq!(params.to_string(), "slow_period=100, fast_period=20");
        assert_eq!(ParameterSet::empty().to_string(), "(defaults)");
    }

    #[test]
    fn test_insertion_order_survives_serialization() {
        let params: ParameterSet = [("period", 14), ("oversold", 30), ("overbought", 70)]
            .into_iter()
            .collect();
        let names: Vec<&str> = params.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["period", "oversold", "overbought"]);

        let Ok(json) = serde_json::to_string(&params) else {
            panic!("parameter set should serialize");
        };
        assert_eq!(json, r#"{"period":14,"oversold":30,"overbought":70}"#);

        let Ok(back) = serde_json::from_str::<ParameterSet>(&json) else {
            panic!("parameter set should deserialize");
        };
        assert_eq!(back.to_string(), "period=14, oversold=30, overbought=70");
    }

    #[test]
    fn test_repeated_name_keeps_last_value() {
        let params: ParameterSet = [("fast", 10), ("slow", 50), ("fast", 20)].into_iter().collect();
        assert_eq!(params.len(), 2);
        assert_eq!(params.to_string(), "fast=20, slow=50");
    }
}
