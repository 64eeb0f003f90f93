//! Parameter grid for grid search optimization.
//!
//! A grid maps each tunable parameter to an ordered, non-empty list of
//! candidate values. [`ParameterGrid::expand`] walks the Cartesian product
//! lazily in lexicographic order: the first declared parameter varies
//! slowest, the last fastest. The position of a set in that walk is its
//! *grid index*, used as the final tie-break during ranking.

use std::collections::HashSet;
use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};

use crate::domain::{ParamValue, ParameterSet};
use crate::error::OptimizerError;

/// One tunable parameter and its candidate values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridParameter {
    /// Parameter name.
    pub name: String,
    /// Candidate values, in enumeration order.
    pub values: Vec<ParamValue>,
}

impl GridParameter {
    /// Create a grid parameter.
    pub fn new(name: impl Into<String>, values: Vec<ParamValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Validated parameter grid. Declaration order is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<GridParameter>", into = "Vec<GridParameter>")]
pub struct ParameterGrid {
    parameters: Vec<GridParameter>,
    total: usize,
}

impl ParameterGrid {
    /// Validate and build a grid.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::Configuration`] if a parameter has no
    /// candidate values, mixes value kinds (integers and floats may mix), a
    /// name is empty or declared twice, or the number of combinations
    /// overflows `usize`.
    pub fn new(parameters: Vec<GridParameter>) -> Result<Self, OptimizerError> {
        let mut seen = HashSet::with_capacity(parameters.len());
        let mut total: usize = 1;

        for param in &parameters {
            if param.name.trim().is_empty() {
                return Err(OptimizerError::configuration(
                    "grid parameter name must not be empty",
                ));
            }
            if !seen.insert(param.name.as_str()) {
                return Err(OptimizerError::configuration(format!(
                    "grid parameter '{}' is declared more than once",
                    param.name
                )));
            }
            if param.values.is_empty() {
                return Err(OptimizerError::configuration(format!(
                    "grid parameter '{}' has no candidate values",
                    param.name
                )));
            }
            let kind = param.values[0].kind();
            if let Some(odd) = param.values.iter().find(|v| v.kind() != kind) {
                return Err(OptimizerError::configuration(format!(
                    "grid parameter '{}' mixes {kind} and {} values ({odd})",
                    param.name,
                    odd.kind()
                )));
            }
            total = total.checked_mul(param.values.len()).ok_or_else(|| {
                OptimizerError::configuration("parameter grid has too many combinations")
            })?;
        }

        Ok(Self { parameters, total })
    }

    /// Create a new parameter grid builder.
    #[must_use]
    pub fn builder() -> ParameterGridBuilder {
        ParameterGridBuilder::new()
    }

    /// Grid with no parameters: a single run with strategy defaults.
    #[must_use]
    pub const fn defaults_only() -> Self {
        Self {
            parameters: Vec::new(),
            total: 1,
        }
    }

    /// Number of parameter sets [`expand`](Self::expand) yields.
    #[must_use]
    pub const fn total_combinations(&self) -> usize {
        self.total
    }

    /// Declared parameters, in order.
    #[must_use]
    pub fn parameters(&self) -> &[GridParameter] {
        &self.parameters
    }

    /// Parameter names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }

    /// Candidate values of one parameter.
    #[must_use]
    pub fn values(&self, name: &str) -> Option<&[ParamValue]> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.values.as_slice())
    }

    /// Lazily enumerate every parameter set. Restartable: each call starts over.
    #[must_use]
    pub fn expand(&self) -> Combinations<'_> {
        Combinations {
            parameters: &self.parameters,
            cursor: vec![0; self.parameters.len()],
            remaining: self.total,
        }
    }
}

impl TryFrom<Vec<GridParameter>> for ParameterGrid {
    type Error = OptimizerError;

    fn try_from(parameters: Vec<GridParameter>) -> Result<Self, Self::Error> {
        Self::new(parameters)
    }
}

impl From<ParameterGrid> for Vec<GridParameter> {
    fn from(grid: ParameterGrid) -> Self {
        grid.parameters
    }
}

impl<'a> IntoIterator for &'a ParameterGrid {
    type Item = ParameterSet;
    type IntoIter = Combinations<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.expand()
    }
}

/// Lazy Cartesian product over a [`ParameterGrid`].
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    parameters: &'a [GridParameter],
    cursor: Vec<usize>,
    remaining: usize,
}

impl Iterator for Combinations<'_> {
    type Item = ParameterSet;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let set: ParameterSet = self
            .parameters
            .iter()
            .zip(&self.cursor)
            .map(|(param, &i)| (param.name.clone(), param.values[i].clone()))
            .collect();

        self.remaining -= 1;
        // Odometer: advance the last parameter, carry leftwards.
        for (slot, param) in self.cursor.iter_mut().zip(self.parameters).rev() {
            *slot += 1;
            if *slot < param.values.len() {
                break;
            }
            *slot = 0;
        }

        Some(set)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Combinations<'_> {}

impl FusedIterator for Combinations<'_> {}

/// Builder for parameter grids.
#[derive(Debug, Default)]
pub struct ParameterGridBuilder {
    parameters: Vec<GridParameter>,
    error: Option<OptimizerError>,
}

impl ParameterGridBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add parameter values of any type.
    #[must_use]
    pub fn values(mut self, name: &str, values: Vec<ParamValue>) -> Self {
        self.parameters.push(GridParameter::new(name, values));
        self
    }

    /// Add integer parameter values.
    #[must_use]
    pub fn int(self, name: &str, values: impl IntoIterator<Item = i64>) -> Self {
        self.values(name, values.into_iter().map(ParamValue::Int).collect())
    }

    /// Add float parameter values.
    #[must_use]
    pub fn float(self, name: &str, values: impl IntoIterator<Item = f64>) -> Self {
        self.values(name, values.into_iter().map(ParamValue::Float).collect())
    }

    /// Add categorical parameter values.
    #[must_use]
    pub fn string<'v>(self, name: &str, values: impl IntoIterator<Item = &'v str>) -> Self {
        self.values(name, values.into_iter().map(ParamValue::from).collect())
    }

    /// Add boolean parameter values.
    #[must_use]
    pub fn bool(self, name: &str, values: impl IntoIterator<Item = bool>) -> Self {
        self.values(name, values.into_iter().map(ParamValue::Bool).collect())
    }

    /// Add an inclusive integer range.
    #[must_use]
    pub fn int_range(mut self, name: &str, start: i64, end: i64, step: i64) -> Self {
        if step <= 0 {
            self.error.get_or_insert_with(|| {
                OptimizerError::configuration(format!(
                    "grid parameter '{name}' range step must be positive, got {step}"
                ))
            });
            return self;
        }
        let values = (start..=end).step_by(step.unsigned_abs() as usize);
        self.int(name, values)
    }

    /// Build the parameter grid.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded by a builder call, or any
    /// validation error from [`ParameterGrid::new`].
    pub fn build(self) -> Result<ParameterGrid, OptimizerError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        ParameterGrid::new(self.parameters)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn set(pairs: &[(&str, i64)]) -> ParameterSet {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_expand_order_first_parameter_slowest() {
        let Ok(grid) = ParameterGrid::builder()
            .int("fast", [10, 20])
            .int("slow", [50, 100])
            .build()
        else {
            panic!("valid grid");
        };

        let sets: Vec<ParameterSet> = grid.expand().collect();
        assert_eq!(
            sets,
            vec![
                set(&[("fast", 10), ("slow", 50)]),
                set(&[("fast", 10), ("slow", 100)]),
                set(&[("fast", 20), ("slow", 50)]),
                set(&[("fast", 20), ("slow", 100)]),
            ]
        );
        assert_eq!(grid.total_combinations(), 4);
    }

    #[test]
    fn test_expanded_sets_display_in_declaration_order() {
        let Ok(grid) = ParameterGrid::builder()
            .int("period", [14])
            .int("oversold", [30])
            .int("overbought", [70])
            .build()
        else {
            panic!("valid grid");
        };
        let Some(first) = grid.expand().next() else {
            panic!("one combination");
        };
        assert_eq!(first.to_string(), "period=14, oversold=30, overbought=70");
    }

    #[test]
    fn test_expand_is_restartable() {
        let Ok(grid) = ParameterGrid::builder().int("period", [7, 14, 21]).build() else {
            panic!("valid grid");
        };
        let first: Vec<_> = grid.expand().collect();
        let second: Vec<_> = (&grid).into_iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_value_yields_single_set() {
        let Ok(grid) = ParameterGrid::builder().int("period", [14]).build() else {
            panic!("valid grid");
        };
        let sets: Vec<_> = grid.expand().collect();
        assert_eq!(sets, vec![set(&[("period", 14)])]);
    }

    #[test]
    fn test_no_parameters_yields_one_empty_set() {
        let grid = ParameterGrid::defaults_only();
        let sets: Vec<_> = grid.expand().collect();
        assert_eq!(sets, vec![ParameterSet::empty()]);

        let Ok(built) = ParameterGrid::builder().build() else {
            panic!("empty grid is valid");
        };
        assert_eq!(built.expand().len(), 1);
    }

    #[test]
    fn test_empty_candidate_list_is_configuration_error() {
        let result = ParameterGrid::builder()
            .int("fast", [10, 20])
            .int("slow", Vec::<i64>::new())
            .build();
        let Err(OptimizerError::Configuration(message)) = result else {
            panic!("empty candidate list must be rejected");
        };
        assert!(message.contains("slow"));
    }

    #[test]
    fn test_duplicate_name_is_configuration_error() {
        let result = ParameterGrid::builder()
            .int("period", [10])
            .int("period", [20])
            .build();
        assert!(matches!(result, Err(OptimizerError::Configuration(_))));
    }

    #[test]
    fn test_mixed_value_kinds_are_configuration_error() {
        let result = ParameterGrid::new(vec![GridParameter::new(
            "period",
            vec![ParamValue::Int(14), ParamValue::from("x")],
        )]);
        let Err(OptimizerError::Configuration(message)) = result else {
            panic!("mixed value kinds must be rejected");
        };
        assert!(message.contains("period"));
        assert!(message.contains("mixes number and string"));
    }

    #[test]
    fn test_ints_and_floats_may_mix() {
        let result = ParameterGrid::new(vec![GridParameter::new(
            "std_dev",
            vec![ParamValue::Int(2), ParamValue::Float(2.5)],
        )]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_int_range() {
        let Ok(grid) = ParameterGrid::builder().int_range("period", 10, 30, 10).build() else {
            panic!("valid range");
        };
        assert_eq!(
            grid.values("period"),
            Some(
                &[
                    ParamValue::Int(10),
                    ParamValue::Int(20),
                    ParamValue::Int(30)
                ][..]
            )
        );

        let bad = ParameterGrid::builder().int_range("period", 10, 30, 0).build();
        assert!(matches!(bad, Err(OptimizerError::Configuration(_))));
    }

    #[test]
    fn test_mixed_types() {
        let Ok(grid) = ParameterGrid::builder()
            .float("std_dev", [1.5, 2.0])
            .string("ma", ["sma", "ema"])
            .bool("short", [false])
            .build()
        else {
            panic!("valid grid");
        };
        let sets: Vec<_> = grid.expand().collect();
        assert_eq!(sets.len(), 4);
        assert_eq!(sets[1].get("ma"), Some(&ParamValue::from("ema")));
        assert_eq!(sets[2].get("std_dev"), Some(&ParamValue::Float(2.0)));
    }

    #[test]
    fn test_deserialize_validates() {
        let yaml = "- name: period\n  values: [10, 20]\n- name: std_dev\n  values: [2.0]\n";
        let Ok(grid) = serde_yaml_bw::from_str::<ParameterGrid>(yaml) else {
            panic!("valid grid yaml");
        };
        assert_eq!(grid.names().collect::<Vec<_>>(), vec!["period", "std_dev"]);

        let invalid = "- name: period\n  values: []\n";
        assert!(serde_yaml_bw::from_str::<ParameterGrid>(invalid).is_err());

        let mixed = "- name: period\n  values: [14, x]\n";
        assert!(serde_yaml_bw::from_str::<ParameterGrid>(mixed).is_err());
    }

    proptest! {
        #[test]
        fn prop_count_is_product_and_sets_unique(
            lengths in prop::collection::vec(1_usize..5, 0..4)
        ) {
            let mut builder = ParameterGrid::builder();
            for (i, len) in lengths.iter().enumerate() {
                builder = builder.int(&format!("p{i}"), 0..*len as i64);
            }
            let Ok(grid) = builder.build() else {
                panic!("non-empty lists are valid");
            };

            let sets: Vec<_> = grid.expand().collect();
            let expected: usize = lengths.iter().product();
            prop_assert_eq!(sets.len(), expected);
            prop_assert_eq!(grid.total_combinations(), expected);

            let unique: HashSet<_> = sets.iter().collect();
            prop_assert_eq!(unique.len(), expected);
        }
    }
}
