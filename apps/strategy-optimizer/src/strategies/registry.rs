//! Name → strategy factory lookup.

use std::collections::BTreeMap;
use std::fmt;

use super::{BollingerBreakout, MacdMomentum, RsiMeanReversion, SmaCrossover};
use crate::domain::ParameterSet;
use crate::error::{EvaluationError, OptimizerError};
use crate::optimization::{Strategy, StrategyFactory, normalize_strategy_name};

type BuildFn = fn(&ParameterSet) -> Result<Box<dyn Strategy>, EvaluationError>;

/// A registered strategy: name, summary and constructor.
#[derive(Clone, Copy)]
pub struct StrategyDescriptor {
    name: &'static str,
    description: &'static str,
    build: BuildFn,
}

impl StrategyDescriptor {
    /// Describe a strategy.
    #[must_use]
    pub const fn new(name: &'static str, description: &'static str, build: BuildFn) -> Self {
        Self {
            name,
            description,
            build,
        }
    }

    /// One-line summary.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.description
    }
}

impl fmt::Debug for StrategyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl StrategyFactory for StrategyDescriptor {
    fn name(&self) -> &str {
        self.name
    }

    fn build(&self, params: &ParameterSet) -> Result<Box<dyn Strategy>, EvaluationError> {
        (self.build)(params)
    }
}

fn boxed<S: Strategy + 'static>(
    strategy: Result<S, EvaluationError>,
) -> Result<Box<dyn Strategy>, EvaluationError> {
    strategy.map(|s| Box::new(s) as Box<dyn Strategy>)
}

/// Registered strategies, keyed by canonical name.
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    strategies: BTreeMap<String, StrategyDescriptor>,
}

impl StrategyRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the four bundled strategies.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(StrategyDescriptor::new(
            SmaCrossover::NAME,
            "Fast/slow simple moving average crossover",
            |p| boxed(SmaCrossover::from_params(p)),
        ));
        registry.register(StrategyDescriptor::new(
            RsiMeanReversion::NAME,
            "Buy oversold RSI, exit overbought",
            |p| boxed(RsiMeanReversion::from_params(p)),
        ));
        registry.register(StrategyDescriptor::new(
            BollingerBreakout::NAME,
            "Enter above the upper Bollinger band, exit below the middle",
            |p| boxed(BollingerBreakout::from_params(p)),
        ));
        registry.register(StrategyDescriptor::new(
            MacdMomentum::NAME,
            "MACD line above its signal line",
            |p| boxed(MacdMomentum::from_params(p)),
        ));
        registry
    }

    /// Add or replace a strategy.
    pub fn register(&mut self, descriptor: StrategyDescriptor) {
        self.strategies
            .insert(normalize_strategy_name(descriptor.name), descriptor);
    }

    /// Look up a strategy by name (case-insensitive, `-` and `_` equivalent).
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::Configuration`] listing the registered names.
    pub fn get(&self, name: &str) -> Result<&StrategyDescriptor, OptimizerError> {
        self.strategies
            .get(&normalize_strategy_name(name))
            .ok_or_else(|| {
                OptimizerError::configuration(format!(
                    "unknown strategy '{name}' (available: {})",
                    self.names().collect::<Vec<_>>().join(", ")
                ))
            })
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }

    /// Registered descriptors in name order.
    pub fn iter(&self) -> impl Iterator<Item = &StrategyDescriptor> {
        self.strategies.values()
    }

    /// Number of registered strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
