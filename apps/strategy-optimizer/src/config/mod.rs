//! Configuration module for the strategy optimizer.
//!
//! YAML configuration with environment variable interpolation. Every
//! section is optional and falls back to its defaults.
//!
//! # Usage
//!
//! ```rust,ignore
//! use strategy_optimizer::config::load_config;
//!
//! // Load from default path (optimizer.yaml)
//! let config = load_config(None)?;
//!
//! println!("train fraction: {}", config.split.train_frac);
//! let grid = config.grid_for("sma_crossover")?;
//! ```
//!
//! # Example file
//!
//! ```yaml
//! split:
//!   train_frac: 0.6
//!   validation_frac: 0.2
//! search:
//!   max_threads: ${OPTIMIZER_THREADS:-0}
//! costs:
//!   commission_rate: 0.001
//!   initial_capital: 10000
//! grids:
//!   sma_crossover:
//!     - name: fast_period
//!       values: [5, 10, 20]
//!     - name: slow_period
//!       values: [50, 100]
//! ```

mod observability;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use observability::ObservabilityConfig;

use crate::backtest::CostConfig;
use crate::error::OptimizerError;
use crate::optimization::{
    ParameterGrid, RollingConfig, SearchConfig, SplitConfig, normalize_strategy_name, preset_grid,
};

/// Default configuration path.
pub const DEFAULT_CONFIG_PATH: &str = "optimizer.yaml";

/// Upper bound on `search.max_threads`.
const MAX_THREADS: usize = 512;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),

    /// `${VAR}` without a default refers to an unset variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

impl From<OptimizerError> for ConfigError {
    fn from(err: OptimizerError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Three-way split fractions.
    #[serde(default)]
    pub split: SplitConfig,
    /// Rolling window geometry.
    #[serde(default)]
    pub rolling: RollingConfig,
    /// Search parallelism.
    #[serde(default)]
    pub search: SearchConfig,
    /// Backtest cost model.
    #[serde(default)]
    pub costs: CostConfig,
    /// Logging and metrics.
    #[serde(default)]
    pub observability: ObservabilityConfig,
    /// Parameter grids by strategy name, overriding the presets.
    #[serde(default)]
    pub grids: BTreeMap<String, ParameterGrid>,
}

impl Config {
    /// Grid for `strategy`: the configured one if present, else the preset.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::Configuration`] when neither exists.
    pub fn grid_for(&self, strategy: &str) -> Result<ParameterGrid, OptimizerError> {
        let key = normalize_strategy_name(strategy);
        self.grids
            .iter()
            .find(|(name, _)| normalize_strategy_name(name) == key)
            .map_or_else(|| preset_grid(strategy), |(_, grid)| Ok(grid.clone()))
    }
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to [`DEFAULT_CONFIG_PATH`].
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be interpolated, parsed, or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml)?;
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax. An empty variable
/// counts as unset.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    use std::sync::OnceLock;
    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    let mut result = String::with_capacity(input.len());
    let mut last = 0;
    for cap in re.captures_iter(input) {
        let (Some(full_match), Some(var_match)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let var_name = var_match.as_str();

        let value = match (std::env::var(var_name), cap.get(2)) {
            (Ok(v), _) if !v.is_empty() => v,
            (_, Some(default)) => default.as_str().to_string(),
            _ => return Err(ConfigError::MissingEnvVar(var_name.to_string())),
        };

        result.push_str(&input[last..full_match.start()]);
        result.push_str(&value);
        last = full_match.end();
    }
    result.push_str(&input[last..]);

    Ok(result)
}

/// Validate configuration values.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] naming the first offending setting.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    config.split.validate()?;
    config.rolling.validate()?;
    config.costs.validate()?;

    if config.search.min_parallel_jobs == 0 {
        return Err(ConfigError::ValidationError(
            "search.min_parallel_jobs must be at least 1".to_string(),
        ));
    }
    if config.search.max_threads > MAX_THREADS {
        return Err(ConfigError::ValidationError(format!(
            "search.max_threads must not exceed {MAX_THREADS}, got {}",
            config.search.max_threads
        )));
    }

    if config.observability.logging.level.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "observability.logging.level must not be empty".to_string(),
        ));
    }
    let buckets = &config.observability.metrics.latency_buckets;
    if buckets.is_empty() || buckets.windows(2).any(|w| w[0] >= w[1]) {
        return Err(ConfigError::ValidationError(
            "observability.metrics.latency_buckets must be non-empty and strictly increasing"
                .to_string(),
        ));
    }

    if let Some(name) = config.grids.keys().find(|k| k.trim().is_empty()) {
        return Err(ConfigError::ValidationError(format!(
            "grid name '{name}' must not be empty"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
        assert!((config.split.train_frac - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.rolling.n_splits, 5);
        assert_eq!(config.costs.commission_rate, dec!(0.001));
        assert!(!config.observability.metrics.enabled);
    }

    #[test]
    fn test_load_empty_document_uses_defaults() {
        let config = match load_config_from_string("{}") {
            Ok(c) => c,
            Err(e) => panic!("empty config should load: {e}"),
        };
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_sections_and_grids() {
        let yaml = r"
split:
  train_frac: 0.5
  validation_frac: 0.25
rolling:
  n_splits: 3
  nested_validation_frac: 0.2
costs:
  commission_rate: 0.002
  initial_capital: 5000
observability:
  logging:
    format: json
grids:
  sma-crossover:
    - name: fast_period
      values: [5, 10]
    - name: slow_period
      values: [50]
";
        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("config should load: {e}"),
        };
        assert!((config.split.validation_frac - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.rolling.n_splits, 3);
        assert_eq!(config.rolling.nested_validation_frac, Some(0.2));
        assert_eq!(config.costs.initial_capital, dec!(5000));
        assert_eq!(
            config.observability.logging.format,
            crate::observability::LogFormat::Json
        );

        let Ok(grid) = config.grid_for("sma_crossover") else {
            panic!("configured grid should resolve");
        };
        assert_eq!(grid.total_combinations(), 2);

        let Ok(preset) = config.grid_for("macd_momentum") else {
            panic!("preset should back-fill");
        };
        assert_eq!(preset.total_combinations(), 27);
    }

    #[test]
    fn test_invalid_fractions_rejected() {
        let yaml = "split:\n  train_frac: 0.8\n  validation_frac: 0.3\n";
        assert!(matches!(
            load_config_from_string(yaml),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_empty_grid_values_rejected_at_parse() {
        let yaml = "grids:\n  sma_crossover:\n    - name: fast_period\n      values: []\n";
        assert!(matches!(
            load_config_from_string(yaml),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_zero_min_parallel_jobs_rejected() {
        let yaml = "search:\n  min_parallel_jobs: 0\n";
        assert!(matches!(
            load_config_from_string(yaml),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_env_var_with_default_when_missing() {
        let input = "threads: ${STRATEGY_OPTIMIZER_TEST_NONEXISTENT_VAR:-4}";
        let Ok(result) = interpolate_env_vars(input) else {
            panic!("default should apply");
        };
        assert_eq!(result, "threads: 4");
    }

    #[test]
    #[expect(clippy::literal_string_with_formatting_args)] // ${...} is env var syntax, not format args
    fn test_env_var_with_default_uses_existing() {
        let input = "path: ${PATH:-default}";
        let Ok(result) = interpolate_env_vars(input) else {
            panic!("PATH should be set");
        };
        assert_ne!(result, "path: default");
        assert!(!result.contains("${"));
    }

    #[test]
    fn test_missing_env_var_without_default() {
        let input = "threads: ${STRATEGY_OPTIMIZER_TEST_NONEXISTENT_VAR}";
        assert!(matches!(
            interpolate_env_vars(input),
            Err(ConfigError::MissingEnvVar(name)) if name == "STRATEGY_OPTIMIZER_TEST_NONEXISTENT_VAR"
        ));
    }

    #[test]
    fn test_load_config_from_file() {
        let Ok(mut file) = tempfile::NamedTempFile::new() else {
            panic!("temp file should be created");
        };
        let Ok(()) = file.write_all(b"search:\n  max_threads: 2\n") else {
            panic!("temp file should be writable");
        };
        let path = file.path().to_string_lossy().to_string();

        let config = match load_config(Some(&path)) {
            Ok(c) => c,
            Err(e) => panic!("file config should load: {e}"),
        };
        assert_eq!(config.search.max_threads, 2);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = load_config(Some("/nonexistent/optimizer.yaml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }
}
