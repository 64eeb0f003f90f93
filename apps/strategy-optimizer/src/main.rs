//! Strategy Optimizer Binary
//!
//! Runs a walk-forward (or rolling) parameter optimization over a JSON price file.
//!
//! # Usage
//!
//! ```bash
//! strategy-optimizer optimize sma_crossover BTC/USDT 1d --data btc_1d.json
//! strategy-optimizer optimize rsi_mean_reversion BTC/USDT 4h --data btc_4h.json \
//!     --rolling --splits 5 --test-size 0.1 --metric sortino_ratio --json
//! strategy-optimizer strategies
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log filter (default: `strategy_optimizer=info`)
//! - Any `${VAR}` referenced from the configuration file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use strategy_optimizer::backtest::{format_pct, format_ratio};
use strategy_optimizer::config::{Config, DEFAULT_CONFIG_PATH, load_config, validate_config};
use strategy_optimizer::observability::{init_metrics, init_tracing};
use strategy_optimizer::optimization::{OptimizationResult, RollingOptimizationResult};
use strategy_optimizer::{
    JsonFilePriceData, MetricKind, OptimizationMode, OptimizationReport, OptimizeRequest,
    RunOptimizationUseCase, StrategyFactory, StrategyRegistry, Timeframe,
};
use tracing::info;

/// Number of ranked candidates shown in the human report.
const TOP_CANDIDATES: usize = 5;

#[derive(Debug, Parser)]
#[command(
    name = "strategy-optimizer",
    version,
    about = "Walk-forward strategy parameter optimization"
)]
struct Cli {
    /// Configuration file (defaults to optimizer.yaml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Optimize a strategy's parameters on historical data.
    Optimize(OptimizeArgs),
    /// List registered strategies and their parameter grids.
    Strategies,
}

#[derive(Debug, Args)]
struct OptimizeArgs {
    /// Strategy name (e.g. sma_crossover).
    strategy: String,
    /// Market symbol (e.g. BTC/USDT).
    symbol: String,
    /// Bar timeframe (1m, 5m, 15m, 30m, 1h, 4h, 1d, 1w).
    timeframe: Timeframe,

    /// JSON price file.
    #[arg(long)]
    data: PathBuf,
    /// Most recent bars to use (0 = all).
    #[arg(long, default_value_t = 0)]
    bars: usize,
    /// Metric to optimize.
    #[arg(long, default_value = "sharpe_ratio")]
    metric: MetricKind,
    /// Initial capital.
    #[arg(long)]
    capital: Option<Decimal>,
    /// Commission rate per unit of traded notional.
    #[arg(long)]
    commission: Option<Decimal>,
    /// Worker threads (0 = all cores).
    #[arg(long)]
    threads: Option<usize>,

    /// Run the rolling optimizer instead of a single split.
    #[arg(long)]
    rolling: bool,
    /// Number of rolling windows.
    #[arg(long, requires = "rolling")]
    splits: Option<usize>,
    /// Fraction of the series in each rolling test window.
    #[arg(long, requires = "rolling")]
    test_size: Option<f64>,
    /// Hold out this fraction of each rolling train window for selection.
    #[arg(long, requires = "rolling")]
    nested_validation: Option<f64>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

impl OptimizeArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(capital) = self.capital {
            config.costs.initial_capital = capital;
        }
        if let Some(commission) = self.commission {
            config.costs.commission_rate = commission;
        }
        if let Some(threads) = self.threads {
            config.search.max_threads = threads;
        }
        if let Some(splits) = self.splits {
            config.rolling.n_splits = splits;
        }
        if let Some(test_size) = self.test_size {
            config.rolling.test_size_frac = test_size;
        }
        if self.nested_validation.is_some() {
            config.rolling.nested_validation_frac = self.nested_validation;
        }
    }

    fn request(&self) -> OptimizeRequest {
        let mode = if self.rolling {
            OptimizationMode::Rolling
        } else {
            OptimizationMode::WalkForward
        };
        OptimizeRequest::new(&self.strategy, &self.symbol, self.timeframe, self.bars)
            .with_metric(self.metric)
            .with_mode(mode)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load(cli.config.as_deref())?;

    init_tracing(&config.observability.logging);
    if config.observability.metrics.enabled {
        init_metrics(&config.observability.metrics).context("Failed to start metrics exporter")?;
    }

    match cli.command {
        Command::Strategies => {
            list_strategies(&config);
            Ok(())
        }
        Command::Optimize(args) => {
            args.apply(&mut config);
            validate_config(&config).context("Invalid optimizer settings")?;
            optimize(&args, config)
        }
    }
}

fn load(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let path = path.to_string_lossy();
            load_config(Some(&*path)).with_context(|| format!("Failed to load config '{path}'"))
        }
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            load_config(None).context("Failed to load default config")
        }
        None => Ok(Config::default()),
    }
}

fn optimize(args: &OptimizeArgs, config: Config) -> Result<()> {
    let price_data = Arc::new(JsonFilePriceData::new(&args.data));
    let use_case = RunOptimizationUseCase::new(price_data, config);
    let request = args.request();

    info!(
        strategy = %request.strategy,
        symbol = %request.symbol,
        timeframe = %request.timeframe,
        data = %args.data.display(),
        "Starting optimization"
    );

    let report = use_case
        .execute(&request)
        .with_context(|| format!("Optimization of '{}' failed", request.strategy))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match &report {
        OptimizationReport::WalkForward(result) => print_walk_forward(&request, result),
        OptimizationReport::Rolling(result) => print_rolling(&request, result),
    }
    Ok(())
}

fn list_strategies(config: &Config) {
    let registry = StrategyRegistry::with_defaults();
    println!("Registered strategies:");
    for descriptor in registry.iter() {
        let name = descriptor.name();
        let grid = config.grid_for(name);
        let size = grid.as_ref().map_or_else(
            |_| "no grid".to_string(),
            |g| format!("{} combinations", g.total_combinations()),
        );
        println!("  {name:<20} {:<60} {size}", descriptor.description());
        if let Ok(grid) = grid {
            for param in grid.parameters() {
                let values: Vec<String> = param.values.iter().map(ToString::to_string).collect();
                println!("      {}: [{}]", param.name, values.join(", "));
            }
        }
    }
}

fn print_walk_forward(request: &OptimizeRequest, result: &OptimizationResult) {
    let split = &result.split;
    println!();
    println!(
        "Walk-forward optimization: {} on {} ({})",
        result.strategy, request.symbol, request.timeframe
    );
    println!("  Metric:      {}", result.metric);
    println!(
        "  Segments:    train {} / validation {} / test {} bars",
        split.train.bars, split.validation.bars, split.test.bars
    );
    println!(
        "  Candidates:  {} evaluated, {} failed",
        result.candidates_total,
        result.failures.len()
    );
    println!();
    println!("Best parameters: {}", result.best_params);
    println!("  Train:       {}", result.train_metric.round_dp(4));
    println!("  Validation:  {}", result.validation_metric.round_dp(4));
    println!("  Test:        {}", result.test_metric.round_dp(4));
    println!("  Status:      {}", result.overfitting.status.label());

    let perf = &result.test_performance;
    println!();
    println!("Test segment performance:");
    println!("  Total return:  {}", format_pct(perf.total_return));
    println!("  Sharpe ratio:  {}", format_ratio(perf.sharpe_ratio));
    println!("  Sortino ratio: {}", format_ratio(perf.sortino_ratio));
    println!("  Max drawdown:  {}", format_pct(perf.max_drawdown));
    println!("  Win rate:      {}", format_pct(perf.win_rate));
    println!("  Trades:        {}", perf.total_trades);

    println!();
    println!("Top {TOP_CANDIDATES} by train metric:");
    for candidate in result.top(TOP_CANDIDATES) {
        let validation = candidate
            .validation_metric
            .map_or_else(|| "-".to_string(), |v| v.round_dp(4).to_string());
        println!(
            "  {:>2}. {:<40} train {:>10}  validation {:>10}",
            candidate.rank,
            candidate.params.to_string(),
            candidate.train_metric.round_dp(4).to_string(),
            validation
        );
    }
}

fn print_rolling(request: &OptimizeRequest, result: &RollingOptimizationResult) {
    let aggregate = &result.aggregate;
    println!();
    println!(
        "Rolling optimization: {} on {} ({})",
        result.strategy, request.symbol, request.timeframe
    );
    println!("  Metric:      {}", result.metric);
    println!(
        "  Windows:     {} of {} succeeded",
        aggregate.successful_windows, aggregate.total_windows
    );
    println!();
    for window in &result.windows {
        println!(
            "  #{:<2} train {:>5} bars  test [{}, {})  {:<40} test {}",
            window.index,
            window.train.bars,
            window.test.start_index,
            window.test.end_index,
            window.best_params.to_string(),
            window.test_metric.round_dp(4)
        );
    }
    for failure in &result.failed_windows {
        println!("  #{:<2} failed: {}", failure.index, failure.reason);
    }

    println!();
    println!("Out-of-sample {}:", result.metric);
    println!("  Mean:         {}", aggregate.mean.round_dp(4));
    println!("  Std dev:      {}", format_ratio(aggregate.std_dev));
    println!("  Range:        [{}, {}]", aggregate.min.round_dp(4), aggregate.max.round_dp(4));
    println!("  Consistency:  {}", format_pct(aggregate.consistency));
    println!();
    println!("Consensus parameters: {}", result.consensus_params);
    println!(
        "Parameter stability: {}",
        format_pct(result.parameter_stability.stability_score)
    );
    if let Some(warning) = &result.parameter_stability.warning {
        println!("  Warning: {warning}");
    }
}
