//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvPriceSource;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config::StrategyConfig;
use crate::domain::config_validation::{load_strategy_config, prices_path};
use crate::domain::error::XsmomError;
use crate::domain::pipeline::{self, BacktestRun};
use crate::domain::universe::{count_above, missing_ratios, MISSING_RATIO_WARN};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceSource;
use crate::ports::report_port::ReportPort;

const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_MISSING_TOP: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "xsmom", about = "Cross-sectional momentum backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest and write the CSV report
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override [strategy] lookback_months
        #[arg(long)]
        lookback: Option<usize>,
        /// Override [strategy] top_pct
        #[arg(long)]
        top_pct: Option<f64>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the assets with the most missing prices
    Missing {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, default_value_t = DEFAULT_MISSING_TOP)]
        top: usize,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            lookback,
            top_pct,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, lookback, top_pct)
            } else {
                run_backtest(&config, output.as_deref(), lookback, top_pct)
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Missing { config, top } => run_missing(&config, top),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = XsmomError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Read the strategy from `adapter` and apply command-line overrides.
pub fn build_strategy_config(
    adapter: &dyn ConfigPort,
    lookback: Option<usize>,
    top_pct: Option<f64>,
) -> Result<StrategyConfig, XsmomError> {
    let mut config = load_strategy_config(adapter)?;
    if let Some(lookback) = lookback {
        config.lookback = lookback;
    }
    if let Some(top_pct) = top_pct {
        config.top_pct = top_pct;
    }
    config.validate()?;
    Ok(config)
}

fn load_all(
    config_path: &Path,
    lookback: Option<usize>,
    top_pct: Option<f64>,
) -> Result<(FileConfigAdapter, StrategyConfig), ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    let strategy = build_strategy_config(&adapter, lookback, top_pct).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    Ok((adapter, strategy))
}

fn run_backtest(
    config_path: &Path,
    output: Option<&Path>,
    lookback: Option<usize>,
    top_pct: Option<f64>,
) -> ExitCode {
    let (adapter, strategy) = match load_all(config_path, lookback, top_pct) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let prices = match prices_path(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let source = CsvPriceSource::new(prices);
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    run_backtest_pipeline(&source, &CsvReportAdapter, &strategy, &output)
}

/// Fetch prices, run the backtest, print the summary and write the report.
pub fn run_backtest_pipeline(
    source: &dyn PriceSource,
    report: &dyn ReportPort,
    config: &StrategyConfig,
    output: &Path,
) -> ExitCode {
    match execute(source, report, config, output) {
        Ok(run) => {
            print_summary(&run);
            eprintln!("\nReport written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn execute(
    source: &dyn PriceSource,
    report: &dyn ReportPort,
    config: &StrategyConfig,
    output: &Path,
) -> Result<BacktestRun, XsmomError> {
    let prices = source.fetch_prices(&config.universe, config.start_date, config.end_date)?;
    eprintln!(
        "Running backtest: {} assets, {} to {}",
        prices.n_assets(),
        config.start_date,
        config.end_date,
    );
    let run = pipeline::run(&prices, config)?;
    report.write(&run, config, output)?;
    Ok(run)
}

fn pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v * 100.0))
}

fn ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

fn print_summary(run: &BacktestRun) {
    if !run.sparse_assets.is_empty() {
        eprintln!("Sparse assets excluded: {}", run.sparse_assets.join(", "));
    }
    if !run.dropped_assets.is_empty() {
        eprintln!("Dropped assets: {}", run.dropped_assets.join(", "));
    }
    for segment in &run.segments {
        let m = &segment.metrics;
        let range = match (segment.returns.periods().first(), segment.returns.periods().last()) {
            (Some(first), Some(last)) => format!("{first} to {last}"),
            _ => "no periods".to_string(),
        };
        eprintln!("\n=== {} ({}) ===", segment.segment, range);
        eprintln!("Periods:          {}", m.periods);
        eprintln!("Total Return:     {}", pct(m.cumulative_return));
        eprintln!("Annualized:       {}", pct(m.annualized_return));
        eprintln!("Volatility:       {}", pct(m.annualized_volatility));
        eprintln!("Sharpe Ratio:     {}", ratio(m.sharpe_ratio));
        eprintln!("Max Drawdown:     {}", pct(m.max_drawdown));
        eprintln!("Avg Turnover:     {}", pct(m.avg_turnover));
    }
}

pub fn run_dry_run(config_path: &Path, lookback: Option<usize>, top_pct: Option<f64>) -> ExitCode {
    let (adapter, strategy) = match load_all(config_path, lookback, top_pct) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let prices = match prices_path(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("Config validated successfully");
    eprintln!("\nStrategy:");
    eprintln!("  lookback:   {} months", strategy.lookback);
    eprintln!("  top_pct:    {}", strategy.top_pct);
    eprintln!("  min_assets: {}", strategy.min_assets);
    eprintln!("\nData cleanup:");
    eprintln!("  max missing: {:.0}%", strategy.max_missing_ratio * 100.0);
    eprintln!("  fill gaps:   up to {} months", strategy.fill_gap_limit);
    eprintln!("\nWindow:");
    eprintln!("  {} to {}", strategy.start_date, strategy.end_date);
    eprintln!(
        "  train to {}, test from {}",
        strategy.split.train_end, strategy.split.test_start
    );
    eprintln!("\nUniverse ({} assets):", strategy.universe.len());
    eprintln!("  {}", strategy.universe.join(", "));
    eprintln!("\nPrices: {}", prices.display());

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    let (adapter, strategy) = match load_all(config_path, None, None) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let source = match prices_path(&adapter) {
        Ok(p) => CsvPriceSource::new(p),
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let available = match source.list_assets() {
        Ok(assets) => assets,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let missing: Vec<&String> = strategy
        .universe
        .iter()
        .filter(|t| !available.contains(*t))
        .collect();
    eprintln!(
        "{} of {} tickers found in price file",
        strategy.universe.len() - missing.len(),
        strategy.universe.len()
    );
    for ticker in &missing {
        eprintln!("  not found: {ticker}");
    }
    if missing.len() == strategy.universe.len() {
        let err = XsmomError::NoData {
            reason: "no configured ticker has price data".to_string(),
        };
        eprintln!("error: {err}");
        return (&err).into();
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_missing(config_path: &Path, top: usize) -> ExitCode {
    let (adapter, strategy) = match load_all(config_path, None, None) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let source = match prices_path(&adapter) {
        Ok(p) => CsvPriceSource::new(p),
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let prices =
        match source.fetch_prices(&strategy.universe, strategy.start_date, strategy.end_date) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

    let coverage = missing_ratios(&prices);
    info!(assets = coverage.len(), "missing data summary");
    for c in coverage.iter().take(top) {
        println!("{}\t{:.2}%", c.asset, c.missing_ratio * 100.0);
    }
    eprintln!(
        "{} of {} assets missing more than {:.0}% of prices",
        count_above(&coverage, MISSING_RATIO_WARN),
        coverage.len(),
        MISSING_RATIO_WARN * 100.0
    );
    ExitCode::SUCCESS
}
