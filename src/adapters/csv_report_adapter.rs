//! CSV report adapter implementing ReportPort.
//!
//! Writes one directory per run:
//!
//! | file                    | content                                   |
//! |-------------------------|-------------------------------------------|
//! | `monthly_returns.csv`   | compounded monthly asset returns          |
//! | `signal.csv`            | momentum signal                           |
//! | `weights.csv`           | target weights                            |
//! | `portfolio_returns.csv` | realized returns over the full window     |
//! | `equity_curve.csv`      | equity over the full window               |
//! | `equity_curve_<seg>.csv`| equity restarted for `train` and `test`   |
//! | `turnover.csv`          | turnover over the full window             |
//! | `metrics.csv`           | one row per segment                       |

use crate::adapters::csv_adapter::{save_table, write_series};
use crate::domain::config::StrategyConfig;
use crate::domain::error::XsmomError;
use crate::domain::pipeline::{BacktestRun, Segment, SegmentResult};
use crate::domain::table::PeriodSeries;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

pub struct CsvReportAdapter;

#[derive(Debug, Serialize)]
struct MetricsRow {
    segment: &'static str,
    first_period: Option<String>,
    last_period: Option<String>,
    periods: usize,
    lookback_months: usize,
    top_pct: f64,
    cumulative_return: Option<f64>,
    annualized_return: Option<f64>,
    annualized_volatility: Option<f64>,
    max_drawdown: Option<f64>,
    sharpe_ratio: Option<f64>,
    avg_turnover: Option<f64>,
    median_turnover: Option<f64>,
    max_turnover: Option<f64>,
}

impl MetricsRow {
    fn new(result: &SegmentResult, config: &StrategyConfig) -> Self {
        let periods = result.returns.periods();
        let m = &result.metrics;
        Self {
            segment: result.segment.name(),
            first_period: periods.first().map(|d| d.to_string()),
            last_period: periods.last().map(|d| d.to_string()),
            periods: m.periods,
            lookback_months: config.lookback,
            top_pct: config.top_pct,
            cumulative_return: m.cumulative_return,
            annualized_return: m.annualized_return,
            annualized_volatility: m.annualized_volatility,
            max_drawdown: m.max_drawdown,
            sharpe_ratio: m.sharpe_ratio,
            avg_turnover: m.avg_turnover,
            median_turnover: m.median_turnover,
            max_turnover: m.max_turnover,
        }
    }
}

fn save_series(series: &PeriodSeries, column: &str, path: &Path) -> Result<(), XsmomError> {
    write_series(series, column, fs::File::create(path)?)
}

fn write_metrics(
    segments: &[SegmentResult],
    config: &StrategyConfig,
    path: &Path,
) -> Result<(), XsmomError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for result in segments {
        wtr.serialize(MetricsRow::new(result, config))?;
    }
    wtr.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        run: &BacktestRun,
        config: &StrategyConfig,
        output_dir: &Path,
    ) -> Result<(), XsmomError> {
        fs::create_dir_all(output_dir)?;

        save_table(&run.monthly_returns, &output_dir.join("monthly_returns.csv"))?;
        save_table(&run.portfolio.signal, &output_dir.join("signal.csv"))?;
        save_table(&run.portfolio.weights, &output_dir.join("weights.csv"))?;

        if let Some(full) = run.segment(Segment::Full) {
            save_series(
                &full.returns,
                "return",
                &output_dir.join("portfolio_returns.csv"),
            )?;
            save_series(&full.equity, "equity", &output_dir.join("equity_curve.csv"))?;
            save_series(&full.turnover, "turnover", &output_dir.join("turnover.csv"))?;
        }
        for result in run.segments.iter().filter(|s| s.segment != Segment::Full) {
            let file = format!("equity_curve_{}.csv", result.segment);
            save_series(&result.equity, "equity", &output_dir.join(file))?;
        }

        write_metrics(&run.segments, config, &output_dir.join("metrics.csv"))?;

        info!(dir = %output_dir.display(), "report written");
        Ok(())
    }
}
