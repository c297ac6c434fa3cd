//! End-to-end momentum backtest: prices to per-segment metrics.
//!
//! prices -> monthly returns -> cleanup -> signal -> selection -> weights
//!        -> portfolio returns -> equity curve -> metrics
//!
//! Cleanup drops assets missing more than `max_missing_ratio` of their
//! monthly returns, then carries returns forward over gaps of at most
//! `fill_gap_limit` months.
//!
//! The portfolio is simulated once over the whole window and then evaluated
//! on three segments: the full window, the training window (periods up to and
//! including `train_end`) and the test window (periods from `test_start`).
//! Each segment restarts its equity curve at `start_value`. Turnover is
//! computed once over the whole run and sliced, so a rotation at the first
//! period of a segment is still counted.

use crate::domain::backtest::{equity_curve, portfolio_returns};
use crate::domain::config::StrategyConfig;
use crate::domain::error::XsmomError;
use crate::domain::metrics::{summarize, turnover, MetricsReport};
use crate::domain::momentum;
use crate::domain::returns::monthly_returns;
use crate::domain::selection;
use crate::domain::table::{PeriodSeries, PriceTable, ReturnTable, SelectionMask, SignalTable, WeightTable};
use crate::domain::universe::{drop_assets_with_missing, fill_small_gaps};
use crate::domain::weights::equal_weights;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct MomentumPortfolio {
    pub signal: SignalTable,
    pub selected: SelectionMask,
    pub weights: WeightTable,
}

pub fn build_momentum_portfolio(
    returns: &ReturnTable,
    config: &StrategyConfig,
) -> Result<MomentumPortfolio, XsmomError> {
    let signal = momentum::signal(returns, config.lookback)?;
    let selected = selection::select(&signal, config.top_pct, config.min_assets)?;
    let weights = equal_weights(&selected);
    Ok(MomentumPortfolio {
        signal,
        selected,
        weights,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Full,
    Train,
    Test,
}

impl Segment {
    pub fn name(self) -> &'static str {
        match self {
            Segment::Full => "full",
            Segment::Train => "train",
            Segment::Test => "test",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct SegmentResult {
    pub segment: Segment,
    pub returns: PeriodSeries,
    pub equity: PeriodSeries,
    pub turnover: PeriodSeries,
    pub metrics: MetricsReport,
}

#[derive(Debug, Clone)]
pub struct BacktestRun {
    pub monthly_returns: ReturnTable,
    pub portfolio: MomentumPortfolio,
    /// Assets removed before the backtest for too many missing returns.
    pub sparse_assets: Vec<String>,
    /// Assets present in only one of the weight and return tables.
    pub dropped_assets: Vec<String>,
    pub segments: Vec<SegmentResult>,
}

impl BacktestRun {
    pub fn segment(&self, segment: Segment) -> Option<&SegmentResult> {
        self.segments.iter().find(|s| s.segment == segment)
    }
}

/// Run the full pipeline on daily prices.
///
/// Prices outside `[start_date, end_date]` are ignored. The configuration is
/// validated before any computation.
pub fn run(prices: &PriceTable, config: &StrategyConfig) -> Result<BacktestRun, XsmomError> {
    config.validate()?;

    let window = prices.slice_periods(Some(config.start_date), Some(config.end_date));
    debug!(
        periods = window.n_periods(),
        assets = window.n_assets(),
        "price window"
    );

    let monthly = monthly_returns(&window)?;
    let (cleaned, sparse_assets) = clean_monthly_returns(&monthly, config)?;
    let mut run = run_monthly(cleaned, config)?;
    run.sparse_assets = sparse_assets;
    Ok(run)
}

/// Drop sparse assets, then fill short gaps in what remains.
pub fn clean_monthly_returns(
    monthly: &ReturnTable,
    config: &StrategyConfig,
) -> Result<(ReturnTable, Vec<String>), XsmomError> {
    let (kept, sparse) = drop_assets_with_missing(monthly, config.max_missing_ratio)?;
    if !sparse.is_empty() {
        warn!(
            assets = %sparse.join(","),
            max_missing_ratio = config.max_missing_ratio,
            "dropping assets with too many missing monthly returns"
        );
    }
    if kept.n_assets() == 0 {
        return Err(XsmomError::NoData {
            reason: format!(
                "every asset misses more than {:.0}% of monthly returns",
                config.max_missing_ratio * 100.0
            ),
        });
    }
    Ok((fill_small_gaps(&kept, config.fill_gap_limit), sparse))
}

/// Run the pipeline on returns that are already monthly.
pub fn run_monthly(
    monthly_returns: ReturnTable,
    config: &StrategyConfig,
) -> Result<BacktestRun, XsmomError> {
    config.validate()?;
    info!(
        months = monthly_returns.n_periods(),
        assets = monthly_returns.n_assets(),
        lookback = config.lookback,
        top_pct = config.top_pct,
        "building momentum portfolio"
    );

    let portfolio = build_momentum_portfolio(&monthly_returns, config)?;
    let realized = portfolio_returns(&portfolio.weights, &monthly_returns)?;
    info!(periods = realized.series.len(), "portfolio returns computed");

    let full_turnover = turnover(&portfolio.weights);
    let train_end = config.split.train_end;
    let test_start = config.split.test_start;
    let segments = [
        (Segment::Full, None, None),
        (Segment::Train, None, Some(train_end)),
        (Segment::Test, Some(test_start), None),
    ]
    .into_iter()
    .map(|(segment, start, end)| {
        evaluate(
            segment,
            &realized.series.slice_periods(start, end),
            &full_turnover.slice_periods(start, end),
            config,
        )
    })
    .collect::<Result<Vec<_>, _>>()?;

    Ok(BacktestRun {
        monthly_returns,
        portfolio,
        sparse_assets: Vec::new(),
        dropped_assets: realized.dropped_assets,
        segments,
    })
}

/// Equity curve, turnover and metrics for one slice of the run.
pub fn evaluate(
    segment: Segment,
    returns: &PeriodSeries,
    turnover: &PeriodSeries,
    config: &StrategyConfig,
) -> Result<SegmentResult, XsmomError> {
    let equity = equity_curve(returns, config.start_value)?;
    let metrics = summarize(
        returns,
        &equity,
        turnover,
        config.risk_free_rate,
        config.periods_per_year,
    );
    Ok(SegmentResult {
        segment,
        returns: returns.clone(),
        equity,
        turnover: turnover.clone(),
        metrics,
    })
}
