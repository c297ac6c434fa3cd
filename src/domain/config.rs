//! Strategy and evaluation parameters.
//!
//! One immutable value passed by reference into every pipeline call. It is
//! checked once by [`StrategyConfig::validate`] before any data is touched.

use crate::domain::backtest::DEFAULT_START_VALUE;
use crate::domain::error::XsmomError;
use crate::domain::metrics::MONTHS_PER_YEAR;
use crate::domain::universe::{DEFAULT_FILL_GAP_LIMIT, DEFAULT_MAX_MISSING_RATIO};
use chrono::NaiveDate;
use std::collections::HashSet;

pub const DEFAULT_LOOKBACK_MONTHS: usize = 12;
pub const DEFAULT_TOP_PCT: f64 = 0.20;
pub const DEFAULT_MIN_ASSETS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainTestSplit {
    /// Last period (inclusive) of the training window.
    pub train_end: NaiveDate,
    /// First period (inclusive) of the test window.
    pub test_start: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub universe: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub split: TrainTestSplit,
    pub lookback: usize,
    pub top_pct: f64,
    pub min_assets: usize,
    /// Assets with a larger share of missing monthly returns are dropped.
    pub max_missing_ratio: f64,
    /// Consecutive missing months carried forward; 0 disables filling.
    pub fill_gap_limit: usize,
    pub start_value: f64,
    /// Per-period risk-free rate used for the Sharpe ratio.
    pub risk_free_rate: f64,
    pub periods_per_year: u32,
}

impl StrategyConfig {
    /// 12-month lookback, top 20% equal weight, monthly periods. Assets
    /// missing more than 10% of monthly returns are dropped and single-month
    /// gaps are carried forward.
    pub fn with_defaults(
        universe: Vec<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        split: TrainTestSplit,
    ) -> Self {
        Self {
            universe,
            start_date,
            end_date,
            split,
            lookback: DEFAULT_LOOKBACK_MONTHS,
            top_pct: DEFAULT_TOP_PCT,
            min_assets: DEFAULT_MIN_ASSETS,
            max_missing_ratio: DEFAULT_MAX_MISSING_RATIO,
            fill_gap_limit: DEFAULT_FILL_GAP_LIMIT,
            start_value: DEFAULT_START_VALUE,
            risk_free_rate: 0.0,
            periods_per_year: MONTHS_PER_YEAR,
        }
    }

    pub fn validate(&self) -> Result<(), XsmomError> {
        if self.universe.is_empty() {
            return Err(XsmomError::invalid_parameter("universe", "must not be empty"));
        }
        let mut seen = HashSet::new();
        for asset in &self.universe {
            if asset.trim().is_empty() {
                return Err(XsmomError::invalid_parameter("universe", "contains an empty identifier"));
            }
            if !seen.insert(asset.as_str()) {
                return Err(XsmomError::invalid_parameter(
                    "universe",
                    format!("duplicate identifier {asset}"),
                ));
            }
        }
        if self.lookback == 0 {
            return Err(XsmomError::invalid_parameter("lookback", "must be at least 1"));
        }
        if !(self.top_pct > 0.0 && self.top_pct <= 1.0) {
            return Err(XsmomError::invalid_parameter(
                "top_pct",
                format!("must be in (0, 1], got {}", self.top_pct),
            ));
        }
        if !(0.0..=1.0).contains(&self.max_missing_ratio) {
            return Err(XsmomError::invalid_parameter(
                "max_missing_ratio",
                format!("must be in [0, 1], got {}", self.max_missing_ratio),
            ));
        }
        if self.start_date >= self.end_date {
            return Err(XsmomError::invalid_parameter(
                "start_date",
                "must be before end_date",
            ));
        }
        if self.split.train_end >= self.split.test_start {
            return Err(XsmomError::invalid_parameter(
                "train_end",
                "must be before test_start",
            ));
        }
        if !(self.start_value.is_finite() && self.start_value > 0.0) {
            return Err(XsmomError::invalid_parameter("start_value", "must be positive"));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(XsmomError::invalid_parameter("risk_free_rate", "must be finite"));
        }
        if self.periods_per_year == 0 {
            return Err(XsmomError::invalid_parameter(
                "periods_per_year",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
