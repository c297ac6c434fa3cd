//! Portfolio return engine (one-period decision lag) and equity curves.
//!
//! Weights decided at period t-1 earn the asset returns of period t:
//!
//!   port[t] = sum_i w[t-1, i] * r[t, i]
//!
//! Asset columns are intersected between the weight and return tables;
//! assets present in only one of them are dropped and reported, since the
//! universe drifts over time in real data. A missing return for a held asset
//! contributes nothing to that period.
//!
//! Leading periods are dropped until the first period whose lagged weights
//! hold something: the first period has no lagged weights at all, and the
//! all-cash rows produced during signal warmup carry no decision. After that
//! every period is reported, all-cash periods as a 0.0 return.

use crate::domain::error::XsmomError;
use crate::domain::table::{PeriodSeries, ReturnTable, WeightTable};
use tracing::warn;

pub const DEFAULT_START_VALUE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioReturns {
    pub series: PeriodSeries,
    /// Assets present in only one of the two input tables.
    pub dropped_assets: Vec<String>,
}

pub fn portfolio_returns(
    weights: &WeightTable,
    returns: &ReturnTable,
) -> Result<PortfolioReturns, XsmomError> {
    let common: Vec<String> = weights
        .assets()
        .iter()
        .filter(|a| returns.asset_index(a).is_some())
        .cloned()
        .collect();
    let dropped_assets: Vec<String> = weights
        .assets()
        .iter()
        .chain(returns.assets())
        .filter(|a| !common.contains(a))
        .cloned()
        .collect();
    if !dropped_assets.is_empty() {
        warn!(
            dropped = %dropped_assets.join(","),
            "assets missing from weights or returns; using the {} shared assets",
            common.len()
        );
    }

    let w = weights.select_assets(&common)?;
    let r = returns.select_assets(&common)?;

    let mut periods = Vec::new();
    let mut values = Vec::new();
    let mut started = false;

    for t in 1..r.n_periods() {
        let decided_at = r.periods()[t - 1];
        let lagged = match w.period_index(decided_at) {
            Some(i) => w.row(i),
            None => &[][..],
        };
        let invested = lagged.iter().any(|&weight| weight > 0.0);
        if !started && !invested {
            continue;
        }
        started = true;

        let realized: f64 = lagged
            .iter()
            .zip(r.row(t))
            .map(|(&weight, ret)| weight * ret.unwrap_or(0.0))
            .sum();
        periods.push(r.periods()[t]);
        values.push(realized);
    }

    Ok(PortfolioReturns {
        series: PeriodSeries::from_parts(periods, values),
        dropped_assets,
    })
}

/// `start_value * cumprod(1 + r)`. The first point already includes the first
/// return; there is no synthetic point for the period before it.
pub fn equity_curve(returns: &PeriodSeries, start_value: f64) -> Result<PeriodSeries, XsmomError> {
    if !(start_value.is_finite() && start_value > 0.0) {
        return Err(XsmomError::invalid_parameter(
            "start_value",
            format!("must be a positive number, got {start_value}"),
        ));
    }
    let mut equity = start_value;
    let values = returns
        .values()
        .iter()
        .map(|r| {
            equity *= 1.0 + r;
            equity
        })
        .collect();
    Ok(PeriodSeries::from_parts(returns.periods().to_vec(), values))
}
