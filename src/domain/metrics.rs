//! Performance metrics and statistics.
//!
//! Statistics that are not defined for the input (too few observations, zero
//! dispersion) are `None`, never a silent 0.0 or an infinity.

use crate::domain::table::{PeriodSeries, WeightTable};

pub const MONTHS_PER_YEAR: u32 = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsReport {
    pub periods: usize,
    pub cumulative_return: Option<f64>,
    pub annualized_return: Option<f64>,
    pub annualized_volatility: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub avg_turnover: Option<f64>,
    pub median_turnover: Option<f64>,
    pub max_turnover: Option<f64>,
}

/// Aggregate every statistic for one return series.
///
/// `risk_free_rate` is per period, matching the return series. `turnover`
/// is taken as given, so a segment can pass a slice of the full-run series.
pub fn summarize(
    returns: &PeriodSeries,
    equity_curve: &PeriodSeries,
    turnover: &PeriodSeries,
    risk_free_rate: f64,
    periods_per_year: u32,
) -> MetricsReport {
    let r = returns.values();
    let t = turnover.values();

    MetricsReport {
        periods: r.len(),
        cumulative_return: cumulative_return(r),
        annualized_return: annualized_return(r, periods_per_year),
        annualized_volatility: annualized_volatility(r, periods_per_year),
        max_drawdown: max_drawdown(equity_curve.values()),
        sharpe_ratio: sharpe_ratio(r, risk_free_rate, periods_per_year),
        avg_turnover: mean(t),
        median_turnover: median(t),
        max_turnover: t.iter().copied().max_by(f64::total_cmp),
    }
}

pub fn cumulative_return(returns: &[f64]) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }
    Some(growth(returns) - 1.0)
}

/// `growth^(periods_per_year / n) - 1`. `None` for an empty series or a
/// growth factor that cannot be annualized (total loss).
pub fn annualized_return(returns: &[f64], periods_per_year: u32) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }
    let n = returns.len() as f64;
    let annual = growth(returns).powf(periods_per_year as f64 / n) - 1.0;
    (!annual.is_nan()).then_some(annual)
}

/// Sample standard deviation (n - 1) scaled by `sqrt(periods_per_year)`.
pub fn annualized_volatility(returns: &[f64], periods_per_year: u32) -> Option<f64> {
    let std = sample_std(returns)?;
    Some(std * (periods_per_year as f64).sqrt())
}

/// Deepest peak-to-trough decline, as a value <= 0 (-0.35 is a 35% drawdown).
pub fn max_drawdown(equity_curve: &[f64]) -> Option<f64> {
    let first = *equity_curve.first()?;
    let mut peak = first;
    let mut worst = 0.0_f64;
    for &equity in equity_curve {
        if equity > peak {
            peak = equity;
        }
        let drawdown = equity / peak - 1.0;
        if drawdown < worst {
            worst = drawdown;
        }
    }
    Some(worst)
}

pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: u32) -> Option<f64> {
    let excess: Vec<f64> = returns.iter().map(|r| r - risk_free_rate).collect();
    let std = sample_std(&excess)?;
    if std == 0.0 {
        return None;
    }
    let avg = mean(&excess)?;
    Some(avg / std * (periods_per_year as f64).sqrt())
}

/// Share of last period's holdings dropped this period.
///
/// An asset is held when its weight is positive. The first period and any
/// period following an all-cash period have turnover 0.
pub fn turnover(weights: &WeightTable) -> PeriodSeries {
    let mut values = Vec::with_capacity(weights.n_periods());
    for t in 0..weights.n_periods() {
        if t == 0 {
            values.push(0.0);
            continue;
        }
        let prev = weights.row(t - 1);
        let curr = weights.row(t);
        let prev_held = prev.iter().filter(|&&w| w > 0.0).count();
        let removed = prev
            .iter()
            .zip(curr)
            .filter(|&(&p, &c)| p > 0.0 && c <= 0.0)
            .count();
        let value = if prev_held == 0 {
            0.0
        } else {
            removed as f64 / prev_held as f64
        };
        values.push(value);
    }
    PeriodSeries::from_parts(weights.periods().to_vec(), values)
}

fn growth(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r))
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    // Constant input is exactly zero, even when its mean does not round-trip.
    if values.iter().all(|v| *v == values[0]) {
        return Some(0.0);
    }
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::PeriodTable;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn month(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, 1).unwrap()
    }

    fn weights(rows: Vec<Vec<f64>>) -> WeightTable {
        let periods = (1..=rows.len() as u32).map(month).collect();
        let width = rows.first().map_or(0, Vec::len);
        let assets = (0..width).map(|j| format!("A{j}")).collect();
        PeriodTable::new(periods, assets, rows).unwrap()
    }

    fn series(values: &[f64]) -> PeriodSeries {
        let periods = (1..=values.len() as u32).map(month).collect();
        PeriodSeries::new(periods, values.to_vec()).unwrap()
    }

    #[test]
    fn cumulative_return_compounds() {
        assert_relative_eq!(cumulative_return(&[0.1, -0.1]).unwrap(), -0.01, epsilon = 1e-12);
        assert_eq!(cumulative_return(&[]), None);
    }

    #[test]
    fn annualized_return_monthly() {
        let returns = vec![0.01; 12];
        let expected = 1.01_f64.powi(12) - 1.0;
        assert_relative_eq!(annualized_return(&returns, 12).unwrap(), expected, epsilon = 1e-12);

        let six = vec![0.01; 6];
        assert_relative_eq!(annualized_return(&six, 12).unwrap(), expected, epsilon = 1e-12);
        assert_eq!(annualized_return(&[], 12), None);
    }

    #[test]
    fn annualized_volatility_uses_sample_std() {
        let vol = annualized_volatility(&[0.01, 0.03], 12).unwrap();
        // Sample std of [0.01, 0.03] is sqrt(0.0002).
        assert_relative_eq!(vol, 0.0002_f64.sqrt() * 12_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(annualized_volatility(&[0.01], 12), None);
    }

    #[test]
    fn max_drawdown_peak_to_trough() {
        let dd = max_drawdown(&[100.0, 110.0, 90.0, 95.0, 80.0, 100.0]).unwrap();
        assert_relative_eq!(dd, 80.0 / 110.0 - 1.0, epsilon = 1e-12);
        assert_eq!(max_drawdown(&[]), None);
    }

    #[test]
    fn max_drawdown_zero_for_rising_curve() {
        assert_eq!(max_drawdown(&[1.0, 1.0, 1.2, 1.3]).unwrap(), 0.0);
    }

    #[test]
    fn sharpe_ratio_positive() {
        let sharpe = sharpe_ratio(&[0.02, 0.01, 0.03, 0.00], 0.0, 12).unwrap();
        assert!(sharpe > 0.0);
    }

    #[test]
    fn sharpe_ratio_risk_free_shifts_mean() {
        let returns = [0.02, 0.01, 0.03, 0.00];
        let base = sharpe_ratio(&returns, 0.0, 12).unwrap();
        let with_rf = sharpe_ratio(&returns, 0.005, 12).unwrap();
        assert!(with_rf < base);
    }

    #[test]
    fn sharpe_ratio_undefined_for_constant_returns() {
        assert_eq!(sharpe_ratio(&[0.01, 0.01, 0.01], 0.0, 12), None);
        assert_eq!(sharpe_ratio(&[0.01], 0.0, 12), None);
    }

    #[test]
    fn turnover_counts_removed_holdings() {
        let w = weights(vec![
            vec![0.5, 0.5, 0.0],
            vec![0.5, 0.0, 0.5],
            vec![0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0],
        ]);
        let t = turnover(&w);
        assert_eq!(t.values(), &[0.0, 0.5, 1.0, 0.0]);
    }

    #[test]
    fn turnover_ignores_weight_changes_of_kept_assets() {
        let w = weights(vec![vec![0.5, 0.5, 0.0], vec![1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0]]);
        assert_eq!(turnover(&w).values(), &[0.0, 0.0]);
    }

    #[test]
    fn summarize_collects_all_fields() {
        let returns = series(&[0.1, -0.05, 0.02]);
        let equity = series(&[1.1, 1.045, 1.0659]);
        let w = weights(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 1.0]]);
        let report = summarize(&returns, &equity, &turnover(&w), 0.0, 12);

        assert_eq!(report.periods, 3);
        assert_relative_eq!(report.cumulative_return.unwrap(), 1.1 * 0.95 * 1.02 - 1.0, epsilon = 1e-12);
        assert!(report.annualized_volatility.is_some());
        assert_relative_eq!(report.max_drawdown.unwrap(), 1.045 / 1.1 - 1.0, epsilon = 1e-12);
        assert_relative_eq!(report.avg_turnover.unwrap(), 1.0 / 3.0, epsilon = 1e-12);
        assert_eq!(report.median_turnover, Some(0.0));
        assert_eq!(report.max_turnover, Some(1.0));
    }

    #[test]
    fn summarize_empty_inputs_are_undefined() {
        let report = summarize(
            &PeriodSeries::default(),
            &PeriodSeries::default(),
            &turnover(&PeriodTable::empty(vec!["A".into()])),
            0.0,
            12,
        );
        assert_eq!(report.periods, 0);
        assert_eq!(report.cumulative_return, None);
        assert_eq!(report.annualized_return, None);
        assert_eq!(report.sharpe_ratio, None);
        assert_eq!(report.max_drawdown, None);
        assert_eq!(report.avg_turnover, None);
        assert_eq!(report.max_turnover, None);
    }

    #[test]
    fn median_of_even_count_averages_middle() {
        assert_eq!(median(&[0.0, 1.0, 0.5, 0.25]), Some(0.375));
    }
}
