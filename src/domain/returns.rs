//! Simple returns and compounding into coarser periods.
//!
//! Missing-value policy for compounding: a calendar month yields a return
//! only when every observation inside it is present. A month with one or more
//! missing daily returns is missing, as is an entirely empty month. Because
//! the first simple return of any series is missing, the first month of every
//! asset is missing too, which pushes the first usable momentum signal one
//! month later.

use crate::domain::error::XsmomError;
use crate::domain::table::{PeriodTable, PriceTable, ReturnTable};
use chrono::{Datelike, NaiveDate};

/// Observation frequency of a return table. Ordered fine to coarse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Frequency {
    Daily,
    Monthly,
}

/// `price[t] / price[t-1] - 1` per asset. The first row is missing, as is any
/// return whose current or previous price is missing or whose previous price
/// is zero.
pub fn simple_returns(prices: &PriceTable) -> ReturnTable {
    prices.map_columns(|column| {
        let mut out = Vec::with_capacity(column.len());
        for t in 0..column.len() {
            let value = if t == 0 {
                None
            } else {
                match (column[t - 1], column[t]) {
                    (Some(prev), Some(curr)) if prev != 0.0 => Some(curr / prev - 1.0),
                    _ => None,
                }
            };
            out.push(value);
        }
        out
    })
}

/// Compound `returns` observed at `from` into periods of `to`, as
/// `prod(1 + r) - 1` per group.
///
/// Monthly groups are labelled with the calendar month-end date.
pub fn compound(
    returns: &ReturnTable,
    from: Frequency,
    to: Frequency,
) -> Result<ReturnTable, XsmomError> {
    if to < from {
        return Err(XsmomError::invalid_parameter(
            "to",
            format!("cannot compound {from:?} returns into finer {to:?} periods"),
        ));
    }
    if to == from {
        return Ok(returns.clone());
    }
    if returns.is_empty() {
        return Ok(PeriodTable::empty(returns.assets().to_vec()));
    }

    let mut labels = Vec::new();
    let mut rows = Vec::new();
    let mut start = 0;
    let periods = returns.periods();

    while start < periods.len() {
        let label = month_end(periods[start]);
        let mut end = start;
        while end < periods.len() && month_end(periods[end]) == label {
            end += 1;
        }

        let row = (0..returns.n_assets())
            .map(|j| compound_group((start..end).map(|i| *returns.get(i, j))))
            .collect();
        labels.push(label);
        rows.push(row);
        start = end;
    }

    PeriodTable::new(labels, returns.assets().to_vec(), rows)
}

/// Daily prices straight to monthly returns.
pub fn monthly_returns(prices: &PriceTable) -> Result<ReturnTable, XsmomError> {
    compound(&simple_returns(prices), Frequency::Daily, Frequency::Monthly)
}

/// Last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

fn compound_group(group: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let growth = group.fold(Some(1.0), |acc, r| Some(acc? * (1.0 + r?)))?;
    Some(growth - 1.0)
}
