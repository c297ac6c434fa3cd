//! Trailing cumulative-return momentum signal.
//!
//! signal[t] = prod_{k=t-lookback..t-1}(1 + r[k]) - 1
//!
//! The window ending at t-1 is attributed to period t, so a signal never sees
//! the return of its own period. Warmup: the first `lookback` rows are missing,
//! and any window containing a missing return is missing.

use crate::domain::error::XsmomError;
use crate::domain::table::{ReturnTable, SignalTable};

pub fn signal(returns: &ReturnTable, lookback: usize) -> Result<SignalTable, XsmomError> {
    if lookback == 0 {
        return Err(XsmomError::invalid_parameter(
            "lookback",
            "must be a positive number of periods",
        ));
    }
    Ok(returns.map_columns(|column| {
        let trailing = trailing_growth(column, lookback);
        shift_forward(trailing)
    }))
}

/// Full-window cumulative return ending at each row.
///
/// Every window is multiplied from scratch in chronological order rather than
/// updated incrementally, so identical inputs give bit-identical outputs.
fn trailing_growth(column: &[Option<f64>], lookback: usize) -> Vec<Option<f64>> {
    (0..column.len())
        .map(|t| {
            if t + 1 < lookback {
                return None;
            }
            let window = &column[t + 1 - lookback..=t];
            let growth = window
                .iter()
                .try_fold(1.0_f64, |acc, r| r.map(|r| acc * (1.0 + r)))?;
            Some(growth - 1.0)
        })
        .collect()
}

fn shift_forward(values: Vec<Option<f64>>) -> Vec<Option<f64>> {
    if values.is_empty() {
        return values;
    }
    let mut shifted = Vec::with_capacity(values.len());
    shifted.push(None);
    shifted.extend_from_slice(&values[..values.len() - 1]);
    shifted
}
