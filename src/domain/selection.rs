//! Cross-sectional top-k selection.
//!
//! k = max(min_assets, ceil(n_assets * top_pct)), where n_assets counts every
//! column whether or not it has a signal that period, so k does not move with
//! data coverage. Each row is ranked on its own.
//!
//! Ties: assets are ordered by signal descending, then by asset identifier
//! ascending. Equal signals therefore always resolve the same way for the
//! same universe.

use crate::domain::error::XsmomError;
use crate::domain::table::{SelectionMask, SignalTable};
use std::cmp::Ordering;

pub fn select(
    signal: &SignalTable,
    top_pct: f64,
    min_assets: usize,
) -> Result<SelectionMask, XsmomError> {
    let k = selection_size(signal.n_assets(), top_pct, min_assets)?;
    let assets = signal.assets();
    Ok(signal.map_rows(|row| rank_and_select(row, assets, k)))
}

/// Number of assets to hold per period for a universe of `n_assets`.
pub fn selection_size(n_assets: usize, top_pct: f64, min_assets: usize) -> Result<usize, XsmomError> {
    if !(top_pct > 0.0 && top_pct <= 1.0) {
        return Err(XsmomError::invalid_parameter(
            "top_pct",
            format!("must be in (0, 1], got {top_pct}"),
        ));
    }
    let by_pct = (n_assets as f64 * top_pct).ceil() as usize;
    Ok(min_assets.max(by_pct))
}

/// Mark the `k` highest non-missing values of one row.
pub fn rank_and_select(row: &[Option<f64>], assets: &[String], k: usize) -> Vec<bool> {
    let mut ranked: Vec<(usize, f64)> = row
        .iter()
        .enumerate()
        .filter_map(|(j, v)| v.filter(|x| !x.is_nan()).map(|x| (j, x)))
        .collect();

    // NaN is filtered above, so partial_cmp is total here and -0.0 == 0.0.
    ranked.sort_by(|a, b| match b.1.partial_cmp(&a.1) {
        Some(Ordering::Equal) | None => assets[a.0].cmp(&assets[b.0]),
        Some(other) => other,
    });

    let mut mask = vec![false; row.len()];
    for &(j, _) in ranked.iter().take(k) {
        mask[j] = true;
    }
    mask
}
