//! Asset universe parsing, data-coverage reporting and cleanup of sparse
//! monthly returns.

use crate::domain::error::XsmomError;
use crate::domain::table::{PriceTable, ReturnTable};
use std::collections::HashSet;

/// Assets missing more than this share of observations are flagged.
pub const MISSING_RATIO_WARN: f64 = 0.10;
/// Default cap on the share of missing monthly returns an asset may have.
pub const DEFAULT_MAX_MISSING_RATIO: f64 = 0.10;
/// Default number of consecutive missing months carried forward.
pub const DEFAULT_FILL_GAP_LIMIT: usize = 1;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

/// Split a comma-separated ticker list. Tickers are trimmed and uppercased
/// (`vod.l` becomes `VOD.L`); order is preserved.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetCoverage {
    pub asset: String,
    pub missing_ratio: f64,
}

/// Share of missing cells per asset, worst first (ties by asset name).
/// Works on prices or returns. An empty table reports every asset as fully
/// missing.
pub fn missing_ratios(prices: &PriceTable) -> Vec<AssetCoverage> {
    let total = prices.n_periods();
    let mut coverage: Vec<AssetCoverage> = prices
        .assets()
        .iter()
        .enumerate()
        .map(|(j, asset)| {
            let missing = prices.column(j).filter(|v| v.is_none()).count();
            let missing_ratio = if total == 0 {
                1.0
            } else {
                missing as f64 / total as f64
            };
            AssetCoverage {
                asset: asset.clone(),
                missing_ratio,
            }
        })
        .collect();

    coverage.sort_by(|a, b| {
        b.missing_ratio
            .total_cmp(&a.missing_ratio)
            .then_with(|| a.asset.cmp(&b.asset))
    });
    coverage
}

pub fn count_above(coverage: &[AssetCoverage], threshold: f64) -> usize {
    coverage.iter().filter(|c| c.missing_ratio > threshold).count()
}

/// Remove assets whose share of missing returns exceeds `max_missing_ratio`.
///
/// Returns the kept table (columns in their original order) and the dropped
/// asset names. An asset exactly at the limit is kept.
pub fn drop_assets_with_missing(
    returns: &ReturnTable,
    max_missing_ratio: f64,
) -> Result<(ReturnTable, Vec<String>), XsmomError> {
    let sparse: HashSet<String> = missing_ratios(returns)
        .into_iter()
        .filter(|c| c.missing_ratio > max_missing_ratio)
        .map(|c| c.asset)
        .collect();
    let (dropped, kept): (Vec<String>, Vec<String>) = returns
        .assets()
        .iter()
        .cloned()
        .partition(|a| sparse.contains(a));
    Ok((returns.select_assets(&kept)?, dropped))
}

/// Carry the last observed return forward into at most `limit` consecutive
/// missing periods per asset. Longer gaps keep their tail missing, and
/// leading gaps stay missing.
pub fn fill_small_gaps(returns: &ReturnTable, limit: usize) -> ReturnTable {
    returns.map_columns(|column| {
        let mut last = None;
        let mut gap = 0;
        column
            .iter()
            .map(|value| match value {
                Some(v) => {
                    last = Some(*v);
                    gap = 0;
                    Some(*v)
                }
                None => {
                    gap += 1;
                    if gap <= limit { last } else { None }
                }
            })
            .collect()
    })
}
