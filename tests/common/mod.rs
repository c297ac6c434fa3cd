#![allow(dead_code)]

use chrono::{Datelike, NaiveDate};
use xsmom::domain::config::{StrategyConfig, TrainTestSplit};
use xsmom::domain::error::XsmomError;
use xsmom::domain::returns::month_end;
use xsmom::domain::table::{PeriodTable, PriceTable, ReturnTable, WeightTable};
use xsmom::ports::data_port::PriceSource;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Month-end date of the `index`-th month after January 2020 (0-based).
pub fn month(index: usize) -> NaiveDate {
    let y = 2020 + (index / 12) as i32;
    let m = (index % 12) as u32 + 1;
    month_end(date(y, m, 1))
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub fn monthly_table(assets: &[&str], rows: Vec<Vec<Option<f64>>>) -> ReturnTable {
    let periods = (0..rows.len()).map(month).collect();
    PeriodTable::new(periods, names(assets), rows).unwrap()
}

pub fn weight_table(assets: &[&str], rows: Vec<Vec<f64>>) -> WeightTable {
    let periods = (0..rows.len()).map(month).collect();
    PeriodTable::new(periods, names(assets), rows).unwrap()
}

/// Weekday prices from `start`, each asset growing at its own constant
/// daily rate.
pub fn daily_prices(start: NaiveDate, days: usize, daily_rates: &[(&str, f64)]) -> PriceTable {
    let periods: Vec<NaiveDate> = start
        .iter_days()
        .filter(|d| d.weekday().number_from_monday() <= 5)
        .take(days)
        .collect();
    let assets = daily_rates.iter().map(|(a, _)| a.to_string()).collect();
    let rows = (0..periods.len())
        .map(|t| {
            daily_rates
                .iter()
                .map(|(_, r)| Some(100.0 * (1.0 + r).powi(t as i32)))
                .collect()
        })
        .collect();
    PeriodTable::new(periods, assets, rows).unwrap()
}

pub fn sample_config(universe: &[&str]) -> StrategyConfig {
    StrategyConfig {
        lookback: 1,
        top_pct: 0.5,
        ..StrategyConfig::with_defaults(
            names(universe),
            date(2020, 1, 1),
            date(2021, 12, 31),
            TrainTestSplit {
                train_end: date(2020, 12, 31),
                test_start: date(2021, 1, 1),
            },
        )
    }
}

pub struct MockPriceSource {
    pub prices: Option<PriceTable>,
    pub error: Option<String>,
}

impl MockPriceSource {
    pub fn new(prices: PriceTable) -> Self {
        Self {
            prices: Some(prices),
            error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            prices: None,
            error: Some(reason.to_string()),
        }
    }
}

impl PriceSource for MockPriceSource {
    fn fetch_prices(
        &self,
        universe: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceTable, XsmomError> {
        if let Some(reason) = &self.error {
            return Err(XsmomError::data(reason.clone()));
        }
        let prices = self.prices.as_ref().ok_or_else(|| XsmomError::NoData {
            reason: "no prices".to_string(),
        })?;
        let found: Vec<String> = universe
            .iter()
            .filter(|a| prices.asset_index(a).is_some())
            .cloned()
            .collect();
        if found.is_empty() {
            return Err(XsmomError::NoData {
                reason: "no requested asset".to_string(),
            });
        }
        Ok(prices
            .select_assets(&found)?
            .slice_periods(Some(start_date), Some(end_date)))
    }

    fn list_assets(&self) -> Result<Vec<String>, XsmomError> {
        Ok(self
            .prices
            .as_ref()
            .map(|p| p.assets().to_vec())
            .unwrap_or_default())
    }
}
