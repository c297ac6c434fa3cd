//! Reading and validating a `StrategyConfig` from INI settings.
//!
//! Every required key is checked before the numeric parameters are handed to
//! [`StrategyConfig::validate`], so a broken file fails before any data is
//! loaded.

use crate::domain::config::{StrategyConfig, TrainTestSplit};
use crate::domain::error::XsmomError;
use crate::domain::universe::parse_tickers;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::path::PathBuf;

pub fn load_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, XsmomError> {
    let tickers = required_string(config, "strategy", "tickers")?;
    let universe = parse_tickers(&tickers).map_err(|e| invalid("strategy", "tickers", e))?;

    let start_date = required_date(config, "data", "start_date")?;
    let end_date = required_date(config, "data", "end_date")?;
    let split = TrainTestSplit {
        train_end: required_date(config, "split", "train_end")?,
        test_start: required_date(config, "split", "test_start")?,
    };

    let mut strategy = StrategyConfig::with_defaults(universe, start_date, end_date, split);

    if let Some(lookback) = optional_count(config, "strategy", "lookback_months")? {
        strategy.lookback = lookback;
    }
    if let Some(top_pct) = optional_double(config, "strategy", "top_pct")? {
        strategy.top_pct = top_pct;
    }
    if let Some(min_assets) = optional_count(config, "strategy", "min_assets")? {
        strategy.min_assets = min_assets;
    }
    if let Some(ratio) = optional_double(config, "data", "max_missing_ratio")? {
        strategy.max_missing_ratio = ratio;
    }
    if let Some(limit) = optional_count(config, "data", "fill_gap_limit")? {
        strategy.fill_gap_limit = limit;
    }
    if let Some(start_value) = optional_double(config, "evaluation", "start_value")? {
        strategy.start_value = start_value;
    }
    if let Some(rate) = optional_double(config, "evaluation", "risk_free_rate")? {
        strategy.risk_free_rate = rate;
    }
    if let Some(ppy) = optional_count(config, "evaluation", "periods_per_year")? {
        strategy.periods_per_year = u32::try_from(ppy)
            .map_err(|_| invalid("evaluation", "periods_per_year", "value too large"))?;
    }

    strategy.validate()?;
    Ok(strategy)
}

/// Location of the wide price CSV, `[data] prices`.
pub fn prices_path(config: &dyn ConfigPort) -> Result<PathBuf, XsmomError> {
    required_string(config, "data", "prices").map(PathBuf::from)
}

fn invalid(section: &str, key: &str, reason: impl ToString) -> XsmomError {
    XsmomError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn required_string(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, XsmomError> {
    config
        .get_string(section, key)
        .ok_or_else(|| XsmomError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        })
}

fn required_date(config: &dyn ConfigPort, section: &str, key: &str) -> Result<NaiveDate, XsmomError> {
    let value = required_string(config, section, key)?;
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        invalid(
            section,
            key,
            format!("invalid {key} format, expected YYYY-MM-DD"),
        )
    })
}

fn optional_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, XsmomError> {
    config
        .get_double(section, key)
        .map_err(|e| invalid(section, key, e))
}

fn optional_count(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<usize>, XsmomError> {
    match config.get_int(section, key).map_err(|e| invalid(section, key, e))? {
        None => Ok(None),
        Some(n) => usize::try_from(n)
            .map(Some)
            .map_err(|_| invalid(section, key, format!("{key} must be non-negative"))),
    }
}
